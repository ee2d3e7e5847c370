//! Scripted connector and session fakes.
//!
//! These drive the dispatch pipeline without a network: each host is given
//! a script (succeed with canned outputs, reject credentials, or be
//! unreachable), and the connector tracks how many sessions are live so
//! tests can assert the concurrency ceiling.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::SessionError;
use crate::inventory::DeviceDescriptor;
use crate::runner::{Connector, DeviceSession, RunContext};

/// Behavior of one scripted device.
#[derive(Debug, Clone)]
pub enum DeviceScript {
    /// Connection succeeds and the canned outputs are returned.
    Success {
        hostname: String,
        command_output: String,
        save_output: String,
    },
    /// The device rejects the credentials.
    RejectAuth,
    /// No TCP reachability; the connect attempt times out.
    Unreachable,
}

impl DeviceScript {
    /// Convenience success script with boilerplate outputs.
    pub fn success(hostname: &str) -> Self {
        DeviceScript::Success {
            hostname: hostname.to_string(),
            command_output: format!("configure terminal\n{hostname}(config)#"),
            save_output: format!("Building configuration...\n[OK]\n{hostname}#"),
        }
    }
}

/// A [`Connector`] that replays per-host scripts.
pub struct ScriptedConnector {
    scripts: HashMap<String, DeviceScript>,
    fallback: DeviceScript,
    session_delay: Duration,
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    commands_seen: Arc<Mutex<Vec<String>>>,
}

impl ScriptedConnector {
    pub fn new(fallback: DeviceScript) -> Self {
        Self {
            scripts: HashMap::new(),
            fallback,
            session_delay: Duration::ZERO,
            active: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
            commands_seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Assigns a script to one host; unscripted hosts use the fallback.
    pub fn script(mut self, host: impl Into<String>, script: DeviceScript) -> Self {
        self.scripts.insert(host.into(), script);
        self
    }

    /// Stretches each session's command phase so overlap becomes observable.
    pub fn with_session_delay(mut self, delay: Duration) -> Self {
        self.session_delay = delay;
        self
    }

    /// Highest number of sessions that were live at the same time.
    pub fn peak_sessions(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Every exec-mode command any session received, in arrival order.
    pub fn commands_seen(&self) -> Vec<String> {
        self.commands_seen
            .lock()
            .map(|seen| seen.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn open(
        &self,
        device: &DeviceDescriptor,
        _ctx: &RunContext,
    ) -> Result<Box<dyn DeviceSession>, SessionError> {
        let script = self.scripts.get(&device.host).unwrap_or(&self.fallback).clone();
        match script {
            DeviceScript::RejectAuth => {
                Err(SessionError::Transport(async_ssh2_tokio::Error::PasswordWrong))
            }
            DeviceScript::Unreachable => {
                Err(SessionError::ConnectTimeout(Duration::from_millis(1)))
            }
            DeviceScript::Success {
                hostname,
                command_output,
                save_output,
            } => {
                let live = self.active.fetch_add(1, Ordering::SeqCst) + 1;
                self.peak.fetch_max(live, Ordering::SeqCst);
                Ok(Box::new(ScriptedSession {
                    hostname,
                    command_output,
                    save_output,
                    delay: self.session_delay,
                    active: self.active.clone(),
                    commands_seen: self.commands_seen.clone(),
                }))
            }
        }
    }
}

struct ScriptedSession {
    hostname: String,
    command_output: String,
    save_output: String,
    delay: Duration,
    active: Arc<AtomicUsize>,
    commands_seen: Arc<Mutex<Vec<String>>>,
}

impl ScriptedSession {
    fn record(&self, command: &str) {
        if let Ok(mut seen) = self.commands_seen.lock() {
            seen.push(command.to_string());
        }
    }
}

#[async_trait]
impl DeviceSession for ScriptedSession {
    fn hostname(&self) -> &str {
        &self.hostname
    }

    async fn run_command(&mut self, command: &str) -> Result<String, SessionError> {
        self.record(command);
        Ok(String::new())
    }

    async fn push_commands(&mut self, commands: &[String]) -> Result<String, SessionError> {
        for command in commands {
            self.record(command);
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.command_output.clone())
    }

    async fn save_config(&mut self) -> Result<String, SessionError> {
        Ok(self.save_output.clone())
    }

    async fn close(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}
