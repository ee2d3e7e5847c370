//! The dispatch pipeline: bounded fan-out of session workers and the
//! fan-in of their outcomes.
//!
//! One worker task is spawned per registry entry; a semaphore caps how many
//! hold a live session at once. Every worker produces exactly one
//! [`SessionOutcome`], success or failure, into a shared channel; the
//! dispatcher returns only after all of them have been collected.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Local;
use colored::Colorize;
use log::{info, warn};
use tokio::sync::{Semaphore, mpsc};

use crate::device;
use crate::error::{SessionError, SessionFailure};
use crate::inventory::{CommandSet, Credentials, DeviceDescriptor};
use crate::report::{self, FleetRun, RunStatistics, SessionOutcome, SessionReport};
use crate::session::ShellSession;

/// Ceiling on simultaneous device sessions.
///
/// Chosen comfortably above typical fleet sizes so that in practice every
/// device runs at once; larger fleets queue for a free slot.
pub const DEFAULT_CONCURRENCY: usize = 40;

/// Default bound on connect + initial prompt detection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(20);

/// Default bound on a single command exchange.
pub const DEFAULT_EXEC_TIMEOUT: Duration = Duration::from_secs(60);

/// Everything a run shares read-only with its workers.
#[derive(Debug)]
pub struct RunContext {
    pub credentials: Credentials,
    pub commands: CommandSet,
    /// Change control / ticket identifier, recorded on each device and in
    /// the statistics panel when present.
    pub ticket: Option<String>,
    pub concurrency: usize,
    pub connect_timeout: Duration,
    pub exec_timeout: Duration,
}

impl RunContext {
    pub fn new(credentials: Credentials, commands: CommandSet) -> Self {
        Self {
            credentials,
            commands,
            ticket: None,
            concurrency: DEFAULT_CONCURRENCY,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            exec_timeout: DEFAULT_EXEC_TIMEOUT,
        }
    }
}

/// Opens device sessions. The production implementation dials SSH; tests
/// substitute a scripted one.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn open(
        &self,
        device: &DeviceDescriptor,
        ctx: &RunContext,
    ) -> Result<Box<dyn DeviceSession>, SessionError>;
}

/// One open session on one device, as seen by a worker.
#[async_trait]
pub trait DeviceSession: Send {
    fn hostname(&self) -> &str;
    /// Runs a single exec-mode command.
    async fn run_command(&mut self, command: &str) -> Result<String, SessionError>;
    /// Applies the whole command batch as one configuration pass.
    async fn push_commands(&mut self, commands: &[String]) -> Result<String, SessionError>;
    /// Persists running configuration to startup configuration.
    async fn save_config(&mut self) -> Result<String, SessionError>;
    async fn close(&mut self);
}

/// Production connector backed by [`ShellSession`].
pub struct SshConnector;

#[async_trait]
impl Connector for SshConnector {
    async fn open(
        &self,
        device: &DeviceDescriptor,
        ctx: &RunContext,
    ) -> Result<Box<dyn DeviceSession>, SessionError> {
        let dialect = device::dialect_for(&device.device_type)
            .ok_or_else(|| SessionError::UnsupportedDeviceType(device.device_type.clone()))?;
        let session = ShellSession::connect(
            device,
            &ctx.credentials,
            dialect,
            ctx.connect_timeout,
            ctx.exec_timeout,
        )
        .await?;
        Ok(Box::new(session))
    }
}

#[async_trait]
impl DeviceSession for ShellSession {
    fn hostname(&self) -> &str {
        ShellSession::hostname(self)
    }

    async fn run_command(&mut self, command: &str) -> Result<String, SessionError> {
        self.exec(command).await
    }

    async fn push_commands(&mut self, commands: &[String]) -> Result<String, SessionError> {
        self.run_config_set(commands).await
    }

    async fn save_config(&mut self) -> Result<String, SessionError> {
        self.save_running_config().await
    }

    async fn close(&mut self) {
        ShellSession::close(self).await;
    }
}

/// Runs the whole fleet and returns every outcome plus run statistics.
///
/// Guarantees: exactly one outcome per registry entry, collected before
/// returning; at most `ctx.concurrency` sessions live at once; a failing
/// worker never aborts or delays its siblings. Outcomes are returned in
/// registry order.
pub async fn run_fleet(
    connector: Arc<dyn Connector>,
    registry: Vec<DeviceDescriptor>,
    ctx: Arc<RunContext>,
) -> FleetRun {
    let started_at = Local::now();
    let total = registry.len();

    let permits = Arc::new(Semaphore::new(ctx.concurrency.max(1)));
    let (outcome_tx, mut outcome_rx) = mpsc::channel::<SessionOutcome>(total.max(1));

    for (index, device) in registry.into_iter().enumerate() {
        let connector = connector.clone();
        let ctx = ctx.clone();
        let permits = permits.clone();
        let outcome_tx = outcome_tx.clone();
        tokio::spawn(async move {
            // acquire_owned only fails when the semaphore is closed, which
            // never happens here.
            let _permit = permits.acquire_owned().await.ok();
            let outcome = run_device(index, device, connector.as_ref(), &ctx).await;
            let _ = outcome_tx.send(outcome).await;
        });
    }
    drop(outcome_tx);

    // Join barrier: the channel yields None once every worker has sent its
    // outcome and dropped its sender.
    let mut outcomes = Vec::with_capacity(total);
    while let Some(outcome) = outcome_rx.recv().await {
        outcomes.push(outcome);
    }
    outcomes.sort_by_key(|outcome| outcome.index);

    FleetRun {
        outcomes,
        statistics: RunStatistics::finish(started_at),
    }
}

/// Executes the full lifecycle against one device and reports the result.
///
/// Never propagates an error: every exit path yields an outcome.
async fn run_device(
    index: usize,
    device: DeviceDescriptor,
    connector: &dyn Connector,
    ctx: &RunContext,
) -> SessionOutcome {
    let stamp = Local::now().format(report::TIMESTAMP_FORMAT);
    println!("{} - Connecting to device: {}", stamp, device.host);
    info!("Connecting to device: {}", device.host);

    let result = match run_session(&device, connector, ctx).await {
        Ok(session_report) => {
            let stamp = Local::now().format(report::TIMESTAMP_FORMAT);
            let line = format!("{} - Connection to device successful: {}", stamp, device.host);
            println!("{}", line.green());
            info!("Connection to device successful: {}", device.host);
            info!("Configuration to device successful: {}", device.host);
            Ok(session_report)
        }
        Err(err) => {
            let failure = SessionFailure::from(err);
            println!(
                "{}",
                report::failure_line(&failure, &device.host, Local::now()).red()
            );
            warn!("{}: {}", device.host, failure);
            Err(failure)
        }
    };

    SessionOutcome {
        index,
        device,
        finished_at: Local::now(),
        result,
    }
}

async fn run_session(
    device: &DeviceDescriptor,
    connector: &dyn Connector,
    ctx: &RunContext,
) -> Result<SessionReport, SessionError> {
    let mut session = connector.open(device, ctx).await?;
    let hostname = session.hostname().to_string();

    if let Some(ticket) = &ctx.ticket {
        session.run_command(&begin_marker(ticket)).await?;
    }

    let command_output = session.push_commands(ctx.commands.commands()).await?;
    let save_output = session.save_config().await?;

    if let Some(ticket) = &ctx.ticket {
        session.run_command(&end_marker(ticket)).await?;
    }

    session.close().await;

    Ok(SessionReport {
        hostname,
        command_output,
        save_output,
    })
}

/// Device-local syslog marker recorded before the batch is applied.
fn begin_marker(ticket: &str) -> String {
    format!(r#"send log 6 "Begin Change Control/Ticket: {ticket}""#)
}

/// Device-local syslog marker recorded after the configuration is saved.
fn end_marker(ticket: &str) -> String {
    format!(r#"send log 6 "End Change Control/Ticket: {ticket}""#)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_context_defaults_match_the_documented_ceiling() {
        let ctx = RunContext::new(
            Credentials::new("admin", "secret"),
            CommandSet::from_lines("cmd.txt", ["show clock"]),
        );
        assert_eq!(ctx.concurrency, 40);
        assert_eq!(ctx.connect_timeout, Duration::from_secs(20));
        assert_eq!(ctx.exec_timeout, Duration::from_secs(60));
        assert!(ctx.ticket.is_none());
    }

    #[test]
    fn ticket_markers_carry_the_identifier() {
        assert_eq!(
            begin_marker("CHG0042"),
            r#"send log 6 "Begin Change Control/Ticket: CHG0042""#
        );
        assert_eq!(
            end_marker("CHG0042"),
            r#"send log 6 "End Change Control/Ticket: CHG0042""#
        );
    }
}
