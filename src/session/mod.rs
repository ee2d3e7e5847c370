//! Interactive SSH shell sessions against network devices.
//!
//! One [`ShellSession`] owns one SSH connection: a PTY-backed shell channel
//! bridged to mpsc queues by a background I/O task, with prompt detection
//! driven by the device dialect. Sessions are short-lived: connect, push the
//! command batch, save, disconnect.

use std::time::Duration;

use async_ssh2_tokio::client::{AuthMethod, Client};
use async_ssh2_tokio::{Config, ServerCheckMethod};
use log::{debug, trace, warn};
use russh::ChannelMsg;
use tokio::sync::mpsc::{self, Receiver, Sender};

use crate::config;
use crate::device::IosDialect;
use crate::error::SessionError;
use crate::inventory::{Credentials, DeviceDescriptor};

/// An interactive shell session on one device.
///
/// All reads go through the two-stage line scan: complete lines are
/// accumulated as output, and the trailing unterminated line is tested
/// against the dialect's prompt shapes.
pub struct ShellSession {
    client: Client,
    to_shell: Sender<String>,
    from_shell: Receiver<String>,
    dialect: &'static IosDialect,
    prompt: String,
    hostname: String,
    exec_timeout: Duration,
}

mod client;
