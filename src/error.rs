//! Error types for device sessions and run setup.
//!
//! Per-device errors stay inside their session worker and are classified
//! into exactly one of two terminal failure classes; setup errors are fatal
//! and abort the run before any device is contacted.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc::error::SendError;

/// Errors raised while establishing or driving one device session.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The TCP/SSH handshake did not complete within the connect timeout.
    #[error("connect timed out after {0:?}")]
    ConnectTimeout(Duration),

    /// The device never presented a recognizable prompt.
    ///
    /// Seen with devices that drop the shell right after authentication or
    /// speak a CLI this tool has no dialect for.
    #[error("timed out waiting for a device prompt")]
    PromptTimeout,

    /// A command did not complete within the execution timeout.
    #[error("command timed out: {0}")]
    ExecTimeout(String),

    /// The shell channel was closed by the device mid-exchange.
    #[error("shell channel closed by the device")]
    ChannelClosed,

    /// No dialect is registered for the descriptor's device type.
    #[error("unsupported device type: {0}")]
    UnsupportedDeviceType(String),

    /// An error occurred in the async-ssh2-tokio library.
    #[error("ssh transport error: {0}")]
    Transport(#[from] async_ssh2_tokio::Error),

    /// An error occurred in the russh library.
    #[error("ssh protocol error: {0}")]
    Protocol(#[from] russh::Error),

    /// Failed to hand data to the shell I/O task.
    #[error("failed to write to the shell: {0}")]
    ShellWrite(#[from] SendError<String>),
}

impl SessionError {
    /// True when the device rejected the supplied credentials.
    ///
    /// Credential rejection is the only failure that is not a connectivity
    /// problem; everything else in this enum means the device could not be
    /// reached or held on to.
    pub fn is_authentication(&self) -> bool {
        matches!(
            self,
            SessionError::Transport(async_ssh2_tokio::Error::PasswordWrong)
        )
    }
}

/// Terminal failure classes for one device.
///
/// Every [`SessionError`] maps to exactly one variant; the payload keeps the
/// underlying error text for the run log.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionFailure {
    /// The device rejected the supplied credentials.
    #[error("authentication rejected: {0}")]
    Authentication(String),

    /// No TCP reachability, or the session was lost before completing.
    #[error("connectivity failed: {0}")]
    Connectivity(String),
}

impl From<SessionError> for SessionFailure {
    fn from(err: SessionError) -> Self {
        let detail = err.to_string();
        if err.is_authentication() {
            SessionFailure::Authentication(detail)
        } else {
            SessionFailure::Connectivity(detail)
        }
    }
}

/// Fatal errors raised before dispatch begins.
#[derive(Error, Debug)]
pub enum SetupError {
    /// The device registry file could not be read.
    #[error("cannot read device registry {}: {source}", .path.display())]
    RegistryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The device registry file is not a valid JSON device list.
    #[error("malformed device registry {}: {source}", .path.display())]
    RegistryParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The command file could not be read.
    #[error("cannot read command file {}: {source}", .path.display())]
    CommandsRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The command file holds nothing but blanks and comments.
    #[error("command file {} contains no commands", .path.display())]
    EmptyCommandSet { path: PathBuf },

    /// A registry entry names a device type without a dialect.
    #[error("device {host} has unsupported device type '{device_type}'")]
    UnsupportedDeviceType { host: String, device_type: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_rejection_classifies_as_authentication() {
        let err = SessionError::Transport(async_ssh2_tokio::Error::PasswordWrong);
        assert!(err.is_authentication());
        assert!(matches!(
            SessionFailure::from(err),
            SessionFailure::Authentication(_)
        ));
    }

    #[test]
    fn timeouts_classify_as_connectivity() {
        let err = SessionError::ConnectTimeout(Duration::from_secs(20));
        assert!(!err.is_authentication());
        assert!(matches!(
            SessionFailure::from(err),
            SessionFailure::Connectivity(_)
        ));
    }

    #[test]
    fn channel_loss_classifies_as_connectivity() {
        assert!(matches!(
            SessionFailure::from(SessionError::ChannelClosed),
            SessionFailure::Connectivity(_)
        ));
    }

    #[test]
    fn failure_detail_keeps_the_error_text() {
        let failure = SessionFailure::from(SessionError::ExecTimeout("write memory".to_string()));
        let SessionFailure::Connectivity(detail) = failure else {
            panic!("expected connectivity failure");
        };
        assert!(detail.contains("write memory"));
    }
}
