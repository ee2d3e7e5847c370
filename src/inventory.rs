//! Run inputs: the device registry, the command set and the credentials.
//!
//! The registry is a JSON list of device descriptors; the command set is a
//! plain text file with one IOS command per line. Both are parsed once at
//! startup and shared read-only with every session worker.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::device;
use crate::error::SetupError;

fn default_port() -> u16 {
    22
}

/// One target device from the registry.
///
/// The `ip` key is accepted as an alias for `host`; both IPv4/IPv6 literals
/// and FQDNs are valid. Identity within a run is the host value.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceDescriptor {
    /// Dialect selector, e.g. `cisco_ios`.
    pub device_type: String,
    /// IPv4, IPv6 or FQDN of the device.
    #[serde(alias = "ip")]
    pub host: String,
    /// SSH port, 22 unless the registry says otherwise.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl DeviceDescriptor {
    pub fn new(device_type: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            device_type: device_type.into(),
            host: host.into(),
            port: 22,
        }
    }
}

/// Loads and validates the device registry.
///
/// Validation happens here, before any device is contacted: a registry entry
/// with an unknown device type fails the whole run instead of one worker.
pub fn load_registry(path: &Path) -> Result<Vec<DeviceDescriptor>, SetupError> {
    let raw = fs::read_to_string(path).map_err(|source| SetupError::RegistryRead {
        path: path.to_path_buf(),
        source,
    })?;
    let devices = parse_registry(&raw).map_err(|source| SetupError::RegistryParse {
        path: path.to_path_buf(),
        source,
    })?;

    for device in &devices {
        if device::dialect_for(&device.device_type).is_none() {
            return Err(SetupError::UnsupportedDeviceType {
                host: device.host.clone(),
                device_type: device.device_type.clone(),
            });
        }
    }
    Ok(devices)
}

fn parse_registry(raw: &str) -> Result<Vec<DeviceDescriptor>, serde_json::Error> {
    serde_json::from_str(raw)
}

/// The ordered command batch pushed to every device.
#[derive(Debug, Clone)]
pub struct CommandSet {
    label: String,
    commands: Vec<String>,
}

impl CommandSet {
    /// Loads a command file. The file name becomes the label shown in the
    /// per-device report headers.
    pub fn load(path: &Path) -> Result<Self, SetupError> {
        let raw = fs::read_to_string(path).map_err(|source| SetupError::CommandsRead {
            path: path.to_path_buf(),
            source,
        })?;
        let label = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let commands = parse_commands(&raw);
        if commands.is_empty() {
            return Err(SetupError::EmptyCommandSet {
                path: path.to_path_buf(),
            });
        }
        Ok(Self { label, commands })
    }

    /// Builds a command set from in-memory lines, applying the same
    /// filtering as [`CommandSet::load`].
    pub fn from_lines<I, S>(label: &str, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let joined = lines
            .into_iter()
            .map(Into::into)
            .collect::<Vec<_>>()
            .join("\n");
        Self {
            label: label.to_string(),
            commands: parse_commands(&joined),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Splits raw command-file text into commands.
///
/// Leading whitespace is preserved: IOS sub-mode commands are conventionally
/// indented. Blank lines and `!` comment lines are dropped.
fn parse_commands(raw: &str) -> Vec<String> {
    raw.lines()
        .map(|line| line.trim_end().to_string())
        .filter(|line| !line.trim().is_empty() && !line.trim_start().starts_with('!'))
        .collect()
}

/// SSH credentials shared by every session in the run.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

// The password must never reach the run log through a Debug format.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_json_parses_with_ip_alias_and_default_port() {
        let raw = r#"[
            {"device_type": "cisco_ios", "ip": "r1.corp.com"},
            {"device_type": "cisco_ios", "host": "192.168.1.120", "port": 2222},
            {"device_type": "cisco_ios", "ip": "2001:db8::130"}
        ]"#;
        let devices = parse_registry(raw).expect("parse registry");
        assert_eq!(devices.len(), 3);
        assert_eq!(devices[0].host, "r1.corp.com");
        assert_eq!(devices[0].port, 22);
        assert_eq!(devices[1].port, 2222);
        assert_eq!(devices[2].host, "2001:db8::130");
    }

    #[test]
    fn malformed_registry_is_rejected() {
        assert!(parse_registry("{\"device_type\": \"cisco_ios\"}").is_err());
        assert!(parse_registry("not json").is_err());
    }

    #[test]
    fn missing_registry_file_is_a_setup_error() {
        let err = load_registry(Path::new("/nonexistent/devices.json"))
            .expect_err("missing file must fail");
        assert!(matches!(err, SetupError::RegistryRead { .. }));
    }

    #[test]
    fn command_lines_keep_indentation_and_drop_noise() {
        let commands = parse_commands(
            "router ospf 1\n network 0.0.0.0 255.255.255.255 area 0\n\n! comment\n passive-interface default\n",
        );
        assert_eq!(
            commands,
            vec![
                "router ospf 1",
                " network 0.0.0.0 255.255.255.255 area 0",
                " passive-interface default",
            ]
        );
    }

    #[test]
    fn from_lines_applies_the_same_filtering() {
        let set = CommandSet::from_lines("cmd.txt", ["show ip int brief", "", "! note"]);
        assert_eq!(set.label(), "cmd.txt");
        assert_eq!(set.commands(), ["show ip int brief"]);
        assert_eq!(set.len(), 1);
        assert!(!set.is_empty());
    }

    #[test]
    fn credentials_debug_redacts_the_password() {
        let creds = Credentials::new("admin", "hunter2");
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("admin"));
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("hunter2"));
    }
}
