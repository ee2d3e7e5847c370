//! Device dialect rules for Cisco IOS-family CLIs.
//!
//! A dialect bundles everything the session layer needs to drive one device
//! type over an interactive shell: prompt shapes for the user, enable and
//! configuration contexts, error-line patterns, pagination handling, and the
//! confirmation dialogue of the save operation.

use once_cell::sync::Lazy;
use regex::{Regex, RegexSet};

/// Interaction rules for one device family.
pub struct IosDialect {
    name: &'static str,
    prompts: RegexSet,
    errors: RegexSet,
    more: Regex,
    /// Confirmation patterns of the save dialogue, paired with the reply
    /// that acknowledges each of them.
    confirmations: Vec<(Regex, &'static str)>,
}

fn regex(pattern: &str) -> Regex {
    match Regex::new(pattern) {
        Ok(re) => re,
        Err(err) => panic!("invalid dialect regex '{pattern}': {err}"),
    }
}

fn regex_set(patterns: &[&str]) -> RegexSet {
    match RegexSet::new(patterns) {
        Ok(set) => set,
        Err(err) => panic!("invalid dialect regex set: {err}"),
    }
}

static CISCO_IOS: Lazy<IosDialect> = Lazy::new(|| IosDialect {
    name: "cisco_ios",
    prompts: regex_set(&[
        // Config and sub-config contexts: "R1(config)#", "R1(config-if)#"
        r"^\S+\(\S+\)#\s*$",
        // Privileged exec: "R1#"
        r"^[^\s#]+#\s*$",
        // User exec: "R1>"
        r"^[^\s<]+>\s*$",
    ]),
    errors: regex_set(&[
        r"% Invalid input detected at '\^' marker\.",
        r"% Invalid command at '\^' marker\.",
        r"% Invalid parameter detected at '\^' marker\.",
        r"^% Incomplete command\.",
        r"^%.+",
        r"^Command authorization failed.*",
        r"^Command rejected:.*",
        r"ERROR:.+",
        r"Access denied\.",
    ]),
    more: regex(r"--\s*More\s*--"),
    confirmations: vec![
        (
            regex(r"Overwrite the previous NVRAM configuration\?\s*\[confirm\]"),
            "\n",
        ),
        (regex(r"Destination filename \[startup-config\]\?"), "\n"),
        (regex(r"\[confirm\]\s*$"), "\n"),
    ],
});

/// Looks up the dialect for a registry `device_type` value.
///
/// IOS and IOS-XE speak the same CLI, so both map to one dialect.
pub fn dialect_for(device_type: &str) -> Option<&'static IosDialect> {
    match device_type.to_ascii_lowercase().as_str() {
        "cisco_ios" | "cisco_xe" => Some(&CISCO_IOS),
        _ => None,
    }
}

impl IosDialect {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Tests whether the trailing unterminated line of shell output is a
    /// prompt. Complete lines never match: a hostname mentioned mid-output
    /// arrives with a newline and is consumed before this check.
    pub fn is_prompt(&self, tail: &str) -> bool {
        let line = tail.rsplit(['\n', '\r']).next().unwrap_or(tail).trim();
        !line.is_empty() && self.prompts.is_match(line)
    }

    /// Extracts the device hostname from a prompt.
    ///
    /// `"R1#"`, `"R1>"` and `"R1(config-if)#"` all yield `"R1"`.
    pub fn hostname(&self, prompt: &str) -> Option<String> {
        let mut name = prompt.trim().trim_end_matches(['#', '>']).trim_end();
        if let Some(pos) = name.find('(') {
            name = &name[..pos];
        }
        if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        }
    }

    /// True when a completed output line is a device error message.
    ///
    /// Error lines do not fail the session; they stay in the captured
    /// output and are surfaced in the run log.
    pub fn is_error_line(&self, line: &str) -> bool {
        self.errors.is_match(line.trim())
    }

    /// True when the device paused output behind a pagination prompt.
    pub fn wants_more(&self, tail: &str) -> bool {
        self.more.is_match(tail)
    }

    /// Returns the reply that acknowledges a save-dialogue confirmation,
    /// if the output tail is one.
    pub fn save_reply(&self, tail: &str) -> Option<&'static str> {
        self.confirmations
            .iter()
            .find(|(re, _)| re.is_match(tail))
            .map(|(_, reply)| *reply)
    }

    /// The save-running-configuration command.
    pub fn save_command(&self) -> &'static str {
        "write memory"
    }

    /// Command that enters configuration mode.
    pub fn config_enter_command(&self) -> &'static str {
        "configure terminal"
    }

    /// Command that leaves configuration mode from any depth.
    pub fn config_exit_command(&self) -> &'static str {
        "end"
    }

    /// Command that disables output pagination for the session.
    pub fn pagination_off_command(&self) -> &'static str {
        "terminal length 0"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ios() -> &'static IosDialect {
        dialect_for("cisco_ios").expect("cisco_ios dialect")
    }

    #[test]
    fn known_device_types_resolve() {
        assert!(dialect_for("cisco_ios").is_some());
        assert!(dialect_for("cisco_xe").is_some());
        assert!(dialect_for("CISCO_IOS").is_some());
        assert!(dialect_for("juniper_junos").is_none());
        assert!(dialect_for("").is_none());
    }

    #[test]
    fn prompts_are_recognized_in_every_context() {
        let d = ios();
        assert!(d.is_prompt("R1>"));
        assert!(d.is_prompt("R1#"));
        assert!(d.is_prompt("R1(config)#"));
        assert!(d.is_prompt("R1(config-router)# "));
        assert!(d.is_prompt("\rcore-sw-01#"));
    }

    #[test]
    fn output_lines_are_not_prompts() {
        let d = ios();
        assert!(!d.is_prompt("Building configuration..."));
        assert!(!d.is_prompt("interface GigabitEthernet0/1"));
        assert!(!d.is_prompt(""));
        // A '#' mid-line is not a prompt shape.
        assert!(!d.is_prompt("access-list 10 permit any # remark"));
    }

    #[test]
    fn hostname_is_extracted_from_any_prompt_shape() {
        let d = ios();
        assert_eq!(d.hostname("R1#").as_deref(), Some("R1"));
        assert_eq!(d.hostname("R1>").as_deref(), Some("R1"));
        assert_eq!(d.hostname("R1(config-if)#").as_deref(), Some("R1"));
        assert_eq!(d.hostname("core-sw-01# ").as_deref(), Some("core-sw-01"));
        assert_eq!(d.hostname("#"), None);
    }

    #[test]
    fn device_error_lines_are_flagged() {
        let d = ios();
        assert!(d.is_error_line("% Invalid input detected at '^' marker."));
        assert!(d.is_error_line("% Incomplete command."));
        assert!(d.is_error_line("Command rejected: bad idea"));
        assert!(!d.is_error_line("Building configuration..."));
        assert!(!d.is_error_line("[OK]"));
    }

    #[test]
    fn save_dialogue_confirmations_are_answered() {
        let d = ios();
        assert_eq!(
            d.save_reply("Overwrite the previous NVRAM configuration?[confirm]"),
            Some("\n")
        );
        assert_eq!(
            d.save_reply("Destination filename [startup-config]? "),
            Some("\n")
        );
        assert_eq!(d.save_reply("R1#"), None);
        assert_eq!(d.save_reply("Building configuration..."), None);
    }

    #[test]
    fn pagination_prompt_is_detected() {
        let d = ios();
        assert!(d.wants_more(" --More-- "));
        assert!(!d.wants_more("R1#"));
    }
}
