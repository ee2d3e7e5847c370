//! Outcome aggregation and report rendering.
//!
//! The dispatcher hands over the complete outcome set; this module reduces
//! it into the final human-readable report: one block per successful device,
//! one line per failed device, then the statistics panel.

use chrono::{DateTime, Local};

use crate::device;
use crate::error::SessionFailure;
use crate::inventory::DeviceDescriptor;

/// Timestamp layout shared by the console, the run log and the report.
pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Width of separators and the statistics panel.
const RULE_WIDTH: usize = 79;

/// Captured outputs of one successful device session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    /// Hostname negotiated from the device prompt.
    pub hostname: String,
    /// Combined transcript of the batched configuration pass.
    pub command_output: String,
    /// Transcript of the save operation.
    pub save_output: String,
}

/// The terminal result record for one device.
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    /// Position of the device in the registry; the report is ordered by it.
    pub index: usize,
    pub device: DeviceDescriptor,
    pub finished_at: DateTime<Local>,
    pub result: Result<SessionReport, SessionFailure>,
}

/// Wall-clock bounds of one run.
#[derive(Debug, Clone)]
pub struct RunStatistics {
    pub started_at: DateTime<Local>,
    pub ended_at: DateTime<Local>,
}

impl RunStatistics {
    /// Closes the statistics window now.
    pub fn finish(started_at: DateTime<Local>) -> Self {
        Self {
            started_at,
            ended_at: Local::now(),
        }
    }

    pub fn duration_seconds(&self) -> i64 {
        (self.ended_at - self.started_at).num_seconds().max(0)
    }

    /// Duration as `h:mm:ss`.
    pub fn duration_hms(&self) -> String {
        let total = self.duration_seconds();
        format!("{}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
    }
}

/// A completed run: every outcome, in registry order, plus statistics.
#[derive(Debug)]
pub struct FleetRun {
    pub outcomes: Vec<SessionOutcome>,
    pub statistics: RunStatistics,
}

/// One-line notice for a failed device.
pub fn failure_line(failure: &SessionFailure, host: &str, at: DateTime<Local>) -> String {
    let label = match failure {
        SessionFailure::Authentication(_) => "Authentication error",
        SessionFailure::Connectivity(_) => "TCP/22 connectivity error",
    };
    format!("{} - {} - {}", at.format(TIMESTAMP_FORMAT), label, host)
}

/// Renders the full report: per-device entries in registry order followed
/// by the statistics panel. Every registered device appears exactly once.
pub fn render_report(run: &FleetRun, command_label: &str, ticket: Option<&str>) -> String {
    let mut out = String::new();
    for outcome in &run.outcomes {
        match &outcome.result {
            Ok(session_report) => {
                out.push_str(&success_blocks(outcome, session_report, command_label));
            }
            Err(failure) => {
                out.push_str(&failure_line(failure, &outcome.device.host, outcome.finished_at));
                out.push('\n');
            }
        }
    }
    out.push_str(&statistics_panel(&run.statistics, ticket));
    out
}

/// Labeled command and save blocks for one successful device.
pub fn success_blocks(
    outcome: &SessionOutcome,
    session_report: &SessionReport,
    command_label: &str,
) -> String {
    let hostname = &session_report.hostname;
    let host = &outcome.device.host;
    let save_label = device::dialect_for(&outcome.device.device_type)
        .map(|dialect| dialect.save_command())
        .unwrap_or("write memory");

    let mut block = String::new();
    block.push_str(&"=".repeat(RULE_WIDTH));
    block.push('\n');
    block.push_str(&format!("[{hostname}] [{host}] >> {command_label}\n\n"));
    block.push_str(session_report.command_output.trim_end());
    block.push('\n');
    block.push_str(&"-".repeat(RULE_WIDTH));
    block.push('\n');
    block.push_str(&format!("[{hostname}] [{host}] >> {save_label}\n\n"));
    block.push_str(session_report.save_output.trim_end());
    block.push('\n');
    block
}

/// Fixed-width statistics panel closing the report.
pub fn statistics_panel(statistics: &RunStatistics, ticket: Option<&str>) -> String {
    let inner = RULE_WIDTH - 2;
    let mut panel = String::new();
    panel.push_str(&"=".repeat(RULE_WIDTH));
    panel.push('\n');
    panel.push_str(&format!("+{}+\n", "-".repeat(inner)));
    panel.push_str(&format!("|{:^inner$}|\n", "SCRIPT STATISTICS"));
    panel.push_str(&format!("|{}|\n", "-".repeat(inner)));
    if let Some(ticket) = ticket {
        panel.push_str(&panel_row("Change Control/Ticket:", ticket));
    }
    panel.push_str(&panel_row(
        "Script started:",
        &statistics.started_at.format(TIMESTAMP_FORMAT).to_string(),
    ));
    panel.push_str(&panel_row(
        "Script ended:",
        &statistics.ended_at.format(TIMESTAMP_FORMAT).to_string(),
    ));
    panel.push_str(&panel_row("Script duration (h:m:s):", &statistics.duration_hms()));
    panel.push_str(&format!("+{}+\n", "-".repeat(inner)));
    panel
}

fn panel_row(label: &str, value: &str) -> String {
    let inner = RULE_WIDTH - 2;
    let body: String = format!(" {label:<25} {value}")
        .chars()
        .take(inner)
        .collect();
    format!("|{body:<inner$}|\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn outcome_at(index: usize, host: &str, result: Result<SessionReport, SessionFailure>) -> SessionOutcome {
        SessionOutcome {
            index,
            device: DeviceDescriptor::new("cisco_ios", host),
            finished_at: Local.with_ymd_and_hms(2018, 5, 8, 10, 30, 0).unwrap(),
            result,
        }
    }

    fn fixed_statistics() -> RunStatistics {
        RunStatistics {
            started_at: Local.with_ymd_and_hms(2018, 5, 8, 10, 30, 0).unwrap(),
            ended_at: Local.with_ymd_and_hms(2018, 5, 8, 10, 30, 42).unwrap(),
        }
    }

    #[test]
    fn failure_lines_name_the_error_class_and_host() {
        let at = Local.with_ymd_and_hms(2018, 5, 8, 10, 30, 0).unwrap();
        let auth = SessionFailure::Authentication("rejected".to_string());
        let conn = SessionFailure::Connectivity("timed out".to_string());

        assert_eq!(
            failure_line(&auth, "r1.corp.com", at),
            "08/05/2018 10:30:00 - Authentication error - r1.corp.com"
        );
        assert_eq!(
            failure_line(&conn, "192.168.1.120", at),
            "08/05/2018 10:30:00 - TCP/22 connectivity error - 192.168.1.120"
        );
    }

    #[test]
    fn duration_renders_as_h_m_s() {
        assert_eq!(fixed_statistics().duration_hms(), "0:00:42");

        let long = RunStatistics {
            started_at: Local.with_ymd_and_hms(2018, 5, 8, 10, 0, 0).unwrap(),
            ended_at: Local.with_ymd_and_hms(2018, 5, 8, 11, 5, 9).unwrap(),
        };
        assert_eq!(long.duration_hms(), "1:05:09");
    }

    #[test]
    fn duration_is_never_negative() {
        let inverted = RunStatistics {
            started_at: Local.with_ymd_and_hms(2018, 5, 8, 11, 0, 0).unwrap(),
            ended_at: Local.with_ymd_and_hms(2018, 5, 8, 10, 0, 0).unwrap(),
        };
        assert_eq!(inverted.duration_seconds(), 0);
    }

    #[test]
    fn success_blocks_carry_both_labeled_sections() {
        let outcome = outcome_at(
            0,
            "2001:db8::130",
            Ok(SessionReport {
                hostname: "R3".to_string(),
                command_output: "router ospf 1\nR3(config-router)#".to_string(),
                save_output: "Building configuration...\n[OK]\nR3#".to_string(),
            }),
        );
        let Ok(session_report) = &outcome.result else {
            panic!("expected success outcome");
        };

        let block = success_blocks(&outcome, session_report, "cmd.txt");
        assert!(block.contains("[R3] [2001:db8::130] >> cmd.txt"));
        assert!(block.contains("[R3] [2001:db8::130] >> write memory"));
        assert!(block.contains("router ospf 1"));
        assert!(block.contains("[OK]"));
    }

    #[test]
    fn report_lists_every_device_exactly_once() {
        let run = FleetRun {
            outcomes: vec![
                outcome_at(0, "r1.corp.com", Err(SessionFailure::Authentication("no".into()))),
                outcome_at(
                    1,
                    "192.168.1.120",
                    Err(SessionFailure::Connectivity("timeout".into())),
                ),
                outcome_at(
                    2,
                    "2001:db8::130",
                    Ok(SessionReport {
                        hostname: "R3".to_string(),
                        command_output: "ok".to_string(),
                        save_output: "[OK]".to_string(),
                    }),
                ),
            ],
            statistics: fixed_statistics(),
        };

        let rendered = render_report(&run, "cmd.txt", Some("CHG0042"));
        assert_eq!(rendered.matches("r1.corp.com").count(), 1);
        assert_eq!(rendered.matches("192.168.1.120").count(), 1);
        assert_eq!(rendered.matches("Authentication error").count(), 1);
        assert_eq!(rendered.matches("TCP/22 connectivity error").count(), 1);
        assert_eq!(rendered.matches("[R3] [2001:db8::130]").count(), 2);
        assert!(rendered.contains("CHG0042"));
        assert!(rendered.contains("SCRIPT STATISTICS"));
    }

    #[test]
    fn empty_run_still_renders_a_valid_panel() {
        let run = FleetRun {
            outcomes: Vec::new(),
            statistics: fixed_statistics(),
        };
        let rendered = render_report(&run, "cmd.txt", None);
        assert!(rendered.contains("SCRIPT STATISTICS"));
        assert!(rendered.contains("Script duration (h:m:s):"));
        assert!(!rendered.contains("Change Control/Ticket:"));
    }

    #[test]
    fn panel_lines_share_a_fixed_width() {
        let panel = statistics_panel(&fixed_statistics(), Some("CHG0042"));
        for line in panel.lines() {
            assert_eq!(line.chars().count(), RULE_WIDTH, "line: {line}");
        }
    }

    #[test]
    fn overlong_ticket_values_are_clipped_to_the_panel() {
        let ticket = "X".repeat(120);
        let panel = statistics_panel(&fixed_statistics(), Some(&ticket));
        for line in panel.lines() {
            assert_eq!(line.chars().count(), RULE_WIDTH);
        }
    }
}
