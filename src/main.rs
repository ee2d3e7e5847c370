//! cmdrunner binary: argument handling, prompts, and the run itself.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;

use cmdrunner::inventory::{self, CommandSet, Credentials};
use cmdrunner::runner::{self, DEFAULT_CONCURRENCY, RunContext, SshConnector};
use cmdrunner::{logging, report};

/// Attempts allowed for an interactive credential prompt.
const PROMPT_ATTEMPTS: usize = 3;

#[derive(Parser, Debug)]
#[command(
    name = "cmdrunner",
    version,
    about = "Push a command batch to a fleet of Cisco IOS devices over SSH"
)]
struct Args {
    /// Device registry: JSON list of {device_type, host} records
    devices: PathBuf,

    /// Command file: one IOS command per line
    commands: PathBuf,

    /// SSH username (prompted when omitted)
    #[arg(short, long)]
    username: Option<String>,

    /// SSH password (prompted when omitted)
    #[arg(short, long, env = "CMDRUNNER_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Change control / ticket identifier (prompted when omitted)
    #[arg(short, long, env = "CMDRUNNER_TICKET")]
    ticket: Option<String>,

    /// Maximum simultaneous device sessions
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Per-device connect timeout in seconds
    #[arg(long, default_value_t = 20)]
    connect_timeout: u64,

    /// Per-command execution timeout in seconds
    #[arg(long, default_value_t = 60)]
    command_timeout: u64,

    /// Run log file
    #[arg(long, default_value = "cmdrunner.log")]
    log_file: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_run_log(&args.log_file)
        .with_context(|| format!("cannot open log file {}", args.log_file.display()))?;

    // Setup errors are fatal here, before any device is contacted.
    let registry = inventory::load_registry(&args.devices)?;
    let commands = CommandSet::load(&args.commands)?;
    let command_label = commands.label().to_string();

    println!("{}", "=".repeat(79).white());
    let ticket = resolve_ticket(args.ticket)?;
    let credentials = resolve_credentials(args.username, args.password)?;

    let mut ctx = RunContext::new(credentials, commands);
    ctx.ticket = ticket;
    ctx.concurrency = args.concurrency;
    ctx.connect_timeout = Duration::from_secs(args.connect_timeout);
    ctx.exec_timeout = Duration::from_secs(args.command_timeout);
    let ctx = Arc::new(ctx);

    println!("{}", "=".repeat(79).white());
    let run = runner::run_fleet(Arc::new(SshConnector), registry, ctx.clone()).await;

    // Device-level failures are already part of the report; they do not
    // fail the process.
    print!("{}", report::render_report(&run, &command_label, ctx.ticket.as_deref()));
    Ok(())
}

fn resolve_ticket(flag: Option<String>) -> Result<Option<String>> {
    let ticket = match flag {
        Some(value) => value,
        None => prompt_line("Change Control/Ticket: ")?,
    };
    let ticket = ticket.trim();
    Ok(if ticket.is_empty() {
        None
    } else {
        Some(ticket.to_string())
    })
}

/// Collects the username and password, re-prompting a bounded number of
/// times for anything left empty.
fn resolve_credentials(username: Option<String>, password: Option<String>) -> Result<Credentials> {
    let username = match username {
        Some(value) if !value.trim().is_empty() => value,
        _ => prompt_required("Username: ")?,
    };
    let password = match password {
        Some(value) if !value.is_empty() => value,
        _ => prompt_required("Password: ")?,
    };
    Ok(Credentials::new(username, password))
}

fn prompt_required(label: &str) -> Result<String> {
    for _ in 0..PROMPT_ATTEMPTS {
        let value = prompt_line(label)?;
        if !value.is_empty() {
            return Ok(value);
        }
    }
    bail!("no value provided for {}", label.trim_end_matches(": "));
}

fn prompt_line(label: &str) -> Result<String> {
    print!("{label}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
