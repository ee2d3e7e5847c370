//! Run-log initialisation for the cmdrunner binary.
//!
//! Library modules log through the `log` facade; this installs a
//! tracing-subscriber backend that appends timestamped records to the run
//! log file, one line per record.
//!
//! Safe to call more than once; only the first call takes effect (the
//! global subscriber can only be set once per process).

use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::fmt;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Timestamp layout matching the console and report renderers.
const LOG_TIME_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Opens (or creates) the run log and installs the global subscriber.
///
/// Respects `RUST_LOG` for fine-grained filtering; defaults to `info`,
/// which covers the per-device connection and configuration records.
pub fn init_run_log(path: &Path) -> io::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_timer(ChronoLocal::new(LOG_TIME_FORMAT.to_string()))
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .ok();

    Ok(())
}
