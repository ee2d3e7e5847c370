//! # cmdrunner - Bulk SSH Command Runner for Cisco IOS Fleets
//!
//! `cmdrunner` opens SSH sessions to a list of Cisco IOS devices in parallel,
//! pushes a batch of configuration commands to each one, saves the running
//! configuration to startup, and reduces the per-device results into a single
//! ordered report with run statistics.
//!
//! ## Features
//!
//! - **Parallel fan-out**: one session per device, bounded by a concurrency
//!   ceiling, joined before aggregation
//! - **Batched configuration push**: the whole command file is applied in one
//!   config-mode pass per device
//! - **Prompt Detection**: automatic prompt recognition for IOS user, enable
//!   and configuration contexts
//! - **Failure isolation**: an unreachable or mis-credentialed device never
//!   affects its siblings; it surfaces as a classified outcome instead
//! - **Async/Await**: built on Tokio with russh/async-ssh2-tokio transport
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use cmdrunner::inventory::{CommandSet, Credentials, DeviceDescriptor};
//! use cmdrunner::runner::{self, RunContext, SshConnector};
//!
//! #[tokio::main]
//! async fn main() {
//!     let registry = vec![DeviceDescriptor::new("cisco_ios", "192.0.2.10")];
//!     let commands = CommandSet::from_lines(
//!         "cmd.txt",
//!         ["interface Loopback0", " description managed by cmdrunner"],
//!     );
//!
//!     let ctx = RunContext::new(Credentials::new("admin", "secret"), commands);
//!     let run = runner::run_fleet(Arc::new(SshConnector), registry, Arc::new(ctx)).await;
//!
//!     print!("{}", cmdrunner::report::render_report(&run, "cmd.txt", None));
//! }
//! ```
//!
//! ## Main Components
//!
//! - [`runner`] - Dispatcher and per-device session workers
//! - [`session::ShellSession`] - One interactive SSH shell on one device
//! - [`device`] - IOS dialect rules (prompts, errors, save dialogue)
//! - [`report`] - Outcome aggregation and report rendering
//! - [`inventory`] - Device registry, command set and credentials loading

pub mod config;
pub mod device;
pub mod error;
pub mod fakes;
pub mod inventory;
pub mod logging;
pub mod report;
pub mod runner;
pub mod session;
