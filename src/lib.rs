//! # Wavefront API
//!
//! A Rust client library for managing [Wavefront](https://docs.wavefront.com/) alerts
//! and alert targets through the management API.
//!
//! ## Features
//!
//! - Create, read, update and delete alerts and alert targets
//! - Classic (single condition) and threshold (per-severity) alerts
//! - Builder pattern for constructing alerts and targets
//! - Local validation before anything is sent
//! - Configuration from code or from `WAVEFRONT_*` environment variables
//!
//! ## Example
//!
//! ```rust,no_run
//! use wavefront_api::{Alert, Client, Config, Severity, Target, Trigger};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new(&Config::from_env()?)?;
//!
//!     let mut target = Target::webhook("ops", "https://hooks.slack.com/services/test/me")
//!         .with_trigger(Trigger::AlertOpened)
//!         .with_template("{\"text\": \"{{{subject}}}\"}");
//!     client.targets().create(&mut target).await?;
//!
//!     let mut alert = Alert::threshold("CPU")
//!         .with_threshold(Severity::Warn, "ts(servers.cpu.usage) > 80")
//!         .with_threshold_target(Severity::Warn, &target.reference().unwrap_or_default());
//!     client.alerts().create(&mut alert).await?;
//!
//!     // Alerts go before the targets they reference
//!     client.alerts().delete(&mut alert, true).await?;
//!     client.targets().delete(&mut target, true).await?;
//!     Ok(())
//! }
//! ```

mod alerts;
mod client;
mod config;
mod errors;
mod resource;
mod targets;


pub use alerts::{Alert, AlertType, Severity};
pub use client::Client;
pub use config::Config;
pub use errors::{Result, WavefrontError};
pub use resource::{Entity, Resource};
pub use targets::{target_ref, Target, TargetMethod, Trigger, TARGET_PREFIX};
