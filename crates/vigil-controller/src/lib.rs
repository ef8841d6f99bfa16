//! # Vigil Controller
//!
//! Runs the event log against live signal levels: a background task polls
//! the [`SignalBoard`], records transitions, and flushes the log to a storage
//! directory on request, on a schedule, and at shutdown.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use vigil_controller::{ControllerConfig, MonitorSettings, MonitorTask, SignalBoard};
//! use vigil_eventlog::{EventMonitor, FsStorage, PersistenceCoordinator, SystemClock};
//!
//! let config = ControllerConfig::load("vigil.toml")?;
//! let board = Arc::new(SignalBoard::new());
//! let storage = Arc::new(FsStorage::create(&config.storage_root)?);
//!
//! let handle = MonitorTask::spawn(
//!     EventMonitor::new(config.log_capacity, SystemClock),
//!     board.clone(),
//!     storage,
//!     PersistenceCoordinator::new(),
//!     MonitorSettings::from_config(&config)?,
//! )?;
//!
//! board.set("ALARM", true);
//! handle.flush().await?;
//! handle.shutdown().await?;
//! ```

pub mod audit;
pub mod config;
pub mod error;
pub mod signals;
pub mod task;

pub use config::ControllerConfig;
pub use error::{ControllerError, ControllerResult};
pub use signals::{CommandError, ConsoleCommand, SignalBoard};
pub use task::{MonitorHandle, MonitorSettings, MonitorStatus, MonitorTask};
