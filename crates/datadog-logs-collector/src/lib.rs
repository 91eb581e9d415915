//! # Datadog Logs Collector
//!
//! Lifecycle management for log-collection tailers inside the host agent:
//! start exactly one reader per configured source, resume each from its last
//! durably recorded position, feed parsed records into the processing
//! pipeline, and shut every reader down cleanly and concurrently on
//! termination.
//!
//! ## Architecture
//!
//! ```text
//!   Source list (config)
//!        │
//!        v
//!   ┌──────────┐   cursor lookup   ┌────────────────┐
//!   │ Launcher │ <───────────────> │ CursorRegistry │
//!   └────┬─────┘                   └────────────────┘
//!        │ one per identifier
//!        v
//!   ┌──────────┐   records   ┌──────────────────┐
//!   │  Tailer  │ ──────────> │ pipeline channel │ (bounded, per tailer)
//!   └────┬─────┘             └──────────────────┘
//!        │ stop (fan-out / fan-in)
//!        v
//!   ┌─────────────────┐
//!   │ ParallelStopper │
//!   └─────────────────┘
//! ```
//!
//! The launcher is driven from a single task; every tailer it starts runs as
//! an independent tokio task. Teardown is concurrent and bounded by the
//! slowest tailer, not the sum of all of them.

pub mod agent;
pub mod checkpoint;
pub mod config;
pub mod launcher;
pub mod pipeline;
pub mod shutdown;
pub mod tailer;

pub use agent::LogsAgent;
pub use checkpoint::{CheckpointError, Cursor, CursorRegistry, FileCursorRegistry};
pub use config::{LogSource, LogsConfig, SourceType};
pub use launcher::{Launcher, SetupError};
pub use pipeline::{LogRecord, PipelineProvider, Provider};
pub use shutdown::{ParallelStopper, Stoppable};
pub use tailer::{Tailer, TailerError, TailerFactory};
