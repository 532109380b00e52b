//! Cohort Cadence - outreach cadence analytics for program cohorts.
//!
//! Tracks cohorts and the touchpoints (dated outreach events) scheduled for
//! them, and answers questions about the schedule: which cohorts have gone
//! quiet, how work is spread across owners and channels, which weeks are
//! empty, and what should be booked next.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      Cohort Cadence                      │
//! ├──────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐     │
//! │  │   Record    │──▶│  Snapshot   │──▶│   Engine    │     │
//! │  │    Store    │   │  (model)    │   │   (core)    │     │
//! │  └─────────────┘   └─────────────┘   └─────────────┘     │
//! │                           │                 ▲            │
//! │                           ▼                 │            │
//! │                    ┌─────────────┐   ┌─────────────┐     │
//! │                    │   Mirror    │   │    Clock    │     │
//! │                    └─────────────┘   └─────────────┘     │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine never reads the system clock and never touches storage: every
//! report is a pure function of a snapshot, the reference day and parameters.
//!
//! # Example
//!
//! ```no_run
//! use cohort_cadence::{core, Clock, JsonFileStore, RecordStore, SystemClock};
//!
//! let store = JsonFileStore::new("cadence.json");
//! let snapshot = store.load()?;
//! let today = SystemClock::default().today();
//!
//! let plan = core::action_plan(&snapshot, today, 21, 30);
//! for entry in &plan.entries {
//!     println!("{} -> {} ({})", entry.cohort.name, entry.recommended_date, entry.recommended_owner);
//! }
//! # Ok::<(), cohort_cadence::CadenceError>(())
//! ```

pub mod clock;
pub mod config;
pub mod core;
pub mod error;
pub mod mirror;
pub mod model;
pub mod store;

// Re-export key types at crate root for convenience
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{Config, ConfigError, ReportDefaults};
pub use error::{CadenceError, Result};
pub use mirror::{MemoryMirror, MirrorConfig, MirrorSummary, SnapshotMirror, SyncEvent};
pub use model::{Cohort, Lifecycle, NewCohort, NewTouchpoint, Snapshot, Touchpoint};
pub use store::{JsonFileStore, RecordStore};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
