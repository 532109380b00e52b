//! Records tracked by cohort cadence.

pub mod snapshot;
pub mod types;

pub use snapshot::{NewCohort, NewTouchpoint, Snapshot, StoreMeta, STORE_VERSION};
pub use types::{Cohort, Lifecycle, Touchpoint, UNASSIGNED_OWNER, UNSPECIFIED_CHANNEL};
