//! Scheduler core module
//!
//! - `stride`: proportional-share meta-scheduler, MLFQ in slot 0
//! - `mlfq`: multilevel feedback queue for everything without a share
//! - `scheduler`: per-CPU driver loop and process/thread lifecycle
//! - `table`: process arena addressed by slot index

pub mod error;
pub mod mlfq;
pub mod scheduler;
pub mod statistics;
pub mod stride;
pub mod table;

pub use error::{SchedulerError, SchedulerResult};
pub use mlfq::{Decision, Mlfq};
pub use scheduler::{get, init, Cycle, Scheduler, TimerAction};
pub use statistics::{SchedSnapshot, SchedulerStats};
pub use stride::{Participant, StrideTable};
pub use table::{Placement, ProcSlot, ProcTable, Process};
