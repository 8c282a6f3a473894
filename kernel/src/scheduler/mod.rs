//! Scheduler subsystem
//!
//! Stride meta-scheduler over an MLFQ, with per-process thread dispatch.
//! Defaults: 3 levels, quanta 5/10/20 ticks, boost every 200 ticks, at most
//! 80% of the CPU handed out as stride shares.

pub mod config;
pub mod core;
pub mod switch;
pub mod thread;

// Re-exports
pub use self::config::{SchedConfig, Tick};
pub use self::core::{
    get, init, Cycle, Decision, SchedSnapshot, Scheduler, SchedulerError, SchedulerResult,
    SchedulerStats, TimerAction,
};
pub use switch::{Context, Machine};
pub use thread::{Channel, CpuId, Pid, Stack, SwitchOutcome, ThreadState, Tid};
