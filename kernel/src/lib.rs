// src/lib.rs
//! CPU scheduling core of the kernel.
//!
//! A stride meta-scheduler shares the CPU between processes holding a fixed
//! ticket share and a multilevel feedback queue holding everything else. The
//! thread dispatch layer on top picks which thread of the chosen process runs.
//! Everything that touches real hardware (address spaces, stacks, the actual
//! register switch, the tick clock) is reached through [`scheduler::Machine`].
#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod logger;
pub mod scheduler;

pub use scheduler::{
    Decision, Machine, SchedConfig, Scheduler, SchedulerError, SchedulerResult,
};
