//! State - Process/thread state machine
//!
//! One enumeration serves both records: a process moves through it as a whole,
//! each of its threads moves through it individually.

use core::fmt;

/// Lifecycle state of a process or thread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum ThreadState {
    /// Slot is free
    #[default]
    Unused = 0,

    /// Being set up by the allocation routine
    Embryo = 1,

    /// Blocked on a wait channel
    Sleeping = 2,

    /// Ready to be dispatched
    Runnable = 3,

    /// Currently dispatched on a CPU
    Running = 4,

    /// Terminated, waiting to be collected
    Zombie = 5,
}

/// Processes share the thread state enumeration
pub type ProcState = ThreadState;

impl ThreadState {
    /// Check if state is schedulable
    pub fn is_schedulable(self) -> bool {
        matches!(self, Self::Runnable)
    }

    /// Check if state is active (on or ready for a CPU)
    pub fn is_active(self) -> bool {
        matches!(self, Self::Running | Self::Runnable)
    }

    /// Slot holds something that has not been reaped yet
    pub fn is_live(self) -> bool {
        !matches!(self, Self::Unused)
    }

    /// Short fixed-width label used by the state dump
    pub fn label(self) -> &'static str {
        match self {
            Self::Unused => "unused",
            Self::Embryo => "embryo",
            Self::Sleeping => "sleep ",
            Self::Runnable => "runble",
            Self::Running => "run   ",
            Self::Zombie => "zombie",
        }
    }
}

impl fmt::Display for ThreadState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Unused => write!(f, "Unused"),
            Self::Embryo => write!(f, "Embryo"),
            Self::Sleeping => write!(f, "Sleeping"),
            Self::Runnable => write!(f, "Runnable"),
            Self::Running => write!(f, "Running"),
            Self::Zombie => write!(f, "Zombie"),
        }
    }
}
