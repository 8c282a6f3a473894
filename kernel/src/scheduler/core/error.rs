//! Scheduler Error Handling
//!
//! Typed errors for every recoverable scheduler operation. Capacity and share
//! failures never leave a table half-updated. Corruption is not an error
//! value: it stops the kernel through `sched_assert!`.

use core::fmt;

use super::super::thread::{CpuId, Pid, Tid};

/// Scheduler error types with detailed context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerError {
    // ═══════════════════════════════════════════════════════════════
    // Capacity Errors
    // ═══════════════════════════════════════════════════════════════

    /// No empty slot at the given MLFQ level
    QueueFull { level: usize },

    /// Every stride slot is taken
    StrideTableFull,

    /// Process table exhausted
    ProcessLimit { max: usize },

    /// Per-process thread slots exhausted
    ThreadLimit { pid: Pid, max: usize },

    /// The machine could not provide a stack
    StackAllocationFailed,

    // ═══════════════════════════════════════════════════════════════
    // Share Errors
    // ═══════════════════════════════════════════════════════════════

    /// Requested share is zero or negative
    InvalidShare { requested: i32 },

    /// Granting the share would exceed the admissible total
    ShareExceeded { requested: i32, available: u32 },

    /// The process already holds a stride share
    AlreadyShared { pid: Pid },

    // ═══════════════════════════════════════════════════════════════
    // Lookup / Lifecycle Errors
    // ═══════════════════════════════════════════════════════════════

    /// No live process with this pid
    ProcessNotFound { pid: Pid },

    /// No thread with this tid in the calling process
    ThreadNotFound { tid: Tid },

    /// The process is already placed in a scheduler queue
    AlreadyRegistered { pid: Pid },

    /// The caller has no children to wait for
    NoChildren,

    /// The calling process was killed while blocked
    Killed,

    /// Nothing is dispatched on this CPU
    NotRunning { cpu: CpuId },

    // ═══════════════════════════════════════════════════════════════
    // Configuration Errors
    // ═══════════════════════════════════════════════════════════════

    /// Configuration rejected by `SchedConfig::validate`
    InvalidConfig { reason: &'static str },
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueueFull { level } => write!(f, "MLFQ level {} is full", level),
            Self::StrideTableFull => write!(f, "stride table is full"),
            Self::ProcessLimit { max } => write!(f, "process limit reached: {}", max),
            Self::ThreadLimit { pid, max } => {
                write!(f, "process {} thread limit reached: {}", pid, max)
            }
            Self::StackAllocationFailed => write!(f, "stack allocation failed"),
            Self::InvalidShare { requested } => {
                write!(f, "invalid cpu share: {}", requested)
            }
            Self::ShareExceeded { requested, available } => write!(
                f,
                "cpu share {} exceeds available {}",
                requested, available
            ),
            Self::AlreadyShared { pid } => {
                write!(f, "process {} already holds a cpu share", pid)
            }
            Self::ProcessNotFound { pid } => write!(f, "process {} not found", pid),
            Self::ThreadNotFound { tid } => write!(f, "thread {} not found", tid),
            Self::AlreadyRegistered { pid } => {
                write!(f, "process {} is already scheduled", pid)
            }
            Self::NoChildren => write!(f, "no children"),
            Self::Killed => write!(f, "killed"),
            Self::NotRunning { cpu } => write!(f, "nothing running on cpu {}", cpu),
            Self::InvalidConfig { reason } => write!(f, "invalid config: {}", reason),
        }
    }
}

impl SchedulerError {
    /// Get recovery hint for this error
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            Self::QueueFull { .. } | Self::ProcessLimit { .. } => {
                "Wait for processes to be reaped"
            }
            Self::StrideTableFull => "Wait for a share holder to exit",
            Self::ThreadLimit { .. } => "Join finished threads to free their slots",
            Self::StackAllocationFailed => "Free memory and retry",
            Self::InvalidShare { .. } => "Request a positive share",
            Self::ShareExceeded { .. } => "Request a smaller share",
            Self::NoChildren | Self::Killed => "Return to the caller",
            _ => "Check scheduler configuration",
        }
    }

    /// Is this a capacity error (table or memory exhausted)?
    pub fn is_capacity(&self) -> bool {
        matches!(
            self,
            Self::QueueFull { .. }
                | Self::StrideTableFull
                | Self::ProcessLimit { .. }
                | Self::ThreadLimit { .. }
                | Self::StackAllocationFailed
        )
    }

    /// Is this a recoverable error?
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InvalidConfig { .. })
    }
}

/// Result type for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Stop the kernel when a scheduler invariant does not hold
#[macro_export]
macro_rules! sched_assert {
    ($cond:expr, $($reason:tt)+) => {
        if !$cond {
            panic!("[SCHED CRITICAL] Invariant violated: {}", format_args!($($reason)+));
        }
    };
}
