//! Statistics - scheduler activity counters and state dumps
//!
//! Counters are relaxed atomics so that tests and a console command can read
//! them without taking the scheduler lock. The snapshot is a copy of the
//! tables taken under the lock and logged line by line afterwards.

use alloc::string::String;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicU64, Ordering};

use super::stride::{Participant, Pass};
use crate::scheduler::config::Tick;
use crate::scheduler::thread::{Pid, ProcState};

/// Scheduler activity counters
pub struct SchedulerStats {
    /// Driver cycles that dispatched a process
    pub dispatches: AtomicU64,

    /// Driver cycles that found nothing to run
    pub idle_cycles: AtomicU64,

    /// Ticks spent inside dispatched processes
    pub busy_ticks: AtomicU64,

    /// Processes moved one level down by expiry
    pub promotions: AtomicU64,

    /// Periodic boosts performed
    pub boosts: AtomicU64,

    /// Intra-process thread switches
    pub thread_switches: AtomicU64,

    /// Voluntary yields and timer relinquishes
    pub yields: AtomicU64,

    /// Processes created
    pub spawns: AtomicU64,

    /// Processes reaped by `wait`
    pub reaps: AtomicU64,
}

impl SchedulerStats {
    pub const fn new() -> Self {
        Self {
            dispatches: AtomicU64::new(0),
            idle_cycles: AtomicU64::new(0),
            busy_ticks: AtomicU64::new(0),
            promotions: AtomicU64::new(0),
            boosts: AtomicU64::new(0),
            thread_switches: AtomicU64::new(0),
            yields: AtomicU64::new(0),
            spawns: AtomicU64::new(0),
            reaps: AtomicU64::new(0),
        }
    }

    /// Record a finished dispatch of `ticks` ticks
    pub fn record_dispatch(&self, ticks: Tick) {
        self.dispatches.fetch_add(1, Ordering::Relaxed);
        self.busy_ticks.fetch_add(ticks, Ordering::Relaxed);
    }

    pub fn record_idle(&self) {
        self.idle_cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_promotion(&self) {
        self.promotions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_boost(&self) {
        self.boosts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_thread_switch(&self) {
        self.thread_switches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_yield(&self) {
        self.yields.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_spawn(&self) {
        self.spawns.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reap(&self) {
        self.reaps.fetch_add(1, Ordering::Relaxed);
    }

    /// Average ticks per dispatch
    pub fn avg_dispatch_ticks(&self) -> u64 {
        let total = self.busy_ticks.load(Ordering::Relaxed);
        let count = self.dispatches.load(Ordering::Relaxed);
        if count > 0 {
            total / count
        } else {
            0
        }
    }

    /// Share of driver cycles that dispatched something (percentage)
    pub fn utilization(&self) -> u8 {
        let busy = self.dispatches.load(Ordering::Relaxed);
        let total = busy + self.idle_cycles.load(Ordering::Relaxed);
        if total > 0 {
            ((busy * 100) / total) as u8
        } else {
            0
        }
    }
}

impl Default for SchedulerStats {
    fn default() -> Self {
        Self::new()
    }
}

/// One occupied stride slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrideSlotInfo {
    pub slot: usize,
    /// `None` for the MLFQ itself
    pub pid: Option<Pid>,
    pub tickets: u32,
    pub pass: Pass,
}

/// One process record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcInfo {
    pub pid: Pid,
    pub parent: Option<Pid>,
    pub name: String,
    pub state: ProcState,
    /// Scheduling level, -1 when stride-owned, `None` when unregistered
    pub level: Option<i32>,
    pub elapsed: Tick,
    pub killed: bool,
    pub threads: usize,
}

/// Copy of the scheduling tables
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedSnapshot {
    pub uptime: Tick,
    pub stride: Vec<StrideSlotInfo>,
    /// Pids queued per MLFQ level, in queue order
    pub levels: Vec<Vec<Pid>>,
    pub procs: Vec<ProcInfo>,
}

impl SchedSnapshot {
    /// Participant of a stride slot as a pid
    pub(crate) fn participant_pid(
        participant: Participant,
        pid_of: impl Fn(usize) -> Pid,
    ) -> Option<Pid> {
        match participant {
            Participant::Mlfq => None,
            Participant::Process(slot) => Some(pid_of(slot)),
        }
    }

    /// Emit the snapshot through the logger at debug level
    pub fn log(&self) {
        log::debug!("==== scheduler state at tick {} ====", self.uptime);
        for entry in &self.stride {
            match entry.pid {
                Some(pid) => log::debug!(
                    "stride[{}] pid {} tickets {} pass {}",
                    entry.slot,
                    pid,
                    entry.tickets,
                    entry.pass
                ),
                None => log::debug!(
                    "stride[{}] mlfq tickets {} pass {}",
                    entry.slot,
                    entry.tickets,
                    entry.pass
                ),
            }
        }
        for (level, pids) in self.levels.iter().enumerate() {
            log::debug!("level {}: {:?}", level, pids);
        }
        for proc in &self.procs {
            log::debug!(
                "{} {} {} level {:?} elapsed {} threads {}{}",
                proc.pid,
                proc.state.label(),
                proc.name,
                proc.level,
                proc.elapsed,
                proc.threads,
                if proc.killed { " killed" } else { "" }
            );
        }
    }
}
