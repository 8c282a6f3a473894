//! Thread dispatch
//!
//! Decisions about *which thread* of an already chosen process runs. These
//! helpers only edit a single process record; the scheduler calls them with
//! the global lock held and performs the actual context transfer.

use super::stack::Stack;
use super::state::ThreadState;
use super::thread::Tid;
use crate::scheduler::core::table::Process;

/// Result of an intra-process switch attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// Thread `from` gave way to thread `to`
    Switched { from: usize, to: usize },
    /// No other runnable thread; the running one keeps the CPU
    Stay,
}

/// Index of a runnable thread of `proc`, if any
pub fn select_thread(proc: &Process) -> Option<usize> {
    proc.threads
        .iter()
        .position(|t| t.state.is_schedulable())
}

/// First runnable thread after `from`, searching cyclically and excluding
/// `from` itself.
pub fn next_runnable_after(proc: &Process, from: usize) -> Option<usize> {
    let n = proc.threads.len();
    (1..n)
        .map(|step| (from + step) % n)
        .find(|&idx| proc.threads[idx].state.is_schedulable())
}

/// Hand the CPU to the next runnable thread of the process.
///
/// A running thread drops back to runnable; one that just went to sleep keeps
/// sleeping. Panics when nothing else is runnable and the active thread is not running
/// either: the process was dispatched with nothing to execute.
pub fn rotate(proc: &mut Process) -> SwitchOutcome {
    let from = proc.active;
    match next_runnable_after(proc, from) {
        Some(to) => {
            if proc.threads[from].state == ThreadState::Running {
                proc.threads[from].state = ThreadState::Runnable;
            }
            proc.threads[to].state = ThreadState::Running;
            proc.active = to;
            SwitchOutcome::Switched { from, to }
        }
        None => {
            crate::sched_assert!(
                proc.threads[from].state == ThreadState::Running,
                "process {} has no thread to run",
                proc.pid
            );
            SwitchOutcome::Stay
        }
    }
}

/// Index of thread `tid` within `proc`
pub fn find_thread(proc: &Process, tid: Tid) -> Option<usize> {
    if tid == 0 {
        return None;
    }
    proc.threads
        .iter()
        .position(|t| t.state.is_live() && t.tid == tid)
}

/// Claim an unused thread slot for `tid`, leaving it `Embryo`.
pub fn claim_thread(proc: &mut Process, tid: Tid) -> Option<usize> {
    let idx = proc
        .threads
        .iter()
        .position(|t| t.state == ThreadState::Unused)?;
    let thread = &mut proc.threads[idx];
    thread.tid = tid;
    thread.state = ThreadState::Embryo;
    thread.retval = 0;
    thread.channel = None;
    Some(idx)
}

/// Collect thread `idx` if it has terminated.
///
/// Returns its return value and stack and frees the slot, or `None` while the
/// thread is still alive.
pub fn try_reap(proc: &mut Process, idx: usize) -> Option<(usize, Option<Stack>)> {
    let thread = &mut proc.threads[idx];
    if thread.state != ThreadState::Zombie {
        return None;
    }
    let retval = thread.retval;
    let stack = thread.reset();
    Some((retval, stack))
}
