//! Process table
//!
//! Fixed arena of process records addressed by slot index. The MLFQ queues and
//! the stride table store slot indices, never references, so records can be
//! handed out mutably one at a time under the scheduler lock.

use alloc::string::String;
use alloc::vec::Vec;

use super::error::{SchedulerError, SchedulerResult};
use crate::scheduler::config::Tick;
use crate::scheduler::thread::{
    dispatch, CpuId, Pid, ProcState, Stack, Thread, ThreadState, Tid,
};

/// Index of a record in the process table
pub type ProcSlot = usize;

/// Which scheduler currently owns a process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Queued in the MLFQ at `queues[level][index]`
    Mlfq { level: usize, index: usize },
    /// Holding stride slot `slot`
    Stride { slot: usize },
}

impl Placement {
    /// Level as reported to user space; stride ownership reads as -1
    pub fn level(&self) -> i32 {
        match *self {
            Self::Mlfq { level, .. } => level as i32,
            Self::Stride { .. } => -1,
        }
    }
}

/// Per-process scheduling metadata
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedInfo {
    /// Owning scheduler and position, `None` while unregistered
    pub placement: Option<Placement>,
    /// Ticks run since the last promotion or boost
    pub elapsed: Tick,
    /// Tick at which the current dispatch began
    pub start: Tick,
    /// Ticks run since the process last won a fresh selection
    pub turn: Tick,
}

/// Process record
#[derive(Debug)]
pub struct Process {
    pub pid: Pid,
    pub parent: Option<Pid>,
    pub name: String,
    pub state: ProcState,
    pub killed: bool,
    /// Fixed thread array (`nthread` slots)
    pub threads: Vec<Thread>,
    /// Index of the dispatched (or next to dispatch) thread
    pub active: usize,
    pub sched: SchedInfo,
    /// CPU this process is dispatched on
    pub on_cpu: Option<CpuId>,
}

impl Process {
    fn new(nthread: usize) -> Self {
        let mut threads = Vec::with_capacity(nthread);
        threads.resize_with(nthread, Thread::default);
        Self {
            pid: 0,
            parent: None,
            name: String::new(),
            state: ProcState::Unused,
            killed: false,
            threads,
            active: 0,
            sched: SchedInfo::default(),
            on_cpu: None,
        }
    }

    pub fn is_live(&self) -> bool {
        self.state.is_live()
    }

    pub fn active_thread(&self) -> &Thread {
        &self.threads[self.active]
    }

    pub fn active_thread_mut(&mut self) -> &mut Thread {
        &mut self.threads[self.active]
    }

    /// Scheduling level, -1 when stride-owned
    pub fn level(&self) -> Option<i32> {
        self.sched.placement.map(|placement| placement.level())
    }

    /// Runnable thread index if this process may be dispatched right now
    pub fn dispatchable(&self) -> Option<usize> {
        if self.on_cpu.is_some() {
            return None;
        }
        match self.state {
            ProcState::Runnable | ProcState::Sleeping => dispatch::select_thread(self),
            _ => None,
        }
    }

    /// Derive the process state from its threads after a change.
    ///
    /// Embryo, Zombie and Unused are set explicitly by the lifecycle code and
    /// are left alone.
    pub fn refresh_state(&mut self) {
        if !matches!(
            self.state,
            ProcState::Runnable | ProcState::Running | ProcState::Sleeping
        ) {
            return;
        }
        self.state = if self.on_cpu.is_some() {
            ProcState::Running
        } else if self.threads.iter().any(|t| t.state.is_active()) {
            ProcState::Runnable
        } else if self.threads.iter().any(|t| t.state == ThreadState::Sleeping) {
            ProcState::Sleeping
        } else {
            ProcState::Runnable
        };
    }
}

/// Process arena
pub struct ProcTable {
    procs: Vec<Process>,
    next_pid: Pid,
    next_tid: Tid,
}

impl ProcTable {
    pub fn new(nproc: usize, nthread: usize) -> Self {
        let mut procs = Vec::with_capacity(nproc);
        procs.resize_with(nproc, || Process::new(nthread));
        Self {
            procs,
            next_pid: 1,
            next_tid: 1,
        }
    }

    pub fn capacity(&self) -> usize {
        self.procs.len()
    }

    pub fn get(&self, slot: ProcSlot) -> &Process {
        &self.procs[slot]
    }

    pub fn get_mut(&mut self, slot: ProcSlot) -> &mut Process {
        &mut self.procs[slot]
    }

    pub fn iter(&self) -> impl Iterator<Item = (ProcSlot, &Process)> {
        self.procs.iter().enumerate()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ProcSlot, &mut Process)> {
        self.procs.iter_mut().enumerate()
    }

    /// Slot of the live process `pid`
    pub fn find(&self, pid: Pid) -> Option<ProcSlot> {
        self.procs
            .iter()
            .position(|p| p.is_live() && p.pid == pid)
    }

    /// Slot of the live process `pid`, as an error when missing
    pub fn lookup(&self, pid: Pid) -> SchedulerResult<ProcSlot> {
        self.find(pid).ok_or(SchedulerError::ProcessNotFound { pid })
    }

    pub fn live_count(&self) -> usize {
        self.procs.iter().filter(|p| p.is_live()).count()
    }

    /// Fresh thread id
    pub fn alloc_tid(&mut self) -> Tid {
        let tid = self.next_tid;
        self.next_tid += 1;
        tid
    }

    /// Claim an unused slot as an `Embryo` with its first thread.
    pub fn claim(&mut self, parent: Option<Pid>, name: &str) -> SchedulerResult<ProcSlot> {
        let slot = self
            .procs
            .iter()
            .position(|p| p.state == ProcState::Unused)
            .ok_or(SchedulerError::ProcessLimit {
                max: self.procs.len(),
            })?;

        let pid = self.next_pid;
        self.next_pid += 1;
        let tid = self.alloc_tid();

        let proc = &mut self.procs[slot];
        proc.pid = pid;
        proc.parent = parent;
        proc.name.clear();
        proc.name.push_str(name);
        proc.state = ProcState::Embryo;
        proc.killed = false;
        proc.active = 0;
        proc.sched = SchedInfo::default();
        proc.on_cpu = None;

        let first = &mut proc.threads[0];
        first.tid = tid;
        first.state = ThreadState::Embryo;
        Ok(slot)
    }

    /// Return a slot to `Unused`, handing back every stack it still owns.
    pub fn release(&mut self, slot: ProcSlot) -> Vec<Stack> {
        let proc = &mut self.procs[slot];
        let stacks = proc.threads.iter_mut().filter_map(Thread::reset).collect();
        proc.pid = 0;
        proc.parent = None;
        proc.name.clear();
        proc.state = ProcState::Unused;
        proc.killed = false;
        proc.active = 0;
        proc.sched = SchedInfo::default();
        proc.on_cpu = None;
        stacks
    }
}
