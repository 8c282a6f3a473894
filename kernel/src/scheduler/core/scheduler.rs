//! Scheduler Core - two-level stride/MLFQ driver
//!
//! Every CPU runs [`Scheduler::run`], which repeatedly asks the stride table
//! for a participant, resolves the MLFQ's turn to a process, resumes the
//! chosen thread and accounts the ticks it consumed once it gives the CPU
//! back.
//!
//! # Locking
//! - All tables live behind one `spin::Mutex`
//! - The lock is dropped exactly across `Machine::resume` (driver side) and
//!   `Machine::suspend` (thread side)
//! - A dispatched process carries the CPU it runs on and is skipped by every
//!   other CPU until its own driver has finished accounting
//!
//! The thread-side entry points (`yield_now`, `sleep`, `exit_current`,
//! `wait`, the `thread_*` family) run on behalf of the thread currently
//! dispatched on `cpu`.

use alloc::vec::Vec;
use spin::{Mutex, MutexGuard, Once};

use super::error::{SchedulerError, SchedulerResult};
use super::mlfq::{Decision, Mlfq};
use super::statistics::{ProcInfo, SchedSnapshot, SchedulerStats, StrideSlotInfo};
use super::table::{ProcSlot, ProcTable};
use crate::scheduler::config::{SchedConfig, Tick};
use crate::scheduler::switch::{Context, Machine};
use crate::scheduler::thread::{
    dispatch, Channel, CpuId, Pid, ProcState, SwitchOutcome, ThreadState, Tid,
};

/// Outcome of one driver cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cycle {
    /// Nothing was runnable; the MLFQ was charged for the idle pass
    Idle,
    /// A thread ran for `ticks` ticks
    Ran {
        pid: Pid,
        tid: Tid,
        ticks: Tick,
        decision: Decision,
    },
}

/// What a timer interrupt did to the running thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    /// No process is dispatched on this CPU
    Idle,
    /// The process used up its quantum and gave the CPU back
    Relinquished,
    /// Intra-process round robin
    Thread(SwitchOutcome),
}

#[derive(Debug, Clone, Copy)]
struct CpuState {
    /// Process dispatched right now
    current: Option<ProcSlot>,
    /// Process of the previous cycle, kept on `ContinueSame`
    last: Option<ProcSlot>,
    decision: Decision,
}

impl CpuState {
    const IDLE: Self = Self {
        current: None,
        last: None,
        decision: Decision::PickNew,
    };
}

struct SchedTables {
    procs: ProcTable,
    mlfq: Mlfq,
    cpus: Vec<CpuState>,
    /// Tick after which the next boost is due
    next_boost: Tick,
    /// Adopts orphans; the first parentless process
    init_pid: Option<Pid>,
}

impl SchedTables {
    fn running(&self, cpu: CpuId) -> SchedulerResult<ProcSlot> {
        self.cpus
            .get(cpu)
            .and_then(|state| state.current)
            .ok_or(SchedulerError::NotRunning { cpu })
    }

    /// Wake every thread sleeping on `channel`; returns how many woke.
    fn wakeup(&mut self, channel: Channel) -> usize {
        let mut woken = 0;
        for (_, proc) in self.procs.iter_mut() {
            let before = woken;
            for thread in proc.threads.iter_mut() {
                if thread.sleeps_on(channel) && thread.wake() {
                    woken += 1;
                }
            }
            if woken != before {
                proc.refresh_state();
            }
        }
        woken
    }
}

/// Two-level scheduler
pub struct Scheduler {
    config: SchedConfig,
    inner: Mutex<SchedTables>,
    stats: SchedulerStats,
}

impl Scheduler {
    /// Build an empty scheduler; the stride table starts with the whole
    /// budget in the MLFQ slot.
    pub fn new(config: SchedConfig) -> SchedulerResult<Self> {
        config.validate()?;

        let mut cpus = Vec::with_capacity(config.ncpu);
        cpus.resize(config.ncpu, CpuState::IDLE);

        Ok(Self {
            inner: Mutex::new(SchedTables {
                procs: ProcTable::new(config.nproc, config.nthread),
                mlfq: Mlfq::new(&config),
                cpus,
                next_boost: config.boost_interval(),
                init_pid: None,
            }),
            stats: SchedulerStats::new(),
            config,
        })
    }

    pub fn config(&self) -> &SchedConfig {
        &self.config
    }

    pub fn stats(&self) -> &SchedulerStats {
        &self.stats
    }

    // ═══════════════════════════════════════════════════════════════
    // Driver loop
    // ═══════════════════════════════════════════════════════════════

    /// Per-CPU scheduler loop. Never returns.
    pub fn run<M: Machine>(&self, cpu: CpuId, machine: &M) -> ! {
        log::info!("cpu {}: entering scheduler loop", cpu);
        loop {
            self.run_once(cpu, machine);
        }
    }

    /// One selection, dispatch and accounting cycle on `cpu`.
    pub fn run_once<M: Machine>(&self, cpu: CpuId, machine: &M) -> Cycle {
        crate::sched_assert!(cpu < self.config.ncpu, "no cpu {}", cpu);
        machine.enable_interrupts();

        let mut guard = self.inner.lock();
        let tables = &mut *guard;

        let kept = match tables.cpus[cpu] {
            CpuState {
                decision: Decision::ContinueSame,
                last: Some(slot),
                ..
            } => {
                let proc = tables.procs.get(slot);
                let keep = proc.on_cpu.is_none()
                    && proc.state.is_schedulable()
                    && proc.active_thread().state.is_schedulable();
                keep.then_some(slot)
            }
            _ => None,
        };

        let slot = match kept {
            Some(slot) => slot,
            None => match tables.mlfq.pick_next(&tables.procs) {
                Some((slot, thread)) => {
                    let proc = tables.procs.get_mut(slot);
                    proc.active = thread;
                    proc.sched.turn = 0;
                    slot
                }
                None => {
                    tables.mlfq.charge_self();
                    tables.cpus[cpu] = CpuState::IDLE;
                    self.stats.record_idle();
                    return Cycle::Idle;
                }
            },
        };

        let start = machine.uptime();
        let proc = tables.procs.get_mut(slot);
        proc.state = ProcState::Running;
        proc.on_cpu = Some(cpu);
        proc.sched.start = start;
        let pid = proc.pid;
        let thread = proc.active_thread_mut();
        thread.state = ThreadState::Running;
        let tid = thread.tid;
        let context = thread.context;
        tables.cpus[cpu].current = Some(slot);

        log::trace!("cpu {}: dispatch pid {} tid {}", cpu, pid, tid);
        machine.switch_address_space(pid);
        drop(guard);

        let saved = machine.resume(cpu, context);

        let mut guard = self.inner.lock();
        let tables = &mut *guard;
        machine.switch_kernel_address_space();
        let end = machine.uptime();
        let ticks = end.saturating_sub(start);

        let proc = tables.procs.get_mut(slot);
        let thread = proc.active_thread_mut();
        if thread.state.is_live() {
            thread.context = saved;
        }
        if thread.state == ThreadState::Running {
            // Preempted without going through the scheduler API
            thread.state = ThreadState::Runnable;
        }
        proc.sched.elapsed += ticks;
        proc.sched.turn += ticks;
        proc.on_cpu = None;
        proc.refresh_state();
        let zombie_parent = match proc.state {
            ProcState::Zombie => proc.parent,
            _ => None,
        };
        let level_before = proc.level();
        tables.cpus[cpu].current = None;

        let decision = tables.mlfq.advance(&mut tables.procs, slot);
        if matches!((level_before, tables.procs.get(slot).level()), (Some(b), Some(a)) if b >= 0 && a > b)
        {
            self.stats.record_promotion();
        }

        // The parent may have given up on this child while it was still
        // dispatched.
        if let Some(parent) = zombie_parent {
            tables.wakeup(Channel::Process(parent));
        }

        if end > tables.next_boost {
            let boosted = tables.mlfq.boost(&mut tables.procs);
            crate::sched_assert!(
                boosted.is_ok(),
                "boost failed at tick {}: {:?}",
                end,
                boosted
            );
            // Skip the deadlines that fell into an idle stretch; one boost
            // covers all of them.
            let interval = self.config.boost_interval();
            tables.next_boost += (end - tables.next_boost).div_ceil(interval) * interval;
            self.stats.record_boost();
        }

        tables.cpus[cpu].last = Some(slot);
        tables.cpus[cpu].decision = decision;
        self.stats.record_dispatch(ticks);

        Cycle::Ran {
            pid,
            tid,
            ticks,
            decision,
        }
    }

    // ═══════════════════════════════════════════════════════════════
    // Process lifecycle
    // ═══════════════════════════════════════════════════════════════

    /// Create a runnable process whose first thread starts at `entry(arg)`.
    ///
    /// Any failure rolls the process table back.
    pub fn spawn<M: Machine>(
        &self,
        parent: Option<Pid>,
        name: &str,
        entry: usize,
        arg: usize,
        machine: &M,
    ) -> SchedulerResult<Pid> {
        self.try_spawn(parent, name, entry, arg, machine)
            .inspect_err(|err| {
                log::warn!("spawn of {} failed: {} ({})", name, err, err.recovery_hint())
            })
    }

    fn try_spawn<M: Machine>(
        &self,
        parent: Option<Pid>,
        name: &str,
        entry: usize,
        arg: usize,
        machine: &M,
    ) -> SchedulerResult<Pid> {
        let mut guard = self.inner.lock();
        let tables = &mut *guard;

        let slot = tables.procs.claim(parent, name)?;
        let Some(stack) = machine.allocate_stack() else {
            tables.procs.release(slot);
            return Err(SchedulerError::StackAllocationFailed);
        };
        let first = &mut tables.procs.get_mut(slot).threads[0];
        first.context = Context::entry(&stack, entry, arg);
        first.stack = Some(stack);

        if let Err(err) = tables.mlfq.register(&mut tables.procs, slot) {
            for stack in tables.procs.release(slot) {
                machine.free_stack(stack);
            }
            return Err(err);
        }

        let proc = tables.procs.get_mut(slot);
        proc.state = ProcState::Runnable;
        proc.threads[0].state = ThreadState::Runnable;
        let pid = proc.pid;
        if parent.is_none() && tables.init_pid.is_none() {
            tables.init_pid = Some(pid);
        }

        self.stats.record_spawn();
        log::info!("spawned pid {} ({}) parent {:?}", pid, name, parent);
        Ok(pid)
    }

    /// Put an unregistered process into the MLFQ at level 0.
    pub fn register_new_process(&self, pid: Pid) -> SchedulerResult<()> {
        let mut guard = self.inner.lock();
        let tables = &mut *guard;
        let slot = tables.procs.lookup(pid)?;
        tables.mlfq.register(&mut tables.procs, slot)
    }

    /// Remove a process from whichever scheduler owns it.
    pub fn deregister(&self, pid: Pid) -> SchedulerResult<()> {
        let mut guard = self.inner.lock();
        let tables = &mut *guard;
        let slot = tables.procs.lookup(pid)?;
        if tables.procs.get(slot).sched.placement.is_some() {
            tables.mlfq.dequeue(&mut tables.procs, slot);
        }
        Ok(())
    }

    /// Move a process into the stride table with `percent` tickets.
    pub fn request_share(&self, pid: Pid, percent: i32) -> SchedulerResult<()> {
        let mut guard = self.inner.lock();
        let tables = &mut *guard;
        let slot = tables.procs.lookup(pid)?;
        tables
            .mlfq
            .request_share(&mut tables.procs, slot, percent)
            .inspect_err(|err| {
                log::warn!(
                    "pid {}: share of {} refused: {} ({})",
                    pid,
                    percent,
                    err,
                    err.recovery_hint()
                )
            })
    }

    /// MLFQ level of `pid`, or -1 when it holds a stride share
    pub fn scheduling_level_of(&self, pid: Pid) -> SchedulerResult<i32> {
        let guard = self.inner.lock();
        let slot = guard.procs.lookup(pid)?;
        guard
            .procs
            .get(slot)
            .level()
            .ok_or(SchedulerError::ProcessNotFound { pid })
    }

    /// Whether `pid` has used up its time slice at tick `now`
    pub fn should_relinquish(&self, pid: Pid, now: Tick) -> SchedulerResult<bool> {
        let guard = self.inner.lock();
        let slot = guard.procs.lookup(pid)?;
        Ok(guard.mlfq.should_relinquish(guard.procs.get(slot), now))
    }

    /// Process and thread dispatched on `cpu`
    pub fn current(&self, cpu: CpuId) -> Option<(Pid, Tid)> {
        let guard = self.inner.lock();
        let slot = guard.running(cpu).ok()?;
        let proc = guard.procs.get(slot);
        Some((proc.pid, proc.active_thread().tid))
    }

    /// Mark `pid` killed and wake its sleeping threads so they notice.
    pub fn kill(&self, pid: Pid) -> SchedulerResult<()> {
        let mut guard = self.inner.lock();
        let slot = guard.procs.lookup(pid)?;
        let proc = guard.procs.get_mut(slot);
        proc.killed = true;
        for thread in proc.threads.iter_mut() {
            thread.wake();
        }
        proc.refresh_state();
        log::debug!("killed pid {}", pid);
        Ok(())
    }

    /// Wake every thread sleeping on `channel`.
    pub fn wakeup(&self, channel: Channel) -> usize {
        self.inner.lock().wakeup(channel)
    }

    // ═══════════════════════════════════════════════════════════════
    // Thread side
    // ═══════════════════════════════════════════════════════════════

    /// Give the CPU back to the driver loop of `cpu` and come back once
    /// rescheduled. The calling thread must already have left `Running`.
    fn sched<'s, M: Machine>(
        &'s self,
        guard: MutexGuard<'s, SchedTables>,
        cpu: CpuId,
        machine: &M,
    ) -> MutexGuard<'s, SchedTables> {
        let slot = guard.cpus.get(cpu).and_then(|state| state.current);
        crate::sched_assert!(slot.is_some(), "sched: nothing dispatched on cpu {}", cpu);
        if let Some(slot) = slot {
            let thread = guard.procs.get(slot).active_thread();
            crate::sched_assert!(
                thread.state != ThreadState::Running,
                "sched: thread {} is still running",
                thread.tid
            );
        }
        drop(guard);
        machine.suspend(cpu);
        self.inner.lock()
    }

    fn sleep_locked<'s, M: Machine>(
        &'s self,
        mut guard: MutexGuard<'s, SchedTables>,
        cpu: CpuId,
        channel: Channel,
        machine: &M,
    ) -> SchedulerResult<MutexGuard<'s, SchedTables>> {
        let slot = guard.running(cpu)?;
        let thread = guard.procs.get_mut(slot).active_thread_mut();
        thread.state = ThreadState::Sleeping;
        thread.channel = Some(channel);
        Ok(self.sched(guard, cpu, machine))
    }

    /// Voluntarily give up the CPU.
    pub fn yield_now<M: Machine>(&self, cpu: CpuId, machine: &M) -> SchedulerResult<()> {
        let mut guard = self.inner.lock();
        let slot = guard.running(cpu)?;
        guard.procs.get_mut(slot).active_thread_mut().state = ThreadState::Runnable;
        self.stats.record_yield();
        drop(self.sched(guard, cpu, machine));
        Ok(())
    }

    /// Block the calling thread on `channel`.
    pub fn sleep<M: Machine>(
        &self,
        cpu: CpuId,
        channel: Channel,
        machine: &M,
    ) -> SchedulerResult<()> {
        let guard = self.inner.lock();
        drop(self.sleep_locked(guard, cpu, channel, machine)?);
        Ok(())
    }

    /// Terminate the calling process.
    ///
    /// Children pass to the init process and the parent is woken. The machine
    /// never resumes a zombie, so on real hardware this does not return.
    pub fn exit_current<M: Machine>(&self, cpu: CpuId, machine: &M) -> SchedulerResult<()> {
        let mut guard = self.inner.lock();
        let tables = &mut *guard;
        let slot = tables.running(cpu)?;
        let (pid, parent) = {
            let proc = tables.procs.get(slot);
            (proc.pid, proc.parent)
        };
        crate::sched_assert!(tables.init_pid != Some(pid), "init exiting");

        let init = tables.init_pid;
        let mut orphaned_zombie = false;
        for (_, child) in tables.procs.iter_mut() {
            if child.is_live() && child.parent == Some(pid) {
                child.parent = init;
                orphaned_zombie |= child.state == ProcState::Zombie;
            }
        }

        if let Some(parent) = parent {
            tables.wakeup(Channel::Process(parent));
        }
        if let (true, Some(init)) = (orphaned_zombie, init) {
            tables.wakeup(Channel::Process(init));
        }

        let proc = tables.procs.get_mut(slot);
        proc.state = ProcState::Zombie;
        for thread in proc.threads.iter_mut().filter(|t| t.state.is_live()) {
            thread.state = ThreadState::Zombie;
            thread.channel = None;
        }
        log::debug!("pid {} exiting", pid);

        drop(self.sched(guard, cpu, machine));
        Ok(())
    }

    /// Reap an exited child and return its pid.
    pub fn wait<M: Machine>(&self, cpu: CpuId, machine: &M) -> SchedulerResult<Pid> {
        let mut guard = self.inner.lock();
        loop {
            let tables = &mut *guard;
            let me = tables.running(cpu)?;
            let my_pid = tables.procs.get(me).pid;

            let mut have_children = false;
            let mut exited = None;
            for (slot, proc) in tables.procs.iter() {
                if !proc.is_live() || proc.parent != Some(my_pid) {
                    continue;
                }
                have_children = true;
                // A zombie still on its CPU is reaped once its driver lets go.
                if proc.state == ProcState::Zombie && proc.on_cpu.is_none() {
                    exited = Some(slot);
                    break;
                }
            }

            if let Some(child) = exited {
                let pid = tables.procs.get(child).pid;
                if tables.procs.get(child).sched.placement.is_some() {
                    tables.mlfq.dequeue(&mut tables.procs, child);
                }
                for stack in tables.procs.release(child) {
                    machine.free_stack(stack);
                }
                self.stats.record_reap();
                log::debug!("pid {} reaped by {}", pid, my_pid);
                return Ok(pid);
            }

            if !have_children {
                return Err(SchedulerError::NoChildren);
            }
            if tables.procs.get(me).killed {
                return Err(SchedulerError::Killed);
            }
            guard = self.sleep_locked(guard, cpu, Channel::Process(my_pid), machine)?;
        }
    }

    /// Add a runnable thread to the calling process.
    pub fn thread_create<M: Machine>(
        &self,
        cpu: CpuId,
        entry: usize,
        arg: usize,
        machine: &M,
    ) -> SchedulerResult<Tid> {
        let mut guard = self.inner.lock();
        let tables = &mut *guard;
        let slot = tables.running(cpu)?;

        let proc = tables.procs.get(slot);
        if !proc.threads.iter().any(|t| t.state == ThreadState::Unused) {
            return Err(SchedulerError::ThreadLimit {
                pid: proc.pid,
                max: self.config.nthread,
            });
        }
        let stack = machine
            .allocate_stack()
            .ok_or(SchedulerError::StackAllocationFailed)?;

        let tid = tables.procs.alloc_tid();
        let proc = tables.procs.get_mut(slot);
        let idx = match dispatch::claim_thread(proc, tid) {
            Some(idx) => idx,
            None => {
                machine.free_stack(stack);
                return Err(SchedulerError::ThreadLimit {
                    pid: proc.pid,
                    max: self.config.nthread,
                });
            }
        };
        let thread = &mut proc.threads[idx];
        thread.context = Context::entry(&stack, entry, arg);
        thread.stack = Some(stack);
        thread.state = ThreadState::Runnable;
        proc.refresh_state();

        log::debug!("pid {}: created thread {}", proc.pid, tid);
        Ok(tid)
    }

    /// Finish the calling thread with `retval` and wake its joiners.
    pub fn thread_exit<M: Machine>(
        &self,
        cpu: CpuId,
        retval: usize,
        machine: &M,
    ) -> SchedulerResult<()> {
        let mut guard = self.inner.lock();
        let tables = &mut *guard;
        let slot = tables.running(cpu)?;
        let thread = tables.procs.get_mut(slot).active_thread_mut();
        thread.retval = retval;
        thread.state = ThreadState::Zombie;
        thread.channel = None;
        let tid = thread.tid;
        tables.wakeup(Channel::Thread(tid));

        drop(self.sched(guard, cpu, machine));
        Ok(())
    }

    /// Wait for thread `tid` of the calling process to finish and collect
    /// its return value.
    pub fn thread_join<M: Machine>(
        &self,
        cpu: CpuId,
        tid: Tid,
        machine: &M,
    ) -> SchedulerResult<usize> {
        let mut guard = self.inner.lock();
        let slot = guard.running(cpu)?;
        if guard.procs.get(slot).active_thread().tid == tid {
            return Err(SchedulerError::ThreadNotFound { tid });
        }

        loop {
            let proc = guard.procs.get_mut(slot);
            let idx =
                dispatch::find_thread(proc, tid).ok_or(SchedulerError::ThreadNotFound { tid })?;
            if let Some((retval, stack)) = dispatch::try_reap(proc, idx) {
                if let Some(stack) = stack {
                    machine.free_stack(stack);
                }
                return Ok(retval);
            }
            if proc.killed {
                return Err(SchedulerError::Killed);
            }
            guard = self.sleep_locked(guard, cpu, Channel::Thread(tid), machine)?;
        }
    }

    fn switch_locked<M: Machine>(
        &self,
        tables: &mut SchedTables,
        slot: ProcSlot,
        machine: &M,
    ) -> SwitchOutcome {
        let proc = tables.procs.get_mut(slot);
        let outcome = dispatch::rotate(proc);
        if let SwitchOutcome::Switched { from, to } = outcome {
            let target = proc.threads[to].context;
            machine.transfer(&mut proc.threads[from].context, target);
            self.stats.record_thread_switch();
        }
        outcome
    }

    /// Hand the CPU to the next runnable thread of the calling process.
    pub fn switch_thread<M: Machine>(
        &self,
        cpu: CpuId,
        machine: &M,
    ) -> SchedulerResult<SwitchOutcome> {
        let mut guard = self.inner.lock();
        let slot = guard.running(cpu)?;
        Ok(self.switch_locked(&mut guard, slot, machine))
    }

    /// Timer interrupt hook for `cpu`.
    ///
    /// A process whose slice is used up relinquishes; otherwise its threads
    /// take turns.
    pub fn on_timer_tick<M: Machine>(&self, cpu: CpuId, machine: &M) -> TimerAction {
        let mut guard = self.inner.lock();
        let Ok(slot) = guard.running(cpu) else {
            return TimerAction::Idle;
        };
        let now = machine.uptime();

        let tables = &mut *guard;
        if tables.mlfq.should_relinquish(tables.procs.get(slot), now) {
            tables.procs.get_mut(slot).active_thread_mut().state = ThreadState::Runnable;
            self.stats.record_yield();
            drop(self.sched(guard, cpu, machine));
            TimerAction::Relinquished
        } else {
            TimerAction::Thread(self.switch_locked(tables, slot, machine))
        }
    }

    // ═══════════════════════════════════════════════════════════════
    // Introspection
    // ═══════════════════════════════════════════════════════════════

    pub fn snapshot<M: Machine>(&self, machine: &M) -> SchedSnapshot {
        let guard = self.inner.lock();
        let tables = &*guard;
        let pid_of = |slot: ProcSlot| tables.procs.get(slot).pid;

        let stride: Vec<StrideSlotInfo> = tables
            .mlfq
            .stride()
            .entries()
            .map(|(slot, participant, tickets, pass)| StrideSlotInfo {
                slot,
                pid: SchedSnapshot::participant_pid(participant, pid_of),
                tickets,
                pass,
            })
            .collect();
        let levels: Vec<Vec<Pid>> = (0..tables.mlfq.levels())
            .map(|level| {
                tables
                    .mlfq
                    .queue(level)
                    .iter()
                    .flatten()
                    .map(|&slot| pid_of(slot))
                    .collect::<Vec<_>>()
            })
            .collect();
        let procs: Vec<ProcInfo> = tables
            .procs
            .iter()
            .filter(|(_, proc)| proc.is_live())
            .map(|(_, proc)| ProcInfo {
                pid: proc.pid,
                parent: proc.parent,
                name: proc.name.clone(),
                state: proc.state,
                level: proc.level(),
                elapsed: proc.sched.elapsed,
                killed: proc.killed,
                threads: proc.threads.iter().filter(|t| t.state.is_live()).count(),
            })
            .collect();

        SchedSnapshot {
            uptime: machine.uptime(),
            stride,
            levels,
            procs,
        }
    }

    /// Log the scheduling tables at debug level.
    pub fn dump<M: Machine>(&self, machine: &M) {
        self.snapshot(machine).log();
    }
}

static SCHEDULER: Once<Scheduler> = Once::new();

/// Initialize the global scheduler
pub fn init(config: SchedConfig) -> SchedulerResult<&'static Scheduler> {
    if let Some(scheduler) = SCHEDULER.get() {
        return Ok(scheduler);
    }
    let scheduler = Scheduler::new(config)?;
    log::info!(
        "scheduler: {} levels, {} procs x {} threads, {} cpus",
        config.levels,
        config.nproc,
        config.nthread,
        config.ncpu
    );
    Ok(SCHEDULER.call_once(|| scheduler))
}

/// Global scheduler, once `init` has run
pub fn get() -> Option<&'static Scheduler> {
    SCHEDULER.get()
}
