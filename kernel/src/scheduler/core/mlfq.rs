//! Multilevel feedback queue
//!
//! Ordinary processes live here, in `levels` fixed-capacity queues scanned
//! from level 0 down. A process that accumulates `expire[level]` ticks at a
//! level moves one level down (numerically up); a periodic boost lifts
//! everything back to level 0. Within a level, a per-level cursor gives
//! round-robin order.
//!
//! The MLFQ also owns the stride table and sits in its slot 0: the whole
//! queue competes against share-holding processes as a single participant.

use alloc::vec::Vec;

use super::error::{SchedulerError, SchedulerResult};
use super::stride::{Participant, StrideTable, MLFQ_SLOT};
use super::table::{Placement, ProcSlot, ProcTable, Process};
use crate::scheduler::config::{SchedConfig, Tick};
use crate::scheduler::thread::ProcState;

/// What the driver loop does after a dispatch returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The same process keeps the CPU for the rest of its quantum
    ContinueSame,
    /// Ask the meta-scheduler for a new participant
    PickNew,
}

/// Multilevel feedback queue with its stride meta-scheduler
pub struct Mlfq {
    queues: Vec<Vec<Option<ProcSlot>>>,
    quantum: Vec<Tick>,
    expire: Vec<Tick>,
    /// Next index to examine, per level
    cursor: Vec<usize>,
    live: usize,
    stride: StrideTable,
}

impl Mlfq {
    pub fn new(config: &SchedConfig) -> Self {
        let mut queues = Vec::with_capacity(config.levels);
        for _ in 0..config.levels {
            let mut queue = Vec::with_capacity(config.nproc);
            queue.resize(config.nproc, None);
            queues.push(queue);
        }
        let mut cursor = Vec::with_capacity(config.levels);
        cursor.resize(config.levels, 0);

        Self {
            queues,
            quantum: config.quanta().to_vec(),
            expire: config.expires().to_vec(),
            cursor,
            live: 0,
            stride: StrideTable::new(config),
        }
    }

    pub fn levels(&self) -> usize {
        self.queues.len()
    }

    pub fn quantum(&self, level: usize) -> Tick {
        self.quantum[level]
    }

    pub fn expire(&self, level: usize) -> Tick {
        self.expire[level]
    }

    /// Processes registered with either scheduler
    pub fn live(&self) -> usize {
        self.live
    }

    pub fn stride(&self) -> &StrideTable {
        &self.stride
    }

    pub fn queue(&self, level: usize) -> &[Option<ProcSlot>] {
        &self.queues[level]
    }

    pub fn cursor(&self, level: usize) -> usize {
        self.cursor[level]
    }

    /// Put `slot` into the first empty entry of `level`.
    ///
    /// A process already queued elsewhere in the MLFQ moves; its old entry is
    /// released only once the new one is secured. Elapsed time restarts.
    pub fn enqueue(
        &mut self,
        procs: &mut ProcTable,
        slot: ProcSlot,
        level: usize,
    ) -> SchedulerResult<usize> {
        crate::sched_assert!(level < self.levels(), "mlfq: no level {}", level);
        let proc = procs.get_mut(slot);
        crate::sched_assert!(
            !matches!(proc.sched.placement, Some(Placement::Stride { .. })),
            "mlfq: process {} is owned by the stride table",
            proc.pid
        );

        let index = self.queues[level]
            .iter()
            .position(Option::is_none)
            .ok_or(SchedulerError::QueueFull { level })?;

        if let Some(Placement::Mlfq { level: old, index: old_index }) = proc.sched.placement {
            self.queues[old][old_index] = None;
        }
        self.queues[level][index] = Some(slot);
        proc.sched.placement = Some(Placement::Mlfq { level, index });
        proc.sched.elapsed = 0;
        Ok(index)
    }

    /// Register a new process at level 0.
    pub fn register(&mut self, procs: &mut ProcTable, slot: ProcSlot) -> SchedulerResult<()> {
        let proc = procs.get(slot);
        if proc.sched.placement.is_some() {
            return Err(SchedulerError::AlreadyRegistered { pid: proc.pid });
        }
        self.enqueue(procs, slot, 0)?;
        self.live += 1;
        Ok(())
    }

    /// Remove `slot` from whichever scheduler owns it.
    pub fn dequeue(&mut self, procs: &mut ProcTable, slot: ProcSlot) {
        let proc = procs.get_mut(slot);
        match proc.sched.placement.take() {
            Some(Placement::Stride { slot: stride_slot }) => self.stride.remove(stride_slot),
            Some(Placement::Mlfq { level, index }) => {
                if self.queues[level][index] == Some(slot) {
                    self.queues[level][index] = None;
                }
            }
            None => {}
        }
        self.live = self.live.saturating_sub(1);
    }

    /// Move `slot` from the MLFQ into the stride table with `percent` tickets.
    ///
    /// On failure the process keeps its MLFQ placement.
    pub fn request_share(
        &mut self,
        procs: &mut ProcTable,
        slot: ProcSlot,
        percent: i32,
    ) -> SchedulerResult<()> {
        let proc = procs.get_mut(slot);
        let (level, index) = match proc.sched.placement {
            Some(Placement::Mlfq { level, index }) => (level, index),
            Some(Placement::Stride { .. }) => {
                return Err(SchedulerError::AlreadyShared { pid: proc.pid })
            }
            None => return Err(SchedulerError::ProcessNotFound { pid: proc.pid }),
        };

        let stride_slot = self.stride.admit(Participant::Process(slot), percent)?;
        self.queues[level][index] = None;
        proc.sched.placement = Some(Placement::Stride { slot: stride_slot });
        log::info!(
            "mlfq: process {} moved to stride slot {} with {}% share",
            proc.pid,
            stride_slot,
            percent
        );
        Ok(())
    }

    /// Charge the MLFQ's own stride pass.
    pub fn charge_self(&mut self) -> bool {
        self.stride.charge(MLFQ_SLOT)
    }

    /// Account a finished dispatch of `slot` and decide what runs next.
    ///
    /// The caller has already added the dispatch's ticks to `elapsed` and
    /// `turn`.
    pub fn advance(&mut self, procs: &mut ProcTable, slot: ProcSlot) -> Decision {
        let proc = procs.get(slot);
        if proc.state == ProcState::Zombie || proc.killed {
            return Decision::PickNew;
        }
        let (pid, elapsed, turn) = (proc.pid, proc.sched.elapsed, proc.sched.turn);
        let placement = proc.sched.placement;

        match placement {
            Some(Placement::Stride { slot: stride_slot }) => {
                self.stride.charge(stride_slot);
                Decision::PickNew
            }
            Some(Placement::Mlfq { level, .. }) => {
                self.stride.charge(MLFQ_SLOT);

                if level + 1 < self.levels() && elapsed >= self.expire[level] {
                    let promoted = self.enqueue(procs, slot, level + 1);
                    crate::sched_assert!(
                        promoted.is_ok(),
                        "mlfq: level elevation failed for process {}",
                        pid
                    );
                    log::debug!("mlfq: process {} moved to level {}", pid, level + 1);
                    return Decision::PickNew;
                }

                if turn < self.quantum[level] {
                    Decision::ContinueSame
                } else {
                    Decision::PickNew
                }
            }
            None => Decision::PickNew,
        }
    }

    /// Next dispatchable MLFQ process and its runnable thread.
    ///
    /// Level 0 first; within a level the scan resumes at the saved cursor and
    /// leaves it just past the process returned.
    pub fn select_next(&mut self, procs: &ProcTable) -> Option<(ProcSlot, usize)> {
        for level in 0..self.levels() {
            let queue = &self.queues[level];
            let cap = queue.len();
            let start = self.cursor[level];
            for step in 0..cap {
                let index = (start + step) % cap;
                let Some(slot) = queue[index] else {
                    continue;
                };
                if let Some(thread) = procs.get(slot).dispatchable() {
                    self.cursor[level] = (index + 1) % cap;
                    return Some((slot, thread));
                }
            }
        }
        None
    }

    fn has_runnable(&self, procs: &ProcTable) -> bool {
        self.queues
            .iter()
            .flatten()
            .flatten()
            .any(|&slot| procs.get(slot).dispatchable().is_some())
    }

    /// Two-level pick: the stride table chooses a participant and the MLFQ
    /// resolves its own turn to a process.
    pub fn pick_next(&mut self, procs: &ProcTable) -> Option<(ProcSlot, usize)> {
        let mlfq_ready = self.has_runnable(procs);
        let (_, participant) = self.stride.select_next(|participant| match participant {
            Participant::Mlfq => mlfq_ready,
            Participant::Process(slot) => procs.get(slot).dispatchable().is_some(),
        })?;

        match participant {
            Participant::Mlfq => self.select_next(procs),
            Participant::Process(slot) => procs.get(slot).dispatchable().map(|t| (slot, t)),
        }
    }

    /// Lift every process below level 0 back to level 0.
    ///
    /// Returns how many processes moved.
    pub fn boost(&mut self, procs: &mut ProcTable) -> SchedulerResult<usize> {
        let mut moved = 0;
        for level in 1..self.levels() {
            for index in 0..self.queues[level].len() {
                let Some(slot) = self.queues[level][index] else {
                    continue;
                };
                let top = self.queues[0]
                    .iter()
                    .position(Option::is_none)
                    .ok_or(SchedulerError::QueueFull { level: 0 })?;

                self.queues[level][index] = None;
                self.queues[0][top] = Some(slot);
                let proc = procs.get_mut(slot);
                proc.sched.placement = Some(Placement::Mlfq { level: 0, index: top });
                proc.sched.elapsed = 0;
                moved += 1;
            }
        }
        if moved > 0 {
            log::debug!("mlfq: boosted {} processes to level 0", moved);
        }
        Ok(moved)
    }

    /// Whether a timer interrupt should force `proc` off the CPU at `now`.
    pub fn should_relinquish(&self, proc: &Process, now: Tick) -> bool {
        let ran = now.saturating_sub(proc.sched.start);
        match proc.sched.placement {
            Some(Placement::Stride { .. }) => ran >= self.stride.quantum(),
            Some(Placement::Mlfq { level, .. }) => proc.sched.turn + ran >= self.quantum[level],
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::thread::ThreadState;
    use proptest::prelude::*;

    fn setup(config: &SchedConfig, count: usize) -> (Mlfq, ProcTable, Vec<ProcSlot>) {
        let mut mlfq = Mlfq::new(config);
        let mut procs = ProcTable::new(config.nproc, config.nthread);
        let mut slots = Vec::new();
        for _ in 0..count {
            let slot = procs.claim(None, "p").unwrap();
            let proc = procs.get_mut(slot);
            proc.state = ProcState::Runnable;
            proc.threads[0].state = ThreadState::Runnable;
            mlfq.register(&mut procs, slot).unwrap();
            slots.push(slot);
        }
        (mlfq, procs, slots)
    }

    fn small() -> SchedConfig {
        SchedConfig {
            nproc: 4,
            nthread: 2,
            ..SchedConfig::DEFAULT
        }
    }

    /// Every registered process sits in exactly one slot matching its record.
    fn assert_placements(mlfq: &Mlfq, procs: &ProcTable) {
        for (slot, proc) in procs.iter().filter(|(_, p)| p.is_live()) {
            let mlfq_hits: usize = (0..mlfq.levels())
                .map(|l| mlfq.queue(l).iter().filter(|&&q| q == Some(slot)).count())
                .sum();
            let stride_hits = mlfq
                .stride()
                .entries()
                .filter(|(_, p, _, _)| *p == Participant::Process(slot))
                .count();
            match proc.sched.placement {
                Some(Placement::Mlfq { level, index }) => {
                    assert_eq!(mlfq.queue(level)[index], Some(slot));
                    assert_eq!((mlfq_hits, stride_hits), (1, 0));
                }
                Some(Placement::Stride { slot: s }) => {
                    assert_eq!(mlfq.stride().participant(s), Some(Participant::Process(slot)));
                    assert_eq!((mlfq_hits, stride_hits), (0, 1));
                }
                None => panic!("live process {} is unplaced", proc.pid),
            }
        }
    }

    #[test]
    fn test_enqueue_moves_between_levels() {
        let config = SchedConfig {
            nproc: 2,
            ..SchedConfig::DEFAULT
        };
        let (mut mlfq, mut procs, slots) = setup(&config, 2);
        mlfq.enqueue(&mut procs, slots[0], 1).unwrap();
        mlfq.enqueue(&mut procs, slots[1], 1).unwrap();
        assert_eq!(mlfq.enqueue(&mut procs, slots[0], 2), Ok(0));
        mlfq.enqueue(&mut procs, slots[1], 2).unwrap();
        assert_eq!(mlfq.queue(2), &[Some(slots[0]), Some(slots[1])]);
        assert_eq!(mlfq.queue(1), &[None, None]);
        assert_placements(&mlfq, &procs);
    }

    #[test]
    fn test_enqueue_rejects_when_no_room() {
        let config = SchedConfig {
            nproc: 1,
            ..SchedConfig::DEFAULT
        };
        let mut mlfq = Mlfq::new(&config);
        let mut procs = ProcTable::new(2, 1);
        let a = procs.claim(None, "a").unwrap();
        let b = procs.claim(None, "b").unwrap();
        mlfq.register(&mut procs, a).unwrap();
        assert_eq!(
            mlfq.register(&mut procs, b),
            Err(SchedulerError::QueueFull { level: 0 })
        );
        assert_eq!(procs.get(b).sched.placement, None);
        assert_eq!(mlfq.live(), 1);
    }

    #[test]
    fn test_register_twice() {
        let (mut mlfq, mut procs, slots) = setup(&small(), 1);
        assert!(matches!(
            mlfq.register(&mut procs, slots[0]),
            Err(SchedulerError::AlreadyRegistered { .. })
        ));
        assert_eq!(mlfq.live(), 1);
    }

    #[test]
    fn test_promotion_after_expire() {
        let config = small().with_levels(&[1, 2, 4], &[5, 10, 20]).unwrap();
        let (mut mlfq, mut procs, slots) = setup(&config, 1);
        let slot = slots[0];

        for round in 1..=5 {
            let proc = procs.get_mut(slot);
            proc.sched.elapsed += 1;
            proc.sched.turn = 1;
            let decision = mlfq.advance(&mut procs, slot);
            assert_eq!(decision, Decision::PickNew);
            if round < 5 {
                assert_eq!(procs.get(slot).level(), Some(0));
            }
        }
        assert_eq!(procs.get(slot).level(), Some(1));
        assert_eq!(procs.get(slot).sched.elapsed, 0);
        assert_placements(&mlfq, &procs);
    }

    #[test]
    fn test_promotion_is_one_level_at_a_time() {
        let config = small().with_levels(&[1, 1, 1], &[1, 1, 100]).unwrap();
        let (mut mlfq, mut procs, slots) = setup(&config, 1);
        let slot = slots[0];
        procs.get_mut(slot).sched.elapsed = 50;
        mlfq.advance(&mut procs, slot);
        assert_eq!(procs.get(slot).level(), Some(1));
        procs.get_mut(slot).sched.elapsed = 50;
        mlfq.advance(&mut procs, slot);
        assert_eq!(procs.get(slot).level(), Some(2));
        // The lowest level never promotes.
        procs.get_mut(slot).sched.elapsed = 500;
        mlfq.advance(&mut procs, slot);
        assert_eq!(procs.get(slot).level(), Some(2));
    }

    #[test]
    fn test_quantum_retention() {
        let (mut mlfq, mut procs, slots) = setup(&small(), 1);
        let slot = slots[0];
        procs.get_mut(slot).sched.turn = 4;
        assert_eq!(mlfq.advance(&mut procs, slot), Decision::ContinueSame);
        procs.get_mut(slot).sched.turn = 5;
        assert_eq!(mlfq.advance(&mut procs, slot), Decision::PickNew);
    }

    #[test]
    fn test_advance_charges_the_right_pass() {
        let (mut mlfq, mut procs, slots) = setup(&small(), 2);
        mlfq.request_share(&mut procs, slots[1], 20).unwrap();
        let stride_slot = match procs.get(slots[1]).sched.placement {
            Some(Placement::Stride { slot }) => slot,
            other => panic!("unexpected placement {:?}", other),
        };

        mlfq.advance(&mut procs, slots[0]);
        assert!(mlfq.stride().pass(MLFQ_SLOT).unwrap() > 0);
        assert_eq!(mlfq.stride().pass(stride_slot), Some(0));

        assert_eq!(mlfq.advance(&mut procs, slots[1]), Decision::PickNew);
        assert!(mlfq.stride().pass(stride_slot).unwrap() > 0);
    }

    #[test]
    fn test_advance_for_terminated_process() {
        let (mut mlfq, mut procs, slots) = setup(&small(), 1);
        procs.get_mut(slots[0]).killed = true;
        assert_eq!(mlfq.advance(&mut procs, slots[0]), Decision::PickNew);
        assert_eq!(mlfq.stride().pass(MLFQ_SLOT), Some(0));
    }

    #[test]
    fn test_round_robin_visits_everyone() {
        let (mut mlfq, procs, slots) = setup(&small(), 3);
        let mut seen = Vec::new();
        for _ in 0..3 {
            let (slot, thread) = mlfq.select_next(&procs).unwrap();
            assert_eq!(thread, 0);
            assert!(!seen.contains(&slot));
            seen.push(slot);
        }
        seen.sort_unstable();
        assert_eq!(seen, slots);
        // Fourth pick starts the next round.
        assert_eq!(mlfq.select_next(&procs).map(|(s, _)| s), Some(slots[0]));
    }

    #[test]
    fn test_select_prefers_higher_priority_and_skips_blocked() {
        let (mut mlfq, mut procs, slots) = setup(&small(), 3);
        mlfq.enqueue(&mut procs, slots[0], 1).unwrap();
        procs.get_mut(slots[1]).threads[0].state = ThreadState::Sleeping;
        procs.get_mut(slots[2]).on_cpu = Some(3);
        assert_eq!(mlfq.select_next(&procs), Some((slots[0], 0)));

        procs.get_mut(slots[1]).threads[0].state = ThreadState::Runnable;
        assert_eq!(mlfq.select_next(&procs), Some((slots[1], 0)));

        procs.get_mut(slots[0]).threads[0].state = ThreadState::Sleeping;
        procs.get_mut(slots[1]).threads[0].state = ThreadState::Sleeping;
        assert_eq!(mlfq.select_next(&procs), None);
    }

    #[test]
    fn test_boost_lifts_everything() {
        let (mut mlfq, mut procs, slots) = setup(&small(), 3);
        mlfq.enqueue(&mut procs, slots[0], 2).unwrap();
        mlfq.enqueue(&mut procs, slots[1], 1).unwrap();
        procs.get_mut(slots[1]).sched.elapsed = 7;

        assert_eq!(mlfq.boost(&mut procs), Ok(2));
        for &slot in &slots {
            assert_eq!(procs.get(slot).level(), Some(0));
        }
        assert_eq!(procs.get(slots[1]).sched.elapsed, 0);
        assert_placements(&mlfq, &procs);
    }

    #[test]
    fn test_request_share_moves_to_stride() {
        let (mut mlfq, mut procs, slots) = setup(&small(), 1);
        mlfq.request_share(&mut procs, slots[0], 30).unwrap();
        assert_eq!(procs.get(slots[0]).level(), Some(-1));
        assert_eq!(mlfq.queue(0).iter().flatten().count(), 0);
        assert_eq!(mlfq.stride().residual(), 70);
        assert!(matches!(
            mlfq.request_share(&mut procs, slots[0], 10),
            Err(SchedulerError::AlreadyShared { .. })
        ));
        assert_placements(&mlfq, &procs);
    }

    #[test]
    fn test_request_share_failure_keeps_level() {
        let (mut mlfq, mut procs, slots) = setup(&small(), 2);
        mlfq.enqueue(&mut procs, slots[1], 1).unwrap();
        mlfq.request_share(&mut procs, slots[0], 60).unwrap();
        assert!(matches!(
            mlfq.request_share(&mut procs, slots[1], 30),
            Err(SchedulerError::ShareExceeded { .. })
        ));
        assert_eq!(procs.get(slots[1]).level(), Some(1));
        assert_eq!(mlfq.stride().residual(), 40);
        assert_placements(&mlfq, &procs);
    }

    #[test]
    fn test_dequeue_releases_either_owner() {
        let (mut mlfq, mut procs, slots) = setup(&small(), 2);
        mlfq.request_share(&mut procs, slots[1], 25).unwrap();
        mlfq.dequeue(&mut procs, slots[0]);
        mlfq.dequeue(&mut procs, slots[1]);
        assert_eq!(mlfq.live(), 0);
        assert_eq!(mlfq.stride().residual(), 100);
        assert_eq!(mlfq.queue(0).iter().flatten().count(), 0);
        assert_eq!(procs.get(slots[0]).sched.placement, None);
    }

    #[test]
    fn test_pick_next_resolves_participants() {
        let (mut mlfq, mut procs, slots) = setup(&small(), 2);
        mlfq.request_share(&mut procs, slots[1], 50).unwrap();
        // Both passes are 0; slot 0 (the MLFQ) wins the tie.
        assert_eq!(mlfq.pick_next(&procs), Some((slots[0], 0)));
        mlfq.charge_self();
        assert_eq!(mlfq.pick_next(&procs), Some((slots[1], 0)));

        // A blocked MLFQ does not hide a runnable share holder.
        procs.get_mut(slots[0]).threads[0].state = ThreadState::Sleeping;
        for _ in 0..4 {
            assert_eq!(mlfq.pick_next(&procs), Some((slots[1], 0)));
            mlfq.advance(&mut procs, slots[1]);
        }
        procs.get_mut(slots[1]).threads[0].state = ThreadState::Sleeping;
        assert_eq!(mlfq.pick_next(&procs), None);
    }

    #[test]
    fn test_should_relinquish() {
        let (mut mlfq, mut procs, slots) = setup(&small(), 2);
        let proc = procs.get_mut(slots[0]);
        proc.sched.start = 100;
        proc.sched.turn = 2;
        assert!(!mlfq.should_relinquish(procs.get(slots[0]), 102));
        assert!(mlfq.should_relinquish(procs.get(slots[0]), 103));

        mlfq.request_share(&mut procs, slots[1], 10).unwrap();
        procs.get_mut(slots[1]).sched.start = 10;
        assert!(!mlfq.should_relinquish(procs.get(slots[1]), 14));
        assert!(mlfq.should_relinquish(procs.get(slots[1]), 15));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Share(usize, i32),
        Expire(usize),
        Boost,
        Remove(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0usize..4, -5i32..50).prop_map(|(p, s)| Op::Share(p, s)),
            (0usize..4).prop_map(Op::Expire),
            Just(Op::Boost),
            (0usize..4).prop_map(Op::Remove),
        ]
    }

    proptest! {
        #[test]
        fn prop_every_live_process_has_one_slot(ops in prop::collection::vec(op(), 1..48)) {
            let config = small().with_levels(&[1, 1, 1], &[1, 2, 50]).unwrap();
            let (mut mlfq, mut procs, slots) = setup(&config, 4);
            for op in ops {
                match op {
                    Op::Share(p, share) => {
                        if procs.get(slots[p]).is_live() {
                            let _ = mlfq.request_share(&mut procs, slots[p], share);
                        }
                    }
                    Op::Expire(p) => {
                        if procs.get(slots[p]).is_live() {
                            let before = procs.get(slots[p]).level();
                            procs.get_mut(slots[p]).sched.elapsed += 1;
                            mlfq.advance(&mut procs, slots[p]);
                            let after = procs.get(slots[p]).level();
                            match (before, after) {
                                (Some(b), Some(a)) if b >= 0 => {
                                    prop_assert!(a == b || a == b + 1);
                                }
                                _ => {
                                    prop_assert_eq!(before, after);
                                }
                            }
                        }
                    }
                    Op::Boost => {
                        prop_assert!(mlfq.boost(&mut procs).is_ok());
                        for (_, proc) in procs.iter().filter(|(_, p)| p.is_live()) {
                            prop_assert!(proc.level().map_or(false, |l| l <= 0));
                        }
                    }
                    Op::Remove(p) => {
                        if procs.get(slots[p]).is_live() {
                            mlfq.dequeue(&mut procs, slots[p]);
                            procs.release(slots[p]);
                        }
                    }
                }
                assert_placements(&mlfq, &procs);
                prop_assert_eq!(mlfq.live(), procs.live_count());
            }
        }
    }
}
