//! Stride meta-scheduler
//!
//! Proportional-share scheduling over a small set of participants. Slot 0 is
//! the MLFQ as a whole and always holds whatever tickets are not handed out;
//! the other slots hold processes that asked for a fixed CPU share. Each
//! participant carries a pass value (virtual time) that advances inversely to
//! its tickets, and the runnable participant with the smallest pass runs next.

use alloc::vec::Vec;

use super::error::{SchedulerError, SchedulerResult};
use super::table::ProcSlot;
use crate::scheduler::config::{SchedConfig, Tick, PASS_SCALE};

/// Slot reserved for the MLFQ participant
pub const MLFQ_SLOT: usize = 0;

/// Virtual time, in `PASS_SCALE` units per tick
pub type Pass = i64;

/// Something the stride table can pick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Participant {
    /// The whole multilevel feedback queue
    Mlfq,
    /// A process holding its own share
    Process(ProcSlot),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    participant: Participant,
    tickets: u32,
    pass: Pass,
}

/// Stride table
pub struct StrideTable {
    slots: Vec<Option<Entry>>,
    budget: u32,
    max_share: u32,
    max_pass: Pass,
    rebase_floor: Pass,
    quantum: Tick,
}

impl StrideTable {
    /// Empty table with the MLFQ in slot 0 holding the whole budget.
    pub fn new(config: &SchedConfig) -> Self {
        let mut slots = Vec::with_capacity(config.nproc + 1);
        slots.resize(config.nproc + 1, None);
        slots[MLFQ_SLOT] = Some(Entry {
            participant: Participant::Mlfq,
            tickets: config.ticket_budget,
            pass: 0,
        });
        Self {
            slots,
            budget: config.ticket_budget,
            max_share: config.max_share,
            max_pass: config.max_pass,
            rebase_floor: config.rebase_floor,
            quantum: config.stride_quantum,
        }
    }

    /// Total ticket budget
    pub fn budget(&self) -> u32 {
        self.budget
    }

    /// Tickets left to the MLFQ
    pub fn residual(&self) -> u32 {
        self.tickets(MLFQ_SLOT).unwrap_or(0)
    }

    /// Tickets handed out to share holders
    pub fn allocated(&self) -> u32 {
        self.budget - self.residual()
    }

    /// Quantum of a share holder, in ticks
    pub fn quantum(&self) -> Tick {
        self.quantum
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn tickets(&self, slot: usize) -> Option<u32> {
        self.slots.get(slot)?.map(|e| e.tickets)
    }

    /// Pass value of `slot`, `None` when the slot is empty
    pub fn pass(&self, slot: usize) -> Option<Pass> {
        self.slots.get(slot)?.map(|e| e.pass)
    }

    pub fn participant(&self, slot: usize) -> Option<Participant> {
        self.slots.get(slot)?.map(|e| e.participant)
    }

    /// Occupied slots as `(slot, participant, tickets, pass)`
    pub fn entries(&self) -> impl Iterator<Item = (usize, Participant, u32, Pass)> + '_ {
        self.slots.iter().enumerate().filter_map(|(slot, entry)| {
            entry.map(|e| (slot, e.participant, e.tickets, e.pass))
        })
    }

    /// Smallest pass among occupied slots
    fn min_pass(&self) -> Pass {
        self.slots
            .iter()
            .flatten()
            .map(|e| e.pass)
            .min()
            .unwrap_or(0)
    }

    /// Give `participant` a share of `requested` tickets.
    ///
    /// The newcomer starts at the current minimum pass so it cannot claim the
    /// CPU for the virtual time it was not around for. Nothing changes on
    /// failure.
    pub fn admit(&mut self, participant: Participant, requested: i32) -> SchedulerResult<usize> {
        if requested <= 0 {
            return Err(SchedulerError::InvalidShare { requested });
        }
        let available = self.max_share - self.allocated();
        if requested as u32 > available {
            return Err(SchedulerError::ShareExceeded {
                requested,
                available,
            });
        }
        let slot = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(SchedulerError::StrideTableFull)?;

        let tickets = requested as u32;
        let pass = self.min_pass();
        if let Some(mlfq) = self.slots[MLFQ_SLOT].as_mut() {
            mlfq.tickets -= tickets;
        }
        self.slots[slot] = Some(Entry {
            participant,
            tickets,
            pass,
        });

        log::debug!(
            "stride: admitted {:?} in slot {} with {} tickets (residual {})",
            participant,
            slot,
            tickets,
            self.residual()
        );
        Ok(slot)
    }

    /// Free `slot`, returning its tickets to the MLFQ.
    pub fn remove(&mut self, slot: usize) {
        if slot == MLFQ_SLOT {
            return;
        }
        let Some(entry) = self.slots.get_mut(slot).and_then(Option::take) else {
            return;
        };
        if let Some(mlfq) = self.slots[MLFQ_SLOT].as_mut() {
            mlfq.tickets += entry.tickets;
        }
        log::debug!(
            "stride: removed {:?} from slot {} (residual {})",
            entry.participant,
            slot,
            self.residual()
        );
    }

    /// Advance the pass of `slot` by one stride.
    ///
    /// When the charged pass crosses the ceiling, every positive pass drops by
    /// `max_pass - rebase_floor`; relative order is preserved. Returns whether
    /// a rebase happened.
    pub fn charge(&mut self, slot: usize) -> bool {
        let budget = self.budget as i64;
        let Some(entry) = self.slots.get_mut(slot).and_then(Option::as_mut) else {
            return false;
        };
        entry.pass += budget * PASS_SCALE / entry.tickets as i64;
        if entry.pass <= self.max_pass {
            return false;
        }

        let shift = self.max_pass - self.rebase_floor;
        for entry in self.slots.iter_mut().flatten() {
            if entry.pass > 0 {
                entry.pass -= shift;
            }
        }
        log::trace!("stride: rebased pass values by {}", shift);
        true
    }

    /// Runnable participant with the smallest pass; ties go to the lowest slot.
    pub fn select_next(
        &self,
        mut runnable: impl FnMut(Participant) -> bool,
    ) -> Option<(usize, Participant)> {
        let mut best: Option<(usize, Entry)> = None;
        for (slot, entry) in self.slots.iter().enumerate() {
            let Some(entry) = entry else {
                continue;
            };
            if best.map_or(false, |(_, b)| b.pass <= entry.pass) {
                continue;
            }
            if runnable(entry.participant) {
                best = Some((slot, *entry));
            }
        }
        best.map(|(slot, entry)| (slot, entry.participant))
    }
}
