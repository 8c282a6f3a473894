//! Thread Structure
//!
//! A thread record is one slot of its owning process's fixed thread array.
//! Slots are recycled once a joined or reaped thread returns to `Unused`.

use super::stack::Stack;
use super::state::ThreadState;
use crate::scheduler::switch::Context;

/// Process ID type
pub type Pid = u32;

/// Thread ID type (unique across all processes)
pub type Tid = u32;

/// CPU index, `0..ncpu`
pub type CpuId = usize;

/// What a sleeping thread waits for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// A child of this process changing state
    Process(Pid),
    /// This thread terminating (joiners)
    Thread(Tid),
    /// Any other kernel object, identified by address
    Address(usize),
}

/// Per-thread record
#[derive(Debug, Default)]
pub struct Thread {
    /// Thread ID (0 while the slot is unused)
    pub tid: Tid,
    /// Lifecycle state
    pub state: ThreadState,
    /// Saved execution context, owned by this thread
    pub context: Context,
    /// Wait channel while `Sleeping`
    pub channel: Option<Channel>,
    /// Value handed to `thread_join`
    pub retval: usize,
    /// Stack backing this thread
    pub stack: Option<Stack>,
}

impl Thread {
    /// Is this thread waiting on `channel`?
    pub fn sleeps_on(&self, channel: Channel) -> bool {
        self.state == ThreadState::Sleeping && self.channel == Some(channel)
    }

    /// Wake the thread if it sleeps; returns whether it did
    pub fn wake(&mut self) -> bool {
        if self.state != ThreadState::Sleeping {
            return false;
        }
        self.state = ThreadState::Runnable;
        self.channel = None;
        true
    }

    /// Return the slot to `Unused`, handing back its stack
    pub fn reset(&mut self) -> Option<Stack> {
        self.tid = 0;
        self.state = ThreadState::Unused;
        self.context = Context::default();
        self.channel = None;
        self.retval = 0;
        self.stack.take()
    }
}
