//! Scripted machine for host tests
//!
//! Every `resume` pops the next script and runs it as "the dispatched thread";
//! without a script the thread burns one tick and gets preempted. `suspend`
//! runs the next suspend hook, which stands in for other CPUs making progress
//! while the caller is blocked. Without a hook the caller is rescheduled at
//! once; a long run of such empty suspends means a blocked caller can never be
//! woken, and the machine panics instead of spinning forever.

use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use super::{Context, Machine};
use crate::scheduler::config::Tick;
use crate::scheduler::thread::{CpuId, Pid, Stack};

pub(crate) type Script<'a> = Box<dyn FnOnce(&ScriptedMachine<'a>, CpuId) + 'a>;

pub(crate) struct ScriptedMachine<'a> {
    clock: Cell<Tick>,
    next_stack: Cell<usize>,
    stacks_left: Cell<Option<usize>>,
    resumes: RefCell<VecDeque<Script<'a>>>,
    suspends: RefCell<VecDeque<Script<'a>>>,
    empty_suspends: Cell<usize>,
    pub freed: RefCell<Vec<Stack>>,
    pub transfers: RefCell<Vec<(Context, Context)>>,
    pub address_spaces: RefCell<Vec<Pid>>,
}

impl<'a> ScriptedMachine<'a> {
    pub fn new() -> Self {
        Self {
            clock: Cell::new(0),
            next_stack: Cell::new(0x10_0000),
            stacks_left: Cell::new(None),
            resumes: RefCell::new(VecDeque::new()),
            suspends: RefCell::new(VecDeque::new()),
            empty_suspends: Cell::new(0),
            freed: RefCell::new(Vec::new()),
            transfers: RefCell::new(Vec::new()),
            address_spaces: RefCell::new(Vec::new()),
        }
    }

    pub fn advance(&self, ticks: Tick) {
        self.clock.set(self.clock.get() + ticks);
    }

    /// Fail stack allocation after `count` more successes
    pub fn limit_stacks(&self, count: usize) {
        self.stacks_left.set(Some(count));
    }

    pub fn on_resume(&self, script: impl FnOnce(&ScriptedMachine<'a>, CpuId) + 'a) {
        self.resumes.borrow_mut().push_back(Box::new(script));
    }

    pub fn on_suspend(&self, script: impl FnOnce(&ScriptedMachine<'a>, CpuId) + 'a) {
        self.suspends.borrow_mut().push_back(Box::new(script));
    }

    pub fn pending_scripts(&self) -> usize {
        self.resumes.borrow().len() + self.suspends.borrow().len()
    }
}

impl<'a> Machine for ScriptedMachine<'a> {
    fn uptime(&self) -> Tick {
        self.clock.get()
    }

    fn enable_interrupts(&self) {}

    fn switch_address_space(&self, pid: Pid) {
        self.address_spaces.borrow_mut().push(pid);
    }

    fn switch_kernel_address_space(&self) {}

    fn allocate_stack(&self) -> Option<Stack> {
        if let Some(left) = self.stacks_left.get() {
            if left == 0 {
                return None;
            }
            self.stacks_left.set(Some(left - 1));
        }
        let base = self.next_stack.get();
        self.next_stack.set(base + 0x1000);
        Some(Stack::new(base, 0x1000))
    }

    fn free_stack(&self, stack: Stack) {
        self.freed.borrow_mut().push(stack);
    }

    fn resume(&self, cpu: CpuId, context: Context) -> Context {
        self.empty_suspends.set(0);
        let script = self.resumes.borrow_mut().pop_front();
        match script {
            Some(script) => script(self, cpu),
            None => self.advance(1),
        }
        context
    }

    fn suspend(&self, cpu: CpuId) {
        let script = self.suspends.borrow_mut().pop_front();
        match script {
            Some(script) => {
                self.empty_suspends.set(0);
                script(self, cpu);
            }
            None => {
                let empty = self.empty_suspends.get() + 1;
                assert!(empty < 64, "cpu {} blocked with nothing left to run", cpu);
                self.empty_suspends.set(empty);
            }
        }
    }

    fn transfer(&self, from: &mut Context, to: Context) {
        self.transfers.borrow_mut().push((*from, to));
    }
}
