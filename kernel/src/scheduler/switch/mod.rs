//! Context switch contract
//!
//! The scheduling core never touches registers or page tables itself. It asks
//! the machine layer to do so through [`Machine`], whose `resume`/`suspend`
//! pair is a synchronous control handoff: `resume` blocks the calling driver
//! loop until the dispatched thread gives the CPU back.

#[cfg(test)]
pub(crate) mod mock;

use super::config::Tick;
use super::thread::{CpuId, Pid, Stack};

/// Saved thread context
///
/// Only the entry frame is spelled out; whatever else the architecture saves
/// lives on the thread's own stack below `sp`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Context {
    /// Stack pointer
    pub sp: usize,
    /// Instruction pointer
    pub ip: usize,
    /// First argument register
    pub arg: usize,
}

impl Context {
    /// Context that starts executing `entry(arg)` on top of `stack`
    pub fn entry(stack: &Stack, entry: usize, arg: usize) -> Self {
        Self {
            sp: stack.top(),
            ip: entry,
            arg,
        }
    }
}

/// Services the scheduling core consumes from the machine layer
pub trait Machine {
    /// Current tick count
    fn uptime(&self) -> Tick;

    /// Allow interrupts on the calling CPU while the driver loop scans
    fn enable_interrupts(&self);

    /// Activate the address space of `pid` before dispatching into it
    fn switch_address_space(&self, pid: Pid);

    /// Return to the kernel-only address space after a dispatch
    fn switch_kernel_address_space(&self);

    /// Hand out a fresh thread stack
    fn allocate_stack(&self) -> Option<Stack>;

    /// Take back a stack handed out by `allocate_stack`
    fn free_stack(&self, stack: Stack);

    /// Driver side: transfer control to `context` on `cpu`.
    ///
    /// Returns once the dispatched thread relinquishes the CPU, yielding the
    /// context it saved. Called without the scheduler lock held.
    fn resume(&self, cpu: CpuId, context: Context) -> Context;

    /// Thread side: give the CPU back to the driver loop of `cpu`.
    ///
    /// Returns when the calling thread is dispatched again. Called without the
    /// scheduler lock held.
    fn suspend(&self, cpu: CpuId);

    /// Direct switch between two threads of the same process.
    ///
    /// Saves the running thread into `from` and continues at `to`; the
    /// scheduler lock stays held across the call.
    fn transfer(&self, from: &mut Context, to: Context);
}
