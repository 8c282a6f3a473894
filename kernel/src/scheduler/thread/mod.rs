//! Threads and the per-process dispatch layer

pub mod dispatch;
pub mod stack;
pub mod state;
pub mod thread;

pub use dispatch::SwitchOutcome;
pub use stack::Stack;
pub use state::{ProcState, ThreadState};
pub use thread::{Channel, CpuId, Pid, Thread, Tid};
