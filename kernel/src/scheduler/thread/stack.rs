//! Stack - Thread stack handles
//!
//! The memory behind a stack belongs to the machine layer; the scheduler only
//! carries the handle from `Machine::allocate_stack` until it hands it back
//! through `Machine::free_stack`.

/// Thread stack
#[derive(Debug, PartialEq, Eq)]
pub struct Stack {
    /// Stack base (lowest address)
    base: usize,

    /// Stack size (bytes)
    size: usize,
}

impl Stack {
    /// Wrap a region handed out by the machine layer
    pub const fn new(base: usize, size: usize) -> Self {
        Self { base, size }
    }

    /// Get stack top address (initial stack pointer)
    pub fn top(&self) -> usize {
        self.base + self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stack_top() {
        let stack = Stack::new(0x1000, 0x1000);
        assert_eq!(stack.top(), 0x2000);
    }
}
