//! Execution context for a frame

use kiln_primitives::Address;

/// Who a frame runs as and how deep it is nested
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Context {
    /// Account whose code is executing
    pub address: Address,
    /// Account that started this frame
    pub caller: Address,
    /// Nesting depth, 0 for the outermost frame
    pub depth: usize,
}

impl Context {
    /// Create a top-level context
    pub fn new(address: Address, caller: Address) -> Self {
        Self {
            address,
            caller,
            depth: 0,
        }
    }

    /// Context for a frame entered from this one
    pub fn nested(&self, address: Address) -> Self {
        Self {
            address,
            caller: self.address,
            depth: self.depth + 1,
        }
    }
}
