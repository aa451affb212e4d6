//! Gas metering and cost rules

use kiln_primitives::Word;

use crate::error::{ExitError, ExitResult};
use crate::memory::Memory;
use crate::stack::Stack;

/// Gas costs and machine limits
pub mod cost {
    /// Zero gas
    pub const ZERO: u64 = 0;
    /// Base gas
    pub const BASE: u64 = 2;
    /// Very low gas
    pub const VERYLOW: u64 = 3;
    /// Low gas
    pub const LOW: u64 = 5;
    /// Mid gas
    pub const MID: u64 = 8;
    /// High gas
    pub const HIGH: u64 = 10;

    /// Jump dest gas
    pub const JUMPDEST: u64 = 1;
    /// Exp gas
    pub const EXP: u64 = 10;
    /// Exp gas per byte of exponent
    pub const EXP_BYTE: u64 = 50;

    /// Memory gas per word
    pub const MEMORY: u64 = 3;
    /// Quadratic memory divisor
    pub const MEMORY_QUAD_DIVISOR: u64 = 512;

    /// Max call depth
    pub const MAX_CALL_DEPTH: usize = 1024;
    /// Max stack size
    pub const MAX_STACK_SIZE: usize = 1024;
    /// Largest addressable memory size in bytes
    pub const MAX_MEMORY_SIZE: usize = u32::MAX as usize;
}

/// How much gas a step costs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostRule {
    /// Fixed tier cost
    Static(u64),
    /// `EXP + EXP_BYTE * byte_len(exponent)`, exponent at stack distance 1
    Exp,
    /// `base` plus expansion gas for the range the step touches
    Memory {
        /// Static part of the cost
        base: u64,
        /// Stack distance of the offset operand
        offset: usize,
        /// Length of the touched range
        len: MemoryLen,
    },
}

/// Length of a memory range touched by an instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryLen {
    /// Known width (32 for MLOAD/MSTORE, 1 for MSTORE8)
    Fixed(usize),
    /// Taken from the operand at this stack distance
    Operand(usize),
}

/// Gas accounting for one frame
///
/// `remaining + spent == limit` holds after every committed charge; a failed
/// charge changes nothing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GasMeter {
    limit: u64,
    remaining: u64,
    spent: u64,
    refunded: i64,
}

impl GasMeter {
    /// Create a meter with the full budget available
    pub fn new(limit: u64) -> Self {
        Self {
            limit,
            remaining: limit,
            spent: 0,
            refunded: 0,
        }
    }

    /// Deduct `cost`, or fail with `OutOfGas` leaving the meter untouched
    pub fn charge(&mut self, cost: u64) -> ExitResult<()> {
        if cost > self.remaining {
            return Err(ExitError::OutOfGas);
        }
        self.remaining -= cost;
        self.spent += cost;
        Ok(())
    }

    /// Adjust the refund counter; may go negative
    pub fn refund(&mut self, delta: i64) {
        self.refunded = self.refunded.saturating_add(delta);
    }

    /// Initial budget
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Gas still available
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Gas consumed so far
    pub fn spent(&self) -> u64 {
        self.spent
    }

    /// Accumulated refund
    pub fn refunded(&self) -> i64 {
        self.refunded
    }
}

/// EXP cost for the given exponent
pub fn exp_gas(exponent: &Word) -> u64 {
    cost::EXP + cost::EXP_BYTE * u64::from(exponent.byte_len())
}

/// Expansion cost to grow memory from `current_size` to `new_size` bytes.
/// `None` if the cost does not fit in a `u64`.
pub fn memory_gas(current_size: usize, new_size: usize) -> Option<u64> {
    if new_size <= current_size {
        return Some(0);
    }
    let new_cost = memory_word_cost(new_size.div_ceil(32))?;
    let old_cost = memory_word_cost(current_size.div_ceil(32))?;
    Some(new_cost - old_cost)
}

/// Total memory cost for a number of words
fn memory_word_cost(words: usize) -> Option<u64> {
    let words = words as u128;
    let total = u128::from(cost::MEMORY) * words + words * words / u128::from(cost::MEMORY_QUAD_DIVISOR);
    u64::try_from(total).ok()
}

/// Expansion cost of touching `len` bytes at `offset`.
///
/// A zero length costs nothing whatever the offset. Ranges past
/// [`cost::MAX_MEMORY_SIZE`] can never be paid for and fail with `OutOfGas`.
pub fn memory_expansion_gas(memory: &Memory, offset: Word, len: Word) -> ExitResult<u64> {
    if len.is_zero() {
        return Ok(0);
    }
    let end = offset
        .to_usize()
        .zip(len.to_usize())
        .and_then(|(offset, len)| offset.checked_add(len))
        .filter(|end| *end <= cost::MAX_MEMORY_SIZE)
        .ok_or(ExitError::OutOfGas)?;
    memory_gas(memory.len(), end).ok_or(ExitError::OutOfGas)
}

/// Cost of the next step under `rule`. Operands are peeked, never popped.
pub fn step_cost(rule: CostRule, stack: &Stack, memory: &Memory) -> ExitResult<u64> {
    match rule {
        CostRule::Static(gas) => Ok(gas),
        CostRule::Exp => Ok(exp_gas(&stack.peek(1)?)),
        CostRule::Memory { base, offset, len } => {
            let offset = stack.peek(offset)?;
            let len = match len {
                MemoryLen::Fixed(width) => Word::from(width),
                MemoryLen::Operand(distance) => stack.peek(distance)?,
            };
            let expansion = memory_expansion_gas(memory, offset, len)?;
            base.checked_add(expansion).ok_or(ExitError::OutOfGas)
        }
    }
}
