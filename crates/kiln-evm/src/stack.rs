//! Bounded operand stack

use kiln_primitives::Word;

use crate::error::{ExitError, ExitResult};
use crate::gas::cost::MAX_STACK_SIZE;

/// Operand stack (max 1024 words). Failed operations leave it untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stack {
    data: Vec<Word>,
}

impl Stack {
    /// Create a new empty stack
    pub fn new() -> Self {
        Self {
            data: Vec::with_capacity(MAX_STACK_SIZE),
        }
    }

    /// Push a value onto the stack
    pub fn push(&mut self, value: Word) -> ExitResult<()> {
        if self.data.len() >= MAX_STACK_SIZE {
            return Err(ExitError::StackOverflow);
        }
        self.data.push(value);
        Ok(())
    }

    /// Pop the top value
    pub fn pop(&mut self) -> ExitResult<Word> {
        self.data.pop().ok_or(ExitError::StackUnderflow)
    }

    /// Read the value at `distance` from the top (0 = top)
    pub fn peek(&self, distance: usize) -> ExitResult<Word> {
        if distance >= self.data.len() {
            return Err(ExitError::StackUnderflow);
        }
        Ok(self.data[self.data.len() - 1 - distance])
    }

    /// Push a copy of the item at distance `k - 1` (DUPk, 1 = dup top)
    pub fn dup(&mut self, k: usize) -> ExitResult<()> {
        if k == 0 || k > self.data.len() {
            return Err(ExitError::StackUnderflow);
        }
        if self.data.len() >= MAX_STACK_SIZE {
            return Err(ExitError::StackOverflow);
        }
        let value = self.data[self.data.len() - k];
        self.data.push(value);
        Ok(())
    }

    /// Exchange the top with the item at distance `k` (SWAPk)
    pub fn swap(&mut self, k: usize) -> ExitResult<()> {
        if k == 0 || k >= self.data.len() {
            return Err(ExitError::StackUnderflow);
        }
        let len = self.data.len();
        self.data.swap(len - 1, len - 1 - k);
        Ok(())
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if stack is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Items from bottom to top
    pub fn data(&self) -> &[Word] {
        &self.data
    }

    /// Clear the stack
    pub fn clear(&mut self) {
        self.data.clear();
    }
}

impl Default for Stack {
    fn default() -> Self {
        Self::new()
    }
}
