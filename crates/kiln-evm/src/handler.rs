//! Host capability consulted before every step

use kiln_primitives::Address;

use crate::error::{ExitError, ExitResult};
use crate::gas::cost::MAX_CALL_DEPTH;
use crate::machine::MachineState;
use crate::opcode::Opcode;

/// Host policy hook.
///
/// `before_step` runs before the machine decodes the byte at pc. An `Err`
/// terminates the machine with that error unchanged; no gas is charged and the
/// stack is not touched. `opcode` is `None` past the end of code and for
/// undefined bytes.
pub trait Handler {
    /// Inspect the upcoming step and optionally abort
    fn before_step(
        &mut self,
        state: &MachineState,
        opcode: Option<Opcode>,
        address: &Address,
    ) -> ExitResult<()>;
}

/// Handler that allows everything
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopHandler;

impl Handler for NoopHandler {
    fn before_step(&mut self, _: &MachineState, _: Option<Opcode>, _: &Address) -> ExitResult<()> {
        Ok(())
    }
}

impl<F> Handler for F
where
    F: FnMut(&MachineState, Option<Opcode>, &Address) -> ExitResult<()>,
{
    fn before_step(
        &mut self,
        state: &MachineState,
        opcode: Option<Opcode>,
        address: &Address,
    ) -> ExitResult<()> {
        self(state, opcode, address)
    }
}

/// Rejects frames nested deeper than the call depth limit
#[derive(Clone, Copy, Debug)]
pub struct CallDepthLimit {
    depth: usize,
    limit: usize,
}

impl CallDepthLimit {
    /// Guard a frame at `depth` using the standard limit
    pub fn new(depth: usize) -> Self {
        Self {
            depth,
            limit: MAX_CALL_DEPTH,
        }
    }

    /// Guard a frame at `depth` with a custom limit
    pub fn with_limit(depth: usize, limit: usize) -> Self {
        Self { depth, limit }
    }
}

impl Handler for CallDepthLimit {
    fn before_step(&mut self, _: &MachineState, _: Option<Opcode>, _: &Address) -> ExitResult<()> {
        if self.depth > self.limit {
            return Err(ExitError::CallTooDeep);
        }
        Ok(())
    }
}

/// Aborts after a fixed number of steps
#[derive(Clone, Copy, Debug)]
pub struct StepLimit {
    remaining: u64,
}

impl StepLimit {
    /// Allow at most `steps` steps
    pub fn new(steps: u64) -> Self {
        Self { remaining: steps }
    }
}

impl Handler for StepLimit {
    fn before_step(&mut self, _: &MachineState, _: Option<Opcode>, _: &Address) -> ExitResult<()> {
        if self.remaining == 0 {
            return Err(ExitError::Custom("step limit reached".into()));
        }
        self.remaining -= 1;
        Ok(())
    }
}
