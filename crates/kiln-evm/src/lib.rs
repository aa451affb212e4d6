//! # kiln-evm
//!
//! Gas-metered stack machine interpreter.
//!
//! A [`Machine`] executes bytecode one step at a time against a bounded
//! [`Stack`] of 256-bit words and a word-aligned [`Memory`], charging every
//! step to a [`GasMeter`]. Each step runs in a fixed order:
//!
//! 1. the [`Handler`] may veto the step
//! 2. pc past the end of code stops successfully
//! 3. undefined bytes fail with `InvalidOpcode`
//! 4. too few operands fail with `StackUnderflow`, nothing charged
//! 5. the cost is charged, or `OutOfGas` with gas untouched
//! 6. the effect runs; pushes past 1024 items fail with `StackOverflow`
//! 7. pc advances
//!
//! ```
//! use kiln_evm::{ExitReason, ExitSucceed, Machine, NoopHandler};
//! use kiln_primitives::Word;
//!
//! // PUSH1 2, PUSH1 1, ADD
//! let mut machine = Machine::new(vec![0x60, 0x02, 0x60, 0x01, 0x01], Vec::new(), 100, NoopHandler);
//! assert_eq!(machine.run(), ExitReason::Succeed(ExitSucceed::Stopped));
//! assert_eq!(machine.stack().peek(0).unwrap(), Word::from_u64(3));
//! assert_eq!(machine.gas().remaining(), 91);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod context;
pub mod error;
mod eval;
pub mod gas;
pub mod handler;
pub mod machine;
pub mod memory;
pub mod opcode;
pub mod stack;
pub mod storage;

pub use context::Context;
pub use error::{ExitError, ExitReason, ExitResult, ExitSucceed};
pub use gas::{CostRule, GasMeter, MemoryLen};
pub use handler::{CallDepthLimit, Handler, NoopHandler, StepLimit};
pub use machine::{Machine, MachineState, Status};
pub use memory::Memory;
pub use opcode::{Opcode, OpcodeInfo};
pub use stack::Stack;
pub use storage::{MemoryStorage, Storage};
