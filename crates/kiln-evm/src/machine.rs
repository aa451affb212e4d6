//! Machine state and the step loop

use std::collections::HashSet;

use bytes::Bytes;

use crate::context::Context;
use crate::error::{ExitReason, ExitSucceed};
use crate::eval;
use crate::gas::GasMeter;
use crate::handler::Handler;
use crate::memory::Memory;
use crate::opcode::Opcode;
use crate::stack::Stack;

/// Lifecycle of a machine. `Exited` is final.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Status {
    /// More steps may run
    #[default]
    Running,
    /// Execution ended
    Exited(ExitReason),
}

/// Everything a step reads or writes, minus the handler.
///
/// Handlers and tracers see this read-only.
#[derive(Clone, Debug)]
pub struct MachineState {
    pub(crate) pc: usize,
    pub(crate) code: Bytes,
    pub(crate) data: Bytes,
    pub(crate) jump_dests: HashSet<usize>,
    pub(crate) stack: Stack,
    pub(crate) memory: Memory,
    pub(crate) gas: GasMeter,
    pub(crate) return_data: Vec<u8>,
    pub(crate) status: Status,
}

impl MachineState {
    fn new(code: Bytes, data: Bytes, gas_limit: u64) -> Self {
        let jump_dests = analyze_jump_dests(&code);
        Self {
            pc: 0,
            code,
            data,
            jump_dests,
            stack: Stack::new(),
            memory: Memory::new(),
            gas: GasMeter::new(gas_limit),
            return_data: Vec::new(),
            status: Status::Running,
        }
    }

    /// Program counter
    pub fn pc(&self) -> usize {
        self.pc
    }

    /// Bytecode
    pub fn code(&self) -> &Bytes {
        &self.code
    }

    /// Input data
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Operand stack
    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    /// Memory
    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Gas meter
    pub fn gas(&self) -> &GasMeter {
        &self.gas
    }

    /// Output of RETURN
    pub fn return_data(&self) -> &[u8] {
        &self.return_data
    }

    /// Lifecycle status
    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Raw byte at pc, `None` past the end of code
    pub fn current_byte(&self) -> Option<u8> {
        self.code.get(self.pc).copied()
    }

    /// Decoded instruction at pc
    pub fn current_opcode(&self) -> Option<Opcode> {
        self.current_byte().and_then(Opcode::from_byte)
    }

    /// Whether `dest` is a JUMPDEST outside push data
    pub fn is_jump_dest(&self, dest: usize) -> bool {
        self.jump_dests.contains(&dest)
    }
}

/// Collect JUMPDEST positions, skipping PUSH immediates
fn analyze_jump_dests(code: &[u8]) -> HashSet<usize> {
    let mut dests = HashSet::new();
    let mut i = 0;

    while i < code.len() {
        let byte = code[i];
        if byte == Opcode::JUMPDEST as u8 {
            dests.insert(i);
        }
        if (0x60..=0x7F).contains(&byte) {
            i += (byte - 0x5F) as usize;
        }
        i += 1;
    }

    tracing::trace!("Found {} jump destinations in {} bytes of code", dests.len(), code.len());
    dests
}

/// A single execution frame.
///
/// Built once from code, input data, a gas budget and a [`Handler`], then
/// driven by [`step`](Machine::step) or [`run`](Machine::run) until it exits.
pub struct Machine<H> {
    state: MachineState,
    context: Context,
    handler: H,
}

impl<H> Machine<H> {
    /// Create a running machine at pc 0 with an empty stack and memory
    pub fn new(code: Vec<u8>, data: Vec<u8>, gas_limit: u64, handler: H) -> Self {
        Self::from_bytes(Bytes::from(code), Bytes::from(data), gas_limit, handler)
    }

    /// Create a machine over shared code and data buffers
    pub fn from_bytes(code: Bytes, data: Bytes, gas_limit: u64, handler: H) -> Self {
        Self {
            state: MachineState::new(code, data, gas_limit),
            context: Context::default(),
            handler,
        }
    }

    /// Attach an execution context
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    /// Read-only view of the machine state
    pub fn state(&self) -> &MachineState {
        &self.state
    }

    /// Execution context
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Lifecycle status
    pub fn status(&self) -> &Status {
        &self.state.status
    }

    /// Whether more steps may run
    pub fn is_running(&self) -> bool {
        self.state.status == Status::Running
    }

    /// Program counter
    pub fn pc(&self) -> usize {
        self.state.pc
    }

    /// Bytecode
    pub fn code(&self) -> &Bytes {
        &self.state.code
    }

    /// Input data
    pub fn data(&self) -> &Bytes {
        &self.state.data
    }

    /// Operand stack
    pub fn stack(&self) -> &Stack {
        &self.state.stack
    }

    /// Mutable stack, for seeding operands before running
    pub fn stack_mut(&mut self) -> &mut Stack {
        &mut self.state.stack
    }

    /// Memory
    pub fn memory(&self) -> &Memory {
        &self.state.memory
    }

    /// Gas meter
    pub fn gas(&self) -> &GasMeter {
        &self.state.gas
    }

    /// Output of RETURN
    pub fn return_data(&self) -> &[u8] {
        &self.state.return_data
    }

    /// The handler
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Consume the machine, returning its handler
    pub fn into_handler(self) -> H {
        self.handler
    }

    fn exit(&mut self, reason: ExitReason) -> Result<(), ExitReason> {
        tracing::debug!(
            "Machine at {} exited at pc={} with {} (gas spent {})",
            self.context.address,
            self.state.pc,
            reason,
            self.state.gas.spent()
        );
        self.state.status = Status::Exited(reason.clone());
        Err(reason)
    }
}

impl<H: Handler> Machine<H> {
    /// Execute one instruction.
    ///
    /// `Ok(())` means the machine is still running. `Err` carries the exit
    /// reason, which is also recorded in [`status`](Machine::status). Calling
    /// `step` after exit returns the same reason again without side effects.
    pub fn step(&mut self) -> Result<(), ExitReason> {
        if let Status::Exited(reason) = &self.state.status {
            return Err(reason.clone());
        }

        let opcode = self.state.current_opcode();
        if let Err(e) = self
            .handler
            .before_step(&self.state, opcode, &self.context.address)
        {
            return self.exit(e.into());
        }

        match eval::eval(&mut self.state) {
            Ok(()) => Ok(()),
            Err(reason) => self.exit(reason),
        }
    }

    /// Step until the machine exits
    pub fn run(&mut self) -> ExitReason {
        loop {
            if let Err(reason) = self.step() {
                return reason;
            }
        }
    }
}

impl Status {
    /// Exit reason, if exited
    pub fn exit_reason(&self) -> Option<&ExitReason> {
        match self {
            Status::Running => None,
            Status::Exited(reason) => Some(reason),
        }
    }

    /// Whether the machine stopped successfully
    pub fn is_succeed(&self) -> bool {
        matches!(self, Status::Exited(ExitReason::Succeed(_)))
    }
}

impl From<ExitSucceed> for Status {
    fn from(s: ExitSucceed) -> Self {
        Status::Exited(s.into())
    }
}
