//! Step tracer

use kiln_evm::gas::CostRule;
use kiln_evm::{ExitReason, Machine, Opcode, Status, Storage};

use crate::config::TracerConfig;
use crate::step::{GasDetail, Snapshot, StackInOut, TraceStep};

/// Records a [`TraceStep`] per executed instruction.
///
/// Drive it around each `Machine::step`: [`before_eval`](Tracer::before_eval),
/// step, [`after_eval`](Tracer::after_eval), [`complete`](Tracer::complete).
/// The tracer only reads the machine. Calls out of order are ignored.
#[derive(Debug)]
pub struct Tracer {
    config: TracerConfig,
    before: Option<Snapshot>,
    after: Option<Snapshot>,
    /// Open call frames; the first is the root. Only one frame exists when
    /// call tracing is off.
    frames: Vec<Vec<TraceStep>>,
    depth: usize,
}

impl Tracer {
    /// Create a tracer
    pub fn new(config: TracerConfig) -> Self {
        Self {
            config,
            before: None,
            after: None,
            frames: vec![Vec::new()],
            depth: 0,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &TracerConfig {
        &self.config
    }

    /// Current call depth
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Snapshot the machine before a step
    pub fn before_eval<H>(&mut self, machine: &Machine<H>, storage: Option<&dyn Storage>) {
        if self.before.is_some() {
            tracing::debug!("Tracer before_eval called twice, dropping earlier snapshot");
        }
        self.before = Some(Snapshot::capture(machine, storage, &self.config));
        self.after = None;
    }

    /// Snapshot the machine after a step
    pub fn after_eval<H>(&mut self, machine: &Machine<H>, storage: Option<&dyn Storage>) {
        self.after = Some(Snapshot::capture(machine, storage, &self.config));
    }

    /// Turn the pending snapshots into a [`TraceStep`].
    ///
    /// Without a before snapshot this does nothing. Steps taken past the end
    /// of code, or on a machine that had already exited, are not recorded.
    pub fn complete(&mut self) {
        let (Some(before), Some(after)) = (self.before.take(), self.after.take()) else {
            tracing::debug!("Tracer complete called without a before/after pair");
            return;
        };
        if before.status != Status::Running {
            return;
        }
        let Some(opcode) = before.opcode else {
            return;
        };

        let step = self.build_step(opcode, before, after);
        if let Some(frame) = self.frames.last_mut() {
            frame.push(step);
        }
    }

    /// A sub-call starts; following steps belong to it
    pub fn enter_call(&mut self) {
        self.depth += 1;
        if self.config.call_trace {
            self.frames.push(Vec::new());
        }
    }

    /// The current sub-call returned
    pub fn exit_call(&mut self) {
        if self.depth == 0 {
            tracing::debug!("Tracer exit_call without matching enter_call");
            return;
        }
        self.depth -= 1;
        if self.config.call_trace {
            self.close_frame();
        }
    }

    /// Recorded steps of the outermost frame
    pub fn steps(&self) -> &[TraceStep] {
        self.frames.first().map(Vec::as_slice).unwrap_or_default()
    }

    /// Close any open sub-calls and return the recorded steps
    pub fn into_steps(mut self) -> Vec<TraceStep> {
        while self.frames.len() > 1 {
            self.close_frame();
        }
        self.frames.pop().unwrap_or_default()
    }

    /// Attach the innermost frame to the last step of its parent
    fn close_frame(&mut self) {
        if self.frames.len() < 2 {
            return;
        }
        let Some(child) = self.frames.pop() else {
            return;
        };
        let Some(parent) = self.frames.last_mut() else {
            return;
        };
        match parent.last_mut() {
            Some(caller) => caller.calls.extend(child),
            None => parent.extend(child),
        }
    }

    fn build_step(&self, opcode: u8, before: Snapshot, after: Snapshot) -> TraceStep {
        let config = &self.config;
        let op = Opcode::from_byte(opcode);
        let used = before.gas_remaining.saturating_sub(after.gas_remaining);

        let error = match &after.status {
            Status::Exited(ExitReason::Error(e)) => Some(e.to_string()),
            _ => None,
        };

        let gas_detail = config.gas_calculation.then(|| {
            let base = match op.map(|op| op.info().cost) {
                Some(CostRule::Static(gas)) => gas,
                Some(CostRule::Exp) => kiln_evm::gas::cost::EXP,
                Some(CostRule::Memory { base, .. }) => base,
                None => 0,
            }
            .min(used);
            GasDetail {
                base,
                dynamic: used - base,
                remaining_before: before.gas_remaining,
                remaining_after: after.gas_remaining,
                spent: after.gas_spent,
                refunded: after.gas_refunded,
            }
        });

        let stack_changed = before.stack != after.stack;
        let (stack, stack_in_out) = if config.stack_in_out {
            let io = match (op, stack_changed, &before.stack, &after.stack) {
                (Some(op), true, Some(b), Some(a)) => Some(StackInOut::between(op, b, a)),
                _ => None,
            };
            (None, io)
        } else if config.hide_stack || (config.hide_unchanged && !stack_changed) {
            (None, None)
        } else {
            (after.stack, None)
        };

        let memory_changed = before.memory != after.memory;
        let memory = if config.hide_unchanged && !memory_changed {
            None
        } else {
            after.memory
        };

        let storage_changed = before.storage != after.storage;
        let storage = if config.hide_unchanged && !storage_changed {
            None
        } else {
            after.storage
        };

        TraceStep {
            pc: before.pc,
            opcode,
            depth: self.depth,
            address: before.address,
            gas: before.gas_remaining,
            gas_cost: used,
            gas_detail,
            stack,
            stack_in_out,
            memory,
            storage,
            error,
            calls: Vec::new(),
        }
    }
}

impl Default for Tracer {
    fn default() -> Self {
        Self::new(TracerConfig::default())
    }
}
