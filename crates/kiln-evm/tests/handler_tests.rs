//! Handler veto and policy handlers

use kiln_evm::{
    CallDepthLimit, Context, ExitError, ExitReason, Handler, Machine, MachineState, Opcode,
    StepLimit,
};
use kiln_primitives::{Address, Word};

/// Rejects one opcode, counting the steps it saw
#[derive(Default)]
struct DenyOpcode {
    denied: Option<Opcode>,
    seen: usize,
}

impl Handler for DenyOpcode {
    fn before_step(
        &mut self,
        _state: &MachineState,
        opcode: Option<Opcode>,
        _address: &Address,
    ) -> Result<(), ExitError> {
        self.seen += 1;
        if opcode.is_some() && opcode == self.denied {
            return Err(ExitError::Custom(format!("{} denied", opcode.unwrap_or(Opcode::STOP))));
        }
        Ok(())
    }
}

#[test]
fn handler_error_propagates_verbatim() {
    let handler = DenyOpcode {
        denied: Some(Opcode::ADD),
        seen: 0,
    };
    // PUSH1 1, PUSH1 2, ADD
    let mut m = Machine::new(vec![0x60, 0x01, 0x60, 0x02, 0x01], Vec::new(), 100, handler);
    assert_eq!(
        m.run(),
        ExitReason::Error(ExitError::Custom("ADD denied".to_string()))
    );
    // Vetoed step charges nothing and leaves the operands
    assert_eq!(m.gas().spent(), 6);
    assert_eq!(m.stack().len(), 2);
    assert_eq!(m.pc(), 4);
    assert_eq!(m.handler().seen, 3);
}

#[test]
fn handler_runs_before_end_of_code() {
    let mut m = Machine::new(Vec::new(), Vec::new(), 0, StepLimit::new(0));
    assert_eq!(
        m.run(),
        ExitReason::Error(ExitError::Custom("step limit reached".into()))
    );
}

#[test]
fn handler_runs_before_decode() {
    let veto_all = |_: &MachineState, _: Option<Opcode>, _: &Address| -> Result<(), ExitError> {
        Err(ExitError::CallTooDeep)
    };
    let mut m = Machine::new(vec![0xEF], Vec::new(), 10, veto_all);
    assert_eq!(m.run(), ExitReason::Error(ExitError::CallTooDeep));
}

#[test]
fn step_limit_stops_infinite_loop() {
    // JUMPDEST, PUSH0, JUMP
    let mut m = Machine::new(vec![0x5B, 0x5F, 0x56], Vec::new(), u64::MAX, StepLimit::new(30));
    assert!(matches!(m.run(), ExitReason::Error(ExitError::Custom(_))));
    assert_eq!(m.gas().spent(), 10 * (1 + 2 + 8));
}

#[test]
fn call_depth_limit_uses_context_depth() {
    let mut ctx = Context::new(Address::from_low_u64(1), Address::ZERO);
    for _ in 0..1025 {
        ctx = ctx.nested(Address::from_low_u64(1));
    }
    let mut m = Machine::new(vec![0x5F], Vec::new(), 10, CallDepthLimit::new(ctx.depth))
        .with_context(ctx);
    assert_eq!(m.run(), ExitReason::Error(ExitError::CallTooDeep));
    assert!(m.stack().is_empty());

    let mut shallow = Machine::new(vec![0x5F], Vec::new(), 10, CallDepthLimit::new(3));
    assert!(shallow.run().is_succeed());
    assert_eq!(shallow.stack().data(), &[Word::ZERO]);
}
