//! Instruction bodies

use kiln_primitives::Word;

use crate::error::{ExitError, ExitReason, ExitResult, ExitSucceed};
use crate::gas;
use crate::machine::MachineState;
use crate::opcode::Opcode;
use crate::stack::Stack;

/// What to do with pc after an instruction
enum Control {
    /// Advance by this many bytes
    Continue(usize),
    /// Set pc
    Jump(usize),
    /// Stop the machine
    Exit(ExitSucceed),
}

/// Run the instruction at pc.
///
/// Order: end of code, decode, arity, cost, charge, effect, pc. An arity
/// failure charges nothing; an overflow in the effect comes after the charge.
pub(crate) fn eval(state: &mut MachineState) -> Result<(), ExitReason> {
    let Some(byte) = state.current_byte() else {
        return Err(ExitSucceed::Stopped.into());
    };
    let opcode = Opcode::from_byte(byte).ok_or(ExitError::InvalidOpcode(byte))?;
    let info = opcode.info();

    if state.stack.len() < info.inputs {
        return Err(ExitError::StackUnderflow.into());
    }

    let cost = gas::step_cost(info.cost, &state.stack, &state.memory)?;
    state.gas.charge(cost)?;

    match execute(state, opcode)? {
        Control::Continue(n) => state.pc += n,
        Control::Jump(dest) => state.pc = dest,
        Control::Exit(reason) => return Err(reason.into()),
    }
    Ok(())
}

fn execute(state: &mut MachineState, opcode: Opcode) -> ExitResult<Control> {
    use Opcode::*;

    match opcode {
        STOP => return Ok(Control::Exit(ExitSucceed::Stopped)),

        // Arithmetic
        ADD => binary(&mut state.stack, Word::wrapping_add)?,
        MUL => binary(&mut state.stack, Word::wrapping_mul)?,
        SUB => binary(&mut state.stack, Word::wrapping_sub)?,
        DIV => binary(&mut state.stack, Word::div)?,
        MOD => binary(&mut state.stack, Word::rem)?,
        EXP => binary(&mut state.stack, Word::wrapping_pow)?,

        // Comparison and bitwise
        LT => binary(&mut state.stack, |a, b| Word::from(a < b))?,
        GT => binary(&mut state.stack, |a, b| Word::from(a > b))?,
        EQ => binary(&mut state.stack, |a, b| Word::from(a == b))?,
        ISZERO => unary(&mut state.stack, |a| Word::from(a.is_zero()))?,
        AND => binary(&mut state.stack, |a, b| a & b)?,
        OR => binary(&mut state.stack, |a, b| a | b)?,
        XOR => binary(&mut state.stack, |a, b| a ^ b)?,
        NOT => unary(&mut state.stack, |a| !a)?,

        // Stack and memory
        POP => {
            state.stack.pop()?;
        }
        MLOAD => {
            let offset = memory_offset(state.stack.pop()?)?;
            let value = state.memory.load_word(offset);
            state.stack.push(value)?;
        }
        MSTORE => {
            let offset = memory_offset(state.stack.pop()?)?;
            let value = state.stack.pop()?;
            state.memory.store_word(offset, value);
        }
        MSTORE8 => {
            let offset = memory_offset(state.stack.pop()?)?;
            let value = state.stack.pop()?;
            state.memory.store_byte(offset, value.low_u64() as u8);
        }
        MSIZE => state.stack.push(Word::from(state.memory.len()))?,

        // Flow
        JUMP => {
            let dest = state.stack.pop()?;
            return jump_target(state, dest).map(Control::Jump);
        }
        JUMPI => {
            let dest = state.stack.pop()?;
            let condition = state.stack.pop()?;
            if !condition.is_zero() {
                return jump_target(state, dest).map(Control::Jump);
            }
        }
        PC => state.stack.push(Word::from(state.pc))?,
        GAS => state.stack.push(Word::from_u64(state.gas.remaining()))?,
        JUMPDEST => {}

        // Push
        PUSH0 => state.stack.push(Word::ZERO)?,
        op if op.push_size() > 0 => {
            let size = op.push_size();
            let value = push_immediate(&state.code, state.pc + 1, size);
            state.stack.push(value)?;
            return Ok(Control::Continue(1 + size));
        }

        // Duplicate and swap
        op if op.dup_depth() > 0 => state.stack.dup(op.dup_depth())?,
        op if op.swap_depth() > 0 => state.stack.swap(op.swap_depth())?,

        RETURN => {
            let offset = state.stack.pop()?;
            let len = state.stack.pop()?;
            state.return_data = if len.is_zero() {
                Vec::new()
            } else {
                let len = len.to_usize().ok_or(ExitError::OutOfGas)?;
                state.memory.load(memory_offset(offset)?, len)
            };
            return Ok(Control::Exit(ExitSucceed::Returned));
        }

        // Every PUSHn, DUPn and SWAPn is caught by a guard above
        _ => return Err(ExitError::InvalidOpcode(opcode.as_u8())),
    }

    Ok(Control::Continue(1))
}

/// Pop `a` (top) and `b`, push `f(a, b)`
fn binary(stack: &mut Stack, f: impl FnOnce(Word, Word) -> Word) -> ExitResult<()> {
    let a = stack.pop()?;
    let b = stack.pop()?;
    stack.push(f(a, b))
}

/// Pop `a`, push `f(a)`
fn unary(stack: &mut Stack, f: impl FnOnce(Word) -> Word) -> ExitResult<()> {
    let a = stack.pop()?;
    stack.push(f(a))
}

/// Offset operand of a range already paid for
fn memory_offset(offset: Word) -> ExitResult<usize> {
    offset.to_usize().ok_or(ExitError::OutOfGas)
}

fn jump_target(state: &MachineState, dest: Word) -> ExitResult<usize> {
    match dest.to_usize() {
        Some(dest) if state.is_jump_dest(dest) => Ok(dest),
        Some(dest) => Err(ExitError::InvalidJump(dest)),
        None => Err(ExitError::InvalidJump(usize::MAX)),
    }
}

/// Read `size` big-endian bytes at `start`. Bytes past the end of code read
/// as zero, filling the low end of the value.
fn push_immediate(code: &[u8], start: usize, size: usize) -> Word {
    let mut bytes = [0u8; 32];
    let available = code.get(start..).unwrap_or_default();
    let take = available.len().min(size);
    let at = 32 - size;
    bytes[at..at + take].copy_from_slice(&available[..take]);
    Word::from_be_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::NoopHandler;
    use crate::machine::{Machine, Status};

    fn run_code(code: &[u8], gas: u64) -> Machine<NoopHandler> {
        let mut machine = Machine::new(code.to_vec(), Vec::new(), gas, NoopHandler);
        machine.run();
        machine
    }

    fn top(machine: &Machine<NoopHandler>) -> Word {
        machine.stack().peek(0).unwrap()
    }

    fn exited_with(machine: &Machine<NoopHandler>, error: ExitError) -> bool {
        machine.status() == &Status::Exited(ExitReason::Error(error))
    }

    // ==================== Arithmetic ====================

    #[test]
    fn test_push_add() {
        // PUSH1 3, PUSH1 5, ADD, STOP
        let machine = run_code(&[0x60, 0x03, 0x60, 0x05, 0x01, 0x00], 1000);
        assert!(machine.status().is_succeed());
        assert_eq!(top(&machine), Word::from_u64(8));
        assert_eq!(machine.gas().spent(), 9);
    }

    #[test]
    fn test_sub_top_minus_second() {
        // PUSH1 3, PUSH1 10, SUB -> 10 - 3
        let machine = run_code(&[0x60, 0x03, 0x60, 0x0A, 0x03], 1000);
        assert_eq!(top(&machine), Word::from_u64(7));
    }

    #[test]
    fn test_mul_div_mod() {
        // PUSH1 6, PUSH1 7, MUL
        assert_eq!(top(&run_code(&[0x60, 0x06, 0x60, 0x07, 0x02], 1000)), Word::from_u64(42));
        // PUSH1 3, PUSH1 10, DIV
        assert_eq!(top(&run_code(&[0x60, 0x03, 0x60, 0x0A, 0x04], 1000)), Word::from_u64(3));
        // PUSH1 3, PUSH1 10, MOD
        assert_eq!(top(&run_code(&[0x60, 0x03, 0x60, 0x0A, 0x06], 1000)), Word::from_u64(1));
        // PUSH1 0, PUSH1 10, DIV
        assert_eq!(top(&run_code(&[0x60, 0x00, 0x60, 0x0A, 0x04], 1000)), Word::ZERO);
    }

    #[test]
    fn test_exp_gas() {
        // PUSH1 3 (exponent), PUSH1 2 (base), EXP
        let machine = run_code(&[0x60, 0x03, 0x60, 0x02, 0x0A], 1000);
        assert_eq!(top(&machine), Word::from_u64(8));
        assert_eq!(machine.gas().spent(), 3 + 3 + 60);
    }

    // ==================== Comparison and bitwise ====================

    #[test]
    fn test_comparisons() {
        // PUSH1 2, PUSH1 1, LT -> 1 < 2
        assert_eq!(top(&run_code(&[0x60, 0x02, 0x60, 0x01, 0x10], 100)), Word::ONE);
        // PUSH1 2, PUSH1 1, GT -> 1 > 2
        assert_eq!(top(&run_code(&[0x60, 0x02, 0x60, 0x01, 0x11], 100)), Word::ZERO);
        // PUSH1 5, PUSH1 5, EQ
        assert_eq!(top(&run_code(&[0x60, 0x05, 0x60, 0x05, 0x14], 100)), Word::ONE);
        // PUSH0, ISZERO
        assert_eq!(top(&run_code(&[0x5F, 0x15], 100)), Word::ONE);
    }

    #[test]
    fn test_bitwise() {
        // PUSH1 0x0C, PUSH1 0x0A, AND / OR / XOR
        assert_eq!(top(&run_code(&[0x60, 0x0C, 0x60, 0x0A, 0x16], 100)), Word::from_u64(0x08));
        assert_eq!(top(&run_code(&[0x60, 0x0C, 0x60, 0x0A, 0x17], 100)), Word::from_u64(0x0E));
        assert_eq!(top(&run_code(&[0x60, 0x0C, 0x60, 0x0A, 0x18], 100)), Word::from_u64(0x06));
        // PUSH0, NOT
        assert_eq!(top(&run_code(&[0x5F, 0x19], 100)), Word::MAX);
    }

    // ==================== Push ====================

    #[test]
    fn test_push_truncated_pads_low_bytes() {
        // PUSH2 with a single immediate byte left
        let machine = run_code(&[0x61, 0xAB], 100);
        assert_eq!(top(&machine), Word::from_u64(0xAB00));
        assert_eq!(machine.pc(), 3);
        assert!(machine.status().is_succeed());
    }

    #[test]
    fn test_push32() {
        let mut code = vec![0x7F];
        code.extend_from_slice(&[0xFF; 32]);
        let machine = run_code(&code, 100);
        assert_eq!(top(&machine), Word::MAX);
    }

    #[test]
    fn test_push_immediate_past_end() {
        assert_eq!(push_immediate(&[0x60], 5, 1), Word::ZERO);
        assert_eq!(push_immediate(&[0x62, 0x01], 1, 3), Word::from_u64(0x010000));
    }

    // ==================== Memory ====================

    #[test]
    fn test_mstore_mload() {
        // PUSH1 42, PUSH1 0, MSTORE, PUSH1 0, MLOAD
        let machine = run_code(&[0x60, 0x2A, 0x60, 0x00, 0x52, 0x60, 0x00, 0x51], 10000);
        assert_eq!(top(&machine), Word::from_u64(42));
        assert_eq!(machine.memory().len(), 32);
        // 3 PUSH1 + MSTORE (3 + 3 expansion) + MLOAD 3
        assert_eq!(machine.gas().spent(), 9 + 6 + 3);
    }

    #[test]
    fn test_mstore8_and_msize() {
        // PUSH1 0xFF, PUSH1 33, MSTORE8, MSIZE
        let machine = run_code(&[0x60, 0xFF, 0x60, 0x21, 0x53, 0x59], 10000);
        assert_eq!(top(&machine), Word::from_u64(64));
        assert_eq!(machine.memory().data()[33], 0xFF);
    }

    #[test]
    fn test_mload_unaddressable_is_out_of_gas() {
        // PUSH32 MAX, MLOAD
        let mut code = vec![0x7F];
        code.extend_from_slice(&[0xFF; 32]);
        code.push(0x51);
        let machine = run_code(&code, 1_000_000);
        assert!(exited_with(&machine, ExitError::OutOfGas));
        assert_eq!(machine.gas().remaining(), 1_000_000 - 3);
    }

    #[test]
    fn test_return() {
        // PUSH1 0xAB, PUSH1 0, MSTORE8, PUSH1 1, PUSH1 0, RETURN
        let machine = run_code(&[0x60, 0xAB, 0x60, 0x00, 0x53, 0x60, 0x01, 0x60, 0x00, 0xF3], 1000);
        assert_eq!(
            machine.status(),
            &Status::Exited(ExitReason::Succeed(ExitSucceed::Returned))
        );
        assert_eq!(machine.return_data(), &[0xAB]);
    }

    #[test]
    fn test_return_empty_ignores_offset() {
        // PUSH0 (len), PUSH32 MAX (offset), RETURN
        let mut code = vec![0x5F, 0x7F];
        code.extend_from_slice(&[0xFF; 32]);
        code.push(0xF3);
        let machine = run_code(&code, 100);
        assert!(machine.status().is_succeed());
        assert!(machine.return_data().is_empty());
        assert!(machine.memory().is_empty());
    }

    // ==================== Flow ====================

    #[test]
    fn test_jump() {
        // PUSH1 4, JUMP, INVALID, JUMPDEST, PUSH1 1
        let machine = run_code(&[0x60, 0x04, 0x56, 0xFE, 0x5B, 0x60, 0x01], 1000);
        assert!(machine.status().is_succeed());
        assert_eq!(top(&machine), Word::ONE);
    }

    #[test]
    fn test_jump_into_push_data() {
        // PUSH1 3, JUMP, PUSH1 0x5B
        let machine = run_code(&[0x60, 0x03, 0x56, 0x60, 0x5B], 1000);
        assert!(exited_with(&machine, ExitError::InvalidJump(3)));
    }

    #[test]
    fn test_jumpi_taken_and_not_taken() {
        // PUSH1 1, PUSH1 7, JUMPI, INVALID, INVALID, JUMPDEST
        let taken = run_code(&[0x60, 0x01, 0x60, 0x07, 0x57, 0xFE, 0xFE, 0x5B], 1000);
        assert!(taken.status().is_succeed());

        // PUSH1 0, PUSH1 6, JUMPI, STOP, JUMPDEST
        let not_taken = run_code(&[0x60, 0x00, 0x60, 0x06, 0x57, 0x00, 0x5B], 1000);
        assert!(not_taken.status().is_succeed());
        assert_eq!(not_taken.pc(), 5);
    }

    #[test]
    fn test_pc_and_gas() {
        // PC, GAS
        let machine = run_code(&[0x58, 0x5A], 100);
        assert_eq!(machine.stack().data(), &[Word::ZERO, Word::from_u64(96)]);
    }

    #[test]
    fn test_stop_keeps_pc() {
        let machine = run_code(&[0x5F, 0x00, 0x5F], 100);
        assert_eq!(machine.pc(), 1);
        assert_eq!(machine.stack().len(), 1);
    }

    // ==================== Dup and swap ====================

    #[test]
    fn test_dup_swap() {
        // PUSH1 1, PUSH1 2, DUP2, SWAP1
        let machine = run_code(&[0x60, 0x01, 0x60, 0x02, 0x81, 0x90], 1000);
        assert_eq!(
            machine.stack().data(),
            &[Word::ONE, Word::ONE, Word::from_u64(2)]
        );
    }

    #[test]
    fn test_swap_underflow_not_charged() {
        // PUSH0, SWAP1
        let machine = run_code(&[0x5F, 0x90], 100);
        assert!(exited_with(&machine, ExitError::StackUnderflow));
        assert_eq!(machine.gas().spent(), 2);
    }
}
