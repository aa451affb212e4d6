//! Snapshots and trace records

use std::collections::BTreeMap;

use kiln_evm::{Machine, Opcode, Status, Storage};
use kiln_primitives::{Address, Word};
use serde::Serialize;

use crate::config::TracerConfig;

/// Machine state captured on one side of a step.
///
/// Only what the config asks for is copied: the stack when it is shown or
/// diffed, memory unless hidden, storage when a store is supplied and not
/// hidden.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    /// Program counter
    pub pc: usize,
    /// Byte at pc, `None` past the end of code
    pub opcode: Option<u8>,
    /// Lifecycle status
    pub status: Status,
    /// Account the frame runs as
    pub address: Address,
    /// Remaining gas
    pub gas_remaining: u64,
    /// Spent gas
    pub gas_spent: u64,
    /// Refund counter
    pub gas_refunded: i64,
    /// Stack, bottom to top
    pub stack: Option<Vec<Word>>,
    /// Memory contents
    pub memory: Option<Vec<u8>>,
    /// Storage of `address`
    pub storage: Option<BTreeMap<Word, Word>>,
}

impl Snapshot {
    /// Capture `machine` through its read-only accessors
    pub fn capture<H>(
        machine: &Machine<H>,
        storage: Option<&dyn Storage>,
        config: &TracerConfig,
    ) -> Self {
        let state = machine.state();
        let address = machine.context().address;
        let gas = state.gas();

        let stack = (!config.hide_stack || config.stack_in_out).then(|| state.stack().data().to_vec());
        let memory = (!config.hide_memory).then(|| state.memory().data().to_vec());
        let storage = storage
            .filter(|_| !config.hide_storage)
            .map(|s| s.entries(&address));

        Self {
            pc: state.pc(),
            opcode: state.current_byte(),
            status: state.status().clone(),
            address,
            gas_remaining: gas.remaining(),
            gas_spent: gas.spent(),
            gas_refunded: gas.refunded(),
            stack,
            memory,
            storage,
        }
    }
}

/// Breakdown of a step's gas
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GasDetail {
    /// Tier or fixed part of the cost
    pub base: u64,
    /// Operand- or memory-dependent part
    pub dynamic: u64,
    /// Remaining before the step
    pub remaining_before: u64,
    /// Remaining after the step
    pub remaining_after: u64,
    /// Total spent after the step
    pub spent: u64,
    /// Refund counter after the step
    pub refunded: i64,
}

/// Stack slots a step consumed and produced, each listed top first
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StackInOut {
    /// Popped operands
    #[serde(rename = "in")]
    pub inputs: Vec<Word>,
    /// Resulting items
    #[serde(rename = "out")]
    pub outputs: Vec<Word>,
}

impl StackInOut {
    /// Slots touched by `opcode` between two stacks (bottom to top)
    pub fn between(opcode: Opcode, before: &[Word], after: &[Word]) -> Self {
        let info = opcode.info();
        Self {
            inputs: before.iter().rev().take(info.inputs).copied().collect(),
            outputs: after.iter().rev().take(info.outputs).copied().collect(),
        }
    }
}

/// One executed instruction
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceStep {
    /// Program counter of the instruction
    pub pc: usize,
    /// Instruction byte
    pub opcode: u8,
    /// Call depth at which it ran
    pub depth: usize,
    /// Account the frame runs as
    pub address: Address,
    /// Gas remaining before the step
    pub gas: u64,
    /// Gas the step used
    pub gas_cost: u64,
    /// Cost breakdown
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_detail: Option<GasDetail>,
    /// Stack after the step, bottom to top
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<Vec<Word>>,
    /// Touched stack slots
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_in_out: Option<StackInOut>,
    /// Memory after the step
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "hex_bytes")]
    pub memory: Option<Vec<u8>>,
    /// Storage after the step
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<BTreeMap<Word, Word>>,
    /// Error the step ended with
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Steps of sub-calls made by this instruction
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub calls: Vec<TraceStep>,
}

impl TraceStep {
    /// Decoded instruction, `None` for undefined bytes
    pub fn op(&self) -> Option<Opcode> {
        Opcode::from_byte(self.opcode)
    }

    /// Mnemonic, or the hex byte for undefined instructions
    pub fn op_name(&self) -> String {
        match self.op() {
            Some(op) => op.to_string(),
            None => format!("0x{:02x}", self.opcode),
        }
    }
}

fn hex_bytes<S>(bytes: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match bytes {
        Some(bytes) => s.serialize_str(&format!("0x{}", hex::encode(bytes))),
        None => s.serialize_none(),
    }
}
