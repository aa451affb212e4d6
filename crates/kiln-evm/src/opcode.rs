//! Opcode catalog

use std::fmt;

use crate::gas::{cost, CostRule, MemoryLen};

/// Defined instructions. Bytes without a variant decode to `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Opcode {
    // Stop and Arithmetic
    STOP = 0x00,
    ADD = 0x01,
    MUL = 0x02,
    SUB = 0x03,
    DIV = 0x04,
    MOD = 0x06,
    EXP = 0x0A,

    // Comparison and Bitwise
    LT = 0x10,
    GT = 0x11,
    EQ = 0x14,
    ISZERO = 0x15,
    AND = 0x16,
    OR = 0x17,
    XOR = 0x18,
    NOT = 0x19,

    // Stack, Memory and Flow
    POP = 0x50,
    MLOAD = 0x51,
    MSTORE = 0x52,
    MSTORE8 = 0x53,
    JUMP = 0x56,
    JUMPI = 0x57,
    PC = 0x58,
    MSIZE = 0x59,
    GAS = 0x5A,
    JUMPDEST = 0x5B,
    PUSH0 = 0x5F,

    // Push
    PUSH1 = 0x60,
    PUSH2 = 0x61,
    PUSH3 = 0x62,
    PUSH4 = 0x63,
    PUSH5 = 0x64,
    PUSH6 = 0x65,
    PUSH7 = 0x66,
    PUSH8 = 0x67,
    PUSH9 = 0x68,
    PUSH10 = 0x69,
    PUSH11 = 0x6A,
    PUSH12 = 0x6B,
    PUSH13 = 0x6C,
    PUSH14 = 0x6D,
    PUSH15 = 0x6E,
    PUSH16 = 0x6F,
    PUSH17 = 0x70,
    PUSH18 = 0x71,
    PUSH19 = 0x72,
    PUSH20 = 0x73,
    PUSH21 = 0x74,
    PUSH22 = 0x75,
    PUSH23 = 0x76,
    PUSH24 = 0x77,
    PUSH25 = 0x78,
    PUSH26 = 0x79,
    PUSH27 = 0x7A,
    PUSH28 = 0x7B,
    PUSH29 = 0x7C,
    PUSH30 = 0x7D,
    PUSH31 = 0x7E,
    PUSH32 = 0x7F,

    // Duplicate
    DUP1 = 0x80,
    DUP2 = 0x81,
    DUP3 = 0x82,
    DUP4 = 0x83,
    DUP5 = 0x84,
    DUP6 = 0x85,
    DUP7 = 0x86,
    DUP8 = 0x87,
    DUP9 = 0x88,
    DUP10 = 0x89,
    DUP11 = 0x8A,
    DUP12 = 0x8B,
    DUP13 = 0x8C,
    DUP14 = 0x8D,
    DUP15 = 0x8E,
    DUP16 = 0x8F,

    // Swap
    SWAP1 = 0x90,
    SWAP2 = 0x91,
    SWAP3 = 0x92,
    SWAP4 = 0x93,
    SWAP5 = 0x94,
    SWAP6 = 0x95,
    SWAP7 = 0x96,
    SWAP8 = 0x97,
    SWAP9 = 0x98,
    SWAP10 = 0x99,
    SWAP11 = 0x9A,
    SWAP12 = 0x9B,
    SWAP13 = 0x9C,
    SWAP14 = 0x9D,
    SWAP15 = 0x9E,
    SWAP16 = 0x9F,

    // System
    RETURN = 0xF3,
}

/// Catalog entry: stack arity and cost rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeInfo {
    /// Items the instruction needs on the stack
    pub inputs: usize,
    /// Items on the stack it accounts for afterwards, from the top
    pub outputs: usize,
    /// Gas rule
    pub cost: CostRule,
}

impl OpcodeInfo {
    const fn fixed(inputs: usize, outputs: usize, gas: u64) -> Self {
        Self {
            inputs,
            outputs,
            cost: CostRule::Static(gas),
        }
    }
}

impl Opcode {
    /// Decode a byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Self::STOP),
            0x01 => Some(Self::ADD),
            0x02 => Some(Self::MUL),
            0x03 => Some(Self::SUB),
            0x04 => Some(Self::DIV),
            0x06 => Some(Self::MOD),
            0x0A => Some(Self::EXP),
            0x10 => Some(Self::LT),
            0x11 => Some(Self::GT),
            0x14 => Some(Self::EQ),
            0x15 => Some(Self::ISZERO),
            0x16 => Some(Self::AND),
            0x17 => Some(Self::OR),
            0x18 => Some(Self::XOR),
            0x19 => Some(Self::NOT),
            0x50 => Some(Self::POP),
            0x51 => Some(Self::MLOAD),
            0x52 => Some(Self::MSTORE),
            0x53 => Some(Self::MSTORE8),
            0x56 => Some(Self::JUMP),
            0x57 => Some(Self::JUMPI),
            0x58 => Some(Self::PC),
            0x59 => Some(Self::MSIZE),
            0x5A => Some(Self::GAS),
            0x5B => Some(Self::JUMPDEST),
            0x5F => Some(Self::PUSH0),
            // SAFETY: every byte in 0x60..=0x9F is a declared discriminant
            0x60..=0x9F => Some(unsafe { std::mem::transmute::<u8, Opcode>(byte) }),
            0xF3 => Some(Self::RETURN),
            _ => None,
        }
    }

    /// Raw byte
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Immediate bytes following a PUSH (1-32 for PUSH1-PUSH32, 0 otherwise)
    pub fn push_size(self) -> usize {
        let byte = self as u8;
        if (0x60..=0x7F).contains(&byte) {
            (byte - 0x5F) as usize
        } else {
            0
        }
    }

    /// DUP depth (1-16 for DUP1-DUP16, 0 otherwise)
    pub fn dup_depth(self) -> usize {
        let byte = self as u8;
        if (0x80..=0x8F).contains(&byte) {
            (byte - 0x7F) as usize
        } else {
            0
        }
    }

    /// SWAP depth (1-16 for SWAP1-SWAP16, 0 otherwise)
    pub fn swap_depth(self) -> usize {
        let byte = self as u8;
        if (0x90..=0x9F).contains(&byte) {
            (byte - 0x8F) as usize
        } else {
            0
        }
    }

    /// Catalog entry for this instruction
    pub fn info(self) -> OpcodeInfo {
        use Opcode::*;
        match self {
            STOP => OpcodeInfo::fixed(0, 0, cost::ZERO),

            ADD | SUB => OpcodeInfo::fixed(2, 1, cost::VERYLOW),
            MUL | DIV | MOD => OpcodeInfo::fixed(2, 1, cost::LOW),
            EXP => OpcodeInfo {
                inputs: 2,
                outputs: 1,
                cost: CostRule::Exp,
            },

            LT | GT | EQ | AND | OR | XOR => OpcodeInfo::fixed(2, 1, cost::VERYLOW),
            ISZERO | NOT => OpcodeInfo::fixed(1, 1, cost::VERYLOW),

            POP => OpcodeInfo::fixed(1, 0, cost::BASE),
            MLOAD => OpcodeInfo {
                inputs: 1,
                outputs: 1,
                cost: memory_rule(cost::VERYLOW, MemoryLen::Fixed(32)),
            },
            MSTORE => OpcodeInfo {
                inputs: 2,
                outputs: 0,
                cost: memory_rule(cost::VERYLOW, MemoryLen::Fixed(32)),
            },
            MSTORE8 => OpcodeInfo {
                inputs: 2,
                outputs: 0,
                cost: memory_rule(cost::VERYLOW, MemoryLen::Fixed(1)),
            },
            JUMP => OpcodeInfo::fixed(1, 0, cost::MID),
            JUMPI => OpcodeInfo::fixed(2, 0, cost::HIGH),
            PC | MSIZE | GAS => OpcodeInfo::fixed(0, 1, cost::BASE),
            JUMPDEST => OpcodeInfo::fixed(0, 0, cost::JUMPDEST),
            PUSH0 => OpcodeInfo::fixed(0, 1, cost::BASE),

            RETURN => OpcodeInfo {
                inputs: 2,
                outputs: 0,
                cost: memory_rule(cost::ZERO, MemoryLen::Operand(1)),
            },

            op if op.push_size() > 0 => OpcodeInfo::fixed(0, 1, cost::VERYLOW),
            op if op.dup_depth() > 0 => {
                let k = op.dup_depth();
                OpcodeInfo::fixed(k, k + 1, cost::VERYLOW)
            }
            op => {
                let k = op.swap_depth();
                OpcodeInfo::fixed(k + 1, k + 1, cost::VERYLOW)
            }
        }
    }
}

const fn memory_rule(base: u64, len: MemoryLen) -> CostRule {
    CostRule::Memory {
        base,
        offset: 0,
        len,
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_byte() {
        assert_eq!(Opcode::from_byte(0x00), Some(Opcode::STOP));
        assert_eq!(Opcode::from_byte(0x01), Some(Opcode::ADD));
        assert_eq!(Opcode::from_byte(0x0A), Some(Opcode::EXP));
        assert_eq!(Opcode::from_byte(0x5F), Some(Opcode::PUSH0));
        assert_eq!(Opcode::from_byte(0xF3), Some(Opcode::RETURN));
    }

    #[test]
    fn test_undefined_bytes() {
        for byte in [0x05, 0x0C, 0x20, 0x54, 0xA0, 0xEF, 0xFE, 0xFF] {
            assert_eq!(Opcode::from_byte(byte), None, "byte 0x{byte:02x}");
        }
    }

    #[test]
    fn test_from_byte_roundtrip() {
        for byte in 0..=u8::MAX {
            if let Some(op) = Opcode::from_byte(byte) {
                assert_eq!(op.as_u8(), byte);
            }
        }
    }

    #[test]
    fn test_all_push_sizes() {
        assert_eq!(Opcode::PUSH0.push_size(), 0);
        for byte in 0x60..=0x7Fu8 {
            let op = Opcode::from_byte(byte).unwrap();
            assert_eq!(op.push_size(), (byte - 0x5F) as usize);
        }
    }

    #[test]
    fn test_all_dup_swap_depths() {
        for k in 1..=16u8 {
            assert_eq!(Opcode::from_byte(0x7F + k).unwrap().dup_depth(), k as usize);
            assert_eq!(Opcode::from_byte(0x8F + k).unwrap().swap_depth(), k as usize);
        }
        assert_eq!(Opcode::ADD.dup_depth(), 0);
        assert_eq!(Opcode::ADD.swap_depth(), 0);
    }

    #[test]
    fn test_info_arity() {
        assert_eq!(Opcode::ADD.info().inputs, 2);
        assert_eq!(Opcode::ADD.info().outputs, 1);
        assert_eq!(Opcode::POP.info().inputs, 1);
        assert_eq!(Opcode::PUSH32.info().inputs, 0);
        assert_eq!(Opcode::DUP16.info().inputs, 16);
        assert_eq!(Opcode::DUP16.info().outputs, 17);
        assert_eq!(Opcode::SWAP16.info().inputs, 17);
        assert_eq!(Opcode::SWAP1.info().outputs, 2);
    }

    #[test]
    fn test_info_cost_tiers() {
        assert_eq!(Opcode::ADD.info().cost, CostRule::Static(3));
        assert_eq!(Opcode::SUB.info().cost, CostRule::Static(3));
        assert_eq!(Opcode::POP.info().cost, CostRule::Static(2));
        assert_eq!(Opcode::PUSH0.info().cost, CostRule::Static(2));
        assert_eq!(Opcode::PUSH1.info().cost, CostRule::Static(3));
        assert_eq!(Opcode::DUP1.info().cost, CostRule::Static(3));
        assert_eq!(Opcode::SWAP16.info().cost, CostRule::Static(3));
        assert_eq!(Opcode::EXP.info().cost, CostRule::Exp);
        assert_eq!(Opcode::JUMP.info().cost, CostRule::Static(8));
        assert_eq!(Opcode::JUMPI.info().cost, CostRule::Static(10));
        assert!(matches!(Opcode::MSTORE.info().cost, CostRule::Memory { base: 3, .. }));
    }

    #[test]
    fn test_display() {
        assert_eq!(Opcode::PUSH1.to_string(), "PUSH1");
        assert_eq!(Opcode::SWAP16.to_string(), "SWAP16");
    }
}
