//! Exit reasons and error types

use thiserror::Error;

/// Terminal errors. Every variant ends execution.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExitError {
    /// Byte at pc is not a defined instruction
    #[error("invalid opcode: 0x{0:02x}")]
    InvalidOpcode(u8),

    /// Instruction needed more operands than the stack holds
    #[error("stack underflow")]
    StackUnderflow,

    /// Push would exceed the stack limit
    #[error("stack overflow (max 1024)")]
    StackOverflow,

    /// Step cost exceeds remaining gas
    #[error("out of gas")]
    OutOfGas,

    /// Jump target is not a JUMPDEST
    #[error("invalid jump destination: {0}")]
    InvalidJump(usize),

    /// Frame nested deeper than the call depth limit
    #[error("call depth exceeded (max 1024)")]
    CallTooDeep,

    /// Host-signaled error
    #[error("{0}")]
    Custom(String),
}

/// Successful exits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitSucceed {
    /// STOP, or pc ran past the end of code
    Stopped,
    /// RETURN with output in the return data buffer
    Returned,
}

/// Why a machine stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    /// Normal termination
    Succeed(ExitSucceed),
    /// Terminal error
    Error(ExitError),
}

impl ExitReason {
    /// Whether this is a successful exit
    pub fn is_succeed(&self) -> bool {
        matches!(self, ExitReason::Succeed(_))
    }

    /// The error, if this is an error exit
    pub fn error(&self) -> Option<&ExitError> {
        match self {
            ExitReason::Error(e) => Some(e),
            ExitReason::Succeed(_) => None,
        }
    }
}

impl From<ExitSucceed> for ExitReason {
    fn from(s: ExitSucceed) -> Self {
        ExitReason::Succeed(s)
    }
}

impl From<ExitError> for ExitReason {
    fn from(e: ExitError) -> Self {
        ExitReason::Error(e)
    }
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitReason::Succeed(ExitSucceed::Stopped) => f.write_str("stopped"),
            ExitReason::Succeed(ExitSucceed::Returned) => f.write_str("returned"),
            ExitReason::Error(e) => write!(f, "error: {e}"),
        }
    }
}

/// Result type for stack, memory and gas operations
pub type ExitResult<T> = Result<T, ExitError>;
