//! # kiln-primitives
//!
//! Primitive value types for the Kiln interpreter.
//!
//! - [`Word`]: the 256-bit machine word, four little-endian `u64` limbs.
//! - [`Address`]: 20-byte account address used to attribute execution.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod address;
mod error;
mod word;

pub use address::Address;
pub use error::PrimitiveError;
pub use word::Word;

/// Gas quantity type
pub type Gas = u64;
