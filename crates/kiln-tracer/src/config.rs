//! Tracer configuration

use serde::{Deserialize, Serialize};

use crate::error::TracerResult;

/// Presentation switches. None of them change how the machine executes.
///
/// Every switch defaults to `false`. Loaded from JSON with camelCase keys:
///
/// ```
/// use kiln_tracer::TracerConfig;
///
/// let config = TracerConfig::from_json(r#"{ "hideMemory": true, "opcodeAsHex": true }"#).unwrap();
/// assert!(config.hide_memory);
/// assert!(!config.call_trace);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct TracerConfig {
    /// Nest steps of sub-calls under the step that made the call
    pub call_trace: bool,
    /// Record base and dynamic parts of each step's cost
    pub gas_calculation: bool,
    /// Record only the stack slots a step consumed and produced
    pub stack_in_out: bool,
    /// Omit stack, memory and storage when a step left them unchanged
    pub hide_unchanged: bool,
    /// Never record memory
    pub hide_memory: bool,
    /// Never record the full stack
    pub hide_stack: bool,
    /// Never record storage
    pub hide_storage: bool,
    /// Render storage values in hex instead of decimal
    pub storage_value_as_hex: bool,
    /// Render opcodes as `0x60` instead of `PUSH1`
    pub opcode_as_hex: bool,
}

impl TracerConfig {
    /// Parse from JSON
    pub fn from_json(json: &str) -> TracerResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
