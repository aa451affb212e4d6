//! Kiln Tracer
//!
//! Observes a [`kiln_evm::Machine`] from the outside. Each step is bracketed
//! by a before and an after snapshot, and the pair becomes a [`TraceStep`].
//! The machine never knows it is being traced.
//!
//! ```
//! use kiln_evm::{Machine, NoopHandler};
//! use kiln_tracer::{run_traced, Tracer, TracerConfig};
//!
//! // PUSH1 1, PUSH1 2, MUL
//! let mut machine = Machine::new(vec![0x60, 0x01, 0x60, 0x02, 0x02], Vec::new(), 100, NoopHandler);
//! let mut tracer = Tracer::new(TracerConfig::default());
//! run_traced(&mut machine, &mut tracer, None);
//!
//! assert_eq!(tracer.steps().len(), 3);
//! assert_eq!(tracer.steps()[2].op_name(), "MUL");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod render;
mod run;
pub mod step;
mod tracer;

pub use config::TracerConfig;
pub use error::{TracerError, TracerResult};
pub use run::run_traced;
pub use step::{GasDetail, Snapshot, StackInOut, TraceStep};
pub use tracer::Tracer;
