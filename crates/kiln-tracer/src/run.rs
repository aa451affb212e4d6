//! Traced execution loop

use kiln_evm::{ExitReason, Handler, Machine, Storage};

use crate::tracer::Tracer;

/// Run `machine` to completion, recording every step into `tracer`.
///
/// Returns the same reason [`Machine::run`] would; tracing never changes the
/// outcome.
pub fn run_traced<H: Handler>(
    machine: &mut Machine<H>,
    tracer: &mut Tracer,
    storage: Option<&dyn Storage>,
) -> ExitReason {
    loop {
        tracer.before_eval(machine, storage);
        let result = machine.step();
        tracer.after_eval(machine, storage);
        tracer.complete();

        if let Err(reason) = result {
            return reason;
        }
    }
}
