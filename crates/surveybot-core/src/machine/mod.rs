//! Per-participant survey state machine.
//!
//! Pure transition logic: given the current session (if any), an input, and
//! the time, produce the next session state plus the effects to perform.
//! No I/O happens here; the dispatcher executes the effects and the session
//! store commits the next state atomically.

mod effect;
mod transition;

pub use effect::{Effect, Input, Next, Step};
pub use transition::{MachineContext, transition};
