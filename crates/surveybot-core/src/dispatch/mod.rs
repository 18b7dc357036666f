//! Boundary between the chat transport and the survey engine.
//!
//! `Dispatcher` handles one event at a time for one participant;
//! `IdentityRouter` makes sure that is how it gets called, by giving each
//! active participant a FIFO mailbox drained by its own worker task.

mod dispatcher;
mod router;

pub use dispatcher::Dispatcher;
pub use router::{EventHandler, IdentityRouter};
