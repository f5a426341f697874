//! Alert decision and delivery.
//!
//! The dispatcher decides, once per evaluated frame, whether an alert should
//! be emitted (cooldown-gated) and what it should say. Delivery is decoupled:
//! emitted messages go onto a single-slot queue consumed by a worker thread
//! that performs the blocking speech call, so capture never waits on audio.

mod dispatcher;
mod worker;

pub use dispatcher::{
    AlertDispatcher, AlertMessage, AlertSeverity, AlertState, DEFAULT_COOLDOWN,
};
pub use worker::AlertWorker;
