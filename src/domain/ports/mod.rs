//! Domain ports
//!
//! Traits and small value types that the logging infrastructure is written
//! against, so that handlers and tests never depend on a concrete clock or
//! web framework.

pub mod clock;
pub mod logger;
pub mod trace;

pub use clock::{Clock, ManualClock, SystemClock};
pub use logger::Level;
pub use trace::{HeaderLookup, TraceContext};
