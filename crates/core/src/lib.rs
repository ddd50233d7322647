#![forbid(unsafe_code)]

pub mod error;
pub mod import;
pub mod model;
pub mod progression;
pub mod state;
pub mod time;

pub use error::{AccessError, Error, LockedError, LookupError};
pub use progression::UnlockEvent;
pub use state::{LearnerState, Selection};
pub use time::Clock;
