pub mod config;
pub mod cursor;
pub mod gate;
pub mod runner;

pub use config::SessionConfig;
pub use cursor::SessionCursor;
pub use gate::{InputGate, DEFAULT_LOCKOUT_MS};
pub use runner::{
    SessionRunner, STATUS_CHOOSE_CHANGE, STATUS_END_OF_SERIES, STATUS_NO_ITEMS,
    STATUS_SHOWING_BASE, STATUS_SUBMIT_FAILED,
};
