//! Shared core of the device probe: the echoed request record, the
//! configuration loader, and the platform-neutral halves of the browser
//! client (event logger, media session controllers).

pub mod config;
pub mod event;
pub mod log;
pub mod logger;
pub mod media;
pub mod message;
pub mod registry;
pub mod request;
pub mod session;
pub mod settings;

pub use log::{EventLog, LogEntry};
pub use logger::EventLogger;
pub use request::RequestRecord;
