pub mod event_log;
pub mod media;
pub mod request_details;
