pub mod config;
pub mod location;
pub mod notify;
pub mod report;
pub mod screen;
