pub mod config;
pub mod note;
pub mod remote;
pub mod watch;
