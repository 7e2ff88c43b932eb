pub mod common;
pub mod completions;
pub mod config;
pub mod delete;
pub mod identity;
pub mod list;
pub mod session;
pub mod sleep;
pub mod watch;
