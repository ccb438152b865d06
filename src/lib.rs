pub mod config;
pub mod confirm;
pub mod error;
pub mod event;
pub mod extract;
pub mod ics;
pub mod pipeline;
pub mod prompt;
pub mod providers;
pub mod server;
pub mod shutdown;
pub mod startup;
