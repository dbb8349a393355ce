mod client;
pub mod types;

pub use client::config::{Config, ConfigBuilder};
pub use client::{CallRx, Client};
pub use types::{CallEvent, ServerMessage};
