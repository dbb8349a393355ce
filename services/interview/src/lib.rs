pub mod commands;
pub mod config;
pub mod session;
pub mod vapi_adapter;
pub mod view;

