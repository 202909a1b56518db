pub mod admission;
pub mod client;
pub mod command;
pub mod config;
pub mod conn;
pub mod discovery;
pub mod protocol;
pub mod room;
pub mod server;
pub mod state;
