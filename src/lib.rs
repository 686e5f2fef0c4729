pub mod config;
pub mod daemon;
pub mod dns;
pub mod error;
pub mod ip;
pub mod registry;
pub mod secrets;
pub mod updater;

pub use error::{Error, Result};
