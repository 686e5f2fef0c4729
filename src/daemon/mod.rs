mod service;

pub use service::{report, run};
