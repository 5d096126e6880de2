#![forbid(unsafe_code)]

pub mod access;
pub mod error;
pub mod integrity;
pub mod model;
pub mod registration;
pub mod time;
pub mod timer;

pub use error::Error;
pub use time::Clock;
