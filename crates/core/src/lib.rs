#![forbid(unsafe_code)]

pub mod error;
pub mod fetch;
pub mod model;
pub mod time;

pub use error::FetchError;
pub use fetch::FetchState;
pub use time::Clock;
