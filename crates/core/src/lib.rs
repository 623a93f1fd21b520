#![forbid(unsafe_code)]

pub mod model;
pub mod scheduler;
pub mod similarity;
pub mod stats;
pub mod time;

pub use time::Clock;
