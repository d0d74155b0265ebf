// src/utils/mod.rs
pub mod cache;

pub use cache::{Clock, SystemClock, TtlCache};
