#![deny(unused_must_use)]

pub mod ai_generation;
pub mod error;
pub mod log;
pub mod prelude;
pub mod quiz;
pub mod storage;
