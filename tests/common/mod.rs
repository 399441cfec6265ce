#![allow(dead_code)]

pub mod logs;

#[cfg(feature = "integration-tests")]
mod gpu;

#[cfg(feature = "integration-tests")]
pub use gpu::*;
