//! Voice conversion requests and the engine that serves them

mod engine;
mod request;

pub use engine::ConversionEngine;
pub use request::{ConversionRequest, ConversionResult, ConversionStatus};
