//! Rule base export format and loader
//!
//! This module provides the serializable form of a compiled rule base and
//! the conversions to and from it.

mod format;
mod loader;

pub use format::*;
pub use loader::*;
