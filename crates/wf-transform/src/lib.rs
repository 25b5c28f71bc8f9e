//! Sandboxed execution of generated transformation code.
//!
//! Transformation nodes carry a small Lua script, usually produced by a
//! language model from a natural-language prompt. The script receives its
//! primary input bound as `df` plus every input under its binding name, and
//! must leave the result in `df` when it finishes.

pub mod bindings;
pub mod error;
pub mod executor;

pub use error::{TransformError, TransformResult};
pub use executor::execute;
