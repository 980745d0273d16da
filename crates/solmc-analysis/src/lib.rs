//! Whole-program analyses over the annotated AST.
//!
//! Everything here is built eagerly at the start of a translation session
//! and immutable afterwards; the translation layer consults it read-only.
//! The [`stack::AnalysisStack`] glues the individual analyses together in
//! dependency order.

pub mod addresses;
pub mod allocation;
pub mod callstate;
pub mod config;
pub mod dependance;
pub mod error;
pub mod inheritance;
pub mod reach;
pub mod stack;
pub mod taint;
pub mod types;

pub use config::{InvariantMode, TranslationConfig};
pub use error::{Result, TranslateError};
pub use stack::AnalysisStack;
