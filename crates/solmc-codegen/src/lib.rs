//! The solmc translation layer.
//!
//! Driven by the analysis stack, this crate lowers every user type to a
//! target struct, every function to a target function threaded with an
//! explicit `self` pointer and call-state, every map declaration to a
//! specialized `Read`/`Write`/`Ref` trio, and every model into a
//! non-deterministic harness.

pub mod adt;
pub mod block;
pub mod expr;
pub mod func;
pub mod harness;
pub mod keys;
pub mod nd;
pub mod scope;
pub mod specialization;
pub mod state;

use tracing::info;

pub use solmc_analysis::{InvariantMode, Result, TranslateError, TranslationConfig};
use solmc_analysis::AnalysisStack;
use solmc_ast::ast::SourceUnit;

/// Translates one annotated source unit into target source, in the mode
/// the configuration selects. Output is deterministic for a given input.
pub fn translate(unit: &SourceUnit, config: &TranslationConfig) -> Result<String> {
    let stack = AnalysisStack::build(unit, config)?;
    let mut out = String::new();
    adt::print_adts(&stack, config.forward_declare, &mut out)?;
    func::print_functions(&stack, config, &mut out)?;
    harness::HarnessGenerator::new(&stack, config).print(&mut out)?;
    info!(
        bytes = out.len(),
        forward = config.forward_declare,
        "translation complete"
    );
    Ok(out)
}
