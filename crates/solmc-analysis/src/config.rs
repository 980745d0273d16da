use serde::{Deserialize, Serialize};

/// How map invariants are declared and enforced by the harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvariantMode {
    /// No invariant functions, no checks.
    #[default]
    None,
    /// Invariants constrain only the non-implicit (client) address slots.
    Existential,
    /// Invariants constrain every address slot.
    Universal,
}

/// Translation session configuration, threaded explicitly through the
/// pipeline. There is no process-wide state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranslationConfig {
    /// Emit forward declarations only.
    #[serde(default)]
    pub forward_declare: bool,
    /// Advance `blocknum`/`timestamp` only on a non-deterministic
    /// `take_step`, modelling a finer adversary.
    #[serde(default)]
    pub use_lockstep_time: bool,
    #[serde(default)]
    pub invariant_mode: InvariantMode,
    /// Root contracts of the model, in actor order. Empty selects the
    /// full-source build, which models every contract.
    #[serde(default)]
    pub model: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_full_source_definition_mode() {
        let config = TranslationConfig::default();
        assert!(!config.forward_declare);
        assert!(!config.use_lockstep_time);
        assert_eq!(config.invariant_mode, InvariantMode::None);
        assert!(config.model.is_empty());
    }

    #[test]
    fn invariant_mode_serde_spelling() {
        let mode: InvariantMode = serde_json::from_str("\"existential\"").unwrap();
        assert_eq!(mode, InvariantMode::Existential);
    }
}
