//! The variable scope resolver: lexical frames pushed and popped during
//! block lowering, with the target naming scheme that encodes each
//! binding's role and disambiguates shadowed scopes.

use indexmap::IndexMap;

/// Where a rewritten name lives in the target program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarContext {
    /// Function-local: parameters, locals, synthesized holders.
    Function,
    /// A field of an emitted struct.
    Struct,
}

/// A resolved binding: the rewritten target name and whether it holds a
/// pointer (storage-qualified locals, `self`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedId {
    pub name: String,
    pub pointer: bool,
}

/// Rewrites a source name into the target scheme. Underscores are doubled
/// so rewritten names can never collide across roles.
pub fn rewrite(name: &str, shadow: bool, context: VarContext) -> String {
    let escaped = name.replace('_', "__");
    let role = if shadow { "model" } else { "user" };
    match context {
        VarContext::Function => format!("func_{role}_{escaped}"),
        VarContext::Struct => format!("{role}_{escaped}"),
    }
}

#[derive(Debug, Default)]
pub struct VariableScopeResolver {
    frames: Vec<IndexMap<String, ResolvedId>>,
}

impl VariableScopeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&mut self) {
        self.frames.push(IndexMap::new());
    }

    pub fn exit(&mut self) {
        self.frames.pop().expect("scope underflow");
    }

    /// Registers a binding in the innermost frame and returns its
    /// rewritten form.
    pub fn record(
        &mut self,
        source_name: &str,
        shadow: bool,
        context: VarContext,
        pointer: bool,
    ) -> ResolvedId {
        let resolved = ResolvedId {
            name: rewrite(source_name, shadow, context),
            pointer,
        };
        self.frames
            .last_mut()
            .expect("no open scope")
            .insert(source_name.to_string(), resolved.clone());
        resolved
    }

    /// Resolves against the innermost binding; unresolved names fall
    /// through to contract state, reached through `self`.
    pub fn resolve_identifier(&self, source_name: &str) -> ResolvedId {
        for frame in self.frames.iter().rev() {
            if let Some(hit) = frame.get(source_name) {
                return hit.clone();
            }
        }
        ResolvedId {
            name: format!("self->{}", rewrite(source_name, false, VarContext::Struct)),
            pointer: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewriting_encodes_role_and_escapes_underscores() {
        assert_eq!(rewrite("a", false, VarContext::Function), "func_user_a");
        assert_eq!(rewrite("a", true, VarContext::Function), "func_model_a");
        assert_eq!(rewrite("owner", false, VarContext::Struct), "user_owner");
        assert_eq!(rewrite("balance", true, VarContext::Struct), "model_balance");
        assert_eq!(
            rewrite("b_ref", false, VarContext::Function),
            "func_user_b__ref"
        );
    }

    #[test]
    fn inner_frames_shadow_outer_ones() {
        let mut scope = VariableScopeResolver::new();
        scope.enter();
        scope.record("c", false, VarContext::Function, false);
        scope.enter();
        let inner = scope.record("c", false, VarContext::Function, true);
        assert_eq!(scope.resolve_identifier("c"), inner);
        scope.exit();
        assert_eq!(scope.resolve_identifier("c").pointer, false);
        scope.exit();
    }

    #[test]
    fn unresolved_names_fall_through_to_state() {
        let mut scope = VariableScopeResolver::new();
        scope.enter();
        let state = scope.resolve_identifier("a");
        assert_eq!(state.name, "self->user_a");
        assert!(!state.pointer);
        scope.exit();
    }
}
