//! Layered evaluation environment (§3.6): constants and inputs are
//! read-only, the computed layer accumulates action writes, and loop
//! scopes (ForEach/While bindings) shadow everything beneath them.

use rules_common::Value;
use rustc_hash::FxHashMap;

pub struct Environment {
    constants: FxHashMap<String, Value>,
    inputs: FxHashMap<String, Value>,
    computed: FxHashMap<String, Value>,
    loop_scopes: Vec<FxHashMap<String, Value>>,
}

impl Environment {
    pub fn new(constants: FxHashMap<String, Value>, inputs: FxHashMap<String, Value>) -> Self {
        Environment { constants, inputs, computed: FxHashMap::default(), loop_scopes: Vec::new() }
    }

    /// Innermost-first lookup across loop scopes, then computed, inputs,
    /// constants.
    pub fn get(&self, name: &str) -> Option<&Value> {
        for scope in self.loop_scopes.iter().rev() {
            if let Some(v) = scope.get(name) {
                return Some(v);
            }
        }
        self.computed.get(name).or_else(|| self.inputs.get(name)).or_else(|| self.constants.get(name))
    }

    /// Writes always target the computed layer, even when a loop scope
    /// currently shadows the same name for reads (§3.6 "writes target the
    /// computed layer unless shadowed by a loop scope" refers to reads of
    /// that name observing the shadow, not the write's destination).
    pub fn set_computed(&mut self, name: impl Into<String>, value: Value) {
        self.computed.insert(name.into(), value);
    }

    pub fn push_loop_scope(&mut self) {
        self.loop_scopes.push(FxHashMap::default());
    }

    pub fn pop_loop_scope(&mut self) {
        self.loop_scopes.pop();
    }

    pub fn bind_in_current_loop_scope(&mut self, name: impl Into<String>, value: Value) {
        if let Some(scope) = self.loop_scopes.last_mut() {
            scope.insert(name.into(), value);
        } else {
            self.set_computed(name, value);
        }
    }

    pub fn computed(&self) -> &FxHashMap<String, Value> {
        &self.computed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loop_scope_shadows_outer_layers() {
        let mut env = Environment::new(FxHashMap::default(), FxHashMap::default());
        env.set_computed("x", Value::Number(1.into()));
        env.push_loop_scope();
        env.bind_in_current_loop_scope("x", Value::Number(2.into()));
        assert_eq!(env.get("x"), Some(&Value::Number(2.into())));
        env.pop_loop_scope();
        assert_eq!(env.get("x"), Some(&Value::Number(1.into())));
    }

    #[test]
    fn precedence_computed_over_inputs_over_constants() {
        let mut inputs = FxHashMap::default();
        inputs.insert("score".to_string(), Value::Number(1.into()));
        let mut constants = FxHashMap::default();
        constants.insert("score".to_string(), Value::Number(0.into()));
        let mut env = Environment::new(constants, inputs);
        assert_eq!(env.get("score"), Some(&Value::Number(1.into())));
        env.set_computed("score", Value::Number(9.into()));
        assert_eq!(env.get("score"), Some(&Value::Number(9.into())));
    }
}
