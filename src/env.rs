use std::collections::HashMap;

use crate::{token::Range, types::CodeType, util::intern::Interned};

/// A chain of lexical scopes, mapping identifiers to their types.
///
/// Scopes are kept in a stack: the last one is the current scope and each
/// scope's parent is the one right below it. A scope is created by
/// [`Environment::sub_env`] and discarded, with all of its bindings, by
/// [`Environment::pop`].
#[derive(Debug)]
pub struct Environment {
    scopes: Vec<Scope>,
}

type Scope = HashMap<Interned<str>, Binding>;

#[derive(Clone, Debug, PartialEq)]
pub struct Binding {
    pub ty: CodeType,
    /// Where the name was bound in the source. `None` for builtins.
    pub defined_at: Option<Range>,
}

impl Environment {
    /// Creates an environment with a single (root) scope.
    pub fn with_capacity(capacity: usize) -> Environment {
        Environment {
            scopes: vec![HashMap::with_capacity(capacity)],
        }
    }

    /// Enters a new child scope of the current one.
    pub fn sub_env(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Discards the current scope. The root scope is never popped.
    pub fn pop(&mut self) {
        assert!(self.scopes.len() > 1, "can't pop the root scope");
        self.scopes.pop();
    }

    /// Number of scopes, including the root one.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Binds (or rebinds) the name in the current scope.
    pub fn set(&mut self, name: Interned<str>, binding: Binding) {
        self.current_mut().insert(name, binding);
    }

    /// Looks the name up, from the current scope up to the root.
    pub fn get(&self, name: Interned<str>) -> Option<&Binding> {
        self.scopes.iter().rev().find_map(|scope| scope.get(&name))
    }

    /// Looks the name up in the current scope only.
    pub fn get_local(&self, name: Interned<str>) -> Option<&Binding> {
        self.scopes.last().and_then(|scope| scope.get(&name))
    }

    fn current_mut(&mut self) -> &mut Scope {
        self.scopes
            .last_mut()
            .expect("environment always has a root scope")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::util::intern::Interner;

    fn binding(ty: CodeType) -> Binding {
        Binding {
            ty,
            defined_at: None,
        }
    }

    #[test]
    fn test_lookup_walks_parents() {
        let mut i = Interner::with_capacity(4);
        let (x, y) = (i.intern("x"), i.intern("y"));
        let mut env = Environment::with_capacity(4);

        env.set(x, binding(CodeType::Number));
        env.sub_env();
        env.set(y, binding(CodeType::String));

        assert_eq!(env.get(x).map(|b| &b.ty), Some(&CodeType::Number));
        assert_eq!(env.get(y).map(|b| &b.ty), Some(&CodeType::String));
        assert_eq!(env.get_local(x), None);
        assert!(env.get_local(y).is_some());

        env.pop();
        assert_eq!(env.get(y), None);
        assert_eq!(env.depth(), 1);
    }

    #[test]
    fn test_shadowing() {
        let mut i = Interner::with_capacity(4);
        let x = i.intern("x");
        let mut env = Environment::with_capacity(4);

        env.set(x, binding(CodeType::Number));
        env.sub_env();
        env.set(x, binding(CodeType::Boolean));
        assert_eq!(env.get(x).map(|b| &b.ty), Some(&CodeType::Boolean));
        env.pop();
        assert_eq!(env.get(x).map(|b| &b.ty), Some(&CodeType::Number));
    }

    #[test]
    #[should_panic(expected = "can't pop the root scope")]
    fn test_root_is_never_popped() {
        Environment::with_capacity(1).pop();
    }
}
