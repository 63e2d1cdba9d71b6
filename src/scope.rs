//! Query scopes (spec §3): a tree of nested regions — EXISTS, NOT
//! EXISTS, MINUS, UNION, SUBQUERY, GROUP — each owning its own local
//! variables table and the triples introduced directly inside it.
//!
//! A scope's parent link is a [`Weak`] reference: the builder that
//! constructs the scope tree owns the strong `Rc` chain, and a child
//! scope must not prolong its parent's lifetime beyond what the builder
//! guarantees (spec §9). `QueryScope` itself is a cheap `Rc`-backed
//! handle, so cloning it is just a refcount bump.

use crate::triple::Triple;
use crate::variable::VariablesTable;
use std::cell::{Ref, RefCell};
use std::rc::{Rc, Weak};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeRegion {
    Root,
    Exists,
    NotExists,
    Minus,
    Union,
    Subquery,
    Group,
}

struct ScopeInner {
    region: ScopeRegion,
    parent: Option<Weak<RefCell<ScopeInner>>>,
    /// Whether name lookups that miss locally fall back to the parent.
    /// GROUP scopes are isolated: a grouping key expression only sees
    /// variables bound inside the group region, not the enclosing
    /// query's bindings (see DESIGN.md for this Open Question decision).
    inherits: bool,
    variables: VariablesTable,
    triples: Vec<Triple>,
}

/// A reference-counted handle to one node of the scope tree.
#[derive(Clone)]
pub struct QueryScope(Rc<RefCell<ScopeInner>>);

impl QueryScope {
    pub fn root() -> Self {
        QueryScope(Rc::new(RefCell::new(ScopeInner {
            region: ScopeRegion::Root,
            parent: None,
            inherits: true,
            variables: VariablesTable::new(),
            triples: Vec::new(),
        })))
    }

    /// Create a child scope nested under `self` for the given region.
    /// GROUP scopes do not inherit the parent's visible variables;
    /// every other region does.
    pub fn child(&self, region: ScopeRegion) -> Self {
        let inherits = !matches!(region, ScopeRegion::Group);
        QueryScope(Rc::new(RefCell::new(ScopeInner {
            region,
            parent: Some(Rc::downgrade(&self.0)),
            inherits,
            variables: VariablesTable::new(),
            triples: Vec::new(),
        })))
    }

    pub fn region(&self) -> ScopeRegion {
        self.0.borrow().region
    }

    pub fn insert_named_variable(&self, name: impl Into<String>) -> usize {
        self.0.borrow_mut().variables.insert_named(name)
    }

    pub fn insert_anonymous_variable(&self, name: impl Into<String>) -> usize {
        self.0.borrow_mut().variables.insert_anonymous(name)
    }

    pub fn add_triple(&self, triple: Triple) {
        self.0.borrow_mut().triples.push(triple);
    }

    pub fn local_triples(&self) -> Vec<Triple> {
        self.0.borrow().triples.clone()
    }

    pub fn variables(&self) -> Ref<'_, VariablesTable> {
        Ref::map(self.0.borrow(), |inner| &inner.variables)
    }

    /// Look up a name in this scope's local variables, falling back to
    /// the parent only when this scope's region inherits.
    pub fn resolve(&self, name: &str) -> Option<usize> {
        let inner = self.0.borrow();
        if let Some(offset) = inner.variables.offset_of(name) {
            return Some(offset);
        }
        if inner.inherits {
            if let Some(parent) = inner.parent.as_ref().and_then(Weak::upgrade) {
                return QueryScope(parent).resolve(name);
            }
        }
        None
    }

    /// All names visible from this scope: local names first, then
    /// whatever the parent chain contributes (duplicates removed,
    /// innermost binding wins), mirroring `local ∪ visible(parent)`.
    pub fn visible_names(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut names = Vec::new();
        let mut current = Some(self.clone());
        while let Some(scope) = current {
            let inner = scope.0.borrow();
            for v in inner.variables.named_variables() {
                if seen.insert(v.name.clone()) {
                    names.push(v.name.clone());
                }
            }
            current = if inner.inherits {
                inner.parent.as_ref().and_then(Weak::upgrade).map(QueryScope)
            } else {
                None
            };
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_scope_sees_parent_variables_by_default() {
        let root = QueryScope::root();
        root.insert_named_variable("x");
        let child = root.child(ScopeRegion::Exists);
        child.insert_named_variable("y");
        assert_eq!(child.resolve("x"), Some(0));
        assert_eq!(child.resolve("y"), Some(0));
    }

    #[test]
    fn group_scope_is_isolated_from_its_parent() {
        let root = QueryScope::root();
        root.insert_named_variable("x");
        let group = root.child(ScopeRegion::Group);
        assert_eq!(group.resolve("x"), None);
    }

    #[test]
    fn visible_names_lists_local_before_parent() {
        let root = QueryScope::root();
        root.insert_named_variable("x");
        let child = root.child(ScopeRegion::Union);
        child.insert_named_variable("y");
        assert_eq!(child.visible_names(), vec!["y".to_string(), "x".to_string()]);
    }

    #[test]
    fn scope_retains_triples_added_to_it() {
        use crate::literal::Literal;
        let root = QueryScope::root();
        root.add_triple(Triple::new(Literal::uri("s"), Literal::uri("p"), Literal::uri("o")));
        assert_eq!(root.local_triples().len(), 1);
    }
}
