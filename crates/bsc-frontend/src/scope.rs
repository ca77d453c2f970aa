//! Lexical scoping for locals: a chain of frames, innermost first, each
//! mapping a name to the HIR `local` node that declared it.

use bsc_hir::NodeId;
use std::collections::HashMap;

pub struct Scope<'p> {
    parent: Option<&'p Scope<'p>>,
    locals: HashMap<String, NodeId>,
}

impl<'p> Scope<'p> {
    pub fn root() -> Self {
        Scope {
            parent: None,
            locals: HashMap::new(),
        }
    }

    pub fn child(&'p self) -> Scope<'p> {
        Scope {
            parent: Some(self),
            locals: HashMap::new(),
        }
    }

    pub fn find(&self, name: &str) -> Option<NodeId> {
        if let Some(&id) = self.locals.get(name) {
            return Some(id);
        }
        self.parent.and_then(|p| p.find(name))
    }

    /// Declare `name` in this frame. Panics if already bound here or in
    /// an enclosing frame — name clashes are caught by the caller before
    /// insertion and reported as a `SemanticError`.
    pub fn insert(&mut self, name: String, id: NodeId) {
        debug_assert!(self.find(&name).is_none());
        self.locals.insert(name, id);
    }
}
