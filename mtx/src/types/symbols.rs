//! Scoped symbol table for the type checker

use super::descriptor::Descriptor;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared reference to a scope
pub type ScopeRef = Rc<RefCell<SymbolTable>>;

/// One scope of name -> descriptor bindings, chained to its parent
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: HashMap<String, Descriptor>,
    parent: Option<ScopeRef>,
}

impl SymbolTable {
    /// Create a new root scope
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap in Rc<RefCell<>>
    pub fn into_ref(self) -> ScopeRef {
        Rc::new(RefCell::new(self))
    }

    /// Insert or overwrite in this scope only
    pub fn put(&mut self, name: impl Into<String>, descriptor: Descriptor) {
        self.symbols.insert(name.into(), descriptor);
    }

    /// Nearest enclosing binding for `name`
    pub fn get(&self, name: &str) -> Option<Descriptor> {
        if let Some(descriptor) = self.symbols.get(name) {
            Some(descriptor.clone())
        } else if let Some(parent) = &self.parent {
            parent.borrow().get(name)
        } else {
            None
        }
    }

    /// Owning parent, `None` at the root
    pub fn parent_scope(&self) -> Option<ScopeRef> {
        self.parent.clone()
    }

    /// Every name visible from this scope, innermost first
    pub fn visible_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.symbols.keys().cloned().collect();
        names.sort();
        if let Some(parent) = &self.parent {
            for name in parent.borrow().visible_names() {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }
}

/// Create a child scope whose parent is `parent`
pub fn create_child(parent: &ScopeRef) -> ScopeRef {
    SymbolTable {
        symbols: HashMap::new(),
        parent: Some(Rc::clone(parent)),
    }
    .into_ref()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::descriptor::{Dim, VarType};

    fn int() -> Descriptor {
        Descriptor::scalar(VarType::Int)
    }

    #[test]
    fn test_put_and_get() {
        let mut table = SymbolTable::new();
        table.put("x", int());
        assert_eq!(table.get("x"), Some(int()));
        assert_eq!(table.get("y"), None);
    }

    #[test]
    fn test_child_sees_parent() {
        let root = SymbolTable::new().into_ref();
        root.borrow_mut().put("x", int());

        let child = create_child(&root);
        child.borrow_mut().put("v", Descriptor::vector(Dim::Known(3)));

        assert_eq!(child.borrow().get("x"), Some(int()));
        assert!(child.borrow().get("v").is_some());
        // Parent cannot see child's bindings
        assert_eq!(root.borrow().get("v"), None);
    }

    #[test]
    fn test_shadowing() {
        let root = SymbolTable::new().into_ref();
        root.borrow_mut().put("x", int());

        let child = create_child(&root);
        child.borrow_mut().put("x", Descriptor::scalar(VarType::Str));

        assert_eq!(child.borrow().get("x").map(|d| d.ty), Some(VarType::Str));
        assert_eq!(root.borrow().get("x").map(|d| d.ty), Some(VarType::Int));
    }

    #[test]
    fn test_parent_scope() {
        let root = SymbolTable::new().into_ref();
        let child = create_child(&root);
        let back = child.borrow().parent_scope();
        assert!(back.is_some_and(|p| Rc::ptr_eq(&p, &root)));
        assert!(root.borrow().parent_scope().is_none());
    }

    #[test]
    fn test_visible_names() {
        let root = SymbolTable::new().into_ref();
        root.borrow_mut().put("a", int());
        root.borrow_mut().put("b", int());
        let child = create_child(&root);
        child.borrow_mut().put("b", int());
        child.borrow_mut().put("c", int());
        assert_eq!(child.borrow().visible_names(), vec!["b", "c", "a"]);
    }
}
