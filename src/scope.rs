//! Nested symbol scopes.
//!
//! Scopes live in an arena owned by [`SymbolTable`] so AST nodes can
//! point at the scope they were parsed in with a plain [`ScopeId`].
//! Popping a scope only moves the cursor back to its parent; the scope
//! itself stays available to whoever holds its id.

use std::collections::BTreeMap;
use std::rc::Rc;

use serde::Serialize;

use crate::ast::FunctionDecl;
use crate::error::ErrorKind;

/// Index of a scope inside its [`SymbolTable`].
pub type ScopeId = usize;

/// Id of the global scope.
pub const GLOBAL_SCOPE: ScopeId = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScopeKind {
    Global,
    Function,
    Block,
}

/// Declared shape of a function.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FunctionMeta {
    pub name: String,
    pub params: Vec<String>,
    pub aliases: Vec<String>,
    /// `function find_by*` also answers to `find_by_name`, `find_by_id`...
    pub has_wildcard: bool,
}

impl FunctionMeta {
    #[must_use]
    pub fn new(name: &str, params: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            params: params.iter().map(|p| (*p).to_string()).collect(),
            aliases: Vec::new(),
            has_wildcard: false,
        }
    }

    /// Whether a call spelled `name` reaches this function.
    #[must_use]
    pub fn answers_to(&self, name: &str) -> bool {
        self.name == name
            || self.aliases.iter().any(|a| a == name)
            || (self.has_wildcard && name.len() > self.name.len() && name.starts_with(&self.name))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SymbolKind {
    Variable,
    Function {
        meta: FunctionMeta,
        /// Declaration subtree, set once the body has been parsed.
        /// Host functions never get one.
        #[serde(skip)]
        decl: Option<Rc<FunctionDecl>>,
    },
    Module,
    /// Another name for the symbol called `target`.
    Alias { target: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub scope: ScopeId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scope {
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    pub symbols: BTreeMap<String, Symbol>,
}

/// Read-only name resolution, as seen from the current scope.
pub trait Resolve {
    fn resolve(&self, name: &str) -> Option<&Symbol>;

    /// Function reached by a call spelled `name`, following aliases
    /// and wildcard names.
    fn resolve_function(&self, name: &str) -> Option<&FunctionMeta>;

    fn current_scope(&self) -> ScopeId;

    fn is_defined(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }
}

/// Arena of scopes plus the cursor of the scope being parsed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    current: ScopeId,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    #[must_use]
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope {
                kind: ScopeKind::Global,
                parent: None,
                symbols: BTreeMap::new(),
            }],
            current: GLOBAL_SCOPE,
        }
    }

    #[must_use]
    pub fn scope(&self, id: ScopeId) -> Option<&Scope> {
        self.scopes.get(id)
    }

    #[must_use]
    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    /// Number of scopes between the current one and the global one.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut id = self.current;
        while let Some(parent) = self.scopes[id].parent {
            depth += 1;
            id = parent;
        }
        depth
    }

    /// Open a scope nested in the current one and make it current.
    pub fn push_scope(&mut self, kind: ScopeKind) -> ScopeId {
        let id = self.scopes.len();
        self.scopes.push(Scope {
            kind,
            parent: Some(self.current),
            symbols: BTreeMap::new(),
        });
        log::trace!("push {kind:?} scope {id} (parent {})", self.current);
        self.current = id;
        id
    }

    /// Return to the parent of the current scope.
    ///
    /// # Errors
    ///
    /// `ScopeUnderflow` when the current scope is the global one.
    pub fn pop_scope(&mut self) -> Result<ScopeId, ErrorKind> {
        let parent = self.scopes[self.current]
            .parent
            .ok_or(ErrorKind::ScopeUnderflow)?;
        log::trace!("pop scope {}", self.current);
        self.current = parent;
        Ok(parent)
    }

    fn define(&mut self, name: &str, kind: SymbolKind) {
        let scope = self.current;
        self.scopes[scope].symbols.insert(
            name.to_string(),
            Symbol {
                name: name.to_string(),
                kind,
                scope,
            },
        );
    }

    pub fn define_var(&mut self, name: &str) {
        self.define(name, SymbolKind::Variable);
    }

    pub fn define_module(&mut self, name: &str) {
        self.define(name, SymbolKind::Module);
    }

    pub fn define_alias(&mut self, name: &str, target: &str) {
        self.define(
            name,
            SymbolKind::Alias {
                target: target.to_string(),
            },
        );
    }

    /// Define a function and an alias symbol for each of its aliases.
    pub fn define_func(&mut self, meta: FunctionMeta) {
        let name = meta.name.clone();
        for alias in &meta.aliases {
            self.define_alias(alias, &name);
        }
        self.define(&name, SymbolKind::Function { meta, decl: None });
    }

    /// Attach the parsed declaration to the nearest function `name`.
    pub fn set_function_decl(&mut self, name: &str, decl: Rc<FunctionDecl>) {
        let Some(scope) = self.find_scope_of(name) else {
            return;
        };
        if let Some(Symbol {
            kind: SymbolKind::Function { decl: slot, .. },
            ..
        }) = self.scopes[scope].symbols.get_mut(name)
        {
            *slot = Some(decl);
        }
    }

    /// `name` is defined in the current scope itself.
    #[must_use]
    pub fn contains_local(&self, name: &str) -> bool {
        self.scopes[self.current].symbols.contains_key(name)
    }

    /// `name` is visible from the current scope.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get_symbol(name).is_some()
    }

    /// Nearest definition of `name`, searching outward.
    #[must_use]
    pub fn get_symbol(&self, name: &str) -> Option<&Symbol> {
        self.find_scope_of(name)
            .and_then(|id| self.scopes[id].symbols.get(name))
    }

    #[must_use]
    pub fn is_var(&self, name: &str) -> bool {
        matches!(
            self.get_symbol(name),
            Some(Symbol {
                kind: SymbolKind::Variable,
                ..
            })
        )
    }

    #[must_use]
    pub fn is_func(&self, name: &str) -> bool {
        self.function(name).is_some()
    }

    #[must_use]
    pub fn is_module(&self, name: &str) -> bool {
        matches!(
            self.get_symbol(name),
            Some(Symbol {
                kind: SymbolKind::Module,
                ..
            })
        )
    }

    /// Function reached by `name`: a direct definition, an alias, or a
    /// wildcard function whose name prefixes `name`.
    #[must_use]
    pub fn function(&self, name: &str) -> Option<&FunctionMeta> {
        match self.get_symbol(name).map(|s| &s.kind) {
            Some(SymbolKind::Function { meta, .. }) => return Some(meta),
            Some(SymbolKind::Alias { target }) => {
                return match self.get_symbol(target).map(|s| &s.kind) {
                    Some(SymbolKind::Function { meta, .. }) => Some(meta),
                    _ => None,
                };
            }
            Some(_) => return None,
            None => {}
        }
        self.visible_scopes()
            .flat_map(|scope| scope.symbols.values())
            .find_map(|symbol| match &symbol.kind {
                SymbolKind::Function { meta, .. } if meta.answers_to(name) => Some(meta),
                _ => None,
            })
    }

    /// Declaration subtree of the function reached by `name`.
    #[must_use]
    pub fn function_decl(&self, name: &str) -> Option<Rc<FunctionDecl>> {
        let target = self.function(name)?.name.clone();
        match &self.get_symbol(&target)?.kind {
            SymbolKind::Function { decl, .. } => decl.clone(),
            _ => None,
        }
    }

    fn find_scope_of(&self, name: &str) -> Option<ScopeId> {
        let mut id = Some(self.current);
        while let Some(scope) = id {
            if self.scopes[scope].symbols.contains_key(name) {
                return Some(scope);
            }
            id = self.scopes[scope].parent;
        }
        None
    }

    fn visible_scopes(&self) -> impl Iterator<Item = &Scope> {
        std::iter::successors(Some(&self.scopes[self.current]), |scope| {
            scope.parent.map(|p| &self.scopes[p])
        })
    }
}

impl Resolve for SymbolTable {
    fn resolve(&self, name: &str) -> Option<&Symbol> {
        self.get_symbol(name)
    }

    fn resolve_function(&self, name: &str) -> Option<&FunctionMeta> {
        self.function(name)
    }

    fn current_scope(&self) -> ScopeId {
        self.current
    }
}
