//! Lexical scope table for the flattening pass.
//!
//! Scopes form a tree with parent pointers only: block scopes hold the
//! `ScopeId` of their parent and parents never reference children, so cycles
//! are impossible by construction. All physical slots live in one flat address
//! space owned by the root scope; every allocation, from any depth, delegates
//! up the parent chain to the root's counter. The table outlives the walk and
//! is handed to the backend, which queries it while emitting bytecode.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Raised when a name resolves through the entire scope chain without a
/// binding. Nothing is ambiently in scope, so this is a compiler defect in the
/// caller, not a user-facing diagnostic.
pub const INV_UNRESOLVED_BINDING: &str = "F-ERR-SCOPE-001";

/// Index of a scope in the [`ScopeTable`] arena. Scope 0 is always the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeId(pub u32);

/// What a slot was allocated for. The backend uses the tag to decide how the
/// binding is materialized at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SlotName {
    /// A block parameter declared by a template body or element.
    Local(String),
    /// A named argument (`@name`-style external input).
    NamedArgument(String),
    /// A yielded block passed into a component.
    YieldedBlock(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct RootScope {
    /// Next slot to hand out. Starts at 1 and only ever increases; after a
    /// compile, `size - 1` equals the number of allocations performed.
    size: u32,
    named: HashMap<String, u32>,
    blocks: HashMap<String, u32>,
    /// Every allocated identifier in allocation order; index = slot - 1.
    symbols: Vec<SlotName>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct BlockScope {
    parent: ScopeId,
    locals: Vec<String>,
    slots: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
enum Scope {
    Root(RootScope),
    Block(BlockScope),
}

/// Arena of lexical scopes produced by one compile.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeTable {
    scopes: Vec<Scope>,
}

impl ScopeTable {
    pub const ROOT: ScopeId = ScopeId(0);

    pub fn new() -> Self {
        ScopeTable {
            scopes: vec![Scope::Root(RootScope {
                size: 1,
                named: HashMap::new(),
                blocks: HashMap::new(),
                symbols: Vec::new(),
            })],
        }
    }

    fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }

    fn root(&self) -> &RootScope {
        match &self.scopes[0] {
            Scope::Root(root) => root,
            Scope::Block(_) => unreachable!("scope 0 is always the root"),
        }
    }

    fn root_mut(&mut self) -> &mut RootScope {
        match &mut self.scopes[0] {
            Scope::Root(root) => root,
            Scope::Block(_) => unreachable!("scope 0 is always the root"),
        }
    }

    /// True iff `name` is bound in `scope` or any ancestor. The root binds
    /// nothing, so `has(ScopeTable::ROOT, ..)` is always false.
    pub fn has(&self, scope: ScopeId, name: &str) -> bool {
        let mut current = scope;
        loop {
            match self.scope(current) {
                Scope::Root(_) => return false,
                Scope::Block(block) => {
                    if block.locals.iter().any(|local| local == name) {
                        return true;
                    }
                    current = block.parent;
                }
            }
        }
    }

    /// Resolves `name` to its slot, checking local bindings before delegating
    /// to the parent. Within one scope the first declaration of a name wins.
    ///
    /// # Panics
    ///
    /// Panics with [`INV_UNRESOLVED_BINDING`] if no scope in the chain binds
    /// `name`. Callers must establish scope before resolving.
    pub fn get(&self, scope: ScopeId, name: &str) -> u32 {
        let mut current = scope;
        loop {
            match self.scope(current) {
                Scope::Root(_) => panic!(
                    "{}: no binding for '{}' in any enclosing scope",
                    INV_UNRESOLVED_BINDING, name
                ),
                Scope::Block(block) => {
                    if let Some(pos) = block.locals.iter().position(|local| local == name) {
                        return block.slots[pos];
                    }
                    current = block.parent;
                }
            }
        }
    }

    /// Unconditionally allocates a fresh slot from the root counter.
    pub fn allocate(&mut self, symbol: SlotName) -> u32 {
        let root = self.root_mut();
        root.symbols.push(symbol);
        let slot = root.size;
        root.size += 1;
        slot
    }

    /// Idempotent allocation for a named argument: the first call for `name`
    /// allocates and memoizes, subsequent calls return the same slot.
    pub fn allocate_named(&mut self, name: &str) -> u32 {
        if let Some(&slot) = self.root().named.get(name) {
            return slot;
        }
        let slot = self.allocate(SlotName::NamedArgument(name.to_string()));
        self.root_mut().named.insert(name.to_string(), slot);
        slot
    }

    /// Idempotent allocation for a yielded block. Separate memo namespace from
    /// named arguments: `allocate_named("x")` and `allocate_block("x")` are
    /// distinct slots.
    pub fn allocate_block(&mut self, name: &str) -> u32 {
        if let Some(&slot) = self.root().blocks.get(name) {
            return slot;
        }
        let slot = self.allocate(SlotName::YieldedBlock(name.to_string()));
        self.root_mut().blocks.insert(name.to_string(), slot);
        slot
    }

    /// Constructs a child scope of `parent` binding `local_names` in order,
    /// each to a fresh globally allocated slot. Declaring the same name twice
    /// in one call is a caller error; lookups resolve to the first occurrence.
    pub fn child(&mut self, parent: ScopeId, local_names: &[String]) -> ScopeId {
        let slots = local_names
            .iter()
            .map(|name| self.allocate(SlotName::Local(name.clone())))
            .collect();
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope::Block(BlockScope {
            parent,
            locals: local_names.to_vec(),
            slots,
        }));
        id
    }

    /// All bindings visible from `scope` in key-insertion order: ancestors'
    /// names first, own names last. A name redeclared by a nearer scope keeps
    /// its original position but takes the nearer slot.
    pub fn locals_map(&self, scope: ScopeId) -> Vec<(String, u32)> {
        match self.scope(scope) {
            Scope::Root(_) => Vec::new(),
            Scope::Block(block) => {
                let mut map = self.locals_map(block.parent);
                for name in &block.locals {
                    let slot = self.get(scope, name);
                    match map.iter_mut().find(|(existing, _)| existing == name) {
                        Some(entry) => entry.1 = slot,
                        None => map.push((name.clone(), slot)),
                    }
                }
                map
            }
        }
    }

    /// The slots of [`locals_map`](Self::locals_map) in that map's key order.
    pub fn eval_info(&self, scope: ScopeId) -> Vec<u32> {
        self.locals_map(scope)
            .into_iter()
            .map(|(_, slot)| slot)
            .collect()
    }

    /// Parent of a block scope; `None` for the root.
    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        match self.scope(scope) {
            Scope::Root(_) => None,
            Scope::Block(block) => Some(block.parent),
        }
    }

    /// Value of the root allocation counter (1 + allocations performed).
    pub fn size(&self) -> u32 {
        self.root().size
    }

    /// All allocated identifiers in allocation order; index = slot - 1.
    pub fn symbols(&self) -> &[SlotName] {
        &self.root().symbols
    }

    /// Number of scopes constructed, the root included.
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl Default for ScopeTable {
    fn default() -> Self {
        Self::new()
    }
}
