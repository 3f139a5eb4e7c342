//! Method tables: a trie over class-chain tuples, keyed per dispatch
//! position, so resolving position *k* narrows the candidate set before
//! position *k+1* is examined.

use crate::class::ClassId;
use crate::value::BaseType;
use indexmap::IndexMap;

/// Unique identifier for a registered method within one generic function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodId(pub u32);

/// One entry of a dispatch chain, and one edge label in the method trie.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DispatchKey {
    /// Declared class
    Class(ClassId),
    /// Base-type tag, the terminal entry of every native chain
    Base(BaseType),
    /// Legacy class-attribute name, prefixing the chain of legacy-tagged
    /// instances verbatim
    Legacy(String),
    /// Matches every value; the implicit last entry of every chain
    Any,
}

#[derive(Debug, Default)]
struct Node {
    children: IndexMap<DispatchKey, Node>,
    method: Option<MethodId>,
}

/// Trie of registered method signatures for one generic function.
///
/// Every stored tuple has exactly `arity` keys; leaves at depth `arity`
/// carry the method. Registering the same tuple twice overwrites the
/// previous method (last write wins).
#[derive(Debug)]
pub struct MethodTable {
    root: Node,
    arity: usize,
}

impl MethodTable {
    pub fn new(arity: usize) -> Self {
        Self {
            root: Node::default(),
            arity,
        }
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Insert a signature tuple, returning the method it displaced, if any.
    pub fn insert(&mut self, keys: &[DispatchKey], method: MethodId) -> Option<MethodId> {
        debug_assert_eq!(keys.len(), self.arity);
        let mut node = &mut self.root;
        for key in keys {
            node = node.children.entry(key.clone()).or_default();
        }
        node.method.replace(method)
    }

    /// Greedy per-position resolution.
    ///
    /// At each position, the first chain entry with a matching sub-table is
    /// taken and the remaining entries are never revisited: a miss at a
    /// deeper position fails the whole resolution rather than backtracking.
    /// Position order is significant by contract.
    pub fn resolve(&self, chains: &[Vec<DispatchKey>]) -> Option<(MethodId, Vec<DispatchKey>)> {
        debug_assert_eq!(chains.len(), self.arity);
        let mut node = &self.root;
        let mut matched = Vec::with_capacity(self.arity);
        for chain in chains {
            let (key, child) = chain
                .iter()
                .find_map(|key| node.children.get(key).map(|child| (key, child)))?;
            matched.push(key.clone());
            node = child;
        }
        node.method.map(|method| (method, matched))
    }

    /// Enumerate every registered tuple applicable to the given chains, in
    /// lexicographic per-position-first-match order. The next-method cursor
    /// walks this sequence; the greedy resolution result always appears in
    /// it, though not necessarily first when the greedy walk dead-ended a
    /// more specific branch.
    pub fn enumerate(&self, chains: &[Vec<DispatchKey>]) -> Vec<(MethodId, Vec<DispatchKey>)> {
        let mut found = Vec::new();
        let mut tuple = Vec::with_capacity(self.arity);
        Self::enumerate_from(&self.root, chains, &mut tuple, &mut found);
        found
    }

    fn enumerate_from(
        node: &Node,
        chains: &[Vec<DispatchKey>],
        tuple: &mut Vec<DispatchKey>,
        found: &mut Vec<(MethodId, Vec<DispatchKey>)>,
    ) {
        match chains.split_first() {
            None => {
                if let Some(method) = node.method {
                    found.push((method, tuple.clone()));
                }
            }
            Some((chain, rest)) => {
                for key in chain {
                    if let Some(child) = node.children.get(key) {
                        tuple.push(key.clone());
                        Self::enumerate_from(child, rest, tuple, found);
                        tuple.pop();
                    }
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }
}
