use std::{any::Any, collections::HashMap, sync::Arc};

/// One immutable trie node. Children hang off single key bytes; a node that
/// carries a value is a terminal for some key, possibly with further keys
/// below it. Nodes are never mutated after construction; versions share
/// unchanged subtrees through the `Arc` child handles.
struct TrieNode {
    children: HashMap<u8, Arc<TrieNode>>,
    value: Option<Arc<dyn Any + Send + Sync>>,
}

impl TrieNode {
    fn is_value_node(&self) -> bool {
        self.value.is_some()
    }
}

/// Persistent map from byte strings to heterogeneous values.
///
/// Every mutation returns a new `Trie`; existing handles keep observing the
/// contents they had when they were created. Only the path from the root to
/// the touched key is copied, everything off the path is shared with the
/// previous version. Value types are observed at read time: `get` returns
/// `None` when the stored value is not of the requested type.
#[derive(Default, Clone)]
pub struct Trie {
    root: Option<Arc<TrieNode>>,
}

impl Trie {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walks the trie along `key`. Returns `None` on a missing edge, a
    /// terminal that holds no value, or a value of a different type. Never
    /// allocates.
    pub fn get<T: Any + Send + Sync>(&self, key: &[u8]) -> Option<&T> {
        let mut node = self.root.as_deref()?;
        for &byte in key {
            node = node.children.get(&byte)?.as_ref();
        }
        node.value.as_ref()?.downcast_ref::<T>()
    }

    /// Returns a new trie with `value` stored under `key`. An existing value
    /// under the same key is replaced; its children are kept. For the empty
    /// key the value lands on the root itself.
    pub fn put<T: Any + Send + Sync>(&self, key: &[u8], value: T) -> Trie {
        let value: Arc<dyn Any + Send + Sync> = Arc::new(value);
        let new_root = Self::put_node(self.root.as_deref(), key, value);
        Trie {
            root: Some(Arc::new(new_root)),
        }
    }

    /// Returns a new trie without `key`. If `key` does not name a value node
    /// the original trie is returned unchanged. Nodes left with no children
    /// and no value are pruned on the way back up; a pruned-empty root yields
    /// the empty trie.
    pub fn remove(&self, key: &[u8]) -> Trie {
        let Some(root) = self.root.as_ref() else {
            return self.clone();
        };

        match Self::remove_node(root, key) {
            None => self.clone(),
            Some(new_root) => Trie { root: new_root },
        }
    }

    /// Rebuilds the path from `node` down along `key`, sharing every
    /// untouched child with the old version, and plants `value` at the end.
    fn put_node(node: Option<&TrieNode>, key: &[u8], value: Arc<dyn Any + Send + Sync>) -> TrieNode {
        let mut children = node.map(|n| n.children.clone()).unwrap_or_default();

        match key.split_first() {
            None => TrieNode {
                children,
                value: Some(value),
            },
            Some((&byte, rest)) => {
                let old_child = children.get(&byte).cloned();
                let new_child = Self::put_node(old_child.as_deref(), rest, value);
                children.insert(byte, Arc::new(new_child));
                TrieNode {
                    children,
                    value: node.and_then(|n| n.value.clone()),
                }
            }
        }
    }

    /// Outer `None` means the key does not end at a value node and nothing
    /// changes. Otherwise yields the rebuilt replacement for `node`, where
    /// inner `None` means the node pruned away entirely.
    fn remove_node(node: &Arc<TrieNode>, key: &[u8]) -> Option<Option<Arc<TrieNode>>> {
        match key.split_first() {
            None => {
                node.value.as_ref()?;
                if node.children.is_empty() {
                    return Some(None);
                }
                Some(Some(Arc::new(TrieNode {
                    children: node.children.clone(),
                    value: None,
                })))
            }
            Some((&byte, rest)) => {
                let child = node.children.get(&byte)?;
                let replacement = Self::remove_node(child, rest)?;

                let mut children = node.children.clone();
                match replacement {
                    Some(new_child) => {
                        children.insert(byte, new_child);
                    }
                    None => {
                        children.remove(&byte);
                    }
                }

                if children.is_empty() && !node.is_value_node() {
                    return Some(None);
                }
                Some(Some(Arc::new(TrieNode {
                    children,
                    value: node.value.clone(),
                })))
            }
        }
    }
}
