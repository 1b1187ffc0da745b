#![deny(missing_docs)]

//! # Tracker Tree
//!
//! A forest of [`TrackerNode`]s built externally from the call graph; the
//! core never mutates it, only walks it. The Extractor depends on the
//! `TrackerTreeRef`/`TrackerNodeRef` traits rather than a concrete type so
//! that tests can supply small hand-built trees without going through
//! JSON (see the `mock` helpers used across `extractor.rs`'s test module).

use crate::callgraph::{CallArgument, CallGraphEdge, Metadata};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Stable identifier for one node, unique within its tree.
pub type NodeKey = String;

/// Read-only view over one node of the tree.
pub trait TrackerNodeRef {
    /// This node's stable key.
    fn key(&self) -> &str;
    /// The parent node's key, if any.
    fn parent(&self) -> Option<&str>;
    /// Keys of this node's children, in traversal order.
    fn children(&self) -> &[NodeKey];
    /// The call-graph edge this node wraps, if any (roots may be edgeless).
    fn edge(&self) -> Option<&CallGraphEdge>;
    /// Generic parameter name -> concrete type, shadowing the edge's own
    /// map when a key collides.
    fn type_param_map(&self) -> &HashMap<String, String>;
    /// The single argument this node represents, when the node was built
    /// to track one particular call argument rather than the whole call.
    fn argument(&self) -> Option<&CallArgument>;
}

/// Read-only view over a whole forest.
pub trait TrackerTreeRef {
    /// Concrete node type returned by lookups.
    type Node: TrackerNodeRef;

    /// Keys of the forest's root nodes.
    fn roots(&self) -> &[NodeKey];
    /// Looks up a node by its stable key.
    fn find_node_by_key(&self, key: &str) -> Option<&Self::Node>;
    /// Total number of nodes in the forest.
    fn node_count(&self) -> usize;
    /// The metadata this tree was built against.
    fn metadata(&self) -> &Metadata;

    /// Finds the first node (BFS from the roots, stable in the order
    /// `roots()` lists them) whose edge's callee resolves to
    /// `(name, pkg)` through this tree's own metadata pool. Used by the
    /// Extractor to locate the function a mount's router argument was
    /// assigned from.
    fn find_function_node(&self, name: &str, pkg: &str) -> Option<&Self::Node> {
        let mut queue: std::collections::VecDeque<NodeKey> = self.roots().to_vec().into();
        let mut seen = std::collections::HashSet::new();
        while let Some(key) = queue.pop_front() {
            if !seen.insert(key.clone()) {
                continue;
            }
            let Some(node) = self.find_node_by_key(&key) else { continue };
            if let Some(edge) = node.edge() {
                let callee_name = self.metadata().get_string(edge.callee.name);
                let callee_pkg = self.metadata().get_string(edge.callee.pkg);
                if callee_name == name && callee_pkg == pkg {
                    return self.find_node_by_key(&key);
                }
            }
            queue.extend(node.children().iter().cloned());
        }
        None
    }
}

/// A concrete node in the reference, in-memory tree implementation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InMemoryNode {
    /// This node's stable key.
    pub key: NodeKey,
    /// The parent node's key, if any.
    #[serde(default)]
    pub parent: Option<NodeKey>,
    /// Keys of this node's children, in traversal order.
    #[serde(default)]
    pub children: Vec<NodeKey>,
    /// The call-graph edge this node wraps, if any.
    #[serde(default)]
    pub edge: Option<CallGraphEdge>,
    /// Generic parameter name -> concrete type, shadowing the edge's map.
    #[serde(default)]
    pub type_param_map: HashMap<String, String>,
    /// The single argument this node represents, if built for that purpose.
    #[serde(default)]
    pub argument: Option<CallArgument>,
}

impl TrackerNodeRef for InMemoryNode {
    fn key(&self) -> &str {
        &self.key
    }

    fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    fn children(&self) -> &[NodeKey] {
        &self.children
    }

    fn edge(&self) -> Option<&CallGraphEdge> {
        self.edge.as_ref()
    }

    fn type_param_map(&self) -> &HashMap<String, String> {
        &self.type_param_map
    }

    fn argument(&self) -> Option<&CallArgument> {
        self.argument.as_ref()
    }
}

/// The reference, in-memory forest implementation: production use and
/// every component-level test deserialize or hand-build this type.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InMemoryTree {
    /// Keys of the forest's root nodes.
    pub roots: Vec<NodeKey>,
    /// Every node in the forest, keyed by its own key.
    pub nodes: HashMap<NodeKey, InMemoryNode>,
    /// The metadata this tree was built against.
    pub metadata: Metadata,
}

impl TrackerTreeRef for InMemoryTree {
    type Node = InMemoryNode;

    fn roots(&self) -> &[NodeKey] {
        &self.roots
    }

    fn find_node_by_key(&self, key: &str) -> Option<&InMemoryNode> {
        self.nodes.get(key)
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn metadata(&self) -> &Metadata {
        &self.metadata
    }
}

impl InMemoryTree {
    /// Finds the first node (BFS from the roots, stable in insertion
    /// order of `roots`) whose edge's callee matches `(name, pkg)`. Used
    /// by the Extractor to locate the function a mount's router argument
    /// was assigned from.
    pub fn find_function_node(&self, name: &str, pkg: &str) -> Option<&InMemoryNode> {
        let mut queue: std::collections::VecDeque<&str> =
            self.roots.iter().map(String::as_str).collect();
        let mut seen = std::collections::HashSet::new();
        while let Some(key) = queue.pop_front() {
            if !seen.insert(key) {
                continue;
            }
            let Some(node) = self.nodes.get(key) else { continue };
            if let Some(edge) = node.edge.as_ref() {
                let callee_name = self.metadata.get_string(edge.callee.name);
                let callee_pkg = self.metadata.get_string(edge.callee.pkg);
                if callee_name == name && callee_pkg == pkg {
                    return Some(node);
                }
            }
            for child in &node.children {
                queue.push_back(child);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(key: &str, parent: Option<&str>) -> InMemoryNode {
        InMemoryNode { key: key.into(), parent: parent.map(String::from), ..Default::default() }
    }

    #[test]
    fn roots_and_lookup() {
        let mut nodes = HashMap::new();
        nodes.insert("root".to_string(), leaf("root", None));
        let tree = InMemoryTree { roots: vec!["root".into()], nodes, metadata: Metadata::default() };
        assert_eq!(tree.roots(), &["root".to_string()]);
        assert!(tree.find_node_by_key("root").is_some());
        assert!(tree.find_node_by_key("missing").is_none());
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn round_trips_through_json() {
        let mut nodes = HashMap::new();
        nodes.insert("a".to_string(), leaf("a", None));
        let tree = InMemoryTree { roots: vec!["a".into()], nodes, metadata: Metadata::default() };
        let json = serde_json::to_string(&tree).unwrap();
        let back: InMemoryTree = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tree);
    }
}
