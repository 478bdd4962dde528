//! Directory tree flattening.
//!
//! A recursive listing comes back as a nested [`Node`] tree. [`flatten`]
//! walks it depth-first and produces the ordered list of every key below
//! the root plus a map from each leaf's key to its value.

use std::collections::BTreeMap;

use crate::response::Node;

/// Key of the root directory, which is never listed.
const ROOT_KEY: &str = "/";

/// A borrowed, tagged view of a [`Node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeNode<'a> {
    Leaf {
        key: Option<&'a str>,
        value: Option<&'a str>,
    },
    Directory {
        key: Option<&'a str>,
        children: &'a [Node],
    },
}

impl<'a> TreeNode<'a> {
    pub fn key(&self) -> Option<&'a str> {
        match self {
            TreeNode::Leaf { key, .. } | TreeNode::Directory { key, .. } => *key,
        }
    }
}

impl<'a> From<&'a Node> for TreeNode<'a> {
    fn from(node: &'a Node) -> Self {
        if node.is_dir() {
            TreeNode::Directory {
                key: node.key.as_deref(),
                children: node.children(),
            }
        } else {
            TreeNode::Leaf {
                key: node.key.as_deref(),
                value: node.value.as_deref(),
            }
        }
    }
}

/// The result of flattening one listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlattenedTree {
    /// Every key except the root, parents before descendants, siblings in
    /// listing order.
    pub dirs: Vec<String>,

    /// Leaf values keyed by the key emitted just before them.
    pub values: BTreeMap<String, String>,
}

/// Flatten a listed tree rooted at `node`.
///
/// ```rust
/// use etcdkv::{flatten, Node};
///
/// let tree = Node::directory(
///     Some("/"),
///     vec![
///         Node::leaf("/a", "1"),
///         Node::directory(Some("/b"), vec![Node::leaf("/b/c", "2")]),
///     ],
/// );
/// let flat = flatten(&tree);
/// assert_eq!(flat.dirs, vec!["/a", "/b", "/b/c"]);
/// assert_eq!(flat.values.get("/b/c").map(String::as_str), Some("2"));
/// ```
pub fn flatten(node: &Node) -> FlattenedTree {
    let mut tree = FlattenedTree::default();
    walk(TreeNode::from(node), &mut tree);
    tree
}

fn walk(node: TreeNode<'_>, tree: &mut FlattenedTree) {
    // A value belongs to the last key emitted in its own node; the root and
    // key-less nodes emit nothing, leaving it unnamed.
    let last_key = match node.key() {
        Some(key) if key != ROOT_KEY => {
            tree.dirs.push(key.to_string());
            key
        }
        _ => "",
    };

    match node {
        TreeNode::Leaf { value, .. } => {
            if let Some(value) = value {
                record(tree, last_key, value);
            }
        }
        TreeNode::Directory { children, .. } => {
            for child in children {
                walk(TreeNode::from(child), tree);
            }
        }
    }
}

fn record(tree: &mut FlattenedTree, last_key: &str, value: &str) {
    tree.values.insert(last_key.to_string(), value.to_string());
}
