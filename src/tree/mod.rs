//! Ordered, unique-keyed multiway tree.
//!
//! Every value carries an identity key (unique across the whole tree) and a
//! sort key. Siblings are kept in ascending sort-key order; ties keep their
//! insertion order. Nodes live in an arena and are addressed by [`NodeId`],
//! so inserting anywhere never invalidates an existing handle, and removing
//! a subtree leaves every unrelated handle intact.

mod arena;

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::hash::Hash;

use thiserror::Error;

use arena::{Arena, Handle};

/// Identity and ordering of a value stored in an [`OrderedTree`].
pub trait TreeValue {
    type Key: Eq + Hash + Clone + fmt::Display;
    type SortKey: PartialOrd;

    fn key(&self) -> Self::Key;
    fn sort_key(&self) -> Self::SortKey;
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("tree already has a root")]
    AlreadyHasRoot,

    #[error("parent not found: {0}")]
    ParentNotFound(String),

    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    #[error("node has children: {0}")]
    HasChildren(String),

    #[error("node not found: {0}")]
    NotFound(String),

    #[error("node is the root: {0}")]
    IsRoot(String),
}

/// Handle to a node. Stays valid until that node is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(Handle);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct FamilyId(Handle);

#[derive(Debug, Clone)]
struct Node<T> {
    value: T,
    parent: Option<NodeId>,
    /// Family this node is a member of.
    siblings: FamilyId,
    /// Family holding this node's children.
    children: FamilyId,
}

/// Sorted sibling list under one parent; the root sits alone in its own.
#[derive(Debug, Clone, Default)]
struct Family {
    members: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct OrderedTree<T: TreeValue> {
    nodes: Arena<Node<T>>,
    families: Arena<Family>,
    index: HashMap<T::Key, NodeId>,
    root: Option<NodeId>,
}

impl<T: TreeValue> Default for OrderedTree<T> {
    fn default() -> Self {
        Self {
            nodes: Arena::default(),
            families: Arena::default(),
            index: HashMap::new(),
            root: None,
        }
    }
}

impl<T: TreeValue> OrderedTree<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn contains(&self, key: &T::Key) -> bool {
        self.index.contains_key(key)
    }

    pub fn root_id(&self) -> Option<NodeId> {
        self.root
    }

    pub fn root(&self) -> Option<&T> {
        self.root.and_then(|id| self.get(id))
    }

    pub fn set_root(&mut self, value: T) -> Result<NodeId, TreeError> {
        if self.root.is_some() {
            return Err(TreeError::AlreadyHasRoot);
        }
        let family = FamilyId(self.families.insert(Family::default()));
        let id = self.attach(value, None, family);
        self.root = Some(id);
        Ok(id)
    }

    /// Insert `value` as a child of `parent_key`, in sort-key order.
    pub fn add_child(&mut self, value: T, parent_key: &T::Key) -> Result<NodeId, TreeError> {
        let parent = *self
            .index
            .get(parent_key)
            .ok_or_else(|| TreeError::ParentNotFound(parent_key.to_string()))?;
        let key = value.key();
        if self.index.contains_key(&key) {
            return Err(TreeError::DuplicateKey(key.to_string()));
        }
        let family = self.node(parent).children;
        Ok(self.attach(value, Some(parent), family))
    }

    fn attach(&mut self, value: T, parent: Option<NodeId>, siblings: FamilyId) -> NodeId {
        let key = value.key();
        let sort_key = value.sort_key();
        let children = FamilyId(self.families.insert(Family::default()));
        let id = NodeId(self.nodes.insert(Node { value, parent, siblings, children }));

        let pos = match self.families.get(siblings.0) {
            Some(family) => family
                .members
                .partition_point(|m| self.node(*m).value.sort_key() <= sort_key),
            None => 0,
        };
        if let Some(family) = self.families.get_mut(siblings.0) {
            family.members.insert(pos, id);
        }
        self.index.insert(key, id);
        id
    }

    /// Remove the node at `key`. Without `cascade` a node with children is
    /// refused. Returns the removed values, descendants first.
    pub fn remove_node(&mut self, key: &T::Key, cascade: bool) -> Result<Vec<T>, TreeError> {
        let id = self.id_of(key)?;
        if !cascade && !self.children_ids(id).is_empty() {
            return Err(TreeError::HasChildren(key.to_string()));
        }
        let mut removed = Vec::new();
        self.remove_subtree(id, &mut removed);
        Ok(removed)
    }

    fn remove_subtree(&mut self, id: NodeId, out: &mut Vec<T>) {
        let children = self.children_ids(id).to_vec();
        for child in children {
            self.remove_subtree(child, out);
        }
        let Some(node) = self.nodes.remove(id.0) else {
            return;
        };
        self.families.remove(node.children.0);
        if node.parent.is_some() {
            if let Some(family) = self.families.get_mut(node.siblings.0) {
                family.members.retain(|m| *m != id);
            }
        } else {
            self.families.remove(node.siblings.0);
            self.root = None;
        }
        self.index.remove(&node.value.key());
        out.push(node.value);
    }

    pub fn id_of(&self, key: &T::Key) -> Result<NodeId, TreeError> {
        self.index
            .get(key)
            .copied()
            .ok_or_else(|| TreeError::NotFound(key.to_string()))
    }

    pub fn find(&self, key: &T::Key) -> Result<&T, TreeError> {
        let id = self.id_of(key)?;
        Ok(&self.node(id).value)
    }

    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.nodes.get(id.0).map(|n| &n.value)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.nodes.get_mut(id.0).map(|n| &mut n.value)
    }

    pub fn parent_id(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    pub fn children_ids(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .and_then(|n| self.families.get(n.children.0))
            .map_or(&[][..], |f| f.members.as_slice())
    }

    fn sibling_ids(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .and_then(|n| self.families.get(n.siblings.0))
            .map_or(&[][..], |f| f.members.as_slice())
    }

    pub fn children_of(&self, key: &T::Key) -> Result<impl Iterator<Item = &T> + '_, TreeError> {
        let id = self.id_of(key)?;
        Ok(self.children_ids(id).iter().filter_map(move |c| self.get(*c)))
    }

    /// All members of the family containing `key`, the node itself included.
    pub fn siblings_of(&self, key: &T::Key) -> Result<impl Iterator<Item = &T> + '_, TreeError> {
        let id = self.id_of(key)?;
        Ok(self.sibling_ids(id).iter().filter_map(move |s| self.get(*s)))
    }

    pub fn parent_of(&self, key: &T::Key) -> Result<&T, TreeError> {
        let id = self.id_of(key)?;
        self.parent_id(id)
            .and_then(|p| self.get(p))
            .ok_or_else(|| TreeError::IsRoot(key.to_string()))
    }

    /// Number of edges between `id` and the root.
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut cursor = self.parent_id(id);
        while let Some(p) = cursor {
            depth += 1;
            cursor = self.parent_id(p);
        }
        depth
    }

    /// Handles in breadth-first order, each family in sorted order.
    pub fn breadth_first(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.len());
        let mut queue: VecDeque<NodeId> = self.root.into_iter().collect();
        while let Some(id) = queue.pop_front() {
            order.push(id);
            queue.extend(self.children_ids(id).iter().copied());
        }
        order
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.breadth_first().into_iter().filter_map(move |id| self.get(id))
    }

    fn node(&self, id: NodeId) -> &Node<T> {
        // Handles held internally always point at live nodes.
        match self.nodes.get(id.0) {
            Some(node) => node,
            None => unreachable!("dangling internal node handle"),
        }
    }
}
