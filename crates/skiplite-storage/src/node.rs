//! Node storage for the skip list
//!
//! The skip list never holds nodes directly. It addresses them through
//! [`NodeId`]s handed out by a [`NodeStore`], which owns the key, the value
//! and the per-level forward links. A node at level `h` has `h + 1` links.
//!
//! Two stores are provided:
//!
//! - [`HeapNodes`]: slab of owned nodes. Deleting a node drops it at once
//!   and its slot is reused by a later insert.
//! - [`ArenaNodes`]: forward links live in [`Arena`] memory as
//!   pointer-width words. Deleting a node drops its key and value but the
//!   link bytes and the slot are never reclaimed, so a reader holding an old
//!   id can never observe a recycled node.

use crate::arena::{Arena, ArenaSlice, MemoryGauge};
use skiplite_core::Result;
use std::mem;

/// Index of a node inside its store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Owner of skip-list nodes and their forward links
pub trait NodeStore<K, V> {
    /// Creates a node participating in levels `0..=level`, all links empty
    fn allocate(&mut self, key: K, value: V, level: usize) -> Result<NodeId>;

    /// Destroys a node. The id must not be used afterwards.
    fn release(&mut self, id: NodeId);

    /// Key of a live node
    fn key(&self, id: NodeId) -> &K;

    /// Value of a live node
    fn value(&self, id: NodeId) -> &V;

    /// Mutable value of a live node
    fn value_mut(&mut self, id: NodeId) -> &mut V;

    /// Highest level the node is linked at
    fn level(&self, id: NodeId) -> usize;

    /// Successor at `level`
    fn next(&self, id: NodeId, level: usize) -> Option<NodeId>;

    /// Rewires the successor at `level`
    fn set_next(&mut self, id: NodeId, level: usize, next: Option<NodeId>);

    /// Bytes attributed to node storage
    fn gauge(&self) -> MemoryGauge;

    /// Number of live nodes
    fn live(&self) -> usize;
}

impl<K, V, S> NodeStore<K, V> for Box<S>
where
    S: NodeStore<K, V> + ?Sized,
{
    fn allocate(&mut self, key: K, value: V, level: usize) -> Result<NodeId> {
        (**self).allocate(key, value, level)
    }

    fn release(&mut self, id: NodeId) {
        (**self).release(id)
    }

    fn key(&self, id: NodeId) -> &K {
        (**self).key(id)
    }

    fn value(&self, id: NodeId) -> &V {
        (**self).value(id)
    }

    fn value_mut(&mut self, id: NodeId) -> &mut V {
        (**self).value_mut(id)
    }

    fn level(&self, id: NodeId) -> usize {
        (**self).level(id)
    }

    fn next(&self, id: NodeId, level: usize) -> Option<NodeId> {
        (**self).next(id, level)
    }

    fn set_next(&mut self, id: NodeId, level: usize, next: Option<NodeId>) {
        (**self).set_next(id, level, next)
    }

    fn gauge(&self) -> MemoryGauge {
        (**self).gauge()
    }

    fn live(&self) -> usize {
        (**self).live()
    }
}

const RELEASED: &str = "node id refers to a released node";

struct HeapNode<K, V> {
    key: K,
    value: V,
    forward: Box<[Option<NodeId>]>,
}

/// Heap-backed node slab with slot reuse
pub struct HeapNodes<K, V> {
    slots: Vec<Option<HeapNode<K, V>>>,
    free: Vec<usize>,
    usage: MemoryGauge,
    live: usize,
}

impl<K, V> HeapNodes<K, V> {
    /// Creates an empty store
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            usage: MemoryGauge::default(),
            live: 0,
        }
    }

    fn footprint(level: usize) -> usize {
        mem::size_of::<HeapNode<K, V>>() + (level + 1) * mem::size_of::<Option<NodeId>>()
    }

    fn node(&self, id: NodeId) -> &HeapNode<K, V> {
        self.slots[id.0].as_ref().expect(RELEASED)
    }

    fn node_mut(&mut self, id: NodeId) -> &mut HeapNode<K, V> {
        self.slots[id.0].as_mut().expect(RELEASED)
    }
}

impl<K, V> Default for HeapNodes<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> NodeStore<K, V> for HeapNodes<K, V> {
    fn allocate(&mut self, key: K, value: V, level: usize) -> Result<NodeId> {
        let node = HeapNode {
            key,
            value,
            forward: vec![None; level + 1].into_boxed_slice(),
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(node);
                slot
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };
        self.usage.add(Self::footprint(level));
        self.live += 1;
        Ok(NodeId(slot))
    }

    fn release(&mut self, id: NodeId) {
        if let Some(node) = self.slots[id.0].take() {
            self.usage.sub(Self::footprint(node.forward.len() - 1));
            self.free.push(id.0);
            self.live -= 1;
        }
    }

    fn key(&self, id: NodeId) -> &K {
        &self.node(id).key
    }

    fn value(&self, id: NodeId) -> &V {
        &self.node(id).value
    }

    fn value_mut(&mut self, id: NodeId) -> &mut V {
        &mut self.node_mut(id).value
    }

    fn level(&self, id: NodeId) -> usize {
        self.node(id).forward.len() - 1
    }

    fn next(&self, id: NodeId, level: usize) -> Option<NodeId> {
        self.node(id).forward[level]
    }

    fn set_next(&mut self, id: NodeId, level: usize, next: Option<NodeId>) {
        self.node_mut(id).forward[level] = next;
    }

    fn gauge(&self) -> MemoryGauge {
        self.usage.clone()
    }

    fn live(&self) -> usize {
        self.live
    }
}

/// Width of one encoded forward link
const LINK_BYTES: usize = mem::size_of::<u64>();
/// Encoded empty link
const NIL: u64 = u64::MAX;

struct ArenaNode<K, V> {
    key: K,
    value: V,
    level: usize,
    tower: ArenaSlice,
}

/// Node store whose forward links are bump-allocated from an [`Arena`]
pub struct ArenaNodes<K, V> {
    arena: Arena,
    nodes: Vec<Option<ArenaNode<K, V>>>,
    live: usize,
}

impl<K, V> ArenaNodes<K, V> {
    /// Creates an empty store with its own arena
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            nodes: Vec::new(),
            live: 0,
        }
    }

    /// The backing arena
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    fn node(&self, id: NodeId) -> &ArenaNode<K, V> {
        self.nodes[id.0].as_ref().expect(RELEASED)
    }
}

impl<K, V> Default for ArenaNodes<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> NodeStore<K, V> for ArenaNodes<K, V> {
    fn allocate(&mut self, key: K, value: V, level: usize) -> Result<NodeId> {
        let tower = self.arena.allocate_aligned((level + 1) * LINK_BYTES)?;
        self.arena.bytes_mut(tower).fill(0xff);
        self.nodes.push(Some(ArenaNode {
            key,
            value,
            level,
            tower,
        }));
        self.live += 1;
        Ok(NodeId(self.nodes.len() - 1))
    }

    fn release(&mut self, id: NodeId) {
        // Tower bytes stay in the arena until it is dropped
        if self.nodes[id.0].take().is_some() {
            self.live -= 1;
        }
    }

    fn key(&self, id: NodeId) -> &K {
        &self.node(id).key
    }

    fn value(&self, id: NodeId) -> &V {
        &self.node(id).value
    }

    fn value_mut(&mut self, id: NodeId) -> &mut V {
        &mut self.nodes[id.0].as_mut().expect(RELEASED).value
    }

    fn level(&self, id: NodeId) -> usize {
        self.node(id).level
    }

    fn next(&self, id: NodeId, level: usize) -> Option<NodeId> {
        let start = level * LINK_BYTES;
        let bytes = self.arena.bytes(self.node(id).tower);
        let mut word = [0u8; LINK_BYTES];
        word.copy_from_slice(&bytes[start..start + LINK_BYTES]);
        match u64::from_le_bytes(word) {
            NIL => None,
            raw => Some(NodeId(raw as usize)),
        }
    }

    fn set_next(&mut self, id: NodeId, level: usize, next: Option<NodeId>) {
        let start = level * LINK_BYTES;
        let tower = self.node(id).tower;
        let raw = next.map_or(NIL, |n| n.0 as u64);
        self.arena.bytes_mut(tower)[start..start + LINK_BYTES].copy_from_slice(&raw.to_le_bytes());
    }

    fn gauge(&self) -> MemoryGauge {
        self.arena.gauge()
    }

    fn live(&self) -> usize {
        self.live
    }
}
