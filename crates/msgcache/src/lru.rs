//! Recency order over cached keys
//!
//! Nodes live in an arena and are addressed by [`NodeHandle`]; the list is
//! doubly linked through arena indices, head = most recently used.

use std::collections::TryReserveError;

use crate::CacheKey;

/// Handle to a node owned by an [`LruOrder`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle(usize);

/// Node in the recency list
#[derive(Debug)]
struct Node {
    key: CacheKey,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Doubly-linked recency order, most recently used at the head
#[derive(Debug, Default)]
pub struct LruOrder {
    nodes: Vec<Option<Node>>,
    head: Option<usize>,
    tail: Option<usize>,
    free_list: Vec<usize>,
    len: usize,
}

impl LruOrder {
    /// Create an empty order
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty order with room for `capacity` nodes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Make sure the next `additional` inserts will not allocate
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        let needed = additional.saturating_sub(self.free_list.len());
        self.nodes.try_reserve(needed)
    }

    /// Allocate a node for `key` and link it at the head
    pub fn push_front(&mut self, key: CacheKey) -> NodeHandle {
        let idx = self.alloc_node();
        self.nodes[idx] = Some(Node {
            key,
            prev: None,
            next: None,
        });
        self.len += 1;
        self.link_front(idx);
        NodeHandle(idx)
    }

    /// Move a linked node to the head
    pub fn move_to_front(&mut self, handle: NodeHandle) {
        let idx = handle.0;
        if self.head == Some(idx) || self.node(idx).is_none() {
            return;
        }

        self.unlink(idx);
        self.link_front(idx);
    }

    /// Key at the tail (least recently used), if any
    pub fn peek_tail(&self) -> Option<CacheKey> {
        self.tail.and_then(|idx| self.node(idx)).map(|node| node.key)
    }

    /// Key at the head (most recently used), if any
    pub fn peek_head(&self) -> Option<CacheKey> {
        self.head.and_then(|idx| self.node(idx)).map(|node| node.key)
    }

    /// Key stored in a node
    pub fn key(&self, handle: NodeHandle) -> Option<CacheKey> {
        self.node(handle.0).map(|node| node.key)
    }

    /// Unlink a node and free its slot, returning its key
    ///
    /// Returns `None` if the handle does not refer to a live node.
    pub fn release(&mut self, handle: NodeHandle) -> Option<CacheKey> {
        let idx = handle.0;
        self.node(idx)?;

        self.unlink(idx);
        let node = self.nodes[idx].take()?;
        self.free_list.push(idx);
        self.len -= 1;
        Some(node.key)
    }

    /// Number of linked nodes
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the order is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drop every node
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free_list.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    /// Keys from most to least recently used
    pub fn iter(&self) -> impl Iterator<Item = CacheKey> + '_ {
        let mut cursor = self.head;
        std::iter::from_fn(move || {
            let node = self.node(cursor?)?;
            cursor = node.next;
            Some(node.key)
        })
    }

    fn node(&self, idx: usize) -> Option<&Node> {
        self.nodes.get(idx).and_then(Option::as_ref)
    }

    fn link_front(&mut self, idx: usize) {
        let old_head = self.head;

        if let Some(node) = &mut self.nodes[idx] {
            node.prev = None;
            node.next = old_head;
        }

        if let Some(head_idx) = old_head {
            if let Some(head) = &mut self.nodes[head_idx] {
                head.prev = Some(idx);
            }
        }

        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = if let Some(node) = &mut self.nodes[idx] {
            let links = (node.prev, node.next);
            node.prev = None;
            node.next = None;
            links
        } else {
            return;
        };

        match prev {
            Some(prev_idx) => {
                if let Some(prev_node) = &mut self.nodes[prev_idx] {
                    prev_node.next = next;
                }
            }
            None => {
                self.head = next;
            }
        }

        match next {
            Some(next_idx) => {
                if let Some(next_node) = &mut self.nodes[next_idx] {
                    next_node.prev = prev;
                }
            }
            None => {
                self.tail = prev;
            }
        }
    }

    fn alloc_node(&mut self) -> usize {
        if let Some(idx) = self.free_list.pop() {
            idx
        } else {
            let idx = self.nodes.len();
            self.nodes.push(None);
            idx
        }
    }
}
