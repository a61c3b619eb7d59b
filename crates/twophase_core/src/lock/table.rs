//! Hash-keyed lock table.

use crate::error::{CoreError, CoreResult};
use crate::transaction::TransactionRecord;
use crate::types::{LockMode, ObjectNo, SegmentId, TransactionId};
use std::collections::{HashMap, VecDeque};

/// Key of a lock chain.
pub type LockKey = (SegmentId, ObjectNo);

/// Stable handle of a lock node inside the table's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle(usize);

impl NodeHandle {
    /// Returns the arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A granted lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockNode {
    /// Segment of the locked object.
    pub segment: SegmentId,
    /// Locked object.
    pub object: ObjectNo,
    /// Owning transaction.
    pub owner: TransactionId,
    /// Granted mode.
    pub mode: LockMode,
}

/// Mapping from `(segment, object)` to the chain of granted locks.
///
/// Every node is a member of two chains: the per-key chain kept here and
/// the owner's held set kept on its [`TransactionRecord`]. Both are updated
/// by the same call, so membership never diverges. Nodes live in an arena
/// and chains store [`NodeHandle`]s, never references.
///
/// The table does not enforce mode compatibility; that is the admission
/// algorithm's job.
#[derive(Debug, Default)]
pub struct LockTable {
    nodes: Vec<Option<LockNode>>,
    free: Vec<usize>,
    chains: HashMap<LockKey, VecDeque<NodeHandle>>,
}

impl LockTable {
    /// Creates an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the chain for a key, most recently granted first.
    pub fn find(&self, segment: SegmentId, object: ObjectNo) -> impl Iterator<Item = &LockNode> {
        self.chains
            .get(&(segment, object))
            .into_iter()
            .flatten()
            .filter_map(move |handle| self.node(*handle))
    }

    /// Resolves a handle.
    #[must_use]
    pub fn node(&self, handle: NodeHandle) -> Option<&LockNode> {
        self.nodes.get(handle.0).and_then(Option::as_ref)
    }

    /// Grants a lock to `owner`, prepending it to both chains.
    pub fn add(
        &mut self,
        owner: &mut TransactionRecord,
        segment: SegmentId,
        object: ObjectNo,
        mode: LockMode,
    ) -> NodeHandle {
        let node = LockNode {
            segment,
            object,
            owner: owner.id(),
            mode,
        };
        let handle = match self.free.pop() {
            Some(index) => {
                self.nodes[index] = Some(node);
                NodeHandle(index)
            }
            None => {
                self.nodes.push(Some(node));
                NodeHandle(self.nodes.len() - 1)
            }
        };
        self.chains
            .entry((segment, object))
            .or_default()
            .push_front(handle);
        owner.held_mut().push_front(handle);
        handle
    }

    /// Releases every lock `owner` holds on `object`, unlinking each node
    /// from both chains. Returns the number of nodes released.
    ///
    /// # Errors
    ///
    /// Returns `LockNotFound` if `owner` held nothing on `object`.
    pub fn remove(&mut self, owner: &mut TransactionRecord, object: ObjectNo) -> CoreResult<usize> {
        let tid = owner.id();
        let key = (owner.segment(), object);
        let Some(chain) = self.chains.get_mut(&key) else {
            return Err(CoreError::LockNotFound { tid, object });
        };

        let nodes = &self.nodes;
        let mut released = Vec::new();
        chain.retain(|handle| {
            let owned = nodes
                .get(handle.0)
                .and_then(Option::as_ref)
                .is_some_and(|node| node.owner == tid);
            if owned {
                released.push(*handle);
            }
            !owned
        });
        if chain.is_empty() {
            self.chains.remove(&key);
        }
        if released.is_empty() {
            return Err(CoreError::LockNotFound { tid, object });
        }

        owner.held_mut().retain(|handle| !released.contains(handle));
        for handle in &released {
            self.nodes[handle.0] = None;
            self.free.push(handle.0);
        }
        Ok(released.len())
    }

    /// Number of granted locks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Returns true if no lock is granted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of locks owned by `tid`.
    #[must_use]
    pub fn owned_by(&self, tid: TransactionId) -> usize {
        self.iter().filter(|(_, node)| node.owner == tid).count()
    }

    /// Iterates over every granted lock.
    pub fn iter(&self) -> impl Iterator<Item = (NodeHandle, &LockNode)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(index, node)| node.as_ref().map(|node| (NodeHandle(index), node)))
    }
}
