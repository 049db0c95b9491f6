//! Tile node records and their load-status machine

use super::dispatch::FetchHandle;
use super::fetcher::TileImage;
use super::key::QuadKey;
use crate::core::bounds::Boundary;
use serde::{Deserialize, Serialize};

/// Generational handle of a node inside a [`TileTree`](super::tree::TileTree).
///
/// A handle stays valid only while the node is attached; once its subtree is
/// pruned the slot's generation moves on and every lookup through the old
/// handle misses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub(crate) fn index(self) -> usize {
        self.index as usize
    }

    pub(crate) fn generation(self) -> u32 {
        self.generation
    }
}

/// Load status of a node, in increasing order of readiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NodeStatus {
    /// No image, no children, no pending fetch
    None,
    /// A fetch for the node's own image is in flight
    LoadingImage,
    /// Image present, no children
    ImageLoaded,
    /// Image present, four children whose fetches are in progress
    LoadingChildren,
    /// All four children hold an image
    ChildrenLoaded,
}

impl NodeStatus {
    /// Whether `self -> next` is one of the edges of the status machine.
    ///
    /// Any status may be demoted to `ImageLoaded`; that is how a collapse
    /// turns a subdivided node back into a leaf.
    pub fn can_transition_to(self, next: NodeStatus) -> bool {
        use NodeStatus::*;
        matches!(
            (self, next),
            (None, LoadingImage)
                | (LoadingImage, ImageLoaded)
                | (LoadingImage, None)
                | (ImageLoaded, LoadingChildren)
                | (LoadingChildren, ChildrenLoaded)
                | (_, ImageLoaded)
        )
    }

    /// Statuses whose own image is painted.
    pub fn is_displayable(self) -> bool {
        matches!(self, NodeStatus::ImageLoaded | NodeStatus::LoadingChildren)
    }
}

pub struct TileNode {
    pub(crate) level: u8,
    pub(crate) key: QuadKey,
    pub(crate) boundary: Boundary,
    pub(crate) status: NodeStatus,
    /// Exactly zero or four children.
    pub(crate) children: Option<[NodeId; 4]>,
    /// Back-reference used only to report completion upward.
    pub(crate) parent: Option<NodeId>,
    pub(crate) image: Option<TileImage>,
    pub(crate) pending: Option<FetchHandle>,
}

impl TileNode {
    pub(crate) fn new(parent: Option<NodeId>, key: QuadKey, boundary: Boundary) -> Self {
        Self {
            level: key.level(),
            key,
            boundary,
            status: NodeStatus::None,
            children: None,
            parent,
            image: None,
            pending: None,
        }
    }

    pub(crate) fn set_status(&mut self, next: NodeStatus) {
        debug_assert!(
            self.status.can_transition_to(next),
            "illegal status transition {:?} -> {:?} on tile {}",
            self.status,
            next,
            self.key
        );
        log::trace!("tile {}: {:?} -> {:?}", self.key, self.status, next);
        self.status = next;
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn key(&self) -> &QuadKey {
        &self.key
    }

    pub fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    pub fn status(&self) -> NodeStatus {
        self.status
    }

    pub fn children(&self) -> Option<[NodeId; 4]> {
        self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn image(&self) -> Option<&TileImage> {
        self.image.as_ref()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_visible(&self, view: &Boundary) -> bool {
        self.boundary.intersects(view)
    }

    /// Ticket of the fetch this node is waiting on, if any.
    pub fn pending_ticket(&self) -> Option<u64> {
        self.pending.as_ref().map(FetchHandle::ticket)
    }
}

impl std::fmt::Debug for TileNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileNode")
            .field("key", &self.key)
            .field("status", &self.status)
            .field("boundary", &self.boundary)
            .field("children", &self.children.is_some())
            .field("has_image", &self.image.is_some())
            .finish_non_exhaustive()
    }
}
