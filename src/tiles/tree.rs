//! The tile quadtree
//!
//! Nodes live in a generational arena. Parents own their children through
//! handles and children point back to their parent with a plain handle, so a
//! pruned subtree is gone the moment its slots are released: any completion
//! that still refers to it fails the generation check and is dropped.
//!
//! Target level and viewport are always passed in; the tree keeps no view
//! state of its own.

use super::dispatch::{FetchCompletion, FetchScheduler};
use super::key::QuadKey;
use super::node::{NodeId, NodeStatus, TileNode};
use crate::core::bounds::{Boundary, Quadrant};
use serde::{Deserialize, Serialize};

/// What the coordinator has to do after a completion was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionEffect {
    /// Stale or detached; nothing changed
    Ignored,
    /// Node state changed but nothing needs recomputing
    Settled,
    /// A root received its image; the drawable list is out of date
    RefreshDrawList,
    /// A parent reached `ChildrenLoaded`; run a full adjustment
    AdjustTree,
}

/// Snapshot counters for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeStats {
    pub nodes: usize,
    pub loading: usize,
    pub loaded: usize,
    pub max_level: u8,
}

struct Slot {
    generation: u32,
    node: Option<TileNode>,
}

pub struct TileTree {
    slots: Vec<Slot>,
    free_list: Vec<u32>,
    roots: [NodeId; 4],
}

impl TileTree {
    /// Builds the four level-1 roots covering `[-half, +half]` on both axes.
    ///
    /// No fetch is started; see [`TileTree::start_root_fetches`].
    pub fn new(half_extent: f64) -> Self {
        let mut tree = Self {
            slots: Vec::with_capacity(64),
            free_list: Vec::new(),
            roots: [NodeId::new(0, 0); 4],
        };
        let bounds = Boundary::root_quadrants(half_extent);
        let roots = Quadrant::ALL
            .map(|q| tree.insert(TileNode::new(None, QuadKey::root(q), bounds[q as usize])));
        tree.roots = roots;
        tree
    }

    pub fn roots(&self) -> [NodeId; 4] {
        self.roots
    }

    pub fn start_root_fetches(&mut self, scheduler: &dyn FetchScheduler) {
        for root in self.roots {
            self.start_fetch(root, scheduler);
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&TileNode> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_ref())
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut TileNode> {
        self.slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_mut())
    }

    /// Whether `id` still refers to a node reachable from a root.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn children_of(&self, id: NodeId) -> Option<[NodeId; 4]> {
        self.get(id).and_then(TileNode::children)
    }

    /// Walks down from the matching root following the key's digits.
    pub fn find(&self, key: &QuadKey) -> Option<NodeId> {
        let mut digits = key.as_str().chars().filter_map(Quadrant::from_digit);
        let mut current = self.roots[digits.next()? as usize];
        for quadrant in digits {
            current = self.children_of(current)?[quadrant as usize];
        }
        Some(current)
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&mut self, node: TileNode) -> NodeId {
        match self.free_list.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.node = Some(node);
                NodeId::new(index, slot.generation)
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                NodeId::new(index, 0)
            }
        }
    }

    /// Releases `id` and everything below it. Old handles stop resolving.
    fn remove_subtree(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(slot) = self
                .slots
                .get_mut(current.index())
                .filter(|slot| slot.generation == current.generation())
            else {
                continue;
            };
            if let Some(node) = slot.node.take() {
                stack.extend(node.children.into_iter().flatten());
                slot.generation = slot.generation.wrapping_add(1);
                self.free_list.push(current.index() as u32);
            }
        }
    }

    /// `None -> LoadingImage` and hand the fetch to the scheduler.
    pub fn start_fetch(&mut self, id: NodeId, scheduler: &dyn FetchScheduler) {
        let Some(node) = self.get_mut(id) else {
            return;
        };
        if node.status != NodeStatus::None {
            return;
        }
        let handle = scheduler.start_fetch(id, &node.key);
        node.pending = Some(handle);
        node.set_status(NodeStatus::LoadingImage);
    }

    /// Expand pass over every root.
    pub fn expand_all(&mut self, level: u8, view: &Boundary, scheduler: &dyn FetchScheduler) {
        for root in self.roots {
            self.expand(root, level, view, scheduler);
        }
    }

    /// Grows detail below `id` toward `level` inside `view`.
    pub fn expand(&mut self, id: NodeId, level: u8, view: &Boundary, scheduler: &dyn FetchScheduler) {
        let Some(node) = self.get(id) else {
            return;
        };
        let visible = node.boundary.intersects(view);
        let wanted = visible && node.level < level;
        let is_root = node.is_root();
        let children = node.children;

        let status = node.status;
        match status {
            // A root that never got its image is retried whenever it is on screen.
            NodeStatus::None if is_root && visible => self.start_fetch(id, scheduler),
            NodeStatus::ImageLoaded if wanted => self.subdivide(id, scheduler),
            NodeStatus::LoadingChildren if wanted => {
                for child in children.into_iter().flatten() {
                    self.start_fetch(child, scheduler);
                }
            }
            NodeStatus::ChildrenLoaded if wanted => {
                for child in children.into_iter().flatten() {
                    self.expand(child, level, view, scheduler);
                }
            }
            _ => {}
        }
    }

    fn subdivide(&mut self, id: NodeId, scheduler: &dyn FetchScheduler) {
        let Some(node) = self.get(id) else {
            return;
        };
        let key = node.key.clone();
        let boundary = node.boundary;

        let children = Quadrant::ALL
            .map(|q| self.insert(TileNode::new(Some(id), key.child(q), boundary.quadrant(q))));

        if let Some(node) = self.get_mut(id) {
            node.children = Some(children);
            node.set_status(NodeStatus::LoadingChildren);
        }
        log::debug!("subdivided tile {}", key);

        for child in children {
            self.start_fetch(child, scheduler);
        }
    }

    /// Collapse pass over every root.
    pub fn collapse_all(&mut self, level: u8, view: &Boundary) {
        for root in self.roots {
            self.collapse(root, level, view);
        }
    }

    /// Prunes detail below `id` that is off screen or deeper than `level`.
    pub fn collapse(&mut self, id: NodeId, level: u8, view: &Boundary) {
        let Some(node) = self.get(id) else {
            return;
        };
        let children = node.children;
        if !node.boundary.intersects(view) || node.level == level {
            self.prune(id);
        } else if let Some(children) = children {
            for child in children {
                self.collapse(child, level, view);
            }
        }
    }

    /// Drops the children of `id` and makes it a leaf again.
    ///
    /// Only a node holding an image can have children, so image-less nodes
    /// keep their status and their in-flight fetch.
    fn prune(&mut self, id: NodeId) {
        let Some(node) = self.get_mut(id) else {
            return;
        };
        if node.image.is_none() {
            return;
        }
        let children = node.children.take();
        if node.status != NodeStatus::ImageLoaded {
            node.set_status(NodeStatus::ImageLoaded);
        }

        if let Some(children) = children {
            log::debug!("collapsing children of tile {}", node.key);
            for child in children {
                self.abort(child);
                self.remove_subtree(child);
            }
        }
    }

    /// Cancels every fetch still in flight in the subtree rooted at `id`.
    ///
    /// The handle stays on the node so the cancelled completion can still be
    /// matched and demote the node to `None` if it is alive by then.
    pub fn abort(&mut self, id: NodeId) {
        let Some(node) = self.get(id) else {
            return;
        };
        if node.status == NodeStatus::LoadingImage {
            if let Some(handle) = &node.pending {
                handle.cancel();
            }
        }
        let children = node.children;
        for child in children.into_iter().flatten() {
            self.abort(child);
        }
    }

    /// Displayable leaves under every root that intersect `view`, in tree order.
    pub fn drawable_nodes(&self, view: &Boundary) -> Vec<NodeId> {
        let mut leaves = Vec::new();
        for root in self.roots {
            self.collect_leaves(root, &mut leaves);
        }
        leaves.retain(|id| self.get(*id).is_some_and(|node| node.is_visible(view)));
        leaves
    }

    /// Pushes the displayable leaves under `id` onto `out`.
    pub fn collect_leaves(&self, id: NodeId, out: &mut Vec<NodeId>) {
        let Some(node) = self.get(id) else {
            return;
        };
        if node.status.is_displayable() {
            out.push(id);
        } else if let Some(children) = node.children {
            for child in children {
                self.collect_leaves(child, out);
            }
        }
    }

    /// Applies one fetch result.
    ///
    /// Detached nodes, superseded tickets and nodes no longer waiting on an
    /// image are left untouched.
    pub fn complete(&mut self, completion: FetchCompletion) -> CompletionEffect {
        let FetchCompletion {
            node: id,
            ticket,
            key,
            outcome,
        } = completion;

        let Some(node) = self.get_mut(id) else {
            log::trace!("dropping completion for detached tile {}", key);
            return CompletionEffect::Ignored;
        };
        if node.status != NodeStatus::LoadingImage || node.pending_ticket() != Some(ticket) {
            log::trace!("dropping stale completion #{} for tile {}", ticket, key);
            return CompletionEffect::Ignored;
        }
        node.pending = None;

        match outcome {
            Ok(image) => {
                node.image = Some(image);
                node.set_status(NodeStatus::ImageLoaded);
                let parent = node.parent;
                match parent {
                    None => CompletionEffect::RefreshDrawList,
                    Some(parent) => self.child_loaded(parent),
                }
            }
            Err(e) => {
                node.set_status(NodeStatus::None);
                if e.is_cancelled() {
                    log::debug!("fetch for tile {} cancelled", key);
                } else {
                    log::warn!("fetch for tile {} failed: {}", key, e);
                }
                CompletionEffect::Settled
            }
        }
    }

    /// Promotes `parent` once all four children hold an image.
    fn child_loaded(&mut self, parent: NodeId) -> CompletionEffect {
        let Some(node) = self.get(parent) else {
            return CompletionEffect::Settled;
        };
        if node.status != NodeStatus::LoadingChildren {
            return CompletionEffect::Settled;
        }
        let Some(children) = node.children else {
            return CompletionEffect::Settled;
        };
        let all_loaded = children
            .iter()
            .all(|child| self.get(*child).is_some_and(|c| c.image.is_some()));
        if !all_loaded {
            return CompletionEffect::Settled;
        }

        if let Some(node) = self.get_mut(parent) {
            node.set_status(NodeStatus::ChildrenLoaded);
            log::debug!("all children of tile {} loaded", node.key);
        }
        CompletionEffect::AdjustTree
    }

    pub fn stats(&self) -> TreeStats {
        self.slots
            .iter()
            .filter_map(|slot| slot.node.as_ref())
            .fold(TreeStats::default(), |mut stats, node| {
                stats.nodes += 1;
                if node.status == NodeStatus::LoadingImage {
                    stats.loading += 1;
                }
                if node.image.is_some() {
                    stats.loaded += 1;
                }
                stats.max_level = stats.max_level.max(node.level);
                stats
            })
    }
}

impl std::fmt::Debug for TileTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileTree")
            .field("roots", &self.roots)
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiles::dispatch::FetchHandle;
    use crate::tiles::fetcher::{FetchError, TileImage};
    use futures::future::AbortHandle;
    use std::cell::{Cell, RefCell};

    const HALF: f64 = 1024.0;

    /// Hands out tickets and remembers every fetch request.
    #[derive(Default)]
    struct RecordingScheduler {
        next_ticket: Cell<u64>,
        started: RefCell<Vec<(NodeId, QuadKey, FetchHandle)>>,
    }

    impl RecordingScheduler {
        fn keys(&self) -> Vec<String> {
            self.started
                .borrow()
                .iter()
                .map(|(_, key, _)| key.to_string())
                .collect()
        }

        fn take(&self) -> Vec<(NodeId, QuadKey, FetchHandle)> {
            self.started.borrow_mut().drain(..).collect()
        }
    }

    impl FetchScheduler for RecordingScheduler {
        fn start_fetch(&self, node: NodeId, key: &QuadKey) -> FetchHandle {
            let ticket = self.next_ticket.get() + 1;
            self.next_ticket.set(ticket);
            let (abort, _registration) = AbortHandle::new_pair();
            let handle = FetchHandle::new(ticket, abort);
            self.started
                .borrow_mut()
                .push((node, key.clone(), handle.clone()));
            handle
        }
    }

    fn succeed(tree: &mut TileTree, (node, key, handle): (NodeId, QuadKey, FetchHandle)) -> CompletionEffect {
        tree.complete(FetchCompletion {
            node,
            ticket: handle.ticket(),
            key,
            outcome: Ok(TileImage::solid(1, [0; 4])),
        })
    }

    fn fail(tree: &mut TileTree, (node, key, handle): (NodeId, QuadKey, FetchHandle), error: FetchError) -> CompletionEffect {
        tree.complete(FetchCompletion {
            node,
            ticket: handle.ticket(),
            key,
            outcome: Err(error),
        })
    }

    fn whole_world() -> Boundary {
        Boundary::new(HALF, -HALF, -HALF, HALF)
    }

    /// Tree with all four roots loaded.
    fn loaded_tree(scheduler: &RecordingScheduler) -> TileTree {
        let mut tree = TileTree::new(HALF);
        tree.start_root_fetches(scheduler);
        for fetch in scheduler.take() {
            assert_eq!(succeed(&mut tree, fetch), CompletionEffect::RefreshDrawList);
        }
        tree
    }

    fn status(tree: &TileTree, key: &str) -> NodeStatus {
        let id = tree.find(&QuadKey::parse(key).unwrap()).unwrap();
        tree.get(id).unwrap().status()
    }

    fn assert_zero_or_four_children(tree: &TileTree) {
        let mut stack: Vec<NodeId> = tree.roots().to_vec();
        while let Some(id) = stack.pop() {
            let node = tree.get(id).unwrap();
            if let Some(children) = node.children() {
                assert!(node.image().is_some());
                for child in children {
                    assert_eq!(tree.get(child).unwrap().parent(), Some(id));
                    stack.push(child);
                }
            }
        }
    }

    #[test]
    fn test_roots_cover_world() {
        let scheduler = RecordingScheduler::default();
        let mut tree = TileTree::new(HALF);
        assert_eq!(tree.len(), 4);

        tree.start_root_fetches(&scheduler);
        assert_eq!(scheduler.keys(), vec!["0", "1", "2", "3"]);

        let union = tree
            .roots()
            .iter()
            .map(|id| *tree.get(*id).unwrap().boundary())
            .reduce(|a, b| a.union(&b))
            .unwrap();
        assert_eq!(union, whole_world());
        for root in tree.roots() {
            assert_eq!(tree.get(root).unwrap().status(), NodeStatus::LoadingImage);
        }
    }

    #[test]
    fn test_expand_waits_for_image() {
        let scheduler = RecordingScheduler::default();
        let mut tree = TileTree::new(HALF);
        tree.start_root_fetches(&scheduler);
        scheduler.take();

        tree.expand_all(5, &whole_world(), &scheduler);
        assert!(scheduler.keys().is_empty());
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn test_expand_subdivides_into_partition() {
        let scheduler = RecordingScheduler::default();
        let mut tree = loaded_tree(&scheduler);
        let root = tree.roots()[0];

        tree.expand_all(2, &whole_world(), &scheduler);
        assert_eq!(tree.len(), 20);
        assert_eq!(tree.get(root).unwrap().status(), NodeStatus::LoadingChildren);

        let parent = *tree.get(root).unwrap().boundary();
        let children = tree.children_of(root).unwrap();
        let bounds: Vec<Boundary> = children.iter().map(|c| *tree.get(*c).unwrap().boundary()).collect();
        assert_eq!(bounds, parent.split().to_vec());

        let keys: Vec<String> = children.iter().map(|c| tree.get(*c).unwrap().key().to_string()).collect();
        assert_eq!(keys, vec!["00", "01", "02", "03"]);
        for child in children {
            let node = tree.get(child).unwrap();
            assert_eq!(node.level(), 2);
            assert_eq!(node.status(), NodeStatus::LoadingImage);
        }
        assert_zero_or_four_children(&tree);
    }

    #[test]
    fn test_expand_respects_level_and_view() {
        let scheduler = RecordingScheduler::default();
        let mut tree = loaded_tree(&scheduler);

        tree.expand_all(1, &whole_world(), &scheduler);
        assert_eq!(tree.len(), 4);

        // Only the north-east quadrant is on screen.
        let view = Boundary::new(HALF, HALF / 2.0, HALF / 2.0, HALF);
        tree.expand_all(3, &view, &scheduler);
        assert_eq!(tree.len(), 8);
        assert_eq!(status(&tree, "1"), NodeStatus::LoadingChildren);
        assert_eq!(status(&tree, "0"), NodeStatus::ImageLoaded);
    }

    #[test]
    fn test_all_children_loaded_promotes_parent() {
        let scheduler = RecordingScheduler::default();
        let mut tree = loaded_tree(&scheduler);
        let view = Boundary::new(HALF, HALF / 2.0, HALF / 2.0, HALF);
        tree.expand_all(2, &view, &scheduler);

        let mut fetches = scheduler.take();
        let last = fetches.pop().unwrap();
        for fetch in fetches {
            assert_eq!(succeed(&mut tree, fetch), CompletionEffect::Settled);
        }
        assert_eq!(status(&tree, "1"), NodeStatus::LoadingChildren);

        assert_eq!(succeed(&mut tree, last), CompletionEffect::AdjustTree);
        assert_eq!(status(&tree, "1"), NodeStatus::ChildrenLoaded);
    }

    #[test]
    fn test_failed_child_blocks_promotion_until_retried() {
        let scheduler = RecordingScheduler::default();
        let mut tree = loaded_tree(&scheduler);
        let view = Boundary::new(HALF, HALF / 2.0, HALF / 2.0, HALF);
        tree.expand_all(2, &view, &scheduler);

        let mut fetches = scheduler.take();
        let failing = fetches.remove(3);
        for fetch in fetches {
            succeed(&mut tree, fetch);
        }
        let effect = fail(&mut tree, failing, FetchError::Unavailable("13".into()));
        assert_eq!(effect, CompletionEffect::Settled);
        assert_eq!(status(&tree, "13"), NodeStatus::None);
        assert_eq!(status(&tree, "1"), NodeStatus::LoadingChildren);

        // Revisiting the parent retries only the failed child.
        tree.expand_all(2, &view, &scheduler);
        assert_eq!(scheduler.keys(), vec!["13"]);
        let retry = scheduler.take().pop().unwrap();
        assert_eq!(succeed(&mut tree, retry), CompletionEffect::AdjustTree);
        assert_eq!(status(&tree, "1"), NodeStatus::ChildrenLoaded);
    }

    #[test]
    fn test_children_loaded_recurses() {
        let scheduler = RecordingScheduler::default();
        let mut tree = loaded_tree(&scheduler);
        let view = Boundary::new(HALF, HALF / 2.0, HALF / 2.0, HALF);
        tree.expand_all(3, &view, &scheduler);
        for fetch in scheduler.take() {
            succeed(&mut tree, fetch);
        }

        tree.expand_all(3, &view, &scheduler);
        // Only the branch under root 1 grows.
        assert!(!scheduler.keys().is_empty());
        assert!(scheduler.keys().iter().all(|k| k.len() == 3 && k.starts_with('1')));
        assert_eq!(tree.stats().max_level, 3);
        assert_zero_or_four_children(&tree);
    }

    #[test]
    fn test_collapse_at_target_level_aborts_subtree() {
        let scheduler = RecordingScheduler::default();
        let mut tree = loaded_tree(&scheduler);
        tree.expand_all(2, &whole_world(), &scheduler);
        let fetches = scheduler.take();
        let root = tree.roots()[0];
        let children = tree.children_of(root).unwrap();

        tree.collapse_all(1, &whole_world());

        assert_eq!(tree.len(), 4);
        assert_eq!(tree.get(root).unwrap().status(), NodeStatus::ImageLoaded);
        assert!(tree.children_of(root).is_none());
        for child in children {
            assert!(!tree.is_alive(child));
        }
        for (_, _, handle) in &fetches {
            assert!(handle.is_cancelled());
        }
    }

    #[test]
    fn test_collapse_prunes_offscreen_branches() {
        let scheduler = RecordingScheduler::default();
        let mut tree = loaded_tree(&scheduler);
        tree.expand_all(2, &whole_world(), &scheduler);
        for fetch in scheduler.take() {
            succeed(&mut tree, fetch);
        }
        assert_eq!(status(&tree, "2"), NodeStatus::ChildrenLoaded);

        let north_east = Boundary::new(HALF, 1.0, 1.0, HALF);
        tree.collapse_all(2, &north_east);
        assert_eq!(status(&tree, "2"), NodeStatus::ImageLoaded);
        assert!(tree.children_of(tree.roots()[2]).is_none());
        assert_eq!(status(&tree, "1"), NodeStatus::ChildrenLoaded);
        assert_zero_or_four_children(&tree);
    }

    #[test]
    fn test_collapse_keeps_imageless_fetch() {
        let scheduler = RecordingScheduler::default();
        let mut tree = TileTree::new(HALF);
        tree.start_root_fetches(&scheduler);
        let fetches = scheduler.take();

        tree.collapse_all(1, &whole_world());
        for root in tree.roots() {
            assert_eq!(tree.get(root).unwrap().status(), NodeStatus::LoadingImage);
        }
        assert!(fetches.iter().all(|(_, _, handle)| !handle.is_cancelled()));
    }

    #[test]
    fn test_late_completion_on_pruned_node_is_ignored() {
        let scheduler = RecordingScheduler::default();
        let mut tree = loaded_tree(&scheduler);
        tree.expand_all(2, &whole_world(), &scheduler);
        let fetches = scheduler.take();
        tree.collapse_all(1, &whole_world());

        // Slot reuse must not let the old handle resurrect anything.
        tree.expand_all(2, &whole_world(), &scheduler);
        let before = tree.stats();
        for fetch in fetches {
            assert_eq!(succeed(&mut tree, fetch), CompletionEffect::Ignored);
        }
        assert_eq!(tree.stats(), before);
    }

    #[test]
    fn test_cancelled_fetch_returns_to_none_and_refetches() {
        let scheduler = RecordingScheduler::default();
        let mut tree = TileTree::new(HALF);
        tree.start_root_fetches(&scheduler);
        let mut fetches = scheduler.take();
        let (root, key, handle) = fetches.remove(0);

        tree.abort(root);
        assert!(handle.is_cancelled());
        let effect = fail(&mut tree, (root, key, handle), FetchError::Cancelled);
        assert_eq!(effect, CompletionEffect::Settled);
        assert_eq!(tree.get(root).unwrap().status(), NodeStatus::None);

        tree.expand_all(1, &whole_world(), &scheduler);
        assert_eq!(scheduler.keys(), vec!["0"]);
        assert_eq!(tree.get(root).unwrap().status(), NodeStatus::LoadingImage);
    }

    #[test]
    fn test_superseded_ticket_is_ignored() {
        let scheduler = RecordingScheduler::default();
        let mut tree = TileTree::new(HALF);
        tree.start_root_fetches(&scheduler);
        let (root, key, handle) = scheduler.take().remove(0);

        let stale = FetchCompletion {
            node: root,
            ticket: handle.ticket() + 100,
            key,
            outcome: Ok(TileImage::solid(1, [0; 4])),
        };
        assert_eq!(tree.complete(stale), CompletionEffect::Ignored);
        assert_eq!(tree.get(root).unwrap().status(), NodeStatus::LoadingImage);
    }

    #[test]
    fn test_drawable_nodes_use_parent_as_placeholder() {
        let scheduler = RecordingScheduler::default();
        let mut tree = loaded_tree(&scheduler);
        assert_eq!(tree.drawable_nodes(&whole_world()).len(), 4);

        tree.expand_all(2, &whole_world(), &scheduler);
        // Parents are LoadingChildren and still drawn.
        assert_eq!(tree.drawable_nodes(&whole_world()).len(), 4);

        for fetch in scheduler.take() {
            succeed(&mut tree, fetch);
        }
        let drawable = tree.drawable_nodes(&whole_world());
        assert_eq!(drawable.len(), 16);
        assert!(drawable.iter().all(|id| tree.get(*id).unwrap().level() == 2));

        let south_west = Boundary::new(-1.0, -HALF, -HALF, -1.0);
        let visible = tree.drawable_nodes(&south_west);
        assert_eq!(visible.len(), 4);
        assert!(visible
            .iter()
            .all(|id| tree.get(*id).unwrap().key().as_str().starts_with('2')));
    }

    #[test]
    fn test_drawable_list_is_stable_between_passes() {
        let scheduler = RecordingScheduler::default();
        let mut tree = loaded_tree(&scheduler);
        let view = Boundary::new(300.0, -200.0, -300.0, 200.0);

        let pass = |tree: &mut TileTree| {
            tree.collapse_all(3, &view);
            let drawable = tree.drawable_nodes(&view);
            tree.expand_all(3, &view, &scheduler);
            drawable
        };
        let first = pass(&mut tree);
        let second = pass(&mut tree);
        assert_eq!(first, second);
    }

    #[test]
    fn test_find_follows_digits() {
        let scheduler = RecordingScheduler::default();
        let mut tree = loaded_tree(&scheduler);
        tree.expand_all(2, &whole_world(), &scheduler);

        let id = tree.find(&QuadKey::parse("31").unwrap()).unwrap();
        assert_eq!(tree.get(id).unwrap().key().as_str(), "31");
        assert!(tree.find(&QuadKey::parse("310").unwrap()).is_none());
    }
}
