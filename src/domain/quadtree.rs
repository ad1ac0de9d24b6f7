//! Adaptive quadtree over entity bounding boxes.
//!
//! Nodes live in an arena and refer to each other by [`NodeId`]. A node is either a leaf or owns
//! exactly four children covering the quadrants of its region, split at the region's center.
//! Entities that straddle a split line stay at the internal node; entities that are not strictly
//! inside the root region are kept in a separate outside list.
//!
//! Queries are conservative: a node whose region intersects the query region reports all of its
//! occupants without testing them individually. Callers that need exact answers (the sensors)
//! re-check geometry themselves. Keep it that way, a per-entity test here only duplicates work.

use std::mem;

use tracing::{debug, trace};

use super::{Aabb, DebugRenderer, DrawLayer, EntityId, Rect};

pub const MAX_OCCUPANTS: usize = 3;
pub const MAX_DEPTH: usize = 5;
pub const MIN_OCCUPANTS: usize = 1;

const ROOT: NodeId = NodeId(0);

/// What the tree needs to know about the entities it indexes.
pub trait Occupants {
    fn aabb(&self, id: EntityId) -> Option<&Aabb>;

    fn moved(&self, id: EntityId) -> bool;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuadTreeConfig {
    /// A leaf holding more occupants than this subdivides.
    pub max_occupants: usize,
    /// Nodes at this depth never subdivide.
    pub max_depth: usize,
    /// An internal node whose subtree holds fewer occupants than this consolidates.
    pub min_occupants: usize,
}

impl QuadTreeConfig {
    pub const fn new(max_occupants: usize, max_depth: usize, min_occupants: usize) -> Self {
        Self {
            max_occupants,
            max_depth,
            min_occupants,
        }
    }
}

impl Default for QuadTreeConfig {
    fn default() -> Self {
        Self::new(MAX_OCCUPANTS, MAX_DEPTH, MIN_OCCUPANTS)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NodeId(usize);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Quadrant {
    BottomLeft = 0,
    BottomRight = 1,
    TopLeft = 2,
    TopRight = 3,
}

impl Quadrant {
    /// Quadrant of `region` that `rect` lies in entirely, or `None` if it straddles a split line.
    fn of(region: &Aabb, rect: &Rect) -> Option<Quadrant> {
        let center = region.center();
        let left = rect.right < center.x();
        let right = rect.left > center.x();
        let bottom = rect.top < center.y();
        let top = rect.bottom > center.y();
        match (left, right, bottom, top) {
            (true, _, true, _) => Some(Quadrant::BottomLeft),
            (_, true, true, _) => Some(Quadrant::BottomRight),
            (true, _, _, true) => Some(Quadrant::TopLeft),
            (_, true, _, true) => Some(Quadrant::TopRight),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
struct Node {
    region: Aabb,
    parent: Option<NodeId>,
    children: Option<[NodeId; 4]>,
    occupants: Vec<EntityId>,
}

impl Node {
    fn new(region: Aabb, parent: Option<NodeId>) -> Self {
        Self {
            region,
            parent,
            children: None,
            occupants: vec![],
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct QuadTreeStats {
    pub node_count: usize,
    pub leaf_count: usize,
    pub max_depth: usize,
    pub occupant_count: usize,
    pub outside_count: usize,
}

#[derive(Clone, Debug)]
pub struct QuadTree {
    nodes: Vec<Node>,
    released: Vec<NodeId>,
    outside: Vec<EntityId>,
    config: QuadTreeConfig,
}

impl QuadTree {
    /// Tree covering `width` x `height` with its lower-left corner at the origin. The region is
    /// fixed for the lifetime of the tree.
    pub fn new(width: f64, height: f64) -> Self {
        Self::with_config(width, height, QuadTreeConfig::default())
    }

    pub fn with_config(width: f64, height: f64, config: QuadTreeConfig) -> Self {
        Self {
            nodes: vec![Node::new(Aabb::new(width, height), None)],
            released: vec![],
            outside: vec![],
            config,
        }
    }

    pub fn config(&self) -> &QuadTreeConfig {
        &self.config
    }

    pub fn region(&self) -> &Aabb {
        &self.nodes[ROOT.0].region
    }

    pub fn root(&self) -> NodeId {
        ROOT
    }

    /// Entities not strictly inside the tree's region.
    pub fn outside(&self) -> &[EntityId] {
        &self.outside
    }

    pub fn node_region(&self, node: NodeId) -> &Aabb {
        &self.nodes[node.0].region
    }

    pub fn node_occupants(&self, node: NodeId) -> &[EntityId] {
        &self.nodes[node.0].occupants
    }

    pub fn children(&self, node: NodeId) -> Option<[NodeId; 4]> {
        self.nodes[node.0].children
    }

    /// Number of parent hops between `node` and the root.
    pub fn depth(&self, node: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.nodes[node.0].parent;
        while let Some(parent) = current {
            depth += 1;
            current = self.nodes[parent.0].parent;
        }
        depth
    }

    pub fn add_entity<S: Occupants + ?Sized>(&mut self, store: &S, id: EntityId) {
        let Some(aabb) = store.aabb(id) else {
            debug!(%id, "ignoring entity without bounds");
            return;
        };
        if self.region().contains(aabb.bounds()) {
            self.add_to_node(ROOT, store, id);
        } else {
            debug!(%id, "entity outside of tree region");
            self.outside.push(id);
        }
    }

    /// Every outside entity plus the occupants of every node whose region intersects `region`.
    /// The result may contain entities that do not intersect `region` themselves.
    pub fn query(&self, region: &Rect) -> Vec<EntityId> {
        let mut results = self.outside.clone();
        self.query_node(ROOT, region, &mut results);
        results
    }

    /// Reinserts every entity whose moved flag is set, starting from the root, so that entities
    /// may change branches or move between the tree and the outside list.
    pub fn update<S: Occupants + ?Sized>(&mut self, store: &S) {
        let (mut moved, remaining): (Vec<_>, Vec<_>) =
            self.outside.iter().copied().partition(|id| store.moved(*id));
        self.outside = remaining;
        self.update_node(ROOT, store, &mut moved);
        for id in moved {
            self.add_entity(store, id);
        }
    }

    /// All indexed entities, outside list first.
    pub fn entities(&self) -> Vec<EntityId> {
        let mut entities = self.outside.clone();
        self.visit(ROOT, &mut |node| {
            entities.extend_from_slice(&node.occupants);
        });
        entities
    }

    pub fn stats(&self) -> QuadTreeStats {
        let mut stats = QuadTreeStats {
            outside_count: self.outside.len(),
            ..QuadTreeStats::default()
        };
        let mut pending = vec![(ROOT, 0)];
        while let Some((id, depth)) = pending.pop() {
            let node = &self.nodes[id.0];
            stats.node_count += 1;
            stats.occupant_count += node.occupants.len();
            stats.max_depth = stats.max_depth.max(depth);
            match node.children {
                Some(children) => pending.extend(children.iter().map(|c| (*c, depth + 1))),
                None => stats.leaf_count += 1,
            }
        }
        stats
    }

    pub fn debug_draw(&self, renderer: &mut dyn DebugRenderer) {
        self.visit(ROOT, &mut |node| {
            node.region.debug_draw(&mut *renderer, DrawLayer::QuadTree);
        });
    }

    fn visit(&self, id: NodeId, f: &mut dyn FnMut(&Node)) {
        let node = &self.nodes[id.0];
        f(node);
        if let Some(children) = node.children {
            for child in children {
                self.visit(child, f);
            }
        }
    }

    fn add_to_node<S: Occupants + ?Sized>(&mut self, node: NodeId, store: &S, id: EntityId) {
        let Some(aabb) = store.aabb(id) else {
            return;
        };
        let current = &mut self.nodes[node.0];
        match current.children {
            Some(children) => {
                match Quadrant::of(&current.region, aabb.bounds()) {
                    Some(quadrant) => self.add_to_node(children[quadrant as usize], store, id),
                    None => current.occupants.push(id),
                }
                if self.total_occupants(node) < self.config.min_occupants {
                    self.consolidate(node);
                }
            }
            None => {
                current.occupants.push(id);
                if current.occupants.len() > self.config.max_occupants
                    && self.depth(node) < self.config.max_depth
                {
                    self.subdivide(node, store);
                }
            }
        }
    }

    fn subdivide<S: Occupants + ?Sized>(&mut self, node: NodeId, store: &S) {
        if self.nodes[node.0].children.is_some() {
            return;
        }
        let rect = *self.nodes[node.0].region.bounds();
        let (width, height) = (rect.width / 2.0, rect.height / 2.0);
        let children = [
            (rect.left, rect.bottom),
            (rect.left + width, rect.bottom),
            (rect.left, rect.bottom + height),
            (rect.left + width, rect.bottom + height),
        ]
        .map(|(left, bottom)| {
            self.allocate(Node::new(
                Aabb::from_bounds(left, bottom, width, height),
                Some(node),
            ))
        });
        trace!(node = node.0, depth = self.depth(node), "subdividing");

        let current = &mut self.nodes[node.0];
        current.children = Some(children);
        for id in mem::take(&mut current.occupants) {
            self.add_to_node(node, store, id);
        }
    }

    fn consolidate(&mut self, node: NodeId) {
        let Some(children) = self.nodes[node.0].children else {
            return;
        };
        trace!(node = node.0, "consolidating");
        let mut pulled = vec![];
        for child in children {
            self.consolidate(child);
            pulled.append(&mut self.nodes[child.0].occupants);
        }
        let current = &mut self.nodes[node.0];
        current.occupants.append(&mut pulled);
        current.children = None;
        self.released.extend(children);
    }

    fn allocate(&mut self, node: Node) -> NodeId {
        match self.released.pop() {
            Some(id) => {
                self.nodes[id.0] = node;
                id
            }
            None => {
                self.nodes.push(node);
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    fn total_occupants(&self, node: NodeId) -> usize {
        let mut total = 0;
        self.visit(node, &mut |n| total += n.occupants.len());
        total
    }

    fn query_node(&self, id: NodeId, region: &Rect, results: &mut Vec<EntityId>) {
        let node = &self.nodes[id.0];
        if !node.region.intersects(region) {
            return;
        }
        results.extend_from_slice(&node.occupants);
        if let Some(children) = node.children {
            for child in children {
                self.query_node(child, region, results);
            }
        }
    }

    fn update_node<S: Occupants + ?Sized>(
        &mut self,
        id: NodeId,
        store: &S,
        moved: &mut Vec<EntityId>,
    ) {
        let node = &mut self.nodes[id.0];
        let (left, stayed): (Vec<_>, Vec<_>) =
            node.occupants.iter().copied().partition(|occupant| store.moved(*occupant));
        node.occupants = stayed;
        moved.extend(left);
        if let Some(children) = node.children {
            for child in children {
                self.update_node(child, store, moved);
            }
            if self.total_occupants(id) < self.config.min_occupants {
                self.consolidate(id);
            }
        }
    }
}
