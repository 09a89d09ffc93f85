//! Pipe nodes and the nets they form.
//!
//! Every entity that takes part in piping carries a [`NodeContainer`] of
//! named [`Node`]s. Nodes list the nodes they connect to; adjacency is
//! treated as undirected. Each connected group of nodes is one [`PipeNet`]
//! sharing a single [`GasMixture`].
//!
//! Nets are derived state. They are never saved and are rebuilt from the
//! node graph by [`Simulation::rebuild_node_groups`](crate::simulation::Simulation::rebuild_node_groups).

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::components::{EntityId, GridId};
use crate::mixture::GasMixture;

/// Identifier of a pipe net.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PipeNetId(pub u32);

/// Address of a node: owning entity plus node name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeRef {
    /// Entity holding the node.
    pub owner: EntityId,
    /// Name of the node in the owner's container.
    pub name: String,
}

impl NodeRef {
    /// Create a node reference.
    #[must_use]
    pub fn new(owner: EntityId, name: impl Into<String>) -> Self {
        Self {
            owner,
            name: name.into(),
        }
    }
}

/// What a node is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    /// A pipe segment holding gas.
    Pipe {
        /// Volume in litres.
        volume: f32,
    },
    /// A joint that links nodes but holds no gas.
    Connector,
}

/// A node in an entity's container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Node type.
    pub kind: NodeKind,
    /// Nodes this one is linked to.
    #[serde(default)]
    pub connections: Vec<NodeRef>,
    /// Net the node belongs to. Assigned on rebuild.
    #[serde(skip)]
    pub net: Option<PipeNetId>,
}

impl Node {
    /// A pipe node of the given volume.
    #[must_use]
    pub fn pipe(volume: f32) -> Self {
        Self {
            kind: NodeKind::Pipe { volume },
            connections: Vec::new(),
            net: None,
        }
    }

    /// A connector node.
    #[must_use]
    pub fn connector() -> Self {
        Self {
            kind: NodeKind::Connector,
            connections: Vec::new(),
            net: None,
        }
    }

    /// Whether the node is a pipe.
    #[must_use]
    pub fn is_pipe(&self) -> bool {
        matches!(self.kind, NodeKind::Pipe { .. })
    }

    /// Gas volume contributed to a net.
    #[must_use]
    pub fn volume(&self) -> f32 {
        match self.kind {
            NodeKind::Pipe { volume } => volume,
            NodeKind::Connector => 0.0,
        }
    }
}

/// Named nodes on one entity.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeContainer {
    /// Nodes by name.
    pub nodes: BTreeMap<String, Node>,
}

impl NodeContainer {
    /// An empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add a node.
    #[must_use]
    pub fn with_node(mut self, name: impl Into<String>, node: Node) -> Self {
        self.nodes.insert(name.into(), node);
        self
    }

    /// Link one of our nodes to another node. Returns false if `name` is unknown.
    pub fn connect(&mut self, name: &str, to: NodeRef) -> bool {
        match self.nodes.get_mut(name) {
            Some(node) => {
                if !node.connections.contains(&to) {
                    node.connections.push(to);
                }
                true
            }
            None => false,
        }
    }

    /// Look up a node.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name)
    }

    /// Net of a named pipe node. `None` for unknown names, connectors and
    /// pipes that have not joined a net.
    #[must_use]
    pub fn pipe_net(&self, name: &str) -> Option<PipeNetId> {
        self.nodes
            .get(name)
            .filter(|node| node.is_pipe())
            .and_then(|node| node.net)
    }
}

/// One connected group of nodes sharing a mixture.
#[derive(Debug, Clone, PartialEq)]
pub struct PipeNet {
    /// Net identifier.
    pub id: PipeNetId,
    /// Grid the net is anchored to.
    pub grid: Option<GridId>,
    /// Member nodes in flood order.
    pub nodes: Vec<NodeRef>,
    /// Shared gas. Its volume is the sum of member pipe volumes.
    pub air: GasMixture,
}

/// All live pipe nets.
#[derive(Debug, Clone, Default)]
pub struct PipeNetStorage {
    nets: BTreeMap<PipeNetId, PipeNet>,
    next_id: u32,
}

impl PipeNetStorage {
    /// Empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a net and return its id.
    pub fn create(&mut self, grid: Option<GridId>, nodes: Vec<NodeRef>, air: GasMixture) -> PipeNetId {
        let id = PipeNetId(self.next_id);
        self.next_id += 1;
        self.nets.insert(
            id,
            PipeNet {
                id,
                grid,
                nodes,
                air,
            },
        );
        id
    }

    /// Remove a net.
    pub fn remove(&mut self, id: PipeNetId) -> Option<PipeNet> {
        self.nets.remove(&id)
    }

    /// Look up a net.
    #[must_use]
    pub fn get(&self, id: PipeNetId) -> Option<&PipeNet> {
        self.nets.get(&id)
    }

    /// Look up a net mutably.
    pub fn get_mut(&mut self, id: PipeNetId) -> Option<&mut PipeNet> {
        self.nets.get_mut(&id)
    }

    /// A net's mixture.
    pub fn air_mut(&mut self, id: PipeNetId) -> Option<&mut GasMixture> {
        self.nets.get_mut(&id).map(|net| &mut net.air)
    }

    /// Number of nets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nets.len()
    }

    /// Whether there are no nets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nets.is_empty()
    }

    /// Nets in id order.
    pub fn iter(&self) -> impl Iterator<Item = &PipeNet> {
        self.nets.values()
    }

    /// Nets in id order, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut PipeNet> {
        self.nets.values_mut()
    }
}

/// Undirected adjacency between existing nodes.
///
/// Built from every container's connection lists; links to nodes that do
/// not exist are dropped.
#[derive(Debug, Clone, Default)]
pub struct NodeAdjacency {
    edges: BTreeMap<NodeRef, BTreeSet<NodeRef>>,
}

impl NodeAdjacency {
    /// Build from `(owner, container)` pairs.
    pub fn build<'a>(containers: impl IntoIterator<Item = (EntityId, &'a NodeContainer)>) -> Self {
        let containers: BTreeMap<EntityId, &NodeContainer> = containers.into_iter().collect();
        let mut edges: BTreeMap<NodeRef, BTreeSet<NodeRef>> = BTreeMap::new();

        for (&owner, container) in &containers {
            for (name, node) in &container.nodes {
                let here = NodeRef::new(owner, name.clone());
                edges.entry(here.clone()).or_default();

                for target in &node.connections {
                    let exists = containers
                        .get(&target.owner)
                        .is_some_and(|c| c.nodes.contains_key(&target.name));
                    if !exists || *target == here {
                        continue;
                    }
                    edges.entry(here.clone()).or_default().insert(target.clone());
                    edges.entry(target.clone()).or_default().insert(here.clone());
                }
            }
        }

        Self { edges }
    }

    /// Whether a node exists in the graph.
    #[must_use]
    pub fn contains(&self, node: &NodeRef) -> bool {
        self.edges.contains_key(node)
    }

    /// Split the components reachable from `starts` into groups.
    ///
    /// Groups come out in order of their first start node; nodes within a
    /// group are in breadth-first order. Unknown start nodes are skipped.
    #[must_use]
    pub fn flood(&self, starts: &[NodeRef]) -> Vec<Vec<NodeRef>> {
        let mut visited: BTreeSet<&NodeRef> = BTreeSet::new();
        let mut groups = Vec::new();

        for start in starts {
            let Some((start, _)) = self.edges.get_key_value(start) else {
                continue;
            };
            if !visited.insert(start) {
                continue;
            }

            let mut group = Vec::new();
            let mut queue = VecDeque::from([start]);
            while let Some(node) = queue.pop_front() {
                group.push(node.clone());
                if let Some(neighbours) = self.edges.get(node) {
                    for next in neighbours {
                        if visited.insert(next) {
                            queue.push_back(next);
                        }
                    }
                }
            }
            groups.push(group);
        }

        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(next: Option<EntityId>) -> NodeContainer {
        let mut container = NodeContainer::new().with_node("pipe", Node::pipe(200.0));
        if let Some(next) = next {
            container.connect("pipe", NodeRef::new(next, "pipe"));
        }
        container
    }

    #[test]
    fn test_flood_is_undirected() {
        // 1 -> 2, 3 -> 2 and 4 alone.
        let a = segment(Some(2));
        let b = segment(None);
        let c = segment(Some(2));
        let d = segment(None);
        let graph = NodeAdjacency::build([(1, &a), (2, &b), (3, &c), (4, &d)]);

        let groups = graph.flood(&[NodeRef::new(2, "pipe"), NodeRef::new(4, "pipe")]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0][0], NodeRef::new(2, "pipe"));
        assert_eq!(groups[0].len(), 3);
        assert_eq!(groups[1], vec![NodeRef::new(4, "pipe")]);
    }

    #[test]
    fn test_flood_skips_revisits_and_unknown_nodes() {
        let a = segment(Some(2));
        let b = segment(Some(99));
        let graph = NodeAdjacency::build([(1, &a), (2, &b)]);

        let groups = graph.flood(&[
            NodeRef::new(1, "pipe"),
            NodeRef::new(2, "pipe"),
            NodeRef::new(7, "missing"),
        ]);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 2);
        assert!(!graph.contains(&NodeRef::new(99, "pipe")));
    }

    #[test]
    fn test_pipe_net_lookup() {
        let mut container = NodeContainer::new()
            .with_node("inlet", Node::pipe(100.0))
            .with_node("joint", Node::connector());
        container.nodes.get_mut("inlet").unwrap().net = Some(PipeNetId(3));
        container.nodes.get_mut("joint").unwrap().net = Some(PipeNetId(3));

        assert_eq!(container.pipe_net("inlet"), Some(PipeNetId(3)));
        assert_eq!(container.pipe_net("joint"), None);
        assert_eq!(container.pipe_net("outlet"), None);
        assert!(!container.connect("outlet", NodeRef::new(1, "x")));
    }

    #[test]
    fn test_storage_ids_increase() {
        let mut storage = PipeNetStorage::new();
        let a = storage.create(None, Vec::new(), GasMixture::new(10.0));
        let b = storage.create(None, Vec::new(), GasMixture::new(20.0));
        assert!(a < b);
        assert!(storage.remove(a).is_some());
        assert_eq!(storage.len(), 1);
        assert_eq!(storage.air_mut(b).map(|air| air.volume()), Some(20.0));
    }
}
