use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Node identifier in the reference adjacency-list graph.
pub type NodeId = u64;

/// The only thing the search needs from a node type: its outgoing neighbors.
///
/// Implementors must have a stable `Eq`/`Hash` identity because nodes are
/// used as keys in the visited/parent map. `children` is a pure read; the
/// search calls it at most once per node.
pub trait ChildExpander: Clone + Eq + Hash {
    type Children: IntoIterator<Item = Self>;

    /// Outgoing neighbors of this node. Order affects which of several
    /// equally short paths is reported, never the path length.
    fn children(&self) -> Self::Children;
}

/// Metadata about a node.
#[derive(Debug, Clone)]
pub struct NodeInfo {
    pub label: String,
}

/// In-memory directed graph: outgoing adjacency lists + node metadata.
///
/// Children are kept in insertion order, which is the order the search
/// enumerates them in.
pub struct DirectedGraph {
    outgoing: HashMap<NodeId, Vec<NodeId>>,
    nodes: HashMap<NodeId, NodeInfo>,
}

impl DirectedGraph {
    pub fn new() -> Self {
        Self {
            outgoing: HashMap::new(),
            nodes: HashMap::new(),
        }
    }

    /// Pre-allocate for a known graph size.
    pub fn with_capacity(node_count: usize) -> Self {
        Self {
            outgoing: HashMap::with_capacity(node_count),
            nodes: HashMap::with_capacity(node_count),
        }
    }

    /// Register a node with a label. Re-registering replaces the label only.
    pub fn add_node(&mut self, id: NodeId, label: impl Into<String>) {
        self.nodes.insert(id, NodeInfo { label: label.into() });
    }

    /// Add a directed edge `from → to`. Unknown endpoints are registered with
    /// an empty label. Parallel edges are kept.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId) {
        self.nodes
            .entry(from)
            .or_insert_with(|| NodeInfo { label: String::new() });
        self.nodes
            .entry(to)
            .or_insert_with(|| NodeInfo { label: String::new() });
        self.outgoing.entry(from).or_default().push(to);
    }

    /// Bulk load from `(from, to)` pairs.
    pub fn load_edges<I>(&mut self, edges: I)
    where
        I: IntoIterator<Item = (NodeId, NodeId)>,
    {
        for (from, to) in edges {
            self.add_edge(from, to);
        }
    }

    /// Node handle for `id`, or None if the node was never registered.
    pub fn node(&self, id: NodeId) -> Option<GraphNode<'_>> {
        self.nodes
            .contains_key(&id)
            .then_some(GraphNode { graph: self, id })
    }

    /// Get node metadata.
    pub fn info(&self, id: NodeId) -> Option<&NodeInfo> {
        self.nodes.get(&id)
    }

    /// Outgoing neighbors of a node, in insertion order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.outgoing.get(&id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Whether `from → to` is an edge.
    pub fn has_edge(&self, from: NodeId, to: NodeId) -> bool {
        self.children(from).contains(&to)
    }

    /// All registered node ids, in no particular order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.outgoing.values().map(|v| v.len()).sum()
    }

    /// Approximate memory usage in bytes.
    pub fn memory_usage(&self) -> usize {
        use std::mem::size_of;

        let nodes_mem = self.nodes.len() * (size_of::<NodeId>() + size_of::<NodeInfo>() + 40);
        let edges_mem: usize = self
            .outgoing
            .values()
            .map(|v| v.capacity() * size_of::<NodeId>())
            .sum();

        nodes_mem + edges_mem
    }
}

impl Default for DirectedGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// A borrowed handle to a node of a [`DirectedGraph`].
///
/// Identity is the `NodeId` alone: two handles are equal when they name the
/// same node, whichever graph borrow produced them.
#[derive(Clone, Copy)]
pub struct GraphNode<'g> {
    graph: &'g DirectedGraph,
    id: NodeId,
}

impl<'g> GraphNode<'g> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn label(&self) -> &'g str {
        self.graph
            .info(self.id)
            .map(|n| n.label.as_str())
            .unwrap_or_default()
    }
}

impl PartialEq for GraphNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for GraphNode<'_> {}

impl Hash for GraphNode<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for GraphNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GraphNode({})", self.id)
    }
}

impl fmt::Display for GraphNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Iterator over the children of a [`GraphNode`].
pub struct Children<'g> {
    graph: &'g DirectedGraph,
    ids: std::slice::Iter<'g, NodeId>,
}

impl<'g> Iterator for Children<'g> {
    type Item = GraphNode<'g>;

    fn next(&mut self) -> Option<Self::Item> {
        let graph = self.graph;
        self.ids.next().map(|&id| GraphNode { graph, id })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.ids.size_hint()
    }
}

impl<'g> ChildExpander for GraphNode<'g> {
    type Children = Children<'g>;

    fn children(&self) -> Children<'g> {
        Children {
            graph: self.graph,
            ids: self.graph.children(self.id).iter(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_edge_registers_endpoints() {
        let mut g = DirectedGraph::new();
        g.add_edge(1, 2);
        assert_eq!(g.node_count(), 2);
        assert_eq!(g.edge_count(), 1);
        assert!(g.node(1).is_some());
        assert!(g.node(2).is_some());
        assert!(g.node(3).is_none());
    }

    #[test]
    fn test_children_keep_insertion_order() {
        let mut g = DirectedGraph::new();
        g.load_edges([(0, 3), (0, 1), (0, 2)]);
        let node = g.node(0).unwrap();
        let ids: Vec<NodeId> = node.children().map(|c| c.id()).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_edges_are_directed() {
        let mut g = DirectedGraph::new();
        g.add_edge(0, 1);
        assert!(g.has_edge(0, 1));
        assert!(!g.has_edge(1, 0));
        assert_eq!(g.node(1).unwrap().children().count(), 0);
    }

    #[test]
    fn test_node_identity_is_by_id() {
        let mut g = DirectedGraph::new();
        g.add_node(7, "Seven");
        let a = g.node(7).unwrap();
        let b = g.node(7).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.label(), "Seven");
        assert_eq!(a.to_string(), "7");
    }

    #[test]
    fn test_add_node_keeps_edges() {
        let mut g = DirectedGraph::new();
        g.add_edge(0, 1);
        g.add_node(0, "Root");
        assert_eq!(g.info(0).unwrap().label, "Root");
        assert_eq!(g.children(0), &[1]);
    }

    #[test]
    fn test_memory_usage_grows_with_edges() {
        let mut g = DirectedGraph::with_capacity(4);
        let empty = g.memory_usage();
        g.load_edges([(0, 1), (1, 2), (2, 3)]);
        assert!(g.memory_usage() > empty);
    }
}
