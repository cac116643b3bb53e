//! Pooled storage for search records.
//!
//! Vertices and A* nodes are allocated out of an [`Arena`] and referred
//! to by typed integer handles. The arena is the only dynamic memory
//! source during a search; every handle it gives out must come back
//! exactly once — on duplicate discard, on closed-set admission of a
//! discardable node, at search-tree teardown, or through the caller
//! releasing the final node of a successful search. Balanced usage is
//! observable through [`Arena::vertices_balanced`] /
//! [`Arena::nodes_balanced`].

use latplan_collections::create_ref_type;
use latplan_collections::pool::Pool;

create_ref_type!(VertexId);
create_ref_type!(NodeId);

/// Which search graph a vertex belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VertexKind {
    /// Lattice state; the vertex key is the heading.
    State,
    /// Type-graph cell of the given type; the vertex key is the merge
    /// info, so cells of distinct types can coalesce.
    Cell { cell_type: i32 },
}

/// A vertex of either search graph.
///
/// Equality and hashing use only `(i, j, key, role)`: for type cells the
/// type itself is deliberately excluded, which is what merges cells that
/// agree on their merge info.
#[derive(Clone, Copy, Debug)]
pub struct Vertex {
    pub i: i32,
    pub j: i32,
    /// Heading of a lattice state, merge info of a type cell.
    pub key: i32,
    pub kind: VertexKind,
}

impl Vertex {
    pub fn state(i: i32, j: i32, theta: i32) -> Vertex {
        Vertex {
            i,
            j,
            key: theta,
            kind: VertexKind::State,
        }
    }

    pub fn cell(i: i32, j: i32, cell_type: i32, info: i32) -> Vertex {
        Vertex {
            i,
            j,
            key: info,
            kind: VertexKind::Cell { cell_type },
        }
    }

    /// Heading of a lattice state.
    pub fn theta(&self) -> i32 {
        debug_assert!(matches!(self.kind, VertexKind::State));
        self.key
    }

    /// Type of a type-graph cell.
    pub fn cell_type(&self) -> i32 {
        match self.kind {
            VertexKind::Cell { cell_type } => cell_type,
            VertexKind::State => unreachable!("lattice state has no type"),
        }
    }

    fn is_cell(&self) -> bool {
        matches!(self.kind, VertexKind::Cell { .. })
    }
}

impl PartialEq for Vertex {
    fn eq(&self, other: &Self) -> bool {
        self.i == other.i
            && self.j == other.j
            && self.key == other.key
            && self.is_cell() == other.is_cell()
    }
}

impl Eq for Vertex {}

impl std::hash::Hash for Vertex {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        (self.i, self.j, self.key, self.is_cell()).hash(state);
    }
}

/// An A* node: a vertex plus search bookkeeping.
#[derive(Clone, Copy, Debug)]
pub struct SearchNode {
    pub vertex: VertexId,
    pub g: f64,
    pub f: f64,
    pub parent: Option<NodeId>,
    /// When false the node's storage is reclaimed as soon as it is
    /// admitted to the closed set. The type-graph search clears this on
    /// nodes whose cells no primitive terminates in: they can never sit
    /// on a reconstructed parent chain.
    pub keep_after_closed: bool,
}

/// Default slot reservation per pool.
pub const DEFAULT_CAPACITY: usize = 100_000;

pub struct Arena {
    vertices: Pool<VertexId, Vertex>,
    nodes: Pool<NodeId, SearchNode>,
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl Arena {
    pub fn new() -> Arena {
        Arena::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(n: usize) -> Arena {
        Arena {
            vertices: Pool::with_capacity(n),
            nodes: Pool::with_capacity(n),
        }
    }

    pub fn new_state(&mut self, i: i32, j: i32, theta: i32) -> VertexId {
        self.vertices.alloc(Vertex::state(i, j, theta))
    }

    pub fn new_cell(&mut self, i: i32, j: i32, cell_type: i32, info: i32) -> VertexId {
        self.vertices.alloc(Vertex::cell(i, j, cell_type, info))
    }

    /// Wraps `vertex` in a fresh node with zero costs and no parent.
    pub fn new_node(&mut self, vertex: VertexId) -> NodeId {
        self.nodes.alloc(SearchNode {
            vertex,
            g: 0.0,
            f: 0.0,
            parent: None,
            keep_after_closed: true,
        })
    }

    pub fn vertex(&self, id: VertexId) -> &Vertex {
        self.vertices.get(id)
    }

    pub fn node(&self, id: NodeId) -> &SearchNode {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut SearchNode {
        self.nodes.get_mut(id)
    }

    pub fn release_vertex(&mut self, id: VertexId) {
        self.vertices.release(id);
    }

    /// Releases a node together with the vertex it wraps.
    pub fn release_node(&mut self, id: NodeId) {
        let vertex = self.nodes.get(id).vertex;
        self.vertices.release(vertex);
        self.nodes.release(id);
    }

    /// True when every vertex slot has been returned.
    pub fn vertices_balanced(&self) -> bool {
        self.vertices.free_count() == self.vertices.capacity()
    }

    /// True when every node slot has been returned.
    pub fn nodes_balanced(&self) -> bool {
        self.nodes.free_count() == self.nodes.capacity()
    }

    pub fn live_vertices(&self) -> usize {
        self.vertices.in_use()
    }

    pub fn live_nodes(&self) -> usize {
        self.nodes.in_use()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_merge_on_info_not_type() {
        let a = Vertex::cell(4, 2, 17, 3);
        let b = Vertex::cell(4, 2, 99, 3);
        let c = Vertex::cell(4, 2, 17, 4);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn state_and_cell_never_equal() {
        let s = Vertex::state(1, 2, 3);
        let c = Vertex::cell(1, 2, 9, 3);
        assert_ne!(s, c);
        assert_eq!(s, Vertex::state(1, 2, 3));
    }

    #[test]
    fn release_node_frees_its_vertex() {
        let mut arena = Arena::with_capacity(4);
        let v = arena.new_state(0, 0, 0);
        let n = arena.new_node(v);
        assert_eq!(arena.live_vertices(), 1);
        assert_eq!(arena.live_nodes(), 1);

        arena.release_node(n);
        assert!(arena.vertices_balanced());
        assert!(arena.nodes_balanced());
    }

    #[test]
    fn node_starts_clean() {
        let mut arena = Arena::with_capacity(4);
        let v = arena.new_cell(5, 6, 7, 8);
        let n = arena.new_node(v);
        let node = arena.node(n);
        assert_eq!(node.g, 0.0);
        assert_eq!(node.f, 0.0);
        assert_eq!(node.parent, None);
        assert!(node.keep_after_closed);
        assert_eq!(arena.vertex(node.vertex).cell_type(), 7);
        assert_eq!(arena.vertex(node.vertex).key, 8);
    }
}
