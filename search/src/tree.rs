//! The search tree: A*'s frontier, closed set and expansion ledger.

use crate::arena::{Arena, NodeId, Vertex, VertexId};
use crate::limits::{MAX_INFO, MAX_MAP_HEIGHT, MAX_MAP_WIDTH};
use fixedbitset::FixedBitSet;
use hashbrown::HashSet;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Frontier entry: the priority is copied out of the node so the heap
/// never needs to look into the arena.
#[derive(Clone, Copy)]
struct OpenEntry {
    f: f64,
    node: NodeId,
}

/// `BinaryHeap` is a max-heap, so entries order by *descending* f; ties
/// fall back to the node id purely to keep the order total.
impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

/// The two closed-set representations behind one interface.
enum Closed {
    /// One bit per `(cell, key)` combination over the maximum map
    /// dimensions: setting and testing membership is branch-free, at the
    /// price of ~90 MB per tree at the compiled-in limits.
    Bits(FixedBitSet),
    /// Hash set of vertex values; no up-front allocation, slower per
    /// operation.
    Hash(HashSet<Vertex>),
}

/// Bit position of a vertex in the flat closed-set array.
fn closed_bit(v: &Vertex) -> usize {
    debug_assert!(
        (0..MAX_MAP_HEIGHT).contains(&v.i)
            && (0..MAX_MAP_WIDTH).contains(&v.j)
            && (0..MAX_INFO).contains(&v.key),
        "vertex {v:?} outside the closed-set address space"
    );
    (v.key as usize) * (MAX_MAP_HEIGHT as usize) * (MAX_MAP_WIDTH as usize)
        + (v.i as usize) * (MAX_MAP_WIDTH as usize)
        + (v.j as usize)
}

/// OPEN + CLOSED + the ledger of expanded nodes.
///
/// The frontier may hold several entries for equal vertices; duplicates
/// are dropped lazily when popped (there is no decrease-key). Nodes
/// admitted to the closed set are either appended to the ledger — they
/// may sit on a parent chain and must outlive the search — or released
/// immediately when flagged discardable.
///
/// The tree borrows the arena only inside each operation; a teardown
/// call returns every handle it still holds.
pub struct SearchTree {
    open: BinaryHeap<OpenEntry>,
    closed: Closed,
    expanded: Vec<NodeId>,
}

impl SearchTree {
    /// `fast_closed` selects the bit-array closed set; otherwise a hash
    /// set is used. Both yield identical search results.
    pub fn new(fast_closed: bool) -> SearchTree {
        let closed = if fast_closed {
            let bits = MAX_MAP_HEIGHT as usize * MAX_MAP_WIDTH as usize * MAX_INFO as usize;
            Closed::Bits(FixedBitSet::with_capacity(bits))
        } else {
            Closed::Hash(HashSet::new())
        };
        SearchTree {
            open: BinaryHeap::new(),
            closed,
            expanded: Vec::new(),
        }
    }

    pub fn open_is_empty(&self) -> bool {
        self.open.is_empty()
    }

    pub fn push_open(&mut self, arena: &Arena, node: NodeId) {
        let f = arena.node(node).f;
        self.open.push(OpenEntry { f, node });
    }

    /// Pops the lowest-f node whose vertex is not yet expanded,
    /// releasing any stale duplicates on the way. `None` once the
    /// frontier is exhausted.
    pub fn pop_best(&mut self, arena: &mut Arena) -> Option<NodeId> {
        while let Some(entry) = self.open.pop() {
            let vertex = arena.node(entry.node).vertex;
            if self.was_expanded(arena, vertex) {
                arena.release_node(entry.node);
            } else {
                return Some(entry.node);
            }
        }
        None
    }

    pub fn was_expanded(&self, arena: &Arena, vertex: VertexId) -> bool {
        let v = arena.vertex(vertex);
        match &self.closed {
            Closed::Bits(bits) => bits.contains(closed_bit(v)),
            Closed::Hash(set) => set.contains(v),
        }
    }

    /// Moves an expanded node into the closed set. Nodes flagged
    /// `keep_after_closed` go to the ledger; the rest are returned to
    /// the arena on the spot.
    pub fn admit_closed(&mut self, arena: &mut Arena, node: NodeId) {
        let v = *arena.vertex(arena.node(node).vertex);
        match &mut self.closed {
            Closed::Bits(bits) => bits.insert(closed_bit(&v)),
            Closed::Hash(set) => {
                set.insert(v);
            }
        }
        if arena.node(node).keep_after_closed {
            self.expanded.push(node);
        } else {
            arena.release_node(node);
        }
    }

    /// Nodes admitted to the closed set and retained, in admission
    /// order.
    pub fn expanded_nodes(&self) -> &[NodeId] {
        &self.expanded
    }

    /// Returns every handle still held — the remaining frontier and the
    /// whole ledger — to the arena. The final node of a successful
    /// search is in neither and stays with the caller.
    pub fn release_all(&mut self, arena: &mut Arena) {
        while let Some(entry) = self.open.pop() {
            arena.release_node(entry.node);
        }
        for node in self.expanded.drain(..) {
            arena.release_node(node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with(fast: bool) -> (Arena, SearchTree) {
        (Arena::with_capacity(16), SearchTree::new(fast))
    }

    fn push_state(arena: &mut Arena, tree: &mut SearchTree, i: i32, j: i32, f: f64) -> NodeId {
        let v = arena.new_state(i, j, 0);
        let n = arena.new_node(v);
        arena.node_mut(n).f = f;
        tree.push_open(arena, n);
        n
    }

    #[test]
    fn pops_in_ascending_f_order() {
        let (mut arena, mut tree) = tree_with(false);
        push_state(&mut arena, &mut tree, 0, 0, 3.0);
        push_state(&mut arena, &mut tree, 0, 1, 1.0);
        push_state(&mut arena, &mut tree, 0, 2, 2.0);

        let mut fs = Vec::new();
        while let Some(n) = tree.pop_best(&mut arena) {
            fs.push(arena.node(n).f);
            tree.admit_closed(&mut arena, n);
        }
        assert_eq!(fs, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn duplicates_dropped_lazily() {
        for fast in [false, true] {
            let (mut arena, mut tree) = tree_with(fast);
            push_state(&mut arena, &mut tree, 5, 5, 1.0);
            push_state(&mut arena, &mut tree, 5, 5, 2.0);
            push_state(&mut arena, &mut tree, 5, 5, 4.0);

            let first = tree.pop_best(&mut arena).unwrap();
            tree.admit_closed(&mut arena, first);

            // both redundant entries must be swallowed and released
            assert!(tree.pop_best(&mut arena).is_none());
            assert!(tree.open_is_empty());

            tree.release_all(&mut arena);
            assert!(arena.vertices_balanced() && arena.nodes_balanced());
        }
    }

    #[test]
    fn discardable_nodes_freed_on_admission() {
        let (mut arena, mut tree) = tree_with(true);
        let v = arena.new_cell(1, 1, 3, 0);
        let n = arena.new_node(v);
        arena.node_mut(n).keep_after_closed = false;
        tree.push_open(&arena, n);

        let popped = tree.pop_best(&mut arena).unwrap();
        tree.admit_closed(&mut arena, popped);
        assert!(arena.nodes_balanced(), "discardable node must be released");
        assert!(tree.expanded_nodes().is_empty());

        // the vertex is still marked expanded
        let probe = arena.new_cell(1, 1, 99, 0);
        assert!(tree.was_expanded(&arena, probe));
        arena.release_vertex(probe);
        assert!(arena.vertices_balanced());
    }

    #[test]
    fn backends_agree_on_membership() {
        let (mut arena, mut tree_bits) = tree_with(true);
        let mut tree_hash = SearchTree::new(false);

        let a = arena.new_state(3, 4, 2);
        let na = arena.new_node(a);
        let nb = {
            let v = arena.new_state(3, 4, 2);
            arena.new_node(v)
        };
        tree_bits.push_open(&arena, na);
        tree_hash.push_open(&arena, nb);

        let pa = tree_bits.pop_best(&mut arena).unwrap();
        tree_bits.admit_closed(&mut arena, pa);
        let pb = tree_hash.pop_best(&mut arena).unwrap();
        tree_hash.admit_closed(&mut arena, pb);

        let probe = arena.new_state(3, 4, 2);
        assert!(tree_bits.was_expanded(&arena, probe));
        assert!(tree_hash.was_expanded(&arena, probe));
        let other = arena.new_state(3, 4, 3);
        assert!(!tree_bits.was_expanded(&arena, other));
        assert!(!tree_hash.was_expanded(&arena, other));

        arena.release_vertex(probe);
        arena.release_vertex(other);
        tree_bits.release_all(&mut arena);
        tree_hash.release_all(&mut arena);
        assert!(arena.vertices_balanced() && arena.nodes_balanced());
    }
}
