//! The indexed node set, edge list, and incidence lists the three engines
//! sweep over, plus the [`Minor`]/[`MinorEdge`] types all three produce.
//!
//! Ported from `graph.h`'s `Graph`/`Edge`/`MinorEdge`/`Minor`, adapted to the
//! teacher crate's own `Edge` trait + incidence-list shape (`graph.rs`'s
//! `Graph<NId, N, E>`) but concretized: the minor finders always work over
//! the fixed `(u, v, p, q)` edge quadruple, never a pluggable edge type, so
//! there is no need for the teacher's generic `N`/`E` type parameters here.

use crate::names::NamesDict;

/// An edge of the input graph: an undirected connection with interaction
/// count `p` and normalization `q`. `solid(e) == (q == 1)` marks main-strand
/// edges; anything else is a jump edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Edge {
	pub u: u32,
	pub v: u32,
	pub p: i64,
	pub q: i64,
}

impl Edge {
	pub fn new(u: u32, v: u32, p: i64, q: i64) -> Self {
		Self { u, v, p, q }
	}

	/// Lower-numbered endpoint.
	pub fn first(&self) -> u32 {
		self.u.min(self.v)
	}

	/// Higher-numbered endpoint.
	pub fn second(&self) -> u32 {
		self.u.max(self.v)
	}

	/// `q == 1` marks a main-strand edge, as opposed to a long-range jump edge.
	pub fn solid(&self) -> bool {
		self.q == 1
	}

	/// The endpoint that isn't `from`, assuming `from` is one of `u`/`v`.
	pub fn other(&self, from: u32) -> u32 {
		if from == self.u { self.v } else { self.u }
	}
}

/// Indexed node set, insertion-ordered edge list, and per-node incidence
/// lists. Mutated only during ingest; the engines treat it as read-only.
#[derive(Clone, Debug, Default)]
pub struct Graph {
	pub names: NamesDict,
	edges: Vec<Edge>,
	inc: Vec<Vec<u32>>,
}

impl Graph {
	pub fn new() -> Self {
		Self::default()
	}

	/// Interns `name` as a node, extending the incidence table if it's new.
	pub fn intern_node(&mut self, name: &str) -> u32 {
		let id = self.names.intern(name);
		while id as usize >= self.inc.len() {
			self.inc.push(Vec::new());
		}
		id
	}

	/// Appends an edge between two already-interned-by-name nodes, returning
	/// its edge id (its index in the insertion-ordered edge list).
	pub fn add_edge(&mut self, u_name: &str, v_name: &str, p: i64, q: i64) -> u32 {
		let u = self.intern_node(u_name);
		let v = self.intern_node(v_name);
		let eid = self.edges.len() as u32;
		self.edges.push(Edge::new(u, v, p, q));
		self.inc[u as usize].push(eid);
		self.inc[v as usize].push(eid);
		eid
	}

	pub fn size(&self) -> usize {
		self.inc.len()
	}

	pub fn edge_count(&self) -> usize {
		self.edges.len()
	}

	pub fn edge(&self, id: u32) -> &Edge {
		&self.edges[id as usize]
	}

	pub fn incident(&self, v: u32) -> &[u32] {
		&self.inc[v as usize]
	}

	pub fn solid(&self, id: u32) -> bool {
		self.edges[id as usize].solid()
	}

	/// Finds the first already-ingested edge between `u`/`v` with the given
	/// interaction count and normalization, in either endpoint order. Used by
	/// the path-decomposition sweep to resolve an `IntroduceEdge` step's
	/// `(u_in_bag, v_in_bag, p, q)` back to the edge id the graph file gave it.
	pub fn find_edge(&self, u: u32, v: u32, p: i64, q: i64) -> Option<u32> {
		self.inc[u as usize].iter().copied().find(|&eid| {
			let e = self.edges[eid as usize];
			e.other(u) == v && e.p == p && e.q == q
		})
	}
}

/// A single minor-edge between two distinct branch-sets: which original
/// edge realizes it, which branches it connects, and whether it is solid.
///
/// Ordering/equality matches `MinorEdge::operator<`/`operator==` in
/// `graph.h` with `COMPARE_EDGE_ID` undefined (the shipped default): first
/// by branch endpoints, then solidness, then - only when solid - by edge
/// id. Two non-solid minor-edges with equal `(br_u, br_v)` compare equal
/// regardless of which original edge realizes them; the P-engine relies on
/// this to dedup partial minors that differ only in that choice, since its
/// `add_edge` always records non-solid minor-edges.
#[derive(Clone, Copy, Debug)]
pub struct MinorEdge {
	pub br_u: u32,
	pub br_v: u32,
	pub solid: bool,
	pub edge_id: u32,
}

impl MinorEdge {
	pub fn new(edge_id: u32, br_u: u32, br_v: u32, solid: bool) -> Self {
		let (br_u, br_v) = if br_u <= br_v { (br_u, br_v) } else { (br_v, br_u) };
		Self { br_u, br_v, solid, edge_id }
	}

	pub fn edge_id(&self) -> u32 {
		self.edge_id
	}

	/// `edge_id` only participates in ordering/equality when `solid` - the
	/// same "compare id only when solid" rule `graph.h` applies.
	fn key(&self) -> (u32, u32, bool, Option<u32>) {
		(self.br_u, self.br_v, self.solid, if self.solid { Some(self.edge_id) } else { None })
	}

	pub fn solid(&self) -> bool {
		self.solid
	}
}

impl PartialEq for MinorEdge {
	fn eq(&self, other: &Self) -> bool {
		self.key() == other.key()
	}
}
impl Eq for MinorEdge {}
impl PartialOrd for MinorEdge {
	fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
		Some(self.cmp(other))
	}
}
impl Ord for MinorEdge {
	fn cmp(&self, other: &Self) -> std::cmp::Ordering {
		self.key().cmp(&other.key())
	}
}

/// A found minor: the branch-sets (original node ids merged per branch) and
/// the minor-edges between them, plus a cheap cost summary.
#[derive(Clone, Debug, Default)]
pub struct Minor {
	pub branches: Vec<Vec<u32>>,
	pub edges: Vec<MinorEdge>,
	pub arcs_edges: u32,
	pub arcs_in_branches: u32,
}

impl Minor {
	pub fn sum_branch_sets(&self) -> usize {
		self.branches.iter().map(Vec::len).sum()
	}

	pub fn max_branch_set(&self) -> usize {
		self.branches.iter().map(Vec::len).max().unwrap_or(0)
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn add_edge_populates_incidence() {
		let mut g = Graph::new();
		let eid = g.add_edge("a", "b", 3, 1);
		assert_eq!(g.size(), 2);
		assert_eq!(g.edge_count(), 1);
		assert!(g.solid(eid));
		assert_eq!(g.incident(0), &[0]);
		assert_eq!(g.incident(1), &[0]);
	}

	#[test]
	fn edge_first_second_and_other() {
		let e = Edge::new(3, 1, 1, 2);
		assert_eq!(e.first(), 1);
		assert_eq!(e.second(), 3);
		assert!(!e.solid());
		assert_eq!(e.other(3), 1);
		assert_eq!(e.other(1), 3);
	}

	#[test]
	fn minor_edge_normalizes_endpoint_order() {
		let me = MinorEdge::new(7, 2, 1, true);
		assert_eq!((me.br_u, me.br_v), (1, 2));
		assert_eq!(me.edge_id(), 7);
		assert!(me.solid());
	}

	#[test]
	fn non_solid_minor_edges_ignore_edge_id_in_ord_and_eq() {
		let a = MinorEdge::new(3, 0, 1, false);
		let b = MinorEdge::new(9, 0, 1, false);
		assert_eq!(a, b);
		assert_eq!(a.cmp(&b), std::cmp::Ordering::Equal);
	}

	#[test]
	fn solid_minor_edges_compare_by_edge_id() {
		let a = MinorEdge::new(3, 0, 1, true);
		let b = MinorEdge::new(9, 0, 1, true);
		assert_ne!(a, b);
		assert!(a < b);
	}
}
