//! Linear K_k finder (L-engine).
//!
//! Sweeps main-strand vertices `0..n`, maintaining a frontier of partial
//! linear minors keyed by `(segment count, current_edges_mask,
//! current_vertex_mask)`. Ported from `find-k6-linear.cpp`'s `LinearMinor` /
//! `LinearMinorFinder`; the edge-bound formula, bad-triangle rejection, and
//! dedup key are carried over exactly.

use std::collections::{BTreeSet, HashMap};

use crate::error::{EngineError, Result};
use crate::graph::Graph;

/// A partial realization of a prefix of the strand as some number of
/// contiguous segments, plus the jump edges chosen to connect them so far.
#[derive(Clone, Debug)]
pub struct LState {
	/// `last_vertices[i]` = last main-strand vertex of segment `i`.
	pub last_vertices: Vec<u32>,
	pub chosen_edges: Vec<u32>,
	pub current_edges_mask: u32,
	pub current_vertex_mask: u32,
}

impl LState {
	fn empty() -> Self {
		Self { last_vertices: Vec::new(), chosen_edges: Vec::new(), current_edges_mask: 0, current_vertex_mask: 0 }
	}

	/// Dedup/ordering key: only the segment count and the two bitmasks
	/// participate, matching `LinearMinor::operator<`.
	fn key(&self) -> (usize, u32, u32) {
		(self.last_vertices.len(), self.current_edges_mask, self.current_vertex_mask)
	}

	pub fn vertex2segment(&self, v: u32) -> usize {
		let mut i = 0;
		while i < self.last_vertices.len() && self.last_vertices[i] < v {
			i += 1;
		}
		i
	}

	/// Minimum number of chosen edges needed to still be able to close the
	/// current segment, given `b` segments closed so far. Must match the
	/// source's formula exactly - it's the count of segment pairs that are
	/// already forced to be connected.
	fn has_max_edges(&self, k: i64) -> bool {
		let b = self.last_vertices.len() as i64;
		let threshold = (k - 1) * (k - 2) / 2 + (k - 2 - b).max(0) - (k - 1 - b) * (k - 2 - b) / 2;
		self.chosen_edges.len() as i64 >= threshold
	}

	fn can_take_new_edge(&self, g: &Graph, eid: u32, k: i64, allow_common_endpoints: bool) -> bool {
		if self.has_max_edges(k) {
			return false;
		}
		let e = *g.edge(eid);
		for a in 0..self.chosen_edges.len() {
			let ea = *g.edge(self.chosen_edges[a]);
			if !allow_common_endpoints
				&& (ea.first() == e.first() || ea.second() == e.first() || ea.first() == e.second() || ea.second() == e.second())
			{
				return false;
			}
			for b in 0..a {
				let eb = *g.edge(self.chosen_edges[b]);
				if ea.first() == eb.first()
					&& ((ea.second() == e.first() && eb.second() == e.second()) || (eb.second() == e.first() && ea.second() == e.second()))
				{
					return false;
				}
			}
		}
		true
	}
}

impl PartialEq for LState {
	fn eq(&self, other: &Self) -> bool {
		self.key() == other.key()
	}
}
impl Eq for LState {}
impl PartialOrd for LState {
	fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
		Some(self.cmp(other))
	}
}
impl Ord for LState {
	fn cmp(&self, other: &Self) -> std::cmp::Ordering {
		self.key().cmp(&other.key())
	}
}

/// Checks every invariant a found minor must satisfy; fires a
/// `debug_assert!` on violation and always returns the check result so
/// release builds can surface `EngineError::Internal` instead of continuing.
pub fn debug_check_correctness(g: &Graph, k: i64, allow_common_endpoints: bool, m: &LState) -> Result<()> {
	let expect_edges = ((k - 1) * (k - 2) / 2) as usize;
	if m.last_vertices.len() != k as usize {
		debug_assert!(false, "wrong segment count");
		return Err(EngineError::Internal("wrong segment count".into()));
	}
	if m.chosen_edges.len() != expect_edges {
		debug_assert!(false, "wrong number of chosen edges");
		return Err(EngineError::Internal("wrong number of chosen edges".into()));
	}
	let mut connections = std::collections::HashSet::new();
	for &eid in &m.chosen_edges {
		let e = g.edge(eid);
		let a = m.vertex2segment(e.first());
		let b = m.vertex2segment(e.second());
		if a + 1 >= b {
			debug_assert!(false, "two consecutive segments connected by an edge");
			return Err(EngineError::Internal("two consecutive segments connected by an edge".into()));
		}
		if !connections.insert((a, b)) {
			debug_assert!(false, "two segments already connected");
			return Err(EngineError::Internal("two segments already connected".into()));
		}
	}
	if connections.len() != expect_edges {
		debug_assert!(false, "wrong number of connections");
		return Err(EngineError::Internal("wrong number of connections".into()));
	}
	for &e1 in &m.chosen_edges {
		for &e2 in &m.chosen_edges {
			if !allow_common_endpoints && e1 != e2 {
				let a = g.edge(e1);
				let b = g.edge(e2);
				if a.first() == b.first() || a.first() == b.second() || a.second() == b.first() || a.second() == b.second() {
					debug_assert!(false, "common endpoint of two jump edges");
					return Err(EngineError::Internal("common endpoint of two jump edges".into()));
				}
			}
			for &e3 in &m.chosen_edges {
				if e1 != e2 && e2 != e3 && e1 != e3 {
					let (a, b, c) = (g.edge(e1), g.edge(e2), g.edge(e3));
					if a.first() == b.first() && a.second() == c.first() && b.second() == c.second() {
						debug_assert!(false, "bad triangle");
						return Err(EngineError::Internal("bad triangle".into()));
					}
				}
			}
		}
	}
	Ok(())
}

/// Runs the L-engine sweep over `g`, returning every linear K_k minor model.
pub fn solve(g: &Graph, k: u32, allow_common_endpoints: bool, frontier_limit: usize) -> Result<Vec<LState>> {
	if k < 3 || k > 8 {
		return Err(EngineError::InvalidParameter(format!("k={} is infeasible for the 32-bit segment bitmask encoding (need 3 <= k <= 8)", k)));
	}
	let kk = k as i64;
	let n = g.size();
	let mut sentinel = g.clone();
	sentinel.intern_node("\u{0}__sentinel__");

	let mut partial_minors: BTreeSet<LState> = BTreeSet::new();
	partial_minors.insert(LState::empty());
	let mut current_edges: Vec<u32> = Vec::new();
	let mut current_edges_map: HashMap<u32, u32> = HashMap::new();
	let mut found: Vec<LState> = Vec::new();

	for v in 0..=n as u32 {
		let mut new_edges_set: std::collections::BTreeSet<u32> = current_edges.iter().copied().collect();
		if (v as usize) < sentinel.size() {
			for &eid in sentinel.incident(v) {
				let other = sentinel.edge(eid).other(v);
				if other < v {
					new_edges_set.remove(&eid);
				} else {
					new_edges_set.insert(eid);
				}
			}
		}
		let new_current_edges: Vec<u32> = new_edges_set.into_iter().collect();
		let new_current_edges_map: HashMap<u32, u32> = new_current_edges.iter().enumerate().map(|(i, &e)| (e, i as u32)).collect();

		let mut new_partial_minors: BTreeSet<LState> = BTreeSet::new();
		for opm in &partial_minors {
			let mut tmp_list: Vec<LState> = vec![opm.clone()];
			if v > 0 {
				let b = opm.last_vertices.len() as u32;
				let expected_cvm = (1u32 << (b.max(1) - 1)) - 1;
				if expected_cvm == opm.current_vertex_mask && opm.has_max_edges(kk) {
					let mut pm = opm.clone();
					pm.last_vertices.push(v - 1);
					pm.current_vertex_mask = 0;
					if pm.last_vertices.len() == k as usize {
						found.push(pm);
					} else {
						tmp_list.push(pm);
					}
				}
			}
			if (v as usize) < sentinel.size() {
				for &eid in sentinel.incident(v) {
					let mut tmp_list2: Vec<LState> = Vec::new();
					let other = sentinel.edge(eid).other(v);
					for pm in &tmp_list {
						if other < v {
							let idx = current_edges_map[&eid];
							if pm.current_edges_mask & (1u32 << idx) != 0 {
								let i = pm.vertex2segment(sentinel.edge(eid).first());
								if i + 1 < pm.last_vertices.len() && pm.current_vertex_mask & (1u32 << i) == 0 {
									let mut pm2 = pm.clone();
									pm2.current_vertex_mask |= 1u32 << i;
									tmp_list2.push(pm2);
								}
							} else {
								tmp_list2.push(pm.clone());
							}
						} else {
							tmp_list2.push(pm.clone());
							if pm.can_take_new_edge(&sentinel, eid, kk, allow_common_endpoints) {
								let mut pm2 = pm.clone();
								pm2.chosen_edges.push(eid);
								tmp_list2.push(pm2);
							}
						}
					}
					tmp_list = tmp_list2;
				}
			}
			for mut pm in tmp_list {
				pm.current_edges_mask = 0;
				for &eid in &pm.chosen_edges {
					if let Some(&idx) = new_current_edges_map.get(&eid) {
						pm.current_edges_mask |= 1u32 << idx;
					}
				}
				new_partial_minors.insert(pm);
			}
		}
		partial_minors = new_partial_minors;
		if partial_minors.len() > frontier_limit {
			return Err(EngineError::FrontierExhausted { limit: frontier_limit });
		}
		current_edges = new_current_edges;
		current_edges_map = new_current_edges_map;
	}

	for m in &found {
		debug_check_correctness(g, kk, allow_common_endpoints, m)?;
	}
	Ok(found)
}

#[cfg(test)]
mod test {
	use super::*;

	fn strand(n: u32) -> Graph {
		let mut g = Graph::new();
		for i in 0..n {
			g.intern_node(&format!("v{}", i));
		}
		for i in 0..n.saturating_sub(1) {
			g.add_edge(&format!("v{}", i), &format!("v{}", i + 1), 1, 1);
		}
		g
	}

	#[test]
	fn trivial_k3_linear_minor() {
		let mut g = strand(6);
		g.add_edge("v0", "v3", 1, 0);
		g.add_edge("v1", "v4", 1, 0);
		g.add_edge("v2", "v5", 1, 0);
		let found = solve(&g, 3, true, 1_000_000).unwrap();
		assert!(!found.is_empty());
		for m in &found {
			assert_eq!(m.chosen_edges.len(), 1);
			assert_eq!(m.last_vertices.len(), 3);
		}
	}

	#[test]
	fn forbidden_triangle_rejected() {
		let mut g = strand(8);
		g.add_edge("v0", "v3", 1, 0);
		g.add_edge("v0", "v5", 1, 0);
		g.add_edge("v3", "v5", 1, 0);
		let found = solve(&g, 4, true, 1_000_000).unwrap();
		for m in &found {
			debug_check_correctness(&g, 4, true, m).unwrap();
		}
	}

	#[test]
	fn no_common_endpoints_excludes_shared_endpoint_pairs() {
		let mut g = strand(8);
		g.add_edge("v0", "v3", 1, 0);
		g.add_edge("v0", "v4", 1, 0);
		g.add_edge("v1", "v5", 1, 0);
		let found = solve(&g, 3, false, 1_000_000).unwrap();
		for m in &found {
			let edges: Vec<_> = m.chosen_edges.iter().map(|&e| *g.edge(e)).collect();
			for i in 0..edges.len() {
				for j in 0..i {
					let (a, b) = (edges[i], edges[j]);
					assert!(a.first() != b.first() && a.first() != b.second() && a.second() != b.first() && a.second() != b.second());
				}
			}
		}
	}

	#[test]
	fn k_out_of_range_is_rejected_as_parameter_error() {
		let g = strand(4);
		assert!(matches!(solve(&g, 9, true, 1000), Err(EngineError::InvalidParameter(_))));
		assert!(matches!(solve(&g, 2, true, 1000), Err(EngineError::InvalidParameter(_))));
	}

	#[test]
	fn determinism_under_edge_order_shuffle() {
		let mut g1 = strand(6);
		g1.add_edge("v0", "v3", 1, 0);
		g1.add_edge("v1", "v4", 1, 0);
		g1.add_edge("v2", "v5", 1, 0);

		let mut g2 = strand(6);
		g2.add_edge("v2", "v5", 1, 0);
		g2.add_edge("v0", "v3", 1, 0);
		g2.add_edge("v1", "v4", 1, 0);

		let mut keys1: Vec<_> = solve(&g1, 3, true, 1_000_000).unwrap().into_iter().map(|m| (m.last_vertices, m.chosen_edges.len())).collect();
		let mut keys2: Vec<_> = solve(&g2, 3, true, 1_000_000).unwrap().into_iter().map(|m| (m.last_vertices, m.chosen_edges.len())).collect();
		keys1.sort();
		keys2.sort();
		assert_eq!(keys1, keys2);
	}
}
