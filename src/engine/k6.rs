//! Specialized K_6 witness finder over a path decomposition (K6-engine).
//!
//! Ported from `k6finder.h`'s `BridgeEdge`/`BranchPath`/`PartialK6`/
//! `K6Finder`. Unlike the generic P-engine, this engine fixes the branch
//! count at 6 and tracks, per unordered pair of branches `{b, c}` distinct
//! from a third branch `a`, the disjoint paths through `a` connecting a
//! vertex destined for `b` to one destined for `c` - the "branch-paths" that
//! realize K_6's 15 edges as 15 bridges plus the routing through each branch.

use std::collections::BTreeSet;

use crate::error::{EngineError, Result};
use crate::graph::{Graph, Minor, MinorEdge};
use crate::pathdecomp::{PathDecomp, PathDecompBag, PathDecompNode};

/// One of the 15 unordered branch-pairs, realized (if at all) by a single
/// original edge crossing between the two branches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct BridgeEdge {
	pub id: Option<u32>,
	pub solid: bool,
}

fn bridge_edge_index(a: usize, b: usize) -> usize {
	let (a, b) = if a > b { (b, a) } else { (a, b) };
	debug_assert!(a < b && b <= 5);
	b * (b - 1) / 2 + a
}

/// A partial path, inside branch `get_branch()`, connecting a vertex meant
/// for branch `get_u1()` to one meant for branch `get_u2()`. `v1`/`v2` are
/// bag positions of the current dangling endpoints, or `-1` once an endpoint
/// has been absorbed by the matching bridge edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BranchPath {
	pub color: u32,
	pub v1: i64,
	pub v2: i64,
	pub solid: bool,
}

impl BranchPath {
	pub fn new(branch: u32, u1: u32, u2: u32, v1: i64, v2: i64, solid: bool) -> Self {
		Self { color: params2color(branch, u1, u2), v1, v2, solid }
	}

	pub fn get_branch(&self) -> u32 {
		color2branch(self.color)
	}
	pub fn get_u1(&self) -> u32 {
		color2u1(self.color)
	}
	pub fn get_u2(&self) -> u32 {
		color2u2(self.color)
	}

	fn key(&self) -> (u32, bool, i64, i64) {
		(self.color, self.solid, self.v1, self.v2)
	}
}

impl PartialOrd for BranchPath {
	fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
		Some(self.cmp(other))
	}
}
impl Ord for BranchPath {
	fn cmp(&self, other: &Self) -> std::cmp::Ordering {
		self.key().cmp(&other.key())
	}
}

fn color2branch(c: u32) -> u32 {
	c >> 6
}
fn color2u1(c: u32) -> u32 {
	(c >> 3) & 7
}
fn color2u2(c: u32) -> u32 {
	c & 7
}
fn params2color(br: u32, u1: u32, u2: u32) -> u32 {
	(br << 6) | (u1.min(u2) << 3) | u1.max(u2)
}

#[derive(Clone, Debug)]
pub struct PartialK6 {
	pub forgotten: [bool; 6],
	pub bag2branch: Vec<i64>,
	pub bridge_edges: [BridgeEdge; 15],
	pub paths: Vec<BranchPath>,
	pub bridge_endpoints: [i64; 6],
	pub solid_edges: BTreeSet<u32>,
	pub branch_sets: [Vec<u32>; 6],
	pub total_score: i64,
}

impl Default for PartialK6 {
	fn default() -> Self {
		Self {
			forgotten: [false; 6],
			bag2branch: Vec::new(),
			bridge_edges: [BridgeEdge::default(); 15],
			paths: Vec::new(),
			bridge_endpoints: [-1; 6],
			solid_edges: BTreeSet::new(),
			branch_sets: Default::default(),
			total_score: 0,
		}
	}
}

impl PartialK6 {
	fn get_bridge_edge(&self, a: usize, b: usize) -> BridgeEdge {
		self.bridge_edges[bridge_edge_index(a, b)]
	}

	fn set_bridge_edge(&mut self, a: usize, b: usize, id: u32, solid: bool) {
		self.bridge_edges[bridge_edge_index(a, b)] = BridgeEdge { id: Some(id), solid };
		if solid {
			self.solid_edges.insert(id);
		}
	}

	/// Structural dedup key, matching `PartialK6::operator<`. `total_score`
	/// does not participate - it only breaks ties via [`Self::is_better`].
	fn key(&self) -> (Vec<i64>, [bool; 6], Vec<BranchPath>, [BridgeEdge; 15], BTreeSet<u32>) {
		(self.bag2branch.clone(), self.forgotten, self.paths.clone(), self.bridge_edges, self.solid_edges.clone())
	}

	fn is_better(&self, other: &Self) -> bool {
		self.total_score < other.total_score
	}

	fn count_paths_by_color(&self, a: u32, b: u32, c: u32) -> usize {
		let color = params2color(a, b, c);
		self.paths.iter().filter(|p| p.color == color).count()
	}

	/// Marks vertex `v` as absorbed by a bridge edge between branches `a`/`b`;
	/// returns `false` if doing so would strand a still-ambiguous path.
	fn add_bridge_endpoint(&mut self, a: u32, b: u32, v: i64) -> bool {
		let mut ret = true;
		for i in 0..self.paths.len() {
			if self.paths[i].get_branch() != a {
				continue;
			}
			if self.paths[i].get_u1() == b && self.paths[i].v1 == v {
				self.paths[i].v1 = -1;
				if self.paths[i].v2 == -1 && self.count_paths_by_color(a, b, self.paths[i].get_u2()) > 1 {
					ret = false;
				}
			}
			if self.paths[i].get_u2() == b && self.paths[i].v2 == v {
				self.paths[i].v2 = -1;
				if self.paths[i].v1 == -1 && self.count_paths_by_color(a, self.paths[i].get_u1(), b) > 1 {
					ret = false;
				}
			}
		}
		ret
	}

	fn find_path_by_endpoint(&self, a: u32, b: u32, c: u32, v: i64) -> Option<usize> {
		let color = params2color(a, b, c);
		self.paths.iter().position(|p| p.color == color && (p.v1 == v || p.v2 == v))
	}

	fn try_merge_paths(&mut self, a: u32, b: u32, c: u32, u: i64, v: i64, id: u32, solid: bool) -> bool {
		let mut iu = match self.find_path_by_endpoint(a, b, c, u) {
			Some(i) => i,
			None => return false,
		};
		let mut iv = match self.find_path_by_endpoint(a, b, c, v) {
			Some(i) => i,
			None => return false,
		};
		if iu == iv {
			return false;
		}
		if self.paths[iu].v1 == u && self.paths[iv].v1 == v {
			return false;
		}
		if self.paths[iu].v2 == u && self.paths[iv].v2 == v {
			return false;
		}
		let (mut u, mut v) = (u, v);
		if self.paths[iu].v1 == u {
			std::mem::swap(&mut iu, &mut iv);
			std::mem::swap(&mut u, &mut v);
		}
		debug_assert_eq!(self.paths[iu].v2, u);
		debug_assert_eq!(self.paths[iv].v1, v);
		if self.paths[iu].v1 == -1 && self.paths[iv].v2 == -1 && self.count_paths_by_color(a, b, c) > 2 {
			return false;
		}
		self.paths[iu].v2 = self.paths[iv].v2;
		self.paths[iu].solid = self.paths[iu].solid || solid || self.paths[iv].solid;
		self.paths.remove(iv);
		self.paths.sort();
		if solid {
			self.solid_edges.insert(id);
		}
		true
	}

	fn find_finished_path(&self, a: u32, b: u32, c: u32) -> Option<usize> {
		let color = params2color(a, b, c);
		self.paths.iter().position(|p| p.color == color && p.v1 == -1 && p.v2 == -1)
	}

	fn is_path_finished(&self, a: u32, b: u32, c: u32) -> bool {
		self.find_finished_path(a, b, c).is_some()
	}

	/// For every triangle of branches `{a, b, c}`, if all three connecting
	/// paths are finished, at least one of the three paths or the three
	/// bridge edges between them must be solid (main-strand-realized).
	fn check_triangles(&self, a: u32) -> bool {
		for b in 0..5u32 {
			if a == b {
				continue;
			}
			for c in (b + 1)..6u32 {
				if a == c {
					continue;
				}
				let (ia, ib, ic) = (self.find_finished_path(a, b, c), self.find_finished_path(b, c, a), self.find_finished_path(c, a, b));
				if let (Some(ia), Some(ib), Some(ic)) = (ia, ib, ic) {
					let any_solid = self.paths[ia].solid
						|| self.paths[ib].solid
						|| self.paths[ic].solid
						|| self.get_bridge_edge(a as usize, b as usize).solid
						|| self.get_bridge_edge(b as usize, c as usize).solid
						|| self.get_bridge_edge(c as usize, a as usize).solid;
					if !any_solid {
						return false;
					}
				}
			}
		}
		true
	}
}

#[derive(Clone, Debug)]
struct KeyedPk(PartialK6);

impl PartialEq for KeyedPk {
	fn eq(&self, other: &Self) -> bool {
		self.0.key() == other.0.key()
	}
}
impl Eq for KeyedPk {}
impl PartialOrd for KeyedPk {
	fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
		Some(self.cmp(other))
	}
}
impl Ord for KeyedPk {
	fn cmp(&self, other: &Self) -> std::cmp::Ordering {
		self.0.key().cmp(&other.0.key())
	}
}

pub struct K6Finder<'a> {
	graph: &'a Graph,
	state: BTreeSet<KeyedPk>,
	bag: PathDecompBag,
	pub found: Vec<Minor>,
}

impl<'a> K6Finder<'a> {
	pub fn new(graph: &'a Graph) -> Self {
		Self { graph, state: BTreeSet::new(), bag: PathDecompBag::new(), found: Vec::new() }
	}

	fn insert_pk(&mut self, pk: PartialK6, frontier_limit: usize) -> Result<()> {
		let keyed = KeyedPk(pk);
		if let Some(existing) = self.state.get(&keyed) {
			if keyed.0.is_better(&existing.0) {
				self.state.replace(keyed);
			}
		} else {
			self.state.insert(keyed);
		}
		if self.state.len() > frontier_limit {
			return Err(EngineError::FrontierExhausted { limit: frontier_limit });
		}
		Ok(())
	}

	fn dump_state(&mut self) -> Vec<PartialK6> {
		std::mem::take(&mut self.state).into_iter().map(|k| k.0).collect()
	}

	fn parse_introduce_node(&mut self, name: &str, frontier_limit: usize) -> Result<()> {
		let node_id = self.graph.names.id_of(name).ok_or_else(|| EngineError::Internal(format!("unknown node {}", name)))?;
		let old = self.dump_state();
		for old_pk in old {
			let mut pk = old_pk.clone();
			pk.bag2branch.push(-1);
			self.insert_pk(pk.clone(), frontier_limit)?;
			pk.bag2branch.pop();

			let v = pk.bag2branch.len() as i64;
			let offset = pk.total_score - pk.paths.len() as i64;
			for a in 0..6u32 {
				if pk.forgotten[a as usize] {
					continue;
				}
				pk.bag2branch.push(a as i64);
				pk.branch_sets[a as usize].push(node_id);

				// Every subset of not-yet-finished {b,c} pairs through `a`
				// may or may not start a fresh path ending at the new vertex.
				let mut alternatives: Vec<Vec<BranchPath>> = vec![Vec::new()];
				for b in 0..5u32 {
					if b == a {
						continue;
					}
					for c in (b + 1)..6u32 {
						if c == a {
							continue;
						}
						if !pk.is_path_finished(a, b, c) {
							let mut next = Vec::with_capacity(alternatives.len() * 2);
							for base in &alternatives {
								next.push(base.clone());
								let mut with_new = base.clone();
								with_new.push(BranchPath::new(a, b, c, v, v, false));
								next.push(with_new);
							}
							alternatives = next;
						}
					}
				}

				for alt in alternatives {
					let mut candidate = pk.clone();
					candidate.paths = alt;
					candidate.paths.sort();
					candidate.total_score = candidate.paths.len() as i64 + offset;
					self.insert_pk(candidate, frontier_limit)?;
				}

				pk.bag2branch.pop();
				pk.branch_sets[a as usize].pop();
			}
		}
		Ok(())
	}

	fn parse_forget_node(&mut self, name: &str, frontier_limit: usize) -> Result<()> {
		let bag_id = self.bag.find(name).ok_or_else(|| EngineError::Internal(format!("forget of absent bag name {}", name)))?;
		let old = self.dump_state();
		for old_pk in old {
			let mut pk = old_pk.clone();
			let bid = pk.bag2branch[bag_id];
			pk.bag2branch.remove(bag_id);
			if bid == -1 {
				self.insert_pk(pk, frontier_limit)?;
				continue;
			}
			let bid = bid as usize;
			let bag_id_i = bag_id as i64;

			// (1) the forgotten vertex is not a dangling path endpoint.
			if pk.paths.iter().any(|p| p.v1 == bag_id_i || p.v2 == bag_id_i) {
				continue;
			}

			// (2) if it is a bridge endpoint, every other branch must already
			// be reachable from it via bridges/paths through this branch.
			let mut ok = true;
			for u in 0..6usize {
				if u != bid && pk.bridge_endpoints[u] == bag_id_i {
					let mut mask: u32 = (1 << bid) | (1 << u);
					for p in &pk.paths {
						if p.get_branch() as usize == bid && (p.get_u1() as usize == u || p.get_u2() as usize == u) {
							let other = if p.get_u1() as usize == u { p.get_u2() } else { p.get_u1() };
							mask |= 1 << other;
						}
					}
					if mask < (1 << 6) - 1 {
						ok = false;
						break;
					}
				}
			}
			if !ok {
				continue;
			}

			// (3) if this was the branch's last bag vertex, it is fully
			// forgotten: every one of its 10 internal paths must be complete.
			let branch_still_in_bag = pk.bag2branch.iter().any(|&a| a as usize == bid);
			if !branch_still_in_bag {
				pk.forgotten[bid] = true;
				let cnt = pk.paths.iter().filter(|p| p.get_branch() as usize == bid).count();
				debug_assert!(cnt <= 10);
				if cnt < 10 {
					continue;
				}
				// (4) every triangle touching this branch needs a solid edge.
				if !pk.check_triangles(bid as u32) {
					continue;
				}
				// (5) if every branch is now forgotten, this is a witness.
				if pk.forgotten.iter().all(|&f| f) {
					let mut edges = Vec::with_capacity(15);
					for a in 0..5usize {
						for b in (a + 1)..6usize {
							let be = pk.get_bridge_edge(a, b);
							let id = be.id.ok_or_else(|| EngineError::Internal(format!("branch pair ({}, {}) never bridged", a, b)))?;
							edges.push(MinorEdge::new(id, a as u32, b as u32, be.solid));
						}
					}
					self.found.push(Minor {
						branches: pk.branch_sets.to_vec(),
						edges,
						arcs_edges: pk.solid_edges.len() as u32,
						arcs_in_branches: 0,
					});
					continue;
				}
			}

			for u in 0..6usize {
				if pk.bridge_endpoints[u] == bag_id_i {
					pk.bridge_endpoints[u] = -1;
				} else if pk.bridge_endpoints[u] > bag_id_i {
					pk.bridge_endpoints[u] -= 1;
				}
			}
			self.insert_pk(pk, frontier_limit)?;
		}
		Ok(())
	}

	fn parse_introduce_edge(&mut self, u_in_bag: usize, v_in_bag: usize, edge_id: u32, frontier_limit: usize) -> Result<()> {
		let solid = self.graph.solid(edge_id);
		let old = self.dump_state();
		for old_pk in old {
			let br_u = old_pk.bag2branch[u_in_bag];
			let br_v = old_pk.bag2branch[v_in_bag];
			if br_u == -1 || br_v == -1 || br_u != br_v {
				self.insert_pk(old_pk.clone(), frontier_limit)?;
			}
			if br_u == -1 || br_v == -1 {
				continue;
			}
			let (br_u, br_v) = (br_u as u32, br_v as u32);

			if br_u != br_v && old_pk.get_bridge_edge(br_u as usize, br_v as usize).id.is_none() {
				let mut pk = old_pk.clone();
				pk.set_bridge_edge(br_u as usize, br_v as usize, edge_id, solid);
				// `||` short-circuits in the source: the br_v-side endpoint
				// resolution (which mutates `paths`) only runs when the
				// br_u-side call didn't already succeed.
				let ok = if pk.add_bridge_endpoint(br_u, br_v, u_in_bag as i64) { true } else { pk.add_bridge_endpoint(br_v, br_u, v_in_bag as i64) };
				if ok {
					pk.paths.sort();
					self.insert_pk(pk, frontier_limit)?;
				}
			}

			if br_u == br_v {
				let mut alternatives = vec![old_pk.clone()];
				for b in 0..5u32 {
					if b == br_u {
						continue;
					}
					for c in (b + 1)..6u32 {
						if c == br_u {
							continue;
						}
						let mut next = Vec::with_capacity(alternatives.len() * 2);
						for pk in &alternatives {
							next.push(pk.clone());
							let mut merged = pk.clone();
							if merged.try_merge_paths(br_u, b, c, u_in_bag as i64, v_in_bag as i64, edge_id, solid) {
								next.push(merged);
							}
						}
						alternatives = next;
					}
				}
				for pk in alternatives {
					self.insert_pk(pk, frontier_limit)?;
				}
			}
		}
		Ok(())
	}

	pub fn run(&mut self, pd: &PathDecomp, frontier_limit: usize) -> Result<()> {
		self.insert_pk(PartialK6::default(), frontier_limit)?;
		for node in &pd.nodes {
			match node {
				PathDecompNode::IntroduceNode(name) => {
					self.bag.step(node);
					self.parse_introduce_node(name, frontier_limit)?;
				}
				PathDecompNode::IntroduceEdge { u_in_bag, v_in_bag, p, q } => {
					let u_name = self.bag.get(*u_in_bag).to_string();
					let v_name = self.bag.get(*v_in_bag).to_string();
					let u_id = self.graph.names.id_of(&u_name).ok_or_else(|| EngineError::Internal(format!("unknown bag name {}", u_name)))?;
					let v_id = self.graph.names.id_of(&v_name).ok_or_else(|| EngineError::Internal(format!("unknown bag name {}", v_name)))?;
					let edge_id = self
						.graph
						.find_edge(u_id, v_id, *p, *q)
						.ok_or_else(|| EngineError::Internal(format!("no graph edge matches introduce_edge({}, {}, {}, {})", u_name, v_name, p, q)))?;
					self.parse_introduce_edge(*u_in_bag, *v_in_bag, edge_id, frontier_limit)?;
					self.bag.step(node);
				}
				PathDecompNode::ForgetNode(name) => {
					self.parse_forget_node(name, frontier_limit)?;
					self.bag.step(node);
				}
			}
		}
		Ok(())
	}
}

/// Runs the K6-engine over `g`/`pd`, returning every K_6 minor witness.
pub fn solve(g: &Graph, pd: &PathDecomp, frontier_limit: usize) -> Result<Vec<Minor>> {
	let mut finder = K6Finder::new(g);
	finder.run(pd, frontier_limit)?;
	Ok(finder.found)
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn bridge_edge_index_is_symmetric_and_in_range() {
		assert_eq!(bridge_edge_index(0, 1), bridge_edge_index(1, 0));
		for a in 0..6 {
			for b in (a + 1)..6 {
				assert!(bridge_edge_index(a, b) < 15);
			}
		}
	}

	#[test]
	fn color_round_trips_branch_and_endpoints() {
		let c = params2color(5, 1, 3);
		assert_eq!(color2branch(c), 5);
		assert_eq!(color2u1(c), 1);
		assert_eq!(color2u2(c), 3);
		// order of u1/u2 does not matter - color always stores them sorted.
		assert_eq!(params2color(5, 3, 1), c);
	}

	#[test]
	fn no_input_no_witness() {
		let g = Graph::new();
		let pd = PathDecomp::new();
		let found = solve(&g, &pd, 10_000).unwrap();
		assert!(found.is_empty());
	}

	#[test]
	fn check_triangles_requires_a_solid_witness() {
		let mut pk = PartialK6::default();
		pk.paths.push(BranchPath::new(0, 1, 2, -1, -1, false));
		pk.paths.push(BranchPath::new(1, 2, 0, -1, -1, false));
		pk.paths.push(BranchPath::new(2, 0, 1, -1, -1, false));
		assert!(!pk.check_triangles(0));
		pk.paths[0].solid = true;
		assert!(pk.check_triangles(0));
	}
}
