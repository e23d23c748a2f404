//! Generic minor finder over a path decomposition (P-engine).
//!
//! Ported from `minorfinder.h`/`minorfinder.cpp`'s `PartialMinor` /
//! `MinorFinder`. Tracks, per bag position, which branch (if any) of the
//! partial minor currently occupies it, plus the minor-edges already
//! realized between branches.

use std::collections::BTreeSet;

use crate::error::{EngineError, Result};
use crate::fau::Fau;
use crate::graph::{Graph, Minor, MinorEdge};
use crate::pathdecomp::{PathDecomp, PathDecompBag, PathDecompNode};

/// A partial minor: `bag2branch[i]` is the branch index occupying bag
/// position `i`, or `-1` if that bag slot hasn't been claimed by any branch.
#[derive(Clone, Debug, Default)]
pub struct PartialMinor {
	pub n: usize,
	pub arcs_edges: u32,
	pub arcs_in_branches: u32,
	pub bag2branch: Vec<i64>,
	pub graph: Vec<MinorEdge>,
	pub branches: Vec<Vec<u32>>,
}

impl PartialMinor {
	fn jump_edges(&self) -> u32 {
		self.arcs_edges + self.arcs_in_branches
	}

	fn sum_branch_sets(&self) -> usize {
		self.branches.iter().map(Vec::len).sum()
	}

	fn max_branch_set(&self) -> usize {
		self.branches.iter().map(Vec::len).max().unwrap_or(0)
	}

	/// Tie-break preference between two partial minors that collide on key:
	/// fewer jump edges wins, then smaller max branch set, then smaller sum.
	fn is_better(&self, other: &Self) -> bool {
		if self.jump_edges() != other.jump_edges() {
			return self.jump_edges() < other.jump_edges();
		}
		if self.max_branch_set() != other.max_branch_set() {
			return self.max_branch_set() < other.max_branch_set();
		}
		if self.sum_branch_sets() != other.sum_branch_sets() {
			return self.sum_branch_sets() < other.sum_branch_sets();
		}
		false
	}

	/// Dedup/ordering key: structural identity only, matching
	/// `PartialMinor::operator<` (`n`, `bag2branch`, `graph`).
	fn key(&self) -> (usize, Vec<i64>, Vec<MinorEdge>) {
		(self.n, self.bag2branch.clone(), self.graph.clone())
	}

	fn get_cost(&self) -> usize {
		self.graph.len()
	}

	fn get_n(&self) -> usize {
		let m = self.bag2branch.iter().copied().max().unwrap_or(-1);
		self.n - (m + 1) as usize
	}

	fn has_edge(&self, u: u32, v: u32) -> bool {
		self.graph.iter().any(|me| (me.br_u == u && me.br_v == v) || (me.br_u == v && me.br_v == u))
	}

	fn add_edge(&mut self, u: u32, v: u32, edge_id: u32) {
		let (u, v) = if u <= v { (u, v) } else { (v, u) };
		let me = MinorEdge::new(edge_id, u, v, false);
		let pos = self.graph.partition_point(|x| *x <= me);
		self.graph.insert(pos, me);
	}

	/// Renumbers branches so that every branch still present in the bag gets
	/// the lowest indices, in bag order; forgotten branches follow.
	fn remap_to_bag(&mut self) {
		let mut perm = vec![usize::MAX; self.n];
		let mut cnt = 0usize;
		for &bid in &self.bag2branch {
			if bid >= 0 && perm[bid as usize] == usize::MAX {
				perm[bid as usize] = cnt;
				cnt += 1;
			}
		}
		for p in perm.iter_mut() {
			if *p == usize::MAX {
				*p = cnt;
				cnt += 1;
			}
		}
		self.remap(&perm);
	}

	fn remap(&mut self, perm: &[usize]) {
		for bid in self.bag2branch.iter_mut() {
			if *bid >= 0 {
				*bid = perm[*bid as usize] as i64;
			}
		}
		for e in self.graph.iter_mut() {
			let (mut u, mut v) = (perm[e.br_u as usize] as u32, perm[e.br_v as usize] as u32);
			if u > v {
				std::mem::swap(&mut u, &mut v);
			}
			e.br_u = u;
			e.br_v = v;
		}
		self.graph.sort();
		let mut branches_copy = vec![Vec::new(); self.n];
		for (i, b) in self.branches.iter_mut().enumerate() {
			std::mem::swap(b, &mut branches_copy[i]);
		}
		for (i, p) in perm.iter().enumerate() {
			std::mem::swap(&mut self.branches[*p], &mut branches_copy[i]);
		}
	}

	fn is_connected_to_bag(&self) -> bool {
		let mut fau = Fau::make(self.n);
		for me in &self.graph {
			fau.join(me.br_u as usize, me.br_v as usize);
		}
		let mut bag_intersection = vec![false; self.n];
		for &x in &self.bag2branch {
			if x >= 0 {
				bag_intersection[fau.find(x as usize)] = true;
			}
		}
		(0..self.n).all(|i| bag_intersection[fau.find(i)])
	}

	fn contains_bag_vertices(&self) -> bool {
		self.bag2branch.iter().any(|&b| b != -1)
	}
}

/// Tunable acceptance window the sweep enforces at every `ForgetNode`.
#[derive(Clone, Copy, Debug)]
pub struct Params {
	pub max_cost: usize,
	pub max_n: usize,
	pub min_n: usize,
	pub max_nonedges: usize,
	pub min_deg: usize,
}

pub struct PMinorFinder<'a> {
	params: Params,
	graph: &'a Graph,
	state: BTreeSet<KeyedPm>,
	bag: PathDecompBag,
	pub found: Vec<Minor>,
}

/// Wraps [`PartialMinor`] so `BTreeSet` orders/dedups purely on its
/// structural key, while `is_better` still sees the full value.
#[derive(Clone, Debug)]
struct KeyedPm(PartialMinor);

impl PartialEq for KeyedPm {
	fn eq(&self, other: &Self) -> bool {
		self.0.key() == other.0.key()
	}
}
impl Eq for KeyedPm {}
impl PartialOrd for KeyedPm {
	fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
		Some(self.cmp(other))
	}
}
impl Ord for KeyedPm {
	fn cmp(&self, other: &Self) -> std::cmp::Ordering {
		self.0.key().cmp(&other.0.key())
	}
}

impl<'a> PMinorFinder<'a> {
	pub fn new(graph: &'a Graph, params: Params) -> Self {
		Self { params, graph, state: BTreeSet::new(), bag: PathDecompBag::new(), found: Vec::new() }
	}

	fn insert_pm(&mut self, pm: PartialMinor, frontier_limit: usize) -> Result<()> {
		let keyed = KeyedPm(pm);
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

	fn dump_state(&mut self) -> Vec<PartialMinor> {
		std::mem::take(&mut self.state).into_iter().map(|k| k.0).collect()
	}

	fn parse_introduce_node(&mut self, name: &str, frontier_limit: usize) -> Result<()> {
		let node_id = self.graph.names.id_of(name).ok_or_else(|| EngineError::Internal(format!("unknown node {}", name)))?;
		let old = self.dump_state();
		for old_pm in old {
			let mut pm = old_pm.clone();
			pm.bag2branch.push(-1);
			self.insert_pm(pm.clone(), frontier_limit)?;
			pm.bag2branch.pop();

			pm.bag2branch.push(pm.n as i64);
			pm.n += 1;
			pm.branches.push(vec![node_id]);
			pm.remap_to_bag();
			self.insert_pm(pm, frontier_limit)?;
		}
		Ok(())
	}

	fn parse_forget_node(&mut self, name: &str, frontier_limit: usize) -> Result<()> {
		let bag_id = self.bag.find(name).ok_or_else(|| EngineError::Internal(format!("forget of absent bag name {}", name)))?;
		let old = self.dump_state();
		for old_pm in old {
			let mut pm = old_pm.clone();
			let bid = pm.bag2branch[bag_id];
			pm.bag2branch.remove(bag_id);

			let bid_present_in_bag = pm.bag2branch.contains(&bid);

			let mut bid_degree = 0usize;
			if !bid_present_in_bag && self.params.min_deg > 0 {
				for me in &pm.graph {
					if me.br_u as i64 == bid || me.br_v as i64 == bid {
						bid_degree += 1;
					}
				}
			}

			pm.remap_to_bag();
			let n = pm.get_n();

			let mut forgotten_edges = 0usize;
			let mut half_forgotten_edges = 0usize;
			if !bid_present_in_bag {
				let forgotten_from = pm.n - n;
				for me in &pm.graph {
					let u_forgotten = me.br_u as usize >= forgotten_from;
					let v_forgotten = me.br_v as usize >= forgotten_from;
					if u_forgotten && v_forgotten {
						forgotten_edges += 1;
					} else if u_forgotten || v_forgotten {
						half_forgotten_edges += 1;
					}
				}
			}
			let sure_nonedges = (n * n.saturating_sub(1) / 2).saturating_sub(forgotten_edges)
				+ (n * self.params.min_n.saturating_sub(n)).saturating_sub(half_forgotten_edges).max(0);

			if n <= self.params.max_n && (bid_present_in_bag || (bid_degree >= self.params.min_deg && sure_nonedges <= self.params.max_nonedges)) {
				if pm.is_connected_to_bag() {
					if n < self.params.max_n {
						self.insert_pm(pm, frontier_limit)?;
					}
				} else if !pm.contains_bag_vertices() && n >= self.params.min_n {
					self.found.push(Minor {
						branches: pm.branches.clone(),
						edges: pm.graph.clone(),
						arcs_edges: pm.arcs_edges,
						arcs_in_branches: pm.arcs_in_branches,
					});
				}
			}
		}
		Ok(())
	}

	fn parse_introduce_edge(&mut self, u_in_bag: usize, v_in_bag: usize, edge_id: u32, frontier_limit: usize) -> Result<()> {
		let old = self.dump_state();
		for old_pm in old {
			self.insert_pm(old_pm.clone(), frontier_limit)?;

			let bu = old_pm.bag2branch[u_in_bag];
			let bv = old_pm.bag2branch[v_in_bag];
			if bu == -1 || bv == -1 || bu == bv {
				continue;
			}
			let (mut br_u, mut br_v) = (bu as u32, bv as u32);
			if br_u > br_v {
				std::mem::swap(&mut br_u, &mut br_v);
			}
			if old_pm.has_edge(br_u, br_v) {
				continue;
			}

			// Connect branches via a minor-edge without merging them.
			let mut pm = old_pm.clone();
			pm.add_edge(br_u, br_v, edge_id);
			if !self.graph.solid(edge_id) {
				pm.arcs_edges += 1;
			}
			if pm.get_cost() <= self.params.max_cost {
				self.insert_pm(pm, frontier_limit)?;
			}

			// Merge branches via the edge.
			let mut pm = old_pm;
			for x in pm.bag2branch.iter_mut() {
				if *x == br_v as i64 {
					*x = br_u as i64;
				} else if *x > br_v as i64 {
					*x -= 1;
				}
			}
			for e in pm.graph.iter_mut() {
				if e.br_u == br_v {
					e.br_u = br_u;
				} else if e.br_u > br_v {
					e.br_u -= 1;
				}
				if e.br_v == br_v {
					e.br_v = br_u;
				} else if e.br_v > br_v {
					e.br_v -= 1;
				}
				if e.br_u > e.br_v {
					std::mem::swap(&mut e.br_u, &mut e.br_v);
				}
			}
			pm.graph.sort();
			let repeated_edge = pm.graph.windows(2).any(|w| w[0].br_u == w[1].br_u && w[0].br_v == w[1].br_v);
			if !repeated_edge {
				let moved = std::mem::take(&mut pm.branches[br_v as usize]);
				pm.branches[br_u as usize].extend(moved);
				pm.branches.remove(br_v as usize);
				pm.n -= 1;
				pm.remap_to_bag();
				if !self.graph.solid(edge_id) {
					pm.arcs_in_branches += 1;
				}
				if pm.get_cost() <= self.params.max_cost {
					self.insert_pm(pm, frontier_limit)?;
				}
			}
		}
		Ok(())
	}

	pub fn run(&mut self, pd: &PathDecomp, frontier_limit: usize) -> Result<()> {
		self.insert_pm(PartialMinor::default(), frontier_limit)?;
		for node in &pd.nodes {
			match node {
				PathDecompNode::IntroduceNode(name) => {
					self.bag.step(node);
					self.parse_introduce_node(name, frontier_limit)?;
				}
				PathDecompNode::IntroduceEdge { u_in_bag, v_in_bag, p, q } => {
					let u_name = self.bag.get(*u_in_bag);
					let v_name = self.bag.get(*v_in_bag);
					let u_id = self.graph.names.id_of(u_name).ok_or_else(|| EngineError::Internal(format!("unknown bag name {}", u_name)))?;
					let v_id = self.graph.names.id_of(v_name).ok_or_else(|| EngineError::Internal(format!("unknown bag name {}", v_name)))?;
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

/// Runs the P-engine over `g`/`pd`, returning every generic minor model
/// satisfying `params`.
pub fn solve(g: &Graph, pd: &PathDecomp, params: Params, frontier_limit: usize) -> Result<Vec<Minor>> {
	let mut finder = PMinorFinder::new(g, params);
	finder.run(pd, frontier_limit)?;
	Ok(finder.found)
}

#[cfg(test)]
mod test {
	use super::*;

	fn two_node_decomp() -> (Graph, PathDecomp) {
		let mut g = Graph::new();
		let eid = g.add_edge("a", "b", 1, 1);
		let pd = PathDecomp {
			nodes: vec![
				PathDecompNode::IntroduceNode("a".into()),
				PathDecompNode::IntroduceNode("b".into()),
				PathDecompNode::IntroduceEdge { u_in_bag: 0, v_in_bag: 1, p: 1, q: 1 },
				PathDecompNode::ForgetNode("a".into()),
				PathDecompNode::ForgetNode("b".into()),
			],
		};
		let _ = eid;
		(g, pd)
	}

	#[test]
	fn finds_single_edge_minor() {
		let (g, pd) = two_node_decomp();
		let params = Params { max_cost: 10, max_n: 2, min_n: 2, max_nonedges: 10, min_deg: 0 };
		let found = solve(&g, &pd, params, 10_000).unwrap();
		assert!(!found.is_empty());
		assert!(found.iter().any(|m| m.edges.len() == 1));
	}

	#[test]
	fn min_n_excludes_small_minors() {
		let (g, pd) = two_node_decomp();
		let params = Params { max_cost: 10, max_n: 2, min_n: 3, max_nonedges: 10, min_deg: 0 };
		let found = solve(&g, &pd, params, 10_000).unwrap();
		assert!(found.is_empty());
	}

	#[test]
	fn remap_to_bag_keeps_branch_sets_aligned() {
		let mut pm = PartialMinor { n: 2, bag2branch: vec![1, -1], branches: vec![vec![10], vec![20]], ..Default::default() };
		pm.remap_to_bag();
		assert_eq!(pm.bag2branch[0], 0);
		assert_eq!(pm.branches[0], vec![20]);
	}
}
