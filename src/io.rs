//! Plain-text ingest/egress: graph files, path-decomposition files, and
//! MINOR record output. Ported from `graph.h`'s `read_parsed_txt` and
//! `pathdecomp.h`'s `PathDecomp::read`, plus the `print_minor` formats of
//! `minorfinder.cpp`/`k6finder.h`/`find-k6-linear.cpp`.
//!
//! This is the only module in the crate that touches a filesystem path;
//! the engines themselves operate purely on the in-memory [`Graph`] and
//! [`PathDecomp`] these functions build.

use std::fmt::Write as _;
use std::io::{BufRead, Write};

use itertools::Itertools;

use crate::engine::linear::LState;
use crate::error::{EngineError, Result};
use crate::graph::{Graph, Minor};
use crate::pathdecomp::{PathDecomp, PathDecompNode};

/// Reads a `NODE`/`EDGE` graph file. `NODE` lines must precede any `EDGE`
/// line referencing that name; this is enforced, not merely assumed.
pub fn read_graph(source_name: &str, r: impl BufRead) -> Result<Graph> {
	let mut g = Graph::new();
	for (lineno, line) in r.lines().enumerate() {
		let line = line.map_err(|e| EngineError::parse(source_name, lineno + 1, e))?;
		let tokens: Vec<&str> = line.split_whitespace().collect();
		if tokens.is_empty() {
			continue;
		}
		match tokens[0] {
			"NODE" => {
				let name = tokens.get(1).ok_or_else(|| EngineError::parse(source_name, lineno + 1, "NODE missing <name>"))?;
				g.intern_node(name);
			}
			"EDGE" => {
				if tokens.len() != 5 {
					return Err(EngineError::parse(source_name, lineno + 1, "EDGE needs <u> <v> <p> <q>"));
				}
				let u = tokens[1];
				let v = tokens[2];
				if g.names.id_of(u).is_none() {
					return Err(EngineError::parse(source_name, lineno + 1, format!("EDGE references undeclared node {}", u)));
				}
				if g.names.id_of(v).is_none() {
					return Err(EngineError::parse(source_name, lineno + 1, format!("EDGE references undeclared node {}", v)));
				}
				let p = parse_int(source_name, lineno + 1, tokens[3])?;
				let q = parse_int(source_name, lineno + 1, tokens[4])?;
				g.add_edge(u, v, p, q);
			}
			other => return Err(EngineError::parse(source_name, lineno + 1, format!("unexpected token {}", other))),
		}
	}
	Ok(g)
}

/// Reads an `INTRODUCE_NODE`/`INTRODUCE_EDGE`/`FORGET_NODE` decomposition
/// file. `u`/`v` on `INTRODUCE_EDGE` lines are bag positions, validated
/// against a live replay as the file is read.
pub fn read_path_decomp(source_name: &str, r: impl BufRead) -> Result<PathDecomp> {
	let mut pd = PathDecomp::new();
	let mut bag = crate::pathdecomp::PathDecompBag::new();
	for (lineno, line) in r.lines().enumerate() {
		let line = line.map_err(|e| EngineError::parse(source_name, lineno + 1, e))?;
		let tokens: Vec<&str> = line.split_whitespace().collect();
		if tokens.is_empty() {
			continue;
		}
		let node = match tokens[0] {
			"INTRODUCE_NODE" => {
				let name = tokens.get(1).ok_or_else(|| EngineError::parse(source_name, lineno + 1, "INTRODUCE_NODE missing <name>"))?;
				PathDecompNode::IntroduceNode((*name).to_string())
			}
			"INTRODUCE_EDGE" => {
				if tokens.len() != 5 {
					return Err(EngineError::parse(source_name, lineno + 1, "INTRODUCE_EDGE needs <u> <v> <p> <q>"));
				}
				let u_in_bag = parse_usize(source_name, lineno + 1, tokens[1])?;
				let v_in_bag = parse_usize(source_name, lineno + 1, tokens[2])?;
				if u_in_bag >= bag.len() || v_in_bag >= bag.len() {
					return Err(EngineError::parse(source_name, lineno + 1, "INTRODUCE_EDGE position outside current bag"));
				}
				let p = parse_int(source_name, lineno + 1, tokens[3])?;
				let q = parse_int(source_name, lineno + 1, tokens[4])?;
				PathDecompNode::IntroduceEdge { u_in_bag, v_in_bag, p, q }
			}
			"FORGET_NODE" => {
				let name = tokens.get(1).ok_or_else(|| EngineError::parse(source_name, lineno + 1, "FORGET_NODE missing <name>"))?;
				if bag.find(name).is_none() {
					return Err(EngineError::parse(source_name, lineno + 1, format!("FORGET_NODE of absent name {}", name)));
				}
				PathDecompNode::ForgetNode((*name).to_string())
			}
			other => return Err(EngineError::parse(source_name, lineno + 1, format!("unexpected token {}", other))),
		};
		bag.step(&node);
		pd.nodes.push(node);
	}
	if !bag.is_empty() {
		return Err(EngineError::parse(source_name, pd.nodes.len(), "bag is non-empty at end of decomposition stream"));
	}
	Ok(pd)
}

fn parse_int(source_name: &str, line: usize, s: &str) -> Result<i64> {
	s.parse().map_err(|_| EngineError::parse(source_name, line, format!("expected integer, got {}", s)))
}

fn parse_usize(source_name: &str, line: usize, s: &str) -> Result<usize> {
	s.parse().map_err(|_| EngineError::parse(source_name, line, format!("expected non-negative integer, got {}", s)))
}

/// Writes one `MINOR { endpoints=[...] edges=[...] }` block per linear minor.
pub fn write_linear_minors(mut w: impl Write, g: &Graph, minors: &[LState]) -> std::io::Result<()> {
	for m in minors {
		let mut out = String::from("MINOR { endpoints=[");
		let mut prev = 0u32;
		for (i, &last) in m.last_vertices.iter().enumerate() {
			write!(out, " segment={} start=(id={}) end=(id={})", i, g.names.lookup(prev), g.names.lookup(last)).unwrap();
			prev = last + 1;
		}
		out.push_str(" ] edges=[");
		for &eid in &m.chosen_edges {
			let e = g.edge(eid);
			let seg_i = m.vertex2segment(e.first());
			let seg_j = m.vertex2segment(e.second());
			write!(
				out,
				" from {} to {}, eid={}, left=(id={}), right=(id={})",
				seg_i,
				seg_j,
				eid,
				g.names.lookup(e.first()),
				g.names.lookup(e.second())
			)
			.unwrap();
		}
		out.push_str(" ] }");
		writeln!(w, "{}", out)?;
	}
	Ok(())
}

/// Writes one summary line per minor: `jump_edges=A+B`, `max_branch_set`,
/// `sum_branch_sets`, `edge(...)`, `branch(...)`. Shared by the P- and
/// K6-engines, which both produce [`Minor`] values.
pub fn write_minors(mut w: impl Write, g: &Graph, minors: &[Minor]) -> std::io::Result<()> {
	for m in minors {
		let mut out = format!(
			"MINOR (jump_edges={}+{}, max_branch_set={}, sum_branch_sets={}):",
			m.arcs_edges,
			m.arcs_in_branches,
			m.max_branch_set(),
			m.sum_branch_sets()
		);
		for me in &m.edges {
			let e = g.edge(me.edge_id());
			write!(out, " edge({} {})={}=({} {})", me.br_u, me.br_v, me.edge_id(), g.names.lookup(e.first()), g.names.lookup(e.second())).unwrap();
		}
		for branch in &m.branches {
			write!(out, " branch({})", branch.iter().map(|&id| g.names.lookup(id)).join(" ")).unwrap();
		}
		writeln!(w, "{}", out)?;
	}
	Ok(())
}

#[cfg(test)]
mod test {
	use super::*;
	use std::io::Cursor;

	#[test]
	fn reads_simple_graph() {
		let src = "NODE a\nNODE b\nEDGE a b 2 1\n";
		let g = read_graph("t.graph", Cursor::new(src)).unwrap();
		assert_eq!(g.size(), 2);
		assert_eq!(g.edge_count(), 1);
	}

	#[test]
	fn rejects_edge_before_node() {
		let src = "NODE a\nEDGE a b 1 1\n";
		assert!(read_graph("t.graph", Cursor::new(src)).is_err());
	}

	#[test]
	fn rejects_nonempty_final_bag() {
		let src = "INTRODUCE_NODE a\n";
		assert!(read_path_decomp("t.pd", Cursor::new(src)).is_err());
	}

	#[test]
	fn reads_small_decomp() {
		let src = "INTRODUCE_NODE a\nINTRODUCE_NODE b\nINTRODUCE_EDGE 0 1 1 1\nFORGET_NODE a\nFORGET_NODE b\n";
		let pd = read_path_decomp("t.pd", Cursor::new(src)).unwrap();
		assert_eq!(pd.nodes.len(), 5);
		assert_eq!(pd.width(), 2);
	}
}
