//! Bijection between external node names and dense integer ids.
//!
//! Ported from `namesdict.h`'s `NamesDict`, backed by an [`indexmap::IndexMap`]
//! the way the teacher crate favors `indexmap` for any insertion-ordered
//! string-keyed lookup (`plow.rs`'s `merge_snow_statuses`, `gj.rs`'s `Nodes`).
//! No deletion; amortized O(1) insert and lookup.

use indexmap::IndexMap;

#[derive(Clone, Debug, Default)]
pub struct NamesDict {
	by_name: IndexMap<String, u32>,
	names: Vec<String>,
}

impl NamesDict {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the existing id for `name`, or interns it as a new one.
	pub fn intern(&mut self, name: &str) -> u32 {
		if let Some(&id) = self.by_name.get(name) {
			return id;
		}
		let id = self.names.len() as u32;
		self.by_name.insert(name.to_string(), id);
		self.names.push(name.to_string());
		id
	}

	pub fn lookup(&self, id: u32) -> &str {
		&self.names[id as usize]
	}

	pub fn id_of(&self, name: &str) -> Option<u32> {
		self.by_name.get(name).copied()
	}

	pub fn size(&self) -> usize {
		self.names.len()
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn intern_is_idempotent() {
		let mut d = NamesDict::new();
		let a = d.intern("alpha");
		let b = d.intern("beta");
		let a2 = d.intern("alpha");
		assert_eq!(a, a2);
		assert_ne!(a, b);
		assert_eq!(d.lookup(a), "alpha");
		assert_eq!(d.lookup(b), "beta");
		assert_eq!(d.size(), 2);
	}

	#[test]
	fn id_of_unknown_is_none() {
		let d = NamesDict::new();
		assert_eq!(d.id_of("nope"), None);
	}
}
