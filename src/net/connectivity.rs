use std::collections::HashMap;
use std::fmt;

/// Index of a single bit in one specialisation's connectivity universe.
pub type BitId = u32;

/// Canonical net identifier: the union-find root of a bit, in the same
/// numeric space as `BitId`. Two bits are connected iff their roots are
/// equal.
pub type NetId = u32;

/// Growable rank-balanced union-find over dense bit indices.
#[derive(Clone, Debug, Default)]
pub struct UnionFind {
	parent: Vec<BitId>,
	rank: Vec<u32>,
}

impl UnionFind {
	fn add_node(&mut self) -> BitId {
		let idx = self.parent.len() as BitId;
		self.parent.push(idx);
		self.rank.push(0);
		idx
	}

	fn ensure_size(&mut self, n: usize) {
		while self.parent.len() < n {
			self.add_node();
		}
	}

	/// Representative of `x` without path compression; usable behind a
	/// shared borrow.
	pub fn find(&self, mut x: BitId) -> BitId {
		while self.parent[x as usize] != x {
			x = self.parent[x as usize];
		}
		x
	}

	/// Representative of `x`, compressing the path on the way up.
	pub fn find_mut(&mut self, x: BitId) -> BitId {
		let parent = self.parent[x as usize];
		if parent == x {
			return x;
		}
		let root = self.find_mut(parent);
		self.parent[x as usize] = root;
		root
	}

	pub fn unite(&mut self, a: BitId, b: BitId) {
		let mut a = self.find_mut(a);
		let mut b = self.find_mut(b);
		if a == b {
			return;
		}
		if self.rank[a as usize] < self.rank[b as usize] {
			std::mem::swap(&mut a, &mut b);
		}
		self.parent[b as usize] = a;
		if self.rank[a as usize] == self.rank[b as usize] {
			self.rank[a as usize] += 1;
		}
	}
}

/// Bit-level connectivity of one module specialisation: a union-find with
/// contiguous range allocation.
#[derive(Clone, Debug, Default)]
pub struct Connectivity {
	uf: UnionFind,
	next_id: BitId,
}

impl Connectivity {
	pub fn new() -> Connectivity {
		Connectivity::default()
	}

	/// Allocates `width` fresh singleton bits and returns the base index of
	/// the contiguous range.
	pub fn alloc_range(&mut self, width: u32) -> BitId {
		let base = self.next_id;
		self.uf.ensure_size((base + width) as usize);
		self.next_id += width;
		base
	}

	/// Number of allocated bits.
	pub fn size(&self) -> u32 {
		self.next_id
	}

	/// Connects two bits. A no-op when either index was never allocated.
	pub fn unite(&mut self, a: BitId, b: BitId) {
		if a >= self.next_id || b >= self.next_id {
			return;
		}
		self.uf.unite(a, b);
	}

	/// Canonical net of a bit. Out-of-range indices map to themselves.
	pub fn net_id(&self, id: BitId) -> NetId {
		if id >= self.next_id {
			return id;
		}
		self.uf.find(id)
	}

	/// Groups every allocated bit by its net. Groups appear in order of
	/// their lowest member; members ascend.
	pub fn collect_groups(&self) -> Vec<Vec<BitId>> {
		let mut order: HashMap<NetId, usize> = HashMap::with_capacity(self.next_id as usize);
		let mut groups: Vec<Vec<BitId>> = Vec::new();
		for i in 0..self.next_id {
			let root = self.uf.find(i);
			let slot = *order.entry(root).or_insert_with(|| {
				groups.push(Vec::new());
				groups.len() - 1
			});
			groups[slot].push(i);
		}
		groups
	}

	/// Writes the group listing, rendering each bit through `render_bit`.
	pub fn dump(
		&self,
		w: &mut impl fmt::Write,
		render_bit: impl Fn(BitId) -> String,
	) -> fmt::Result {
		let groups = self.collect_groups();
		writeln!(w, "Connectivity groups ({}):", groups.len())?;
		for grp in &groups {
			w.write_str("  { ")?;
			for (i, b) in grp.iter().enumerate() {
				if i > 0 {
					w.write_str(", ")?;
				}
				w.write_str(&render_bit(*b))?;
			}
			w.write_str(" }\n")?;
		}
		Ok(())
	}
}
