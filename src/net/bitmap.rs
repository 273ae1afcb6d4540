use crate::net::connectivity::{BitId, Connectivity, NetId};

/// Which declaration list a bit belongs to.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BitOwnerKind {
	Port,
	Wire,
}

/// Reverse-lookup entry: the port or wire a bit belongs to and the
/// LSB-first offset within it.
#[derive(Clone, Copy, Debug)]
pub struct BitOwnerRef {
	pub kind: BitOwnerKind,
	pub owner_index: u32,
	pub bit_offset: u32,
}

/// Per-specialisation allocation table: one contiguous `BitId` range per
/// port, then per wire, plus the reverse map back to owners.
#[derive(Clone, Debug, Default)]
pub struct BitMap {
	conn: Connectivity,
	port_base: Vec<BitId>,
	wire_base: Vec<BitId>,
	reverse: Vec<BitOwnerRef>,
}

impl BitMap {
	/// Allocates bits for every port (declared order) then every wire, and
	/// materialises the reverse map. Any previous allocation is discarded.
	pub fn build(&mut self, port_widths: &[u32], wire_widths: &[u32]) {
		*self = BitMap::default();
		self.port_base.reserve(port_widths.len());
		self.wire_base.reserve(wire_widths.len());

		for &w in port_widths {
			let base = self.conn.alloc_range(w);
			self.port_base.push(base);
		}
		for &w in wire_widths {
			let base = self.conn.alloc_range(w);
			self.wire_base.push(base);
		}

		self.reverse.reserve(self.conn.size() as usize);
		for (i, &w) in port_widths.iter().enumerate() {
			for b in 0..w {
				self.reverse.push(BitOwnerRef {
					kind: BitOwnerKind::Port,
					owner_index: i as u32,
					bit_offset: b,
				});
			}
		}
		for (i, &w) in wire_widths.iter().enumerate() {
			for b in 0..w {
				self.reverse.push(BitOwnerRef {
					kind: BitOwnerKind::Wire,
					owner_index: i as u32,
					bit_offset: b,
				});
			}
		}
		debug_assert_eq!(self.reverse.len(), self.conn.size() as usize);
	}

	pub fn port_bit(&self, port_index: usize, bit_offset: u32) -> BitId {
		self.port_base[port_index] + bit_offset
	}

	pub fn wire_bit(&self, wire_index: usize, bit_offset: u32) -> BitId {
		self.wire_base[wire_index] + bit_offset
	}

	/// Owner of an allocated bit, or `None` for out-of-range indices.
	pub fn owner_of(&self, bit: BitId) -> Option<&BitOwnerRef> {
		self.reverse.get(bit as usize)
	}

	pub fn alias(&mut self, a: BitId, b: BitId) {
		self.conn.unite(a, b);
	}

	pub fn net_id(&self, bit: BitId) -> NetId {
		self.conn.net_id(bit)
	}

	pub fn size(&self) -> u32 {
		self.conn.size()
	}

	pub fn connectivity(&self) -> &Connectivity {
		&self.conn
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn allocation_order_is_ports_then_wires() {
		let mut bm = BitMap::default();
		bm.build(&[4, 2], &[8]);

		assert_eq!(bm.size(), 14);
		assert_eq!(bm.port_bit(0, 0), 0);
		assert_eq!(bm.port_bit(0, 3), 3);
		assert_eq!(bm.port_bit(1, 1), 5);
		assert_eq!(bm.wire_bit(0, 0), 6);
		assert_eq!(bm.wire_bit(0, 7), 13);
	}

	#[test]
	fn reverse_map_roundtrip() {
		let mut bm = BitMap::default();
		bm.build(&[4, 2], &[8]);

		for (p, w) in [(0usize, 4u32), (1, 2)] {
			for k in 0..w {
				let r = bm.owner_of(bm.port_bit(p, k)).unwrap();
				assert_eq!(r.kind, BitOwnerKind::Port);
				assert_eq!(r.owner_index, p as u32);
				assert_eq!(r.bit_offset, k);
			}
		}
		for k in 0..8 {
			let r = bm.owner_of(bm.wire_bit(0, k)).unwrap();
			assert_eq!(r.kind, BitOwnerKind::Wire);
			assert_eq!(r.owner_index, 0);
			assert_eq!(r.bit_offset, k);
		}
		assert!(bm.owner_of(14).is_none());
	}

	#[test]
	fn rebuild_discards_previous_state() {
		let mut bm = BitMap::default();
		bm.build(&[4], &[]);
		bm.alias(0, 1);
		bm.build(&[2], &[2]);
		assert_eq!(bm.size(), 4);
		assert_ne!(bm.net_id(0), bm.net_id(1));
	}
}
