use std::collections::HashMap;
use std::fmt;

use crate::design::decl::{width_from_range, Direction, ModuleDecl};
use crate::design::expr::ParamBinding;
use crate::net::bitmap::{BitMap, BitOwnerKind};
use crate::net::connectivity::{BitId, NetId};
use crate::symbol::Symbol;

/// Provenance of a single bit: owner kind, owner symbol and LSB-first
/// offset within the owner's declared range. Constant atoms carry
/// `Symbol::INVALID` and never enter the union-find.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BitAtom {
	pub kind: BitAtomKind,
	pub owner: Symbol,
	pub offset: u32,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BitAtomKind {
	PortBit,
	WireBit,
	Const0,
	Const1,
}

impl BitAtom {
	pub fn port(owner: Symbol, offset: u32) -> BitAtom {
		BitAtom {
			kind: BitAtomKind::PortBit,
			owner,
			offset,
		}
	}

	pub fn wire(owner: Symbol, offset: u32) -> BitAtom {
		BitAtom {
			kind: BitAtomKind::WireBit,
			owner,
			offset,
		}
	}

	pub fn constant(bit: bool) -> BitAtom {
		BitAtom {
			kind: if bit {
				BitAtomKind::Const1
			} else {
				BitAtomKind::Const0
			},
			owner: Symbol::INVALID,
			offset: 0,
		}
	}

	/// True for port and wire bits; constants cannot be aliased.
	pub fn is_connectable(&self) -> bool {
		matches!(self.kind, BitAtomKind::PortBit | BitAtomKind::WireBit)
	}
}

impl fmt::Display for BitAtom {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.kind {
			BitAtomKind::PortBit => write!(f, "port {}[off {}]", self.owner, self.offset),
			BitAtomKind::WireBit => write!(f, "wire {}[off {}]", self.owner, self.offset),
			BitAtomKind::Const0 => f.write_str("0"),
			BitAtomKind::Const1 => f.write_str("1"),
		}
	}
}

/// LSB-first sequence of bit atoms.
pub type BitVector = Vec<BitAtom>;

/// A port with its range evaluated under the specialisation's binding.
/// Widths are stable for the lifetime of the spec.
#[derive(Clone, Debug)]
pub struct PortSpec {
	pub name: Symbol,
	pub dir: Direction,
	pub msb: i32,
	pub lsb: i32,
}

impl PortSpec {
	pub fn width(&self) -> u32 {
		width_from_range(self.msb as i64, self.lsb as i64)
	}
}

#[derive(Clone, Debug)]
pub struct WireSpec {
	pub name: Symbol,
	pub msb: i32,
	pub lsb: i32,
}

impl WireSpec {
	pub fn width(&self) -> u32 {
		width_from_range(self.msb as i64, self.lsb as i64)
	}
}

/// Width-checked binding of a callee formal port to flattened actual bits
/// in the parent scope. `actual.len()` always equals the formal width.
#[derive(Clone, Debug)]
pub struct PortBinding {
	pub formal_index: u32,
	pub actual: BitVector,
}

/// A linked child instance. The callee is held as its canonical library
/// key and resolved to a borrow only during traversal, so specs never own
/// references into their own library.
#[derive(Clone, Debug)]
pub struct InstanceSpec {
	pub name: Symbol,
	pub callee: SpecKey,
	pub connections: Vec<PortBinding>,
}

/// Lifecycle of a module specialisation. Bits are allocated first, then
/// continuous assigns are wired, then instances are linked; a frozen spec
/// is read-only.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum SpecState {
	AllocatingBits,
	WiringAssigns,
	Linked,
	Frozen,
}

/// Canonical key of a module specialisation, interned for cheap copies and
/// hashing. The textual form is `name` for an empty binding, otherwise
/// `name#p1=v1,p2=v2,...` with parameter names in ascending lexicographic
/// order and decimal values.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct SpecKey(Symbol);

impl SpecKey {
	pub(crate) fn new(text: &str) -> SpecKey {
		SpecKey(Symbol::intern(text))
	}

	pub fn text(self) -> &'static str {
		self.0.text()
	}
}

impl fmt::Display for SpecKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.text())
	}
}

/// An elaborated, specialised, bit-level view of one module under one
/// parameter binding.
pub struct ModuleSpec<'d> {
	pub name: Symbol,
	/// Back-pointer to the declaration this spec was built from.
	pub decl: &'d ModuleDecl,
	/// Effective parameter binding (defaults updated by overrides).
	pub env: ParamBinding,
	pub ports: Vec<PortSpec>,
	pub wires: Vec<WireSpec>,
	pub bitmap: BitMap,
	pub instances: Vec<InstanceSpec>,
	port_index: HashMap<Symbol, u32>,
	wire_index: HashMap<Symbol, u32>,
	state: SpecState,
}

impl<'d> ModuleSpec<'d> {
	pub(crate) fn new(decl: &'d ModuleDecl, env: ParamBinding) -> ModuleSpec<'d> {
		ModuleSpec {
			name: decl.name,
			decl,
			env,
			ports: Vec::new(),
			wires: Vec::new(),
			bitmap: BitMap::default(),
			instances: Vec::new(),
			port_index: HashMap::new(),
			wire_index: HashMap::new(),
			state: SpecState::AllocatingBits,
		}
	}

	pub(crate) fn push_port(&mut self, port: PortSpec) {
		self.port_index.insert(port.name, self.ports.len() as u32);
		self.ports.push(port);
	}

	pub(crate) fn push_wire(&mut self, wire: WireSpec) {
		self.wire_index.insert(wire.name, self.wires.len() as u32);
		self.wires.push(wire);
	}

	pub fn state(&self) -> SpecState {
		self.state
	}

	pub(crate) fn set_state(&mut self, state: SpecState) {
		debug_assert!(state >= self.state, "spec lifecycle cannot move backwards");
		self.state = state;
	}

	pub fn find_port_index(&self, name: Symbol) -> Option<usize> {
		self.port_index.get(&name).map(|i| *i as usize)
	}

	pub fn find_wire_index(&self, name: Symbol) -> Option<usize> {
		self.wire_index.get(&name).map(|i| *i as usize)
	}

	/// `BitId` of bit `offset` (LSB-first) of the named port.
	pub fn port_bit(&self, name: Symbol, offset: u32) -> Option<BitId> {
		let idx = self.find_port_index(name)?;
		if offset >= self.ports[idx].width() {
			return None;
		}
		Some(self.bitmap.port_bit(idx, offset))
	}

	/// `BitId` of bit `offset` (LSB-first) of the named wire.
	pub fn wire_bit(&self, name: Symbol, offset: u32) -> Option<BitId> {
		let idx = self.find_wire_index(name)?;
		if offset >= self.wires[idx].width() {
			return None;
		}
		Some(self.bitmap.wire_bit(idx, offset))
	}

	pub fn net_id(&self, bit: BitId) -> NetId {
		self.bitmap.net_id(bit)
	}

	/// Translates a connectable atom into this spec's bit space.
	pub fn bit_of(&self, atom: &BitAtom) -> Option<BitId> {
		match atom.kind {
			BitAtomKind::PortBit => self.port_bit(atom.owner, atom.offset),
			BitAtomKind::WireBit => self.wire_bit(atom.owner, atom.offset),
			BitAtomKind::Const0 | BitAtomKind::Const1 => None,
		}
	}

	/// Human-readable label of an allocated bit, using the declared
	/// absolute index of the owning port or wire. Ascending and descending
	/// declarations yield identical labels for logically equivalent bits.
	pub fn render_bit(&self, bit: BitId) -> String {
		let owner = match self.bitmap.owner_of(bit) {
			Some(r) => r,
			None => return format!("<out-of-range:{}>", bit),
		};
		match owner.kind {
			BitOwnerKind::Port => {
				let p = &self.ports[owner.owner_index as usize];
				let idx = declared_index(p.msb, p.lsb, owner.bit_offset);
				format!("port {}[{}]", p.name, idx)
			},
			BitOwnerKind::Wire => {
				let w = &self.wires[owner.owner_index as usize];
				let idx = declared_index(w.msb, w.lsb, owner.bit_offset);
				format!("wire {}[{}]", w.name, idx)
			},
		}
	}

	/// Writes the port/wire allocation layout.
	pub fn dump_layout(&self, w: &mut impl fmt::Write) -> fmt::Result {
		writeln!(w, "ModuleSpec {} layout:", self.name)?;
		writeln!(w, "  Ports:")?;
		for (i, p) in self.ports.iter().enumerate() {
			writeln!(
				w,
				"    [{}] {} dir={} range=[{}:{}] width={}",
				i,
				p.name,
				p.dir,
				p.msb,
				p.lsb,
				p.width()
			)?;
		}
		writeln!(w, "  Wires:")?;
		for (i, s) in self.wires.iter().enumerate() {
			writeln!(
				w,
				"    [{}] {} range=[{}:{}] width={}",
				i,
				s.name,
				s.msb,
				s.lsb,
				s.width()
			)?;
		}
		Ok(())
	}

	/// Writes the connectivity groups with rendered bit labels.
	pub fn dump_connectivity(&self, w: &mut impl fmt::Write) -> fmt::Result {
		self.bitmap
			.connectivity()
			.dump(w, |bit| self.render_bit(bit))
	}
}

/// Declared absolute index of LSB-first offset `k` within `[msb:lsb]`.
fn declared_index(msb: i32, lsb: i32, k: u32) -> i32 {
	if msb >= lsb {
		lsb + k as i32
	} else {
		lsb - k as i32
	}
}

/// Owns every specialisation produced during one elaboration, keyed by
/// canonical key. Dropping the library drops all specs.
#[derive(Default)]
pub struct ModuleLibrary<'d> {
	specs: HashMap<SpecKey, ModuleSpec<'d>>,
}

impl<'d> ModuleLibrary<'d> {
	pub fn new() -> ModuleLibrary<'d> {
		ModuleLibrary::default()
	}

	pub fn get(&self, key: SpecKey) -> Option<&ModuleSpec<'d>> {
		self.specs.get(&key)
	}

	pub fn get_mut(&mut self, key: SpecKey) -> Option<&mut ModuleSpec<'d>> {
		self.specs.get_mut(&key)
	}

	pub fn contains(&self, key: SpecKey) -> bool {
		self.specs.contains_key(&key)
	}

	pub fn len(&self) -> usize {
		self.specs.len()
	}

	pub fn is_empty(&self) -> bool {
		self.specs.is_empty()
	}

	pub fn keys(&self) -> impl Iterator<Item = SpecKey> + '_ {
		self.specs.keys().copied()
	}

	pub(crate) fn insert(&mut self, key: SpecKey, spec: ModuleSpec<'d>) {
		self.specs.insert(key, spec);
	}

	/// Marks every linked spec read-only; called when the top-level link
	/// pass returns.
	pub fn freeze(&mut self) {
		for spec in self.specs.values_mut() {
			if spec.state() == SpecState::Linked {
				spec.set_state(SpecState::Frozen);
			}
		}
	}
}
