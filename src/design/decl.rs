use std::collections::HashMap;
use std::fmt;

use crate::design::expr::{BitVecExpr, IntExpr, ParamBinding};
use crate::symbol::Symbol;

/// Port direction as seen from the declaring module.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
	In,
	Out,
	InOut,
}

impl fmt::Display for Direction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Direction::In => f.write_str("In"),
			Direction::Out => f.write_str("Out"),
			Direction::InOut => f.write_str("InOut"),
		}
	}
}

/// Width of a declared `[msb:lsb]` range; orientation does not matter.
pub fn width_from_range(msb: i64, lsb: i64) -> u32 {
	let w = if msb >= lsb { msb - lsb + 1 } else { lsb - msb + 1 };
	w as u32
}

/// Declared bit range of a port or wire. Both bounds are parameter
/// expressions; `[0:7]` and `[7:0]` are equally valid.
#[derive(Clone, Debug)]
pub struct NetDecl {
	pub msb: IntExpr,
	pub lsb: IntExpr,
}

impl NetDecl {
	pub fn new(msb: IntExpr, lsb: IntExpr) -> NetDecl {
		NetDecl { msb, lsb }
	}

	/// Fixed numeric range, the common case in tests and hand-built ASTs.
	pub fn range(msb: i64, lsb: i64) -> NetDecl {
		NetDecl {
			msb: IntExpr::literal(msb),
			lsb: IntExpr::literal(lsb),
		}
	}
}

#[derive(Clone, Debug)]
pub struct PortDecl {
	pub name: Symbol,
	pub dir: Direction,
	pub net: NetDecl,
}

#[derive(Clone, Debug)]
pub struct WireDecl {
	pub name: Symbol,
	pub net: NetDecl,
}

/// Continuous assignment `lhs = rhs`; both sides are bit-vector
/// expressions of equal flattened width.
#[derive(Clone, Debug)]
pub struct AssignDecl {
	pub lhs: BitVecExpr,
	pub rhs: BitVecExpr,
}

/// Binding of a callee formal port to an actual expression in the caller's
/// scope.
#[derive(Clone, Debug)]
pub struct ConnDecl {
	pub formal: Symbol,
	pub actual: BitVecExpr,
}

#[derive(Clone, Debug)]
pub struct InstanceDecl {
	pub name: Symbol,
	pub target: Symbol,
	pub param_overrides: HashMap<Symbol, IntExpr>,
	pub connections: Vec<ConnDecl>,
}

impl InstanceDecl {
	pub fn new(name: impl Into<Symbol>, target: impl Into<Symbol>) -> InstanceDecl {
		InstanceDecl {
			name: name.into(),
			target: target.into(),
			param_overrides: HashMap::new(),
			connections: Vec::new(),
		}
	}

	pub fn override_param(mut self, name: impl Into<Symbol>, value: IntExpr) -> InstanceDecl {
		self.param_overrides.insert(name.into(), value);
		self
	}

	pub fn connect(mut self, formal: impl Into<Symbol>, actual: BitVecExpr) -> InstanceDecl {
		self.connections.push(ConnDecl {
			formal: formal.into(),
			actual,
		});
		self
	}
}

/// Conditional generate. Labels are optional (`Symbol::INVALID` when
/// absent); a present label contributes one hierarchical name segment.
#[derive(Clone, Debug)]
pub struct GenIf {
	pub label: Symbol,
	pub cond: IntExpr,
	pub then_items: Vec<GenerateItem>,
	pub else_items: Vec<GenerateItem>,
}

/// Iterative generate. The loop variable is bound in the scope environment
/// of the body; iteration indices decorate instance names.
#[derive(Clone, Debug)]
pub struct GenFor {
	pub label: Symbol,
	pub loop_var: Symbol,
	pub start: IntExpr,
	pub limit: IntExpr,
	pub step: IntExpr,
	pub body: Vec<GenerateItem>,
}

#[derive(Clone, Debug)]
pub struct GenCaseItem {
	pub choices: Vec<IntExpr>,
	pub is_default: bool,
	pub label: Symbol,
	pub body: Vec<GenerateItem>,
}

/// Selective generate: the first item whose choices contain the selector
/// value wins, otherwise the first default item.
#[derive(Clone, Debug)]
pub struct GenCase {
	pub label: Symbol,
	pub expr: IntExpr,
	pub items: Vec<GenCaseItem>,
}

#[derive(Clone, Debug)]
pub enum GenerateItem {
	Instance(InstanceDecl),
	If(GenIf),
	For(GenFor),
	Case(GenCase),
}

/// Parameterised module template; the input to elaboration. Never mutated
/// by the core.
#[derive(Clone, Debug)]
pub struct ModuleDecl {
	pub name: Symbol,
	/// Parameter defaults; the effective binding of a specialisation is
	/// these defaults updated by the caller's overrides.
	pub params: ParamBinding,
	pub ports: Vec<PortDecl>,
	pub wires: Vec<WireDecl>,
	pub assigns: Vec<AssignDecl>,
	pub instances: Vec<InstanceDecl>,
	pub generate_items: Vec<GenerateItem>,
}

impl ModuleDecl {
	pub fn new(name: impl Into<Symbol>) -> ModuleDecl {
		ModuleDecl {
			name: name.into(),
			params: ParamBinding::new(),
			ports: Vec::new(),
			wires: Vec::new(),
			assigns: Vec::new(),
			instances: Vec::new(),
			generate_items: Vec::new(),
		}
	}

	pub fn find_port_index(&self, name: Symbol) -> Option<usize> {
		self.ports.iter().position(|p| p.name == name)
	}

	pub fn find_wire_index(&self, name: Symbol) -> Option<usize> {
		self.wires.iter().position(|w| w.name == name)
	}

	pub fn param_default(mut self, name: impl Into<Symbol>, value: i64) -> ModuleDecl {
		self.params.insert(name.into(), value);
		self
	}

	pub fn port(mut self, name: impl Into<Symbol>, dir: Direction, net: NetDecl) -> ModuleDecl {
		self.ports.push(PortDecl {
			name: name.into(),
			dir,
			net,
		});
		self
	}

	pub fn wire(mut self, name: impl Into<Symbol>, net: NetDecl) -> ModuleDecl {
		self.wires.push(WireDecl {
			name: name.into(),
			net,
		});
		self
	}

	pub fn assign(mut self, lhs: BitVecExpr, rhs: BitVecExpr) -> ModuleDecl {
		self.assigns.push(AssignDecl { lhs, rhs });
		self
	}

	pub fn instance(mut self, inst: InstanceDecl) -> ModuleDecl {
		self.instances.push(inst);
		self
	}

	pub fn generate(mut self, item: GenerateItem) -> ModuleDecl {
		self.generate_items.push(item);
		self
	}
}

/// Owning collection of module declarations, keyed by module name.
#[derive(Default)]
pub struct DeclLibrary {
	modules: HashMap<Symbol, ModuleDecl>,
}

impl DeclLibrary {
	pub fn new() -> DeclLibrary {
		DeclLibrary::default()
	}

	/// Adds a declaration, replacing any previous declaration of the same
	/// name.
	pub fn add(&mut self, decl: ModuleDecl) {
		self.modules.insert(decl.name, decl);
	}

	pub fn get(&self, name: Symbol) -> Option<&ModuleDecl> {
		self.modules.get(&name)
	}

	pub fn contains(&self, name: Symbol) -> bool {
		self.modules.contains_key(&name)
	}

	pub fn len(&self) -> usize {
		self.modules.len()
	}

	pub fn is_empty(&self) -> bool {
		self.modules.is_empty()
	}
}
