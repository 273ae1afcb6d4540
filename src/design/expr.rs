use std::collections::HashMap;
use std::fmt;

use crate::diagnostic::{DiagnosticBuffer, DiagnosticKind};
use crate::elab::ModuleSpec;
use crate::symbol::Symbol;

/// Parameter environment: compile-time bindings of parameter symbols to
/// signed 64-bit values.
pub type ParamBinding = HashMap<Symbol, i64>;

/// Operators of the parameter algebra. Further operators are reserved.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum IntOpKind {
	Add,
	Sub,
}

/// Compile-time integer expression: parameter algebra used by ranges,
/// generate bounds and parameter overrides.
#[derive(Clone, Debug)]
pub enum IntExpr {
	Literal(i64),
	Param(Symbol),
	Op {
		kind: IntOpKind,
		operands: Vec<IntExpr>,
	},
}

impl IntExpr {
	pub fn literal(value: i64) -> IntExpr {
		IntExpr::Literal(value)
	}

	pub fn param(name: impl Into<Symbol>) -> IntExpr {
		IntExpr::Param(name.into())
	}

	pub fn add(lhs: IntExpr, rhs: IntExpr) -> IntExpr {
		IntExpr::Op {
			kind: IntOpKind::Add,
			operands: vec![lhs, rhs],
		}
	}

	pub fn sub(lhs: IntExpr, rhs: IntExpr) -> IntExpr {
		IntExpr::Op {
			kind: IntOpKind::Sub,
			operands: vec![lhs, rhs],
		}
	}

	/// Unary negation: a `Sub` with a single operand.
	pub fn neg(operand: IntExpr) -> IntExpr {
		IntExpr::Op {
			kind: IntOpKind::Sub,
			operands: vec![operand],
		}
	}

	fn is_leaf(&self) -> bool {
		!matches!(self, IntExpr::Op { .. })
	}
}

/// Folds an integer expression to a signed 64-bit value under `env`.
///
/// Arithmetic wraps; overflow is allowed and deterministic. A parameter
/// absent from `env` reports `UnknownParameter` and recovers with 0.
pub fn eval_int(expr: &IntExpr, env: &ParamBinding, diag: &mut DiagnosticBuffer) -> i64 {
	match expr {
		IntExpr::Literal(v) => *v,
		IntExpr::Param(name) => match env.get(name) {
			Some(v) => *v,
			None => {
				log::trace!("parameter {} unbound, recovering with 0", name);
				diag.report(DiagnosticKind::UnknownParameter(*name));
				0
			},
		},
		IntExpr::Op { kind, operands } => match kind {
			IntOpKind::Add => operands
				.iter()
				.fold(0i64, |acc, x| acc.wrapping_add(eval_int(x, env, diag))),
			IntOpKind::Sub => match operands.split_first() {
				None => 0,
				Some((first, [])) => eval_int(first, env, diag).wrapping_neg(),
				Some((first, rest)) => rest.iter().fold(eval_int(first, env, diag), |acc, x| {
					acc.wrapping_sub(eval_int(x, env, diag))
				}),
			},
		},
	}
}

impl fmt::Display for IntExpr {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			IntExpr::Literal(v) => write!(f, "{}", v),
			IntExpr::Param(name) => f.write_str(name.text()),
			IntExpr::Op { kind, operands } => match (kind, operands.as_slice()) {
				(IntOpKind::Sub, [only]) if only.is_leaf() => write!(f, "-{}", only),
				(IntOpKind::Sub, [only]) => write!(f, "-({})", only),
				(_, operands) => {
					let op = if *kind == IntOpKind::Sub { " - " } else { " + " };
					for (i, x) in operands.iter().enumerate() {
						if i > 0 {
							f.write_str(op)?;
						}
						// Parenthesise non-leaf right operands of Sub so the
						// printed form keeps left associativity.
						if i > 0 && *kind == IntOpKind::Sub && !x.is_leaf() {
							write!(f, "({})", x)?;
						} else {
							write!(f, "{}", x)?;
						}
					}
					Ok(())
				},
			},
		}
	}
}

/// Operators accepted in bit-vector expressions. Arithmetic on wires is not
/// yet supported by the flattener and is rejected there.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BitOpKind {
	Add,
	Sub,
}

/// Bit-vector expression: the wiring-side expression language of ports,
/// wires, literals, slices and concatenations.
#[derive(Clone, Debug)]
pub enum BitVecExpr {
	Id(Symbol),
	Const {
		value: u64,
		/// Declared width in bits; 0 means unspecified (minimal width is
		/// used for width queries, flattening rejects it).
		width: u32,
		/// Optional pretty form used verbatim when rendering.
		text: Option<String>,
	},
	/// Parts are MSB-first, as written.
	Concat(Vec<BitVecExpr>),
	Slice {
		base: Symbol,
		msb: IntExpr,
		lsb: IntExpr,
	},
	Op {
		kind: BitOpKind,
		operands: Vec<BitVecExpr>,
	},
}

impl BitVecExpr {
	pub fn id(name: impl Into<Symbol>) -> BitVecExpr {
		BitVecExpr::Id(name.into())
	}

	pub fn literal(value: u64, width: u32) -> BitVecExpr {
		BitVecExpr::Const {
			value,
			width,
			text: None,
		}
	}

	pub fn literal_text(value: u64, width: u32, text: impl Into<String>) -> BitVecExpr {
		BitVecExpr::Const {
			value,
			width,
			text: Some(text.into()),
		}
	}

	pub fn concat(parts: Vec<BitVecExpr>) -> BitVecExpr {
		BitVecExpr::Concat(parts)
	}

	pub fn slice(base: impl Into<Symbol>, msb: IntExpr, lsb: IntExpr) -> BitVecExpr {
		BitVecExpr::Slice {
			base: base.into(),
			msb,
			lsb,
		}
	}

	/// Single-bit slice `base[idx]` expressed as `base[idx:idx]`.
	pub fn slice_index(base: impl Into<Symbol>, idx: IntExpr) -> BitVecExpr {
		BitVecExpr::Slice {
			base: base.into(),
			msb: idx.clone(),
			lsb: idx,
		}
	}

	pub fn add(lhs: BitVecExpr, rhs: BitVecExpr) -> BitVecExpr {
		BitVecExpr::Op {
			kind: BitOpKind::Add,
			operands: vec![lhs, rhs],
		}
	}

	pub fn sub(lhs: BitVecExpr, rhs: BitVecExpr) -> BitVecExpr {
		BitVecExpr::Op {
			kind: BitOpKind::Sub,
			operands: vec![lhs, rhs],
		}
	}

	fn is_leaf(&self) -> bool {
		!matches!(self, BitVecExpr::Op { .. })
	}
}

/// Minimal number of bits needed to represent `value` (1 for zero).
pub fn minimal_width(value: u64) -> u32 {
	if value == 0 {
		1
	} else {
		64 - value.leading_zeros()
	}
}

/// Width in bits of a bit-vector expression in the context of a specialised
/// module. An unknown identifier contributes width 0; operators are not
/// sized here.
pub fn bit_width(expr: &BitVecExpr, spec: &ModuleSpec, diag: &mut DiagnosticBuffer) -> u32 {
	match expr {
		BitVecExpr::Id(name) => {
			if let Some(idx) = spec.find_port_index(*name) {
				spec.ports[idx].width()
			} else if let Some(idx) = spec.find_wire_index(*name) {
				spec.wires[idx].width()
			} else {
				0
			}
		},
		BitVecExpr::Const { value, width, .. } => {
			if *width > 0 {
				*width
			} else {
				minimal_width(*value)
			}
		},
		BitVecExpr::Concat(parts) => parts.iter().map(|p| bit_width(p, spec, diag)).sum(),
		BitVecExpr::Slice { msb, lsb, .. } => {
			let msb = eval_int(msb, &spec.env, diag);
			let lsb = eval_int(lsb, &spec.env, diag);
			crate::design::decl::width_from_range(msb, lsb)
		},
		BitVecExpr::Op { .. } => 0,
	}
}

impl fmt::Display for BitVecExpr {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			BitVecExpr::Id(name) => f.write_str(name.text()),
			BitVecExpr::Const { value, width, text } => match text {
				Some(t) => f.write_str(t),
				None => write!(f, "{}'d{}", width, value),
			},
			BitVecExpr::Concat(parts) => {
				f.write_str("{")?;
				for (i, p) in parts.iter().enumerate() {
					if i > 0 {
						f.write_str(", ")?;
					}
					write!(f, "{}", p)?;
				}
				f.write_str("}")
			},
			BitVecExpr::Slice { base, msb, lsb } => write!(f, "{}[{}:{}]", base, msb, lsb),
			BitVecExpr::Op { kind, operands } => match (kind, operands.as_slice()) {
				(BitOpKind::Sub, [only]) if only.is_leaf() => write!(f, "-{}", only),
				(BitOpKind::Sub, [only]) => write!(f, "-({})", only),
				(_, operands) => {
					let op = if *kind == BitOpKind::Sub { " - " } else { " + " };
					for (i, x) in operands.iter().enumerate() {
						if i > 0 {
							f.write_str(op)?;
						}
						if i > 0 && *kind == BitOpKind::Sub && !x.is_leaf() {
							write!(f, "({})", x)?;
						} else {
							write!(f, "{}", x)?;
						}
					}
					Ok(())
				},
			},
		}
	}
}
