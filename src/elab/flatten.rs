use crate::design::expr::{eval_int, BitVecExpr, IntExpr};
use crate::diagnostic::{DiagnosticBuffer, DiagnosticKind};
use crate::elab::spec::{BitAtom, BitVector, ModuleSpec};
use crate::symbol::Symbol;

/// Flattens bit-vector expressions into LSB-first atom sequences in the
/// context of one specialised module.
pub struct FlattenContext<'a, 'd> {
	spec: &'a ModuleSpec<'d>,
}

impl<'a, 'd> FlattenContext<'a, 'd> {
	pub fn new(spec: &'a ModuleSpec<'d>) -> Self {
		FlattenContext { spec }
	}

	/// Converts `expr` to its LSB-first bit atoms. Failing sub-expressions
	/// contribute no atoms but do not poison surrounding concatenations.
	pub fn flatten(&self, expr: &BitVecExpr, diag: &mut DiagnosticBuffer) -> BitVector {
		match expr {
			BitVecExpr::Id(name) => self.flatten_id(*name, diag),
			BitVecExpr::Const { value, width, .. } => self.flatten_const(*value, *width, diag),
			BitVecExpr::Concat(parts) => self.flatten_concat(parts, diag),
			BitVecExpr::Slice { base, msb, lsb } => self.flatten_slice(*base, msb, lsb, diag),
			BitVecExpr::Op { .. } => {
				diag.report(DiagnosticKind::FeatureUnsupported(
					"bit-vector arithmetic in wiring",
				));
				BitVector::new()
			},
		}
	}

	fn flatten_id(&self, name: Symbol, diag: &mut DiagnosticBuffer) -> BitVector {
		if let Some(idx) = self.spec.find_port_index(name) {
			let width = self.spec.ports[idx].width();
			return (0..width).map(|i| BitAtom::port(name, i)).collect();
		}
		if let Some(idx) = self.spec.find_wire_index(name) {
			let width = self.spec.wires[idx].width();
			return (0..width).map(|i| BitAtom::wire(name, i)).collect();
		}
		diag.report(DiagnosticKind::UnknownIdentifier(name));
		BitVector::new()
	}

	fn flatten_const(&self, value: u64, width: u32, diag: &mut DiagnosticBuffer) -> BitVector {
		if width == 0 {
			diag.report(DiagnosticKind::WidthlessConstant);
			return BitVector::new();
		}
		(0..width)
			.map(|i| BitAtom::constant((value >> i) & 1 != 0))
			.collect()
	}

	fn flatten_slice(
		&self,
		base: Symbol,
		msb_expr: &IntExpr,
		lsb_expr: &IntExpr,
		diag: &mut DiagnosticBuffer,
	) -> BitVector {
		// Declared range of the owner, and whether it is a port.
		let (declared_msb, declared_lsb, width, is_port) =
			if let Some(idx) = self.spec.find_port_index(base) {
				let p = &self.spec.ports[idx];
				(p.msb as i64, p.lsb as i64, p.width(), true)
			} else if let Some(idx) = self.spec.find_wire_index(base) {
				let w = &self.spec.wires[idx];
				(w.msb as i64, w.lsb as i64, w.width(), false)
			} else {
				diag.report(DiagnosticKind::UnknownIdentifier(base));
				return BitVector::new();
			};

		let msb = eval_int(msb_expr, &self.spec.env, diag);
		let lsb = eval_int(lsb_expr, &self.spec.env, diag);
		let lo = msb.min(lsb);
		let hi = msb.max(lsb);

		let mut out = BitVector::with_capacity((hi - lo + 1) as usize);
		for abs in lo..=hi {
			// Translate the absolute bit index to the owner's LSB-first
			// offset, honouring the declared orientation.
			let off = if declared_msb >= declared_lsb {
				abs - declared_lsb
			} else {
				declared_lsb - abs
			};
			if off < 0 || off >= width as i64 {
				diag.report(DiagnosticKind::SliceOutOfRange { base, msb, lsb });
				return BitVector::new();
			}
			out.push(if is_port {
				BitAtom::port(base, off as u32)
			} else {
				BitAtom::wire(base, off as u32)
			});
		}
		out
	}

	fn flatten_concat(&self, parts: &[BitVecExpr], diag: &mut DiagnosticBuffer) -> BitVector {
		// Parts are written MSB-first; the output is LSB-first, so parts
		// are emitted in reverse order.
		let mut out = BitVector::new();
		for part in parts.iter().rev() {
			out.extend(self.flatten(part, diag));
		}
		out
	}
}

/// Convenience free function over [`FlattenContext`].
pub fn flatten(expr: &BitVecExpr, spec: &ModuleSpec, diag: &mut DiagnosticBuffer) -> BitVector {
	FlattenContext::new(spec).flatten(expr, diag)
}
