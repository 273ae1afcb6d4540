use itertools::Itertools;
use log::debug;

use crate::design::decl::ModuleDecl;
use crate::design::expr::{eval_int, ParamBinding};
use crate::diagnostic::{DiagnosticBuffer, DiagnosticKind};
use crate::elab::flatten::flatten;
use crate::elab::spec::{ModuleLibrary, ModuleSpec, PortSpec, SpecKey, SpecState, WireSpec};
use crate::symbol::Symbol;

/// Canonical text key of a `(module, binding)` specialisation: the module
/// name alone for an empty binding, otherwise `name#p1=v1,p2=v2,...` with
/// parameter names in ascending lexicographic order and decimal values.
pub fn make_module_key(name: Symbol, env: &ParamBinding) -> String {
	let mut key = name.text().to_owned();
	if env.is_empty() {
		return key;
	}
	key.push('#');
	let params = env
		.iter()
		.map(|(k, v)| (k.text(), *v))
		.sorted_by(|a, b| a.0.cmp(b.0))
		.map(|(k, v)| format!("{}={}", k, v))
		.join(",");
	key.push_str(&params);
	key
}

/// Returns the spec for `(decl, overrides)`, building and caching it on
/// first request.
///
/// The fresh spec is inserted into the library before its continuous
/// assigns are wired, so recursive specialisation triggered from wiring
/// observes the in-progress entry instead of recursing forever.
pub fn get_or_create_spec<'d>(
	decl: &'d ModuleDecl,
	overrides: &ParamBinding,
	lib: &mut ModuleLibrary<'d>,
	diag: &mut DiagnosticBuffer,
) -> SpecKey {
	let mut env = decl.params.clone();
	env.extend(overrides.iter().map(|(k, v)| (*k, *v)));

	let key = SpecKey::new(&make_module_key(decl.name, &env));
	if lib.contains(key) {
		debug!("spec cache hit: {}", key);
		return key;
	}
	debug!("specialising {}", key);

	let mut spec = ModuleSpec::new(decl, env);
	for p in &decl.ports {
		let msb = eval_int(&p.net.msb, &spec.env, diag) as i32;
		let lsb = eval_int(&p.net.lsb, &spec.env, diag) as i32;
		spec.push_port(PortSpec {
			name: p.name,
			dir: p.dir,
			msb,
			lsb,
		});
	}
	for w in &decl.wires {
		let msb = eval_int(&w.net.msb, &spec.env, diag) as i32;
		let lsb = eval_int(&w.net.lsb, &spec.env, diag) as i32;
		spec.push_wire(WireSpec {
			name: w.name,
			msb,
			lsb,
		});
	}

	let port_widths: Vec<u32> = spec.ports.iter().map(|p| p.width()).collect();
	let wire_widths: Vec<u32> = spec.wires.iter().map(|w| w.width()).collect();
	spec.bitmap.build(&port_widths, &wire_widths);
	spec.set_state(SpecState::WiringAssigns);

	lib.insert(key, spec);
	let spec = lib
		.get_mut(key)
		.expect("spec inserted into library just above");
	wire_assigns(spec, diag);
	key
}

/// Applies a module's continuous assigns to its bit map connectivity.
///
/// Assigns apply in declared order; a later assign touching already-united
/// bits is an idempotent no-op.
pub(crate) fn wire_assigns(spec: &mut ModuleSpec<'_>, diag: &mut DiagnosticBuffer) {
	let decl = spec.decl;
	let mut united = 0usize;
	for asg in &decl.assigns {
		let lhs = flatten(&asg.lhs, spec, diag);
		let rhs = flatten(&asg.rhs, spec, diag);
		if lhs.len() != rhs.len() {
			diag.report(DiagnosticKind::WidthMismatch {
				expected: lhs.len() as u32,
				actual: rhs.len() as u32,
				context: format!(
					"assign {} = {} in module {}",
					asg.lhs, asg.rhs, spec.name
				),
			});
			continue;
		}
		for (i, (l, r)) in lhs.iter().zip(rhs.iter()).enumerate() {
			if !l.is_connectable() {
				diag.report(DiagnosticKind::NonAssignableLhs { bit: i });
				continue;
			}
			if !r.is_connectable() {
				// Constants on the RHS are not recorded as ties.
				continue;
			}
			if let (Some(a), Some(b)) = (spec.bit_of(l), spec.bit_of(r)) {
				spec.bitmap.alias(a, b);
				united += 1;
			}
		}
	}
	if !decl.assigns.is_empty() {
		debug!(
			"wired {} assigns in {} ({} bit aliases)",
			decl.assigns.len(),
			spec.name,
			united
		);
	}
	spec.set_state(SpecState::Linked);
}
