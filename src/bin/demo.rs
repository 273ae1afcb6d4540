//! Builds a small two-module design in memory, elaborates it and prints
//! the layouts, connectivity groups and instance hierarchy.

use weft::design::{GenFor, GenIf, GenerateItem};
use weft::diagnostic::DiagnosticBuffer;
use weft::elab::{dump_instance_tree, make_pin_key, ScopePath};
use weft::{
	elaborate, BitVecExpr, DeclLibrary, Direction, ElabError, InstanceDecl, IntExpr, ModuleDecl,
	NetDecl, ParamBinding, Symbol,
};

fn module_a() -> ModuleDecl {
	// A(p_in[7:0] -> p_out[7:0]) with a byte-swapping assign.
	ModuleDecl::new("A")
		.port("p_in", Direction::In, NetDecl::range(7, 0))
		.port("p_out", Direction::Out, NetDecl::range(7, 0))
		.assign(
			BitVecExpr::id("p_out"),
			BitVecExpr::concat(vec![
				BitVecExpr::slice("p_in", IntExpr::literal(3), IntExpr::literal(0)),
				BitVecExpr::slice("p_in", IntExpr::literal(7), IntExpr::literal(4)),
			]),
		)
}

fn module_top() -> ModuleDecl {
	let bind = |inst: InstanceDecl, w_in: &str, w_out: &str| {
		inst.connect("p_in", BitVecExpr::id(w_in))
			.connect("p_out", BitVecExpr::id(w_out))
	};

	ModuleDecl::new("Top")
		.param_default("DO_EXTRA", 1)
		.param_default("REPL", 2)
		.wire("w0", NetDecl::range(7, 0))
		.wire("w1", NetDecl::range(7, 0))
		.wire("w2", NetDecl::range(7, 0))
		.wire("w3", NetDecl::range(7, 0))
		.instance(bind(InstanceDecl::new("uA", "A"), "w0", "w1"))
		.generate(GenerateItem::If(GenIf {
			label: Symbol::intern("g_if"),
			cond: IntExpr::param("DO_EXTRA"),
			then_items: vec![GenerateItem::Instance(bind(
				InstanceDecl::new("uA_extra", "A"),
				"w2",
				"w3",
			))],
			else_items: vec![],
		}))
		.generate(GenerateItem::For(GenFor {
			label: Symbol::intern("g_for"),
			loop_var: Symbol::intern("i"),
			start: IntExpr::literal(0),
			limit: IntExpr::param("REPL"),
			step: IntExpr::literal(1),
			body: vec![GenerateItem::Instance(bind(
				InstanceDecl::new("uA_rep", "A"),
				"w0",
				"w1",
			))],
		}))
}

fn main() -> Result<(), ElabError> {
	let mut decls = DeclLibrary::new();
	decls.add(module_a());
	decls.add(module_top());
	let top = decls
		.get(Symbol::intern("Top"))
		.expect("Top was added above");

	let mut diag = DiagnosticBuffer::new();
	let elab = elaborate(top, &ParamBinding::new(), &decls, &mut diag)?;

	let mut out = String::new();
	let fmt_failed = "formatting to a String cannot fail";

	out.push_str("=== Layouts ===\n");
	for key in elab.library.keys().collect::<Vec<_>>() {
		let spec = elab.library.get(key).expect("key taken from the library");
		spec.dump_layout(&mut out).expect(fmt_failed);
	}

	out.push_str("\n=== Connectivity: Top ===\n");
	elab.root_spec()
		.dump_connectivity(&mut out)
		.expect(fmt_failed);

	out.push_str("\n=== Instance hierarchy ===\n");
	dump_instance_tree(&elab.library, elab.root, &mut out).expect(fmt_failed);

	out.push_str("\n=== Pin key sample ===\n");
	let scope = ScopePath(vec![0]);
	if let Some(pk) = make_pin_key(
		&elab.library,
		elab.root,
		&scope,
		Symbol::intern("p_in"),
		&mut diag,
	) {
		out.push_str(&format!(
			"PinKey scope={} portIndex={}\n",
			pk.scope, pk.port_index
		));
	}

	print!("{}", out);

	if !diag.is_empty() {
		let mut log = String::new();
		diag.write(&mut log).expect(fmt_failed);
		eprint!("{}", log);
	}

	Ok(())
}
