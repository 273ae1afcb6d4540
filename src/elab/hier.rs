use std::fmt;

use crate::diagnostic::{DiagnosticBuffer, DiagnosticKind};
use crate::elab::spec::{ModuleLibrary, ModuleSpec, SpecKey};
use crate::symbol::Symbol;

/// Sequence of child-instance indices from a root spec down to a nested
/// module. The empty path names the root itself.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ScopePath(pub Vec<u32>);

impl ScopePath {
	pub fn root() -> ScopePath {
		ScopePath::default()
	}

	pub fn is_root(&self) -> bool {
		self.0.is_empty()
	}

	pub fn child(&self, index: u32) -> ScopePath {
		let mut path = self.0.clone();
		path.push(index);
		ScopePath(path)
	}
}

impl fmt::Display for ScopePath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.0.is_empty() {
			return f.write_str("<root>");
		}
		for (i, idx) in self.0.iter().enumerate() {
			if i > 0 {
				f.write_str("/")?;
			}
			write!(f, "{}", idx)?;
		}
		Ok(())
	}
}

/// Identifies a port on the module reached by following a scope path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PinKey {
	pub scope: ScopePath,
	pub port_index: u32,
}

/// Resolves a named port at the end of a scope path, walking child
/// instances from `top`. Walk failures are reported through the sink and
/// yield `None`.
pub fn make_pin_key(
	lib: &ModuleLibrary,
	top: SpecKey,
	scope: &ScopePath,
	port: Symbol,
	diag: &mut DiagnosticBuffer,
) -> Option<PinKey> {
	let mut cur = match lib.get(top) {
		Some(spec) => spec,
		None => {
			diag.report(DiagnosticKind::NullCallee { depth: 0 });
			return None;
		},
	};

	for (depth, &index) in scope.0.iter().enumerate() {
		if index as usize >= cur.instances.len() {
			diag.report(DiagnosticKind::ScopeOutOfRange { index, depth });
			return None;
		}
		let inst = &cur.instances[index as usize];
		cur = match lib.get(inst.callee) {
			Some(spec) => spec,
			None => {
				diag.report(DiagnosticKind::NullCallee { depth });
				return None;
			},
		};
	}

	match cur.find_port_index(port) {
		Some(index) => Some(PinKey {
			scope: scope.clone(),
			port_index: index as u32,
		}),
		None => {
			diag.report(DiagnosticKind::UnknownPort {
				port,
				module: cur.name,
			});
			None
		},
	}
}

/// Depth-first, read-only traversal: visits `top`, then every child
/// instance in declared order with the extended scope path.
pub fn walk_depth_first<'d>(
	lib: &ModuleLibrary<'d>,
	top: SpecKey,
	mut visit: impl FnMut(&ModuleSpec<'d>, &ScopePath),
) {
	let mut scope = ScopePath::root();
	walk_recur(lib, top, &mut scope, &mut visit);
}

fn walk_recur<'d>(
	lib: &ModuleLibrary<'d>,
	key: SpecKey,
	scope: &mut ScopePath,
	visit: &mut impl FnMut(&ModuleSpec<'d>, &ScopePath),
) {
	let spec = match lib.get(key) {
		Some(spec) => spec,
		None => return,
	};
	visit(spec, scope);
	for (index, inst) in spec.instances.iter().enumerate() {
		scope.0.push(index as u32);
		walk_recur(lib, inst.callee, scope, visit);
		scope.0.pop();
	}
}

/// Writes the instance hierarchy with port bindings, recursing through
/// callee specs.
pub fn dump_instance_tree(
	lib: &ModuleLibrary,
	top: SpecKey,
	w: &mut impl fmt::Write,
) -> fmt::Result {
	dump_recur(lib, top, w, &ScopePath::root(), 0)
}

fn dump_recur(
	lib: &ModuleLibrary,
	key: SpecKey,
	w: &mut impl fmt::Write,
	scope: &ScopePath,
	indent: usize,
) -> fmt::Result {
	let spec = match lib.get(key) {
		Some(spec) => spec,
		None => return Ok(()),
	};

	write_indent(w, indent)?;
	writeln!(w, "Module '{}' scope={}", spec.name, scope)?;

	if !spec.instances.is_empty() {
		write_indent(w, indent + 2)?;
		writeln!(w, "Instances ({}):", spec.instances.len())?;
	}

	for (index, inst) in spec.instances.iter().enumerate() {
		let callee_name = lib
			.get(inst.callee)
			.map(|c| c.name.text())
			.unwrap_or("<null>");
		write_indent(w, indent + 4)?;
		writeln!(w, "[{}] {} : {}", index, inst.name, callee_name)?;

		if !inst.connections.is_empty() {
			write_indent(w, indent + 6)?;
			writeln!(w, "Connections:")?;
			for binding in &inst.connections {
				let callee = match lib.get(inst.callee) {
					Some(c) => c,
					None => continue,
				};
				let port = &callee.ports[binding.formal_index as usize];
				write_indent(w, indent + 8)?;
				write!(w, "{} ({}) <= [", port.name, port.dir)?;
				for (i, atom) in binding.actual.iter().enumerate() {
					if i > 0 {
						w.write_str(", ")?;
					}
					write!(w, "{}", atom)?;
				}
				w.write_str("]\n")?;
			}
		}

		dump_recur(lib, inst.callee, w, &scope.child(index as u32), indent + 4)?;
	}
	Ok(())
}

fn write_indent(w: &mut impl fmt::Write, n: usize) -> fmt::Result {
	for _ in 0..n {
		w.write_str(" ")?;
	}
	Ok(())
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::design::decl::{DeclLibrary, Direction, InstanceDecl, ModuleDecl, NetDecl};
	use crate::design::expr::{BitVecExpr, ParamBinding};
	use crate::elab::link::link_instances;
	use crate::elab::specialize::get_or_create_spec;

	fn build() -> (DeclLibrary, DiagnosticBuffer) {
		let leaf = ModuleDecl::new("Leaf")
			.port("d", Direction::In, NetDecl::range(3, 0));
		let mid = ModuleDecl::new("Mid")
			.wire("w", NetDecl::range(3, 0))
			.instance(InstanceDecl::new("u_leaf", "Leaf").connect("d", BitVecExpr::id("w")));
		let top = ModuleDecl::new("Top")
			.wire("w", NetDecl::range(3, 0))
			.instance(InstanceDecl::new("u_mid", "Mid"))
			.instance(InstanceDecl::new("u_leaf", "Leaf").connect("d", BitVecExpr::id("w")));

		let mut decls = DeclLibrary::new();
		decls.add(leaf);
		decls.add(mid);
		decls.add(top);
		(decls, DiagnosticBuffer::new())
	}

	#[test]
	fn scope_path_display() {
		assert_eq!(ScopePath::root().to_string(), "<root>");
		assert_eq!(ScopePath(vec![0, 2, 1]).to_string(), "0/2/1");
	}

	#[test]
	fn walk_visits_depth_first_in_declared_order() {
		let (decls, mut diag) = build();
		let mut lib = ModuleLibrary::new();
		let top_decl = decls.get(Symbol::intern("Top")).unwrap();
		let key = get_or_create_spec(top_decl, &ParamBinding::new(), &mut lib, &mut diag);
		link_instances(key, &decls, &mut lib, &mut diag).unwrap();

		let mut seen = Vec::new();
		walk_depth_first(&lib, key, |spec, scope| {
			seen.push((spec.name.text(), scope.to_string()));
		});
		assert_eq!(
			seen,
			vec![
				("Top", "<root>".to_owned()),
				("Mid", "0".to_owned()),
				("Leaf", "0/0".to_owned()),
				("Leaf", "1".to_owned()),
			]
		);
	}

	#[test]
	fn pin_key_resolution_and_failures() {
		let (decls, mut diag) = build();
		let mut lib = ModuleLibrary::new();
		let top_decl = decls.get(Symbol::intern("Top")).unwrap();
		let key = get_or_create_spec(top_decl, &ParamBinding::new(), &mut lib, &mut diag);
		link_instances(key, &decls, &mut lib, &mut diag).unwrap();

		let d = Symbol::intern("d");
		let pk = make_pin_key(&lib, key, &ScopePath(vec![0, 0]), d, &mut diag).unwrap();
		assert_eq!(pk.port_index, 0);
		assert_eq!(pk.scope, ScopePath(vec![0, 0]));

		// Index past the instance list.
		let before = diag.len();
		assert!(make_pin_key(&lib, key, &ScopePath(vec![7]), d, &mut diag).is_none());
		assert!(matches!(
			diag.diagnostics()[before].kind(),
			DiagnosticKind::ScopeOutOfRange { index: 7, depth: 0 }
		));

		// Unknown port at the terminal spec.
		let before = diag.len();
		let nope = Symbol::intern("nope");
		assert!(make_pin_key(&lib, key, &ScopePath(vec![1]), nope, &mut diag).is_none());
		assert!(matches!(
			diag.diagnostics()[before].kind(),
			DiagnosticKind::UnknownPort { .. }
		));
	}

	#[test]
	fn dump_tree_mentions_every_instance() {
		let (decls, mut diag) = build();
		let mut lib = ModuleLibrary::new();
		let top_decl = decls.get(Symbol::intern("Top")).unwrap();
		let key = get_or_create_spec(top_decl, &ParamBinding::new(), &mut lib, &mut diag);
		link_instances(key, &decls, &mut lib, &mut diag).unwrap();

		let mut out = String::new();
		dump_instance_tree(&lib, key, &mut out).unwrap();
		assert!(out.contains("Module 'Top' scope=<root>"));
		assert!(out.contains("[0] u_mid : Mid"));
		assert!(out.contains("Module 'Leaf' scope=0/0"));
		assert!(out.contains("d (In) <= [wire w[off 0], wire w[off 1], wire w[off 2], wire w[off 3]]"));
	}
}
