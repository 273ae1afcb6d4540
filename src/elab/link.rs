use std::collections::HashSet;

use itertools::Itertools;
use log::{debug, info};

use crate::design::decl::DeclLibrary;
use crate::design::expr::{eval_int, ParamBinding};
use crate::diagnostic::{DiagnosticBuffer, DiagnosticKind};
use crate::elab::flatten::flatten;
use crate::elab::generate::expand_generates;
use crate::elab::spec::{InstanceSpec, ModuleLibrary, PortBinding, SpecKey};
use crate::elab::ElabError;
use crate::symbol::Symbol;

/// Populates `instances` of the spec behind `key` and, recursively, of
/// every callee specialisation it creates: the top-down link pass.
///
/// Generate constructs are expanded first; each expanded instance then
/// specialises its callee through the library cache and records
/// width-checked port bindings. Mutual recursion among module
/// specialisations is detected with an in-progress set keyed by canonical
/// key and aborts the pass with [`ElabError::CyclicInstantiation`], the
/// only fatal outcome. Instance-boundary bits are never united into the
/// parent's connectivity; cross-scope connectivity belongs to consumers.
pub fn link_instances<'d>(
	key: SpecKey,
	decls: &'d DeclLibrary,
	lib: &mut ModuleLibrary<'d>,
	diag: &mut DiagnosticBuffer,
) -> Result<(), ElabError> {
	let mut pass = LinkPass {
		decls,
		active: HashSet::new(),
		visited: HashSet::new(),
	};
	pass.link(key, lib, diag)
}

struct LinkPass<'d> {
	decls: &'d DeclLibrary,
	/// Keys currently being linked somewhere up the call stack.
	active: HashSet<SpecKey>,
	/// Keys already linked by this pass; shared callees link once.
	visited: HashSet<SpecKey>,
}

impl<'d> LinkPass<'d> {
	fn link(
		&mut self,
		key: SpecKey,
		lib: &mut ModuleLibrary<'d>,
		diag: &mut DiagnosticBuffer,
	) -> Result<(), ElabError> {
		if self.active.contains(&key) {
			return Err(ElabError::CyclicInstantiation {
				key: key.text().to_owned(),
			});
		}
		if !self.visited.insert(key) {
			return Ok(());
		}
		self.active.insert(key);
		let result = self.link_one(key, lib, diag);
		self.active.remove(&key);
		result
	}

	fn link_one(
		&mut self,
		key: SpecKey,
		lib: &mut ModuleLibrary<'d>,
		diag: &mut DiagnosticBuffer,
	) -> Result<(), ElabError> {
		let (decl, env) = match lib.get(key) {
			Some(spec) => (spec.decl, spec.env.clone()),
			None => return Ok(()),
		};

		let expanded = expand_generates(decl, &env, diag);
		let mut instances = Vec::with_capacity(expanded.len());

		for item in &expanded {
			let idecl = &item.decl;

			let callee_decl = match self.decls.get(idecl.target) {
				Some(d) => d,
				None => {
					diag.report(DiagnosticKind::UnknownModule {
						target: idecl.target,
						instance: idecl.name,
					});
					continue;
				},
			};

			// Overrides are evaluated under the generate scope's
			// environment; for plain instances that is the parent binding.
			let mut overrides = ParamBinding::new();
			for (name, expr) in idecl
				.param_overrides
				.iter()
				.sorted_by_key(|(name, _)| name.text())
			{
				if !callee_decl.params.contains_key(name) {
					diag.report(DiagnosticKind::UnknownParameterOverride {
						param: *name,
						target: callee_decl.name,
					});
				}
				overrides.insert(*name, eval_int(expr, &item.env, diag));
			}

			let callee_key = crate::elab::specialize::get_or_create_spec(
				callee_decl,
				&overrides,
				lib,
				diag,
			);
			self.link(callee_key, lib, diag)?;

			let formals: Vec<(Symbol, u32)> = lib
				.get(callee_key)
				.map(|callee| callee.ports.iter().map(|p| (p.name, p.width())).collect())
				.unwrap_or_default();

			let mut connections = Vec::with_capacity(idecl.connections.len());
			for conn in &idecl.connections {
				let formal_index = match formals.iter().position(|(n, _)| *n == conn.formal) {
					Some(i) => i,
					None => {
						diag.report(DiagnosticKind::UnknownPort {
							port: conn.formal,
							module: callee_decl.name,
						});
						continue;
					},
				};
				let formal_width = formals[formal_index].1;

				let parent = lib.get(key).expect("parent spec stays in library");
				let actual = flatten(&conn.actual, parent, diag);
				if actual.len() as u32 != formal_width {
					diag.report(DiagnosticKind::WidthMismatch {
						expected: formal_width,
						actual: actual.len() as u32,
						context: format!(
							"binding {}.{} (actual {})",
							idecl.name, conn.formal, conn.actual
						),
					});
					continue;
				}

				connections.push(PortBinding {
					formal_index: formal_index as u32,
					actual,
				});
			}

			instances.push(InstanceSpec {
				name: idecl.name,
				callee: callee_key,
				connections,
			});
		}

		debug!("linked {} instances in {}", instances.len(), key);
		let spec = lib.get_mut(key).expect("parent spec stays in library");
		spec.instances = instances;
		info!(
			"module {} linked ({} instances)",
			key,
			spec.instances.len()
		);
		Ok(())
	}
}
