use log::info;

use crate::design::decl::{DeclLibrary, ModuleDecl};
use crate::design::expr::ParamBinding;
use crate::diagnostic::DiagnosticBuffer;
use crate::elab::link::link_instances;
use crate::elab::spec::{ModuleLibrary, ModuleSpec, SpecKey};
use crate::elab::specialize::get_or_create_spec;
use crate::elab::ElabError;

/// Result of a full elaboration: the root specialisation's key and the
/// library owning every spec the pass created. Dropping it releases all
/// specs.
pub struct Elaboration<'d> {
	pub root: SpecKey,
	pub library: ModuleLibrary<'d>,
}

impl<'d> Elaboration<'d> {
	pub fn root_spec(&self) -> &ModuleSpec<'d> {
		self.library
			.get(self.root)
			.expect("root spec owned by this library")
	}
}

/// Specialises `root` under `overrides`, links the whole instance tree and
/// freezes the resulting library.
///
/// Non-fatal problems land in `diag`; the returned specs are
/// self-consistent even when connections were skipped. Only
/// [`ElabError::CyclicInstantiation`] aborts.
pub fn elaborate<'d>(
	root: &'d ModuleDecl,
	overrides: &ParamBinding,
	decls: &'d DeclLibrary,
	diag: &mut DiagnosticBuffer,
) -> Result<Elaboration<'d>, ElabError> {
	info!("elaborating module {}", root.name);
	let mut library = ModuleLibrary::new();
	let key = get_or_create_spec(root, overrides, &mut library, diag);
	link_instances(key, decls, &mut library, diag)?;
	library.freeze();
	info!(
		"elaboration of {} complete ({} specialisations)",
		root.name,
		library.len()
	);
	Ok(Elaboration { root: key, library })
}
