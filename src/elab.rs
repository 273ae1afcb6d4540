pub mod elaborate;
pub mod flatten;
pub mod generate;
pub mod hier;
pub mod link;
pub mod spec;
pub mod specialize;

pub use elaborate::{elaborate, Elaboration};
pub use flatten::{flatten, FlattenContext};
pub use generate::{expand_generates, ExpandedInstance};
pub use hier::{dump_instance_tree, make_pin_key, walk_depth_first, PinKey, ScopePath};
pub use link::link_instances;
pub use spec::{
	BitAtom, BitAtomKind, BitVector, InstanceSpec, ModuleLibrary, ModuleSpec, PortBinding,
	PortSpec, SpecKey, SpecState, WireSpec,
};
pub use specialize::{get_or_create_spec, make_module_key};

use thiserror::Error;

/// Fatal elaboration failures. Everything else in the pipeline recovers
/// locally and reports through the diagnostic sink.
#[derive(Clone, Debug, Error)]
pub enum ElabError {
	#[error("cyclic instantiation of module specialisation '{key}'")]
	CyclicInstantiation { key: String },
}
