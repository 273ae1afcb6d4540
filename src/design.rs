pub mod decl;
pub mod expr;

pub use decl::{
	width_from_range, AssignDecl, ConnDecl, DeclLibrary, Direction, GenCase, GenCaseItem,
	GenFor, GenIf, GenerateItem, InstanceDecl, ModuleDecl, NetDecl, PortDecl, WireDecl,
};
pub use expr::{
	bit_width, eval_int, minimal_width, BitOpKind, BitVecExpr, IntExpr, IntOpKind, ParamBinding,
};
