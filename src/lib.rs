//! Bit-level elaboration core for parameterised hardware module
//! hierarchies.
//!
//! Callers build module declarations in memory ([`design`]), then
//! elaborate them: specialisation under a parameter binding, generate
//! unrolling, instance linking with width-checked port bindings, and
//! bit-level union-find connectivity ([`elab`], [`net`]). Downstream
//! tools consume the elaborated [`elab::ModuleSpec`] tree.

pub mod design;
pub mod diagnostic;
pub mod elab;
pub mod net;
pub mod symbol;

pub use design::{
	BitVecExpr, DeclLibrary, Direction, GenerateItem, InstanceDecl, IntExpr, ModuleDecl,
	NetDecl, ParamBinding,
};
pub use diagnostic::{DiagnosticBuffer, DiagnosticKind, Severity};
pub use elab::{
	elaborate, BitAtom, BitAtomKind, ElabError, Elaboration, ModuleLibrary, ModuleSpec, PinKey,
	ScopePath, SpecKey,
};
pub use net::{BitId, NetId};
pub use symbol::Symbol;
