use log::debug;

use crate::design::decl::{GenCase, GenFor, GenIf, GenerateItem, InstanceDecl, ModuleDecl};
use crate::design::expr::{eval_int, ParamBinding};
use crate::diagnostic::{DiagnosticBuffer, DiagnosticKind};
use crate::symbol::Symbol;

/// An instance produced by generate expansion: the (renamed) declaration
/// plus the parameter environment of the generate scope it was emitted
/// from. Outside any gen-for that environment is exactly the parent
/// binding; inside, it additionally binds the loop variables.
#[derive(Clone, Debug)]
pub struct ExpandedInstance {
	pub decl: InstanceDecl,
	pub env: ParamBinding,
}

/// Unrolls a module's generate constructs into a flat, deterministic
/// sequence of instance declarations.
///
/// Plain instances come first in declared order and keep their names;
/// generate items follow in declared order, depth-first. Instances emitted
/// under generate scopes receive a hierarchical prefix: labels contribute
/// one segment each, gen-for scopes contribute `<label|gen>_<iteration>`,
/// and segments are joined with `_`. The parent spec's bit map is never
/// touched.
pub fn expand_generates(
	decl: &ModuleDecl,
	env: &ParamBinding,
	diag: &mut DiagnosticBuffer,
) -> Vec<ExpandedInstance> {
	let mut expander = Expander {
		diag,
		out: Vec::new(),
		stack: Vec::new(),
	};
	for inst in &decl.instances {
		expander.emit(inst, env);
	}
	expander.walk_items(&decl.generate_items, env);
	debug!(
		"expanded {} into {} instances",
		decl.name,
		expander.out.len()
	);
	expander.out
}

struct Expander<'a> {
	diag: &'a mut DiagnosticBuffer,
	out: Vec<ExpandedInstance>,
	stack: Vec<String>,
}

impl Expander<'_> {
	fn emit(&mut self, inst: &InstanceDecl, env: &ParamBinding) {
		let mut inst = inst.clone();
		if !self.stack.is_empty() {
			let name = format!("{}_{}", self.stack.join("_"), inst.name);
			inst.name = Symbol::intern(&name);
		}
		self.out.push(ExpandedInstance {
			decl: inst,
			env: env.clone(),
		});
	}

	fn walk_items(&mut self, items: &[GenerateItem], env: &ParamBinding) {
		for item in items {
			match item {
				GenerateItem::Instance(inst) => self.emit(inst, env),
				GenerateItem::If(g) => self.walk_if(g, env),
				GenerateItem::For(g) => self.walk_for(g, env),
				GenerateItem::Case(g) => self.walk_case(g, env),
			}
		}
	}

	fn walk_if(&mut self, g: &GenIf, env: &ParamBinding) {
		let cond = eval_int(&g.cond, env, self.diag);
		let items = if cond != 0 {
			&g.then_items
		} else {
			&g.else_items
		};
		let labelled = g.label.is_valid();
		if labelled {
			self.stack.push(g.label.text().to_owned());
		}
		self.walk_items(items, env);
		if labelled {
			self.stack.pop();
		}
	}

	fn walk_for(&mut self, g: &GenFor, env: &ParamBinding) {
		let start = eval_int(&g.start, env, self.diag);
		let limit = eval_int(&g.limit, env, self.diag);
		let step = eval_int(&g.step, env, self.diag);
		if step == 0 {
			self.diag.report(DiagnosticKind::ZeroStep { label: g.label });
			return;
		}

		let prefix = if g.label.is_valid() {
			g.label.text()
		} else {
			"gen"
		};

		let mut i = start;
		let mut iteration = 0u64;
		while (step > 0 && i < limit) || (step < 0 && i > limit) {
			let mut scope = env.clone();
			scope.insert(g.loop_var, i);
			self.stack.push(format!("{}_{}", prefix, iteration));
			self.walk_items(&g.body, &scope);
			self.stack.pop();
			i = i.wrapping_add(step);
			iteration += 1;
		}
	}

	fn walk_case(&mut self, g: &GenCase, env: &ParamBinding) {
		let value = eval_int(&g.expr, env, self.diag);

		let mut selected = None;
		for item in &g.items {
			let mut matched = false;
			for choice in &item.choices {
				if eval_int(choice, env, self.diag) == value {
					matched = true;
					break;
				}
			}
			if matched {
				selected = Some(item);
				break;
			}
		}
		if selected.is_none() {
			selected = g.items.iter().find(|item| item.is_default);
		}

		let item = match selected {
			Some(item) => item,
			None => return,
		};
		let labelled = item.label.is_valid();
		if labelled {
			self.stack.push(item.label.text().to_owned());
		}
		self.walk_items(&item.body, env);
		if labelled {
			self.stack.pop();
		}
	}
}
