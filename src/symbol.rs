use bimap::BiHashMap;
use lazy_static::lazy_static;
use std::fmt;
use std::sync::Mutex;

const INVALID_ID: u32 = u32::MAX;
const INVALID_TEXT: &str = "<Invalid>";

/// Process-wide intern pool. Append-only: interned strings live until
/// process exit, so `Symbol::text()` can return `&'static str` after the
/// lock is released.
struct SymbolPool {
	entries: BiHashMap<u32, &'static str>,
}

impl SymbolPool {
	fn intern(&mut self, text: &str) -> u32 {
		if let Some(id) = self.entries.get_by_right(text) {
			return *id;
		}
		let id = self.entries.len() as u32;
		assert!(id != INVALID_ID, "symbol pool exhausted");
		let stored: &'static str = Box::leak(text.to_owned().into_boxed_str());
		self.entries.insert(id, stored);
		id
	}
}

lazy_static! {
	static ref POOL: Mutex<SymbolPool> = Mutex::new(SymbolPool {
		entries: BiHashMap::new(),
	});
}

/// Interned identifier handle. Equality, ordering and hashing all use the
/// dense handle; two symbols are equal iff the original byte strings are
/// equal within this process.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol {
	id: u32,
}

impl Symbol {
	/// Sentinel symbol; renders as `"<Invalid>"`.
	pub const INVALID: Symbol = Symbol { id: INVALID_ID };

	/// Interns the given text, creating a pool entry if absent.
	pub fn intern(text: &str) -> Symbol {
		let mut pool = POOL.lock().expect("symbol pool mutex poisoned");
		Symbol {
			id: pool.intern(text),
		}
	}

	/// Looks up previously interned text without creating an entry.
	pub fn try_lookup(text: &str) -> Option<Symbol> {
		let pool = POOL.lock().expect("symbol pool mutex poisoned");
		pool.entries.get_by_right(text).map(|id| Symbol { id: *id })
	}

	/// Returns the interned text. The reference stays valid for the process
	/// lifetime regardless of later interner activity.
	pub fn text(self) -> &'static str {
		if self.id == INVALID_ID {
			return INVALID_TEXT;
		}
		let pool = POOL.lock().expect("symbol pool mutex poisoned");
		pool.entries.get_by_left(&self.id).copied().unwrap_or(INVALID_TEXT)
	}

	pub fn is_valid(self) -> bool {
		self.id != INVALID_ID
	}

	/// Raw dense handle.
	pub fn id(self) -> u32 {
		self.id
	}
}

impl Default for Symbol {
	fn default() -> Self {
		Symbol::INVALID
	}
}

impl fmt::Display for Symbol {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.text())
	}
}

impl fmt::Debug for Symbol {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Symbol({}, {:?})", self.id, self.text())
	}
}

impl From<&str> for Symbol {
	fn from(text: &str) -> Self {
		Symbol::intern(text)
	}
}
