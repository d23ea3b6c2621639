//! Data contexts and `@path` reference substitution for formulas.

use core::fmt;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Matches data references like `@attributes.str.mod`
#[expect(clippy::expect_used, reason = "Pattern is a literal")]
static REFERENCE: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"@([A-Za-z0-9._-]+)").expect("reference pattern should be valid"));

/// Nested data that formulas can reference by dotted path, e.g. `@skills.stealth` or `@party.0.level`
///
/// # Examples
/// ```
/// use alea::Context;
///
/// let mut data = Context::new();
/// data.set("attributes.str", 3);
/// assert_eq!(data.get("attributes.str"), Some(&serde_json::json!(3)));
/// assert_eq!(data.get("attributes.dex"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context(Value);

impl Context {
	/// Creates an empty context.
	#[must_use]
	pub fn new() -> Self {
		Self(Value::Object(Map::new()))
	}

	/// Creates a context from any serializable value (normally a map or struct).
	///
	/// # Errors
	/// If the value can't be serialized to JSON, an error is returned.
	pub fn from_value(value: impl Serialize) -> Result<Self, serde_json::Error> {
		serde_json::to_value(value).map(Self)
	}

	/// Sets a value at a dotted path, creating intermediate objects as needed and replacing any non-object values in
	/// the way. Values that can't be serialized are ignored.
	pub fn set(&mut self, path: &str, value: impl Serialize) {
		let Ok(value) = serde_json::to_value(value) else {
			tracing::warn!(path, "ignoring unserializable context value");
			return;
		};

		let mut node = &mut self.0;
		for key in path.split('.') {
			if !node.is_object() {
				*node = Value::Object(Map::new());
			}
			let Value::Object(map) = node else {
				return;
			};
			node = map.entry(key).or_insert(Value::Null);
		}
		*node = value;
	}

	/// Gets the value at a dotted path. Numeric path segments index into arrays.
	#[must_use]
	pub fn get(&self, path: &str) -> Option<&Value> {
		path.split('.').try_fold(&self.0, |node, key| match node {
			Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
			_ => node.get(key),
		})
	}

	/// Gets the value at a dotted path as formula text. Only scalars (numbers, strings, and booleans) can be used in
	/// formulas; anything else is treated as missing.
	#[must_use]
	pub fn lookup(&self, path: &str) -> Option<String> {
		match self.get(path)? {
			Value::Number(num) => Some(num.to_string()),
			Value::String(text) => Some(text.clone()),
			Value::Bool(val) => Some(val.to_string()),
			Value::Null | Value::Array(..) | Value::Object(..) => None,
		}
	}

	/// Gets the underlying JSON value of the context.
	#[must_use]
	#[inline]
	pub const fn as_value(&self) -> &Value {
		&self.0
	}
}

impl Default for Context {
	/// Creates an empty context.
	fn default() -> Self {
		Self::new()
	}
}

impl From<Value> for Context {
	fn from(value: Value) -> Self {
		Self(value)
	}
}

/// Reference to a data path that couldn't be resolved during substitution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::exhaustive_structs)]
pub struct MissingData {
	/// Path that was referenced
	pub path: String,

	/// Text that was substituted in its place, if any
	pub substituted: Option<String>,
}

impl fmt::Display for MissingData {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.substituted {
			Some(text) => write!(f, "@{} is missing, substituted {text}", self.path),
			None => write!(f, "@{} is missing", self.path),
		}
	}
}

/// Formula with all of its data references replaced
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::exhaustive_structs)]
pub struct Substituted {
	/// Formula after substitution
	pub formula: String,

	/// References that couldn't be resolved, in order of appearance
	pub missing: Vec<MissingData>,
}

/// Replaces every `@path` reference in a formula with the corresponding scalar from the data context.
///
/// References to paths that don't exist (or don't hold a scalar) are replaced with `missing` when given, or left as
/// written otherwise. Either way they're recorded in [`Substituted::missing`], and a warning is logged for each when
/// `warn` is set.
///
/// # Examples
/// ```
/// use alea::data::{substitute, Context};
///
/// let mut data = Context::new();
/// data.set("prof", 2);
///
/// let result = substitute("1d20 + @prof + @bonus", &data, Some("0"), false);
/// assert_eq!(result.formula, "1d20 + 2 + 0");
/// assert_eq!(result.missing[0].path, "bonus");
/// ```
#[must_use]
pub fn substitute(formula: &str, data: &Context, missing: Option<&str>, warn: bool) -> Substituted {
	let mut missing_refs = Vec::new();

	let formula = REFERENCE
		.replace_all(formula, |caps: &Captures<'_>| {
			let path = &caps[1];
			if let Some(val) = data.lookup(path) {
				return val;
			}

			if warn {
				tracing::warn!(path, substituted = missing, "formula references missing data");
			}
			missing_refs.push(MissingData {
				path: path.to_owned(),
				substituted: missing.map(ToOwned::to_owned),
			});
			missing.map_or_else(|| caps[0].to_owned(), ToOwned::to_owned)
		})
		.into_owned();

	Substituted {
		formula,
		missing: missing_refs,
	}
}
