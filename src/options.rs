//! Configuration for building and evaluating rolls.

use serde::{Deserialize, Serialize};

#[cfg(feature = "fastrand")]
use crate::dice::roller::{FastRand, Max, Min, Roller};

/// Options that control how a formula is substituted and evaluated
///
/// Deserializing fills in defaults for any missing fields, so options can be given partially (e.g. from a JSON config
/// file):
/// ```
/// use alea::{EvalMode, RollOptions};
///
/// let options: RollOptions = serde_json::from_str(r#"{ "mode": "maximize" }"#)?;
/// assert_eq!(options.mode, EvalMode::Maximize);
/// assert_eq!(options.missing_data.as_deref(), Some("0"));
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
#[non_exhaustive]
pub struct RollOptions {
	/// Text to substitute for data references that can't be resolved. When `None`, references are left as written
	/// (which will then fail to parse).
	pub missing_data: Option<String>,

	/// Whether to log a warning for each data reference that can't be resolved
	pub warn_missing: bool,

	/// How dice results are generated
	pub mode: EvalMode,

	/// Maximum number of individual die results to list when describing a roll
	pub list_limit: Option<usize>,
}

impl RollOptions {
	/// Creates a new options builder, starting from the defaults.
	#[must_use]
	#[inline]
	pub fn builder() -> Builder {
		Builder::default()
	}
}

impl Default for RollOptions {
	fn default() -> Self {
		Self {
			missing_data: Some("0".to_owned()),
			warn_missing: true,
			mode: EvalMode::default(),
			list_limit: None,
		}
	}
}

/// How dice results are generated during evaluation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[expect(clippy::exhaustive_enums, reason = "Covers every way of picking a face")]
pub enum EvalMode {
	/// Uniformly random faces
	#[default]
	Random,

	/// Every die shows its lowest face
	Minimize,

	/// Every die shows its highest face
	Maximize,
}

impl EvalMode {
	/// Creates a roller for the mode. Random rollers use the given seed when there is one.
	///
	/// # Examples
	/// ```
	/// use alea::{Context, EvalMode, Roll};
	///
	/// let mut roll = Roll::new("2d6 + 1", &Context::new())?;
	/// let total = roll.evaluate(&mut EvalMode::Maximize.roller(None))?;
	/// assert_eq!(total, 13.0);
	/// # Ok::<(), alea::roll::Error>(())
	/// ```
	#[cfg(feature = "fastrand")]
	#[must_use]
	pub fn roller(self, seed: Option<u64>) -> Box<dyn Roller> {
		match self {
			Self::Random => Box::new(seed.map_or_else(FastRand::default, FastRand::with_seed)),
			Self::Minimize => Box::new(Min),
			Self::Maximize => Box::new(Max),
		}
	}
}

/// Builds [`RollOptions`] with a fluent interface.
///
/// # Examples
/// ```
/// use alea::{EvalMode, RollOptions};
///
/// let options = RollOptions::builder().missing_data(None::<String>).mode(EvalMode::Minimize).build();
/// assert_eq!(options.missing_data, None);
/// assert_eq!(options.mode, EvalMode::Minimize);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Builder(RollOptions);

impl Builder {
	/// Sets the text substituted for missing data references.
	#[must_use]
	pub fn missing_data(mut self, text: Option<impl Into<String>>) -> Self {
		self.0.missing_data = text.map(Into::into);
		self
	}

	/// Sets whether missing data references are logged.
	#[must_use]
	pub const fn warn_missing(mut self, warn: bool) -> Self {
		self.0.warn_missing = warn;
		self
	}

	/// Sets the evaluation mode.
	#[must_use]
	pub const fn mode(mut self, mode: EvalMode) -> Self {
		self.0.mode = mode;
		self
	}

	/// Sets the maximum number of die results listed in descriptions.
	#[must_use]
	pub const fn list_limit(mut self, limit: Option<usize>) -> Self {
		self.0.list_limit = limit;
		self
	}

	/// Finalizes the options.
	#[must_use]
	pub fn build(self) -> RollOptions {
		self.0
	}
}
