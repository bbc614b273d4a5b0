//! Engine configuration.
//!
//! Settings come from [`Default`], a TOML document, or environment variables
//! prefixed with `WAYFINDER_`:
//!
//! ```toml
//! max_redirects = 5
//! data_suffix = ".json"
//! root_id = "app"
//! prefetch_on_hover = true
//! scroll_restoration = true
//! script_chunks = ["/client/main.js"]
//! ```

use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{SettingsError, SettingsResult};

/// Default environment variable prefix.
pub const ENV_PREFIX: &str = "WAYFINDER_";

/// Navigation engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigatorSettings {
	/// Maximum number of redirects followed for one navigation.
	pub max_redirects: u32,
	/// Suffix of companion data endpoints; links ending with it are never
	/// intercepted.
	pub data_suffix: String,
	/// Id of the element the page renders into.
	pub root_id: String,
	/// Whether hovering an in-app link prefetches its data.
	pub prefetch_on_hover: bool,
	/// Whether history navigation restores recorded scroll offsets.
	pub scroll_restoration: bool,
	/// Script chunks every page loads, announced in the `Link` header.
	pub script_chunks: Vec<String>,
}

impl Default for NavigatorSettings {
	fn default() -> Self {
		Self {
			max_redirects: 5,
			data_suffix: ".json".to_string(),
			root_id: "app".to_string(),
			prefetch_on_hover: true,
			scroll_restoration: true,
			script_chunks: vec!["/client/main.js".to_string()],
		}
	}
}

impl NavigatorSettings {
	/// Parses settings from TOML; missing keys keep their defaults.
	pub fn from_toml_str(input: &str) -> SettingsResult<Self> {
		let settings: Self =
			toml::from_str(input).map_err(|e| SettingsError::Parse(e.to_string()))?;
		settings.validate()?;
		Ok(settings)
	}

	/// Loads defaults overridden by `WAYFINDER_*` environment variables.
	pub fn from_env() -> SettingsResult<Self> {
		Self::default().merge_env(ENV_PREFIX)
	}

	/// Overrides fields from environment variables named `{prefix}{FIELD}`.
	pub fn merge_env(mut self, prefix: &str) -> SettingsResult<Self> {
		if let Some(value) = read_var(prefix, "MAX_REDIRECTS")? {
			self.max_redirects = value;
		}
		if let Some(value) = read_var::<String>(prefix, "DATA_SUFFIX")? {
			self.data_suffix = value;
		}
		if let Some(value) = read_var::<String>(prefix, "ROOT_ID")? {
			self.root_id = value;
		}
		if let Some(value) = read_bool(prefix, "PREFETCH_ON_HOVER")? {
			self.prefetch_on_hover = value;
		}
		if let Some(value) = read_bool(prefix, "SCROLL_RESTORATION")? {
			self.scroll_restoration = value;
		}
		if let Some(value) = read_var::<String>(prefix, "SCRIPT_CHUNKS")? {
			self.script_chunks = parse_list(&value);
		}
		self.validate()?;
		Ok(self)
	}

	/// Checks invariants between fields.
	pub fn validate(&self) -> SettingsResult<()> {
		if self.max_redirects == 0 {
			return Err(SettingsError::Invalid(
				"max_redirects must be at least 1".to_string(),
			));
		}
		if !self.data_suffix.starts_with('.') || self.data_suffix.len() < 2 {
			return Err(SettingsError::Invalid(format!(
				"data_suffix '{}' must start with '.'",
				self.data_suffix
			)));
		}
		if self.root_id.is_empty() {
			return Err(SettingsError::Invalid("root_id must not be empty".to_string()));
		}
		Ok(())
	}

	/// Returns the companion data endpoint for a page path.
	///
	/// `/` maps to `/index.json`; trailing slashes are dropped.
	pub fn data_url(&self, path: &str) -> String {
		let trimmed = path.trim_end_matches('/');
		if trimmed.is_empty() {
			format!("/index{}", self.data_suffix)
		} else {
			format!("{}{}", trimmed, self.data_suffix)
		}
	}
}

fn read_var<T>(prefix: &str, key: &str) -> SettingsResult<Option<T>>
where
	T: FromStr,
	T::Err: std::fmt::Display,
{
	let full_key = format!("{prefix}{key}");
	match env::var(&full_key) {
		Ok(raw) => raw
			.trim()
			.parse()
			.map(Some)
			.map_err(|e: T::Err| SettingsError::Env {
				key: full_key,
				value: raw.clone(),
				message: e.to_string(),
			}),
		Err(_) => Ok(None),
	}
}

fn read_bool(prefix: &str, key: &str) -> SettingsResult<Option<bool>> {
	let Some(raw) = read_var::<String>(prefix, key)? else {
		return Ok(None);
	};
	match raw.to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Ok(Some(true)),
		"0" | "false" | "no" | "off" => Ok(Some(false)),
		_ => Err(SettingsError::Env {
			key: format!("{prefix}{key}"),
			value: raw,
			message: "expected a boolean".to_string(),
		}),
	}
}

fn parse_list(raw: &str) -> Vec<String> {
	raw.split(',')
		.map(str::trim)
		.filter(|item| !item.is_empty())
		.map(str::to_string)
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serial_test::serial;

	const TEST_PREFIX: &str = "WAYFINDER_TEST_";

	fn clear_test_env() {
		for key in [
			"MAX_REDIRECTS",
			"DATA_SUFFIX",
			"ROOT_ID",
			"PREFETCH_ON_HOVER",
			"SCROLL_RESTORATION",
			"SCRIPT_CHUNKS",
		] {
			// SAFETY: tests touching the environment are serialized
			unsafe { env::remove_var(format!("{TEST_PREFIX}{key}")) };
		}
	}

	fn set_test_env(key: &str, value: &str) {
		// SAFETY: tests touching the environment are serialized
		unsafe { env::set_var(format!("{TEST_PREFIX}{key}"), value) };
	}

	#[rstest]
	fn test_defaults() {
		let settings = NavigatorSettings::default();
		assert_eq!(settings.max_redirects, 5);
		assert_eq!(settings.data_suffix, ".json");
		assert_eq!(settings.root_id, "app");
		assert!(settings.prefetch_on_hover);
		assert!(settings.scroll_restoration);
		assert_eq!(settings.script_chunks, vec!["/client/main.js".to_string()]);
		assert!(settings.validate().is_ok());
	}

	#[rstest]
	fn test_from_toml_keeps_defaults_for_missing_keys() {
		let settings = NavigatorSettings::from_toml_str(
			r#"
			max_redirects = 3
			script_chunks = ["/client/main.js", "/client/_.1.js"]
			"#,
		)
		.unwrap();

		assert_eq!(settings.max_redirects, 3);
		assert_eq!(settings.script_chunks.len(), 2);
		assert_eq!(settings.root_id, "app");
	}

	#[rstest]
	#[case("max_redirects = \"five\"")]
	#[case("max_redirects = 0")]
	#[case("data_suffix = \"json\"")]
	fn test_from_toml_rejects_invalid(#[case] input: &str) {
		assert!(NavigatorSettings::from_toml_str(input).is_err());
	}

	#[rstest]
	#[serial(wayfinder_env)]
	fn test_merge_env_overrides() {
		clear_test_env();
		set_test_env("MAX_REDIRECTS", "2");
		set_test_env("PREFETCH_ON_HOVER", "off");
		set_test_env("SCRIPT_CHUNKS", "/a.js, /b.js");

		let settings = NavigatorSettings::default()
			.merge_env(TEST_PREFIX)
			.unwrap();
		clear_test_env();

		assert_eq!(settings.max_redirects, 2);
		assert!(!settings.prefetch_on_hover);
		assert_eq!(settings.script_chunks, vec!["/a.js", "/b.js"]);
		assert!(settings.scroll_restoration);
	}

	#[rstest]
	#[serial(wayfinder_env)]
	fn test_merge_env_rejects_bad_values() {
		clear_test_env();
		set_test_env("SCROLL_RESTORATION", "sometimes");

		let result = NavigatorSettings::default().merge_env(TEST_PREFIX);
		clear_test_env();

		assert!(matches!(result, Err(SettingsError::Env { .. })));
	}

	#[rstest]
	#[case("/", "/index.json")]
	#[case("/blog", "/blog.json")]
	#[case("/blog/hello/", "/blog/hello.json")]
	fn test_data_url(#[case] path: &str, #[case] expected: &str) {
		assert_eq!(NavigatorSettings::default().data_url(path), expected);
	}
}
