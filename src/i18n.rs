//! Module containing the site's translation tables.

use std::{collections::HashMap, path::Path};

use eyre::WrapErr;
use serde_yml::Value;
use walkdir::WalkDir;

/// Translation tables keyed by language tag, loaded from `languages/<tag>.yml`.
#[derive(Debug, Clone, Default)]
pub struct I18n {
	tables: HashMap<String, HashMap<String, String>>,
}

impl I18n {
	/// Loads every language file in the given directory. A missing directory means no translations.
	pub fn load(path: &Path) -> eyre::Result<Self> {
		let mut i18n = Self::default();
		if !path.exists() {
			return Ok(i18n);
		}

		for entry in WalkDir::new(path).max_depth(1).into_iter() {
			let entry = entry.wrap_err("Failed to read language entry")?;
			let file = entry.path();
			let is_yaml = matches!(
				file.extension().and_then(|ext| ext.to_str()),
				Some("yml" | "yaml")
			);
			if !is_yaml || !entry.file_type().is_file() {
				continue;
			}
			let Some(language) = file.file_stem().and_then(|stem| stem.to_str()) else {
				tracing::warn!(path = ?file, "language file name is not valid UTF-8, skipping");
				continue;
			};

			let input = std::fs::read_to_string(file)
				.wrap_err_with(|| format!("Failed to read language file at {}", file.display()))?;
			i18n.insert_yaml(language, &input)
				.wrap_err_with(|| format!("Failed to parse language file at {}", file.display()))?;
		}

		tracing::debug!(languages = i18n.tables.len(), "loaded translations");
		Ok(i18n)
	}

	/// Adds a language from YAML. Nested keys are joined with dots.
	pub fn insert_yaml(&mut self, language: &str, input: &str) -> eyre::Result<()> {
		let value: Value = serde_yml::from_str(input)?;
		let table = self.tables.entry(language.to_string()).or_default();
		flatten_into(table, String::new(), &value);
		Ok(())
	}

	/// Looks up a key in a single language's table.
	pub fn translate(&self, language: &str, key: &str) -> Option<&str> {
		self.tables
			.get(language)
			.and_then(|table| table.get(key))
			.map(String::as_str)
	}

	/// Gets a language's display name, falling back to its tag.
	pub fn language_name<'l>(&'l self, language: &'l str) -> &'l str {
		self.translate(language, "name").unwrap_or(language)
	}
}

fn flatten_into(table: &mut HashMap<String, String>, prefix: String, value: &Value) {
	match value {
		Value::Mapping(mapping) => {
			for (key, value) in mapping {
				let Some(key) = scalar(key) else {
					continue;
				};
				let key = if prefix.is_empty() {
					key
				} else {
					format!("{prefix}.{key}")
				};
				flatten_into(table, key, value);
			}
		}
		other => {
			if let Some(text) = scalar(other) {
				if !prefix.is_empty() {
					table.insert(prefix, text);
				}
			}
		}
	}
}

fn scalar(value: &Value) -> Option<String> {
	match value {
		Value::String(text) => Some(text.clone()),
		Value::Number(number) => Some(number.to_string()),
		Value::Bool(flag) => Some(flag.to_string()),
		_ => None,
	}
}
