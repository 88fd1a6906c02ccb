//! Module containing various utilities.

use std::path::{Path, PathBuf};

use itertools::Itertools;

/// Simple helper to remove the contents of a directory without removing the directory itself.
pub fn remove_dir_contents(path: &Path) -> eyre::Result<()> {
	for entry in path.read_dir()? {
		let path = entry?.path();
		if path.is_dir() {
			std::fs::remove_dir_all(&path)?;
		} else {
			std::fs::remove_file(&path)?;
		}
	}

	Ok(())
}

/// Gets the name of a template or page from its path relative to its source directory.
///
/// The name has no extension and always uses `/` as its separator.
pub fn get_name(path: &Path) -> (PathBuf, String) {
	let name = path.with_extension("");
	let name_str = name
		.components()
		.map(|component| component.as_os_str().to_string_lossy())
		.join("/");
	(name, name_str)
}
