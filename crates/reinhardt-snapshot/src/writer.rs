//! Writing generated loaders to disk.

use std::path::{Path, PathBuf};

use crate::error::{SnapshotError, SnapshotResult};
use crate::naming::FixtureName;

/// Whether a write created a new file or replaced one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
	/// The file did not exist.
	Created,
	/// An existing file was replaced.
	Updated,
}

/// Writes loader files under one output directory.
#[derive(Debug, Clone)]
pub struct FixtureWriter {
	root: PathBuf,
	backup_existing: bool,
}

impl FixtureWriter {
	/// Creates a writer for `root`. Existing files are backed up by default.
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self {
			root: root.into(),
			backup_existing: true,
		}
	}

	/// Enables or disables backups of replaced files.
	pub fn with_backup(mut self, backup_existing: bool) -> Self {
		self.backup_existing = backup_existing;
		self
	}

	/// Output directory.
	pub fn root(&self) -> &Path {
		&self.root
	}

	/// Path of the loader file for `name`.
	pub fn fixture_path(&self, name: &FixtureName) -> SnapshotResult<PathBuf> {
		self.file_path(&name.file_name())
	}

	/// Path of the snapshot index module.
	pub fn index_path(&self) -> PathBuf {
		self.root.join("mod.rs")
	}

	/// Path of `file_name` inside the output directory.
	///
	/// # Errors
	///
	/// [`SnapshotError::PathTraversal`] if the name is empty or could escape
	/// the directory.
	pub fn file_path(&self, file_name: &str) -> SnapshotResult<PathBuf> {
		validate_path_component(file_name)?;
		Ok(self.root.join(file_name))
	}

	/// Whether a file exists at `path`.
	pub fn exists(&self, path: &Path) -> bool {
		path.is_file()
	}

	/// Creates `dir` and its parents when missing.
	pub fn ensure_dir(&self, dir: &Path) -> SnapshotResult<()> {
		if !dir.is_dir() {
			std::fs::create_dir_all(dir)?;
			tracing::info!(path = %dir.display(), "created directory");
		}
		Ok(())
	}

	/// Copies `path` to `<path>.bak` (for `x.rs`, `x.rs.bak`).
	///
	/// Returns the backup path, or `None` when there was nothing to copy.
	pub fn backup(&self, path: &Path) -> SnapshotResult<Option<PathBuf>> {
		if !path.is_file() {
			return Ok(None);
		}
		let backup_path = backup_path_for(path);
		std::fs::copy(path, &backup_path)?;
		tracing::info!(
			path = %path.display(),
			backup = %backup_path.display(),
			"backed up existing file"
		);
		Ok(Some(backup_path))
	}

	/// Writes `content` to `path`.
	///
	/// Parent directories are created as needed. An existing file is backed
	/// up first when backups are enabled, then replaced atomically.
	pub fn write(&self, path: &Path, content: &str) -> SnapshotResult<WriteStatus> {
		if let Some(parent) = path.parent() {
			self.ensure_dir(parent)?;
		}
		let status = if path.is_file() {
			if self.backup_existing {
				self.backup(path)?;
			}
			WriteStatus::Updated
		} else {
			WriteStatus::Created
		};

		atomic_write(path, content)?;
		match status {
			WriteStatus::Created => tracing::info!(path = %path.display(), "created file"),
			WriteStatus::Updated => tracing::info!(path = %path.display(), "updated file"),
		}
		Ok(status)
	}
}

fn backup_path_for(path: &Path) -> PathBuf {
	let mut name = path.as_os_str().to_os_string();
	name.push(".bak");
	PathBuf::from(name)
}

fn atomic_write(path: &Path, content: &str) -> std::io::Result<()> {
	// Preserve original permissions before overwrite (if the file exists)
	let original_perms = std::fs::metadata(path).ok().map(|m| m.permissions());

	let tmp_path = path.with_extension("tmp");
	std::fs::write(&tmp_path, content)?;

	if let Err(e) = std::fs::rename(&tmp_path, path) {
		let _ = std::fs::remove_file(&tmp_path);
		return Err(e);
	}

	if let Some(perms) = original_perms {
		std::fs::set_permissions(path, perms)?;
	}

	Ok(())
}

fn validate_path_component(component: &str) -> SnapshotResult<()> {
	if component.is_empty() {
		return Err(SnapshotError::PathTraversal(
			"file name cannot be empty".to_string(),
		));
	}

	if component.contains("..") {
		return Err(SnapshotError::PathTraversal(format!(
			"file name contains path traversal sequence '..': {}",
			component
		)));
	}

	if component.contains('/') || component.contains('\\') {
		return Err(SnapshotError::PathTraversal(format!(
			"file name contains path separator: {}",
			component
		)));
	}

	if component.contains('\0') {
		return Err(SnapshotError::PathTraversal(format!(
			"file name contains null byte: {}",
			component
		)));
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_write_creates_directories() {
		// Arrange
		let dir = tempfile::tempdir().unwrap();
		let writer = FixtureWriter::new(dir.path().join("src/fixtures"));
		let path = writer
			.fixture_path(&FixtureName::for_snapshot("blog.Book", None))
			.unwrap();

		// Act
		let status = writer.write(&path, "// loader\n").unwrap();

		// Assert
		assert_eq!(status, WriteStatus::Created);
		assert_eq!(path, dir.path().join("src/fixtures/load_blog_book.rs"));
		assert_eq!(std::fs::read_to_string(&path).unwrap(), "// loader\n");
		assert!(!path.with_extension("tmp").exists());
	}

	#[rstest]
	fn test_overwrite_keeps_backup() {
		// Arrange
		let dir = tempfile::tempdir().unwrap();
		let writer = FixtureWriter::new(dir.path());
		let path = dir.path().join("load_blog_tag.rs");
		std::fs::write(&path, "old").unwrap();

		// Act
		let status = writer.write(&path, "new").unwrap();

		// Assert
		assert_eq!(status, WriteStatus::Updated);
		assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
		assert_eq!(
			std::fs::read_to_string(dir.path().join("load_blog_tag.rs.bak")).unwrap(),
			"old"
		);
	}

	#[rstest]
	fn test_overwrite_without_backup() {
		let dir = tempfile::tempdir().unwrap();
		let writer = FixtureWriter::new(dir.path()).with_backup(false);
		let path = dir.path().join("load_blog_tag.rs");
		std::fs::write(&path, "old").unwrap();

		writer.write(&path, "new").unwrap();

		assert!(!dir.path().join("load_blog_tag.rs.bak").exists());
	}

	#[rstest]
	fn test_backup_missing_file() {
		let dir = tempfile::tempdir().unwrap();
		let writer = FixtureWriter::new(dir.path());

		let backup = writer.backup(&dir.path().join("absent.rs")).unwrap();

		assert_eq!(backup, None);
	}

	#[rstest]
	#[case("")]
	#[case("../escape.rs")]
	#[case("nested/file.rs")]
	#[case("nul\0.rs")]
	fn test_file_path_rejects_unsafe_names(#[case] name: &str) {
		let writer = FixtureWriter::new("out");

		let result = writer.file_path(name);

		assert!(matches!(result, Err(SnapshotError::PathTraversal(_))));
	}

	#[rstest]
	fn test_exists_and_index_path() {
		let dir = tempfile::tempdir().unwrap();
		let writer = FixtureWriter::new(dir.path());
		std::fs::write(writer.index_path(), "").unwrap();

		assert!(writer.exists(&writer.index_path()));
		assert!(!writer.exists(dir.path()));
	}
}
