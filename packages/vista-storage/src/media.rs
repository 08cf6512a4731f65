use std::{
	io::ErrorKind,
	path::{Path, PathBuf},
};

use vista_domain::media::sharded_path;

use crate::{Error, Result};

/// Read-only access to image files on disk.
#[derive(Debug, Clone)]
pub struct MediaStore {
	media_root: PathBuf,
	upload_root: PathBuf,
}
impl MediaStore {
	pub fn new(media_root: impl Into<PathBuf>, upload_root: impl Into<PathBuf>) -> Self {
		Self { media_root: media_root.into(), upload_root: upload_root.into() }
	}

	pub fn from_config(cfg: &vista_config::Media) -> Self {
		Self::new(cfg.media_root.clone(), cfg.upload_root.clone())
	}

	/// Bytes of an uploaded image in the private staging area.
	pub async fn read_private(&self, image_id: &str) -> Result<Option<Vec<u8>>> {
		read_optional(&self.upload_root, image_id).await
	}

	/// Bytes of an indexed image in the public media root.
	pub async fn read_public(&self, image_id: &str) -> Result<Option<Vec<u8>>> {
		read_optional(&self.media_root, image_id).await
	}
}

async fn read_optional(root: &Path, image_id: &str) -> Result<Option<Vec<u8>>> {
	let valid = !image_id.is_empty()
		&& image_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

	if !valid {
		return Err(Error::InvalidArgument(format!(
			"Image id {image_id:?} is not a valid file name."
		)));
	}

	match tokio::fs::read(sharded_path(root, image_id)).await {
		Ok(bytes) => Ok(Some(bytes)),
		Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
		Err(err) => Err(err.into()),
	}
}
