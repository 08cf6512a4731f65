use std::path::{Path, PathBuf};

const IMAGE_SUFFIX: &str = ".jpg";
const PREVIEW_SUFFIX: &str = "_m.jpg";

/// Public URL prefixes for indexed media and private uploads.
#[derive(Debug, Clone)]
pub struct MediaUrls {
	media_url: String,
	upload_url: String,
}
impl MediaUrls {
	pub fn new(media_url: impl Into<String>, upload_url: impl Into<String>) -> Self {
		Self { media_url: media_url.into(), upload_url: upload_url.into() }
	}

	pub fn from_config(cfg: &vista_config::Media) -> Self {
		Self::new(cfg.media_url.clone(), cfg.upload_url.clone())
	}

	pub fn media_image(&self, image_id: &str) -> String {
		sharded_url(&self.media_url, image_id, IMAGE_SUFFIX)
	}

	pub fn media_preview(&self, image_id: &str) -> String {
		sharded_url(&self.media_url, image_id, PREVIEW_SUFFIX)
	}

	/// Uploads have no thumbnail, so this serves as both path and preview.
	pub fn upload_image(&self, image_id: &str) -> String {
		sharded_url(&self.upload_url, image_id, IMAGE_SUFFIX)
	}
}

/// `<root>/<id[0..2]>/<id[2..4]>/<id>.jpg`. Ids shorter than four bytes use what they have.
pub fn sharded_path(root: &Path, image_id: &str) -> PathBuf {
	let (first, second) = shards(image_id);

	root.join(first).join(second).join(format!("{image_id}{IMAGE_SUFFIX}"))
}

fn sharded_url(prefix: &str, image_id: &str, suffix: &str) -> String {
	let (first, second) = shards(image_id);

	format!("{prefix}{first}/{second}/{image_id}{suffix}")
}

fn shards(image_id: &str) -> (&str, &str) {
	let first = image_id.get(..2).unwrap_or(image_id);
	let second = image_id.get(2..4).or_else(|| image_id.get(2..)).unwrap_or("");

	(first, second)
}
