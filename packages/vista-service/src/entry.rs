use serde::Deserialize;
use serde_json::json;

use vista_domain::result::EntryDetail;

use crate::{Error, Result, VistaService};

#[derive(Debug, Clone, Deserialize)]
pub struct GetRequest {
	pub id: String,
}

impl VistaService {
	/// Looks up one image by id: indexed entries first, then uploaded images.
	pub async fn get(&self, request: &GetRequest) -> Result<EntryDetail> {
		let image_id = request.id.trim();

		if image_id.is_empty() {
			return Err(Error::InvalidRequest { message: "id must be non-empty.".to_string() });
		}

		let indexer_error = match self.backends.indexer.get_entry(image_id).await {
			Ok(Some(entry)) =>
				return Ok(EntryDetail {
					path: self.urls().media_image(&entry.id),
					preview: self.urls().media_preview(&entry.id),
					id: entry.id,
					meta: entry.meta,
					origin: entry.origin,
					classifier: entry.classifier,
					feature: entry.feature,
				}),
			Ok(None) => None,
			Err(err) => {
				tracing::warn!(image_id, error = %err, "Indexer entry lookup failed.");

				Some(err)
			},
		};

		if let Some(upload) = self.backends.collections.find_uploaded_image(image_id).await? {
			return Ok(EntryDetail {
				id: upload.hash_id.clone(),
				meta: json!([{ "name": "title", "value_str": upload.name }]),
				origin: serde_json::Value::Null,
				classifier: serde_json::Value::Null,
				feature: serde_json::Value::Null,
				path: self.urls().upload_image(&upload.hash_id),
				preview: self.urls().upload_image(&upload.hash_id),
			});
		}

		match indexer_error {
			Some(err) => Err(err.into()),
			None => Err(Error::NotFound { message: format!("No image with id {image_id:?}.") }),
		}
	}
}
