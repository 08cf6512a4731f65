use vista_storage::models::OwnedCollection;

use crate::{Result, VistaService};

/// Who is asking, as far as search is concerned.
#[derive(Debug, Clone, Default)]
pub struct CallerContext {
	/// `None` for anonymous callers.
	pub caller_id: Option<String>,
	pub collections: Vec<OwnedCollection>,
}
impl CallerContext {
	pub fn anonymous() -> Self {
		Self::default()
	}

	pub fn is_authenticated(&self) -> bool {
		self.caller_id.is_some()
	}

	pub fn collection_ids(&self) -> Vec<String> {
		self.collections.iter().map(|collection| collection.hash_id.clone()).collect()
	}

	pub fn owns_collection(&self, hash_id: &str) -> bool {
		self.collections.iter().any(|collection| collection.hash_id == hash_id)
	}
}

impl VistaService {
	/// Builds the caller context for an already authenticated caller id.
	pub async fn resolve_caller(&self, caller_id: Option<&str>) -> Result<CallerContext> {
		let Some(caller_id) = caller_id.map(str::trim).filter(|id| !id.is_empty()) else {
			return Ok(CallerContext::anonymous());
		};
		let collections = self.backends.collections.list_owned_collections(caller_id).await?;

		Ok(CallerContext { caller_id: Some(caller_id.to_string()), collections })
	}
}
