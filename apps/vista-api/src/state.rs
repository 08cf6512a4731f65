use std::sync::Arc;

use time::OffsetDateTime;

use vista_service::{Backends, VistaService};
use vista_storage::{db::Db, queries};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<VistaService>,
}
impl AppState {
	pub async fn new(config: vista_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		if config.search.cache.enabled {
			let purged = queries::purge_expired(&db, OffsetDateTime::now_utc()).await?;

			tracing::info!(purged, "Expired search cache rows purged.");
		}

		let backends = Backends::from_config(&config, db)?;

		Ok(Self::from_service(VistaService::new(config, backends)))
	}

	pub fn from_service(service: VistaService) -> Self {
		Self { service: Arc::new(service) }
	}
}
