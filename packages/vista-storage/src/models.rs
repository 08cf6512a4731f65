use time::OffsetDateTime;

/// A collection owned by a caller, with the number of images it holds.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct OwnedCollection {
	pub hash_id: String,
	pub name: String,
	pub image_count: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UploadedImage {
	pub hash_id: String,
	pub name: String,
	/// `None` for anonymous uploads.
	pub owner_id: Option<String>,
	pub created_at: OffsetDateTime,
}
