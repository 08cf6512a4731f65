use std::collections::HashSet;

use vista_domain::{
	media::MediaUrls,
	result::{
		Aggregation, AggregationBucket, COLLECTION_FACET, EntryCollection, IndexerResult, RawEntry,
		ResultEntry, SearchResult, UserAnnotation,
	},
};

use crate::{CallerContext, Result, VistaService};

impl VistaService {
	/// Joins a raw result with the caller's bookmarks and collections.
	///
	/// Bookmarks are fetched with a single lookup covering every entry.
	pub async fn enrich(
		&self,
		result: IndexerResult,
		caller: &CallerContext,
	) -> Result<SearchResult> {
		let bookmarked = match caller.caller_id.as_deref() {
			Some(caller_id) if !result.entries.is_empty() => {
				let ids: Vec<String> = result.entries.iter().map(|entry| entry.id.clone()).collect();

				self.backends.bookmarks.bookmark_status(caller_id, &ids).await?
			},
			_ => HashSet::new(),
		};

		Ok(enrich_result(result, caller, &bookmarked, self.urls()))
	}
}

pub fn enrich_result(
	result: IndexerResult,
	caller: &CallerContext,
	bookmarked: &HashSet<String>,
	urls: &MediaUrls,
) -> SearchResult {
	let entries = result
		.entries
		.into_iter()
		.map(|entry| enrich_entry(entry, caller, bookmarked, urls))
		.collect();
	let mut aggregations: Vec<Aggregation> =
		result.aggregate.into_iter().map(Aggregation::from).collect();

	if !caller.collections.is_empty() {
		aggregations.push(Aggregation {
			field: COLLECTION_FACET.to_string(),
			entries: caller
				.collections
				.iter()
				.map(|collection| AggregationBucket {
					name: collection.name.clone(),
					count: collection.image_count,
					hash_id: Some(collection.hash_id.clone()),
				})
				.collect(),
		});
	}

	SearchResult { entries, aggregations }
}

fn enrich_entry(
	entry: RawEntry,
	caller: &CallerContext,
	bookmarked: &HashSet<String>,
	urls: &MediaUrls,
) -> ResultEntry {
	let collection = entry.collection.map(|collection| EntryCollection {
		user: caller.owns_collection(&collection.id),
		id: collection.id,
		name: collection.name,
		is_public: collection.is_public,
	});
	let owned = collection.as_ref().is_some_and(|collection| collection.user);
	let (path, preview) = if owned {
		(urls.upload_image(&entry.id), urls.upload_image(&entry.id))
	} else {
		(urls.media_image(&entry.id), urls.media_preview(&entry.id))
	};
	let user = UserAnnotation { bookmarked: bookmarked.contains(&entry.id) };

	ResultEntry {
		id: entry.id,
		meta: entry.meta,
		origin: entry.origin,
		classifier: entry.classifier,
		feature: entry.feature,
		coordinates: entry.coordinates,
		distance: entry.distance,
		cluster: entry.cluster,
		padded: entry.padded,
		collection,
		path,
		preview,
		user,
	}
}
