pub fn render_schema() -> String {
	expand_includes(include_str!("../../../sql/init.sql"))
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"tables/001_search_result_cache.sql" =>
					out.push_str(include_str!("../../../sql/tables/001_search_result_cache.sql")),
				"tables/002_search_job_links.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_search_job_links.sql")),
				"tables/003_collections.sql" =>
					out.push_str(include_str!("../../../sql/tables/003_collections.sql")),
				"tables/004_collection_images.sql" =>
					out.push_str(include_str!("../../../sql/tables/004_collection_images.sql")),
				"tables/005_bookmarks.sql" =>
					out.push_str(include_str!("../../../sql/tables/005_bookmarks.sql")),
				"tables/006_uploaded_images.sql" =>
					out.push_str(include_str!("../../../sql/tables/006_uploaded_images.sql")),
				_ => out.push_str(line),
			}
		} else {
			out.push_str(line);
		}

		out.push('\n');
	}

	out
}
