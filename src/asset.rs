//! Protected asset references and query composition helpers.

// crates.io
use url::form_urlencoded;
// self
use crate::{_prelude::*, config, token::TokenSecret};

/// Points at a file attached to a record, e.g. a food log photo.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileRef {
	/// Collection id or name owning the record.
	pub collection: String,
	/// Record identifier.
	pub record_id: String,
	/// Stored file name.
	pub filename: String,
	/// Optional thumbnail size, e.g. `100x100`.
	pub thumb: Option<String>,
	/// Forces a download disposition when `true`.
	pub download: bool,
}
impl FileRef {
	/// Creates a reference to the full-size file.
	pub fn new(
		collection: impl Into<String>,
		record_id: impl Into<String>,
		filename: impl Into<String>,
	) -> Self {
		Self {
			collection: collection.into(),
			record_id: record_id.into(),
			filename: filename.into(),
			thumb: None,
			download: false,
		}
	}

	/// Requests a server-generated thumbnail.
	pub fn with_thumb(mut self, size: impl Into<String>) -> Self {
		self.thumb = Some(size.into());

		self
	}

	/// Requests a download disposition.
	pub fn as_download(mut self) -> Self {
		self.download = true;

		self
	}

	/// Builds the unauthenticated asset URL below `base`.
	pub fn url(&self, base: &Url) -> Url {
		let mut url = config::join_segments(
			base,
			&["api", "files", &self.collection, &self.record_id, &self.filename],
		);

		if self.thumb.is_some() || self.download {
			let mut query = url.query_pairs_mut();

			if let Some(thumb) = &self.thumb {
				query.append_pair("thumb", thumb);
			}
			if self.download {
				query.append_pair("download", "1");
			}
		}

		url
	}
}

/// Appends `token=<value>` to `base_url`, choosing `&` when a query string is already present.
pub fn append_token(base_url: &str, token: &TokenSecret) -> String {
	let separator = if base_url.contains('?') { '&' } else { '?' };
	let encoded: String = form_urlencoded::byte_serialize(token.expose().as_bytes()).collect();

	format!("{base_url}{separator}token={encoded}")
}
