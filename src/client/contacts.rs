//! Contact listing, counting, lookup, and the lazy page stream.

// crates.io
use futures::{Stream, stream};
// self
use crate::{
	_prelude::*,
	client::{ApiRequest, KeapClient},
	model::{Contact, ContactListResponse},
	obs::{self, OperationKind},
};

/// Default page size for contact listings.
pub const DEFAULT_CONTACT_PAGE_SIZE: usize = 200;

/// Sort key accepted by `GET /contacts`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ContactOrder {
	/// Contact id.
	Id,
	/// Creation timestamp.
	#[default]
	DateCreated,
	/// Last update timestamp.
	LastUpdated,
	/// Display name.
	Name,
	/// Primary email.
	Email,
}
impl ContactOrder {
	/// Wire value for the `order` query parameter.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Id => "id",
			Self::DateCreated => "date_created",
			Self::LastUpdated => "last_updated",
			Self::Name => "name",
			Self::Email => "email",
		}
	}
}

/// Sort direction accepted by `GET /contacts`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SortDirection {
	/// Oldest or smallest first.
	Ascending,
	/// Newest or largest first.
	#[default]
	Descending,
}
impl SortDirection {
	/// Wire value for the `order_direction` query parameter.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Ascending => "ASCENDING",
			Self::Descending => "DESCENDING",
		}
	}
}

/// Options for a single [`KeapClient::list_contacts`] page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListContactsOptions {
	/// Page size.
	pub limit: usize,
	/// Number of contacts to skip.
	pub offset: usize,
	/// Sort key.
	pub order: ContactOrder,
	/// Sort direction.
	pub direction: SortDirection,
	/// Requests `tag_ids` on every contact.
	pub include_tag_ids: bool,
}
impl Default for ListContactsOptions {
	fn default() -> Self {
		Self {
			limit: DEFAULT_CONTACT_PAGE_SIZE,
			offset: 0,
			order: ContactOrder::default(),
			direction: SortDirection::default(),
			include_tag_ids: false,
		}
	}
}
impl ListContactsOptions {
	fn into_request(self) -> ApiRequest {
		let request = ApiRequest::get()
			.query("limit", self.limit)
			.query("offset", self.offset)
			.query("order", self.order.as_str())
			.query("order_direction", self.direction.as_str());

		if self.include_tag_ids { request.query("optional_properties", "tag_ids") } else { request }
	}
}

/// One page of contacts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContactPage {
	/// Contacts on this page.
	pub items: Vec<Contact>,
	/// Collection size reported by Keap.
	pub reported_count: Option<u64>,
	/// Absolute URL of the following page, if Keap reported one.
	pub next_cursor: Option<String>,
}

/// Options for [`KeapClient::fetch_all_contacts_paginated`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaginationOptions {
	/// Contacts per page; values below one are treated as one.
	pub batch_size: usize,
	/// Requests `tag_ids` on every contact.
	pub include_tag_ids: bool,
}
impl Default for PaginationOptions {
	fn default() -> Self {
		Self { batch_size: DEFAULT_CONTACT_PAGE_SIZE, include_tag_ids: false }
	}
}

impl KeapClient {
	/// Fetches one page of contacts.
	pub async fn list_contacts(&self, options: ListContactsOptions) -> Result<ContactPage> {
		obs::observe(OperationKind::Contacts, "list_contacts", async move {
			let response: ContactListResponse =
				self.get_json("/contacts", options.into_request(), "contact list").await?;

			Ok(ContactPage {
				items: response.contacts,
				reported_count: response.count,
				next_cursor: response.next,
			})
		})
		.await
	}

	/// Reads the collection size from a single-item page.
	pub async fn count_contacts(&self) -> Result<u64> {
		let page =
			self.list_contacts(ListContactsOptions { limit: 1, ..Default::default() }).await?;

		Ok(page.reported_count.unwrap_or_default())
	}

	/// Looks up the contact whose email matches exactly; `None` when there is no match.
	pub async fn find_contact_by_email(&self, email: &str) -> Result<Option<Contact>> {
		obs::observe(OperationKind::Contacts, "find_contact_by_email", async move {
			let request = ApiRequest::get().query("email", email).query("limit", 1);
			let response: ContactListResponse =
				self.get_json("/contacts", request, "contact lookup").await?;

			Ok(response.contacts.into_iter().next())
		})
		.await
	}

	/// Fetches a single contact by id.
	pub async fn get_contact(&self, contact_id: u64) -> Result<Contact> {
		obs::observe(OperationKind::Contacts, "get_contact", async move {
			self.get_json::<Contact>(&format!("/contacts/{contact_id}"), ApiRequest::get(), "contact")
				.await
		})
		.await
	}

	/// Streams the whole contact collection page by page.
	///
	/// The stream is finite and cannot be restarted. A page shorter than `batch_size` ends it,
	/// and an empty page ends it without being yielded, so a collection of exactly `k` full
	/// pages yields `k` batches. Each page is requested only when the previous one is consumed.
	pub fn fetch_all_contacts_paginated(
		&self,
		options: PaginationOptions,
	) -> impl Stream<Item = Result<Vec<Contact>>> + '_ {
		let batch_size = options.batch_size.max(1);
		let include_tag_ids = options.include_tag_ids;

		stream::try_unfold(Some(0_usize), move |cursor| async move {
			let Some(offset) = cursor else {
				return Ok::<_, Error>(None);
			};
			let page = self
				.list_contacts(ListContactsOptions {
					limit: batch_size,
					offset,
					include_tag_ids,
					..Default::default()
				})
				.await?;

			if page.items.is_empty() {
				return Ok(None);
			}

			let next = (page.items.len() >= batch_size).then_some(offset + batch_size);

			Ok(Some((page.items, next)))
		})
	}
}
