//! Tag catalog paging, per-contact tag detail, and tag application.

// self
use crate::{
	_prelude::*,
	client::{ApiRequest, KeapClient},
	model::{ContactTag, ContactTagListResponse, TagListResponse},
	obs::{self, OperationKind},
};

/// Page size used while loading the tag catalog.
pub const TAG_PAGE_SIZE: usize = 1000;

impl KeapClient {
	/// Loads every tag into an id → name map, paging until a short page arrives.
	pub async fn list_all_tags(&self) -> Result<BTreeMap<u64, String>> {
		obs::observe(OperationKind::Tags, "list_all_tags", async move {
			let mut tags = BTreeMap::new();
			let mut offset = 0;

			loop {
				let request =
					ApiRequest::get().query("limit", TAG_PAGE_SIZE).query("offset", offset);
				let page: TagListResponse = self.get_json("/tags", request, "tag list").await?;
				let received = page.tags.len();

				tags.extend(page.tags.into_iter().map(|tag| (tag.id, tag.name)));

				if received < TAG_PAGE_SIZE {
					break;
				}

				offset += TAG_PAGE_SIZE;
			}

			Ok(tags)
		})
		.await
	}

	/// Fetches the tags applied to one contact, propagating failures.
	pub async fn try_get_contact_tags(&self, contact_id: u64) -> Result<Vec<ContactTag>> {
		obs::observe(OperationKind::Tags, "contact_tags", async move {
			let response: ContactTagListResponse = self
				.get_json(&format!("/contacts/{contact_id}/tags"), ApiRequest::get(), "contact tags")
				.await?;

			Ok(response.tags)
		})
		.await
	}

	/// Fetches the tags applied to one contact.
	///
	/// Any failure is logged and degrades to an empty list so one broken contact cannot stall
	/// a bulk scan.
	pub async fn get_contact_tags_with_details(&self, contact_id: u64) -> Vec<ContactTag> {
		match self.try_get_contact_tags(contact_id).await {
			Ok(tags) => tags,
			Err(e) => {
				obs::contact_tags_unavailable(contact_id, &e);
				obs::record_degraded_contact("single");

				Vec::new()
			},
		}
	}

	/// Applies tags to a contact. Fails with [`Error::ReadOnly`] unless writes are allowed.
	pub async fn apply_tags(&self, contact_id: u64, tag_ids: &[u64]) -> Result<()> {
		obs::observe(OperationKind::Tags, "apply_tags", async move {
			let body = serde_json::json!({ "tagIds": tag_ids });

			self.authed_request(&format!("/contacts/{contact_id}/tags"), ApiRequest::post(body))
				.await?;

			Ok(())
		})
		.await
	}
}
