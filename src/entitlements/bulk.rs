//! Full contact-set scan producing every entitlement plus the distinct tag universe.

// crates.io
use futures::TryStreamExt;
// self
use crate::{
	_prelude::*,
	client::{DEFAULT_CONTACT_PAGE_SIZE, KeapClient, PaginationOptions},
	entitlements::Entitlement,
	model::Contact,
	obs::{self, OperationKind},
};

/// How tag names are resolved during a bulk scan.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TagResolution {
	/// One `/contacts/{id}/tags` call per contact; failures degrade to no tags.
	#[default]
	PerContact,
	/// Load the tag catalog once and resolve each contact's `tag_ids` locally.
	TagMap,
}

/// Options for [`KeapClient::get_all_entitlements`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AllEntitlementsOptions {
	/// Maximum number of contacts to scan; `None` scans everything.
	pub limit: Option<usize>,
	/// Contacts per page.
	pub batch_size: usize,
	/// Keep contacts that carry no tags.
	pub include_empty: bool,
	/// Tag name resolution strategy.
	pub tag_resolution: TagResolution,
}
impl Default for AllEntitlementsOptions {
	fn default() -> Self {
		Self {
			limit: None,
			batch_size: DEFAULT_CONTACT_PAGE_SIZE,
			include_empty: false,
			tag_resolution: TagResolution::default(),
		}
	}
}

/// Counts gathered during a bulk scan.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AllEntitlementsSummary {
	/// Contacts read from Keap (bounded by the limit).
	pub contacts_scanned: usize,
	/// Entitlements returned.
	pub entitlements: usize,
	/// Contacts with at least one tag.
	pub with_tags: usize,
	/// Contacts skipped because they have no email.
	pub skipped_without_email: usize,
	/// Contacts whose tag lookup failed and were treated as untagged.
	pub tag_fetch_failures: usize,
	/// Number of distinct tag names observed.
	pub distinct_tags: usize,
}

/// Result of [`KeapClient::get_all_entitlements`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AllEntitlements {
	/// Entitlements in scan order.
	pub entitlements: Vec<Entitlement>,
	/// Every distinct tag name seen across scanned contacts.
	pub tag_names: BTreeSet<String>,
	/// Aggregate counts.
	pub summary: AllEntitlementsSummary,
}

impl KeapClient {
	/// Pages through the contact collection and resolves entitlements for every contact that
	/// has an email, up to `options.limit` contacts.
	///
	/// Contacts are processed strictly one at a time. A contact whose tags cannot be fetched
	/// is logged and treated as untagged.
	pub async fn get_all_entitlements(
		&self,
		options: AllEntitlementsOptions,
	) -> Result<AllEntitlements> {
		obs::observe(OperationKind::AllEntitlements, "get_all_entitlements", async move {
			let tag_map = match options.tag_resolution {
				TagResolution::PerContact => None,
				TagResolution::TagMap => Some(self.list_all_tags().await?),
			};
			let batch_size = match options.limit {
				Some(limit) => options.batch_size.min(limit),
				None => options.batch_size,
			};
			let mut all = AllEntitlements::default();
			let pages = self.fetch_all_contacts_paginated(PaginationOptions {
				batch_size,
				include_tag_ids: tag_map.is_some(),
			});
			let mut pages = std::pin::pin!(pages);
			let limit_reached =
				|scanned: usize| options.limit.is_some_and(|limit| scanned >= limit);

			while !limit_reached(all.summary.contacts_scanned) {
				let Some(page) = pages.try_next().await? else {
					break;
				};

				for contact in page {
					if limit_reached(all.summary.contacts_scanned) {
						break;
					}

					all.summary.contacts_scanned += 1;

					let Some(email) = contact.primary_email().map(str::to_owned) else {
						obs::contact_skipped_without_email(contact.id);
						all.summary.skipped_without_email += 1;

						continue;
					};
					let entitlement = match &tag_map {
						Some(map) => resolve_from_map(&contact, email, map),
						None => self.resolve_per_contact(&contact, email, &mut all.summary).await,
					};

					if !entitlement.tags.is_empty() {
						all.summary.with_tags += 1;
					} else if !options.include_empty {
						continue;
					}

					all.tag_names.extend(entitlement.tags.iter().cloned());
					all.entitlements.push(entitlement);
				}
			}

			all.summary.entitlements = all.entitlements.len();
			all.summary.distinct_tags = all.tag_names.len();

			Ok(all)
		})
		.await
	}

	async fn resolve_per_contact(
		&self,
		contact: &Contact,
		email: String,
		summary: &mut AllEntitlementsSummary,
	) -> Entitlement {
		let tags = match self.try_get_contact_tags(contact.id).await {
			Ok(tags) => tags,
			Err(e) => {
				obs::contact_tags_unavailable(contact.id, &e);
				obs::record_degraded_contact("bulk");
				summary.tag_fetch_failures += 1;

				Vec::new()
			},
		};
		let mut entitlement = Entitlement::from_contact_tags(contact, email, tags);

		// Bulk results stay lean; raw detail is only returned by single lookups.
		entitlement.raw_tags = None;

		entitlement
	}
}

fn resolve_from_map(
	contact: &Contact,
	email: String,
	tag_map: &BTreeMap<u64, String>,
) -> Entitlement {
	let tags = contact
		.tag_ids
		.iter()
		.flatten()
		.map(|id| tag_map.get(id).cloned().unwrap_or_else(|| format!("Tag {id}")))
		.collect();

	Entitlement {
		contact_id: contact.id,
		email,
		name: contact.formatted_name(),
		tags,
		raw_tags: None,
	}
}
