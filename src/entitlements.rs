//! Entitlement assembly: turns a contact plus its tags into the public result shape.

pub mod batch;
pub mod bulk;

pub use batch::*;
pub use bulk::*;

// self
use crate::{
	_prelude::*,
	client::KeapClient,
	model::{Contact, ContactTag},
	obs::{self, OperationKind},
};

/// Tag-derived permissions for one contact. Computed per call, never cached.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entitlement {
	/// Keap contact id.
	pub contact_id: u64,
	/// Email the entitlement was resolved for.
	pub email: String,
	/// Given and family name, or `"Unknown"`.
	#[serde(rename = "formattedName")]
	pub name: String,
	/// Names of the applied tags.
	#[serde(rename = "tagNames")]
	pub tags: Vec<String>,
	/// Full tag detail, when it was fetched.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub raw_tags: Option<Vec<ContactTag>>,
}
impl Entitlement {
	/// Builds an entitlement from a contact and its applied tags.
	pub fn from_contact_tags(
		contact: &Contact,
		email: impl Into<String>,
		tags: Vec<ContactTag>,
	) -> Self {
		Self {
			contact_id: contact.id,
			email: email.into(),
			name: contact.formatted_name(),
			tags: tags.iter().map(|applied| applied.tag.name.clone()).collect(),
			raw_tags: Some(tags),
		}
	}

	/// Returns `true` if a tag with `name` is present.
	pub fn has_tag(&self, name: &str) -> bool {
		self.tags.iter().any(|tag| tag == name)
	}
}

impl KeapClient {
	/// Resolves the entitlements of the contact whose email matches exactly.
	///
	/// Returns `Ok(None)` when no contact matches. Tag lookup failures degrade to no tags.
	pub async fn get_user_entitlements(&self, email: &str) -> Result<Option<Entitlement>> {
		obs::observe(OperationKind::UserEntitlements, "get_user_entitlements", async move {
			let Some(contact) = self.find_contact_by_email(email).await? else {
				return Ok(None);
			};
			let tags = self.get_contact_tags_with_details(contact.id).await;

			Ok(Some(Entitlement::from_contact_tags(&contact, email, tags)))
		})
		.await
	}
}
