//! Remote-sourced Keap records and the page envelopes they arrive in.

// crates.io
use serde::Deserializer;
// self
use crate::_prelude::*;

/// Email field slot Keap uses for a contact's primary address.
pub const PRIMARY_EMAIL_FIELD: &str = "EMAIL1";
/// Placeholder used when a contact has neither a given nor a family name.
pub const UNKNOWN_NAME: &str = "Unknown";

/// A Keap contact snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
	/// Numeric contact identifier.
	pub id: u64,
	/// Email addresses in the order Keap lists them; `null` decodes as empty.
	#[serde(default, deserialize_with = "null_as_default")]
	pub email_addresses: Vec<EmailAddress>,
	/// First name.
	#[serde(default)]
	pub given_name: Option<String>,
	/// Last name.
	#[serde(default)]
	pub family_name: Option<String>,
	/// Tag ids, present only when requested through `optional_properties=tag_ids`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub tag_ids: Option<Vec<u64>>,
}
impl Contact {
	/// Returns the `EMAIL1` address if present, otherwise the first listed one.
	pub fn primary_email(&self) -> Option<&str> {
		self.email_addresses
			.iter()
			.find(|address| address.field.as_deref() == Some(PRIMARY_EMAIL_FIELD))
			.or_else(|| self.email_addresses.first())
			.map(|address| address.email.as_str())
	}

	/// Joins given and family name, falling back to [`UNKNOWN_NAME`].
	pub fn formatted_name(&self) -> String {
		format_name(self.given_name.as_deref(), self.family_name.as_deref())
	}
}

/// One email entry on a contact.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailAddress {
	/// Address value.
	pub email: String,
	/// Keap field slot such as `EMAIL1`.
	#[serde(default)]
	pub field: Option<String>,
}

/// A Keap tag definition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
	/// Numeric tag identifier.
	pub id: u64,
	/// Display name.
	#[serde(default, deserialize_with = "null_as_default")]
	pub name: String,
	/// Optional free-form description.
	#[serde(default)]
	pub description: Option<String>,
	/// Category the tag is filed under.
	#[serde(default)]
	pub category: Option<TagCategory>,
}

/// Grouping Keap applies to tags.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCategory {
	/// Numeric category identifier.
	pub id: u64,
	/// Display name.
	#[serde(default)]
	pub name: Option<String>,
}

/// A tag applied to a specific contact.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactTag {
	/// Tag definition.
	pub tag: Tag,
	/// When the tag was applied, as reported by Keap.
	#[serde(default)]
	pub date_applied: Option<String>,
}

/// Envelope returned by `GET /contacts`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ContactListResponse {
	/// Contacts on this page.
	#[serde(default, deserialize_with = "null_as_default")]
	pub contacts: Vec<Contact>,
	/// Total size of the filtered collection.
	#[serde(default)]
	pub count: Option<u64>,
	/// Absolute URL of the next page.
	#[serde(default)]
	pub next: Option<String>,
}

/// Envelope returned by `GET /tags`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct TagListResponse {
	/// Tags on this page.
	#[serde(default, deserialize_with = "null_as_default")]
	pub tags: Vec<Tag>,
	/// Total number of tags.
	#[serde(default)]
	pub count: Option<u64>,
}

/// Envelope returned by `GET /contacts/{id}/tags`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ContactTagListResponse {
	/// Tags applied to the contact.
	#[serde(default, deserialize_with = "null_as_default")]
	pub tags: Vec<ContactTag>,
	/// Number of applied tags.
	#[serde(default)]
	pub count: Option<u64>,
}

/// Joins a given and family name with one space; `"Unknown"` when both are blank.
pub fn format_name(given: Option<&str>, family: Option<&str>) -> String {
	let joined = format!("{} {}", given.unwrap_or_default(), family.unwrap_or_default());
	let trimmed = joined.trim();

	if trimmed.is_empty() { UNKNOWN_NAME.to_owned() } else { trimmed.to_owned() }
}

// Keap sends explicit `null` for empty collections on some records.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: Default + Deserialize<'de>,
{
	Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn email(value: &str, field: Option<&str>) -> EmailAddress {
		EmailAddress { email: value.into(), field: field.map(Into::into) }
	}

	fn contact(emails: Vec<EmailAddress>) -> Contact {
		Contact {
			id: 1,
			email_addresses: emails,
			given_name: None,
			family_name: None,
			tag_ids: None,
		}
	}

	#[test]
	fn name_formatting() {
		assert_eq!(format_name(Some("Jane"), Some("Doe")), "Jane Doe");
		assert_eq!(format_name(None, None), "Unknown");
		assert_eq!(format_name(Some("Jane"), None), "Jane");
		assert_eq!(format_name(None, Some("Doe")), "Doe");
		assert_eq!(format_name(Some("  "), Some("")), "Unknown");
	}

	#[test]
	fn primary_email_prefers_email1_slot() {
		let contact = contact(vec![
			email("work@example.com", Some("EMAIL2")),
			email("home@example.com", Some("EMAIL1")),
		]);

		assert_eq!(contact.primary_email(), Some("home@example.com"));
	}

	#[test]
	fn primary_email_falls_back_to_first_entry() {
		let contact = contact(vec![
			email("first@example.com", Some("EMAIL3")),
			email("second@example.com", None),
		]);

		assert_eq!(contact.primary_email(), Some("first@example.com"));
		assert_eq!(self::contact(Vec::new()).primary_email(), None);
	}

	#[test]
	fn contact_decodes_keap_payload() {
		let payload = serde_json::json!({
			"id": 42,
			"given_name": "Jane",
			"email_addresses": [{ "email": "jane@example.com", "field": "EMAIL1" }],
			"tag_ids": [3, 9]
		});
		let contact: Contact =
			serde_json::from_value(payload).expect("Keap contact payload should decode.");

		assert_eq!(contact.id, 42);
		assert_eq!(contact.formatted_name(), "Jane");
		assert_eq!(contact.tag_ids, Some(vec![3, 9]));
	}

	#[test]
	fn null_collections_decode_as_empty() {
		let payload = serde_json::json!({
			"contacts": [{ "id": 1, "email_addresses": null, "given_name": null }],
			"count": null
		});
		let page: ContactListResponse =
			serde_json::from_value(payload).expect("Null email list should decode.");

		assert_eq!(page.contacts.len(), 1);
		assert!(page.contacts[0].email_addresses.is_empty());
		assert_eq!(page.contacts[0].primary_email(), None);
		assert_eq!(page.contacts[0].formatted_name(), "Unknown");

		let tag: Tag = serde_json::from_value(serde_json::json!({ "id": 3, "name": null }))
			.expect("Null tag name should decode.");

		assert_eq!(tag.name, "");
	}
}
