use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info};

use rolodex_core::text::{cmp_numeric_digits, fold, is_blank, normalize_phone};
use rolodex_core::{Contact, ContactField, ContactInput, ContactSortField, ContactStatistics};

use crate::document::JsonDocument;
use crate::error::{Result, StoreError};
use crate::layout::DataLayout;

pub const MIN_PHONE_DIGITS: usize = 9;

/// One user's contact list, backed by `<username>_contacts.json`.
///
/// Built per request. Reads go through an instance-local cache; every
/// mutation re-reads the file, applies the change and rewrites the whole
/// document. Concurrent writers are not coordinated: the last write wins.
pub struct ContactStore {
    username: Option<String>,
    document: Option<JsonDocument>,
    cache: Option<Vec<Contact>>,
}

impl ContactStore {
    /// A store with no username bound refuses every operation with
    /// [`StoreError::NotAuthenticated`].
    pub fn new(layout: &DataLayout, username: Option<&str>) -> Self {
        let document = username.map(|u| JsonDocument::bare(layout.contacts_file(u), "contacts"));
        Self {
            username: username.map(str::to_string),
            document,
            cache: None,
        }
    }

    /// Contact list kept next to an administrator's account data.
    pub fn admin(layout: &DataLayout, username: &str) -> Self {
        Self {
            username: Some(username.to_string()),
            document: Some(JsonDocument::bare(
                layout.admin_contacts_file(username),
                "contacts",
            )),
            cache: None,
        }
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn path(&self) -> Option<&Path> {
        self.document.as_ref().map(JsonDocument::path)
    }

    fn document(&self) -> Result<&JsonDocument> {
        self.document.as_ref().ok_or(StoreError::NotAuthenticated)
    }

    async fn cached(&mut self) -> Result<&[Contact]> {
        if self.cache.is_none() {
            let contacts: Vec<Contact> = self.document()?.load().await;
            self.cache = Some(contacts);
        }
        Ok(self.cache.as_deref().unwrap_or_default())
    }

    /// Bypass the cache before mutating.
    async fn load_fresh(&mut self) -> Result<Vec<Contact>> {
        let contacts: Vec<Contact> = self.document()?.load().await;
        self.cache = None;
        Ok(contacts)
    }

    async fn save(&mut self, contacts: Vec<Contact>) -> Result<()> {
        self.document()?.save(&contacts).await?;
        self.cache = Some(contacts);
        Ok(())
    }

    pub async fn get(&mut self, id: u64) -> Result<Contact> {
        self.cached()
            .await?
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Contact not found"))
    }

    pub async fn get_all(&mut self) -> Result<Vec<Contact>> {
        Ok(self.cached().await?.to_vec())
    }

    pub async fn reload(&mut self) -> Result<()> {
        let contacts = self.load_fresh().await?;
        self.cache = Some(contacts);
        Ok(())
    }

    pub async fn count(&mut self) -> Result<usize> {
        Ok(self.cached().await?.len())
    }

    pub async fn add(&mut self, input: ContactInput) -> Result<Contact> {
        self.document()?;
        validate(&input)?;

        let mut contacts = self.load_fresh().await?;
        let phone = input.phone.trim().to_string();
        let digits = normalize_phone(&phone);
        if has_phone(&contacts, &digits, None) {
            return Err(StoreError::conflict(
                "Phone number already exists in contact list",
            ));
        }

        let id = next_id(&contacts)
            .max(self.document()?.unreadable_max_id::<Contact>().await + 1);
        let now = rolodex_core::now();
        let contact = Contact {
            id,
            name: input.name.trim().to_string(),
            phone,
            phone_normalized: digits,
            email: input.email.trim().to_string(),
            address: input.address.trim().to_string(),
            group: input.group.trim().to_string(),
            notes: input.notes.trim().to_string(),
            avatar: input.avatar.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };

        contacts.push(contact.clone());
        self.save(contacts).await?;
        info!(username = ?self.username, id = contact.id, "Contact added");
        Ok(contact)
    }

    /// Full replacement of the editable fields; `id` and `created_at` stay.
    pub async fn update(&mut self, id: u64, input: ContactInput) -> Result<Contact> {
        self.document()?;
        validate(&input)?;

        let mut contacts = self.load_fresh().await?;
        let index = contacts
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| StoreError::not_found("Contact not found"))?;

        let phone = input.phone.trim().to_string();
        let digits = normalize_phone(&phone);
        if has_phone(&contacts, &digits, Some(id)) {
            return Err(StoreError::conflict(
                "Phone number already exists in contact list",
            ));
        }

        let current = &contacts[index];
        let updated = Contact {
            id: current.id,
            name: input.name.trim().to_string(),
            phone,
            phone_normalized: digits,
            email: input.email.trim().to_string(),
            address: input.address.trim().to_string(),
            group: input.group.trim().to_string(),
            notes: input.notes.trim().to_string(),
            avatar: input.avatar.unwrap_or_else(|| current.avatar.clone()),
            created_at: current.created_at,
            updated_at: rolodex_core::now(),
        };

        contacts[index] = updated.clone();
        self.save(contacts).await?;
        info!(username = ?self.username, id, "Contact updated");
        Ok(updated)
    }

    pub async fn delete(&mut self, id: u64) -> Result<Contact> {
        let mut contacts = self.load_fresh().await?;
        let index = contacts
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| StoreError::not_found("Contact not found"))?;

        let removed = contacts.remove(index);
        self.save(contacts).await?;
        info!(username = ?self.username, id, "Contact deleted");
        Ok(removed)
    }

    pub async fn delete_all(&mut self) -> Result<usize> {
        let count = self.load_fresh().await?.len();
        self.save(Vec::new()).await?;
        info!(username = ?self.username, count, "All contacts deleted");
        Ok(count)
    }

    /// Accent- and case-insensitive substring search. An empty `fields`
    /// slice searches every searchable field; a blank query returns all.
    pub async fn search(&mut self, query: &str, fields: &[ContactField]) -> Result<Vec<Contact>> {
        let contacts = self.cached().await?;
        if is_blank(query) {
            return Ok(contacts.to_vec());
        }

        let fields = if fields.is_empty() {
            &ContactField::SEARCHABLE[..]
        } else {
            fields
        };
        let needle = fold(query.trim());
        let results: Vec<Contact> = contacts
            .iter()
            .filter(|c| fields.iter().any(|f| fold(c.field(*f)).contains(&needle)))
            .cloned()
            .collect();

        debug!(query, matches = results.len(), "Contact search");
        Ok(results)
    }

    /// Exact case-insensitive match on the group text. A blank name selects
    /// contacts without a group.
    pub async fn filter_by_group(&mut self, group: &str) -> Result<Vec<Contact>> {
        let contacts = self.cached().await?;
        if group.is_empty() {
            return Ok(contacts
                .iter()
                .filter(|c| is_blank(&c.group))
                .cloned()
                .collect());
        }

        let wanted = group.to_lowercase();
        Ok(contacts
            .iter()
            .filter(|c| c.group.to_lowercase() == wanted)
            .cloned()
            .collect())
    }

    pub async fn sort(&mut self, field: ContactSortField, reverse: bool) -> Result<Vec<Contact>> {
        let contacts = self.cached().await?.to_vec();
        Ok(sort_contacts(contacts, field, reverse))
    }

    /// Sort and persist the new order.
    pub async fn sort_and_save(&mut self, field: ContactSortField, reverse: bool) -> Result<()> {
        let contacts = self.load_fresh().await?;
        self.save(sort_contacts(contacts, field, reverse)).await?;
        info!(username = ?self.username, field = field.as_str(), reverse, "Contacts sorted and saved");
        Ok(())
    }

    /// Set the group text, or clear it with a blank name.
    pub async fn assign_to_group(&mut self, id: u64, group: &str) -> Result<Contact> {
        let mut contacts = self.load_fresh().await?;
        let contact = contacts
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| StoreError::not_found("Contact not found"))?;

        contact.group = group.trim().to_string();
        contact.updated_at = rolodex_core::now();
        let assigned = contact.clone();

        self.save(contacts).await?;
        info!(username = ?self.username, id, group = %assigned.group, "Contact group assigned");
        Ok(assigned)
    }

    /// Distinct non-blank group names in use, sorted.
    pub async fn group_names(&mut self) -> Result<Vec<String>> {
        let names: BTreeSet<String> = self
            .cached()
            .await?
            .iter()
            .map(|c| c.group.trim())
            .filter(|g| !g.is_empty())
            .map(str::to_string)
            .collect();
        Ok(names.into_iter().collect())
    }

    pub async fn statistics(&mut self) -> Result<ContactStatistics> {
        let groups = self.group_names().await?;
        let contacts = self.cached().await?;

        Ok(ContactStatistics {
            total_contacts: contacts.len(),
            total_groups: groups.len(),
            has_email: contacts.iter().filter(|c| !is_blank(&c.email)).count(),
            has_address: contacts.iter().filter(|c| !is_blank(&c.address)).count(),
            has_notes: contacts.iter().filter(|c| !is_blank(&c.notes)).count(),
            groups,
        })
    }
}

/// Stable sort with the store's ordering rules; usable on search or filter
/// results.
pub fn sort_contacts(
    mut contacts: Vec<Contact>,
    field: ContactSortField,
    reverse: bool,
) -> Vec<Contact> {
    contacts.sort_by(|a, b| {
        let ordering = compare(a, b, field);
        if reverse { ordering.reverse() } else { ordering }
    });
    contacts
}

fn compare(a: &Contact, b: &Contact, field: ContactSortField) -> Ordering {
    match field {
        ContactSortField::Phone => {
            cmp_numeric_digits(&normalize_phone(&a.phone), &normalize_phone(&b.phone))
        }
        ContactSortField::CreatedAt => a.created_at.cmp(&b.created_at),
        ContactSortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        ContactSortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        ContactSortField::Email => a.email.to_lowercase().cmp(&b.email.to_lowercase()),
    }
}

fn validate(input: &ContactInput) -> Result<()> {
    if is_blank(&input.name) {
        return Err(StoreError::invalid("Field name is required"));
    }
    if is_blank(&input.phone) {
        return Err(StoreError::invalid("Field phone is required"));
    }
    if normalize_phone(&input.phone).len() < MIN_PHONE_DIGITS {
        return Err(StoreError::invalid(
            "Invalid phone number (minimum 9 digits)",
        ));
    }
    let email = input.email.trim();
    if !email.is_empty() && !email.contains('@') {
        return Err(StoreError::invalid("Invalid email"));
    }
    Ok(())
}

fn has_phone(contacts: &[Contact], digits: &str, exclude: Option<u64>) -> bool {
    contacts
        .iter()
        .filter(|c| Some(c.id) != exclude)
        .any(|c| normalize_phone(&c.phone) == digits)
}

fn next_id(contacts: &[Contact]) -> u64 {
    contacts.iter().map(|c| c.id).max().unwrap_or(0) + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(id: u64, name: &str, phone: &str) -> Contact {
        Contact {
            id,
            name: name.to_string(),
            phone: phone.to_string(),
            phone_normalized: normalize_phone(phone),
            email: String::new(),
            address: String::new(),
            group: String::new(),
            notes: String::new(),
            avatar: String::new(),
            created_at: Default::default(),
            updated_at: Default::default(),
        }
    }

    #[test]
    fn test_validate_rejects_short_phone() {
        let err = validate(&ContactInput::new("Ann", "555-01")).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(err.to_string(), "Invalid phone number (minimum 9 digits)");
    }

    #[test]
    fn test_validate_requires_name_and_email_at() {
        assert!(validate(&ContactInput::new("  ", "123456789")).is_err());
        assert!(validate(&ContactInput::new("Ann", "123456789").email("ann.example.com")).is_err());
        assert!(validate(&ContactInput::new("Ann", "123456789").email("ann@example.com")).is_ok());
    }

    #[test]
    fn test_duplicate_phone_ignores_formatting_and_excluded_id() {
        let contacts = vec![contact(1, "Ann", "555-010-0999")];
        assert!(has_phone(&contacts, "5550100999", None));
        assert!(!has_phone(&contacts, "5550100999", Some(1)));
    }

    #[test]
    fn test_next_id_is_max_plus_one() {
        assert_eq!(next_id(&[]), 1);
        let contacts = vec![contact(4, "A", "1"), contact(2, "B", "2")];
        assert_eq!(next_id(&contacts), 5);
    }

    #[test]
    fn test_phone_sort_is_numeric_with_blank_as_zero() {
        let contacts = vec![
            contact(1, "a", "1000"),
            contact(2, "b", "(09) 99"),
            contact(3, "c", ""),
        ];
        let sorted = sort_contacts(contacts, ContactSortField::Phone, false);
        let ids: Vec<u64> = sorted.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn test_sort_is_stable_in_both_directions() {
        let contacts = vec![
            contact(1, "bob", "1"),
            contact(2, "Ann", "2"),
            contact(3, "Bob", "3"),
        ];
        let asc = sort_contacts(contacts.clone(), ContactSortField::Name, false);
        assert_eq!(asc.iter().map(|c| c.id).collect::<Vec<_>>(), vec![2, 1, 3]);

        let desc = sort_contacts(contacts, ContactSortField::Name, true);
        assert_eq!(desc.iter().map(|c| c.id).collect::<Vec<_>>(), vec![1, 3, 2]);
    }
}
