use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::lenient;
use crate::text::normalize_phone;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: u64,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub phone_normalized: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub created_at: NaiveDateTime,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub updated_at: NaiveDateTime,
}

impl Contact {
    /// Digits of the phone number. Falls back to deriving them when an older
    /// document has no `phone_normalized` key.
    pub fn phone_digits(&self) -> String {
        if self.phone_normalized.is_empty() {
            normalize_phone(&self.phone)
        } else {
            self.phone_normalized.clone()
        }
    }

    pub fn field(&self, field: ContactField) -> &str {
        match field {
            ContactField::Name => &self.name,
            ContactField::Phone => &self.phone,
            ContactField::Email => &self.email,
            ContactField::Address => &self.address,
            ContactField::Group => &self.group,
            ContactField::Notes => &self.notes,
        }
    }
}

/// Payload for creating or replacing a contact.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactInput {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub group: String,
    pub notes: String,
    /// `None` keeps the stored avatar on update
    pub avatar: Option<String>,
}

impl ContactInput {
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            ..Default::default()
        }
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }
}

/// Text fields a contact search can look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactField {
    Name,
    Phone,
    Email,
    Address,
    Group,
    Notes,
}

impl ContactField {
    pub const SEARCHABLE: [ContactField; 6] = [
        ContactField::Name,
        ContactField::Phone,
        ContactField::Email,
        ContactField::Address,
        ContactField::Group,
        ContactField::Notes,
    ];

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "name" => Some(Self::Name),
            "phone" => Some(Self::Phone),
            "email" => Some(Self::Email),
            "address" => Some(Self::Address),
            "group" => Some(Self::Group),
            "notes" => Some(Self::Notes),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactSortField {
    #[default]
    Name,
    Phone,
    Email,
    CreatedAt,
    UpdatedAt,
}

impl ContactSortField {
    /// Unknown field names sort by name.
    pub fn parse_or_default(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "phone" => Self::Phone,
            "email" => Self::Email,
            "created_at" => Self::CreatedAt,
            "updated_at" => Self::UpdatedAt,
            _ => Self::Name,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Phone => "phone",
            Self::Email => "email",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
        }
    }
}

/// Aggregate numbers over one user's contact list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactStatistics {
    pub total_contacts: usize,
    pub total_groups: usize,
    pub groups: Vec<String>,
    pub has_email: usize,
    pub has_address: usize,
    pub has_notes: usize,
}
