use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::lenient;

/// Colors handed out to new groups in order, wrapping around.
pub const GROUP_PALETTE: [&str; 10] = [
    "#EF4444", "#F97316", "#F59E0B", "#22C55E", "#14B8A6", "#3B82F6", "#6366F1", "#A855F7",
    "#EC4899", "#6B7280",
];

pub const GROUP_NAME_MIN: usize = 2;
pub const GROUP_NAME_MAX: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: u64,
    pub name: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_shared: u8,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub created_at: NaiveDateTime,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub updated_at: NaiveDateTime,
}

impl Group {
    pub fn palette_color(index: usize) -> &'static str {
        GROUP_PALETTE[index % GROUP_PALETTE.len()]
    }

    /// Case-insensitive name comparison, ignoring surrounding whitespace
    pub fn is_named(&self, name: &str) -> bool {
        self.name.trim().to_lowercase() == name.trim().to_lowercase()
    }
}

fn default_color() -> String {
    GROUP_PALETTE[0].to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupInput {
    pub name: String,
    pub color: Option<String>,
    pub description: Option<String>,
    pub is_shared: Option<u8>,
}

impl GroupInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn shared(mut self, shared: bool) -> Self {
        self.is_shared = Some(u8::from(shared));
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupSortField {
    #[default]
    Name,
    CreatedAt,
    UpdatedAt,
}

impl GroupSortField {
    pub fn parse_or_default(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "created_at" => Self::CreatedAt,
            "updated_at" => Self::UpdatedAt,
            _ => Self::Name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupStatistics {
    pub total_groups: usize,
    pub has_description: usize,
    pub colors_used: usize,
    pub group_names: Vec<String>,
}
