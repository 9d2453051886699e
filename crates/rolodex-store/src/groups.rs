use std::collections::HashSet;
use tracing::info;

use rolodex_core::text::is_blank;
use rolodex_core::{
    GROUP_NAME_MAX, GROUP_NAME_MIN, Group, GroupInput, GroupSortField, GroupStatistics,
};

use crate::document::JsonDocument;
use crate::error::{Result, StoreError};
use crate::layout::DataLayout;

/// Which group document a store works on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupScope {
    /// `<username>_groups.json`, private to one user
    User(String),
    /// `groups.json` in the admin data directory
    Shared,
}

/// Groups of one scope. Same caching and last-writer-wins behaviour as
/// [`crate::ContactStore`].
///
/// Contacts point at groups by name text only. Renaming or deleting a group
/// leaves contacts holding the old name.
pub struct GroupStore {
    scope: GroupScope,
    document: JsonDocument,
    cache: Option<Vec<Group>>,
}

impl GroupStore {
    pub fn new(layout: &DataLayout, scope: GroupScope) -> Self {
        let path = match &scope {
            GroupScope::User(username) => layout.groups_file(username),
            GroupScope::Shared => layout.shared_groups_file(),
        };
        Self {
            scope,
            document: JsonDocument::bare(path, "groups"),
            cache: None,
        }
    }

    pub fn user(layout: &DataLayout, username: &str) -> Self {
        Self::new(layout, GroupScope::User(username.to_string()))
    }

    pub fn shared(layout: &DataLayout) -> Self {
        Self::new(layout, GroupScope::Shared)
    }

    pub fn scope(&self) -> &GroupScope {
        &self.scope
    }

    async fn cached(&mut self) -> &[Group] {
        if self.cache.is_none() {
            let groups: Vec<Group> = self.document.load().await;
            self.cache = Some(groups);
        }
        self.cache.as_deref().unwrap_or_default()
    }

    async fn load_fresh(&mut self) -> Vec<Group> {
        self.cache = None;
        self.document.load().await
    }

    async fn save(&mut self, groups: Vec<Group>) -> Result<()> {
        self.document.save(&groups).await?;
        self.cache = Some(groups);
        Ok(())
    }

    pub async fn get(&mut self, id: u64) -> Result<Group> {
        self.cached()
            .await
            .iter()
            .find(|g| g.id == id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Group not found"))
    }

    /// Case-insensitive lookup, ignoring surrounding whitespace.
    pub async fn get_by_name(&mut self, name: &str) -> Result<Group> {
        self.cached()
            .await
            .iter()
            .find(|g| g.is_named(name))
            .cloned()
            .ok_or_else(|| StoreError::not_found("Group not found"))
    }

    pub async fn get_all(&mut self) -> Vec<Group> {
        self.cached().await.to_vec()
    }

    pub async fn reload(&mut self) {
        let groups = self.load_fresh().await;
        self.cache = Some(groups);
    }

    pub async fn count(&mut self) -> usize {
        self.cached().await.len()
    }

    /// Without a color the group takes the palette entry at the current
    /// group count.
    pub async fn add(&mut self, input: GroupInput) -> Result<Group> {
        let name = validate(&input)?;
        let mut groups = self.load_fresh().await;
        if has_name(&groups, &name, None) {
            return Err(StoreError::conflict("Group name already exists"));
        }

        let color = input
            .color
            .filter(|c| !is_blank(c))
            .unwrap_or_else(|| Group::palette_color(groups.len()).to_string());
        let id = next_id(&groups)
            .max(self.document.unreadable_max_id::<Group>().await + 1);
        let now = rolodex_core::now();
        let group = Group {
            id,
            name,
            color,
            description: input.description.unwrap_or_default().trim().to_string(),
            is_shared: input.is_shared.unwrap_or(0),
            created_at: now,
            updated_at: now,
        };

        groups.push(group.clone());
        self.save(groups).await?;
        info!(scope = ?self.scope, id = group.id, name = %group.name, "Group added");
        Ok(group)
    }

    /// Fields missing from `input` keep their stored values. Contacts are not
    /// touched, so a rename leaves them holding the old name.
    pub async fn update(&mut self, id: u64, input: GroupInput) -> Result<Group> {
        let name = validate(&input)?;
        let mut groups = self.load_fresh().await;
        let index = groups
            .iter()
            .position(|g| g.id == id)
            .ok_or_else(|| StoreError::not_found("Group not found"))?;
        if has_name(&groups, &name, Some(id)) {
            return Err(StoreError::conflict("Group name already exists"));
        }

        let current = &groups[index];
        let updated = Group {
            id: current.id,
            name,
            color: input
                .color
                .filter(|c| !is_blank(c))
                .unwrap_or_else(|| current.color.clone()),
            description: input
                .description
                .unwrap_or_else(|| current.description.clone())
                .trim()
                .to_string(),
            is_shared: input.is_shared.unwrap_or(current.is_shared),
            created_at: current.created_at,
            updated_at: rolodex_core::now(),
        };

        groups[index] = updated.clone();
        self.save(groups).await?;
        info!(scope = ?self.scope, id, name = %updated.name, "Group updated");
        Ok(updated)
    }

    pub async fn delete(&mut self, id: u64) -> Result<Group> {
        let mut groups = self.load_fresh().await;
        let index = groups
            .iter()
            .position(|g| g.id == id)
            .ok_or_else(|| StoreError::not_found("Group not found"))?;

        let removed = groups.remove(index);
        self.save(groups).await?;
        info!(scope = ?self.scope, id, name = %removed.name, "Group deleted");
        Ok(removed)
    }

    pub async fn delete_all(&mut self) -> Result<usize> {
        let count = self.load_fresh().await.len();
        self.save(Vec::new()).await?;
        info!(scope = ?self.scope, count, "All groups deleted");
        Ok(count)
    }

    /// Case-insensitive substring match on name or description.
    pub async fn search(&mut self, query: &str) -> Vec<Group> {
        let groups = self.cached().await;
        if is_blank(query) {
            return groups.to_vec();
        }

        let needle = query.trim().to_lowercase();
        groups
            .iter()
            .filter(|g| {
                g.name.to_lowercase().contains(&needle)
                    || g.description.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect()
    }

    pub async fn sort(&mut self, field: GroupSortField, reverse: bool) -> Vec<Group> {
        let mut groups = self.cached().await.to_vec();
        groups.sort_by(|a, b| {
            let ordering = match field {
                GroupSortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
                GroupSortField::CreatedAt => a.created_at.cmp(&b.created_at),
                GroupSortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            };
            if reverse { ordering.reverse() } else { ordering }
        });
        groups
    }

    /// Non-blank names in stored order, for pickers.
    pub async fn names(&mut self) -> Vec<String> {
        self.cached()
            .await
            .iter()
            .filter(|g| !is_blank(&g.name))
            .map(|g| g.name.clone())
            .collect()
    }

    pub async fn statistics(&mut self) -> GroupStatistics {
        let groups = self.cached().await;
        let colors: HashSet<&str> = groups
            .iter()
            .map(|g| g.color.as_str())
            .filter(|c| !c.is_empty())
            .collect();

        GroupStatistics {
            total_groups: groups.len(),
            has_description: groups.iter().filter(|g| !is_blank(&g.description)).count(),
            colors_used: colors.len(),
            group_names: groups.iter().map(|g| g.name.clone()).collect(),
        }
    }
}

/// Returns the trimmed name when valid.
fn validate(input: &GroupInput) -> Result<String> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(StoreError::invalid("Field name is required"));
    }
    let len = name.chars().count();
    if len < GROUP_NAME_MIN {
        return Err(StoreError::invalid(
            "Group name must be at least 2 characters",
        ));
    }
    if len > GROUP_NAME_MAX {
        return Err(StoreError::invalid(
            "Group name cannot exceed 50 characters",
        ));
    }
    Ok(name.to_string())
}

fn has_name(groups: &[Group], name: &str, exclude: Option<u64>) -> bool {
    groups
        .iter()
        .filter(|g| Some(g.id) != exclude)
        .any(|g| g.is_named(name))
}

fn next_id(groups: &[Group]) -> u64 {
    groups.iter().map(|g| g.id).max().unwrap_or(0) + 1
}
