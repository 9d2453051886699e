use directories::ProjectDirs;
use std::path::{Path, PathBuf};

use crate::error::{Result, StoreError};

pub const USER_ACCOUNT_DIR: &str = "User/user_account";
pub const USER_DATA_DIR: &str = "User/user_data";
pub const ADMIN_ACCOUNT_DIR: &str = "Admin/admin_account";
pub const ADMIN_DATA_DIR: &str = "Admin/admin_data";

pub const USERS_FILE: &str = "users.json";
pub const ADMINS_FILE: &str = "admins.json";
pub const SHARED_GROUPS_FILE: &str = "groups.json";

/// Where every JSON document lives, relative to one data root.
///
/// ```text
/// User/user_account/users.json
/// User/user_data/<username>_contacts.json
/// User/user_data/<username>_groups.json
/// Admin/admin_account/admins.json
/// Admin/admin_data/groups.json
/// Admin/admin_data/<admin>_contacts.json
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Layout rooted at the platform data directory.
    pub fn from_project_dirs() -> Result<Self> {
        Ok(Self::new(Self::default_root()?))
    }

    pub fn default_root() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("org", "rolodex", "rolodex").ok_or(StoreError::NoDataDir)?;
        Ok(dirs.data_dir().to_path_buf())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn users_file(&self) -> PathBuf {
        self.root.join(USER_ACCOUNT_DIR).join(USERS_FILE)
    }

    pub fn admins_file(&self) -> PathBuf {
        self.root.join(ADMIN_ACCOUNT_DIR).join(ADMINS_FILE)
    }

    pub fn user_data_dir(&self) -> PathBuf {
        self.root.join(USER_DATA_DIR)
    }

    pub fn admin_data_dir(&self) -> PathBuf {
        self.root.join(ADMIN_DATA_DIR)
    }

    pub fn contacts_file(&self, username: &str) -> PathBuf {
        self.user_data_dir().join(contacts_file_name(username))
    }

    pub fn admin_contacts_file(&self, username: &str) -> PathBuf {
        self.admin_data_dir().join(contacts_file_name(username))
    }

    pub fn groups_file(&self, username: &str) -> PathBuf {
        self.user_data_dir().join(format!("{}_groups.json", username))
    }

    pub fn shared_groups_file(&self) -> PathBuf {
        self.admin_data_dir().join(SHARED_GROUPS_FILE)
    }
}

pub fn contacts_file_name(username: &str) -> String {
    format!("{}_contacts.json", username)
}
