use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::lenient;

pub const USERNAME_MIN: usize = 3;
pub const PASSWORD_MIN: usize = 6;
pub const DEFAULT_SECURITY_QUESTION: &str = "What is your pet's name?";

/// Which account document a record lives in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    /// Older admin documents store a level ("manager", "superadmin") in
    /// `role`. Anything that is not "user" is an administrator.
    pub fn parse(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("user") {
            Role::User
        } else {
            Role::Admin
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminLevel {
    #[default]
    Admin,
    Manager,
    Superadmin,
}

impl AdminLevel {
    pub fn parse_or_default(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "manager" => Self::Manager,
            "superadmin" => Self::Superadmin,
            _ => Self::Admin,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ViewUsers,
    ViewStatistics,
    ManageUsers,
    ManageGroups,
}

impl Permission {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim() {
            "view_users" => Some(Self::ViewUsers),
            "view_statistics" => Some(Self::ViewStatistics),
            "manage_users" => Some(Self::ManageUsers),
            "manage_groups" => Some(Self::ManageGroups),
            _ => None,
        }
    }
}

/// Administrative data attached to an admin account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminGrant {
    #[serde(default)]
    pub level: AdminLevel,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

impl AdminGrant {
    pub fn new(level: AdminLevel) -> Self {
        Self {
            level,
            permissions: vec![Permission::ViewUsers, Permission::ViewStatistics],
        }
    }

    pub fn allows(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }
}

impl Default for AdminGrant {
    fn default() -> Self {
        Self::new(AdminLevel::Admin)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "AccountRecord")]
pub struct Account {
    pub id: u64,
    pub username: String,
    /// SHA-256 hex digest
    pub password: String,
    pub fullname: String,
    pub email: String,
    pub phone: String,
    pub avatar: String,
    pub security_question: String,
    pub security_answer_hash: String,
    pub created_at: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<NaiveDateTime>,
    pub last_login: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_reset_at: Option<NaiveDateTime>,
    pub is_active: u8,
    pub contacts_file: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin: Option<AdminGrant>,
}

/// On-disk account in any of the shapes that have been written over time.
///
/// Older admin records keep `full_name` and `permissions` at the top level
/// and their level in `role`; plaintext secrets are read and dropped.
#[derive(Deserialize)]
struct AccountRecord {
    #[serde(default)]
    id: u64,
    username: String,
    password: String,
    #[serde(default)]
    fullname: String,
    #[serde(default)]
    full_name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    phone: String,
    #[serde(default)]
    avatar: String,
    #[serde(default)]
    security_question: String,
    #[serde(default)]
    security_answer_hash: String,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    created_at: NaiveDateTime,
    #[serde(default, deserialize_with = "lenient::optional_timestamp")]
    updated_at: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "lenient::optional_timestamp")]
    last_login: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "lenient::optional_timestamp")]
    password_reset_at: Option<NaiveDateTime>,
    #[serde(default = "active", deserialize_with = "lenient::flag")]
    is_active: u8,
    #[serde(default)]
    contacts_file: String,
    #[serde(default)]
    role: String,
    #[serde(default)]
    permissions: Option<Vec<String>>,
    #[serde(default)]
    admin: Option<AdminGrant>,
}

fn active() -> u8 {
    1
}

impl From<AccountRecord> for Account {
    fn from(record: AccountRecord) -> Self {
        let role = if record.role.is_empty() {
            Role::default()
        } else {
            Role::parse(&record.role)
        };

        let admin = record.admin.or_else(|| {
            if role != Role::Admin && record.permissions.is_none() {
                return None;
            }
            let permissions = match &record.permissions {
                Some(names) => names.iter().filter_map(|p| Permission::parse(p)).collect(),
                None => AdminGrant::default().permissions,
            };
            Some(AdminGrant {
                level: AdminLevel::parse_or_default(&record.role),
                permissions,
            })
        });

        let fullname = if record.fullname.is_empty() {
            record.full_name
        } else {
            record.fullname
        };

        Self {
            id: record.id,
            username: record.username,
            password: record.password,
            fullname,
            email: record.email,
            phone: record.phone,
            avatar: record.avatar,
            security_question: record.security_question,
            security_answer_hash: record.security_answer_hash,
            created_at: record.created_at,
            updated_at: record.updated_at,
            last_login: record.last_login,
            password_reset_at: record.password_reset_at,
            is_active: record.is_active,
            contacts_file: record.contacts_file,
            role,
            admin,
        }
    }
}

impl Account {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn allows(&self, permission: Permission) -> bool {
        self.admin
            .as_ref()
            .is_some_and(|grant| grant.allows(permission))
    }

    pub fn profile(&self) -> Profile {
        Profile {
            id: self.id,
            username: self.username.clone(),
            fullname: self.fullname.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            avatar: self.avatar.clone(),
            is_active: self.is_active,
            created_at: self.created_at,
        }
    }
}

/// Public view of an account, without credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: u64,
    pub username: String,
    pub fullname: String,
    pub email: String,
    pub phone: String,
    pub avatar: String,
    pub is_active: u8,
    pub created_at: NaiveDateTime,
}

/// Fields a user may change on their own profile. `None` leaves a field as is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileUpdate {
    pub fullname: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub security_question: String,
    pub security_answer: String,
    pub email: String,
    pub fullname: String,
}

impl Registration {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            ..Default::default()
        }
    }

    pub fn security(mut self, question: impl Into<String>, answer: impl Into<String>) -> Self {
        self.security_question = question.into();
        self.security_answer = answer.into();
        self
    }
}

/// Account row as shown to administrators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    #[serde(flatten)]
    pub profile: Profile,
    pub contact_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemStats {
    pub total_users: usize,
    pub total_contacts: usize,
    pub recent_registrations: usize,
    pub avg_contacts_per_user: f64,
}
