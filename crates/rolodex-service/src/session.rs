use serde::{Deserialize, Serialize};

use rolodex_core::{Account, Role};

/// Who is logged in. Handed back by login and passed to every scoped call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    pub is_admin: bool,
}

impl Session {
    pub fn user(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            is_admin: false,
        }
    }

    pub fn admin(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            is_admin: true,
        }
    }

    pub fn role(&self) -> Role {
        if self.is_admin { Role::Admin } else { Role::User }
    }
}

impl From<&Account> for Session {
    fn from(account: &Account) -> Self {
        Self {
            username: account.username.clone(),
            is_admin: account.is_admin(),
        }
    }
}
