use std::path::PathBuf;
use tracing::{info, warn};

use rolodex_core::text::is_blank;
use rolodex_core::{
    Account, AdminGrant, AdminLevel, DEFAULT_SECURITY_QUESTION, PASSWORD_MIN, Profile,
    ProfileUpdate, Registration, Role, USERNAME_MIN,
};

use crate::credentials::{hash_answer, hash_secret, verify_secret};
use crate::document::JsonDocument;
use crate::error::{Result, StoreError};
use crate::layout::{DataLayout, contacts_file_name};

/// Account name that can never be deleted.
pub const RESERVED_ADMIN: &str = "admin";

/// Credentials for one role: `users.json` or `admins.json`.
///
/// Every call reads the document afresh; mutations rewrite it whole.
pub struct AccountStore {
    layout: DataLayout,
    role: Role,
    document: JsonDocument,
}

impl AccountStore {
    pub fn users(layout: &DataLayout) -> Self {
        Self {
            layout: layout.clone(),
            role: Role::User,
            document: JsonDocument::keyed(layout.users_file(), "users"),
        }
    }

    pub fn admins(layout: &DataLayout) -> Self {
        Self {
            layout: layout.clone(),
            role: Role::Admin,
            document: JsonDocument::keyed(layout.admins_file(), "admins"),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    fn noun(&self) -> &'static str {
        match self.role {
            Role::User => "User",
            Role::Admin => "Admin account",
        }
    }

    /// The document decides the role. Admins without any stored grant data
    /// get the default grant.
    async fn load(&self) -> Vec<Account> {
        let mut accounts: Vec<Account> = self.document.load().await;
        for account in &mut accounts {
            account.role = self.role;
            match self.role {
                Role::User => account.admin = None,
                Role::Admin => {
                    account.admin.get_or_insert_with(AdminGrant::default);
                }
            }
        }
        accounts
    }

    async fn save(&self, accounts: &[Account]) -> Result<()> {
        self.document.save(accounts).await
    }

    fn missing(&self) -> StoreError {
        StoreError::not_found(format!("{} does not exist", self.noun()))
    }

    pub async fn register(&self, registration: Registration) -> Result<Account> {
        self.register_with_level(registration, AdminLevel::Admin).await
    }

    /// `level` only matters for the admin document.
    pub async fn register_with_level(
        &self,
        registration: Registration,
        level: AdminLevel,
    ) -> Result<Account> {
        validate_credentials(&registration.username, &registration.password)?;

        let mut accounts = self.load().await;
        if accounts.iter().any(|a| a.username == registration.username) {
            return Err(StoreError::conflict(match self.role {
                Role::User => "Username already exists",
                Role::Admin => "Admin username already exists",
            }));
        }

        let question = if is_blank(&registration.security_question) {
            DEFAULT_SECURITY_QUESTION.to_string()
        } else {
            registration.security_question.trim().to_string()
        };
        let id = accounts.iter().map(|a| a.id).max().unwrap_or(0) + 1;
        let account = Account {
            id: id.max(self.document.unreadable_max_id::<Account>().await + 1),
            username: registration.username.clone(),
            password: hash_secret(&registration.password),
            fullname: registration.fullname.trim().to_string(),
            email: registration.email.trim().to_string(),
            phone: String::new(),
            avatar: String::new(),
            security_question: question,
            security_answer_hash: hash_answer(&registration.security_answer),
            created_at: rolodex_core::now(),
            updated_at: None,
            last_login: None,
            password_reset_at: None,
            is_active: 1,
            contacts_file: contacts_file_name(&registration.username),
            role: self.role,
            admin: match self.role {
                Role::User => None,
                Role::Admin => Some(AdminGrant::new(level)),
            },
        };

        accounts.push(account.clone());
        self.save(&accounts).await?;
        JsonDocument::bare(self.contacts_path(&account.username), "contacts")
            .provision()
            .await?;

        info!(username = %account.username, role = ?self.role, "Account registered");
        Ok(account)
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Account> {
        if username.is_empty() || password.is_empty() {
            return Err(StoreError::invalid("Please enter all information"));
        }

        let mut accounts = self.load().await;
        let account = accounts
            .iter_mut()
            .find(|a| a.username == username)
            .ok_or_else(|| self.missing())?;

        if !verify_secret(password, &account.password) {
            return Err(StoreError::Unauthorized("Incorrect password".to_string()));
        }

        account.last_login = Some(rolodex_core::now());
        let account = account.clone();
        // A failed last_login write does not fail the login.
        if let Err(e) = self.save(&accounts).await {
            warn!(username, "Could not record last login: {}", e);
        }

        info!(username, role = ?self.role, "Login successful");
        Ok(account)
    }

    pub async fn get(&self, username: &str) -> Result<Account> {
        self.load()
            .await
            .into_iter()
            .find(|a| a.username == username)
            .ok_or_else(|| StoreError::not_found(format!("{} not found", self.noun())))
    }

    pub async fn exists(&self, username: &str) -> bool {
        self.load().await.iter().any(|a| a.username == username)
    }

    pub async fn list(&self) -> Vec<Account> {
        self.load().await
    }

    /// Case-insensitive substring on the username; blank returns all.
    pub async fn search(&self, query: &str) -> Vec<Account> {
        let accounts = self.load().await;
        if query.is_empty() {
            return accounts;
        }
        let needle = query.to_lowercase();
        accounts
            .into_iter()
            .filter(|a| a.username.to_lowercase().contains(&needle))
            .collect()
    }

    pub async fn security_question(&self, username: &str) -> Result<String> {
        Ok(self.get(username).await?.security_question)
    }

    pub async fn verify_security_answer(&self, username: &str, answer: &str) -> Result<()> {
        if username.is_empty() || answer.is_empty() {
            return Err(StoreError::invalid("Please provide all information"));
        }
        let account = self
            .load()
            .await
            .into_iter()
            .find(|a| a.username == username)
            .ok_or_else(|| self.missing())?;

        check_answer(&account, answer)
    }

    pub async fn reset_password(
        &self,
        username: &str,
        answer: &str,
        new_password: &str,
    ) -> Result<()> {
        if username.is_empty() || answer.is_empty() || new_password.is_empty() {
            return Err(StoreError::invalid("Please provide all information"));
        }
        validate_password(new_password)?;

        let mut accounts = self.load().await;
        let account = accounts
            .iter_mut()
            .find(|a| a.username == username)
            .ok_or_else(|| self.missing())?;
        check_answer(account, answer)?;

        account.password = hash_secret(new_password);
        account.password_reset_at = Some(rolodex_core::now());
        self.save(&accounts).await?;
        info!(username, "Password reset");
        Ok(())
    }

    /// Administrative password change, no security answer needed.
    pub async fn set_password(&self, username: &str, new_password: &str) -> Result<()> {
        validate_password(new_password)?;

        let mut accounts = self.load().await;
        let account = accounts
            .iter_mut()
            .find(|a| a.username == username)
            .ok_or_else(|| self.missing())?;

        account.password = hash_secret(new_password);
        account.updated_at = Some(rolodex_core::now());
        self.save(&accounts).await?;
        info!(username, "Password updated by administrator");
        Ok(())
    }

    pub async fn profile(&self, username: &str) -> Result<Profile> {
        if username.is_empty() {
            return Err(StoreError::NotAuthenticated);
        }
        Ok(self.get(username).await?.profile())
    }

    /// Only fullname, email, phone and avatar can change here.
    pub async fn update_profile(&self, username: &str, update: ProfileUpdate) -> Result<Profile> {
        if username.is_empty() {
            return Err(StoreError::NotAuthenticated);
        }

        let mut accounts = self.load().await;
        let account = accounts
            .iter_mut()
            .find(|a| a.username == username)
            .ok_or_else(|| StoreError::not_found(format!("{} not found", self.noun())))?;

        if let Some(fullname) = update.fullname {
            account.fullname = fullname.trim().to_string();
        }
        if let Some(email) = update.email {
            account.email = email.trim().to_string();
        }
        if let Some(phone) = update.phone {
            account.phone = phone.trim().to_string();
        }
        if let Some(avatar) = update.avatar {
            account.avatar = avatar;
        }
        account.updated_at = Some(rolodex_core::now());
        let profile = account.profile();

        self.save(&accounts).await?;
        info!(username, "Profile updated");
        Ok(profile)
    }

    /// Remove an account together with its contacts and groups documents.
    pub async fn delete(&self, username: &str) -> Result<Account> {
        if username == RESERVED_ADMIN {
            return Err(StoreError::invalid("Cannot delete admin account"));
        }

        let mut accounts = self.load().await;
        let index = accounts
            .iter()
            .position(|a| a.username == username)
            .ok_or_else(|| self.missing())?;
        let removed = accounts.remove(index);
        self.save(&accounts).await?;

        JsonDocument::bare(self.contacts_path(username), "contacts")
            .remove()
            .await?;
        if self.role == Role::User {
            JsonDocument::bare(self.layout.groups_file(username), "groups")
                .remove()
                .await?;
        }

        info!(username, role = ?self.role, "Account deleted");
        Ok(removed)
    }

    /// Path of the account's contacts document.
    pub async fn contacts_file(&self, username: &str) -> Result<PathBuf> {
        let account = self.get(username).await?;
        let name = if account.contacts_file.is_empty() {
            contacts_file_name(username)
        } else {
            account.contacts_file
        };
        Ok(self.data_dir().join(name))
    }

    fn data_dir(&self) -> PathBuf {
        match self.role {
            Role::User => self.layout.user_data_dir(),
            Role::Admin => self.layout.admin_data_dir(),
        }
    }

    fn contacts_path(&self, username: &str) -> PathBuf {
        self.data_dir().join(contacts_file_name(username))
    }
}

fn validate_credentials(username: &str, password: &str) -> Result<()> {
    if username.is_empty() || password.is_empty() {
        return Err(StoreError::invalid("Please enter all required information"));
    }
    if username.chars().count() < USERNAME_MIN {
        return Err(StoreError::invalid(
            "Username must be at least 3 characters",
        ));
    }
    // Usernames become file names.
    if username.contains(['/', '\\']) || username.starts_with('.') {
        return Err(StoreError::invalid("Username contains invalid characters"));
    }
    validate_password(password)
}

fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < PASSWORD_MIN {
        return Err(StoreError::invalid(
            "Password must be at least 6 characters",
        ));
    }
    Ok(())
}

fn check_answer(account: &Account, answer: &str) -> Result<()> {
    if account.security_answer_hash == hash_answer(answer) {
        Ok(())
    } else {
        Err(StoreError::Unauthorized(
            "Incorrect security answer".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_rules() {
        assert!(validate_credentials("", "secret1").is_err());
        assert!(validate_credentials("al", "secret1").is_err());
        assert!(validate_credentials("alice", "short").is_err());
        assert!(validate_credentials("../etc", "secret1").is_err());
        assert!(validate_credentials("alice", "secret1").is_ok());
    }
}
