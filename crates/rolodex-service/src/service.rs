use chrono::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use rolodex_core::{
    Account, AdminLevel, Permission, Profile, ProfileUpdate, Registration, SystemStats,
    UserSummary,
};
use rolodex_store::{AccountStore, ContactStore, DataLayout, GroupStore, StoreError};

use crate::error::{Result, ServiceError};
use crate::events::ServiceEvent;
use crate::session::Session;

const RECENT_DAYS: i64 = 7;

/// Entry point for front ends. Owns nothing but the data layout; every call
/// builds the stores it needs and drops them when done.
pub struct RolodexService {
    layout: DataLayout,
    event_tx: mpsc::Sender<ServiceEvent>,
    event_rx: Option<mpsc::Receiver<ServiceEvent>>,
}

impl RolodexService {
    pub fn new(layout: DataLayout) -> Self {
        let (event_tx, event_rx) = mpsc::channel(1000);
        Self {
            layout,
            event_tx,
            event_rx: Some(event_rx),
        }
    }

    pub fn layout(&self) -> &DataLayout {
        &self.layout
    }

    pub fn take_event_receiver(&mut self) -> Option<mpsc::Receiver<ServiceEvent>> {
        self.event_rx.take()
    }

    // Never blocks: with nobody draining the channel, events are dropped.
    fn emit(&self, event: ServiceEvent) {
        if let Err(e) = self.event_tx.try_send(event) {
            debug!("Event dropped: {}", e);
        }
    }

    fn users(&self) -> AccountStore {
        AccountStore::users(&self.layout)
    }

    fn admins(&self) -> AccountStore {
        AccountStore::admins(&self.layout)
    }

    fn accounts_for(&self, session: &Session) -> AccountStore {
        if session.is_admin {
            self.admins()
        } else {
            self.users()
        }
    }

    /// The store holding `username`, users first.
    async fn locate(&self, username: &str) -> Result<AccountStore> {
        let users = self.users();
        if users.exists(username).await {
            return Ok(users);
        }
        let admins = self.admins();
        if admins.exists(username).await {
            return Ok(admins);
        }
        Err(StoreError::NotFound("User does not exist".to_string()).into())
    }

    pub async fn register(&self, registration: Registration) -> Result<Account> {
        let account = self.users().register(registration).await?;
        self.emit(ServiceEvent::Registered {
            username: account.username.clone(),
            is_admin: false,
        });
        Ok(account)
    }

    pub async fn register_admin(
        &self,
        registration: Registration,
        level: AdminLevel,
    ) -> Result<Account> {
        let account = self
            .admins()
            .register_with_level(registration, level)
            .await?;
        self.emit(ServiceEvent::Registered {
            username: account.username.clone(),
            is_admin: true,
        });
        Ok(account)
    }

    /// Admin login is attempted first. When a name exists in both documents
    /// and the admin password does not match, the user account is tried.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session> {
        let admins = self.admins();
        let users = self.users();
        let account = if admins.exists(username).await {
            match admins.login(username, password).await {
                Ok(account) => account,
                Err(StoreError::Unauthorized(message)) => {
                    if !users.exists(username).await {
                        return Err(StoreError::Unauthorized(message).into());
                    }
                    users.login(username, password).await?
                }
                Err(e) => return Err(e.into()),
            }
        } else {
            users.login(username, password).await?
        };

        let session = Session::from(&account);
        self.emit(ServiceEvent::LoggedIn {
            username: session.username.clone(),
            is_admin: session.is_admin,
        });
        Ok(session)
    }

    pub fn logout(&self, session: Session) {
        info!(username = %session.username, "Logged out");
        self.emit(ServiceEvent::LoggedOut {
            username: session.username,
        });
    }

    pub async fn security_question(&self, username: &str) -> Result<String> {
        Ok(self.locate(username).await?.security_question(username).await?)
    }

    pub async fn verify_security_answer(&self, username: &str, answer: &str) -> Result<()> {
        if username.is_empty() || answer.is_empty() {
            return Err(StoreError::Validation("Please provide all information".to_string()).into());
        }
        Ok(self
            .locate(username)
            .await?
            .verify_security_answer(username, answer)
            .await?)
    }

    pub async fn reset_password(
        &self,
        username: &str,
        answer: &str,
        new_password: &str,
    ) -> Result<()> {
        if username.is_empty() || answer.is_empty() || new_password.is_empty() {
            return Err(StoreError::Validation("Please provide all information".to_string()).into());
        }
        self.locate(username)
            .await?
            .reset_password(username, answer, new_password)
            .await?;
        self.emit(ServiceEvent::PasswordReset {
            username: username.to_string(),
        });
        Ok(())
    }

    /// Contacts of the logged-in account. Admin lists live under admin data.
    pub fn contacts(&self, session: &Session) -> ContactStore {
        if session.is_admin {
            ContactStore::admin(&self.layout, &session.username)
        } else {
            ContactStore::new(&self.layout, Some(&session.username))
        }
    }

    /// Private groups for users, the shared document for administrators.
    pub fn groups(&self, session: &Session) -> GroupStore {
        if session.is_admin {
            GroupStore::shared(&self.layout)
        } else {
            GroupStore::user(&self.layout, &session.username)
        }
    }

    pub fn shared_groups(&self) -> GroupStore {
        GroupStore::shared(&self.layout)
    }

    pub async fn profile(&self, session: &Session) -> Result<Profile> {
        Ok(self
            .accounts_for(session)
            .profile(&session.username)
            .await?)
    }

    pub async fn update_profile(&self, session: &Session, update: ProfileUpdate) -> Result<Profile> {
        let profile = self
            .accounts_for(session)
            .update_profile(&session.username, update)
            .await?;
        self.emit(ServiceEvent::ProfileUpdated {
            username: session.username.clone(),
        });
        Ok(profile)
    }

    /// Re-read the admin record so revoked grants take effect immediately.
    async fn authorize(&self, session: &Session, permission: Option<Permission>) -> Result<Account> {
        if !session.is_admin {
            warn!(username = %session.username, "Administrator operation refused");
            return Err(ServiceError::forbidden("Administrator access required"));
        }
        let admin = match self.admins().get(&session.username).await {
            Ok(admin) => admin,
            Err(StoreError::NotFound(_)) => {
                return Err(ServiceError::forbidden("Administrator access required"));
            }
            Err(e) => return Err(e.into()),
        };
        if let Some(permission) = permission {
            if !admin.allows(permission) {
                warn!(username = %session.username, ?permission, "Permission denied");
                return Err(ServiceError::forbidden("Permission denied"));
            }
        }
        Ok(admin)
    }

    async fn summarize(&self, accounts: Vec<Account>) -> Result<Vec<UserSummary>> {
        let mut summaries = Vec::with_capacity(accounts.len());
        for account in accounts {
            let contact_count = ContactStore::new(&self.layout, Some(&account.username))
                .count()
                .await?;
            summaries.push(UserSummary {
                profile: account.profile(),
                contact_count,
            });
        }
        Ok(summaries)
    }

    pub async fn list_users(&self, session: &Session) -> Result<Vec<UserSummary>> {
        self.authorize(session, Some(Permission::ViewUsers)).await?;
        let accounts = self.users().list().await;
        self.summarize(accounts).await
    }

    pub async fn search_users(&self, session: &Session, query: &str) -> Result<Vec<UserSummary>> {
        self.authorize(session, Some(Permission::ViewUsers)).await?;
        let accounts = self.users().search(query).await;
        self.summarize(accounts).await
    }

    pub async fn get_user(&self, session: &Session, username: &str) -> Result<UserSummary> {
        self.authorize(session, Some(Permission::ViewUsers)).await?;
        let account = self.users().get(username).await?;
        let mut summaries = self.summarize(vec![account]).await?;
        summaries
            .pop()
            .ok_or_else(|| StoreError::NotFound("User not found".to_string()).into())
    }

    pub async fn delete_user(&self, session: &Session, username: &str) -> Result<Account> {
        self.authorize(session, None).await?;
        let removed = self.users().delete(username).await?;
        info!(username, by = %session.username, "User deleted by administrator");
        self.emit(ServiceEvent::UserDeleted {
            username: username.to_string(),
            by: session.username.clone(),
        });
        Ok(removed)
    }

    pub async fn set_user_password(
        &self,
        session: &Session,
        username: &str,
        new_password: &str,
    ) -> Result<()> {
        self.authorize(session, None).await?;
        self.users().set_password(username, new_password).await?;
        self.emit(ServiceEvent::UserPasswordChanged {
            username: username.to_string(),
            by: session.username.clone(),
        });
        Ok(())
    }

    pub async fn system_stats(&self, session: &Session) -> Result<SystemStats> {
        self.authorize(session, Some(Permission::ViewStatistics))
            .await?;

        let users = self.users().list().await;
        let cutoff = rolodex_core::now() - Duration::days(RECENT_DAYS);

        let mut total_contacts = 0;
        for account in &users {
            total_contacts += ContactStore::new(&self.layout, Some(&account.username))
                .count()
                .await?;
        }
        let recent_registrations = users.iter().filter(|a| a.created_at >= cutoff).count();

        Ok(SystemStats {
            total_users: users.len(),
            total_contacts,
            recent_registrations,
            avg_contacts_per_user: average(total_contacts, users.len()),
        })
    }
}

/// Mean rounded to two decimals; zero when there is nobody to divide by.
fn average(total: usize, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    (total as f64 / count as f64 * 100.0).round() / 100.0
}
