#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceEvent {
    Registered { username: String, is_admin: bool },
    LoggedIn { username: String, is_admin: bool },
    LoggedOut { username: String },
    PasswordReset { username: String },
    ProfileUpdated { username: String },
    UserDeleted { username: String, by: String },
    UserPasswordChanged { username: String, by: String },
}
