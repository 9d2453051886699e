mod error;
mod events;
mod service;
mod session;

pub use error::{Result, ServiceError};
pub use events::ServiceEvent;
pub use service::RolodexService;
pub use session::Session;

pub use rolodex_core::{
    Account, AdminLevel, Contact, ContactField, ContactInput, ContactSortField, Envelope, Group,
    GroupInput, GroupSortField, Profile, ProfileUpdate, Registration, SystemStats, UserSummary,
};
pub use rolodex_store::{ContactStore, DataLayout, GroupStore, StoreError, sort_contacts};
