mod accounts;
mod contacts;
pub mod credentials;
mod document;
mod error;
mod groups;
mod layout;

pub use accounts::{AccountStore, RESERVED_ADMIN};
pub use contacts::{ContactStore, MIN_PHONE_DIGITS, sort_contacts};
pub use error::{Result, StoreError};
pub use groups::{GroupScope, GroupStore};
pub use layout::{DataLayout, contacts_file_name};
