mod account;
mod contact;
mod group;
mod lenient;
mod protocol;
pub mod text;

pub use account::*;
pub use contact::*;
pub use group::*;
pub use protocol::*;

/// Current local time, the clock every record timestamp comes from.
pub fn now() -> chrono::NaiveDateTime {
    chrono::Local::now().naive_local()
}
