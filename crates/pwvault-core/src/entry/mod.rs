//! Password entries and the records exchanged with the backend

mod strength;
mod types;

pub use strength::{calculate_entropy, Charset, EntropyLevel};
pub use types::{BackendEntry, PasswordEntry};
