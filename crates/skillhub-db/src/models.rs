//! Read models for queries that JOIN an entity with the user that owns it.
//! Plain entities come straight from `skillhub_types::models`.

use skillhub_types::models::AppUser;

/// A record together with its author/owner/sender, fetched in one query.
#[derive(Debug, Clone)]
pub struct Authored<T> {
    pub record: T,
    pub author: AppUser,
}

impl<T> Authored<T> {
    pub fn new(record: T, author: AppUser) -> Self {
        Self { record, author }
    }
}
