use std::future::Future;

pub mod sqlite;

// Types

pub type Result<T = ()> = std::result::Result<T, Error>;

// Error

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("username already exists")]
    DuplicateUsername,
    #[error("credentials not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(#[source] Box<dyn std::error::Error + Send + Sync>),
}

// Traits

/// Durable mapping from username to password hash.
///
/// Uniqueness of usernames is enforced atomically: of two concurrent
/// registrations of the same username, exactly one succeeds.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialStore: Send + Sync {
    fn lookup(&self, username: &str) -> impl Future<Output = Result<String>> + Send;

    fn register(&self, username: &str, password_hash: &str)
        -> impl Future<Output = Result> + Send;
}
