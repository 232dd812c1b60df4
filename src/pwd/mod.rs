use tokio::task::JoinError;

pub mod bcrypt;

// Types

pub type Result<T = ()> = std::result::Result<T, Error>;

// Error

#[derive(Debug, thiserror::Error)]
#[error("password error: {0}")]
pub struct Error(#[source] pub Box<dyn std::error::Error + Send + Sync>);

impl From<JoinError> for Error {
    fn from(err: JoinError) -> Self {
        Self(Box::new(err))
    }
}

// Traits

/// Turns a plaintext password into a storable, self-describing hash and checks
/// a plaintext password against such a hash.
#[cfg_attr(test, mockall::automock)]
pub trait PasswordEncoder: Send + Sync {
    fn encode(&self, password: &str) -> Result<String>;

    /// Returns `false` on mismatch and on malformed hashes alike.
    fn verify(&self, password: &str, hash: &str) -> bool;
}
