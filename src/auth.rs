use std::sync::Arc;

use serde::Deserialize;
use serde_trim::string_trim;
use tokio::task::spawn_blocking;
use tracing::{debug, info, instrument};
use validator::Validate;

use crate::{pwd::PasswordEncoder, store::CredentialStore};

// Consts

const DUMMY_PASSWORD: &str = "dummy password used to equalize response times";

// Types

pub type Result<T = ()> = std::result::Result<T, Error>;

// Error

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid credentials")]
    AuthenticationFailed,
    #[error("username already exists")]
    DuplicateUsername,
    #[error("{0}")]
    Hashing(
        #[from]
        #[source]
        crate::pwd::Error,
    ),
    #[error("{0}")]
    Store(#[source] crate::store::Error),
    #[error("validation of credentials failed")]
    Validation(
        #[from]
        #[source]
        validator::ValidationErrors,
    ),
}

// Credentials

#[derive(Clone, Deserialize, Validate)]
pub struct Credentials {
    #[validate(length(min = 1))]
    pub password: String,
    #[serde(deserialize_with = "string_trim")]
    #[validate(length(min = 1))]
    pub username: String,
}

// Authenticator

pub struct Authenticator<ENCODER: PasswordEncoder, STORE: CredentialStore> {
    dummy_hash: String,
    encoder: Arc<ENCODER>,
    store: STORE,
}

impl<ENCODER: PasswordEncoder + 'static, STORE: CredentialStore> Authenticator<ENCODER, STORE> {
    pub fn new(encoder: ENCODER, store: STORE) -> crate::pwd::Result<Self> {
        debug!("encoding dummy password");
        let dummy_hash = encoder.encode(DUMMY_PASSWORD)?;
        Ok(Self {
            dummy_hash,
            encoder: Arc::new(encoder),
            store,
        })
    }

    pub fn store(&self) -> &STORE {
        &self.store
    }

    /// Checks `creds` against the stored hash.
    ///
    /// Unknown usernames and wrong passwords both yield
    /// [`Error::AuthenticationFailed`] after a full hash verification.
    #[instrument(skip(self, creds), fields(user.name = creds.username.as_str()))]
    pub async fn authenticate(&self, creds: &Credentials) -> Result {
        creds.validate()?;
        debug!("authenticating user with password");
        let (hash, exists) = match self.store.lookup(&creds.username).await {
            Ok(hash) => (hash, true),
            Err(crate::store::Error::NotFound) => {
                debug!("user doesn't exist");
                (self.dummy_hash.clone(), false)
            }
            Err(err) => return Err(Error::Store(err)),
        };
        let matches = self.verify(&creds.password, hash).await?;
        if matches && exists {
            info!("user authenticated");
            Ok(())
        } else {
            debug!("authentication failed");
            Err(Error::AuthenticationFailed)
        }
    }

    #[instrument(skip(self, creds), fields(user.name = creds.username.as_str()))]
    pub async fn register(&self, creds: &Credentials) -> Result {
        creds.validate()?;
        debug!("registering user");
        let hash = self.encode(&creds.password).await?;
        self.store
            .register(&creds.username, &hash)
            .await
            .map_err(|err| match err {
                crate::store::Error::DuplicateUsername => Error::DuplicateUsername,
                err => Error::Store(err),
            })?;
        info!("user registered");
        Ok(())
    }

    async fn encode(&self, password: &str) -> Result<String> {
        let encoder = self.encoder.clone();
        let password = password.to_string();
        let hash = spawn_blocking(move || encoder.encode(&password))
            .await
            .map_err(crate::pwd::Error::from)??;
        Ok(hash)
    }

    async fn verify(&self, password: &str, hash: String) -> Result<bool> {
        let encoder = self.encoder.clone();
        let password = password.to_string();
        let matches = spawn_blocking(move || encoder.verify(&password, &hash))
            .await
            .map_err(crate::pwd::Error::from)?;
        Ok(matches)
    }
}

// Tests
