use bcrypt::BcryptError;
use tracing::{debug, instrument};

use super::{Error, PasswordEncoder, Result};

// Consts

/// Work factor of new hashes, about 100-200ms per hash on commodity hardware.
pub const DEFAULT_COST: u32 = 11;

/// bcrypt ignores everything past this many bytes.
pub const MAX_PASSWORD_LEN: usize = 72;

// Error

#[derive(Debug, thiserror::Error)]
#[error("password is longer than {} bytes", MAX_PASSWORD_LEN)]
pub struct PasswordTooLong;

// BcryptPasswordEncoder

pub struct BcryptPasswordEncoder {
    cost: u32,
}

impl BcryptPasswordEncoder {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptPasswordEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_COST)
    }
}

impl PasswordEncoder for BcryptPasswordEncoder {
    #[instrument("encode_password", skip(self, password), fields(pwd.cost = self.cost))]
    fn encode(&self, password: &str) -> Result<String> {
        if password.len() > MAX_PASSWORD_LEN {
            debug!("password exceeds bcrypt input limit");
            return Err(Error(Box::new(PasswordTooLong)));
        }
        debug!("encoding password");
        bcrypt::hash(password, self.cost).map_err(Error::from)
    }

    #[instrument("verify_password", skip(self, password, hash))]
    fn verify(&self, password: &str, hash: &str) -> bool {
        if password.len() > MAX_PASSWORD_LEN {
            debug!("password exceeds bcrypt input limit");
            return false;
        }
        debug!("verifying password");
        match bcrypt::verify(password, hash) {
            Ok(matches) => matches,
            Err(err) => {
                debug!("stored hash can't be verified: {err}");
                false
            }
        }
    }
}

impl From<BcryptError> for Error {
    fn from(err: BcryptError) -> Self {
        Self(Box::new(err))
    }
}

// Tests
