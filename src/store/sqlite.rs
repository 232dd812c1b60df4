use std::str::FromStr;

use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use tracing::{debug, info, instrument};

use super::{CredentialStore, Error, Result};

// Consts

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL
)";

// SqliteCredentialStore

pub struct SqliteCredentialStore {
    pool: SqlitePool,
}

impl SqliteCredentialStore {
    /// Connects to the database, creating it and its schema if absent.
    #[instrument(skip(url))]
    pub async fn open(url: &str, max_connections: u32) -> Result<Self> {
        debug!("connecting to database");
        let opts = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(opts)
            .await?;
        let store = Self { pool };
        store.init_schema().await?;
        info!("credential store opened");
        Ok(store)
    }

    pub async fn close(&self) {
        debug!("closing database pool");
        self.pool.close().await;
        info!("credential store closed");
    }

    async fn init_schema(&self) -> Result {
        debug!("initializing schema");
        sqlx::query(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }
}

impl CredentialStore for SqliteCredentialStore {
    #[instrument(skip(self, username), fields(user.name = username))]
    async fn lookup(&self, username: &str) -> Result<String> {
        debug!("fetching password hash");
        sqlx::query_scalar::<_, String>("SELECT password_hash FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| {
                debug!("user doesn't exist");
                Error::NotFound
            })
    }

    #[instrument(skip(self, username, password_hash), fields(user.name = username))]
    async fn register(&self, username: &str, password_hash: &str) -> Result {
        debug!("inserting credentials");
        let res = sqlx::query("INSERT INTO users (username, password_hash) VALUES (?, ?)")
            .bind(username)
            .bind(password_hash)
            .execute(&self.pool)
            .await;
        match res {
            Ok(_) => {
                info!("credentials stored");
                Ok(())
            }
            Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
                debug!("username already taken");
                Err(Error::DuplicateUsername)
            }
            Err(err) => Err(err.into()),
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Self::Unavailable(Box::new(err))
    }
}

// Tests

#[cfg(test)]
mod test {
    use crate::test::*;

    use super::*;

    // Fns

    async fn memory_store() -> SqliteCredentialStore {
        SqliteCredentialStore::open("sqlite::memory:", 1)
            .await
            .unwrap()
    }

    // Mods

    mod sqlite_credential_store {
        use super::*;

        // Data

        #[derive(Clone)]
        struct Data {
            hash: &'static str,
            other_hash: &'static str,
            username: &'static str,
        }

        impl Default for Data {
            fn default() -> Self {
                Self {
                    hash: "$2b$04$0123456789abcdefghijkuCUxOVeJzQ6ErlRz0r9c7Nk3oqGpUq2y",
                    other_hash: "$2b$04$abcdefghijk0123456789uxL0yJ0oZ3Nq6pFzQVN3Ck2R2x2c1Fe",
                    username: "alice",
                }
            }
        }

        // Mods

        mod lookup {
            use super::*;

            // Tests

            #[tokio::test]
            async fn when_store_is_empty() {
                init_tracer();
                let store = memory_store().await;
                let err = store.lookup("ghost").await.unwrap_err();
                assert!(matches!(err, Error::NotFound));
            }

            #[tokio::test]
            async fn when_store_is_closed() {
                init_tracer();
                let data = Data::default();
                let store = memory_store().await;
                store.close().await;
                let err = store.lookup(data.username).await.unwrap_err();
                assert!(matches!(err, Error::Unavailable(_)));
            }

            #[tokio::test]
            async fn test() {
                init_tracer();
                let data = Data::default();
                let store = memory_store().await;
                store.register(data.username, data.hash).await.unwrap();
                let hash = store.lookup(data.username).await.unwrap();
                assert_eq!(hash, data.hash);
            }
        }

        mod open {
            use super::*;

            // Tests

            #[tokio::test]
            async fn when_database_file_is_reopened() {
                init_tracer();
                let data = Data::default();
                let dir = tempfile::tempdir().unwrap();
                let url = format!("sqlite://{}", dir.path().join("users.db").display());
                let store = SqliteCredentialStore::open(&url, 2).await.unwrap();
                store.register(data.username, data.hash).await.unwrap();
                store.close().await;
                let store = SqliteCredentialStore::open(&url, 2).await.unwrap();
                let hash = store.lookup(data.username).await.unwrap();
                assert_eq!(hash, data.hash);
                store.close().await;
            }

            #[tokio::test]
            async fn when_url_is_invalid() {
                init_tracer();
                let res = SqliteCredentialStore::open("postgres://localhost", 1).await;
                assert!(matches!(res, Err(Error::Unavailable(_))));
            }
        }

        mod register {
            use super::*;

            // Tests

            #[tokio::test]
            async fn when_username_exists() {
                init_tracer();
                let data = Data::default();
                let store = memory_store().await;
                store.register(data.username, data.hash).await.unwrap();
                let err = store
                    .register(data.username, data.other_hash)
                    .await
                    .unwrap_err();
                assert!(matches!(err, Error::DuplicateUsername));
                let hash = store.lookup(data.username).await.unwrap();
                assert_eq!(hash, data.hash);
            }

            #[tokio::test]
            async fn when_registrations_are_concurrent() {
                init_tracer();
                let data = Data::default();
                let dir = tempfile::tempdir().unwrap();
                let url = format!("sqlite://{}", dir.path().join("users.db").display());
                let store = SqliteCredentialStore::open(&url, 4).await.unwrap();
                let (left, right) = tokio::join!(
                    store.register("bob", data.hash),
                    store.register("bob", data.other_hash),
                );
                let results = [left, right];
                let successes = results.iter().filter(|res| res.is_ok()).count();
                let duplicates = results
                    .iter()
                    .filter(|res| matches!(res, Err(Error::DuplicateUsername)))
                    .count();
                assert_eq!(successes, 1);
                assert_eq!(duplicates, 1);
                store.close().await;
            }

            #[tokio::test]
            async fn test() {
                init_tracer();
                let data = Data::default();
                let store = memory_store().await;
                store.register(data.username, data.hash).await.unwrap();
                store.register("bob", data.other_hash).await.unwrap();
                assert_eq!(store.lookup(data.username).await.unwrap(), data.hash);
                assert_eq!(store.lookup("bob").await.unwrap(), data.other_hash);
            }
        }
    }
}
