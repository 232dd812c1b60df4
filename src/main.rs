use std::{net::SocketAddr, sync::Arc};

use api::{start_api, ApiContext};
use auth::Authenticator;
use clap::Parser;
use pwd::bcrypt::{BcryptPasswordEncoder, DEFAULT_COST};
use store::sqlite::SqliteCredentialStore;
use tracer::{init_tracer, LogFormat};
use tracing::debug;

mod api;
mod auth;
mod process;
mod pwd;
mod store;
mod tracer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracer(args.obs.log_filter, args.obs.log_format)?;
    let store =
        SqliteCredentialStore::open(&args.db.database_url, args.db.database_max_connections)
            .await?;
    debug!(pwd.cost = args.bcrypt_cost, "building authenticator");
    let encoder = BcryptPasswordEncoder::new(args.bcrypt_cost);
    let auth = Authenticator::new(encoder, store)?;
    let ctx = Arc::new(ApiContext { auth });
    let res = start_api(args.bind_addr, ctx.clone()).await;
    ctx.auth.store().close().await;
    res
}

#[derive(Clone, Debug, Eq, Parser, PartialEq)]
#[command(version)]
struct Args {
    #[arg(
        long,
        env,
        default_value_t = DEFAULT_COST,
        value_parser = clap::value_parser!(u32).range(4..=31),
        long_help = "bcrypt cost factor of new password hashes"
    )]
    bcrypt_cost: u32,
    #[arg(
        long,
        env,
        default_value = "127.0.0.1:8081",
        long_help = "Address on which listen requests"
    )]
    bind_addr: SocketAddr,
    #[command(flatten)]
    db: DatabaseArgs,
    #[command(flatten)]
    obs: ObsArgs,
}

#[derive(clap::Args, Clone, Debug, Eq, PartialEq)]
struct DatabaseArgs {
    #[arg(
        long,
        env,
        default_value_t = 5,
        long_help = "Maximum number of database connections"
    )]
    database_max_connections: u32,
    #[arg(
        long,
        env,
        default_value = "sqlite://users.db",
        long_help = "URL to sqlite database, created if it doesn't exist"
    )]
    database_url: String,
}

impl Default for DatabaseArgs {
    fn default() -> Self {
        Self {
            database_max_connections: 5,
            database_url: "sqlite://users.db".into(),
        }
    }
}

#[derive(clap::Args, Clone, Debug, Eq, PartialEq)]
struct ObsArgs {
    #[arg(
        long,
        env,
        value_enum,
        default_value_t = LogFormat::Text,
        long_help = "Log output format"
    )]
    log_format: LogFormat,
    #[arg(
        long,
        env,
        default_value = "credstore=info,warn",
        long_help = "Log filter (https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html#directives)"
    )]
    log_filter: String,
}

impl Default for ObsArgs {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Text,
            log_filter: "credstore=info,warn".into(),
        }
    }
}

// Tests
