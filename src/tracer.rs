use std::io::stderr;

use clap::ValueEnum;
use tracing_subscriber::{
    filter::ParseError,
    fmt::layer,
    layer::SubscriberExt,
    registry,
    util::{SubscriberInitExt, TryInitError},
    EnvFilter, Layer,
};

// Types

pub type Result<T = ()> = std::result::Result<T, Error>;

// Error

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to initialize tracer: {0}")]
    Init(
        #[from]
        #[source]
        TryInitError,
    ),
    #[error("invalid log filter: {0}")]
    Filter(
        #[from]
        #[source]
        ParseError,
    ),
}

// LogFormat

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum LogFormat {
    Json,
    #[default]
    Text,
}

// Functions

pub fn init_tracer<FILTER: Into<String>>(log_filter: FILTER, format: LogFormat) -> Result {
    let filter = EnvFilter::builder().parse(log_filter.into())?;
    let sub = match format {
        LogFormat::Json => layer().json().with_writer(stderr).boxed(),
        LogFormat::Text => layer().with_writer(stderr).boxed(),
    };
    registry().with(filter).with(sub).try_init()?;
    Ok(())
}

// Tests
