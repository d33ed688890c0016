use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file could not be written, or a required value is missing
    #[error("Configuration error: {0}")]
    Config(String),

    /// Zone or record request failed, or the provider answered with an error
    #[error("Cloudflare API error: {0}")]
    Provider(String),

    #[error("Zone not found for domain: {0}")]
    ZoneNotFound(String),

    /// Public IP could not be determined
    #[error("Network error: {0}")]
    Network(String),

    /// Interactive input was malformed or ended early
    #[error("Invalid input: {0}")]
    Input(String),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Config(_) => exit::CONFIG,
            Error::Network(_) => exit::NETWORK,
            Error::Provider(_) | Error::ZoneNotFound(_) => exit::PROVIDER,
            Error::Input(_) => exit::INPUT,
        }
    }
}

/// Process exit codes. clap already uses 2 for usage errors.
pub mod exit {
    pub const CONFIG: u8 = 3;
    pub const NETWORK: u8 = 4;
    pub const PROVIDER: u8 = 5;
    pub const INPUT: u8 = 6;
    pub const OTHER: u8 = 1;
}

/// Maps a top-level failure to its exit code, falling back to 1 for errors
/// that did not originate in this crate.
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<Error>())
        .map(Error::exit_code)
        .unwrap_or(exit::OTHER)
}
