//! Environment-driven store configuration.
//!
//! [`OpenOptions::from_env`] starts from the defaults and overrides each
//! field whose variable is set.
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `TXKV_STORE_NAME` | Collection name inside the namespace | the location |
//! | `TXKV_CREATE_IF_MISSING` | Create the store if it does not exist | `true` |
//! | `TXKV_ERROR_IF_EXISTS` | Fail if the store already exists | `false` |
//! | `TXKV_KEY_ENCODING` | Key encoding (`utf8`, `binary`) | `utf8` |
//!
//! # Example
//!
//! ```rust
//! use std::env;
//! use txkv::{KeyEncoding, OpenOptions};
//!
//! unsafe {
//!     env::set_var("TXKV_KEY_ENCODING", "binary");
//! }
//! let options = OpenOptions::from_env().unwrap();
//! assert_eq!(options.key_encoding, KeyEncoding::Binary);
//! # unsafe { env::remove_var("TXKV_KEY_ENCODING"); }
//! ```

use crate::OpenOptions;
use std::env;
use thiserror::Error;

/// Environment variable name for the collection name.
pub const ENV_STORE_NAME: &str = "TXKV_STORE_NAME";

/// Environment variable name for `create_if_missing`.
pub const ENV_CREATE_IF_MISSING: &str = "TXKV_CREATE_IF_MISSING";

/// Environment variable name for `error_if_exists`.
pub const ENV_ERROR_IF_EXISTS: &str = "TXKV_ERROR_IF_EXISTS";

/// Environment variable name for the key encoding.
pub const ENV_KEY_ENCODING: &str = "TXKV_KEY_ENCODING";

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A boolean variable holds something other than `true`/`false`/`1`/`0`.
    #[error("invalid boolean for {var}: {value} (expected: true, false, 1, 0)")]
    InvalidBool {
        /// The environment variable name.
        var: &'static str,
        /// The rejected value.
        value: String,
    },

    /// Invalid encoding string.
    #[error("invalid encoding: {0} (expected: utf8, binary)")]
    InvalidEncoding(String),
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidBool { var, value: value.to_owned() }),
    }
}

impl OpenOptions {
    /// Load open options from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBool`] or [`ConfigError::InvalidEncoding`]
    /// if a set variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut options = Self::default();
        if let Ok(name) = env::var(ENV_STORE_NAME) {
            options.store_name = Some(name);
        }
        if let Ok(value) = env::var(ENV_CREATE_IF_MISSING) {
            options.create_if_missing = parse_bool(ENV_CREATE_IF_MISSING, &value)?;
        }
        if let Ok(value) = env::var(ENV_ERROR_IF_EXISTS) {
            options.error_if_exists = parse_bool(ENV_ERROR_IF_EXISTS, &value)?;
        }
        if let Ok(value) = env::var(ENV_KEY_ENCODING) {
            options.key_encoding = value.parse()?;
        }
        Ok(options)
    }
}
