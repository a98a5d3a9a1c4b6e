//! Vigil Config - Layered configuration for the approval decision engine.
//!
//! # Usage
//!
//! ```rust,no_run
//! use vigil_config::Config;
//!
//! let resolved = Config::load(None).unwrap();
//! println!("pending approvals expire after {}s", resolved.config.approval.ttl_secs);
//! ```
//!
//! # Precedence
//!
//! From highest to lowest:
//!
//! 1. An explicit file passed to [`Config::load`]
//! 2. The user file (`$VIGIL_HOME/config.toml`, else `~/.vigil/config.toml`)
//! 3. `VIGIL_*` environment variables, for fields neither file set
//! 4. Embedded defaults (`defaults.toml`)
//!
//! This crate has no dependencies on other vigil crates.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

/// Environment variable fallbacks.
pub mod env;
/// Configuration error types.
pub mod error;
/// Configuration file discovery and loading.
pub mod loader;
/// Layer tracking and deep merge.
pub mod merge;
/// Configuration struct definitions.
pub mod types;
/// Post-merge validation.
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{LoadOptions, ResolvedConfig};
pub use merge::{ConfigLayer, FieldSources};
pub use types::*;

impl Config {
    /// Load with the full precedence chain, optionally merging `explicit`
    /// last.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a file is malformed or the result fails
    /// validation.
    pub fn load(explicit: Option<&std::path::Path>) -> ConfigResult<ResolvedConfig> {
        loader::load(&LoadOptions {
            home_override: None,
            explicit_file: explicit.map(std::path::Path::to_path_buf),
        })
    }

    /// Load with `home` as the directory holding the user `config.toml`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a file is malformed or the result fails
    /// validation.
    pub fn load_with_home(
        explicit: Option<&std::path::Path>,
        home: &std::path::Path,
    ) -> ConfigResult<ResolvedConfig> {
        loader::load(&LoadOptions {
            home_override: Some(home.to_path_buf()),
            explicit_file: explicit.map(std::path::Path::to_path_buf),
        })
    }

    /// Load a single file over the built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read or parsed, or
    /// fails validation.
    pub fn load_file(path: &std::path::Path) -> ConfigResult<Self> {
        loader::load_file(path)
    }
}
