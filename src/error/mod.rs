//! Error handling module for cssense.
//!
//! Failure in this crate comes in two flavours:
//! - Recoverable editor situations (half-typed or malformed CSS, stale
//!   selector responses) that are absorbed locally and surface as "no
//!   suggestions", never as an error
//! - Contract and environment failures (bad configuration, unreadable
//!   database files, collaborator errors) reported through [`CssenseError`]
//!
//! # Example
//!
//! ```rust,no_run
//! use cssense::error::{ConfigError, CssenseError, Result};
//!
//! fn check_entries(max_entries: usize) -> Result<()> {
//!     if max_entries == 0 {
//!         return Err(CssenseError::Config(ConfigError::InvalidValue {
//!             field: "max_entries".to_string(),
//!             value: max_entries.to_string(),
//!         }));
//!     }
//!     Ok(())
//! }
//! ```

pub mod kinds;

// Re-export commonly used types
pub use kinds::{ConfigError, CssenseError, QueryError, Result};
