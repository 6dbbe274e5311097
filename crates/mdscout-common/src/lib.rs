//! mdscout Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared domain types, error handling and logging for the mdscout workspace.
//!
//! - **Types**: candidate entries from UniProt and structure records from RCSB PDB
//! - **Error Handling**: [`MdscoutError`] and the [`Result`] alias
//! - **Logging**: tracing subscriber setup driven by [`logging::LogConfig`]
//!
//! # Example
//!
//! ```no_run
//! use mdscout_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let _guard = init_logging(&LogConfig::from_env()?)?;
//!     tracing::info!("mdscout started");
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;
pub mod types;

pub use error::{MdscoutError, Result};
pub use types::{CandidateEntry, LigandLookup, StructureRecord, UNVERIFIED_COFACTOR};
