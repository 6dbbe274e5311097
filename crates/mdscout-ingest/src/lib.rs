//! mdscout Ingest Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Finds small protein-ligand complexes suitable for molecular dynamics on
//! modest hardware, by combining two public sources:
//!
//! - **UniProt**: reviewed enzymes with annotated cofactors and PDB cross-references
//! - **RCSB PDB**: structure search and per-entry physical metadata
//!
//! # Example
//!
//! ```no_run
//! use mdscout_ingest::{
//!     config::FinderConfig, pipeline::Pipeline, rcsb::RcsbClient, throttle::FixedDelay,
//!     uniprot::UniProtClient,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = FinderConfig::from_env()?;
//!     let http = config.http_client()?;
//!     let throttle = Arc::new(FixedDelay::new(config.delays));
//!
//!     let uniprot = UniProtClient::new(http.clone(), &config);
//!     let rcsb = RcsbClient::new(http, &config, throttle.clone());
//!
//!     let report = Pipeline::new(config, throttle).run_annotated(&uniprot, &rcsb).await?;
//!     println!("{} suitable complexes", report.matches.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod export;
pub mod filter;
pub mod ligand;
pub mod pipeline;
pub mod progress;
pub mod rcsb;
pub mod throttle;
pub mod uniprot;
