//! UniProt candidate search
//!
//! Finds reviewed enzymes of modest length that have at least one
//! experimentally determined structure, and collects their PDB
//! cross-references and annotated organic cofactors.
//!
//! API docs: https://www.uniprot.org/help/api_queries

use crate::config::{FinderConfig, MIN_SEQUENCE_LENGTH};
use crate::ligand::is_organic_ligand;
use crate::pipeline::CandidateSource;
use async_trait::async_trait;
use mdscout_common::{CandidateEntry, MdscoutError, Result, UNVERIFIED_COFACTOR};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

const UNIPROT_SEARCH_PATH: &str = "/uniprotkb/search";

/// Largest page UniProt is asked for in one request.
pub const MAX_SEARCH_SIZE: usize = 500;

/// Field projection requested from UniProt.
pub const SEARCH_FIELDS: &str =
    "accession,id,protein_name,length,organism_name,ec,cc_cofactor,cc_catalytic_activity,xref_pdb";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Value>,
}

/// Client for the UniProtKB search endpoint
pub struct UniProtClient {
    client: Client,
    base_url: String,
    max_length: u32,
}

impl UniProtClient {
    pub fn new(client: Client, config: &FinderConfig) -> Self {
        Self {
            client,
            base_url: config.uniprot_base_url.trim_end_matches('/').to_string(),
            max_length: config.max_length,
        }
    }

    /// Boolean query: reviewed, length window, has 3D structure, has EC number
    pub fn search_query(&self) -> String {
        format!(
            "(reviewed:true) AND (length:[{} TO {}]) AND (structure_3d:true) AND (ec:*)",
            MIN_SEQUENCE_LENGTH, self.max_length
        )
    }

    /// Over-fetch twice the limit to leave room for entries without PDB links
    pub fn request_size(limit: usize) -> usize {
        limit.max(1).saturating_mul(2).min(MAX_SEARCH_SIZE)
    }

    /// Search for up to `limit` candidates, in UniProt's order.
    ///
    /// A failed request yields an empty list; it is never retried.
    #[instrument(skip(self))]
    pub async fn search_candidates(&self, limit: usize) -> Vec<CandidateEntry> {
        match self.try_search(limit).await {
            Ok(candidates) => {
                info!(count = candidates.len(), "Found enzyme entries with PDB structures");
                candidates
            },
            Err(e) => {
                warn!(error = %e, "UniProt search failed");
                Vec::new()
            },
        }
    }

    async fn try_search(&self, limit: usize) -> Result<Vec<CandidateEntry>> {
        let url = format!("{}{}", self.base_url, UNIPROT_SEARCH_PATH);
        let query = self.search_query();
        let size = Self::request_size(limit).to_string();

        info!("Searching UniProt for small enzymes with 3D structures");
        debug!(%query, %size, "UniProt request");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("query", query.as_str()),
                ("format", "json"),
                ("size", size.as_str()),
                ("fields", SEARCH_FIELDS),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MdscoutError::status(url, response.status().as_u16()));
        }

        let body: SearchResponse = response.json().await?;
        info!(count = body.results.len(), "Got enzyme entries, filtering");

        Ok(collect_candidates(&body.results, limit))
    }
}

#[async_trait]
impl CandidateSource for UniProtClient {
    async fn search_candidates(&self, limit: usize) -> Vec<CandidateEntry> {
        UniProtClient::search_candidates(self, limit).await
    }
}

/// Keep entries with PDB cross-references until `limit` are retained
pub fn collect_candidates(results: &[Value], limit: usize) -> Vec<CandidateEntry> {
    results
        .iter()
        .filter_map(candidate_from_entry)
        .take(limit.max(1))
        .collect()
}

/// Project one UniProt JSON entry; `None` when it has no PDB cross-reference
pub fn candidate_from_entry(entry: &Value) -> Option<CandidateEntry> {
    let structure_ids: Vec<String> = entry["uniProtKBCrossReferences"]
        .as_array()
        .map(|xrefs| {
            xrefs
                .iter()
                .filter(|xref| xref["database"].as_str() == Some("PDB"))
                .filter_map(|xref| xref["id"].as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default();

    if structure_ids.is_empty() {
        return None;
    }

    let mut known_cofactors: Vec<String> = entry["comments"]
        .as_array()
        .into_iter()
        .flatten()
        .filter(|comment| comment["commentType"].as_str() == Some("COFACTOR"))
        .flat_map(|comment| comment["cofactors"].as_array().into_iter().flatten())
        .filter_map(|cofactor| cofactor["name"].as_str())
        .filter(|name| !name.is_empty() && is_organic_ligand(name))
        .map(String::from)
        .collect();

    if known_cofactors.is_empty() {
        known_cofactors.push(UNVERIFIED_COFACTOR.to_string());
    }

    Some(CandidateEntry {
        accession: entry["primaryAccession"].as_str().unwrap_or("").to_string(),
        protein_name: entry["proteinDescription"]["recommendedName"]["fullName"]["value"]
            .as_str()
            .unwrap_or("Unknown")
            .to_string(),
        length: entry["sequence"]["length"]
            .as_u64()
            .and_then(|len| u32::try_from(len).ok())
            .unwrap_or(0),
        organism: entry["organism"]["scientificName"]
            .as_str()
            .unwrap_or("Unknown")
            .to_string(),
        structure_ids,
        known_cofactors,
    })
}
