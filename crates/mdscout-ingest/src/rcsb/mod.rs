//! RCSB PDB client
//!
//! Two capabilities:
//!   - criteria search over the search API, paginated 10 rows at a time
//!   - per-entry detail lookups over the data API (entry, polymer entities,
//!     non-polymer entities)
//!
//! Search docs: https://search.rcsb.org/#search-api
//! Data docs:   https://data.rcsb.org/#data-api

pub mod document;
pub mod query;

use crate::config::FinderConfig;
use crate::ligand::is_qualifying_component;
use crate::pipeline::StructureSource;
use crate::throttle::{Pause, Throttle};
use async_trait::async_trait;
use document::{PolymerEntity, PolymerSummary};
use mdscout_common::{LigandLookup, MdscoutError, Result, StructureRecord};
use query::{criteria_request, page_count, SearchRequest, SearchResponse, PAGE_SIZE};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Structure ids from a criteria search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchOutcome {
    pub ids: Vec<String>,
    /// Hits available remotely, as reported by the last page; informational
    pub total_count: u64,
}

/// Client for the RCSB search and data APIs
pub struct RcsbClient {
    client: Client,
    search_url: String,
    data_url: String,
    max_atoms: u64,
    max_resolution: f64,
    throttle: Arc<dyn Throttle>,
}

impl RcsbClient {
    pub fn new(client: Client, config: &FinderConfig, throttle: Arc<dyn Throttle>) -> Self {
        Self {
            client,
            search_url: config.rcsb_search_url.clone(),
            data_url: config.rcsb_data_url.trim_end_matches('/').to_string(),
            max_atoms: config.max_atoms,
            max_resolution: config.max_resolution,
            throttle,
        }
    }

    fn entry_url(&self, pdb_id: &str) -> String {
        format!("{}/core/entry/{}", self.data_url, pdb_id)
    }

    fn polymer_entity_url(&self, pdb_id: &str, entity_id: &str) -> String {
        format!("{}/core/polymer_entity/{}/{}", self.data_url, pdb_id, entity_id)
    }

    fn nonpolymer_entity_url(&self, pdb_id: &str, entity_id: &str) -> String {
        format!("{}/core/nonpolymer_entity/{}/{}", self.data_url, pdb_id, entity_id)
    }

    /// Up to `limit` entry ids matching the size/quality criteria.
    ///
    /// Any failed page request abandons the search and yields an empty outcome.
    #[instrument(skip(self))]
    pub async fn search_by_criteria(&self, limit: usize) -> SearchOutcome {
        match self.try_search(limit).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "RCSB search failed");
                SearchOutcome::default()
            },
        }
    }

    async fn try_search(&self, limit: usize) -> Result<SearchOutcome> {
        let request = criteria_request(self.max_atoms, self.max_resolution);
        let pages = page_count(limit);
        let mut ids: Vec<String> = Vec::with_capacity(limit);
        let mut total_count = 0;

        info!(pages, limit, "Searching RCSB for small protein-ligand complexes");

        for page in 0..pages {
            let start = page * PAGE_SIZE;
            let rows = PAGE_SIZE.min(limit - ids.len());
            debug!(page = page + 1, pages, start, rows, "Requesting search page");

            let Some(response) = self.fetch_page(&request.page(start, rows)).await? else {
                info!(start, "No more results");
                break;
            };

            total_count = response.total_count;
            if response.result_set.is_empty() {
                info!(start, "No more results");
                break;
            }

            debug!(hits = response.result_set.len(), "Got search page");
            ids.extend(response.result_set.into_iter().map(|hit| hit.identifier));

            if ids.len() >= limit {
                ids.truncate(limit);
                break;
            }

            self.throttle.pause(Pause::SearchPage).await;
        }

        info!(found = ids.len(), total_count, "Found structures matching criteria");
        Ok(SearchOutcome { ids, total_count })
    }

    /// `None` when the service answers 204 (no hits at this offset)
    async fn fetch_page(&self, request: &SearchRequest) -> Result<Option<SearchResponse>> {
        let response = self.client.post(&self.search_url).json(request).send().await?;

        match response.status() {
            StatusCode::NO_CONTENT => Ok(None),
            status if status.is_success() => Ok(Some(response.json().await?)),
            status => Err(MdscoutError::status(self.search_url.as_str(), status.as_u16())),
        }
    }

    async fn fetch_json(&self, url: &str) -> Result<Value> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(MdscoutError::status(url, response.status().as_u16()));
        }

        Ok(response.json().await?)
    }

    /// Physical metadata for one entry.
    ///
    /// `None` only when the entry document itself cannot be fetched; polymer
    /// and ligand sub-lookups degrade to defaults.
    #[instrument(skip(self))]
    pub async fn get_structure_details(&self, pdb_id: &str) -> Option<StructureRecord> {
        let entry = match self.fetch_json(&self.entry_url(pdb_id)).await {
            Ok(entry) => entry,
            Err(e) => {
                warn!(pdb_id, error = %e, "Error fetching structure details");
                return None;
            },
        };

        let polymers = self.polymer_summary(pdb_id, &entry).await;
        let ligands = self.ligands_for_entry(pdb_id, &entry).await;

        Some(document::build_record(pdb_id, &entry, polymers, ligands))
    }

    /// Qualifying ligand codes of one entry
    #[instrument(skip(self))]
    pub async fn get_ligands(&self, pdb_id: &str) -> LigandLookup {
        match self.fetch_json(&self.entry_url(pdb_id)).await {
            Ok(entry) => self.ligands_for_entry(pdb_id, &entry).await,
            Err(e) => {
                warn!(pdb_id, error = %e, "Ligand lookup failed");
                LigandLookup::Unavailable
            },
        }
    }

    /// Resolve each non-polymer entity to its component code.
    ///
    /// Codes are deduplicated in first-seen order. A failed entity fetch only
    /// makes the result `Unavailable` when nothing qualifying was found.
    async fn ligands_for_entry(&self, pdb_id: &str, entry: &Value) -> LigandLookup {
        let mut codes: Vec<String> = Vec::new();
        let mut failures = 0usize;

        for entity_id in document::non_polymer_entity_ids(entry) {
            match self.fetch_json(&self.nonpolymer_entity_url(pdb_id, &entity_id)).await {
                Ok(doc) => {
                    if let Some(code) = document::nonpolymer_comp_id(&doc) {
                        if is_qualifying_component(code) && !codes.iter().any(|c| c == code) {
                            codes.push(code.to_string());
                        }
                    }
                },
                Err(e) => {
                    failures += 1;
                    debug!(pdb_id, entity_id = %entity_id, error = %e, "Non-polymer entity fetch failed");
                },
            }

            self.throttle.pause(Pause::EntityLookup).await;
        }

        if codes.is_empty() && failures > 0 {
            LigandLookup::Unavailable
        } else {
            LigandLookup::from_codes(codes)
        }
    }

    async fn polymer_summary(&self, pdb_id: &str, entry: &Value) -> PolymerSummary {
        let mut summary = PolymerSummary::default();

        for entity_id in document::polymer_entity_ids(entry) {
            match self.fetch_json(&self.polymer_entity_url(pdb_id, &entity_id)).await {
                Ok(doc) => summary.add(PolymerEntity::from_document(&doc)),
                Err(e) => {
                    debug!(pdb_id, entity_id = %entity_id, error = %e, "Polymer entity fetch failed");
                },
            }

            self.throttle.pause(Pause::EntityLookup).await;
        }

        summary
    }
}

#[async_trait]
impl StructureSource for RcsbClient {
    async fn search_by_criteria(&self, limit: usize) -> SearchOutcome {
        RcsbClient::search_by_criteria(self, limit).await
    }

    async fn get_structure_details(&self, pdb_id: &str) -> Option<StructureRecord> {
        RcsbClient::get_structure_details(self, pdb_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::throttle::{NoDelay, RecordingThrottle};
    use serde_json::json;
    use wiremock::{
        matchers::{body_partial_json, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn client_for(server: &MockServer) -> RcsbClient {
        throttled_client(server, Arc::new(NoDelay))
    }

    fn throttled_client(server: &MockServer, throttle: Arc<dyn Throttle>) -> RcsbClient {
        let config = FinderConfig {
            rcsb_search_url: format!("{}/rcsbsearch/v2/query", server.uri()),
            rcsb_data_url: server.uri(),
            ..FinderConfig::default()
        };
        RcsbClient::new(Client::new(), &config, throttle)
    }

    fn page_of(prefix: &str, count: usize, total: u64) -> serde_json::Value {
        let hits: Vec<_> = (0..count)
            .map(|i| json!({"identifier": format!("{}{:02}", prefix, i), "score": 1.0}))
            .collect();
        json!({"result_set": hits, "total_count": total})
    }

    async fn mount_page(server: &MockServer, start: usize, rows: usize, body: ResponseTemplate, calls: u64) {
        Mock::given(method("POST"))
            .and(path("/rcsbsearch/v2/query"))
            .and(body_partial_json(json!({
                "request_options": {"paginate": {"start": start, "rows": rows}}
            })))
            .respond_with(body)
            .expect(calls)
            .mount(server)
            .await;
    }

    async fn mount_json(server: &MockServer, route: &str, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    fn component(code: &str) -> serde_json::Value {
        json!({"rcsb_nonpolymer_entity_container_identifiers": {"nonpolymer_comp_id": code}})
    }

    #[tokio::test]
    async fn test_search_paginates_in_pages_of_ten() {
        let server = MockServer::start().await;
        mount_page(&server, 0, 10, ResponseTemplate::new(200).set_body_json(page_of("A", 10, 812)), 1).await;
        mount_page(&server, 10, 10, ResponseTemplate::new(200).set_body_json(page_of("B", 10, 812)), 1).await;
        mount_page(&server, 20, 5, ResponseTemplate::new(200).set_body_json(page_of("C", 5, 812)), 1).await;

        let throttle = Arc::new(RecordingThrottle::default());
        let outcome = throttled_client(&server, throttle.clone()).search_by_criteria(25).await;

        assert_eq!(outcome.ids.len(), 25);
        assert_eq!(outcome.ids[0], "A00");
        assert_eq!(outcome.ids[24], "C04");
        assert_eq!(outcome.total_count, 812);

        // Pauses fall between pages, not after the last one
        assert_eq!(throttle.count(Pause::SearchPage), 2);
        assert_eq!(throttle.total(), 2);
    }

    #[tokio::test]
    async fn test_search_stops_on_empty_page() {
        let server = MockServer::start().await;
        mount_page(&server, 0, 10, ResponseTemplate::new(200).set_body_json(page_of("A", 10, 30)), 1).await;
        mount_page(&server, 10, 10, ResponseTemplate::new(200).set_body_json(page_of("B", 0, 10)), 1).await;
        mount_page(&server, 20, 5, ResponseTemplate::new(200).set_body_json(page_of("C", 5, 10)), 0).await;

        let outcome = client_for(&server).search_by_criteria(25).await;

        assert_eq!(outcome.ids.len(), 10);
        // Reported by the empty page, which is the last one with a body
        assert_eq!(outcome.total_count, 10);
    }

    #[tokio::test]
    async fn test_search_treats_no_content_as_end() {
        let server = MockServer::start().await;
        mount_page(&server, 0, 10, ResponseTemplate::new(200).set_body_json(page_of("A", 10, 10)), 1).await;
        mount_page(&server, 10, 2, ResponseTemplate::new(204), 1).await;

        let outcome = client_for(&server).search_by_criteria(12).await;
        assert_eq!(outcome.ids.len(), 10);
    }

    #[tokio::test]
    async fn test_search_truncates_oversized_page() {
        let server = MockServer::start().await;
        mount_page(&server, 0, 3, ResponseTemplate::new(200).set_body_json(page_of("A", 10, 500)), 1).await;

        let outcome = client_for(&server).search_by_criteria(3).await;
        assert_eq!(outcome.ids, vec!["A00", "A01", "A02"]);
    }

    #[tokio::test]
    async fn test_search_failure_returns_empty() {
        let server = MockServer::start().await;
        mount_page(&server, 0, 10, ResponseTemplate::new(500), 1).await;

        let outcome = client_for(&server).search_by_criteria(20).await;
        assert_eq!(outcome, SearchOutcome::default());
    }

    #[tokio::test]
    async fn test_ligands_water_and_chloride_only() {
        let server = MockServer::start().await;
        mount_json(
            &server,
            "/core/entry/1WAT",
            json!({"rcsb_entry_container_identifiers": {"non_polymer_entity_ids": ["2", "3"]}}),
        )
        .await;
        mount_json(&server, "/core/nonpolymer_entity/1WAT/2", component("HOH")).await;
        mount_json(&server, "/core/nonpolymer_entity/1WAT/3", component("CL")).await;

        let throttle = Arc::new(RecordingThrottle::default());
        let lookup = throttled_client(&server, throttle.clone()).get_ligands("1WAT").await;
        assert_eq!(lookup, LigandLookup::Empty);
        assert_eq!(throttle.count(Pause::EntityLookup), 2);
        assert!(lookup.codes().is_empty());
    }

    #[tokio::test]
    async fn test_ligands_deduplicated() {
        let server = MockServer::start().await;
        mount_json(
            &server,
            "/core/entry/2HEM",
            json!({"rcsb_entry_container_identifiers": {"non_polymer_entity_ids": ["2", "3", "4", "5"]}}),
        )
        .await;
        mount_json(&server, "/core/nonpolymer_entity/2HEM/2", component("HEM")).await;
        mount_json(&server, "/core/nonpolymer_entity/2HEM/3", component("SO4")).await;
        mount_json(&server, "/core/nonpolymer_entity/2HEM/4", component("HEM")).await;
        mount_json(&server, "/core/nonpolymer_entity/2HEM/5", component("NAG")).await;

        let throttle = Arc::new(RecordingThrottle::default());
        let lookup = throttled_client(&server, throttle.clone()).get_ligands("2HEM").await;
        assert_eq!(lookup, LigandLookup::Found(vec!["HEM".to_string(), "NAG".to_string()]));
        assert_eq!(throttle.count(Pause::EntityLookup), 4);
    }

    #[tokio::test]
    async fn test_ligands_unavailable_when_entry_missing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/core/entry/9BAD"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let lookup = client_for(&server).get_ligands("9BAD").await;
        assert_eq!(lookup, LigandLookup::Unavailable);
    }

    #[tokio::test]
    async fn test_ligands_unavailable_when_entity_fetch_fails() {
        let server = MockServer::start().await;
        mount_json(
            &server,
            "/core/entry/3ERR",
            json!({"rcsb_entry_container_identifiers": {"non_polymer_entity_ids": ["2", "3"]}}),
        )
        .await;
        mount_json(&server, "/core/nonpolymer_entity/3ERR/2", component("HOH")).await;
        Mock::given(method("GET"))
            .and(path("/core/nonpolymer_entity/3ERR/3"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let lookup = client_for(&server).get_ligands("3ERR").await;
        assert_eq!(lookup, LigandLookup::Unavailable);
    }

    #[tokio::test]
    async fn test_structure_details() {
        let server = MockServer::start().await;
        mount_json(
            &server,
            "/core/entry/1ABC",
            json!({
                "struct": {"title": "Cytochrome b562 with heme"},
                "refine": [{"ls_d_res_high": 1.4}],
                "exptl": [{"method": "X-RAY DIFFRACTION"}],
                "rcsb_entry_info": {"deposited_atom_count": 4200},
                "rcsb_entry_container_identifiers": {
                    "uniprot_ids": ["P0ABE7"],
                    "polymer_entity_ids": ["1", "2"],
                    "non_polymer_entity_ids": ["3"]
                }
            }),
        )
        .await;
        mount_json(
            &server,
            "/core/polymer_entity/1ABC/1",
            json!({
                "entity_poly": {"rcsb_entity_polymer_type": "Protein", "rcsb_sample_sequence_length": 106},
                "rcsb_polymer_entity": {"pdbx_number_of_molecules": 2},
                "rcsb_entity_source_organism": [{"ncbi_scientific_name": "Escherichia coli"}]
            }),
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/core/polymer_entity/1ABC/2"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        mount_json(&server, "/core/nonpolymer_entity/1ABC/3", component("HEM")).await;

        let throttle = Arc::new(RecordingThrottle::default());
        let record = throttled_client(&server, throttle.clone())
            .get_structure_details("1ABC")
            .await
            .unwrap();

        // Two polymer entities (one failing) and one non-polymer entity
        assert_eq!(throttle.count(Pause::EntityLookup), 3);

        assert_eq!(record.title, "Cytochrome b562 with heme");
        assert_eq!(record.resolution, Some(1.4));
        assert_eq!(record.num_atoms, 4200);
        assert_eq!(record.num_residues, 212);
        assert_eq!(record.organism, "Escherichia coli");
        assert_eq!(record.uniprot_ids, vec!["P0ABE7"]);
        assert_eq!(record.ligand_codes(), ["HEM".to_string()]);
    }

    #[tokio::test]
    async fn test_structure_details_absent_on_entry_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/core/entry/0XXX"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        assert!(client_for(&server).get_structure_details("0XXX").await.is_none());
    }
}
