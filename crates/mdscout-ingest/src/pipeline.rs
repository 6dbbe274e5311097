//! Search-and-filter driver
//!
//! Two workflows over the same sources:
//!   - direct: RCSB criteria search, then details for every hit
//!   - annotated: UniProt candidates first, then details for each
//!     candidate's cross-referenced structures
//!
//! Both keep only structures that pass [`SuitabilityFilter`] and return them
//! ranked by ascending atom count. Remote calls are issued one at a time.

use crate::config::FinderConfig;
use crate::filter::{Suitability, SuitabilityFilter};
use crate::rcsb::SearchOutcome;
use crate::throttle::{Pause, Throttle};
use async_trait::async_trait;
use indicatif::ProgressBar;
use mdscout_common::{CandidateEntry, MdscoutError, Result, StructureRecord};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Annotation-side search
#[async_trait]
pub trait CandidateSource: Send + Sync {
    async fn search_candidates(&self, limit: usize) -> Vec<CandidateEntry>;
}

/// Structure-side search and detail lookups
#[async_trait]
pub trait StructureSource: Send + Sync {
    async fn search_by_criteria(&self, limit: usize) -> SearchOutcome;
    async fn get_structure_details(&self, pdb_id: &str) -> Option<StructureRecord>;
}

/// A qualifying structure together with the candidate that led to it
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateMatch {
    pub accession: String,
    pub protein_name: String,
    pub known_cofactors: Vec<String>,
    pub record: StructureRecord,
}

impl CandidateMatch {
    fn new(candidate: &CandidateEntry, record: StructureRecord) -> Self {
        Self {
            accession: candidate.accession.clone(),
            protein_name: candidate.protein_name.clone(),
            known_cofactors: candidate.known_cofactors.clone(),
            record,
        }
    }
}

/// Tally of verdicts over one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    pub examined: usize,
    pub qualified: usize,
    pub too_large: usize,
    pub no_ligands: usize,
    pub ligands_unavailable: usize,
    pub details_missing: usize,
}

impl RunCounters {
    fn record(&mut self, verdict: Option<Suitability>) {
        self.examined += 1;
        match verdict {
            Some(Suitability::Suitable) => self.qualified += 1,
            Some(Suitability::TooLarge { .. }) => self.too_large += 1,
            Some(Suitability::NoLigands) => self.no_ligands += 1,
            Some(Suitability::LigandsUnavailable) => self.ligands_unavailable += 1,
            None => self.details_missing += 1,
        }
    }
}

/// Ranked output of one workflow
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport<T> {
    pub matches: Vec<T>,
    pub counters: RunCounters,
}

/// Drives either workflow with a fixed configuration
pub struct Pipeline {
    config: FinderConfig,
    filter: SuitabilityFilter,
    throttle: Arc<dyn Throttle>,
    progress: ProgressBar,
}

impl Pipeline {
    pub fn new(config: FinderConfig, throttle: Arc<dyn Throttle>) -> Self {
        Self {
            filter: SuitabilityFilter::from_config(&config),
            config,
            throttle,
            progress: ProgressBar::hidden(),
        }
    }

    /// Report per-item progress on `progress`; its length is set per run
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Criteria search on RCSB, then details for every hit
    pub async fn run_direct(&self, structures: &dyn StructureSource) -> RunReport<StructureRecord> {
        info!(
            max_atoms = self.config.max_atoms,
            limit = self.config.num_structures,
            "Searching for protein-ligand complexes"
        );

        let outcome = structures.search_by_criteria(self.config.num_structures).await;
        let total = outcome.ids.len();
        self.progress.set_length(total as u64);

        let mut counters = RunCounters::default();
        let mut matches = Vec::new();

        for (i, pdb_id) in outcome.ids.iter().enumerate() {
            self.progress.set_message(pdb_id.clone());
            debug!(position = i + 1, total, pdb_id = %pdb_id, "Processing structure");

            let record = structures.get_structure_details(pdb_id).await;
            let verdict = self.examine(pdb_id, record.as_ref());
            counters.record(verdict);

            if let (Some(record), Some(Suitability::Suitable)) = (record, verdict) {
                matches.push(record);
            }

            self.progress.inc(1);
            self.throttle.pause(Pause::DirectDetail).await;
        }

        self.progress.finish_and_clear();
        matches.sort_by_key(|record| record.num_atoms);

        info!(found = matches.len(), examined = counters.examined, "Direct search complete");
        RunReport { matches, counters }
    }

    /// UniProt candidates first, then their cross-referenced structures.
    ///
    /// Stops after the candidate during which `target_results` matches have
    /// accumulated. Fails only when UniProt yields no candidates at all.
    pub async fn run_annotated(
        &self,
        candidates: &dyn CandidateSource,
        structures: &dyn StructureSource,
    ) -> Result<RunReport<CandidateMatch>> {
        let entries = candidates.search_candidates(self.config.num_candidates).await;

        if entries.is_empty() {
            error!("No proteins found in UniProt");
            return Err(MdscoutError::NoCandidates(format!(
                "UniProt returned no reviewed enzymes of length <= {} with PDB structures",
                self.config.max_length
            )));
        }

        self.progress.set_length(entries.len() as u64);

        let mut counters = RunCounters::default();
        let mut matches = Vec::new();

        for (i, candidate) in entries.iter().enumerate() {
            let pdb_ids: Vec<&String> = candidate
                .structure_ids
                .iter()
                .take(self.config.structures_per_candidate)
                .collect();

            self.progress.set_message(candidate.accession.clone());
            self.progress.suspend(|| {
                info!(
                    position = i + 1,
                    total = entries.len(),
                    accession = %candidate.accession,
                    protein = %candidate.protein_name,
                    known_cofactors = %candidate.known_cofactors.join(", "),
                    annotated = candidate.has_annotated_cofactors(),
                    structures = pdb_ids.len(),
                    "Checking candidate"
                )
            });

            for pdb_id in pdb_ids {
                let record = structures.get_structure_details(pdb_id).await;
                let verdict = self.examine(pdb_id, record.as_ref());
                counters.record(verdict);

                if let (Some(record), Some(Suitability::Suitable)) = (record, verdict) {
                    matches.push(CandidateMatch::new(candidate, record));
                }

                self.throttle.pause(Pause::CandidateDetail).await;
            }

            self.progress.inc(1);

            if matches.len() >= self.config.target_results {
                self.progress.suspend(|| {
                    info!(found = matches.len(), "Found enough suitable structures, stopping search")
                });
                break;
            }
        }

        self.progress.finish_and_clear();
        matches.sort_by_key(|m| m.record.num_atoms);

        info!(
            found = matches.len(),
            examined = counters.examined,
            "Annotated search complete"
        );
        Ok(RunReport { matches, counters })
    }

    /// Judge one structure and narrate the verdict above the progress bar
    fn examine(&self, pdb_id: &str, record: Option<&StructureRecord>) -> Option<Suitability> {
        self.progress.suspend(|| self.judge(pdb_id, record))
    }

    fn judge(&self, pdb_id: &str, record: Option<&StructureRecord>) -> Option<Suitability> {
        let Some(record) = record else {
            info!(pdb_id, "Data unavailable");
            return None;
        };

        let verdict = self.filter.assess(record);
        match verdict {
            Suitability::Suitable => info!(
                pdb_id,
                num_atoms = record.num_atoms,
                ligands = %record.ligand_codes().join(", "),
                "Suitable"
            ),
            Suitability::LigandsUnavailable => {
                warn!(pdb_id, "Ligand lookup unavailable, structure skipped")
            },
            other => info!(pdb_id, reason = %other, "Rejected"),
        }
        Some(verdict)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::throttle::{NoDelay, RecordingThrottle};
    use mdscout_common::LigandLookup;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FakeCandidates(Vec<CandidateEntry>);

    #[async_trait]
    impl CandidateSource for FakeCandidates {
        async fn search_candidates(&self, limit: usize) -> Vec<CandidateEntry> {
            self.0.iter().take(limit).cloned().collect()
        }
    }

    #[derive(Default)]
    struct FakeStructures {
        ids: Vec<String>,
        records: HashMap<String, StructureRecord>,
        requested: Mutex<Vec<String>>,
    }

    impl FakeStructures {
        fn with(mut self, pdb_id: &str, num_atoms: u64, ligands: LigandLookup) -> Self {
            self.ids.push(pdb_id.to_string());
            self.records.insert(
                pdb_id.to_string(),
                StructureRecord {
                    pdb_id: pdb_id.to_string(),
                    title: format!("Structure {}", pdb_id),
                    resolution: Some(2.0),
                    method: "X-RAY DIFFRACTION".to_string(),
                    num_residues: 120,
                    num_atoms,
                    uniprot_ids: vec![],
                    ligands,
                    organism: "Homo sapiens".to_string(),
                },
            );
            self
        }

        fn requested(&self) -> Vec<String> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl StructureSource for FakeStructures {
        async fn search_by_criteria(&self, limit: usize) -> SearchOutcome {
            SearchOutcome {
                ids: self.ids.iter().take(limit).cloned().collect(),
                total_count: self.ids.len() as u64,
            }
        }

        async fn get_structure_details(&self, pdb_id: &str) -> Option<StructureRecord> {
            self.requested.lock().unwrap().push(pdb_id.to_string());
            self.records.get(pdb_id).cloned()
        }
    }

    fn heme() -> LigandLookup {
        LigandLookup::Found(vec!["HEM".to_string()])
    }

    fn candidate(accession: &str, structure_ids: &[&str]) -> CandidateEntry {
        CandidateEntry {
            accession: accession.to_string(),
            protein_name: format!("Enzyme {}", accession),
            length: 150,
            organism: "Homo sapiens".to_string(),
            structure_ids: structure_ids.iter().map(|s| s.to_string()).collect(),
            known_cofactors: vec!["Heme b".to_string()],
        }
    }

    fn pipeline(config: FinderConfig) -> Pipeline {
        Pipeline::new(config, Arc::new(NoDelay))
    }

    #[tokio::test]
    async fn test_direct_filters_and_ranks() {
        let structures = FakeStructures::default()
            .with("3BIG", 60_000, heme())
            .with("2MID", 9_000, heme())
            .with("1LOW", 3_000, heme())
            .with("4NOL", 2_000, LigandLookup::Empty)
            .with("5UNK", 2_500, LigandLookup::Unavailable);

        let report = pipeline(FinderConfig::default()).run_direct(&structures).await;

        let ids: Vec<_> = report.matches.iter().map(|r| r.pdb_id.as_str()).collect();
        assert_eq!(ids, vec!["1LOW", "2MID"]);
        assert_eq!(
            report.counters,
            RunCounters {
                examined: 5,
                qualified: 2,
                too_large: 1,
                no_ligands: 1,
                ligands_unavailable: 1,
                details_missing: 0,
            }
        );
    }

    #[tokio::test]
    async fn test_direct_counts_missing_details() {
        let mut structures = FakeStructures::default().with("1ABC", 4200, heme());
        structures.ids.push("9GON".to_string());

        let report = pipeline(FinderConfig::default()).run_direct(&structures).await;
        assert_eq!(report.matches.len(), 1);
        assert_eq!(report.counters.details_missing, 1);
    }

    #[tokio::test]
    async fn test_annotated_requires_candidates() {
        let result = pipeline(FinderConfig::default())
            .run_annotated(&FakeCandidates(vec![]), &FakeStructures::default())
            .await;
        assert!(matches!(result, Err(MdscoutError::NoCandidates(_))));
    }

    #[tokio::test]
    async fn test_annotated_checks_first_structures_only() {
        let mut structures = FakeStructures::default();
        let ids: Vec<String> = (0..7).map(|i| format!("{}AAA", i)).collect();
        for id in &ids {
            structures = structures.with(id, 1000, heme());
        }
        let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();

        let report = pipeline(FinderConfig::default())
            .run_annotated(&FakeCandidates(vec![candidate("P12345", &id_refs)]), &structures)
            .await
            .unwrap();

        assert_eq!(report.matches.len(), 5);
        assert_eq!(structures.requested(), ids[..5].to_vec());
        assert!(report.matches.iter().all(|m| m.accession == "P12345"));
    }

    #[tokio::test]
    async fn test_annotated_stops_at_target() {
        // 12 candidates x 5 qualifying structures; stop after the candidate
        // that reaches 50 matches.
        let mut structures = FakeStructures::default();
        let mut candidates = Vec::new();
        for c in 0..12 {
            let ids: Vec<String> = (0..5).map(|s| format!("{}{:02}X", s, c)).collect();
            for (s, id) in ids.iter().enumerate() {
                structures = structures.with(id, 1000 + (c * 5 + s) as u64, heme());
            }
            let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
            candidates.push(candidate(&format!("P{:05}", c), &id_refs));
        }

        let report = pipeline(FinderConfig::default())
            .run_annotated(&FakeCandidates(candidates), &structures)
            .await
            .unwrap();

        assert_eq!(report.matches.len(), 50);
        assert_eq!(structures.requested().len(), 50);
        assert!(report
            .matches
            .windows(2)
            .all(|w| w[0].record.num_atoms <= w[1].record.num_atoms));
    }

    #[tokio::test]
    async fn test_annotated_finishes_candidate_past_target() {
        let structures = FakeStructures::default()
            .with("1AAA", 500, heme())
            .with("2BBB", 400, heme())
            .with("3CCC", 300, heme());

        let config = FinderConfig {
            target_results: 1,
            ..FinderConfig::default()
        };
        let report = pipeline(config)
            .run_annotated(
                &FakeCandidates(vec![
                    candidate("P00001", &["1AAA", "2BBB"]),
                    candidate("P00002", &["3CCC"]),
                ]),
                &structures,
            )
            .await
            .unwrap();

        let ids: Vec<_> = report.matches.iter().map(|m| m.record.pdb_id.as_str()).collect();
        assert_eq!(ids, vec!["2BBB", "1AAA"]);
    }

    #[tokio::test]
    async fn test_direct_pauses_after_each_structure() {
        let mut structures = FakeStructures::default()
            .with("1AAA", 1000, heme())
            .with("2BBB", 90_000, heme());
        structures.ids.push("9GON".to_string());

        let throttle = Arc::new(RecordingThrottle::default());
        Pipeline::new(FinderConfig::default(), throttle.clone())
            .run_direct(&structures)
            .await;

        assert_eq!(throttle.count(Pause::DirectDetail), 3);
        assert_eq!(throttle.total(), 3);
    }

    #[tokio::test]
    async fn test_annotated_pauses_after_each_structure() {
        let structures = FakeStructures::default()
            .with("1AAA", 500, heme())
            .with("2BBB", 400, LigandLookup::Empty)
            .with("3CCC", 300, heme());

        let throttle = Arc::new(RecordingThrottle::default());
        let report = Pipeline::new(FinderConfig::default(), throttle.clone())
            .run_annotated(
                &FakeCandidates(vec![
                    candidate("P00001", &["1AAA", "2BBB"]),
                    candidate("P00002", &["3CCC", "4GON"]),
                ]),
                &structures,
            )
            .await
            .unwrap();

        assert_eq!(report.counters.examined, 4);
        assert_eq!(throttle.count(Pause::CandidateDetail), 4);
        assert_eq!(throttle.count(Pause::DirectDetail), 0);
    }

    #[tokio::test]
    async fn test_progress_tracks_items() {
        let structures = FakeStructures::default()
            .with("1AAA", 1000, heme())
            .with("2BBB", 2000, LigandLookup::Unavailable)
            .with("3CCC", 3000, heme());

        let progress = ProgressBar::hidden();
        pipeline(FinderConfig::default())
            .with_progress(progress.clone())
            .run_direct(&structures)
            .await;

        assert_eq!(progress.length(), Some(3));
        assert_eq!(progress.position(), 3);
        assert!(progress.is_finished());
    }

    #[tokio::test]
    async fn test_ranking_is_stable_for_equal_atoms() {
        let structures = FakeStructures::default()
            .with("1AAA", 1000, heme())
            .with("2BBB", 1000, heme())
            .with("3CCC", 900, heme());

        let report = pipeline(FinderConfig::default()).run_direct(&structures).await;
        let ids: Vec<_> = report.matches.iter().map(|r| r.pdb_id.as_str()).collect();
        assert_eq!(ids, vec!["3CCC", "1AAA", "2BBB"]);
    }
}
