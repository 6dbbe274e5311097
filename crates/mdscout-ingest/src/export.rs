//! Result presentation
//!
//! Ranked matches are projected into flat rows, shown as a console table,
//! summarised, and written once to CSV.

use crate::pipeline::CandidateMatch;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};
use mdscout_common::{Result, StructureRecord};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

/// Default CSV name for the direct workflow
pub const DIRECT_OUTPUT_FILE: &str = "laptop_suitable_complexes.csv";

/// Default CSV name for the annotated workflow
pub const ANNOTATED_OUTPUT_FILE: &str = "suitable_protein_ligand_complexes.csv";

const PDB_DOWNLOAD_URL: &str = "https://files.rcsb.org/download";
const MAX_LIGANDS_SHOWN: usize = 5;
const MAX_COFACTORS_SHOWN: usize = 3;
const MAX_UNIPROT_IDS_SHOWN: usize = 3;

/// A flat output row ranked by atom count
pub trait RankedRow: Serialize {
    /// Column names, in CSV order
    const HEADERS: &'static [&'static str];

    fn pdb_id(&self) -> &str;
    fn num_atoms(&self) -> u64;

    /// Cell text for the console table, aligned with [`RankedRow::HEADERS`]
    fn cells(&self) -> Vec<String>;

    /// UniProt accession this row was found through, if any
    fn accession(&self) -> Option<&str> {
        None
    }
}

/// Row of the direct workflow
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructureRow {
    #[serde(rename = "PDB_ID")]
    pub pdb_id: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Resolution_Å")]
    pub resolution: Option<f64>,
    #[serde(rename = "Method")]
    pub method: String,
    #[serde(rename = "Num_Atoms")]
    pub num_atoms: u64,
    #[serde(rename = "Num_Residues")]
    pub num_residues: u64,
    #[serde(rename = "Ligands")]
    pub ligands: String,
    #[serde(rename = "UniProt_IDs")]
    pub uniprot_ids: String,
    #[serde(rename = "Organism")]
    pub organism: String,
}

impl From<&StructureRecord> for StructureRow {
    fn from(record: &StructureRecord) -> Self {
        let uniprot_ids = if record.uniprot_ids.is_empty() {
            "N/A".to_string()
        } else {
            join_first(&record.uniprot_ids, MAX_UNIPROT_IDS_SHOWN)
        };

        Self {
            pdb_id: record.pdb_id.clone(),
            title: ellipsize(&record.title, 80),
            resolution: record.resolution,
            method: record.method.clone(),
            num_atoms: record.num_atoms,
            num_residues: record.num_residues,
            ligands: join_first(record.ligand_codes(), MAX_LIGANDS_SHOWN),
            uniprot_ids,
            organism: truncate(&record.organism, 50),
        }
    }
}

impl RankedRow for StructureRow {
    const HEADERS: &'static [&'static str] = &[
        "PDB_ID",
        "Title",
        "Resolution_Å",
        "Method",
        "Num_Atoms",
        "Num_Residues",
        "Ligands",
        "UniProt_IDs",
        "Organism",
    ];

    fn pdb_id(&self) -> &str {
        &self.pdb_id
    }

    fn num_atoms(&self) -> u64 {
        self.num_atoms
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.pdb_id.clone(),
            self.title.clone(),
            format_resolution(self.resolution),
            self.method.clone(),
            self.num_atoms.to_string(),
            self.num_residues.to_string(),
            self.ligands.clone(),
            self.uniprot_ids.clone(),
            self.organism.clone(),
        ]
    }
}

/// Row of the annotated workflow
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateStructureRow {
    #[serde(rename = "PDB_ID")]
    pub pdb_id: String,
    #[serde(rename = "UniProt_ID")]
    pub uniprot_id: String,
    #[serde(rename = "Protein_Name")]
    pub protein_name: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Resolution_Å")]
    pub resolution: Option<f64>,
    #[serde(rename = "Method")]
    pub method: String,
    #[serde(rename = "Num_Atoms")]
    pub num_atoms: u64,
    #[serde(rename = "Num_Residues")]
    pub num_residues: u64,
    #[serde(rename = "Ligands")]
    pub ligands: String,
    #[serde(rename = "Known_Cofactors")]
    pub known_cofactors: String,
    #[serde(rename = "Organism")]
    pub organism: String,
}

impl From<&CandidateMatch> for CandidateStructureRow {
    fn from(m: &CandidateMatch) -> Self {
        let record = &m.record;
        Self {
            pdb_id: record.pdb_id.clone(),
            uniprot_id: m.accession.clone(),
            protein_name: truncate(&m.protein_name, 60),
            title: ellipsize(&record.title, 60),
            resolution: record.resolution,
            method: record.method.clone(),
            num_atoms: record.num_atoms,
            num_residues: record.num_residues,
            ligands: join_first(record.ligand_codes(), MAX_LIGANDS_SHOWN),
            known_cofactors: join_first(&m.known_cofactors, MAX_COFACTORS_SHOWN),
            organism: truncate(&record.organism, 40),
        }
    }
}

impl RankedRow for CandidateStructureRow {
    const HEADERS: &'static [&'static str] = &[
        "PDB_ID",
        "UniProt_ID",
        "Protein_Name",
        "Title",
        "Resolution_Å",
        "Method",
        "Num_Atoms",
        "Num_Residues",
        "Ligands",
        "Known_Cofactors",
        "Organism",
    ];

    fn pdb_id(&self) -> &str {
        &self.pdb_id
    }

    fn num_atoms(&self) -> u64 {
        self.num_atoms
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.pdb_id.clone(),
            self.uniprot_id.clone(),
            self.protein_name.clone(),
            self.title.clone(),
            format_resolution(self.resolution),
            self.method.clone(),
            self.num_atoms.to_string(),
            self.num_residues.to_string(),
            self.ligands.clone(),
            self.known_cofactors.clone(),
            self.organism.clone(),
        ]
    }

    fn accession(&self) -> Option<&str> {
        Some(&self.uniprot_id)
    }
}

/// Summary figures over a non-empty table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statistics {
    pub count: usize,
    /// Mean atom count, rounded to the nearest atom
    pub average_atoms: u64,
    pub smallest: (String, u64),
    pub largest: (String, u64),
    /// Distinct UniProt accessions, for rows found through UniProt
    pub unique_accessions: Option<usize>,
}

impl std::fmt::Display for Statistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Statistics:")?;
        writeln!(f, "  Structures: {}", self.count)?;
        writeln!(f, "  Average atoms: {}", self.average_atoms)?;
        writeln!(
            f,
            "  Smallest structure: {} ({} atoms)",
            self.smallest.0, self.smallest.1
        )?;
        write!(
            f,
            "  Largest structure: {} ({} atoms)",
            self.largest.0, self.largest.1
        )?;
        if let Some(unique) = self.unique_accessions {
            write!(f, "\n  Unique proteins: {}", unique)?;
        }
        Ok(())
    }
}

/// Ordered rows of one run
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable<R> {
    rows: Vec<R>,
}

impl<R: RankedRow> ResultTable<R> {
    pub fn new(rows: Vec<R>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Ascending by atom count; ties keep their order
    pub fn sort_by_atoms(&mut self) {
        self.rows.sort_by_key(|row| row.num_atoms());
    }

    /// Collapse rows sharing a PDB id, keeping the first
    pub fn dedupe_by_structure(&mut self) -> usize {
        let before = self.rows.len();
        let mut seen = HashSet::new();
        self.rows.retain(|row| seen.insert(row.pdb_id().to_string()));
        before - self.rows.len()
    }

    pub fn statistics(&self) -> Option<Statistics> {
        let first = self.rows.first()?;
        let last = self.rows.last()?;

        let total: u128 = self.rows.iter().map(|row| u128::from(row.num_atoms())).sum();
        let count = self.rows.len() as u128;
        let average_atoms = u64::try_from((total + count / 2) / count).unwrap_or(u64::MAX);

        let accessions: HashSet<&str> = self.rows.iter().filter_map(|row| row.accession()).collect();
        let unique_accessions = (!accessions.is_empty()).then_some(accessions.len());

        Some(Statistics {
            count: self.rows.len(),
            average_atoms,
            smallest: (first.pdb_id().to_string(), first.num_atoms()),
            largest: (last.pdb_id().to_string(), last.num_atoms()),
            unique_accessions,
        })
    }

    pub fn to_console_table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_header(R::HEADERS.to_vec());

        for row in &self.rows {
            table.add_row(row.cells());
        }
        table
    }

    /// Header plus one record per row
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        for row in &self.rows {
            writer.serialize(row)?;
        }
        writer.flush()?;

        info!(path = %path.display(), rows = self.rows.len(), "Results saved");
        Ok(())
    }

    /// How to fetch structures, using the smallest one as the example
    pub fn download_hint(&self) -> Option<String> {
        let example = self.rows.first()?.pdb_id();
        Some(format!(
            "To download a structure:\n  wget {url}/[PDB_ID].pdb\n  Example: wget {url}/{example}.pdb",
            url = PDB_DOWNLOAD_URL,
            example = example
        ))
    }
}

impl ResultTable<StructureRow> {
    /// Ranked rows of the direct workflow
    pub fn from_records(records: &[StructureRecord]) -> Self {
        let mut table = Self::new(records.iter().map(StructureRow::from).collect());
        table.sort_by_atoms();
        table
    }
}

impl ResultTable<CandidateStructureRow> {
    /// Ranked rows of the annotated workflow
    pub fn from_matches(matches: &[CandidateMatch]) -> Self {
        let mut table = Self::new(matches.iter().map(CandidateStructureRow::from).collect());
        table.sort_by_atoms();
        table
    }
}

fn format_resolution(resolution: Option<f64>) -> String {
    resolution.map_or_else(|| "N/A".to_string(), |r| r.to_string())
}

/// First `max` characters
fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// First `max` characters, with "..." appended when anything was cut
fn ellipsize(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        format!("{}...", truncate(text, max))
    } else {
        text.to_string()
    }
}

fn join_first(items: &[String], max: usize) -> String {
    items
        .iter()
        .take(max)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
