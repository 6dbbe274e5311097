//! Domain types shared across mdscout

use serde::{Deserialize, Serialize};

/// Cofactor placeholder for candidates whose UniProt entry names no organic cofactor.
///
/// Such candidates are still worth checking: the structure source may show a
/// bound ligand that the annotation never mentions.
pub const UNVERIFIED_COFACTOR: &str = "Unknown - will check PDB";

/// A reviewed UniProt entry that has at least one PDB cross-reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateEntry {
    /// UniProt accession, e.g. "P12345"
    pub accession: String,

    /// Recommended full name, "Unknown" when absent
    pub protein_name: String,

    /// Sequence length in residues
    pub length: u32,

    /// Scientific name of the source organism, "Unknown" when absent
    pub organism: String,

    /// PDB identifiers in the order UniProt lists them
    pub structure_ids: Vec<String>,

    /// Organic cofactor names, or the single [`UNVERIFIED_COFACTOR`] placeholder
    pub known_cofactors: Vec<String>,
}

impl CandidateEntry {
    /// Whether UniProt annotates at least one organic cofactor for this entry
    pub fn has_annotated_cofactors(&self) -> bool {
        !self.known_cofactors.is_empty()
            && self
                .known_cofactors
                .iter()
                .all(|name| name != UNVERIFIED_COFACTOR)
    }
}

/// Outcome of resolving the bound ligands of a PDB entry.
///
/// Distinguishes "the entry has no qualifying ligands" from "we could not
/// tell", so callers can decide how to treat uncertain records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "codes", rename_all = "snake_case")]
pub enum LigandLookup {
    /// At least one qualifying chemical component code
    Found(Vec<String>),
    /// Lookup succeeded, nothing left after solvent and ion exclusion
    Empty,
    /// Lookup failed before anything qualifying was seen
    Unavailable,
}

impl LigandLookup {
    /// Classify a list of qualifying codes from a successful lookup
    pub fn from_codes(codes: Vec<String>) -> Self {
        if codes.is_empty() {
            LigandLookup::Empty
        } else {
            LigandLookup::Found(codes)
        }
    }

    /// Qualifying component codes; empty unless [`LigandLookup::Found`]
    pub fn codes(&self) -> &[String] {
        match self {
            LigandLookup::Found(codes) => codes,
            LigandLookup::Empty | LigandLookup::Unavailable => &[],
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, LigandLookup::Unavailable)
    }
}

/// Physical metadata of a PDB entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureRecord {
    pub pdb_id: String,
    pub title: String,

    /// High-resolution limit in Å; absent when neither refinement nor
    /// reconstruction statistics report one
    pub resolution: Option<f64>,

    pub method: String,

    /// Residues summed over protein polymer entities only
    pub num_residues: u64,

    /// Deposited atom count
    pub num_atoms: u64,

    pub uniprot_ids: Vec<String>,
    pub ligands: LigandLookup,
    pub organism: String,
}

impl StructureRecord {
    /// Qualifying ligand codes
    pub fn ligand_codes(&self) -> &[String] {
        self.ligands.codes()
    }

    /// Whether the structure fits the atom budget (inclusive)
    pub fn is_laptop_suitable(&self, max_atoms: u64) -> bool {
        self.num_atoms <= max_atoms
    }
}
