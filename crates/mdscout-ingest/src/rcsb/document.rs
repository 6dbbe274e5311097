//! Field extraction from RCSB data API documents
//!
//! Entry and entity documents are read as loose JSON: a missing or oddly
//! typed field falls back to its default instead of discarding the record.

use mdscout_common::{LigandLookup, StructureRecord};
use serde_json::Value;

/// Contribution of one polymer entity to its entry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolymerEntity {
    pub is_protein: bool,
    pub molecules: u64,
    pub monomers: u64,
    pub organism: Option<String>,
    pub uniprot_ids: Vec<String>,
}

impl PolymerEntity {
    pub fn from_document(doc: &Value) -> Self {
        let polymer_type = doc["entity_poly"]["rcsb_entity_polymer_type"]
            .as_str()
            .or_else(|| doc["entity_poly"]["type"].as_str())
            .unwrap_or("");
        let polymer_type = polymer_type.to_ascii_lowercase();

        Self {
            is_protein: polymer_type.contains("protein") || polymer_type.contains("polypeptide"),
            molecules: doc["rcsb_polymer_entity"]["pdbx_number_of_molecules"]
                .as_u64()
                .unwrap_or(1),
            monomers: doc["entity_poly"]["rcsb_sample_sequence_length"]
                .as_u64()
                .unwrap_or(0),
            organism: first_organism(doc),
            uniprot_ids: string_list(
                &doc["rcsb_polymer_entity_container_identifiers"]["uniprot_ids"],
            ),
        }
    }

    /// Residues counted toward the entry; non-protein entities count zero
    pub fn residues(&self) -> u64 {
        if self.is_protein {
            self.molecules.saturating_mul(self.monomers)
        } else {
            0
        }
    }
}

/// Aggregate over all polymer entities of an entry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolymerSummary {
    pub num_residues: u64,
    pub organism: Option<String>,
    pub uniprot_ids: Vec<String>,
}

impl PolymerSummary {
    pub fn add(&mut self, entity: PolymerEntity) {
        self.num_residues = self.num_residues.saturating_add(entity.residues());
        if self.organism.is_none() {
            self.organism = entity.organism;
        }
        for id in entity.uniprot_ids {
            if !self.uniprot_ids.contains(&id) {
                self.uniprot_ids.push(id);
            }
        }
    }
}

pub fn title(entry: &Value) -> String {
    entry["struct"]["title"].as_str().unwrap_or("N/A").to_string()
}

/// Refinement high-resolution limit, else EM reconstruction resolution
pub fn resolution(entry: &Value) -> Option<f64> {
    if let Some(refine) = entry["refine"].as_array().and_then(|r| r.first()) {
        return refine["ls_d_res_high"].as_f64();
    }
    match &entry["em_3d_reconstruction"] {
        Value::Array(items) => items.first().and_then(|item| item["resolution"].as_f64()),
        Value::Object(_) => entry["em_3d_reconstruction"]["resolution"].as_f64(),
        _ => None,
    }
}

pub fn method(entry: &Value) -> String {
    entry["exptl"][0]["method"]
        .as_str()
        .unwrap_or("Unknown")
        .to_string()
}

pub fn atom_count(entry: &Value) -> u64 {
    entry["rcsb_entry_info"]["deposited_atom_count"]
        .as_u64()
        .unwrap_or(0)
}

pub fn uniprot_ids(entry: &Value) -> Vec<String> {
    string_list(&entry["rcsb_entry_container_identifiers"]["uniprot_ids"])
}

pub fn polymer_entity_ids(entry: &Value) -> Vec<String> {
    string_list(&entry["rcsb_entry_container_identifiers"]["polymer_entity_ids"])
}

pub fn non_polymer_entity_ids(entry: &Value) -> Vec<String> {
    string_list(&entry["rcsb_entry_container_identifiers"]["non_polymer_entity_ids"])
}

/// Chemical component code of a non-polymer entity document
pub fn nonpolymer_comp_id(doc: &Value) -> Option<&str> {
    doc["rcsb_nonpolymer_entity_container_identifiers"]["nonpolymer_comp_id"]
        .as_str()
        .filter(|code| !code.is_empty())
}

/// First `rcsb_entity_source_organism` scientific name of a document
pub fn first_organism(doc: &Value) -> Option<String> {
    doc["rcsb_entity_source_organism"][0]["ncbi_scientific_name"]
        .as_str()
        .map(String::from)
}

/// Assemble a record from an entry document and its sub-lookups
pub fn build_record(
    pdb_id: &str,
    entry: &Value,
    polymers: PolymerSummary,
    ligands: LigandLookup,
) -> StructureRecord {
    let mut ids = uniprot_ids(entry);
    for id in polymers.uniprot_ids {
        if !ids.contains(&id) {
            ids.push(id);
        }
    }

    let organism = first_organism(entry)
        .or(polymers.organism)
        .unwrap_or_else(|| "Unknown".to_string());

    StructureRecord {
        pdb_id: pdb_id.to_string(),
        title: title(entry),
        resolution: resolution(entry),
        method: method(entry),
        num_residues: polymers.num_residues,
        num_atoms: atom_count(entry),
        uniprot_ids: ids,
        ligands,
        organism,
    }
}

/// Strings (or numbers, rendered) from a JSON array; anything else is empty
fn string_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}
