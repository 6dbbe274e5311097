//! Laptop suitability
//!
//! A structure qualifies when it fits the atom budget and carries at least
//! one ligand that survived solvent and ion exclusion.

use crate::config::FinderConfig;
use mdscout_common::StructureRecord;

/// Why a structure was or was not kept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suitability {
    Suitable,
    TooLarge { num_atoms: u64, max_atoms: u64 },
    NoLigands,
    LigandsUnavailable,
}

impl Suitability {
    pub fn qualifies(self) -> bool {
        matches!(self, Suitability::Suitable)
    }
}

impl std::fmt::Display for Suitability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Suitability::Suitable => write!(f, "suitable"),
            Suitability::TooLarge {
                num_atoms,
                max_atoms,
            } => write!(f, "too large ({} atoms, budget {})", num_atoms, max_atoms),
            Suitability::NoLigands => write!(f, "no ligands detected"),
            Suitability::LigandsUnavailable => write!(f, "ligand lookup unavailable"),
        }
    }
}

/// Atom-budget and ligand-presence check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuitabilityFilter {
    max_atoms: u64,
}

impl SuitabilityFilter {
    pub fn new(max_atoms: u64) -> Self {
        Self { max_atoms }
    }

    pub fn from_config(config: &FinderConfig) -> Self {
        Self::new(config.max_atoms)
    }

    pub fn max_atoms(&self) -> u64 {
        self.max_atoms
    }

    pub fn is_laptop_suitable(&self, record: &StructureRecord) -> bool {
        record.is_laptop_suitable(self.max_atoms)
    }

    /// Size is judged before ligands
    pub fn assess(&self, record: &StructureRecord) -> Suitability {
        if !self.is_laptop_suitable(record) {
            return Suitability::TooLarge {
                num_atoms: record.num_atoms,
                max_atoms: self.max_atoms,
            };
        }
        if record.ligands.is_unavailable() {
            Suitability::LigandsUnavailable
        } else if record.ligand_codes().is_empty() {
            Suitability::NoLigands
        } else {
            Suitability::Suitable
        }
    }

    pub fn qualifies(&self, record: &StructureRecord) -> bool {
        self.assess(record).qualifies()
    }
}
