//! Organic ligand classification
//!
//! Two naming systems, two policies. UniProt reports cofactors by free-text
//! name ("Heme b", "Zn(2+)"); those go through an ordered rule table where
//! the first matching rule decides and a name no rule claims counts as
//! organic. RCSB reports bound non-polymers by component code ("HEM",
//! "HOH"); those are checked against a fixed exclusion set.

/// Ions, waters and simple inorganics that never count as a ligand.
///
/// Entries of one or two characters are element symbols and are matched as
/// whole alphabetic tokens, so "Ni" catches "Ni(2+)" but not "adenine".
/// Longer entries are matched anywhere in the name.
pub const EXCLUDED_COFACTOR_NAMES: &[&str] = &[
    // Metal ions
    "Zn(2+)",
    "Mg(2+)",
    "Ca(2+)",
    "Fe(2+)",
    "Fe(3+)",
    "Mn(2+)",
    "Cu(2+)",
    "Na(+)",
    "K(+)",
    "Ni(2+)",
    "Co(2+)",
    "Zn",
    "Mg",
    "Ca",
    "Fe",
    "Mn",
    "Cu",
    "Na",
    "K",
    "Ni",
    "Co",
    "Cd",
    "Hg",
    "Pb",
    // Simple inorganic
    "Cl(-)",
    "PO4(3-)",
    "SO4(2-)",
    "H2O",
    "water",
    "chloride",
    "sulfate",
    "phosphate",
    "hydroxide",
    "oxide",
];

/// Names shorter than this are treated as ion or abbreviation.
pub const MIN_ORGANIC_NAME_LEN: usize = 4;

/// Trailing charge notation marking an ion.
pub const CHARGE_SUFFIXES: &[&str] = &["+)", "-)", "+"];

const ELEMENT_SYMBOL_MAX_LEN: usize = 2;

/// One entry of the classification table
#[derive(Debug, Clone, Copy)]
pub struct LigandRule {
    /// Short identifier used in logs
    pub name: &'static str,
    pub matches: fn(&str) -> bool,
    /// Verdict when this rule matches
    pub organic: bool,
}

/// The cofactor policy, evaluated top to bottom.
pub const COFACTOR_RULES: &[LigandRule] = &[
    LigandRule {
        name: "excluded-name",
        matches: mentions_excluded_name,
        organic: false,
    },
    LigandRule {
        name: "too-short",
        matches: is_too_short,
        organic: false,
    },
    LigandRule {
        name: "charge-suffix",
        matches: has_charge_suffix,
        organic: false,
    },
];

/// Whether a UniProt cofactor name denotes a real organic ligand
pub fn is_organic_ligand(name: &str) -> bool {
    classify_with(COFACTOR_RULES, name)
}

/// Evaluate `name` against an arbitrary rule table
pub fn classify_with(rules: &[LigandRule], name: &str) -> bool {
    deciding_rule(rules, name).map_or(true, |rule| rule.organic)
}

/// The first rule in `rules` that matches `name`, if any
pub fn deciding_rule<'a>(rules: &'a [LigandRule], name: &str) -> Option<&'a LigandRule> {
    rules.iter().find(|rule| (rule.matches)(name))
}

/// PDB chemical component codes for solvents, buffers, cryoprotectants and
/// monatomic ions. Matched exactly and case-sensitively.
pub const EXCLUDED_COMPONENTS: &[&str] = &[
    // Water
    "HOH", "WAT", "H2O", "DOD", "D2O",
    // Ions
    "SO4", "PO4", "PO3", "NO3",
    // Glycols / PEGs
    "GOL", "EDO", "PEG", "PGE", "1PE", "P6G",
    // Buffers
    "ACT", "DMS", "BME", "TRS",
    // Metal ions
    "CL", "NA", "MG", "CA", "K", "ZN", "MN", "FE", "CU",
    "BR", "I", "CD", "CO", "NI",
    // Other solvents and caps
    "ACE", "NH2", "EOH", "MEO", "MES", "CS",
];

/// Whether a PDB component code survives solvent and ion exclusion
pub fn is_qualifying_component(code: &str) -> bool {
    !code.is_empty() && !EXCLUDED_COMPONENTS.contains(&code)
}

fn mentions_excluded_name(name: &str) -> bool {
    let lowered = name.to_ascii_lowercase();
    EXCLUDED_COFACTOR_NAMES.iter().any(|excluded| {
        let excluded = excluded.to_ascii_lowercase();
        if excluded.len() <= ELEMENT_SYMBOL_MAX_LEN {
            lowered
                .split(|c: char| !c.is_ascii_alphabetic())
                .any(|token| token == excluded)
        } else {
            lowered.contains(&excluded)
        }
    })
}

fn is_too_short(name: &str) -> bool {
    name.chars().count() < MIN_ORGANIC_NAME_LEN
}

fn has_charge_suffix(name: &str) -> bool {
    CHARGE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}
