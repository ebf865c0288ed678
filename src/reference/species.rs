//! Species reference table: softwood/hardwood class and growing-stock
//! agent exclusions, per spec.md §4.2's tree-type translation.

/// A single species reference row, modeled on FIA's `REF_SPECIES`.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesRecord {
    /// FIA species code (`SPCD`).
    pub spcd: u32,
    pub common_name: &'static str,
    pub genus: &'static str,
    pub species: &'static str,
    /// `true` for softwoods, `false` for hardwoods -- drives the sawlog
    /// diameter threshold (9.0in softwood / 11.0in hardwood).
    pub softwood: bool,
}

impl SpeciesRecord {
    /// Sawlog merchantability diameter threshold for this species, per
    /// the published FIA standard (resolves the Open Question in
    /// spec.md §9 -- see DESIGN.md).
    pub fn sawlog_min_dbh(&self) -> f64 {
        if self.softwood {
            9.0
        } else {
            11.0
        }
    }
}

/// Seam an external collaborator fills in with the full `REF_SPECIES`
/// table; the engine only ever calls `lookup`.
pub trait SpeciesCatalog: Send + Sync {
    fn lookup(&self, spcd: u32) -> Option<&SpeciesRecord>;

    fn is_softwood(&self, spcd: u32) -> Option<bool> {
        self.lookup(spcd).map(|r| r.softwood)
    }
}

/// A small embedded default covering the species referenced by the seeded
/// test scenarios in spec.md §8. Production deployments supply the real
/// table through the same trait.
pub struct DefaultSpeciesCatalog {
    records: Vec<SpeciesRecord>,
}

impl Default for DefaultSpeciesCatalog {
    fn default() -> Self {
        Self {
            records: vec![
                SpeciesRecord {
                    spcd: 202,
                    common_name: "Douglas-fir",
                    genus: "Pseudotsuga",
                    species: "menziesii",
                    softwood: true,
                },
                SpeciesRecord {
                    spcd: 263,
                    common_name: "western hemlock",
                    genus: "Tsuga",
                    species: "heterophylla",
                    softwood: true,
                },
                SpeciesRecord {
                    spcd: 131,
                    common_name: "loblolly pine",
                    genus: "Pinus",
                    species: "taeda",
                    softwood: true,
                },
                SpeciesRecord {
                    spcd: 802,
                    common_name: "white oak",
                    genus: "Quercus",
                    species: "alba",
                    softwood: false,
                },
                SpeciesRecord {
                    spcd: 316,
                    common_name: "red maple",
                    genus: "Acer",
                    species: "rubrum",
                    softwood: false,
                },
                SpeciesRecord {
                    spcd: 375,
                    common_name: "paper birch",
                    genus: "Betula",
                    species: "papyrifera",
                    softwood: false,
                },
                SpeciesRecord {
                    spcd: 746,
                    common_name: "quaking aspen",
                    genus: "Populus",
                    species: "tremuloides",
                    softwood: false,
                },
                SpeciesRecord {
                    spcd: 122,
                    common_name: "ponderosa pine",
                    genus: "Pinus",
                    species: "ponderosa",
                    softwood: true,
                },
                SpeciesRecord {
                    spcd: 108,
                    common_name: "loblolly-shortleaf pine",
                    genus: "Pinus",
                    species: "echinata",
                    softwood: true,
                },
                SpeciesRecord {
                    spcd: 611,
                    common_name: "sweetgum",
                    genus: "Liquidambar",
                    species: "styraciflua",
                    softwood: false,
                },
            ],
        }
    }
}

impl SpeciesCatalog for DefaultSpeciesCatalog {
    fn lookup(&self, spcd: u32) -> Option<&SpeciesRecord> {
        self.records.iter().find(|r| r.spcd == spcd)
    }
}
