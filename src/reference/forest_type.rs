//! Forest-type group lookup, used by group-by expansion (L10) when a
//! request groups by `by_forest_type_group` and by the area-change
//! scenario in spec.md §8 (Missouri oak/hickory, nonstocked).

/// A forest-type group, the aggregation level FIA reports area by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ForestTypeGroup {
    pub code: u32,
    pub name: &'static str,
}

pub trait ForestTypeCatalog: Send + Sync {
    fn group_for(&self, fortypcd: u32) -> Option<ForestTypeGroup>;
}

pub struct DefaultForestTypeCatalog {
    groups: Vec<(u32, ForestTypeGroup)>,
}

impl Default for DefaultForestTypeCatalog {
    fn default() -> Self {
        let groups = vec![
            (101, ForestTypeGroup { code: 100, name: "white/red/jack pine" }),
            (121, ForestTypeGroup { code: 120, name: "loblolly/shortleaf pine" }),
            (141, ForestTypeGroup { code: 140, name: "oak/pine" }),
            (161, ForestTypeGroup { code: 160, name: "oak/hickory" }),
            (162, ForestTypeGroup { code: 160, name: "oak/hickory" }),
            (163, ForestTypeGroup { code: 160, name: "oak/hickory" }),
            (201, ForestTypeGroup { code: 200, name: "oak/gum/cypress" }),
            (241, ForestTypeGroup { code: 240, name: "elm/ash/cottonwood" }),
            (381, ForestTypeGroup { code: 380, name: "aspen/birch" }),
            (901, ForestTypeGroup { code: 900, name: "aspen/birch" }),
            (999, ForestTypeGroup { code: 999, name: "nonstocked" }),
        ];
        Self { groups }
    }
}

impl ForestTypeCatalog for DefaultForestTypeCatalog {
    fn group_for(&self, fortypcd: u32) -> Option<ForestTypeGroup> {
        self.groups
            .iter()
            .find(|(code, _)| *code == fortypcd)
            .map(|(_, group)| *group)
    }
}
