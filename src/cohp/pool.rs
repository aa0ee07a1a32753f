use std::collections::BTreeMap;

use log::debug;
use ndarray::{Array1, Array2, ArrayView1};
use serde::Deserialize;

use crate::{error::Result, parser::cohpcar::Interaction};

use super::layout::ColumnLayout;

const SHELLS: [char; 4] = ['s', 'p', 'd', 'f'];

/// Orbital pairs making up the sigma bond of a linear molecule along z.
pub const SIGMA_KEYS: [&str; 4] = ["ss", "sp_z", "p_zs", "p_zp_z"];
/// Orbital pairs making up the two pi bonds.
pub const PI_KEYS: [&str; 4] = ["p_xp_x", "p_xp_y", "p_yp_x", "p_yp_y"];
const MIXED_P_KEYS: [&str; 8] = [
    "sp_x", "p_xs", "sp_y", "p_ys", "p_xp_z", "p_zp_x", "p_yp_z", "p_zp_y",
];

/// How finely orbital labels are distinguished when pooling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolResolution {
    /// Angular momentum only: `2s` + `2p_z` -> `sp`
    #[default]
    Shell,
    /// Full orbital: `2s` + `2p_z` -> `sp_z`
    Orbital,
}

impl PoolResolution {
    /// Pool key of an orbital pair, first label first. Labels start with
    /// the principal quantum number, which is dropped.
    pub fn key(&self, orbital1: &str, orbital2: &str) -> String {
        match self {
            PoolResolution::Shell => [orbital1, orbital2]
                .iter()
                .filter_map(|label| label.chars().nth(1))
                .collect(),
            PoolResolution::Orbital => {
                let mut key = String::from(orbital1.get(1..).unwrap_or_default());
                key.push_str(orbital2.get(1..).unwrap_or_default());
                key
            }
        }
    }

    fn seed_keys(&self) -> Vec<String> {
        match self {
            PoolResolution::Shell => SHELLS
                .iter()
                .flat_map(|a| SHELLS.iter().map(move |b| format!("{a}{b}")))
                .collect(),
            PoolResolution::Orbital => SIGMA_KEYS
                .iter()
                .chain(PI_KEYS.iter())
                .chain(MIXED_P_KEYS.iter())
                .map(|k| k.to_string())
                .collect(),
        }
    }
}

/**
Which orbitalwise interactions go into the pools.
# Field:
  * resolution: PoolResolution
  * atom_pair: Option<(u32, u32)> - only interactions from the first atom
    to the second (1-based indices); `None` pools the whole system.
*/
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolOptions {
    resolution: PoolResolution,
    atom_pair: Option<(u32, u32)>,
}

impl PoolOptions {
    pub fn new(resolution: PoolResolution, atom_pair: Option<(u32, u32)>) -> Self {
        Self {
            resolution,
            atom_pair,
        }
    }

    pub fn resolution(&self) -> PoolResolution {
        self.resolution
    }

    pub fn atom_pair(&self) -> Option<(u32, u32)> {
        self.atom_pair
    }

    fn accepts(&self, interaction: &Interaction) -> bool {
        match self.atom_pair {
            Some((at1, at2)) => interaction.connects(at1, at2),
            None => true,
        }
    }
}

/// Orbital-pair label -> COHP summed over the matching interactions,
/// aligned with the energy grid.
#[derive(Debug, Clone)]
pub struct OrbitalPools {
    resolution: PoolResolution,
    num_points: usize,
    pools: BTreeMap<String, Array1<f64>>,
    contributions: BTreeMap<String, usize>,
}

impl OrbitalPools {
    pub fn new(resolution: PoolResolution, num_points: usize) -> Self {
        let pools = resolution
            .seed_keys()
            .into_iter()
            .map(|key| (key, Array1::zeros(num_points)))
            .collect();
        Self {
            resolution,
            num_points,
            pools,
            contributions: BTreeMap::new(),
        }
    }

    fn add(&mut self, key: &str, values: ArrayView1<f64>) {
        let num_points = self.num_points;
        let pool = self
            .pools
            .entry(key.to_string())
            .or_insert_with(|| Array1::zeros(num_points));
        *pool += &values;
    }

    pub fn resolution(&self) -> PoolResolution {
        self.resolution
    }

    pub fn num_points(&self) -> usize {
        self.num_points
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.pools.keys().map(|k| k.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&Array1<f64>> {
        self.pools.get(key)
    }

    /// Pool by key; keys nothing contributed to read as zeros.
    pub fn pool(&self, key: &str) -> Array1<f64> {
        self.get(key)
            .cloned()
            .unwrap_or_else(|| Array1::zeros(self.num_points))
    }

    /// Number of interactions summed into a pool (spin channels not counted).
    pub fn contributions(&self, key: &str) -> usize {
        self.contributions.get(key).copied().unwrap_or(0)
    }

    /// Sum of several pools, e.g. `["sp", "ps"]` for all s-p mixing.
    pub fn merged(&self, keys: &[&str]) -> Array1<f64> {
        keys.iter().fold(Array1::zeros(self.num_points), |acc, key| {
            match self.get(key) {
                Some(pool) => acc + pool,
                None => acc,
            }
        })
    }

    pub fn sigma(&self) -> Array1<f64> {
        self.merged(&SIGMA_KEYS)
    }

    pub fn pi(&self) -> Array1<f64> {
        self.merged(&PI_KEYS)
    }
}

/**
Sum the projected COHP of every orbitalwise interaction into the pool
named after its orbital pair. Both spin channels are added when present.
`total` interactions are skipped.
# Arguments:
  * `interactions`: parsed declarations, in file order
  * `data`: the COHPCAR matrix
  * `layout`: column layout derived from the same header
  * `options`: resolution and optional atom pair
*/
pub fn pool_orbitals(
    interactions: &[Interaction],
    data: &Array2<f64>,
    layout: &ColumnLayout,
    options: &PoolOptions,
) -> Result<OrbitalPools> {
    let mut pools = OrbitalPools::new(options.resolution(), data.nrows());
    for (position, interaction) in interactions.iter().enumerate() {
        let (orbital1, orbital2) = match interaction.orbitals() {
            Some(orbitals) => orbitals,
            None => continue,
        };
        if !options.accepts(interaction) {
            continue;
        }
        let key = options.resolution().key(orbital1, orbital2);
        for spin in layout.spins() {
            let column = layout.cohp_column(position, spin)?;
            pools.add(&key, data.column(column));
        }
        *pools.contributions.entry(key).or_insert(0) += 1;
    }
    debug!(
        "Pooled {} orbitalwise interactions",
        pools.contributions.values().sum::<usize>()
    );
    Ok(pools)
}
