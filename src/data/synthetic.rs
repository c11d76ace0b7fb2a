//! Seeded synthetic occurrence datasets.
//!
//! Used by the `demo` command and by tests that need a realistically shaped graph
//! without shipping a real mineral database. Shapes, loosely:
//!
//! - elements are drawn with a skewed popularity (a handful of elements
//!   appear in most minerals)
//! - each mineral has 1–6 constituent elements
//! - locality counts per mineral are log-normal (most minerals are rare)
//! - each observation is dated to an interval inside `[0, 4.5]` Ga

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::LogNormal;

use crate::data::graph::InMemoryGraph;
use crate::domain::{Element, ElementMeta, LocalityRecord};
use crate::error::AppError;

/// Age of the oldest observations generated, in Ga.
const EARTH_AGE_GA: f64 = 4.5;

const SYMBOLS: [&str; 40] = [
    "H", "Li", "Be", "B", "C", "N", "O", "F", "Na", "Mg", "Al", "Si", "P", "S", "Cl", "K",
    "Ca", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "As", "Se", "Sr", "Zr", "Mo",
    "Ag", "Sn", "Sb", "Ba", "Ce", "W", "Pb", "Bi", "U",
];

#[derive(Debug, Clone)]
pub struct SyntheticSpec {
    pub n_minerals: usize,
    pub n_sites: usize,
    pub seed: u64,
}

impl Default for SyntheticSpec {
    fn default() -> Self {
        Self {
            n_minerals: 600,
            n_sites: 2_000,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyntheticDataset {
    pub catalog: Vec<Element>,
    pub graph: InMemoryGraph,
}

pub fn generate_dataset(spec: &SyntheticSpec) -> Result<SyntheticDataset, AppError> {
    if spec.n_minerals == 0 || spec.n_sites == 0 {
        return Err(AppError::input("Synthetic dataset needs at least one mineral and one site."));
    }

    let mut rng = StdRng::seed_from_u64(spec.seed);
    let locality_count = LogNormal::<f64>::new(1.0, 1.0)
        .map_err(|e| AppError::input(format!("Locality distribution error: {e}")))?;

    let catalog: Vec<Element> = SYMBOLS
        .iter()
        .enumerate()
        .map(|(i, &symbol)| Element {
            symbol: symbol.to_string(),
            meta: ElementMeta {
                atomic_number: Some(i as u32 + 1),
                ..ElementMeta::default()
            },
        })
        .collect();

    // Popularity weight ~ 1/rank keeps a few elements dominant; `order` maps a
    // popularity rank to a symbol.
    let ranks: Vec<usize> = (0..SYMBOLS.len()).collect();
    let weights: Vec<f64> = ranks.iter().map(|&r| 1.0 / (r as f64 + 1.0)).collect();
    let mut order = ranks.clone();
    order.shuffle(&mut rng);

    let mut graph = InMemoryGraph::new();
    for m in 0..spec.n_minerals {
        let mineral = format!("M{:04}", m + 1);

        let k = rng.gen_range(1..=6usize);
        let picked = ranks
            .choose_multiple_weighted(&mut rng, k, |&rank| weights[rank])
            .map_err(|e| AppError::input(format!("Element sampling error: {e}")))?;
        graph.add_mineral(&mineral, picked.map(|&rank| SYMBOLS[order[rank]]));

        let n_obs = (locality_count.sample(&mut rng).round() as usize).clamp(1, spec.n_sites);
        for _ in 0..n_obs {
            let site = rng.gen_range(1..=spec.n_sites);
            let older = rng.gen_range(0.0..=EARTH_AGE_GA);
            let younger = rng.gen_range(0.0..=older);
            graph.add_locality(LocalityRecord {
                locality_id: format!("LOC{site:05}"),
                mineral: Some(mineral.clone()),
                max_age_ga: Some(older),
                min_age_ga: Some(younger),
            })?;
        }
    }

    Ok(SyntheticDataset { catalog, graph })
}
