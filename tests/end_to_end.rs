use std::fs;
use std::path::{Path, PathBuf};

use element_networks::app::pipeline::{build_table, run_analysis, table_from_graph};
use element_networks::data::InMemoryGraph;
use element_networks::domain::{
    AgeRange, AnalysisConfig, Element, ElementNetworkRecord, ElementStats, FitSpec, GraphSource, LocalityRecord,
    Variable, ZeroPolicy,
};
use element_networks::fit::fit;
use element_networks::io::write_stats_csv;
use pretty_assertions::assert_eq;

fn config(catalog: Option<PathBuf>, source: GraphSource) -> AnalysisConfig {
    AnalysisConfig {
        catalog_path: catalog,
        source,
        cutoff_ga: 4.5,
        age_range: AgeRange::new(4.5, 0.0).unwrap(),
        zero_policy: ZeroPolicy::Exclude,
        jobs: None,
        candidates: Vec::new(),
        export_stats: None,
        export_fits: None,
    }
}

/// Three H–O minerals seen at 50 distinct localities in total.
fn water_graph() -> InMemoryGraph {
    let mut graph = InMemoryGraph::new();
    for mineral in ["ice", "brucite-like", "hydroxide"] {
        graph.add_mineral(mineral, ["H", "O"]);
    }
    let minerals = ["ice", "brucite-like", "hydroxide"];
    for i in 0..50 {
        let mut record = LocalityRecord::new(format!("L{i:03}"));
        record.mineral = Some(minerals[i % 3].to_string());
        record.max_age_ga = Some(2.0);
        record.min_age_ga = Some(1.0);
        graph.add_locality(record).unwrap();
    }
    // The same locality reported for a second mineral counts once.
    let mut repeat = LocalityRecord::new("L000");
    repeat.mineral = Some("hydroxide".to_string());
    graph.add_locality(repeat).unwrap();
    graph
}

#[test]
fn hydrogen_and_oxygen_produce_two_symmetric_rows() {
    let catalog = vec![Element::new("H"), Element::new("O")];
    let out = table_from_graph(&water_graph(), &catalog, &config(None, GraphSource::Synthetic {
        seed: 0,
        n_minerals: 1,
        n_sites: 1,
    }))
    .unwrap();

    let records: Vec<ElementNetworkRecord> = out.table.into_iter().map(|r| r.record).collect();
    assert_eq!(
        records,
        vec![
            ElementNetworkRecord {
                symbol: "H".to_string(),
                n_elements: 1,
                n_minerals: 3,
                n_localities: 50,
            },
            ElementNetworkRecord {
                symbol: "O".to_string(),
                n_elements: 1,
                n_minerals: 3,
                n_localities: 50,
            },
        ]
    );
}

#[test]
fn larger_linear_table_recovers_known_coefficients() {
    let table: Vec<ElementStats> = (1..=40u64)
        .map(|i| ElementStats {
            record: ElementNetworkRecord {
                symbol: format!("E{i}"),
                n_elements: i,
                n_minerals: 7 * i + 12,
                n_localities: 100,
            },
            meta: Default::default(),
        })
        .collect();

    let model = fit(
        &table,
        &FitSpec::linear(Variable::Minerals, Variable::Elements),
        ZeroPolicy::Fail,
    )
    .unwrap();
    assert!((model.slope - 7.0).abs() < 1e-9);
    assert!((model.intercept - 12.0).abs() < 1e-9);
    assert!((model.r_squared - 1.0).abs() <= 1e-3);
    assert_eq!(model.equation, "Y = 7X + 12");
}

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn csv_inputs_run_through_the_whole_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = write(
        dir.path(),
        "catalog.csv",
        "symbol,name,atomic_number,natural\nH,Hydrogen,1,true\nO,Oxygen,8,true\nSi,Silicon,14,true\nFe,Iron,26,true\nTc,Technetium,43,false\n",
    );
    let minerals = write(
        dir.path(),
        "minerals.csv",
        "mineral_id,elements\nice,H;O\nquartz,Si;O\nhematite,Fe;O\nfayalite,Fe;Si;O\ngoethite,Fe;O;H\n",
    );
    let localities = write(
        dir.path(),
        "localities.csv",
        "mineral_id,locality_id,max_age_ga,min_age_ga\n\
         ice,L1,0.1,0.0\nquartz,L2,3.0,2.0\nquartz,L3,1.0,0.5\nhematite,L4,2.5,2.4\n\
         fayalite,L5,4.0,3.9\ngoethite,L6,0.3,0.2\ngoethite,L7,0.6,0.5\n",
    );

    let settings = config(
        Some(catalog.clone()),
        GraphSource::Files {
            minerals,
            localities,
        },
    );
    let run = run_analysis(&settings).unwrap();
    assert_eq!(run.stats.catalog_size, 5);
    assert_eq!(run.stats.kept, 4);

    let symbols: Vec<&str> = run.stats.table.iter().map(|r| r.symbol()).collect();
    assert_eq!(symbols, vec!["H", "O", "Si", "Fe"]);
    let o = &run.stats.table[1].record;
    assert_eq!((o.n_elements, o.n_minerals, o.n_localities), (3, 5, 7));
    assert_eq!(run.fits.fits.len() + run.fits.failed.len(), 6);

    // Export the table and refit it without the graph.
    let stats_csv = dir.path().join("stats.csv");
    write_stats_csv(&stats_csv, &run.stats.table).unwrap();
    let reloaded = build_table(&config(Some(catalog), GraphSource::StatsTable { path: stats_csv })).unwrap();
    assert_eq!(reloaded.table, run.stats.table);
}
