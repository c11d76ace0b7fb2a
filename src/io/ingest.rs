//! CSV ingest: element catalog, occurrence dataset, and exported statistics tables.
//!
//! Unlike a screening tool, this analysis cannot skip bad rows: a silently
//! dropped catalog row or locality record would change the very counts being
//! studied. Every malformed row is therefore an error carrying its line number.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use csv::StringRecord;
use tracing::info;

use crate::data::InMemoryGraph;
use crate::domain::{Element, ElementMeta, ElementNetworkRecord, LocalityRecord};
use crate::error::AppError;

/// Load the element catalog, preserving file order.
///
/// Columns: `symbol` (required), `name`, `atomic_number`, `group`, `period`,
/// `discovery_era`, `natural` (default true), `extinct_ga`.
pub fn load_catalog(path: &Path) -> Result<Vec<Element>, AppError> {
    let (header_map, rows) = read_rows(path, &["symbol"])?;

    let mut out = Vec::with_capacity(rows.len());
    for (line, record) in rows {
        let element = parse_catalog_row(&record, &header_map).map_err(|e| row_error(path, line, e))?;
        out.push(element);
    }

    info!(path = %path.display(), elements = out.len(), "loaded element catalog");
    Ok(out)
}

/// Load an occurrence graph from a minerals file and a localities file.
///
/// - minerals: `mineral_id`, `elements` (symbols separated by `;`, `,` or spaces)
/// - localities: `mineral_id`, `locality_id`, optional `max_age_ga`, `min_age_ga`
pub fn load_graph(minerals: &Path, localities: &Path) -> Result<InMemoryGraph, AppError> {
    let mut graph = InMemoryGraph::new();

    let (header_map, rows) = read_rows(minerals, &["mineral_id", "elements"])?;
    for (line, record) in rows {
        let mineral = get_required(&record, &header_map, "mineral_id").map_err(|e| row_error(minerals, line, e))?;
        let elements = get_required(&record, &header_map, "elements").map_err(|e| row_error(minerals, line, e))?;
        let symbols: Vec<&str> = elements
            .split(|c: char| c == ';' || c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .collect();
        if symbols.is_empty() {
            return Err(row_error(minerals, line, "Mineral lists no elements.".to_string()));
        }
        graph.add_mineral(mineral, symbols);
    }

    let (header_map, rows) = read_rows(localities, &["mineral_id", "locality_id"])?;
    for (line, record) in rows {
        let parsed = parse_locality_row(&record, &header_map).map_err(|e| row_error(localities, line, e))?;
        graph.add_locality(parsed)?;
    }

    info!(
        minerals = graph.mineral_count(),
        locality_records = graph.locality_record_count(),
        "loaded occurrence graph"
    );
    Ok(graph)
}

/// Load a statistics table previously written by `write_stats_csv`.
///
/// Count columns go through `coerce_count`, so tables that passed through a
/// spreadsheet (`"12.0"`, `" 12 "`) still load as integers.
pub fn load_stats_table(path: &Path) -> Result<Vec<ElementNetworkRecord>, AppError> {
    let (header_map, rows) = read_rows(path, &["symbol", "n_elements", "n_minerals", "n_localities"])?;

    let mut out = Vec::with_capacity(rows.len());
    for (line, record) in rows {
        let parsed = (|| -> Result<ElementNetworkRecord, String> {
            Ok(ElementNetworkRecord {
                symbol: get_required(&record, &header_map, "symbol")?.to_string(),
                n_elements: coerce_count(get_required(&record, &header_map, "n_elements")?)?,
                n_minerals: coerce_count(get_required(&record, &header_map, "n_minerals")?)?,
                n_localities: coerce_count(get_required(&record, &header_map, "n_localities")?)?,
            })
        })()
        .map_err(|e| row_error(path, line, e))?;
        out.push(parsed);
    }
    Ok(out)
}

/// Coerce a textual count to a non-negative integer.
///
/// Accepts integers and integral floats (`"12"`, `"12.0"`, `"1e2"`); rejects
/// fractions, negatives, and non-numbers.
pub fn coerce_count(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if let Ok(v) = s.parse::<u64>() {
        return Ok(v);
    }
    let v = s
        .parse::<f64>()
        .map_err(|_| format!("Count '{s}' is not a number."))?;
    if !v.is_finite() || v < 0.0 || v.fract() != 0.0 || v > u64::MAX as f64 {
        return Err(format!("Count '{s}' is not a non-negative integer."));
    }
    Ok(v as u64)
}

type Rows = Vec<(usize, StringRecord)>;

fn read_rows(path: &Path, required: &[&str]) -> Result<(HashMap<String, usize>, Rows), AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open CSV '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::input(format!("Failed to read CSV headers of '{}': {e}", path.display())))?
        .clone();
    let header_map = build_header_map(&headers);

    for name in required {
        if !header_map.contains_key(*name) {
            return Err(AppError::input(format!(
                "Missing required column `{name}` in '{}'.",
                path.display()
            )));
        }
    }

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // +2: records start after the header, and lines are 1-based.
        let line = idx + 2;
        let record = result.map_err(|e| row_error(path, line, format!("CSV parse error: {e}")))?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        rows.push((line, record));
    }
    Ok((header_map, rows))
}

fn parse_catalog_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> Result<Element, String> {
    let symbol = get_required(record, header_map, "symbol")?.to_string();
    let meta = ElementMeta {
        name: get_optional(record, header_map, "name").map(str::to_string),
        atomic_number: parse_opt(get_optional(record, header_map, "atomic_number"), "atomic_number")?,
        group: parse_opt(get_optional(record, header_map, "group"), "group")?,
        period: parse_opt(get_optional(record, header_map, "period"), "period")?,
        discovery_era: get_optional(record, header_map, "discovery_era").map(str::to_string),
        natural: match get_optional(record, header_map, "natural") {
            None => true,
            Some(s) => parse_bool(s)?,
        },
        extinct_ga: parse_opt(get_optional(record, header_map, "extinct_ga"), "extinct_ga")?,
    };
    Ok(Element { symbol, meta })
}

fn parse_locality_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> Result<LocalityRecord, String> {
    let max_age_ga: Option<f64> = parse_opt(get_optional(record, header_map, "max_age_ga"), "max_age_ga")?;
    let min_age_ga: Option<f64> = parse_opt(get_optional(record, header_map, "min_age_ga"), "min_age_ga")?;
    if let (Some(older), Some(younger)) = (max_age_ga, min_age_ga) {
        if older < younger {
            return Err(format!("max_age_ga {older} is younger than min_age_ga {younger}."));
        }
    }
    Ok(LocalityRecord {
        locality_id: get_required(record, header_map, "locality_id")?.to_string(),
        mineral: Some(get_required(record, header_map, "mineral_id")?.to_string()),
        max_age_ga,
        min_age_ga,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    let idx = header_map
        .get(name)
        .ok_or_else(|| format!("Missing required column: `{name}`"))?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn get_optional<'a>(record: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

fn parse_opt<T: std::str::FromStr>(s: Option<&str>, name: &str) -> Result<Option<T>, String> {
    match s {
        None => Ok(None),
        Some(s) => s
            .parse::<T>()
            .map(Some)
            .map_err(|_| format!("Invalid `{name}` value '{s}'.")),
    }
}

fn parse_bool(s: &str) -> Result<bool, String> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Ok(true),
        "false" | "no" | "n" | "0" => Ok(false),
        _ => Err(format!("Invalid boolean '{s}' in `natural`.")),
    }
}

fn row_error(path: &Path, line: usize, message: String) -> AppError {
    AppError::input(format!("{}:{line}: {message}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use crate::data::OccurrenceGraph;
    use crate::domain::AgeRange;

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn coerce_count_accepts_integral_text() {
        assert_eq!(coerce_count("12"), Ok(12));
        assert_eq!(coerce_count(" 12.0 "), Ok(12));
        assert_eq!(coerce_count("1e2"), Ok(100));
        assert_eq!(coerce_count("0"), Ok(0));
        assert!(coerce_count("12.5").is_err());
        assert!(coerce_count("-3").is_err());
        assert!(coerce_count("many").is_err());
    }

    #[test]
    fn catalog_keeps_order_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "catalog.csv",
            "\u{feff}Symbol,name,atomic_number,natural,extinct_ga\nH,Hydrogen,1,,\nPu,Plutonium,94,true,4.0\nTc,Technetium,43,false,\n",
        );
        let catalog = load_catalog(&path).unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog[0].symbol, "H");
        assert!(catalog[0].meta.natural);
        assert_eq!(catalog[1].meta.extinct_ga, Some(4.0));
        assert!(!catalog[2].meta.natural);
        assert_eq!(catalog[2].meta.atomic_number, Some(43));
    }

    #[test]
    fn bad_catalog_row_reports_its_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "catalog.csv", "symbol,atomic_number\nH,1\nHe,two\n");
        let err = load_catalog(&path).unwrap_err();
        assert!(err.message().contains(":3:"), "{}", err.message());
    }

    #[test]
    fn graph_files_load_into_a_queryable_graph() {
        let dir = tempfile::tempdir().unwrap();
        let minerals = write_file(&dir, "minerals.csv", "mineral_id,elements\nice,H;O\nquartz,\"Si, O\"\n");
        let localities = write_file(
            &dir,
            "localities.csv",
            "mineral_id,locality_id,max_age_ga,min_age_ga\nice,L1,0.5,0.0\nquartz,L2,3.0,2.5\nquartz,L2,3.0,2.5\n",
        );
        let graph = load_graph(&minerals, &localities).unwrap();
        assert_eq!(graph.mineral_count(), 2);

        let result = graph.query(&["O"], AgeRange::new(4.5, 1.0).unwrap()).unwrap();
        assert!(result.edges.iter().all(|e| e.mineral == "quartz"));
        assert_eq!(result.locality_info.len(), 2);
    }

    #[test]
    fn inverted_locality_ages_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let minerals = write_file(&dir, "minerals.csv", "mineral_id,elements\nice,H;O\n");
        let localities = write_file(
            &dir,
            "localities.csv",
            "mineral_id,locality_id,max_age_ga,min_age_ga\nice,L1,0.1,0.5\n",
        );
        assert!(load_graph(&minerals, &localities).is_err());
    }

    #[test]
    fn stats_table_coerces_counts() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "stats.csv",
            "symbol,n_elements,n_minerals,n_localities\nO,70.0,4000,\"100000\"\nTc,0,0,0\n",
        );
        let table = load_stats_table(&path).unwrap();
        assert_eq!(table[0].n_elements, 70);
        assert_eq!(table[0].n_localities, 100_000);
        assert_eq!(table[1], ElementNetworkRecord::zero("Tc"));
    }
}
