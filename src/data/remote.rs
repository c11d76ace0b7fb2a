//! HTTP backend for the occurrence graph.
//!
//! The service receives
//!
//! ```text
//! { "elements": ["Fe", "O"], "max_age": 4.5, "min_age": 0.0 }
//! ```
//!
//! and answers with
//!
//! ```text
//! { "edges": [["hematite", "Fe"], ...], "locality_info": [{ "locality_id": 1234, ... }, ...] }
//! ```
//!
//! Query layers in the wild are loose about types: ids come back as strings or as
//! numbers (sometimes as `1234.0`), ages as numbers or numeric strings. Everything is
//! coerced to one canonical representation here so that distinct-counting downstream
//! does not treat `"1234"` and `1234` as two localities.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::Value;

use crate::data::graph::OccurrenceGraph;
use crate::domain::{AgeRange, LocalityRecord, OccurrenceEdge, QueryResult};
use crate::error::AppError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    elements: &'a [&'a str],
    max_age: f64,
    min_age: f64,
}

pub struct HttpGraph {
    client: Client,
    endpoint: String,
}

impl HttpGraph {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, AppError> {
        let endpoint = endpoint.into();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(AppError::input(format!(
                "Occurrence endpoint must be an http(s) URL, got '{endpoint}'."
            )));
        }
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::input(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl OccurrenceGraph for HttpGraph {
    fn query(&self, elements: &[&str], age_range: AgeRange) -> Result<QueryResult, AppError> {
        let body = QueryRequest {
            elements,
            max_age: age_range.max_ga,
            min_age: age_range.min_ga,
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .map_err(|e| AppError::query(format!("Occurrence query to {} failed: {e}", self.endpoint)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AppError::query(format!(
                "Occurrence query for {elements:?} returned HTTP {status}."
            )));
        }

        let payload: Value = resp
            .json()
            .map_err(|e| AppError::query(format!("Occurrence query returned invalid JSON: {e}")))?;

        decode_query_response(&payload)
    }
}

/// Decode a query response body into a `QueryResult`.
pub fn decode_query_response(payload: &Value) -> Result<QueryResult, AppError> {
    let obj = payload
        .as_object()
        .ok_or_else(|| AppError::query("Occurrence response is not a JSON object."))?;

    let edges = obj
        .get("edges")
        .and_then(Value::as_array)
        .ok_or_else(|| AppError::query("Occurrence response is missing the `edges` array."))?;
    let locality_info = obj
        .get("locality_info")
        .and_then(Value::as_array)
        .ok_or_else(|| AppError::query("Occurrence response is missing the `locality_info` array."))?;

    let mut out = QueryResult {
        edges: Vec::with_capacity(edges.len()),
        locality_info: Vec::with_capacity(locality_info.len()),
    };

    for (i, edge) in edges.iter().enumerate() {
        out.edges.push(decode_edge(edge).ok_or_else(|| {
            AppError::query(format!("Malformed edge #{i} in occurrence response: {edge}"))
        })?);
    }

    for (i, rec) in locality_info.iter().enumerate() {
        out.locality_info.push(decode_locality(rec).ok_or_else(|| {
            AppError::query(format!("Malformed locality record #{i} in occurrence response: {rec}"))
        })?);
    }

    Ok(out)
}

fn decode_edge(v: &Value) -> Option<OccurrenceEdge> {
    match v {
        Value::Array(pair) if pair.len() == 2 => {
            Some(OccurrenceEdge::new(coerce_id(&pair[0])?, coerce_id(&pair[1])?))
        }
        Value::Object(map) => Some(OccurrenceEdge::new(
            coerce_id(map.get("mineral")?)?,
            coerce_id(map.get("element")?)?,
        )),
        _ => None,
    }
}

fn decode_locality(v: &Value) -> Option<LocalityRecord> {
    let map = v.as_object()?;
    let locality_id = coerce_id(map.get("locality_id")?)?;

    // Optional fields must still be well-formed when present.
    let mineral = match map.get("mineral") {
        None | Some(Value::Null) => None,
        Some(m) => Some(coerce_id(m)?),
    };
    let max_age_ga = coerce_opt_f64(map.get("max_age"))?;
    let min_age_ga = coerce_opt_f64(map.get("min_age"))?;

    Some(LocalityRecord {
        locality_id,
        mineral,
        max_age_ga,
        min_age_ga,
    })
}

/// Canonical string form of an identifier delivered as a string or a number.
///
/// Integral floats are printed without a fractional part and all-digit strings
/// lose leading zeros, so `1234`, `1234.0`, `"1234"` and `"01234"` all map to
/// `"1234"`.
pub fn coerce_id(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            if s.bytes().all(|b| b.is_ascii_digit()) {
                if let Ok(u) = s.parse::<u64>() {
                    return Some(u.to_string());
                }
            }
            match s.parse::<f64>() {
                Ok(f) if f.is_finite() && f.fract() == 0.0 && s.contains('.') => {
                    Some(format!("{}", f as i64))
                }
                _ => Some(s.to_string()),
            }
        }
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Some(u.to_string())
            } else {
                let f = n.as_f64()?;
                if f.is_finite() && f.fract() == 0.0 {
                    Some(format!("{}", f as i64))
                } else {
                    Some(f.to_string())
                }
            }
        }
        _ => None,
    }
}

/// `Some(None)` when absent/null, `Some(Some(x))` when numeric, `None` when malformed.
fn coerce_opt_f64(v: Option<&Value>) -> Option<Option<f64>> {
    match v {
        None | Some(Value::Null) => Some(None),
        Some(Value::Number(n)) => n.as_f64().filter(|f| f.is_finite()).map(Some),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()).map(Some),
        Some(_) => None,
    }
}
