//! Loader: read the local JSON inputs (snapshot, scoring parameters) with a
//! size limit, deserialize them element by element so errors carry a JSON
//! Pointer, and validate parameter domains. No network I/O.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::Value;

use cm_core::params::validate_domains;
use cm_core::{EnhancedVoter, Household, Influencer, Mohalla, ScoringParams, Snapshot};

use crate::{IoError, IoResult};

/// Snapshots beyond this size are refused.
pub const MAX_SNAPSHOT_BYTES: u64 = 256 * 1024 * 1024;
/// Parameter files are small; anything larger is a mistake.
pub const MAX_PARAMS_BYTES: u64 = 1024 * 1024;

/// Read a file fully into a JSON value, refusing files over `limit` bytes.
pub fn read_json_value_with_limit(path: &Path, limit: u64) -> IoResult<Value> {
    let f = File::open(path).map_err(|e| IoError::Read(format!("{}: {e}", path.display())))?;
    let len = f
        .metadata()
        .map_err(|e| IoError::Read(format!("{}: {e}", path.display())))?
        .len();
    if len > limit {
        return Err(IoError::Limit(format!("{} is {len} bytes (max {limit})", path.display())));
    }
    let mut buf = Vec::with_capacity(len as usize);
    // `take` guards against files that grow between stat and read.
    f.take(limit + 1)
        .read_to_end(&mut buf)
        .map_err(|e| IoError::Read(format!("{}: {e}", path.display())))?;
    if buf.len() as u64 > limit {
        return Err(IoError::Limit(format!("{} exceeds {limit} bytes", path.display())));
    }
    let v: Value = serde_json::from_slice(&buf)?;
    Ok(v)
}

fn from_value_at<T: DeserializeOwned>(v: Value, pointer: &str) -> IoResult<T> {
    serde_json::from_value(v).map_err(|e| IoError::Json { pointer: pointer.to_string(), msg: e.to_string() })
}

/// Deserialize `root[key]` as a list, one element at a time. A missing key or
/// `null` is an empty list.
fn list_at<T: DeserializeOwned>(root: &mut serde_json::Map<String, Value>, key: &str) -> IoResult<Vec<T>> {
    match root.remove(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| from_value_at(item, &format!("/{key}/{i}")))
            .collect(),
        Some(_) => Err(IoError::Json { pointer: format!("/{key}"), msg: "expected an array".into() }),
    }
}

/// Build a `Snapshot` from an already-parsed JSON value.
pub fn snapshot_from_value(v: Value) -> IoResult<Snapshot> {
    let mut root = match v {
        Value::Object(m) => m,
        _ => return Err(IoError::Json { pointer: "/".into(), msg: "snapshot must be a JSON object".into() }),
    };
    let voters: Vec<EnhancedVoter> = list_at(&mut root, "voters")?;
    let households: Vec<Household> = list_at(&mut root, "households")?;
    let mohallas: Vec<Mohalla> = list_at(&mut root, "mohallas")?;
    let influencers: Vec<Influencer> = list_at(&mut root, "influencers")?;
    if !root.is_empty() {
        let keys: Vec<&str> = root.keys().map(String::as_str).collect();
        log::warn!("snapshot: ignoring unknown top-level keys {keys:?}");
    }
    Ok(Snapshot { voters, households, mohallas, influencers })
}

pub fn load_snapshot(path: &Path) -> IoResult<Snapshot> {
    let v = read_json_value_with_limit(path, MAX_SNAPSHOT_BYTES)?;
    let snap = snapshot_from_value(v)?;
    log::info!(
        "loaded snapshot {}: {} voters, {} households, {} mohallas, {} influencers",
        path.display(),
        snap.voters.len(),
        snap.households.len(),
        snap.mohallas.len(),
        snap.influencers.len()
    );
    Ok(snap)
}

/// Load a (possibly partial) parameter file; omitted fields keep their
/// defaults. Domain errors are reported as `IoError::Invalid`.
pub fn load_params(path: &Path) -> IoResult<ScoringParams> {
    let v = read_json_value_with_limit(path, MAX_PARAMS_BYTES)?;
    let params: ScoringParams = from_value_at(v, "/")?;
    validate_domains(&params)?;
    log::debug!("loaded params {}", path.display());
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn file_with(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn missing_lists_default_to_empty() {
        let f = file_with(r#"{"mohallas":[{"id":"m1","name":"Purab Tola"}]}"#);
        let s = load_snapshot(f.path()).unwrap();
        assert!(s.voters.is_empty());
        assert_eq!(s.mohallas.len(), 1);
    }

    #[test]
    fn bad_element_reports_pointer() {
        let f = file_with(r#"{"voters":[
            {"id":"v1","gender":"Male","ageBand":"18-25","householdId":"h1","mohallaId":"m1"},
            {"id":"v2","gender":"Male","ageBand":"17-18","householdId":"h1","mohallaId":"m1"}
        ]}"#);
        match load_snapshot(f.path()) {
            Err(IoError::Json { pointer, .. }) => assert_eq!(pointer, "/voters/1"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn non_object_snapshot_is_rejected() {
        let f = file_with("[1,2,3]");
        assert!(matches!(load_snapshot(f.path()), Err(IoError::Json { .. })));
    }

    #[test]
    fn params_size_limit() {
        let big = format!("{{\"pad\":\"{}\"}}", "x".repeat(MAX_PARAMS_BYTES as usize));
        let f = file_with(&big);
        assert!(matches!(load_params(f.path()), Err(IoError::Limit(_))));
    }

    #[test]
    fn params_domain_errors_are_invalid() {
        let f = file_with(r#"{"turnoutProbabilities":{"high":1.4,"medium":0.5,"low":0.2}}"#);
        assert!(matches!(load_params(f.path()), Err(IoError::Invalid(_))));
    }

    #[test]
    fn missing_file_is_read_error() {
        assert!(matches!(load_snapshot(Path::new("/definitely/not/here.json")), Err(IoError::Read(_))));
    }
}
