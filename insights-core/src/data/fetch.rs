//! Fetch stage: run one query and persist its result as an artifact.
//!
//! Layout: `{dest}` holds the payload verbatim, `{dest}.meta.json` holds the
//! sidecar (query, execution, row count, BLAKE3 hash, fetch time).
//! Writes are atomic: write to `.tmp`, then rename over the destination.

use super::provider::{DataError, QueryOutput, QueryProvider, QueryRequest, ResultFormat};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Metadata sidecar for a fetched artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchMeta {
    pub query_id: u64,
    pub query_name: String,
    pub execution_id: String,
    pub provider: String,
    pub format: ResultFormat,
    pub bytes: usize,
    pub rows: Option<usize>,
    pub data_hash: String,
    pub fetched_at: chrono::NaiveDateTime,
}

/// Outcome of a successful fetch.
#[derive(Debug, Clone)]
pub struct FetchSummary {
    pub artifact: PathBuf,
    pub meta_path: PathBuf,
    pub meta: FetchMeta,
}

/// Run `request` on `provider` and write the result to `dest`.
///
/// The destination is overwritten unconditionally; parent directories are created.
pub fn fetch_to_file(
    provider: &dyn QueryProvider,
    request: &QueryRequest,
    format: ResultFormat,
    dest: &Path,
) -> Result<FetchSummary, DataError> {
    let output = provider.run_query(request, format)?;
    let meta = build_meta(provider.name(), request, &output);

    write_atomic(dest, output.body.as_bytes())?;

    let meta_path = meta_path(dest);
    let meta_json = serde_json::to_string_pretty(&meta).map_err(|e| DataError::ArtifactWrite {
        path: meta_path.display().to_string(),
        reason: format!("meta serialization: {e}"),
    })?;
    write_atomic(&meta_path, meta_json.as_bytes())?;

    info!(
        artifact = %dest.display(),
        rows = ?meta.rows,
        bytes = meta.bytes,
        "artifact written"
    );

    Ok(FetchSummary {
        artifact: dest.to_path_buf(),
        meta_path,
        meta,
    })
}

/// Path of the sidecar for an artifact: `{artifact}.meta.json`.
pub fn meta_path(artifact: &Path) -> PathBuf {
    let mut name = OsString::from(artifact.as_os_str());
    name.push(".meta.json");
    PathBuf::from(name)
}

/// Read the sidecar of an artifact, if present and parsable.
pub fn read_meta(artifact: &Path) -> Option<FetchMeta> {
    let content = fs::read_to_string(meta_path(artifact)).ok()?;
    serde_json::from_str(&content).ok()
}

fn build_meta(provider: &str, request: &QueryRequest, output: &QueryOutput) -> FetchMeta {
    FetchMeta {
        query_id: request.query_id,
        query_name: request.name.clone(),
        execution_id: output.execution_id.clone(),
        provider: provider.to_string(),
        format: output.format,
        bytes: output.body.len(),
        rows: count_rows(output.format, &output.body),
        data_hash: blake3::hash(output.body.as_bytes()).to_hex().to_string(),
        fetched_at: chrono::Local::now().naive_local(),
    }
}

/// Count data rows in a payload. `None` when the payload cannot be read.
pub fn count_rows(format: ResultFormat, body: &str) -> Option<usize> {
    match format {
        ResultFormat::Csv => {
            let mut reader = csv::ReaderBuilder::new()
                .has_headers(true)
                .from_reader(body.as_bytes());
            let mut rows = 0;
            for record in reader.records() {
                match record {
                    Ok(_) => rows += 1,
                    Err(e) => {
                        warn!("could not count CSV rows: {e}");
                        return None;
                    }
                }
            }
            Some(rows)
        }
        ResultFormat::Json => serde_json::from_str::<serde_json::Value>(body)
            .ok()?
            .pointer("/result/rows")?
            .as_array()
            .map(Vec::len),
    }
}

/// Write bytes to `path` via a temporary file and rename.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), DataError> {
    let write_err = |reason: String| DataError::ArtifactWrite {
        path: path.display().to_string(),
        reason,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| write_err(format!("failed to create dir: {e}")))?;
    }

    let mut tmp_name = OsString::from(path.as_os_str());
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    fs::write(&tmp_path, contents).map_err(|e| write_err(format!("write: {e}")))?;
    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        write_err(format!("atomic rename failed: {e}"))
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct StubProvider {
        body: String,
        calls: Cell<usize>,
    }

    impl QueryProvider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }

        fn run_query(
            &self,
            _request: &QueryRequest,
            format: ResultFormat,
        ) -> Result<QueryOutput, DataError> {
            self.calls.set(self.calls.get() + 1);
            Ok(QueryOutput {
                execution_id: "exec-1".into(),
                format,
                body: self.body.clone(),
            })
        }
    }

    struct FailingProvider;

    impl QueryProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        fn run_query(&self, _: &QueryRequest, _: ResultFormat) -> Result<QueryOutput, DataError> {
            Err(DataError::NetworkUnreachable("connection refused".into()))
        }
    }

    #[test]
    fn fetch_writes_payload_and_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("nested/deeper/stablecoin_cusd.csv");
        let provider = StubProvider {
            body: "address,balance\n0xa,1\n0xb,2\n".into(),
            calls: Cell::new(0),
        };
        let request = QueryRequest::new(5354328, "Any Name");

        let summary = fetch_to_file(&provider, &request, ResultFormat::Csv, &dest).unwrap();

        assert_eq!(provider.calls.get(), 1);
        assert_eq!(fs::read_to_string(&dest).unwrap(), provider.body);
        assert_eq!(summary.meta.rows, Some(2));
        assert_eq!(summary.meta.query_id, 5354328);
        assert_eq!(summary.meta.provider, "stub");
        assert_eq!(
            summary.meta.data_hash,
            blake3::hash(provider.body.as_bytes()).to_hex().to_string()
        );
        assert_eq!(read_meta(&dest), Some(summary.meta.clone()));
        assert!(!dir.path().join("nested/deeper/stablecoin_cusd.csv.tmp").exists());
    }

    #[test]
    fn fetch_overwrites_existing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.csv");
        fs::write(&dest, "stale contents that are longer than the new payload").unwrap();

        let provider = StubProvider {
            body: "a\n1\n".into(),
            calls: Cell::new(0),
        };
        fetch_to_file(&provider, &QueryRequest::new(1, "q"), ResultFormat::Csv, &dest).unwrap();
        assert_eq!(fs::read_to_string(&dest).unwrap(), "a\n1\n");
    }

    #[test]
    fn provider_failure_leaves_no_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.csv");
        let err = fetch_to_file(&FailingProvider, &QueryRequest::new(1, "q"), ResultFormat::Csv, &dest)
            .unwrap_err();
        assert!(matches!(err, DataError::NetworkUnreachable(_)));
        assert!(!dest.exists());
        assert!(!meta_path(&dest).exists());
    }

    #[test]
    fn json_row_count_reads_result_rows() {
        let body = r#"{"result":{"rows":[{"a":1},{"a":2},{"a":3}],"metadata":{"column_names":["a"]}}}"#;
        assert_eq!(count_rows(ResultFormat::Json, body), Some(3));
        assert_eq!(count_rows(ResultFormat::Json, "{}"), None);
        assert_eq!(count_rows(ResultFormat::Csv, "a,b\n"), Some(0));
    }

    #[test]
    fn meta_path_appends_suffix() {
        assert_eq!(
            meta_path(Path::new("data/stablecoin_cusd.csv")),
            PathBuf::from("data/stablecoin_cusd.csv.meta.json")
        );
    }
}
