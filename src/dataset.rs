//! Raw dataset loading from a local file or an HTTP(S) URL.

use crate::models::RawRecord;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("could not read dataset file: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not fetch dataset: {0}")]
    Http(#[from] reqwest::Error),
    #[error("dataset is not a JSON array of records: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetSource {
    File(PathBuf),
    Url(String),
}

impl DatasetSource {
    /// `http://` and `https://` locations are fetched, anything else is a path.
    pub fn parse(location: &str) -> Self {
        let lower = location.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            DatasetSource::Url(location.to_string())
        } else {
            DatasetSource::File(PathBuf::from(location))
        }
    }
}

impl std::fmt::Display for DatasetSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetSource::File(path) => write!(f, "{}", path.display()),
            DatasetSource::Url(url) => f.write_str(url),
        }
    }
}

/// Parse dataset JSON, keeping at most `limit` rows when set.
pub fn parse_records(
    bytes: &[u8],
    limit: Option<usize>,
) -> Result<Vec<RawRecord>, DatasetError> {
    let mut records: Vec<RawRecord> = serde_json::from_slice(bytes)?;
    if let Some(limit) = limit {
        records.truncate(limit);
    }
    Ok(records)
}

/// Read or fetch the dataset. URLs are fetched with the shared `client`,
/// without a request timeout.
pub async fn load(
    client: &reqwest::Client,
    source: &DatasetSource,
    limit: Option<usize>,
) -> Result<Vec<RawRecord>, DatasetError> {
    let bytes = match source {
        DatasetSource::File(path) => tokio::fs::read(path).await?,
        DatasetSource::Url(url) => {
            client
                .get(url)
                .send()
                .await?
                .error_for_status()?
                .bytes()
                .await?
                .to_vec()
        }
    };
    let records = parse_records(&bytes, limit)?;
    info!(source = %source, rows = records.len(), "dataset loaded");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join("sample_pscs.json")
    }

    #[test]
    fn test_source_parse() {
        assert_eq!(
            DatasetSource::parse("https://example.org/pscs.json"),
            DatasetSource::Url("https://example.org/pscs.json".into())
        );
        assert_eq!(
            DatasetSource::parse("HTTP://example.org/pscs.json"),
            DatasetSource::Url("HTTP://example.org/pscs.json".into())
        );
        assert_eq!(
            DatasetSource::parse("data/pscs.json"),
            DatasetSource::File(PathBuf::from("data/pscs.json"))
        );
    }

    #[test]
    fn test_parse_records_limit() {
        let json = br#"[{"company_number":"1"},{"company_number":"2"},{"company_number":"3"}]"#;
        assert_eq!(parse_records(json, None).unwrap().len(), 3);
        let limited = parse_records(json, Some(2)).unwrap();
        assert_eq!(limited.len(), 2);
        assert_eq!(limited[1].company_number.as_deref(), Some("2"));
    }

    #[test]
    fn test_parse_records_rejects_non_array() {
        assert!(matches!(
            parse_records(br#"{"company_number":"1"}"#, None),
            Err(DatasetError::Json(_))
        ));
    }

    #[tokio::test]
    async fn test_load_fixture_file() {
        let client = reqwest::Client::new();
        let records = load(&client, &DatasetSource::File(fixture()), None)
            .await
            .unwrap();
        assert_eq!(records.len(), 6);
        assert_eq!(records[0].company_number.as_deref(), Some("123"));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let source = DatasetSource::File(PathBuf::from("/nonexistent/pscs.json"));
        let result = load(&reqwest::Client::new(), &source, Some(2)).await;
        assert!(matches!(result, Err(DatasetError::Io(_))));
    }
}
