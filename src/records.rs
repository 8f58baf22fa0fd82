use crate::config::Config;
use crate::error::{PcsdlError, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

/// One data record from the spreadsheet export.
#[derive(Debug, Clone)]
pub struct Row {
    /// 1-based position among the data rows, used to give each row its own
    /// scratch directory.
    pub number: usize,
    pub id: String,
    pub video_url: String,
    /// Absent when the export has no caption column.
    pub caption_url: Option<String>,
    /// Absent when the export has no DOI column.
    pub doi: Option<String>,
}

/// Column layout resolved against the header row of the export.
#[derive(Debug, Clone)]
pub struct Schema {
    pub headers: Vec<String>,
    pub id_idx: usize,
    pub video_idx: usize,
    pub caption_idx: Option<usize>,
    pub doi_idx: Option<usize>,
}

impl Schema {
    /// Locate the configured columns in the discovered headers.
    ///
    /// The identifier and video columns are required; captions and DOI are
    /// optional and simply disable their features when absent.
    pub fn resolve(headers: &[String], config: &Config) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h == name);

        let id_idx =
            find(&config.id_column).ok_or_else(|| missing_column(&config.id_column, headers))?;
        let video_idx = find(&config.video_column)
            .ok_or_else(|| missing_column(&config.video_column, headers))?;

        Ok(Self {
            headers: headers.to_vec(),
            id_idx,
            video_idx,
            caption_idx: find(&config.caption_column),
            doi_idx: find(&config.doi_column),
        })
    }

    pub fn has_captions(&self) -> bool {
        self.caption_idx.is_some()
    }

    pub fn has_doi(&self) -> bool {
        self.doi_idx.is_some()
    }
}

fn missing_column(name: &str, headers: &[String]) -> PcsdlError {
    PcsdlError::Schema(format!(
        "Column header {:?} is not in the input data. Discovered headers: {:?}. \
         Double-check the column headers and ensure the file is UTF-8 encoded.",
        name, headers
    ))
}

/// Read the export at `path` and parse it into rows.
///
/// Fails before any network activity when a required column is missing.
pub fn load_rows(path: &Path, config: &Config) -> Result<(Schema, Vec<Row>)> {
    let raw = fs::read_to_string(path)?;
    parse_rows(&raw, config)
}

/// Parse raw CSV text (UTF-8, with or without BOM) into ordered rows.
pub fn parse_rows(raw: &str, config: &Config) -> Result<(Schema, Vec<Row>)> {
    // PCS exports carry a UTF-8 BOM; the csv reader would fold it into the
    // first header name.
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(raw.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let schema = Schema::resolve(&headers, config)?;

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let get = |idx: usize| record.get(idx).unwrap_or("").trim().to_string();

        rows.push(Row {
            number: i + 1,
            id: get(schema.id_idx),
            video_url: get(schema.video_idx),
            caption_url: schema.caption_idx.map(|idx| get(idx)),
            doi: schema.doi_idx.map(|idx| get(idx)),
        });
    }

    debug!("Parsed {} rows from {} columns", rows.len(), headers.len());
    Ok((schema, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            id_column: "Paper ID".to_string(),
            video_column: "Video".to_string(),
            caption_column: "Captions".to_string(),
            doi_column: "DOI".to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn test_parse_basic() {
        let csv = "Paper ID,Video,Captions,DOI\n\
                   p1,http://a/v1.mp4,http://a/c1.srt,10.1145/123.456\n\
                   p2,http://a/v2.mp4,http://a/c2.srt,\n";
        let (schema, rows) = parse_rows(csv, &test_config()).unwrap();

        assert!(schema.has_captions());
        assert!(schema.has_doi());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "p1");
        assert_eq!(rows[0].number, 1);
        assert_eq!(rows[0].video_url, "http://a/v1.mp4");
        assert_eq!(rows[0].caption_url.as_deref(), Some("http://a/c1.srt"));
        assert_eq!(rows[0].doi.as_deref(), Some("10.1145/123.456"));
        assert_eq!(rows[1].doi.as_deref(), Some(""));
    }

    #[test]
    fn test_parse_strips_bom() {
        let csv = "\u{feff}Paper ID,Video\np1,http://a/v1.mp4\n";
        let (schema, rows) = parse_rows(csv, &test_config()).unwrap();

        assert_eq!(schema.id_idx, 0);
        assert_eq!(rows[0].id, "p1");
        assert!(!schema.has_captions());
    }

    #[test]
    fn test_missing_id_column_reports_headers() {
        let csv = "Submission,Video\ns1,http://a/v1.mp4\n";
        let err = parse_rows(csv, &test_config()).unwrap_err();

        match err {
            PcsdlError::Schema(msg) => {
                assert!(msg.contains("Paper ID"));
                assert!(msg.contains("Submission"));
            }
            other => panic!("Expected Schema error, got: {other}"),
        }
    }

    #[test]
    fn test_missing_video_column_is_fatal() {
        let csv = "Paper ID,Captions\np1,http://a/c1.srt\n";
        assert!(parse_rows(csv, &test_config()).is_err());
    }

    #[test]
    fn test_missing_optional_columns() {
        let csv = "Paper ID,Video\np1,http://a/v1.mp4\n";
        let (schema, rows) = parse_rows(csv, &test_config()).unwrap();

        assert!(!schema.has_captions());
        assert!(!schema.has_doi());
        assert_eq!(rows[0].caption_url, None);
        assert_eq!(rows[0].doi, None);
    }

    #[test]
    fn test_preserves_input_order() {
        let csv = "Paper ID,Video\nz9,u\na1,u\nm5,u\n";
        let (_, rows) = parse_rows(csv, &test_config()).unwrap();

        let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["z9", "a1", "m5"]);
    }
}
