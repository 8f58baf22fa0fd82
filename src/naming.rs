use crate::records::Row;

/// Derive the output file stem for a row's artifacts.
///
/// With DOI naming enabled and a non-empty DOI, the stem is the segment after
/// the last `/` of the DOI; every other case falls back to the submission
/// identifier. Deterministic, no side effects.
pub fn output_name(row: &Row, use_doi: bool) -> String {
    if use_doi {
        if let Some(doi) = row.doi.as_deref() {
            if !doi.is_empty() {
                if let Some(tail) = doi.rsplit('/').next() {
                    return tail.to_string();
                }
            }
        }
    }
    row.id.clone()
}
