use csv::StringRecord;

/// Normalizes every header name of a CSV file.
pub fn normalize_headers(headers: &StringRecord) -> Vec<String> {
    headers.iter().map(normalize_header).collect()
}

// Spreadsheet exports often prefix the first header with a UTF-8 BOM.
fn normalize_header(name: &str) -> String {
    name.trim().trim_start_matches('\u{feff}').trim().to_string()
}
