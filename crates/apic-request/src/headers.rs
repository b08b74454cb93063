//! Header block helpers.
//!
//! Headers travel as a newline-delimited `name: value` block. Names compare
//! case-insensitively.

/// Parse a header block into name/value pairs. Blank lines are skipped.
pub fn parse_headers(block: &str) -> Vec<(String, String)> {
    block
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let (name, value) = line.split_once(':').unwrap_or((line, ""));
            let name = name.trim();
            (!name.is_empty()).then(|| (name.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Serialize pairs into a header block, one `name: value` per line.
pub fn headers_to_string(headers: &[(String, String)]) -> String {
    headers
        .iter()
        .map(|(name, value)| format!("{}: {}", name, value))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn has_header(block: &str, name: &str) -> bool {
    get_header(block, name).is_some()
}

pub fn get_header(block: &str, name: &str) -> Option<String> {
    parse_headers(block)
        .into_iter()
        .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
        .map(|(_, value)| value)
}

/// Set a header, replacing any existing entry with the same name.
///
/// The first matching entry keeps its position; other matches are dropped.
pub fn set_header(block: &str, name: &str, value: &str) -> String {
    let mut headers = parse_headers(block);
    set_header_pair(&mut headers, name, value);
    headers_to_string(&headers)
}

/// In-place variant of [`set_header`] over parsed pairs.
pub fn set_header_pair(headers: &mut Vec<(String, String)>, name: &str, value: &str) {
    let mut replaced = false;
    headers.retain_mut(|(existing, existing_value)| {
        if !existing.eq_ignore_ascii_case(name) {
            return true;
        }
        if replaced {
            return false;
        }
        replaced = true;
        *existing = name.to_string();
        *existing_value = value.to_string();
        true
    });
    if !replaced {
        headers.push((name.to_string(), value.to_string()));
    }
}

pub fn remove_header(block: &str, name: &str) -> String {
    let headers: Vec<_> = parse_headers(block)
        .into_iter()
        .filter(|(existing, _)| !existing.eq_ignore_ascii_case(name))
        .collect();
    headers_to_string(&headers)
}
