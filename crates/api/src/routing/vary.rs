//! Vary header patching
//!
//! Adds header names to a response's `Vary` list without disturbing the
//! entries a handler (or another layer) already set.

use std::collections::HashSet;

use axum::http::{header::VARY, HeaderMap, HeaderValue};

/// Add `new_headers` to the `Vary` header of `headers`
///
/// Existing names keep their order and casing, names already present
/// (compared case-insensitively) are not repeated, and a `*` anywhere
/// collapses the whole header to `*`.
pub fn patch_vary_headers(headers: &mut HeaderMap, new_headers: &[&str]) {
    let mut vary: Vec<String> = Vec::new();
    let mut opaque = false;
    for value in headers.get_all(VARY) {
        match value.to_str() {
            Ok(value) => vary.extend(
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|h| !h.is_empty())
                    .map(String::from),
            ),
            Err(_) => {
                tracing::warn!(value = ?value, "Non-ASCII Vary header left in place");
                opaque = true;
            }
        }
    }

    let mut existing: HashSet<String> = vary.iter().map(|h| h.to_ascii_lowercase()).collect();
    let missing: Vec<&str> = new_headers
        .iter()
        .copied()
        .filter(|header| existing.insert(header.to_ascii_lowercase()))
        .collect();

    // Opaque existing value: keep every line and add the missing names on their own lines
    if opaque {
        if !existing.contains("*") {
            append_separately(headers, &missing);
        }
        return;
    }

    vary.extend(missing.into_iter().map(String::from));

    let value = if vary.iter().any(|h| h == "*") {
        "*".to_string()
    } else {
        vary.join(", ")
    };

    match HeaderValue::from_str(&value) {
        Ok(value) => {
            headers.insert(VARY, value);
        }
        Err(e) => tracing::warn!(value = %value, error = %e, "Invalid Vary header value; not patched"),
    }
}

fn append_separately(headers: &mut HeaderMap, names: &[&str]) {
    for header in names {
        match HeaderValue::from_str(header) {
            Ok(value) => {
                headers.append(VARY, value);
            }
            Err(e) => tracing::warn!(header = %header, error = %e, "Invalid Vary header name"),
        }
    }
}
