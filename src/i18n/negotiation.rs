//! Active language detection.
//!
//! # Order
//! 1. `?language=` query parameter
//! 2. Path prefix (`/de/...`), when prefix routing is used
//! 3. `Accept-Language`, by quality, exact code before primary subtag
//! 4. Default language
//!
//! Only configured languages are ever returned.

use crate::i18n::LanguageSettings;

/// Pick the active language for a request.
pub fn language_from_request(
    settings: &LanguageSettings,
    path: &str,
    query_language: Option<&str>,
    accept_language: Option<&str>,
) -> String {
    if let Some(lang) = query_language.filter(|l| settings.is_configured(l)) {
        return lang.to_string();
    }

    if settings.uses_prefix_patterns() {
        let first = path.trim_start_matches('/').split('/').next().unwrap_or("");
        if settings.is_configured(first) {
            return first.to_string();
        }
    }

    if let Some(header) = accept_language {
        for tag in parse_accept_language(header) {
            if settings.is_configured(&tag) {
                return tag;
            }
            if let Some((primary, _)) = tag.split_once('-') {
                if settings.is_configured(primary) {
                    return primary.to_string();
                }
            }
        }
    }

    settings.default_language().to_string()
}

/// Language tags from an `Accept-Language` header, best first.
/// Tags with `q=0` are dropped; ties keep header order.
pub fn parse_accept_language(header: &str) -> Vec<String> {
    let mut tags: Vec<(String, f32)> = header
        .split(',')
        .filter_map(|part| {
            let mut pieces = part.split(';');
            let tag = pieces.next()?.trim().to_ascii_lowercase();
            if tag.is_empty() || tag == "*" {
                return None;
            }
            let quality = pieces
                .find_map(|p| p.trim().strip_prefix("q="))
                .and_then(|q| q.trim().parse::<f32>().ok())
                .unwrap_or(1.0);
            (quality > 0.0).then_some((tag, quality))
        })
        .collect();
    tags.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    tags.into_iter().map(|(tag, _)| tag).collect()
}
