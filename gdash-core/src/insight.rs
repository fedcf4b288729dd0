//! City correlation over free-text insights.
//!
//! Insight bodies are produced by an external generator; the only structure
//! we rely on is the conventional leading clause `"Em <City>, ..."`. Matching
//! is best-effort: anything that doesn't fit degrades to "no match".

use regex::Regex;
use std::sync::OnceLock;
use unicode_normalization::UnicodeNormalization;

use crate::model::WeatherInsight;

fn city_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^Em\s+([^,]+),").expect("city pattern must compile"))
}

/// Comparison key for city names: NFD-decompose, strip combining diacritical
/// marks, lowercase, trim. Never displayed, only compared.
pub fn normalize(s: &str) -> String {
    let stripped: String = s.nfd().filter(|c| !('\u{0300}'..='\u{036f}').contains(c)).collect();
    stripped.to_lowercase().trim().to_string()
}

/// Extract the leading city from an insight body, or `None` when the text
/// doesn't start with the `"Em <city>,"` pattern. Stops at the first comma.
pub fn extract_city(text: &str) -> Option<&str> {
    city_re().captures(text).and_then(|caps| caps.get(1)).map(|m| m.as_str().trim())
}

/// Pick the insight for `target_city` out of a fetched window, scanning in
/// the given order and comparing normalized extracted cities. With no target,
/// pick the most recently generated insight regardless of list order (the
/// backend's `latest/` endpoint stays authoritative when it is reachable).
///
/// `None` means "not enough data", never a fault. The caller decides how big
/// the scanned window is; matches outside it are simply not found.
pub fn select_insight<'a>(
    insights: &'a [WeatherInsight],
    target_city: Option<&str>,
) -> Option<&'a WeatherInsight> {
    match target_city {
        None => insights.iter().max_by_key(|insight| insight.generated_at),
        Some(city) => {
            let wanted = normalize(city);
            insights.iter().find(|insight| {
                extract_city(&insight.text).is_some_and(|found| normalize(found) == wanted)
            })
        }
    }
}
