use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;
use url::Url;

fn script_or_style() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)\s*>")
            .expect("static pattern")
    })
}

fn tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("static pattern"))
}

fn numeric_entity() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"&#(x[0-9a-fA-F]+|[0-9]+);").expect("static pattern"))
}

fn href() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)href\s*=\s*["']([^"'#][^"']*)["']"#).expect("static pattern")
    })
}

/// Markup to plain text: drops scripts and styles, replaces tags with
/// spaces, decodes common entities and collapses whitespace.
pub fn clean_html(html: &str) -> String {
    let without_code = script_or_style().replace_all(html, " ");
    let without_tags = tag().replace_all(&without_code, " ");
    let decoded = decode_entities(&without_tags);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entities(text: &str) -> String {
    let named = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&hellip;", "...");
    let numeric = numeric_entity().replace_all(&named, |caps: &regex::Captures| {
        let raw = &caps[1];
        let code = match raw.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => raw.parse::<u32>().ok(),
        };
        code.and_then(char::from_u32)
            .map(|c| c.to_string())
            .unwrap_or_default()
    });
    // Last so that "&amp;lt;" stays "&lt;".
    numeric.replace("&amp;", "&")
}

/// Matches whole absolute URL tokens whose host starts with the site host,
/// with or without `www.`. The host boundary is checked by
/// [`resolve_internal`], so `https://shop.example.evil.com/` is a candidate
/// here but never an internal link.
pub fn site_url_pattern(host: &str) -> Result<Regex, regex::Error> {
    let bare = host.trim_start_matches("www.");
    Regex::new(&format!(
        r#"(?i)https?://(?:www\.)?{}[^"'<>\s]*"#,
        regex::escape(bare)
    ))
}

/// Every link target found in `html`: `href` attribute values plus bare
/// occurrences of the site URL. Deduplicated, unresolved.
pub fn extract_links(html: &str, site_pattern: &Regex) -> BTreeSet<String> {
    let mut links: BTreeSet<String> = href()
        .captures_iter(html)
        .map(|caps| caps[1].trim().to_string())
        .filter(|link| !link.is_empty())
        .collect();
    for m in site_pattern.find_iter(html) {
        links.insert(m.as_str().to_string());
    }
    links
}

/// Resolves `link` against `base` and keeps it only when it is an http(s)
/// URL on `site_host`.
pub fn resolve_internal(link: &str, base: &Url, site_host: &str) -> Option<Url> {
    let resolved = base.join(link).ok()?;
    if !matches!(resolved.scheme(), "http" | "https") {
        return None;
    }
    let host = resolved.host_str()?;
    if same_host(host, site_host) {
        Some(resolved)
    } else {
        None
    }
}

pub fn same_host(a: &str, b: &str) -> bool {
    let a = a.to_ascii_lowercase();
    let b = b.to_ascii_lowercase();
    a.trim_start_matches("www.") == b.trim_start_matches("www.")
}

/// Lowercase path without query, fragment or trailing slash; `/` for the
/// site root.
pub fn canonical_path(url: &Url) -> String {
    let path = url.path().trim_end_matches('/').to_lowercase();
    if path.is_empty() {
        "/".to_string()
    } else {
        path
    }
}

/// Structural richness of a body in [0, 1]: length, heading structure,
/// media, lists and schema markup.
pub fn depth_score(html: &str, word_count: usize) -> f64 {
    let mut score: f64 = 0.0;

    if word_count > 2000 {
        score += 0.3;
    } else if word_count > 1000 {
        score += 0.2;
    } else if word_count > 500 {
        score += 0.1;
    }

    let h2 = html.matches("<h2").count() + html.matches("## ").count();
    let h3 = html.matches("<h3").count() + html.matches("### ").count();
    if h2 > 3 {
        score += 0.2;
    }
    if h3 > 5 {
        score += 0.1;
    }

    if html.contains("<img") || html.contains("[gallery") {
        score += 0.1;
    }
    if html.contains("<ul") || html.contains("<ol") || html.contains("- ") {
        score += 0.1;
    }
    if html.contains("itemtype") || html.contains("@type") {
        score += 0.2;
    }

    score.min(1.0)
}

/// RFC 3339, WordPress-style local timestamps and plain dates.
pub fn parse_published(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}
