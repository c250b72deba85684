// src/utils.rs - Pure helpers: duration normalization, URL parsing, filenames
use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

lazy_static! {
    // ISO 8601 duration as YouTube emits it: P[nD]T[nH][nM][nS]
    static ref ISO_DURATION_RE: Regex =
        Regex::new(r"^P(?:(\d+)D)?T?(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?$").unwrap();
}

/// Normalize an ISO 8601 duration token into zero-padded `HH:MM:SS`.
///
/// Days fold into the hour field, so `P1DT1H` becomes `25:00:00`. A token
/// that does not parse, including components too large to represent, yields
/// an empty string, never an error.
pub fn iso_to_hms(iso: &str) -> String {
    let caps = match ISO_DURATION_RE.captures(iso) {
        Some(caps) => caps,
        None => return String::new(),
    };

    let group = |i: usize| -> Option<u64> {
        match caps.get(i) {
            Some(m) => m.as_str().parse().ok(),
            None => Some(0),
        }
    };

    let total = match (group(1), group(2), group(3), group(4)) {
        (Some(d), Some(h), Some(m), Some(s)) => d
            .checked_mul(86_400)
            .and_then(|t| t.checked_add(h.checked_mul(3_600)?))
            .and_then(|t| t.checked_add(m.checked_mul(60)?))
            .and_then(|t| t.checked_add(s)),
        _ => None,
    };
    match total {
        Some(total) => format!(
            "{:02}:{:02}:{:02}",
            total / 3_600,
            (total % 3_600) / 60,
            total % 60
        ),
        None => String::new(),
    }
}

/// Extract the playlist id from a YouTube playlist URL.
///
/// Accepts absolute http/https URLs on youtube.com (with or without a `www.`
/// or `m.` prefix) whose path is the playlist view. Anything else - missing
/// scheme, foreign host, wrong path, missing `list` parameter - yields `None`
/// so callers can report a per-item validation failure instead of aborting.
pub fn parse_playlist_url(input: &str) -> Option<String> {
    let url = Url::parse(input.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    match url.host_str() {
        Some("www.youtube.com") | Some("youtube.com") | Some("m.youtube.com") => {}
        _ => return None,
    }
    if url.path() != "/playlist" {
        return None;
    }
    url.query_pairs()
        .find(|(key, _)| key == "list")
        .map(|(_, value)| value.into_owned())
        .filter(|id| !id.is_empty())
}

/// Sanitize a playlist title into a safe CSV filename stem: keep
/// alphanumerics, spaces, hyphens and underscores, drop everything else.
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Collapse newlines in a video description to single spaces and trim.
pub fn clean_description(description: &str) -> String {
    description
        .replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_to_hms_basic() {
        assert_eq!(iso_to_hms("PT1H2M3S"), "01:02:03");
        assert_eq!(iso_to_hms("PT15M"), "00:15:00");
        assert_eq!(iso_to_hms("PT45S"), "00:00:45");
        assert_eq!(iso_to_hms("PT3H"), "03:00:00");
    }

    #[test]
    fn test_iso_to_hms_days_fold_into_hours() {
        assert_eq!(iso_to_hms("P1DT1H"), "25:00:00");
        assert_eq!(iso_to_hms("P2DT3H4M5S"), "51:04:05");
    }

    #[test]
    fn test_iso_to_hms_normalizes_overflow() {
        // YouTube should never emit these, but the math stays well-formed
        assert_eq!(iso_to_hms("PT75M"), "01:15:00");
        assert_eq!(iso_to_hms("PT3600S"), "01:00:00");
    }

    #[test]
    fn test_iso_to_hms_invalid_is_empty() {
        assert_eq!(iso_to_hms(""), "");
        assert_eq!(iso_to_hms("garbage"), "");
        assert_eq!(iso_to_hms("1h2m"), "");
        assert_eq!(iso_to_hms("PT1H2M3S extra"), "");
    }

    #[test]
    fn test_iso_to_hms_overflowing_component_is_empty() {
        // Matches the grammar but is not a representable duration
        assert_eq!(iso_to_hms("PT99999999999999999999999S"), "");
        assert_eq!(iso_to_hms("P99999999999999999999999DT1S"), "");
        assert_eq!(iso_to_hms(&format!("P{}D", u64::MAX)), "");
    }

    #[test]
    fn test_parse_playlist_url_accepts_canonical_hosts() {
        for host in ["www.youtube.com", "youtube.com", "m.youtube.com"] {
            let url = format!("https://{}/playlist?list=PLabc123", host);
            assert_eq!(parse_playlist_url(&url).as_deref(), Some("PLabc123"));
        }
        assert_eq!(
            parse_playlist_url("http://www.youtube.com/playlist?index=1&list=PLxyz").as_deref(),
            Some("PLxyz")
        );
    }

    #[test]
    fn test_parse_playlist_url_rejects_everything_else() {
        assert_eq!(parse_playlist_url("not a url"), None);
        assert_eq!(parse_playlist_url("www.youtube.com/playlist?list=PL1"), None); // no scheme
        assert_eq!(parse_playlist_url("https://vimeo.com/playlist?list=PL1"), None);
        assert_eq!(parse_playlist_url("https://www.youtube.com/watch?v=abc"), None);
        assert_eq!(parse_playlist_url("https://www.youtube.com/playlist"), None);
        assert_eq!(parse_playlist_url("https://www.youtube.com/playlist?list="), None);
        assert_eq!(parse_playlist_url("ftp://www.youtube.com/playlist?list=PL1"), None);
    }

    #[test]
    fn test_sanitize_title() {
        assert_eq!(sanitize_title("Linear Algebra"), "Linear Algebra");
        assert_eq!(sanitize_title("Ch. 1: Intro / Basics?"), "Ch 1 Intro  Basics");
        assert_eq!(sanitize_title("data_science-2024"), "data_science-2024");
        assert_eq!(sanitize_title("***"), "");
    }

    #[test]
    fn test_clean_description() {
        assert_eq!(clean_description("line one\nline two\n"), "line one line two");
        assert_eq!(clean_description("a\r\nb\rc"), "a b c");
        assert_eq!(clean_description("  padded  "), "padded");
    }
}
