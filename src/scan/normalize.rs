//! Target URL canonicalisation and on-disk naming.

use url::Url;

/// Canonicalise a raw target into a base URL with a scheme and a trailing
/// slash, ready for relative dictionary joins.
///
/// Targets are frequently bare hosts on legacy infrastructure, so a missing
/// scheme defaults to plain `http://` rather than assuming TLS. Returns
/// `None` for empty or whitespace-only input; anything else is accepted here
/// and left to fail at connect time.
pub fn normalize_base_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut base = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    };
    if !base.ends_with('/') {
        base.push('/');
    }
    Some(base)
}

/// Directory name grouping one host's downloads: `host` or `host_port`.
pub fn host_tag(base: &Url) -> String {
    let host = base.host_str().unwrap_or("unknown-host");
    match base.port() {
        Some(port) => format!("{}_{}", host, port),
        None => host.to_string(),
    }
}

/// File name for a downloaded artifact: the final URL without its scheme,
/// with path separators flattened to underscores.
pub fn archive_file_name(final_url: &Url) -> String {
    let raw = final_url.as_str();
    let without_scheme = raw
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(raw);
    without_scheme.replace('/', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_host_gets_scheme_and_slash() {
        assert_eq!(
            normalize_base_url("a.example"),
            Some("http://a.example/".to_string())
        );
    }

    #[test]
    fn existing_scheme_is_never_upgraded() {
        assert_eq!(
            normalize_base_url("https://a.example"),
            Some("https://a.example/".to_string())
        );
        assert_eq!(
            normalize_base_url("http://a.example/app"),
            Some("http://a.example/app/".to_string())
        );
    }

    #[test]
    fn trailing_slash_not_doubled() {
        assert_eq!(
            normalize_base_url("a.example/"),
            Some("http://a.example/".to_string())
        );
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        assert_eq!(
            normalize_base_url("  a.example:8080  "),
            Some("http://a.example:8080/".to_string())
        );
    }

    #[test]
    fn blank_input_yields_none() {
        assert_eq!(normalize_base_url(""), None);
        assert_eq!(normalize_base_url("   \t"), None);
    }

    #[test]
    fn host_tag_flattens_port_colon() {
        let with_port = Url::parse("http://a.example:8080/").unwrap();
        assert_eq!(host_tag(&with_port), "a.example_8080");

        let default_port = Url::parse("http://a.example/").unwrap();
        assert_eq!(host_tag(&default_port), "a.example");
    }

    #[test]
    fn archive_name_strips_scheme_and_flattens_path() {
        let url = Url::parse("http://a.example/dumps/db.sql").unwrap();
        assert_eq!(archive_file_name(&url), "a.example_dumps_db.sql");

        let with_port = Url::parse("http://a.example:8080/site.zip").unwrap();
        assert_eq!(archive_file_name(&with_port), "a.example:8080_site.zip");
    }
}
