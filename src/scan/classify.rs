//! Heuristic backup classification.
//!
//! Decides, from response metadata alone, whether a probed URL is plausibly a
//! real backup artifact. The decision is a pure function of the status code,
//! the declared content type and length, and the final post-redirect URL, so
//! it is fully testable without any network.

/// URL suffixes that mark a response as a candidate backup artifact.
pub const BACKUP_SUFFIXES: &[&str] = &[
    ".bak", ".zip", ".rar", ".7z", ".tar", ".tar.gz", ".tgz", ".sql", ".db", ".old", ".backup",
];

/// Declared-length ceiling under which a `text/html` response is treated as a
/// disguised error page rather than a real file.
const HTML_DECOY_MAX_LEN: u64 = 2 * 1024 * 1024;

/// Outcome of classifying one response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Plausibly a real backup artifact; worth persisting.
    Match,
    /// Status other than 200/206.
    StatusRejected,
    /// Final URL does not carry a backup-like suffix.
    SuffixMismatch,
    /// Small response declared as HTML; almost certainly a soft-404 page
    /// served with a success status.
    HtmlDecoy,
}

/// Classify one response.
///
/// The suffix check runs against the final URL, after redirects, so a server
/// that bounces a guessed path to an unrelated HTML page does not count as a
/// hit. 206 is accepted alongside 200 because some servers answer streaming
/// reads with partial content.
///
/// `declared_len` is the `Content-Length` header value, with missing or
/// unparsable headers collapsed to 0. That makes an HTML response without a
/// declared length always a decoy, while a large declared HTML body (at least
/// 2 MiB) is accepted as a real file served with a wrong type.
pub fn classify(status: u16, content_type: &str, declared_len: u64, final_url: &str) -> Verdict {
    if status != 200 && status != 206 {
        return Verdict::StatusRejected;
    }

    if !looks_like_backup(final_url) {
        return Verdict::SuffixMismatch;
    }

    if content_type.to_ascii_lowercase().contains("text/html") && declared_len < HTML_DECOY_MAX_LEN
    {
        return Verdict::HtmlDecoy;
    }

    Verdict::Match
}

/// Case-insensitive suffix check against the backup suffix set.
pub fn looks_like_backup(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    BACKUP_SUFFIXES.iter().any(|s| lower.ends_with(s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_200_and_206_pass_the_status_gate() {
        for status in [201, 204, 301, 302, 403, 404, 500, 503] {
            assert_eq!(
                classify(status, "application/zip", 1000, "http://x/backup.zip"),
                Verdict::StatusRejected,
                "status {} must be rejected",
                status
            );
        }
        assert_eq!(
            classify(200, "application/zip", 1000, "http://x/backup.zip"),
            Verdict::Match
        );
        assert_eq!(
            classify(206, "application/zip", 1000, "http://x/backup.zip"),
            Verdict::Match
        );
    }

    #[test]
    fn suffix_is_checked_on_the_final_url() {
        assert_eq!(
            classify(200, "application/octet-stream", 1000, "http://x/login"),
            Verdict::SuffixMismatch
        );
        assert_eq!(
            classify(200, "application/octet-stream", 1000, "http://x/index.html"),
            Verdict::SuffixMismatch
        );
    }

    #[test]
    fn suffix_match_is_case_insensitive() {
        assert_eq!(
            classify(200, "application/octet-stream", 1000, "http://x/SITE.ZIP"),
            Verdict::Match
        );
        assert!(looks_like_backup("http://x/dump.Tar.Gz"));
    }

    #[test]
    fn small_html_on_a_backup_url_is_a_decoy() {
        assert_eq!(
            classify(200, "text/html; charset=utf-8", 1000, "http://x/backup.zip"),
            Verdict::HtmlDecoy
        );
    }

    #[test]
    fn large_html_is_accepted_as_a_mislabelled_file() {
        assert_eq!(
            classify(
                200,
                "text/html; charset=utf-8",
                3 * 1024 * 1024,
                "http://x/backup.zip"
            ),
            Verdict::Match
        );
    }

    #[test]
    fn html_without_declared_length_is_a_decoy() {
        // Missing Content-Length collapses to 0 upstream.
        assert_eq!(
            classify(200, "text/html", 0, "http://x/backup.zip"),
            Verdict::HtmlDecoy
        );
    }

    #[test]
    fn non_html_types_are_unaffected_by_length() {
        assert_eq!(
            classify(200, "application/octet-stream", 0, "http://x/db.sql"),
            Verdict::Match
        );
    }

    #[test]
    fn every_configured_suffix_matches() {
        for suffix in BACKUP_SUFFIXES {
            let url = format!("http://x/artifact{}", suffix);
            assert!(looks_like_backup(&url), "suffix {} must match", suffix);
        }
    }
}
