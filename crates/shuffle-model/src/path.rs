//! Helpers for protocol-style paths
//!
//! File-sharing protocols report paths such as `\Sites\docs\report.doc`.
//! Both `\` and `/` are accepted as separators; names are compared without
//! regard to case, matching the protocol's own semantics.

const SEPARATORS: [char; 2] = ['\\', '/'];

/// Final component of `path`.
pub fn file_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches(SEPARATORS);
    match trimmed.rfind(SEPARATORS) {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

/// Everything before the final component, without a trailing separator.
///
/// Returns an empty string for a bare name.
pub fn parent_path(path: &str) -> &str {
    let trimmed = path.trim_end_matches(SEPARATORS);
    match trimmed.rfind(SEPARATORS) {
        Some(idx) => &trimmed[..idx],
        None => "",
    }
}

/// Join a parent path and a name using the parent's separator style.
pub fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        return name.to_string();
    }
    let separator = if parent.contains('/') && !parent.contains('\\') {
        '/'
    } else {
        '\\'
    };
    format!("{}{}{}", parent.trim_end_matches(SEPARATORS), separator, name)
}

/// Case-insensitive name equality.
pub fn names_match(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

/// Case-insensitive path equality that ignores the separator style.
pub fn paths_match(a: &str, b: &str) -> bool {
    let normalize = |p: &str| p.replace('/', "\\").to_lowercase();
    normalize(a) == normalize(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(r"\docs\report.doc", "report.doc")]
    #[case("docs/report.doc", "report.doc")]
    #[case("report.doc", "report.doc")]
    #[case(r"\docs\", "docs")]
    fn test_file_name(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(file_name(path), expected);
    }

    #[rstest]
    #[case(r"\docs\report.doc", r"\docs")]
    #[case("docs/sub/report.doc", "docs/sub")]
    #[case("report.doc", "")]
    fn test_parent_path(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(parent_path(path), expected);
    }

    #[test]
    fn test_join_path_keeps_separator_style() {
        assert_eq!(join_path(r"\docs", "a.txt"), r"\docs\a.txt");
        assert_eq!(join_path("docs/sub", "a.txt"), "docs/sub/a.txt");
        assert_eq!(join_path("", "a.txt"), "a.txt");
    }

    #[test]
    fn test_names_match_ignores_case() {
        assert!(names_match("Report.DOC", "report.doc"));
        assert!(!names_match("report.doc", "report.docx"));
    }

    #[test]
    fn test_paths_match_ignores_separator() {
        assert!(paths_match(r"\Docs\A.txt", "/docs/a.txt"));
        assert!(!paths_match(r"\docs\a.txt", r"\other\a.txt"));
    }
}
