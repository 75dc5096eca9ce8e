//! File-name patterns used by scenario triggers

use regex::{Regex, RegexBuilder};
use std::fmt;

/// Case-insensitive regular expression that must match a whole name
#[derive(Debug, Clone)]
pub struct FilePattern {
    source: String,
    regex: Option<Regex>,
}

impl FilePattern {
    pub fn new(source: &str) -> std::result::Result<Self, regex::Error> {
        let regex = RegexBuilder::new(&format!("^(?:{source})$"))
            .case_insensitive(true)
            .build()?;
        Ok(Self {
            source: source.to_string(),
            regex: Some(regex),
        })
    }

    /// A pattern matching every name
    pub fn any() -> Self {
        Self {
            source: ".*".to_string(),
            regex: None,
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        match &self.regex {
            Some(regex) => regex.is_match(name),
            None => true,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for FilePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(r"~WRD.*\.TMP", "~WRD0001.TMP", true)]
    #[case(r"~WRD.*\.TMP", "~wrd0001.tmp", true)]
    #[case(r"~WRD.*\.TMP", "x~WRD0001.TMP", false)]
    #[case(r"~WRD.*\.TMP", "~WRD0001.TMP.bak", false)]
    #[case(r"[0-9A-F]{6,8}\.tmp", "788A1D3D.tmp", true)]
    #[case(r"[0-9A-F]{6,8}\.tmp", "788A1D3D9.tmp", false)]
    #[case(r"[0-9A-F]{6,8}\.tmp", "GGGGGG.tmp", false)]
    #[case(r".*~", "notes.txt~", true)]
    #[case(r".*~", "~notes.txt", false)]
    #[case(r".*\.(rtf|txt)", "a.RTF", true)]
    #[case(r".*\.(rtf|txt)", "a.rtfx", false)]
    fn test_pattern_is_anchored_and_case_insensitive(
        #[case] pattern: &str,
        #[case] name: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(FilePattern::new(pattern).unwrap().matches(name), expected);
    }

    #[test]
    fn test_alternation_is_anchored_as_a_group() {
        let pattern = FilePattern::new("a|b").unwrap();
        assert!(pattern.matches("a"));
        assert!(!pattern.matches("ab"));
    }

    #[test]
    fn test_any_matches_everything() {
        assert!(FilePattern::any().matches(""));
        assert!(FilePattern::any().matches("anything at all"));
        assert_eq!(FilePattern::any().as_str(), ".*");
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        assert!(FilePattern::new("(unclosed").is_err());
    }
}
