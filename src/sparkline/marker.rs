//! Marker class matching
//!
//! The marker has to be a whole class token: `"small sparkline"` matches,
//! `"sparkline-extra"` and `"mysparkline"` do not.

/// Default marker class for sparkline sources
pub const DEFAULT_MARKER: &str = "sparkline";

pub fn has_marker(class_attr: &str, marker: &str) -> bool {
    if marker.is_empty() {
        return false;
    }
    class_attr
        .split_ascii_whitespace()
        .any(|token| token == marker)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_class() {
        assert!(has_marker("sparkline", "sparkline"));
    }

    #[test]
    fn test_among_other_classes() {
        assert!(has_marker("small sparkline muted", "sparkline"));
        assert!(has_marker("\tsparkline\n", "sparkline"));
    }

    #[test]
    fn test_prefix_of_longer_class_rejected() {
        assert!(!has_marker("sparkline-extra", "sparkline"));
        assert!(!has_marker("sparklines", "sparkline"));
    }

    #[test]
    fn test_suffix_of_longer_class_rejected() {
        assert!(!has_marker("mysparkline", "sparkline"));
    }

    #[test]
    fn test_empty_inputs() {
        assert!(!has_marker("", "sparkline"));
        assert!(!has_marker("sparkline", ""));
    }
}
