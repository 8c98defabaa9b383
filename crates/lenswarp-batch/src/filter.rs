//! Frame-name filtering.

/// Selects frames whose name starts with `prefix` and ends with `suffix`.
///
/// Empty strings match everything.
///
/// ```rust
/// use lenswarp_batch::FrameFilter;
///
/// let filter = FrameFilter::new("cam0_", "");
/// assert!(filter.matches("cam0_0001"));
/// assert!(!filter.matches("cam1_0001"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameFilter {
    /// Required name prefix.
    pub prefix: String,
    /// Required name suffix.
    pub suffix: String,
}

impl FrameFilter {
    /// Creates a filter.
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    /// Returns `true` if `name` passes the filter.
    #[inline]
    pub fn matches(&self, name: &str) -> bool {
        name.starts_with(&self.prefix) && name.ends_with(&self.suffix)
    }

    /// Returns `true` if the filter accepts every name.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.prefix.is_empty() && self.suffix.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAMES: [&str; 3] = ["a_1", "b_1", "a_2"];

    fn apply(filter: &FrameFilter) -> Vec<&'static str> {
        NAMES.iter().copied().filter(|n| filter.matches(n)).collect()
    }

    #[test]
    fn test_prefix() {
        assert_eq!(apply(&FrameFilter::new("a", "")), vec!["a_1", "a_2"]);
    }

    #[test]
    fn test_suffix() {
        assert_eq!(apply(&FrameFilter::new("", "_1")), vec!["a_1", "b_1"]);
    }

    #[test]
    fn test_prefix_and_suffix() {
        assert_eq!(apply(&FrameFilter::new("a", "_1")), vec!["a_1"]);
    }

    #[test]
    fn test_empty_matches_all() {
        let filter = FrameFilter::default();
        assert!(filter.is_empty());
        assert_eq!(apply(&filter), NAMES.to_vec());
    }
}
