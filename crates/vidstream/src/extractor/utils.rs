use regex::Regex;

use crate::extractor::error::ExtractorError;

#[inline]
pub fn capture_group_1<'a>(re: &Regex, input: &'a str) -> Option<&'a str> {
    re.captures(input)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

#[inline]
pub fn capture_group_1_or_invalid_url<'a>(
    re: &Regex,
    input: &'a str,
) -> Result<&'a str, ExtractorError> {
    capture_group_1(re, input).ok_or_else(|| ExtractorError::InvalidUrl(input.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::LazyLock;

    static ID_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"id=([^&]+)").unwrap());

    #[test]
    fn test_capture_group_1() {
        assert_eq!(
            capture_group_1(&ID_REGEX, "https://x.example/streaming.php?id=MTE3&token=z"),
            Some("MTE3")
        );
        assert_eq!(capture_group_1(&ID_REGEX, "https://x.example/"), None);
    }

    #[test]
    fn test_capture_group_1_or_invalid_url() {
        let err = capture_group_1_or_invalid_url(&ID_REGEX, "https://x.example/").unwrap_err();
        assert!(matches!(err, ExtractorError::InvalidUrl(_)));
    }
}
