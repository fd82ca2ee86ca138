use regex::Regex;

/// Converts a bucket display-name into the DNS-safe lowercase token used as
/// its storage-name (§3 Bucket invariant, §8 "slug determinism").
pub fn slugify(text: &str) -> String {
    let lower = text.to_lowercase().replace(' ', "-");
    let non_slug = Regex::new(r"[^a-z0-9\-]").unwrap();
    let stripped = non_slug.replace_all(&lower, "");
    let multi_hyphen = Regex::new(r"-+").unwrap();
    let collapsed = multi_hyphen.replace_all(&stripped, "-");
    collapsed.trim_matches('-').to_string()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Docs"), "docs");
        assert_eq!(slugify("My Documents!"), "my-documents");
        assert_eq!(slugify("  leading and trailing  "), "leading-and-trailing");
        assert_eq!(slugify("a---b"), "a-b");
        assert_eq!(slugify("Ünïcödé"), "nc");
    }

    #[test]
    fn test_slugify_deterministic() {
        assert_eq!(slugify("Project Files"), slugify("Project Files"));
    }
}
