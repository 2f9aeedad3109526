const MAX_SLUG_LEN: usize = 60;
const FALLBACK_SLUG: &str = "contract-analysis";

/// Filesystem-safe slug: ASCII alphanumerics lowercased, every other run of
/// characters collapsed to a single hyphen. Non-ASCII letters are dropped
/// rather than transliterated.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len().min(MAX_SLUG_LEN));
    let mut pending_separator = false;
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
        if slug.len() >= MAX_SLUG_LEN {
            break;
        }
    }
    slug.truncate(MAX_SLUG_LEN);
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

pub fn suggested_filename(contract_type: &str) -> String {
    format!("{}.pdf", slugify(contract_type))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_punctuation_and_lowercases() {
        assert_eq!(slugify("Contratto di Affitto!!"), "contratto-di-affitto");
    }

    #[test]
    fn empty_and_symbol_only_inputs_fall_back() {
        assert_eq!(slugify(""), FALLBACK_SLUG);
        assert_eq!(slugify("!!! ???"), FALLBACK_SLUG);
    }

    #[test]
    fn long_inputs_are_truncated_without_trailing_hyphen() {
        let input = "word ".repeat(40);
        let slug = slugify(&input);
        assert!(slug.len() <= MAX_SLUG_LEN);
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn filename_has_pdf_extension() {
        assert_eq!(suggested_filename("NDA 2024"), "nda-2024.pdf");
    }
}
