use unicode_normalization::UnicodeNormalization;

/// Canonical form of a free-text ingredient name.
///
/// NFD-decompose, drop combining diacritical marks, lowercase, fold anything
/// outside `[a-z0-9 ]` to a space, collapse runs, trim. Two names denote the
/// same ingredient iff their normalized forms are equal. Garbage input
/// normalizes to the empty string and never matches anything.
pub fn normalize_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;
    for ch in raw.nfd() {
        if ('\u{0300}'..='\u{036f}').contains(&ch) {
            continue;
        }
        for lower in ch.to_lowercase() {
            if lower.is_ascii_lowercase() || lower.is_ascii_digit() {
                if pending_space && !out.is_empty() {
                    out.push(' ');
                }
                pending_space = false;
                out.push(lower);
            } else {
                pending_space = true;
            }
        }
    }
    out
}

/// Canonical string form of an opaque id.
///
/// Meal rows and the ingredient catalog were populated by different writers
/// and do not agree on casing or surrounding whitespace, so ids must be
/// folded before any set/intersection operation.
pub fn canonical_id(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_diacritics_and_punctuation() {
        assert_eq!(normalize_name("Cà-chua "), "ca chua");
        assert_eq!(normalize_name("ca chua"), "ca chua");
        assert_eq!(normalize_name("Trứng"), "trung");
        assert_eq!(normalize_name("Hành   tây!"), "hanh tay");
    }

    #[test]
    fn is_idempotent() {
        for raw in ["Cà-chua ", "  Thịt  GÀ  ", "éàü", "a1 b2"] {
            let once = normalize_name(raw);
            assert_eq!(normalize_name(&once), once);
        }
    }

    #[test]
    fn garbage_normalizes_to_empty() {
        assert_eq!(normalize_name(""), "");
        assert_eq!(normalize_name("   "), "");
        assert_eq!(normalize_name("!@#$%"), "");
    }

    #[test]
    fn keeps_digits() {
        assert_eq!(normalize_name("Sữa 2%"), "sua 2");
    }

    #[test]
    fn canonical_id_folds_case_and_whitespace() {
        assert_eq!(canonical_id(" ABC-123 "), "abc-123");
        assert_eq!(canonical_id("abc-123"), "abc-123");
    }
}
