//! Tagged integer arguments.
//!
//! Commands accept numeric options glued to a tag, such as `lv90`, `r5`,
//! `4*` or `x100`. [`extract`] pulls every recognised tag out of the
//! argument list and leaves the positional arguments behind.

/// Kinds of tagged integer argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    /// `lv<N>`, `lvl<N>`, `lev<N>` or `level<N>`.
    Level,
    /// `r<N>`.
    Refinement,
    /// `<N>*`.
    Rank,
    /// `x<N>` or `<N>x`.
    Amount,
}

const LEVEL_PREFIXES: [&str; 4] = ["level", "lvl", "lev", "lv"];

/// Recognise one argument.
#[must_use]
pub fn parse_tag(arg: &str) -> Option<(Tag, u32)> {
    let arg = arg.to_ascii_lowercase();
    let digits = |s: &str| -> Option<u32> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        s.parse().ok()
    };

    for prefix in LEVEL_PREFIXES {
        if let Some(n) = arg.strip_prefix(prefix).and_then(digits) {
            return Some((Tag::Level, n));
        }
    }
    if let Some(n) = arg.strip_prefix('r').and_then(digits) {
        return Some((Tag::Refinement, n));
    }
    if let Some(n) = arg.strip_suffix('*').and_then(digits) {
        return Some((Tag::Rank, n));
    }
    if let Some(n) = arg
        .strip_prefix('x')
        .and_then(digits)
        .or_else(|| arg.strip_suffix('x').and_then(digits))
    {
        return Some((Tag::Amount, n));
    }
    None
}

/// Split `args` into recognised tags (in order) and the remaining
/// positional arguments.
#[must_use]
pub fn extract<'a>(args: &[&'a str]) -> (Vec<(Tag, u32)>, Vec<&'a str>) {
    let mut tags = Vec::new();
    let mut rest = Vec::new();
    for &arg in args {
        match parse_tag(arg) {
            Some(tag) => tags.push(tag),
            None => rest.push(arg),
        }
    }
    (tags, rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_spellings() {
        for arg in ["lv90", "lvl90", "lev90", "level90", "LV90"] {
            assert_eq!(parse_tag(arg), Some((Tag::Level, 90)), "{arg}");
        }
    }

    #[test]
    fn test_other_tags() {
        assert_eq!(parse_tag("r5"), Some((Tag::Refinement, 5)));
        assert_eq!(parse_tag("4*"), Some((Tag::Rank, 4)));
        assert_eq!(parse_tag("x100"), Some((Tag::Amount, 100)));
        assert_eq!(parse_tag("100x"), Some((Tag::Amount, 100)));
    }

    #[test]
    fn test_non_tags() {
        for arg in ["wp", "all", "11101", "lv", "r", "*", "x", "rx5", "lv-1", "x1x"] {
            assert_eq!(parse_tag(arg), None, "{arg}");
        }
    }

    #[test]
    fn test_extract_keeps_positional_order() {
        let (tags, rest) = extract(&["wp", "lv20", "r2", "3*"]);
        assert_eq!(rest, vec!["wp"]);
        assert_eq!(
            tags,
            vec![(Tag::Level, 20), (Tag::Refinement, 2), (Tag::Rank, 3)]
        );
    }
}
