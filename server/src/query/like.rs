//! SQL-style LIKE matching for the `$like` operator.

use regex::RegexBuilder;

/// Match `value` against a LIKE `pattern`.
///
/// `%` matches zero or more characters and `_` exactly one; every other
/// regex metacharacter in the pattern is taken literally. The match is
/// anchored at both ends and case-insensitive. A pattern that fails to
/// compile matches nothing.
#[must_use]
pub fn like_match(value: &str, pattern: &str) -> bool {
    let mut re = String::with_capacity(pattern.len() + 2);
    re.push('^');
    for c in pattern.chars() {
        match c {
            '%' => re.push_str(".*"),
            '_' => re.push('.'),
            c => {
                let mut buf = [0u8; 4];
                re.push_str(&regex::escape(c.encode_utf8(&mut buf)));
            }
        }
    }
    re.push('$');

    RegexBuilder::new(&re)
        .case_insensitive(true)
        .build()
        .map(|r| r.is_match(value))
        .unwrap_or(false)
}
