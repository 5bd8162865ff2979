//! Canonical test-name normalization.
//!
//! `stand-and-sit`, `finger-tapping`, `fist-open-close` are the only
//! canonical names templates are keyed by. Inputs are lowercased, run
//! through whitespace/underscore-to-dash collapsing and `&`-to-`and`
//! substitution, then matched against a static alias table ported from
//! `normalize_test_name` in the original Python source. Unknown inputs
//! pass through unchanged.

/// One of the three canonical test names this system understands.
pub const CANONICAL_TEST_NAMES: [&str; 3] =
    ["stand-and-sit", "finger-tapping", "fist-open-close"];

const ALIASES: &[(&str, &str)] = &[
    ("finger-taping", "finger-tapping"),
    ("fist-open-close", "fist-open-close"),
    ("fist_open_close", "fist-open-close"),
    ("palm-open", "fist-open-close"),
    ("palm_open", "fist-open-close"),
    ("stand-sit", "stand-and-sit"),
    ("stand-and-sit-assessment", "stand-and-sit"),
    ("stand_and_sit", "stand-and-sit"),
];

/// Normalize a raw test-name/testType string to its canonical form.
///
/// Lowercases, collapses runs of whitespace/`_` to a single `-`, maps
/// `&` to `and`, then looks up the alias table. Inputs already canonical
/// pass through unchanged; inputs with no known alias also pass through
/// unchanged (the caller decides whether that is a `TemplateMissing`).
pub fn normalize_test_name(input: &str) -> String {
    let lowered = input.trim().to_lowercase();
    let ampersand_mapped = lowered.replace('&', "and");

    let mut collapsed = String::with_capacity(ampersand_mapped.len());
    let mut last_was_dash = false;
    for ch in ampersand_mapped.chars() {
        if ch.is_whitespace() || ch == '_' || ch == '-' {
            if !last_was_dash && !collapsed.is_empty() {
                collapsed.push('-');
                last_was_dash = true;
            }
        } else {
            collapsed.push(ch);
            last_was_dash = false;
        }
    }
    let normalized = collapsed.trim_matches('-').to_string();

    ALIASES
        .iter()
        .find(|(alias, _)| *alias == normalized)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(normalized)
}

/// Whether a (already-normalized) name is one of the closed canonical set.
pub fn is_canonical(name: &str) -> bool {
    CANONICAL_TEST_NAMES.contains(&name)
}
