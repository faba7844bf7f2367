//! `[CODE]` reference scanning over raw text
//!
//! Unlike [`FormulaExpr::references`](crate::FormulaExpr::references), this
//! works on text that does not parse, so callers can still follow the
//! references of a half-typed expression.

use lazy_regex::regex;

/// Codes written as `[CODE]` in `text`, deduplicated, in order of first
/// appearance
pub fn scan_references(text: &str) -> Vec<String> {
    let mut codes: Vec<String> = Vec::new();
    for caps in regex!(r"\[([^\]]+)\]").captures_iter(text) {
        let code = &caps[1];
        if !codes.iter().any(|c| c == code) {
            codes.push(code.to_string());
        }
    }
    codes
}
