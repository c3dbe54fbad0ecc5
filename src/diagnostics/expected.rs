//! Expected-diagnostics filtering.
//!
//! A target may declare diagnostics it expects the build to produce.
//! Expected findings are removed from the reported set before
//! formatting; an expectation that matched nothing becomes an error of
//! its own, so stale allow-lists fail loudly.

use regex_lite::Regex;

use super::{codes, Diagnostic};

/// Target prefixes allowed to declare expected diagnostics. Empty
/// means every target may.
pub const EXPECT_DIAGNOSTICS_WHITELIST: &[&str] = &[];

/// Whether `target` may use expected diagnostics at all.
pub fn target_may_expect(target: &str) -> bool {
    EXPECT_DIAGNOSTICS_WHITELIST.is_empty()
        || EXPECT_DIAGNOSTICS_WHITELIST.iter().any(|p| target.starts_with(p))
}

/// Text the expectation patterns are matched against.
fn match_text(d: &Diagnostic) -> String {
    format!("TS{}: {}", d.code, d.message)
}

/// Remove expected diagnostics and report unmet expectations.
pub fn filter_expected(patterns: &[String], diagnostics: Vec<Diagnostic>) -> Vec<Diagnostic> {
    if patterns.is_empty() {
        return diagnostics;
    }

    let mut matched = vec![false; diagnostics.len()];
    let mut failures = Vec::new();

    for pattern in patterns {
        let regex = match Regex::new(pattern) {
            Ok(r) => r,
            Err(e) => {
                failures.push(Diagnostic::global(
                    codes::EXPECTED_DIAGNOSTIC_MISSING,
                    format!("invalid expectedDiagnostics pattern '{}': {}", pattern, e),
                ));
                continue;
            }
        };
        let mut any = false;
        for (i, d) in diagnostics.iter().enumerate() {
            if regex.is_match(&match_text(d)) {
                matched[i] = true;
                any = true;
            }
        }
        if !any {
            failures.push(Diagnostic::global(
                codes::EXPECTED_DIAGNOSTIC_MISSING,
                format!(
                    "expected diagnostic matching '{}' was not produced by this build",
                    pattern
                ),
            ));
        }
    }

    let mut remaining: Vec<Diagnostic> = diagnostics
        .into_iter()
        .zip(matched)
        .filter(|(_, m)| !m)
        .map(|(d, _)| d)
        .collect();
    remaining.extend(failures);
    remaining
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Span;

    fn diag(code: u32, message: &str) -> Diagnostic {
        Diagnostic::error("/root/a.ts", Span::empty(), code, message)
    }

    #[test]
    fn no_patterns_is_identity() {
        let diags = vec![diag(2307, "Cannot find module './b'.")];
        let out = filter_expected(&[], diags.clone());
        assert_eq!(out, diags);
    }

    #[test]
    fn matching_diagnostics_are_removed() {
        let diags = vec![
            diag(2307, "Cannot find module './b'."),
            diag(1002, "Unterminated string literal."),
        ];
        let out = filter_expected(&["TS2307".to_string()], diags);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].code, 1002);
    }

    #[test]
    fn unmet_expectation_becomes_an_error() {
        let out = filter_expected(&["TS9799".to_string()], Vec::new());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].code, codes::EXPECTED_DIAGNOSTIC_MISSING);
        assert!(out[0].message.contains("TS9799"));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let out = filter_expected(&["(unclosed".to_string()], Vec::new());
        assert_eq!(out.len(), 1);
        assert!(out[0].message.contains("invalid"));
    }

    #[test]
    fn whitelist_empty_allows_all_targets() {
        assert!(target_may_expect("//any:target"));
    }
}
