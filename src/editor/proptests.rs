//! Property-based tests for the command executor

#![allow(clippy::uninlined_format_args)]

use super::executor::execute;
use super::matching::count_occurrences;
use super::types::*;
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

/// Document text: a few short lines of CSV-ish characters
fn arb_document() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z0-9,# ]{0,12}", 0..12).prop_map(|lines| lines.join("\n"))
}

/// A fragment that cannot occur in `arb_document` output
fn arb_marker() -> impl Strategy<Value = String> {
    "[A-Z]{3,8}"
}

fn line_count(text: &str) -> usize {
    if text.is_empty() {
        0
    } else {
        text.split('\n').count()
    }
}

// ============================================================================
// Invariant 1: a unique fragment is replaced and nothing else changes
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn prop_unique_replace_touches_only_fragment(
        prefix in arb_document(),
        suffix in arb_document(),
        marker in arb_marker(),
        replacement in "[a-zA-Z0-9 \n]{0,20}",
    ) {
        let content = format!("{prefix}{marker}{suffix}");
        let result = execute(
            &EditCommand::StrReplace { old_str: marker.clone(), new_str: replacement.clone() },
            &content,
        );

        prop_assert!(result.success, "replace failed: {:?}", result.message);
        let expected = format!("{prefix}{replacement}{suffix}");
        prop_assert_eq!(result.content.as_deref(), Some(expected.as_str()));

        let span = result.edit.expect("mutation carries a span");
        prop_assert_eq!(span.start, prefix.chars().count());
        prop_assert_eq!(span.end - span.start, replacement.chars().count());
        prop_assert_eq!(span.removed, marker);
    }
}

// ============================================================================
// Invariant 2: zero or several matches never change the buffer
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn prop_missing_fragment_is_rejected(
        content in arb_document(),
        marker in arb_marker(),
    ) {
        let result = execute(
            &EditCommand::StrReplace { old_str: marker.clone(), new_str: "x".to_string() },
            &content,
        );
        prop_assert!(!result.success);
        prop_assert_eq!(result.content, None);
        let is_no_match = matches!(result.error, Some(EditError::NoMatch { .. }));
        prop_assert!(is_no_match);
    }

    #[test]
    fn prop_repeated_fragment_reports_count(
        parts in prop::collection::vec(arb_document(), 3..6),
        marker in arb_marker(),
    ) {
        // Parts can run into the marker, so take the count from the matcher
        let content = parts.join(&marker);
        let expected = count_occurrences(&content, &marker).count;
        prop_assume!(expected >= 2);

        let result = execute(
            &EditCommand::StrReplace { old_str: marker, new_str: String::new() },
            &content,
        );
        prop_assert!(!result.success);
        prop_assert_eq!(result.content, None);
        prop_assert_eq!(result.error, Some(EditError::AmbiguousMatch { count: expected }));
    }
}

// ============================================================================
// Invariant 3: line arithmetic of insert and delete_range
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn prop_insert_adds_one_line(
        content in arb_document(),
        text in "[a-z,]{0,10}",
        seed in any::<usize>(),
    ) {
        let total = line_count(&content);
        let after = seed % (total + 1);
        let result = execute(
            &EditCommand::Insert { insert_line: i64::try_from(after).unwrap(), new_str: text.clone() },
            &content,
        );
        prop_assert!(result.success, "{:?}", result.message);

        let updated = result.content.unwrap();
        let mut expected: Vec<&str> = if content.is_empty() { vec![] } else { content.split('\n').collect() };
        expected.insert(after, text.as_str());
        prop_assert_eq!(updated, expected.join("\n"));
    }

    #[test]
    fn prop_insert_past_end_fails(
        content in arb_document(),
        extra in 1i64..50,
    ) {
        let total = i64::try_from(line_count(&content)).unwrap();
        let result = execute(
            &EditCommand::Insert { insert_line: total + extra, new_str: "x".to_string() },
            &content,
        );
        prop_assert!(!result.success);
        prop_assert_eq!(result.error, Some(EditError::range("insert_line", total + extra, 0, total)));
    }

    #[test]
    fn prop_delete_range_splices_lines(
        content in arb_document(),
        a in any::<usize>(),
        b in any::<usize>(),
    ) {
        let total = line_count(&content);
        prop_assume!(total > 0);
        let (first, last) = {
            let x = a % total + 1;
            let y = b % total + 1;
            (x.min(y), x.max(y))
        };

        let result = execute(
            &EditCommand::DeleteRange {
                start_line: i64::try_from(first).unwrap(),
                end_line: i64::try_from(last).unwrap(),
            },
            &content,
        );
        prop_assert!(result.success, "{:?}", result.message);

        let mut lines: Vec<&str> = content.split('\n').collect();
        lines.drain(first - 1..last);
        prop_assert_eq!(result.content.unwrap(), lines.join("\n"));
    }

    #[test]
    fn prop_view_full_range_matches_view_all(content in arb_document()) {
        let total = i64::try_from(line_count(&content)).unwrap();
        let all = execute(&EditCommand::View { view_range: None }, &content);
        let ranged = execute(&EditCommand::View { view_range: Some(vec![1, total]) }, &content);
        if total > 0 {
            prop_assert_eq!(all.content, ranged.content);
            prop_assert_eq!(all.line_count, ranged.line_count);
        }
    }
}
