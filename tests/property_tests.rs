//! Property-based tests for rust_structured_logger using proptest

use proptest::prelude::*;
use rust_structured_logger::prelude::*;

fn any_level() -> impl Strategy<Value = LogLevel> {
    prop_oneof![
        Just(LogLevel::Trace),
        Just(LogLevel::Debug),
        Just(LogLevel::Info),
        Just(LogLevel::Warn),
        Just(LogLevel::Error),
    ]
}

fn capture(level: LogLevel) -> (SharedBuffer, Logger) {
    let buffer = SharedBuffer::default();
    let logger = Logger::builder()
        .level(level)
        .output(buffer.clone())
        .disable_time(true)
        .build();
    (buffer, logger)
}

// ============================================================================
// LogLevel Tests
// ============================================================================

proptest! {
    /// Level names parse back to the same level
    #[test]
    fn test_log_level_str_roundtrip(level in any_level()) {
        let parsed: LogLevel = level.to_str().parse().unwrap();
        prop_assert_eq!(level, parsed);
    }

    /// Level names parse regardless of case
    #[test]
    fn test_log_level_parse_ignores_case(level in any_level()) {
        let upper = level.to_str().to_uppercase();
        prop_assert_eq!(upper.parse::<LogLevel>().unwrap(), level);
    }

    /// A line is written exactly when the call level reaches the threshold
    #[test]
    fn test_threshold_filters_lower_levels(threshold in any_level(), level in any_level()) {
        let (buffer, logger) = capture(threshold);
        logger.log(level, "threshold check", &[]);

        prop_assert_eq!(!buffer.contents().is_empty(), level >= threshold);
        prop_assert_eq!(threshold.enables(level), level >= threshold);
    }

    /// The is_* guards agree with the threshold
    #[test]
    fn test_level_guards_match_threshold(threshold in any_level()) {
        let (_buffer, logger) = capture(threshold);

        prop_assert_eq!(logger.is_trace(), threshold <= LogLevel::Trace);
        prop_assert_eq!(logger.is_debug(), threshold <= LogLevel::Debug);
        prop_assert_eq!(logger.is_info(), threshold <= LogLevel::Info);
        prop_assert_eq!(logger.is_warn(), threshold <= LogLevel::Warn);
        prop_assert_eq!(logger.is_error(), threshold <= LogLevel::Error);
    }
}

// ============================================================================
// Text Formatting Tests
// ============================================================================

proptest! {
    /// Values without whitespace are written bare
    #[test]
    fn test_plain_values_are_not_quoted(value in "[a-zA-Z0-9_./-]{1,24}") {
        let (buffer, logger) = capture(LogLevel::Info);
        logger.info("m", &["k".into(), value.as_str().into()]);

        prop_assert_eq!(buffer.contents(), format!("[INFO]  m: k={}\n", value));
    }

    /// Values containing whitespace are quoted and stay on one line
    #[test]
    fn test_whitespace_values_are_quoted(
        head in "[a-z]{1,8}",
        sep in prop_oneof![Just(" "), Just("\t"), Just("\n"), Just("\r")],
        tail in "[a-z]{1,8}",
    ) {
        let (buffer, logger) = capture(LogLevel::Info);
        let value = format!("{}{}{}", head, sep, tail);
        logger.info("m", &["k".into(), value.into()]);

        let contents = buffer.contents();
        prop_assert!(contents.starts_with("[INFO]  m: k=\""));
        prop_assert!(contents.ends_with("\"\n"));
        prop_assert_eq!(contents.matches('\n').count(), 1);
    }

    /// Arbitrary messages never panic and always end with a newline
    #[test]
    fn test_any_message_produces_one_terminated_line(msg in "[^\n\r]{0,64}") {
        let (buffer, logger) = capture(LogLevel::Info);
        logger.info(&msg, &[]);

        let contents = buffer.contents();
        prop_assert!(contents.ends_with('\n'));
        prop_assert_eq!(contents.lines().count(), 1);
    }
}

// ============================================================================
// Derived Logger Tests
// ============================================================================

proptest! {
    /// Repeated With calls keep only the last value for a key
    #[test]
    fn test_with_last_value_wins(values in prop::collection::vec(0i64..1000, 1..8)) {
        let (buffer, logger) = capture(LogLevel::Info);

        let mut derived = logger.clone();
        for v in &values {
            derived = derived.with(&["k".into(), (*v).into()]);
        }
        derived.info("m", &[]);

        let last = values.last().unwrap();
        prop_assert_eq!(derived.implied_args().len(), 2);
        prop_assert_eq!(buffer.contents(), format!("[INFO]  m: k={}\n", last));
    }

    /// Named joins every segment with a dot
    #[test]
    fn test_named_joins_segments(segments in prop::collection::vec("[a-z]{1,6}", 1..5)) {
        let logger = Logger::null();

        let mut derived = logger.clone();
        for s in &segments {
            derived = derived.named(s);
        }

        prop_assert_eq!(derived.name(), segments.join("."));
    }

    /// JSON output is always one decodable object per line
    #[test]
    fn test_json_lines_decode(key in "[a-z]{1,8}", value in ".{0,32}") {
        let buffer = SharedBuffer::default();
        let logger = Logger::builder()
            .output(buffer.clone())
            .json_format(true)
            .disable_time(true)
            .build();

        logger.info("m", &[key.as_str().into(), value.as_str().into()]);

        let contents = buffer.contents();
        prop_assert_eq!(contents.lines().count(), 1);
        let decoded: serde_json::Value = serde_json::from_str(contents.trim_end()).unwrap();
        prop_assert_eq!(decoded[key.as_str()].as_str(), Some(value.as_str()));
    }
}
