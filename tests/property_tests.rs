//! Property-based tests for rust_rotating_logger using proptest

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use proptest::prelude::*;
use rust_rotating_logger::core::LogConfig;
use rust_rotating_logger::prelude::*;
use rust_rotating_logger::rotation::{history, HistoryPattern, RotationState};
use std::path::PathBuf;

fn any_level() -> impl Strategy<Value = LogLevel> {
    prop_oneof![
        Just(LogLevel::Trace),
        Just(LogLevel::Debug),
        Just(LogLevel::Info),
        Just(LogLevel::Warn),
        Just(LogLevel::Error),
        Just(LogLevel::Fatal),
    ]
}

fn any_when() -> impl Strategy<Value = When> {
    prop_oneof![
        Just(When::Seconds),
        Just(When::Minutes),
        Just(When::Hours),
        Just(When::Days),
        Just(When::Midnight),
        (0u8..7).prop_map(When::Weekday),
    ]
}

fn any_zone() -> impl Strategy<Value = RotationZone> {
    prop_oneof![
        Just(RotationZone::Utc),
        Just(RotationZone::Named(chrono_tz::Europe::Berlin)),
        Just(RotationZone::Named(chrono_tz::America::New_York)),
        Just(RotationZone::Named(chrono_tz::Australia::Lord_Howe)),
        // these change offset at local midnight
        Just(RotationZone::Named(chrono_tz::Asia::Beirut)),
        Just(RotationZone::Named(chrono_tz::America::Havana)),
        Just(RotationZone::Named(chrono_tz::America::Santiago)),
    ]
}

/// Instants between 2000 and 2040
fn any_instant() -> impl Strategy<Value = DateTime<Utc>> {
    (946_684_800i64..2_208_988_800i64).prop_map(|secs| Utc.timestamp_opt(secs, 0).unwrap())
}

// ============================================================================
// LogLevel Tests
// ============================================================================

proptest! {
    #[test]
    fn test_log_level_str_roundtrip(level in any_level()) {
        let parsed: LogLevel = level.to_str().parse().unwrap();
        prop_assert_eq!(level, parsed);
    }

    #[test]
    fn test_log_level_display(level in any_level()) {
        prop_assert_eq!(format!("{}", level), level.to_str());
    }

    #[test]
    fn test_log_level_ordering(level1 in any_level(), level2 in any_level()) {
        prop_assert_eq!(level1 <= level2, (level1 as u8) <= (level2 as u8));
    }
}

// ============================================================================
// Record Sanitization Tests
// ============================================================================

proptest! {
    /// A record always renders to exactly one plain line
    #[test]
    fn test_record_is_one_line(message in ".*") {
        let record = LogRecord::new(LogLevel::Info, &message);
        prop_assert!(!record.message.contains('\n'));
        prop_assert!(!record.message.contains('\r'));

        let line = TextRenderer::new().render_plain(&record);
        prop_assert_eq!(line.lines().count(), 1);
    }
}

// ============================================================================
// Rollover Schedule Tests
// ============================================================================

proptest! {
    #[test]
    fn test_next_rollover_is_after_now(
        when in any_when(),
        interval in 1u32..5,
        zone in any_zone(),
        previous in any_instant(),
        elapsed in 0i64..(40 * 86_400),
    ) {
        let policy = RotationPolicy::new(when).with_interval(interval).with_zone(zone);
        let now = previous + TimeDelta::seconds(elapsed);
        let mut state = RotationState::new("app.txt", now, 0);
        state.next_rollover_at = previous;

        let next = policy.compute_next(now, &state);
        prop_assert!(next > now, "{:?}: {} is not after {}", when, next, now);
        prop_assert!(next >= previous);
    }

    /// Fixed units stay on the grid anchored at the previous boundary
    #[test]
    fn test_fixed_units_stay_on_grid(
        when in prop_oneof![Just(When::Seconds), Just(When::Minutes), Just(When::Hours), Just(When::Days)],
        interval in 1u32..10,
        previous in any_instant(),
        elapsed in 0i64..(10 * 86_400),
    ) {
        let policy = RotationPolicy::new(when).with_interval(interval).with_zone(RotationZone::Utc);
        let now = previous + TimeDelta::seconds(elapsed);
        let mut state = RotationState::new("app.txt", now, 0);
        state.next_rollover_at = previous;

        let next = policy.compute_next(now, &state);
        let step = policy.interval().num_seconds();
        prop_assert_eq!((next - previous).num_seconds() % step, 0);
        prop_assert!((next - now).num_seconds() <= step);
    }

    /// Daily calendar boundaries land on the first instant of the next local
    /// day, which is midnight unless a DST gap skips it
    #[test]
    fn test_midnight_lands_on_local_midnight(zone in any_zone(), now in any_instant()) {
        let policy = RotationPolicy::new(When::Midnight).with_zone(zone);
        let state = RotationState::new("app.txt", now, 0);

        let next = policy.compute_next(now, &state);
        let local = zone.local_time(next);
        let just_before = zone.local_time(next - TimeDelta::seconds(1));
        prop_assert_eq!(local.date(), zone.local_time(now).date().succ_opt().unwrap());
        prop_assert!(just_before.date() < local.date(), "{} is not the start of a day", local);
        prop_assert!(local.format("%H:%M").to_string() <= "01:00".to_string(), "{}", local);
        prop_assert!(next - now <= TimeDelta::hours(25));
    }

    #[test]
    fn test_is_due_is_monotone(
        next in any_instant(),
        a in 0i64..100_000,
        b in 0i64..100_000,
    ) {
        let policy = RotationPolicy::new(When::Hours);
        let mut state = RotationState::new("app.txt", next, 0);
        state.next_rollover_at = next;

        let earlier = next - TimeDelta::seconds(a.min(b));
        let later = next + TimeDelta::seconds(a.max(b));
        prop_assert!(policy.is_due(later, &state));
        if a.min(b) > 0 {
            prop_assert!(!policy.is_due(earlier, &state));
        }
    }
}

// ============================================================================
// History Naming and Retention Tests
// ============================================================================

proptest! {
    #[test]
    fn test_historical_names_are_recognized(when in any_when(), at in any_instant()) {
        let policy = RotationPolicy::new(when).with_zone(RotationZone::Utc);
        let pattern = HistoryPattern::new("app.txt", policy.date_format());

        let name = pattern.historical_name(&policy.format_period(at));
        prop_assert!(pattern.is_historical(&name), "{} not recognized", name);
        prop_assert!(!pattern.is_historical("app.txt"));
    }

    #[test]
    fn test_retention_keeps_at_most_count(len in 0usize..40, keep in 0usize..10) {
        let files: Vec<PathBuf> = (0..len)
            .map(|i| PathBuf::from(format!("2024-01-{:02}_app.txt", i + 1)))
            .collect();

        let removed = history::excess(&files, keep);
        let kept = len - removed.len();
        if keep == 0 {
            prop_assert_eq!(kept, len);
        } else {
            prop_assert_eq!(kept, len.min(keep));
            // only the oldest are removed
            prop_assert_eq!(removed, &files[..removed.len()]);
        }
    }
}

// ============================================================================
// Configuration Tests
// ============================================================================

proptest! {
    /// Malformed values never fail, they fall back with a warning
    #[test]
    fn test_config_keep_count_fallback(count in any::<i64>()) {
        let section = serde_json::json!({ "LogKeepCount": count });
        let (config, warnings) = LogConfig::from_log_section(&section);
        if count >= 0 {
            prop_assert!(warnings.is_empty());
            prop_assert_eq!(config.keep_count as i64, count);
        } else {
            prop_assert_eq!(warnings.len(), 1);
            prop_assert_eq!(config.keep_count, LogConfig::default().keep_count);
        }
    }

    #[test]
    fn test_config_unknown_method_falls_back(method in "[a-y]{1,8}") {
        prop_assume!(!["none", "delete", "copy", "archive", "zip"].contains(&method.as_str()));
        let section = serde_json::json!({ "LogBackUpMethod": method });
        let (config, warnings) = LogConfig::from_log_section(&section);
        prop_assert_eq!(warnings.len(), 1);
        prop_assert_eq!(config.backup_method, BackupMode::None);
    }
}
