use eternalflow_core::countdown::decompose::{
    decompose_full, decompose_trimmed, reconstruct_ms, DurationPart, TimeUnit,
};
use eternalflow_core::countdown::plural::{PluralCategory, PluralRule, RussianPlural};
use eternalflow_core::{format_countdown, TimeStatus};
use proptest::prelude::*;

const SECOND: i64 = 1_000;
const MINUTE: i64 = 60 * SECOND;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;

proptest! {
    #[test]
    fn reconstruction_loses_less_than_one_second(delta in 0i64..=i64::MAX / 2) {
        let rebuilt = reconstruct_ms(&decompose_full(delta));
        let delta = delta as u64;
        prop_assert!(rebuilt <= delta);
        prop_assert!(rebuilt + 1_000 > delta);
    }

    #[test]
    fn trimmed_output_never_starts_with_zero_unless_now(delta in any::<i64>()) {
        let parts = decompose_trimmed(delta);
        prop_assert!(!parts.is_empty());
        if parts.len() > 1 || parts[0].unit != TimeUnit::Seconds {
            prop_assert!(parts[0].value > 0);
        }
        prop_assert_eq!(parts.last().map(|p| p.unit), Some(TimeUnit::Seconds));
    }

    #[test]
    fn format_is_pure(target in any::<i64>(), now in any::<i64>()) {
        prop_assert_eq!(format_countdown(target, now), format_countdown(target, now));
    }
}

#[test]
fn ninety_seconds_decomposes_to_minute_and_thirty_seconds() {
    assert_eq!(
        decompose_trimmed(90_000),
        vec![
            DurationPart {
                unit: TimeUnit::Minutes,
                value: 1
            },
            DurationPart {
                unit: TimeUnit::Seconds,
                value: 30
            },
        ]
    );
}

#[test]
fn plural_rule_matches_documented_samples() {
    let rule = RussianPlural;
    assert_eq!(rule.category(1), PluralCategory::One);
    assert_eq!(rule.category(21), PluralCategory::One);
    assert_eq!(rule.category(11), PluralCategory::Many);
    for few in [2, 3, 4, 22, 33, 44] {
        assert_eq!(rule.category(few), PluralCategory::Few);
    }
    for many in (5..=20).chain(25..=30).chain([0]) {
        assert_eq!(rule.category(many), PluralCategory::Many, "{many}");
    }
}

#[test]
fn each_unit_is_pluralized_on_its_own_value() {
    let breakdown = format_countdown(0, DAY + 2 * HOUR + 5 * MINUTE + 21 * SECOND);
    assert_eq!(breakdown.status, TimeStatus::Elapsed);
    let labels: Vec<&str> = breakdown.parts.iter().map(|part| part.label).collect();
    assert_eq!(labels, vec!["день", "часа", "минут", "секунду"]);
    assert_eq!(breakdown.sentence(), "1 день 2 часа 5 минут 21 секунду назад");
}

#[test]
fn countdown_switches_direction_at_target() {
    let target = 10 * DAY;
    assert_eq!(
        format_countdown(target, target - SECOND).sentence(),
        "Через 1 секунду"
    );
    assert_eq!(format_countdown(target, target).status, TimeStatus::Elapsed);
    assert_eq!(
        format_countdown(target, target + 3 * SECOND).sentence(),
        "3 секунды назад"
    );
}

#[test]
fn long_ranges_use_fixed_year_and_month_lengths() {
    let breakdown = format_countdown(2 * 31_536_000_000 + 2_628_000_000, 0);
    let values: Vec<(TimeUnit, u64)> = breakdown
        .parts
        .iter()
        .map(|part| (part.unit, part.value))
        .collect();
    assert_eq!(
        values,
        vec![
            (TimeUnit::Years, 2),
            (TimeUnit::Months, 1),
            (TimeUnit::Days, 0),
            (TimeUnit::Hours, 0),
            (TimeUnit::Minutes, 0),
            (TimeUnit::Seconds, 0),
        ]
    );
    assert_eq!(
        breakdown.sentence(),
        "Через 2 года 1 месяц 0 дней 0 часов 0 минут 0 секунд"
    );
}
