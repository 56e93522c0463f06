//! End-to-end: raw API payloads -> interval window -> forecast, and scores -> booster plans.

use approx::assert_relative_eq;
use chrono::{Duration, TimeZone, Utc};

use roundwatch_lib::booster::{default_catalog, plan_targets, Standing};
use roundwatch_lib::forecast::{estimate_next, Countdown, DurationWindow, ForecastConfig};
use roundwatch_lib::rounds::{open_round_start, parse_rounds, round_durations, DurationUnit};
use roundwatch_lib::{Phase, Trend};

fn rounds_payload(minutes: &[i64], open: bool) -> String {
    let mut start = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
    let mut items = Vec::new();
    for &length in minutes {
        let end = start + Duration::minutes(length);
        items.push(format!(
            r#"{{ "startedAt": "{}", "endedAt": "{}" }}"#,
            start.to_rfc3339().replace("+00:00", "Z"),
            end.to_rfc3339().replace("+00:00", "Z"),
        ));
        start = end;
    }
    if open {
        items.push(format!(
            r#"{{ "startedAt": "{}", "endedAt": null }}"#,
            start.to_rfc3339()
        ));
    }
    format!(r#"{{ "data": {{ "array": [{}] }} }}"#, items.join(","))
}

#[test]
fn rounds_dump_to_forecast_and_countdown() {
    let json = rounds_payload(&[10, 10, 30, 10, 1, 10, 10], true);
    let rounds = parse_rounds(&json).unwrap();
    let config = ForecastConfig::default();

    let durations = round_durations(&rounds, config.capacity, DurationUnit::Minutes);
    assert_eq!(durations, vec![10.0, 10.0, 30.0, 10.0, 1.0, 10.0, 10.0]);

    let mut window = DurationWindow::from_config(&config).unwrap();
    window.extend(durations).unwrap();
    let forecast = estimate_next(&window, &config);

    // 30 and 1 are trimmed; the remaining 10s average to 10 and the slope is negative
    assert_relative_eq!(forecast.point_estimate, 9.0, epsilon = 1e-9);
    assert_eq!(forecast.trend, Trend::Falling);
    assert_eq!(forecast.phase, Phase::Standard);

    let started = open_round_start(&rounds).unwrap();
    let countdown = Countdown::since(
        forecast.point_estimate,
        DurationUnit::Minutes,
        started,
        started + Duration::minutes(10),
    );
    assert_eq!(countdown, Countdown::Overdue(Duration::minutes(1)));
}

#[test]
fn window_keeps_only_the_latest_twenty_rounds() {
    let lengths: Vec<i64> = (1..=25).collect();
    let rounds = parse_rounds(&rounds_payload(&lengths, false)).unwrap();

    let durations = round_durations(&rounds, 30, DurationUnit::Minutes);
    let mut window = DurationWindow::new(20).unwrap();
    window.extend(durations).unwrap();

    assert_eq!(window.len(), 20);
    assert_eq!(window.as_slice().first(), Some(&6.0));
    assert_eq!(window.latest(), Some(25.0));
}

#[test]
fn scores_to_plans_for_three_ranks() {
    let catalog = default_catalog();
    let plans = plan_targets(1_050_000.0, &[2_000_000.0, 1_300_000.0, 900_000.0], &catalog);

    assert_eq!(plans[0].standing, Standing::Behind { deficit: 950_000.0 });
    let instant = plans[0].plans[0].result.as_ref().unwrap();
    assert_eq!(instant.units_needed, Some(3));

    let stacking = plans[1].plans[2].result.as_ref().unwrap();
    assert_eq!(stacking.units_needed, Some(2));
    assert_relative_eq!(stacking.time_needed_secs, 240.0);

    let passive = plans[1].plans[3].result.as_ref().unwrap();
    assert_eq!(passive.units_needed, None);
    assert_relative_eq!(passive.time_needed_secs, 250_000.0 / 1_800.0);

    assert_eq!(plans[2].standing, Standing::AlreadyAhead { lead: 150_000.0 });
    assert!(plans[2].plans.is_empty());
}
