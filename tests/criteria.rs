//! Work criteria and classification tests.

use activity_meter::{ActivityError, PerformanceCategory, WorkCriteria, classify};

fn criteria(min: f64) -> WorkCriteria {
    WorkCriteria::new(min).expect("valid criteria")
}

// ── Construction ─────────────────────────────────────────────────

#[test]
fn criteria_rejects_non_positive_minimum() {
    for value in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        let result = WorkCriteria::new(value);
        assert!(
            matches!(result, Err(ActivityError::InvalidCriteria(_))),
            "expected InvalidCriteria for {value}, got {result:?}"
        );
    }
}

#[test]
fn criteria_keeps_minimum() {
    assert_eq!(criteria(60.0).min_work_duration(), 60.0);
}

// ── Thresholds ───────────────────────────────────────────────────

#[test]
fn boundaries_are_strict() {
    let criteria = criteria(10.0);
    assert_eq!(classify(10.0, &criteria), PerformanceCategory::Poor);
    assert_eq!(classify(15.0, &criteria), PerformanceCategory::Good);
    assert_eq!(classify(20.0, &criteria), PerformanceCategory::Better);
}

#[test]
fn just_above_each_boundary() {
    let criteria = criteria(10.0);
    assert_eq!(classify(10.001, &criteria), PerformanceCategory::Good);
    assert_eq!(classify(15.001, &criteria), PerformanceCategory::Better);
    assert_eq!(classify(20.001, &criteria), PerformanceCategory::Best);
}

#[test]
fn zero_duration_is_poor() {
    assert_eq!(classify(0.0, &criteria(1.0)), PerformanceCategory::Poor);
}

#[test]
fn classification_is_monotonic() {
    let criteria = criteria(7.5);
    let mut previous = PerformanceCategory::Poor;
    for step in 0..=400 {
        let duration = step as f64 * 0.05;
        let category = classify(duration, &criteria);
        assert!(
            category >= previous,
            "{duration} rated {category} after {previous}"
        );
        previous = category;
    }
    assert_eq!(previous, PerformanceCategory::Best);
}

#[test]
fn documented_scenarios() {
    let criteria = criteria(10.0);
    // 40 of 100 frames at 30 fps.
    assert_eq!(classify(12.0, &criteria), PerformanceCategory::Good);
    // 70 of 100 frames at 30 fps.
    assert_eq!(classify(21.0, &criteria), PerformanceCategory::Best);
}

// ── Labels ───────────────────────────────────────────────────────

#[test]
fn category_labels() {
    assert_eq!(PerformanceCategory::Poor.to_string(), "Poor");
    assert_eq!(PerformanceCategory::Good.as_str(), "Good");
    assert_eq!(PerformanceCategory::Better.as_str(), "Better");
    assert_eq!(format!("{}", PerformanceCategory::Best), "Best");
    assert_eq!(PerformanceCategory::default(), PerformanceCategory::Poor);
}
