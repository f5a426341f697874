use std::time::{Duration, Instant};

use ppe_sentinel::{AlertDispatcher, AlertSeverity, Requirement, RequirementTable};

fn missing(labels: &[&str]) -> Vec<String> {
    labels.iter().map(|l| l.to_string()).collect()
}

#[test]
fn five_second_cooldown_emits_at_t0_and_t6_only() {
    let mut dispatcher =
        AlertDispatcher::new(RequirementTable::site_default(), Duration::from_secs(5));
    let base = Instant::now();
    let absent = missing(&["helmet"]);

    let mut emitted = 0;
    for offset in [0u64, 3, 6] {
        if dispatcher
            .maybe_alert(&absent, base + Duration::from_secs(offset))
            .is_some()
        {
            emitted += 1;
        }
    }
    assert_eq!(emitted, 2);
}

#[test]
fn positive_and_negative_alerts_share_one_cooldown() {
    let mut dispatcher =
        AlertDispatcher::new(RequirementTable::site_default(), Duration::from_secs(5));
    let base = Instant::now();

    // Negative alert at t=0 starts the window...
    assert!(dispatcher.maybe_alert(&missing(&["vest"]), base).is_some());
    // ...and an all-clear two seconds later is suppressed by the same timer.
    assert!(dispatcher
        .maybe_alert(&[], base + Duration::from_secs(2))
        .is_none());
    // After the window passes the all-clear goes out.
    let msg = dispatcher
        .maybe_alert(&[], base + Duration::from_secs(6))
        .expect("all-clear after cooldown");
    assert_eq!(msg.severity, AlertSeverity::AllClear);
    assert_eq!(msg.text, "All required equipment detected.");
}

#[test]
fn violation_message_lists_items_in_table_order() {
    let mut dispatcher = AlertDispatcher::new(RequirementTable::site_default(), Duration::ZERO);
    let msg = dispatcher
        .maybe_alert(&missing(&["helmet", "vest", "boots"]), Instant::now())
        .unwrap();

    assert_eq!(msg.severity, AlertSeverity::Violation);
    assert_eq!(
        msg.text,
        "Safety violation! Confirmed missing: helmet, vest, boots"
    );
}

#[test]
fn lax_threshold_items_use_possibly_missing_wording() {
    // The wording keys off the configured threshold, not anything observed:
    // goggles (0.55) phrases as possibly missing even though it was simply
    // not detected at all, and it shadows the strict-threshold helmet.
    let table = RequirementTable::new(vec![
        Requirement {
            label: "helmet".into(),
            min_confidence: 0.7,
            color: [0, 255, 0],
        },
        Requirement {
            label: "goggles".into(),
            min_confidence: 0.55,
            color: [0, 255, 0],
        },
    ])
    .unwrap();
    let mut dispatcher = AlertDispatcher::new(table, Duration::ZERO);

    let msg = dispatcher
        .maybe_alert(&missing(&["helmet", "goggles"]), Instant::now())
        .unwrap();

    assert_eq!(msg.severity, AlertSeverity::PossiblyMissing);
    assert_eq!(msg.text, "Warning! Possibly missing: goggles (low confidence)");
}

#[test]
fn suppressed_cycles_never_mutate_state() {
    let mut dispatcher =
        AlertDispatcher::new(RequirementTable::site_default(), Duration::from_secs(5));
    let base = Instant::now();

    assert!(dispatcher.maybe_alert(&missing(&["gloves"]), base).is_some());

    // Repeated suppressed calls inside the window do not push the window out.
    for offset in 1..5u64 {
        assert!(dispatcher
            .maybe_alert(&missing(&["gloves"]), base + Duration::from_secs(offset))
            .is_none());
    }
    assert!(dispatcher
        .maybe_alert(&missing(&["gloves"]), base + Duration::from_secs(6))
        .is_some());
}
