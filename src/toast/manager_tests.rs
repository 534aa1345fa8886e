//! Tests for the Toaster lifecycle

use super::*;
use crate::test_utils::test_helpers::{Recorder, test_toaster};
use crate::toast::{ToastAction, Variant};

const JUST_AFTER: Duration = Duration::from_millis(1);

async fn wait_past_removal_delay() {
    tokio::time::sleep(TOAST_REMOVE_DELAY + JUST_AFTER).await;
}

#[tokio::test]
async fn test_notify_broadcasts_synchronously() {
    let toaster = test_toaster(1);
    let (recorder, _sub) = Recorder::attach(&toaster);

    let handle = toaster.notify(ToastPayload::new().title("Saved"));

    assert_eq!(recorder.count(), 1);
    let snapshot = recorder.last();
    assert_eq!(snapshot.len(), 1);
    let item = snapshot.get(handle.id()).unwrap();
    assert!(item.is_visible());
    assert_eq!(item.title(), Some("Saved"));
}

#[tokio::test]
async fn test_new_toaster_is_empty() {
    let toaster = test_toaster(1);
    let snapshot = toaster.snapshot();
    assert!(snapshot.is_empty());
    assert_eq!(snapshot.version, 0);
    assert_eq!(toaster.pending_removals(), 0);
}

#[tokio::test]
async fn test_newer_toast_evicts_older_with_default_limit() {
    let toaster = test_toaster(TOAST_LIMIT);
    let (recorder, _sub) = Recorder::attach(&toaster);

    let saved = toaster.notify(ToastPayload::new().title("Saved"));
    let error = toaster.notify(ToastPayload::new().title("Error"));

    let snapshot = recorder.last();
    assert_eq!(snapshot.len(), 1);
    assert!(!snapshot.contains(saved.id()));
    assert_eq!(snapshot.get(error.id()).unwrap().title(), Some("Error"));
}

#[tokio::test]
async fn test_items_are_newest_first() {
    let toaster = test_toaster(3);
    let a = toaster.notify(ToastPayload::new().title("a"));
    let b = toaster.notify(ToastPayload::new().title("b"));
    let c = toaster.notify(ToastPayload::new().title("c"));

    let ids: Vec<NotificationId> = toaster.snapshot().iter().map(Notification::id).collect();
    assert_eq!(ids, vec![c.id(), b.id(), a.id()]);
}

#[tokio::test(start_paused = true)]
async fn test_dismiss_hides_then_removes_after_delay() {
    let toaster = test_toaster(1);
    let (recorder, _sub) = Recorder::attach(&toaster);

    let handle = toaster.notify(ToastPayload::new().title("Hi"));
    handle.dismiss();

    let hidden = recorder.last();
    assert!(!hidden.get(handle.id()).unwrap().is_visible());
    assert_eq!(toaster.pending_removals(), 1);

    tokio::time::sleep(TOAST_REMOVE_DELAY - JUST_AFTER).await;
    assert!(toaster.snapshot().contains(handle.id()));

    tokio::time::sleep(JUST_AFTER * 2).await;
    assert!(!toaster.snapshot().contains(handle.id()));
    assert!(!recorder.last().contains(handle.id()));
    assert_eq!(toaster.pending_removals(), 0);
}

#[tokio::test]
async fn test_dismiss_is_first_snapshot_showing_hidden() {
    let toaster = test_toaster(2);
    let (recorder, _sub) = Recorder::attach(&toaster);

    let handle = toaster.notify(ToastPayload::new().title("Hi"));
    toaster.update(handle.id(), ToastPatch::new().description("more"));
    let before = recorder.count();
    toaster.dismiss(Some(handle.id()));

    let snapshots = recorder.all();
    for snapshot in &snapshots[..before] {
        assert!(snapshot.get(handle.id()).unwrap().is_visible());
    }
    assert!(!snapshots[before].get(handle.id()).unwrap().is_visible());
}

#[tokio::test(start_paused = true)]
async fn test_double_dismiss_keeps_single_timer() {
    let toaster = test_toaster(1);
    let handle = toaster.notify(ToastPayload::new().title("Hi"));

    handle.dismiss();
    let once = toaster.snapshot().items;
    handle.dismiss();
    let twice = toaster.snapshot().items;

    assert_eq!(once, twice);
    assert_eq!(toaster.pending_removals(), 1);

    wait_past_removal_delay().await;
    assert!(toaster.snapshot().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_redismiss_does_not_reset_timer() {
    let toaster = test_toaster(1);
    let handle = toaster.notify(ToastPayload::new().title("Hi"));

    handle.dismiss();
    tokio::time::sleep(TOAST_REMOVE_DELAY / 2).await;
    handle.dismiss();
    tokio::time::sleep(TOAST_REMOVE_DELAY / 2 + JUST_AFTER).await;

    assert!(toaster.snapshot().is_empty());
}

#[tokio::test]
async fn test_update_changes_only_given_fields() {
    let toaster = test_toaster(1);
    let handle = toaster.notify(
        ToastPayload::new()
            .title("Old")
            .description("Keep")
            .action(ToastAction::new("Undo"))
            .variant(Variant::Destructive),
    );
    let before = toaster.snapshot().get(handle.id()).cloned().unwrap();

    handle.update(ToastPatch::new().title("X"));

    let after = toaster.snapshot().get(handle.id()).cloned().unwrap();
    assert_eq!(after.title(), Some("X"));
    assert_eq!(after.description(), before.description());
    assert_eq!(after.action(), before.action());
    assert_eq!(after.variant(), before.variant());
    assert_eq!(after.is_visible(), before.is_visible());
}

#[tokio::test]
async fn test_update_unknown_id_still_broadcasts() {
    let toaster = test_toaster(1);
    let (recorder, _sub) = Recorder::attach(&toaster);
    toaster.notify(ToastPayload::new().title("Hi"));
    let before = recorder.last();

    toaster.update(NotificationId::from(u64::MAX), ToastPatch::new().title("X"));

    let after = recorder.last();
    assert_eq!(recorder.count(), 2);
    assert_eq!(after.items, before.items);
    assert_eq!(after.version, before.version + 1);
}

#[tokio::test]
async fn test_dismiss_unknown_id_schedules_nothing() {
    let toaster = test_toaster(1);
    let (recorder, _sub) = Recorder::attach(&toaster);
    toaster.notify(ToastPayload::new().title("Hi"));

    toaster.dismiss(Some(NotificationId::from(u64::MAX)));

    assert_eq!(recorder.count(), 2);
    assert!(recorder.last().items[0].is_visible());
    assert_eq!(toaster.pending_removals(), 0);
}

#[tokio::test]
async fn test_two_subscribers_receive_identical_snapshots() {
    let toaster = test_toaster(1);
    let (first, _a) = Recorder::attach(&toaster);
    let (second, _b) = Recorder::attach(&toaster);

    toaster.notify(ToastPayload::new().title("Hi"));

    assert_eq!(first.count(), 1);
    assert_eq!(first.all(), second.all());
}

#[tokio::test]
async fn test_dismiss_all_hides_everything_in_one_broadcast() {
    let toaster = test_toaster(3);
    for title in ["a", "b", "c"] {
        toaster.notify(ToastPayload::new().title(title));
    }
    let (recorder, _sub) = Recorder::attach(&toaster);

    toaster.dismiss(None);

    assert_eq!(recorder.count(), 1);
    let snapshot = recorder.last();
    assert_eq!(snapshot.len(), 3);
    assert!(snapshot.iter().all(|n| !n.is_visible()));
    assert_eq!(toaster.pending_removals(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_dismiss_all_removes_everything_after_delay() {
    let toaster = test_toaster(3);
    for title in ["a", "b", "c"] {
        toaster.notify(ToastPayload::new().title(title));
    }

    toaster.dismiss(None);
    wait_past_removal_delay().await;

    assert!(toaster.snapshot().is_empty());
    assert_eq!(toaster.pending_removals(), 0);
}

#[tokio::test]
async fn test_external_close_matches_dismiss() {
    let toaster = test_toaster(1);
    let handle = toaster.notify(ToastPayload::new().title("Hi"));

    toaster.on_external_close(handle.id());
    handle.dismiss();
    toaster.on_external_close(handle.id());

    assert!(!toaster.snapshot().get(handle.id()).unwrap().is_visible());
    assert_eq!(toaster.pending_removals(), 1);
}

#[tokio::test]
async fn test_set_open_false_dismisses_and_true_is_ignored() {
    let toaster = test_toaster(1);
    let (recorder, _sub) = Recorder::attach(&toaster);
    let handle = toaster.notify(ToastPayload::new().title("Hi"));

    toaster.set_open(handle.id(), true);
    assert_eq!(recorder.count(), 1);

    toaster.set_open(handle.id(), false);
    assert!(!recorder.last().get(handle.id()).unwrap().is_visible());

    toaster.set_open(handle.id(), true);
    assert!(!toaster.snapshot().get(handle.id()).unwrap().is_visible());
}

#[tokio::test(start_paused = true)]
async fn test_clear_removes_immediately_and_cancels_timers() {
    let toaster = test_toaster(2);
    let (recorder, _sub) = Recorder::attach(&toaster);
    let a = toaster.notify(ToastPayload::new().title("a"));
    toaster.notify(ToastPayload::new().title("b"));
    a.dismiss();

    toaster.clear();
    let cleared_at = recorder.count();

    assert!(recorder.last().is_empty());
    assert_eq!(toaster.pending_removals(), 0);

    wait_past_removal_delay().await;
    assert_eq!(recorder.count(), cleared_at);
}

#[tokio::test(start_paused = true)]
async fn test_stale_handle_after_clear_is_harmless() {
    let toaster = test_toaster(1);
    let handle = toaster.notify(ToastPayload::new().title("Hi"));
    toaster.clear();

    handle.update(ToastPatch::new().title("late"));
    handle.dismiss();

    assert!(toaster.snapshot().is_empty());
    assert_eq!(toaster.pending_removals(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_evicting_dismissed_toast_cancels_its_timer() {
    let toaster = test_toaster(1);
    let (recorder, _sub) = Recorder::attach(&toaster);
    let first = toaster.notify(ToastPayload::new().title("first"));
    first.dismiss();
    assert_eq!(toaster.pending_removals(), 1);

    let second = toaster.notify(ToastPayload::new().title("second"));
    assert_eq!(toaster.pending_removals(), 0);
    let count = recorder.count();

    wait_past_removal_delay().await;
    assert_eq!(recorder.count(), count);
    assert!(toaster.snapshot().contains(second.id()));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_cancels_pending_removals() {
    let toaster = test_toaster(1);
    let (recorder, _sub) = Recorder::attach(&toaster);
    let handle = toaster.notify(ToastPayload::new().title("Hi"));
    handle.dismiss();

    toaster.shutdown();
    assert!(toaster.is_shut_down());
    assert_eq!(toaster.pending_removals(), 0);
    let count = recorder.count();

    wait_past_removal_delay().await;
    assert_eq!(recorder.count(), count);
    assert!(toaster.snapshot().contains(handle.id()));
}

#[tokio::test(start_paused = true)]
async fn test_dismiss_after_shutdown_hides_without_timer() {
    let toaster = test_toaster(1);
    let handle = toaster.notify(ToastPayload::new().title("Hi"));
    toaster.shutdown();

    handle.dismiss();

    assert!(!toaster.snapshot().get(handle.id()).unwrap().is_visible());
    assert_eq!(toaster.pending_removals(), 0);
}

#[tokio::test]
async fn test_unsubscribe_stops_delivery() {
    let toaster = test_toaster(1);
    let (recorder, sub) = Recorder::attach(&toaster);
    toaster.notify(ToastPayload::new().title("a"));
    assert_eq!(toaster.subscriber_count(), 1);

    sub.unsubscribe();
    toaster.notify(ToastPayload::new().title("b"));

    assert_eq!(recorder.count(), 1);
    assert_eq!(toaster.subscriber_count(), 0);
}

#[tokio::test]
async fn test_channel_subscription_receives_in_order() {
    let toaster = test_toaster(2);
    let (sub, mut rx) = toaster.subscribe_channel();

    let handle = toaster.notify(ToastPayload::new().title("a"));
    handle.update(ToastPatch::new().title("b"));
    handle.dismiss();
    sub.unsubscribe();

    let mut versions = Vec::new();
    while let Some(snapshot) = rx.recv().await {
        versions.push(snapshot.version);
    }
    assert_eq!(versions, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_versions_strictly_increase() {
    let toaster = test_toaster(2);
    let (recorder, _sub) = Recorder::attach(&toaster);

    let a = toaster.notify(ToastPayload::new().title("a"));
    toaster.notify(ToastPayload::new().title("b"));
    a.update(ToastPatch::new().variant(Variant::Destructive));
    toaster.dismiss(None);
    toaster.clear();

    let versions: Vec<u64> = recorder.all().iter().map(|s| s.version).collect();
    assert_eq!(versions, vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_new_outside_runtime_fails() {
    let result = Toaster::new(ToasterConfig::default());
    assert!(matches!(result, Err(ToastError::NoRuntime)));
}

#[tokio::test]
async fn test_zero_limit_is_raised_to_one() {
    let toaster = test_toaster(0);
    assert_eq!(toaster.config().max_visible, 1);

    let handle = toaster.notify(ToastPayload::new().title("Hi"));
    assert!(toaster.snapshot().contains(handle.id()));
}

#[test]
fn test_config_from_toast_section() {
    let section = ToastConfig {
        limit: 4,
        remove_delay_ms: 250,
    };
    let config = ToasterConfig::from(&section);
    assert_eq!(config.max_visible, 4);
    assert_eq!(config.remove_delay, Duration::from_millis(250));
}

#[tokio::test(start_paused = true)]
async fn test_custom_remove_delay() {
    let toaster = Toaster::new(
        ToasterConfig::default().remove_delay(Duration::from_millis(50)),
    )
    .unwrap();
    let handle = toaster.notify(ToastPayload::new().title("Hi"));
    handle.dismiss();

    tokio::time::sleep(Duration::from_millis(51)).await;
    assert!(toaster.snapshot().is_empty());
}

#[tokio::test]
async fn test_dropped_channel_receivers_are_deregistered() {
    let toaster = test_toaster(1);
    for _ in 0..100 {
        let (_sub, rx) = toaster.subscribe_channel();
        drop(rx);
    }
    assert_eq!(toaster.subscriber_count(), 100);

    toaster.notify(ToastPayload::new().title("Hi"));

    assert_eq!(toaster.subscriber_count(), 0);
}

#[tokio::test]
async fn test_live_channel_survives_pruning_of_dropped_ones() {
    let toaster = test_toaster(1);
    let (_gone, dropped) = toaster.subscribe_channel();
    drop(dropped);
    let (_kept, mut rx) = toaster.subscribe_channel();

    toaster.notify(ToastPayload::new().title("Hi"));

    assert_eq!(toaster.subscriber_count(), 1);
    assert_eq!(rx.recv().await.unwrap().version, 1);
}

#[tokio::test]
async fn test_debug_inside_listener_does_not_block() {
    let toaster = test_toaster(1);
    let weak = toaster.downgrade();
    let rendered = std::sync::Arc::new(std::sync::Mutex::new(String::new()));
    let sink = std::sync::Arc::clone(&rendered);
    let sub = toaster.subscribe(move |_| {
        if let Some(toaster) = weak.upgrade() {
            *sink.lock().unwrap() = format!("{:?}", toaster);
        }
    });

    toaster.notify(ToastPayload::new().title("Hi"));
    sub.unsubscribe();

    assert!(rendered.lock().unwrap().contains("<locked>"));
    assert!(format!("{:?}", toaster).contains("active: 1"));
}

#[tokio::test]
async fn test_handle_does_not_keep_queue_alive() {
    let toaster = test_toaster(1);
    let weak = toaster.downgrade();
    let handle = toaster.notify(ToastPayload::new().title("Hi"));
    handle.dismiss();

    drop(toaster);

    assert!(weak.upgrade().is_none());
    handle.dismiss();
    handle.update(ToastPatch::new().title("late"));
}

#[tokio::test]
async fn test_listener_holding_weak_toaster_allows_teardown() {
    let toaster = test_toaster(1);
    let weak = toaster.downgrade();
    let captured = toaster.downgrade();
    let _sub = toaster.subscribe(move |_| {
        let _ = captured.upgrade().is_some();
    });

    drop(toaster);

    assert!(weak.upgrade().is_none());
}

mod property_tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::{HashMap, HashSet};

    #[derive(Debug, Clone)]
    enum Op {
        Notify,
        Update(usize),
        Dismiss(usize),
        DismissAll,
        Close(usize),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => Just(Op::Notify),
            1 => (0usize..8).prop_map(Op::Update),
            1 => (0usize..8).prop_map(Op::Dismiss),
            1 => Just(Op::DismissAll),
            1 => (0usize..8).prop_map(Op::Close),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        // Limit, id uniqueness and one-way visibility hold for any call sequence.
        #[test]
        fn prop_queue_invariants_hold(
            limit in 1usize..4,
            ops in prop::collection::vec(op_strategy(), 1..40),
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .unwrap();
            let toaster = Toaster::with_handle(
                ToasterConfig::default().max_visible(limit),
                runtime.handle().clone(),
            );
            let (recorder, _sub) = Recorder::attach(&toaster);
            let mut handles: Vec<ToastHandle> = Vec::new();

            for op in ops {
                match op {
                    Op::Notify => handles.push(toaster.notify(ToastPayload::new().title("t"))),
                    Op::Update(i) => {
                        if let Some(h) = handles.get(i) {
                            h.update(ToastPatch::new().description("d"));
                        }
                    }
                    Op::Dismiss(i) => {
                        if let Some(h) = handles.get(i) {
                            h.dismiss();
                        }
                    }
                    Op::DismissAll => toaster.dismiss(None),
                    Op::Close(i) => {
                        if let Some(h) = handles.get(i) {
                            toaster.on_external_close(h.id());
                        }
                    }
                }
            }

            let mut hidden_seen: HashMap<NotificationId, bool> = HashMap::new();
            let mut last_version = 0;
            for snapshot in recorder.all() {
                prop_assert!(snapshot.len() <= limit);
                prop_assert!(snapshot.version > last_version);
                last_version = snapshot.version;

                let unique: HashSet<NotificationId> = snapshot.iter().map(Notification::id).collect();
                prop_assert_eq!(unique.len(), snapshot.len());

                for item in snapshot.iter() {
                    let was_hidden = hidden_seen.get(&item.id()).copied().unwrap_or(false);
                    prop_assert!(!(was_hidden && item.is_visible()), "toast {} resurrected", item.id());
                    hidden_seen.insert(item.id(), !item.is_visible());
                }
            }
            prop_assert!(toaster.pending_removals() <= limit);
        }
    }
}
