#![allow(clippy::float_cmp)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::*;

const WINDOW: Duration = Duration::from_millis(200);

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

// =============================================================
// normalize
// =============================================================

#[test]
fn mouse_mode_passes_client_coordinates_through() {
    let ev = normalize(&RawEvent::mouse(12.0, 34.0), false);
    assert_eq!(ev.client, Point::new(12.0, 34.0));
    assert_eq!(ev.source, PointerSource::Mouse);
}

#[test]
fn mouse_mode_ignores_touch_list() {
    let raw = RawEvent { client_x: 1.0, client_y: 2.0, touches: vec![TouchPoint::new(0, 50.0, 60.0)] };
    let ev = normalize(&raw, false);
    assert_eq!(ev.client, Point::new(1.0, 2.0));
}

#[test]
fn touch_mode_uses_first_touch_point() {
    let raw = RawEvent::touch(vec![TouchPoint::new(7, 5.0, 6.0), TouchPoint::new(8, 90.0, 90.0)]);
    let ev = normalize(&raw, true);
    assert_eq!(ev.client, Point::new(5.0, 6.0));
    assert_eq!(ev.source, PointerSource::Touch);
}

#[test]
fn touch_mode_without_touch_point_is_synthetic_zero() {
    let ev = normalize(&RawEvent::touch(Vec::new()), true);
    assert!(ev.is_synthetic());
    assert_eq!(ev.client, Point::new(0.0, 0.0));
}

#[test]
fn raw_event_deserializes_without_touches() {
    let raw: RawEvent = serde_json::from_str(r#"{"client_x": 3.0, "client_y": 4.0}"#).unwrap();
    assert_eq!(raw, RawEvent::mouse(3.0, 4.0));
}

// =============================================================
// ClickTracker
// =============================================================

#[test]
fn first_click_is_pending() {
    let mut clicks = ClickTracker::new();
    let t0 = Instant::now();
    assert_eq!(clicks.register(t0, WINDOW), ClickOutcome::Pending);
    assert_eq!(clicks.last_click(), Some(t0));
}

#[test]
fn second_click_inside_window_is_double() {
    let mut clicks = ClickTracker::new();
    let t0 = Instant::now();
    clicks.register(t0, WINDOW);
    assert_eq!(clicks.register(t0 + ms(150), WINDOW), ClickOutcome::Double);
    assert!(clicks.last_click().is_none());
}

#[test]
fn second_click_exactly_at_window_is_double() {
    let mut clicks = ClickTracker::new();
    let t0 = Instant::now();
    clicks.register(t0, WINDOW);
    assert_eq!(clicks.register(t0 + WINDOW, WINDOW), ClickOutcome::Double);
}

#[test]
fn second_click_after_window_is_pending_again() {
    let mut clicks = ClickTracker::new();
    let t0 = Instant::now();
    clicks.register(t0, WINDOW);
    let t1 = t0 + ms(201);
    assert_eq!(clicks.register(t1, WINDOW), ClickOutcome::Pending);
    assert_eq!(clicks.last_click(), Some(t1));
}

#[test]
fn third_click_after_double_starts_fresh_cycle() {
    let mut clicks = ClickTracker::new();
    let t0 = Instant::now();
    clicks.register(t0, WINDOW);
    clicks.register(t0 + ms(50), WINDOW);
    assert_eq!(clicks.register(t0 + ms(60), WINDOW), ClickOutcome::Pending);
}

#[test]
fn reset_forgets_last_click() {
    let mut clicks = ClickTracker::new();
    let t0 = Instant::now();
    clicks.register(t0, WINDOW);
    clicks.reset();
    assert_eq!(clicks.register(t0 + ms(10), WINDOW), ClickOutcome::Pending);
}

// =============================================================
// PointerState
// =============================================================

#[test]
fn pointer_state_defaults_to_zero() {
    let state = PointerState::default();
    assert_eq!(state.down_position, Point::default());
    assert_eq!(state.up_position, Point::default());
    assert!(state.pending_click.is_none());
    assert!(state.clicks.last_click().is_none());
}

#[test]
fn cancel_without_pending_timer_returns_false() {
    let mut state = PointerState::default();
    assert!(!state.cancel_pending_click());
}

#[tokio::test(start_paused = true)]
async fn cancel_aborts_pending_timer() {
    let fired = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&fired);
    let mut state = PointerState::default();
    state.pending_click = Some(tokio::spawn(async move {
        tokio::time::sleep(WINDOW).await;
        flag.store(true, Ordering::SeqCst);
    }));

    assert!(state.cancel_pending_click());
    tokio::time::sleep(WINDOW * 2).await;
    assert!(!fired.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn clear_resets_positions_and_timer() {
    let mut state = PointerState {
        down_position: Point::new(1.0, 2.0),
        up_position: Point::new(3.0, 4.0),
        ..PointerState::default()
    };
    state.clicks.register(Instant::now(), WINDOW);
    state.pending_click = Some(tokio::spawn(async {}));

    state.clear();
    assert_eq!(state.down_position, Point::default());
    assert_eq!(state.up_position, Point::default());
    assert!(state.pending_click.is_none());
    assert!(state.clicks.last_click().is_none());
}
