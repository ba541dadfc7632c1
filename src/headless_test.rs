use std::cell::RefCell;

use super::*;

fn recorder(log: &Rc<RefCell<Vec<String>>>, label: &'static str) -> InputHandler {
    let log = Rc::clone(log);
    Rc::new(move |raw: &RawEvent| log.borrow_mut().push(format!("{label}@{},{}", raw.client_x, raw.client_y)))
}

// =============================================================
// Host
// =============================================================

#[test]
fn resolve_finds_registered_container() {
    let host = HeadlessHost::new();
    host.add_container("#board", Rect::new(0.0, 0.0, 300.0, 150.0));
    let container = host.resolve("#board").unwrap();
    assert_eq!(container.bounding_rect().size(), Size::new(300.0, 150.0));
    assert!(host.resolve("#missing").is_none());
}

#[test]
fn create_surface_records_surface_with_context() {
    let host = HeadlessHost::new();
    let surface = host.create_surface(Size::new(40.0, 20.0));
    assert_eq!(surface.size(), Size::new(40.0, 20.0));
    assert!(surface.context().is_some());
    assert_eq!(host.surface_count(), 1);
    assert!(host.last_surface().is_some());
}

#[test]
fn disable_context_affects_new_surfaces() {
    let host = HeadlessHost::new();
    host.disable_context();
    let surface = host.create_surface(Size::new(1.0, 1.0));
    assert!(surface.context().is_none());
}

#[test]
fn window_listener_teardown_removes_only_that_listener() {
    let host = HeadlessHost::new();
    let log = Rc::new(RefCell::new(Vec::new()));
    let first = host.listen_window(ListenerKind::Click, recorder(&log, "a"));
    let _second = host.listen_window(ListenerKind::Click, recorder(&log, "b"));
    assert_eq!(host.window_listener_count(), 2);

    first.run();
    assert_eq!(host.window_listener_count(), 1);
    assert_eq!(host.dispatch_window(ListenerKind::Click, &RawEvent::mouse(1.0, 2.0)), 1);
    assert_eq!(*log.borrow(), vec!["b@1,2".to_owned()]);
}

#[test]
fn dispatch_only_reaches_matching_kind() {
    let host = HeadlessHost::new();
    let log = Rc::new(RefCell::new(Vec::new()));
    let _up = host.listen_window(ListenerKind::MouseUp, recorder(&log, "up"));
    assert_eq!(host.dispatch_window(ListenerKind::TouchEnd, &RawEvent::default()), 0);
    assert!(log.borrow().is_empty());
}

// =============================================================
// Surface
// =============================================================

#[test]
fn surface_bounding_rect_follows_move_to() {
    let host = HeadlessHost::new();
    host.create_surface(Size::new(100.0, 50.0));
    let surface = host.last_surface().unwrap();
    assert_eq!(surface.bounding_rect(), Rect::new(0.0, 0.0, 100.0, 50.0));
    surface.move_to(30.0, 40.0);
    assert_eq!(surface.bounding_rect(), Rect::new(30.0, 40.0, 100.0, 50.0));
}

#[test]
fn surface_context_records_clears() {
    let host = HeadlessHost::new();
    let surface = host.create_surface(Size::new(10.0, 10.0));
    let rect = Rect::from_size(surface.size());
    surface.context().unwrap().clear_rect(rect);
    let recorded = host.last_surface().unwrap().headless_context().unwrap().clears();
    assert_eq!(recorded, vec![rect]);
}

#[test]
fn listener_removed_during_dispatch_still_runs_this_round() {
    let host = HeadlessHost::new();
    host.create_surface(Size::new(10.0, 10.0));
    let surface = host.last_surface().unwrap();
    let log = Rc::new(RefCell::new(Vec::new()));

    let pending: Rc<RefCell<Option<Teardown>>> = Rc::new(RefCell::new(None));
    let slot = Rc::clone(&pending);
    let _remover = surface.listen(
        ListenerKind::Click,
        Rc::new(move |_: &RawEvent| {
            if let Some(teardown) = slot.borrow_mut().take() {
                teardown.run();
            }
        }),
    );
    *pending.borrow_mut() = Some(surface.listen(ListenerKind::Click, recorder(&log, "victim")));

    assert_eq!(surface.dispatch(ListenerKind::Click, &RawEvent::mouse(0.0, 0.0)), 2);
    assert_eq!(log.borrow().len(), 1);
    assert_eq!(surface.listener_count_for(ListenerKind::Click), 1);
}

// =============================================================
// Container
// =============================================================

#[test]
fn container_append_and_remove_by_identity() {
    let host = HeadlessHost::new();
    let container = host.add_container("#c", Rect::new(0.0, 0.0, 10.0, 10.0));
    let a = host.create_surface(Size::new(10.0, 10.0));
    let b = host.create_surface(Size::new(10.0, 10.0));
    container.append_surface(Rc::clone(&a));
    container.append_surface(Rc::clone(&b));
    assert_eq!(container.child_count(), 2);

    container.remove_surface(&a);
    assert_eq!(container.child_count(), 1);
    container.remove_surface(&a);
    assert_eq!(container.child_count(), 1);
}

// =============================================================
// Simulation helpers
// =============================================================

#[test]
fn simulate_click_replays_browser_order() {
    let host = HeadlessHost::new();
    host.create_surface(Size::new(10.0, 10.0));
    let surface = host.last_surface().unwrap();
    let log = Rc::new(RefCell::new(Vec::new()));
    let _handles = [
        surface.listen(ListenerKind::MouseDown, recorder(&log, "down")),
        surface.listen(ListenerKind::Click, recorder(&log, "click")),
        host.listen_window(ListenerKind::MouseUp, recorder(&log, "up")),
        host.listen_window(ListenerKind::Click, recorder(&log, "window")),
    ];

    host.simulate_click(&surface, 3.0, 4.0);
    assert_eq!(*log.borrow(), vec!["down@3,4", "up@3,4", "click@3,4", "window@3,4"]);
}

#[test]
fn simulate_tap_ends_with_empty_touch_list() {
    let host = HeadlessHost::new();
    host.create_surface(Size::new(10.0, 10.0));
    let surface = host.last_surface().unwrap();
    let ends = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&ends);
    let _end = host.listen_window(
        ListenerKind::TouchEnd,
        Rc::new(move |raw: &RawEvent| sink.borrow_mut().push(raw.touches.len())),
    );

    host.simulate_tap(&surface, 5.0, 5.0);
    assert_eq!(*ends.borrow(), vec![0]);
}
