//! End-to-end: a host page with one board, the drag plugin, and a user who
//! clicks, double-clicks, drags, reconfigures, and finally tears down.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use marksurface::drag;
use marksurface::geom::{Point, Rect};
use marksurface::headless::HeadlessHost;
use marksurface::host::ListenerKind;
use marksurface::input::RawEvent;
use marksurface::topic;
use marksurface::{Engine, EngineConfig, InsertAt, Lifecycle, PluginRegistry, Signal};
use serde_json::json;
use tokio::task::LocalSet;
use tokio::time::sleep;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().with_max_level(tracing::Level::DEBUG).try_init();
}

fn journal(engine: &Engine) -> Rc<RefCell<Vec<String>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let watched = [
        topic::CLICK,
        topic::DOUBLE_CLICK,
        topic::UPDATED_OPT,
        topic::DESTORY,
        topic::DRAG_START,
        topic::DRAG_END,
    ];
    for name in watched {
        let sink = Rc::clone(&log);
        engine.on(name, move |_: &Signal| sink.borrow_mut().push(name.to_owned()));
    }
    log
}

fn drain(log: &Rc<RefCell<Vec<String>>>) -> Vec<String> {
    std::mem::take(&mut *log.borrow_mut())
}

#[tokio::test(start_paused = true)]
async fn full_session() {
    init_tracing();
    LocalSet::new()
        .run_until(async {
            let host = HeadlessHost::new();
            let board = host.add_container("#board", Rect::new(0.0, 0.0, 640.0, 480.0));
            let registry = PluginRegistry::new();
            registry.install(&drag::plugin(), InsertAt::Append);

            let config = EngineConfig::new("#board").with_double_click_window_ms(150);
            let engine = Engine::new(config, &host, &registry).unwrap();
            let surface = host.last_surface().unwrap();
            let log = journal(&engine);

            engine.ready().await.unwrap();
            assert_eq!(engine.lifecycle(), Lifecycle::Ready);

            // Two clicks 100ms apart inside a 150ms window.
            host.simulate_click(&surface, 10.0, 10.0);
            sleep(Duration::from_millis(100)).await;
            host.simulate_click(&surface, 10.0, 10.0);
            sleep(Duration::from_millis(300)).await;
            assert_eq!(drain(&log), vec![topic::DOUBLE_CLICK]);

            // Two clicks 200ms apart.
            host.simulate_click(&surface, 10.0, 10.0);
            sleep(Duration::from_millis(200)).await;
            host.simulate_click(&surface, 10.0, 10.0);
            sleep(Duration::from_millis(300)).await;
            assert_eq!(drain(&log), vec![topic::CLICK, topic::CLICK]);

            // A drag across the board.
            surface.dispatch(ListenerKind::MouseDown, &RawEvent::mouse(100.0, 100.0));
            surface.dispatch(ListenerKind::MouseMove, &RawEvent::mouse(140.0, 120.0));
            host.dispatch_window(ListenerKind::MouseUp, &RawEvent::mouse(150.0, 120.0));
            assert_eq!(drain(&log), vec![topic::DRAG_START, topic::DRAG_END]);

            // Reconfigure with the legacy key.
            let opts = engine.update_opt(json!({ "dbClickTime": 400 })).unwrap();
            assert_eq!(opts.double_click_window_ms, 400);
            assert_eq!(drain(&log), vec![topic::UPDATED_OPT]);

            surface.move_to(20.0, 30.0);
            assert_eq!(engine.to_canvas_pos(Point::new(25.0, 35.0)).unwrap(), Point::new(5.0, 5.0));

            engine.destroy();
            assert_eq!(drain(&log), vec![topic::DESTORY]);
            assert_eq!(board.child_count(), 0);
            assert_eq!(host.window_listener_count(), 0);
            assert!(engine.bus().is_empty());
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn engines_on_one_page_are_independent() {
    init_tracing();
    LocalSet::new()
        .run_until(async {
            let host = HeadlessHost::new();
            host.add_container("#left", Rect::new(0.0, 0.0, 100.0, 100.0));
            host.add_container("#right", Rect::new(100.0, 0.0, 100.0, 100.0));
            let registry = PluginRegistry::new();

            let left = Engine::new(EngineConfig::new("#left"), &host, &registry).unwrap();
            let left_surface = host.last_surface().unwrap();
            let right = Engine::new(EngineConfig::new("#right"), &host, &registry).unwrap();
            let left_log = journal(&left);
            let right_log = journal(&right);

            host.simulate_click(&left_surface, 5.0, 5.0);
            sleep(Duration::from_millis(500)).await;
            assert_eq!(drain(&left_log), vec![topic::CLICK]);
            assert!(drain(&right_log).is_empty());

            left.destroy();
            assert_eq!(right.lifecycle(), Lifecycle::Ready);
            assert_eq!(host.window_listener_count(), 3);
        })
        .await;
}
