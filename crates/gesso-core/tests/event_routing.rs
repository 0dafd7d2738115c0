use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use gesso_core::{EventName, GessoError, InputEvent, Listener, Point, SurfaceOptions, SPACE_KEY};
use gesso_testing::TestHost;

fn counter() -> (Rc<Cell<u32>>, impl Fn() -> Result<(), GessoError> + 'static) {
    let count = Rc::new(Cell::new(0));
    let hits = count.clone();
    (count, move || {
        hits.set(hits.get() + 1);
        Ok(())
    })
}

#[test]
fn keydown_bound_twice_fires_twice() {
    let mut host = TestHost::new();
    let gesso = host.create(&SurfaceOptions::new()).unwrap();
    let count = Rc::new(Cell::new(0));
    for _ in 0..2 {
        let count = count.clone();
        let _ = gesso.keydown(65, move || {
            count.set(count.get() + 1);
            Ok(())
        });
    }
    host.key_down(65).unwrap();
    assert_eq!(count.get(), 2);
}

#[test]
fn key_bindings_are_document_wide() {
    let mut host = TestHost::new();
    let first = host.create(&SurfaceOptions::new()).unwrap();
    let second = host.create(&SurfaceOptions::new()).unwrap();
    let (count, callback) = counter();
    let _handle = first.keyup(13, callback);
    assert_eq!(second.router().document().listeners().count(&EventName::KeyUp), 1);
    host.key_up(13).unwrap();
    assert_eq!(count.get(), 1);
}

#[test]
fn disposing_a_key_binding_removes_exactly_it() {
    let mut host = TestHost::new();
    let gesso = host.create(&SurfaceOptions::new()).unwrap();
    let (kept, keep_callback) = counter();
    let (gone, gone_callback) = counter();
    let keep = gesso.keyup(37, keep_callback);
    let disposer = gesso.keyup(37, gone_callback);
    disposer.dispose();
    host.key_up(37).unwrap();
    assert_eq!((kept.get(), gone.get()), (1, 0));
    assert!(keep.is_bound());
}

#[test]
fn click_toggle_round_trip_leaves_no_click_listeners() {
    let mut host = TestHost::new();
    let gesso = host.create(&SurfaceOptions::new()).unwrap();
    gesso.toggle_play_on_click(true);
    gesso.toggle_play_on_click(false);
    assert_eq!(
        gesso.surface().listeners().count(&EventName::Click),
        0
    );
    host.click(Point::new(5.0, 5.0)).unwrap();
    assert!(!gesso.is_running());
}

#[test]
fn clicks_toggle_only_the_surface_under_the_pointer() {
    let mut host = TestHost::new();
    let left = host
        .create(&SurfaceOptions::new().with_size(100, 100))
        .unwrap();
    let right = host
        .create(&SurfaceOptions::new().at(200.0, 0.0).with_size(100, 100))
        .unwrap();
    left.toggle_play_on_click(true);
    right.toggle_play_on_click(true);

    host.click(Point::new(250.0, 50.0)).unwrap();
    assert!(right.is_running());
    assert!(!left.is_running());

    host.advance(Duration::from_millis(100)).unwrap();
    host.click(Point::new(250.0, 50.0)).unwrap();
    assert!(!right.is_running());
    assert_eq!(left.controller().frame_count(), 0);
}

#[test]
fn space_toggles_and_other_keys_do_not() {
    let mut host = TestHost::new();
    let gesso = host.create(&SurfaceOptions::new()).unwrap();
    gesso.toggle_play_on_space(true);
    host.key_up(13).unwrap();
    assert!(!gesso.is_running());
    host.key_up(SPACE_KEY).unwrap();
    assert!(gesso.is_running());
    host.key_up(SPACE_KEY).unwrap();
    assert!(!gesso.is_running());
    gesso.toggle_play_on_space(false);
    host.key_up(SPACE_KEY).unwrap();
    assert!(!gesso.is_running());
}

#[test]
fn pointer_events_carry_surface_local_positions() {
    let mut host = TestHost::new();
    let gesso = host
        .create(&SurfaceOptions::new().at(40.0, 30.0).with_size(50, 50))
        .unwrap();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let listener = Listener::new(move |event: &InputEvent| {
        sink.borrow_mut().push((event.name.clone(), event.position));
        Ok(())
    });
    let _handle = gesso.on("mousemove", &listener);
    host.host()
        .dispatch_pointer(EventName::MouseMove, Point::new(45.0, 35.0))
        .unwrap();
    gesso.off("mousemove", &listener);
    host.host()
        .dispatch_pointer(EventName::MouseMove, Point::new(45.0, 35.0))
        .unwrap();
    assert_eq!(
        *seen.borrow(),
        vec![(EventName::MouseMove, Some(Point::new(5.0, 5.0)))]
    );
}

#[test]
fn failing_listener_does_not_starve_the_others() {
    let mut host = TestHost::new();
    let gesso = host.create(&SurfaceOptions::new()).unwrap();
    let _failing = gesso.keydown(70, || {
        Err(GessoError::listener(EventName::KeyDown, "listener broke"))
    });
    let (count, callback) = counter();
    let _ok = gesso.keydown(70, callback);
    let err = host.key_down(70).unwrap_err();
    assert!(matches!(err, GessoError::ListenerFailure { .. }));
    assert_eq!(count.get(), 1);
}
