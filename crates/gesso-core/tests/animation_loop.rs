use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use gesso_core::{Color, GessoConfig, GessoError, Surface, SurfaceOptions};
use gesso_testing::{MemorySurface, SurfaceOp, TestHost};

#[test]
fn play_ticks_immediately_then_every_frame_delay() {
    let mut host = TestHost::new();
    let gesso = host.create(&SurfaceOptions::new()).unwrap();
    gesso.set_fps(50.0).unwrap();
    let times = Rc::new(RefCell::new(Vec::new()));
    let sink = times.clone();
    gesso.on_render(move |frame| {
        sink.borrow_mut().push(frame.time());
        Ok(())
    });

    gesso.play().unwrap();
    assert_eq!(times.borrow().len(), 1);

    host.advance(Duration::from_millis(100)).unwrap();
    let times = times.borrow();
    assert_eq!(times.len(), 6);
    assert_eq!(times[1], Duration::from_millis(20));
    assert_eq!(times[5], Duration::from_millis(100));
}

#[test]
fn demo_configuration_clears_to_lightblue_each_frame() {
    let mut host = TestHost::new();
    let gesso = host.create(&SurfaceOptions::new()).unwrap();
    gesso
        .apply_config(
            &GessoConfig::new()
                .with_fps(30.0)
                .with_background("lightblue".parse::<Color>().unwrap()),
        )
        .unwrap();
    let offset = Rc::new(Cell::new(0.0f32));
    let phase = offset.clone();
    gesso.on_render(move |frame| {
        let width = frame.width();
        frame.context().push(format!("wave {width} {}", phase.get()));
        phase.set(phase.get() - 0.5);
        Ok(())
    });
    gesso.play().unwrap();
    host.advance(Duration::from_secs(1)).unwrap();

    let surface = gesso.surface().borrow();
    assert_eq!(surface.clear_count(), 31);
    assert_eq!(surface.last_clear(), Some(Some(Color::LIGHT_BLUE)));
    assert_eq!(surface.drawn().len(), 31);
    assert_eq!(surface.drawn()[0], "wave 800 0");
    assert_eq!(offset.get(), -15.5);
}

#[test]
fn clear_frame_off_leaves_surface_untouched() {
    let mut host = TestHost::new();
    let gesso = host.create(&SurfaceOptions::new()).unwrap();
    gesso.set_clear_frame(false);
    gesso.play().unwrap();
    host.advance(Duration::from_millis(100)).unwrap();
    assert!(gesso.controller().frame_count() > 1);
    assert_eq!(gesso.surface().borrow().clear_count(), 0);
}

#[test]
fn stop_never_ticks_and_nothing_fires_afterwards() {
    let mut host = TestHost::new();
    let gesso = host.create(&SurfaceOptions::new()).unwrap();
    gesso.stop();
    assert_eq!(gesso.controller().frame_count(), 0);
    gesso.play().unwrap();
    gesso.stop();
    host.advance(Duration::from_secs(2)).unwrap();
    assert_eq!(gesso.controller().frame_count(), 1);
    assert!(!host.runtime().has_pending_work());
}

#[test]
fn rate_change_while_running_keeps_the_armed_delay() {
    let mut host = TestHost::new();
    let gesso = host.create(&SurfaceOptions::new()).unwrap();
    gesso.set_fps(10.0).unwrap();
    gesso.play().unwrap();
    gesso.set_fps(1000.0).unwrap();

    host.advance(Duration::from_millis(99)).unwrap();
    assert_eq!(gesso.controller().frame_count(), 1);
    host.advance(Duration::from_millis(1)).unwrap();
    assert_eq!(gesso.controller().frame_count(), 2);
    host.advance(Duration::from_millis(10)).unwrap();
    assert_eq!(gesso.controller().frame_count(), 12);
}

#[test]
fn render_failure_surfaces_to_the_pump_and_halts() {
    let mut host = TestHost::new();
    let gesso = host.create(&SurfaceOptions::new()).unwrap();
    gesso.on_render(|frame| {
        if frame.index() == 3 {
            return Err("out of ink".into());
        }
        Ok(())
    });
    gesso.play().unwrap();
    let err = host.advance(Duration::from_secs(1)).unwrap_err();
    match err {
        GessoError::CallbackFailure { frame, source } => {
            assert_eq!(frame, 3);
            assert_eq!(source.to_string(), "out of ink");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!gesso.is_running());
    assert!(!host.runtime().has_pending_work());
}

#[test]
fn hosts_without_frame_sync_tick_from_timers() {
    let mut host = TestHost::without_frame_sync();
    let gesso = host.create(&SurfaceOptions::new()).unwrap();
    gesso.set_fps(20.0).unwrap();
    gesso.play().unwrap();
    host.advance(Duration::from_millis(200)).unwrap();
    assert_eq!(gesso.controller().frame_count(), 5);
    assert_eq!(host.scheduler().frames_requested(), 0);
}

#[test]
fn frame_sync_hosts_request_one_frame_per_tick() {
    let mut host = TestHost::new();
    let gesso = host.create(&SurfaceOptions::new()).unwrap();
    gesso.set_fps(20.0).unwrap();
    gesso.play().unwrap();
    host.advance(Duration::from_millis(200)).unwrap();
    assert_eq!(gesso.controller().frame_count(), 5);
    assert_eq!(host.scheduler().frames_requested(), 4);
    assert_eq!(host.scheduler().wakeups().len(), 5);
}

#[test]
fn set_size_resizes_the_backing_surface() {
    let mut host = TestHost::new();
    let gesso = host
        .create(&SurfaceOptions::new().with_size(64, 32))
        .unwrap();
    gesso.set_size(128, 96);
    assert_eq!((gesso.width(), gesso.height()), (128, 96));
    let surface = gesso.surface().borrow();
    assert_eq!(surface.size().area(), 128 * 96);
    assert!(matches!(surface.ops(), [SurfaceOp::Resize(_)]));
}

#[test]
fn attach_reports_missing_ids() {
    let mut host = TestHost::new();
    let existing = host
        .host_mut()
        .provider_mut()
        .insert_drawable("art", MemorySurface::default(), Default::default());
    let attached = gesso_core::Gesso::attach(host.host(), "art").unwrap();
    assert!(attached.surface().ptr_eq(&existing));
    let err = gesso_core::Gesso::attach(host.host(), "missing-id").unwrap_err();
    assert!(matches!(
        err,
        GessoError::InvalidSurfaceReference { ref reference } if reference == "missing-id"
    ));
}

#[test]
fn stopping_a_sibling_mid_frame_skips_its_queued_tick() {
    let mut host = TestHost::new();
    let first = host.create(&SurfaceOptions::new()).unwrap();
    let second = host.create(&SurfaceOptions::new()).unwrap();
    let sibling = second.controller().clone();
    first.on_render(move |frame| {
        if frame.index() == 1 {
            sibling.stop();
        }
        Ok(())
    });
    let renders = Rc::new(Cell::new(0));
    let counter = renders.clone();
    second.on_render(move |_| {
        counter.set(counter.get() + 1);
        Ok(())
    });

    first.play().unwrap();
    second.play().unwrap();
    host.advance(Duration::from_millis(17)).unwrap();

    assert_eq!(first.controller().frame_count(), 2);
    assert_eq!(renders.get(), 1);
    assert_eq!(second.controller().frame_count(), 1);
    assert!(!second.is_running());
}

#[test]
fn nested_play_on_a_shared_surface_halts_with_surface_busy() {
    let mut host = TestHost::new();
    host.host_mut()
        .provider_mut()
        .insert_drawable("art", MemorySurface::default(), Default::default());
    let outer = gesso_core::Gesso::attach(host.host(), "art").unwrap();
    let inner = gesso_core::Gesso::attach(host.host(), "art").unwrap();
    let nested = inner.controller().clone();
    outer.on_render(move |_| {
        nested.play()?;
        Ok(())
    });

    let err = outer.play().unwrap_err();
    match err {
        GessoError::CallbackFailure { frame, source } => {
            assert_eq!(frame, 0);
            assert!(matches!(
                source.downcast_ref::<GessoError>(),
                Some(GessoError::SurfaceBusy)
            ));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!inner.is_running());
    assert_eq!(inner.controller().frame_count(), 0);
    assert!(!outer.is_running());
}
