//! Input event routing.
//!
//! Key events are bound on the shared [`Document`] because a drawing surface
//! cannot reliably take keyboard focus; every other event is bound on the
//! surface's own listener table.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use gesso_ui_graphics::Point;

use crate::collections::map::HashMap;
use crate::error::{keep_first, GessoError};

/// DOM key code of the space bar.
pub const SPACE_KEY: u32 = 32;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventName {
    KeyUp,
    KeyDown,
    Click,
    MouseDown,
    MouseUp,
    MouseMove,
    Custom(String),
}

impl EventName {
    pub fn as_str(&self) -> &str {
        match self {
            EventName::KeyUp => "keyup",
            EventName::KeyDown => "keydown",
            EventName::Click => "click",
            EventName::MouseDown => "mousedown",
            EventName::MouseUp => "mouseup",
            EventName::MouseMove => "mousemove",
            EventName::Custom(name) => name,
        }
    }

    pub fn is_keyboard(&self) -> bool {
        matches!(self, EventName::KeyUp | EventName::KeyDown)
    }
}

impl From<&str> for EventName {
    fn from(name: &str) -> Self {
        match name {
            "keyup" => EventName::KeyUp,
            "keydown" => EventName::KeyDown,
            "click" => EventName::Click,
            "mousedown" => EventName::MouseDown,
            "mouseup" => EventName::MouseUp,
            "mousemove" => EventName::MouseMove,
            other => EventName::Custom(other.to_string()),
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct InputEvent {
    pub name: EventName,
    /// DOM numeric key code, for keyboard events.
    pub key_code: Option<u32>,
    /// Surface-local position, for pointer events.
    pub position: Option<Point>,
}

impl InputEvent {
    pub fn new(name: impl Into<EventName>) -> Self {
        Self {
            name: name.into(),
            key_code: None,
            position: None,
        }
    }

    pub fn key_up(key_code: u32) -> Self {
        Self {
            key_code: Some(key_code),
            ..Self::new(EventName::KeyUp)
        }
    }

    pub fn key_down(key_code: u32) -> Self {
        Self {
            key_code: Some(key_code),
            ..Self::new(EventName::KeyDown)
        }
    }

    pub fn pointer(name: impl Into<EventName>, position: Point) -> Self {
        Self {
            position: Some(position),
            ..Self::new(name)
        }
    }

    pub fn click(position: Point) -> Self {
        Self::pointer(EventName::Click, position)
    }
}

pub type EventResult = Result<(), GessoError>;

/// Event callback compared by identity, like a DOM listener reference.
#[derive(Clone)]
pub struct Listener(Rc<dyn Fn(&InputEvent) -> EventResult>);

impl Listener {
    pub fn new(callback: impl Fn(&InputEvent) -> EventResult + 'static) -> Self {
        Self(Rc::new(callback))
    }

    pub fn call(&self, event: &InputEvent) -> EventResult {
        (self.0)(event)
    }

    pub fn ptr_eq(&self, other: &Listener) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

type ListenerMap = HashMap<EventName, Vec<Listener>>;

/// Listeners bound on one event target.
#[derive(Clone, Default)]
pub struct ListenerTable(Rc<RefCell<ListenerMap>>);

impl ListenerTable {
    /// Binds `listener`; binding the identical listener twice is a no-op.
    pub fn add(&self, name: EventName, listener: Listener) -> bool {
        let mut map = self.0.borrow_mut();
        let bound = map.entry(name).or_default();
        if bound.iter().any(|existing| existing.ptr_eq(&listener)) {
            return false;
        }
        bound.push(listener);
        true
    }

    /// Unbinds `listener`; a listener that was never bound is ignored.
    pub fn remove(&self, name: &EventName, listener: &Listener) -> bool {
        let mut map = self.0.borrow_mut();
        let Some(bound) = map.get_mut(name) else {
            return false;
        };
        let before = bound.len();
        bound.retain(|existing| !existing.ptr_eq(listener));
        let removed = bound.len() != before;
        if bound.is_empty() {
            map.remove(name);
        }
        removed
    }

    pub fn count(&self, name: &EventName) -> usize {
        self.0.borrow().get(name).map(Vec::len).unwrap_or(0)
    }

    pub fn contains(&self, name: &EventName, listener: &Listener) -> bool {
        self.0
            .borrow()
            .get(name)
            .map(|bound| bound.iter().any(|existing| existing.ptr_eq(listener)))
            .unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    /// Calls every listener bound for the event, in binding order.
    ///
    /// The list is snapshotted first, so listeners bound while running wait
    /// for the next event. A listener unbound by an earlier one is skipped.
    /// The first failure is returned after the rest have run.
    pub fn dispatch(&self, event: &InputEvent) -> EventResult {
        let snapshot: Vec<Listener> = self
            .0
            .borrow()
            .get(&event.name)
            .cloned()
            .unwrap_or_default();
        let mut first_error = None;
        for listener in snapshot {
            if !self.contains(&event.name, &listener) {
                continue;
            }
            keep_first(&mut first_error, listener.call(event));
        }
        first_error.map_or(Ok(()), Err)
    }

    fn downgrade(&self) -> Weak<RefCell<ListenerMap>> {
        Rc::downgrade(&self.0)
    }
}

/// Process-wide event target shared by every surface on a host.
#[derive(Clone, Default)]
pub struct Document {
    listeners: ListenerTable,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listeners(&self) -> &ListenerTable {
        &self.listeners
    }

    pub fn dispatch(&self, event: &InputEvent) -> EventResult {
        self.listeners.dispatch(event)
    }
}

/// Delivers an event to a surface's listeners, then bubbles it to the document.
pub fn dispatch_to_surface(
    surface: &ListenerTable,
    document: &Document,
    event: &InputEvent,
) -> EventResult {
    let mut first_error = None;
    keep_first(&mut first_error, surface.dispatch(event));
    keep_first(&mut first_error, document.dispatch(event));
    first_error.map_or(Ok(()), Err)
}

/// Disposer for one binding. Dropping it leaves the listener bound.
pub struct ListenerHandle {
    table: Weak<RefCell<ListenerMap>>,
    name: EventName,
    listener: Listener,
}

impl ListenerHandle {
    fn new(table: &ListenerTable, name: EventName, listener: Listener) -> Self {
        Self {
            table: table.downgrade(),
            name,
            listener,
        }
    }

    pub fn name(&self) -> &EventName {
        &self.name
    }

    pub fn listener(&self) -> &Listener {
        &self.listener
    }

    pub fn is_bound(&self) -> bool {
        self.table
            .upgrade()
            .map(|map| ListenerTable(map).contains(&self.name, &self.listener))
            .unwrap_or(false)
    }

    pub fn dispose(self) {
        if let Some(map) = self.table.upgrade() {
            ListenerTable(map).remove(&self.name, &self.listener);
        }
    }
}

impl fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerHandle")
            .field("name", &self.name)
            .field("listener", &self.listener)
            .finish()
    }
}

/// Binds events for one surface, plus the built-in play/pause triggers.
pub struct EventRouter {
    document: Document,
    surface: ListenerTable,
    toggle_listener: Listener,
    space_listener: Listener,
}

impl EventRouter {
    /// `toggle` is the single stable listener used for click-to-toggle; the
    /// space-bar trigger wraps it.
    pub fn new(document: Document, surface: ListenerTable, toggle: Listener) -> Self {
        let on_space = toggle.clone();
        let space_listener = Listener::new(move |event| {
            if event.key_code == Some(SPACE_KEY) {
                on_space.call(event)
            } else {
                Ok(())
            }
        });
        Self {
            document,
            surface,
            toggle_listener: toggle,
            space_listener,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn surface_listeners(&self) -> &ListenerTable {
        &self.surface
    }

    /// Table an event name is routed to.
    pub fn target(&self, name: &EventName) -> &ListenerTable {
        if name.is_keyboard() {
            self.document.listeners()
        } else {
            &self.surface
        }
    }

    pub fn on(&self, name: impl Into<EventName>, listener: &Listener) -> ListenerHandle {
        let name = name.into();
        let target = self.target(&name);
        target.add(name.clone(), listener.clone());
        log::debug!("bound '{name}' listener");
        ListenerHandle::new(target, name, listener.clone())
    }

    pub fn off(&self, name: impl Into<EventName>, listener: &Listener) {
        let name = name.into();
        if self.target(&name).remove(&name, listener) {
            log::debug!("unbound '{name}' listener");
        }
    }

    /// Calls `callback` whenever a key with `key_code` is released.
    pub fn keyup(
        &self,
        key_code: u32,
        callback: impl Fn() -> EventResult + 'static,
    ) -> ListenerHandle {
        self.on(EventName::KeyUp, &key_filter(key_code, callback))
    }

    /// Calls `callback` whenever a key with `key_code` is pressed.
    pub fn keydown(
        &self,
        key_code: u32,
        callback: impl Fn() -> EventResult + 'static,
    ) -> ListenerHandle {
        self.on(EventName::KeyDown, &key_filter(key_code, callback))
    }

    pub fn toggle_play_on_click(&self, enabled: bool) {
        if enabled {
            let _ = self.on(EventName::Click, &self.toggle_listener);
        } else {
            self.off(EventName::Click, &self.toggle_listener);
        }
    }

    pub fn toggle_play_on_space(&self, enabled: bool) {
        if enabled {
            let _ = self.on(EventName::KeyUp, &self.space_listener);
        } else {
            self.off(EventName::KeyUp, &self.space_listener);
        }
    }

    pub fn dispatch_to_surface(&self, event: &InputEvent) -> EventResult {
        dispatch_to_surface(&self.surface, &self.document, event)
    }
}

fn key_filter(key_code: u32, callback: impl Fn() -> EventResult + 'static) -> Listener {
    Listener::new(move |event| {
        if event.key_code == Some(key_code) {
            callback()
        } else {
            Ok(())
        }
    })
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    fn counting_listener(count: &Rc<Cell<u32>>) -> Listener {
        let count = count.clone();
        Listener::new(move |_| {
            count.set(count.get() + 1);
            Ok(())
        })
    }

    fn router_with_toggle(toggles: &Rc<Cell<u32>>) -> EventRouter {
        EventRouter::new(
            Document::new(),
            ListenerTable::default(),
            counting_listener(toggles),
        )
    }

    #[test]
    fn event_names_parse_and_display() {
        assert_eq!(EventName::from("keyup"), EventName::KeyUp);
        assert_eq!(EventName::from("click"), EventName::Click);
        assert_eq!(
            EventName::from("touchstart"),
            EventName::Custom("touchstart".to_string())
        );
        assert_eq!(EventName::MouseMove.to_string(), "mousemove");
        assert!(EventName::KeyDown.is_keyboard());
        assert!(!EventName::Click.is_keyboard());
    }

    #[test]
    fn key_events_route_to_document_others_to_surface() {
        let toggles = Rc::new(Cell::new(0));
        let router = router_with_toggle(&toggles);
        let count = Rc::new(Cell::new(0));
        let listener = counting_listener(&count);

        router.on("keydown", &listener);
        router.on("mousemove", &listener);
        assert_eq!(router.document().listeners().count(&EventName::KeyDown), 1);
        assert_eq!(router.surface_listeners().count(&EventName::KeyDown), 0);
        assert_eq!(router.surface_listeners().count(&EventName::MouseMove), 1);
        assert_eq!(router.document().listeners().count(&EventName::MouseMove), 0);
    }

    #[test]
    fn off_requires_the_identical_listener() {
        let toggles = Rc::new(Cell::new(0));
        let router = router_with_toggle(&toggles);
        let count = Rc::new(Cell::new(0));
        let bound = counting_listener(&count);
        let lookalike = counting_listener(&count);

        router.on("click", &bound);
        router.off("click", &lookalike);
        assert_eq!(router.surface_listeners().count(&EventName::Click), 1);
        router.off("click", &bound);
        assert_eq!(router.surface_listeners().count(&EventName::Click), 0);
    }

    #[test]
    fn binding_the_same_listener_twice_is_a_no_op() {
        let table = ListenerTable::default();
        let count = Rc::new(Cell::new(0));
        let listener = counting_listener(&count);
        assert!(table.add(EventName::Click, listener.clone()));
        assert!(!table.add(EventName::Click, listener.clone()));
        table.dispatch(&InputEvent::click(Point::ZERO)).unwrap();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn keydown_twice_fires_twice() {
        let toggles = Rc::new(Cell::new(0));
        let router = router_with_toggle(&toggles);
        let count = Rc::new(Cell::new(0));
        for _ in 0..2 {
            let count = count.clone();
            let _ = router.keydown(65, move || {
                count.set(count.get() + 1);
                Ok(())
            });
        }
        router.document().dispatch(&InputEvent::key_down(65)).unwrap();
        assert_eq!(count.get(), 2);
        router.document().dispatch(&InputEvent::key_down(66)).unwrap();
        router.document().dispatch(&InputEvent::key_up(65)).unwrap();
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn dispose_removes_only_its_binding() {
        let toggles = Rc::new(Cell::new(0));
        let router = router_with_toggle(&toggles);
        let count = Rc::new(Cell::new(0));
        let first = {
            let count = count.clone();
            router.keyup(13, move || {
                count.set(count.get() + 1);
                Ok(())
            })
        };
        let second = {
            let count = count.clone();
            router.keyup(13, move || {
                count.set(count.get() + 10);
                Ok(())
            })
        };
        assert!(first.is_bound());
        first.dispose();
        router.document().dispatch(&InputEvent::key_up(13)).unwrap();
        assert_eq!(count.get(), 10);
        assert!(second.is_bound());
        drop(second);
        router.document().dispatch(&InputEvent::key_up(13)).unwrap();
        assert_eq!(count.get(), 20);
    }

    #[test]
    fn toggle_on_click_round_trip_leaves_no_listener() {
        let toggles = Rc::new(Cell::new(0));
        let router = router_with_toggle(&toggles);
        router.toggle_play_on_click(true);
        router.toggle_play_on_click(true);
        assert_eq!(router.surface_listeners().count(&EventName::Click), 1);
        router.dispatch_to_surface(&InputEvent::click(Point::ZERO)).unwrap();
        assert_eq!(toggles.get(), 1);
        router.toggle_play_on_click(false);
        assert_eq!(router.surface_listeners().count(&EventName::Click), 0);
        assert!(router.surface_listeners().is_empty());
    }

    #[test]
    fn toggle_on_space_filters_key_code() {
        let toggles = Rc::new(Cell::new(0));
        let router = router_with_toggle(&toggles);
        router.toggle_play_on_space(true);
        router.document().dispatch(&InputEvent::key_up(65)).unwrap();
        assert_eq!(toggles.get(), 0);
        router.document().dispatch(&InputEvent::key_up(SPACE_KEY)).unwrap();
        assert_eq!(toggles.get(), 1);
        router.document().dispatch(&InputEvent::key_down(SPACE_KEY)).unwrap();
        assert_eq!(toggles.get(), 1);
        router.toggle_play_on_space(false);
        assert_eq!(router.document().listeners().count(&EventName::KeyUp), 0);
    }

    #[test]
    fn surface_events_bubble_to_document() {
        let document = Document::new();
        let surface = ListenerTable::default();
        let order = Rc::new(RefCell::new(Vec::new()));
        for (table, label) in [(surface.clone(), "surface"), (document.listeners().clone(), "document")] {
            let order = order.clone();
            table.add(
                EventName::Click,
                Listener::new(move |_| {
                    order.borrow_mut().push(label);
                    Ok(())
                }),
            );
        }
        dispatch_to_surface(&surface, &document, &InputEvent::click(Point::ZERO)).unwrap();
        assert_eq!(*order.borrow(), vec!["surface", "document"]);
    }

    #[test]
    fn listener_may_unbind_itself_during_dispatch() {
        let table = ListenerTable::default();
        let count = Rc::new(Cell::new(0));
        let slot: Rc<RefCell<Option<Listener>>> = Rc::new(RefCell::new(None));
        let listener = {
            let table = table.clone();
            let slot = slot.clone();
            let count = count.clone();
            Listener::new(move |event| {
                count.set(count.get() + 1);
                if let Some(me) = slot.borrow().as_ref() {
                    table.remove(&event.name, me);
                }
                Ok(())
            })
        };
        *slot.borrow_mut() = Some(listener.clone());
        table.add(EventName::Click, listener);
        table.dispatch(&InputEvent::click(Point::ZERO)).unwrap();
        table.dispatch(&InputEvent::click(Point::ZERO)).unwrap();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn listener_unbound_by_an_earlier_one_is_skipped() {
        let table = ListenerTable::default();
        let count = Rc::new(Cell::new(0));
        let later = counting_listener(&count);
        let earlier = {
            let table = table.clone();
            let later = later.clone();
            Listener::new(move |event| {
                table.remove(&event.name, &later);
                Ok(())
            })
        };
        table.add(EventName::Click, earlier);
        table.add(EventName::Click, later);
        table.dispatch(&InputEvent::click(Point::ZERO)).unwrap();
        assert_eq!(count.get(), 0);
        assert_eq!(table.count(&EventName::Click), 1);
    }

    #[test]
    fn dispatch_runs_all_listeners_and_returns_first_error() {
        let table = ListenerTable::default();
        let count = Rc::new(Cell::new(0));
        table.add(
            EventName::Click,
            Listener::new(|event| Err(GessoError::listener(event.name.clone(), "nope"))),
        );
        table.add(EventName::Click, counting_listener(&count));
        let err = table.dispatch(&InputEvent::click(Point::ZERO)).unwrap_err();
        assert!(matches!(err, GessoError::ListenerFailure { .. }));
        assert_eq!(count.get(), 1);
    }
}
