//! Drawing surface seam.
//!
//! The core never draws. It sizes and clears a [`Surface`] and hands it to
//! the render callback; everything else about the drawable belongs to the
//! host's [`SurfaceProvider`].

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};

use gesso_ui_graphics::{Color, Point, Rect, Size};
use indexmap::IndexMap;

use crate::error::GessoError;
use crate::events::ListenerTable;

/// Container every surface lands in unless told otherwise.
pub const ROOT_CONTAINER: &str = "body";

/// A sizable, clearable drawable with a drawing context.
pub trait Surface {
    /// Backend specific drawing context handed to render callbacks.
    type Context;

    fn width(&self) -> u32;
    fn height(&self) -> u32;

    fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }

    /// Resizes both the logical and the backing dimensions.
    fn resize(&mut self, width: u32, height: u32);

    /// Clears to transparent, or paints a flat `fill` over the whole surface.
    fn clear(&mut self, fill: Option<Color>);

    fn context(&mut self) -> &mut Self::Context;
}

/// Shared handle to a host-owned surface plus its surface-level listeners.
pub struct SurfaceHandle<S> {
    surface: Rc<RefCell<S>>,
    listeners: ListenerTable,
}

impl<S> SurfaceHandle<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface: Rc::new(RefCell::new(surface)),
            listeners: ListenerTable::default(),
        }
    }

    pub fn borrow(&self) -> Ref<'_, S> {
        self.surface.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, S> {
        self.surface.borrow_mut()
    }

    /// Surface-level event target.
    pub fn listeners(&self) -> &ListenerTable {
        &self.listeners
    }

    pub fn downgrade(&self) -> WeakSurface<S> {
        WeakSurface(Rc::downgrade(&self.surface))
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.surface, &other.surface)
    }
}

impl<S> Clone for SurfaceHandle<S> {
    fn clone(&self) -> Self {
        Self {
            surface: Rc::clone(&self.surface),
            listeners: self.listeners.clone(),
        }
    }
}

impl<S: Surface> fmt::Debug for SurfaceHandle<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.surface.try_borrow() {
            Ok(surface) => f
                .debug_struct("SurfaceHandle")
                .field("size", &surface.size())
                .finish(),
            Err(_) => f.write_str("SurfaceHandle(<in use>)"),
        }
    }
}

/// Non-owning reference kept by the animation controller.
pub struct WeakSurface<S>(Weak<RefCell<S>>);

impl<S> WeakSurface<S> {
    pub fn upgrade(&self) -> Option<Rc<RefCell<S>>> {
        self.0.upgrade()
    }
}

impl<S> Clone for WeakSurface<S> {
    fn clone(&self) -> Self {
        Self(Weak::clone(&self.0))
    }
}

/// Something the host knows by id: a drawable, or any other element.
pub enum Element<S> {
    Drawable(SurfaceHandle<S>),
    Other { tag: String },
}

impl<S> Element<S> {
    pub fn other(tag: impl Into<String>) -> Self {
        Element::Other { tag: tag.into() }
    }

    pub fn as_drawable(&self) -> Option<&SurfaceHandle<S>> {
        match self {
            Element::Drawable(handle) => Some(handle),
            Element::Other { .. } => None,
        }
    }
}

impl<S> Clone for Element<S> {
    fn clone(&self) -> Self {
        match self {
            Element::Drawable(handle) => Element::Drawable(handle.clone()),
            Element::Other { tag } => Element::Other { tag: tag.clone() },
        }
    }
}

impl<S> fmt::Debug for Element<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Drawable(_) => f.write_str("Element::Drawable"),
            Element::Other { tag } => write!(f, "Element::Other({tag})"),
        }
    }
}

/// What to attach to: an element id, or an element the caller already holds.
pub enum SurfaceRef<S> {
    Id(String),
    Element(Element<S>),
}

impl<S> From<&str> for SurfaceRef<S> {
    fn from(id: &str) -> Self {
        SurfaceRef::Id(id.to_string())
    }
}

impl<S> From<String> for SurfaceRef<S> {
    fn from(id: String) -> Self {
        SurfaceRef::Id(id)
    }
}

impl<S> From<SurfaceHandle<S>> for SurfaceRef<S> {
    fn from(handle: SurfaceHandle<S>) -> Self {
        SurfaceRef::Element(Element::Drawable(handle))
    }
}

impl<S> From<Element<S>> for SurfaceRef<S> {
    fn from(element: Element<S>) -> Self {
        SurfaceRef::Element(element)
    }
}

/// Placement and size of a surface to create. Unset sizes fall back to the
/// host viewport.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SurfaceOptions {
    pub x: f32,
    pub y: f32,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub container: Option<String>,
}

impl SurfaceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn in_container(mut self, container: impl Into<String>) -> Self {
        self.container = Some(container.into());
        self
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn resolved_size(&self, viewport: Size) -> Size {
        Size::new(
            self.width.unwrap_or(viewport.width),
            self.height.unwrap_or(viewport.height),
        )
    }
}

/// Host side of surface lifecycle.
pub trait SurfaceProvider {
    type Surface: Surface;

    /// Builds a new drawable and places it under the requested container.
    fn create_surface(
        &mut self,
        options: &SurfaceOptions,
    ) -> Result<SurfaceHandle<Self::Surface>, GessoError>;

    fn lookup(&self, id: &str) -> Option<Element<Self::Surface>>;

    fn viewport_size(&self) -> Size;

    /// Where `surface` sits in the viewport, if the provider places it.
    fn position_of(&self, surface: &SurfaceHandle<Self::Surface>) -> Option<Point> {
        let _ = surface;
        None
    }

    /// Topmost surface under a viewport point, with the point made local.
    fn surface_at(&self, point: Point) -> Option<(SurfaceHandle<Self::Surface>, Point)> {
        let _ = point;
        None
    }
}

/// Resolves an attach request to a drawable.
pub fn resolve_surface<P: SurfaceProvider>(
    provider: &P,
    reference: SurfaceRef<P::Surface>,
) -> Result<SurfaceHandle<P::Surface>, GessoError> {
    match reference {
        SurfaceRef::Id(id) => match provider.lookup(&id) {
            Some(Element::Drawable(handle)) => Ok(handle),
            Some(Element::Other { .. }) | None => Err(GessoError::invalid_reference(id)),
        },
        SurfaceRef::Element(Element::Drawable(handle)) => Ok(handle),
        SurfaceRef::Element(Element::Other { tag }) => {
            Err(GessoError::invalid_reference(format!("<{tag}>")))
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Placement {
    pub position: Point,
    pub container: String,
}

struct RegisteredElement<S> {
    element: Element<S>,
    placement: Option<Placement>,
}

/// Ordered element registry usable as a [`SurfaceProvider`].
///
/// Insertion order doubles as stacking order: later surfaces sit on top.
pub struct SurfaceRegistry<S> {
    elements: IndexMap<String, RegisteredElement<S>>,
    viewport: Size,
    next_id: u64,
    factory: Box<dyn FnMut(Size) -> S>,
}

impl<S: Surface> SurfaceRegistry<S> {
    pub fn new(viewport: Size, factory: impl FnMut(Size) -> S + 'static) -> Self {
        Self {
            elements: IndexMap::new(),
            viewport,
            next_id: 1,
            factory: Box::new(factory),
        }
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    /// Registers a non-drawable element, e.g. a container.
    pub fn insert_element(&mut self, id: impl Into<String>, element: Element<S>) {
        self.elements.insert(
            id.into(),
            RegisteredElement {
                element,
                placement: None,
            },
        );
    }

    /// Registers an existing drawable placed in the root container.
    pub fn insert_drawable(
        &mut self,
        id: impl Into<String>,
        surface: S,
        position: Point,
    ) -> SurfaceHandle<S> {
        let handle = SurfaceHandle::new(surface);
        self.elements.insert(
            id.into(),
            RegisteredElement {
                element: Element::Drawable(handle.clone()),
                placement: Some(Placement {
                    position,
                    container: ROOT_CONTAINER.to_string(),
                }),
            },
        );
        handle
    }

    pub fn remove(&mut self, id: &str) -> Option<Element<S>> {
        self.elements.shift_remove(id).map(|entry| entry.element)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.elements.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn id_of(&self, handle: &SurfaceHandle<S>) -> Option<&str> {
        self.elements.iter().find_map(|(id, entry)| match &entry.element {
            Element::Drawable(candidate) if candidate.ptr_eq(handle) => Some(id.as_str()),
            _ => None,
        })
    }

    pub fn placement(&self, id: &str) -> Option<&Placement> {
        self.elements.get(id).and_then(|entry| entry.placement.as_ref())
    }

    /// Placed drawables, bottom to top.
    pub fn placed(&self) -> impl Iterator<Item = (&SurfaceHandle<S>, &Placement)> + '_ {
        self.elements
            .values()
            .filter_map(|entry| match (&entry.element, &entry.placement) {
                (Element::Drawable(handle), Some(placement)) => Some((handle, placement)),
                _ => None,
            })
    }

    /// Topmost placed drawable under `point`, with the point in its local space.
    pub fn hit_test(&self, point: Point) -> Option<(SurfaceHandle<S>, Point)> {
        self.placed()
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .find(|(handle, placement)| {
                Rect::from_origin_size(placement.position, handle.borrow().size()).contains(point)
            })
            .map(|(handle, placement)| {
                let local = Point::new(
                    point.x - placement.position.x,
                    point.y - placement.position.y,
                );
                (handle.clone(), local)
            })
    }

    fn allocate_id(&mut self) -> String {
        loop {
            let id = format!("gesso-surface-{}", self.next_id);
            self.next_id += 1;
            if !self.elements.contains_key(&id) {
                return id;
            }
        }
    }
}

impl<S: Surface> SurfaceProvider for SurfaceRegistry<S> {
    type Surface = S;

    fn create_surface(&mut self, options: &SurfaceOptions) -> Result<SurfaceHandle<S>, GessoError> {
        let container = options
            .container
            .clone()
            .unwrap_or_else(|| ROOT_CONTAINER.to_string());
        if container != ROOT_CONTAINER && !self.elements.contains_key(&container) {
            return Err(GessoError::UnknownContainer { container });
        }
        let size = options.resolved_size(self.viewport);
        let handle = SurfaceHandle::new((self.factory)(size));
        let id = self.allocate_id();
        log::debug!(
            "created surface {id} ({}x{}) at ({}, {}) in '{container}'",
            size.width,
            size.height,
            options.x,
            options.y
        );
        self.elements.insert(
            id,
            RegisteredElement {
                element: Element::Drawable(handle.clone()),
                placement: Some(Placement {
                    position: options.position(),
                    container,
                }),
            },
        );
        Ok(handle)
    }

    fn lookup(&self, id: &str) -> Option<Element<S>> {
        self.elements.get(id).map(|entry| entry.element.clone())
    }

    fn viewport_size(&self) -> Size {
        self.viewport
    }

    fn position_of(&self, surface: &SurfaceHandle<S>) -> Option<Point> {
        self.id_of(surface)
            .and_then(|id| self.placement(id))
            .map(|placement| placement.position)
    }

    fn surface_at(&self, point: Point) -> Option<(SurfaceHandle<S>, Point)> {
        self.hit_test(point)
    }
}
