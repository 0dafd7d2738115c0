use gesso_ui_graphics::Point;

use crate::events::{dispatch_to_surface, Document, EventName, EventResult, InputEvent};
use crate::runtime::Runtime;
use crate::surface::SurfaceProvider;

/// Everything a [`Gesso`](crate::Gesso) needs from its environment: a surface
/// provider, the cooperative runtime and the shared document event target.
pub struct Host<P> {
    provider: P,
    runtime: Runtime,
    document: Document,
}

impl<P: SurfaceProvider> Host<P> {
    pub fn new(provider: P, runtime: Runtime) -> Self {
        Self {
            provider,
            runtime,
            document: Document::new(),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Delivers a keyboard (or other document-level) event.
    pub fn dispatch_key(&self, event: &InputEvent) -> EventResult {
        self.document.dispatch(event)
    }

    /// Routes a pointer event at a viewport point to the surface under it,
    /// bubbling to the document. Misses go to the document alone.
    pub fn dispatch_pointer(&self, name: EventName, point: Point) -> EventResult {
        match self.provider.surface_at(point) {
            Some((surface, local)) => {
                let event = InputEvent::pointer(name, local);
                dispatch_to_surface(surface.listeners(), &self.document, &event)
            }
            None => self.document.dispatch(&InputEvent::pointer(name, point)),
        }
    }
}
