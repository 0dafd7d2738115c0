use std::error::Error;
use std::fmt;

use crate::events::EventName;

/// Error type returned by user render callbacks.
pub type RenderError = Box<dyn Error + 'static>;

/// Result of a single render callback invocation.
pub type RenderResult = Result<(), RenderError>;

#[derive(Debug)]
pub enum GessoError {
    /// An attach request named something that is not a drawable surface.
    InvalidSurfaceReference { reference: String },
    /// A surface was requested under a container the host does not know.
    UnknownContainer { container: String },
    /// The render callback failed while drawing frame `frame`.
    CallbackFailure { frame: u64, source: RenderError },
    /// The frame rate is not a positive finite number.
    InvalidRate { rate: f64 },
    /// The surface driven by a controller no longer exists.
    SurfaceDetached,
    /// The surface was already borrowed by a render in progress.
    SurfaceBusy,
    /// A user event listener failed.
    ListenerFailure { event: EventName, source: RenderError },
}

impl GessoError {
    pub fn invalid_reference(reference: impl Into<String>) -> Self {
        GessoError::InvalidSurfaceReference {
            reference: reference.into(),
        }
    }

    pub fn listener(event: EventName, source: impl Into<RenderError>) -> Self {
        GessoError::ListenerFailure {
            event,
            source: source.into(),
        }
    }
}

impl fmt::Display for GessoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GessoError::InvalidSurfaceReference { reference } => {
                write!(f, "'{reference}' does not reference a drawable surface")
            }
            GessoError::UnknownContainer { container } => {
                write!(f, "container '{container}' does not exist")
            }
            GessoError::CallbackFailure { frame, source } => {
                write!(f, "render callback failed on frame {frame}: {source}")
            }
            GessoError::InvalidRate { rate } => {
                write!(f, "frame rate must be a positive finite number, got {rate}")
            }
            GessoError::SurfaceDetached => write!(f, "surface was dropped while animating"),
            GessoError::SurfaceBusy => {
                write!(f, "surface is being drawn by another controller")
            }
            GessoError::ListenerFailure { event, source } => {
                write!(f, "'{event}' listener failed: {source}")
            }
        }
    }
}

impl Error for GessoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            GessoError::CallbackFailure { source, .. }
            | GessoError::ListenerFailure { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Keeps the first error of a batch while letting the rest of the batch run.
pub(crate) fn keep_first(slot: &mut Option<GessoError>, result: Result<(), GessoError>) {
    if let Err(err) = result {
        if slot.is_none() {
            *slot = Some(err);
        } else {
            log::error!("additional failure in the same batch: {err}");
        }
    }
}
