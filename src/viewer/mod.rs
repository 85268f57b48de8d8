pub mod bounds;
pub mod document;
pub mod protocol;

pub use bounds::{Aabb, Normalization, TARGET_SIZE};
pub use protocol::{Dispatch, Envelope, HandlerRegistry, Inbound, MessageKind};

use crate::models::Property;
use tracing::{debug, info, warn};

/// Absolute URL for a stored model path. Anything starting with "http" is
/// used as is; other paths hang off the backend base address.
pub fn resolve_model_url(path: &str, base: &str) -> String {
    if path.starts_with("http") {
        return path.to_string();
    }
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) if !path.is_empty() => format!("{}/{}", base, path),
        _ => format!("{}{}", base, path),
    }
}

/// Model URL for a listing, if it has a 3D file at all
pub fn model_url(property: &Property, base: &str) -> Option<String> {
    property
        .three_d_file
        .as_deref()
        .map(str::trim)
        .filter(|path| !path.is_empty())
        .map(|path| resolve_model_url(path, base))
}

/// Host-visible lifecycle of one mounted viewer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerState {
    Idle,
    Loading,
    Ready,
    Failed(String),
}

impl ViewerState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ViewerState::Failed(_))
    }
}

/// What the host puts on screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Surface {
    /// No model: a static "No 3D model available" card, no embedded context
    Placeholder,
    /// HTML document to load into the embedded context
    Document { model_url: String, html: String },
}

pub const PLACEHOLDER_TEXT: &str = "No 3D model available";

/// Host side of the embedded 3D viewer.
///
/// The model URL is baked into the document at mount time. To show another
/// model, mount a new viewer.
pub struct ModelViewer {
    surface: Surface,
    state: ViewerState,
    registry: HandlerRegistry,
    received: usize,
}

impl ModelViewer {
    pub fn mount(model_url: Option<&str>) -> Self {
        Self::mount_with(model_url, HandlerRegistry::with_logging())
    }

    pub fn mount_with(model_url: Option<&str>, registry: HandlerRegistry) -> Self {
        let surface = match model_url {
            Some(url) => {
                debug!("Building viewer document for {}", url);
                Surface::Document {
                    model_url: url.to_string(),
                    html: document::render(url),
                }
            }
            None => Surface::Placeholder,
        };
        for kind in MessageKind::ALL {
            if !registry.handles(kind) {
                debug!("No handler for {} messages, they will be logged raw", kind);
            }
        }
        Self {
            surface,
            state: ViewerState::Idle,
            registry,
            received: 0,
        }
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn document(&self) -> Option<&str> {
        match &self.surface {
            Surface::Document { html, .. } => Some(html),
            Surface::Placeholder => None,
        }
    }

    pub fn model_url(&self) -> Option<&str> {
        match &self.surface {
            Surface::Document { model_url, .. } => Some(model_url),
            Surface::Placeholder => None,
        }
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    /// Whether the host should show its loading overlay
    pub fn is_loading(&self) -> bool {
        self.state == ViewerState::Loading
    }

    /// Number of payloads the embedded context has sent so far
    pub fn messages_received(&self) -> usize {
        self.received
    }

    /// Embedded context began loading the document
    pub fn on_load_start(&mut self) {
        if self.document().is_none() {
            warn!("Load start on a placeholder viewer ignored");
            return;
        }
        if self.state == ViewerState::Idle {
            self.transition(ViewerState::Loading);
        }
    }

    /// Embedded context finished loading the document. This says nothing
    /// about whether the model itself loaded.
    pub fn on_load_end(&mut self) {
        if self.state == ViewerState::Loading {
            self.transition(ViewerState::Ready);
        }
    }

    /// Embedded context failed at the host level (navigation, crash)
    pub fn on_load_error(&mut self, reason: impl Into<String>) {
        if self.document().is_none() || self.state.is_terminal() {
            return;
        }
        self.transition(ViewerState::Failed(reason.into()));
    }

    /// Feed one raw payload from the embedded context
    pub fn on_message(&mut self, raw: &str) -> Dispatch {
        if self.document().is_none() {
            warn!("Message for a placeholder viewer dropped: {}", raw);
            return Dispatch::Rejected;
        }
        self.received += 1;

        let dispatch = self.registry.dispatch(raw);
        if let Dispatch::Handled(envelope) | Dispatch::Unhandled(envelope) = &dispatch {
            if envelope.kind == MessageKind::Error && !self.state.is_terminal() {
                self.transition(ViewerState::Failed(envelope.message.clone()));
            }
        }
        dispatch
    }

    fn transition(&mut self, next: ViewerState) {
        info!("Viewer {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}
