//! Workspace factory.

use std::rc::Rc;

use crate::events::EventBus;
use crate::shape::ShapeRegistry;
use crate::workspace::Workspace;

/// Creates workspaces that share one shape registry and one event bus.
///
/// Materialization from interchange text is [`Toolkit::load_xml`].
#[derive(Clone, Debug, Default)]
pub struct Toolkit {
    pub(crate) shapes: Rc<ShapeRegistry>,
    pub(crate) events: Rc<EventBus>,
}

impl Toolkit {
    pub fn new(shapes: ShapeRegistry) -> Self {
        Self {
            shapes: Rc::new(shapes),
            events: Rc::new(EventBus::new()),
        }
    }

    /// An empty workspace, e.g. a rendering target.
    pub fn new_workspace(&self) -> Workspace {
        Workspace::with_events(Rc::clone(&self.events))
    }

    pub fn shapes(&self) -> &ShapeRegistry {
        &self.shapes
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }
}
