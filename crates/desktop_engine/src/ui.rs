//! Named-slot UI registrations. Chrome plugins inject renderables into slots
//! ("taskbar", "overlay", ...) without the engine knowing what they render.

use serde_json::Value;

/// One component registered into a named slot.
#[derive(Debug, Clone, PartialEq)]
pub struct UiRegistration<C> {
    pub id: String,
    pub slot: String,
    pub component: C,
    pub props: Value,
    /// Ascending render order within the slot; ties keep registration order.
    pub order: i32,
}

impl<C> UiRegistration<C> {
    pub fn new(id: impl Into<String>, slot: impl Into<String>, component: C) -> Self {
        Self {
            id: id.into(),
            slot: slot.into(),
            component,
            props: Value::Null,
            order: 0,
        }
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn with_props(mut self, props: Value) -> Self {
        self.props = props;
        self
    }
}
