//! Window records, creation requests, and per-window state types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::bounds::{Bounds, Constraints};

slotmap::new_key_type! {
    /// Stable opaque handle for a managed window. Assigned by the engine at
    /// creation; never reused while the window is open.
    pub struct WindowId;
}

/// Display mode of a window. Windows without an explicit mode entry are
/// `Normal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowMode {
    #[default]
    Normal,
    Minimized,
    Maximized,
}

/// Capability flags controlling which operations the chrome should offer for
/// a window. Everything defaults to allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowBehaviors {
    pub resizable: bool,
    pub movable: bool,
    pub closable: bool,
    pub minimizable: bool,
    pub maximizable: bool,
}

impl Default for WindowBehaviors {
    fn default() -> Self {
        Self {
            resizable: true,
            movable: true,
            closable: true,
            minimizable: true,
            maximizable: true,
        }
    }
}

/// Creation request passed to [`crate::Desktop::create_window`].
///
/// `kind` is an opaque application tag; the engine never interprets it.
/// `component` is the renderable payload and is equally opaque — the engine
/// stores and returns it without inspection.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowDef<C> {
    pub kind: String,
    pub title: String,
    pub component: C,
    pub props: Value,
    pub meta: Value,
    pub singleton_key: Option<String>,
    pub icon: Option<String>,
    pub initial_bounds: Option<Bounds>,
    pub constraints: Option<Constraints>,
    pub behaviors: WindowBehaviors,
}

impl<C> WindowDef<C> {
    pub fn new(kind: impl Into<String>, title: impl Into<String>, component: C) -> Self {
        Self {
            kind: kind.into(),
            title: title.into(),
            component,
            props: Value::Null,
            meta: Value::Null,
            singleton_key: None,
            icon: None,
            initial_bounds: None,
            constraints: None,
            behaviors: WindowBehaviors::default(),
        }
    }
}

/// Finalized record for an open window.
///
/// Records handed out by the engine are clones; mutations only happen through
/// engine methods.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowRecord<C> {
    pub id: WindowId,
    pub kind: String,
    pub title: String,
    pub component: C,
    pub props: Value,
    pub meta: Value,
    pub singleton_key: Option<String>,
    pub icon: Option<String>,
    pub initial_bounds: Bounds,
    pub constraints: Option<Constraints>,
    pub behaviors: WindowBehaviors,
}

impl<C> WindowRecord<C> {
    pub(crate) fn from_def(id: WindowId, def: WindowDef<C>) -> Self {
        Self {
            id,
            kind: def.kind,
            title: def.title,
            component: def.component,
            props: def.props,
            meta: def.meta,
            singleton_key: def.singleton_key,
            icon: def.icon,
            initial_bounds: def.initial_bounds.unwrap_or_default(),
            constraints: def.constraints,
            behaviors: def.behaviors,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn behaviors_default_to_allowed() {
        let behaviors = WindowBehaviors::default();
        assert!(behaviors.resizable);
        assert!(behaviors.movable);
        assert!(behaviors.closable);
        assert!(behaviors.minimizable);
        assert!(behaviors.maximizable);
    }

    #[test]
    fn def_without_bounds_gets_default_bounds() {
        let record = WindowRecord::from_def(WindowId::default(), WindowDef::new("term", "Terminal", ()));
        assert_eq!(record.initial_bounds, Bounds::new(100.0, 100.0, 400.0, 300.0));
    }

    #[test]
    fn mode_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&WindowMode::Maximized).unwrap(),
            "\"maximized\""
        );
    }
}
