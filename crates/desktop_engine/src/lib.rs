//! Core state engine for a windowed desktop shell.
//!
//! [`Desktop`] owns every piece of session state: the window registry,
//! z-order and focus, per-window display modes, bounds, the window switcher,
//! an event bus, a plugin host, and a named-slot UI registry. The engine is
//! headless and renderer-agnostic: window content is an opaque component
//! payload (`C`) that the engine stores and hands back without inspecting.
//!
//! Everything here is synchronous and single-threaded. Mutations complete
//! before their events fire, so handlers can re-enter the engine freely.
//! Feature behavior (snapping, persistence, shortcuts, launchers, menus)
//! lives in companion plugins built on [`DesktopPlugin`].

#![warn(rustdoc::broken_intra_doc_links)]

pub mod bounds;
pub mod desktop;
pub mod events;
pub mod model;
pub mod plugin;
pub mod ui;

pub use bounds::{apply_constraints, calc_resize, Bounds, Constraints, ResizeDirection};
pub use desktop::{BoundsInterceptor, Desktop, InterceptorId};
pub use events::{DesktopEvent, EventHandler, EventKind, HandlerId};
pub use model::{WindowBehaviors, WindowDef, WindowId, WindowMode, WindowRecord};
pub use plugin::{DesktopPlugin, PluginCleanup};
pub use ui::UiRegistration;
