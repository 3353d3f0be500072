//! Feature plugins for the desktop engine.
//!
//! Each plugin follows the same shape: a constructor taking its options (and
//! the opaque component to render, where the plugin contributes UI), a
//! cloneable handle exposing the plugin's API, and a [`DesktopPlugin`]
//! implementation that wires subscriptions, interceptors, and UI slots into
//! the engine — and fully unwires them on uninstall.
//!
//! [`DesktopPlugin`]: desktop_engine::DesktopPlugin

#![warn(rustdoc::broken_intra_doc_links)]

pub mod context_menu;
pub mod persistence;
pub mod shortcuts;
pub mod snap;
pub mod spotlight;
pub mod start_menu;
pub mod storage;
pub mod taskbar;

pub use context_menu::{
    default_desktop_menu, default_window_menu, ContextMenuHandle, ContextMenuPlugin, MenuBuilder,
    MenuContext, MenuItem, MenuTarget,
};
pub use persistence::{
    PersistedState, PersistedWindowInfo, PersistedWindowState, PersistenceHandle,
    PersistenceOptions, PersistencePlugin, WindowFactory, WindowKeyFn,
};
pub use shortcuts::{
    KeyCombo, KeyInput, ParseComboError, ShortcutDef, ShortcutInfo, ShortcutsHandle,
    ShortcutsPlugin,
};
pub use snap::{
    apply_snapping, snap_bounds_to_grid, snap_to_edges, snap_to_grid, snap_to_value,
    snap_to_windows, SnapHandle, SnapOptions, SnapPlugin, SnapResult, SnapTarget,
};
pub use spotlight::{
    AppsProvider, SpotlightHandle, SpotlightItem, SpotlightPlugin, SpotlightProvider,
    WindowsProvider,
};
pub use start_menu::{StartMenuApp, StartMenuHandle, StartMenuPlugin};
pub use storage::{
    ChainedStorage, Clock, FileStorage, ManualClock, MemoryStorage, StorageAdapter, SystemClock,
};
pub use taskbar::{toggle_window, TaskbarPlugin};
