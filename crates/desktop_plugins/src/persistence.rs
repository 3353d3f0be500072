//! Window state persistence: bounds, modes, z-order, and optional session
//! restore, written through a [`StorageAdapter`] with debounced saves.
//!
//! The engine assigns window ids per session, so persisted entries are keyed
//! by a stable window key instead: the singleton key when present, else the
//! window kind. A custom key function can refine that (returning `None`
//! excludes a window from persistence entirely).

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use desktop_engine::{
    Bounds, Desktop, DesktopEvent, DesktopPlugin, EventKind, HandlerId, PluginCleanup, WindowDef,
    WindowId, WindowMode, WindowRecord,
};

use crate::storage::{Clock, StorageAdapter, SystemClock};

/// Persisted geometry and mode for one window key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedWindowState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<WindowMode>,
}

/// Serializable description of an open window, enough for a factory to
/// recreate it next session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedWindowInfo {
    pub key: String,
    pub kind: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub singleton_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub props: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub meta: Value,
}

/// The whole persisted document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub windows: BTreeMap<String, PersistedWindowState>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub open_windows: Vec<PersistedWindowInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_order: Option<Vec<String>>,
}

/// Maps a window record to its persistence key; `None` opts the window out.
pub type WindowKeyFn<C> = Rc<dyn Fn(&WindowRecord<C>) -> Option<String>>;

/// Recreates a window definition from persisted info during session restore;
/// `None` skips the entry.
pub type WindowFactory<C> = Rc<dyn Fn(&PersistedWindowInfo) -> Option<WindowDef<C>>>;

/// Configuration for [`PersistencePlugin`].
pub struct PersistenceOptions<C> {
    pub storage: Rc<dyn StorageAdapter>,
    pub clock: Rc<dyn Clock>,
    /// Quiet period before a scheduled save fires.
    pub debounce_ms: u64,
    pub persist_bounds: bool,
    pub persist_mode: bool,
    pub persist_z_order: bool,
    /// Track open windows so [`PersistenceHandle::restore_session`] can
    /// recreate them. Requires `window_factory`.
    pub persist_session: bool,
    pub window_key: Option<WindowKeyFn<C>>,
    pub window_factory: Option<WindowFactory<C>>,
}

impl<C> PersistenceOptions<C> {
    pub fn new(storage: Rc<dyn StorageAdapter>) -> Self {
        Self {
            storage,
            clock: Rc::new(SystemClock::new()),
            debounce_ms: 300,
            persist_bounds: true,
            persist_mode: true,
            persist_z_order: false,
            persist_session: false,
            window_key: None,
            window_factory: None,
        }
    }
}

struct PersistenceState {
    enabled: bool,
    restoring: bool,
    current: PersistedState,
    pending_deadline: Option<u64>,
}

struct Shared<C> {
    state: RefCell<PersistenceState>,
    storage: Rc<dyn StorageAdapter>,
    clock: Rc<dyn Clock>,
    debounce_ms: u64,
    persist_bounds: bool,
    persist_mode: bool,
    persist_z_order: bool,
    persist_session: bool,
    window_key: WindowKeyFn<C>,
    window_factory: Option<WindowFactory<C>>,
}

impl<C: Clone + 'static> Shared<C> {
    fn key_for(&self, record: &WindowRecord<C>) -> Option<String> {
        (self.window_key)(record)
    }

    fn key_of(&self, desktop: &Desktop<C>, id: WindowId) -> Option<String> {
        desktop.window(id).and_then(|record| self.key_for(record))
    }

    /// Arms (or re-arms) the trailing save timer.
    fn schedule_save(&self) {
        let mut state = self.state.borrow_mut();
        if !state.enabled || state.restoring {
            return;
        }
        state.pending_deadline = Some(self.clock.now_ms() + self.debounce_ms);
    }

    fn save_now(&self) {
        let current = {
            let mut state = self.state.borrow_mut();
            state.pending_deadline = None;
            state.current.clone()
        };
        self.storage.save(&current);
    }

    fn update_window_state(
        &self,
        desktop: &Desktop<C>,
        id: WindowId,
        update: impl FnOnce(&mut PersistedWindowState),
    ) {
        let Some(key) = self.key_of(desktop, id) else {
            return;
        };
        {
            let mut state = self.state.borrow_mut();
            update(state.current.windows.entry(key).or_default());
        }
        self.schedule_save();
    }

    fn record_z_order(&self, desktop: &Desktop<C>) {
        if !self.persist_z_order {
            return;
        }
        let keys: Vec<String> = desktop
            .z_order()
            .into_iter()
            .filter_map(|id| self.key_of(desktop, id))
            .collect();
        self.state.borrow_mut().current.z_order = Some(keys);
        self.schedule_save();
    }

    /// Applies any persisted bounds and mode to a freshly created window.
    fn apply_persisted(&self, desktop: &mut Desktop<C>, id: WindowId) {
        let persisted = {
            let state = self.state.borrow();
            if !state.enabled {
                return;
            }
            let Some(key) = self.key_of(desktop, id) else {
                return;
            };
            let Some(persisted) = state.current.windows.get(&key) else {
                return;
            };
            persisted.clone()
        };

        if self.persist_bounds {
            if let Some(bounds) = persisted.bounds {
                desktop.update_bounds(id, bounds);
            }
        }
        if self.persist_mode {
            match persisted.mode {
                Some(WindowMode::Maximized) => {
                    desktop.maximize_window(id);
                }
                Some(WindowMode::Minimized) => {
                    desktop.minimize_window(id);
                }
                Some(WindowMode::Normal) => {
                    desktop.restore_window(id);
                }
                None => {}
            }
        }
    }

    fn info_for(&self, record: &WindowRecord<C>) -> Option<PersistedWindowInfo> {
        let key = self.key_for(record)?;
        Some(PersistedWindowInfo {
            key,
            kind: record.kind.clone(),
            title: record.title.clone(),
            singleton_key: record.singleton_key.clone(),
            icon: record.icon.clone(),
            props: record.props.clone(),
            meta: record.meta.clone(),
        })
    }
}

/// Shared control surface for an installed [`PersistencePlugin`].
pub struct PersistenceHandle<C> {
    shared: Rc<Shared<C>>,
}

impl<C> Clone for PersistenceHandle<C> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<C: Clone + 'static> PersistenceHandle<C> {
    /// Saves immediately, cancelling any pending debounced save.
    pub fn save(&self) {
        self.shared.save_now();
    }

    /// Fires the pending debounced save if its quiet period has elapsed.
    /// The host pumps this from its timer or frame loop. Returns whether a
    /// save happened.
    pub fn flush_due(&self) -> bool {
        let due = {
            let state = self.shared.state.borrow();
            matches!(state.pending_deadline, Some(deadline) if self.shared.clock.now_ms() >= deadline)
        };
        if due {
            self.shared.save_now();
        }
        due
    }

    pub fn has_pending_save(&self) -> bool {
        self.shared.state.borrow().pending_deadline.is_some()
    }

    /// Reloads the document from storage and reapplies it to every open
    /// window.
    pub fn load(&self, desktop: &mut Desktop<C>) {
        if let Some(loaded) = self.shared.storage.load() {
            self.shared.state.borrow_mut().current = loaded;
        }
        let ids: Vec<WindowId> = desktop.windows().iter().map(|w| w.id).collect();
        for id in ids {
            self.shared.apply_persisted(desktop, id);
        }
    }

    /// Recreates the windows recorded in the persisted session through the
    /// configured factory. Windows whose key is already open are skipped, so
    /// calling this twice (or after eager singletons opened) is safe.
    pub fn restore_session(&self, desktop: &mut Desktop<C>) {
        let shared = &self.shared;
        let Some(factory) = shared.window_factory.clone() else {
            return;
        };
        if !shared.persist_session {
            return;
        }
        let infos = shared.state.borrow().current.open_windows.clone();
        if infos.is_empty() {
            return;
        }

        shared.state.borrow_mut().restoring = true;
        for info in &infos {
            let already_open = desktop
                .windows()
                .iter()
                .any(|w| shared.key_for(w).as_deref() == Some(info.key.as_str()));
            if already_open {
                continue;
            }
            let Some(mut def) = factory(info) else {
                continue;
            };
            if shared.persist_bounds {
                let persisted = shared.state.borrow().current.windows.get(&info.key).cloned();
                if let Some(bounds) = persisted.and_then(|p| p.bounds) {
                    def.initial_bounds = Some(bounds);
                }
            }
            // The created-window handler reapplies persisted bounds and mode.
            desktop.create_window(def);
        }

        let open_windows: Vec<PersistedWindowInfo> = desktop
            .windows()
            .iter()
            .filter_map(|record| shared.info_for(record))
            .collect();
        {
            let mut state = shared.state.borrow_mut();
            state.current.open_windows = open_windows;
            state.restoring = false;
        }
        shared.save_now();
    }

    /// Drops both the in-memory document and the backing store.
    pub fn clear(&self) {
        {
            let mut state = self.shared.state.borrow_mut();
            state.current = PersistedState::default();
            state.pending_deadline = None;
        }
        self.shared.storage.clear();
    }

    /// Persisted state recorded for a window, if any.
    pub fn window_state(
        &self,
        desktop: &Desktop<C>,
        id: WindowId,
    ) -> Option<PersistedWindowState> {
        let key = self.shared.key_of(desktop, id)?;
        self.shared.state.borrow().current.windows.get(&key).cloned()
    }

    pub fn is_enabled(&self) -> bool {
        self.shared.state.borrow().enabled
    }

    /// Disabling stops scheduling saves; already-pending saves still flush.
    pub fn set_enabled(&self, enabled: bool) {
        self.shared.state.borrow_mut().enabled = enabled;
    }
}

/// Records window bounds, modes, and optionally z-order and the open-window
/// session as they change, saving through the configured adapter after a
/// debounce interval.
pub struct PersistencePlugin<C> {
    shared: Rc<Shared<C>>,
}

impl<C: Clone + 'static> PersistencePlugin<C> {
    pub fn new(options: PersistenceOptions<C>) -> Self {
        let window_key = options.window_key.unwrap_or_else(|| {
            Rc::new(|record: &WindowRecord<C>| {
                Some(
                    record
                        .singleton_key
                        .clone()
                        .unwrap_or_else(|| record.kind.clone()),
                )
            })
        });
        Self {
            shared: Rc::new(Shared {
                state: RefCell::new(PersistenceState {
                    enabled: true,
                    restoring: false,
                    current: PersistedState::default(),
                    pending_deadline: None,
                }),
                storage: options.storage,
                clock: options.clock,
                debounce_ms: options.debounce_ms,
                persist_bounds: options.persist_bounds,
                persist_mode: options.persist_mode,
                persist_z_order: options.persist_z_order,
                persist_session: options.persist_session,
                window_key,
                window_factory: options.window_factory,
            }),
        }
    }

    pub fn handle(&self) -> PersistenceHandle<C> {
        PersistenceHandle {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<C: Clone + 'static> DesktopPlugin<C> for PersistencePlugin<C> {
    fn name(&self) -> &str {
        "persistence"
    }

    fn install(&self, desktop: &mut Desktop<C>) -> Option<PluginCleanup<C>> {
        let shared = &self.shared;
        if let Some(loaded) = shared.storage.load() {
            shared.state.borrow_mut().current = loaded;
        }

        let mut tokens: Vec<HandlerId> = Vec::new();

        let s = Rc::clone(shared);
        tokens.push(desktop.on(
            EventKind::WindowCreated,
            Rc::new(RefCell::new(move |desktop: &mut Desktop<C>, event: &DesktopEvent<C>| {
                let DesktopEvent::WindowCreated(record) = event else {
                    return;
                };
                let restoring = s.state.borrow().restoring;
                if s.persist_session && !restoring {
                    if let Some(info) = s.info_for(record) {
                        let mut state = s.state.borrow_mut();
                        if !state.current.open_windows.iter().any(|w| w.key == info.key) {
                            state.current.open_windows.push(info);
                            drop(state);
                            s.schedule_save();
                        }
                    }
                }
                s.apply_persisted(desktop, record.id);
            })),
        ));

        let s = Rc::clone(shared);
        tokens.push(desktop.on(
            EventKind::WindowBounds,
            Rc::new(RefCell::new(move |desktop: &mut Desktop<C>, event: &DesktopEvent<C>| {
                if !s.persist_bounds {
                    return;
                }
                if let DesktopEvent::WindowBounds {
                    window_id, bounds, ..
                } = event
                {
                    let bounds = *bounds;
                    s.update_window_state(desktop, *window_id, |state| state.bounds = Some(bounds));
                }
            })),
        ));

        for (kind, mode) in [
            (EventKind::WindowMaximized, WindowMode::Maximized),
            (EventKind::WindowMinimized, WindowMode::Minimized),
            (EventKind::WindowRestored, WindowMode::Normal),
        ] {
            let s = Rc::clone(shared);
            tokens.push(desktop.on(
                kind,
                Rc::new(RefCell::new(move |desktop: &mut Desktop<C>, event: &DesktopEvent<C>| {
                    if !s.persist_mode {
                        return;
                    }
                    let window_id = match event {
                        DesktopEvent::WindowMaximized { window_id }
                        | DesktopEvent::WindowMinimized { window_id }
                        | DesktopEvent::WindowRestored { window_id } => *window_id,
                        _ => return,
                    };
                    s.update_window_state(desktop, window_id, |state| state.mode = Some(mode));
                })),
            ));
        }

        let s = Rc::clone(shared);
        tokens.push(desktop.on(
            EventKind::WindowFocused,
            Rc::new(RefCell::new(move |desktop: &mut Desktop<C>, _: &DesktopEvent<C>| {
                s.record_z_order(desktop);
            })),
        ));

        let s = Rc::clone(shared);
        tokens.push(desktop.on(
            EventKind::WindowClosed,
            Rc::new(RefCell::new(move |desktop: &mut Desktop<C>, event: &DesktopEvent<C>| {
                let DesktopEvent::WindowClosed { window, .. } = event else {
                    return;
                };
                if s.persist_session {
                    if let Some(key) = s.key_for(window) {
                        s.state
                            .borrow_mut()
                            .current
                            .open_windows
                            .retain(|w| w.key != key);
                        s.schedule_save();
                    }
                }
                s.record_z_order(desktop);
            })),
        ));

        let shared = Rc::clone(shared);
        Some(Box::new(move |desktop| {
            for token in tokens {
                desktop.off(token);
            }
            shared.state.borrow_mut().pending_deadline = None;
        }))
    }
}
