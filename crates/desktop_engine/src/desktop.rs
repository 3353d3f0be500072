//! The stateful desktop engine: window registry, z-order/focus, mode
//! transitions, bounds updates, switcher, plugin host, and UI slots.

use std::collections::HashMap;
use std::rc::Rc;

use slotmap::{SecondaryMap, SlotMap};

use crate::bounds::Bounds;
use crate::events::{DesktopEvent, EventBus, EventHandler, EventKind, HandlerId};
use crate::model::{WindowDef, WindowId, WindowMode, WindowRecord};
use crate::plugin::{DesktopPlugin, PluginRecord};
use crate::ui::UiRegistration;

/// Token returned by [`Desktop::add_bounds_interceptor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InterceptorId(u64);

/// Bounds transform consulted before a bounds update commits. Interceptors
/// run in registration order; each receives the engine read-only plus the
/// candidate bounds produced by the previous stage.
pub type BoundsInterceptor<C> = Rc<dyn Fn(&Desktop<C>, WindowId, Bounds) -> Bounds>;

struct InterceptorEntry<C> {
    id: InterceptorId,
    transform: BoundsInterceptor<C>,
}

#[derive(Debug, Clone, Copy, Default)]
struct SwitcherState {
    active: bool,
    selected: Option<WindowId>,
}

/// A single desktop instance.
///
/// All state is private; accessors return defensive copies. The engine is
/// single-threaded and synchronous — every mutating method finishes its
/// state change before emitting events, so event handlers observe a
/// consistent engine.
pub struct Desktop<C> {
    windows: SlotMap<WindowId, WindowRecord<C>>,
    z_order: Vec<WindowId>,
    modes: SecondaryMap<WindowId, WindowMode>,
    restore_bounds: SecondaryMap<WindowId, Bounds>,
    bounds_overrides: SecondaryMap<WindowId, Bounds>,
    bus: EventBus<C>,
    interceptors: Vec<InterceptorEntry<C>>,
    next_interceptor_id: u64,
    plugins: HashMap<String, PluginRecord<C>>,
    ui: Vec<UiRegistration<C>>,
    switcher: SwitcherState,
}

impl<C> Default for Desktop<C> {
    fn default() -> Self {
        Self {
            windows: SlotMap::with_key(),
            z_order: Vec::new(),
            modes: SecondaryMap::new(),
            restore_bounds: SecondaryMap::new(),
            bounds_overrides: SecondaryMap::new(),
            bus: EventBus::default(),
            interceptors: Vec::new(),
            next_interceptor_id: 1,
            plugins: HashMap::new(),
            ui: Vec::new(),
            switcher: SwitcherState::default(),
        }
    }
}

impl<C: Clone> Desktop<C> {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- window lifecycle -------------------------------------------------

    /// Opens a window. The finalized record is stored, appended to the top of
    /// the z-order (the new window is focused), and a clone of it is returned
    /// and carried on the `WindowCreated` event.
    pub fn create_window(&mut self, def: WindowDef<C>) -> WindowRecord<C> {
        let id = self
            .windows
            .insert_with_key(|id| WindowRecord::from_def(id, def));
        self.z_order.push(id);
        let record = self.windows[id].clone();
        self.emit(DesktopEvent::WindowCreated(record.clone()));
        record
    }

    /// Closes a window, pruning its z-order entry and every side table
    /// atomically. Returns `false` for unknown ids.
    pub fn close_window(&mut self, id: WindowId) -> bool {
        let Some(record) = self.windows.remove(id) else {
            return false;
        };
        self.z_order.retain(|w| *w != id);
        self.modes.remove(id);
        self.restore_bounds.remove(id);
        self.bounds_overrides.remove(id);
        self.fix_switcher_selection();
        self.emit(DesktopEvent::WindowClosed {
            window_id: id,
            window: record,
        });
        true
    }

    /// Borrow of the stored record, if the window is open.
    pub fn window(&self, id: WindowId) -> Option<&WindowRecord<C>> {
        self.windows.get(id)
    }

    /// Snapshot of all open windows in stacking order (bottom first).
    pub fn windows(&self) -> Vec<WindowRecord<C>> {
        self.z_order
            .iter()
            .filter_map(|id| self.windows.get(*id))
            .cloned()
            .collect()
    }

    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    /// Snapshot of the z-order, oldest-focused first, focused last.
    pub fn z_order(&self) -> Vec<WindowId> {
        self.z_order.clone()
    }

    // ---- focus ------------------------------------------------------------

    pub fn focused_window_id(&self) -> Option<WindowId> {
        self.z_order.last().copied()
    }

    /// Raises and focuses a window. Emits `WindowBlurred` for the previously
    /// focused window (when different) before `WindowFocused`; focusing the
    /// already-focused window re-emits `WindowFocused` alone.
    pub fn focus_window(&mut self, id: WindowId) -> bool {
        let Some(position) = self.z_order.iter().position(|w| *w == id) else {
            return false;
        };
        let previous = self.z_order.last().copied();
        if previous != Some(id) {
            self.z_order.remove(position);
            self.z_order.push(id);
            if let Some(previous) = previous {
                self.emit(DesktopEvent::WindowBlurred {
                    window_id: previous,
                });
            }
        }
        self.emit(DesktopEvent::WindowFocused { window_id: id });
        true
    }

    /// Alt-Tab style focus cycling over non-minimized windows.
    ///
    /// Forward cycling jumps to the second-most-recently-used window, so two
    /// forward cycles bounce between the top two windows rather than walking
    /// the whole stack.
    pub fn cycle_focus(&mut self, reverse: bool) -> bool {
        let candidates: Vec<WindowId> = self
            .z_order
            .iter()
            .copied()
            .filter(|id| self.mode(*id) != WindowMode::Minimized)
            .collect();
        if candidates.is_empty() {
            return false;
        }
        let current = self
            .focused_window_id()
            .and_then(|focused| candidates.iter().position(|id| *id == focused));
        let next = match current {
            None => {
                if reverse {
                    0
                } else {
                    candidates.len() - 1
                }
            }
            Some(index) => {
                if reverse {
                    (index + 1) % candidates.len()
                } else {
                    (index + candidates.len() - 1) % candidates.len()
                }
            }
        };
        self.focus_window(candidates[next])
    }

    // ---- bounds & mode ----------------------------------------------------

    /// Commits a bounds update after passing the candidate through the
    /// interceptor chain. Emits `WindowBounds` with the previous bounds.
    ///
    /// Constraint clamping is the caller's job (via
    /// [`crate::bounds::calc_resize`]); this method stores whatever the
    /// chain resolves.
    pub fn update_bounds(&mut self, id: WindowId, bounds: Bounds) -> bool {
        if !self.windows.contains_key(id) {
            return false;
        }
        let chain: Vec<BoundsInterceptor<C>> = self
            .interceptors
            .iter()
            .map(|entry| Rc::clone(&entry.transform))
            .collect();
        let mut resolved = bounds;
        for transform in chain {
            resolved = transform(&*self, id, resolved);
        }
        let old_bounds = self
            .bounds(id)
            .unwrap_or_else(|| self.windows[id].initial_bounds);
        self.bounds_overrides.insert(id, resolved);
        self.emit(DesktopEvent::WindowBounds {
            window_id: id,
            bounds: resolved,
            old_bounds,
        });
        true
    }

    /// Current bounds: the stored override if any, else the record's initial
    /// bounds. `None` for unknown ids.
    pub fn bounds(&self, id: WindowId) -> Option<Bounds> {
        let record = self.windows.get(id)?;
        Some(
            self.bounds_overrides
                .get(id)
                .copied()
                .unwrap_or(record.initial_bounds),
        )
    }

    /// Current mode; `Normal` for windows without a mode entry (and for
    /// unknown ids, matching the engine's never-throw accessor policy).
    pub fn mode(&self, id: WindowId) -> WindowMode {
        self.modes.get(id).copied().unwrap_or_default()
    }

    /// Sets the mode to minimized. Permissive: minimizing an already
    /// minimized window re-emits the event.
    pub fn minimize_window(&mut self, id: WindowId) -> bool {
        if !self.windows.contains_key(id) {
            return false;
        }
        self.modes.insert(id, WindowMode::Minimized);
        self.fix_switcher_selection();
        self.emit(DesktopEvent::WindowMinimized { window_id: id });
        true
    }

    /// Sets the mode to maximized, snapshotting the current bounds as the
    /// restore point when the previous mode was `Normal`.
    pub fn maximize_window(&mut self, id: WindowId) -> bool {
        if !self.windows.contains_key(id) {
            return false;
        }
        if self.mode(id) == WindowMode::Normal {
            if let Some(bounds) = self.bounds(id) {
                self.restore_bounds.insert(id, bounds);
            }
        }
        self.modes.insert(id, WindowMode::Maximized);
        self.emit(DesktopEvent::WindowMaximized { window_id: id });
        true
    }

    /// Returns the window to `Normal`, reapplying the restore-point bounds if
    /// one was snapshotted. The snapshot is applied directly (no interceptor
    /// pass, no `WindowBounds` event) and consumed.
    pub fn restore_window(&mut self, id: WindowId) -> bool {
        if !self.windows.contains_key(id) {
            return false;
        }
        if let Some(bounds) = self.restore_bounds.remove(id) {
            self.bounds_overrides.insert(id, bounds);
        }
        self.modes.insert(id, WindowMode::Normal);
        self.emit(DesktopEvent::WindowRestored { window_id: id });
        true
    }

    // ---- window switcher --------------------------------------------------

    pub fn switcher_active(&self) -> bool {
        self.switcher.active
    }

    pub fn switcher_selected_id(&self) -> Option<WindowId> {
        self.switcher.selected
    }

    /// Non-minimized windows most-recently-used first — the candidate list
    /// the switcher overlay renders.
    pub fn switcher_windows(&self) -> Vec<WindowRecord<C>> {
        self.switcher_candidates()
            .into_iter()
            .filter_map(|id| self.windows.get(id))
            .cloned()
            .collect()
    }

    /// Activates the switcher. Pre-selects the second-most-recent window when
    /// two or more candidates exist, else the only one. No-op with no
    /// candidates.
    pub fn open_switcher(&mut self) -> bool {
        let candidates = self.switcher_candidates();
        if candidates.is_empty() {
            return false;
        }
        self.switcher.active = true;
        self.switcher.selected = candidates.get(1).or_else(|| candidates.first()).copied();
        true
    }

    /// Moves the switcher selection one step through the MRU list, wrapping.
    pub fn cycle_switcher_selection(&mut self, reverse: bool) {
        if !self.switcher.active {
            return;
        }
        let candidates = self.switcher_candidates();
        if candidates.is_empty() {
            return;
        }
        let next = match self
            .switcher
            .selected
            .and_then(|selected| candidates.iter().position(|id| *id == selected))
        {
            Some(index) => {
                if reverse {
                    (index + candidates.len() - 1) % candidates.len()
                } else {
                    (index + 1) % candidates.len()
                }
            }
            None => 0,
        };
        self.switcher.selected = Some(candidates[next]);
    }

    /// Deactivates the switcher, focusing the selection when `commit` is
    /// set. Selection state is always cleared.
    pub fn close_switcher(&mut self, commit: bool) {
        if !self.switcher.active {
            return;
        }
        let selected = self.switcher.selected.take();
        self.switcher.active = false;
        if commit {
            if let Some(id) = selected {
                self.focus_window(id);
            }
        }
    }

    fn switcher_candidates(&self) -> Vec<WindowId> {
        self.z_order
            .iter()
            .rev()
            .copied()
            .filter(|id| self.mode(*id) != WindowMode::Minimized)
            .collect()
    }

    /// Keeps the switcher invariant: while active, the selection is a
    /// non-minimized open window. Reselects the most recent candidate or
    /// deactivates when none remain.
    fn fix_switcher_selection(&mut self) {
        if !self.switcher.active {
            return;
        }
        let valid = self.switcher.selected.is_some_and(|id| {
            self.z_order.contains(&id) && self.mode(id) != WindowMode::Minimized
        });
        if valid {
            return;
        }
        match self.switcher_candidates().first() {
            Some(first) => self.switcher.selected = Some(*first),
            None => {
                self.switcher.active = false;
                self.switcher.selected = None;
            }
        }
    }

    // ---- event bus --------------------------------------------------------

    /// Subscribes to one event kind. Handlers run synchronously in
    /// registration order.
    pub fn on(&mut self, kind: EventKind, handler: EventHandler<C>) -> HandlerId {
        self.bus.subscribe(kind, handler)
    }

    /// Removes a subscription. `false` if the token is unknown.
    pub fn off(&mut self, id: HandlerId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Number of live subscriptions, all kinds included.
    pub fn subscriber_count(&self) -> usize {
        self.bus.len()
    }

    fn emit(&mut self, event: DesktopEvent<C>) {
        let handlers = self.bus.handlers_for(event.kind());
        for handler in handlers {
            (handler.borrow_mut())(self, &event);
        }
    }

    // ---- bounds interceptors ----------------------------------------------

    /// Appends a transform to the bounds-update chain.
    pub fn add_bounds_interceptor(&mut self, transform: BoundsInterceptor<C>) -> InterceptorId {
        let id = InterceptorId(self.next_interceptor_id);
        self.next_interceptor_id += 1;
        self.interceptors.push(InterceptorEntry {
            id,
            transform,
        });
        id
    }

    pub fn remove_bounds_interceptor(&mut self, id: InterceptorId) -> bool {
        let before = self.interceptors.len();
        self.interceptors.retain(|entry| entry.id != id);
        self.interceptors.len() != before
    }

    // ---- plugin host ------------------------------------------------------

    /// Installs a plugin. Duplicate names are rejected without invoking
    /// `install`.
    pub fn install_plugin(&mut self, plugin: &dyn DesktopPlugin<C>) -> bool {
        let name = plugin.name().to_string();
        if self.plugins.contains_key(&name) {
            tracing::warn!(plugin = %name, "plugin already installed, ignoring");
            return false;
        }
        let cleanup = plugin.install(self);
        self.plugins.insert(name, PluginRecord { cleanup });
        true
    }

    /// Uninstalls by name, running the stored cleanup first so the engine is
    /// left as if the plugin had never been installed.
    pub fn uninstall_plugin(&mut self, name: &str) -> bool {
        let Some(record) = self.plugins.remove(name) else {
            return false;
        };
        if let Some(cleanup) = record.cleanup {
            cleanup(self);
        }
        true
    }

    pub fn has_plugin(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }

    // ---- UI slot registry -------------------------------------------------

    /// Registers a component into a named slot. Duplicate registration ids
    /// are rejected.
    pub fn register_ui(&mut self, registration: UiRegistration<C>) -> bool {
        if self.ui.iter().any(|reg| reg.id == registration.id) {
            tracing::warn!(id = %registration.id, "ui registration id already in use");
            return false;
        }
        self.ui.push(registration);
        true
    }

    pub fn unregister_ui(&mut self, id: &str) -> bool {
        let before = self.ui.len();
        self.ui.retain(|reg| reg.id != id);
        self.ui.len() != before
    }

    /// Registrations for a slot, stably sorted by ascending `order`; ties
    /// keep registration order.
    pub fn ui_for_slot(&self, slot: &str) -> Vec<UiRegistration<C>> {
        let mut registrations: Vec<UiRegistration<C>> = self
            .ui
            .iter()
            .filter(|reg| reg.slot == slot)
            .cloned()
            .collect();
        registrations.sort_by_key(|reg| reg.order);
        registrations
    }

    // ---- context menu intents ---------------------------------------------

    /// Announces a context-menu request on the desktop background.
    pub fn request_desktop_context_menu(&mut self, x: f64, y: f64) {
        self.emit(DesktopEvent::DesktopContextMenu { x, y });
    }

    /// Announces a context-menu request on a window. `false` for unknown ids.
    pub fn request_window_context_menu(&mut self, id: WindowId, x: f64, y: f64) -> bool {
        if !self.windows.contains_key(id) {
            return false;
        }
        self.emit(DesktopEvent::WindowContextMenu {
            window_id: id,
            x,
            y,
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::bounds::Bounds;
    use crate::model::WindowDef;

    fn desktop() -> Desktop<()> {
        Desktop::new()
    }

    fn open(desktop: &mut Desktop<()>, title: &str) -> WindowId {
        desktop.create_window(WindowDef::new("test", title, ())).id
    }

    fn record_events(desktop: &mut Desktop<()>, kind: EventKind) -> Rc<RefCell<Vec<String>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        desktop.on(
            kind,
            Rc::new(RefCell::new(move |_: &mut Desktop<()>, event: &DesktopEvent<()>| {
                sink.borrow_mut().push(format!("{:?}", event.kind()));
            })),
        );
        log
    }

    #[test]
    fn z_order_tracks_open_windows_exactly() {
        let mut d = desktop();
        let a = open(&mut d, "A");
        let b = open(&mut d, "B");
        let c = open(&mut d, "C");

        assert_eq!(d.z_order(), vec![a, b, c]);

        d.focus_window(a);
        d.close_window(b);

        assert_eq!(d.z_order(), vec![c, a]);
        assert_eq!(d.window_count(), 2);
        assert_eq!(d.focused_window_id(), Some(a));
    }

    #[test]
    fn focused_window_is_last_z_order_entry_or_none() {
        let mut d = desktop();
        assert_eq!(d.focused_window_id(), None);

        let a = open(&mut d, "A");
        assert_eq!(d.focused_window_id(), Some(a));

        d.close_window(a);
        assert_eq!(d.focused_window_id(), None);
    }

    #[test]
    fn create_window_applies_default_bounds_and_returns_clone() {
        let mut d = desktop();
        let record = d.create_window(WindowDef::new("editor", "Editor", ()));

        assert_eq!(record.initial_bounds, Bounds::default());
        assert_eq!(d.bounds(record.id), Some(Bounds::default()));
    }

    #[test]
    fn close_window_returns_false_for_unknown_id() {
        let mut d = desktop();
        let a = open(&mut d, "A");
        d.close_window(a);
        assert!(!d.close_window(a));
    }

    #[test]
    fn focus_emits_blur_before_focus() {
        let mut d = desktop();
        let a = open(&mut d, "A");
        let _b = open(&mut d, "B");

        let order = Rc::new(RefCell::new(Vec::new()));
        let focus_log = Rc::clone(&order);
        d.on(
            EventKind::WindowFocused,
            Rc::new(RefCell::new(move |_: &mut Desktop<()>, _: &DesktopEvent<()>| {
                focus_log.borrow_mut().push("focused");
            })),
        );
        let blur_log = Rc::clone(&order);
        d.on(
            EventKind::WindowBlurred,
            Rc::new(RefCell::new(move |_: &mut Desktop<()>, _: &DesktopEvent<()>| {
                blur_log.borrow_mut().push("blurred");
            })),
        );

        d.focus_window(a);

        assert_eq!(*order.borrow(), vec!["blurred", "focused"]);
    }

    #[test]
    fn refocusing_focused_window_emits_focus_without_blur() {
        let mut d = desktop();
        let a = open(&mut d, "A");

        let focused = record_events(&mut d, EventKind::WindowFocused);
        let blurred = record_events(&mut d, EventKind::WindowBlurred);

        assert!(d.focus_window(a));

        assert_eq!(focused.borrow().len(), 1);
        assert!(blurred.borrow().is_empty());
    }

    #[test]
    fn cycle_focus_bounces_between_top_two_windows() {
        let mut d = desktop();
        let _a = open(&mut d, "A");
        let b = open(&mut d, "B");
        let c = open(&mut d, "C");

        assert!(d.cycle_focus(false));
        assert_eq!(d.focused_window_id(), Some(b));

        assert!(d.cycle_focus(false));
        assert_eq!(d.focused_window_id(), Some(c));
    }

    #[test]
    fn cycle_focus_reverse_walks_toward_least_recent() {
        let mut d = desktop();
        let a = open(&mut d, "A");
        let _b = open(&mut d, "B");
        let _c = open(&mut d, "C");

        assert!(d.cycle_focus(true));
        assert_eq!(d.focused_window_id(), Some(a));
    }

    #[test]
    fn cycle_focus_skips_minimized_and_fails_with_none_eligible() {
        let mut d = desktop();
        let a = open(&mut d, "A");
        d.minimize_window(a);

        assert!(!d.cycle_focus(false));
    }

    #[test]
    fn maximize_then_restore_round_trips_bounds() {
        let mut d = desktop();
        let a = open(&mut d, "A");
        let before = Bounds::new(50.0, 50.0, 300.0, 200.0);
        d.update_bounds(a, before);

        d.maximize_window(a);
        d.update_bounds(a, Bounds::new(0.0, 0.0, 1920.0, 1080.0));
        d.restore_window(a);

        assert_eq!(d.bounds(a), Some(before));
        assert_eq!(d.mode(a), WindowMode::Normal);
    }

    #[test]
    fn maximizing_twice_keeps_original_restore_point() {
        let mut d = desktop();
        let a = open(&mut d, "A");
        let before = Bounds::new(10.0, 10.0, 200.0, 100.0);
        d.update_bounds(a, before);

        d.maximize_window(a);
        d.maximize_window(a);
        d.restore_window(a);

        assert_eq!(d.bounds(a), Some(before));
    }

    #[test]
    fn redundant_minimize_re_emits_event() {
        let mut d = desktop();
        let a = open(&mut d, "A");
        let minimized = record_events(&mut d, EventKind::WindowMinimized);

        d.minimize_window(a);
        d.minimize_window(a);

        assert_eq!(minimized.borrow().len(), 2);
    }

    #[test]
    fn update_bounds_reports_old_bounds() {
        let mut d = desktop();
        let a = open(&mut d, "A");

        let seen = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&seen);
        d.on(
            EventKind::WindowBounds,
            Rc::new(RefCell::new(move |_: &mut Desktop<()>, event: &DesktopEvent<()>| {
                if let DesktopEvent::WindowBounds {
                    bounds, old_bounds, ..
                } = event
                {
                    *sink.borrow_mut() = Some((*bounds, *old_bounds));
                }
            })),
        );

        let next = Bounds::new(5.0, 5.0, 500.0, 400.0);
        assert!(d.update_bounds(a, next));

        assert_eq!(*seen.borrow(), Some((next, Bounds::default())));
    }

    #[test]
    fn bounds_interceptors_run_in_order_and_can_be_removed() {
        let mut d = desktop();
        let a = open(&mut d, "A");

        let first = d.add_bounds_interceptor(Rc::new(|_, _, mut bounds| {
            bounds.x += 1.0;
            bounds
        }));
        let _second = d.add_bounds_interceptor(Rc::new(|_, _, mut bounds| {
            bounds.x *= 2.0;
            bounds
        }));

        d.update_bounds(a, Bounds::new(10.0, 0.0, 100.0, 100.0));
        assert_eq!(d.bounds(a).unwrap().x, 22.0);

        assert!(d.remove_bounds_interceptor(first));
        d.update_bounds(a, Bounds::new(10.0, 0.0, 100.0, 100.0));
        assert_eq!(d.bounds(a).unwrap().x, 20.0);
    }

    #[test]
    fn handlers_can_reenter_the_engine() {
        let mut d = desktop();
        let seen_focused = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&seen_focused);
        d.on(
            EventKind::WindowCreated,
            Rc::new(RefCell::new(move |desktop: &mut Desktop<()>, event: &DesktopEvent<()>| {
                if let DesktopEvent::WindowCreated(record) = event {
                    // State must already be consistent mid-emission.
                    *sink.borrow_mut() = desktop.focused_window_id();
                    assert_eq!(desktop.focused_window_id(), Some(record.id));
                }
            })),
        );

        let a = open(&mut d, "A");
        assert_eq!(*seen_focused.borrow(), Some(a));
    }

    #[test]
    fn unsubscribed_handlers_stop_firing() {
        let mut d = desktop();
        let log = Rc::new(RefCell::new(0u32));
        let sink = Rc::clone(&log);
        let token = d.on(
            EventKind::WindowCreated,
            Rc::new(RefCell::new(move |_: &mut Desktop<()>, _: &DesktopEvent<()>| {
                *sink.borrow_mut() += 1;
            })),
        );

        open(&mut d, "A");
        assert!(d.off(token));
        assert!(!d.off(token));
        open(&mut d, "B");

        assert_eq!(*log.borrow(), 1);
    }

    #[test]
    fn switcher_prefers_second_most_recent_window() {
        let mut d = desktop();
        let a = open(&mut d, "A");
        let b = open(&mut d, "B");

        assert!(d.open_switcher());
        assert!(d.switcher_active());
        assert_eq!(d.switcher_selected_id(), Some(a));

        d.close_switcher(true);
        assert!(!d.switcher_active());
        assert_eq!(d.switcher_selected_id(), None);
        assert_eq!(d.focused_window_id(), Some(a));
        let _ = b;
    }

    #[test]
    fn switcher_with_single_window_selects_it() {
        let mut d = desktop();
        let a = open(&mut d, "A");

        assert!(d.open_switcher());
        assert_eq!(d.switcher_selected_id(), Some(a));
    }

    #[test]
    fn switcher_is_noop_without_candidates() {
        let mut d = desktop();
        assert!(!d.open_switcher());

        let a = open(&mut d, "A");
        d.minimize_window(a);
        assert!(!d.open_switcher());
        assert!(!d.switcher_active());
    }

    #[test]
    fn switcher_selection_wraps_in_both_directions() {
        let mut d = desktop();
        let a = open(&mut d, "A");
        let b = open(&mut d, "B");
        let c = open(&mut d, "C");

        // MRU candidates: [C, B, A], pre-selected B.
        d.open_switcher();
        assert_eq!(d.switcher_selected_id(), Some(b));

        d.cycle_switcher_selection(false);
        assert_eq!(d.switcher_selected_id(), Some(a));
        d.cycle_switcher_selection(false);
        assert_eq!(d.switcher_selected_id(), Some(c));

        d.cycle_switcher_selection(true);
        assert_eq!(d.switcher_selected_id(), Some(a));
    }

    #[test]
    fn closing_selected_window_reselects_most_recent_candidate() {
        let mut d = desktop();
        let _a = open(&mut d, "A");
        let b = open(&mut d, "B");
        let c = open(&mut d, "C");

        d.open_switcher();
        assert_eq!(d.switcher_selected_id(), Some(b));

        d.close_window(b);
        assert!(d.switcher_active());
        assert_eq!(d.switcher_selected_id(), Some(c));
    }

    #[test]
    fn minimizing_last_candidate_deactivates_switcher() {
        let mut d = desktop();
        let a = open(&mut d, "A");

        d.open_switcher();
        d.minimize_window(a);

        assert!(!d.switcher_active());
        assert_eq!(d.switcher_selected_id(), None);
    }

    #[test]
    fn switcher_windows_excludes_minimized_in_mru_order() {
        let mut d = desktop();
        let a = open(&mut d, "A");
        let b = open(&mut d, "B");
        let c = open(&mut d, "C");

        d.minimize_window(b);

        let ids: Vec<WindowId> = d.switcher_windows().iter().map(|w| w.id).collect();
        assert_eq!(ids, vec![c, a]);
    }

    #[test]
    fn minimized_window_scenario_end_to_end() {
        let mut d = desktop();
        let w = d
            .create_window({
                let mut def = WindowDef::new("app", "W", ());
                def.initial_bounds = Some(Bounds::new(0.0, 0.0, 200.0, 150.0));
                def
            })
            .id;

        d.minimize_window(w);

        assert_eq!(d.mode(w), WindowMode::Minimized);
        assert!(d.switcher_windows().is_empty());
        assert!(!d.cycle_focus(false));
    }

    #[test]
    fn ui_registrations_sort_by_order_with_stable_ties() {
        let mut d = desktop();
        assert!(d.register_ui(UiRegistration::new("b", "taskbar", ()).with_order(0)));
        assert!(d.register_ui(UiRegistration::new("a", "taskbar", ()).with_order(-100)));
        assert!(d.register_ui(UiRegistration::new("c", "taskbar", ()).with_order(0)));
        assert!(d.register_ui(UiRegistration::new("d", "overlay", ())));

        let registrations = d.ui_for_slot("taskbar");
        let ids: Vec<&str> = registrations.iter().map(|reg| reg.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn duplicate_ui_id_is_rejected() {
        let mut d = desktop();
        assert!(d.register_ui(UiRegistration::new("x", "taskbar", ())));
        assert!(!d.register_ui(UiRegistration::new("x", "overlay", ())));
        assert!(d.unregister_ui("x"));
        assert!(!d.unregister_ui("x"));
    }

    #[test]
    fn plugin_install_is_idempotent_per_name() {
        struct Counting {
            calls: Rc<RefCell<u32>>,
        }
        impl DesktopPlugin<()> for Counting {
            fn name(&self) -> &str {
                "counting"
            }
            fn install(&self, _desktop: &mut Desktop<()>) -> Option<crate::PluginCleanup<()>> {
                *self.calls.borrow_mut() += 1;
                None
            }
        }

        let mut d = desktop();
        let calls = Rc::new(RefCell::new(0));
        let plugin = Counting {
            calls: Rc::clone(&calls),
        };

        assert!(d.install_plugin(&plugin));
        assert!(!d.install_plugin(&plugin));
        assert_eq!(*calls.borrow(), 1);
        assert!(d.has_plugin("counting"));
    }

    #[test]
    fn uninstall_runs_cleanup_and_allows_reinstall() {
        struct Subscribing;
        impl DesktopPlugin<()> for Subscribing {
            fn name(&self) -> &str {
                "subscribing"
            }
            fn install(&self, desktop: &mut Desktop<()>) -> Option<crate::PluginCleanup<()>> {
                let token = desktop.on(
                    EventKind::WindowCreated,
                    Rc::new(RefCell::new(|_: &mut Desktop<()>, _: &DesktopEvent<()>| {})),
                );
                Some(Box::new(move |desktop| {
                    desktop.off(token);
                }))
            }
        }

        let mut d = desktop();
        assert!(d.install_plugin(&Subscribing));
        assert_eq!(d.subscriber_count(), 1);

        assert!(d.uninstall_plugin("subscribing"));
        assert_eq!(d.subscriber_count(), 0);
        assert!(!d.has_plugin("subscribing"));
        assert!(!d.uninstall_plugin("subscribing"));

        assert!(d.install_plugin(&Subscribing));
        assert_eq!(d.subscriber_count(), 1);
    }

    #[test]
    fn context_menu_requests_emit_events() {
        let mut d = desktop();
        let a = open(&mut d, "A");

        let desktop_menus = record_events(&mut d, EventKind::DesktopContextMenu);
        let window_menus = record_events(&mut d, EventKind::WindowContextMenu);

        d.request_desktop_context_menu(12.0, 34.0);
        assert!(d.request_window_context_menu(a, 5.0, 6.0));
        d.close_window(a);
        assert!(!d.request_window_context_menu(a, 5.0, 6.0));

        assert_eq!(desktop_menus.borrow().len(), 1);
        assert_eq!(window_menus.borrow().len(), 1);
    }

    #[test]
    fn windows_snapshot_is_detached_from_engine_state() {
        let mut d = desktop();
        let a = open(&mut d, "A");

        let mut snapshot = d.windows();
        snapshot[0].title = "mutated".to_string();

        assert_eq!(d.window(a).unwrap().title, "A");
    }
}
