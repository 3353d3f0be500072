//! Application launcher menu: an app registry grouped by category plus a
//! singleton-aware launch path, with a button slotted into the taskbar.

use std::cell::RefCell;
use std::rc::Rc;

use desktop_engine::{Desktop, DesktopPlugin, PluginCleanup, UiRegistration, WindowDef, WindowId, WindowMode};

/// A launchable application entry.
pub struct StartMenuApp<C> {
    pub id: String,
    pub label: String,
    pub icon: Option<String>,
    /// Grouping category; uncategorized apps sort last.
    pub category: Option<String>,
    /// Display-only shortcut hint.
    pub shortcut: Option<String>,
    pub factory: Rc<dyn Fn() -> WindowDef<C>>,
}

impl<C> Clone for StartMenuApp<C> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            label: self.label.clone(),
            icon: self.icon.clone(),
            category: self.category.clone(),
            shortcut: self.shortcut.clone(),
            factory: Rc::clone(&self.factory),
        }
    }
}

impl<C> StartMenuApp<C> {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        factory: impl Fn() -> WindowDef<C> + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            icon: None,
            category: None,
            shortcut: None,
            factory: Rc::new(factory),
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_shortcut(mut self, shortcut: impl Into<String>) -> Self {
        self.shortcut = Some(shortcut.into());
        self
    }
}

struct StartMenuState<C> {
    apps: Vec<StartMenuApp<C>>,
    open: bool,
}

/// Shared control surface for an installed [`StartMenuPlugin`].
pub struct StartMenuHandle<C> {
    state: Rc<RefCell<StartMenuState<C>>>,
}

impl<C> Clone for StartMenuHandle<C> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<C: Clone + 'static> StartMenuHandle<C> {
    /// Registers an app. Duplicate ids are rejected.
    pub fn register_app(&self, app: StartMenuApp<C>) -> bool {
        let mut state = self.state.borrow_mut();
        if state.apps.iter().any(|a| a.id == app.id) {
            tracing::warn!(id = %app.id, "start menu app id already registered");
            return false;
        }
        state.apps.push(app);
        true
    }

    pub fn unregister_app(&self, id: &str) -> bool {
        let mut state = self.state.borrow_mut();
        let before = state.apps.len();
        state.apps.retain(|a| a.id != id);
        state.apps.len() != before
    }

    pub fn apps(&self) -> Vec<StartMenuApp<C>> {
        self.state.borrow().apps.clone()
    }

    /// Apps grouped for display: categorized groups first in category order,
    /// the uncategorized group last, labels sorted within each group.
    pub fn apps_by_category(&self) -> Vec<(Option<String>, Vec<StartMenuApp<C>>)> {
        let mut sorted = self.apps();
        sorted.sort_by(|a, b| match (&a.category, &b.category) {
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (a_cat, b_cat) => a_cat.cmp(b_cat).then_with(|| a.label.cmp(&b.label)),
        });

        let mut groups: Vec<(Option<String>, Vec<StartMenuApp<C>>)> = Vec::new();
        for app in sorted {
            match groups.last_mut() {
                Some((category, apps)) if *category == app.category => apps.push(app),
                _ => groups.push((app.category.clone(), vec![app])),
            }
        }
        groups
    }

    /// Launches an app by id. Singleton apps focus (restoring if minimized)
    /// an existing window with the same singleton key instead of opening a
    /// second one. Returns the resulting window id.
    pub fn launch(&self, desktop: &mut Desktop<C>, app_id: &str) -> Option<WindowId> {
        let factory = {
            let state = self.state.borrow();
            Rc::clone(&state.apps.iter().find(|a| a.id == app_id)?.factory)
        };
        let def = factory();

        if let Some(singleton_key) = &def.singleton_key {
            let existing = desktop
                .windows()
                .iter()
                .find(|w| w.singleton_key.as_ref() == Some(singleton_key))
                .map(|w| w.id);
            if let Some(id) = existing {
                if desktop.mode(id) == WindowMode::Minimized {
                    desktop.restore_window(id);
                }
                desktop.focus_window(id);
                return Some(id);
            }
        }

        Some(desktop.create_window(def).id)
    }

    pub fn open(&self) {
        self.state.borrow_mut().open = true;
    }

    pub fn close(&self) {
        self.state.borrow_mut().open = false;
    }

    pub fn toggle(&self) {
        let mut state = self.state.borrow_mut();
        state.open = !state.open;
    }

    pub fn is_open(&self) -> bool {
        self.state.borrow().open
    }
}

/// Registers the start button into the taskbar slot ahead of the window
/// list and exposes the app registry through [`StartMenuHandle`].
pub struct StartMenuPlugin<C> {
    state: Rc<RefCell<StartMenuState<C>>>,
    component: C,
}

impl<C: Clone + 'static> StartMenuPlugin<C> {
    pub fn new(component: C, apps: Vec<StartMenuApp<C>>) -> Self {
        Self {
            state: Rc::new(RefCell::new(StartMenuState { apps, open: false })),
            component,
        }
    }

    pub fn handle(&self) -> StartMenuHandle<C> {
        StartMenuHandle {
            state: Rc::clone(&self.state),
        }
    }
}

impl<C: Clone + 'static> DesktopPlugin<C> for StartMenuPlugin<C> {
    fn name(&self) -> &str {
        "start-menu"
    }

    fn install(&self, desktop: &mut Desktop<C>) -> Option<PluginCleanup<C>> {
        desktop.register_ui(
            UiRegistration::new("start-menu", "taskbar", self.component.clone()).with_order(-100),
        );
        let handle = self.handle();
        Some(Box::new(move |desktop| {
            desktop.unregister_ui("start-menu");
            handle.close();
        }))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn app(id: &str, label: &str) -> StartMenuApp<()> {
        StartMenuApp::new(id, label, || WindowDef::new("app", "W", ()))
    }

    fn setup(apps: Vec<StartMenuApp<()>>) -> (Desktop<()>, StartMenuHandle<()>) {
        let plugin = StartMenuPlugin::new((), apps);
        let handle = plugin.handle();
        let mut desktop = Desktop::new();
        assert!(desktop.install_plugin(&plugin));
        (desktop, handle)
    }

    #[test]
    fn duplicate_app_ids_are_rejected() {
        let (_desktop, handle) = setup(vec![app("files", "Files")]);
        assert!(!handle.register_app(app("files", "Files Again")));
        assert!(handle.register_app(app("editor", "Editor")));
        assert_eq!(handle.apps().len(), 2);
    }

    #[test]
    fn groups_sort_categories_first_then_labels() {
        let (_desktop, handle) = setup(vec![
            app("zsh", "Zsh"),
            app("calc", "Calculator").with_category("Utilities"),
            app("paint", "Paint").with_category("Graphics"),
            app("clock", "Clock").with_category("Utilities"),
        ]);

        let groups = handle.apps_by_category();
        let names: Vec<(Option<String>, Vec<String>)> = groups
            .into_iter()
            .map(|(cat, apps)| (cat, apps.into_iter().map(|a| a.label).collect()))
            .collect();

        assert_eq!(
            names,
            vec![
                (Some("Graphics".to_string()), vec!["Paint".to_string()]),
                (
                    Some("Utilities".to_string()),
                    vec!["Calculator".to_string(), "Clock".to_string()]
                ),
                (None, vec!["Zsh".to_string()]),
            ]
        );
    }

    #[test]
    fn launch_opens_a_window_through_the_factory() {
        let (mut desktop, handle) = setup(vec![StartMenuApp::new("editor", "Editor", || {
            WindowDef::new("editor", "Editor", ())
        })]);

        let id = handle.launch(&mut desktop, "editor").unwrap();
        assert_eq!(desktop.window(id).unwrap().kind, "editor");
        assert_eq!(handle.launch(&mut desktop, "missing"), None);
    }

    #[test]
    fn singleton_launch_focuses_the_existing_window() {
        let (mut desktop, handle) = setup(vec![StartMenuApp::new("settings", "Settings", || {
            let mut def = WindowDef::new("settings", "Settings", ());
            def.singleton_key = Some("settings".to_string());
            def
        })]);

        let first = handle.launch(&mut desktop, "settings").unwrap();
        desktop.create_window(WindowDef::new("other", "Other", ()));
        desktop.minimize_window(first);

        let second = handle.launch(&mut desktop, "settings").unwrap();
        assert_eq!(second, first);
        assert_eq!(desktop.window_count(), 2);
        assert_eq!(desktop.mode(first), WindowMode::Normal);
        assert_eq!(desktop.focused_window_id(), Some(first));
    }

    #[test]
    fn install_slots_the_start_button_before_other_taskbar_items() {
        let (mut desktop, _handle) = setup(vec![]);
        desktop.register_ui(UiRegistration::new("taskbar-main", "taskbar", ()));

        let ids: Vec<String> = desktop
            .ui_for_slot("taskbar")
            .into_iter()
            .map(|reg| reg.id)
            .collect();
        assert_eq!(ids, vec!["start-menu".to_string(), "taskbar-main".to_string()]);
    }

    #[test]
    fn open_state_toggles_and_resets_on_uninstall() {
        let (mut desktop, handle) = setup(vec![]);
        handle.toggle();
        assert!(handle.is_open());

        desktop.uninstall_plugin("start-menu");
        assert!(!handle.is_open());
        assert!(desktop.ui_for_slot("taskbar").is_empty());
    }
}
