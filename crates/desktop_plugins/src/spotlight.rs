//! Spotlight-style search over pluggable providers, with built-in providers
//! for registered apps and open windows.

use std::cell::RefCell;
use std::rc::Rc;

use desktop_engine::{Desktop, DesktopPlugin, PluginCleanup, UiRegistration, WindowMode};

use crate::start_menu::StartMenuHandle;

/// A searchable, activatable result.
pub struct SpotlightItem<C> {
    pub id: String,
    pub label: String,
    pub icon: Option<String>,
    /// Grouping category, e.g. "Apps" or "Windows".
    pub category: String,
    pub description: Option<String>,
    pub keywords: Vec<String>,
    pub action: Rc<dyn Fn(&mut Desktop<C>)>,
}

impl<C> Clone for SpotlightItem<C> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            label: self.label.clone(),
            icon: self.icon.clone(),
            category: self.category.clone(),
            description: self.description.clone(),
            keywords: self.keywords.clone(),
            action: Rc::clone(&self.action),
        }
    }
}

impl<C> SpotlightItem<C> {
    pub fn activate(&self, desktop: &mut Desktop<C>) {
        (self.action)(desktop);
    }

    fn matches(&self, query: &str) -> bool {
        self.label.to_lowercase().contains(query)
            || self
                .description
                .as_ref()
                .is_some_and(|d| d.to_lowercase().contains(query))
            || self.keywords.iter().any(|k| k.to_lowercase().contains(query))
    }
}

/// Supplies items to the search; filtering and ranking happen centrally.
pub trait SpotlightProvider<C> {
    fn id(&self) -> &str;
    fn items(&self, desktop: &Desktop<C>) -> Vec<SpotlightItem<C>>;
}

/// Sources items from the start menu's app registry. Activation goes through
/// [`StartMenuHandle::launch`], so singleton apps refocus instead of
/// duplicating.
pub struct AppsProvider<C> {
    start_menu: StartMenuHandle<C>,
}

impl<C> AppsProvider<C> {
    pub fn new(start_menu: StartMenuHandle<C>) -> Self {
        Self { start_menu }
    }
}

impl<C: Clone + 'static> SpotlightProvider<C> for AppsProvider<C> {
    fn id(&self) -> &str {
        "apps"
    }

    fn items(&self, _desktop: &Desktop<C>) -> Vec<SpotlightItem<C>> {
        self.start_menu
            .apps()
            .into_iter()
            .map(|app| {
                let start_menu = self.start_menu.clone();
                let app_id = app.id.clone();
                SpotlightItem {
                    id: format!("app:{}", app.id),
                    label: app.label,
                    icon: app.icon,
                    category: "Apps".to_string(),
                    description: app.category,
                    keywords: app.shortcut.into_iter().collect(),
                    action: Rc::new(move |desktop| {
                        start_menu.launch(desktop, &app_id);
                    }),
                }
            })
            .collect()
    }
}

/// Sources items from the open windows; activation restores (if minimized)
/// and focuses.
pub struct WindowsProvider;

impl<C: Clone + 'static> SpotlightProvider<C> for WindowsProvider {
    fn id(&self) -> &str {
        "windows"
    }

    fn items(&self, desktop: &Desktop<C>) -> Vec<SpotlightItem<C>> {
        desktop
            .windows()
            .into_iter()
            .map(|window| {
                let id = window.id;
                let minimized = desktop.mode(id) == WindowMode::Minimized;
                SpotlightItem {
                    id: format!("window:{id:?}"),
                    label: window.title,
                    icon: window.icon,
                    category: "Windows".to_string(),
                    description: minimized.then(|| "Minimized".to_string()),
                    keywords: Vec::new(),
                    action: Rc::new(move |desktop| {
                        if desktop.mode(id) == WindowMode::Minimized {
                            desktop.restore_window(id);
                        }
                        desktop.focus_window(id);
                    }),
                }
            })
            .collect()
    }
}

struct SpotlightState<C> {
    providers: Vec<Rc<dyn SpotlightProvider<C>>>,
    open: bool,
    max_results: usize,
}

/// Shared control surface for an installed [`SpotlightPlugin`].
pub struct SpotlightHandle<C> {
    state: Rc<RefCell<SpotlightState<C>>>,
}

impl<C> Clone for SpotlightHandle<C> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<C: Clone + 'static> SpotlightHandle<C> {
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

    /// Registers a provider. Duplicate ids are rejected.
    pub fn register_provider(&self, provider: Rc<dyn SpotlightProvider<C>>) -> bool {
        let mut state = self.state.borrow_mut();
        if state.providers.iter().any(|p| p.id() == provider.id()) {
            tracing::warn!(id = %provider.id(), "spotlight provider id already registered");
            return false;
        }
        state.providers.push(provider);
        true
    }

    pub fn unregister_provider(&self, id: &str) -> bool {
        let mut state = self.state.borrow_mut();
        let before = state.providers.len();
        state.providers.retain(|p| p.id() != id);
        state.providers.len() != before
    }

    pub fn provider_ids(&self) -> Vec<String> {
        self.state
            .borrow()
            .providers
            .iter()
            .map(|p| p.id().to_string())
            .collect()
    }

    /// Collects items from every provider and ranks the matches: exact label
    /// matches first, then apps before everything else, then label order.
    /// An empty query returns everything (up to the result cap).
    pub fn search(&self, desktop: &Desktop<C>, query: &str) -> Vec<SpotlightItem<C>> {
        let query = query.trim().to_lowercase();
        let (providers, max_results) = {
            let state = self.state.borrow();
            (state.providers.clone(), state.max_results)
        };

        let mut results: Vec<SpotlightItem<C>> = providers
            .iter()
            .flat_map(|provider| provider.items(desktop))
            .filter(|item| query.is_empty() || item.matches(&query))
            .collect();

        results.sort_by(|a, b| {
            let a_exact = a.label.to_lowercase() == query;
            let b_exact = b.label.to_lowercase() == query;
            b_exact
                .cmp(&a_exact)
                .then_with(|| {
                    let a_apps = a.category == "Apps";
                    let b_apps = b.category == "Apps";
                    b_apps.cmp(&a_apps)
                })
                .then_with(|| a.label.cmp(&b.label))
        });
        results.truncate(max_results);
        results
    }
}

/// Global search overlay. Installs the built-in providers plus any custom
/// ones, and registers its surface into the overlay slot.
pub struct SpotlightPlugin<C> {
    state: Rc<RefCell<SpotlightState<C>>>,
    component: C,
    start_menu: Option<StartMenuHandle<C>>,
    extra_providers: Vec<Rc<dyn SpotlightProvider<C>>>,
}

impl<C: Clone + 'static> SpotlightPlugin<C> {
    pub fn new(component: C) -> Self {
        Self {
            state: Rc::new(RefCell::new(SpotlightState {
                providers: Vec::new(),
                open: false,
                max_results: 10,
            })),
            component,
            start_menu: None,
            extra_providers: Vec::new(),
        }
    }

    /// Enables the apps provider, sourcing from this start menu.
    pub fn with_start_menu(mut self, start_menu: StartMenuHandle<C>) -> Self {
        self.start_menu = Some(start_menu);
        self
    }

    pub fn with_provider(mut self, provider: Rc<dyn SpotlightProvider<C>>) -> Self {
        self.extra_providers.push(provider);
        self
    }

    pub fn with_max_results(self, max_results: usize) -> Self {
        self.state.borrow_mut().max_results = max_results;
        self
    }

    pub fn handle(&self) -> SpotlightHandle<C> {
        SpotlightHandle {
            state: Rc::clone(&self.state),
        }
    }
}

impl<C: Clone + 'static> DesktopPlugin<C> for SpotlightPlugin<C> {
    fn name(&self) -> &str {
        "spotlight"
    }

    fn install(&self, desktop: &mut Desktop<C>) -> Option<PluginCleanup<C>> {
        let handle = self.handle();
        if let Some(start_menu) = &self.start_menu {
            handle.register_provider(Rc::new(AppsProvider::new(start_menu.clone())));
        }
        handle.register_provider(Rc::new(WindowsProvider));
        for provider in &self.extra_providers {
            handle.register_provider(Rc::clone(provider));
        }

        desktop.register_ui(UiRegistration::new(
            "spotlight",
            "overlay",
            self.component.clone(),
        ));

        Some(Box::new(move |desktop| {
            desktop.unregister_ui("spotlight");
            let mut state = handle.state.borrow_mut();
            state.providers.clear();
            state.open = false;
        }))
    }
}
