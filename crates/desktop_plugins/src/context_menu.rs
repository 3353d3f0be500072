//! Context menus for the desktop background and window title bars, driven by
//! the engine's context-menu request events.

use std::cell::RefCell;
use std::rc::Rc;

use desktop_engine::{
    Desktop, DesktopEvent, DesktopPlugin, EventKind, PluginCleanup, UiRegistration, WindowId,
    WindowMode,
};

use crate::start_menu::StartMenuHandle;

/// A single menu entry: either an action or a submenu.
pub struct MenuItem<C> {
    pub id: String,
    pub label: String,
    pub icon: Option<String>,
    /// Display-only shortcut hint.
    pub shortcut: Option<String>,
    pub action: Option<Rc<dyn Fn(&mut Desktop<C>)>>,
    pub children: Vec<MenuItem<C>>,
    pub disabled: bool,
    /// Render a separator after this item.
    pub separator: bool,
}

impl<C> Clone for MenuItem<C> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            label: self.label.clone(),
            icon: self.icon.clone(),
            shortcut: self.shortcut.clone(),
            action: self.action.clone(),
            children: self.children.clone(),
            disabled: self.disabled,
            separator: self.separator,
        }
    }
}

impl<C> MenuItem<C> {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            icon: None,
            shortcut: None,
            action: None,
            children: Vec::new(),
            disabled: false,
            separator: false,
        }
    }

    pub fn with_action(mut self, action: impl Fn(&mut Desktop<C>) + 'static) -> Self {
        self.action = Some(Rc::new(action));
        self
    }

    pub fn with_children(mut self, children: Vec<MenuItem<C>>) -> Self {
        self.children = children;
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_shortcut(mut self, shortcut: impl Into<String>) -> Self {
        self.shortcut = Some(shortcut.into());
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn with_separator(mut self) -> Self {
        self.separator = true;
        self
    }
}

/// What was right-clicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuTarget {
    Desktop,
    Window(WindowId),
}

/// Context handed to menu builders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MenuContext {
    pub target: MenuTarget,
    pub x: f64,
    pub y: f64,
}

/// Builds the items for a menu invocation.
pub type MenuBuilder<C> = Rc<dyn Fn(&Desktop<C>, &MenuContext) -> Vec<MenuItem<C>>>;

/// Standard title-bar menu: minimize, maximize/restore, close, each gated on
/// the window's behavior flags.
pub fn default_window_menu<C: Clone>(desktop: &Desktop<C>, id: WindowId) -> Vec<MenuItem<C>> {
    let Some(window) = desktop.window(id) else {
        return Vec::new();
    };
    let behaviors = window.behaviors;
    let mode = desktop.mode(id);
    let mut items: Vec<MenuItem<C>> = Vec::new();

    if behaviors.minimizable {
        items.push(
            MenuItem::new("minimize", "Minimize")
                .disabled(mode == WindowMode::Minimized)
                .with_action(move |d| {
                    d.minimize_window(id);
                }),
        );
    }
    if behaviors.maximizable {
        if mode == WindowMode::Maximized {
            items.push(MenuItem::new("maximize", "Restore").with_action(move |d| {
                d.restore_window(id);
            }));
        } else {
            items.push(MenuItem::new("maximize", "Maximize").with_action(move |d| {
                d.maximize_window(id);
            }));
        }
    }
    if behaviors.closable {
        if let Some(last) = items.last_mut() {
            last.separator = true;
        }
        items.push(
            MenuItem::new("close", "Close")
                .with_shortcut("Ctrl+W")
                .with_action(move |d| {
                    d.close_window(id);
                }),
        );
    }
    items
}

/// Standard background menu: a "New Window" submenu over the start menu's
/// registered apps, when a start menu is wired in and has any.
pub fn default_desktop_menu<C: Clone + 'static>(
    start_menu: Option<&StartMenuHandle<C>>,
) -> Vec<MenuItem<C>> {
    let Some(start_menu) = start_menu else {
        return Vec::new();
    };
    let apps = start_menu.apps();
    if apps.is_empty() {
        return Vec::new();
    }

    let children = apps
        .into_iter()
        .map(|app| {
            let launcher = start_menu.clone();
            let app_id = app.id.clone();
            let mut item = MenuItem::new(format!("app-{}", app.id), app.label).with_action(
                move |d: &mut Desktop<C>| {
                    launcher.launch(d, &app_id);
                },
            );
            item.icon = app.icon;
            item
        })
        .collect();

    vec![MenuItem::new("new-window", "New Window").with_children(children)]
}

struct OpenMenu<C> {
    items: Vec<MenuItem<C>>,
    x: f64,
    y: f64,
}

struct ContextMenuState<C> {
    open: Option<OpenMenu<C>>,
    desktop_menu: Option<MenuBuilder<C>>,
    window_menu: Option<MenuBuilder<C>>,
}

/// Shared control surface for an installed [`ContextMenuPlugin`].
pub struct ContextMenuHandle<C> {
    state: Rc<RefCell<ContextMenuState<C>>>,
}

impl<C> Clone for ContextMenuHandle<C> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<C: Clone + 'static> ContextMenuHandle<C> {
    pub fn show(&self, items: Vec<MenuItem<C>>, x: f64, y: f64) {
        self.state.borrow_mut().open = Some(OpenMenu { items, x, y });
    }

    pub fn hide(&self) {
        self.state.borrow_mut().open = None;
    }

    pub fn is_open(&self) -> bool {
        self.state.borrow().open.is_some()
    }

    /// The currently shown items and position.
    pub fn open_menu(&self) -> Option<(Vec<MenuItem<C>>, f64, f64)> {
        self.state
            .borrow()
            .open
            .as_ref()
            .map(|menu| (menu.items.clone(), menu.x, menu.y))
    }

    /// Replaces the default desktop background menu.
    pub fn set_desktop_menu(&self, builder: MenuBuilder<C>) {
        self.state.borrow_mut().desktop_menu = Some(builder);
    }

    /// Replaces the default window menu.
    pub fn set_window_menu(&self, builder: MenuBuilder<C>) {
        self.state.borrow_mut().window_menu = Some(builder);
    }

    /// Runs the action of the open menu's item with `item_id` (searching
    /// submenus) and closes the menu. Disabled items and submenu parents are
    /// not activatable.
    pub fn activate(&self, desktop: &mut Desktop<C>, item_id: &str) -> bool {
        fn find<C>(items: &[MenuItem<C>], id: &str) -> Option<MenuItem<C>>
        where
            C: Clone,
        {
            for item in items {
                if item.id == id {
                    return Some(item.clone());
                }
                if let Some(found) = find(&item.children, id) {
                    return Some(found);
                }
            }
            None
        }

        let action = {
            let state = self.state.borrow();
            let Some(menu) = &state.open else {
                return false;
            };
            match find(&menu.items, item_id) {
                Some(item) if !item.disabled => item.action,
                _ => None,
            }
        };
        let Some(action) = action else {
            return false;
        };
        self.hide();
        action(desktop);
        true
    }
}

/// Listens for the engine's context-menu request events and materializes
/// menu items, from the configured builders or the defaults.
pub struct ContextMenuPlugin<C> {
    state: Rc<RefCell<ContextMenuState<C>>>,
    component: C,
    start_menu: Option<StartMenuHandle<C>>,
}

impl<C: Clone + 'static> ContextMenuPlugin<C> {
    pub fn new(component: C) -> Self {
        Self {
            state: Rc::new(RefCell::new(ContextMenuState {
                open: None,
                desktop_menu: None,
                window_menu: None,
            })),
            component,
            start_menu: None,
        }
    }

    /// Sources the default desktop menu's app list from this start menu.
    pub fn with_start_menu(mut self, start_menu: StartMenuHandle<C>) -> Self {
        self.start_menu = Some(start_menu);
        self
    }

    pub fn with_desktop_menu(self, builder: MenuBuilder<C>) -> Self {
        self.state.borrow_mut().desktop_menu = Some(builder);
        self
    }

    pub fn with_window_menu(self, builder: MenuBuilder<C>) -> Self {
        self.state.borrow_mut().window_menu = Some(builder);
        self
    }

    pub fn handle(&self) -> ContextMenuHandle<C> {
        ContextMenuHandle {
            state: Rc::clone(&self.state),
        }
    }
}

impl<C: Clone + 'static> DesktopPlugin<C> for ContextMenuPlugin<C> {
    fn name(&self) -> &str {
        "context-menu"
    }

    fn install(&self, desktop: &mut Desktop<C>) -> Option<PluginCleanup<C>> {
        let handle = self.handle();
        let start_menu = self.start_menu.clone();
        let desktop_token = desktop.on(
            EventKind::DesktopContextMenu,
            Rc::new(RefCell::new(move |desktop: &mut Desktop<C>, event: &DesktopEvent<C>| {
                let DesktopEvent::DesktopContextMenu { x, y } = event else {
                    return;
                };
                let ctx = MenuContext {
                    target: MenuTarget::Desktop,
                    x: *x,
                    y: *y,
                };
                let builder = handle.state.borrow().desktop_menu.clone();
                let items = match builder {
                    Some(builder) => builder(desktop, &ctx),
                    None => default_desktop_menu(start_menu.as_ref()),
                };
                if !items.is_empty() {
                    handle.show(items, ctx.x, ctx.y);
                }
            })),
        );

        let handle = self.handle();
        let window_token = desktop.on(
            EventKind::WindowContextMenu,
            Rc::new(RefCell::new(move |desktop: &mut Desktop<C>, event: &DesktopEvent<C>| {
                let DesktopEvent::WindowContextMenu { window_id, x, y } = event else {
                    return;
                };
                let ctx = MenuContext {
                    target: MenuTarget::Window(*window_id),
                    x: *x,
                    y: *y,
                };
                let builder = handle.state.borrow().window_menu.clone();
                let items = match builder {
                    Some(builder) => builder(desktop, &ctx),
                    None => default_window_menu(desktop, *window_id),
                };
                if !items.is_empty() {
                    handle.show(items, ctx.x, ctx.y);
                }
            })),
        );

        desktop.register_ui(
            UiRegistration::new("context-menu", "overlay", self.component.clone())
                .with_order(100),
        );

        let handle = self.handle();
        Some(Box::new(move |desktop| {
            desktop.off(desktop_token);
            desktop.off(window_token);
            desktop.unregister_ui("context-menu");
            handle.hide();
        }))
    }
}
