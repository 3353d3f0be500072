//! Taskbar surface registration plus the click behavior for window buttons.

use desktop_engine::{Desktop, DesktopPlugin, PluginCleanup, UiRegistration, WindowId, WindowMode};

/// What clicking a taskbar button does: restore-and-focus when minimized,
/// minimize when already focused, plain focus otherwise. Returns `false` for
/// unknown ids.
pub fn toggle_window<C: Clone>(desktop: &mut Desktop<C>, id: WindowId) -> bool {
    if desktop.window(id).is_none() {
        return false;
    }
    if desktop.mode(id) == WindowMode::Minimized {
        desktop.restore_window(id);
        desktop.focus_window(id);
    } else if desktop.focused_window_id() == Some(id) {
        desktop.minimize_window(id);
    } else {
        desktop.focus_window(id);
    }
    true
}

/// Registers the window-list surface into the taskbar slot.
pub struct TaskbarPlugin<C> {
    component: C,
}

impl<C> TaskbarPlugin<C> {
    pub fn new(component: C) -> Self {
        Self { component }
    }
}

impl<C: Clone + 'static> DesktopPlugin<C> for TaskbarPlugin<C> {
    fn name(&self) -> &str {
        "taskbar"
    }

    fn install(&self, desktop: &mut Desktop<C>) -> Option<PluginCleanup<C>> {
        desktop.register_ui(UiRegistration::new(
            "taskbar-main",
            "taskbar",
            self.component.clone(),
        ));
        Some(Box::new(|desktop| {
            desktop.unregister_ui("taskbar-main");
        }))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use desktop_engine::WindowDef;

    use super::*;

    #[test]
    fn click_cycles_focus_minimize_restore() {
        let mut desktop: Desktop<()> = Desktop::new();
        let a = desktop.create_window(WindowDef::new("app", "A", ())).id;
        let b = desktop.create_window(WindowDef::new("app", "B", ())).id;

        // Unfocused: focus.
        assert!(toggle_window(&mut desktop, a));
        assert_eq!(desktop.focused_window_id(), Some(a));

        // Focused: minimize.
        assert!(toggle_window(&mut desktop, a));
        assert_eq!(desktop.mode(a), WindowMode::Minimized);

        // Minimized: restore and focus.
        assert!(toggle_window(&mut desktop, a));
        assert_eq!(desktop.mode(a), WindowMode::Normal);
        assert_eq!(desktop.focused_window_id(), Some(a));
        let _ = b;
    }

    #[test]
    fn unknown_id_is_rejected() {
        let mut desktop: Desktop<()> = Desktop::new();
        let a = desktop.create_window(WindowDef::new("app", "A", ())).id;
        desktop.close_window(a);
        assert!(!toggle_window(&mut desktop, a));
    }

    #[test]
    fn install_and_uninstall_manage_the_taskbar_slot() {
        let mut desktop: Desktop<()> = Desktop::new();
        let plugin = TaskbarPlugin::new(());
        assert!(desktop.install_plugin(&plugin));
        assert_eq!(desktop.ui_for_slot("taskbar").len(), 1);

        assert!(desktop.uninstall_plugin("taskbar"));
        assert!(desktop.ui_for_slot("taskbar").is_empty());
    }
}
