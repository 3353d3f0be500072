//! Keyboard shortcut registry. The host feeds key events into
//! [`ShortcutsHandle::dispatch`]; matching shortcuts run against the engine.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;
use std::str::FromStr;

use thiserror::Error;

use desktop_engine::{Desktop, DesktopPlugin, PluginCleanup, WindowMode};

/// Error parsing a shortcut string like `ctrl+shift+n`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseComboError {
    #[error("shortcut has no key, only modifiers: {0:?}")]
    MissingKey(String),
    #[error("shortcut names more than one key: {0:?}")]
    MultipleKeys(String),
}

/// A parsed key combination.
///
/// The key part is a lowercase key name (`w`, `f11`, `escape`, `space`);
/// everything before it is modifiers. `cmd`, `command`, and `win` are
/// aliases for `meta`, `control` for `ctrl`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub key: String,
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl FromStr for KeyCombo {
    type Err = ParseComboError;

    fn from_str(keys: &str) -> Result<Self, Self::Err> {
        let mut combo = KeyCombo {
            key: String::new(),
            ctrl: false,
            alt: false,
            shift: false,
            meta: false,
        };
        for part in keys.to_lowercase().split('+').map(str::trim) {
            match part {
                "ctrl" | "control" => combo.ctrl = true,
                "alt" => combo.alt = true,
                "shift" => combo.shift = true,
                "meta" | "cmd" | "command" | "win" => combo.meta = true,
                key => {
                    if !combo.key.is_empty() {
                        return Err(ParseComboError::MultipleKeys(keys.to_string()));
                    }
                    combo.key = key.to_string();
                }
            }
        }
        if combo.key.is_empty() {
            return Err(ParseComboError::MissingKey(keys.to_string()));
        }
        Ok(combo)
    }
}

/// A key event as reported by the host shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInput {
    pub key: String,
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl KeyInput {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ctrl: false,
            alt: false,
            shift: false,
            meta: false,
        }
    }

    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn meta(mut self) -> Self {
        self.meta = true;
        self
    }
}

impl KeyCombo {
    /// Exact modifier match plus key match; `space` also matches a literal
    /// space character.
    pub fn matches(&self, input: &KeyInput) -> bool {
        let key = input.key.to_lowercase();
        let key_matches = key == self.key || (self.key == "space" && key == " ");
        key_matches
            && input.ctrl == self.ctrl
            && input.alt == self.alt
            && input.shift == self.shift
            && input.meta == self.meta
    }
}

/// Action run when a shortcut fires.
pub type ShortcutAction<C> = Rc<dyn Fn(&mut Desktop<C>)>;

/// A shortcut to register.
pub struct ShortcutDef<C> {
    pub id: String,
    pub keys: String,
    pub description: Option<String>,
    pub enabled: bool,
    pub action: ShortcutAction<C>,
}

impl<C> ShortcutDef<C> {
    pub fn new(
        id: impl Into<String>,
        keys: impl Into<String>,
        action: impl Fn(&mut Desktop<C>) + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            keys: keys.into(),
            description: None,
            enabled: true,
            action: Rc::new(action),
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Registration-facing view of a shortcut, without its action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutInfo {
    pub id: String,
    pub keys: String,
    pub description: Option<String>,
    pub enabled: bool,
}

struct Registered<C> {
    info: ShortcutInfo,
    combo: KeyCombo,
    action: ShortcutAction<C>,
}

/// Shared control surface for an installed [`ShortcutsPlugin`].
pub struct ShortcutsHandle<C> {
    state: Rc<RefCell<Vec<Registered<C>>>>,
}

impl<C> Clone for ShortcutsHandle<C> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<C: Clone + 'static> ShortcutsHandle<C> {
    /// Registers a shortcut, replacing any existing one with the same id.
    pub fn register(&self, def: ShortcutDef<C>) -> Result<(), ParseComboError> {
        let combo = def.keys.parse()?;
        let registered = Registered {
            info: ShortcutInfo {
                id: def.id,
                keys: def.keys,
                description: def.description,
                enabled: def.enabled,
            },
            combo,
            action: def.action,
        };
        let mut state = self.state.borrow_mut();
        match state.iter_mut().find(|r| r.info.id == registered.info.id) {
            Some(existing) => *existing = registered,
            None => state.push(registered),
        }
        Ok(())
    }

    pub fn unregister(&self, id: &str) -> bool {
        let mut state = self.state.borrow_mut();
        let before = state.len();
        state.retain(|r| r.info.id != id);
        state.len() != before
    }

    pub fn set_enabled(&self, id: &str, enabled: bool) -> bool {
        let mut state = self.state.borrow_mut();
        match state.iter_mut().find(|r| r.info.id == id) {
            Some(registered) => {
                registered.info.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn shortcuts(&self) -> Vec<ShortcutInfo> {
        self.state.borrow().iter().map(|r| r.info.clone()).collect()
    }

    /// Runs the first enabled shortcut matching `input`. Returns whether the
    /// event was consumed. Actions may re-enter the registry.
    pub fn dispatch(&self, desktop: &mut Desktop<C>, input: &KeyInput) -> bool {
        let action = self
            .state
            .borrow()
            .iter()
            .find(|r| r.info.enabled && r.combo.matches(input))
            .map(|r| Rc::clone(&r.action));
        match action {
            Some(action) => {
                action(desktop);
                true
            }
            None => false,
        }
    }
}

/// Keyboard shortcut plugin. With `defaults` enabled it preloads close
/// (`ctrl+w`), toggle-maximize (`ctrl+shift+f`), and minimize (`ctrl+m`) for
/// the focused window, each gated on the window's behavior flags.
pub struct ShortcutsPlugin<C> {
    state: Rc<RefCell<Vec<Registered<C>>>>,
    defaults: bool,
    _component: PhantomData<C>,
}

impl<C: Clone + 'static> ShortcutsPlugin<C> {
    pub fn new(defaults: bool) -> Self {
        Self {
            state: Rc::new(RefCell::new(Vec::new())),
            defaults,
            _component: PhantomData,
        }
    }

    pub fn handle(&self) -> ShortcutsHandle<C> {
        ShortcutsHandle {
            state: Rc::clone(&self.state),
        }
    }
}

impl<C: Clone + 'static> Default for ShortcutsPlugin<C> {
    fn default() -> Self {
        Self::new(true)
    }
}

impl<C: Clone + 'static> DesktopPlugin<C> for ShortcutsPlugin<C> {
    fn name(&self) -> &str {
        "shortcuts"
    }

    fn install(&self, _desktop: &mut Desktop<C>) -> Option<PluginCleanup<C>> {
        let handle = self.handle();
        if self.defaults {
            // Parse errors are impossible for the built-in combos.
            let _ = handle.register(
                ShortcutDef::new("close-window", "ctrl+w", |d: &mut Desktop<C>| {
                    if let Some(id) = d.focused_window_id() {
                        if d.window(id).is_some_and(|w| w.behaviors.closable) {
                            d.close_window(id);
                        }
                    }
                })
                .describe("Close focused window"),
            );
            let _ = handle.register(
                ShortcutDef::new("toggle-maximize", "ctrl+shift+f", |d: &mut Desktop<C>| {
                    if let Some(id) = d.focused_window_id() {
                        if d.window(id).is_some_and(|w| w.behaviors.maximizable) {
                            if d.mode(id) == WindowMode::Maximized {
                                d.restore_window(id);
                            } else {
                                d.maximize_window(id);
                            }
                        }
                    }
                })
                .describe("Toggle maximize for focused window"),
            );
            let _ = handle.register(
                ShortcutDef::new("minimize-window", "ctrl+m", |d: &mut Desktop<C>| {
                    if let Some(id) = d.focused_window_id() {
                        if d.window(id).is_some_and(|w| w.behaviors.minimizable) {
                            d.minimize_window(id);
                        }
                    }
                })
                .describe("Minimize focused window"),
            );
        }

        let state = Rc::clone(&self.state);
        Some(Box::new(move |_desktop| {
            state.borrow_mut().clear();
        }))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use desktop_engine::{WindowBehaviors, WindowDef};

    use super::*;

    fn setup() -> (Desktop<()>, ShortcutsHandle<()>) {
        let plugin: ShortcutsPlugin<()> = ShortcutsPlugin::default();
        let handle = plugin.handle();
        let mut desktop = Desktop::new();
        assert!(desktop.install_plugin(&plugin));
        (desktop, handle)
    }

    #[test]
    fn parses_modifiers_and_key() {
        let combo: KeyCombo = "ctrl+shift+n".parse().unwrap();
        assert_eq!(combo.key, "n");
        assert!(combo.ctrl);
        assert!(combo.shift);
        assert!(!combo.alt);
        assert!(!combo.meta);

        let combo: KeyCombo = "Cmd+W".parse().unwrap();
        assert!(combo.meta);
        assert_eq!(combo.key, "w");

        let combo: KeyCombo = "f11".parse().unwrap();
        assert_eq!(combo.key, "f11");
    }

    #[test]
    fn rejects_modifier_only_and_double_key_combos() {
        assert_eq!(
            "ctrl+shift".parse::<KeyCombo>(),
            Err(ParseComboError::MissingKey("ctrl+shift".to_string()))
        );
        assert_eq!(
            "a+b".parse::<KeyCombo>(),
            Err(ParseComboError::MultipleKeys("a+b".to_string()))
        );
    }

    #[test]
    fn matching_requires_exact_modifiers() {
        let combo: KeyCombo = "ctrl+w".parse().unwrap();
        assert!(combo.matches(&KeyInput::new("w").ctrl()));
        assert!(!combo.matches(&KeyInput::new("w")));
        assert!(!combo.matches(&KeyInput::new("w").ctrl().shift()));
    }

    #[test]
    fn space_matches_literal_space() {
        let combo: KeyCombo = "ctrl+space".parse().unwrap();
        assert!(combo.matches(&KeyInput::new(" ").ctrl()));
        assert!(combo.matches(&KeyInput::new("space").ctrl()));
    }

    #[test]
    fn default_close_shortcut_closes_the_focused_window() {
        let (mut desktop, handle) = setup();
        let id = desktop.create_window(WindowDef::new("app", "A", ())).id;

        assert!(handle.dispatch(&mut desktop, &KeyInput::new("w").ctrl()));
        assert_eq!(desktop.window_count(), 0);
        let _ = id;
    }

    #[test]
    fn close_shortcut_respects_closable_flag() {
        let (mut desktop, handle) = setup();
        let mut def = WindowDef::new("app", "A", ());
        def.behaviors = WindowBehaviors {
            closable: false,
            ..Default::default()
        };
        desktop.create_window(def);

        assert!(handle.dispatch(&mut desktop, &KeyInput::new("w").ctrl()));
        assert_eq!(desktop.window_count(), 1);
    }

    #[test]
    fn toggle_maximize_round_trips() {
        let (mut desktop, handle) = setup();
        let id = desktop.create_window(WindowDef::new("app", "A", ())).id;
        let toggle = KeyInput::new("f").ctrl().shift();

        handle.dispatch(&mut desktop, &toggle);
        assert_eq!(desktop.mode(id), WindowMode::Maximized);
        handle.dispatch(&mut desktop, &toggle);
        assert_eq!(desktop.mode(id), WindowMode::Normal);
    }

    #[test]
    fn unmatched_input_is_not_consumed() {
        let (mut desktop, handle) = setup();
        assert!(!handle.dispatch(&mut desktop, &KeyInput::new("x").alt()));
    }

    #[test]
    fn disabled_shortcuts_are_skipped() {
        let (mut desktop, handle) = setup();
        desktop.create_window(WindowDef::new("app", "A", ()));

        assert!(handle.set_enabled("close-window", false));
        assert!(!handle.dispatch(&mut desktop, &KeyInput::new("w").ctrl()));
        assert_eq!(desktop.window_count(), 1);
    }

    #[test]
    fn custom_shortcut_replaces_same_id() {
        let (mut desktop, handle) = setup();
        handle
            .register(ShortcutDef::new("open", "ctrl+n", |d: &mut Desktop<()>| {
                d.create_window(WindowDef::new("app", "New", ()));
            }))
            .unwrap();
        handle
            .register(ShortcutDef::new("open", "ctrl+o", |d: &mut Desktop<()>| {
                d.create_window(WindowDef::new("app", "Other", ()));
            }))
            .unwrap();

        assert!(!handle.dispatch(&mut desktop, &KeyInput::new("n").ctrl()));
        assert!(handle.dispatch(&mut desktop, &KeyInput::new("o").ctrl()));
        assert_eq!(desktop.windows()[0].title, "Other");
    }

    #[test]
    fn uninstall_clears_the_registry() {
        let (mut desktop, handle) = setup();
        assert!(!handle.shortcuts().is_empty());

        desktop.uninstall_plugin("shortcuts");
        assert!(handle.shortcuts().is_empty());
        assert!(!handle.dispatch(&mut desktop, &KeyInput::new("w").ctrl()));
    }
}
