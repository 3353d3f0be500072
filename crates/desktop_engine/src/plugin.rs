//! Plugin contract for extending the desktop through its public API.

use crate::Desktop;

/// Teardown callback returned by [`DesktopPlugin::install`]. Must fully
/// reverse everything the install wired up (subscriptions, interceptors, UI
/// registrations) so a later re-install behaves like a fresh one.
pub type PluginCleanup<C> = Box<dyn FnOnce(&mut Desktop<C>)>;

/// A named, installable behavior extension.
///
/// Plugins interact with the engine exclusively through its public methods
/// and the event bus; there is no privileged access. A panicking `install`
/// aborts installation and propagates to the caller — side effects performed
/// before the panic are not rolled back.
pub trait DesktopPlugin<C> {
    /// Unique plugin name; a second install under the same name is rejected.
    fn name(&self) -> &str;

    /// Wires the plugin into `desktop` and optionally returns a cleanup.
    fn install(&self, desktop: &mut Desktop<C>) -> Option<PluginCleanup<C>>;
}

pub(crate) struct PluginRecord<C> {
    pub(crate) cleanup: Option<PluginCleanup<C>>,
}
