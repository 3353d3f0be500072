//! Magnetic snapping for window drags: viewport edges, other windows, and an
//! optional grid, applied through a bounds interceptor.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;

use desktop_engine::{Bounds, Desktop, DesktopPlugin, PluginCleanup, WindowMode};

/// Which geometry supplied a snap position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapKind {
    Edge,
    Grid,
    Window,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapAxis {
    X,
    Y,
}

/// One snap that fired, for chrome that wants to render alignment guides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapTarget {
    pub kind: SnapKind,
    pub axis: SnapAxis,
    pub position: f64,
}

/// Outcome of a snapping pass. At most one snap per axis.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapResult {
    pub bounds: Bounds,
    pub snapped_x: bool,
    pub snapped_y: bool,
    pub targets: Vec<SnapTarget>,
}

impl SnapResult {
    fn unsnapped(bounds: Bounds) -> Self {
        Self {
            bounds,
            snapped_x: false,
            snapped_y: false,
            targets: Vec::new(),
        }
    }

    fn snap_x(&mut self, x: f64, kind: SnapKind, position: f64) {
        self.bounds.x = x;
        self.snapped_x = true;
        self.targets.push(SnapTarget {
            kind,
            axis: SnapAxis::X,
            position,
        });
    }

    fn snap_y(&mut self, y: f64, kind: SnapKind, position: f64) {
        self.bounds.y = y;
        self.snapped_y = true;
        self.targets.push(SnapTarget {
            kind,
            axis: SnapAxis::Y,
            position,
        });
    }
}

/// Tuning for the snapping pass.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapOptions {
    /// Snap to viewport edges.
    pub edges: bool,
    /// Snap to other windows' edges.
    pub windows: bool,
    /// Grid cell size; zero disables grid snapping.
    pub grid_size: f64,
    /// Distance within which a snap engages.
    pub threshold: f64,
}

impl Default for SnapOptions {
    fn default() -> Self {
        Self {
            edges: true,
            windows: true,
            grid_size: 0.0,
            threshold: 10.0,
        }
    }
}

/// Snaps `value` to `target` when within `threshold`. Returns the resolved
/// value and whether the snap engaged.
pub fn snap_to_value(value: f64, target: f64, threshold: f64) -> (f64, bool) {
    if (value - target).abs() <= threshold {
        (target, true)
    } else {
        (value, false)
    }
}

/// Snaps `value` to the nearest grid line.
pub fn snap_to_grid(value: f64, grid_size: f64, threshold: f64) -> (f64, bool) {
    let nearest = (value / grid_size).round() * grid_size;
    snap_to_value(value, nearest, threshold)
}

/// Snaps window edges to the viewport rectangle. Left beats right, top beats
/// bottom.
pub fn snap_to_edges(bounds: Bounds, viewport: Bounds, threshold: f64) -> SnapResult {
    let mut result = SnapResult::unsnapped(bounds);

    let (left, snapped) = snap_to_value(bounds.x, viewport.x, threshold);
    if snapped {
        result.snap_x(left, SnapKind::Edge, viewport.x);
    } else {
        let (_, snapped) = snap_to_value(bounds.right(), viewport.right(), threshold);
        if snapped {
            result.snap_x(viewport.right() - bounds.width, SnapKind::Edge, viewport.right());
        }
    }

    let (top, snapped) = snap_to_value(bounds.y, viewport.y, threshold);
    if snapped {
        result.snap_y(top, SnapKind::Edge, viewport.y);
    } else {
        let (_, snapped) = snap_to_value(bounds.bottom(), viewport.bottom(), threshold);
        if snapped {
            result.snap_y(viewport.bottom() - bounds.height, SnapKind::Edge, viewport.bottom());
        }
    }

    result
}

/// Snaps the window origin to the nearest grid lines.
pub fn snap_bounds_to_grid(bounds: Bounds, grid_size: f64, threshold: f64) -> SnapResult {
    let mut result = SnapResult::unsnapped(bounds);

    let (x, snapped) = snap_to_grid(bounds.x, grid_size, threshold);
    if snapped {
        result.snap_x(x, SnapKind::Grid, x);
    }
    let (y, snapped) = snap_to_grid(bounds.y, grid_size, threshold);
    if snapped {
        result.snap_y(y, SnapKind::Grid, y);
    }

    result
}

/// Snaps against other windows: adjacent edges first, then same-edge
/// alignment. Earlier entries in `others` win ties, and each axis keeps its
/// first snap.
pub fn snap_to_windows(bounds: Bounds, others: &[Bounds], threshold: f64) -> SnapResult {
    let mut result = SnapResult::unsnapped(bounds);

    for other in others {
        if !result.snapped_x {
            let (x, snapped) = snap_to_value(bounds.x, other.right(), threshold);
            if snapped {
                result.snap_x(x, SnapKind::Window, other.right());
            }
        }
        if !result.snapped_x {
            let (_, snapped) = snap_to_value(bounds.right(), other.x, threshold);
            if snapped {
                result.snap_x(other.x - bounds.width, SnapKind::Window, other.x);
            }
        }
        if !result.snapped_x {
            let (x, snapped) = snap_to_value(bounds.x, other.x, threshold);
            if snapped {
                result.snap_x(x, SnapKind::Window, other.x);
            }
        }

        if !result.snapped_y {
            let (y, snapped) = snap_to_value(bounds.y, other.bottom(), threshold);
            if snapped {
                result.snap_y(y, SnapKind::Window, other.bottom());
            }
        }
        if !result.snapped_y {
            let (_, snapped) = snap_to_value(bounds.bottom(), other.y, threshold);
            if snapped {
                result.snap_y(other.y - bounds.height, SnapKind::Window, other.y);
            }
        }
        if !result.snapped_y {
            let (y, snapped) = snap_to_value(bounds.y, other.y, threshold);
            if snapped {
                result.snap_y(y, SnapKind::Window, other.y);
            }
        }
    }

    result
}

/// Runs every enabled snap source over `bounds`. Per axis the priority is
/// viewport edges, then windows, then grid; once an axis has snapped, lower
/// priority sources leave it alone.
pub fn apply_snapping(
    bounds: Bounds,
    viewport: Option<Bounds>,
    others: &[Bounds],
    options: &SnapOptions,
) -> SnapResult {
    let threshold = options.threshold;
    let mut result = SnapResult::unsnapped(bounds);

    if options.edges {
        if let Some(viewport) = viewport {
            let edges = snap_to_edges(result.bounds, viewport, threshold);
            merge(&mut result, edges);
        }
    }

    if options.windows && !others.is_empty() {
        let windows = snap_to_windows(result.bounds, others, threshold);
        merge(&mut result, windows);
    }

    if options.grid_size > 0.0 {
        let grid = snap_bounds_to_grid(result.bounds, options.grid_size, threshold);
        merge(&mut result, grid);
    }

    result
}

fn merge(result: &mut SnapResult, stage: SnapResult) {
    if !result.snapped_x && stage.snapped_x {
        result.bounds.x = stage.bounds.x;
        result.snapped_x = true;
        result
            .targets
            .extend(stage.targets.iter().copied().filter(|t| t.axis == SnapAxis::X));
    }
    if !result.snapped_y && stage.snapped_y {
        result.bounds.y = stage.bounds.y;
        result.snapped_y = true;
        result
            .targets
            .extend(stage.targets.iter().copied().filter(|t| t.axis == SnapAxis::Y));
    }
}

struct SnapState {
    enabled: bool,
    options: SnapOptions,
}

/// Shared control surface for an installed [`SnapPlugin`].
#[derive(Clone)]
pub struct SnapHandle {
    state: Rc<RefCell<SnapState>>,
}

impl SnapHandle {
    pub fn set_enabled(&self, enabled: bool) {
        self.state.borrow_mut().enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.state.borrow().enabled
    }

    pub fn set_options(&self, options: SnapOptions) {
        self.state.borrow_mut().options = options;
    }

    pub fn options(&self) -> SnapOptions {
        self.state.borrow().options.clone()
    }
}

/// Intercepts bounds updates and applies [`apply_snapping`] against the
/// viewport and the other non-minimized windows.
pub struct SnapPlugin<C> {
    state: Rc<RefCell<SnapState>>,
    viewport: Option<Rc<dyn Fn() -> Option<Bounds>>>,
    _component: PhantomData<C>,
}

impl<C> SnapPlugin<C> {
    pub fn new(options: SnapOptions) -> Self {
        Self {
            state: Rc::new(RefCell::new(SnapState {
                enabled: true,
                options,
            })),
            viewport: None,
            _component: PhantomData,
        }
    }

    /// Supplies the viewport rectangle for edge snapping. Without it, edge
    /// snapping is skipped even when enabled.
    pub fn with_viewport(mut self, viewport: impl Fn() -> Option<Bounds> + 'static) -> Self {
        self.viewport = Some(Rc::new(viewport));
        self
    }

    pub fn handle(&self) -> SnapHandle {
        SnapHandle {
            state: Rc::clone(&self.state),
        }
    }
}

impl<C> Default for SnapPlugin<C> {
    fn default() -> Self {
        Self::new(SnapOptions::default())
    }
}

impl<C: Clone + 'static> DesktopPlugin<C> for SnapPlugin<C> {
    fn name(&self) -> &str {
        "snap"
    }

    fn install(&self, desktop: &mut Desktop<C>) -> Option<PluginCleanup<C>> {
        let state = Rc::clone(&self.state);
        let viewport = self.viewport.clone();
        let token = desktop.add_bounds_interceptor(Rc::new(move |desktop, id, bounds| {
            let (enabled, options) = {
                let state = state.borrow();
                (state.enabled, state.options.clone())
            };
            if !enabled {
                return bounds;
            }
            let viewport = viewport.as_ref().and_then(|get| get());
            let others: Vec<Bounds> = desktop
                .windows()
                .iter()
                .filter(|w| w.id != id && desktop.mode(w.id) != WindowMode::Minimized)
                .filter_map(|w| desktop.bounds(w.id))
                .collect();
            apply_snapping(bounds, viewport, &others, &options).bounds
        }));
        Some(Box::new(move |desktop| {
            desktop.remove_bounds_interceptor(token);
        }))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use desktop_engine::WindowDef;

    use super::*;

    #[test]
    fn snap_to_value_engages_within_threshold_inclusive() {
        assert_eq!(snap_to_value(105.0, 100.0, 10.0), (100.0, true));
        assert_eq!(snap_to_value(110.0, 100.0, 10.0), (100.0, true));
        assert_eq!(snap_to_value(111.0, 100.0, 10.0), (111.0, false));
    }

    #[test]
    fn snap_to_grid_picks_nearest_line() {
        assert_eq!(snap_to_grid(47.0, 50.0, 10.0), (50.0, true));
        assert_eq!(snap_to_grid(23.0, 50.0, 10.0), (23.0, false));
    }

    #[test]
    fn left_edge_beats_right_edge() {
        let viewport = Bounds::new(0.0, 0.0, 1000.0, 800.0);
        // Window narrow enough that both edges are in range; left wins.
        let result = snap_to_edges(Bounds::new(4.0, 400.0, 990.0, 100.0), viewport, 10.0);

        assert_eq!(result.bounds.x, 0.0);
        assert_eq!(result.targets.len(), 1);
        assert_eq!(result.targets[0].position, 0.0);
    }

    #[test]
    fn right_and_bottom_edges_anchor_far_side() {
        let viewport = Bounds::new(0.0, 0.0, 1000.0, 800.0);
        let result = snap_to_edges(Bounds::new(695.0, 495.0, 300.0, 300.0), viewport, 10.0);

        assert!(result.snapped_x);
        assert!(result.snapped_y);
        assert_eq!(result.bounds, Bounds::new(700.0, 500.0, 300.0, 300.0));
    }

    #[test]
    fn window_snapping_prefers_adjacency_over_alignment() {
        let other = Bounds::new(100.0, 100.0, 200.0, 200.0);
        // Left edge is within range of both other.right (300) and other.x
        // via alignment only if close; at x=305 only adjacency applies.
        let result = snap_to_windows(Bounds::new(305.0, 500.0, 100.0, 100.0), &[other], 10.0);

        assert_eq!(result.bounds.x, 300.0);
        assert_eq!(result.targets, vec![SnapTarget {
            kind: SnapKind::Window,
            axis: SnapAxis::X,
            position: 300.0,
        }]);
    }

    #[test]
    fn window_snapping_aligns_same_edges() {
        let other = Bounds::new(100.0, 100.0, 200.0, 200.0);
        let result = snap_to_windows(Bounds::new(95.0, 95.0, 50.0, 50.0), &[other], 10.0);

        assert_eq!(result.bounds.x, 100.0);
        assert_eq!(result.bounds.y, 100.0);
    }

    #[test]
    fn apply_snapping_prioritizes_edges_over_windows_over_grid() {
        let viewport = Bounds::new(0.0, 0.0, 1000.0, 800.0);
        let other = Bounds::new(12.0, 300.0, 100.0, 100.0);
        let options = SnapOptions {
            grid_size: 50.0,
            ..Default::default()
        };

        // x=6 is within range of the viewport edge (0), the other window's
        // left edge (12), and the nearest grid line (0). Edge wins.
        let result = apply_snapping(
            Bounds::new(6.0, 400.0, 100.0, 100.0),
            Some(viewport),
            std::slice::from_ref(&other),
            &options,
        );

        assert_eq!(result.bounds.x, 0.0);
        assert_eq!(result.targets[0].kind, SnapKind::Edge);
    }

    #[test]
    fn lower_priority_sources_still_fill_the_other_axis() {
        let viewport = Bounds::new(0.0, 0.0, 1000.0, 800.0);
        let options = SnapOptions {
            grid_size: 50.0,
            ..Default::default()
        };

        // x snaps to the viewport edge, y only to the grid.
        let result = apply_snapping(
            Bounds::new(6.0, 153.0, 100.0, 100.0),
            Some(viewport),
            &[],
            &options,
        );

        assert_eq!(result.bounds, Bounds::new(0.0, 150.0, 100.0, 100.0));
        assert_eq!(result.targets.len(), 2);
    }

    #[test]
    fn disabled_handle_passes_bounds_through() {
        let mut desktop: Desktop<()> = Desktop::new();
        let plugin = SnapPlugin::default().with_viewport(|| Some(Bounds::new(0.0, 0.0, 1000.0, 800.0)));
        let handle = plugin.handle();
        assert!(desktop.install_plugin(&plugin));

        let id = desktop.create_window(WindowDef::new("app", "A", ())).id;

        desktop.update_bounds(id, Bounds::new(4.0, 4.0, 100.0, 100.0));
        assert_eq!(desktop.bounds(id), Some(Bounds::new(0.0, 0.0, 100.0, 100.0)));

        handle.set_enabled(false);
        desktop.update_bounds(id, Bounds::new(4.0, 4.0, 100.0, 100.0));
        assert_eq!(desktop.bounds(id), Some(Bounds::new(4.0, 4.0, 100.0, 100.0)));
    }

    #[test]
    fn installed_plugin_snaps_to_other_windows_but_not_minimized_ones() {
        let mut desktop: Desktop<()> = Desktop::new();
        let plugin: SnapPlugin<()> = SnapPlugin::default();
        assert!(desktop.install_plugin(&plugin));

        let anchor = desktop
            .create_window({
                let mut def = WindowDef::new("app", "Anchor", ());
                def.initial_bounds = Some(Bounds::new(100.0, 100.0, 200.0, 200.0));
                def
            })
            .id;
        let moving = desktop.create_window(WindowDef::new("app", "Moving", ())).id;

        desktop.update_bounds(moving, Bounds::new(305.0, 500.0, 100.0, 100.0));
        assert_eq!(desktop.bounds(moving).unwrap().x, 300.0);

        desktop.minimize_window(anchor);
        desktop.update_bounds(moving, Bounds::new(305.0, 500.0, 100.0, 100.0));
        assert_eq!(desktop.bounds(moving).unwrap().x, 305.0);
    }

    #[test]
    fn uninstall_removes_the_interceptor() {
        let mut desktop: Desktop<()> = Desktop::new();
        let plugin = SnapPlugin::default().with_viewport(|| Some(Bounds::new(0.0, 0.0, 1000.0, 800.0)));
        desktop.install_plugin(&plugin);
        let id = desktop.create_window(WindowDef::new("app", "A", ())).id;

        assert!(desktop.uninstall_plugin("snap"));
        desktop.update_bounds(id, Bounds::new(4.0, 4.0, 100.0, 100.0));
        assert_eq!(desktop.bounds(id), Some(Bounds::new(4.0, 4.0, 100.0, 100.0)));
    }
}
