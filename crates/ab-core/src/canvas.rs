//! Canvas transform and placement.
//!
//! Screen space is what the pointer reports; document space is where
//! components live. The two differ by the pan offset and a uniform scale
//! anchored at the origin:
//!
//! ```text
//! doc    = (screen - pan) / scale
//! screen = doc * scale + pan
//! ```

use crate::error::UnknownKindError;
use crate::id::ComponentId;
use crate::model::ComponentInstance;
use crate::props::ComponentKind;
use crate::registry::registry;
use kurbo::{Point, Size, Vec2};

// ─── Config ──────────────────────────────────────────────────────────────

/// Where a dropped component's top-left lands relative to the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DropAnchor {
    /// Pointer marks the center of the kind's default size.
    #[default]
    HalfDefaultSize,
    /// Pointer marks the top-left corner.
    TopLeft,
}

/// Tunables for the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasConfig {
    pub min_scale: f64,
    pub max_scale: f64,
    pub default_grid_size: u32,
    /// Step used by zoom buttons and keyboard zoom.
    pub zoom_step: f64,
    /// Multiplier from wheel delta to scale delta.
    pub wheel_zoom_factor: f64,
    /// Shift applied to a duplicated component.
    pub duplicate_offset: Vec2,
    pub drop_anchor: DropAnchor,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.25,
            max_scale: 2.0,
            default_grid_size: 20,
            zoom_step: 0.1,
            wheel_zoom_factor: 0.001,
            duplicate_offset: Vec2::new(20.0, 20.0),
            drop_anchor: DropAnchor::HalfDefaultSize,
        }
    }
}

// ─── State ───────────────────────────────────────────────────────────────

/// Zoom, pan, and grid state of one canvas view.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasState {
    scale: f64,
    pan: Vec2,
    grid_size: u32,
    pub snap_to_grid: bool,
    pub show_grid: bool,
    /// While locked, drops and drag-moves are ignored.
    pub locked: bool,
    config: CanvasConfig,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self::new(CanvasConfig::default())
    }
}

impl CanvasState {
    pub fn new(config: CanvasConfig) -> Self {
        Self {
            scale: 1.0,
            pan: Vec2::ZERO,
            grid_size: config.default_grid_size.max(1),
            snap_to_grid: true,
            show_grid: true,
            locked: false,
            config,
        }
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn pan(&self) -> Vec2 {
        self.pan
    }

    pub fn grid_size(&self) -> u32 {
        self.grid_size
    }

    // ── Transform ──

    pub fn screen_to_document(&self, screen: Point) -> Point {
        ((screen.to_vec2() - self.pan) / self.scale).to_point()
    }

    pub fn document_to_screen(&self, doc: Point) -> Point {
        (doc.to_vec2() * self.scale + self.pan).to_point()
    }

    /// Set the scale, clamped to the configured range. Non-finite input is ignored.
    pub fn set_scale(&mut self, scale: f64) {
        if !scale.is_finite() {
            log::debug!("ignoring non-finite scale {scale}");
            return;
        }
        let clamped = scale.clamp(self.config.min_scale, self.config.max_scale);
        if clamped != scale {
            log::trace!("scale {scale} clamped to {clamped}");
        }
        self.scale = clamped;
    }

    /// Origin-anchored zoom by `delta`. Returns the new scale.
    pub fn zoom(&mut self, delta: f64) -> f64 {
        self.set_scale(self.scale + delta);
        self.scale
    }

    pub fn zoom_in(&mut self) -> f64 {
        self.zoom(self.config.zoom_step)
    }

    pub fn zoom_out(&mut self) -> f64 {
        self.zoom(-self.config.zoom_step)
    }

    /// Zoom from a ctrl+wheel event with the platform's vertical delta.
    pub fn zoom_wheel(&mut self, delta_y: f64) -> f64 {
        self.zoom(-delta_y * self.config.wheel_zoom_factor)
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        if delta.is_finite() {
            self.pan += delta;
        }
    }

    /// Back to scale 1 and no pan.
    pub fn reset_view(&mut self) {
        self.scale = 1.0;
        self.pan = Vec2::ZERO;
    }

    /// Set the grid size. Values below 1 (or non-finite) become 1.
    pub fn set_grid_size(&mut self, size: f64) {
        let clamped = if size.is_finite() && size >= 1.0 {
            size.round() as u32
        } else {
            log::debug!("grid size {size} clamped to 1");
            1
        };
        self.grid_size = clamped;
    }

    // ── Placement ──

    /// Round to the nearest grid line when snapping is on.
    pub fn snap(&self, value: f64) -> f64 {
        if !self.snap_to_grid {
            return value;
        }
        let grid = f64::from(self.grid_size);
        (value / grid).round() * grid
    }

    /// Document-space top-left for something of `anchor_size` dropped at
    /// `screen`: offset by the drop anchor, clamped to non-negative, then snapped.
    pub fn placement_point(&self, screen: Point, anchor_size: Size) -> Point {
        let doc = self.screen_to_document(screen);
        let offset = match self.config.drop_anchor {
            DropAnchor::HalfDefaultSize => Vec2::new(anchor_size.width / 2.0, anchor_size.height / 2.0),
            DropAnchor::TopLeft => Vec2::ZERO,
        };
        let x = (doc.x - offset.x).max(0.0);
        let y = (doc.y - offset.y).max(0.0);
        Point::new(self.snap(x), self.snap(y))
    }

    /// Build a new instance of `kind` from registry defaults at the drop point.
    pub fn place_new(&self, kind: &ComponentKind, screen: Point) -> Result<ComponentInstance, UnknownKindError> {
        let defaults = registry().instantiate_defaults(kind)?;
        let at = self.placement_point(screen, defaults.size);
        let mut instance = ComponentInstance::new(
            ComponentId::fresh(kind.as_str()),
            kind.clone(),
            defaults.props,
            defaults.style,
            defaults.size,
        );
        instance.x = at.x;
        instance.y = at.y;
        log::trace!("placed {} at ({}, {})", instance.id, at.x, at.y);
        Ok(instance)
    }

    /// Move an existing instance to a drop point. The anchor uses the kind's
    /// default size; kinds without a definition use the instance's own size.
    pub fn place_existing(&self, instance: &mut ComponentInstance, screen: Point) {
        let anchor_size = registry()
            .lookup(&instance.kind)
            .map(|def| def.default_size)
            .unwrap_or_else(|_| instance.size());
        let at = self.placement_point(screen, anchor_size);
        instance.x = at.x;
        instance.y = at.y;
    }
}

// ─── Hit testing ─────────────────────────────────────────────────────────

/// Topmost component under a document-space point. Later components paint
/// on top, so the list is walked back to front.
pub fn hit_test(components: &[ComponentInstance], point: Point) -> Option<ComponentId> {
    components
        .iter()
        .rev()
        .find(|c| c.bounds().contains(point))
        .map(|c| c.id)
}

/// True when the point lands on no component.
pub fn hit_test_background(components: &[ComponentInstance], point: Point) -> bool {
    hit_test(components, point).is_none()
}
