//! Conversion between device coordinates (pointer events, drawing surface) and model
//! coordinates (state positions), plus the accumulated region that has been drawn so far.

use crate::geometry::{Point, Rect};
use crate::types::{GRID_UNIT, MAX_ZOOM, MIN_ZOOM};
use log::debug;
use serde::{Deserialize, Serialize};

/// The visible window onto the model.
///
/// `model = device / zoom - translation` and `device = (model + translation) * zoom`.
/// The translation is never positive: the model plane starts at the origin and can only
/// be scrolled towards positive coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    width: f64,
    height: f64,
    zoom: f64,
    tx: f64,
    ty: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            zoom: 1.0,
            tx: 0.0,
            ty: 0.0,
        }
    }

    /// A viewport already scrolled to `(tx, ty)`. Positive components are clamped to zero.
    pub fn with_translation(mut self, tx: f64, ty: f64) -> Self {
        self.tx = tx.min(0.0);
        self.ty = ty.min(0.0);
        self
    }

    /// Updates the device size of the drawing surface.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    /// Sets the zoom factor, clamped to `[MIN_ZOOM, MAX_ZOOM]`.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Multiplies the zoom by `factor` while keeping the model point under the device
    /// `anchor` in place.
    ///
    /// The translation is adjusted to hold the anchor and then clamped to the model origin,
    /// so near the origin the anchor may drift.
    pub fn zoom_at(&mut self, factor: f64, anchor: Point) {
        let before = self.local_pos(anchor);
        self.set_zoom(self.zoom * factor);

        self.tx = (anchor.x / self.zoom - before.x).min(0.0);
        self.ty = (anchor.y / self.zoom - before.y).min(0.0);

        debug!(
            "Zoom {:.2} at ({:.1}, {:.1}), translation ({:.1}, {:.1})",
            self.zoom, anchor.x, anchor.y, self.tx, self.ty
        );
    }

    /// Device to model coordinates.
    pub fn local_pos(&self, device: Point) -> Point {
        Point::new(device.x / self.zoom - self.tx, device.y / self.zoom - self.ty)
    }

    /// Model to device coordinates.
    pub fn device_pos(&self, model: Point) -> Point {
        Point::new((model.x + self.tx) * self.zoom, (model.y + self.ty) * self.zoom)
    }

    /// The visible region in model coordinates.
    pub fn viewport_rect(&self) -> Rect {
        let (w, h) = self.bounding_size();
        Rect::new(-self.tx, -self.ty, -self.tx + w, -self.ty + h)
    }

    /// Size of the visible region in model units.
    pub fn bounding_size(&self) -> (f64, f64) {
        (self.width / self.zoom, self.height / self.zoom)
    }

    /// Scrolls by `(dx, dy)` model units.
    ///
    /// The whole pan is ignored when it would move the view past the model origin.
    /// Returns whether the translation changed.
    pub fn pan(&mut self, dx: f64, dy: f64) -> bool {
        let tx = self.tx + dx;
        let ty = self.ty + dy;
        if tx > 0.0 || ty > 0.0 {
            return false;
        }

        self.tx = tx;
        self.ty = ty;
        true
    }

    /// Back to zoom 1 at the origin.
    pub fn reset(&mut self) {
        self.zoom = 1.0;
        self.tx = 0.0;
        self.ty = 0.0;
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn translation(&self) -> (f64, f64) {
        (self.tx, self.ty)
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }
}

/// Everything drawn since the view was created, in model coordinates.
///
/// The bounds only grow. Clearing the whole accumulated region removes whatever a previous
/// frame left behind after panning or zooming out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderBounds {
    rect: Rect,
}

impl RenderBounds {
    pub fn new(rect: Rect) -> Self {
        Self { rect }
    }

    /// The union of the current bounds and `rect`.
    pub fn grow(self, rect: Rect) -> RenderBounds {
        RenderBounds {
            rect: self.rect.union(&rect),
        }
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// The region to clear before drawing: the bounds plus one grid unit on every side.
    pub fn clear_rect(&self) -> Rect {
        self.rect.expand(GRID_UNIT)
    }
}
