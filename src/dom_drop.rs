//! CSS-animated icon drop: the DOM alternative to the 3D emitter.
//!
//! The browser side only answers layout queries and creates or removes
//! elements; deciding where and whether to drop lives here so it can run
//! without a page.

use glam::Vec2;
use log::{debug, trace};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::catalog::ToolCatalog;
use crate::config::DropSettings;

/// Axis-aligned box in CSS pixels, as reported by `getBoundingClientRect`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

/// Drop point inside the container, or `None` when the mascot is too far
/// outside the container's horizontal extent.
pub fn plan_drop(mascot: Rect, container: Rect, settings: &DropSettings) -> Option<Vec2> {
    let x = mascot.left - container.left + f64::from(settings.offset.x);
    let y = mascot.top - container.top + f64::from(settings.offset.y);
    let margin = f64::from(settings.margin);
    if x < -margin || x > container.width + margin {
        return None;
    }
    Some(Vec2::new(x as f32, y as f32))
}

/// Everything needed to build one dropping element.
#[derive(Debug, Clone, PartialEq)]
pub struct DropElement {
    pub label: String,
    pub classes: String,
    pub left: f32,
    pub top: f32,
    /// CSS colour, `#rrggbb`.
    pub color: String,
    /// Font Awesome classes for the inner `<i>`, if the tool has an icon.
    pub icon_classes: Option<String>,
    /// Text used when no icon font class is available.
    pub glyph: char,
}

/// Page operations the drop needs.
pub trait DropHost {
    type Element;

    fn bounds(&self, selector: &str) -> Option<Rect>;
    fn spawn(&mut self, parent_selector: &str, element: &DropElement) -> Option<Self::Element>;
    fn remove_after(&mut self, element: Self::Element, delay_ms: u32);
}

/// Timer-driven emitter for the DOM presentation.
#[derive(Debug)]
pub struct DomDropEmitter {
    settings: DropSettings,
    catalog: ToolCatalog,
    rng: StdRng,
    dropped: u64,
}

impl DomDropEmitter {
    pub fn new(settings: DropSettings, catalog: ToolCatalog, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            settings,
            catalog,
            rng,
            dropped: 0,
        }
    }

    pub fn settings(&self) -> &DropSettings {
        &self.settings
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// One timer tick. Returns the element that was created, if any.
    pub fn tick<H: DropHost>(&mut self, host: &mut H) -> Option<DropElement> {
        let Some(mascot) = host.bounds(&self.settings.mascot_selector) else {
            debug!("no {} element, skipping drop", self.settings.mascot_selector);
            return None;
        };
        let Some(container) = host.bounds(&self.settings.container_selector) else {
            debug!("no {} element, skipping drop", self.settings.container_selector);
            return None;
        };
        let Some(point) = plan_drop(mascot, container, &self.settings) else {
            trace!("mascot off screen at x={}", mascot.left - container.left);
            return None;
        };

        let tool = self.catalog.choose(&mut self.rng);
        let element = DropElement {
            label: tool.name.clone(),
            classes: self.settings.element_classes.clone(),
            left: point.x,
            top: point.y,
            color: tool.color.to_hex(),
            icon_classes: tool.icon_classes(),
            glyph: tool.glyph(),
        };
        let handle = host.spawn(&self.settings.container_selector, &element)?;
        host.remove_after(handle, self.settings.lifetime_ms);
        self.dropped += 1;
        trace!("dropped {} icon at ({}, {})", element.label, point.x, point.y);
        Some(element)
    }
}
