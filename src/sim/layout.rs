//! Presentation layout
//!
//! Viewport-dependent visuals (background fit, craft sprite scale). Rebuilt
//! on resize; logical entity state is never touched here.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::Viewport;
use crate::consts::{BACKGROUND_HEIGHT, BACKGROUND_WIDTH, VIEWPORT_WIDTH};

/// What the host needs to rebuild its background and craft sprites
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Presentation {
    pub viewport: Viewport,
    /// Background center in screen space
    pub background_center: Vec2,
    /// Uniform scale so the background covers the viewport
    pub background_scale: f32,
    /// Craft sprite scale relative to the reference viewport
    pub craft_scale: f32,
    /// Bumped on every rebuild so hosts can skip redundant work
    pub generation: u32,
}

impl Presentation {
    pub fn new(viewport: Viewport) -> Self {
        Self::build(viewport, 0)
    }

    /// Rebuild for a new viewport. Degenerate sizes keep the old layout.
    pub fn rebuild(&mut self, viewport: Viewport) -> bool {
        if viewport.is_degenerate() {
            return false;
        }
        *self = Self::build(viewport, self.generation.wrapping_add(1));
        true
    }

    fn build(viewport: Viewport, generation: u32) -> Self {
        if viewport.is_degenerate() {
            return Self {
                viewport,
                background_center: Vec2::ZERO,
                background_scale: 1.0,
                craft_scale: 1.0,
                generation,
            };
        }
        let cover = (viewport.width / BACKGROUND_WIDTH).max(viewport.height / BACKGROUND_HEIGHT);
        Self {
            viewport,
            background_center: Vec2::new(viewport.width * 0.5, viewport.height * 0.5),
            background_scale: cover,
            craft_scale: (viewport.width / VIEWPORT_WIDTH).clamp(0.75, 1.5),
            generation,
        }
    }
}
