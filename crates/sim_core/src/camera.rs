use crate::math::Vec2;

pub const CAMERA_ZOOM_DEFAULT: f32 = 1.0;
pub const CAMERA_ZOOM_MIN: f32 = 0.5;
pub const CAMERA_ZOOM_MAX: f32 = 2.0;

const SHAKE_HASH_FREQ_X: f32 = 12.9898;
const SHAKE_HASH_FREQ_Y: f32 = 78.233;
const SHAKE_HASH_SCALE: f32 = 43758.5453;

/// Which hit feedback started the shake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShakeCue {
    /// Damage taken.
    Strong,
    /// Shield absorbed a hit.
    Light,
}

impl ShakeCue {
    pub fn duration_seconds(self) -> f32 {
        match self {
            Self::Strong => 0.25,
            Self::Light => 0.15,
        }
    }

    pub fn scale(self) -> f32 {
        match self {
            Self::Strong => 1.0,
            Self::Light => 0.5,
        }
    }
}

/// `position` is the world-space top-left of the view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera2D {
    pub position: Vec2,
    pub zoom: f32,
    shake_remaining_seconds: f32,
    shake_duration_seconds: f32,
    shake_scale: f32,
}

impl Default for Camera2D {
    fn default() -> Self {
        Self {
            position: Vec2::default(),
            zoom: CAMERA_ZOOM_DEFAULT,
            shake_remaining_seconds: 0.0,
            shake_duration_seconds: 0.0,
            shake_scale: 0.0,
        }
    }
}

impl Camera2D {
    pub fn effective_zoom(&self) -> f32 {
        clamp_camera_zoom(self.zoom)
    }

    pub fn set_zoom_clamped(&mut self, zoom: f32) {
        self.zoom = clamp_camera_zoom(zoom);
    }

    /// World-space size of the visible area.
    pub fn view_size(&self, viewport: (u32, u32)) -> Vec2 {
        let zoom = self.effective_zoom();
        Vec2::new(viewport.0 as f32 / zoom, viewport.1 as f32 / zoom)
    }

    /// Centers the view on `target`, then keeps it inside the world. An axis
    /// where the world is narrower than the view is centered instead.
    pub fn follow(&mut self, target: Vec2, viewport: (u32, u32), world_size: Vec2) {
        let view = self.view_size(viewport);
        let origin = target - view * 0.5;
        self.position = Vec2::new(
            clamp_axis(origin.x, view.x, world_size.x),
            clamp_axis(origin.y, view.y, world_size.y),
        );
    }

    /// A weaker cue never cuts short a stronger shake that is still running.
    pub fn start_shake(&mut self, cue: ShakeCue) {
        if self.is_shaking() && self.shake_scale > cue.scale() {
            return;
        }
        self.shake_duration_seconds = cue.duration_seconds();
        self.shake_remaining_seconds = cue.duration_seconds();
        self.shake_scale = cue.scale();
    }

    pub fn tick_shake(&mut self, dt_seconds: f32) {
        self.shake_remaining_seconds = (self.shake_remaining_seconds - dt_seconds).max(0.0);
    }

    pub fn is_shaking(&self) -> bool {
        self.shake_remaining_seconds > 0.0
    }

    /// Screen-space offset for the current shake, scaled by `strength`
    /// pixels at full intensity.
    pub fn shake_offset(&self, strength: f32) -> Vec2 {
        if !self.is_shaking() || self.shake_duration_seconds <= 0.0 {
            return Vec2::ZERO;
        }
        let elapsed = self.shake_duration_seconds - self.shake_remaining_seconds;
        let fade = self.shake_remaining_seconds / self.shake_duration_seconds;
        let amplitude = fade * strength * self.shake_scale;
        Vec2::new(
            hashed_sine(elapsed * SHAKE_HASH_FREQ_X) * amplitude,
            hashed_sine(elapsed * SHAKE_HASH_FREQ_Y) * amplitude,
        )
    }
}

pub fn clamp_camera_zoom(zoom: f32) -> f32 {
    if !zoom.is_finite() {
        return CAMERA_ZOOM_DEFAULT;
    }
    zoom.clamp(CAMERA_ZOOM_MIN, CAMERA_ZOOM_MAX)
}

fn clamp_axis(origin: f32, view: f32, world: f32) -> f32 {
    let max = world - view;
    if max < 0.0 {
        return max * 0.5;
    }
    origin.clamp(0.0, max)
}

// Pseudo-random in [-1, 1). Uses floor-based fract so negative inputs wrap.
fn hashed_sine(x: f32) -> f32 {
    let scaled = x.sin() * SHAKE_HASH_SCALE;
    (scaled - scaled.floor()) * 2.0 - 1.0
}
