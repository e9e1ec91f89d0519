use glam::{Mat4, Vec3};

/// Perspective camera looking at a fixed target.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    /// Vertical field of view in degrees.
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
}

impl Camera {
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn params(&self) -> CameraParams {
        CameraParams {
            view_proj: self.projection() * self.view(),
            position: self.position,
        }
    }

    /// Matches the aspect ratio to a CSS box. Degenerate boxes are ignored.
    pub fn fit(&mut self, size: &SurfaceSize) {
        if let Some(aspect) = size.aspect() {
            self.aspect = aspect;
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            fov_y: 45.0,
            aspect: 1.0,
            near: 0.1,
            far: 100.0,
            position: Vec3::new(0.0, 2.0, 8.0),
            target: Vec3::ZERO,
        }
    }
}

/// Container box in CSS pixels plus the device pixel ratio of the display.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceSize {
    pub css_width: f64,
    pub css_height: f64,
    pub pixel_ratio: f64,
}

impl SurfaceSize {
    pub fn for_container(css_width: f64, css_height: f64, pixel_ratio: f64) -> Self {
        Self {
            css_width: css_width.max(0.0),
            css_height: css_height.max(0.0),
            pixel_ratio: if pixel_ratio > 0.0 { pixel_ratio } else { 1.0 },
        }
    }

    /// Backing-store size in physical pixels, never below 1x1.
    pub fn physical(&self) -> (u32, u32) {
        let scale = |css: f64| ((css * self.pixel_ratio).round() as u32).max(1);
        (scale(self.css_width), scale(self.css_height))
    }

    pub fn aspect(&self) -> Option<f32> {
        (self.css_width > 0.0 && self.css_height > 0.0)
            .then(|| (self.css_width / self.css_height) as f32)
    }

    pub fn is_empty(&self) -> bool {
        self.css_width <= 0.0 || self.css_height <= 0.0
    }
}

impl Default for SurfaceSize {
    fn default() -> Self {
        Self::for_container(800.0, 600.0, 1.0)
    }
}

/// Camera parameters consumed by the renderer's uniform buffer.
#[derive(Clone, Debug)]
pub struct CameraParams {
    pub view_proj: Mat4,
    pub position: Vec3,
}

/// Directional light state consumed by the renderer's uniform buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct LightParams {
    /// Position the light shines from, toward the origin.
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
}

/// Ambient fill plus one directional key light.
#[derive(Clone, Debug, PartialEq)]
pub struct Lighting {
    pub ambient: f32,
    pub directional: LightParams,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            ambient: 0.6,
            directional: LightParams {
                position: Vec3::new(5.0, 5.0, 5.0),
                color: Vec3::ONE,
                intensity: 0.8,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn physical_size_rounds_css_box_by_pixel_ratio() {
        let size = SurfaceSize::for_container(641.0, 359.5, 1.5);
        assert_eq!(size.physical(), (962, 539));
        let tiny = SurfaceSize::for_container(0.0, 10.0, 2.0);
        assert_eq!(tiny.physical(), (1, 20));
    }

    #[test]
    fn fit_matches_container_aspect_exactly() {
        let mut camera = Camera::default();
        camera.fit(&SurfaceSize::for_container(1200.0, 400.0, 2.0));
        assert_eq!(camera.aspect, 3.0);
        camera.fit(&SurfaceSize::for_container(0.0, 400.0, 2.0));
        assert_eq!(camera.aspect, 3.0);
    }

    #[test]
    fn fractional_bounding_box_is_kept_until_scaling() {
        let size = SurfaceSize::for_container(640.4, 360.6, 2.0);
        assert_eq!(size.physical(), (1281, 721));
        assert_eq!(size.aspect(), Some((640.4 / 360.6) as f32));
    }

    #[test]
    fn invalid_pixel_ratio_falls_back_to_one() {
        let size = SurfaceSize::for_container(100.0, 50.0, 0.0);
        assert_eq!(size.physical(), (100, 50));
    }

    #[test]
    fn camera_projects_target_to_screen_center() {
        let camera = Camera::default();
        let clip = camera.params().view_proj * Vec3::ZERO.extend(1.0);
        assert_relative_eq!(clip.x / clip.w, 0.0, epsilon = 1e-6);
        assert_relative_eq!(clip.y / clip.w, 0.0, epsilon = 1e-6);
    }
}
