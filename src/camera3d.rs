use glam::{Mat4, Vec2, Vec3, Vec4};
use winit::dpi::PhysicalSize;

const DEFAULT_UP: Vec3 = Vec3::Y;

/// Screen/world conversions supplied by the host renderer.
///
/// Screen points are `(x, y)` in pixels with `y` growing downward; `z` is the view depth
/// along the camera's forward axis.
pub trait Projection {
    fn world_to_screen(&self, world: Vec3) -> Vec3;
    fn screen_to_world(&self, screen: Vec3) -> Vec3;
}

/// Perspective camera.
#[derive(Debug, Clone)]
pub struct Camera3D {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_radians: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera3D {
    pub fn new(position: Vec3, target: Vec3, fov_y_radians: f32, near: f32, far: f32) -> Self {
        Self { position, target, up: DEFAULT_UP, fov_y_radians, near, far }
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y_radians, aspect.max(0.0001), self.near, self.far)
    }

    pub fn view_projection(&self, viewport: PhysicalSize<u32>) -> Mat4 {
        let aspect = if viewport.height > 0 { viewport.width as f32 / viewport.height as f32 } else { 1.0 };
        self.projection_matrix(aspect) * self.view_matrix()
    }

    /// Generates a world-space ray originating from the camera through a screen-space position.
    pub fn screen_ray(&self, screen: Vec2, viewport: PhysicalSize<u32>) -> Option<(Vec3, Vec3)> {
        if viewport.width == 0 || viewport.height == 0 {
            return None;
        }
        let ndc_x = (2.0 * screen.x / viewport.width as f32) - 1.0;
        let ndc_y = 1.0 - (2.0 * screen.y / viewport.height as f32);
        let clip = Vec4::new(ndc_x, ndc_y, 1.0, 1.0);
        let inv_view_proj = self.view_projection(viewport).inverse();
        let world = inv_view_proj * clip;
        if world.w.abs() < f32::EPSILON {
            return None;
        }
        let world_pos = (world.truncate() / world.w) - self.position;
        let dir = world_pos.normalize();
        Some((self.position, dir))
    }

    pub fn project_point(&self, point: Vec3, viewport: PhysicalSize<u32>) -> Option<Vec2> {
        if viewport.width == 0 || viewport.height == 0 {
            return None;
        }
        let clip = self.view_projection(viewport) * point.extend(1.0);
        if clip.w.abs() < f32::EPSILON {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        let x = (ndc.x + 1.0) * 0.5 * viewport.width as f32;
        let y = (1.0 - ndc.y) * 0.5 * viewport.height as f32;
        Some(Vec2::new(x, y))
    }

    pub fn with_viewport(self, viewport: PhysicalSize<u32>) -> ViewportCamera {
        ViewportCamera { camera: self, viewport }
    }
}

/// A camera bound to the viewport it renders into.
#[derive(Debug, Clone)]
pub struct ViewportCamera {
    pub camera: Camera3D,
    pub viewport: PhysicalSize<u32>,
}

impl Projection for ViewportCamera {
    fn world_to_screen(&self, world: Vec3) -> Vec3 {
        let depth = (world - self.camera.position).dot(self.camera.forward());
        let screen = self.camera.project_point(world, self.viewport).unwrap_or(Vec2::ZERO);
        screen.extend(depth)
    }

    fn screen_to_world(&self, screen: Vec3) -> Vec3 {
        let Some((origin, dir)) = self.camera.screen_ray(screen.truncate(), self.viewport) else {
            return self.camera.position;
        };
        let along = dir.dot(self.camera.forward());
        if along.abs() < f32::EPSILON {
            return origin;
        }
        origin + dir * (screen.z / along)
    }
}

/// Axis-aligned orthographic view looking down -Z, for tooling and headless drivers.
#[derive(Debug, Clone, Copy)]
pub struct OrthoProjection {
    /// Screen position of the world origin.
    pub origin_px: Vec2,
    pub pixels_per_unit: f32,
    /// World z of the eye; depth is measured from here.
    pub eye_z: f32,
}

impl OrthoProjection {
    pub fn new(origin_px: Vec2, pixels_per_unit: f32, eye_z: f32) -> Self {
        Self { origin_px, pixels_per_unit: pixels_per_unit.max(f32::EPSILON), eye_z }
    }
}

impl Projection for OrthoProjection {
    fn world_to_screen(&self, world: Vec3) -> Vec3 {
        Vec3::new(
            self.origin_px.x + world.x * self.pixels_per_unit,
            self.origin_px.y - world.y * self.pixels_per_unit,
            self.eye_z - world.z,
        )
    }

    fn screen_to_world(&self, screen: Vec3) -> Vec3 {
        Vec3::new(
            (screen.x - self.origin_px.x) / self.pixels_per_unit,
            (self.origin_px.y - screen.y) / self.pixels_per_unit,
            self.eye_z - screen.z,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera3d_view_projection_is_finite() {
        let camera = Camera3D::new(Vec3::new(0.0, 1.0, 5.0), Vec3::ZERO, 60.0_f32.to_radians(), 0.1, 1000.0);
        let vp = camera.view_projection(PhysicalSize::new(1280, 720));
        assert!(!vp.to_cols_array().iter().any(|v| v.is_nan() || v.is_infinite()));
    }

    #[test]
    fn perspective_unproject_recovers_point_at_depth() {
        let camera = Camera3D::new(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, 60.0_f32.to_radians(), 0.1, 100.0)
            .with_viewport(PhysicalSize::new(800, 600));
        let point = Vec3::new(1.5, -0.75, 2.0);
        let screen = camera.world_to_screen(point);
        assert!((screen.z - 8.0).abs() < 1e-4);
        let back = camera.screen_to_world(screen);
        assert!((back - point).length() < 1e-3, "unprojected {back:?}");
    }

    #[test]
    fn ortho_round_trip() {
        let ortho = OrthoProjection::new(Vec2::new(400.0, 300.0), 100.0, 10.0);
        let point = Vec3::new(0.25, 1.0, -2.0);
        let back = ortho.screen_to_world(ortho.world_to_screen(point));
        assert!((back - point).length() < 1e-5);
    }
}
