//! Virtual camera: placement, projection and screen size

use nalgebra::{Isometry3, Matrix4, Point3, Vector3, Vector4};

use crate::frame::Frame;
use crate::geometry::BoundingBox;

/// Projection mode for rendering
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectionMode {
    Orthographic,
    Perspective,
}

/// Camera looking down its frame's -z axis with +y up
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Camera frame in world coordinates
    pub frame: Frame,
    /// Distance to the point of interest; sizes the orthographic volume
    pub focus_distance: f32,
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub mode: ProjectionMode,
    pub screen_width: u32,
    pub screen_height: u32,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self::look_at(
            &Point3::new(0.0, 0.0, 5.0),
            &Point3::origin(),
            &Vector3::y(),
            width,
            height,
        )
    }

    pub fn look_at(
        eye: &Point3<f32>,
        target: &Point3<f32>,
        up: &Vector3<f32>,
        width: u32,
        height: u32,
    ) -> Self {
        let placement = Isometry3::look_at_rh(eye, target, up).inverse();
        Self {
            frame: Frame {
                origin: Point3::from(placement.translation.vector),
                basis: *placement.rotation.to_rotation_matrix().matrix(),
            },
            focus_distance: (target - eye).norm(),
            fov: std::f32::consts::PI / 4.0, // 45 degrees
            near: 0.1,
            far: 100.0,
            mode: ProjectionMode::Perspective,
            screen_width: width.max(1),
            screen_height: height.max(1),
        }
    }

    /// Perspective camera that keeps all of `bounds` in view
    pub fn framing(bounds: &BoundingBox, width: u32, height: u32) -> Self {
        let center = bounds.center();
        let radius = (bounds.diagonal().norm() / 2.0).max(1e-3);
        let mut camera = Self::new(width, height);
        let half_fov = camera.fov / 2.0;
        let distance = 1.1 * radius / half_fov.sin().min(half_fov.sin() * camera.aspect());
        let direction = Vector3::new(0.5, 0.4, 1.0).normalize();

        camera = Self::look_at(
            &(center + direction * distance),
            &center,
            &Vector3::y(),
            width,
            height,
        );
        camera.near = (distance - 1.5 * radius).max(distance * 0.01);
        camera.far = distance + 1.5 * radius;
        camera
    }

    pub fn aspect(&self) -> f32 {
        self.screen_width as f32 / self.screen_height as f32
    }

    /// World-to-camera matrix
    pub fn view_matrix(&self) -> Matrix4<f32> {
        self.frame.inverse().to_matrix()
    }

    /// Create the projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        match self.mode {
            ProjectionMode::Perspective => {
                Matrix4::new_perspective(self.aspect(), self.fov, self.near, self.far)
            }
            ProjectionMode::Orthographic => {
                let height = 2.0 * self.focus_distance * (self.fov / 2.0).tan();
                let width = height * self.aspect();
                Matrix4::new_orthographic(
                    -width / 2.0,
                    width / 2.0,
                    -height / 2.0,
                    height / 2.0,
                    self.near,
                    self.far,
                )
            }
        }
    }

    /// Project a model-space point through `mvp` to screen pixels and NDC depth.
    ///
    /// `None` when the point is behind the eye or outside the view volume.
    pub fn project_to_screen(
        &self,
        point: &Point3<f32>,
        mvp: &Matrix4<f32>,
    ) -> Option<(f32, f32, f32)> {
        let clip = mvp * Vector4::new(point.x, point.y, point.z, 1.0);

        // Prevent division by near-zero depth values
        if clip.w < 1e-6 {
            return None;
        }

        let ndc = clip.xyz() / clip.w;
        if ndc.iter().any(|c| !(-1.0..=1.0).contains(c)) {
            return None;
        }

        // Convert to screen space
        let screen_x = (ndc.x + 1.0) * 0.5 * self.screen_width as f32;
        let screen_y = (1.0 - ndc.y) * 0.5 * self.screen_height as f32;

        Some((screen_x, screen_y, ndc.z))
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(800, 600)
    }
}
