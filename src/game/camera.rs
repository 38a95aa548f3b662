use serde::Serialize;

use crate::config::CameraConfig;

/// Perspective camera that trails a target at a fixed offset.
#[derive(Debug, Clone, Serialize)]
pub struct Camera {
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub offset: [f32; 3],
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(config: &CameraConfig) -> Self {
        Self {
            position: config.initial_position,
            target: [0.0; 3],
            offset: config.offset,
            fov_degrees: config.fov_degrees,
            aspect: 16.0 / 9.0,
            near: config.near,
            far: config.far,
        }
    }

    /// Places the camera at `target + offset`, looking at `target`.
    pub fn follow(&mut self, target: [f32; 3]) {
        self.position = [
            target[0] + self.offset[0],
            target[1] + self.offset[1],
            target[2] + self.offset[2],
        ];
        self.target = target;
    }

    /// Updates the aspect ratio after a viewport resize. Zero-height
    /// viewports are ignored.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
    }

    /// Unit vector from the camera toward its target, if they differ.
    pub fn view_direction(&self) -> Option<[f32; 3]> {
        let d = [
            self.target[0] - self.position[0],
            self.target[1] - self.position[1],
            self.target[2] - self.position[2],
        ];
        let len = (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt();
        if len <= f32::EPSILON {
            return None;
        }
        Some([d[0] / len, d[1] / len, d[2] / len])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_follow_applies_offset() {
        let mut camera = Camera::new(&CameraConfig::default());
        camera.follow([15.0, 1.0, 5.0]);
        assert_eq!(camera.position, [22.0, 31.0, 30.0]);
        assert_eq!(camera.target, [15.0, 1.0, 5.0]);

        let dir = camera.view_direction().unwrap();
        assert!(dir[1] < 0.0);
    }

    #[test]
    fn test_viewport_resize() {
        let mut camera = Camera::new(&CameraConfig::default());
        camera.set_viewport(800, 400);
        assert_eq!(camera.aspect, 2.0);
        camera.set_viewport(800, 0);
        assert_eq!(camera.aspect, 2.0);
    }
}
