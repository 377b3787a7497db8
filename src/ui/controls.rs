use crate::geometry::camera::Camera;
use crate::io::render_settings::RenderSettings;
use std::f32::consts::TAU;

/// 相机控制参数（内部统一为弧度）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlSettings {
    /// 移动速度（单位/秒）
    pub move_speed: f32,
    /// 拖拽灵敏度（弧度/像素）
    pub look_sensitivity: f32,
    /// 方向键转向速度（弧度/秒）
    pub key_turn_speed: f32,
}

impl ControlSettings {
    pub fn from_settings(settings: &RenderSettings) -> Self {
        Self {
            move_speed: settings.move_speed,
            look_sensitivity: settings.look_sensitivity.to_radians(),
            key_turn_speed: settings.key_turn_speed.to_radians(),
        }
    }
}

/// 一帧内采集到的输入，与窗口系统无关
///
/// 移动和转向分量取值 -1/0/1，拖拽量以像素计（屏幕 y 向下）。
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CameraInput {
    pub forward: f32,
    pub right: f32,
    pub up: f32,
    /// 方向键：正值向右转
    pub turn_right: f32,
    /// 方向键：正值向上看
    pub turn_up: f32,
    pub drag: [f32; 2],
}

impl CameraInput {
    pub fn is_idle(&self) -> bool {
        *self == Self::default()
    }

    /// 把输入作用到相机上，返回相机是否发生变化
    pub fn apply(&self, camera: &mut Camera, controls: &ControlSettings, dt: f32) -> bool {
        if self.is_idle() {
            return false;
        }
        // 防止卡顿后的长帧造成大幅跳变
        let dt = dt.clamp(0.0, 0.1);

        let step = controls.move_speed * dt;
        camera.translate_local(self.right * step, self.up * step, self.forward * step);

        // 偏航角增大时视线向左转，所以向右的输入取负号
        let turn = controls.key_turn_speed * dt;
        let d_yaw = -self.turn_right * turn - self.drag[0] * controls.look_sensitivity;
        let d_pitch = self.turn_up * turn - self.drag[1] * controls.look_sensitivity;
        camera.rotate(d_yaw, d_pitch);
        // 偏航角折回 [0, 2π)
        camera.set_yaw(camera.yaw().rem_euclid(TAU));

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::camera::PITCH_LIMIT;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    fn controls() -> ControlSettings {
        ControlSettings::from_settings(&RenderSettings::default())
    }

    #[test]
    fn idle_input_leaves_camera_untouched() {
        let mut camera = Camera::default();
        assert!(!CameraInput::default().apply(&mut camera, &controls(), 0.016));
        assert_eq!(camera, Camera::default());
    }

    #[test]
    fn forward_motion_scales_with_time() {
        let mut camera = Camera::default();
        let input = CameraInput {
            forward: 1.0,
            ..Default::default()
        };
        assert!(input.apply(&mut camera, &controls(), 0.05));
        assert_relative_eq!(camera.position, Point3::new(0.0, 0.0, 0.15), epsilon = 1e-6);
    }

    #[test]
    fn turning_right_moves_forward_toward_right_vector() {
        let mut camera = Camera::default();
        let right = camera.right();
        let input = CameraInput {
            turn_right: 1.0,
            ..Default::default()
        };
        input.apply(&mut camera, &controls(), 0.05);
        assert!(camera.forward().dot(&right) > 0.0);
    }

    #[test]
    fn dragging_up_looks_up_and_stays_clamped() {
        let mut camera = Camera::default();
        let input = CameraInput {
            drag: [0.0, -10_000.0],
            ..Default::default()
        };
        for _ in 0..10 {
            input.apply(&mut camera, &controls(), 0.016);
        }
        assert!(camera.pitch() > 0.0);
        assert!(camera.pitch() <= PITCH_LIMIT);
    }
}
