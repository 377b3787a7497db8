use crate::geometry::transform::{ProjectedVertex, Projection, rotation_from_basis};
use nalgebra::{Matrix3, Point2, Point3, Vector3};
use std::f32::consts::FRAC_PI_2;

/// 俯仰角离开极点的安全余量
pub const PITCH_MARGIN: f32 = 1e-3;
/// 俯仰角的绝对值上限，避免正视上下方时的奇异
pub const PITCH_LIMIT: f32 = FRAC_PI_2 - PITCH_MARGIN;

fn clamp_pitch(pitch: f32) -> f32 {
    if pitch.is_nan() {
        return 0.0;
    }
    pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT)
}

/// 自由视角相机：位置 + 俯仰角 + 偏航角（弧度）
///
/// pitch = yaw = 0 时相机朝向世界 +Z，世界 +Y 为上方。
/// 俯仰角始终被限制在 [-PITCH_LIMIT, PITCH_LIMIT]，偏航角不做限制。
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// 相机位置（世界坐标）
    pub position: Point3<f32>,
    pitch: f32,
    yaw: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Point3::origin(), 0.0, 0.0)
    }
}

impl Camera {
    pub fn new(position: Point3<f32>, pitch: f32, yaw: f32) -> Self {
        Self {
            position,
            pitch: clamp_pitch(pitch),
            yaw,
        }
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn set_pitch(&mut self, pitch: f32) {
        self.pitch = clamp_pitch(pitch);
    }

    pub fn set_yaw(&mut self, yaw: f32) {
        self.yaw = yaw;
    }

    /// 增量旋转，俯仰角重新钳制
    pub fn rotate(&mut self, d_yaw: f32, d_pitch: f32) {
        self.yaw += d_yaw;
        self.set_pitch(self.pitch + d_pitch);
    }

    /// 视线方向（单位向量）
    pub fn forward(&self) -> Vector3<f32> {
        let (sp, cp) = self.pitch.sin_cos();
        let (sy, cy) = self.yaw.sin_cos();
        Vector3::new(sy * cp, sp, cy * cp)
    }

    /// 右方向 = forward × 世界上方向，只依赖偏航角
    pub fn right(&self) -> Vector3<f32> {
        let (sy, cy) = self.yaw.sin_cos();
        Vector3::new(-cy, 0.0, sy)
    }

    /// 相机上方向 = right × forward
    pub fn up(&self) -> Vector3<f32> {
        self.right().cross(&self.forward())
    }

    /// 世界 -> 相机的旋转矩阵
    pub fn rotation_matrix(&self) -> Matrix3<f32> {
        rotation_from_basis(&self.right(), &self.up(), &self.forward())
    }

    /// 在相机局部坐标系中移动：right/forward 沿相机方向，up 沿世界 +Y
    pub fn translate_local(&mut self, right: f32, up: f32, forward: f32) {
        self.position += self.right() * right + Vector3::y() * up + self.forward() * forward;
    }

    /// 调整朝向使相机看向目标点；目标与相机重合时保持不变
    pub fn look_at(&mut self, target: &Point3<f32>) {
        let dir = target - self.position;
        let horizontal = (dir.x * dir.x + dir.z * dir.z).sqrt();
        if dir.norm_squared() < 1e-12 {
            return;
        }
        self.yaw = dir.x.atan2(dir.z);
        self.set_pitch(dir.y.atan2(horizontal));
    }

    /// 生成本帧的只读视图快照
    pub fn view(&self, projection: Projection) -> CameraView {
        CameraView {
            position: self.position,
            rotation: self.rotation_matrix(),
            projection,
        }
    }

    /// 世界坐标 -> 归一化屏幕坐标
    pub fn world_to_screen(&self, point: &Point3<f32>, projection: Projection) -> Point2<f32> {
        self.view(projection).world_to_screen(point)
    }
}

/// 相机快照：每帧构造一次，供并行任务共享，避免重复计算三角函数
#[derive(Debug, Clone, Copy)]
pub struct CameraView {
    pub position: Point3<f32>,
    /// 屏幕投影与深度计算共用的唯一旋转矩阵
    pub rotation: Matrix3<f32>,
    pub projection: Projection,
}

impl CameraView {
    /// 世界坐标 -> 相机空间（相机朝向局部 -z）
    #[inline]
    pub fn to_view_space(&self, point: &Point3<f32>) -> Vector3<f32> {
        self.rotation * (point - self.position)
    }

    #[inline]
    pub fn world_to_screen(&self, point: &Point3<f32>) -> Point2<f32> {
        self.project(point).screen
    }

    /// 一次旋转同时得到屏幕坐标和深度
    #[inline]
    pub fn project(&self, point: &Point3<f32>) -> ProjectedVertex {
        self.projection.project_view(&self.to_view_space(point))
    }
}
