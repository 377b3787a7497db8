use nalgebra::{Matrix3, Point2, Vector3};

/// 透视投影参数：相机坐标 -> NDC -> 归一化屏幕坐标 [0,1]²
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// 宽高比（宽/高）
    pub aspect_ratio: f32,
    /// 近平面距离，所有前向深度都不会小于该值
    pub near: f32,
    /// 是否把投影结果钳制到NDC [-1,1]
    pub clamp_ndc: bool,
    /// 缓存的 1 / tan(fov/2)
    focal: f32,
}

/// 单个顶点的投影结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedVertex {
    /// 归一化屏幕坐标
    pub screen: Point2<f32>,
    /// 相机空间前向深度（已做近平面钳制）
    pub depth: f32,
}

impl Projection {
    pub fn new(fov_y_degrees: f32, aspect_ratio: f32, near: f32, clamp_ndc: bool) -> Self {
        let fov_y = fov_y_degrees.to_radians();
        Self {
            aspect_ratio,
            near,
            clamp_ndc,
            focal: 1.0 / (fov_y * 0.5).tan(),
        }
    }

    /// 透视缩放因子 f = 1 / tan(fov/2)
    #[inline]
    pub fn focal(&self) -> f32 {
        self.focal
    }

    /// 相机空间前向深度：相机朝向局部 -z，位于近平面之内（或身后）的点钳制到 near
    #[inline]
    pub fn forward_depth(&self, view: &Vector3<f32>) -> f32 {
        let z = -view.z;
        if z <= self.near { self.near } else { z }
    }

    /// 相机空间坐标 -> NDC
    #[inline]
    pub fn view_to_ndc(&self, view: &Vector3<f32>) -> Point2<f32> {
        let z = self.forward_depth(view);
        let f = self.focal();
        let mut x = view.x * f / self.aspect_ratio / z;
        let mut y = view.y * f / z;
        if self.clamp_ndc {
            x = x.clamp(-1.0, 1.0);
            y = y.clamp(-1.0, 1.0);
        }
        Point2::new(x, y)
    }

    /// 相机空间坐标 -> 屏幕坐标 + 深度，二者来自同一个相机空间向量
    #[inline]
    pub fn project_view(&self, view: &Vector3<f32>) -> ProjectedVertex {
        ProjectedVertex {
            screen: ndc_to_screen(self.view_to_ndc(view)),
            depth: self.forward_depth(view),
        }
    }
}

/// 将NDC [-1,1] 映射到屏幕 [0,1]
#[inline]
pub fn ndc_to_screen(ndc: Point2<f32>) -> Point2<f32> {
    Point2::new((ndc.x + 1.0) * 0.5, (ndc.y + 1.0) * 0.5)
}

/// 由相机基向量构造世界 -> 相机的旋转矩阵，三行依次为 right, up, -forward
pub fn rotation_from_basis(
    right: &Vector3<f32>,
    up: &Vector3<f32>,
    forward: &Vector3<f32>,
) -> Matrix3<f32> {
    Matrix3::from_rows(&[right.transpose(), up.transpose(), (-forward).transpose()])
}
