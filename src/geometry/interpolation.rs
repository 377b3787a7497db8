use nalgebra::Point2;

/// 点积法求解时分母的下限，低于该值视为退化
pub const DEGENERATE_EPSILON: f32 = 1e-20;

/// 重心坐标，u/v/w 分别对应顶点 a/b/c，三者之和为 1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Barycentric {
    pub u: f32,
    pub v: f32,
    pub w: f32,
}

impl Barycentric {
    /// 三个权重都在 [0,1] 内即视为在三角形内部（含边界）
    #[inline(always)]
    pub fn is_inside(&self) -> bool {
        self.v >= 0.0 && self.w >= 0.0 && self.v + self.w <= 1.0
    }

    #[inline(always)]
    pub fn interpolate(&self, a: f32, b: f32, c: f32) -> f32 {
        self.u * a + self.v * b + self.w * c
    }
}

/// 计算点 p 相对二维三角形 (a, b, c) 的重心坐标
///
/// 使用点积形式求解 2x2 线性方程组。分母为零（或接近零）时三角形退化，返回None。
#[inline]
pub fn barycentric_coordinates(
    p: Point2<f32>,
    a: Point2<f32>,
    b: Point2<f32>,
    c: Point2<f32>,
) -> Option<Barycentric> {
    let v0 = b - a;
    let v1 = c - a;
    let v2 = p - a;

    let d00 = v0.dot(&v0);
    let d01 = v0.dot(&v1);
    let d11 = v1.dot(&v1);
    let d20 = v2.dot(&v0);
    let d21 = v2.dot(&v1);

    let denom = d00 * d11 - d01 * d01;
    // NaN 也在这里被拒绝
    if !(denom.abs() > DEGENERATE_EPSILON) {
        return None;
    }

    let v = (d11 * d20 - d01 * d21) / denom;
    let w = (d00 * d21 - d01 * d20) / denom;
    Some(Barycentric {
        u: 1.0 - v - w,
        v,
        w,
    })
}

/// 深度插值
///
/// 默认在屏幕空间线性插值相机空间深度；`perspective_correct` 为真时改为对 1/z 插值。
/// 输入深度都经过近平面钳制，始终为正。
#[inline]
pub fn interpolate_depth(
    bary: &Barycentric,
    za: f32,
    zb: f32,
    zc: f32,
    perspective_correct: bool,
) -> f32 {
    if !perspective_correct {
        return bary.interpolate(za, zb, zc);
    }
    let inv_z = bary.interpolate(1.0 / za, 1.0 / zb, 1.0 / zc);
    if inv_z > 0.0 {
        1.0 / inv_z
    } else {
        bary.interpolate(za, zb, zc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn triangle() -> (Point2<f32>, Point2<f32>, Point2<f32>) {
        (
            Point2::new(0.2, 0.2),
            Point2::new(0.8, 0.2),
            Point2::new(0.5, 0.8),
        )
    }

    #[test]
    fn vertices_get_unit_weights() {
        let (a, b, c) = triangle();
        let at_a = barycentric_coordinates(a, a, b, c).unwrap();
        let at_b = barycentric_coordinates(b, a, b, c).unwrap();
        let at_c = barycentric_coordinates(c, a, b, c).unwrap();
        assert_relative_eq!(at_a.u, 1.0, epsilon = 1e-5);
        assert_relative_eq!(at_b.v, 1.0, epsilon = 1e-5);
        assert_relative_eq!(at_c.w, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn centroid_is_inside_with_equal_weights() {
        let (a, b, c) = triangle();
        let centroid = Point2::from((a.coords + b.coords + c.coords) / 3.0);
        let bary = barycentric_coordinates(centroid, a, b, c).unwrap();
        assert!(bary.is_inside());
        assert_relative_eq!(bary.u, 1.0 / 3.0, epsilon = 1e-5);
        assert_relative_eq!(bary.v, 1.0 / 3.0, epsilon = 1e-5);
        assert_relative_eq!(bary.w, 1.0 / 3.0, epsilon = 1e-5);
    }

    #[test]
    fn outside_point_is_rejected() {
        let (a, b, c) = triangle();
        let bary = barycentric_coordinates(Point2::new(0.1, 0.9), a, b, c).unwrap();
        assert!(!bary.is_inside());
    }

    #[test]
    fn collinear_triangle_is_degenerate() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(0.5, 0.5);
        let c = Point2::new(1.0, 1.0);
        assert!(barycentric_coordinates(Point2::new(0.25, 0.25), a, b, c).is_none());
    }

    #[test]
    fn linear_and_perspective_depth() {
        let bary = Barycentric {
            u: 0.5,
            v: 0.5,
            w: 0.0,
        };
        assert_relative_eq!(interpolate_depth(&bary, 1.0, 3.0, 9.0, false), 2.0);
        assert_relative_eq!(interpolate_depth(&bary, 1.0, 3.0, 9.0, true), 1.5, epsilon = 1e-5);
    }
}
