use nalgebra::Point2;

/// 投影后三角形的朝向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    Front,
    Back,
    /// 零面积（共线或投影后重合）
    Degenerate,
}

/// 屏幕空间有符号面积（两倍），负值为正面
#[inline]
pub fn signed_area(a: &Point2<f32>, b: &Point2<f32>, c: &Point2<f32>) -> f32 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

#[inline]
pub fn facing(a: &Point2<f32>, b: &Point2<f32>, c: &Point2<f32>) -> Facing {
    let area = signed_area(a, b, c);
    if area < 0.0 {
        Facing::Front
    } else if area > 0.0 {
        Facing::Back
    } else {
        // 包括NaN
        Facing::Degenerate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swapping_two_vertices_flips_facing() {
        let a = Point2::new(0.7, 0.3);
        let b = Point2::new(0.3, 0.3);
        let c = Point2::new(0.5, 0.7);
        assert_eq!(facing(&a, &b, &c), Facing::Front);
        assert_eq!(facing(&a, &c, &b), Facing::Back);
        assert_eq!(signed_area(&a, &b, &c), -signed_area(&a, &c, &b));
    }

    #[test]
    fn zero_area_is_degenerate() {
        let p = Point2::new(0.5, 0.5);
        assert_eq!(facing(&p, &p, &Point2::new(0.9, 0.1)), Facing::Degenerate);
        let nan = Point2::new(f32::NAN, 0.0);
        assert_eq!(facing(&nan, &p, &p), Facing::Degenerate);
    }
}
