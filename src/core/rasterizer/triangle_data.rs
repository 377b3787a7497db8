use crate::geometry::camera::CameraView;
use crate::geometry::culling::{Facing, facing};
use nalgebra::{Point2, Point3, Vector3};

/// 屏幕空间包围盒（像素下标，闭区间），已钳制到图像范围内
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub min_x: usize,
    pub min_y: usize,
    pub max_x: usize,
    pub max_y: usize,
}

impl BoundingBox {
    /// 由归一化屏幕坐标计算包围盒：floor(min * dim) ..= ceil(max * dim)，再钳制到 [0, dim)
    ///
    /// 完全落在图像外时返回None。
    pub fn from_screen(points: &[Point2<f32>; 3], width: usize, height: usize) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        let [a, b, c] = points;
        let (w, h) = (width as f32, height as f32);

        let x0 = (a.x.min(b.x).min(c.x) * w).floor();
        let x1 = (a.x.max(b.x).max(c.x) * w).ceil();
        let y0 = (a.y.min(b.y).min(c.y) * h).floor();
        let y1 = (a.y.max(b.y).max(c.y) * h).ceil();

        let (max_col, max_row) = ((width - 1) as f32, (height - 1) as f32);
        // 比较写成取反形式，NaN 也会落入空包围盒
        if !(x1 >= 0.0 && y1 >= 0.0 && x0 <= max_col && y0 <= max_row) {
            return None;
        }

        Some(Self {
            min_x: x0.max(0.0) as usize,
            min_y: y0.max(0.0) as usize,
            max_x: x1.min(max_col) as usize,
            max_y: y1.min(max_row) as usize,
        })
    }

    pub fn for_each_pixel<F>(&self, mut callback: F)
    where
        F: FnMut(usize, usize),
    {
        for j in self.min_y..=self.max_y {
            for i in self.min_x..=self.max_x {
                callback(i, j);
            }
        }
    }
}

/// 三角形被丢弃的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Backface,
    Degenerate,
    Offscreen,
}

/// 投影完成、通过剔除的三角形，光栅化阶段只读
#[derive(Debug, Clone, Copy)]
pub struct ProjectedTriangle {
    /// 归一化屏幕坐标 a, b, c
    pub screen: [Point2<f32>; 3],
    /// 相机空间前向深度 a, b, c
    pub depth: [f32; 3],
    /// 不透明RGBA颜色
    pub color: [f32; 4],
    pub bbox: BoundingBox,
}

impl ProjectedTriangle {
    /// 投影三个顶点，完成背面剔除、退化检测和包围盒计算
    pub fn setup(
        vertices: &[Point3<f32>; 3],
        color: &Vector3<f32>,
        view: &CameraView,
        width: usize,
        height: usize,
        backface_culling: bool,
    ) -> Result<Self, Rejection> {
        let [pa, pb, pc] = vertices.map(|v| view.project(&v));
        let screen = [pa.screen, pb.screen, pc.screen];

        match facing(&screen[0], &screen[1], &screen[2]) {
            Facing::Degenerate => return Err(Rejection::Degenerate),
            Facing::Back if backface_culling => return Err(Rejection::Backface),
            _ => {}
        }

        let bbox = BoundingBox::from_screen(&screen, width, height).ok_or(Rejection::Offscreen)?;

        Ok(Self {
            screen,
            depth: [pa.depth, pb.depth, pc.depth],
            color: [color.x, color.y, color.z, 1.0],
            bbox,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bbox_uses_floor_and_ceil_inclusive() {
        let points = [
            Point2::new(0.11, 0.26),
            Point2::new(0.49, 0.26),
            Point2::new(0.3, 0.74),
        ];
        let bbox = BoundingBox::from_screen(&points, 10, 10).unwrap();
        assert_eq!(
            bbox,
            BoundingBox {
                min_x: 1,
                min_y: 2,
                max_x: 5,
                max_y: 8
            }
        );
    }

    #[test]
    fn bbox_is_clamped_to_image() {
        let points = [
            Point2::new(-3.0, -1.0),
            Point2::new(4.0, 0.5),
            Point2::new(0.5, 7.0),
        ];
        let bbox = BoundingBox::from_screen(&points, 16, 8).unwrap();
        assert_eq!((bbox.min_x, bbox.min_y, bbox.max_x, bbox.max_y), (0, 0, 15, 7));
    }

    #[test]
    fn offscreen_triangle_has_no_bbox() {
        let points = [
            Point2::new(1.2, 0.2),
            Point2::new(1.5, 0.2),
            Point2::new(1.3, 0.6),
        ];
        assert!(BoundingBox::from_screen(&points, 16, 16).is_none());
        let below = [
            Point2::new(0.2, -0.5),
            Point2::new(0.5, -0.5),
            Point2::new(0.3, -0.1),
        ];
        assert!(BoundingBox::from_screen(&below, 16, 16).is_none());
    }

    #[test]
    fn bbox_visits_every_pixel_once() {
        let bbox = BoundingBox {
            min_x: 2,
            min_y: 1,
            max_x: 4,
            max_y: 2,
        };
        let mut visited = Vec::new();
        bbox.for_each_pixel(|i, j| visited.push((i, j)));
        assert_eq!(visited.len(), 6);
        assert_eq!(visited.first(), Some(&(2, 1)));
        assert_eq!(visited.last(), Some(&(4, 2)));
    }
}
