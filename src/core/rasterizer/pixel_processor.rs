use super::triangle_data::ProjectedTriangle;
use crate::geometry::interpolation::{barycentric_coordinates, interpolate_depth};
use nalgebra::Point2;

/// 像素级测试：点 (i/width, j/height) 落在三角形内部时返回插值深度
#[inline]
pub fn sample_depth(
    triangle: &ProjectedTriangle,
    i: usize,
    j: usize,
    width: usize,
    height: usize,
    perspective_correct: bool,
) -> Option<f32> {
    let p = Point2::new(i as f32 / width as f32, j as f32 / height as f32);
    let [a, b, c] = triangle.screen;

    let bary = barycentric_coordinates(p, a, b, c)?;
    if !bary.is_inside() {
        return None;
    }

    let [za, zb, zc] = triangle.depth;
    Some(interpolate_depth(&bary, za, zb, zc, perspective_correct))
}

/// 深度测试：严格小于才写入颜色和深度
#[inline(always)]
pub fn depth_test_and_write(
    color_slot: &mut [f32; 4],
    depth_slot: &mut f32,
    depth: f32,
    color: &[f32; 4],
) -> bool {
    if depth < *depth_slot {
        *depth_slot = depth;
        *color_slot = *color;
        true
    } else {
        false
    }
}

/// 在一段连续的行（行带）上按提交顺序光栅化所有三角形
///
/// `color_rows` / `depth_rows` 从第 `first_row` 行开始，长度为 width 的整数倍。
/// 串行策略把整幅图像当作一个行带调用本函数。
pub fn rasterize_rows(
    triangles: &[ProjectedTriangle],
    color_rows: &mut [[f32; 4]],
    depth_rows: &mut [f32],
    first_row: usize,
    width: usize,
    height: usize,
    perspective_correct: bool,
) -> usize {
    if width == 0 {
        return 0;
    }
    let band_rows = depth_rows.len() / width;
    if band_rows == 0 {
        return 0;
    }
    let last_row = first_row + band_rows - 1;
    let mut written = 0;

    for triangle in triangles {
        let bbox = &triangle.bbox;
        if bbox.max_y < first_row || bbox.min_y > last_row {
            continue;
        }
        let row_start = bbox.min_y.max(first_row);
        let row_end = bbox.max_y.min(last_row);

        for j in row_start..=row_end {
            let row_offset = (j - first_row) * width;
            for i in bbox.min_x..=bbox.max_x {
                let Some(depth) = sample_depth(triangle, i, j, width, height, perspective_correct)
                else {
                    continue;
                };
                let index = row_offset + i;
                if depth_test_and_write(
                    &mut color_rows[index],
                    &mut depth_rows[index],
                    depth,
                    &triangle.color,
                ) {
                    written += 1;
                }
            }
        }
    }

    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rasterizer::triangle_data::BoundingBox;
    use approx::assert_relative_eq;

    /// 覆盖左下角的直角三角形，深度在 a/b/c 处分别为 1/2/3
    fn corner_triangle() -> ProjectedTriangle {
        let screen = [
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 1.0),
            Point2::new(1.0, 0.0),
        ];
        ProjectedTriangle {
            screen,
            depth: [1.0, 2.0, 3.0],
            color: [0.0, 0.0, 1.0, 1.0],
            bbox: BoundingBox::from_screen(&screen, 4, 4).unwrap(),
        }
    }

    #[test]
    fn sample_depth_interpolates_inside_only() {
        let tri = corner_triangle();
        assert_relative_eq!(sample_depth(&tri, 0, 0, 4, 4, false).unwrap(), 1.0);
        // (0.25, 0.5): u = 0.25, v = 0.5, w = 0.25
        assert_relative_eq!(sample_depth(&tri, 1, 2, 4, 4, false).unwrap(), 2.0, epsilon = 1e-6);
        assert!(sample_depth(&tri, 3, 3, 4, 4, false).is_none());
    }

    #[test]
    fn depth_test_requires_strictly_nearer() {
        let mut color = [0.0; 4];
        let mut depth = 5.0;
        assert!(depth_test_and_write(&mut color, &mut depth, 4.0, &[1.0; 4]));
        assert!(!depth_test_and_write(&mut color, &mut depth, 4.0, &[0.5; 4]));
        assert_eq!((color, depth), ([1.0; 4], 4.0));
    }

    #[test]
    fn band_offsets_match_full_frame() {
        let tri = corner_triangle();
        let (width, height) = (4, 4);

        let mut full_color = vec![[0.0; 4]; width * height];
        let mut full_depth = vec![1e9; width * height];
        rasterize_rows(&[tri], &mut full_color, &mut full_depth, 0, width, height, false);

        let mut band_color = vec![[0.0; 4]; width * 2];
        let mut band_depth = vec![1e9; width * 2];
        let written = rasterize_rows(&[tri], &mut band_color, &mut band_depth, 2, width, height, false);

        assert!(written > 0);
        assert_eq!(&band_depth[..], &full_depth[2 * width..]);
        assert_eq!(&band_color[..], &full_color[2 * width..]);
    }
}
