use nalgebra::{Point3, Vector3};
use thiserror::Error;

/// 默认三角形容量上限
pub const DEFAULT_MAX_TRIANGLES: usize = 4096;

/// 几何数据更新失败的原因，任何错误都会使整批更新被拒绝
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("三角形数量超出容量: 请求 {requested}, 上限 {capacity}")]
    CapacityExceeded { requested: usize, capacity: usize },
    #[error("顶点数组与颜色数组长度不一致: {vertices} 个三角形, {colors} 个颜色")]
    LengthMismatch { vertices: usize, colors: usize },
    #[error("第 {index} 个三角形包含非有限的顶点坐标")]
    NonFiniteVertex { index: usize },
}

/// 单个三角形的只读视图
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub a: Point3<f32>,
    pub b: Point3<f32>,
    pub c: Point3<f32>,
    /// 平面颜色，分量位于 [0,1]
    pub color: Vector3<f32>,
}

/// 批量三角形数据，作为 `set_triangles` 的输入格式（N×3×3 顶点, N×3 颜色）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleBatch {
    pub vertices: Vec<[[f32; 3]; 3]>,
    pub colors: Vec<[f32; 3]>,
}

impl TriangleBatch {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(capacity),
            colors: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, a: [f32; 3], b: [f32; 3], c: [f32; 3], color: [f32; 3]) {
        self.vertices.push([a, b, c]);
        self.colors.push(color);
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// 三角形几何存储（SoA布局）
///
/// 顶点与颜色分别存放在各自的连续数组中，容量在构造时一次性分配。
/// 替换只能通过 `&mut self` 进行，因此渲染中的帧不会看到新旧数据的混合。
#[derive(Debug, Clone)]
pub struct GeometryStore {
    positions: Vec<[Point3<f32>; 3]>,
    colors: Vec<Vector3<f32>>,
    max_triangles: usize,
}

impl GeometryStore {
    pub fn new(max_triangles: usize) -> Self {
        Self {
            positions: Vec::with_capacity(max_triangles),
            colors: Vec::with_capacity(max_triangles),
            max_triangles,
        }
    }

    /// 整体替换当前三角形集合；校验失败时存储保持不变
    pub fn set_triangles(
        &mut self,
        vertices: &[[[f32; 3]; 3]],
        colors: &[[f32; 3]],
    ) -> Result<(), GeometryError> {
        if vertices.len() > self.max_triangles {
            return Err(GeometryError::CapacityExceeded {
                requested: vertices.len(),
                capacity: self.max_triangles,
            });
        }
        if vertices.len() != colors.len() {
            return Err(GeometryError::LengthMismatch {
                vertices: vertices.len(),
                colors: colors.len(),
            });
        }
        if let Some(index) = vertices
            .iter()
            .position(|tri| tri.iter().flatten().any(|v| !v.is_finite()))
        {
            return Err(GeometryError::NonFiniteVertex { index });
        }

        self.positions.clear();
        self.colors.clear();
        self.positions.extend(
            vertices
                .iter()
                .map(|[a, b, c]| [Point3::from(*a), Point3::from(*b), Point3::from(*c)]),
        );
        self.colors.extend(colors.iter().map(|rgb| {
            // NaN 分量按 0 处理
            Vector3::from(*rgb).map(|x| if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) })
        }));
        Ok(())
    }

    pub fn set_batch(&mut self, batch: &TriangleBatch) -> Result<(), GeometryError> {
        self.set_triangles(&batch.vertices, &batch.colors)
    }

    /// 当前三角形数量
    pub fn count(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_triangles
    }

    pub fn clear(&mut self) {
        self.positions.clear();
        self.colors.clear();
    }

    pub fn positions(&self) -> &[[Point3<f32>; 3]] {
        &self.positions
    }

    pub fn colors(&self) -> &[Vector3<f32>] {
        &self.colors
    }

    pub fn triangle(&self, index: usize) -> Option<Triangle> {
        let [a, b, c] = *self.positions.get(index)?;
        Some(Triangle {
            a,
            b,
            c,
            color: self.colors[index],
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = Triangle> + '_ {
        (0..self.count()).filter_map(move |index| self.triangle(index))
    }
}

impl Default for GeometryStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TRIANGLES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(n: usize) -> TriangleBatch {
        let mut batch = TriangleBatch::with_capacity(n);
        for i in 0..n {
            let z = 1.0 + i as f32;
            batch.push([0.0, 0.0, z], [1.0, 0.0, z], [0.0, 1.0, z], [0.5, 0.5, 0.5]);
        }
        batch
    }

    #[test]
    fn set_then_count_round_trips() {
        let mut store = GeometryStore::new(8);
        let input = batch(5);
        store.set_batch(&input).unwrap();
        assert_eq!(store.count(), 5);
        let third = store.triangle(2).unwrap();
        assert_eq!(third.a, Point3::new(0.0, 0.0, 3.0));
        assert_eq!(store.iter().count(), 5);
        assert!(store.triangle(5).is_none());
    }

    #[test]
    fn full_capacity_is_accepted() {
        let mut store = GeometryStore::new(4);
        assert!(store.set_batch(&batch(4)).is_ok());
        assert_eq!(store.count(), 4);
    }

    #[test]
    fn capacity_exceeded_keeps_previous_set() {
        let mut store = GeometryStore::new(4);
        store.set_batch(&batch(3)).unwrap();
        let err = store.set_batch(&batch(5)).unwrap_err();
        assert_eq!(
            err,
            GeometryError::CapacityExceeded {
                requested: 5,
                capacity: 4
            }
        );
        assert_eq!(store.count(), 3);
        assert_eq!(store.triangle(2).unwrap().a.z, 3.0);
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let mut store = GeometryStore::new(4);
        let mut input = batch(2);
        input.colors.pop();
        assert!(matches!(
            store.set_batch(&input),
            Err(GeometryError::LengthMismatch { vertices: 2, colors: 1 })
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn non_finite_vertices_are_rejected() {
        let mut store = GeometryStore::new(4);
        store.set_batch(&batch(1)).unwrap();
        let mut input = batch(3);
        input.vertices[1][2][0] = f32::INFINITY;
        assert_eq!(
            store.set_batch(&input),
            Err(GeometryError::NonFiniteVertex { index: 1 })
        );
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn colors_are_clamped_into_unit_range() {
        let mut store = GeometryStore::new(1);
        store
            .set_triangles(&[[[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]], &[[1.5, -0.2, f32::NAN]])
            .unwrap();
        assert_eq!(store.colors()[0], Vector3::new(1.0, 0.0, 0.0));
    }
}
