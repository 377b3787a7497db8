use crate::core::geometry_store::TriangleBatch;
use crate::geometry::camera::Camera;
use crate::geometry::culling::signed_area;
use crate::geometry::transform::Projection;
use crate::io::obj_loader::load_obj_triangles;
use crate::io::render_settings::RenderSettings;
use log::info;
use nalgebra::{Point3, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// 随机场景参数
#[derive(Debug, Clone, PartialEq)]
pub struct SceneParams {
    pub triangle_count: usize,
    pub seed: u64,
    /// 三角形中心在相机左右/上下方向的分布半径
    pub spread: f32,
    /// 顶点相对中心的最大偏移
    pub triangle_size: f32,
    /// 三角形中心离相机的最近距离
    pub min_distance: f32,
    /// 三角形中心沿视线方向的分布深度
    pub depth_range: f32,
}

impl Default for SceneParams {
    fn default() -> Self {
        Self {
            triangle_count: 256,
            seed: 0,
            spread: 4.0,
            triangle_size: 1.0,
            min_distance: 2.0,
            depth_range: 10.0,
        }
    }
}

impl SceneParams {
    pub fn from_settings(settings: &RenderSettings) -> Self {
        Self {
            triangle_count: settings.triangle_count,
            seed: settings.seed,
            spread: settings.spread,
            triangle_size: settings.triangle_size,
            min_distance: settings.min_distance,
            depth_range: settings.depth_range,
        }
    }
}

/// 在相机前方生成随机三角形场景，颜色随机，绕序统一为起始视角下的正面
pub fn random_scene(params: &SceneParams, camera: &Camera, projection: &Projection) -> TriangleBatch {
    let mut rng = StdRng::seed_from_u64(params.seed);
    let (forward, right, up) = (camera.forward(), camera.right(), camera.up());
    let mut batch = TriangleBatch::with_capacity(params.triangle_count);

    for _ in 0..params.triangle_count {
        let distance = params.min_distance + rng.random::<f32>() * params.depth_range;
        let center = camera.position
            + forward * distance
            + right * rng.random_range(-params.spread..=params.spread)
            + up * rng.random_range(-params.spread..=params.spread);

        let mut vertex = || -> [f32; 3] {
            let offset = Vector3::new(
                rng.random_range(-1.0_f32..=1.0),
                rng.random_range(-1.0_f32..=1.0),
                rng.random_range(-1.0_f32..=1.0),
            ) * params.triangle_size;
            let p = center + offset;
            [p.x, p.y, p.z]
        };
        let (a, b, c) = (vertex(), vertex(), vertex());
        let color = [rng.random::<f32>(), rng.random::<f32>(), rng.random::<f32>()];
        batch.push(a, b, c, color);
    }

    normalize_winding(&mut batch, camera, projection);
    batch
}

/// 以给定相机投影每个三角形，若投影面积为正（背面）则交换 b、c，使其在该视角下朝前
///
/// 返回被翻转的三角形数量。
pub fn normalize_winding(batch: &mut TriangleBatch, camera: &Camera, projection: &Projection) -> usize {
    let mut flipped = 0;
    for tri in batch.vertices.iter_mut() {
        let [a, b, c] = tri.map(|v| camera.world_to_screen(&Point3::from(v), *projection));
        if signed_area(&a, &b, &c) > 0.0 {
            tri.swap(1, 2);
            flipped += 1;
        }
    }
    flipped
}

/// 场景来源
#[derive(Debug, Clone, PartialEq)]
pub enum SceneSource {
    Random { seed: u64 },
    Obj { path: String },
}

/// 一次加载得到的场景：三角形数据 + 起始相机
#[derive(Debug, Clone)]
pub struct Scene {
    pub batch: TriangleBatch,
    pub start_camera: Camera,
    pub source: SceneSource,
}

impl Scene {
    /// 根据设置构建场景：指定了OBJ则加载模型，否则生成随机三角形
    pub fn from_settings(settings: &RenderSettings) -> Result<Self, String> {
        let start_camera = settings.start_camera()?;
        let projection = settings.projection();

        let (batch, source) = match &settings.obj {
            Some(path) => {
                let mut batch = load_obj_triangles(path, settings, &start_camera)?;
                let flipped = normalize_winding(&mut batch, &start_camera, &projection);
                info!("模型三角形绕序统一完成, 翻转 {} 个", flipped);
                (batch, SceneSource::Obj { path: path.clone() })
            }
            None => {
                let params = SceneParams::from_settings(settings);
                info!(
                    "生成随机场景: {} 个三角形, 种子 {}",
                    params.triangle_count, params.seed
                );
                (
                    random_scene(&params, &start_camera, &projection),
                    SceneSource::Random { seed: params.seed },
                )
            }
        };

        Ok(Self {
            batch,
            start_camera,
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::culling::{Facing, facing};

    fn projection() -> Projection {
        Projection::new(60.0, 1.0, 0.1, false)
    }

    #[test]
    fn same_seed_gives_same_scene() {
        let params = SceneParams {
            triangle_count: 32,
            seed: 99,
            ..Default::default()
        };
        let camera = Camera::default();
        let first = random_scene(&params, &camera, &projection());
        let second = random_scene(&params, &camera, &projection());
        assert_eq!(first, second);
        assert_eq!(first.len(), 32);

        let other = random_scene(&SceneParams { seed: 100, ..params }, &camera, &projection());
        assert_ne!(first, other);
    }

    #[test]
    fn generated_triangles_face_start_camera() {
        let params = SceneParams {
            triangle_count: 64,
            seed: 5,
            ..Default::default()
        };
        let camera = Camera::new(Point3::new(1.0, 2.0, -3.0), 0.2, 0.7);
        let batch = random_scene(&params, &camera, &projection());
        let view = camera.view(projection());
        for tri in &batch.vertices {
            let [a, b, c] = tri.map(|v| view.world_to_screen(&Point3::from(v)));
            assert_ne!(facing(&a, &b, &c), Facing::Back);
        }
        assert!(batch.colors.iter().flatten().all(|c| (0.0..=1.0).contains(c)));
    }

    #[test]
    fn normalize_winding_flips_back_faces() {
        let mut batch = TriangleBatch::default();
        // 在默认相机下投影面积为正
        batch.push([-0.5, -0.5, 2.0], [0.0, 0.5, 2.0], [0.5, -0.5, 2.0], [1.0, 0.0, 0.0]);
        let flipped = normalize_winding(&mut batch, &Camera::default(), &projection());
        assert_eq!(flipped, 1);
        assert_eq!(batch.vertices[0][1], [0.5, -0.5, 2.0]);
        assert_eq!(normalize_winding(&mut batch, &Camera::default(), &projection()), 0);
    }
}
