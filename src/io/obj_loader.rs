use crate::core::geometry_store::TriangleBatch;
use crate::geometry::camera::Camera;
use crate::io::render_settings::RenderSettings;
use log::{debug, info, warn};
use nalgebra::Point3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;

/// 没有材质时使用的默认漫反射颜色
const DEFAULT_DIFFUSE: [f32; 3] = [0.8, 0.8, 0.8];

/// 顶点集合的轴对齐包围盒
fn bounds(points: &[Point3<f32>]) -> Option<(Point3<f32>, Point3<f32>)> {
    let first = *points.first()?;
    Some(points.iter().fold((first, first), |(min, max), p| {
        (
            Point3::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z)),
            Point3::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z)),
        )
    }))
}

/// 把顶点平移缩放到以 `target` 为中心、半径为 `radius` 的球内
pub fn fit_to_sphere(points: &mut [Point3<f32>], target: &Point3<f32>, radius: f32) {
    let Some((min, max)) = bounds(points) else {
        return;
    };
    let center = nalgebra::center(&min, &max);
    let extent = points
        .iter()
        .map(|p| (p - center).norm())
        .fold(0.0_f32, f32::max);
    let scale = if extent > 1e-6 { radius / extent } else { 1.0 };

    for p in points.iter_mut() {
        *p = target + (*p - center) * scale;
    }
}

/// 加载 OBJ 模型，三角化后放到相机前方，输出平面着色三角形
pub fn load_obj_triangles<P: AsRef<Path>>(
    obj_path: P,
    settings: &RenderSettings,
    camera: &Camera,
) -> Result<TriangleBatch, String> {
    let obj_path_ref = obj_path.as_ref();
    info!("加载 OBJ 文件: {:?}", obj_path_ref);

    let load_options = tobj::LoadOptions {
        triangulate: true,   // 将所有面转换为三角形
        single_index: false, // 只用到位置索引
        ignore_points: true, // 忽略点元素
        ignore_lines: true,  // 忽略线元素
    };

    let (models, materials_result) =
        tobj::load_obj(obj_path_ref, &load_options).map_err(|e| format!("加载 OBJ 失败: {}", e))?;

    let materials = match materials_result {
        Ok(mats) => {
            info!("从 MTL 加载了 {} 个材质", mats.len());
            mats
        }
        Err(e) => {
            warn!("加载材质失败: {}, 使用默认颜色", e);
            Vec::new()
        }
    };

    let mut corners: Vec<Point3<f32>> = Vec::new();
    let mut face_colors: Vec<[f32; 3]> = Vec::new();
    let mut rng = StdRng::seed_from_u64(settings.seed);

    for model in &models {
        let mesh = &model.mesh;
        let material_color = mesh
            .material_id
            .and_then(|id| materials.get(id))
            .and_then(|mat| mat.diffuse)
            .unwrap_or(DEFAULT_DIFFUSE);

        debug!(
            "网格 '{}': {} 个顶点, {} 个三角形",
            model.name,
            mesh.positions.len() / 3,
            mesh.indices.len() / 3
        );

        for face in mesh.indices.chunks_exact(3) {
            let mut valid = true;
            let mut vertices = [Point3::origin(); 3];
            for (slot, &index) in vertices.iter_mut().zip(face) {
                let base = index as usize * 3;
                match mesh.positions.get(base..base + 3) {
                    Some(p) => *slot = Point3::new(p[0], p[1], p[2]),
                    None => valid = false,
                }
            }
            if !valid {
                warn!("网格 '{}' 中存在越界的顶点索引，跳过该面", model.name);
                continue;
            }
            corners.extend_from_slice(&vertices);

            let color = if settings.colorize {
                [rng.random(), rng.random(), rng.random()]
            } else {
                material_color
            };
            face_colors.push(color);
        }
    }

    if face_colors.is_empty() {
        return Err(format!("OBJ 文件中没有三角形: {:?}", obj_path_ref));
    }

    let distance = settings.min_distance + settings.model_radius;
    let target = camera.position + camera.forward() * distance;
    fit_to_sphere(&mut corners, &target, settings.model_radius);

    let mut batch = TriangleBatch::with_capacity(face_colors.len());
    for (tri, color) in corners.chunks_exact(3).zip(face_colors) {
        let [a, b, c] = [tri[0], tri[1], tri[2]].map(|p| [p.x, p.y, p.z]);
        batch.push(a, b, c, color);
    }

    info!(
        "模型加载完成: {} 个三角形, 中心 ({:.2}, {:.2}, {:.2}), 半径 {:.2}",
        batch.len(),
        target.x,
        target.y,
        target.z,
        settings.model_radius
    );

    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;
    use std::io::Write;

    fn model_center(batch: &TriangleBatch) -> Option<Vector3<f32>> {
        let points: Vec<Point3<f32>> = batch
            .vertices
            .iter()
            .flat_map(|tri| tri.iter().map(|v| Point3::new(v[0], v[1], v[2])))
            .collect();
        bounds(&points).map(|(min, max)| nalgebra::center(&min, &max).coords)
    }

    fn write_temp(name: &str, content: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("{}_{}", std::process::id(), name));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn fit_to_sphere_centers_and_scales() {
        let mut points = vec![Point3::new(10.0, 0.0, 0.0), Point3::new(14.0, 0.0, 0.0)];
        fit_to_sphere(&mut points, &Point3::new(0.0, 0.0, 5.0), 1.0);
        assert_relative_eq!(points[0], Point3::new(-1.0, 0.0, 5.0), epsilon = 1e-6);
        assert_relative_eq!(points[1], Point3::new(1.0, 0.0, 5.0), epsilon = 1e-6);
    }

    #[test]
    fn quad_is_triangulated_and_placed_in_front() {
        let path = write_temp(
            "quad.obj",
            "v -1 -1 0\nv 1 -1 0\nv 1 1 0\nv -1 1 0\nf 1 2 3 4\n",
        );
        let settings = RenderSettings::default();
        let camera = Camera::new(Point3::origin(), 0.0, 0.0);
        let batch = load_obj_triangles(&path, &settings, &camera).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.colors[0], DEFAULT_DIFFUSE);
        let center = model_center(&batch).unwrap();
        let expected = settings.min_distance + settings.model_radius;
        assert_relative_eq!(center, Vector3::new(0.0, 0.0, expected), epsilon = 1e-5);
    }

    #[test]
    fn colorize_is_deterministic_per_seed() {
        let path = write_temp("tri.obj", "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n");
        let settings = RenderSettings {
            colorize: true,
            seed: 9,
            ..Default::default()
        };
        let camera = Camera::new(Point3::origin(), 0.0, 0.0);
        let first = load_obj_triangles(&path, &settings, &camera).unwrap();
        let second = load_obj_triangles(&path, &settings, &camera).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(first.colors, second.colors);
    }

    #[test]
    fn missing_file_is_an_error() {
        let settings = RenderSettings::default();
        let camera = Camera::new(Point3::origin(), 0.0, 0.0);
        assert!(load_obj_triangles("does/not/exist.obj", &settings, &camera).is_err());
    }
}
