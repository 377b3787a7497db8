use crate::core::frame_buffer::FrameBuffer;
use crate::core::geometry_store::{GeometryError, GeometryStore, TriangleBatch};
use crate::core::rasterizer::{Rasterizer, RenderStats};
use crate::geometry::camera::Camera;
use crate::io::render_settings::RenderSettings;
use log::{info, warn};
use nalgebra::Point3;

/// 渲染器门面：持有几何存储和光栅化器，对外提供逐帧渲染接口
pub struct Renderer {
    store: GeometryStore,
    rasterizer: Rasterizer,
    last_stats: RenderStats,
}

impl Renderer {
    pub fn new(settings: &RenderSettings) -> Self {
        let options = settings.raster_options();
        info!(
            "初始化渲染器: {}x{}, 容量 {} 个三角形, 策略 {}",
            options.width,
            options.height,
            settings.max_triangles,
            options.strategy.as_str()
        );
        Self {
            store: GeometryStore::new(settings.max_triangles),
            rasterizer: Rasterizer::new(options, settings.max_triangles),
            last_stats: RenderStats::default(),
        }
    }

    /// 替换全部三角形；失败时保留之前的数据
    pub fn set_triangles(
        &mut self,
        vertices: &[[[f32; 3]; 3]],
        colors: &[[f32; 3]],
    ) -> Result<(), GeometryError> {
        match self.store.set_triangles(vertices, colors) {
            Ok(()) => {
                info!("已载入 {} 个三角形", self.store.count());
                Ok(())
            }
            Err(e) => {
                warn!("三角形更新被拒绝: {}", e);
                Err(e)
            }
        }
    }

    pub fn set_batch(&mut self, batch: &TriangleBatch) -> Result<(), GeometryError> {
        self.set_triangles(&batch.vertices, &batch.colors)
    }

    pub fn triangle_count(&self) -> usize {
        self.store.count()
    }

    pub fn geometry(&self) -> &GeometryStore {
        &self.store
    }

    /// 以给定相机位姿渲染一帧，俯仰角会被钳制
    pub fn render(
        &mut self,
        time: f32,
        camera_position: Point3<f32>,
        camera_pitch: f32,
        camera_yaw: f32,
    ) -> RenderStats {
        let camera = Camera::new(camera_position, camera_pitch, camera_yaw);
        self.render_camera(time, &camera)
    }

    pub fn render_camera(&mut self, time: f32, camera: &Camera) -> RenderStats {
        self.last_stats = self.rasterizer.render(time, camera, &self.store);
        self.last_stats
    }

    pub fn frame_buffer(&self) -> &FrameBuffer {
        &self.rasterizer.frame_buffer
    }

    pub fn last_stats(&self) -> &RenderStats {
        &self.last_stats
    }

    /// 清空场景
    pub fn clear_triangles(&mut self) {
        self.store.clear();
        info!("场景已清空");
    }

    /// 应用新设置。容量变化时重建存储，放不下的旧数据会被清空
    pub fn apply_settings(&mut self, settings: &RenderSettings) {
        let options = settings.raster_options();
        let current = self.rasterizer.options();
        if current.strategy != options.strategy {
            info!(
                "光栅化策略切换: {} -> {}",
                current.strategy.as_str(),
                options.strategy.as_str()
            );
        }
        self.rasterizer.set_options(options);

        if settings.max_triangles != self.store.capacity() {
            let mut store = GeometryStore::new(settings.max_triangles);
            if self.store.count() <= settings.max_triangles {
                let (vertices, colors): (Vec<[[f32; 3]; 3]>, Vec<[f32; 3]>) = self
                    .store
                    .iter()
                    .map(|t| {
                        (
                            [t.a, t.b, t.c].map(|p| [p.x, p.y, p.z]),
                            [t.color.x, t.color.y, t.color.z],
                        )
                    })
                    .unzip();
                if let Err(e) = store.set_triangles(&vertices, &colors) {
                    warn!("迁移三角形到新存储失败: {}", e);
                }
            } else {
                warn!(
                    "新容量 {} 小于当前三角形数 {}, 场景已清空",
                    settings.max_triangles,
                    self.store.count()
                );
            }
            self.store = store;
        }
    }
}
