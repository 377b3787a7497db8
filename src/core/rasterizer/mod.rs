//! # 三角形光栅化模块
//!
//! 每帧：清除帧缓冲 -> 并行投影与剔除 -> 按所选策略扫描像素并做深度测试。

pub mod pixel_processor;
pub mod triangle_data;
pub mod visibility;

use crate::core::frame_buffer::{Background, DEFAULT_CLEAR_DEPTH, FrameBuffer};
use crate::core::geometry_store::GeometryStore;
use crate::geometry::camera::{Camera, CameraView};
use crate::geometry::transform::Projection;
use log::debug;
use pixel_processor::rasterize_rows;
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use visibility::VisibilityBuffer;

pub use triangle_data::{BoundingBox, ProjectedTriangle, Rejection};

/// 光栅化并行策略，三者输出逐位一致
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RasterStrategy {
    /// 单线程参考实现
    Serial,
    /// 图像按行带切分，每个任务独占一段行并串行扫描全部三角形
    #[default]
    RowParallel,
    /// 三角形并行，深度测试通过原子取最小完成，随后统一解析颜色
    TriangleParallel,
}

impl RasterStrategy {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "serial" => Some(Self::Serial),
            "row_parallel" | "rows" => Some(Self::RowParallel),
            "triangle_parallel" | "triangles" => Some(Self::TriangleParallel),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Serial => "serial",
            Self::RowParallel => "row_parallel",
            Self::TriangleParallel => "triangle_parallel",
        }
    }
}

/// 光栅化参数，由 RenderSettings 派生
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterOptions {
    pub width: usize,
    pub height: usize,
    pub projection: Projection,
    pub backface_culling: bool,
    pub perspective_correct_depth: bool,
    pub clear_depth: f32,
    pub background: Background,
    pub strategy: RasterStrategy,
    pub rows_per_band: usize,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
            projection: Projection::new(60.0, 1.0, 0.1, false),
            backface_culling: true,
            perspective_correct_depth: false,
            clear_depth: DEFAULT_CLEAR_DEPTH,
            background: Background::default(),
            strategy: RasterStrategy::default(),
            rows_per_band: 8,
        }
    }
}

/// 单帧统计
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RenderStats {
    /// 存储中的三角形数
    pub submitted: usize,
    pub culled_backface: usize,
    pub degenerate: usize,
    pub offscreen: usize,
    /// 进入像素扫描的三角形数
    pub rasterized: usize,
    /// 帧结束时被几何体覆盖的像素数
    pub covered_pixels: usize,
    pub elapsed: Duration,
}

/// 光栅化器：拥有帧缓冲区和每帧复用的临时数据
pub struct Rasterizer {
    pub frame_buffer: FrameBuffer,
    options: RasterOptions,
    /// 本帧通过剔除的三角形，顺序与存储下标一致；容量一次分配、逐帧复用
    projected: Vec<ProjectedTriangle>,
    visibility: Option<VisibilityBuffer>,
}

impl Rasterizer {
    pub fn new(options: RasterOptions, max_triangles: usize) -> Self {
        Self {
            frame_buffer: FrameBuffer::new(options.width, options.height),
            options,
            projected: Vec::with_capacity(max_triangles),
            visibility: None,
        }
    }

    pub fn options(&self) -> &RasterOptions {
        &self.options
    }

    /// 更新参数，分辨率变化时重新分配缓冲区
    pub fn set_options(&mut self, options: RasterOptions) {
        self.frame_buffer.resize(options.width, options.height);
        self.options = options;
    }

    /// 渲染一帧。time 只影响背景，不参与可见性计算
    pub fn render(&mut self, time: f32, camera: &Camera, store: &GeometryStore) -> RenderStats {
        let start = Instant::now();
        let options = self.options;
        let view = camera.view(options.projection);

        self.frame_buffer
            .clear(&options.background, time, options.clear_depth);

        let mut stats = self.prepare(&view, store);

        match options.strategy {
            RasterStrategy::Serial => self.rasterize_serial(),
            RasterStrategy::RowParallel => self.rasterize_row_parallel(),
            RasterStrategy::TriangleParallel => self.rasterize_triangle_parallel(),
        }

        stats.covered_pixels = self.frame_buffer.covered_pixels(options.clear_depth);
        stats.elapsed = start.elapsed();

        debug!(
            "帧完成: {} 个三角形, 背面剔除 {}, 退化 {}, 屏幕外 {}, 光栅化 {}, 覆盖像素 {}, 耗时 {:?}",
            stats.submitted,
            stats.culled_backface,
            stats.degenerate,
            stats.offscreen,
            stats.rasterized,
            stats.covered_pixels,
            stats.elapsed
        );

        stats
    }

    /// 并行投影所有三角形，剔除背面/退化/屏幕外的三角形
    fn prepare(&mut self, view: &CameraView, store: &GeometryStore) -> RenderStats {
        let options = &self.options;
        let culled = AtomicUsize::new(0);
        let degenerate = AtomicUsize::new(0);
        let offscreen = AtomicUsize::new(0);

        self.projected.clear();
        self.projected.par_extend(
            store
                .positions()
                .par_iter()
                .zip(store.colors().par_iter())
                .filter_map(|(vertices, color)| {
                    match ProjectedTriangle::setup(
                        vertices,
                        color,
                        view,
                        options.width,
                        options.height,
                        options.backface_culling,
                    ) {
                        Ok(triangle) => Some(triangle),
                        Err(rejection) => {
                            let counter = match rejection {
                                Rejection::Backface => &culled,
                                Rejection::Degenerate => &degenerate,
                                Rejection::Offscreen => &offscreen,
                            };
                            counter.fetch_add(1, Ordering::Relaxed);
                            None
                        }
                    }
                }),
        );

        RenderStats {
            submitted: store.count(),
            culled_backface: culled.into_inner(),
            degenerate: degenerate.into_inner(),
            offscreen: offscreen.into_inner(),
            rasterized: self.projected.len(),
            ..Default::default()
        }
    }

    fn rasterize_serial(&mut self) {
        let (width, height) = (self.frame_buffer.width, self.frame_buffer.height);
        let perspective_correct = self.options.perspective_correct_depth;
        let (color, depth) = self.frame_buffer.buffers_mut();
        rasterize_rows(
            &self.projected,
            color,
            depth,
            0,
            width,
            height,
            perspective_correct,
        );
    }

    fn rasterize_row_parallel(&mut self) {
        let (width, height) = (self.frame_buffer.width, self.frame_buffer.height);
        if width == 0 || height == 0 {
            return;
        }
        let perspective_correct = self.options.perspective_correct_depth;
        let rows_per_band = self.options.rows_per_band.max(1);
        let band_len = rows_per_band * width;
        let triangles = &self.projected;
        let (color, depth) = self.frame_buffer.buffers_mut();

        color
            .par_chunks_mut(band_len)
            .zip(depth.par_chunks_mut(band_len))
            .enumerate()
            .for_each(|(band, (color_rows, depth_rows))| {
                rasterize_rows(
                    triangles,
                    color_rows,
                    depth_rows,
                    band * rows_per_band,
                    width,
                    height,
                    perspective_correct,
                );
            });
    }

    fn rasterize_triangle_parallel(&mut self) {
        let (width, height) = (self.frame_buffer.width, self.frame_buffer.height);
        let perspective_correct = self.options.perspective_correct_depth;
        let num_pixels = self.frame_buffer.num_pixels();

        let visibility = self
            .visibility
            .get_or_insert_with(|| VisibilityBuffer::new(num_pixels));
        visibility.resize(num_pixels);
        visibility.clear();
        visibility.rasterize(&self.projected, width, height, perspective_correct);

        let (color, depth) = self.frame_buffer.buffers_mut();
        visibility.resolve(&self.projected, color, depth);
    }
}
