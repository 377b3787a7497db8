use super::pixel_processor::sample_depth;
use super::triangle_data::ProjectedTriangle;
use rayon::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};

/// 空像素标记，大于任何打包值
const EMPTY: u64 = u64::MAX;

/// 把 (深度, 三角形序号) 打包成可直接比较大小的 u64
///
/// 深度恒为正数，其 IEEE 位模式与数值同序；低 32 位的序号让相同深度时序号小者胜出。
#[inline(always)]
fn pack(depth: f32, slot: u32) -> u64 {
    ((depth.to_bits() as u64) << 32) | slot as u64
}

#[inline(always)]
fn unpack(word: u64) -> (f32, usize) {
    (f32::from_bits((word >> 32) as u32), (word & 0xFFFF_FFFF) as usize)
}

/// 可见性缓冲：按三角形并行时，用原子 fetch_min 完成“比较并取最小”的深度测试，
/// 颜色在所有三角形处理完毕后统一解析写入
pub struct VisibilityBuffer {
    words: Vec<AtomicU64>,
}

impl VisibilityBuffer {
    pub fn new(num_pixels: usize) -> Self {
        Self {
            words: (0..num_pixels).map(|_| AtomicU64::new(EMPTY)).collect(),
        }
    }

    pub fn resize(&mut self, num_pixels: usize) {
        if self.words.len() != num_pixels {
            *self = Self::new(num_pixels);
        }
    }

    pub fn clear(&self) {
        self.words
            .par_iter()
            .for_each(|word| word.store(EMPTY, Ordering::Relaxed));
    }

    #[inline]
    pub fn record(&self, pixel_index: usize, depth: f32, slot: u32) {
        self.words[pixel_index].fetch_min(pack(depth, slot), Ordering::Relaxed);
    }

    /// 三角形级并行光栅化；`slot` 为三角形在投影列表中的位置，与提交顺序一致
    pub fn rasterize(
        &self,
        triangles: &[ProjectedTriangle],
        width: usize,
        height: usize,
        perspective_correct: bool,
    ) {
        triangles
            .par_iter()
            .enumerate()
            .for_each(|(slot, triangle)| {
                triangle.bbox.for_each_pixel(|i, j| {
                    if let Some(depth) =
                        sample_depth(triangle, i, j, width, height, perspective_correct)
                    {
                        self.record(j * width + i, depth, slot as u32);
                    }
                });
            });
    }

    /// 把胜出的三角形写入颜色/深度缓冲，深度仍需小于清除值
    pub fn resolve(
        &self,
        triangles: &[ProjectedTriangle],
        color_buffer: &mut [[f32; 4]],
        depth_buffer: &mut [f32],
    ) {
        color_buffer
            .par_iter_mut()
            .zip(depth_buffer.par_iter_mut())
            .zip(self.words.par_iter())
            .for_each(|((color, depth_slot), word)| {
                let word = word.load(Ordering::Relaxed);
                if word == EMPTY {
                    return;
                }
                let (depth, slot) = unpack(word);
                if depth < *depth_slot {
                    *depth_slot = depth;
                    *color = triangles[slot].color;
                }
            });
    }
}
