use rayon::prelude::*;

/// 深度缓冲的默认清除值，大于任何合法的前向深度
pub const DEFAULT_CLEAR_DEPTH: f32 = 1e9;

/// 背景填充方式
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Background {
    /// 纯色背景（RGB，[0,1]）
    Solid([f32; 3]),
    /// 随时间变化的渐变：R 随列、G 随行、B = (sin(t)+1)/2
    AnimatedGradient,
}

impl Default for Background {
    fn default() -> Self {
        Background::Solid([0.0, 0.0, 0.0])
    }
}

impl Background {
    #[inline]
    fn color_at(&self, i: usize, j: usize, width: usize, height: usize, time: f32) -> [f32; 4] {
        match *self {
            Background::Solid([r, g, b]) => [r, g, b, 1.0],
            Background::AnimatedGradient => [
                i as f32 / width as f32,
                j as f32 / height as f32,
                (time.sin() + 1.0) * 0.5,
                1.0,
            ],
        }
    }
}

/// 帧缓冲区：RGBA浮点颜色 + 相机空间深度，按行主序存储，下标为 j * width + i
///
/// 第 0 行对应屏幕坐标 y = 0（图像底部），显示时的翻转由呈现端负责。
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    pub width: usize,
    pub height: usize,
    color_buffer: Vec<[f32; 4]>,
    /// 存储正深度值，数值越小表示越近
    depth_buffer: Vec<f32>,
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        let num_pixels = width * height;
        FrameBuffer {
            width,
            height,
            color_buffer: vec![[0.0, 0.0, 0.0, 1.0]; num_pixels],
            depth_buffer: vec![DEFAULT_CLEAR_DEPTH; num_pixels],
        }
    }

    /// 调整分辨率，内容被重置
    pub fn resize(&mut self, width: usize, height: usize) {
        if self.width == width && self.height == height {
            return;
        }
        *self = Self::new(width, height);
    }

    pub fn num_pixels(&self) -> usize {
        self.width * self.height
    }

    /// 清除颜色和深度，按行并行
    pub fn clear(&mut self, background: &Background, time: f32, clear_depth: f32) {
        let (width, height) = (self.width, self.height);
        if width == 0 {
            return;
        }

        self.depth_buffer
            .par_iter_mut()
            .for_each(|depth| *depth = clear_depth);

        self.color_buffer
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(j, row)| {
                for (i, pixel) in row.iter_mut().enumerate() {
                    *pixel = background.color_at(i, j, width, height, time);
                }
            });
    }

    #[inline]
    pub fn index(&self, i: usize, j: usize) -> usize {
        j * self.width + i
    }

    pub fn color_at(&self, i: usize, j: usize) -> [f32; 4] {
        self.color_buffer[self.index(i, j)]
    }

    pub fn depth_at(&self, i: usize, j: usize) -> f32 {
        self.depth_buffer[self.index(i, j)]
    }

    pub fn color_buffer(&self) -> &[[f32; 4]] {
        &self.color_buffer
    }

    pub fn depth_buffer(&self) -> &[f32] {
        &self.depth_buffer
    }

    /// 同时可变借用两个缓冲区，供光栅化按行带切分
    pub(crate) fn buffers_mut(&mut self) -> (&mut [[f32; 4]], &mut [f32]) {
        (&mut self.color_buffer, &mut self.depth_buffer)
    }

    /// 被几何体覆盖的像素数量（深度小于清除值）
    pub fn covered_pixels(&self, clear_depth: f32) -> usize {
        self.depth_buffer
            .par_iter()
            .filter(|&&depth| depth < clear_depth)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_fills_background_and_far_depth() {
        let mut fb = FrameBuffer::new(4, 3);
        fb.clear(&Background::Solid([0.2, 0.4, 0.6]), 0.0, 50.0);
        assert!(fb.color_buffer().iter().all(|c| *c == [0.2, 0.4, 0.6, 1.0]));
        assert!(fb.depth_buffer().iter().all(|&d| d == 50.0));
        assert_eq!(fb.covered_pixels(50.0), 0);
    }

    #[test]
    fn animated_gradient_follows_position_and_time() {
        let mut fb = FrameBuffer::new(4, 2);
        fb.clear(&Background::AnimatedGradient, 0.0, DEFAULT_CLEAR_DEPTH);
        assert_eq!(fb.color_at(0, 0), [0.0, 0.0, 0.5, 1.0]);
        assert_eq!(fb.color_at(2, 1), [0.5, 0.5, 0.5, 1.0]);
    }

    #[test]
    fn resize_reallocates_buffers() {
        let mut fb = FrameBuffer::new(2, 2);
        fb.resize(8, 5);
        assert_eq!(fb.num_pixels(), 40);
        assert_eq!(fb.color_buffer().len(), 40);
        assert_eq!(fb.index(3, 2), 19);
    }
}
