use crate::core::frame_buffer::FrameBuffer;
use rayon::prelude::*;

/// 把 [0,1] 浮点颜色分量转换为 u8
#[inline]
pub fn color_to_u8(value: f32) -> u8 {
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}

/// 按通道数导出字节，flip_y 为真时第0行放在最后（屏幕 y 向上，图片 y 向下）
fn export_bytes(frame_buffer: &FrameBuffer, channels: usize, flip_y: bool) -> Vec<u8> {
    let (width, height) = (frame_buffer.width, frame_buffer.height);
    let mut bytes = vec![0u8; width * height * channels];
    if width == 0 || height == 0 {
        return bytes;
    }
    let colors = frame_buffer.color_buffer();

    bytes
        .par_chunks_mut(width * channels)
        .enumerate()
        .for_each(|(out_row, row_bytes)| {
            let src_row = if flip_y { height - 1 - out_row } else { out_row };
            let src = &colors[src_row * width..(src_row + 1) * width];
            for (pixel, color) in row_bytes.chunks_exact_mut(channels).zip(src) {
                for (byte, value) in pixel.iter_mut().zip(color) {
                    *byte = color_to_u8(*value);
                }
            }
        });

    bytes
}

/// RGB8 字节，用于保存PNG
pub fn to_rgb8(frame_buffer: &FrameBuffer, flip_y: bool) -> Vec<u8> {
    export_bytes(frame_buffer, 3, flip_y)
}

/// RGBA8 字节，用于上传纹理
pub fn to_rgba8(frame_buffer: &FrameBuffer, flip_y: bool) -> Vec<u8> {
    export_bytes(frame_buffer, 4, flip_y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::frame_buffer::Background;

    #[test]
    fn color_conversion_rounds_and_clamps() {
        assert_eq!(color_to_u8(0.0), 0);
        assert_eq!(color_to_u8(1.0), 255);
        assert_eq!(color_to_u8(0.5), 128);
        assert_eq!(color_to_u8(-3.0), 0);
        assert_eq!(color_to_u8(7.0), 255);
    }

    #[test]
    fn flip_moves_bottom_row_to_the_end() {
        let mut fb = FrameBuffer::new(2, 3);
        // 渐变背景的绿色分量随行号增加
        fb.clear(&Background::AnimatedGradient, 0.0, 1e9);

        let straight = to_rgba8(&fb, false);
        let flipped = to_rgba8(&fb, true);
        assert_eq!(straight.len(), 2 * 3 * 4);
        let row_len = 2 * 4;
        assert_eq!(&flipped[..row_len], &straight[2 * row_len..]);
        assert_eq!(&flipped[2 * row_len..], &straight[..row_len]);
        assert!(straight.chunks_exact(4).all(|px| px[3] == 255));
    }

    #[test]
    fn rgb_export_drops_alpha() {
        let mut fb = FrameBuffer::new(4, 4);
        fb.clear(&Background::Solid([1.0, 0.0, 0.5]), 0.0, 1e9);
        let rgb = to_rgb8(&fb, true);
        assert_eq!(rgb.len(), 4 * 4 * 3);
        assert_eq!(&rgb[..3], &[255, 0, 128]);
    }
}
