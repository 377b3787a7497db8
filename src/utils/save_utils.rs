use crate::core::frame_buffer::FrameBuffer;
use crate::utils::image_utils::to_rgb8;
use image::ColorType;
use log::{debug, info};
use std::path::{Path, PathBuf};

/// 保存RGB图像数据到PNG文件
pub fn save_image(path: &Path, data: &[u8], width: u32, height: u32) -> Result<(), String> {
    image::save_buffer(path, data, width, height, ColorType::Rgb8)
        .map_err(|e| format!("保存图像到 {} 时出错: {}", path.display(), e))?;
    info!("图像已保存到 {}", path.display());
    Ok(())
}

/// 把被覆盖像素的深度归一化到 [0,1]，未覆盖像素记为 NaN
pub fn normalize_depth(depth_buffer: &[f32], clear_depth: f32) -> Vec<f32> {
    let (min_depth, max_depth) = depth_buffer
        .iter()
        .filter(|d| d.is_finite() && **d < clear_depth)
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &d| {
            (lo.min(d), hi.max(d))
        });

    if min_depth > max_depth {
        debug!("深度图中没有被覆盖的像素");
        return vec![f32::NAN; depth_buffer.len()];
    }

    let range = max_depth - min_depth;
    let inv_range = if range > 1e-6 { 1.0 / range } else { 0.0 };
    debug!("归一化深度范围: [{:.3}, {:.3}]", min_depth, max_depth);

    depth_buffer
        .iter()
        .map(|&d| {
            if d.is_finite() && d < clear_depth {
                (d - min_depth) * inv_range
            } else {
                f32::NAN
            }
        })
        .collect()
}

/// JET 色图：0 为蓝，1 为红，非有限值输出黑色
pub fn apply_colormap_jet(normalized_depth: &[f32]) -> Vec<u8> {
    let mut result = vec![0u8; normalized_depth.len() * 3];

    for (pixel, &depth) in result.chunks_exact_mut(3).zip(normalized_depth) {
        if !depth.is_finite() {
            continue;
        }
        let value = depth.clamp(0.0, 1.0);

        let (r, g, b) = if value <= 0.25 {
            // 蓝 -> 青
            (0.0, value * 4.0, 1.0)
        } else if value <= 0.5 {
            // 青 -> 绿
            (0.0, 1.0, 1.0 - (value - 0.25) * 4.0)
        } else if value <= 0.75 {
            // 绿 -> 黄
            ((value - 0.5) * 4.0, 1.0, 0.0)
        } else {
            // 黄 -> 红
            (1.0, 1.0 - (value - 0.75) * 4.0, 0.0)
        };

        pixel[0] = (r * 255.0) as u8;
        pixel[1] = (g * 255.0) as u8;
        pixel[2] = (b * 255.0) as u8;
    }

    result
}

/// 深度缓冲转换为上下翻转后的 JET 伪彩色图
pub fn depth_to_rgb8(frame_buffer: &FrameBuffer, clear_depth: f32) -> Vec<u8> {
    let normalized = normalize_depth(frame_buffer.depth_buffer(), clear_depth);
    let colored = apply_colormap_jet(&normalized);
    let row_len = frame_buffer.width * 3;
    if row_len == 0 {
        return colored;
    }
    colored
        .chunks_exact(row_len)
        .rev()
        .flatten()
        .copied()
        .collect()
}

/// 带时间戳的截图文件名，例如 `screenshot_20240101_120000_123.png`
pub fn timestamped_name(prefix: &str) -> String {
    format!(
        "{}_{}.png",
        prefix,
        chrono::Local::now().format("%Y%m%d_%H%M%S_%3f")
    )
}

/// 保存一帧的颜色图和可选的深度图，返回写出的文件路径
pub fn save_frame(
    frame_buffer: &FrameBuffer,
    output_dir: &str,
    base_name: &str,
    clear_depth: f32,
    save_depth: bool,
) -> Result<Vec<PathBuf>, String> {
    std::fs::create_dir_all(output_dir)
        .map_err(|e| format!("创建输出目录 {} 失败: {}", output_dir, e))?;

    let width = frame_buffer.width as u32;
    let height = frame_buffer.height as u32;
    let mut written = Vec::new();

    let color_path = Path::new(output_dir).join(format!("{}_color.png", base_name));
    save_image(&color_path, &to_rgb8(frame_buffer, true), width, height)?;
    written.push(color_path);

    if save_depth {
        let depth_path = Path::new(output_dir).join(format!("{}_depth.png", base_name));
        save_image(
            &depth_path,
            &depth_to_rgb8(frame_buffer, clear_depth),
            width,
            height,
        )?;
        written.push(depth_path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::frame_buffer::Background;
    use approx::assert_relative_eq;

    #[test]
    fn normalize_ignores_uncovered_pixels() {
        let depth = [1e9, 2.0, 4.0, 3.0];
        let normalized = normalize_depth(&depth, 1e9);
        assert!(normalized[0].is_nan());
        assert_relative_eq!(normalized[1], 0.0);
        assert_relative_eq!(normalized[2], 1.0);
        assert_relative_eq!(normalized[3], 0.5);
    }

    #[test]
    fn normalize_flat_and_empty_buffers() {
        let flat = normalize_depth(&[2.0, 2.0], 1e9);
        assert!(flat.iter().all(|d| *d == 0.0));
        let empty = normalize_depth(&[1e9, 1e9], 1e9);
        assert!(empty.iter().all(|d| d.is_nan()));
    }

    #[test]
    fn jet_endpoints() {
        let rgb = apply_colormap_jet(&[0.0, 0.5, 1.0, f32::NAN]);
        assert_eq!(&rgb[0..3], &[0, 0, 255]);
        assert_eq!(&rgb[3..6], &[0, 255, 0]);
        assert_eq!(&rgb[6..9], &[255, 0, 0]);
        assert_eq!(&rgb[9..12], &[0, 0, 0]);
    }

    #[test]
    fn timestamped_names_have_prefix_and_extension() {
        let name = timestamped_name("screenshot");
        assert!(name.starts_with("screenshot_"));
        assert!(name.ends_with(".png"));
    }

    #[test]
    fn save_frame_writes_color_and_depth() {
        let dir = std::env::temp_dir().join(format!("tri_preview_save_{}", std::process::id()));
        let dir_str = dir.to_string_lossy().into_owned();
        let mut fb = FrameBuffer::new(8, 6);
        fb.clear(&Background::AnimatedGradient, 0.5, 1e9);

        let written = save_frame(&fb, &dir_str, "frame", 1e9, true).unwrap();
        assert_eq!(written.len(), 2);
        for path in &written {
            let img = image::open(path).unwrap();
            assert_eq!((img.width(), img.height()), (8, 6));
        }
        std::fs::remove_dir_all(&dir).ok();
    }
}
