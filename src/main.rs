mod core;
mod geometry;
mod io;
mod scene;
mod ui;
mod utils;

use crate::core::renderer::Renderer;
use crate::io::render_settings::RenderSettings;
use crate::io::simple_cli::SimpleCli;
use crate::scene::scene_utils::Scene;
use crate::utils::save_utils::save_frame;
use log::{error, info, warn};
use std::time::{Duration, Instant};

/// 无头模式中相邻帧之间的时间步长（秒），只影响动画背景
const HEADLESS_FRAME_TIME: f32 = 1.0 / 30.0;

/// 无头模式：逐帧旋转偏航角渲染并保存PNG
fn run_headless(settings: &RenderSettings, scene: Scene) -> Result<(), String> {
    let mut renderer = Renderer::new(settings);
    renderer
        .set_batch(&scene.batch)
        .map_err(|e| format!("场景载入失败: {}", e))?;

    let yaw_step = settings.yaw_step.to_radians();
    let camera = scene.start_camera;
    let mut total = Duration::ZERO;

    for frame in 0..settings.frames {
        let stats = renderer.render(
            frame as f32 * HEADLESS_FRAME_TIME,
            camera.position,
            camera.pitch(),
            camera.yaw() + yaw_step * frame as f32,
        );
        total += stats.elapsed;

        let base_name = if settings.frames == 1 {
            settings.output.clone()
        } else {
            format!("{}_{:03}", settings.output, frame)
        };
        save_frame(
            renderer.frame_buffer(),
            &settings.output_dir,
            &base_name,
            settings.clear_depth,
            settings.save_depth,
        )?;

        info!(
            "第 {}/{} 帧: 光栅化 {} 个三角形, 覆盖 {} 像素, 耗时 {:?}",
            frame + 1,
            settings.frames,
            stats.rasterized,
            stats.covered_pixels,
            stats.elapsed
        );
    }

    if settings.frames > 0 {
        info!(
            "渲染完成: {} 帧, 平均每帧 {:?}",
            settings.frames,
            total / settings.frames as u32
        );
    }
    Ok(())
}

fn main() -> Result<(), String> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let (settings, should_start_gui) = SimpleCli::process().inspect_err(|e| error!("{}", e))?;

    let load_start = Instant::now();
    let scene = Scene::from_settings(&settings).inspect_err(|e| error!("{}", e))?;
    info!(
        "场景准备完成: {} 个三角形, 耗时 {:?}",
        scene.batch.len(),
        load_start.elapsed()
    );
    if scene.batch.is_empty() {
        warn!("场景中没有三角形，输出将只有背景");
    }

    if should_start_gui {
        ui::start_gui(settings, scene).map_err(|e| {
            let message = format!("GUI启动失败: {}", e);
            error!("{}", message);
            message
        })
    } else {
        run_headless(&settings, scene).inspect_err(|e| error!("{}", e))
    }
}
