use crate::core::rasterizer::RasterStrategy;
use crate::core::renderer::Renderer;
use crate::geometry::camera::Camera;
use crate::io::render_settings::RenderSettings;
use crate::scene::scene_utils::{Scene, SceneSource};
use crate::ui::controls::{CameraInput, ControlSettings};
use crate::utils::image_utils::{to_rgb8, to_rgba8};
use crate::utils::save_utils::{save_image, timestamped_name};
use egui::{Color32, ColorImage, Key, RichText, TextureHandle, TextureOptions, Vec2};
use log::{error, info};
use std::path::Path;
use std::time::{Duration, Instant};

const FPS_HISTORY_SIZE: usize = 30;

/// 交互式预览窗口
pub struct PreviewApp {
    settings: RenderSettings,
    renderer: Renderer,
    controls: ControlSettings,

    // ===== 相机状态 =====
    camera: Camera,
    start_camera: Camera,
    scene_label: String,

    // ===== GUI界面状态 =====
    texture: Option<TextureHandle>,
    status_message: String,
    /// 上一帧图像区域的拖拽量，在下一帧作用到相机上
    pending_drag: Vec2,
    /// 鼠标所在的帧缓冲像素（第0行在底部）
    hovered_pixel: Option<(usize, usize)>,

    // ===== 性能统计 =====
    start_time: Instant,
    last_frame_time: Option<Instant>,
    fps_history: Vec<f32>,
    avg_fps: f32,
}

impl PreviewApp {
    /// 创建新的GUI应用实例
    pub fn new(settings: RenderSettings, scene: Scene, cc: &eframe::CreationContext<'_>) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());

        let mut renderer = Renderer::new(&settings);
        let status_message = match renderer.set_batch(&scene.batch) {
            Ok(()) => format!("{} triangles loaded", renderer.triangle_count()),
            Err(e) => {
                error!("场景载入失败: {}", e);
                format!("Scene rejected: {}", e)
            }
        };

        let scene_label = match &scene.source {
            SceneSource::Random { seed } => format!("random (seed {})", seed),
            SceneSource::Obj { path } => path.clone(),
        };

        Self {
            controls: ControlSettings::from_settings(&settings),
            settings,
            renderer,
            camera: scene.start_camera.clone(),
            start_camera: scene.start_camera,
            scene_label,
            texture: None,
            status_message,
            pending_drag: Vec2::ZERO,
            hovered_pixel: None,
            start_time: Instant::now(),
            last_frame_time: None,
            fps_history: Vec::new(),
            avg_fps: 0.0,
        }
    }

    /// 读取键盘状态，并合并上一帧的拖拽量
    fn collect_input(&mut self, ctx: &egui::Context) -> CameraInput {
        let axis = |positive: bool, negative: bool| -> f32 {
            match (positive, negative) {
                (true, false) => 1.0,
                (false, true) => -1.0,
                _ => 0.0,
            }
        };

        let mut input = ctx.input(|i| CameraInput {
            forward: axis(i.key_down(Key::W), i.key_down(Key::S)),
            right: axis(i.key_down(Key::D), i.key_down(Key::A)),
            up: axis(i.key_down(Key::Space), i.modifiers.shift),
            turn_right: axis(i.key_down(Key::ArrowRight), i.key_down(Key::ArrowLeft)),
            turn_up: axis(i.key_down(Key::ArrowUp), i.key_down(Key::ArrowDown)),
            drag: [0.0, 0.0],
        });
        input.drag = [self.pending_drag.x, self.pending_drag.y];
        self.pending_drag = Vec2::ZERO;
        input
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        let (reset, screenshot) = ctx.input(|i| (i.key_pressed(Key::R), i.key_pressed(Key::P)));

        if reset {
            self.camera = self.start_camera.clone();
            self.status_message = "Camera reset".to_string();
            info!("相机已重置");
        }

        if screenshot {
            self.status_message = match self.take_screenshot() {
                Ok(path) => format!("Saved {}", path),
                Err(e) => {
                    error!("{}", e);
                    format!("Screenshot failed: {}", e)
                }
            };
        }
    }

    fn take_screenshot(&self) -> Result<String, String> {
        let fb = self.renderer.frame_buffer();
        std::fs::create_dir_all(&self.settings.output_dir)
            .map_err(|e| format!("创建输出目录失败: {}", e))?;
        let path = Path::new(&self.settings.output_dir).join(timestamped_name("screenshot"));
        save_image(
            &path,
            &to_rgb8(fb, true),
            fb.width as u32,
            fb.height as u32,
        )?;
        Ok(path.display().to_string())
    }

    /// 按当前设置重新生成或加载场景
    fn reload_scene(&mut self) {
        let result = Scene::from_settings(&self.settings).and_then(|scene| {
            self.renderer
                .set_batch(&scene.batch)
                .map_err(|e| e.to_string())?;
            Ok(scene)
        });
        match result {
            Ok(scene) => {
                self.start_camera = scene.start_camera;
                self.status_message =
                    format!("{} triangles loaded", self.renderer.triangle_count());
            }
            Err(e) => {
                error!("场景重新加载失败: {}", e);
                self.status_message = format!("Reload failed: {}", e);
            }
        }
    }

    /// 屏幕上的悬停位置 -> 帧缓冲像素
    fn pixel_under(&self, rect: egui::Rect, pos: egui::Pos2) -> Option<(usize, usize)> {
        let fb = self.renderer.frame_buffer();
        let u = (pos.x - rect.min.x) / rect.width();
        let v = (pos.y - rect.min.y) / rect.height();
        if !((0.0..1.0).contains(&u) && (0.0..1.0).contains(&v)) {
            return None;
        }
        let i = (u * fb.width as f32) as usize;
        // 显示时做过上下翻转
        let j = ((1.0 - v) * fb.height as f32) as usize;
        Some((i.min(fb.width - 1), j.min(fb.height - 1)))
    }

    fn update_fps_stats(&mut self, frame_time: Duration) {
        let seconds = frame_time.as_secs_f32();
        if seconds <= 0.0 {
            return;
        }
        self.fps_history.push(1.0 / seconds);
        if self.fps_history.len() > FPS_HISTORY_SIZE {
            self.fps_history.remove(0);
        }
        let sum: f32 = self.fps_history.iter().sum();
        self.avg_fps = sum / self.fps_history.len() as f32;
    }

    fn fps_display(&self) -> (String, Color32) {
        let fps_color = if self.avg_fps >= 30.0 {
            Color32::from_rgb(50, 220, 50)
        } else if self.avg_fps >= 15.0 {
            Color32::from_rgb(220, 180, 50)
        } else {
            Color32::from_rgb(220, 50, 50)
        };
        (format!("FPS: {:.1}", self.avg_fps), fps_color)
    }

    /// 渲染一帧并上传为纹理（上下翻转，第0行在底部）
    fn render_frame(&mut self, ctx: &egui::Context) {
        let time = self.start_time.elapsed().as_secs_f32();
        self.renderer.render_camera(time, &self.camera);

        let fb = self.renderer.frame_buffer();
        let image = ColorImage::from_rgba_unmultiplied([fb.width, fb.height], &to_rgba8(fb, true));
        match &mut self.texture {
            Some(texture) => texture.set(image, TextureOptions::NEAREST),
            None => {
                self.texture = Some(ctx.load_texture("frame", image, TextureOptions::NEAREST));
            }
        }
    }

    fn draw_side_panel(&mut self, ui: &mut egui::Ui) {
        let (fps_text, fps_color) = self.fps_display();
        ui.label(RichText::new(fps_text).color(fps_color).strong());
        ui.separator();

        let stats = *self.renderer.last_stats();
        ui.heading("Frame");
        ui.label(format!("Scene: {}", self.scene_label));
        ui.label(format!("Triangles: {}", stats.submitted));
        ui.label(format!("Rasterized: {}", stats.rasterized));
        ui.label(format!("Back faces culled: {}", stats.culled_backface));
        ui.label(format!("Degenerate: {}", stats.degenerate));
        ui.label(format!("Off-screen: {}", stats.offscreen));
        ui.label(format!("Covered pixels: {}", stats.covered_pixels));
        ui.label(format!("Frame time: {:.2} ms", stats.elapsed.as_secs_f64() * 1000.0));
        ui.separator();

        ui.heading("Camera");
        let p = self.camera.position;
        ui.label(format!("Position: ({:.2}, {:.2}, {:.2})", p.x, p.y, p.z));
        ui.label(format!("Pitch: {:.1}°", self.camera.pitch().to_degrees()));
        ui.label(format!("Yaw: {:.1}°", self.camera.yaw().to_degrees()));
        ui.separator();

        ui.heading("Scene");
        if self.renderer.geometry().is_empty() {
            ui.label(RichText::new("No triangles").color(Color32::GRAY));
        }
        ui.horizontal(|ui| {
            if ui.button("Reload").clicked() {
                self.reload_scene();
            }
            if ui.button("Clear").clicked() {
                self.renderer.clear_triangles();
                self.status_message = "Scene cleared".to_string();
            }
        });
        if let Some((i, j)) = self.hovered_pixel {
            let fb = self.renderer.frame_buffer();
            let [r, g, b, _] = fb.color_at(i, j);
            let depth = fb.depth_at(i, j);
            ui.label(format!("Pixel ({}, {})", i, j));
            ui.label(format!("Color: ({:.2}, {:.2}, {:.2})", r, g, b));
            if depth < self.settings.clear_depth {
                ui.label(format!("Depth: {:.3}", depth));
            } else {
                ui.label("Depth: background");
            }
        }
        ui.separator();

        ui.heading("Rasterizer");
        let mut changed = false;
        egui::ComboBox::from_label("Strategy")
            .selected_text(self.settings.strategy.as_str())
            .show_ui(ui, |ui| {
                for strategy in [
                    RasterStrategy::Serial,
                    RasterStrategy::RowParallel,
                    RasterStrategy::TriangleParallel,
                ] {
                    changed |= ui
                        .selectable_value(&mut self.settings.strategy, strategy, strategy.as_str())
                        .changed();
                }
            });
        changed |= ui
            .checkbox(&mut self.settings.backface_culling, "Backface culling")
            .changed();
        changed |= ui
            .checkbox(
                &mut self.settings.perspective_correct_depth,
                "Perspective-correct depth",
            )
            .changed();
        changed |= ui.checkbox(&mut self.settings.clamp_ndc, "Clamp NDC").changed();
        if changed {
            self.renderer.apply_settings(&self.settings);
            info!("光栅化设置已更新: 策略 {}", self.settings.strategy.as_str());
        }
        ui.separator();

        ui.heading("Controls");
        ui.small("W/S  forward / back");
        ui.small("A/D  strafe");
        ui.small("Space/Shift  up / down");
        ui.small("Arrows or drag  look around");
        ui.small("R  reset camera");
        ui.small("P  save screenshot");
        ui.separator();
        ui.label(&self.status_message);
    }
}

impl eframe::App for PreviewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        let dt = self
            .last_frame_time
            .map(|last| now.duration_since(last))
            .unwrap_or_default();
        if let Some(last) = self.last_frame_time {
            self.update_fps_stats(now.duration_since(last));
        }
        self.last_frame_time = Some(now);

        self.handle_shortcuts(ctx);
        let input = self.collect_input(ctx);
        input.apply(&mut self.camera, &self.controls, dt.as_secs_f32());

        self.render_frame(ctx);

        egui::SidePanel::left("left_panel")
            .min_width(240.0)
            .resizable(false)
            .show(ctx, |ui| {
                self.draw_side_panel(ui);
            });

        let image_interaction = egui::CentralPanel::default()
            .show(ctx, |ui| {
                let texture = self.texture.as_ref()?;
                let available = ui.available_size();
                let aspect = texture.aspect_ratio();
                let size = if available.x / available.y > aspect {
                    Vec2::new(available.y * aspect, available.y)
                } else {
                    Vec2::new(available.x, available.x / aspect)
                };

                let response = ui.add(
                    egui::Image::new(texture)
                        .fit_to_exact_size(size)
                        .sense(egui::Sense::click_and_drag()),
                );
                let drag = if response.dragged_by(egui::PointerButton::Primary) {
                    response.drag_delta()
                } else {
                    Vec2::ZERO
                };
                Some((response.rect, response.hover_pos(), drag))
            })
            .inner;

        if let Some((rect, hover, drag)) = image_interaction {
            self.pending_drag += drag;
            self.hovered_pixel = hover.and_then(|pos| self.pixel_under(rect, pos));
        } else {
            self.hovered_pixel = None;
        }

        // 实时预览：持续重绘
        ctx.request_repaint();
    }
}

/// 启动预览窗口
pub fn start_gui(settings: RenderSettings, scene: Scene) -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([
                settings.width as f32 + 280.0,
                (settings.height as f32 + 40.0).max(480.0),
            ])
            .with_min_inner_size([640.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Triangle Preview",
        options,
        Box::new(move |cc| Ok(Box::new(PreviewApp::new(settings, scene, cc)))),
    )
}
