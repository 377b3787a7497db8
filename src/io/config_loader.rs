use crate::core::rasterizer::RasterStrategy;
use crate::io::render_settings::{BackgroundMode, RenderSettings};
use log::warn;
use std::path::Path;
use toml::Value;

/// TOML配置管理器 - 统一处理所有配置的读写
pub struct TomlConfigLoader;

/// 读取数值，整数和浮点数都接受
fn get_f32(table: &toml::Table, key: &str) -> Option<f32> {
    table.get(key).and_then(|v| {
        v.as_float()
            .or_else(|| v.as_integer().map(|i| i as f64))
            .map(|f| f as f32)
    })
}

fn get_usize(table: &toml::Table, key: &str) -> Option<usize> {
    match table.get(key).and_then(|v| v.as_integer()) {
        Some(value) if value >= 0 => Some(value as usize),
        Some(value) => {
            warn!("配置项 {} 不能为负数: {}, 使用默认值", key, value);
            None
        }
        None => None,
    }
}

fn get_bool(table: &toml::Table, key: &str) -> Option<bool> {
    table.get(key).and_then(|v| v.as_bool())
}

fn get_string(table: &toml::Table, key: &str) -> Option<String> {
    table.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

impl TomlConfigLoader {
    /// 从TOML文件加载完整配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<RenderSettings, String> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| format!("读取配置文件失败: {}", e))?;

        Self::load_from_content(&content)
    }

    /// 从TOML内容字符串加载配置
    pub fn load_from_content(content: &str) -> Result<RenderSettings, String> {
        let toml_value: Value =
            toml::from_str(content).map_err(|e| format!("解析TOML失败: {}", e))?;

        Self::parse_toml_to_settings(toml_value)
    }

    /// 保存配置到TOML文件
    pub fn save_to_file<P: AsRef<Path>>(settings: &RenderSettings, path: P) -> Result<(), String> {
        let toml_content = Self::settings_to_toml(settings);
        std::fs::write(path, toml_content).map_err(|e| format!("写入配置文件失败: {}", e))
    }

    /// 生成示例配置文件
    pub fn create_example_config<P: AsRef<Path>>(path: P) -> Result<(), String> {
        let settings = RenderSettings {
            triangle_count: 512,
            seed: 42,
            frames: 60,
            yaw_step: 1.0,
            ..Default::default()
        };

        Self::save_to_file(&settings, path).map_err(|e| format!("创建示例配置失败: {}", e))
    }

    // ===== TOML -> RenderSettings 转换 =====

    fn parse_toml_to_settings(toml: Value) -> Result<RenderSettings, String> {
        let mut settings = RenderSettings::default();

        // [render] 部分
        if let Some(render) = toml.get("render").and_then(|v| v.as_table()) {
            Self::parse_render_section(&mut settings, render);
        }

        // [camera] 部分
        if let Some(camera) = toml.get("camera").and_then(|v| v.as_table()) {
            Self::parse_camera_section(&mut settings, camera);
        }

        // [controls] 部分
        if let Some(controls) = toml.get("controls").and_then(|v| v.as_table()) {
            Self::parse_controls_section(&mut settings, controls);
        }

        // [scene] 部分
        if let Some(scene) = toml.get("scene").and_then(|v| v.as_table()) {
            Self::parse_scene_section(&mut settings, scene);
        }

        // [output] 部分
        if let Some(output) = toml.get("output").and_then(|v| v.as_table()) {
            Self::parse_output_section(&mut settings, output);
        }

        settings.validate()?;
        Ok(settings)
    }

    // ===== 各个section的解析方法 =====

    fn parse_render_section(settings: &mut RenderSettings, render: &toml::Table) {
        if let Some(width) = get_usize(render, "width") {
            settings.width = width;
        }
        if let Some(height) = get_usize(render, "height") {
            settings.height = height;
        }
        if let Some(fov) = get_f32(render, "fov") {
            settings.fov = fov;
        }
        if let Some(near) = get_f32(render, "near") {
            settings.near = near;
        }
        if let Some(aspect_ratio) = get_f32(render, "aspect_ratio") {
            settings.aspect_ratio = aspect_ratio;
        }
        if let Some(max_triangles) = get_usize(render, "max_triangles") {
            settings.max_triangles = max_triangles;
        }
        if let Some(clear_depth) = get_f32(render, "clear_depth") {
            settings.clear_depth = clear_depth;
        }
        if let Some(backface_culling) = get_bool(render, "backface_culling") {
            settings.backface_culling = backface_culling;
        }
        if let Some(clamp_ndc) = get_bool(render, "clamp_ndc") {
            settings.clamp_ndc = clamp_ndc;
        }
        if let Some(perspective) = get_bool(render, "perspective_correct_depth") {
            settings.perspective_correct_depth = perspective;
        }
        if let Some(strategy) = render.get("strategy").and_then(|v| v.as_str()) {
            match RasterStrategy::parse(strategy) {
                Some(strategy) => settings.strategy = strategy,
                None => warn!(
                    "未知的光栅化策略 '{}', 使用默认值 {}",
                    strategy,
                    settings.strategy.as_str()
                ),
            }
        }
        if let Some(rows_per_band) = get_usize(render, "rows_per_band") {
            settings.rows_per_band = rows_per_band;
        }
        if let Some(background) = render.get("background").and_then(|v| v.as_str()) {
            match BackgroundMode::parse(background) {
                Some(mode) => settings.background = mode,
                None => warn!("未知的背景模式 '{}', 使用纯色背景", background),
            }
        }
        if let Some(color) = get_string(render, "background_color") {
            settings.background_color = color;
        }
    }

    fn parse_camera_section(settings: &mut RenderSettings, camera: &toml::Table) {
        if let Some(position) = get_string(camera, "position") {
            settings.camera_position = position;
        }
        if let Some(pitch) = get_f32(camera, "pitch") {
            settings.camera_pitch = pitch;
        }
        if let Some(yaw) = get_f32(camera, "yaw") {
            settings.camera_yaw = yaw;
        }
        if let Some(target) = get_string(camera, "target") {
            settings.camera_target = Some(target);
        }
    }

    fn parse_controls_section(settings: &mut RenderSettings, controls: &toml::Table) {
        if let Some(move_speed) = get_f32(controls, "move_speed") {
            settings.move_speed = move_speed;
        }
        if let Some(look_sensitivity) = get_f32(controls, "look_sensitivity") {
            settings.look_sensitivity = look_sensitivity;
        }
        if let Some(key_turn_speed) = get_f32(controls, "key_turn_speed") {
            settings.key_turn_speed = key_turn_speed;
        }
    }

    fn parse_scene_section(settings: &mut RenderSettings, scene: &toml::Table) {
        if let Some(obj) = get_string(scene, "obj") {
            settings.obj = Some(obj);
        }
        if let Some(triangle_count) = get_usize(scene, "triangle_count") {
            settings.triangle_count = triangle_count;
        }
        if let Some(seed) = scene.get("seed").and_then(|v| v.as_integer()) {
            settings.seed = seed as u64;
        }
        if let Some(spread) = get_f32(scene, "spread") {
            settings.spread = spread;
        }
        if let Some(triangle_size) = get_f32(scene, "triangle_size") {
            settings.triangle_size = triangle_size;
        }
        if let Some(min_distance) = get_f32(scene, "min_distance") {
            settings.min_distance = min_distance;
        }
        if let Some(depth_range) = get_f32(scene, "depth_range") {
            settings.depth_range = depth_range;
        }
        if let Some(colorize) = get_bool(scene, "colorize") {
            settings.colorize = colorize;
        }
        if let Some(model_radius) = get_f32(scene, "model_radius") {
            settings.model_radius = model_radius;
        }
    }

    fn parse_output_section(settings: &mut RenderSettings, output: &toml::Table) {
        if let Some(name) = get_string(output, "output") {
            settings.output = name;
        }
        if let Some(output_dir) = get_string(output, "output_dir") {
            settings.output_dir = output_dir;
        }
        if let Some(frames) = get_usize(output, "frames") {
            settings.frames = frames;
        }
        if let Some(yaw_step) = get_f32(output, "yaw_step") {
            settings.yaw_step = yaw_step;
        }
        if let Some(save_depth) = get_bool(output, "save_depth") {
            settings.save_depth = save_depth;
        }
    }

    // ===== RenderSettings -> TOML 转换 =====

    fn settings_to_toml(settings: &RenderSettings) -> String {
        let mut content = String::new();

        // 文件头注释
        content.push_str("# 🔥 三角形预览光栅化器配置文件\n\n");

        // [render] 部分
        content.push_str("[render]\n");
        content.push_str(&format!("width = {}\n", settings.width));
        content.push_str(&format!("height = {}\n", settings.height));
        content.push_str(&format!("fov = {:?}\n", settings.fov));
        content.push_str(&format!("near = {:?}\n", settings.near));
        content.push_str(&format!("aspect_ratio = {:?}\n", settings.aspect_ratio));
        content.push_str(&format!("max_triangles = {}\n", settings.max_triangles));
        content.push_str(&format!("clear_depth = {:?}\n", settings.clear_depth));
        content.push_str(&format!(
            "backface_culling = {}\n",
            settings.backface_culling
        ));
        content.push_str(&format!("clamp_ndc = {}\n", settings.clamp_ndc));
        content.push_str(&format!(
            "perspective_correct_depth = {}\n",
            settings.perspective_correct_depth
        ));
        content.push_str(&format!("strategy = \"{}\"\n", settings.strategy.as_str()));
        content.push_str(&format!("rows_per_band = {}\n", settings.rows_per_band));
        content.push_str(&format!(
            "background = \"{}\"\n",
            settings.background.as_str()
        ));
        content.push_str(&format!(
            "background_color = {:?}\n",
            settings.background_color
        ));
        content.push('\n');

        // [camera] 部分
        content.push_str("[camera]\n");
        content.push_str(&format!("position = {:?}\n", settings.camera_position));
        content.push_str(&format!("pitch = {:?}\n", settings.camera_pitch));
        content.push_str(&format!("yaw = {:?}\n", settings.camera_yaw));
        if let Some(target) = &settings.camera_target {
            content.push_str(&format!("target = {:?}\n", target));
        } else {
            content.push_str("# target = \"0,0,5\"  # 可选：初始观察点，覆盖 pitch/yaw\n");
        }
        content.push('\n');

        // [controls] 部分
        content.push_str("[controls]\n");
        content.push_str(&format!("move_speed = {:?}\n", settings.move_speed));
        content.push_str(&format!(
            "look_sensitivity = {:?}\n",
            settings.look_sensitivity
        ));
        content.push_str(&format!("key_turn_speed = {:?}\n", settings.key_turn_speed));
        content.push('\n');

        // [scene] 部分
        content.push_str("[scene]\n");
        if let Some(obj) = &settings.obj {
            content.push_str(&format!("obj = {:?}\n", obj));
        } else {
            content.push_str("# obj = \"path/to/your/model.obj\"  # 取消注释以加载OBJ模型\n");
        }
        content.push_str(&format!("triangle_count = {}\n", settings.triangle_count));
        content.push_str(&format!("seed = {}\n", settings.seed as i64));
        content.push_str(&format!("spread = {:?}\n", settings.spread));
        content.push_str(&format!("triangle_size = {:?}\n", settings.triangle_size));
        content.push_str(&format!("min_distance = {:?}\n", settings.min_distance));
        content.push_str(&format!("depth_range = {:?}\n", settings.depth_range));
        content.push_str(&format!("colorize = {}\n", settings.colorize));
        content.push_str(&format!("model_radius = {:?}\n", settings.model_radius));
        content.push('\n');

        // [output] 部分
        content.push_str("[output]\n");
        content.push_str(&format!("output = {:?}\n", settings.output));
        content.push_str(&format!("output_dir = {:?}\n", settings.output_dir));
        content.push_str(&format!("frames = {}\n", settings.frames));
        content.push_str(&format!("yaw_step = {:?}\n", settings.yaw_step));
        content.push_str(&format!("save_depth = {}\n", settings.save_depth));

        content
    }
}
