use crate::core::frame_buffer::{Background, DEFAULT_CLEAR_DEPTH};
use crate::core::geometry_store::DEFAULT_MAX_TRIANGLES;
use crate::core::rasterizer::{RasterOptions, RasterStrategy};
use crate::geometry::camera::Camera;
use crate::geometry::transform::Projection;
use log::warn;
use nalgebra::{Point3, Vector3};

/// 背景模式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackgroundMode {
    #[default]
    Solid,
    AnimatedGradient,
}

impl BackgroundMode {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "solid" => Some(Self::Solid),
            "animated_gradient" | "gradient" => Some(Self::AnimatedGradient),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Solid => "solid",
            Self::AnimatedGradient => "animated_gradient",
        }
    }
}

/// 🔥 **纯数据结构** - 所有可通过TOML配置的参数
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    // ===== 🔥 **渲染基础设置** =====
    /// 输出图像的宽度
    pub width: usize,
    /// 输出图像的高度
    pub height: usize,
    /// 垂直视场角（度）
    pub fov: f32,
    /// 近平面距离
    pub near: f32,
    /// 投影宽高比
    pub aspect_ratio: f32,
    /// 几何存储的三角形容量上限
    pub max_triangles: usize,
    /// 深度缓冲清除值（远处哨兵值）
    pub clear_depth: f32,
    /// 启用背面剔除
    pub backface_culling: bool,
    /// 把投影结果钳制到NDC [-1,1]
    pub clamp_ndc: bool,
    /// 使用 1/z 的透视校正深度插值
    pub perspective_correct_depth: bool,
    /// 并行策略
    pub strategy: RasterStrategy,
    /// 行并行策略中每个任务负责的行数
    pub rows_per_band: usize,
    /// 背景模式
    pub background: BackgroundMode,
    /// 纯色背景颜色，格式为"r,g,b"
    pub background_color: String,

    // ===== 🔥 **相机参数** =====
    /// 相机初始位置，格式为"x,y,z"
    pub camera_position: String,
    /// 初始俯仰角（度）
    pub camera_pitch: f32,
    /// 初始偏航角（度）
    pub camera_yaw: f32,
    /// 可选的初始观察点，格式为"x,y,z"，设置后覆盖俯仰/偏航角
    pub camera_target: Option<String>,

    // ===== 🔥 **交互控制** =====
    /// 移动速度（单位/秒）
    pub move_speed: f32,
    /// 鼠标拖拽灵敏度（度/像素）
    pub look_sensitivity: f32,
    /// 方向键转向速度（度/秒）
    pub key_turn_speed: f32,

    // ===== 🔥 **场景设置** =====
    /// 输入OBJ文件的路径，为空时生成随机场景
    pub obj: Option<String>,
    /// 随机三角形数量
    pub triangle_count: usize,
    /// 随机种子
    pub seed: u64,
    /// 三角形中心的横向分布半径
    pub spread: f32,
    /// 三角形尺寸
    pub triangle_size: f32,
    /// 三角形离相机的最近距离
    pub min_distance: f32,
    /// 三角形沿视线方向的分布深度
    pub depth_range: f32,
    /// OBJ模型使用伪随机面颜色而非材质颜色
    pub colorize: bool,
    /// OBJ模型归一化后的包围球半径
    pub model_radius: f32,

    // ===== 🔥 **输出设置** =====
    /// 输出文件的基础名称
    pub output: String,
    /// 输出图像的目录
    pub output_dir: String,
    /// 无头模式渲染的帧数
    pub frames: usize,
    /// 无头模式每帧偏航角增量（度）
    pub yaw_step: f32,
    /// 保存深度图
    pub save_depth: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
            fov: 60.0,
            near: 0.1,
            aspect_ratio: 1.0,
            max_triangles: DEFAULT_MAX_TRIANGLES,
            clear_depth: DEFAULT_CLEAR_DEPTH,
            backface_culling: true,
            clamp_ndc: false,
            perspective_correct_depth: false,
            strategy: RasterStrategy::default(),
            rows_per_band: 8,
            background: BackgroundMode::default(),
            background_color: "0,0,0".to_string(),

            camera_position: "0,0,0".to_string(),
            camera_pitch: 0.0,
            camera_yaw: 0.0,
            camera_target: None,

            move_speed: 3.0,
            look_sensitivity: 0.3,
            key_turn_speed: 90.0,

            obj: None,
            triangle_count: 256,
            seed: 0,
            spread: 4.0,
            triangle_size: 1.0,
            min_distance: 2.0,
            depth_range: 10.0,
            colorize: false,
            model_radius: 1.5,

            output: "output".to_string(),
            output_dir: "output_rust".to_string(),
            frames: 1,
            yaw_step: 0.0,
            save_depth: true,
        }
    }
}

impl RenderSettings {
    /// 校验数值范围，返回第一个不合法的设置
    pub fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!("图像尺寸无效: {}x{}", self.width, self.height));
        }
        if !(self.near > 0.0) {
            return Err(format!("近平面距离必须为正: {}", self.near));
        }
        if !(self.fov > 0.0 && self.fov < 180.0) {
            return Err(format!("视场角必须位于 (0, 180) 度之间: {}", self.fov));
        }
        if !(self.aspect_ratio > 0.0) {
            return Err(format!("宽高比必须为正: {}", self.aspect_ratio));
        }
        if self.max_triangles == 0 {
            return Err("三角形容量上限不能为0".to_string());
        }
        if self.max_triangles > u32::MAX as usize {
            return Err(format!("三角形容量上限过大: {}", self.max_triangles));
        }
        if self.rows_per_band == 0 {
            return Err("rows_per_band 不能为0".to_string());
        }
        if !(self.spread >= 0.0 && self.triangle_size >= 0.0 && self.depth_range >= 0.0) {
            return Err(format!(
                "随机场景参数不能为负: spread {}, triangle_size {}, depth_range {}",
                self.spread, self.triangle_size, self.depth_range
            ));
        }
        if !(self.model_radius > 0.0) {
            return Err(format!("模型半径必须为正: {}", self.model_radius));
        }
        if !(self.clear_depth > self.near) {
            return Err(format!(
                "深度清除值 {} 必须大于近平面 {}",
                self.clear_depth, self.near
            ));
        }
        Ok(())
    }

    pub fn projection(&self) -> Projection {
        Projection::new(self.fov, self.aspect_ratio, self.near, self.clamp_ndc)
    }

    pub fn background(&self) -> Background {
        match self.background {
            BackgroundMode::AnimatedGradient => Background::AnimatedGradient,
            BackgroundMode::Solid => {
                let color = parse_vec3(&self.background_color).unwrap_or_else(|e| {
                    warn!("无效的背景颜色 '{}': {}, 使用黑色", self.background_color, e);
                    Vector3::zeros()
                });
                let color = color.map(|c| c.clamp(0.0, 1.0));
                Background::Solid([color.x, color.y, color.z])
            }
        }
    }

    pub fn raster_options(&self) -> RasterOptions {
        RasterOptions {
            width: self.width,
            height: self.height,
            projection: self.projection(),
            backface_culling: self.backface_culling,
            perspective_correct_depth: self.perspective_correct_depth,
            clear_depth: self.clear_depth,
            background: self.background(),
            strategy: self.strategy,
            rows_per_band: self.rows_per_band,
        }
    }

    /// 由设置构造初始相机
    pub fn start_camera(&self) -> Result<Camera, String> {
        let position = parse_point3(&self.camera_position)
            .map_err(|e| format!("无效的相机位置 '{}': {}", self.camera_position, e))?;
        let mut camera = Camera::new(
            position,
            self.camera_pitch.to_radians(),
            self.camera_yaw.to_radians(),
        );
        if let Some(target) = &self.camera_target {
            let target = parse_point3(target)
                .map_err(|e| format!("无效的相机观察点 '{}': {}", target, e))?;
            camera.look_at(&target);
        }
        Ok(camera)
    }
}

pub fn parse_vec3(s: &str) -> Result<Vector3<f32>, String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 3 {
        return Err("需要3个逗号分隔的值".to_string());
    }
    let x = parts[0]
        .trim()
        .parse::<f32>()
        .map_err(|e| format!("无效数字 '{}': {}", parts[0], e))?;
    let y = parts[1]
        .trim()
        .parse::<f32>()
        .map_err(|e| format!("无效数字 '{}': {}", parts[1], e))?;
    let z = parts[2]
        .trim()
        .parse::<f32>()
        .map_err(|e| format!("无效数字 '{}': {}", parts[2], e))?;
    Ok(Vector3::new(x, y, z))
}

pub fn parse_point3(s: &str) -> Result<Point3<f32>, String> {
    parse_vec3(s).map(Point3::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn defaults_are_valid() {
        let settings = RenderSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.max_triangles, 4096);
        assert_eq!(settings.fov, 60.0);
        assert_eq!(settings.near, 0.1);
        assert_eq!(settings.aspect_ratio, 1.0);
    }

    #[test]
    fn invalid_values_are_reported() {
        let cases = [
            RenderSettings {
                width: 0,
                ..Default::default()
            },
            RenderSettings {
                near: 0.0,
                ..Default::default()
            },
            RenderSettings {
                fov: 180.0,
                ..Default::default()
            },
            RenderSettings {
                max_triangles: 0,
                ..Default::default()
            },
            RenderSettings {
                rows_per_band: 0,
                ..Default::default()
            },
            RenderSettings {
                clear_depth: 0.05,
                ..Default::default()
            },
        ];
        for settings in cases {
            assert!(settings.validate().is_err(), "{:?}", settings);
        }
    }

    #[test]
    fn parse_vec3_accepts_whitespace_and_rejects_garbage() {
        assert_eq!(parse_vec3(" 1, -2.5 ,3").unwrap(), Vector3::new(1.0, -2.5, 3.0));
        assert!(parse_vec3("1,2").is_err());
        assert!(parse_vec3("1,x,2").is_err());
    }

    #[test]
    fn start_camera_uses_degrees_and_target() {
        let settings = RenderSettings {
            camera_position: "0,0,-5".to_string(),
            camera_yaw: 90.0,
            ..Default::default()
        };
        let camera = settings.start_camera().unwrap();
        assert_relative_eq!(camera.yaw(), std::f32::consts::FRAC_PI_2, epsilon = 1e-6);

        let aimed = RenderSettings {
            camera_target: Some("0,0,0".to_string()),
            ..settings
        }
        .start_camera()
        .unwrap();
        assert_relative_eq!(aimed.forward(), Vector3::z(), epsilon = 1e-5);
    }

    #[test]
    fn bad_background_color_falls_back_to_black() {
        let settings = RenderSettings {
            background_color: "red".to_string(),
            ..Default::default()
        };
        assert_eq!(settings.background(), Background::Solid([0.0, 0.0, 0.0]));
        let gradient = RenderSettings {
            background: BackgroundMode::AnimatedGradient,
            ..Default::default()
        };
        assert_eq!(gradient.raster_options().background, Background::AnimatedGradient);
    }
}
