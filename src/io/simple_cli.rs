use crate::io::config_loader::TomlConfigLoader;
use crate::io::render_settings::RenderSettings;
use clap::Parser;
use log::info;

/// 🔥 **极简CLI** - 专注配置文件和预览窗口控制
#[derive(Parser, Debug)]
#[command(name = "tri_preview")]
#[command(about = "🎨 TOML驱动的交互式三角形预览光栅化器")]
pub struct SimpleCli {
    /// 📁 配置文件路径（TOML格式）
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<String>,

    /// 🚀 无头模式（不启动预览窗口，直接输出PNG）
    #[arg(long)]
    pub headless: bool,

    /// 📋 使用示例配置（临时创建并加载）
    #[arg(long)]
    pub use_example_config: bool,

    /// 🎞️ 覆盖无头模式渲染的帧数
    #[arg(long, value_name = "N")]
    pub frames: Option<usize>,

    /// 📂 覆盖输出目录
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<String>,
}

impl SimpleCli {
    /// 🔥 **处理CLI参数并返回RenderSettings和是否启动GUI**
    pub fn process() -> Result<(RenderSettings, bool), String> {
        Self::parse().into_settings()
    }

    fn into_settings(self) -> Result<(RenderSettings, bool), String> {
        let mut settings = if self.use_example_config {
            let temp_config_path = "temp_example_config.toml";

            TomlConfigLoader::create_example_config(temp_config_path)?;
            info!("已创建临时示例配置: {}", temp_config_path);

            // 保留临时文件，用户可以当模板
            TomlConfigLoader::load_from_file(temp_config_path)
                .map_err(|e| format!("加载示例配置失败: {}", e))?
        } else if let Some(config_path) = &self.config {
            info!("加载配置文件: {}", config_path);
            TomlConfigLoader::load_from_file(config_path)
                .map_err(|e| format!("配置文件加载失败: {}", e))?
        } else {
            info!("使用默认设置");
            RenderSettings::default()
        };

        // 命令行覆盖项
        if let Some(frames) = self.frames {
            settings.frames = frames;
        }
        if let Some(output_dir) = self.output_dir {
            settings.output_dir = output_dir;
        }

        settings.validate()?;

        let should_start_gui = !self.headless;
        Ok((settings, should_start_gui))
    }
}
