use crate::io::config_loader::TomlConfigLoader;
use crate::io::render_settings::RenderSettings;
use clap::Parser;
use log::info;

/// 极简CLI - 配置文件 + 少量覆盖项
#[derive(Parser, Debug)]
#[command(name = "tile_rasterizer")]
#[command(about = "TOML驱动的分块并行光栅化渲染器")]
pub struct SimpleCli {
    /// 配置文件路径（TOML格式）
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<String>,

    /// 使用示例配置（写出 example_config.toml 并加载）
    #[arg(long)]
    pub use_example_config: bool,

    /// 覆盖 [files] obj
    #[arg(long, value_name = "FILE")]
    pub obj: Option<String>,

    /// 覆盖 [files] texture
    #[arg(long, value_name = "FILE")]
    pub texture: Option<String>,

    /// 覆盖 [render] frames
    #[arg(short, long)]
    pub frames: Option<usize>,

    /// 覆盖 [files] output_dir
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<String>,
}

impl SimpleCli {
    /// 解析命令行并返回合并后的 RenderSettings
    pub fn process() -> Result<RenderSettings, String> {
        Self::parse().into_settings()
    }

    pub fn into_settings(self) -> Result<RenderSettings, String> {
        let mut settings = if self.use_example_config {
            let example_path = "example_config.toml";
            TomlConfigLoader::create_example_config(example_path)?;
            info!("已创建示例配置: {}", example_path);
            TomlConfigLoader::load_from_file(example_path)
                .map_err(|e| format!("加载示例配置失败: {}", e))?
        } else if let Some(config_path) = &self.config {
            info!("加载配置文件: {}", config_path);
            TomlConfigLoader::load_from_file(config_path)
                .map_err(|e| format!("配置文件加载失败: {}", e))?
        } else {
            info!("使用默认设置");
            RenderSettings::default()
        };

        if let Some(obj) = self.obj {
            settings.obj = Some(obj);
        }
        if let Some(texture) = self.texture {
            settings.texture = Some(texture);
        }
        if let Some(frames) = self.frames {
            settings.frames = frames;
        }
        if let Some(output_dir) = self.output_dir {
            settings.output_dir = output_dir;
        }

        Ok(settings)
    }
}
