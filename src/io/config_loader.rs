use crate::io::render_settings::RenderSettings;
use log::warn;
use std::path::Path;
use toml::{Table, Value};

/// TOML配置管理器 - 统一处理所有配置的读写
pub struct TomlConfigLoader;

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

        Self::parse_toml_to_settings(&toml_value)
    }

    /// 保存配置到TOML文件
    pub fn save_to_file<P: AsRef<Path>>(settings: &RenderSettings, path: P) -> Result<(), String> {
        let toml_content = Self::settings_to_toml(settings);
        std::fs::write(path, toml_content).map_err(|e| format!("写入配置文件失败: {}", e))
    }

    /// 生成示例配置文件
    pub fn create_example_config<P: AsRef<Path>>(path: P) -> Result<(), String> {
        let settings = RenderSettings {
            obj: Some("obj/cube.obj".to_string()),
            frames: 60,
            yaw_per_frame: 1.0,
            ..Default::default()
        };

        Self::save_to_file(&settings, path).map_err(|e| format!("创建示例配置失败: {}", e))
    }

    // ===== TOML -> RenderSettings 转换 =====

    fn parse_toml_to_settings(toml: &Value) -> Result<RenderSettings, String> {
        let mut settings = RenderSettings::default();

        if let Some(table) = toml.as_table() {
            for key in table.keys() {
                if !["files", "render", "camera"].contains(&key.as_str()) {
                    warn!("忽略未知的配置段 [{}]", key);
                }
            }
        }

        if let Some(files) = toml.get("files").and_then(|v| v.as_table()) {
            Self::parse_files_section(&mut settings, files)?;
        }

        if let Some(render) = toml.get("render").and_then(|v| v.as_table()) {
            Self::parse_render_section(&mut settings, render)?;
        }

        if let Some(camera) = toml.get("camera").and_then(|v| v.as_table()) {
            Self::parse_camera_section(&mut settings, camera)?;
        }

        Ok(settings)
    }

    fn parse_files_section(settings: &mut RenderSettings, files: &Table) -> Result<(), String> {
        if let Some(obj) = read_str(files, "obj")? {
            settings.obj = Some(obj);
        }
        if let Some(texture) = read_str(files, "texture")? {
            settings.texture = Some(texture);
        }
        if let Some(output) = read_str(files, "output")? {
            settings.output = output;
        }
        if let Some(output_dir) = read_str(files, "output_dir")? {
            settings.output_dir = output_dir;
        }
        Ok(())
    }

    fn parse_render_section(settings: &mut RenderSettings, render: &Table) -> Result<(), String> {
        if let Some(width) = read_usize(render, "width")? {
            settings.width = width;
        }
        if let Some(height) = read_usize(render, "height")? {
            settings.height = height;
        }
        if let Some(tile_size) = read_usize(render, "tile_size")? {
            settings.tile_size = tile_size;
        }
        if let Some(depth_scale) = read_f32(render, "depth_scale")? {
            settings.depth_scale = depth_scale;
        }
        if let Some(queue_capacity) = read_usize(render, "queue_capacity")? {
            settings.queue_capacity = queue_capacity;
        }
        if let Some(use_lighting) = read_bool(render, "use_lighting")? {
            settings.use_lighting = use_lighting;
        }
        if let Some(frames) = read_usize(render, "frames")? {
            settings.frames = frames;
        }
        if let Some(timeout) = read_usize(render, "frame_timeout_ms")? {
            settings.frame_timeout_ms = timeout as u64;
        }
        if let Some(save_all_frames) = read_bool(render, "save_all_frames")? {
            settings.save_all_frames = save_all_frames;
        }
        Ok(())
    }

    fn parse_camera_section(settings: &mut RenderSettings, camera: &Table) -> Result<(), String> {
        if let Some(position) = read_str(camera, "position")? {
            settings.camera_position = position;
        }
        if let Some(yaw) = read_f32(camera, "yaw")? {
            settings.camera_yaw = yaw;
        }
        if let Some(pitch) = read_f32(camera, "pitch")? {
            settings.camera_pitch = pitch;
        }
        if let Some(fov) = read_f32(camera, "fov")? {
            settings.camera_fov = fov;
        }
        if let Some(near) = read_f32(camera, "near")? {
            settings.camera_near = near;
        }
        if let Some(far) = read_f32(camera, "far")? {
            settings.camera_far = far;
        }
        if let Some(yaw) = read_f32(camera, "yaw_per_frame")? {
            settings.yaw_per_frame = yaw;
        }
        if let Some(pitch) = read_f32(camera, "pitch_per_frame")? {
            settings.pitch_per_frame = pitch;
        }
        Ok(())
    }

    // ===== RenderSettings -> TOML 转换 =====

    fn settings_to_toml(settings: &RenderSettings) -> String {
        let mut content = String::new();

        content.push_str("# 分块光栅化渲染器配置文件\n");
        content.push_str("# 基于RenderSettings默认值生成\n\n");

        // [files] 部分
        content.push_str("[files]\n");
        if let Some(obj) = &settings.obj {
            content.push_str(&format!("obj = {}\n", quoted(obj)));
        } else {
            content.push_str("# obj = \"path/to/your/model.obj\"  # 取消注释并设置OBJ文件路径\n");
        }
        if let Some(texture) = &settings.texture {
            content.push_str(&format!("texture = {}\n", quoted(texture)));
        } else {
            content.push_str("# texture = \"path/to/texture.png\"  # 可选：未设置时使用纯白纹理\n");
        }
        content.push_str(&format!("output = {}\n", quoted(&settings.output)));
        content.push_str(&format!("output_dir = {}\n", quoted(&settings.output_dir)));
        content.push('\n');

        // [render] 部分
        content.push_str("[render]\n");
        content.push_str(&format!("width = {}\n", settings.width));
        content.push_str(&format!("height = {}\n", settings.height));
        content.push_str(&format!("tile_size = {}\n", settings.tile_size));
        content.push_str(&format!("depth_scale = {:?}\n", settings.depth_scale));
        content.push_str(&format!("queue_capacity = {}\n", settings.queue_capacity));
        content.push_str(&format!("use_lighting = {}\n", settings.use_lighting));
        content.push_str(&format!("frames = {}\n", settings.frames));
        content.push_str(&format!(
            "frame_timeout_ms = {}  # 0 表示无限等待\n",
            settings.frame_timeout_ms
        ));
        content.push_str(&format!("save_all_frames = {}\n", settings.save_all_frames));
        content.push('\n');

        // [camera] 部分
        content.push_str("[camera]\n");
        content.push_str(&format!("position = {}\n", quoted(&settings.camera_position)));
        content.push_str(&format!("yaw = {:?}\n", settings.camera_yaw));
        content.push_str(&format!("pitch = {:?}\n", settings.camera_pitch));
        content.push_str(&format!("fov = {:?}\n", settings.camera_fov));
        content.push_str(&format!("near = {:?}\n", settings.camera_near));
        content.push_str(&format!("far = {:?}\n", settings.camera_far));
        content.push_str(&format!("yaw_per_frame = {:?}\n", settings.yaw_per_frame));
        content.push_str(&format!("pitch_per_frame = {:?}\n", settings.pitch_per_frame));

        content
    }
}

/// TOML 基本字符串，转义反斜杠和引号（Windows 路径）
fn quoted(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

fn type_error(key: &str, expected: &str, value: &Value) -> String {
    format!("配置项 '{}' 应为{}，实际为 {}", key, expected, value.type_str())
}

fn read_str(table: &Table, key: &str) -> Result<Option<String>, String> {
    match table.get(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(type_error(key, "字符串", other)),
    }
}

fn read_bool(table: &Table, key: &str) -> Result<Option<bool>, String> {
    match table.get(key) {
        None => Ok(None),
        Some(Value::Boolean(b)) => Ok(Some(*b)),
        Some(other) => Err(type_error(key, "布尔值", other)),
    }
}

fn read_usize(table: &Table, key: &str) -> Result<Option<usize>, String> {
    match table.get(key) {
        None => Ok(None),
        Some(Value::Integer(i)) => usize::try_from(*i)
            .map(Some)
            .map_err(|_| format!("配置项 '{}' 不能为负数: {}", key, i)),
        Some(other) => Err(type_error(key, "非负整数", other)),
    }
}

/// 浮点配置项同时接受整数写法（如 `fov = 30`）
fn read_f32(table: &Table, key: &str) -> Result<Option<f32>, String> {
    match table.get(key) {
        None => Ok(None),
        Some(Value::Float(f)) => Ok(Some(*f as f32)),
        Some(Value::Integer(i)) => Ok(Some(*i as f32)),
        Some(other) => Err(type_error(key, "数值", other)),
    }
}
