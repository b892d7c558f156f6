use crate::geometry::camera::Camera;
use nalgebra::{Point3, Vector3};

/// 纯数据结构 - 所有可通过TOML配置的渲染参数
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    // ===== 文件路径设置 =====
    /// 输入OBJ文件的路径
    pub obj: Option<String>,
    /// 纹理文件；未指定时使用纯白纹理
    pub texture: Option<String>,
    /// 输出文件的基础名称
    pub output: String,
    /// 输出图像的目录
    pub output_dir: String,

    // ===== 渲染基础设置 =====
    pub width: usize,
    pub height: usize,
    /// 分块边长（像素，2的幂，且整除宽高）
    pub tile_size: usize,
    /// NDC深度到设备深度的缩放系数
    pub depth_scale: f32,
    /// 每个分块绘制命令队列的容量
    pub queue_capacity: usize,
    /// 按光照强度缩放采样颜色
    pub use_lighting: bool,
    /// 渲染帧数
    pub frames: usize,
    /// 等待分块完成的超时（毫秒），0 表示无限等待
    pub frame_timeout_ms: u64,
    /// 保存每一帧，否则只保存最后一帧
    pub save_all_frames: bool,

    // ===== 相机参数 =====
    /// 相机位置，格式为"x,y,z"
    pub camera_position: String,
    /// 偏航角（度）
    pub camera_yaw: f32,
    /// 俯仰角（度）
    pub camera_pitch: f32,
    /// 垂直视场角（度）
    pub camera_fov: f32,
    pub camera_near: f32,
    pub camera_far: f32,

    // ===== 相机运动 =====
    /// 每帧偏航增量（度）
    pub yaw_per_frame: f32,
    /// 每帧俯仰增量（度）
    pub pitch_per_frame: f32,
}

/// 辅助函数用于解析逗号分隔的浮点数
pub fn parse_vec3(s: &str) -> Result<Vector3<f32>, String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 3 {
        return Err(format!("需要3个逗号分隔的值，实际为 '{}'", s));
    }
    let mut values = [0.0f32; 3];
    for (value, part) in values.iter_mut().zip(&parts) {
        *value = part
            .trim()
            .parse::<f32>()
            .map_err(|e| format!("无效数字 '{}': {}", part, e))?;
    }
    Ok(Vector3::from(values))
}

pub fn parse_point3(s: &str) -> Result<Point3<f32>, String> {
    parse_vec3(s).map(Point3::from)
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            obj: None,
            texture: None,
            output: "frame".to_string(),
            output_dir: "output_rust".to_string(),

            width: 1024,
            height: 1024,
            tile_size: 16,
            depth_scale: 10000.0,
            queue_capacity: 100,
            use_lighting: false,
            frames: 1,
            frame_timeout_ms: 0,
            save_all_frames: false,

            camera_position: "0,0,2".to_string(),
            camera_yaw: 0.0,
            camera_pitch: 0.0,
            camera_fov: 30.0,
            camera_near: 1.0,
            camera_far: 10.0,

            yaw_per_frame: 0.0,
            pitch_per_frame: 0.0,
        }
    }
}

impl RenderSettings {
    /// 根据配置构建相机，宽高比取自输出尺寸
    pub fn build_camera(&self) -> Result<Camera, String> {
        let position = parse_point3(&self.camera_position)
            .map_err(|e| format!("错误: 相机位置格式不正确: {}", e))?;
        Ok(Camera::new(
            position,
            self.camera_yaw,
            self.camera_pitch,
            self.camera_fov,
            self.width as f32 / self.height as f32,
            self.camera_near,
            self.camera_far,
        ))
    }

    /// 验证渲染参数
    pub fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err("错误: 图像宽度和高度必须大于0".to_string());
        }

        if !self.tile_size.is_power_of_two() {
            return Err(format!("错误: 分块尺寸 {} 必须是2的幂", self.tile_size));
        }

        if self.width % self.tile_size != 0 || self.height % self.tile_size != 0 {
            return Err(format!(
                "错误: 图像尺寸 {}x{} 必须是分块尺寸 {} 的整数倍",
                self.width, self.height, self.tile_size
            ));
        }

        if !(self.depth_scale > 0.0) {
            return Err("错误: 深度缩放系数必须大于0".to_string());
        }

        if self.queue_capacity == 0 {
            return Err("错误: 绘制命令队列容量必须大于0".to_string());
        }

        if let Some(obj_path) = &self.obj {
            if !std::path::Path::new(obj_path).exists() {
                return Err(format!("错误: 找不到OBJ文件 '{}'", obj_path));
            }
        } else {
            return Err("错误: 未指定OBJ文件路径".to_string());
        }

        if self.output_dir.trim().is_empty() {
            return Err("错误: 输出目录不能为空".to_string());
        }

        if self.output.trim().is_empty() {
            return Err("错误: 输出文件名不能为空".to_string());
        }

        if parse_vec3(&self.camera_position).is_err() {
            return Err("错误: 相机位置格式不正确，应为 x,y,z 格式".to_string());
        }

        if !(self.camera_fov > 0.0 && self.camera_fov < 180.0) {
            return Err(format!("错误: 视场角 {} 必须在 (0, 180) 之间", self.camera_fov));
        }

        if !(self.camera_near > 0.0 && self.camera_near < self.camera_far) {
            return Err(format!(
                "错误: 近平面 {} 必须大于0且小于远平面 {}",
                self.camera_near, self.camera_far
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_obj() -> RenderSettings {
        // 任何存在的路径都能通过存在性检查
        RenderSettings {
            obj: Some(env!("CARGO_MANIFEST_DIR").to_string()),
            ..RenderSettings::default()
        }
    }

    #[test]
    fn defaults_are_valid_once_obj_is_set() {
        assert!(RenderSettings::default().validate().is_err());
        assert_eq!(with_obj().validate(), Ok(()));
    }

    #[test]
    fn tile_size_must_divide_image() {
        let mut s = with_obj();
        s.tile_size = 24;
        assert!(s.validate().is_err());

        s.tile_size = 64;
        s.width = 1000;
        assert!(s.validate().is_err());
    }

    #[test]
    fn camera_planes_are_checked() {
        let mut s = with_obj();
        s.camera_near = 10.0;
        s.camera_far = 1.0;
        assert!(s.validate().is_err());
    }

    #[test]
    fn parse_vec3_accepts_spaces_and_rejects_garbage() {
        assert_eq!(parse_vec3(" 1, 2 ,3").unwrap(), Vector3::new(1.0, 2.0, 3.0));
        assert!(parse_vec3("1,2").is_err());
        assert!(parse_vec3("1,x,3").is_err());
    }

    #[test]
    fn camera_uses_configured_position() {
        let cam = with_obj().build_camera().unwrap();
        assert_eq!(cam.position, Point3::new(0.0, 0.0, 2.0));
    }
}
