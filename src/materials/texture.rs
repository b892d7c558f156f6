use image::RgbaImage;
use log::info;
use std::path::Path;
use std::sync::Arc;

/// RGBA8 颜色
pub type Rgba = [u8; 4];

/// 纹理坐标落在图像外时返回的颜色（透明黑）
pub const OUT_OF_BOUNDS_COLOR: Rgba = [0, 0, 0, 0];

#[derive(Debug, Clone)]
pub enum TextureData {
    Image(Arc<RgbaImage>),
    SolidColor(Rgba),
}

/// 只读纹理，所有分块工作线程共享同一份
#[derive(Debug, Clone)]
pub struct Texture {
    pub data: TextureData,
    pub width: u32,
    pub height: u32,
}

impl Texture {
    /// 从文件加载纹理，失败即返回错误（启动期致命错误）
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path_ref = path.as_ref();
        let img = image::open(path_ref)
            .map_err(|e| format!("无法加载纹理 '{}': {}", path_ref.display(), e))?
            .into_rgba8();

        if img.width() == 0 || img.height() == 0 {
            return Err(format!("纹理 '{}' 尺寸为0", path_ref.display()));
        }

        info!(
            "成功加载纹理: {} ({}x{})",
            path_ref.display(),
            img.width(),
            img.height()
        );
        Ok(Self::from_image(img))
    }

    pub fn from_image(img: RgbaImage) -> Self {
        Texture {
            width: img.width(),
            height: img.height(),
            data: TextureData::Image(Arc::new(img)),
        }
    }

    pub fn solid_color(color: Rgba) -> Self {
        Texture {
            data: TextureData::SolidColor(color),
            width: 1,
            height: 1,
        }
    }

    pub fn get_type_description(&self) -> &'static str {
        match &self.data {
            TextureData::Image(_) => "图像纹理",
            TextureData::SolidColor(_) => "单色纹理",
        }
    }

    /// 按纹理坐标采样（最近邻）
    ///
    /// v 轴翻转：`texelY = (1 - v) * height`。超出图像范围的纹素返回透明黑。
    pub fn sample(&self, u: f32, v: f32) -> Rgba {
        let x = (u * self.width as f32) as i64;
        let y = ((1.0 - v) * self.height as f32) as i64;
        self.texel(x, y)
    }

    /// 读取整数纹素坐标处的颜色
    /// 单色纹理覆盖整个平面，不做范围检查
    pub fn texel(&self, x: i64, y: i64) -> Rgba {
        match &self.data {
            TextureData::SolidColor(color) => *color,
            TextureData::Image(img) => {
                if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
                    return OUT_OF_BOUNDS_COLOR;
                }
                img.get_pixel(x as u32, y as u32).0
            }
        }
    }
}

/// 加载可选纹理：未配置时使用白色单色纹理，配置了但加载失败则报错
pub fn load_texture(path: Option<&str>) -> Result<Texture, String> {
    match path {
        Some(path) => Texture::from_file(path),
        None => {
            info!("未指定纹理，使用白色单色纹理");
            Ok(Texture::solid_color([255, 255, 255, 255]))
        }
    }
}
