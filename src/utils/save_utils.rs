use crate::core::frame_buffer::FrameBuffer;
use image::ColorType;
use log::debug;
use std::path::{Path, PathBuf};

/// 保存RGBA图像数据到PNG文件
pub fn save_image<P: AsRef<Path>>(path: P, data: &[u8], width: u32, height: u32) -> Result<(), String> {
    let path_ref = path.as_ref();
    image::save_buffer(path_ref, data, width, height, ColorType::Rgba8)
        .map_err(|e| format!("保存图像到 {} 时出错: {}", path_ref.display(), e))?;
    debug!("图像已保存到 {}", path_ref.display());
    Ok(())
}

/// 帧输出路径：`<output_dir>/<output>_<frame:04>.png`
pub fn frame_path(output_dir: &str, output: &str, frame: usize) -> PathBuf {
    Path::new(output_dir).join(format!("{}_{:04}.png", output, frame))
}

/// 呈现：把帧缓冲区翻转为图像行序后写入PNG
pub fn save_frame_png<P: AsRef<Path>>(frame_buffer: &FrameBuffer, path: P) -> Result<(), String> {
    let bytes = frame_buffer.get_color_buffer_bytes(true);
    save_image(
        path,
        &bytes,
        frame_buffer.width as u32,
        frame_buffer.height as u32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tile_grid::TileGrid;
    use std::sync::Arc;

    #[test]
    fn frame_paths_are_zero_padded() {
        assert_eq!(
            frame_path("out", "frame", 7),
            Path::new("out").join("frame_0007.png")
        );
    }

    #[test]
    fn saved_png_has_image_row_order() {
        let grid = TileGrid::new(16, 16, 16).unwrap();
        let fb = Arc::new(FrameBuffer::new(16, 16, 1.0));
        let views = fb.split_into_tiles(&grid).unwrap();
        // 屏幕坐标 y = 0 在底部
        views[0].store_color(0, 0, [255, 0, 0, 255]);

        let path = std::env::temp_dir().join(format!("tile_rasterizer_{}.png", std::process::id()));
        save_frame_png(&fb, &path).unwrap();
        let img = image::open(&path).unwrap().into_rgba8();
        std::fs::remove_file(&path).ok();

        assert_eq!(img.dimensions(), (16, 16));
        assert_eq!(img.get_pixel(0, 15).0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 0]);
    }
}
