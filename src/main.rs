use log::{error, info, warn};
use std::fs;
use std::sync::Arc;
use std::time::Instant;
use tile_rasterizer::io::obj_loader::load_obj_mesh;
use tile_rasterizer::io::simple_cli::SimpleCli;
use tile_rasterizer::materials::texture::load_texture;
use tile_rasterizer::utils::save_utils::{frame_path, save_frame_png};
use tile_rasterizer::{RenderSettings, Renderer};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let settings = SimpleCli::process()?;
    settings.validate()?;

    let start_time = Instant::now();
    let obj_path = settings.obj.as_deref().ok_or("错误: 未指定OBJ文件路径")?;
    let mesh = load_obj_mesh(obj_path)?;
    if mesh.is_empty() {
        warn!("模型 '{}' 不包含任何三角形，将输出空白帧", mesh.name);
    }
    let texture = Arc::new(load_texture(settings.texture.as_deref())?);
    info!(
        "场景加载完成: {} 个三角形, 纹理 {} ({}x{}), 用时 {:?}",
        mesh.len(),
        texture.get_type_description(),
        texture.width,
        texture.height,
        start_time.elapsed()
    );

    fs::create_dir_all(&settings.output_dir)
        .map_err(|e| format!("创建输出目录 '{}' 失败: {}", settings.output_dir, e))?;

    let mut renderer = Renderer::new(&settings, texture)?;
    info!(
        "渲染器就绪: {}x{}, {} 个 {}x{} 分块",
        settings.width,
        settings.height,
        renderer.grid().tile_count(),
        settings.tile_size,
        settings.tile_size
    );

    let result = render_frames(&settings, &renderer, &mesh);
    renderer.shutdown();
    result?;

    info!("总执行时间: {:?}", start_time.elapsed());
    Ok(())
}

fn render_frames(
    settings: &RenderSettings,
    renderer: &Renderer,
    mesh: &tile_rasterizer::materials::model_types::Mesh,
) -> Result<(), String> {
    let mut camera = settings.build_camera()?;

    for frame in 0..settings.frames {
        if frame > 0 {
            camera.advance(settings.yaw_per_frame, settings.pitch_per_frame);
        }

        let stats = renderer.render_frame(mesh, &camera.view_projection())?;
        info!(
            "帧 {}: {:?} ({} 个三角形, {} 个被裁剪, {} 个背面)",
            frame, stats.elapsed, stats.triangles, stats.clipped, stats.back_facing
        );

        let is_last = frame + 1 == settings.frames;
        if settings.save_all_frames || is_last {
            let path = frame_path(&settings.output_dir, &settings.output, frame);
            save_frame_png(renderer.frame_buffer(), &path)?;
            info!("已保存 {}", path.display());
        }
    }

    Ok(())
}
