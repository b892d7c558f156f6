use crate::core::frame_buffer::FrameBuffer;
use crate::core::geometry_processor::{ProjectedTriangle, Rejection, Viewport, process_triangle};
use crate::core::graph_controller::GraphController;
use crate::core::rasterizer::{BoundingBox, DrawCommand};
use crate::core::tile_grid::TileGrid;
use crate::core::tile_worker::GraphState;
use crate::io::render_settings::RenderSettings;
use crate::materials::model_types::Mesh;
use crate::materials::texture::Texture;
use log::debug;
use nalgebra::Matrix4;
use rayon::prelude::*;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// 单帧统计
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    pub triangles: usize,
    /// 因顶点在视体外被整体剔除
    pub clipped: usize,
    /// 背面或退化三角形
    pub back_facing: usize,
    /// 投递到分块队列的命令总数（一个三角形可覆盖多个分块）
    pub draw_commands: usize,
    pub elapsed: Duration,
}

/// 分块并行渲染器
///
/// 持有帧缓冲区、分块网格和工作线程池。每帧流程：
/// 清除缓冲区 -> 广播 Running -> 几何处理与分发 -> 广播 Done -> 等待全部分块完成。
pub struct Renderer {
    grid: TileGrid,
    frame_buffer: Arc<FrameBuffer>,
    controller: GraphController,
    viewport: Viewport,
    use_lighting: bool,
}

impl Renderer {
    pub fn new(settings: &RenderSettings, texture: Arc<Texture>) -> Result<Self, String> {
        let grid = TileGrid::new(settings.width, settings.height, settings.tile_size)?;
        if !(settings.depth_scale > 0.0) {
            return Err(format!("错误: 深度缩放系数必须大于0，当前为 {}", settings.depth_scale));
        }

        // 所有可见深度都在 [-depth_scale, depth_scale] 内，远处哨兵取其两倍
        let frame_buffer = Arc::new(FrameBuffer::new(
            settings.width,
            settings.height,
            settings.depth_scale * 2.0,
        ));
        let frame_timeout = match settings.frame_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        };
        let controller = GraphController::spawn(
            &grid,
            &frame_buffer,
            texture,
            settings.queue_capacity,
            frame_timeout,
        )?;

        Ok(Renderer {
            grid,
            frame_buffer,
            controller,
            viewport: Viewport {
                width: settings.width as f32,
                height: settings.height as f32,
                depth_scale: settings.depth_scale,
            },
            use_lighting: settings.use_lighting,
        })
    }

    pub fn frame_buffer(&self) -> &FrameBuffer {
        &self.frame_buffer
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    /// 清除缓冲区后广播 Running；清除必须先于任何工作线程进入新帧
    pub fn begin_frame(&self) -> Result<(), String> {
        // 失败帧的工作线程可能仍在写入，不能清除
        if self.controller.is_failed() {
            return Err("渲染器已失效: 之前的帧未能完成".to_string());
        }
        self.frame_buffer.clear();
        self.controller.change_state(GraphState::Running)
    }

    /// 把一条绘制命令投递给其包围盒覆盖的每个分块，返回投递数量
    pub fn submit(&self, command: DrawCommand, bounds: &BoundingBox) -> Result<usize, String> {
        let tiles = self.grid.tiles_for_box(bounds);
        let command = Arc::new(command);
        for &id in &tiles {
            self.controller.notify_tile(id, &command)?;
        }
        Ok(tiles.len())
    }

    /// 广播 Done 并阻塞到所有分块确认完成
    ///
    /// 超过帧期限时返回错误，之后渲染器不再接受新帧。
    pub fn end_frame(&self) -> Result<(), String> {
        self.controller.change_state(GraphState::Done)?;
        self.controller.wait_for_tiles()
    }

    /// 渲染一帧；返回后帧缓冲区内容完整可读
    pub fn render_frame(
        &self,
        mesh: &Mesh,
        view_projection: &Matrix4<f32>,
    ) -> Result<FrameStats, String> {
        let start_time = Instant::now();
        let mut stats = FrameStats {
            triangles: mesh.len(),
            ..FrameStats::default()
        };

        self.begin_frame()?;

        // 几何阶段并行计算，collect 保持网格顺序，分发仍按原顺序进行
        let viewport = &self.viewport;
        let projected: Vec<Result<ProjectedTriangle, Rejection>> = mesh
            .triangles
            .par_iter()
            .map(|triangle| process_triangle(triangle, view_projection, viewport))
            .collect();

        for result in projected {
            match result {
                Ok(ProjectedTriangle {
                    command,
                    bounds,
                    magnitude,
                }) => {
                    let command = if self.use_lighting {
                        command.with_intensity(magnitude)
                    } else {
                        command
                    };
                    stats.draw_commands += self.submit(command, &bounds)?;
                }
                Err(Rejection::Clipped) => stats.clipped += 1,
                Err(Rejection::BackFacing) | Err(Rejection::Degenerate) => {
                    stats.back_facing += 1
                }
            }
        }

        self.end_frame()?;

        stats.elapsed = start_time.elapsed();
        debug!(
            "帧完成: {} 个三角形, {} 个被裁剪, {} 个背面, {} 条分块命令",
            stats.triangles, stats.clipped, stats.back_facing, stats.draw_commands
        );
        Ok(stats)
    }

    /// 关闭工作线程池，之后不能再渲染
    pub fn shutdown(&mut self) {
        self.controller.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materials::model_types::Triangle;
    use nalgebra::{Point3, Vector2};

    fn settings() -> RenderSettings {
        RenderSettings {
            width: 64,
            height: 64,
            tile_size: 16,
            depth_scale: 100.0,
            queue_capacity: 8,
            frame_timeout_ms: 10_000,
            ..RenderSettings::default()
        }
    }

    fn renderer(color: [u8; 4]) -> Renderer {
        Renderer::new(&settings(), Arc::new(Texture::solid_color(color))).unwrap()
    }

    /// 单位视图投影下屏幕坐标到模型坐标
    fn at(x: f32, y: f32, z: f32) -> Point3<f32> {
        Point3::new(x / 32.0 - 1.0, y / 32.0 - 1.0, z)
    }

    fn triangle(z: f32) -> Triangle {
        Triangle::new(
            [at(2.0, 2.0, z), at(12.0, 2.0, z), at(2.0, 12.0, z)],
            [Vector2::zeros(); 3],
        )
    }

    #[test]
    fn empty_mesh_frame_terminates() {
        let r = renderer([255; 4]);
        let stats = r
            .render_frame(&Mesh::default(), &Matrix4::identity())
            .unwrap();
        assert_eq!(stats.draw_commands, 0);
        assert!(r.frame_buffer().get_depth_buffer_f32().iter().all(|&d| d == 200.0));
    }

    #[test]
    fn triangle_in_first_tile_only_reaches_that_tile() {
        let r = renderer([9, 9, 9, 255]);
        let mesh = Mesh::new("one", vec![triangle(0.0)]);

        let stats = r.render_frame(&mesh, &Matrix4::identity()).unwrap();

        assert_eq!(stats.draw_commands, 1);
        assert_eq!(r.frame_buffer().color_at(4, 4), [9, 9, 9, 255]);
        assert_eq!(r.frame_buffer().color_at(20, 20), [0, 0, 0, 0]);
    }

    #[test]
    fn closer_triangle_wins_in_mesh_order() {
        for zs in [[0.5, -0.5], [-0.5, 0.5]] {
            let r = renderer([1, 2, 3, 255]);
            let mesh = Mesh::new("pair", zs.iter().map(|&z| triangle(z)).collect());
            r.render_frame(&mesh, &Matrix4::identity()).unwrap();
            assert_eq!(r.frame_buffer().depth_at(4, 4), -50.0);
        }
    }

    #[test]
    fn back_facing_triangle_produces_no_commands() {
        let r = renderer([255; 4]);
        let back = Triangle::untextured([at(2.0, 2.0, 0.0), at(2.0, 12.0, 0.0), at(12.0, 2.0, 0.0)]);
        let stats = r
            .render_frame(&Mesh::new("back", vec![back]), &Matrix4::identity())
            .unwrap();
        assert_eq!(stats.back_facing, 1);
        assert_eq!(stats.draw_commands, 0);
        assert!(r.frame_buffer().get_color_buffer_bytes(false).iter().all(|&c| c == 0));
    }

    #[test]
    fn each_frame_starts_from_a_clear_buffer() {
        let r = renderer([5, 5, 5, 255]);
        let mesh = Mesh::new("one", vec![triangle(0.0)]);
        r.render_frame(&mesh, &Matrix4::identity()).unwrap();
        r.render_frame(&Mesh::default(), &Matrix4::identity()).unwrap();
        assert_eq!(r.frame_buffer().color_at(4, 4), [0, 0, 0, 0]);
    }

    #[test]
    fn lighting_scales_color_by_magnitude() {
        let mut s = settings();
        s.use_lighting = true;
        let r = Renderer::new(&s, Arc::new(Texture::solid_color([200, 100, 50, 255]))).unwrap();
        // 面向光源的三角形 magnitude = 1，颜色不变
        r.render_frame(&Mesh::new("one", vec![triangle(0.0)]), &Matrix4::identity())
            .unwrap();
        assert_eq!(r.frame_buffer().color_at(4, 4), [200, 100, 50, 255]);
    }

    #[test]
    fn invalid_depth_scale_is_rejected() {
        let mut s = settings();
        s.depth_scale = 0.0;
        assert!(Renderer::new(&s, Arc::new(Texture::solid_color([0; 4]))).is_err());
    }
}
