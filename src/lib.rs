//! 分块并行软件光栅化器
//!
//! 图像被划分为固定尺寸的方形分块，每个分块由一个长期运行的工作线程独占。
//! 控制线程完成几何处理后把绘制命令分发给覆盖到的分块，并在每帧结束时
//! 等待所有分块确认完成。

pub mod core;
pub mod geometry;
pub mod io;
pub mod materials;
pub mod utils;

pub use crate::core::renderer::{FrameStats, Renderer};
pub use crate::io::render_settings::RenderSettings;
