//! # 分块三角形光栅化模块
//!
//! 每个分块工作线程只在自己的像素范围内扫描三角形

pub mod pixel_processor;
pub mod texture_sampler;
pub mod triangle_data;

// 重新导出主要类型和函数
pub use pixel_processor::rasterize_in_tile;
pub use triangle_data::{BoundingBox, DrawCommand};
