use crate::core::tile_grid::TileGrid;
use crate::materials::texture::Rgba;
use atomic_float::AtomicF32;
use rayon::prelude::*;
use std::ops::Range;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// 帧缓冲区实现，存储渲染结果
///
/// 颜色与深度缓冲在进程生命周期内只分配一次，每帧由控制线程清除。
/// 分块工作线程只能通过 [`TileView`] 写入，而视图只能被切分一次，
/// 因此任意两个线程都不会写同一个像素。
pub struct FrameBuffer {
    pub width: usize,
    pub height: usize,
    /// 深度清除值（远处哨兵）
    pub far_depth: f32,
    /// 存储深度值，数值越小表示越近。
    depth_buffer: Vec<AtomicF32>,
    /// 存储RGBA颜色值 [0, 255]，每像素4个通道。
    color_buffer: Vec<AtomicU8>,
    partitioned: AtomicBool,
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize, far_depth: f32) -> Self {
        let num_pixels = width * height;

        let depth_buffer = (0..num_pixels).map(|_| AtomicF32::new(far_depth)).collect();
        let color_buffer = (0..num_pixels * 4).map(|_| AtomicU8::new(0)).collect();

        FrameBuffer {
            width,
            height,
            far_depth,
            depth_buffer,
            color_buffer,
            partitioned: AtomicBool::new(false),
        }
    }

    /// 清除所有缓冲区：颜色归零，深度重置为远处哨兵
    ///
    /// 在控制线程上顺序执行，必须发生在广播 RUNNING 之前。
    pub fn clear(&self) {
        for depth in &self.depth_buffer {
            depth.store(self.far_depth, Ordering::Relaxed);
        }
        for channel in &self.color_buffer {
            channel.store(0, Ordering::Relaxed);
        }
    }

    /// 按分块网格把缓冲区切分为互不重叠的写入视图，只允许调用一次
    pub fn split_into_tiles(self: &Arc<Self>, grid: &TileGrid) -> Result<Vec<TileView>, String> {
        if grid.width != self.width || grid.height != self.height {
            return Err(format!(
                "分块网格 {}x{} 与帧缓冲区 {}x{} 尺寸不一致",
                grid.width, grid.height, self.width, self.height
            ));
        }
        if self.partitioned.swap(true, Ordering::AcqRel) {
            return Err("帧缓冲区已经被切分过，不能再次创建分块视图".to_string());
        }

        Ok((0..grid.tile_count())
            .map(|id| {
                let (x_range, y_range) = grid.pixel_ranges(id);
                TileView {
                    id,
                    x_range,
                    y_range,
                    buffer: Arc::clone(self),
                }
            })
            .collect())
    }

    #[inline]
    pub fn pixel_index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    pub fn depth_at(&self, x: usize, y: usize) -> f32 {
        self.depth_buffer[self.pixel_index(x, y)].load(Ordering::Relaxed)
    }

    pub fn color_at(&self, x: usize, y: usize) -> Rgba {
        let base = self.pixel_index(x, y) * 4;
        [
            self.color_buffer[base].load(Ordering::Relaxed),
            self.color_buffer[base + 1].load(Ordering::Relaxed),
            self.color_buffer[base + 2].load(Ordering::Relaxed),
            self.color_buffer[base + 3].load(Ordering::Relaxed),
        ]
    }

    /// 获取颜色缓冲区的RGBA字节数据
    ///
    /// 屏幕坐标y向上增长，`flip_vertical` 为真时按图像约定（第0行在顶部）输出。
    pub fn get_color_buffer_bytes(&self, flip_vertical: bool) -> Vec<u8> {
        let row_bytes = self.width * 4;
        let mut bytes = vec![0u8; row_bytes * self.height];

        bytes
            .par_chunks_mut(row_bytes)
            .enumerate()
            .for_each(|(row, out)| {
                let src_row = if flip_vertical {
                    self.height - 1 - row
                } else {
                    row
                };
                let src = &self.color_buffer[src_row * row_bytes..(src_row + 1) * row_bytes];
                for (dst, channel) in out.iter_mut().zip(src) {
                    *dst = channel.load(Ordering::Relaxed);
                }
            });

        bytes
    }

    /// 获取深度缓冲区的浮点数据
    pub fn get_depth_buffer_f32(&self) -> Vec<f32> {
        self.depth_buffer
            .iter()
            .map(|atomic_depth| atomic_depth.load(Ordering::Relaxed))
            .collect()
    }
}

/// 单个分块对帧缓冲区的独占写入视图
///
/// 所有读写都以视图自身的像素范围为界，越界坐标会被忽略而不是 panic。
pub struct TileView {
    pub id: usize,
    x_range: Range<usize>,
    y_range: Range<usize>,
    buffer: Arc<FrameBuffer>,
}

impl TileView {
    pub fn x_range(&self) -> Range<usize> {
        self.x_range.clone()
    }

    pub fn y_range(&self) -> Range<usize> {
        self.y_range.clone()
    }

    #[inline]
    fn contains(&self, x: usize, y: usize) -> bool {
        self.x_range.contains(&x) && self.y_range.contains(&y)
    }

    /// 读取分块内像素的深度；分块外返回 None
    #[inline]
    pub fn depth(&self, x: usize, y: usize) -> Option<f32> {
        if !self.contains(x, y) {
            return None;
        }
        Some(self.buffer.depth_buffer[self.buffer.pixel_index(x, y)].load(Ordering::Relaxed))
    }

    #[inline]
    pub fn store_depth(&self, x: usize, y: usize, depth: f32) {
        if self.contains(x, y) {
            self.buffer.depth_buffer[self.buffer.pixel_index(x, y)]
                .store(depth, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn store_color(&self, x: usize, y: usize, color: Rgba) {
        if !self.contains(x, y) {
            return;
        }
        let base = self.buffer.pixel_index(x, y) * 4;
        for (i, value) in color.into_iter().enumerate() {
            self.buffer.color_buffer[base + i].store(value, Ordering::Relaxed);
        }
    }
}
