use super::texture_sampler::sample_texture;
use super::triangle_data::DrawCommand;
use crate::core::frame_buffer::TileView;
use crate::geometry::interpolation::{barycentric_coordinates, interpolate_depth, is_inside_triangle};
use crate::materials::texture::Texture;
use nalgebra::Point2;
use std::ops::Range;

/// 在单个分块内光栅化一条绘制命令
///
/// 只访问分块自身的像素；三角形落在分块外的部分直接跳过。
/// 扫描范围再与三角形包围盒求交，不改变结果，只减少无效像素。
/// 返回写入的像素数。
pub fn rasterize_in_tile(command: &DrawCommand, tile: &TileView, texture: &Texture) -> usize {
    let bounds = command.bounding_box();
    let xs = clamp_span(tile.x_range(), bounds.min_x, bounds.max_x);
    let ys = clamp_span(tile.y_range(), bounds.min_y, bounds.max_y);

    let [v1, v2, v3] = &command.vertices;
    let mut written = 0;

    for y in ys {
        for x in xs.clone() {
            let pixel_center = Point2::new(x as f32 + 0.5, y as f32 + 0.5);

            let Some(bary) = barycentric_coordinates(pixel_center, v1, v2, v3) else {
                // 退化三角形，整条命令都不会覆盖任何像素
                return written;
            };
            if !is_inside_triangle(bary) {
                continue;
            }

            let depth = interpolate_depth(bary, v1.z, v2.z, v3.z);
            let Some(current) = tile.depth(x, y) else {
                continue;
            };
            if depth < current {
                tile.store_depth(x, y, depth);
                tile.store_color(x, y, sample_texture(command, bary, texture));
                written += 1;
            }
        }
    }

    written
}

/// 分块像素范围与包围盒 [min, max] 的交集
///
/// 像素 x 的中心为 x + 0.5，中心落在 [min, max] 内的像素满足
/// floor(min - 0.5) < x <= max - 0.5，这里取略宽的 [floor(min) - 1, ceil(max)]。
fn clamp_span(tile: Range<usize>, min: f32, max: f32) -> Range<usize> {
    if !(min <= max) {
        return tile.start..tile.start;
    }
    let lo = (min.floor() - 1.0).max(0.0) as usize;
    let hi = (max.ceil() + 1.0).max(0.0) as usize;
    let start = tile.start.max(lo);
    let end = tile.end.min(hi);
    start..end.max(start)
}
