use crate::core::rasterizer::{BoundingBox, DrawCommand};
use crate::geometry::transform::{clip_to_ndc, ndc_to_pixel, to_clip};
use crate::materials::model_types::Triangle;
use nalgebra::{Matrix4, Vector3, Vector4};

/// 固定方向光：指向 +z
#[inline]
pub fn light_direction() -> Vector3<f32> {
    Vector3::z()
}

/// 视口参数：像素尺寸与深度缩放系数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub depth_scale: f32,
}

/// 几何阶段的输出：一条绘制命令、用于分发的包围盒和光照强度
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedTriangle {
    pub command: DrawCommand,
    pub bounds: BoundingBox,
    pub magnitude: f32,
}

/// 三角形被丢弃的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// 至少一个顶点在规范视体之外（整体剔除，不做几何裁剪）
    Clipped,
    /// 背向光源（magnitude < 0）
    BackFacing,
    /// 零面积，无法求法线
    Degenerate,
}

/// 顶点在规范视体内：-w <= x, y, z <= w
#[inline]
pub fn is_inside_clip_volume(v: &Vector4<f32>) -> bool {
    let w = v.w;
    -w <= v.x && v.x <= w && -w <= v.y && v.y <= w && -w <= v.z && v.z <= w
}

/// 任一顶点不在视体内即整体剔除
pub fn should_clip(vertices: &[Vector4<f32>; 3]) -> bool {
    vertices.iter().any(|v| !is_inside_clip_volume(v))
}

/// 几何管线：模型空间三角形 -> 屏幕空间绘制命令
///
/// 法线取自透视除法后的坐标（保留 z），`magnitude = -dot(light, normal)`。
pub fn process_triangle(
    triangle: &Triangle,
    view_projection: &Matrix4<f32>,
    viewport: &Viewport,
) -> Result<ProjectedTriangle, Rejection> {
    let clip = triangle.positions.map(|p| to_clip(&p, view_projection));

    if should_clip(&clip) {
        return Err(Rejection::Clipped);
    }

    let ndc = clip.map(|c| clip_to_ndc(&c));
    let screen =
        ndc.map(|n| ndc_to_pixel(&n, viewport.width, viewport.height, viewport.depth_scale));

    let normal = (ndc[2] - ndc[0])
        .cross(&(ndc[1] - ndc[0]))
        .try_normalize(0.0)
        .filter(|n| n.iter().all(|c| c.is_finite()))
        .ok_or(Rejection::Degenerate)?;

    let magnitude = -light_direction().dot(&normal);
    if magnitude < 0.0 {
        return Err(Rejection::BackFacing);
    }

    let bounds = BoundingBox::from_points(&screen);
    Ok(ProjectedTriangle {
        command: DrawCommand::new(screen, triangle.texcoords),
        bounds,
        magnitude,
    })
}
