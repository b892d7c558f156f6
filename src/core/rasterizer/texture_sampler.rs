use super::triangle_data::DrawCommand;
use crate::geometry::interpolation::interpolate_texcoords;
use crate::materials::texture::{Rgba, Texture};
use nalgebra::Vector3;

/// 按重心坐标插值纹理坐标并采样，必要时乘以光照强度
pub fn sample_texture(command: &DrawCommand, bary: Vector3<f32>, texture: &Texture) -> Rgba {
    let [tc1, tc2, tc3] = command.texcoords;
    let tc = interpolate_texcoords(bary, tc1, tc2, tc3);
    let color = texture.sample(tc.x, tc.y);

    if command.intensity >= 1.0 {
        return color;
    }
    apply_intensity(color, command.intensity)
}

/// RGB 乘以强度，alpha 保持不变
#[inline]
pub fn apply_intensity(color: Rgba, intensity: f32) -> Rgba {
    let scale = |c: u8| (c as f32 * intensity.clamp(0.0, 1.0)).round() as u8;
    [scale(color[0]), scale(color[1]), scale(color[2]), color[3]]
}
