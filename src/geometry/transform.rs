use nalgebra::{Matrix4, Point3, Vector3, Vector4};

/// 变换矩阵工厂，提供相机所需的几种变换矩阵
pub struct TransformFactory;
impl TransformFactory {
    /// 创建平移矩阵
    pub fn translation(translation: &Vector3<f32>) -> Matrix4<f32> {
        Matrix4::new_translation(translation)
    }

    /// 先绕X轴（俯仰）再绕Y轴（偏航）的旋转矩阵：R = Ry(yaw) · Rx(pitch)
    pub fn rotation_yaw_pitch(yaw_rad: f32, pitch_rad: f32) -> Matrix4<f32> {
        Matrix4::from_euler_angles(0.0, yaw_rad, 0.0) * Matrix4::from_euler_angles(pitch_rad, 0.0, 0.0)
    }

    /// 创建透视投影矩阵（OpenGL约定，NDC深度范围[-1, 1]，越小越近）
    pub fn perspective(aspect_ratio: f32, fov_y_rad: f32, near: f32, far: f32) -> Matrix4<f32> {
        Matrix4::new_perspective(aspect_ratio, fov_y_rad, near, far)
    }
}

/// 将模型空间点变换到裁剪空间（齐次坐标）
#[inline]
pub fn to_clip(point: &Point3<f32>, view_projection_matrix: &Matrix4<f32>) -> Vector4<f32> {
    view_projection_matrix * point.to_homogeneous()
}

/// 透视除法：裁剪空间 -> NDC
///
/// 只对通过裁剪测试的顶点调用，此时 w 不为 0。
#[inline]
pub fn clip_to_ndc(clip: &Vector4<f32>) -> Point3<f32> {
    Point3::new(clip.x / clip.w, clip.y / clip.w, clip.z / clip.w)
}

/// NDC -> 屏幕像素坐标，z 乘以深度缩放系数
///
/// 注意这里不翻转Y轴：屏幕y向上增长，呈现时再整体垂直翻转。
#[inline]
pub fn ndc_to_pixel(ndc: &Point3<f32>, width: f32, height: f32, depth_scale: f32) -> Point3<f32> {
    Point3::new(
        (ndc.x + 1.0) * width / 2.0,
        (ndc.y + 1.0) * height / 2.0,
        ndc.z * depth_scale,
    )
}
