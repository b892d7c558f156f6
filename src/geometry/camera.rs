use crate::geometry::transform::TransformFactory;
use nalgebra::{Matrix4, Point3};

/// 第一人称相机：位置 + 偏航/俯仰
///
/// 每帧提供一个组合的视图-投影矩阵给几何管线。
#[derive(Debug, Clone)]
pub struct Camera {
    /// 相机位置
    pub position: Point3<f32>,
    /// 偏航角（绕Y轴，弧度）
    pub yaw: f32,
    /// 俯仰角（绕X轴，弧度）
    pub pitch: f32,
    /// 垂直视场角（弧度）
    pub fov_y: f32,
    /// 宽高比（视口宽度/高度）
    pub aspect_ratio: f32,
    /// 近裁剪平面距离
    pub near: f32,
    /// 远裁剪平面距离
    pub far: f32,
}

impl Camera {
    pub fn new(
        position: Point3<f32>,
        yaw_degrees: f32,
        pitch_degrees: f32,
        fov_y_degrees: f32,
        aspect_ratio: f32,
        near: f32,
        far: f32,
    ) -> Self {
        Camera {
            position,
            yaw: yaw_degrees.to_radians(),
            pitch: pitch_degrees.to_radians(),
            fov_y: fov_y_degrees.to_radians(),
            aspect_ratio,
            near,
            far,
        }
    }

    /// 相机朝向的旋转矩阵 R = Ry(yaw) · Rx(pitch)
    pub fn rotation_matrix(&self) -> Matrix4<f32> {
        TransformFactory::rotation_yaw_pitch(self.yaw, self.pitch)
    }

    /// 视图矩阵：Rᵀ · T(-position)
    pub fn view_matrix(&self) -> Matrix4<f32> {
        let translation = TransformFactory::translation(&-self.position.coords);
        self.rotation_matrix().transpose() * translation
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        TransformFactory::perspective(self.aspect_ratio, self.fov_y, self.near, self.far)
    }

    /// 组合的视图-投影矩阵（模型坐标 -> 裁剪坐标）
    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection_matrix() * self.view_matrix()
    }

    /// 按脚本推进相机朝向（替代交互输入）
    pub fn advance(&mut self, yaw_degrees: f32, pitch_degrees: f32) {
        self.yaw += yaw_degrees.to_radians();
        self.pitch += pitch_degrees.to_radians();
    }
}
