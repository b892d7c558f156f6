use nalgebra::{Point3, Vector2};

/// 屏幕空间绘制命令
///
/// 顶点 x、y 以像素为单位，z 为设备深度（NDC z 乘以深度缩放系数，越小越近）。
/// 每个覆盖到的分块各收到一份共享引用，任何工作线程都不会修改它。
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    pub vertices: [Point3<f32>; 3],
    pub texcoords: [Vector2<f32>; 3],
    /// 采样颜色的RGB缩放系数（未启用光照时为1）
    pub intensity: f32,
}

impl DrawCommand {
    pub fn new(vertices: [Point3<f32>; 3], texcoords: [Vector2<f32>; 3]) -> Self {
        DrawCommand {
            vertices,
            texcoords,
            intensity: 1.0,
        }
    }

    pub fn with_intensity(mut self, intensity: f32) -> Self {
        self.intensity = intensity;
        self
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.vertices)
    }
}

/// 屏幕空间包围盒（闭区间，无外扩）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl BoundingBox {
    pub fn from_points(points: &[Point3<f32>; 3]) -> Self {
        let [v1, v2, v3] = points;
        BoundingBox {
            min_x: v1.x.min(v2.x).min(v3.x),
            min_y: v1.y.min(v2.y).min(v3.y),
            max_x: v1.x.max(v2.x).max(v3.x),
            max_y: v1.y.max(v2.y).max(v3.y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounding_box_is_tight() {
        let cmd = DrawCommand::new(
            [
                Point3::new(10.0, 10.0, 0.0),
                Point3::new(10.0, 20.0, 0.0),
                Point3::new(20.0, 10.0, 0.0),
            ],
            [Vector2::zeros(); 3],
        );
        assert_eq!(
            cmd.bounding_box(),
            BoundingBox {
                min_x: 10.0,
                min_y: 10.0,
                max_x: 20.0,
                max_y: 20.0
            }
        );
        assert_eq!(cmd.intensity, 1.0);
    }
}
