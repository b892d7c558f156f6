use nalgebra::{Point3, Vector2, Vector3};

/// 模型空间三角形：三个顶点位置与对应的纹理坐标
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub positions: [Point3<f32>; 3],
    pub texcoords: [Vector2<f32>; 3],
}

impl Triangle {
    pub fn new(positions: [Point3<f32>; 3], texcoords: [Vector2<f32>; 3]) -> Self {
        Triangle {
            positions,
            texcoords,
        }
    }

    /// 不带纹理坐标的三角形（UV 全为 0）
    pub fn untextured(positions: [Point3<f32>; 3]) -> Self {
        Triangle::new(positions, [Vector2::zeros(); 3])
    }

    /// 模型空间面法线（未归一化时返回 None 表示退化三角形）
    pub fn face_normal(&self) -> Option<Vector3<f32>> {
        let [v1, v2, v3] = self.positions;
        (v3 - v1).cross(&(v2 - v1)).try_normalize(1e-12)
    }
}

/// 一帧内不变的三角形集合
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub name: String,
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new(name: impl Into<String>, triangles: Vec<Triangle>) -> Self {
        Mesh {
            name: name.into(),
            triangles,
        }
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }
}
