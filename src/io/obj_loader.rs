use crate::materials::model_types::{Mesh, Triangle};
use log::{debug, info, warn};
use nalgebra::{Point3, Vector2};
use std::path::Path;

/// 从文件路径中提取基本文件名（不含扩展名）
fn get_basename_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string())
}

/// 加载 OBJ 文件，把所有模型合并为一个三角形网格
///
/// 多边形面会被三角化；MTL 材质被忽略（纹理由配置单独指定）。
pub fn load_obj_mesh<P: AsRef<Path>>(obj_path: P) -> Result<Mesh, String> {
    let obj_path_ref = obj_path.as_ref();
    info!("加载 OBJ 文件: {:?}", obj_path_ref);

    let load_options = tobj::LoadOptions {
        triangulate: true,
        single_index: false,
        ignore_points: true,
        ignore_lines: true,
        ..Default::default()
    };

    let (models, materials_result) = tobj::load_obj(obj_path_ref, &load_options)
        .map_err(|e| format!("加载 OBJ '{}' 失败: {}", obj_path_ref.display(), e))?;

    if let Err(e) = materials_result {
        debug!("未加载 MTL 材质: {}", e);
    }

    let mesh = mesh_from_models(get_basename_from_path(obj_path_ref), &models)?;
    info!(
        "已加载 {} 个模型，共 {} 个三角形",
        models.len(),
        mesh.len()
    );
    Ok(mesh)
}

/// tobj 模型 -> 三角形列表；索引越界视为数据损坏
pub fn mesh_from_models(name: String, models: &[tobj::Model]) -> Result<Mesh, String> {
    let mut triangles = Vec::new();
    let mut degenerate = 0;

    for model in models {
        let mesh = &model.mesh;
        if mesh.indices.len() % 3 != 0 {
            return Err(format!(
                "模型 '{}' 的索引数量 {} 不是3的倍数",
                model.name,
                mesh.indices.len()
            ));
        }

        let has_texcoords =
            !mesh.texcoords.is_empty() && mesh.texcoord_indices.len() == mesh.indices.len();
        if !has_texcoords {
            warn!("模型 '{}' 没有纹理坐标，使用 (0, 0)", model.name);
        }

        for (face, corners) in mesh.indices.chunks_exact(3).enumerate() {
            let mut positions = [Point3::origin(); 3];
            let mut texcoords = [Vector2::zeros(); 3];

            for corner in 0..3 {
                let index = corners[corner] as usize;
                positions[corner] = position_at(&mesh.positions, index).ok_or_else(|| {
                    format!(
                        "模型 '{}' 的面 {} 引用了越界的顶点索引 {}",
                        model.name, face, index
                    )
                })?;

                if has_texcoords {
                    let tc_index = mesh.texcoord_indices[face * 3 + corner] as usize;
                    texcoords[corner] = texcoord_at(&mesh.texcoords, tc_index).ok_or_else(|| {
                        format!(
                            "模型 '{}' 的面 {} 引用了越界的纹理坐标索引 {}",
                            model.name, face, tc_index
                        )
                    })?;
                }
            }

            let triangle = Triangle::new(positions, texcoords);
            if triangle.face_normal().is_none() {
                degenerate += 1;
            }
            triangles.push(triangle);
        }
    }

    if degenerate > 0 {
        warn!("{} 个三角形面积为0，渲染时会被丢弃", degenerate);
    }

    Ok(Mesh::new(name, triangles))
}

fn position_at(positions: &[f32], index: usize) -> Option<Point3<f32>> {
    let p = positions.get(index * 3..index * 3 + 3)?;
    Some(Point3::new(p[0], p[1], p[2]))
}

fn texcoord_at(texcoords: &[f32], index: usize) -> Option<Vector2<f32>> {
    let t = texcoords.get(index * 2..index * 2 + 2)?;
    Some(Vector2::new(t[0], t[1]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_obj(name: &str, content: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "tile_rasterizer_{}_{}.obj",
            name,
            std::process::id()
        ));
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn quad_is_triangulated_with_texcoords() {
        let path = write_obj(
            "quad",
            "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\n\
             vt 0 0\nvt 1 0\nvt 1 1\nvt 0 1\n\
             f 1/1 2/2 3/3 4/4\n",
        );
        let mesh = load_obj_mesh(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(mesh.len(), 2);
        assert_eq!(mesh.triangles[0].positions[1], Point3::new(1.0, 0.0, 0.0));
        assert_eq!(mesh.triangles[0].texcoords[2], Vector2::new(1.0, 1.0));
    }

    #[test]
    fn missing_texcoords_default_to_origin() {
        let path = write_obj("plain", "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n");
        let mesh = load_obj_mesh(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(mesh.len(), 1);
        assert_eq!(mesh.triangles[0].texcoords, [Vector2::zeros(); 3]);
    }

    #[test]
    fn out_of_range_index_is_fatal() {
        let mesh = tobj::Mesh {
            positions: vec![0.0; 6],
            indices: vec![0, 1, 2],
            ..Default::default()
        };
        let model = tobj::Model::new(mesh, "broken".to_string());

        let err = mesh_from_models("broken".to_string(), &[model]).unwrap_err();
        assert!(err.contains("越界"), "{}", err);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_obj_mesh("/nonexistent/mesh.obj").is_err());
    }
}
