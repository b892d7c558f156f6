use nalgebra::{Point2, Point3, Vector2, Vector3};

const EPSILON: f32 = 1e-12; // Below this the screen triangle has no area

/// Calculates barycentric weights (u, v, w) of point p with respect to the
/// screen-space triangle (v1, v2, v3), using only x and y.
///
/// The weights solve `u*(v1 - v3) + v*(v2 - v3) + (v3 - p) = 0`, i.e. the vector
/// (u, v, 1) is orthogonal to both the x-row and the y-row of the edge matrix,
/// so it is proportional to their cross product.
/// Returns None if the triangle is degenerate.
pub fn barycentric_coordinates(
    p: Point2<f32>,
    v1: &Point3<f32>,
    v2: &Point3<f32>,
    v3: &Point3<f32>,
) -> Option<Vector3<f32>> {
    let x_row = Vector3::new(v1.x - v3.x, v2.x - v3.x, v3.x - p.x);
    let y_row = Vector3::new(v1.y - v3.y, v2.y - v3.y, v3.y - p.y);

    let cross = x_row.cross(&y_row);

    if cross.z.abs() < EPSILON {
        return None; // Degenerate triangle
    }

    let u = cross.x / cross.z;
    let v = cross.y / cross.z;

    Some(Vector3::new(u, v, 1.0 - u - v))
}

/// Inclusive on all three edges: a pixel exactly on an edge shared by two
/// triangles is covered by both.
#[inline(always)]
pub fn is_inside_triangle(bary: Vector3<f32>) -> bool {
    bary.x >= 0.0 && bary.y >= 0.0 && bary.x + bary.y <= 1.0
}

/// Linear (screen-space) interpolation of device depth.
#[inline(always)]
pub fn interpolate_depth(bary: Vector3<f32>, z1: f32, z2: f32, z3: f32) -> f32 {
    bary.x * z1 + bary.y * z2 + bary.z * z3
}

/// Interpolates texture coordinates with the same weights as depth.
#[inline(always)]
pub fn interpolate_texcoords(
    bary: Vector3<f32>,
    tc1: Vector2<f32>,
    tc2: Vector2<f32>,
    tc3: Vector2<f32>,
) -> Vector2<f32> {
    tc1 * bary.x + tc2 * bary.y + tc3 * bary.z
}
