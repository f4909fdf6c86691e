//! Small 2D helpers shared by the sensor and body models

pub type Vec2f = [f32; 2];

/// Row-major 2×2 matrix.
pub type Mat2f = [f32; 4];

pub const IDENTITY: Mat2f = [1.0, 0.0, 0.0, 1.0];

pub fn mul_mat(m: &Mat2f, v: Vec2f) -> Vec2f {
    [m[0] * v[0] + m[1] * v[1], m[2] * v[0] + m[3] * v[1]]
}

pub fn add(a: Vec2f, b: Vec2f) -> Vec2f {
    [a[0] + b[0], a[1] + b[1]]
}

pub fn sub(a: Vec2f, b: Vec2f) -> Vec2f {
    [a[0] - b[0], a[1] - b[1]]
}

pub fn scale(v: Vec2f, s: f32) -> Vec2f {
    [v[0] * s, v[1] * s]
}

pub fn dot(a: Vec2f, b: Vec2f) -> f32 {
    a[0] * b[0] + a[1] * b[1]
}

/// z component of the 3D cross product.
pub fn cross(a: Vec2f, b: Vec2f) -> f32 {
    a[0] * b[1] - a[1] * b[0]
}

pub fn len(v: Vec2f) -> f32 {
    v[0].hypot(v[1])
}

/// `None` for the zero vector.
pub fn normalized(v: Vec2f) -> Option<Vec2f> {
    let l = len(v);
    (l > f32::EPSILON).then(|| scale(v, 1.0 / l))
}

pub fn rotation(angle: f32) -> Mat2f {
    let (sin, cos) = angle.sin_cos();
    [cos, -sin, sin, cos]
}
