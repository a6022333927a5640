use super::Vec2;

/// 3×3 transformation matrix, `m[row][col]`.
///
/// Points are column vectors: `p' = M · (x, y, 1)`. Operations such as
/// [`translate`](Self::translate) right-multiply, so the most recently applied
/// operation acts on geometry first.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Matrix {
    pub m: [[f32; 3]; 3],
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrix {
    #[inline]
    pub const fn identity() -> Self {
        Self { m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]] }
    }

    /// Affine matrix from its six free entries.
    #[inline]
    pub const fn affine(sx: f32, shx: f32, tx: f32, shy: f32, sy: f32, ty: f32) -> Self {
        Self { m: [[sx, shx, tx], [shy, sy, ty], [0.0, 0.0, 1.0]] }
    }

    /// Builds a matrix from nine column-major values
    /// `[sx, shy, w0, shx, sy, w1, tx, ty, w2]`.
    pub fn from_column_major(v: &[f32; 9]) -> Self {
        Self {
            m: [[v[0], v[3], v[6]], [v[1], v[4], v[7]], [v[2], v[5], v[8]]],
        }
    }

    /// Returns the nine column-major values.
    pub fn to_column_major(&self) -> [f32; 9] {
        let m = &self.m;
        [m[0][0], m[1][0], m[2][0], m[0][1], m[1][1], m[2][1], m[0][2], m[1][2], m[2][2]]
    }

    /// Forces the last row to `(0, 0, 1)`.
    #[inline]
    pub fn force_affine(&mut self) {
        self.m[2] = [0.0, 0.0, 1.0];
    }

    #[inline]
    pub fn is_affine(&self) -> bool {
        self.m[2] == [0.0, 0.0, 1.0]
    }

    pub fn mul(&self, rhs: &Matrix) -> Matrix {
        let mut out = [[0.0f32; 3]; 3];
        for (r, row) in out.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                *cell = (0..3).map(|k| self.m[r][k] * rhs.m[k][c]).sum();
            }
        }
        Matrix { m: out }
    }

    pub fn translate(&mut self, tx: f32, ty: f32) {
        *self = self.mul(&Matrix::affine(1.0, 0.0, tx, 0.0, 1.0, ty));
    }

    pub fn scale(&mut self, sx: f32, sy: f32) {
        *self = self.mul(&Matrix::affine(sx, 0.0, 0.0, 0.0, sy, 0.0));
    }

    pub fn shear(&mut self, shx: f32, shy: f32) {
        *self = self.mul(&Matrix::affine(1.0, shx, 0.0, shy, 1.0, 0.0));
    }

    /// Rotates counter-clockwise by `degrees`.
    pub fn rotate(&mut self, degrees: f32) {
        let (s, c) = degrees.to_radians().sin_cos();
        *self = self.mul(&Matrix::affine(c, -s, 0.0, s, c, 0.0));
    }

    pub fn determinant(&self) -> f32 {
        let m = &self.m;
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }

    /// Inverse matrix, or `None` when singular.
    pub fn inverse(&self) -> Option<Matrix> {
        let det = self.determinant();
        if det.abs() <= f32::EPSILON * 1e-3 || !det.is_finite() {
            return None;
        }
        let m = &self.m;
        let inv_det = 1.0 / det;
        let cof = |r0: usize, r1: usize, c0: usize, c1: usize| {
            m[r0][c0] * m[r1][c1] - m[r0][c1] * m[r1][c0]
        };
        Some(Matrix {
            m: [
                [cof(1, 2, 1, 2) * inv_det, -cof(0, 2, 1, 2) * inv_det, cof(0, 1, 1, 2) * inv_det],
                [-cof(1, 2, 0, 2) * inv_det, cof(0, 2, 0, 2) * inv_det, -cof(0, 1, 0, 2) * inv_det],
                [cof(1, 2, 0, 1) * inv_det, -cof(0, 2, 0, 1) * inv_det, cof(0, 1, 0, 1) * inv_det],
            ],
        })
    }

    /// Transforms a point, dividing by the homogeneous coordinate for
    /// projective matrices.
    #[inline]
    pub fn transform_point(&self, p: Vec2) -> Vec2 {
        let m = &self.m;
        let x = m[0][0] * p.x + m[0][1] * p.y + m[0][2];
        let y = m[1][0] * p.x + m[1][1] * p.y + m[1][2];
        if self.is_affine() {
            return Vec2::new(x, y);
        }
        let w = m[2][0] * p.x + m[2][1] * p.y + m[2][2];
        if w == 0.0 { Vec2::new(x, y) } else { Vec2::new(x / w, y / w) }
    }

    /// Transforms a direction (ignores translation).
    #[inline]
    pub fn transform_vector(&self, v: Vec2) -> Vec2 {
        let m = &self.m;
        Vec2::new(m[0][0] * v.x + m[0][1] * v.y, m[1][0] * v.x + m[1][1] * v.y)
    }

    /// Lengths of the transformed X and Y unit axes.
    #[inline]
    pub fn axis_scales(&self) -> (f32, f32) {
        let m = &self.m;
        (
            (m[0][0] * m[0][0] + m[1][0] * m[1][0]).sqrt(),
            (m[0][1] * m[0][1] + m[1][1] * m[1][1]).sqrt(),
        )
    }

    /// Columns padded to `vec4` for uniform upload.
    pub fn to_gpu_columns(&self) -> [[f32; 4]; 3] {
        let m = &self.m;
        [
            [m[0][0], m[1][0], m[2][0], 0.0],
            [m[0][1], m[1][1], m[2][1], 0.0],
            [m[0][2], m[1][2], m[2][2], 0.0],
        ]
    }
}
