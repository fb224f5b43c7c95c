use std::io::{self, Write};

use loam_geom::Vec3;

/// Flat vertex buffers for one terrain chunk at one LOD.
#[derive(Default, Clone, Debug, PartialEq)]
pub struct MeshPayload {
    pub lod: u8,
    /// Vertices along one side of the grid.
    pub verts_per_line: usize,
    pub pos: Vec<f32>,
    pub norm: Vec<f32>,
    pub uv: Vec<f32>,
    pub idx: Vec<u32>,
}

impl MeshPayload {
    pub fn with_grid(lod: u8, verts_per_line: usize) -> Self {
        let n_verts = verts_per_line * verts_per_line;
        let n_quads = verts_per_line.saturating_sub(1).pow(2);
        Self {
            lod,
            verts_per_line,
            pos: Vec::with_capacity(n_verts * 3),
            norm: Vec::with_capacity(n_verts * 3),
            uv: Vec::with_capacity(n_verts * 2),
            idx: Vec::with_capacity(n_quads * 6),
        }
    }

    #[inline]
    pub fn push_vertex(&mut self, p: Vec3, uv: (f32, f32)) {
        self.pos.extend_from_slice(&[p.x, p.y, p.z]);
        self.uv.extend_from_slice(&[uv.0, uv.1]);
    }

    #[inline]
    pub fn add_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.idx.extend_from_slice(&[a, b, c]);
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.pos.len() / 3
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.idx.len() / 3
    }

    #[inline]
    pub fn position(&self, i: usize) -> Vec3 {
        Vec3::new(self.pos[i * 3], self.pos[i * 3 + 1], self.pos[i * 3 + 2])
    }

    #[inline]
    pub fn normal(&self, i: usize) -> Vec3 {
        Vec3::new(self.norm[i * 3], self.norm[i * 3 + 1], self.norm[i * 3 + 2])
    }

    #[inline]
    pub fn uv_at(&self, i: usize) -> (f32, f32) {
        (self.uv[i * 2], self.uv[i * 2 + 1])
    }

    /// Returns a slice of interleaved vertex positions (x,y,z per vertex).
    pub fn positions(&self) -> &[f32] {
        &self.pos
    }
    /// Returns a slice of interleaved vertex normals (x,y,z per vertex).
    pub fn normals(&self) -> &[f32] {
        &self.norm
    }

    /// Smooth normals: the unit face normals around each vertex, summed with
    /// equal weight. Vertices touched by no triangle point up.
    pub(crate) fn recalculate_normals(&mut self) {
        let mut acc = vec![Vec3::ZERO; self.vertex_count()];
        for tri in self.idx.chunks_exact(3) {
            let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
            let pa = self.position(a);
            let n = (self.position(b) - pa).cross(self.position(c) - pa).normalized();
            acc[a] += n;
            acc[b] += n;
            acc[c] += n;
        }
        self.norm.clear();
        for n in acc {
            let n = if n.length() > 0.0 { n.normalized() } else { Vec3::UP };
            self.norm.extend_from_slice(&[n.x, n.y, n.z]);
        }
    }

    /// Wavefront OBJ with positions, UVs and normals.
    pub fn write_obj<W: Write>(&self, mut out: W) -> io::Result<()> {
        writeln!(out, "# loam terrain mesh lod {}", self.lod)?;
        for p in self.pos.chunks_exact(3) {
            writeln!(out, "v {} {} {}", p[0], p[1], p[2])?;
        }
        for t in self.uv.chunks_exact(2) {
            writeln!(out, "vt {} {}", t[0], t[1])?;
        }
        for n in self.norm.chunks_exact(3) {
            writeln!(out, "vn {} {} {}", n[0], n[1], n[2])?;
        }
        for f in self.idx.chunks_exact(3) {
            let (a, b, c) = (f[0] + 1, f[1] + 1, f[2] + 1);
            writeln!(out, "f {a}/{a}/{a} {b}/{b}/{b} {c}/{c}/{c}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lone_vertex_gets_up_normal() {
        let mut m = MeshPayload::with_grid(0, 1);
        m.push_vertex(Vec3::new(0.0, 3.0, 0.0), (0.0, 0.0));
        m.recalculate_normals();
        assert_eq!(m.normal(0), Vec3::UP);
    }

    #[test]
    fn face_normals_count_equally_regardless_of_area() {
        let mut m = MeshPayload::default();
        m.push_vertex(Vec3::new(0.0, 0.0, 0.0), (0.0, 0.0));
        // Large flat face, normal +y.
        m.push_vertex(Vec3::new(0.0, 0.0, 10.0), (0.0, 0.0));
        m.push_vertex(Vec3::new(10.0, 0.0, 0.0), (0.0, 0.0));
        // Tiny wall, normal +x.
        m.push_vertex(Vec3::new(0.0, 0.0, -0.1), (0.0, 0.0));
        m.push_vertex(Vec3::new(0.0, 0.1, 0.0), (0.0, 0.0));
        m.add_triangle(0, 1, 2);
        m.add_triangle(0, 3, 4);
        m.recalculate_normals();

        let n = m.normal(0);
        let h = std::f32::consts::FRAC_1_SQRT_2;
        assert!((n.x - h).abs() < 1e-5, "{n:?}");
        assert!((n.y - h).abs() < 1e-5, "{n:?}");
        assert!(n.z.abs() < 1e-5, "{n:?}");
        assert_eq!(m.normal(1), Vec3::UP);
    }

    #[test]
    fn obj_export_is_one_based() {
        let mut m = MeshPayload::with_grid(0, 2);
        m.push_vertex(Vec3::new(0.0, 0.0, 0.0), (0.0, 0.0));
        m.push_vertex(Vec3::new(1.0, 0.0, -1.0), (1.0, 1.0));
        m.push_vertex(Vec3::new(0.0, 0.0, -1.0), (0.0, 1.0));
        m.add_triangle(0, 1, 2);
        m.recalculate_normals();
        let mut buf = Vec::new();
        m.write_obj(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("f 1/1/1 2/2/2 3/3/3"));
        assert_eq!(text.lines().filter(|l| l.starts_with("v ")).count(), 3);
    }
}
