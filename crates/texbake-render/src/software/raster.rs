//! Scanline-free triangle rasterization with perspective-correct attributes.

use glam::{Vec2, Vec3, Vec4, Vec4Swizzles};
use texbake_core::{Camera, MeshObject};

use super::texture::Texture;

/// Interpolated surface attributes at one covered pixel.
pub(crate) struct Fragment<'a> {
    pub(crate) object: &'a MeshObject,
    /// World-space position.
    pub(crate) position: Vec3,
    /// World-space unit normal.
    pub(crate) normal: Vec3,
    pub(crate) occlusion: f32,
    /// Distance from the camera plane along its forward axis.
    pub(crate) view_depth: f32,
}

/// Signed doubled area of `(a, b, p)`.
fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

/// Rasterizes every triangle of `object` as seen by `camera` into `texture`.
///
/// Triangles are double-sided. Fragments outside the camera's near/far range
/// are discarded, and triangles with a vertex behind the camera are skipped.
/// `shade` runs only for fragments that pass the depth test.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::many_single_char_names
)]
pub(crate) fn draw_object<F>(object: &MeshObject, camera: &Camera, texture: &mut Texture, mut shade: F)
where
    F: FnMut(&Fragment<'_>) -> Vec4,
{
    let (width, height) = (texture.width(), texture.height());
    let size = Vec2::new(width as f32, height as f32);
    let view_proj = camera.view_projection_matrix(size.x / size.y);

    for (indices, world) in object.triangle_vertices() {
        let clip = world.map(|p| view_proj * p.extend(1.0));
        if clip.iter().any(|c| c.w <= f32::EPSILON) {
            continue;
        }
        let ndc = clip.map(|c| c.xyz() / c.w);
        let screen = ndc.map(|n| Vec2::new((n.x * 0.5 + 0.5) * size.x, (0.5 - n.y * 0.5) * size.y));

        let area = edge(screen[0], screen[1], screen[2]);
        if area.abs() <= f32::EPSILON {
            continue;
        }

        let lo = screen[0].min(screen[1]).min(screen[2]).max(Vec2::ZERO);
        let hi = screen[0].max(screen[1]).max(screen[2]).min(size);
        if lo.x >= hi.x || lo.y >= hi.y {
            continue;
        }
        let (x0, y0) = (lo.x.floor() as u32, lo.y.floor() as u32);
        let (x1, y1) = ((hi.x.ceil() as u32).min(width), (hi.y.ceil() as u32).min(height));

        let face_normal = (world[1] - world[0]).cross(world[2] - world[0]).normalize_or_zero();
        let normals = indices.map(|i| object.normal(i, face_normal));
        let occlusion = indices.map(|i| object.occlusion_at(i));
        let inv_w = clip.map(|c| 1.0 / c.w);

        for y in y0..y1 {
            for x in x0..x1 {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let w = [
                    edge(screen[1], screen[2], p) / area,
                    edge(screen[2], screen[0], p) / area,
                    edge(screen[0], screen[1], p) / area,
                ];
                if w.iter().any(|&v| v < 0.0) {
                    continue;
                }

                let z = w[0] * ndc[0].z + w[1] * ndc[1].z + w[2] * ndc[2].z;
                if !(0.0..=1.0).contains(&z) || z >= texture.depth_at(x, y) {
                    continue;
                }

                let pw = [w[0] * inv_w[0], w[1] * inv_w[1], w[2] * inv_w[2]];
                let sum = pw[0] + pw[1] + pw[2];
                let b = pw.map(|v| v / sum);

                let position = world[0] * b[0] + world[1] * b[1] + world[2] * b[2];
                let fragment = Fragment {
                    object,
                    position,
                    normal: (normals[0] * b[0] + normals[1] * b[1] + normals[2] * b[2])
                        .normalize_or_zero(),
                    occlusion: occlusion[0] * b[0] + occlusion[1] * b[1] + occlusion[2] * b[2],
                    view_depth: camera.view_depth(position),
                };
                let color = shade(&fragment);
                texture.write_tested(x, y, z, color);
            }
        }
    }
}
