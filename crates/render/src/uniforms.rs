//! GPU-visible blocks shared by the PBR shader and its stage.
//!
//! Field order and padding follow WGSL uniform layout rules; the sizes are
//! asserted in tests.

use crate::camera::OrbitCamera;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;

/// Scene matrices and camera data, bound at group 0 binding 0.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SceneMatrices {
    pub projection: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub cam_pos: [f32; 3],
    /// Non-zero flips the V texture coordinate.
    pub flip_uv: f32,
}

impl SceneMatrices {
    pub fn new(camera: &OrbitCamera, model: Mat4, aspect: f32) -> Self {
        Self {
            projection: camera.projection_matrix(aspect).to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            view: camera.view_matrix().to_cols_array_2d(),
            cam_pos: camera.position().to_array(),
            flip_uv: 0.0,
        }
    }
}

/// Lighting parameters, bound at group 0 binding 1.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightParams {
    pub light_dir: [f32; 4],
    pub exposure: f32,
    pub gamma: f32,
    pub prefiltered_cube_mip_levels: f32,
    pub _pad: f32,
}

impl Default for LightParams {
    fn default() -> Self {
        Self {
            light_dir: [0.0, -0.5, -0.5, 1.0],
            exposure: 4.5,
            gamma: 2.2,
            prefiltered_cube_mip_levels: 0.0,
            _pad: 0.0,
        }
    }
}

/// Per-draw material flags and factors, pushed to the fragment stage.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct MaterialBlock {
    pub has_base_colour_texture: f32,
    pub has_metallic_roughness_texture: f32,
    pub has_normal_texture: f32,
    pub has_occlusion_texture: f32,
    pub has_emissive_texture: f32,
    pub metallic_factor: f32,
    pub roughness_factor: f32,
    pub alpha_mask: f32,
    pub alpha_mask_cutoff: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;

    #[test]
    fn block_sizes() {
        assert_eq!(size_of::<SceneMatrices>(), 208);
        assert_eq!(size_of::<LightParams>(), 32);
        assert_eq!(size_of::<MaterialBlock>(), 36);
    }

    #[test]
    fn camera_position_lands_after_matrices() {
        let camera = OrbitCamera::default();
        let block = SceneMatrices::new(&camera, Mat4::IDENTITY, 1.5);
        let bytes = bytemuck::bytes_of(&block);
        let cam_pos: &[f32] = bytemuck::cast_slice(&bytes[192..204]);
        assert_eq!(cam_pos, &camera.position().to_array());
        assert_eq!(block.model, Mat4::IDENTITY.to_cols_array_2d());
    }

    #[test]
    fn default_lighting() {
        let params = LightParams::default();
        assert_eq!(params.exposure, 4.5);
        assert_eq!(params.gamma, 2.2);
    }
}
