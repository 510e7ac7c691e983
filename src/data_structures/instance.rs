//! Instance transformation data for GPU rendering.
//!
//! Every scene node owns one local and one world [`Instance`]. The world
//! transform is uploaded to an instance buffer and read by the vertex shaders.

use std::ops::Mul;

use cgmath::{One, Rad, Rotation3};

use crate::data_structures::model;

/// Position, rotation (as quaternion), and scale of a node.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    pub position: cgmath::Vector3<f32>,
    pub rotation: cgmath::Quaternion<f32>,
    pub scale: cgmath::Vector3<f32>,
}

impl Instance {
    /// Create a new instance with identity transformation (no move, rotate, or scale).
    pub fn new() -> Self {
        Self {
            position: cgmath::Vector3::new(0.0, 0.0, 0.0),
            // `Quaternion::one()` is the identity quaternion (no rotation)
            rotation: cgmath::Quaternion::one(),
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
        }
    }

    /// Rotate around the node's own y axis.
    ///
    /// Right-multiplying keeps this equivalent to bumping the y component of an
    /// XYZ Euler rotation, which is how incremental spins are usually authored.
    pub fn rotate_local_y(&mut self, radians: f32) {
        self.rotation = self.rotation * cgmath::Quaternion::from_angle_y(Rad(radians));
    }

    /// Rotate around the node's own z axis.
    pub fn rotate_local_z(&mut self, radians: f32) {
        self.rotation = self.rotation * cgmath::Quaternion::from_angle_z(Rad(radians));
    }

    pub fn set_uniform_scale(&mut self, factor: f32) {
        self.scale = cgmath::Vector3::new(factor, factor, factor);
    }

    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.position)
            * cgmath::Matrix4::from(self.rotation)
            * cgmath::Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    pub fn to_raw(&self) -> InstanceRaw {
        InstanceRaw {
            model: self.to_matrix().into(),
            normal: cgmath::Matrix3::from(self.rotation).into(),
        }
    }
}

impl<'a, 'b> Mul<&'b Instance> for &'a Instance {
    type Output = Instance;

    /// Compose a parent (`self`) with a child's local transform.
    fn mul(self, rhs: &'b Instance) -> Self::Output {
        let new_rotation = self.rotation * rhs.rotation;

        let new_scale = cgmath::Vector3::new(
            self.scale.x * rhs.scale.x,
            self.scale.y * rhs.scale.y,
            self.scale.z * rhs.scale.z,
        );
        let scaled_rhs_pos = cgmath::Vector3::new(
            self.scale.x * rhs.position.x,
            self.scale.y * rhs.position.y,
            self.scale.z * rhs.position.z,
        );
        let new_position = self.position + (self.rotation * scaled_rhs_pos);

        Instance {
            position: new_position,
            rotation: new_rotation,
            scale: new_scale,
        }
    }
}

impl From<cgmath::Vector3<f32>> for Instance {
    fn from(position: cgmath::Vector3<f32>) -> Self {
        Instance {
            position,
            ..Default::default()
        }
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

/**
 * The raw instance is the actual data stored on the GPU
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    model: [[f32; 4]; 4],
    normal: [[f32; 3]; 3],
}

/**
 * Stride layout: the model matrix as four vec4 slots followed by the normal
 * matrix as three vec3 slots. Locations 5..=11 leave room for the vertex
 * attributes in front.
 */
impl model::Vertex for InstanceRaw {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            // Advance once per instance instead of once per vertex
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // A mat4 takes up 4 vertex slots as it is technically 4 vec4s.
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 8,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 16]>() as wgpu::BufferAddress,
                    shader_location: 9,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 19]>() as wgpu::BufferAddress,
                    shader_location: 10,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 22]>() as wgpu::BufferAddress,
                    shader_location: 11,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{InnerSpace, Vector3};

    use super::*;

    #[test]
    fn local_rotations_accumulate() {
        let mut instance = Instance::new();
        for _ in 0..3 {
            instance.rotate_local_y(0.001);
        }
        let expected = cgmath::Quaternion::from_angle_y(Rad(0.003_f32));
        assert!((instance.rotation - expected).magnitude() < 1e-6);
    }

    #[test]
    fn parent_scale_applies_to_child_offset() {
        let mut parent = Instance::new();
        parent.set_uniform_scale(0.5);
        let child = Instance::from(Vector3::new(2.0, 0.0, 0.0));
        let world = &parent * &child;
        assert_eq!(world.position, Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(world.scale, Vector3::new(0.5, 0.5, 0.5));
    }

    #[test]
    fn model_scale_replaces_the_authored_scale() {
        let model_scale = crate::config::SceneConfig::default().model_scale;
        assert_eq!(model_scale, 0.5);

        // a glTF root node with its own translation, rotation and scale
        let mut node = Instance {
            position: Vector3::new(1.0, 2.0, 3.0),
            rotation: cgmath::Quaternion::from_angle_x(Rad(std::f32::consts::FRAC_PI_2)),
            scale: Vector3::new(2.0, 2.0, 2.0),
        };
        let rotation = node.rotation;
        node.set_uniform_scale(model_scale);

        assert_eq!(node.scale, Vector3::new(0.5, 0.5, 0.5));
        assert_eq!(node.position, Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(node.rotation, rotation);

        // rotating about x leaves the x axis alone, so only the scale shows
        let moved = node.to_matrix() * cgmath::Vector4::new(2.0, 0.0, 0.0, 1.0);
        assert!((moved.truncate() - Vector3::new(2.0, 2.0, 3.0)).magnitude() < 1e-6);
    }
}
