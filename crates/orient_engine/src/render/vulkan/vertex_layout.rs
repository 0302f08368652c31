//! Vertex input layouts of the scene and overlay pipelines

use ash::vk;

use crate::render::mesh::Vertex;

/// Attribute layout of [`Vertex`]: position, color, uv at locations 0..=2
pub struct SceneVertexLayout;

impl SceneVertexLayout {
    /// Binding 0, advanced per vertex
    pub fn binding_description() -> vk::VertexInputBindingDescription {
        vk::VertexInputBindingDescription {
            binding: 0,
            stride: std::mem::size_of::<Vertex>() as u32,
            input_rate: vk::VertexInputRate::VERTEX,
        }
    }

    /// Position, color, texture coordinate
    pub fn attribute_descriptions() -> [vk::VertexInputAttributeDescription; 3] {
        [
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 0,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: 0,
            },
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 1,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: 12,
            },
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 2,
                format: vk::Format::R32G32_SFLOAT,
                offset: 24,
            },
        ]
    }
}

/// Attribute layout of egui vertices: position and uv in points, then a
/// premultiplied sRGB color as four bytes
pub struct UiVertexLayout;

impl UiVertexLayout {
    /// Binding 0, advanced per vertex
    pub fn binding_description() -> vk::VertexInputBindingDescription {
        vk::VertexInputBindingDescription {
            binding: 0,
            stride: std::mem::size_of::<egui::epaint::Vertex>() as u32,
            input_rate: vk::VertexInputRate::VERTEX,
        }
    }

    /// Position, uv, color
    pub fn attribute_descriptions() -> [vk::VertexInputAttributeDescription; 3] {
        [
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 0,
                format: vk::Format::R32G32_SFLOAT,
                offset: 0,
            },
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 1,
                format: vk::Format::R32G32_SFLOAT,
                offset: 8,
            },
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 2,
                format: vk::Format::R8G8B8A8_UNORM,
                offset: 16,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_layout_matches_vertex() {
        let binding = SceneVertexLayout::binding_description();
        assert_eq!(binding.stride, 32);

        let vertex = Vertex {
            position: [1.0, 2.0, 3.0],
            color: [4.0, 5.0, 6.0],
            uv: [7.0, 8.0],
        };
        let floats: &[f32] = bytemuck::cast_slice(std::slice::from_ref(&vertex));
        for attribute in SceneVertexLayout::attribute_descriptions() {
            let first = floats[attribute.offset as usize / 4];
            let expected = match attribute.location {
                0 => 1.0,
                1 => 4.0,
                _ => 7.0,
            };
            assert_eq!(first, expected);
        }
    }

    #[test]
    fn test_ui_layout_matches_egui_vertex() {
        assert_eq!(UiVertexLayout::binding_description().stride, 20);

        let attributes = UiVertexLayout::attribute_descriptions();
        let last = attributes[2];
        // color occupies the final four bytes
        assert_eq!(last.offset + 4, UiVertexLayout::binding_description().stride);
        assert_eq!(last.format, vk::Format::R8G8B8A8_UNORM);
    }
}
