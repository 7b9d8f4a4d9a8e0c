use bytemuck::Pod;
use log::{debug, warn};

use crate::context::{
    BufferId, BufferTarget, BufferUsage, ComponentType, GraphicsContext, VertexAttribLayout,
};
use crate::error::SetupError;
use crate::geometry::{Mesh, VertexLayout};
use crate::shader::ShaderProgram;

/// Device buffers holding one uploaded mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryBuffers {
    pub vertex: BufferId,
    pub index: Option<BufferId>,
    pub vertex_count: u32,
    pub index_count: u32,
}

/// Uploads the mesh once. The vertex buffer stays bound to
/// [`BufferTarget::Array`] so attribute pointers set next read from it.
pub fn upload_geometry<V: Pod>(
    ctx: &mut dyn GraphicsContext,
    mesh: &Mesh<V>,
) -> Result<GeometryBuffers, SetupError> {
    mesh.validate()?;

    let vertex = ctx.create_buffer();
    ctx.bind_buffer(BufferTarget::Array, vertex);
    ctx.buffer_data(BufferTarget::Array, mesh.vertex_bytes(), BufferUsage::StaticDraw);

    let index = if mesh.is_indexed() {
        let index = ctx.create_buffer();
        ctx.bind_buffer(BufferTarget::ElementArray, index);
        ctx.buffer_data(
            BufferTarget::ElementArray,
            mesh.index_bytes(),
            BufferUsage::StaticDraw,
        );
        Some(index)
    } else {
        None
    };

    debug!(
        "Uploaded {} vertices and {} indices",
        mesh.vertices.len(),
        mesh.indices.len()
    );
    Ok(GeometryBuffers {
        vertex,
        index,
        vertex_count: mesh.vertices.len() as u32,
        index_count: mesh.indices.len() as u32,
    })
}

/// Points every resolved attribute of `program` at the bound vertex buffer and
/// enables it.
pub fn bind_attributes(
    ctx: &mut dyn GraphicsContext,
    program: &ShaderProgram,
    layout: &VertexLayout,
) -> Result<(), SetupError> {
    for binding in layout.attributes {
        let Some(location) = program.attribute(binding.name) else {
            // Declared in the layout but optimized out of the program.
            warn!("attribute `{}` is not active; skipping", binding.name);
            continue;
        };
        ctx.vertex_attrib_pointer(
            location,
            VertexAttribLayout {
                components: binding.components,
                component_type: ComponentType::Float32,
                normalized: false,
                stride: layout.stride,
                offset: binding.offset,
            },
        );
        ctx.enable_vertex_attrib_array(location)
            .map_err(|reason| SetupError::AttributeEnable {
                name: binding.name.to_string(),
                reason,
            })?;
    }
    Ok(())
}

/// Makes `program` current; uniform uploads target the current program.
pub fn activate_program(ctx: &mut dyn GraphicsContext, program: &ShaderProgram) {
    ctx.use_program(program.handle);
}
