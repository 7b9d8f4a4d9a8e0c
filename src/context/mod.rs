//! Immediate-mode graphics context consumed by the pipeline.
//!
//! The trait mirrors the small slice of a classic GL-style API the renderer
//! needs: shader objects, buffer objects, vertex attribute pointers, matrix
//! uniforms, clears and draws. Backends translate it to whatever the platform
//! offers; the recording backend keeps a log of every call instead.

mod gpu;
mod recording;
mod reflect;

pub use self::gpu::WgpuContext;
pub use self::recording::{Command, RecordingContext};
pub use self::reflect::{compile_shader, link_program, ProgramInterface, ShaderInterface};

pub use crate::error::ShaderStage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u32);

/// Vertex input slot, the `@location` of a vertex shader input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttribLocation(pub u32);

/// Uniform slot, the `@group`/`@binding` pair of a uniform declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UniformLocation {
    pub group: u32,
    pub binding: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferTarget {
    Array,
    ElementArray,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    /// Uploaded once, never written again.
    StaticDraw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentType {
    Float32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    U16,
}

impl IndexType {
    pub const fn size(self) -> u64 {
        match self {
            Self::U16 => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Triangles,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    DepthTest,
    CullFace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winding {
    Ccw,
    Cw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    Front,
    Back,
}

/// Buffers affected by a clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearMask {
    pub color: bool,
    pub depth: bool,
}

impl ClearMask {
    pub const COLOR_DEPTH: Self = Self {
        color: true,
        depth: true,
    };
}

/// How one attribute is read from the currently bound array buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribLayout {
    pub components: u32,
    pub component_type: ComponentType,
    pub normalized: bool,
    pub stride: u32,
    pub offset: u32,
}

pub trait GraphicsContext {
    /// Compiles one stage. The error carries the compiler's diagnostic log.
    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderId, String>;

    /// Links a vertex and a fragment shader. The error carries the link log.
    fn link_program(&mut self, vertex: ShaderId, fragment: ShaderId) -> Result<ProgramId, String>;

    /// Checks that the program can execute against the current context state.
    fn validate_program(&mut self, program: ProgramId) -> Result<(), String>;

    fn use_program(&mut self, program: ProgramId);

    /// `None` when the program has no active input with that name.
    fn attrib_location(&self, program: ProgramId, name: &str) -> Option<AttribLocation>;

    /// `None` when the program has no active uniform with that name.
    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation>;

    fn create_buffer(&mut self) -> BufferId;

    fn bind_buffer(&mut self, target: BufferTarget, buffer: BufferId);

    /// Copies `data` into the buffer bound to `target`.
    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage);

    /// Declares how `location` reads the buffer currently bound to
    /// [`BufferTarget::Array`].
    fn vertex_attrib_pointer(&mut self, location: AttribLocation, layout: VertexAttribLayout);

    fn enable_vertex_attrib_array(&mut self, location: AttribLocation) -> Result<(), String>;

    /// Uploads a column-major 4x4 matrix to the active program.
    fn uniform_matrix4(&mut self, location: UniformLocation, transpose: bool, value: &[f32; 16]);

    fn enable(&mut self, capability: Capability);

    fn front_face(&mut self, winding: Winding);

    fn cull_face(&mut self, face: Face);

    fn clear_color(&mut self, rgba: [f32; 4]);

    fn clear(&mut self, mask: ClearMask);

    fn draw_arrays(&mut self, primitive: Primitive, first: u32, count: u32);

    fn draw_elements(
        &mut self,
        primitive: Primitive,
        count: u32,
        index_type: IndexType,
        offset: u64,
    );

    /// Hands the commands issued since the previous call to the display.
    fn present(&mut self);
}

impl<T: GraphicsContext + ?Sized> GraphicsContext for &mut T {
    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderId, String> {
        (**self).compile_shader(stage, source)
    }

    fn link_program(&mut self, vertex: ShaderId, fragment: ShaderId) -> Result<ProgramId, String> {
        (**self).link_program(vertex, fragment)
    }

    fn validate_program(&mut self, program: ProgramId) -> Result<(), String> {
        (**self).validate_program(program)
    }

    fn use_program(&mut self, program: ProgramId) {
        (**self).use_program(program)
    }

    fn attrib_location(&self, program: ProgramId, name: &str) -> Option<AttribLocation> {
        (**self).attrib_location(program, name)
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        (**self).uniform_location(program, name)
    }

    fn create_buffer(&mut self) -> BufferId {
        (**self).create_buffer()
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: BufferId) {
        (**self).bind_buffer(target, buffer)
    }

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage) {
        (**self).buffer_data(target, data, usage)
    }

    fn vertex_attrib_pointer(&mut self, location: AttribLocation, layout: VertexAttribLayout) {
        (**self).vertex_attrib_pointer(location, layout)
    }

    fn enable_vertex_attrib_array(&mut self, location: AttribLocation) -> Result<(), String> {
        (**self).enable_vertex_attrib_array(location)
    }

    fn uniform_matrix4(&mut self, location: UniformLocation, transpose: bool, value: &[f32; 16]) {
        (**self).uniform_matrix4(location, transpose, value)
    }

    fn enable(&mut self, capability: Capability) {
        (**self).enable(capability)
    }

    fn front_face(&mut self, winding: Winding) {
        (**self).front_face(winding)
    }

    fn cull_face(&mut self, face: Face) {
        (**self).cull_face(face)
    }

    fn clear_color(&mut self, rgba: [f32; 4]) {
        (**self).clear_color(rgba)
    }

    fn clear(&mut self, mask: ClearMask) {
        (**self).clear(mask)
    }

    fn draw_arrays(&mut self, primitive: Primitive, first: u32, count: u32) {
        (**self).draw_arrays(primitive, first, count)
    }

    fn draw_elements(
        &mut self,
        primitive: Primitive,
        count: u32,
        index_type: IndexType,
        offset: u64,
    ) {
        (**self).draw_elements(primitive, count, index_type, offset)
    }

    fn present(&mut self) {
        (**self).present()
    }
}
