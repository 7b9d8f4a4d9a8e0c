use std::collections::{BTreeMap, BTreeSet};

use log::warn;

use super::reflect::{self, ProgramInterface, ShaderInterface};
use super::{
    AttribLocation, BufferId, BufferTarget, BufferUsage, Capability, ClearMask, Face,
    GraphicsContext, IndexType, Primitive, ProgramId, ShaderId, ShaderStage, UniformLocation,
    VertexAttribLayout, Winding,
};

/// One call made against a [`RecordingContext`].
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CompileShader { stage: ShaderStage, ok: bool },
    LinkProgram { program: Option<ProgramId> },
    ValidateProgram { program: ProgramId, ok: bool },
    UseProgram(ProgramId),
    CreateBuffer(BufferId),
    BindBuffer(BufferTarget, BufferId),
    BufferData {
        target: BufferTarget,
        buffer: Option<BufferId>,
        len: usize,
        usage: BufferUsage,
    },
    VertexAttribPointer {
        location: AttribLocation,
        buffer: Option<BufferId>,
        layout: VertexAttribLayout,
    },
    EnableVertexAttribArray(AttribLocation),
    UniformMatrix4 {
        location: UniformLocation,
        transpose: bool,
        value: [f32; 16],
    },
    Enable(Capability),
    FrontFace(Winding),
    CullFace(Face),
    ClearColor([f32; 4]),
    Clear(ClearMask),
    DrawArrays {
        primitive: Primitive,
        first: u32,
        count: u32,
    },
    DrawElements {
        primitive: Primitive,
        count: u32,
        index_type: IndexType,
        offset: u64,
    },
    Present,
}

/// Headless context: compiles and links shaders for real, keeps every other
/// call as a [`Command`] so callers can inspect what reached the device.
#[derive(Debug)]
pub struct RecordingContext {
    commands: Vec<Command>,
    shaders: Vec<ShaderInterface>,
    programs: Vec<ProgramInterface>,
    buffers: Vec<Option<usize>>,
    bound_array: Option<BufferId>,
    bound_element: Option<BufferId>,
    pointers: BTreeMap<AttribLocation, BufferId>,
    enabled: BTreeSet<AttribLocation>,
    current_program: Option<ProgramId>,
    max_vertex_attribs: u32,
    forced_validation_failure: Option<String>,
    forced_compile_failure: Option<(ShaderStage, String)>,
}

impl Default for RecordingContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingContext {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            shaders: Vec::new(),
            programs: Vec::new(),
            buffers: Vec::new(),
            bound_array: None,
            bound_element: None,
            pointers: BTreeMap::new(),
            enabled: BTreeSet::new(),
            current_program: None,
            max_vertex_attribs: 16,
            forced_validation_failure: None,
            forced_compile_failure: None,
        }
    }

    /// Limits the number of vertex attribute slots, like `MAX_VERTEX_ATTRIBS`.
    pub fn with_max_vertex_attribs(mut self, max: u32) -> Self {
        self.max_vertex_attribs = max;
        self
    }

    /// Makes every `validate_program` call fail with `log`.
    pub fn with_validation_failure(mut self, log: impl Into<String>) -> Self {
        self.forced_validation_failure = Some(log.into());
        self
    }

    /// Makes compiling any `stage` shader fail with `log`, as a driver
    /// rejecting the source would.
    pub fn with_compile_failure(mut self, stage: ShaderStage, log: impl Into<String>) -> Self {
        self.forced_compile_failure = Some((stage, log.into()));
        self
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn draw_calls(&self) -> usize {
        self.commands
            .iter()
            .filter(|command| {
                matches!(
                    command,
                    Command::DrawArrays { .. } | Command::DrawElements { .. }
                )
            })
            .count()
    }

    pub fn buffers_created(&self) -> usize {
        self.buffers.len()
    }

    pub fn frames_presented(&self) -> usize {
        self.commands
            .iter()
            .filter(|command| matches!(command, Command::Present))
            .count()
    }

    /// Size of the data last uploaded into `buffer`.
    pub fn buffer_len(&self, buffer: BufferId) -> Option<usize> {
        self.buffers.get(buffer.0 as usize).copied().flatten()
    }

    /// Every matrix uploaded to `location`, oldest first.
    pub fn uniform_uploads(&self, location: UniformLocation) -> Vec<[f32; 16]> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                Command::UniformMatrix4 {
                    location: target,
                    value,
                    ..
                } if *target == location => Some(*value),
                _ => None,
            })
            .collect()
    }

    pub fn is_attribute_enabled(&self, location: AttribLocation) -> bool {
        self.enabled.contains(&location)
    }

    pub fn program(&self, program: ProgramId) -> Option<&ProgramInterface> {
        self.programs.get(program.0 as usize)
    }

    fn bound(&self, target: BufferTarget) -> Option<BufferId> {
        match target {
            BufferTarget::Array => self.bound_array,
            BufferTarget::ElementArray => self.bound_element,
        }
    }
}

impl GraphicsContext for RecordingContext {
    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderId, String> {
        let result = match &self.forced_compile_failure {
            Some((rejected, log)) if *rejected == stage => Err(log.clone()),
            _ => reflect::compile_shader(stage, source),
        };
        self.commands.push(Command::CompileShader {
            stage,
            ok: result.is_ok(),
        });
        let interface = result?;
        self.shaders.push(interface);
        Ok(ShaderId(self.shaders.len() as u32 - 1))
    }

    fn link_program(&mut self, vertex: ShaderId, fragment: ShaderId) -> Result<ProgramId, String> {
        let result = match (
            self.shaders.get(vertex.0 as usize),
            self.shaders.get(fragment.0 as usize),
        ) {
            (Some(vertex), Some(fragment)) => reflect::link_program(vertex, fragment),
            _ => Err("unknown shader handle".to_string()),
        };
        let result = result.map(|interface| {
            self.programs.push(interface);
            ProgramId(self.programs.len() as u32 - 1)
        });
        self.commands.push(Command::LinkProgram {
            program: result.as_ref().ok().copied(),
        });
        result
    }

    fn validate_program(&mut self, program: ProgramId) -> Result<(), String> {
        let result = match (&self.forced_validation_failure, self.program(program)) {
            (Some(log), _) => Err(log.clone()),
            (None, Some(interface)) => interface.validate(),
            (None, None) => Err("unknown program handle".to_string()),
        };
        self.commands.push(Command::ValidateProgram {
            program,
            ok: result.is_ok(),
        });
        result
    }

    fn use_program(&mut self, program: ProgramId) {
        self.current_program = Some(program);
        self.commands.push(Command::UseProgram(program));
    }

    fn attrib_location(&self, program: ProgramId, name: &str) -> Option<AttribLocation> {
        self.program(program)?.attrib_location(name)
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        self.program(program)?.uniform_location(name)
    }

    fn create_buffer(&mut self) -> BufferId {
        self.buffers.push(None);
        let id = BufferId(self.buffers.len() as u32 - 1);
        self.commands.push(Command::CreateBuffer(id));
        id
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: BufferId) {
        match target {
            BufferTarget::Array => self.bound_array = Some(buffer),
            BufferTarget::ElementArray => self.bound_element = Some(buffer),
        }
        self.commands.push(Command::BindBuffer(target, buffer));
    }

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage) {
        let buffer = self.bound(target);
        match buffer.and_then(|id| self.buffers.get_mut(id.0 as usize)) {
            Some(slot) => *slot = Some(data.len()),
            None => warn!("buffer_data with no buffer bound to {target:?}"),
        }
        self.commands.push(Command::BufferData {
            target,
            buffer,
            len: data.len(),
            usage,
        });
    }

    fn vertex_attrib_pointer(&mut self, location: AttribLocation, layout: VertexAttribLayout) {
        let buffer = self.bound_array;
        if let Some(buffer) = buffer {
            self.pointers.insert(location, buffer);
        }
        self.commands.push(Command::VertexAttribPointer {
            location,
            buffer,
            layout,
        });
    }

    fn enable_vertex_attrib_array(&mut self, location: AttribLocation) -> Result<(), String> {
        if location.0 >= self.max_vertex_attribs {
            return Err(format!(
                "location {} exceeds the {} available attribute slots",
                location.0, self.max_vertex_attribs
            ));
        }
        if !self.pointers.contains_key(&location) {
            return Err(format!("location {} has no buffer layout", location.0));
        }
        self.enabled.insert(location);
        self.commands.push(Command::EnableVertexAttribArray(location));
        Ok(())
    }

    fn uniform_matrix4(&mut self, location: UniformLocation, transpose: bool, value: &[f32; 16]) {
        if self.current_program.is_none() {
            warn!("uniform upload to {location:?} with no active program");
        }
        self.commands.push(Command::UniformMatrix4 {
            location,
            transpose,
            value: *value,
        });
    }

    fn enable(&mut self, capability: Capability) {
        self.commands.push(Command::Enable(capability));
    }

    fn front_face(&mut self, winding: Winding) {
        self.commands.push(Command::FrontFace(winding));
    }

    fn cull_face(&mut self, face: Face) {
        self.commands.push(Command::CullFace(face));
    }

    fn clear_color(&mut self, rgba: [f32; 4]) {
        self.commands.push(Command::ClearColor(rgba));
    }

    fn clear(&mut self, mask: ClearMask) {
        self.commands.push(Command::Clear(mask));
    }

    fn draw_arrays(&mut self, primitive: Primitive, first: u32, count: u32) {
        self.commands.push(Command::DrawArrays {
            primitive,
            first,
            count,
        });
    }

    fn draw_elements(
        &mut self,
        primitive: Primitive,
        count: u32,
        index_type: IndexType,
        offset: u64,
    ) {
        if self.bound_element.is_none() {
            warn!("draw_elements with no index buffer bound");
        }
        self.commands.push(Command::DrawElements {
            primitive,
            count,
            index_type,
            offset,
        });
    }

    fn present(&mut self) {
        self.commands.push(Command::Present);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ComponentType;

    const LAYOUT: VertexAttribLayout = VertexAttribLayout {
        components: 3,
        component_type: ComponentType::Float32,
        normalized: false,
        stride: 24,
        offset: 0,
    };

    #[test]
    fn buffer_data_targets_bound_buffer() {
        let mut ctx = RecordingContext::new();
        let vertices = ctx.create_buffer();
        let indices = ctx.create_buffer();
        ctx.bind_buffer(BufferTarget::Array, vertices);
        ctx.bind_buffer(BufferTarget::ElementArray, indices);
        ctx.buffer_data(BufferTarget::Array, &[0; 48], BufferUsage::StaticDraw);
        ctx.buffer_data(BufferTarget::ElementArray, &[0; 6], BufferUsage::StaticDraw);
        assert_eq!(ctx.buffer_len(vertices), Some(48));
        assert_eq!(ctx.buffer_len(indices), Some(6));
        assert_eq!(ctx.buffers_created(), 2);
    }

    #[test]
    fn enabling_requires_a_pointer() {
        let mut ctx = RecordingContext::new();
        assert!(ctx.enable_vertex_attrib_array(AttribLocation(0)).is_err());

        let buffer = ctx.create_buffer();
        ctx.bind_buffer(BufferTarget::Array, buffer);
        ctx.vertex_attrib_pointer(AttribLocation(0), LAYOUT);
        assert!(ctx.enable_vertex_attrib_array(AttribLocation(0)).is_ok());
        assert!(ctx.is_attribute_enabled(AttribLocation(0)));
    }

    #[test]
    fn enabling_respects_slot_limit() {
        let mut ctx = RecordingContext::new().with_max_vertex_attribs(1);
        let buffer = ctx.create_buffer();
        ctx.bind_buffer(BufferTarget::Array, buffer);
        ctx.vertex_attrib_pointer(AttribLocation(1), LAYOUT);
        let err = ctx.enable_vertex_attrib_array(AttribLocation(1)).unwrap_err();
        assert!(err.contains("attribute slots"));
    }

    #[test]
    fn counts_draws_and_frames() {
        let mut ctx = RecordingContext::new();
        ctx.clear(ClearMask::COLOR_DEPTH);
        ctx.draw_arrays(Primitive::Triangles, 0, 3);
        ctx.present();
        assert_eq!(ctx.draw_calls(), 1);
        assert_eq!(ctx.frames_presented(), 1);
    }
}
