use std::collections::BTreeMap;

use anyhow::{anyhow, Context, Result};
use glam::Mat4;
use log::{debug, error, info, warn};
use wgpu::util::DeviceExt;

use super::reflect::{self, ProgramInterface, ShaderInterface};
use super::{
    AttribLocation, BufferId, BufferTarget, BufferUsage, Capability, ClearMask, Face,
    GraphicsContext, IndexType, Primitive, ProgramId, ShaderId, ShaderStage, UniformLocation,
    VertexAttribLayout, Winding,
};

/// [`GraphicsContext`] on top of wgpu.
///
/// Immediate-mode state (bound program, attribute pointers, raster toggles) is
/// turned into a render pipeline the first time a draw needs it; pipelines are
/// cached per state combination. Clears and draws are batched and submitted as
/// one render pass by [`GraphicsContext::present`].
pub struct WgpuContext {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth: DepthBuffer,
    shaders: Vec<GpuShader>,
    programs: Vec<GpuProgram>,
    buffers: Vec<Option<wgpu::Buffer>>,
    bound_array: Option<BufferId>,
    bound_element: Option<BufferId>,
    attributes: BTreeMap<AttribLocation, AttributeState>,
    current_program: Option<ProgramId>,
    raster: RasterState,
    pipelines: Vec<(PipelineKey, wgpu::RenderPipeline)>,
    clear_rgba: [f32; 4],
    frame: FrameCommands,
}

impl WgpuContext {
    /// Acquires an adapter and device for `target` and configures its surface.
    pub async fn new(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(anyhow!("surface has zero area"));
        }

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(target)
            .context("failed to create drawing surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to acquire GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("context-device"),
                required_features: wgpu::Features::empty(),
                required_limits: adapter.limits(),
                ..Default::default()
            })
            .await
            .context("failed to create GPU device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|format| format.is_srgb())
            .copied()
            .or_else(|| surface_caps.formats.first().copied())
            .context("surface reports no supported formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            // Fifo waits for vertical blank, which paces frames to the display.
            present_mode: wgpu::PresentMode::Fifo,
            desired_maximum_frame_latency: 2,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
        };
        surface.configure(&device, &config);
        info!(
            "Configured {}x{} surface ({surface_format:?}) on {}",
            width,
            height,
            adapter.get_info().name
        );

        let depth = DepthBuffer::create(&device, width, height);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth,
            shaders: Vec::new(),
            programs: Vec::new(),
            buffers: Vec::new(),
            bound_array: None,
            bound_element: None,
            attributes: BTreeMap::new(),
            current_program: None,
            raster: RasterState::default(),
            pipelines: Vec::new(),
            clear_rgba: [0.0, 0.0, 0.0, 0.0],
            frame: FrameCommands::default(),
        })
    }

    /// Keeps the swap chain matching the host surface. The projection is not
    /// touched; it stays at the aspect ratio chosen during setup.
    pub fn resize_surface(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth = DepthBuffer::create(&self.device, width, height);
    }

    fn bound(&self, target: BufferTarget) -> Option<BufferId> {
        match target {
            BufferTarget::Array => self.bound_array,
            BufferTarget::ElementArray => self.bound_element,
        }
    }

    fn current(&self) -> Option<(ProgramId, &GpuProgram)> {
        let id = self.current_program?;
        self.programs.get(id.0 as usize).map(|program| (id, program))
    }

    /// Returns the pipeline matching the current state, building it if needed.
    fn pipeline_for_draw(&mut self) -> Option<(ProgramId, usize, Vec<BufferId>)> {
        let Some((program_id, program)) = self.current() else {
            warn!("draw issued with no active program");
            return None;
        };

        let mut slots: Vec<VertexSlot> = Vec::new();
        for (location, state) in self.attributes.iter().filter(|(_, state)| state.enabled) {
            let attribute = AttributeKey {
                location: location.0,
                components: state.layout.components,
                offset: state.layout.offset,
            };
            match slots
                .iter_mut()
                .find(|slot| slot.buffer == state.buffer && slot.stride == state.layout.stride)
            {
                Some(slot) => slot.attributes.push(attribute),
                None => slots.push(VertexSlot {
                    buffer: state.buffer,
                    stride: state.layout.stride,
                    attributes: vec![attribute],
                }),
            }
        }

        let key = PipelineKey {
            program: program_id,
            raster: self.raster,
            slots: slots.clone(),
        };
        let buffers = slots.iter().map(|slot| slot.buffer).collect();
        if let Some(index) = self.pipelines.iter().position(|(cached, _)| *cached == key) {
            return Some((program_id, index, buffers));
        }

        let vertex_module = &self.shaders[program.vertex.0 as usize];
        let fragment_module = &self.shaders[program.fragment.0 as usize];
        let attributes: Vec<Vec<wgpu::VertexAttribute>> = slots
            .iter()
            .map(|slot| {
                slot.attributes
                    .iter()
                    .map(|attribute| wgpu::VertexAttribute {
                        format: float_format(attribute.components),
                        offset: attribute.offset as u64,
                        shader_location: attribute.location,
                    })
                    .collect()
            })
            .collect();
        let layouts: Vec<wgpu::VertexBufferLayout> = slots
            .iter()
            .zip(&attributes)
            .map(|(slot, attributes)| wgpu::VertexBufferLayout {
                array_stride: slot.stride as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes,
            })
            .collect();

        let raster = self.raster;
        let created = scoped(&self.device, || {
            self.device
                .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some("context-pipeline"),
                    layout: Some(&program.layout),
                    vertex: wgpu::VertexState {
                        module: &vertex_module.module,
                        entry_point: Some(&vertex_module.interface.entry_point),
                        compilation_options: Default::default(),
                        buffers: &layouts,
                    },
                    primitive: wgpu::PrimitiveState {
                        topology: wgpu::PrimitiveTopology::TriangleList,
                        front_face: match raster.front_face {
                            Winding::Ccw => wgpu::FrontFace::Ccw,
                            Winding::Cw => wgpu::FrontFace::Cw,
                        },
                        cull_mode: raster.cull_face.then_some(match raster.cull {
                            Face::Front => wgpu::Face::Front,
                            Face::Back => wgpu::Face::Back,
                        }),
                        polygon_mode: wgpu::PolygonMode::Fill,
                        ..Default::default()
                    },
                    // The depth attachment is always bound; a disabled depth test
                    // just passes every fragment without writing.
                    depth_stencil: Some(wgpu::DepthStencilState {
                        format: DepthBuffer::FORMAT,
                        depth_write_enabled: raster.depth_test,
                        depth_compare: if raster.depth_test {
                            wgpu::CompareFunction::Less
                        } else {
                            wgpu::CompareFunction::Always
                        },
                        stencil: Default::default(),
                        bias: Default::default(),
                    }),
                    multisample: wgpu::MultisampleState::default(),
                    fragment: Some(wgpu::FragmentState {
                        module: &fragment_module.module,
                        entry_point: Some(&fragment_module.interface.entry_point),
                        compilation_options: Default::default(),
                        targets: &[Some(wgpu::ColorTargetState {
                            format: self.config.format,
                            blend: Some(wgpu::BlendState::REPLACE),
                            write_mask: wgpu::ColorWrites::ALL,
                        })],
                    }),
                    multiview: None,
                    cache: None,
                })
        });
        let pipeline = match created {
            Ok(pipeline) => pipeline,
            Err(log) => {
                warn!("cannot draw with program {program_id:?}: {log}");
                return None;
            }
        };
        debug!("Built pipeline #{} for program {:?}", self.pipelines.len(), program_id);
        self.pipelines.push((key, pipeline));
        Some((program_id, self.pipelines.len() - 1, buffers))
    }

    fn record_draw(&mut self, kind: DrawKind) {
        let Some((program, pipeline, vertex_buffers)) = self.pipeline_for_draw() else {
            return;
        };
        if let Some(missing) = vertex_buffers
            .iter()
            .find(|id| self.gpu_buffer(**id).is_none())
        {
            warn!("skipping draw: buffer {missing:?} has no data");
            return;
        }
        self.frame.draws.push(DrawCall {
            program,
            pipeline,
            vertex_buffers,
            kind,
        });
    }

    fn gpu_buffer(&self, id: BufferId) -> Option<&wgpu::Buffer> {
        self.buffers.get(id.0 as usize).and_then(Option::as_ref)
    }
}

impl GraphicsContext for WgpuContext {
    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderId, String> {
        let interface = reflect::compile_shader(stage, source)?;
        let label = format!("{stage}-shader");
        let module = scoped(&self.device, || {
            self.device
                .create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some(&label),
                    source: wgpu::ShaderSource::Wgsl(source.into()),
                })
        })?;
        self.shaders.push(GpuShader { interface, module });
        Ok(ShaderId(self.shaders.len() as u32 - 1))
    }

    fn link_program(
        &mut self,
        vertex: ShaderId,
        fragment: ShaderId,
    ) -> Result<ProgramId, String> {
        let (Some(vertex_shader), Some(fragment_shader)) = (
            self.shaders.get(vertex.0 as usize),
            self.shaders.get(fragment.0 as usize),
        ) else {
            return Err("unknown shader handle".to_string());
        };
        let interface =
            reflect::link_program(&vertex_shader.interface, &fragment_shader.interface)?;

        let uniforms: Vec<UniformLocation> = interface
            .uniforms
            .iter()
            .map(|uniform| uniform.location)
            .filter(|location| location.group == 0)
            .collect();
        let entries: Vec<wgpu::BindGroupLayoutEntry> = uniforms
            .iter()
            .map(|location| wgpu::BindGroupLayoutEntry {
                binding: location.binding,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            })
            .collect();

        let device = &self.device;
        let (layout, bind_group, uniform_buffers) = scoped(device, || {
            let uniform_buffers: BTreeMap<UniformLocation, wgpu::Buffer> = uniforms
                .iter()
                .map(|location| {
                    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                        label: Some("program-uniform"),
                        size: MATRIX_BYTES,
                        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                        mapped_at_creation: false,
                    });
                    (*location, buffer)
                })
                .collect();

            let bind_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("program-bind-layout"),
                entries: &entries,
            });
            let bind_group = (!uniform_buffers.is_empty()).then(|| {
                let entries: Vec<wgpu::BindGroupEntry> = uniform_buffers
                    .iter()
                    .map(|(location, buffer)| wgpu::BindGroupEntry {
                        binding: location.binding,
                        resource: buffer.as_entire_binding(),
                    })
                    .collect();
                device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("program-bind-group"),
                    layout: &bind_layout,
                    entries: &entries,
                })
            });
            let group_layouts: Vec<&wgpu::BindGroupLayout> = if bind_group.is_some() {
                vec![&bind_layout]
            } else {
                Vec::new()
            };
            let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("program-pipeline-layout"),
                bind_group_layouts: &group_layouts,
                push_constant_ranges: &[],
            });
            (layout, bind_group, uniform_buffers)
        })?;

        self.programs.push(GpuProgram {
            interface,
            vertex,
            fragment,
            layout,
            bind_group,
            uniform_buffers,
        });
        Ok(ProgramId(self.programs.len() as u32 - 1))
    }

    fn validate_program(&mut self, program: ProgramId) -> Result<(), String> {
        self.programs
            .get(program.0 as usize)
            .ok_or_else(|| "unknown program handle".to_string())?
            .interface
            .validate()
    }

    fn use_program(&mut self, program: ProgramId) {
        if self.programs.get(program.0 as usize).is_none() {
            warn!("use_program with unknown handle {program:?}");
            return;
        }
        self.current_program = Some(program);
    }

    fn attrib_location(&self, program: ProgramId, name: &str) -> Option<AttribLocation> {
        self.programs
            .get(program.0 as usize)?
            .interface
            .attrib_location(name)
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        self.programs
            .get(program.0 as usize)?
            .interface
            .uniform_location(name)
    }

    fn create_buffer(&mut self) -> BufferId {
        self.buffers.push(None);
        BufferId(self.buffers.len() as u32 - 1)
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: BufferId) {
        match target {
            BufferTarget::Array => self.bound_array = Some(buffer),
            BufferTarget::ElementArray => self.bound_element = Some(buffer),
        }
    }

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage) {
        let Some(id) = self.bound(target) else {
            warn!("buffer_data with no buffer bound to {target:?}");
            return;
        };
        // Contents are fixed at creation, so no COPY_DST.
        let BufferUsage::StaticDraw = usage;
        let usages = match target {
            BufferTarget::Array => wgpu::BufferUsages::VERTEX,
            BufferTarget::ElementArray => wgpu::BufferUsages::INDEX,
        };
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(match target {
                    BufferTarget::Array => "vertex-buffer",
                    BufferTarget::ElementArray => "index-buffer",
                }),
                contents: data,
                usage: usages,
            });
        if let Some(slot) = self.buffers.get_mut(id.0 as usize) {
            *slot = Some(buffer);
        }
    }

    fn vertex_attrib_pointer(&mut self, location: AttribLocation, layout: VertexAttribLayout) {
        let Some(buffer) = self.bound_array else {
            warn!("vertex_attrib_pointer for {location:?} with no array buffer bound");
            return;
        };
        let enabled = self
            .attributes
            .get(&location)
            .is_some_and(|state| state.enabled);
        self.attributes.insert(
            location,
            AttributeState {
                buffer,
                layout,
                enabled,
            },
        );
    }

    fn enable_vertex_attrib_array(&mut self, location: AttribLocation) -> Result<(), String> {
        let max = self.device.limits().max_vertex_attributes;
        if location.0 >= max {
            return Err(format!(
                "location {} exceeds the {max} available attribute slots",
                location.0
            ));
        }
        if !(1..=4).contains(&self.attributes.get(&location).map_or(0, |s| s.layout.components)) {
            return Err(format!(
                "location {} has no layout with 1 to 4 float components",
                location.0
            ));
        }
        if let Some(state) = self.attributes.get_mut(&location) {
            state.enabled = true;
        }
        Ok(())
    }

    fn uniform_matrix4(&mut self, location: UniformLocation, transpose: bool, value: &[f32; 16]) {
        let Some((_, program)) = self.current() else {
            warn!("uniform upload to {location:?} with no active program");
            return;
        };
        let Some(buffer) = program.uniform_buffers.get(&location) else {
            warn!("active program has no uniform buffer at {location:?}");
            return;
        };
        let columns = if transpose {
            Mat4::from_cols_array(value).transpose().to_cols_array()
        } else {
            *value
        };
        // Written immediately: every draw in the frame sees the last upload.
        self.queue
            .write_buffer(buffer, 0, bytemuck::cast_slice(&columns));
    }

    fn enable(&mut self, capability: Capability) {
        match capability {
            Capability::DepthTest => self.raster.depth_test = true,
            Capability::CullFace => self.raster.cull_face = true,
        }
    }

    fn front_face(&mut self, winding: Winding) {
        self.raster.front_face = winding;
    }

    fn cull_face(&mut self, face: Face) {
        self.raster.cull = face;
    }

    fn clear_color(&mut self, rgba: [f32; 4]) {
        self.clear_rgba = rgba;
    }

    fn clear(&mut self, mask: ClearMask) {
        if mask.color {
            // Anything drawn earlier in this frame would be wiped anyway.
            self.frame.draws.clear();
            self.frame.clear_color = Some(self.clear_rgba);
        }
        if mask.depth {
            self.frame.clear_depth = true;
        }
    }

    fn draw_arrays(&mut self, primitive: Primitive, first: u32, count: u32) {
        let Primitive::Triangles = primitive;
        self.record_draw(DrawKind::Arrays { first, count });
    }

    fn draw_elements(
        &mut self,
        primitive: Primitive,
        count: u32,
        index_type: IndexType,
        offset: u64,
    ) {
        let Primitive::Triangles = primitive;
        let Some(index) = self.bound_element else {
            warn!("draw_elements with no index buffer bound");
            return;
        };
        if self.gpu_buffer(index).is_none() {
            warn!("draw_elements with empty index buffer {index:?}");
            return;
        }
        self.record_draw(DrawKind::Elements {
            index,
            first: (offset / index_type.size()) as u32,
            count,
        });
    }

    fn present(&mut self) {
        let frame = std::mem::take(&mut self.frame);
        if frame.is_empty() {
            return;
        }

        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return;
            }
            Err(wgpu::SurfaceError::Timeout) => {
                info!("Surface timeout; retrying next frame");
                return;
            }
            Err(err) => {
                error!("failed to acquire surface texture: {err}");
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame-encoder"),
            });

        let color_load = match frame.clear_color {
            Some([r, g, b, a]) => wgpu::LoadOp::Clear(wgpu::Color {
                r: r as f64,
                g: g as f64,
                b: b as f64,
                a: a as f64,
            }),
            None => wgpu::LoadOp::Load,
        };
        let depth_load = if frame.clear_depth {
            wgpu::LoadOp::Clear(1.0)
        } else {
            wgpu::LoadOp::Load
        };

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("frame-pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: color_load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: depth_load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        for draw in &frame.draws {
            pass.set_pipeline(&self.pipelines[draw.pipeline].1);
            if let Some(bind_group) = &self.programs[draw.program.0 as usize].bind_group {
                pass.set_bind_group(0, bind_group, &[]);
            }
            for (slot, id) in draw.vertex_buffers.iter().enumerate() {
                if let Some(buffer) = self.gpu_buffer(*id) {
                    pass.set_vertex_buffer(slot as u32, buffer.slice(..));
                }
            }
            match draw.kind {
                DrawKind::Arrays { first, count } => pass.draw(first..first + count, 0..1),
                DrawKind::Elements {
                    index,
                    first,
                    count,
                } => {
                    if let Some(buffer) = self.gpu_buffer(index) {
                        pass.set_index_buffer(buffer.slice(..), wgpu::IndexFormat::Uint16);
                        pass.draw_indexed(first..first + count, 0, 0..1);
                    }
                }
            }
        }

        drop(pass);
        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }
}

/// Runs `create` inside a validation error scope and reports what it caught.
#[cfg(not(target_arch = "wasm32"))]
fn scoped<T>(device: &wgpu::Device, create: impl FnOnce() -> T) -> Result<T, String> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = create();
    match pollster::block_on(device.pop_error_scope()) {
        Some(err) => Err(err.to_string()),
        None => Ok(value),
    }
}

/// Browsers resolve error scopes asynchronously; errors surface through the
/// uncaptured error handler instead.
#[cfg(target_arch = "wasm32")]
fn scoped<T>(_device: &wgpu::Device, create: impl FnOnce() -> T) -> Result<T, String> {
    Ok(create())
}

fn float_format(components: u32) -> wgpu::VertexFormat {
    match components {
        1 => wgpu::VertexFormat::Float32,
        2 => wgpu::VertexFormat::Float32x2,
        3 => wgpu::VertexFormat::Float32x3,
        _ => wgpu::VertexFormat::Float32x4,
    }
}

const MATRIX_BYTES: u64 = std::mem::size_of::<[f32; 16]>() as u64;

struct GpuShader {
    interface: ShaderInterface,
    module: wgpu::ShaderModule,
}

struct GpuProgram {
    interface: ProgramInterface,
    vertex: ShaderId,
    fragment: ShaderId,
    layout: wgpu::PipelineLayout,
    bind_group: Option<wgpu::BindGroup>,
    uniform_buffers: BTreeMap<UniformLocation, wgpu::Buffer>,
}

#[derive(Debug, Clone, Copy)]
struct AttributeState {
    buffer: BufferId,
    layout: VertexAttribLayout,
    enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RasterState {
    depth_test: bool,
    cull_face: bool,
    front_face: Winding,
    cull: Face,
}

impl Default for RasterState {
    fn default() -> Self {
        Self {
            depth_test: false,
            cull_face: false,
            front_face: Winding::Ccw,
            cull: Face::Back,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttributeKey {
    location: u32,
    components: u32,
    offset: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct VertexSlot {
    buffer: BufferId,
    stride: u32,
    attributes: Vec<AttributeKey>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PipelineKey {
    program: ProgramId,
    raster: RasterState,
    slots: Vec<VertexSlot>,
}

#[derive(Debug, Clone, Copy)]
enum DrawKind {
    Arrays { first: u32, count: u32 },
    Elements { index: BufferId, first: u32, count: u32 },
}

#[derive(Debug)]
struct DrawCall {
    program: ProgramId,
    pipeline: usize,
    vertex_buffers: Vec<BufferId>,
    kind: DrawKind,
}

#[derive(Debug, Default)]
struct FrameCommands {
    clear_color: Option<[f32; 4]>,
    clear_depth: bool,
    draws: Vec<DrawCall>,
}

impl FrameCommands {
    fn is_empty(&self) -> bool {
        self.clear_color.is_none() && !self.clear_depth && self.draws.is_empty()
    }
}

struct DepthBuffer {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl DepthBuffer {
    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

    fn create(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth-texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}
