//! Program construction shared by the cube and the triangle.

use log::{debug, error, info, warn};

use crate::context::{
    AttribLocation, GraphicsContext, ProgramId, ShaderStage, UniformLocation,
};
use crate::error::SetupError;

pub const CUBE_VERTEX_SHADER: &str = include_str!("shaders/cube.vert.wgsl");
pub const CUBE_FRAGMENT_SHADER: &str = include_str!("shaders/cube.frag.wgsl");
pub const TRIANGLE_VERTEX_SHADER: &str = include_str!("shaders/triangle.vert.wgsl");
pub const TRIANGLE_FRAGMENT_SHADER: &str = include_str!("shaders/triangle.frag.wgsl");

/// Sources plus the input and uniform names the caller wants resolved.
#[derive(Debug, Clone, Copy)]
pub struct ProgramDescriptor {
    pub label: &'static str,
    pub vertex_source: &'static str,
    pub fragment_source: &'static str,
    pub attributes: &'static [&'static str],
    pub uniforms: &'static [&'static str],
}

pub const CUBE_PROGRAM: ProgramDescriptor = ProgramDescriptor {
    label: "cube",
    vertex_source: CUBE_VERTEX_SHADER,
    fragment_source: CUBE_FRAGMENT_SHADER,
    attributes: &["vertPosition", "vertColor"],
    uniforms: &["mWorld", "mView", "mProj"],
};

pub const TRIANGLE_PROGRAM: ProgramDescriptor = ProgramDescriptor {
    label: "triangle",
    vertex_source: TRIANGLE_VERTEX_SHADER,
    fragment_source: TRIANGLE_FRAGMENT_SHADER,
    attributes: &["vertPosition"],
    uniforms: &[],
};

/// A linked program and the slots its names resolved to. A name the program
/// does not expose resolves to `None`.
#[derive(Debug, Clone)]
pub struct ShaderProgram {
    pub handle: ProgramId,
    pub attributes: Vec<(String, Option<AttribLocation>)>,
    pub uniforms: Vec<(String, Option<UniformLocation>)>,
    /// Validation log when validation ran and failed.
    pub validation_warning: Option<String>,
}

impl ShaderProgram {
    pub fn attribute(&self, name: &str) -> Option<AttribLocation> {
        self.attributes
            .iter()
            .find(|(candidate, _)| candidate == name)
            .and_then(|(_, location)| *location)
    }

    pub fn uniform(&self, name: &str) -> Option<UniformLocation> {
        self.uniforms
            .iter()
            .find(|(candidate, _)| candidate == name)
            .and_then(|(_, location)| *location)
    }

    pub fn resolved_attributes(&self) -> usize {
        self.attributes.iter().filter(|(_, l)| l.is_some()).count()
    }

    pub fn resolved_uniforms(&self) -> usize {
        self.uniforms.iter().filter(|(_, l)| l.is_some()).count()
    }
}

/// Compiles, links and optionally validates `desc`, then resolves its names.
///
/// Compile and link failures abort with the driver's log. A validation failure
/// only produces a warning: the program is still returned and usable.
pub fn build_program(
    ctx: &mut dyn GraphicsContext,
    desc: &ProgramDescriptor,
    validate: bool,
) -> Result<ShaderProgram, SetupError> {
    let vertex = compile(ctx, desc, ShaderStage::Vertex, desc.vertex_source)?;
    let fragment = compile(ctx, desc, ShaderStage::Fragment, desc.fragment_source)?;

    let handle = ctx.link_program(vertex, fragment).map_err(|log| {
        error!("ERROR linking {} program: {log}", desc.label);
        SetupError::ProgramLink { log }
    })?;

    let validation_warning = if validate {
        match ctx.validate_program(handle) {
            Ok(()) => None,
            Err(log) => {
                warn!("ERROR validating {} program: {log}", desc.label);
                Some(log)
            }
        }
    } else {
        None
    };

    let attributes = desc
        .attributes
        .iter()
        .map(|name| {
            let location = ctx.attrib_location(handle, name);
            match location {
                Some(location) => debug!("{}: attribute {name} -> {location:?}", desc.label),
                None => debug!("{}: attribute {name} is not active", desc.label),
            }
            (name.to_string(), location)
        })
        .collect();
    let uniforms = desc
        .uniforms
        .iter()
        .map(|name| {
            let location = ctx.uniform_location(handle, name);
            match location {
                Some(location) => debug!("{}: uniform {name} -> {location:?}", desc.label),
                None => debug!("{}: uniform {name} is not active", desc.label),
            }
            (name.to_string(), location)
        })
        .collect();

    info!("Linked {} program {handle:?}", desc.label);
    Ok(ShaderProgram {
        handle,
        attributes,
        uniforms,
        validation_warning,
    })
}

fn compile(
    ctx: &mut dyn GraphicsContext,
    desc: &ProgramDescriptor,
    stage: ShaderStage,
    source: &str,
) -> Result<crate::context::ShaderId, SetupError> {
    ctx.compile_shader(stage, source).map_err(|log| {
        error!("ERROR compiling {} {stage} shader: {log}", desc.label);
        SetupError::ShaderCompile { stage, log }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Command, RecordingContext};

    #[test]
    fn cube_program_resolves_every_name() {
        let mut ctx = RecordingContext::new();
        let program = build_program(&mut ctx, &CUBE_PROGRAM, true).unwrap();
        assert_eq!(program.resolved_attributes(), 2);
        assert_eq!(program.resolved_uniforms(), 3);
        assert!(program.validation_warning.is_none());
        assert_eq!(program.attribute("vertColor"), Some(AttribLocation(1)));
    }

    #[test]
    fn unknown_names_resolve_to_none() {
        let desc = ProgramDescriptor {
            attributes: &["vertPosition", "vertNormal"],
            uniforms: &["mWorld", "mTexture"],
            ..CUBE_PROGRAM
        };
        let mut ctx = RecordingContext::new();
        let program = build_program(&mut ctx, &desc, false).unwrap();
        assert_eq!(program.attribute("vertNormal"), None);
        assert_eq!(program.uniform("mTexture"), None);
        assert_eq!(program.resolved_attributes(), 1);
        assert_eq!(program.resolved_uniforms(), 1);
    }

    #[test]
    fn compile_failure_names_the_stage() {
        let desc = ProgramDescriptor {
            fragment_source: "@fragment fn fs_main( -> {",
            ..CUBE_PROGRAM
        };
        let mut ctx = RecordingContext::new();
        let err = build_program(&mut ctx, &desc, false).unwrap_err();
        assert!(matches!(
            err,
            SetupError::ShaderCompile {
                stage: ShaderStage::Fragment,
                ..
            }
        ));
        assert!(!ctx
            .commands()
            .iter()
            .any(|command| matches!(command, Command::LinkProgram { .. })));
    }

    #[test]
    fn link_failure_is_reported() {
        let desc = ProgramDescriptor {
            vertex_source: TRIANGLE_VERTEX_SHADER,
            ..CUBE_PROGRAM
        };
        let mut ctx = RecordingContext::new();
        let err = build_program(&mut ctx, &desc, false).unwrap_err();
        assert!(matches!(err, SetupError::ProgramLink { .. }));
    }

    #[test]
    fn validation_failure_is_recorded_not_fatal() {
        let mut ctx = RecordingContext::new().with_validation_failure("sampler mismatch");
        let program = build_program(&mut ctx, &CUBE_PROGRAM, true).unwrap();
        assert_eq!(program.validation_warning.as_deref(), Some("sampler mismatch"));
    }

    #[test]
    fn validation_can_be_skipped() {
        let mut ctx = RecordingContext::new().with_validation_failure("never seen");
        let program = build_program(&mut ctx, &CUBE_PROGRAM, false).unwrap();
        assert!(program.validation_warning.is_none());
        assert!(!ctx
            .commands()
            .iter()
            .any(|command| matches!(command, Command::ValidateProgram { .. })));
    }

    #[test]
    fn triangle_shares_the_routine() {
        let mut ctx = RecordingContext::new();
        let program = build_program(&mut ctx, &TRIANGLE_PROGRAM, true).unwrap();
        assert_eq!(program.attribute("vertPosition"), Some(AttribLocation(0)));
        assert!(program.uniforms.is_empty());
    }
}
