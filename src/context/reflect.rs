//! WGSL front end shared by every backend: parsing, validation and the
//! name → slot reflection behind `attrib_location`/`uniform_location`.

use naga::valid::{Capabilities, ValidationFlags, Validator};
use naga::{AddressSpace, Binding, Handle, Module, Type, TypeInner, VectorSize};

use super::{AttribLocation, ShaderStage, UniformLocation};

/// Inter-stage value or vertex input identified by its `@location`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Varying {
    pub name: Option<String>,
    pub location: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformSlot {
    pub name: String,
    pub location: UniformLocation,
    pub is_mat4: bool,
}

/// A compiled stage: its entry point and reflected interface.
#[derive(Debug, Clone)]
pub struct ShaderInterface {
    pub stage: ShaderStage,
    pub entry_point: String,
    pub inputs: Vec<Varying>,
    pub outputs: Vec<Varying>,
    pub uniforms: Vec<UniformSlot>,
}

/// Both stages of a linked program plus the merged uniform table.
#[derive(Debug, Clone)]
pub struct ProgramInterface {
    pub vertex: ShaderInterface,
    pub fragment: ShaderInterface,
    pub uniforms: Vec<UniformSlot>,
}

impl ProgramInterface {
    pub fn attrib_location(&self, name: &str) -> Option<AttribLocation> {
        self.vertex
            .inputs
            .iter()
            .find(|input| input.name.as_deref() == Some(name))
            .map(|input| AttribLocation(input.location))
    }

    pub fn uniform_location(&self, name: &str) -> Option<UniformLocation> {
        self.uniforms
            .iter()
            .find(|uniform| uniform.name == name)
            .map(|uniform| uniform.location)
    }

    /// Only `mat4x4<f32>` uniforms in bind group 0 can be fed by
    /// `uniform_matrix4`.
    pub fn validate(&self) -> Result<(), String> {
        let problems: Vec<String> = self
            .uniforms
            .iter()
            .filter_map(|uniform| {
                if uniform.location.group != 0 {
                    Some(format!(
                        "uniform `{}` lives in group {}, only group 0 is bound",
                        uniform.name, uniform.location.group
                    ))
                } else if !uniform.is_mat4 {
                    Some(format!("uniform `{}` is not a mat4x4<f32>", uniform.name))
                } else {
                    None
                }
            })
            .collect();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems.join("\n"))
        }
    }
}

pub fn compile_shader(stage: ShaderStage, source: &str) -> Result<ShaderInterface, String> {
    let module = naga::front::wgsl::parse_str(source).map_err(|err| err.emit_to_string(source))?;
    Validator::new(ValidationFlags::all(), Capabilities::empty())
        .validate(&module)
        .map_err(|err| err.to_string())?;

    let naga_stage = match stage {
        ShaderStage::Vertex => naga::ShaderStage::Vertex,
        ShaderStage::Fragment => naga::ShaderStage::Fragment,
    };
    let entry = module
        .entry_points
        .iter()
        .find(|entry| entry.stage == naga_stage)
        .ok_or_else(|| format!("no @{stage} entry point declared"))?;

    let mut inputs = Vec::new();
    for argument in &entry.function.arguments {
        collect_varyings(
            &module,
            argument.binding.as_ref(),
            argument.name.as_deref(),
            argument.ty,
            &mut inputs,
        );
    }
    let mut outputs = Vec::new();
    if let Some(result) = &entry.function.result {
        collect_varyings(&module, result.binding.as_ref(), None, result.ty, &mut outputs);
    }

    Ok(ShaderInterface {
        stage,
        entry_point: entry.name.clone(),
        inputs,
        outputs,
        uniforms: collect_uniforms(&module),
    })
}

pub fn link_program(
    vertex: &ShaderInterface,
    fragment: &ShaderInterface,
) -> Result<ProgramInterface, String> {
    let mut log = Vec::new();
    if vertex.stage != ShaderStage::Vertex {
        log.push(format!("expected a vertex shader, got a {} shader", vertex.stage));
    }
    if fragment.stage != ShaderStage::Fragment {
        log.push(format!(
            "expected a fragment shader, got a {} shader",
            fragment.stage
        ));
    }

    for input in &fragment.inputs {
        if !vertex
            .outputs
            .iter()
            .any(|output| output.location == input.location)
        {
            log.push(format!(
                "fragment input `{}` at location {} is not written by the vertex stage",
                input.name.as_deref().unwrap_or("<unnamed>"),
                input.location
            ));
        }
    }

    let mut uniforms = vertex.uniforms.clone();
    for uniform in &fragment.uniforms {
        match uniforms
            .iter()
            .find(|existing| existing.location == uniform.location || existing.name == uniform.name)
        {
            Some(existing) if existing == uniform => {}
            Some(existing) => log.push(format!(
                "uniform `{}` conflicts with `{}` declared by the vertex stage",
                uniform.name, existing.name
            )),
            None => uniforms.push(uniform.clone()),
        }
    }

    if !log.is_empty() {
        return Err(log.join("\n"));
    }
    Ok(ProgramInterface {
        vertex: vertex.clone(),
        fragment: fragment.clone(),
        uniforms,
    })
}

fn collect_varyings(
    module: &Module,
    binding: Option<&Binding>,
    name: Option<&str>,
    ty: Handle<Type>,
    out: &mut Vec<Varying>,
) {
    match binding {
        Some(Binding::Location { location, .. }) => out.push(Varying {
            name: name.map(str::to_owned),
            location: *location,
        }),
        Some(_) => {}
        None => {
            if let TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    collect_varyings(
                        module,
                        member.binding.as_ref(),
                        member.name.as_deref(),
                        member.ty,
                        out,
                    );
                }
            }
        }
    }
}

fn collect_uniforms(module: &Module) -> Vec<UniformSlot> {
    module
        .global_variables
        .iter()
        .filter(|(_, global)| global.space == AddressSpace::Uniform)
        .filter_map(|(_, global)| {
            let binding = global.binding.as_ref()?;
            let name = global.name.clone()?;
            let is_mat4 = matches!(
                module.types[global.ty].inner,
                TypeInner::Matrix {
                    columns: VectorSize::Quad,
                    rows: VectorSize::Quad,
                    scalar: naga::Scalar { width: 4, .. },
                }
            );
            Some(UniformSlot {
                name,
                location: UniformLocation {
                    group: binding.group,
                    binding: binding.binding,
                },
                is_mat4,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::{CUBE_FRAGMENT_SHADER, CUBE_VERTEX_SHADER};

    #[test]
    fn reflects_cube_interface() {
        let vertex = compile_shader(ShaderStage::Vertex, CUBE_VERTEX_SHADER).unwrap();
        let fragment = compile_shader(ShaderStage::Fragment, CUBE_FRAGMENT_SHADER).unwrap();
        let program = link_program(&vertex, &fragment).unwrap();

        assert_eq!(program.attrib_location("vertPosition"), Some(AttribLocation(0)));
        assert_eq!(program.attrib_location("vertColor"), Some(AttribLocation(1)));
        assert_eq!(program.attrib_location("vertNormal"), None);
        assert_eq!(
            program.uniform_location("mProj"),
            Some(UniformLocation {
                group: 0,
                binding: 2
            })
        );
        assert!(program.validate().is_ok());
    }

    #[test]
    fn parse_errors_carry_diagnostics() {
        let log = compile_shader(ShaderStage::Vertex, "@vertex fn vs_main( {").unwrap_err();
        assert!(!log.is_empty());
    }

    #[test]
    fn missing_entry_point_fails_compile() {
        let log = compile_shader(ShaderStage::Vertex, CUBE_FRAGMENT_SHADER).unwrap_err();
        assert!(log.contains("@vertex"));
    }

    #[test]
    fn unmatched_fragment_input_fails_link() {
        let vertex = compile_shader(
            ShaderStage::Vertex,
            "@vertex fn vs_main(@location(0) p: vec2<f32>) -> @builtin(position) vec4<f32> {\n\
                 return vec4<f32>(p, 0.0, 1.0);\n\
             }",
        )
        .unwrap();
        let fragment = compile_shader(ShaderStage::Fragment, CUBE_FRAGMENT_SHADER).unwrap();
        let log = link_program(&vertex, &fragment).unwrap_err();
        assert!(log.contains("fragColor"));
    }

    #[test]
    fn non_matrix_uniform_fails_validation() {
        let vertex = compile_shader(
            ShaderStage::Vertex,
            "@group(0) @binding(0) var<uniform> tint: vec4<f32>;\n\
             @vertex fn vs_main() -> @builtin(position) vec4<f32> { return tint; }",
        )
        .unwrap();
        let fragment = compile_shader(
            ShaderStage::Fragment,
            "@fragment fn fs_main() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }",
        )
        .unwrap();
        let program = link_program(&vertex, &fragment).unwrap();
        assert!(program.validate().unwrap_err().contains("tint"));
    }
}
