use std::fmt;

use thiserror::Error;

/// Programmable stage a shader source is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex"),
            Self::Fragment => f.write_str("fragment"),
        }
    }
}

/// Failures that abort session setup. None of these can occur once the render
/// loop is running.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("no usable graphics context is available")]
    ContextUnavailable,
    #[error("failed to compile {stage} shader: {log}")]
    ShaderCompile { stage: ShaderStage, log: String },
    #[error("failed to link program: {log}")]
    ProgramLink { log: String },
    #[error("failed to enable vertex attribute `{name}`: {reason}")]
    AttributeEnable { name: String, reason: String },
    #[error("invalid geometry: {0}")]
    GeometryInvalid(String),
}

impl SetupError {
    /// Message shown to the user when setup cannot even reach the device.
    pub fn notice(&self) -> String {
        match self {
            Self::ContextUnavailable => {
                "Your platform does not provide a usable graphics context.".to_string()
            }
            other => format!("Rendering could not start: {other}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_error_names_stage() {
        let err = SetupError::ShaderCompile {
            stage: ShaderStage::Fragment,
            log: "expected `;`".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to compile fragment shader: expected `;`"
        );
    }

    #[test]
    fn context_notice_is_user_facing() {
        let notice = SetupError::ContextUnavailable.notice();
        assert!(notice.contains("graphics context"));
    }
}
