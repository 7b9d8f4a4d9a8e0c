use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::render_loop::DEFAULT_CLEAR_COLOR;
use crate::transform::CameraConfig;

pub const USAGE: &str = "Usage: spinning-cube [cube|triangle] [--headless] [--frames N] \
[--width W] [--height H] [--validate|--no-validate]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SceneKind {
    #[default]
    Cube,
    Triangle,
}

impl fmt::Display for SceneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cube => f.write_str("cube"),
            Self::Triangle => f.write_str("triangle"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub scene: SceneKind,
    pub width: u32,
    pub height: u32,
    pub clear_color: [f32; 4],
    pub camera: CameraConfig,
    /// Run program validation after linking. On by default in debug builds.
    pub validate: bool,
    pub headless: bool,
    /// Frames rendered by a headless run.
    pub frames: u32,
    /// Simulated time between headless frames.
    pub frame_step: Duration,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            scene: SceneKind::Cube,
            width: 800,
            height: 600,
            clear_color: DEFAULT_CLEAR_COLOR,
            camera: CameraConfig::default(),
            validate: cfg!(debug_assertions),
            headless: false,
            frames: 60,
            frame_step: Duration::from_secs(1) / 60,
        }
    }
}

impl RenderConfig {
    /// Parses command-line arguments, program name excluded.
    pub fn from_args<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut config = Self::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "cube" => config.scene = SceneKind::Cube,
                "triangle" => config.scene = SceneKind::Triangle,
                "--headless" => config.headless = true,
                "--validate" => config.validate = true,
                "--no-validate" => config.validate = false,
                "--frames" => config.frames = value(&mut args, "--frames")?,
                "--width" => config.width = positive(&mut args, "--width")?,
                "--height" => config.height = positive(&mut args, "--height")?,
                "-h" | "--help" => return Err(anyhow!(USAGE)),
                other => {
                    return Err(anyhow!("Unknown argument: {other}. {USAGE}"));
                }
            }
        }
        Ok(config)
    }

    /// Width over height of the drawing surface, fixed for the session.
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    /// The same settings sized to the surface the host actually created,
    /// which may differ from the requested `--width`/`--height`.
    pub fn for_surface(&self, width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            ..self.clone()
        }
    }
}

fn value<T>(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = args
        .next()
        .ok_or_else(|| anyhow!("{flag} expects a value. {USAGE}"))?;
    raw.parse()
        .with_context(|| format!("invalid value for {flag}: {raw}"))
}

fn positive(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<u32> {
    let parsed: u32 = value(args, flag)?;
    if parsed == 0 {
        return Err(anyhow!("{flag} must be greater than zero"));
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<RenderConfig> {
        RenderConfig::from_args(args.iter().map(|arg| arg.to_string()))
    }

    #[test]
    fn defaults_to_windowed_cube() {
        let config = parse(&[]).unwrap();
        assert_eq!(config.scene, SceneKind::Cube);
        assert_eq!((config.width, config.height), (800, 600));
        assert!(!config.headless);
        assert_eq!(config.clear_color, [0.75, 0.85, 0.8, 1.0]);
    }

    #[test]
    fn parses_headless_triangle() {
        let config = parse(&["triangle", "--headless", "--frames", "3", "--no-validate"]).unwrap();
        assert_eq!(config.scene, SceneKind::Triangle);
        assert!(config.headless);
        assert_eq!(config.frames, 3);
        assert!(!config.validate);
    }

    #[test]
    fn rejects_unknown_flags() {
        let err = parse(&["--spin-faster"]).unwrap_err();
        assert!(err.to_string().contains("Unknown argument: --spin-faster"));
    }

    #[test]
    fn rejects_bad_numbers() {
        assert!(parse(&["--frames", "many"]).is_err());
        assert!(parse(&["--width", "0"]).is_err());
        assert!(parse(&["--height"]).is_err());
    }

    #[test]
    fn aspect_follows_surface_size() {
        let config = parse(&["--width", "1024", "--height", "512"]).unwrap();
        assert_eq!(config.aspect(), 2.0);
    }

    #[test]
    fn surface_size_overrides_requested_size() {
        let requested = parse(&["triangle", "--frames", "7"]).unwrap();
        let actual = requested.for_surface(1200, 600);
        assert_eq!((actual.width, actual.height), (1200, 600));
        assert_eq!(actual.aspect(), 2.0);
        assert_eq!(actual.scene, SceneKind::Triangle);
        assert_eq!(actual.frames, 7);
        assert_eq!(requested.for_surface(0, 0).aspect(), 1.0);
    }
}
