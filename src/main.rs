use std::env;

use anyhow::{Context, Result};

use spinning_cube::{FixedStepScheduler, RecordingContext, RenderConfig, Session};

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}

fn run() -> Result<()> {
    let config = RenderConfig::from_args(env::args().skip(1))?;
    println!(
        "Rendering {} at {}x{}",
        config.scene, config.width, config.height
    );

    if config.headless {
        run_headless(&config)
    } else {
        run_windowed(&config)
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn run_windowed(config: &RenderConfig) -> Result<()> {
    use spinning_cube::window::{run_window, WindowInitError};

    match run_window(config.clone()) {
        Ok(()) => Ok(()),
        Err(err) if err.downcast_ref::<WindowInitError>().is_some() => {
            eprintln!(
                "{err}. Falling back to --headless mode (set DISPLAY or install X11 libs to enable rendering)."
            );
            run_headless(config)
        }
        Err(err) => Err(err),
    }
}

#[cfg(target_arch = "wasm32")]
fn run_windowed(config: &RenderConfig) -> Result<()> {
    run_headless(config)
}

fn run_headless(config: &RenderConfig) -> Result<()> {
    let mut session = Session::initialize(
        Some(RecordingContext::new()),
        config,
        &mut spinning_cube::LogNotifier,
    )
    .context("failed to set up scene")?;
    let program = session.program();
    println!(
        "Program: {} attribute(s), {} uniform(s)",
        program.resolved_attributes(),
        program.resolved_uniforms()
    );
    if let Some(warning) = &program.validation_warning {
        println!("Validation warning: {warning}");
    }

    let mut scheduler = FixedStepScheduler::new(config.frame_step, config.frames);
    session.run(&mut scheduler);

    println!(
        "Rendered {} frame(s) with {} draw call(s)",
        session.frames(),
        session.context().draw_calls()
    );
    if let Some(transform) = session.transform() {
        let world = transform.world.to_cols_array_2d();
        println!("Final world matrix:");
        for row in 0..4 {
            println!(
                "  [{:>7.3} {:>7.3} {:>7.3} {:>7.3}]",
                world[0][row], world[1][row], world[2][row], world[3][row]
            );
        }
    }
    Ok(())
}
