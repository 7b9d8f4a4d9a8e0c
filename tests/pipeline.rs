use std::f32::consts::PI;
use std::time::Duration;

use glam::Mat4;

use spinning_cube::context::{Command, RecordingContext, UniformLocation};
use spinning_cube::{
    CubeSession, FixedStepScheduler, RenderConfig, SceneKind, Session, SetupError, ShaderStage,
};

fn location(program: &spinning_cube::ShaderProgram, name: &str) -> UniformLocation {
    program
        .uniform(name)
        .unwrap_or_else(|| panic!("{name} should resolve"))
}

#[test]
fn every_referenced_name_resolves() {
    let session = CubeSession::initialize(
        Some(RecordingContext::new()),
        &RenderConfig::default(),
        &mut Vec::<String>::new(),
    )
    .expect("setup succeeds");
    let program = session.program();
    for name in ["vertPosition", "vertColor"] {
        assert!(program.attribute(name).is_some(), "{name} unresolved");
    }
    for name in ["mWorld", "mView", "mProj"] {
        assert!(program.uniform(name).is_some(), "{name} unresolved");
    }
}

#[test]
fn rejected_shader_stops_setup_before_any_draw() {
    let mut ctx =
        RecordingContext::new().with_compile_failure(ShaderStage::Vertex, "0:3: syntax error");
    let mut notices: Vec<String> = Vec::new();
    let err = match CubeSession::initialize(Some(&mut ctx), &RenderConfig::default(), &mut notices)
    {
        Ok(_) => panic!("setup should fail"),
        Err(err) => err,
    };

    match err {
        SetupError::ShaderCompile { stage, log } => {
            assert_eq!(stage, ShaderStage::Vertex);
            assert!(log.contains("syntax error"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(ctx.draw_calls(), 0);
    assert_eq!(ctx.buffers_created(), 0);
    assert!(notices.is_empty());
}

#[test]
fn missing_context_creates_nothing_and_notifies() {
    let mut notices: Vec<String> = Vec::new();
    let result =
        Session::<RecordingContext>::initialize(None, &RenderConfig::default(), &mut notices);
    assert!(matches!(result, Err(SetupError::ContextUnavailable)));
    assert_eq!(notices.len(), 1);
    assert!(notices[0].contains("graphics context"));
}

#[test]
fn setup_uploads_each_matrix_once() {
    let config = RenderConfig::default();
    let mut ctx = RecordingContext::new();
    let session =
        CubeSession::initialize(Some(&mut ctx), &config, &mut Vec::<String>::new()).expect("setup");
    let program = session.program().clone();
    drop(session);

    let world = ctx.uniform_uploads(location(&program, "mWorld"));
    let view = ctx.uniform_uploads(location(&program, "mView"));
    let projection = ctx.uniform_uploads(location(&program, "mProj"));
    assert_eq!(world, vec![Mat4::IDENTITY.to_cols_array()]);
    assert_eq!(view.len(), 1);
    assert_eq!(projection.len(), 1);

    let expected_view = Mat4::look_at_rh(
        config.camera.eye,
        config.camera.target,
        config.camera.up,
    );
    assert_eq!(view[0], expected_view.to_cols_array());
    let expected_projection =
        Mat4::perspective_rh_gl(45f32.to_radians(), 800.0 / 600.0, 0.1, 1000.0);
    assert_eq!(projection[0], expected_projection.to_cols_array());
    assert!(ctx.commands().iter().all(|command| !matches!(
        command,
        Command::UniformMatrix4 {
            transpose: true,
            ..
        }
    )));
}

#[test]
fn tick_at_three_seconds_uploads_half_turn() {
    let mut ctx = RecordingContext::new();
    let mut session =
        CubeSession::initialize(Some(&mut ctx), &RenderConfig::default(), &mut Vec::<String>::new())
            .expect("setup");
    let world = location(session.program(), "mWorld");
    let view = location(session.program(), "mView");
    session.tick(Duration::from_secs(3));
    drop(session);

    let uploads = ctx.uniform_uploads(world);
    assert_eq!(uploads.len(), 2);
    let uploaded = Mat4::from_cols_array(&uploads[1]);
    let expected = Mat4::from_rotation_y(PI) * Mat4::from_rotation_x(PI / 4.0);
    assert!(uploaded.abs_diff_eq(expected, 1e-5));
    assert_eq!(ctx.uniform_uploads(view).len(), 1);
    assert_eq!(ctx.draw_calls(), 1);
}

#[test]
fn ticks_follow_the_rotation_over_time() {
    let mut ctx = RecordingContext::new();
    let mut session =
        CubeSession::initialize(Some(&mut ctx), &RenderConfig::default(), &mut Vec::<String>::new())
            .expect("setup");
    let world = location(session.program(), "mWorld");
    let times = [0.75f32, 6.0, 10.5, 24.0];
    for seconds in times {
        session.tick(Duration::from_secs_f32(seconds));
    }
    drop(session);

    let uploads = ctx.uniform_uploads(world);
    assert_eq!(uploads.len(), times.len() + 1);
    for (seconds, uploaded) in times.iter().zip(&uploads[1..]) {
        let angle = seconds / 6.0 * 2.0 * PI;
        let expected = Mat4::from_axis_angle(glam::Vec3::Y, angle)
            * Mat4::from_axis_angle(glam::Vec3::X, angle / 4.0);
        assert!(
            Mat4::from_cols_array(uploaded).abs_diff_eq(expected, 1e-4),
            "world at {seconds}s"
        );
    }
    assert!(Mat4::from_cols_array(&uploads[4]).abs_diff_eq(Mat4::IDENTITY, 1e-4));
}

#[test]
fn projection_uses_the_surface_aspect() {
    let requested = RenderConfig::default();
    let actual = requested.for_surface(1200, 600);
    let mut ctx = RecordingContext::new();
    let session =
        CubeSession::initialize(Some(&mut ctx), &actual, &mut Vec::<String>::new()).expect("setup");
    let projection = location(session.program(), "mProj");
    drop(session);

    let expected = Mat4::perspective_rh_gl(45f32.to_radians(), 2.0, 0.1, 1000.0);
    assert_eq!(
        ctx.uniform_uploads(projection),
        vec![expected.to_cols_array()]
    );
}

#[test]
fn validation_failure_still_draws() {
    let config = RenderConfig {
        validate: true,
        ..RenderConfig::default()
    };
    let mut session = Session::initialize(
        Some(RecordingContext::new().with_validation_failure("uniform block mismatch")),
        &config,
        &mut Vec::<String>::new(),
    )
    .expect("validation is not fatal");
    assert_eq!(
        session.program().validation_warning.as_deref(),
        Some("uniform block mismatch")
    );

    let mut scheduler = FixedStepScheduler::new(Duration::from_millis(16), 4);
    session.run(&mut scheduler);
    assert_eq!(session.context().draw_calls(), 4);
}

#[test]
fn stop_handle_ends_the_loop() {
    let mut session = Session::initialize(
        Some(RecordingContext::new()),
        &RenderConfig::default(),
        &mut Vec::<String>::new(),
    )
    .expect("setup");
    let stop = session.stop_handle();

    let mut scheduler = FixedStepScheduler::new(Duration::from_millis(16), 3);
    session.run(&mut scheduler);
    assert_eq!(session.frames(), 3);

    stop.stop();
    let mut scheduler = FixedStepScheduler::new(Duration::from_millis(16), 3);
    session.run(&mut scheduler);
    assert_eq!(session.frames(), 3);
    assert_eq!(session.context().frames_presented(), 3);
}

#[test]
fn triangle_uses_the_same_pipeline() {
    let config = RenderConfig {
        scene: SceneKind::Triangle,
        ..RenderConfig::default()
    };
    let session = Session::initialize(
        Some(RecordingContext::new()),
        &config,
        &mut Vec::<String>::new(),
    )
    .expect("setup");
    let commands = session.context().commands();
    assert_eq!(session.context().buffers_created(), 1);
    assert!(commands.contains(&Command::DrawArrays {
        primitive: spinning_cube::context::Primitive::Triangles,
        first: 0,
        count: 3,
    }));
    assert_eq!(session.program().resolved_uniforms(), 0);
}
