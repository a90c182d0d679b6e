use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use overworld::{
    load_config_for, open_world, resolve_asset_paths, Frame, Session, StartupError, WorldError,
};
use pixels::{Error as PixelsError, Pixels, SurfaceTexture};
use thiserror::Error;
use tracing::{error, info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowBuilder};

use super::bootstrap::LoopConfig;
use super::input::{ActionStates, InputAction, InputSnapshot};

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("failed to start world: {0}")]
    World(#[from] WorldError),
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

pub(crate) fn run(config: LoopConfig) -> ExitCode {
    if let Err(err) = run_app(config) {
        error!(error = %err, "startup_failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run_app(config: LoopConfig) -> Result<(), AppError> {
    let paths = resolve_asset_paths()?;
    info!(
        root = %paths.root.display(),
        assets_dir = %paths.assets_dir.display(),
        config = %paths.config_path.display(),
        "startup"
    );
    let world_config = load_config_for(&paths).map_err(StartupError::from)?;
    let (world, player) = open_world(&paths, &world_config)?;
    let mut session = Session::new(world, player)?;

    let viewport = world_config.viewport;
    let scale = config.window_scale.max(1);
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                (viewport.width * scale) as f64,
                (viewport.height * scale) as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let size = window.inner_size();
    let mut pixels = build_pixels(
        Arc::clone(&window),
        viewport.width,
        viewport.height,
        size.width,
        size.height,
    )
    .map_err(AppError::CreateRenderer)?;
    let mut frame = Frame::new(viewport.width, viewport.height);

    event_loop.set_control_flow(ControlFlow::Poll);

    let target_tps = world_config.target_tps.max(1);
    let fixed_dt = fixed_tick(target_tps);
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let mut input_collector = InputCollector::default();

    info!(
        target_tps,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        viewport_width = viewport.width,
        viewport_height = viewport.height,
        window_scale = scale,
        "loop_config"
    );

    let mut accumulator = Duration::ZERO;
    let mut last_frame_instant = Instant::now();

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    input_collector.mark_quit_requested();
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    if new_size.width == 0 || new_size.height == 0 {
                        return;
                    }
                    match build_pixels(
                        Arc::clone(&window),
                        viewport.width,
                        viewport.height,
                        new_size.width,
                        new_size.height,
                    ) {
                        Ok(rebuilt) => pixels = rebuilt,
                        Err(error) => {
                            warn!(error = %error, "renderer_resize_failed");
                            window_target.exit();
                        }
                    }
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    input_collector.handle_keyboard_input(&event);
                    if input_collector.quit_requested {
                        info!(reason = "escape_key", "shutdown_requested");
                        window_target.exit();
                    }
                }
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                    last_frame_instant = now;

                    let clamped_frame_dt = clamp_frame_delta(raw_frame_dt, max_frame_delta);
                    accumulator = accumulator.saturating_add(clamped_frame_dt);

                    let step_plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
                    for _ in 0..step_plan.ticks_to_run {
                        let input_snapshot = input_collector.snapshot_for_tick();
                        if input_snapshot.quit_requested() {
                            break;
                        }
                        if let Err(error) = session.step(input_snapshot.step_input()) {
                            error!(error = %error, "world_step_failed");
                            window_target.exit();
                            return;
                        }
                    }
                    accumulator = step_plan.remaining_accumulator;

                    if step_plan.dropped_backlog > Duration::ZERO {
                        warn!(
                            dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                            max_ticks_per_frame, "sim_clamp_triggered"
                        );
                    }

                    if let Err(error) = session.render(&mut frame) {
                        error!(error = %error, "world_draw_failed");
                        window_target.exit();
                        return;
                    }
                    pixels.frame_mut().copy_from_slice(frame.as_bytes());
                    if let Err(error) = pixels.render() {
                        warn!(error = %error, "renderer_draw_failed");
                        window_target.exit();
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                window.request_redraw();
            }
            Event::LoopExiting => {
                info!(obj_count = session.obj_count(), "shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

fn build_pixels(
    window: Arc<Window>,
    buffer_width: u32,
    buffer_height: u32,
    surface_width: u32,
    surface_height: u32,
) -> Result<Pixels<'static>, PixelsError> {
    let surface = SurfaceTexture::new(surface_width, surface_height, window);
    Pixels::new(buffer_width, buffer_height, surface)
}

#[derive(Debug, Default)]
struct InputCollector {
    quit_requested: bool,
    surf_key_is_down: bool,
    toggle_surf_pressed_edge: bool,
    action_states: ActionStates,
}

impl InputCollector {
    fn mark_quit_requested(&mut self) {
        self.quit_requested = true;
    }

    fn handle_keyboard_input(&mut self, key_event: &KeyEvent) {
        let is_pressed = key_event.state == ElementState::Pressed;
        self.update_action_state_from_physical_key(key_event.physical_key, is_pressed);
        self.handle_surf_key_state(
            key_event.physical_key == PhysicalKey::Code(KeyCode::KeyE),
            key_event.state,
        );
    }

    fn update_action_state_from_physical_key(&mut self, key: PhysicalKey, is_pressed: bool) {
        match key {
            PhysicalKey::Code(KeyCode::KeyW) | PhysicalKey::Code(KeyCode::ArrowUp) => {
                self.action_states.set(InputAction::MoveUp, is_pressed);
            }
            PhysicalKey::Code(KeyCode::KeyS) | PhysicalKey::Code(KeyCode::ArrowDown) => {
                self.action_states.set(InputAction::MoveDown, is_pressed);
            }
            PhysicalKey::Code(KeyCode::KeyA) | PhysicalKey::Code(KeyCode::ArrowLeft) => {
                self.action_states.set(InputAction::MoveLeft, is_pressed);
            }
            PhysicalKey::Code(KeyCode::KeyD) | PhysicalKey::Code(KeyCode::ArrowRight) => {
                self.action_states.set(InputAction::MoveRight, is_pressed);
            }
            PhysicalKey::Code(KeyCode::ShiftLeft) | PhysicalKey::Code(KeyCode::ShiftRight) => {
                self.action_states.set(InputAction::Run, is_pressed);
            }
            PhysicalKey::Code(KeyCode::Escape) => {
                self.action_states.set(InputAction::Quit, is_pressed);
                if is_pressed {
                    self.mark_quit_requested();
                }
            }
            _ => {}
        }
    }

    fn handle_surf_key_state(&mut self, is_surf_key: bool, state: ElementState) {
        if !is_surf_key {
            return;
        }

        match state {
            ElementState::Pressed => {
                if !self.surf_key_is_down {
                    self.toggle_surf_pressed_edge = true;
                }
                self.surf_key_is_down = true;
            }
            ElementState::Released => self.surf_key_is_down = false,
        }
    }

    fn snapshot_for_tick(&mut self) -> InputSnapshot {
        let snapshot = InputSnapshot::new(
            self.quit_requested,
            self.toggle_surf_pressed_edge,
            self.action_states,
        );
        self.toggle_surf_pressed_edge = false;
        snapshot
    }
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

/// Whole fixed ticks the accumulated time covers, capped at
/// `max_ticks_per_frame`. Time a capped frame could not run is dropped rather
/// than carried into the next frame.
fn plan_sim_steps(
    accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let whole_ticks = accumulator.as_nanos() / fixed_dt.as_nanos().max(1);
    let ticks_to_run = whole_ticks.min(u128::from(max_ticks_per_frame)) as u32;
    let leftover = accumulator.saturating_sub(fixed_dt * ticks_to_run);

    if leftover >= fixed_dt {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: leftover,
        }
    } else {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: leftover,
            dropped_backlog: Duration::ZERO,
        }
    }
}

fn fixed_tick(target_tps: u32) -> Duration {
    Duration::from_secs_f64(1.0 / f64::from(target_tps.max(1)))
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}
