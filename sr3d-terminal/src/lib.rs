/// Terminal front end: presents the software renderer in the terminal and
/// feeds it keyboard input
use crossterm::{
    cursor,
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, ClearType},
};
use sr3d_core::{
    CullMode, Engine, EngineConfig, FpsCounter, FrameStats, KeySet, Mesh, Quaternion,
    RotationStep, Vector3D,
};
use std::io::{self, stdout, Write};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub mod input;
pub mod logger;
pub mod renderer;

pub use input::{Control, InputThread};
pub use renderer::TerminalSurface;

/// Radians per second for the look keys; the frame rate is capped, so a
/// per-frame step would be too slow to use
const TURN_RATE: f32 = 1.2;

/// Main application struct for terminal 3D rendering
pub struct TerminalApp {
    engine: Engine,
    surface: TerminalSurface,
    keys: Arc<KeySet>,
    /// Radians per second the mesh spins about its vertical axis
    spin: f32,
    running: bool,
    fps: FpsCounter,
    stats: FrameStats,
}

impl TerminalApp {
    pub fn new(mesh: Mesh) -> io::Result<Self> {
        let (cols, rows) = terminal::size()?;
        let surface = TerminalSurface::new(cols as usize, rows as usize);

        let config = EngineConfig::default()
            .with_viewport(surface.cols(), surface.rows() * 2)
            .with_rotation_step(RotationStep::PerSecond(TURN_RATE))
            .with_cull(CullMode::WorldSpace);
        let engine = Engine::new(config, mesh).map_err(to_io)?;

        Ok(Self {
            engine,
            surface,
            keys: Arc::new(KeySet::new()),
            spin: 0.0,
            running: true,
            fps: FpsCounter::new(),
            stats: FrameStats::default(),
        })
    }

    /// Slowly rotate the mesh, for demos.
    pub fn with_spin(mut self, radians_per_second: f32) -> Self {
        self.spin = radians_per_second;
        self
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        let release_events = terminal::supports_keyboard_enhancement().unwrap_or(false);
        if release_events {
            execute!(
                stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }
        log::info!("terminal input: release events {}", if release_events { "on" } else { "off" });

        let (mut input, events) = InputThread::spawn(Arc::clone(&self.keys), release_events);
        let result = self.main_loop(&events);
        input.stop();

        // Cleanup
        if release_events {
            execute!(stdout(), PopKeyboardEnhancementFlags)?;
        }
        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn main_loop(&mut self, events: &Receiver<Control>) -> io::Result<()> {
        let target_frame_time = Duration::from_millis(1000 / 30); // 30 FPS target
        let mut last_frame = Instant::now();

        while self.running {
            let frame_start = Instant::now();
            let dt = (frame_start - last_frame).as_secs_f32();
            last_frame = frame_start;

            // Handle input
            self.handle_events(events)?;
            if !self.running {
                break;
            }

            // Update
            self.update(dt);

            // Render
            self.render(dt)?;

            // Frame timing
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }
            self.fps.tick(frame_start.elapsed());
        }

        Ok(())
    }

    fn handle_events(&mut self, events: &Receiver<Control>) -> io::Result<()> {
        loop {
            match events.try_recv() {
                Ok(Control::Quit) | Err(TryRecvError::Disconnected) => {
                    self.running = false;
                    return Ok(());
                }
                Ok(Control::Resize(cols, rows)) => self.resize(cols as usize, rows as usize)?,
                Err(TryRecvError::Empty) => return Ok(()),
            }
        }
    }

    fn resize(&mut self, cols: usize, rows: usize) -> io::Result<()> {
        if cols == 0 || rows == 0 {
            return Ok(());
        }
        self.engine.resize(cols, rows * 2).map_err(to_io)?;
        self.surface.resize(cols, rows);
        execute!(stdout(), terminal::Clear(ClearType::All))?;
        Ok(())
    }

    fn update(&mut self, dt: f32) {
        if self.spin != 0.0 {
            let mesh = self.engine.mesh_mut();
            let turn = Quaternion::from_axis_angle(Vector3D::new(0.0, 1.0, 0.0), self.spin * dt);
            mesh.rotation = turn * mesh.rotation;
        }
    }

    fn render(&mut self, dt: f32) -> io::Result<()> {
        self.stats = self
            .engine
            .advance(dt, self.keys.as_ref(), &mut self.surface)
            .map_err(to_io)?;

        // Output to terminal
        let mut stdout = stdout();
        self.surface.draw(&mut stdout)?;

        // Draw UI overlay
        let camera = self.engine.camera();
        let status = format!(
            "SR3D | FPS: {:.1} | tris {}/{} | pos {:.1} {:.1} {:.1} | WASD=Move Arrows=Look Q=Quit",
            self.fps.fps(),
            self.stats.rasterized,
            self.stats.submitted,
            camera.position.x,
            camera.position.y,
            camera.position.z,
        );
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            SetBackgroundColor(Color::Black),
            Print(fit_width(&status, self.surface.cols())),
            ResetColor
        )?;
        self.surface.invalidate_row(0);

        stdout.flush()?;
        Ok(())
    }
}

fn to_io(e: sr3d_core::EngineError) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, e)
}

/// Cut `text` to `cols` characters so the overlay never wraps past row 0.
fn fit_width(text: &str, cols: usize) -> &str {
    match text.char_indices().nth(cols) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
