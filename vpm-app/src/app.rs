use std::sync::{mpsc, Arc};
use std::thread;

use anyhow::Result;
use pixels::{Pixels, SurfaceTexture};
use tiny_skia::Pixmap;
use tracing::{error, info, warn};
use vpm_client::{fetch_session_score, LocalScorer, ProvisionError, SessionScore};
use vpm_core::{SessionManifest, TrialPhase, TrialReporter};
use vpm_render::{Hud, OptionRegion, VariantRenderer};
use vpm_session::{SessionConfig, SessionRunner};
use vpm_timing::MonotonicClock;
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Fullscreen, Window, WindowId},
};

/// Where the end-of-session aggregate comes from.
pub enum ScoreSource {
    Backend { base_url: String },
    Local(LocalScorer),
}

enum ScoreState {
    Idle,
    Pending(mpsc::Receiver<Result<SessionScore, ProvisionError>>),
    Ready(Result<SessionScore, ProvisionError>),
}

pub struct App {
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    canvas: Option<Pixmap>,
    runner: SessionRunner<MonotonicClock, Box<dyn TrialReporter>>,
    renderer: Box<dyn VariantRenderer>,
    hud: Hud,
    option_regions: Vec<OptionRegion>,
    cursor_pos: Option<(f32, f32)>,
    score_source: ScoreSource,
    score: ScoreState,
    windowed: bool,
    should_exit: bool,
}

impl App {
    pub fn new(
        manifest: SessionManifest,
        config: SessionConfig,
        reporter: Box<dyn TrialReporter>,
        score_source: ScoreSource,
        renderer: Box<dyn VariantRenderer>,
        hud: Hud,
        windowed: bool,
    ) -> Self {
        let runner = SessionRunner::new(manifest, config, MonotonicClock::new(), reporter);
        Self {
            window: None,
            pixels: None,
            canvas: None,
            runner,
            renderer,
            hud,
            option_regions: Vec::new(),
            cursor_pos: None,
            score_source,
            score: ScoreState::Idle,
            windowed,
            should_exit: false,
        }
    }

    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        event_loop.run_app(&mut self)?;
        Ok(())
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let mut attributes = Window::default_attributes().with_title("Memoria perceptual");
        if self.windowed {
            attributes = attributes.with_inner_size(LogicalSize::new(1280.0, 720.0));
        } else {
            let monitor = event_loop
                .primary_monitor()
                .or_else(|| event_loop.available_monitors().next());
            attributes = attributes.with_fullscreen(Some(Fullscreen::Borderless(monitor)));
        }

        let window = Arc::new(event_loop.create_window(attributes)?);
        let size = window.inner_size();
        info!(width = size.width, height = size.height, "window created");

        let surface_texture = SurfaceTexture::new(size.width, size.height, window.clone());
        self.pixels = Some(Pixels::new(size.width, size.height, surface_texture)?);
        self.canvas = Pixmap::new(size.width, size.height);

        window.request_redraw();
        self.window = Some(window);

        self.runner.start();
        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        self.runner.tick();
        self.poll_score();

        let summary = if self.runner.phase().is_finished() {
            Some(self.summary_content())
        } else {
            None
        };

        let Some(canvas) = self.canvas.as_mut() else {
            return Ok(());
        };
        match self.runner.phase() {
            TrialPhase::Idle => self.renderer.clear(canvas),
            TrialPhase::Presenting => {
                self.option_regions.clear();
                if let Some(item) = self.runner.current_item() {
                    self.renderer.present_stimulus(canvas, item)?;
                }
            }
            TrialPhase::AwaitingInput | TrialPhase::Submitting | TrialPhase::Feedback => {
                if let Some(item) = self.runner.current_item() {
                    self.option_regions = self.renderer.present_options(canvas, item)?;
                }
            }
            TrialPhase::Finished => {
                self.option_regions.clear();
                self.renderer.clear(canvas);
                if let Some((title, lines)) = &summary {
                    self.hud.draw_summary(canvas, title, lines);
                }
            }
        }
        if !self.runner.phase().is_finished() {
            self.hud.draw_status(canvas, self.runner.status());
        }
        if let Some((current, total)) = self.runner.progress() {
            self.hud.draw_progress(canvas, current, total);
        }

        if let Some(pixels) = self.pixels.as_mut() {
            pixels.frame_mut().copy_from_slice(canvas.data());
            pixels.render()?;
        }
        if let Some(window) = &self.window {
            window.request_redraw();
        }
        Ok(())
    }

    /// Kicks off the score fetch once the series ends and collects the reply.
    fn poll_score(&mut self) {
        if !self.runner.phase().is_finished() || self.runner.item_count() == 0 {
            return;
        }
        if matches!(self.score, ScoreState::Idle) {
            self.score = match &self.score_source {
                ScoreSource::Backend { base_url } => {
                    let (tx, rx) = mpsc::channel();
                    let base_url = base_url.clone();
                    let session_id = self.runner.session_id().clone();
                    thread::spawn(move || {
                        let _ = tx.send(fetch_session_score(&base_url, &session_id));
                    });
                    ScoreState::Pending(rx)
                }
                ScoreSource::Local(scorer) => ScoreState::Ready(Ok(scorer.summary())),
            };
            return;
        }
        let received = if let ScoreState::Pending(rx) = &mut self.score {
            rx.try_recv().ok()
        } else {
            None
        };
        if let Some(result) = received {
            if let Err(err) = &result {
                warn!(error = %err, "score fetch failed");
            }
            self.score = ScoreState::Ready(result);
        }
    }

    fn summary_content(&self) -> (String, Vec<String>) {
        let title = self.runner.status().to_owned();
        let lines = match &self.score {
            ScoreState::Ready(Ok(score)) if score.n > 0 => vec![
                format!("Precisión: {:.0}%", score.accuracy * 100.0),
                format!("TR medio: {:.0} ms", score.rt_avg_ms),
                format!("Nivel alcanzado: {}", score.level_reached),
            ],
            ScoreState::Ready(_) => vec!["Puntaje no disponible".to_owned()],
            ScoreState::Idle | ScoreState::Pending(_) => Vec::new(),
        };
        (title, lines)
    }

    fn handle_key(&mut self, key: PhysicalKey, event_loop: &ActiveEventLoop) {
        let PhysicalKey::Code(code) = key else {
            return;
        };
        match code {
            KeyCode::Escape => self.exit(event_loop),
            code => {
                if let Some(index) = digit_index(code) {
                    self.runner.handle_choice(index);
                }
            }
        }
    }

    fn handle_click(&mut self) {
        let Some((x, y)) = self.cursor_pos else {
            return;
        };
        let index = self
            .option_regions
            .iter()
            .find(|region| region.contains(x, y))
            .map(|region| region.index);
        if let Some(index) = index {
            self.runner.handle_choice(index);
        }
    }

    fn handle_resize(&mut self, size: PhysicalSize<u32>) {
        if size.width == 0 || size.height == 0 {
            return;
        }
        if let Some(pixels) = &mut self.pixels {
            if let Err(err) = pixels.resize_surface(size.width, size.height) {
                warn!(error = %err, "failed to resize surface");
            }
            if let Err(err) = pixels.resize_buffer(size.width, size.height) {
                warn!(error = %err, "failed to resize buffer");
            }
        }
        self.canvas = Pixmap::new(size.width, size.height);
        info!(width = size.width, height = size.height, "display resized");
    }

    fn exit(&mut self, event_loop: &ActiveEventLoop) {
        info!("shutting down");
        self.should_exit = true;
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(err) = self.create_window_and_surface(event_loop) {
                error!(error = %err, "failed to create window and surface");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.exit(event_loop),
            WindowEvent::RedrawRequested => {
                if let Err(err) = self.render() {
                    error!(error = %err, "render failed");
                    event_loop.exit();
                }
            }
            WindowEvent::KeyboardInput { event, .. } if event.state.is_pressed() => {
                self.handle_key(event.physical_key, event_loop);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_pos = Some((position.x as f32, position.y as f32));
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                self.handle_click();
            }
            WindowEvent::Resized(size) => self.handle_resize(size),
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(window) = &self.window {
                    self.handle_resize(window.inner_size());
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.should_exit {
            event_loop.exit();
        }
    }
}

/// Key 1 selects the first option; numpad digits count too.
fn digit_index(code: KeyCode) -> Option<usize> {
    let index = match code {
        KeyCode::Digit1 | KeyCode::Numpad1 => 0,
        KeyCode::Digit2 | KeyCode::Numpad2 => 1,
        KeyCode::Digit3 | KeyCode::Numpad3 => 2,
        KeyCode::Digit4 | KeyCode::Numpad4 => 3,
        KeyCode::Digit5 | KeyCode::Numpad5 => 4,
        KeyCode::Digit6 | KeyCode::Numpad6 => 5,
        KeyCode::Digit7 | KeyCode::Numpad7 => 6,
        KeyCode::Digit8 | KeyCode::Numpad8 => 7,
        KeyCode::Digit9 | KeyCode::Numpad9 => 8,
        _ => return None,
    };
    Some(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digit_keys_map_to_zero_based_indices() {
        assert_eq!(digit_index(KeyCode::Digit1), Some(0));
        assert_eq!(digit_index(KeyCode::Numpad3), Some(2));
        assert_eq!(digit_index(KeyCode::Digit9), Some(8));
        assert_eq!(digit_index(KeyCode::KeyA), None);
    }
}
