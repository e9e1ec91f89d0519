#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    if let Err(err) = preview::run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
mod preview {
    use std::any::Any;
    use std::fmt;
    use std::panic::{self, AssertUnwindSafe};
    use std::path::PathBuf;

    use anyhow::{anyhow, Context, Result};
    use clap::Parser;
    use log::info;
    use pollster::block_on;
    use winit::dpi::LogicalSize;
    use winit::event::{ElementState, Event, KeyboardInput, WindowEvent};
    use winit::event_loop::{ControlFlow, EventLoop};
    use winit::platform::run_return::EventLoopExtRunReturn;
    use winit::window::{Window, WindowBuilder};

    use danfo_bus::app::{bootstrap_summary, load_config, print_final_state};
    use danfo_bus::{
        DirectoryIcons, FrameDriver, Headless, KeyCode, KeySequence, NamedKey, Renderer,
        SceneContext, SurfaceSize, TextureCache,
    };

    const DEFAULT_FRAMES: u64 = 600;

    /// Preview the danfo bus decoration outside the browser.
    #[derive(Debug, Parser)]
    #[command(name = "danfo-bus", version)]
    struct CliOptions {
        /// `<decor>` XML configuration file.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Directory that catalog `<image>` paths are resolved against.
        #[arg(long)]
        icons: Option<PathBuf>,
        /// Frames to simulate. Headless runs default to 600; windowed runs
        /// continue until closed unless given.
        #[arg(long)]
        frames: Option<u64>,
        /// Seed for the emitter's random draws.
        #[arg(long)]
        seed: Option<u64>,
        /// Skip the window and print a summary.
        #[arg(long)]
        summary_only: bool,
    }

    pub fn run() -> Result<()> {
        let options = CliOptions::parse();
        let mut config = load_config(options.config.as_deref())?;
        if options.seed.is_some() {
            config.seed = options.seed;
        }
        let textures = match &options.icons {
            Some(root) => TextureCache::new(DirectoryIcons::new(root)),
            None => TextureCache::default(),
        };
        let mut ctx = SceneContext::with_textures(config, textures);
        println!("{}", bootstrap_summary(&ctx));

        if options.summary_only {
            return run_headless(&mut ctx, options.frames.unwrap_or(DEFAULT_FRAMES));
        }
        match run_interactive(&mut ctx, options.frames) {
            Ok(()) => Ok(()),
            Err(err) => {
                if err.downcast_ref::<WindowInitError>().is_some() {
                    eprintln!(
                        "{err}. Falling back to --summary-only mode (set DISPLAY or install X11 libs to enable rendering)."
                    );
                    run_headless(&mut ctx, options.frames.unwrap_or(DEFAULT_FRAMES))
                } else {
                    Err(err)
                }
            }
        }
    }

    fn run_headless(ctx: &mut SceneContext, frames: u64) -> Result<()> {
        let mut driver = FrameDriver::new(&ctx.config.scene);
        let ran = driver.run(ctx, &mut Headless, frames);
        print_final_state(ran, ctx);
        Ok(())
    }

    fn run_interactive(ctx: &mut SceneContext, max_frames: Option<u64>) -> Result<()> {
        let default_hook = panic::take_hook();
        panic::set_hook(Box::new(|_| {}));
        let event_loop = panic::catch_unwind(AssertUnwindSafe(EventLoop::new));
        panic::set_hook(default_hook);
        let mut event_loop =
            event_loop.map_err(|panic| WindowInitError::from_panic("event loop", panic))?;
        let window = WindowBuilder::new()
            .with_title("Danfo Bus")
            .with_transparent(true)
            .with_inner_size(LogicalSize::new(960.0, 540.0))
            .build(&event_loop)
            .map_err(|err| WindowInitError::from_error("window", err))?;

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        // SAFETY: the window moves into `AppState` next to the renderer, which
        // is declared first and so drops the surface before the window.
        let surface = unsafe { instance.create_surface(&window) }
            .context("failed to create window surface")?;
        let physical = window.inner_size();
        let renderer = block_on(Renderer::new(
            &instance,
            surface,
            (physical.width, physical.height),
        ))?;

        let mut app = AppState {
            renderer,
            window,
            driver: FrameDriver::new(&ctx.config.scene),
            easter_egg: ctx.config.page.easter_egg_sequence(),
            max_frames,
            frames: 0,
            last_error: None,
        };
        app.fit_surface(ctx);
        info!("preview window open");

        event_loop.run_return(|event, _, control_flow| {
            *control_flow = ControlFlow::Poll;
            if let Err(err) = app.process_event(ctx, &event, control_flow) {
                app.last_error = Some(err);
                control_flow.set_exit();
            }
        });

        print_final_state(app.frames, ctx);
        match app.last_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    // Field order matters: the renderer's surface must drop before the window.
    struct AppState {
        renderer: Renderer,
        window: Window,
        driver: FrameDriver,
        easter_egg: KeySequence,
        max_frames: Option<u64>,
        frames: u64,
        last_error: Option<anyhow::Error>,
    }

    impl AppState {
        fn process_event(
            &mut self,
            ctx: &mut SceneContext,
            event: &Event<()>,
            control_flow: &mut ControlFlow,
        ) -> Result<()> {
            match event {
                Event::WindowEvent { event, window_id } if *window_id == self.window.id() => {
                    match event {
                        WindowEvent::CloseRequested => control_flow.set_exit(),
                        WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                            self.fit_surface(ctx);
                        }
                        WindowEvent::KeyboardInput { input, .. } => {
                            self.handle_keyboard(input, control_flow);
                        }
                        _ => {}
                    }
                }
                Event::RedrawRequested(window_id) if *window_id == self.window.id() => {
                    if self.driver.frame(ctx, &mut self.renderer).is_some() {
                        self.frames += 1;
                    }
                    if !self.driver.is_running() {
                        return Err(anyhow!("renderer stopped after {} frames", self.frames));
                    }
                    if self.max_frames.is_some_and(|max| self.frames >= max) {
                        control_flow.set_exit();
                    }
                }
                Event::MainEventsCleared => {
                    self.window.request_redraw();
                }
                _ => {}
            }
            Ok(())
        }

        fn fit_surface(&self, ctx: &mut SceneContext) {
            let scale = self.window.scale_factor();
            let css = self.window.inner_size().to_logical::<f64>(scale);
            ctx.resize(SurfaceSize::for_container(css.width, css.height, scale));
        }

        fn handle_keyboard(&mut self, input: &KeyboardInput, control_flow: &mut ControlFlow) {
            if input.state != ElementState::Pressed {
                return;
            }
            let Some(key) = input.virtual_keycode.and_then(map_keycode) else {
                return;
            };
            if key == KeyCode::Named(NamedKey::Escape) {
                control_flow.set_exit();
            } else if self.easter_egg.push(key) {
                println!("Danfo party!");
            }
        }
    }

    #[derive(Debug)]
    struct WindowInitError {
        message: String,
    }

    impl WindowInitError {
        fn from_panic(stage: &str, panic: Box<dyn Any + Send>) -> Self {
            Self {
                message: format!("failed to initialize {stage}: {}", panic_message(panic)),
            }
        }

        fn from_error(stage: &str, err: impl fmt::Display) -> Self {
            Self {
                message: format!("failed to initialize {stage}: {err}"),
            }
        }
    }

    impl fmt::Display for WindowInitError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.message)
        }
    }

    impl std::error::Error for WindowInitError {}

    fn panic_message(panic: Box<dyn Any + Send>) -> String {
        match panic.downcast::<String>() {
            Ok(msg) => *msg,
            Err(panic) => match panic.downcast::<&'static str>() {
                Ok(msg) => (*msg).to_string(),
                Err(_) => "unknown panic".into(),
            },
        }
    }

    fn map_keycode(code: winit::event::VirtualKeyCode) -> Option<KeyCode> {
        use winit::event::VirtualKeyCode as Key;
        Some(match code {
            Key::Space => KeyCode::Named(NamedKey::Space),
            Key::Return => KeyCode::Named(NamedKey::Enter),
            Key::Tab => KeyCode::Named(NamedKey::Tab),
            Key::Left => KeyCode::Named(NamedKey::Left),
            Key::Right => KeyCode::Named(NamedKey::Right),
            Key::Up => KeyCode::Named(NamedKey::Up),
            Key::Down => KeyCode::Named(NamedKey::Down),
            Key::Escape => KeyCode::Named(NamedKey::Escape),
            Key::Back => KeyCode::Named(NamedKey::Backspace),
            Key::Home => KeyCode::Named(NamedKey::Home),
            Key::End => KeyCode::Named(NamedKey::End),
            Key::PageUp => KeyCode::Named(NamedKey::PageUp),
            Key::PageDown => KeyCode::Named(NamedKey::PageDown),
            Key::Key0 => KeyCode::Digit(0),
            Key::Key1 => KeyCode::Digit(1),
            Key::Key2 => KeyCode::Digit(2),
            Key::Key3 => KeyCode::Digit(3),
            Key::Key4 => KeyCode::Digit(4),
            Key::Key5 => KeyCode::Digit(5),
            Key::Key6 => KeyCode::Digit(6),
            Key::Key7 => KeyCode::Digit(7),
            Key::Key8 => KeyCode::Digit(8),
            Key::Key9 => KeyCode::Digit(9),
            Key::A => KeyCode::Character('a'),
            Key::B => KeyCode::Character('b'),
            Key::C => KeyCode::Character('c'),
            Key::D => KeyCode::Character('d'),
            Key::E => KeyCode::Character('e'),
            Key::F => KeyCode::Character('f'),
            Key::G => KeyCode::Character('g'),
            Key::H => KeyCode::Character('h'),
            Key::I => KeyCode::Character('i'),
            Key::J => KeyCode::Character('j'),
            Key::K => KeyCode::Character('k'),
            Key::L => KeyCode::Character('l'),
            Key::M => KeyCode::Character('m'),
            Key::N => KeyCode::Character('n'),
            Key::O => KeyCode::Character('o'),
            Key::P => KeyCode::Character('p'),
            Key::Q => KeyCode::Character('q'),
            Key::R => KeyCode::Character('r'),
            Key::S => KeyCode::Character('s'),
            Key::T => KeyCode::Character('t'),
            Key::U => KeyCode::Character('u'),
            Key::V => KeyCode::Character('v'),
            Key::W => KeyCode::Character('w'),
            Key::X => KeyCode::Character('x'),
            Key::Y => KeyCode::Character('y'),
            Key::Z => KeyCode::Character('z'),
            Key::F1 => KeyCode::Function(1),
            Key::F2 => KeyCode::Function(2),
            Key::F3 => KeyCode::Function(3),
            Key::F4 => KeyCode::Function(4),
            Key::F5 => KeyCode::Function(5),
            Key::F6 => KeyCode::Function(6),
            Key::F7 => KeyCode::Function(7),
            Key::F8 => KeyCode::Function(8),
            Key::F9 => KeyCode::Function(9),
            Key::F10 => KeyCode::Function(10),
            Key::F11 => KeyCode::Function(11),
            Key::F12 => KeyCode::Function(12),
            _ => return None,
        })
    }
}
