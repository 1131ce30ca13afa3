mod app;
mod braille;
mod color;
mod config;
mod error;
mod host;
mod mesh;
mod pointer;
mod presets;
mod raster;
mod render;
mod scheduler;
mod settings;
mod simulation;
mod snapshot;
mod ui;

use app::{App, Focus};
use clap::Parser;
use config::AppConfig;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use host::TerminalHost;
use mesh::{HostEvent, MeshAnimator, MountOptions};
use presets::PresetManager;
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use settings::PointerMode;
use snapshot::ExportOptions;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn, Level};

#[derive(Parser, Debug)]
#[command(name = "neural-mesh")]
#[command(about = "Animated particle mesh in the terminal")]
struct Args {
    // === Look ===
    /// Start from a named preset (obsidian, gold, ember, calm or a saved one)
    #[arg(short = 'p', long)]
    preset: Option<String>,

    /// Number of particles (4-400)
    #[arg(short = 'n', long)]
    particles: Option<usize>,

    /// Random drift strength (0.0-1.0)
    #[arg(long)]
    drift: Option<f32>,

    /// Maximum distance at which two nodes are linked
    #[arg(long = "link-distance")]
    link_distance: Option<f32>,

    /// Frame cap in fps (0 = uncapped)
    #[arg(long)]
    fps: Option<u32>,

    /// Pull nodes towards the pointer instead of pushing them away
    #[arg(long)]
    attract: bool,

    /// Fewer nodes, slower drift, pointer ignored
    #[arg(long = "reduced-motion")]
    reduced_motion: bool,

    /// Device pixel ratio (1.0-2.0)
    #[arg(long = "pixel-ratio")]
    pixel_ratio: Option<f32>,

    /// RNG seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Config file to load (default: <config dir>/neural-mesh/config.json)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    // === Headless export ===
    /// Render off-screen and write the last frame as a PNG
    #[arg(long = "export-png")]
    export_png: Option<PathBuf>,

    /// Render off-screen and write an animated GIF
    #[arg(long = "export-gif")]
    export_gif: Option<PathBuf>,

    /// Display refreshes to simulate when exporting
    #[arg(long, default_value = "240")]
    frames: usize,

    /// Export width in logical pixels
    #[arg(long, default_value = "480")]
    width: f32,

    /// Export height in logical pixels
    #[arg(long, default_value = "270")]
    height: f32,

    /// Sweep a synthetic pointer across the export
    #[arg(long)]
    sweep: bool,

    // === Logging ===
    /// Log file (default: <data dir>/neural-mesh/neural-mesh.log; stderr when exporting)
    #[arg(long = "log-file")]
    log_file: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long = "log-level", default_value = "info")]
    log_level: String,
}

impl Args {
    fn is_export(&self) -> bool {
        self.export_png.is_some() || self.export_gif.is_some()
    }
}

fn init_logging(args: &Args) {
    let level = args.log_level.parse::<Level>().unwrap_or(Level::INFO);

    let path = args.log_file.clone().or_else(|| {
        if args.is_export() {
            None
        } else {
            dirs::data_local_dir().map(|d| d.join("neural-mesh").join("neural-mesh.log"))
        }
    });

    let Some(path) = path else {
        tracing_subscriber::fmt()
            .with_writer(io::stderr)
            .with_max_level(level)
            .init();
        return;
    };

    // The TUI owns the terminal, so logs go to a file
    match open_log_file(&path) {
        Ok(file) => tracing_subscriber::fmt()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_max_level(level)
            .init(),
        Err(err) => eprintln!("neural-mesh: logging disabled, cannot open {}: {}", path.display(), err),
    }
}

fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Config file, then preset, then CLI flags
fn resolve_config(
    args: &Args,
    presets: &PresetManager,
) -> Result<(AppConfig, Option<PathBuf>), Box<dyn std::error::Error>> {
    let path = args.config.clone().or_else(AppConfig::default_path);
    let config = match &path {
        Some(p) if args.config.is_some() => AppConfig::load_from_file(p)?,
        Some(p) if p.exists() => AppConfig::load_from_file(p).unwrap_or_else(|err| {
            warn!(%err, "ignoring unreadable config");
            AppConfig::default()
        }),
        _ => AppConfig::default(),
    };
    Ok((apply_overrides(config, args, presets)?, path))
}

fn apply_overrides(
    mut config: AppConfig,
    args: &Args,
    presets: &PresetManager,
) -> Result<AppConfig, Box<dyn std::error::Error>> {
    if let Some(name) = &args.preset {
        let preset = presets
            .find(name)
            .ok_or_else(|| format!("unknown preset '{}' (have: {})", name, presets.preset_names().join(", ")))?;
        config.settings = preset.settings.clone();
        config.preset = preset.name.clone();
    }

    let settings = &mut config.settings;
    if let Some(particles) = args.particles {
        settings.particle_count = particles;
        settings.narrow_particle_count = settings.narrow_particle_count.min(particles);
    }
    if let Some(drift) = args.drift {
        settings.drift = drift;
    }
    if let Some(link_distance) = args.link_distance {
        settings.link_distance = link_distance;
    }
    if let Some(fps) = args.fps {
        settings.target_fps = (fps > 0).then_some(fps);
    }
    if args.attract {
        settings.pointer_mode = PointerMode::Attract;
    }
    config.settings = config.settings.clone().sanitized();

    if let Some(ratio) = args.pixel_ratio {
        config.pixel_ratio = ratio;
    }
    config.pixel_ratio = if config.pixel_ratio.is_finite() {
        config.pixel_ratio.clamp(1.0, 2.0)
    } else {
        1.0
    };
    config.reduced_motion |= args.reduced_motion;

    Ok(config)
}

fn run_export(args: &Args, config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let options = ExportOptions {
        width: args.width,
        height: args.height,
        pixel_ratio: config.pixel_ratio,
        frames: args.frames.max(1),
        sweep_pointer: args.sweep,
        reduced_motion: config.reduced_motion,
        seed: args.seed,
        ..Default::default()
    };

    if let Some(path) = &args.export_png {
        snapshot::export_png(config.settings.clone(), &options, path)?;
        println!("wrote {}", path.display());
    }
    if let Some(path) = &args.export_gif {
        snapshot::export_gif(config.settings.clone(), &options, path)?;
        println!("wrote {}", path.display());
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(&args);

    let presets = PresetManager::new();
    let (config, config_path) = resolve_config(&args, &presets)?;

    if args.is_export() {
        return run_export(&args, &config);
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let size = terminal.size()?;
    let frame_rect = Rect::new(0, 0, size.width, size.height);
    let mut host = TerminalHost::new(io::stdout(), size.width > 0 && size.height > 0);
    let mut app = App::new(None, presets, &config, config_path.clone());

    let canvas = ui::canvas_area(frame_rect, app.fullscreen_mode);
    let viewport = app.resize_canvas(canvas);
    host.set_canvas(canvas, app.pixel_ratio);
    app.animator = MeshAnimator::mount(
        &mut host,
        viewport,
        config.settings.clone(),
        MountOptions {
            reduced_motion: config.reduced_motion,
            seed: args.seed,
        },
    );
    info!(preset = %config.preset, config = ?config_path, "neural mesh started");

    // Run the app
    let res = run_app(&mut terminal, &mut app, &mut host);

    // Detach before the terminal is restored so capture modes are switched off
    if let Some(animator) = app.animator.take() {
        animator.unmount(&mut host);
    }

    // Cleanup
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

/// Recompute the canvas area and tell the animator if it changed
fn relayout<W: Write>(app: &mut App, host: &mut TerminalHost<W>, frame_area: Rect) {
    let area = ui::canvas_area(frame_area, app.fullscreen_mode);
    app.resize_canvas(area);
    if let Some(event) = host.set_canvas(area, app.pixel_ratio) {
        app.dispatch(host, event);
    }
}

fn run_app<B: ratatui::backend::Backend, W: Write>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    host: &mut TerminalHost<W>,
) -> io::Result<()> {
    terminal.draw(|frame| ui::render(frame, app))?;

    loop {
        if let Some(now) = host.due_frame() {
            app.dispatch(host, HostEvent::Frame(now));
            terminal.draw(|frame| ui::render(frame, app))?;
        }

        // Sleep until input arrives or the next frame is due
        if !event::poll(host.poll_timeout())? {
            continue;
        }

        let event = event::read()?;
        let redraw = match &event {
            Event::Key(key) => {
                // Only process Press events
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                let size = terminal.size()?;
                if handle_key(app, *key, Rect::new(0, 0, size.width, size.height)) {
                    return Ok(());
                }
                true
            }
            Event::Resize(_, _) => true,
            _ => false,
        };

        for host_event in host.translate(&event) {
            app.dispatch(host, host_event);
        }

        if redraw {
            let size = terminal.size()?;
            relayout(app, host, Rect::new(0, 0, size.width, size.height));
            terminal.draw(|frame| ui::render(frame, app))?;
        }
    }
}

/// Apply one key press. Returns true when the app should quit.
fn handle_key(app: &mut App, key: KeyEvent, terminal: Rect) -> bool {
    // Handle Ctrl+C
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    app.message = None;
    match key.code {
        // System controls
        KeyCode::Char('q') | KeyCode::Char('Q') => return true,
        KeyCode::Char(' ') => app.toggle_pause(),
        KeyCode::Char('r') | KeyCode::Char('R') => app.reset(),
        KeyCode::Char('v') | KeyCode::Char('V') => app.toggle_fullscreen(),
        KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::Char('?') => app.toggle_help(),
        KeyCode::Char('w') | KeyCode::Char('W') => app.save_config(),

        // Look
        KeyCode::Char('p') | KeyCode::Char('P') => app.cycle_preset(true),
        KeyCode::Char('o') | KeyCode::Char('O') => app.cycle_preset(false),
        KeyCode::Char('c') | KeyCode::Char('C') => {
            app.cycle_color_scheme();
            app.focus = Focus::ColorScheme;
        }
        KeyCode::Char('g') | KeyCode::Char('G') => {
            app.toggle_glow();
            app.focus = Focus::Glow;
        }
        KeyCode::Char('a') | KeyCode::Char('A') => {
            app.toggle_pointer_mode();
            app.focus = Focus::PointerMode;
        }
        KeyCode::Char('m') | KeyCode::Char('M') => app.toggle_reduced_motion(),
        KeyCode::Char('s') | KeyCode::Char('S') => app.save_as_preset(),
        KeyCode::Char('x') | KeyCode::Char('X') => app.delete_current_preset(),

        // Navigation
        KeyCode::Tab => app.next_focus(),
        KeyCode::BackTab => app.prev_focus(),
        KeyCode::Up => {
            if !app.show_help {
                if app.focus.is_param() {
                    app.adjust_focused_up();
                } else {
                    app.scroll_controls_up();
                }
            }
        }
        KeyCode::Down => {
            if !app.show_help {
                if app.focus.is_param() {
                    app.adjust_focused_down();
                } else {
                    let visible = ui::get_controls_visible_lines(terminal.height);
                    app.scroll_controls_down(ui::CONTROLS_CONTENT_LINES.saturating_sub(visible));
                }
            }
        }
        KeyCode::Esc => {
            if app.show_help {
                app.toggle_help();
            } else if app.focus.is_param() {
                app.focus = Focus::Controls;
            }
        }
        KeyCode::Char('j') | KeyCode::Char('J') => {
            if app.show_help {
                app.scroll_help_down(ui::help_max_scroll(terminal, app));
            }
        }
        KeyCode::Char('k') | KeyCode::Char('K') => {
            if app.show_help {
                app.scroll_help_up();
            }
        }
        _ => {}
    }
    false
}
