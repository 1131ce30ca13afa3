use crate::app::{App, Focus};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};

const SIDEBAR_WIDTH: u16 = 24;

/// Number of lines in controls content
pub const CONTROLS_CONTENT_LINES: u16 = 14;

// UI color scheme
const BORDER_COLOR: Color = Color::Cyan;
const HIGHLIGHT_COLOR: Color = Color::Yellow;
const TEXT_COLOR: Color = Color::White;
const DIM_TEXT_COLOR: Color = Color::Gray;

/// Creates a standard styled block with rounded borders
fn styled_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_COLOR))
        .title(title)
}

/// Main render function
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    if app.fullscreen_mode {
        render_canvas(frame, area, app);
    } else {
        let layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
            .split(area);

        render_sidebar(frame, layout[0], app);
        render_canvas(frame, layout[1], app);
    }

    if app.show_help {
        render_help_overlay(frame, area, app);
    }
}

/// Canvas area inside its border, in terminal cells
pub fn canvas_area(frame_area: Rect, fullscreen: bool) -> Rect {
    let outer = if fullscreen {
        frame_area
    } else {
        let sidebar = SIDEBAR_WIDTH.min(frame_area.width);
        Rect {
            x: frame_area.x + sidebar,
            width: frame_area.width - sidebar,
            ..frame_area
        }
    };
    styled_block("").inner(outer)
}

/// Number of controls lines visible for a terminal of the given height
pub fn get_controls_visible_lines(terminal_height: u16) -> u16 {
    // Status (6) and parameters (12) boxes sit above; minus borders
    terminal_height.saturating_sub(6 + 12 + 2)
}

fn render_sidebar(frame: &mut Frame, area: Rect, app: &App) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6),  // Status
            Constraint::Length(12), // Parameters
            Constraint::Min(4),     // Controls
        ])
        .split(area);

    render_status_box(frame, sections[0], app);
    render_params_box(frame, sections[1], app);
    render_controls_box(frame, sections[2], app);
}

fn render_status_box(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block(" Neural Mesh ");
    let text_style = Style::default().fg(TEXT_COLOR);
    let dim_style = Style::default().fg(DIM_TEXT_COLOR);

    let content = match &app.animator {
        None => vec![
            Line::from(Span::styled("NO SURFACE", Style::default().fg(Color::Red))),
            Line::from(Span::styled("nothing to draw on", dim_style)),
        ],
        Some(animator) => {
            let stats = animator.last_stats();
            let (status_text, status_color) = if !animator.scheduler().is_visible() {
                ("HIDDEN", DIM_TEXT_COLOR)
            } else if animator.is_paused() {
                ("PAUSED", HIGHLIGHT_COLOR)
            } else {
                ("RUNNING", Color::Green)
            };
            let pointer = animator.pointer();
            let pointer_text = if pointer.active {
                format!("ptr {:.0},{:.0}", pointer.x, pointer.y)
            } else {
                "ptr idle".to_string()
            };

            vec![
                Line::from(Span::styled(
                    format!("{} nodes {} links", stats.nodes, stats.links),
                    text_style,
                )),
                Line::from(Span::styled(
                    format!(
                        "frames {} / drop {}",
                        animator.frames_rendered(),
                        animator.frames_dropped()
                    ),
                    dim_style,
                )),
                Line::from(vec![
                    Span::styled(status_text, Style::default().fg(status_color)),
                    Span::styled(format!(" {}", pointer_text), dim_style),
                ]),
                Line::from(Span::styled(
                    app.message.clone().unwrap_or_else(|| format!("preset {}", app.preset_name())),
                    dim_style,
                )),
            ]
        }
    };

    let paragraph = Paragraph::new(content).block(block);
    frame.render_widget(paragraph, area);
}

fn render_params_box(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block(" Parameters ");

    let make_line = |label: &str, value: String, focused: bool| {
        let prefix = if focused { "> " } else { "  " };
        let style = if focused {
            Style::default().fg(HIGHLIGHT_COLOR)
        } else {
            Style::default().fg(TEXT_COLOR)
        };
        Line::from(Span::styled(format!("{}{}: {}", prefix, label, value), style))
    };

    let settings = &app.settings;

    let content = vec![
        make_line(
            "Particles",
            format!("{}", settings.particle_count),
            app.focus == Focus::Particles,
        ),
        make_line("Drift", format!("{:.2}", settings.drift), app.focus == Focus::Drift),
        make_line("Damping", format!("{:.3}", settings.damping), app.focus == Focus::Damping),
        make_line("Max spd", format!("{:.1}", settings.max_speed), app.focus == Focus::MaxSpeed),
        make_line(
            "Pointer",
            format!("{:.2}", settings.pointer_strength),
            app.focus == Focus::Pointer,
        ),
        make_line(
            "Mode",
            settings.pointer_mode.name().to_string(),
            app.focus == Focus::PointerMode,
        ),
        make_line("Links", format!("{:.0}", settings.link_distance), app.focus == Focus::Links),
        make_line("FPS", settings.fps_label(), app.focus == Focus::Fps),
        make_line(
            "Color",
            settings.color_scheme.name().to_string(),
            app.focus == Focus::ColorScheme,
        ),
        make_line(
            "Glow",
            if settings.glow { "on" } else { "off" }.to_string(),
            app.focus == Focus::Glow,
        ),
    ];

    // Calculate scroll to keep focused item visible based on actual area
    let focus_line = app.focus.line_index();
    let visible_height = area.height.saturating_sub(2); // minus borders
    let content_height = content.len() as u16;

    let scroll = if visible_height == 0 || visible_height >= content_height {
        0
    } else if focus_line >= visible_height {
        focus_line.saturating_sub(visible_height - 1)
    } else {
        0
    };

    let paragraph = Paragraph::new(content).block(block).scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}

fn render_controls_box(frame: &mut Frame, area: Rect, app: &App) {
    let key_style = Style::default().fg(HIGHLIGHT_COLOR);
    let desc_style = Style::default().fg(DIM_TEXT_COLOR);

    let make_control = |key: &str, desc: String| -> Line<'_> {
        Line::from(vec![
            Span::styled(format!("{:>5}", key), key_style),
            Span::styled(format!(" {}", desc), desc_style),
        ])
    };

    let content = vec![
        make_control("Space", "pause/resume".to_string()),
        make_control("H", "help".to_string()),
        make_control("R", "reset".to_string()),
        make_control("P/O", format!("preset: {}", app.preset_name())),
        make_control("S/X", "save/delete preset".to_string()),
        make_control("C", "color scheme".to_string()),
        make_control("G", "glow".to_string()),
        make_control("A", format!("pointer: {}", app.settings.pointer_mode.name())),
        make_control(
            "M",
            format!("reduced: {}", if app.reduced_motion() { "on" } else { "off" }),
        ),
        make_control("V", "fullscreen".to_string()),
        make_control("Tab", "select param".to_string()),
        make_control("↑/↓", "adjust".to_string()),
        make_control("W", "save config".to_string()),
        make_control("Q", "quit".to_string()),
    ];

    let content_height = content.len() as u16;
    let visible_height = area.height.saturating_sub(2); // minus borders
    let max_scroll = content_height.saturating_sub(visible_height);

    let title = if max_scroll > 0 {
        " Controls (↑↓) "
    } else {
        " Controls "
    };

    let block = styled_block(title);

    let paragraph = Paragraph::new(content)
        .block(block)
        .scroll((app.controls_scroll, 0));
    frame.render_widget(paragraph, area);
}

fn render_canvas(frame: &mut Frame, area: Rect, app: &App) {
    let background = app.settings.color_scheme.background();
    let block = styled_block("").style(Style::default().bg(background.into()));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let buffer = frame.buffer_mut();
    for cell in app.canvas.cells() {
        let x = inner.x + cell.x;
        let y = inner.y + cell.y;

        if x < inner.x + inner.width && y < inner.y + inner.height {
            if let Some(target) = buffer.cell_mut((x, y)) {
                target.set_char(cell.char).set_fg(cell.color);
                if let Some(bg) = cell.background {
                    target.set_bg(bg);
                }
            }
        }
    }
}

/// Where the help dialog sits: centred over the canvas
fn help_area(area: Rect, fullscreen: bool) -> Rect {
    let canvas_x = if fullscreen { 0 } else { SIDEBAR_WIDTH };
    let canvas_width = if fullscreen {
        area.width
    } else {
        area.width.saturating_sub(SIDEBAR_WIDTH)
    };

    let help_width = 56.min(canvas_width.saturating_sub(4));
    let help_height = area.height.saturating_sub(4).min(32);
    let x = canvas_x + (canvas_width.saturating_sub(help_width)) / 2;
    let y = (area.height.saturating_sub(help_height)) / 2;

    Rect {
        x: area.x + x,
        y: area.y + y,
        width: help_width,
        height: help_height,
    }
}

fn help_content(app: &App) -> Vec<Line<'static>> {
    vec![
        Line::from(""),
        Line::from(Span::styled("NEURAL MESH", Style::default().fg(BORDER_COLOR))),
        Line::from(""),
        Line::from("Drifting nodes joined by links that fade with distance. Nodes near the pointer brighten and grow."),
        Line::from(""),
        Line::from(Span::styled("POINTER:", Style::default().fg(HIGHLIGHT_COLOR))),
        Line::from("Move the mouse over the canvas. Repel pushes nodes away, Attract pulls them in. Strength 0 turns the pointer off."),
        Line::from(""),
        Line::from(Span::styled("PARAMETERS:", Style::default().fg(HIGHLIGHT_COLOR))),
        Line::from(Span::styled("Drift / Damping / Max spd", Style::default().fg(TEXT_COLOR))),
        Line::from("Random push per frame, velocity kept per frame, per-axis speed cap"),
        Line::from(""),
        Line::from(Span::styled("Links", Style::default().fg(TEXT_COLOR))),
        Line::from("Distance under which two nodes are joined"),
        Line::from(""),
        Line::from(Span::styled("FPS", Style::default().fg(TEXT_COLOR))),
        Line::from("Frame cap; early frames are skipped, never queued"),
        Line::from(""),
        Line::from(Span::styled("M - Reduced motion", Style::default().fg(TEXT_COLOR))),
        Line::from("Half the nodes, slower drift, pointer ignored"),
        Line::from(""),
        Line::from(Span::styled("PRESETS (P/O):", Style::default().fg(HIGHLIGHT_COLOR))),
        Line::from(app.presets.preset_names().join(", ")),
        Line::from(""),
        Line::from(Span::styled("BASIC CONTROLS:", Style::default().fg(HIGHLIGHT_COLOR))),
        Line::from("Space=Pause, R=Reset, C=Colors, G=Glow, A=Attract/Repel, S/X=Save/Delete preset, V=Fullscreen, W=Save config, Tab/Arrows=Adjust, Q=Quit"),
        Line::from(""),
    ]
}

/// Rows a line takes once word-wrapped to `width` columns
fn wrapped_rows(line: &Line, width: usize) -> u16 {
    if width == 0 {
        return 0;
    }
    let text: String = line.spans.iter().map(|span| span.content.as_ref()).collect();
    let mut rows = 1;
    let mut used = 0;
    for word in text.split_whitespace() {
        let len = word.chars().count();
        if used > 0 && used + 1 + len <= width {
            used += 1 + len;
            continue;
        }
        if used > 0 {
            rows += 1;
        }
        used = len;
        while used > width {
            rows += 1;
            used -= width;
        }
    }
    rows
}

/// How far the help text can scroll before its last line reaches the bottom
pub fn help_max_scroll(area: Rect, app: &App) -> u16 {
    let help = help_area(area, app.fullscreen_mode);
    let inner_width = help.width.saturating_sub(2) as usize;
    let content_height: u16 = help_content(app)
        .iter()
        .map(|line| wrapped_rows(line, inner_width))
        .sum();
    content_height.saturating_sub(help.height.saturating_sub(2))
}

fn render_help_overlay(frame: &mut Frame, area: Rect, app: &App) {
    let help_area = help_area(area, app.fullscreen_mode);
    frame.render_widget(Clear, help_area);

    let max_scroll = help_max_scroll(area, app);
    let title = if max_scroll > 0 {
        " Help (J/K scroll, H to close) "
    } else {
        " Help (H to close) "
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(HIGHLIGHT_COLOR))
        .title(title);

    let paragraph = Paragraph::new(help_content(app))
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.help_scroll.min(max_scroll), 0));

    frame.render_widget(paragraph, help_area);
}
