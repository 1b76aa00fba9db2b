use std::io::{Stdout, stdout};
use std::time::Instant;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use danmaku_core::{DanmakuEngine, Driver, GlyphMetrics, PlaybackState, Renderer, TextExtent};
use danmaku_protocol::{RenderCommand, Viewport};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Block,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const SEEK_STEP_MS: u64 = 5_000;

/// Text measured in terminal cells: a narrow glyph is one column, a wide
/// glyph two, and every line is one row regardless of font size.
#[derive(Debug, Clone, Copy, Default)]
pub struct CellMetrics;

impl GlyphMetrics for CellMetrics {
    fn measure(&self, text: &str, _font_size: f64) -> TextExtent {
        TextExtent {
            width: text.width() as f64,
            height: 1.0,
        }
    }

    fn line_height(&self, _font_size: f64) -> f64 {
        1.0
    }
}

/// Keeps the most recently presented frame until the terminal is redrawn.
#[derive(Debug, Default)]
struct LatestFrame(Vec<RenderCommand>);

impl Renderer for LatestFrame {
    fn present(&mut self, frame: &[RenderCommand]) {
        self.0.clear();
        self.0.extend_from_slice(frame);
    }
}

fn to_color(color: danmaku_protocol::Color) -> Color {
    let rgb = color.to_rgb24();
    Color::Rgb((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
}

/// The part of `text` that lands inside `[0, width)` when its first glyph
/// starts at column `col`, with the column where it starts. Wide glyphs cut
/// by either edge are dropped whole.
fn clip(text: &str, col: i64, width: u16) -> Option<(u16, String)> {
    let width = i64::from(width);
    let mut x = col;
    let mut start = None;
    let mut visible = String::new();
    for ch in text.chars() {
        if x >= width {
            break;
        }
        let w = ch.width().unwrap_or(0) as i64;
        if x >= 0 && x + w <= width {
            if start.is_none() {
                start = u16::try_from(x).ok();
            }
            visible.push(ch);
        }
        x += w;
    }
    start.map(|s| (s, visible))
}

/// Map a frame onto terminal cells inside `area`. Viewport units are cells.
pub fn paint(buf: &mut Buffer, area: Rect, commands: &[RenderCommand]) {
    for cmd in commands {
        match cmd {
            RenderCommand::Clear => {
                for y in area.top()..area.bottom() {
                    for x in area.left()..area.right() {
                        buf[(x, y)].reset();
                    }
                }
                buf.set_style(area, Style::default().bg(Color::Black));
            }
            RenderCommand::DrawText {
                position,
                text,
                color,
                ..
            } => {
                let row = position.y.round();
                if row < 0.0 || row >= f64::from(area.height) {
                    continue;
                }
                let Some((col, visible)) = clip(text, position.x.round() as i64, area.width)
                else {
                    continue;
                };
                buf.set_string(
                    area.x + col,
                    area.y + row as u16,
                    visible,
                    Style::default().fg(to_color(*color)).bg(Color::Black),
                );
            }
        }
    }
}

fn format_time(ms: u64) -> String {
    let secs = ms / 1_000;
    format!("{:02}:{:02}.{}", secs / 60, secs % 60, (ms % 1_000) / 100)
}

fn header_line(engine: &DanmakuEngine<CellMetrics>) -> String {
    let stats = engine.stats();
    let shown = if engine.is_shown() { "" } else { " (hidden)" };
    format!(
        " danmaku | {} {:?}{} | {} on screen, {} dropped | space play/pause | ←→ seek | h hide | s stop | q quit ",
        format_time(stats.current_time_ms),
        stats.state,
        shown,
        stats.live,
        stats.dropped,
    )
}

/// Apply one key press. Returns `false` when the player should exit.
fn handle_key(engine: &mut DanmakuEngine<CellMetrics>, code: KeyCode) -> bool {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => return false,
        KeyCode::Char(' ') => {
            match engine.state() {
                PlaybackState::Playing => engine.pause(),
                PlaybackState::Paused => engine.resume(),
                PlaybackState::Prepared => engine.start(),
                PlaybackState::Idle | PlaybackState::Seeking => false,
            };
        }
        KeyCode::Left => {
            engine.seek_to(engine.current_time_ms().saturating_sub(SEEK_STEP_MS));
        }
        KeyCode::Right => {
            engine.seek_to(engine.current_time_ms().saturating_add(SEEK_STEP_MS));
        }
        KeyCode::Char('h') => {
            if engine.is_shown() {
                engine.hide();
            } else {
                engine.show();
            }
        }
        KeyCode::Char('s') => {
            if engine.state() == PlaybackState::Prepared {
                engine.start();
            } else {
                engine.stop();
            }
        }
        _ => {}
    }
    true
}

pub fn run_tui(mut engine: DanmakuEngine<CellMetrics>) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = play(&mut terminal, &mut engine);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    engine.release();

    result
}

fn play(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    engine: &mut DanmakuEngine<CellMetrics>,
) -> Result<()> {
    let mut driver = Driver::new(engine.config());
    let mut latest = LatestFrame::default();
    let mut size = None;
    engine.start();

    loop {
        let term_size = terminal.size()?;
        if size != Some(term_size) {
            size = Some(term_size);
            // Row 0 is the header.
            engine.set_viewport(Viewport::new(
                f64::from(term_size.width),
                f64::from(term_size.height.saturating_sub(1)),
                1.0,
            ));
            driver.reset();
        }

        let out = driver.step(engine, Instant::now(), &mut latest);
        if out.framed {
            let header = header_line(engine);
            terminal.draw(|frame| {
                let area = frame.area();
                let header_area = Rect::new(0, 0, area.width, 1);
                let header = Block::default()
                    .title(header)
                    .style(Style::default().fg(Color::White).bg(Color::DarkGray));
                frame.render_widget(header, header_area);

                let content_area = Rect::new(0, 1, area.width, area.height.saturating_sub(1));
                paint(frame.buffer_mut(), content_area, &latest.0);
            })?;
        }

        let timeout = out.next_wake.saturating_duration_since(Instant::now());
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if !handle_key(engine, key.code) {
                        break;
                    }
                }
                _ => {}
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use danmaku_protocol::{Point, SharedStr};

    use super::*;

    fn text_at(x: f64, y: f64, text: &str) -> RenderCommand {
        RenderCommand::DrawText {
            position: Point::new(x, y),
            text: SharedStr::from(text),
            color: danmaku_protocol::Color::from_rgb24(0xFF_00_00),
            outline: danmaku_protocol::Color::WHITE,
            font_size: 1.0,
        }
    }

    fn row(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width).map(|x| buf[(x, y)].symbol()).collect()
    }

    #[test]
    fn clip_drops_columns_outside_the_viewport() {
        assert_eq!(clip("hello", -2, 10), Some((0, "llo".to_string())));
        assert_eq!(clip("hello", 7, 10), Some((7, "hel".to_string())));
        assert_eq!(clip("hello", -5, 10), None);
        assert_eq!(clip("hello", 10, 10), None);
    }

    #[test]
    fn clip_never_splits_wide_glyphs() {
        // Each glyph is two columns; the one straddling the left edge goes.
        assert_eq!(clip("弹幕!", -1, 10), Some((1, "幕!".to_string())));
        assert_eq!(clip("弹幕", 7, 10), Some((7, "弹".to_string())));
    }

    #[test]
    fn paint_places_text_by_rounded_position() {
        let area = Rect::new(0, 0, 8, 3);
        let mut buf = Buffer::empty(area);
        paint(
            &mut buf,
            area,
            &[
                RenderCommand::Clear,
                text_at(1.4, 0.6, "ab"),
                text_at(-1.0, 2.0, "xyz"),
                text_at(0.0, 3.0, "off"),
            ],
        );
        assert_eq!(row(&buf, 0), "        ");
        assert_eq!(row(&buf, 1), " ab     ");
        assert_eq!(row(&buf, 2), "yz      ");
        assert_eq!(buf[(1, 1)].fg, Color::Rgb(255, 0, 0));
    }

    #[test]
    fn time_is_minutes_seconds_tenths() {
        assert_eq!(format_time(0), "00:00.0");
        assert_eq!(format_time(83_456), "01:23.4");
    }

    #[test]
    fn cell_metrics_count_columns() {
        let m = CellMetrics;
        assert!((m.measure("弹幕ok", 18.9).width - 6.0).abs() < f64::EPSILON);
        assert!((m.line_height(42.0) - 1.0).abs() < f64::EPSILON);
    }
}
