// SPDX-License-Identifier: GPL-3.0-only

//! Terminal display surface
//!
//! Renders annotated frames to the terminal using Unicode half-block
//! characters for improved vertical resolution, inside a titled border with a
//! status bar underneath.

use crate::app::scanner::{DisplaySurface, KeyPress};
use crate::errors::{AppError, AppResult};

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use image::RgbImage;
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Widget},
};
use std::io::{self, Stdout, stdout};
use std::time::Duration;
use tracing::{debug, warn};

/// Live preview in the terminal's alternate screen
///
/// The terminal is restored by [`DisplaySurface::close`] or, failing that,
/// on drop.
pub struct TerminalDisplay {
    terminal: Option<Terminal<CrosstermBackend<Stdout>>>,
    title: String,
}

impl TerminalDisplay {
    /// Switch the terminal to raw mode and the alternate screen
    pub fn open(title: &str) -> AppResult<Self> {
        enable_raw_mode().map_err(display_error)?;

        let terminal = execute!(stdout(), EnterAlternateScreen)
            .and_then(|_| Terminal::new(CrosstermBackend::new(stdout())));

        match terminal {
            Ok(terminal) => {
                debug!(title, "Terminal display opened");
                Ok(Self {
                    terminal: Some(terminal),
                    title: title.to_string(),
                })
            }
            Err(e) => {
                let _ = execute!(stdout(), LeaveAlternateScreen);
                let _ = disable_raw_mode();
                Err(display_error(e))
            }
        }
    }
}

impl DisplaySurface for TerminalDisplay {
    fn show(&mut self, frame: &RgbImage, status: &str) -> AppResult<()> {
        let Some(terminal) = self.terminal.as_mut() else {
            return Err(AppError::Display("terminal already closed".to_string()));
        };

        let title = self.title.as_str();
        terminal
            .draw(|f| {
                let area = f.area();

                // Reserve bottom line for status
                let view_area = Rect {
                    height: area.height.saturating_sub(1),
                    ..area
                };
                let status_area = Rect {
                    y: area.y + area.height.saturating_sub(1),
                    height: area.height.min(1),
                    ..area
                };

                let block = Block::bordered().title(title);
                let inner = block.inner(view_area);
                f.render_widget(block, view_area);
                f.render_widget(FrameWidget { frame }, inner);
                f.render_widget(StatusBar { message: status }, status_area);
            })
            .map_err(display_error)?;
        Ok(())
    }

    fn poll_key(&mut self, timeout: Duration) -> AppResult<Option<KeyPress>> {
        if !event::poll(timeout).map_err(display_error)? {
            return Ok(None);
        }
        match event::read().map_err(display_error)? {
            Event::Key(key) => Ok(key_press(key)),
            _ => Ok(None),
        }
    }

    fn close(&mut self) {
        let Some(mut terminal) = self.terminal.take() else {
            return;
        };

        if let Err(e) = disable_raw_mode() {
            warn!(error = %e, "Failed to leave raw mode");
        }
        if let Err(e) = execute!(terminal.backend_mut(), LeaveAlternateScreen) {
            warn!(error = %e, "Failed to leave alternate screen");
        }
        if let Err(e) = terminal.show_cursor() {
            warn!(error = %e, "Failed to restore cursor");
        }
        debug!("Terminal display closed");
    }
}

impl Drop for TerminalDisplay {
    fn drop(&mut self) {
        self.close();
    }
}

fn display_error(e: io::Error) -> AppError {
    AppError::Display(e.to_string())
}

/// Map a key event to the action it triggers
pub fn key_press(key: KeyEvent) -> Option<KeyPress> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    // Raw mode swallows SIGINT, so Ctrl+C arrives as a key
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(KeyPress::Interrupt);
    }
    Some(match key.code {
        KeyCode::Char('q') => KeyPress::Quit,
        KeyCode::Char('p') => KeyPress::Snapshot,
        _ => KeyPress::Other,
    })
}

/// Widget that renders a frame using half-block characters
struct FrameWidget<'a> {
    frame: &'a RgbImage,
}

impl Widget for FrameWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let frame = self.frame;
        if frame.width() == 0 || frame.height() == 0 || area.width == 0 || area.height == 0 {
            return;
        }

        // Each terminal cell displays 2 vertical pixels
        let frame_aspect = frame.width() as f64 / frame.height() as f64;
        let term_width = area.width as f64;
        let term_height = (area.height as u32 * 2) as f64;

        let (display_width, display_height) = if term_width / term_height > frame_aspect {
            // Terminal is wider - fit to height
            let w = term_height * frame_aspect;
            (w as u16, area.height)
        } else {
            let h = term_width / frame_aspect;
            (area.width, (h / 2.0) as u16)
        };
        let display_width = display_width.max(1);
        let display_height = display_height.max(1);

        // Center the image
        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        let x_scale = frame.width() as f64 / display_width as f64;
        let y_scale = frame.height() as f64 / (display_height as u32 * 2) as f64;

        for ty in 0..display_height {
            for tx in 0..display_width {
                let src_x = (tx as f64 * x_scale) as u32;
                let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                if let Some(cell) = buf.cell_mut((x_offset + tx, y_offset + ty)) {
                    cell.set_char('▀');
                    cell.set_fg(sample_pixel(frame, src_x, src_y_top));
                    cell.set_bg(sample_pixel(frame, src_x, src_y_bottom));
                }
            }
        }
    }
}

fn sample_pixel(frame: &RgbImage, x: u32, y: u32) -> Color {
    let x = x.min(frame.width() - 1);
    let y = y.min(frame.height() - 1);
    let [r, g, b] = frame.get_pixel(x, y).0;
    Color::Rgb(r, g, b)
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 {
            return;
        }

        // Fill background
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        let text: String = self.message.chars().take(area.width as usize).collect();
        buf.set_string(
            area.x,
            area.y,
            text,
            Style::default().fg(Color::White).bg(Color::DarkGray),
        );
    }
}
