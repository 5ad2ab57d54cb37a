// SPDX-License-Identifier: GPL-3.0-only

//! Terminal front end
//!
//! Renders the camera preview and the gallery thumbnails using Unicode
//! half-block characters for improved vertical resolution. Key presses are
//! turned into [`Message`]s and run as tasks, so the screen keeps refreshing
//! while the camera opens or a photo is being encoded.

use crate::app::{Message, Phase, PhotoApp};
use crate::assets;
use crate::backends::camera::CameraFrame;
use crate::constants::{messages, timing};
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use image::RgbaImage;
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Clear, List, ListItem, ListState, Paragraph, Widget, Wrap},
};
use std::io::{self, Stdout, stdout};
use std::time::Duration;
use tracing::{debug, info};

/// What a key press asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Send(Message),
    ToggleHelp,
    Quit,
}

/// Map a key press to an action
pub fn key_action(key: KeyEvent) -> Option<KeyAction> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return (key.code == KeyCode::Char('c')).then_some(KeyAction::Quit);
    }

    let action = match key.code {
        KeyCode::Char('o') => KeyAction::Send(Message::OpenCamera),
        KeyCode::Char('p') => KeyAction::Send(Message::TakePhoto),
        KeyCode::Char('t') => KeyAction::Send(Message::ToggleCamera),
        KeyCode::Char('c') => KeyAction::Send(Message::ClearGallery),
        KeyCode::Up => KeyAction::Send(Message::SelectPrevious),
        KeyCode::Down => KeyAction::Send(Message::SelectNext),
        KeyCode::Enter => KeyAction::Send(Message::OpenThumbnail),
        KeyCode::Char('h') => KeyAction::ToggleHelp,
        KeyCode::Char('q') | KeyCode::Esc => KeyAction::Quit,
        _ => return None,
    };
    Some(action)
}

/// Restores the terminal when dropped, whatever way the UI exits
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Run the terminal UI until the user quits
pub async fn run(app: PhotoApp) -> Result<(), Box<dyn std::error::Error>> {
    let mut guard = TerminalGuard::enter()?;
    run_app(&mut guard.terminal, &app).await
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &PhotoApp,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut events = EventStream::new();
    let mut tick = tokio::time::interval(Duration::from_millis(timing::UI_TICK_MS));
    let mut show_help = false;

    spawn_message(app, Message::Hydrate);

    loop {
        terminal.draw(|f| draw(f, app, show_help))?;

        tokio::select! {
            _ = tick.tick() => {}
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    match key_action(key) {
                        Some(KeyAction::Quit) => break,
                        Some(KeyAction::ToggleHelp) => show_help = !show_help,
                        Some(KeyAction::Send(message)) => {
                            show_help = false;
                            spawn_message(app, message);
                        }
                        None => {}
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
        }
    }

    info!("Terminal UI closed");
    Ok(())
}

fn spawn_message(app: &PhotoApp, message: Message) {
    debug!(?message, "Dispatching");
    let app = app.clone();
    tokio::spawn(async move {
        app.update(message).await;
    });
}

fn draw(f: &mut Frame, app: &PhotoApp, show_help: bool) {
    let [main, banner_area, status_area] = Layout::vertical([
        Constraint::Min(3),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(f.area());
    let [preview_area, side_area] =
        Layout::horizontal([Constraint::Percentage(65), Constraint::Percentage(35)]).areas(main);
    let [list_area, thumb_area] =
        Layout::vertical([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(side_area);

    let controls = app.controls();
    let facing = controls.as_ref().map(|c| c.facing.label()).unwrap_or("...");
    let title = match &controls {
        Some(c) if c.preview_visible => format!(" {} ({}) ", messages::OPEN_LABEL_ACTIVE, facing),
        Some(_) => format!(" {} ({}) ", messages::OPEN_LABEL, facing),
        None => " Camera busy ".to_string(),
    };
    let preview_block = Block::bordered().title(title);
    let preview_inner = preview_block.inner(preview_area);
    f.render_widget(preview_block, preview_area);

    let frame = app.preview_frame();
    let placeholder = if controls.is_some_and(|c| c.preview_visible) {
        "Waiting for camera..."
    } else {
        "Press 'o' to open the camera"
    };
    f.render_widget(
        PictureWidget {
            picture: frame.as_ref().map(Picture::Frame),
            placeholder,
        },
        preview_inner,
    );

    {
        let mut gallery = app.gallery();
        let rows = list_area.height.saturating_sub(2) as usize;
        gallery.scroll_to_selection(rows);

        let items: Vec<ListItem> = gallery
            .thumbnails()
            .map(|t| ListItem::new(t.label().to_string()))
            .collect();
        let list = List::new(items)
            .block(Block::bordered().title(format!(" Gallery ({}) ", gallery.len())))
            .highlight_symbol("> ")
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        let mut state = ListState::default()
            .with_offset(gallery.scroll_offset())
            .with_selected(gallery.selected_index());
        f.render_stateful_widget(list, list_area, &mut state);

        let thumb_block = Block::bordered().title(" Selected ");
        let thumb_inner = thumb_block.inner(thumb_area);
        f.render_widget(thumb_block, thumb_area);
        let preview = gallery.selected().and_then(|t| t.preview());
        f.render_widget(
            PictureWidget {
                picture: preview.map(Picture::Image),
                placeholder: "No photos yet",
            },
            thumb_inner,
        );
    }

    f.render_widget(
        BannerWidget {
            banner: app.notifier().current(),
        },
        banner_area,
    );
    f.render_widget(
        StatusBar {
            message: "o open | p photo | t toggle | c clear | Enter view | h help | q quit",
        },
        status_area,
    );

    if show_help {
        let area = centered(preview_area, 60, 14);
        f.render_widget(Clear, area);
        f.render_widget(
            Paragraph::new(assets::help_text())
                .wrap(Wrap { trim: false })
                .block(Block::bordered().title(" Help ")),
            area,
        );
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

/// Something that can be drawn with half blocks
#[derive(Clone, Copy)]
enum Picture<'a> {
    Frame(&'a CameraFrame),
    Image(&'a RgbaImage),
}

impl Picture<'_> {
    fn size(&self) -> (u32, u32) {
        match self {
            Picture::Frame(frame) => (frame.width, frame.height),
            Picture::Image(image) => image.dimensions(),
        }
    }

    fn sample(&self, x: u32, y: u32) -> Color {
        let (width, height) = self.size();
        let x = x.min(width.saturating_sub(1));
        let y = y.min(height.saturating_sub(1));
        let (r, g, b) = match self {
            Picture::Frame(frame) => frame.pixel_rgb(x, y),
            Picture::Image(image) => {
                let [r, g, b, _] = image.get_pixel(x, y).0;
                (r, g, b)
            }
        };
        Color::Rgb(r, g, b)
    }
}

/// Widget that renders a picture using half-block characters
struct PictureWidget<'a> {
    picture: Option<Picture<'a>>,
    placeholder: &'a str,
}

impl Widget for PictureWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let picture = match self.picture {
            Some(p) if p.size().0 > 0 && p.size().1 > 0 && area.width > 0 && area.height > 0 => p,
            _ => {
                let x = area.x + (area.width.saturating_sub(self.placeholder.len() as u16)) / 2;
                let y = area.y + area.height / 2;
                if y < area.y + area.height && x < area.x + area.width {
                    buf.set_stringn(x, y, self.placeholder, area.width as usize, Style::default());
                }
                return;
            }
        };

        // Each terminal cell displays 2 vertical pixels
        let (width, height) = picture.size();
        let aspect = width as f64 / height as f64;
        let term_width = area.width as f64;
        let term_height = (area.height * 2) as f64;

        let (display_width, display_height) = if term_width / term_height > aspect {
            let h = term_height;
            ((h * aspect) as u16, (h / 2.0) as u16)
        } else {
            let w = term_width;
            (w as u16, (w / aspect / 2.0) as u16)
        };
        if display_width == 0 || display_height == 0 {
            return;
        }

        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;
        let x_scale = width as f64 / display_width as f64;
        let y_scale = height as f64 / (display_height * 2) as f64;

        for ty in 0..display_height {
            for tx in 0..display_width {
                let src_x = (tx as f64 * x_scale) as u32;
                let top = picture.sample(src_x, (ty as f64 * 2.0 * y_scale) as u32);
                let bottom = picture.sample(src_x, ((ty as f64 * 2.0 + 1.0) * y_scale) as u32);

                if let Some(cell) = buf.cell_mut((x_offset + tx, y_offset + ty)) {
                    cell.set_char('▀');
                    cell.set_fg(top);
                    cell.set_bg(bottom);
                }
            }
        }
    }
}

/// One-line notification banner
struct BannerWidget {
    banner: Option<crate::app::Banner>,
}

impl Widget for BannerWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(banner) = self.banner else {
            return;
        };

        let (r, g, b) = banner.notification.severity.rgb();
        let mut style = Style::default().fg(Color::White).bg(Color::Rgb(r, g, b));
        if banner.phase == Phase::Fading {
            style = style.add_modifier(Modifier::DIM);
        }

        buf.set_style(area, style);
        buf.set_stringn(
            area.x + 1,
            area.y,
            &banner.notification.message,
            area.width.saturating_sub(1) as usize,
            style,
        );
    }
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let style = Style::default().fg(Color::White).bg(Color::DarkGray);
        buf.set_style(area, style);
        buf.set_stringn(area.x, area.y, self.message, area.width as usize, style);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{Banner, Notification, Severity};
    use crossterm::event::KeyEventState;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn test_key_bindings() {
        let none = KeyModifiers::NONE;
        assert_eq!(
            key_action(press(KeyCode::Char('p'), none)),
            Some(KeyAction::Send(Message::TakePhoto))
        );
        assert_eq!(
            key_action(press(KeyCode::Down, none)),
            Some(KeyAction::Send(Message::SelectNext))
        );
        assert_eq!(
            key_action(press(KeyCode::Char('c'), none)),
            Some(KeyAction::Send(Message::ClearGallery))
        );
        assert_eq!(
            key_action(press(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(KeyAction::Quit)
        );
        assert_eq!(key_action(press(KeyCode::Esc, none)), Some(KeyAction::Quit));
        assert_eq!(key_action(press(KeyCode::Char('x'), none)), None);
    }

    #[test]
    fn test_picture_widget_uses_half_blocks() {
        let mut image = RgbaImage::from_pixel(4, 4, image::Rgba([255, 0, 0, 255]));
        for x in 0..4 {
            for y in 2..4 {
                image.put_pixel(x, y, image::Rgba([0, 0, 255, 255]));
            }
        }

        let area = Rect::new(0, 0, 4, 2);
        let mut buf = Buffer::empty(area);
        PictureWidget {
            picture: Some(Picture::Image(&image)),
            placeholder: "",
        }
        .render(area, &mut buf);

        let top = buf.cell((0, 0)).unwrap();
        assert_eq!(top.symbol(), "▀");
        assert_eq!(top.fg, Color::Rgb(255, 0, 0));
        let bottom = buf.cell((0, 1)).unwrap();
        assert_eq!(bottom.bg, Color::Rgb(0, 0, 255));
    }

    #[test]
    fn test_picture_widget_placeholder() {
        let area = Rect::new(0, 0, 20, 3);
        let mut buf = Buffer::empty(area);
        PictureWidget {
            picture: None,
            placeholder: "empty",
        }
        .render(area, &mut buf);

        let row: String = (0..20).map(|x| buf.cell((x, 1)).unwrap().symbol()).collect();
        assert!(row.contains("empty"));
    }

    #[test]
    fn test_banner_uses_severity_color() {
        let area = Rect::new(0, 0, 20, 1);
        let mut buf = Buffer::empty(area);
        BannerWidget {
            banner: Some(Banner {
                notification: Notification {
                    seq: 1,
                    message: "Photo saved".into(),
                    severity: Severity::Success,
                },
                phase: Phase::Visible,
            }),
        }
        .render(area, &mut buf);

        assert_eq!(buf.cell((0, 0)).unwrap().bg, Color::Rgb(0x28, 0xa7, 0x45));
        assert_eq!(buf.cell((1, 0)).unwrap().symbol(), "P");
    }
}
