use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};
use ratatui::Frame;

use super::grid::draw_step_lamps;
use crate::pipeline::ThemeId;
use crate::shared::DisplayState;

const KEY_LABELS: [&str; 10] = ["1", "2", "3", "4", "5", "6", "7", "8", "9", "0"];

pub fn render(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // status screen
            Constraint::Length(3), // step lamps
            Constraint::Min(6),    // theme keys + help
        ])
        .split(area);

    draw_screen(frame, sections[0], state);
    draw_step_lamps(frame, sections[1], &state.lamps);
    draw_theme_keys(frame, sections[2], state);
}

fn draw_screen(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let theme = state.theme.map_or("-", ThemeId::name);
    let status = if state.playing { "PLAYING" } else { "STOPPED" };
    let mut lines = vec![
        Line::from(vec![
            Span::styled(status, Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format!("  {theme}")),
        ]),
        Line::from(format!(
            "bar {:>3}  step {:>2}  voices {:>3}",
            state.bar + 1,
            state.step + 1,
            state.active_voices
        )),
    ];
    if state.muted {
        lines.push(Line::styled("MUTED", Style::default().fg(Color::Yellow)));
    }
    if !state.audio_ok {
        lines.push(Line::styled("no audio output", Style::default().fg(Color::Red)));
    }
    frame.render_widget(Paragraph::new(lines).block(Block::bordered().title(" overture ")), area);
}

fn draw_theme_keys(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let mut lines: Vec<Line> = ThemeId::ALL
        .iter()
        .zip(KEY_LABELS)
        .map(|(id, key)| {
            let style = if state.theme == Some(*id) {
                Style::default().fg(Color::LightMagenta)
            } else {
                Style::default()
            };
            Line::styled(format!("[{key}] {}", id.name()), style)
        })
        .collect();
    lines.push(Line::raw(""));
    lines.push(Line::raw("[space] stop   [m] mute   [esc] quit"));
    frame.render_widget(Paragraph::new(lines).block(Block::bordered()), area);
}
