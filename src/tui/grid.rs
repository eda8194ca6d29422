use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::widgets::Block;
use ratatui::Frame;

use crate::shared::{LedState, STEPS_PER_BAR};

pub fn draw_step_lamps(frame: &mut Frame, area: Rect, lamps: &[LedState; STEPS_PER_BAR]) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, STEPS_PER_BAR as u32); STEPS_PER_BAR])
        .split(area);

    for (cell_area, lamp) in cols.iter().zip(lamps) {
        let color = match lamp {
            LedState::OnHigh => Style::default().fg(Color::LightMagenta).bg(Color::Magenta),
            LedState::OnMedium => Style::default().fg(Color::Gray).bg(Color::DarkGray),
            LedState::Off => Style::default().fg(Color::DarkGray),
        };
        let block = Block::bordered().border_style(color).style(color);
        frame.render_widget(block, *cell_area);
    }
}
