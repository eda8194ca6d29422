use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};

use crate::shared::InputEvent;

// poll for one key from the terminal and turn it into input events
pub fn poll_input(timeout: Duration) -> anyhow::Result<Vec<InputEvent>> {
    if !event::poll(timeout)? {
        return Ok(vec![]);
    }

    if let Event::Key(key) = event::read()? {
        if key.kind != KeyEventKind::Press {
            return Ok(vec![]);
        }
        return Ok(handle_key(key.code));
    }
    Ok(vec![])
}

fn handle_key(code: KeyCode) -> Vec<InputEvent> {
    match code {
        KeyCode::Esc => vec![InputEvent::Quit],
        KeyCode::Char(' ') => vec![InputEvent::Stop],
        KeyCode::Char('m' | 'M') => vec![InputEvent::ToggleMute],
        KeyCode::Char(c) => char_to_theme(c).map(InputEvent::SelectTheme).into_iter().collect(),
        _ => vec![],
    }
}

// number row: 1..9 pick the first nine themes, 0 the tenth
fn char_to_theme(c: char) -> Option<u8> {
    match c {
        '1'..='9' => Some(c as u8 - b'1'),
        '0' => Some(9),
        _ => None,
    }
}
