use bevy_ecs::prelude::*;
use crossterm::event::{KeyCode, KeyEvent};
use tui_input::backend::crossterm::EventHandler;

/// Quantity field of the trade panel; accepts digits and editing keys only
#[derive(Debug, Default, Resource)]
pub struct QuantityInput {
    pub(crate) input: tui_input::Input,
}

impl QuantityInput {
    pub fn value(&self) -> &str {
        self.input.value()
    }

    /// Replace the text, e.g. after `+`/`-` changed the quantity
    pub fn set(&mut self, quantity: u32) {
        self.input = tui_input::Input::new(quantity.to_string());
    }

    /// Returns the new text if the key changed it
    pub fn handle_key(&mut self, event: KeyEvent) -> Option<&str> {
        let accepted = match event.code {
            KeyCode::Char(c) => c.is_ascii_digit(),
            KeyCode::Backspace
            | KeyCode::Delete
            | KeyCode::Left
            | KeyCode::Right
            | KeyCode::Home
            | KeyCode::End => true,
            _ => false,
        };
        if !accepted {
            return None;
        }
        let evt = crossterm::event::Event::Key(event);
        self.input
            .handle_event(&evt)
            .is_some_and(|r| r.value)
            .then(|| self.input.value())
    }
}
