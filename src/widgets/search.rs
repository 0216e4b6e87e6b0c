use bevy_ecs::prelude::*;
use crossterm::event::KeyEvent;
use ratatui::widgets::TableState;
use tui_input::backend::crossterm::EventHandler;

use crate::data::Quote;
use crate::helper::cycle;
use crate::search::SearchDebouncer;
use crate::state::Dashboard;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchAction {
    /// Keep the popup open
    Continue,
    Close,
    /// Open the option at this row
    Open(usize),
}

/// Search popup input. Typed text goes to the debouncer; the rows come from the dashboard.
#[derive(Resource)]
pub struct SearchBox {
    pub(crate) input: tui_input::Input,
    pub(crate) table: TableState,
    debouncer: SearchDebouncer,
}

impl SearchBox {
    pub fn new(debouncer: SearchDebouncer) -> Self {
        Self {
            input: tui_input::Input::default(),
            table: TableState::default(),
            debouncer,
        }
    }

    pub fn query(&self) -> &str {
        self.input.value()
    }

    pub fn reset(&mut self) {
        self.input.reset();
        self.table.select(None);
        self.debouncer.input("");
    }

    /// Rows shown under the input: recent picks while empty, search results otherwise
    pub fn options<'a>(&self, dashboard: &'a Dashboard) -> &'a [Quote] {
        if self.query().trim().is_empty() {
            dashboard.picks()
        } else {
            dashboard.search().items()
        }
    }

    pub fn handle_key(&mut self, event: KeyEvent, options: usize) -> SearchAction {
        match event {
            key!(Esc) => return SearchAction::Close,
            key!(Enter) => {
                if let Some(idx) = self.table.selected().filter(|idx| *idx < options) {
                    return SearchAction::Open(idx);
                }
            }
            key!(Up) => {
                let idx = cycle::prev_opt(self.table.selected(), options);
                self.table.select(idx);
            }
            key!(Down) => {
                let idx = cycle::next_opt(self.table.selected(), options);
                self.table.select(idx);
            }
            _ => {
                let evt = crossterm::event::Event::Key(event);
                if self.input.handle_event(&evt).is_some_and(|r| r.value) {
                    self.table.select(None);
                    self.debouncer.input(self.input.value());
                }
            }
        }
        SearchAction::Continue
    }
}
