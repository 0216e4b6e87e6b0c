/// Key press without modifiers: `key!('q')`, `key!(Esc)`
#[macro_export]
macro_rules! key {
    ($key:literal) => {
        $crate::press!(Char($key), NONE)
    };
    ($key:tt) => {
        $crate::press!($key, NONE)
    };
}

#[macro_export]
macro_rules! ctrl {
    ($key:literal) => {
        $crate::press!(Char($key), CONTROL)
    };
    ($key:tt) => {
        $crate::press!($key, CONTROL)
    };
}

/// Characters typed with shift held: `shift!('R')`, `shift!('?')`
#[macro_export]
macro_rules! shift {
    ($key:literal) => {
        $crate::press!(Char($key), SHIFT)
    };
    ($key:tt) => {
        $crate::press!($key, SHIFT)
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! press {
    ($code:ident $(($arg:literal))?, $modifiers:ident) => {
        ::crossterm::event::KeyEvent {
            code: ::crossterm::event::KeyCode::$code$(($arg))?,
            modifiers: ::crossterm::event::KeyModifiers::$modifiers,
            kind: ::crossterm::event::KeyEventKind::Press,
            state: ::crossterm::event::KeyEventState::NONE,
        }
    };
}

/// A character regardless of shift, for keys like `R` or `?` that terminals report either way
#[macro_export]
macro_rules! typed {
    ($key:literal) => {
        ::crossterm::event::KeyEvent {
            code: ::crossterm::event::KeyCode::Char($key),
            modifiers: ::crossterm::event::KeyModifiers::NONE
                | ::crossterm::event::KeyModifiers::SHIFT,
            kind: ::crossterm::event::KeyEventKind::Press,
            state: ::crossterm::event::KeyEventState::NONE,
        }
    };
}
