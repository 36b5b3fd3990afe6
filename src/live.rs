//! Live terminal view
//!
//! Redraws the snapshot table every refresh interval until the user quits.
//! Digit keys pick the sort column, pressing the same digit again flips the
//! direction.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::Result;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute, queue,
    terminal::{
        disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use tracing::debug;

use crate::config::MonitorConfig;
use crate::projector::SortState;
use crate::session::{MonitorKind, MonitorSession};
use crate::table::render_table;

/// What a key press asks the live view to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    Sort(SortState),
    Ignore,
}

/// Map a key press to an action; pure so the key bindings can be tested without a terminal
pub fn apply_key(kind: MonitorKind, sort: SortState, key: KeyEvent) -> KeyAction {
    if key.kind != KeyEventKind::Press {
        return KeyAction::Ignore;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => KeyAction::Quit,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => KeyAction::Quit,
        KeyCode::Char(digit) => match kind.column_for_key(digit) {
            Some(column) => KeyAction::Sort(sort.select(column)),
            None => KeyAction::Ignore,
        },
        _ => KeyAction::Ignore,
    }
}

/// Raw mode plus alternate screen, restored on drop
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, cursor::Hide)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore_terminal();
    }
}

fn restore_terminal() {
    let _ = execute!(io::stdout(), cursor::Show, LeaveAlternateScreen);
    let _ = disable_raw_mode();
}

/// Panic hook that runs `cleanup` before the previous hook; the previous hook
/// is reinstated on drop
struct PanicHookGuard {
    restore: Option<Box<dyn FnOnce()>>,
}

impl PanicHookGuard {
    fn install(cleanup: fn()) -> Self {
        let original = Arc::new(std::panic::take_hook());
        let chained = Arc::clone(&original);
        std::panic::set_hook(Box::new(move |panic_info| {
            cleanup();
            (**chained)(panic_info);
        }));

        Self {
            restore: Some(Box::new(move || {
                let _ = std::panic::take_hook();
                std::panic::set_hook(Box::new(move |panic_info| (**original)(panic_info)));
            })),
        }
    }
}

impl Drop for PanicHookGuard {
    fn drop(&mut self) {
        if let Some(restore) = self.restore.take() {
            restore();
        }
    }
}

fn draw(out: &mut impl Write, text: &str) -> Result<()> {
    queue!(out, cursor::MoveTo(0, 0), Clear(ClearType::All))?;
    // Raw mode does not translate "\n"
    for line in text.lines() {
        write!(out, "{}\r\n", line)?;
    }
    out.flush()?;
    Ok(())
}

/// Run the live view until the user quits; returns the final sort state
pub fn run_live(session: &MonitorSession, config: &MonitorConfig) -> Result<SortState> {
    let _terminal = TerminalGuard::enter()?;
    // Dropped before the terminal guard, so the previous hook is back first
    let _hook = PanicHookGuard::install(restore_terminal);

    let kind = session.kind();
    let mut sort = config.sort;
    let mut stdout = io::stdout();

    loop {
        let text = render_table(kind, &session.live_snapshot(), sort, config.top);
        draw(&mut stdout, &text)?;

        if event::poll(config.refresh)? {
            if let Event::Key(key) = event::read()? {
                match apply_key(kind, sort, key) {
                    KeyAction::Quit => break,
                    KeyAction::Sort(next) => {
                        debug!(column = ?next.column, ascending = next.ascending, "sort changed");
                        sort = next;
                    }
                    KeyAction::Ignore => {}
                }
            }
        }
    }

    Ok(sort)
}
