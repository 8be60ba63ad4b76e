//! Run-level state: clock, terminal flags and the transient status line.

/// Why the run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    GameOver,
    LevelComplete,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub elapsed_time: f32,
    terminal: Option<Terminal>,
    status: Option<String>,
    status_remaining: f32,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            elapsed_time: 0.0,
            terminal: None,
            status: None,
            status_remaining: 0.0,
        }
    }

    pub fn game_over(&self) -> bool {
        self.terminal == Some(Terminal::GameOver)
    }

    pub fn level_complete(&self) -> bool {
        self.terminal == Some(Terminal::LevelComplete)
    }

    pub fn terminal(&self) -> Option<Terminal> {
        self.terminal
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal.is_some()
    }

    /// Enter a terminal state. The first one sticks; returns false when the
    /// session was already over.
    pub fn finish(&mut self, terminal: Terminal) -> bool {
        if self.terminal.is_some() {
            return false;
        }
        self.terminal = Some(terminal);
        self.status = None;
        self.status_remaining = 0.0;
        true
    }

    pub fn advance_clock(&mut self, dt: f32) {
        if self.terminal.is_none() {
            self.elapsed_time += dt.max(0.0);
        }
    }

    /// Show a transient status message. A newer message replaces the current
    /// one along with its deadline.
    pub fn show_status(&mut self, text: impl Into<String>, duration: f32) {
        self.status = Some(text.into());
        self.status_remaining = duration;
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Count down the status message. Returns true when it cleared.
    pub fn tick_status(&mut self, dt: f32) -> bool {
        if self.status.is_none() {
            return false;
        }
        self.status_remaining -= dt;
        if self.status_remaining <= 0.0 {
            self.status = None;
            self.status_remaining = 0.0;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_flags_are_exclusive_and_sticky() {
        let mut session = SessionState::new();
        assert!(session.finish(Terminal::LevelComplete));
        assert!(!session.finish(Terminal::GameOver));
        assert!(session.level_complete());
        assert!(!session.game_over());
    }

    #[test]
    fn test_clock_stops_when_terminal() {
        let mut session = SessionState::new();
        session.advance_clock(1.5);
        session.finish(Terminal::GameOver);
        session.advance_clock(1.0);
        assert_eq!(session.elapsed_time, 1.5);
    }

    #[test]
    fn test_latest_status_overwrites_deadline() {
        let mut session = SessionState::new();
        session.show_status("Invincible!", 1.0);
        assert!(!session.tick_status(0.8));
        session.show_status("Extra Life!", 1.0);
        assert!(!session.tick_status(0.8));
        assert_eq!(session.status(), Some("Extra Life!"));
        assert!(session.tick_status(0.25));
        assert_eq!(session.status(), None);
        assert!(!session.tick_status(1.0));
    }
}
