//! HUD text output.

/// Receiver for HUD text. The game works without one.
pub trait HudSink {
    fn set_health(&mut self, text: &str);
    fn set_timer(&mut self, text: &str);
    /// Transient status line or terminal banner. Empty clears it.
    fn set_status(&mut self, text: &str);
}

pub fn health_text(lives: u32, max_lives: u32) -> String {
    format!("HP: {}/{}", lives, max_lives)
}

pub fn timer_text(elapsed: f32) -> String {
    format!("Time: {:.2}s", elapsed)
}

pub fn game_over_banner() -> String {
    "GAME OVER!\nPress R to Restart".to_string()
}

pub fn level_complete_banner(elapsed: f32) -> String {
    format!("LEVEL COMPLETE!\nTime: {:.2}s\nPress R", elapsed)
}

/// Which HUD line a recorded update targeted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HudLine {
    Health(String),
    Timer(String),
    Status(String),
}

/// Sink that records every update into a shared buffer.
#[derive(Debug, Clone, Default)]
pub struct RecordingHud {
    pub lines: std::sync::Arc<std::sync::Mutex<Vec<HudLine>>>,
}

impl RecordingHud {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, line: HudLine) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line);
        }
    }

    pub fn snapshot(&self) -> Vec<HudLine> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn last_status(&self) -> Option<String> {
        self.snapshot().into_iter().rev().find_map(|l| match l {
            HudLine::Status(s) => Some(s),
            _ => None,
        })
    }

    pub fn last_health(&self) -> Option<String> {
        self.snapshot().into_iter().rev().find_map(|l| match l {
            HudLine::Health(s) => Some(s),
            _ => None,
        })
    }
}

impl HudSink for RecordingHud {
    fn set_health(&mut self, text: &str) {
        self.push(HudLine::Health(text.to_string()));
    }

    fn set_timer(&mut self, text: &str) {
        self.push(HudLine::Timer(text.to_string()));
    }

    fn set_status(&mut self, text: &str) {
        self.push(HudLine::Status(text.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formats() {
        assert_eq!(health_text(2, 3), "HP: 2/3");
        assert_eq!(timer_text(12.345), "Time: 12.35s");
        assert_eq!(level_complete_banner(61.0), "LEVEL COMPLETE!\nTime: 61.00s\nPress R");
        assert!(game_over_banner().starts_with("GAME OVER!"));
    }

    #[test]
    fn test_recording_hud_shares_buffer() {
        let hud = RecordingHud::new();
        let mut sink: Box<dyn HudSink> = Box::new(hud.clone());
        sink.set_health("HP: 3/3");
        sink.set_status("Unstuck!");
        sink.set_status("");
        assert_eq!(hud.snapshot().len(), 3);
        assert_eq!(hud.last_status().as_deref(), Some(""));
        assert_eq!(hud.last_health().as_deref(), Some("HP: 3/3"));
    }
}
