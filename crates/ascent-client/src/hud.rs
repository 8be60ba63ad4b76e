use ascent_core::hud::HudSink;

/// HUD sink for headless runs: writes HUD changes to the log.
#[derive(Debug, Default)]
pub struct TracingHud {
    health: String,
    status: String,
    timer: String,
}

impl TracingHud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn health(&self) -> &str {
        &self.health
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn timer(&self) -> &str {
        &self.timer
    }
}

impl HudSink for TracingHud {
    fn set_health(&mut self, text: &str) {
        if self.health != text {
            tracing::info!("[hud] {}", text);
            self.health = text.to_string();
        }
    }

    fn set_timer(&mut self, text: &str) {
        // Changes every frame
        tracing::trace!("[hud] {}", text);
        self.timer.clear();
        self.timer.push_str(text);
    }

    fn set_status(&mut self, text: &str) {
        if self.status != text {
            if !text.is_empty() {
                tracing::info!("[hud] {}", text.replace('\n', " | "));
            }
            self.status = text.to_string();
        }
    }
}
