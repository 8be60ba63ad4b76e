use std::path::Path;

use ascent_core::input::InputFrame;
use serde::{Deserialize, Serialize};

/// Edge-triggered buttons a script can press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Button {
    Jump,
    RangedAttack,
    Restart,
}

/// Horizontal axis value held from `at` until the next segment.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct AxisSegment {
    pub at: f32,
    pub horizontal: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct ButtonPress {
    pub at: f32,
    pub button: Button,
}

/// Timeline of input for headless runs, loaded from YAML:
///
/// ```yaml
/// axis:
///   - { at: 0.0, horizontal: 1.0 }
///   - { at: 2.5, horizontal: 0.0 }
/// presses:
///   - { at: 1.0, button: jump }
///   - { at: 3.0, button: ranged_attack }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct InputScript {
    #[serde(default)]
    pub axis: Vec<AxisSegment>,
    #[serde(default)]
    pub presses: Vec<ButtonPress>,
}

impl InputScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hold(mut self, at: f32, horizontal: f32) -> Self {
        self.axis.push(AxisSegment { at, horizontal });
        self
    }

    pub fn press(mut self, at: f32, button: Button) -> Self {
        self.presses.push(ButtonPress { at, button });
        self
    }

    /// Time of the last scripted change.
    pub fn duration(&self) -> f32 {
        let axis = self.axis.iter().map(|s| s.at);
        let presses = self.presses.iter().map(|p| p.at);
        axis.chain(presses).fold(0.0, f32::max)
    }

    pub fn into_timeline(self) -> InputTimeline {
        InputTimeline::new(self)
    }
}

#[derive(Debug)]
pub enum ScriptError {
    Io(std::io::Error),
    Parse(serde_yaml::Error),
}

impl std::fmt::Display for ScriptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScriptError::Io(e) => write!(f, "IO error reading input script: {}", e),
            ScriptError::Parse(e) => write!(f, "Failed to parse input script: {}", e),
        }
    }
}

impl std::error::Error for ScriptError {}

pub fn parse_script(contents: &str) -> Result<InputScript, ScriptError> {
    serde_yaml::from_str(contents).map_err(ScriptError::Parse)
}

/// Load an input script from a YAML file.
pub fn load_script(path: &Path) -> Result<InputScript, ScriptError> {
    let contents = std::fs::read_to_string(path).map_err(ScriptError::Io)?;
    let script = parse_script(&contents)?;
    tracing::info!(
        "Loaded input script {:?}: {} axis segments, {} presses",
        path,
        script.axis.len(),
        script.presses.len()
    );
    Ok(script)
}

/// Plays an [`InputScript`] back as per-frame [`InputFrame`]s.
#[derive(Debug, Clone)]
pub struct InputTimeline {
    axis: Vec<AxisSegment>,
    presses: Vec<ButtonPress>,
    next_press: usize,
}

impl InputTimeline {
    pub fn new(script: InputScript) -> Self {
        let mut axis = script.axis;
        let mut presses = script.presses;
        axis.sort_by(|a, b| a.at.total_cmp(&b.at));
        presses.sort_by(|a, b| a.at.total_cmp(&b.at));
        Self {
            axis,
            presses,
            next_press: 0,
        }
    }

    /// Input for the frame at time `now`. Every press scheduled at or
    /// before `now` that has not fired yet fires on this frame.
    pub fn sample(&mut self, now: f32) -> InputFrame {
        let horizontal = self
            .axis
            .iter()
            .take_while(|s| s.at <= now)
            .last()
            .map(|s| s.horizontal)
            .unwrap_or(0.0);
        let mut frame = InputFrame::moving(horizontal);

        while let Some(press) = self.presses.get(self.next_press) {
            if press.at > now {
                break;
            }
            match press.button {
                Button::Jump => frame.jump = true,
                Button::RangedAttack => frame.ranged_attack = true,
                Button::Restart => frame.restart = true,
            }
            self.next_press += 1;
        }
        frame
    }

    pub fn is_finished(&self, now: f32) -> bool {
        self.next_press >= self.presses.len() && self.axis.last().map_or(true, |s| s.at <= now)
    }
}
