/// One frame of sampled input.
///
/// Buttons are edge-triggered: `true` only on the frame the button went down.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputFrame {
    /// Horizontal axis, clamped to [-1, 1] on construction.
    pub horizontal: f32,
    pub jump: bool,
    pub ranged_attack: bool,
    pub restart: bool,
}

impl InputFrame {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn moving(horizontal: f32) -> Self {
        Self {
            horizontal: horizontal.clamp(-1.0, 1.0),
            ..Self::default()
        }
    }

    pub fn with_jump(mut self) -> Self {
        self.jump = true;
        self
    }

    pub fn with_ranged_attack(mut self) -> Self {
        self.ranged_attack = true;
        self
    }

    pub fn with_restart(mut self) -> Self {
        self.restart = true;
        self
    }

    /// Axis value guaranteed to be inside [-1, 1], even for hand-built frames.
    pub fn axis(&self) -> f32 {
        if self.horizontal.is_finite() {
            self.horizontal.clamp(-1.0, 1.0)
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_is_clamped() {
        assert_eq!(InputFrame::moving(3.0).axis(), 1.0);
        let raw = InputFrame {
            horizontal: -7.0,
            ..InputFrame::default()
        };
        assert_eq!(raw.axis(), -1.0);
        let nan = InputFrame {
            horizontal: f32::NAN,
            ..InputFrame::default()
        };
        assert_eq!(nan.axis(), 0.0);
    }

    #[test]
    fn test_builders_set_edges() {
        let frame = InputFrame::moving(0.5).with_jump().with_ranged_attack();
        assert!(frame.jump);
        assert!(frame.ranged_attack);
        assert!(!frame.restart);
    }
}
