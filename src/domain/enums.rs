/// Runtime status of the countdown timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerStatus {
    /// Fresh or reset, showing the full duration
    Idle,
    Running,
    Paused,
    /// Countdown reached zero
    Complete,
}

impl TimerStatus {
    /// Convert status to a display tag
    pub fn to_tag(&self) -> &'static str {
        match self {
            Self::Idle => "READY",
            Self::Running => "RUNNING",
            Self::Paused => "PAUSED",
            Self::Complete => "DONE",
        }
    }

    /// Whether `start()` is meaningful from this status
    pub fn can_start(&self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// UI mode for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiMode {
    Normal,
    AddingTask,
    /// Typing a custom duration in minutes
    SettingTime,
}

impl UiMode {
    /// Whether keystrokes go to the text input
    pub fn is_input(&self) -> bool {
        !matches!(self, Self::Normal)
    }
}

/// Which mounted task list keyboard actions apply to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListSurface {
    /// The list below the timer
    Inline,
    /// The overlay panel opened while focusing
    Panel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_status_to_tag() {
        assert_eq!(TimerStatus::Idle.to_tag(), "READY");
        assert_eq!(TimerStatus::Running.to_tag(), "RUNNING");
        assert_eq!(TimerStatus::Paused.to_tag(), "PAUSED");
        assert_eq!(TimerStatus::Complete.to_tag(), "DONE");
    }

    #[test]
    fn test_timer_status_can_start() {
        assert!(TimerStatus::Idle.can_start());
        assert!(TimerStatus::Paused.can_start());
        assert!(TimerStatus::Complete.can_start());
        assert!(!TimerStatus::Running.can_start());
    }

    #[test]
    fn test_ui_mode_is_input() {
        assert!(!UiMode::Normal.is_input());
        assert!(UiMode::AddingTask.is_input());
        assert!(UiMode::SettingTime.is_input());
    }
}
