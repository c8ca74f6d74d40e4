use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Phases of one `parse()` call, as reported in logs and status updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseStage {
    Start,
    Retry,
    Parse,
    Done,
    Error,
}

impl ParseStage {
    // Stable label for UI display; intentionally not derived from `Debug`.
    pub fn label(self) -> &'static str {
        match self {
            ParseStage::Start => "start",
            ParseStage::Retry => "retry",
            ParseStage::Parse => "parse",
            ParseStage::Done => "done",
            ParseStage::Error => "error",
        }
    }
}

pub fn ms(d: Duration) -> u64 {
    d.as_millis().try_into().unwrap_or(u64::MAX)
}

/// Whole seconds for a "retrying in N seconds" message, rounded up.
pub fn display_secs(d: Duration) -> u64 {
    ms(d).div_ceil(1000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_partial_seconds_up() {
        assert_eq!(display_secs(Duration::from_millis(0)), 0);
        assert_eq!(display_secs(Duration::from_millis(1000)), 1);
        assert_eq!(display_secs(Duration::from_millis(1001)), 2);
    }

    #[test]
    fn labels_match_serde_names() {
        for stage in [
            ParseStage::Start,
            ParseStage::Retry,
            ParseStage::Parse,
            ParseStage::Done,
            ParseStage::Error,
        ] {
            let s = serde_json::to_string(&stage).unwrap();
            assert_eq!(s, format!("\"{}\"", stage.label()));
        }
    }
}
