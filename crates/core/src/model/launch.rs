use std::fmt;
use std::str::FromStr;

/// How the course session was opened by the launching system.
///
/// Parsing is case-insensitive. Anything that is not one of the three known
/// modes (including the empty string) maps to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LaunchMode {
    Normal,
    Browse,
    Review,
    #[default]
    Unknown,
}

impl LaunchMode {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("normal") {
            Self::Normal
        } else if raw.eq_ignore_ascii_case("browse") {
            Self::Browse
        } else if raw.eq_ignore_ascii_case("review") {
            Self::Review
        } else {
            Self::Unknown
        }
    }

    /// Only sessions launched in `Normal` mode record learner activity.
    #[must_use]
    pub fn records_activity(self) -> bool {
        matches!(self, Self::Normal)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Browse => "Browse",
            Self::Review => "Review",
            Self::Unknown => "",
        }
    }
}

impl FromStr for LaunchMode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for LaunchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Launch parameters read once from the launching system at initialize.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LaunchContext {
    pub launch_mode: LaunchMode,
    pub passing_score_override: Option<f64>,
}

impl LaunchContext {
    /// Build a context from the raw launch mode and mastery score strings.
    ///
    /// A mastery score that does not parse to a number is treated as absent.
    #[must_use]
    pub fn from_raw(launch_mode: &str, mastery_score: Option<&str>) -> Self {
        let passing_score_override = mastery_score
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .filter(|score| !score.is_nan());
        Self {
            launch_mode: LaunchMode::parse(launch_mode),
            passing_score_override,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_modes_case_insensitively() {
        assert_eq!(LaunchMode::parse("Normal"), LaunchMode::Normal);
        assert_eq!(LaunchMode::parse("NORMAL"), LaunchMode::Normal);
        assert_eq!(LaunchMode::parse("browse"), LaunchMode::Browse);
        assert_eq!(LaunchMode::parse("Review"), LaunchMode::Review);
        assert_eq!(LaunchMode::parse(""), LaunchMode::Unknown);
        assert_eq!(LaunchMode::parse("normalish"), LaunchMode::Unknown);
    }

    #[test]
    fn mastery_score_parses_or_is_absent() {
        let ctx = LaunchContext::from_raw("Normal", Some("0.8"));
        assert_eq!(ctx.passing_score_override, Some(0.8));

        let ctx = LaunchContext::from_raw("Normal", Some("abc"));
        assert_eq!(ctx.passing_score_override, None);

        let ctx = LaunchContext::from_raw("Browse", None);
        assert_eq!(ctx.passing_score_override, None);
        assert_eq!(ctx.launch_mode, LaunchMode::Browse);
    }
}
