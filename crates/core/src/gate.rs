//! Send policy: decides whether a statement reaches the network at all.

use crate::model::LaunchMode;

/// Per-call dispatch options.
///
/// `force_send` bypasses the launch-mode check; lifecycle statements
/// (initialized, terminated) always set it. `queue` defers the statement to
/// the batch buffer instead of sending it immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SendOptions {
    pub force_send: bool,
    pub queue: bool,
}

impl SendOptions {
    #[must_use]
    pub fn forced() -> Self {
        Self {
            force_send: true,
            queue: false,
        }
    }

    #[must_use]
    pub fn queued() -> Self {
        Self {
            force_send: false,
            queue: true,
        }
    }

    #[must_use]
    pub fn with_force_send(mut self, force_send: bool) -> Self {
        self.force_send = force_send;
        self
    }

    #[must_use]
    pub fn with_queue(mut self, queue: bool) -> Self {
        self.queue = queue;
        self
    }
}

/// Returns true iff the session was launched in normal mode or the caller
/// forces the send.
#[must_use]
pub fn should_send(launch_mode: LaunchMode, options: SendOptions) -> bool {
    options.force_send || launch_mode.records_activity()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_normal_mode_sends_unforced() {
        let options = SendOptions::default();
        assert!(should_send(LaunchMode::Normal, options));
        assert!(!should_send(LaunchMode::Browse, options));
        assert!(!should_send(LaunchMode::Review, options));
        assert!(!should_send(LaunchMode::Unknown, options));
    }

    #[test]
    fn force_send_overrides_every_mode() {
        for mode in [
            LaunchMode::Normal,
            LaunchMode::Browse,
            LaunchMode::Review,
            LaunchMode::Unknown,
        ] {
            assert!(should_send(mode, SendOptions::forced()));
        }
    }

    #[test]
    fn queue_flag_does_not_affect_policy() {
        assert!(!should_send(LaunchMode::Browse, SendOptions::queued()));
        assert!(should_send(
            LaunchMode::Browse,
            SendOptions::queued().with_force_send(true)
        ));
    }
}
