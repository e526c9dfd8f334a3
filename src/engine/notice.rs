//! engine::notice
//!
//! Occasional "upgrade available" reminder shown after a git command.
//!
//! The reminder fires only when an upgrade has been staged (a marker file
//! exists), the session is interactive, and a random draw hits one in
//! `frequency`, so users are not nagged on every command.

use std::path::PathBuf;

use rand::Rng;

use crate::core::config::Config;

/// Message shown when the reminder fires.
pub const UPGRADE_MESSAGE: &str =
    "A new version of GVFS is available. Run 'gvfs upgrade --confirm' to install it.";

/// Upgrade reminder settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeReminder {
    /// File whose presence means an upgrade is staged.
    pub marker: Option<PathBuf>,
    /// One in this many runs shows the reminder.
    pub frequency: u32,
    pub enabled: bool,
}

impl UpgradeReminder {
    pub fn from_config(config: &Config) -> Self {
        Self {
            marker: config.upgrade_marker_path(),
            frequency: config.reminder_frequency(),
            enabled: config.upgrade_reminder(),
        }
    }

    /// Whether to show the reminder on this run.
    pub fn should_remind<R: Rng>(&self, interactive: bool, rng: &mut R) -> bool {
        if !self.enabled || !interactive || self.frequency == 0 {
            return false;
        }
        if !self.marker.as_ref().is_some_and(|m| m.exists()) {
            return false;
        }
        rng.random_range(0..self.frequency) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;

    fn staged(temp: &TempDir, frequency: u32) -> UpgradeReminder {
        let marker = temp.path().join("UpgradeAvailable");
        std::fs::write(&marker, "").unwrap();
        UpgradeReminder {
            marker: Some(marker),
            frequency,
            enabled: true,
        }
    }

    #[test]
    fn always_reminds_at_frequency_one() {
        let temp = TempDir::new().unwrap();
        let reminder = staged(&temp, 1);
        let mut rng = StdRng::seed_from_u64(7);
        assert!((0..20).all(|_| reminder.should_remind(true, &mut rng)));
    }

    #[test]
    fn never_without_marker() {
        let temp = TempDir::new().unwrap();
        let reminder = UpgradeReminder {
            marker: Some(temp.path().join("missing")),
            frequency: 1,
            enabled: true,
        };
        assert!(!reminder.should_remind(true, &mut StdRng::seed_from_u64(1)));
    }

    #[test]
    fn never_when_unattended_or_disabled() {
        let temp = TempDir::new().unwrap();
        let mut reminder = staged(&temp, 1);
        let mut rng = StdRng::seed_from_u64(3);

        assert!(!reminder.should_remind(false, &mut rng));
        reminder.enabled = false;
        assert!(!reminder.should_remind(true, &mut rng));
    }

    #[test]
    fn reminds_occasionally() {
        let temp = TempDir::new().unwrap();
        let reminder = staged(&temp, 5);
        let mut rng = StdRng::seed_from_u64(42);

        let hits = (0..1000)
            .filter(|_| reminder.should_remind(true, &mut rng))
            .count();
        assert!((100..300).contains(&hits), "hits = {hits}");
    }
}
