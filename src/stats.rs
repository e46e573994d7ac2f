use crate::model::MAX_ATTEMPTS;
use serde::{Deserialize, Serialize};

/// Running totals over every completed game
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub(crate) struct Statistics {
    games_played: u32,
    games_won: u32,
    current_streak: u32,
    max_streak: u32,
    /// `guess_histogram[i]` is the number of games won in `i + 1` attempts
    guess_histogram: [u32; MAX_ATTEMPTS],
}

impl Statistics {
    /// Record the outcome of a finished game.
    ///
    /// The tracker cannot tell whether it has already seen a given game; the
    /// caller must call this at most once per game.
    pub(crate) fn record_outcome(&mut self, won: bool, attempts_used: usize) {
        self.games_played += 1;
        if won {
            self.games_won += 1;
            self.current_streak += 1;
            self.max_streak = self.max_streak.max(self.current_streak);
            match attempts_used
                .checked_sub(1)
                .and_then(|i| self.guess_histogram.get_mut(i))
            {
                Some(slot) => *slot += 1,
                None => log::warn!("Win recorded with out-of-range attempt count {attempts_used}"),
            }
        } else {
            self.current_streak = 0;
        }
    }

    pub(crate) fn clear(&mut self) {
        *self = Statistics::default();
    }

    pub(crate) fn games_played(&self) -> u32 {
        self.games_played
    }

    pub(crate) fn games_won(&self) -> u32 {
        self.games_won
    }

    pub(crate) fn current_streak(&self) -> u32 {
        self.current_streak
    }

    pub(crate) fn max_streak(&self) -> u32 {
        self.max_streak
    }

    pub(crate) fn guess_histogram(&self) -> &[u32; MAX_ATTEMPTS] {
        &self.guess_histogram
    }

    /// Percentage of played games that were won, rounded half up; 0 if no
    /// games have been played
    pub(crate) fn win_percentage(&self) -> u32 {
        if self.games_played == 0 {
            return 0;
        }
        let won = u64::from(self.games_won);
        let played = u64::from(self.games_played);
        u32::try_from((200 * won + played) / (2 * played)).unwrap_or(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty() {
        let stats = Statistics::default();
        assert_eq!(stats.games_played(), 0);
        assert_eq!(stats.win_percentage(), 0);
    }

    #[test]
    fn test_record_sequence() {
        let mut stats = Statistics::default();
        stats.record_outcome(true, 3);
        stats.record_outcome(true, 4);
        stats.record_outcome(false, 6);
        stats.record_outcome(true, 3);
        stats.record_outcome(true, 1);
        stats.record_outcome(false, 6);
        stats.record_outcome(true, 6);
        assert_eq!(stats.games_played(), 7);
        assert_eq!(stats.games_won(), 5);
        assert_eq!(stats.current_streak(), 1);
        assert_eq!(stats.max_streak(), 2);
        assert_eq!(stats.guess_histogram(), &[1, 0, 2, 1, 0, 1]);
        // 5/7 = 71.43%
        assert_eq!(stats.win_percentage(), 71);
    }

    #[test]
    fn test_streak_resets_on_loss() {
        let mut stats = Statistics::default();
        for _ in 0..4 {
            stats.record_outcome(true, 2);
        }
        assert_eq!(stats.current_streak(), 4);
        stats.record_outcome(false, 6);
        assert_eq!(stats.current_streak(), 0);
        assert_eq!(stats.max_streak(), 4);
        stats.record_outcome(true, 5);
        assert_eq!(stats.current_streak(), 1);
        assert_eq!(stats.max_streak(), 4);
    }

    #[test]
    fn test_win_percentage_rounding() {
        let mut stats = Statistics::default();
        stats.record_outcome(true, 2);
        stats.record_outcome(false, 6);
        assert_eq!(stats.win_percentage(), 50);
        stats.record_outcome(false, 6);
        // 1/3 = 33.33%
        assert_eq!(stats.win_percentage(), 33);
        stats.record_outcome(true, 2);
        stats.record_outcome(true, 2);
        // 3/5 = 60%
        assert_eq!(stats.win_percentage(), 60);
        let mut stats = Statistics::default();
        stats.record_outcome(true, 1);
        stats.record_outcome(true, 1);
        stats.record_outcome(false, 6);
        // 2/3 = 66.67%
        assert_eq!(stats.win_percentage(), 67);
        let mut stats = Statistics::default();
        for i in 0..8 {
            stats.record_outcome(i != 0, 4);
        }
        // 7/8 = 87.5%
        assert_eq!(stats.win_percentage(), 88);
    }

    #[test]
    fn test_clear() {
        let mut stats = Statistics::default();
        stats.record_outcome(true, 2);
        stats.clear();
        assert_eq!(stats, Statistics::default());
    }

    #[test]
    fn test_json_defaults_missing_fields() {
        let stats = serde_json::from_str::<Statistics>(r#"{"games_played": 3, "games_won": 2}"#)
            .unwrap();
        assert_eq!(stats.games_played(), 3);
        assert_eq!(stats.games_won(), 2);
        assert_eq!(stats.current_streak(), 0);
        assert_eq!(stats.guess_histogram(), &[0; MAX_ATTEMPTS]);
    }
}
