use crate::stats::Statistics;
use crate::words::{letter_index, Word, WordPool, WORD_LENGTH};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// The number of guesses the player gets per game
pub(crate) const MAX_ATTEMPTS: usize = 6;

/// Feedback for a single letter of a guess.
///
/// Variants are ordered from least to most informative, so that the best
/// feedback a letter has received is its maximum verdict.
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(rename_all = "snake_case")]
pub(crate) enum Verdict {
    /// The letter does not occur in the secret word (after accounting for
    /// occurrences already claimed by other positions)
    Absent,
    /// The letter occurs in the secret word, but at a different position
    Present,
    /// The letter occurs in the secret word at this position
    Exact,
}

/// Score `guess` against `secret`.
///
/// Exact matches claim their letters before any misplaced letter is
/// considered, so a guess never receives more non-`Absent` verdicts for a
/// letter than the secret contains occurrences of it.
pub(crate) fn evaluate(guess: &Word, secret: &Word) -> [Verdict; WORD_LENGTH] {
    let mut verdicts = [Verdict::Absent; WORD_LENGTH];
    let mut remaining = secret.letter_counts();
    for ((v, &g), &s) in verdicts
        .iter_mut()
        .zip(guess.as_bytes())
        .zip(secret.as_bytes())
    {
        if g == s {
            *v = Verdict::Exact;
            remaining[letter_index(g)] -= 1;
        }
    }
    for (v, &g) in verdicts.iter_mut().zip(guess.as_bytes()) {
        if *v == Verdict::Exact {
            continue;
        }
        let count = &mut remaining[letter_index(g)];
        if *count > 0 {
            *v = Verdict::Present;
            *count -= 1;
        }
    }
    verdicts
}

/// The letters hard mode requires every subsequent guess to use: everything
/// that has been revealed as `Exact` or `Present` so far in the game.
///
/// Only the presence of a letter is enforced, never its position, even for
/// letters revealed as `Exact`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct Constraints(BTreeSet<char>);

impl Constraints {
    /// Fold the revealed letters of a scored guess into the set
    pub(crate) fn absorb(&mut self, guess: &Word, verdicts: &[Verdict; WORD_LENGTH]) {
        for (ch, &v) in guess.letters().into_iter().zip(verdicts) {
            if v != Verdict::Absent {
                self.0.insert(ch);
            }
        }
    }

    /// Check that `guess` uses every required letter.  If not, the first
    /// missing letter in alphabetical order is reported.
    pub(crate) fn validate(&self, guess: &Word) -> Result<(), Rejection> {
        match self.0.iter().find(|&&ch| !guess.contains(ch)) {
            Some(&ch) => Err(Rejection::MissingHardModeLetter(ch)),
            None => Ok(()),
        }
    }
}

/// Where a game stands
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum Status {
    #[default]
    InProgress,
    Won,
    Lost,
}

impl Status {
    pub(crate) fn is_over(self) -> bool {
        self != Status::InProgress
    }
}

/// A guess that was accepted, together with its scoring
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub(crate) struct Attempt {
    pub(crate) guess: Word,
    pub(crate) verdicts: [Verdict; WORD_LENGTH],
}

impl Attempt {
    fn is_correct(&self) -> bool {
        self.verdicts.iter().all(|&v| v == Verdict::Exact)
    }
}

/// Result of a successful [`Game::submit_guess()`]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Evaluation {
    pub(crate) guess: Word,
    pub(crate) verdicts: [Verdict; WORD_LENGTH],
    /// The game's status after the guess
    pub(crate) status: Status,
    /// The number of attempts made so far, including this one
    pub(crate) attempts_used: usize,
}

/// Reasons a submitted guess may be refused.  A refused guess does not use up
/// an attempt.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub(crate) enum Rejection {
    #[error("Not enough letters")]
    TooShort,
    #[error("Not in word list")]
    NotAWord,
    #[error("Guess must contain {}", .0.to_ascii_uppercase())]
    MissingHardModeLetter(char),
    #[error("The game is over")]
    GameOver,
}

/// A single game of Wordle
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Game {
    secret: Word,
    attempts: Vec<Attempt>,
    status: Status,
    constraints: Constraints,
}

impl Game {
    pub(crate) fn new(secret: Word) -> Game {
        Game {
            secret,
            attempts: Vec::with_capacity(MAX_ATTEMPTS),
            status: Status::InProgress,
            constraints: Constraints::default(),
        }
    }

    /// Process a guess at the secret word.
    ///
    /// The checks are performed in this order, and the first failure is
    /// returned with the game left untouched:
    ///
    /// - the game must still be in progress
    /// - `raw` must be exactly five characters long
    /// - `raw` must be an accepted guess in `pool` (case-insensitively)
    /// - if `hard_mode` is set, `raw` must use every letter revealed so far
    ///
    /// If the guess ends the game, its outcome is recorded in `stats`.
    pub(crate) fn submit_guess(
        &mut self,
        raw: &str,
        pool: &WordPool,
        hard_mode: bool,
        stats: &mut Statistics,
    ) -> Result<Evaluation, Rejection> {
        let guess = self.check_guess(raw, pool, hard_mode).inspect_err(|e| {
            log::debug!("Rejected guess {raw:?}: {e}");
        })?;
        let evaluation = self.apply(guess);
        log::info!(
            "Attempt {}/{MAX_ATTEMPTS}: {} -> {:?}",
            evaluation.attempts_used,
            evaluation.guess,
            evaluation.status
        );
        if evaluation.status.is_over() {
            stats.record_outcome(evaluation.status == Status::Won, evaluation.attempts_used);
        }
        Ok(evaluation)
    }

    fn check_guess(&self, raw: &str, pool: &WordPool, hard_mode: bool) -> Result<Word, Rejection> {
        if self.status.is_over() {
            return Err(Rejection::GameOver);
        }
        if raw.chars().count() != WORD_LENGTH {
            return Err(Rejection::TooShort);
        }
        if !pool.is_accepted_guess(raw) {
            return Err(Rejection::NotAWord);
        }
        let guess = raw.parse::<Word>().map_err(|_| Rejection::NotAWord)?;
        if hard_mode {
            self.constraints.validate(&guess)?;
        }
        Ok(guess)
    }

    /// Score and record a guess that has already passed validation
    fn apply(&mut self, guess: Word) -> Evaluation {
        debug_assert!(
            !self.status.is_over(),
            "Guesses should only be applied to games in progress"
        );
        let attempt = Attempt {
            guess,
            verdicts: evaluate(&guess, &self.secret),
        };
        self.constraints.absorb(&attempt.guess, &attempt.verdicts);
        self.attempts.push(attempt);
        if attempt.is_correct() {
            self.status = Status::Won;
        } else if self.attempts.len() == MAX_ATTEMPTS {
            self.status = Status::Lost;
        }
        Evaluation {
            guess,
            verdicts: attempt.verdicts,
            status: self.status,
            attempts_used: self.attempts.len(),
        }
    }

    pub(crate) fn secret(&self) -> &Word {
        &self.secret
    }

    pub(crate) fn attempts(&self) -> &[Attempt] {
        &self.attempts
    }

    pub(crate) fn status(&self) -> Status {
        self.status
    }

    /// Returns a mapping from each letter guessed so far to the best verdict
    /// it has received in any attempt
    pub(crate) fn letter_hints(&self) -> BTreeMap<char, Verdict> {
        let mut hints = BTreeMap::new();
        for attempt in &self.attempts {
            for (ch, &v) in attempt.guess.letters().into_iter().zip(&attempt.verdicts) {
                hints
                    .entry(ch)
                    .and_modify(|best: &mut Verdict| *best = (*best).max(v))
                    .or_insert(v);
            }
        }
        hints
    }

    pub(crate) fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            secret: self.secret,
            attempts: self.attempts.clone(),
            status: self.status,
        }
    }

    /// Rebuild a game from a snapshot.
    ///
    /// The attempts of a game still in progress are replayed through
    /// [`evaluate()`] in order to recompute their verdicts and the hard mode
    /// constraints; the attempts of a finished game are taken as stored.
    pub(crate) fn from_snapshot(snapshot: GameSnapshot) -> Result<Game, SnapshotError> {
        let GameSnapshot {
            secret,
            attempts,
            status,
        } = snapshot;
        match status {
            Status::InProgress => {
                if attempts.len() >= MAX_ATTEMPTS {
                    return Err(SnapshotError::Inconsistent(
                        "game in progress has no attempts left",
                    ));
                }
                let mut game = Game::new(secret);
                for Attempt { guess, .. } in attempts {
                    if game.apply(guess).status.is_over() {
                        return Err(SnapshotError::Inconsistent(
                            "replaying a game in progress finished it",
                        ));
                    }
                }
                Ok(game)
            }
            Status::Won | Status::Lost => {
                let Some((last, earlier)) = attempts.split_last() else {
                    return Err(SnapshotError::Inconsistent("finished game has no attempts"));
                };
                if attempts.len() > MAX_ATTEMPTS {
                    return Err(SnapshotError::Inconsistent(
                        "finished game has too many attempts",
                    ));
                }
                if earlier.iter().any(Attempt::is_correct) {
                    return Err(SnapshotError::Inconsistent(
                        "game continued after a correct guess",
                    ));
                }
                match (status, last.is_correct()) {
                    (Status::Won, false) => {
                        return Err(SnapshotError::Inconsistent(
                            "won game does not end with a correct guess",
                        ))
                    }
                    (Status::Lost, true) => {
                        return Err(SnapshotError::Inconsistent(
                            "lost game ends with a correct guess",
                        ))
                    }
                    (Status::Lost, false) if attempts.len() < MAX_ATTEMPTS => {
                        return Err(SnapshotError::Inconsistent(
                            "lost game still has attempts left",
                        ))
                    }
                    _ => (),
                }
                let mut constraints = Constraints::default();
                for attempt in &attempts {
                    constraints.absorb(&attempt.guess, &attempt.verdicts);
                }
                Ok(Game {
                    secret,
                    attempts,
                    status,
                    constraints,
                })
            }
        }
    }
}

/// The persistent form of a [`Game`]
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub(crate) struct GameSnapshot {
    pub(crate) secret: Word,
    pub(crate) attempts: Vec<Attempt>,
    pub(crate) status: Status,
}

#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub(crate) enum SnapshotError {
    #[error("saved game is inconsistent: {0}")]
    Inconsistent(&'static str),
}

/// Returns the congratulatory message for winning in `attempts_used` attempts
pub(crate) fn win_message(attempts_used: usize) -> &'static str {
    match attempts_used {
        1 => "Genius!",
        2 => "Amazing",
        3 => "Great Work",
        4 => "Pretty Good",
        5 => "Close One",
        _ => "Phew.",
    }
}
