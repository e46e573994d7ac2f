use crate::model::{Evaluation, Game, GameSnapshot, Rejection};
use crate::stats::Statistics;
use crate::store::{SavedState, Store};
use crate::words::{WordPool, WORD_LENGTH};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// User preferences, kept independently of any one game
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub(crate) struct Settings {
    /// Require every revealed letter to be used in later guesses
    pub(crate) hard_mode: bool,
    pub(crate) dark_theme: bool,
}

/// A key press from the player
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Key {
    Letter(char),
    Backspace,
    Enter,
}

/// What a [`Session::press()`] did
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum KeyOutcome {
    /// A letter was added to the pending guess
    Typed,
    /// The last letter of the pending guess was removed
    Deleted,
    /// The key had no effect
    Ignored,
    /// The pending guess was accepted and scored
    Evaluated(Evaluation),
    /// The pending guess was refused; it is left in place for editing
    Rejected(Rejection),
    /// The previous game was over, and a new one was started
    NewGame,
}

/// A player's session: the current game plus everything that outlives it.
///
/// Every change to the game, statistics, or settings is written through to
/// the session's [`Store`].  Failures to load or save are logged and
/// otherwise ignored; the in-memory state is always authoritative.  If the
/// stored state could not be loaded, nothing is written back until the
/// player makes a change.
#[derive(Debug)]
pub(crate) struct Session<R> {
    pool: WordPool,
    game: Game,
    stats: Statistics,
    settings: Settings,
    store: Box<dyn Store>,
    rng: R,
    /// The letters typed so far for the next guess
    buffer: String,
}

impl<R: Rng> Session<R> {
    /// Start a session, resuming any game, statistics, and settings saved in
    /// `store`
    pub(crate) fn open(pool: WordPool, mut store: Box<dyn Store>, mut rng: R) -> Session<R> {
        let (saved, loaded) = match store.load() {
            Ok(saved) => (saved.unwrap_or_default(), true),
            Err(e) => {
                log::warn!("{:#}; starting from scratch", anyhow::Error::new(e));
                (SavedState::default(), false)
            }
        };
        let SavedState {
            game,
            stats,
            settings,
        } = saved;
        let game = game
            .and_then(|snapshot| resume(snapshot, &pool))
            .unwrap_or_else(|| start_game(&pool, &mut rng));
        let mut session = Session {
            pool,
            game,
            stats,
            settings,
            store,
            rng,
            buffer: String::with_capacity(WORD_LENGTH),
        };
        if loaded {
            session.save();
        }
        session
    }

    pub(crate) fn press(&mut self, key: Key) -> KeyOutcome {
        match key {
            Key::Letter(ch) => {
                if self.game.status().is_over()
                    || !ch.is_ascii_alphabetic()
                    || self.buffer.len() >= WORD_LENGTH
                {
                    KeyOutcome::Ignored
                } else {
                    self.buffer.push(ch.to_ascii_lowercase());
                    KeyOutcome::Typed
                }
            }
            Key::Backspace => {
                if self.buffer.pop().is_some() {
                    KeyOutcome::Deleted
                } else {
                    KeyOutcome::Ignored
                }
            }
            Key::Enter if self.game.status().is_over() => {
                self.new_game();
                KeyOutcome::NewGame
            }
            Key::Enter => {
                let raw = std::mem::take(&mut self.buffer);
                match self.submit_guess(&raw) {
                    Ok(evaluation) => KeyOutcome::Evaluated(evaluation),
                    Err(rejection) => {
                        self.buffer = raw;
                        KeyOutcome::Rejected(rejection)
                    }
                }
            }
        }
    }

    /// Submit a complete guess to the current game, honoring the hard mode
    /// setting
    pub(crate) fn submit_guess(&mut self, raw: &str) -> Result<Evaluation, Rejection> {
        let evaluation = self.game.submit_guess(
            raw,
            &self.pool,
            self.settings.hard_mode,
            &mut self.stats,
        )?;
        self.save();
        Ok(evaluation)
    }

    /// Discard the current game and start a new one with a fresh secret
    pub(crate) fn new_game(&mut self) {
        self.game = start_game(&self.pool, &mut self.rng);
        self.buffer.clear();
        self.save();
    }

    /// Returns the new setting
    pub(crate) fn toggle_hard_mode(&mut self) -> bool {
        self.set_hard_mode(!self.settings.hard_mode);
        self.settings.hard_mode
    }

    pub(crate) fn set_hard_mode(&mut self, on: bool) {
        if self.settings.hard_mode != on {
            log::info!("Hard mode {}", if on { "enabled" } else { "disabled" });
            self.settings.hard_mode = on;
            self.save();
        }
    }

    /// Returns the new setting
    pub(crate) fn toggle_dark_theme(&mut self) -> bool {
        self.settings.dark_theme = !self.settings.dark_theme;
        self.save();
        self.settings.dark_theme
    }

    pub(crate) fn game(&self) -> &Game {
        &self.game
    }

    pub(crate) fn stats(&self) -> &Statistics {
        &self.stats
    }

    pub(crate) fn settings(&self) -> Settings {
        self.settings
    }

    pub(crate) fn buffer(&self) -> &str {
        &self.buffer
    }

    fn save(&mut self) {
        let state = SavedState {
            game: Some(self.game.snapshot()),
            stats: self.stats.clone(),
            settings: self.settings,
        };
        if let Err(e) = self.store.save(&state) {
            log::warn!("{:#}", anyhow::Error::new(e));
        }
    }
}

fn start_game<R: Rng + ?Sized>(pool: &WordPool, rng: &mut R) -> Game {
    let secret = pool.pick_secret(rng);
    log::info!("Starting new game");
    log::debug!("Secret word: {secret}");
    Game::new(secret)
}

fn resume(snapshot: GameSnapshot, pool: &WordPool) -> Option<Game> {
    if !pool.has_secret(&snapshot.secret) {
        log::info!("Discarding saved game, as its secret is not in the current word list");
        return None;
    }
    match Game::from_snapshot(snapshot) {
        Ok(game) => {
            log::info!(
                "Resuming saved game ({:?}, {} attempts made)",
                game.status(),
                game.attempts().len()
            );
            Some(game)
        }
        Err(e) => {
            log::warn!("Discarding saved game: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Attempt, Status, Verdict};
    use crate::store::{FileStore, MemoryStore, StoreError};
    use crate::words::Word;
    use pretty_assertions::assert_eq;
    use rand::{rngs::StdRng, SeedableRng};
    use std::cell::RefCell;
    use std::fs;
    use std::io;
    use std::rc::Rc;

    /// A store whose contents remain inspectable after being handed to a
    /// session
    #[derive(Clone, Debug, Default)]
    struct SharedStore(Rc<RefCell<Option<SavedState>>>);

    impl SharedStore {
        fn with_state(state: SavedState) -> SharedStore {
            SharedStore(Rc::new(RefCell::new(Some(state))))
        }

        fn get(&self) -> SavedState {
            self.0.borrow().clone().unwrap()
        }
    }

    impl Store for SharedStore {
        fn load(&mut self) -> Result<Option<SavedState>, StoreError> {
            Ok(self.0.borrow().clone())
        }

        fn save(&mut self, state: &SavedState) -> Result<(), StoreError> {
            *self.0.borrow_mut() = Some(state.clone());
            Ok(())
        }
    }

    #[derive(Clone, Copy, Debug)]
    struct BrokenStore;

    impl Store for BrokenStore {
        fn load(&mut self) -> Result<Option<SavedState>, StoreError> {
            Err(StoreError::Read {
                path: "state.json".into(),
                source: io::Error::other("disk on fire"),
            })
        }

        fn save(&mut self, _state: &SavedState) -> Result<(), StoreError> {
            Err(StoreError::Write {
                path: "state.json".into(),
                source: io::Error::other("disk on fire"),
            })
        }
    }

    fn word(s: &str) -> Word {
        s.parse().unwrap()
    }

    fn pool() -> WordPool {
        WordPool::new(
            [word("crane")],
            ["trace", "slate", "bloom", "puffy", "nymph", "goofy", "dumpy"].map(word),
        )
        .unwrap()
    }

    fn open(store: Box<dyn Store>) -> Session<StdRng> {
        Session::open(pool(), store, StdRng::seed_from_u64(0x10AD))
    }

    fn type_word<R: Rng>(session: &mut Session<R>, word: &str) -> KeyOutcome {
        for ch in word.chars() {
            session.press(Key::Letter(ch));
        }
        session.press(Key::Enter)
    }

    #[test]
    fn test_fresh_session() {
        let store = SharedStore::default();
        let session = open(Box::new(store.clone()));
        assert_eq!(session.game().secret(), &word("crane"));
        assert_eq!(session.game().status(), Status::InProgress);
        assert_eq!(session.stats(), &Statistics::default());
        assert_eq!(session.settings(), Settings::default());
        // The new game is saved immediately
        let saved = store.get();
        assert_eq!(saved.game, Some(session.game().snapshot()));
    }

    #[test]
    fn test_typing() {
        let mut session = open(Box::<MemoryStore>::default());
        assert_eq!(session.press(Key::Backspace), KeyOutcome::Ignored);
        for ch in ['T', 'r', 'a', 'c', 'e'] {
            assert_eq!(session.press(Key::Letter(ch)), KeyOutcome::Typed);
        }
        assert_eq!(session.press(Key::Letter('s')), KeyOutcome::Ignored);
        assert_eq!(session.buffer(), "trace");
        assert_eq!(session.press(Key::Backspace), KeyOutcome::Deleted);
        assert_eq!(session.press(Key::Letter('1')), KeyOutcome::Ignored);
        assert_eq!(session.press(Key::Letter('é')), KeyOutcome::Ignored);
        assert_eq!(session.buffer(), "trac");
    }

    #[test]
    fn test_rejection_keeps_buffer() {
        let mut session = open(Box::<MemoryStore>::default());
        assert_eq!(
            type_word(&mut session, "cran"),
            KeyOutcome::Rejected(Rejection::TooShort)
        );
        assert_eq!(session.buffer(), "cran");
        session.press(Key::Backspace);
        assert_eq!(
            type_word(&mut session, "xyz"),
            KeyOutcome::Rejected(Rejection::NotAWord)
        );
        assert_eq!(session.buffer(), "craxy");
        assert!(session.game().attempts().is_empty());
    }

    #[test]
    fn test_play_and_win() {
        let store = SharedStore::default();
        let mut session = open(Box::new(store.clone()));
        let KeyOutcome::Evaluated(ev) = type_word(&mut session, "trace") else {
            panic!("guess should have been evaluated");
        };
        assert_eq!(
            ev.verdicts,
            [
                Verdict::Absent,
                Verdict::Exact,
                Verdict::Exact,
                Verdict::Present,
                Verdict::Exact
            ]
        );
        assert_eq!(session.buffer(), "");
        assert_eq!(store.get().game.unwrap().attempts.len(), 1);
        let KeyOutcome::Evaluated(ev) = type_word(&mut session, "crane") else {
            panic!("guess should have been evaluated");
        };
        assert_eq!(ev.status, Status::Won);
        assert_eq!(ev.attempts_used, 2);
        assert_eq!(session.stats().games_won(), 1);
        assert_eq!(store.get().stats.guess_histogram(), &[0, 1, 0, 0, 0, 0]);
        assert_eq!(store.get().game.unwrap().status, Status::Won);
        // No more typing once the game is over
        assert_eq!(session.press(Key::Letter('a')), KeyOutcome::Ignored);
        assert_eq!(session.press(Key::Enter), KeyOutcome::NewGame);
        assert_eq!(session.game().status(), Status::InProgress);
        assert!(session.game().attempts().is_empty());
        assert_eq!(session.stats().games_played(), 1);
    }

    #[test]
    fn test_loss_recorded_once() {
        let mut session = open(Box::<MemoryStore>::default());
        for raw in ["bloom", "puffy", "nymph", "goofy", "dumpy", "slate"] {
            session.submit_guess(raw).unwrap();
        }
        assert_eq!(session.game().status(), Status::Lost);
        assert_eq!(session.submit_guess("crane"), Err(Rejection::GameOver));
        assert_eq!(session.stats().games_played(), 1);
        assert_eq!(session.stats().games_won(), 0);
        assert_eq!(session.stats().current_streak(), 0);
    }

    #[test]
    fn test_resume_in_progress() {
        let mut stats = Statistics::default();
        stats.record_outcome(true, 4);
        let state = SavedState {
            game: Some(GameSnapshot {
                secret: word("crane"),
                attempts: vec![Attempt {
                    guess: word("trace"),
                    // Recomputed on resume
                    verdicts: [Verdict::Absent; WORD_LENGTH],
                }],
                status: Status::InProgress,
            }),
            stats: stats.clone(),
            settings: Settings {
                hard_mode: true,
                dark_theme: true,
            },
        };
        let store = SharedStore::with_state(state);
        let mut session = open(Box::new(store.clone()));
        assert_eq!(session.stats(), &stats);
        assert!(session.settings().hard_mode);
        assert_eq!(session.game().attempts().len(), 1);
        assert_eq!(session.game().attempts()[0].verdicts[1], Verdict::Exact);
        assert_eq!(session.game().letter_hints().get(&'t'), Some(&Verdict::Absent));
        // Hard mode constraints were rebuilt too
        assert_eq!(
            session.submit_guess("bloom"),
            Err(Rejection::MissingHardModeLetter('a'))
        );
        assert_eq!(store.get().stats, stats);
    }

    #[test]
    fn test_resume_finished() {
        let state = SavedState {
            game: Some(GameSnapshot {
                secret: word("crane"),
                attempts: vec![Attempt {
                    guess: word("crane"),
                    verdicts: [Verdict::Exact; WORD_LENGTH],
                }],
                status: Status::Won,
            }),
            ..SavedState::default()
        };
        let mut session = open(Box::new(SharedStore::with_state(state)));
        assert_eq!(session.game().status(), Status::Won);
        // Restoring a finished game does not count it again
        assert_eq!(session.stats().games_played(), 0);
        assert_eq!(session.press(Key::Enter), KeyOutcome::NewGame);
        assert_eq!(session.game().status(), Status::InProgress);
    }

    #[test]
    fn test_discard_unknown_secret() {
        let state = SavedState {
            game: Some(GameSnapshot {
                secret: word("zebra"),
                attempts: Vec::new(),
                status: Status::InProgress,
            }),
            ..SavedState::default()
        };
        let session = open(Box::new(SharedStore::with_state(state)));
        assert_eq!(session.game().secret(), &word("crane"));
    }

    #[test]
    fn test_discard_inconsistent_snapshot() {
        let state = SavedState {
            game: Some(GameSnapshot {
                secret: word("crane"),
                attempts: vec![Attempt {
                    guess: word("crane"),
                    verdicts: [Verdict::Exact; WORD_LENGTH],
                }],
                status: Status::InProgress,
            }),
            ..SavedState::default()
        };
        let session = open(Box::new(SharedStore::with_state(state)));
        assert_eq!(session.game().status(), Status::InProgress);
        assert!(session.game().attempts().is_empty());
        assert_eq!(session.stats().games_played(), 0);
    }

    #[test]
    fn test_settings_write_through() {
        let store = SharedStore::default();
        let mut session = open(Box::new(store.clone()));
        assert!(session.toggle_hard_mode());
        assert!(store.get().settings.hard_mode);
        assert!(session.toggle_dark_theme());
        assert!(store.get().settings.dark_theme);
        session.submit_guess("trace").unwrap();
        assert_eq!(
            session.submit_guess("bloom"),
            Err(Rejection::MissingHardModeLetter('a'))
        );
        assert!(!session.toggle_hard_mode());
        assert!(!store.get().settings.hard_mode);
        assert!(session.submit_guess("bloom").is_ok());
    }

    #[test]
    fn test_broken_store() {
        let mut session = open(Box::new(BrokenStore));
        assert_eq!(session.game().status(), Status::InProgress);
        assert!(session.toggle_hard_mode());
        let KeyOutcome::Evaluated(ev) = type_word(&mut session, "crane") else {
            panic!("guess should have been evaluated");
        };
        assert_eq!(ev.status, Status::Won);
        assert_eq!(session.stats().games_won(), 1);
    }

    #[test]
    fn test_unreadable_game_keeps_stats_and_settings() {
        let tmpdir = tempfile::tempdir().unwrap();
        let path = tmpdir.path().join("state.json");
        fs::write(
            &path,
            r#"{
                "game": {
                    "secret": "crane",
                    "attempts": [{
                        "guess": "trace",
                        "verdicts": ["bogus", "exact", "exact", "present", "exact"]
                    }],
                    "status": "in_progress"
                },
                "stats": {
                    "games_played": 40,
                    "games_won": 30,
                    "current_streak": 2,
                    "max_streak": 9,
                    "guess_histogram": [1, 5, 10, 8, 4, 2]
                },
                "settings": {"hard_mode": true, "dark_theme": false}
            }"#,
        )
        .unwrap();
        let session = open(Box::new(FileStore::new(path.clone())));
        assert_eq!(session.stats().games_played(), 40);
        assert_eq!(session.stats().max_streak(), 9);
        assert!(session.settings().hard_mode);
        assert!(session.game().attempts().is_empty());
        let saved = FileStore::new(path).load().unwrap().unwrap();
        assert_eq!(&saved.stats, session.stats());
        assert!(saved.settings.hard_mode);
        assert_eq!(saved.game, Some(session.game().snapshot()));
    }

    #[test]
    fn test_unreadable_state_file_left_alone() {
        let tmpdir = tempfile::tempdir().unwrap();
        let path = tmpdir.path().join("state.json");
        let garbage = r#"{"stats": {"games_played": 40"#;
        fs::write(&path, garbage).unwrap();
        let mut session = open(Box::new(FileStore::new(path.clone())));
        assert_eq!(session.stats().games_played(), 0);
        assert_eq!(fs::read_to_string(&path).unwrap(), garbage);
        // A change by the player is saved as usual
        session.toggle_dark_theme();
        let saved = FileStore::new(path).load().unwrap().unwrap();
        assert!(saved.settings.dark_theme);
    }
}
