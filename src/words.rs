use anyhow::Context;
use patharg::InputArg;
use rand::{seq::IndexedRandom, Rng};
use serde::{
    de::{Deserializer, Unexpected, Visitor},
    Deserialize, Serialize, Serializer,
};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use thiserror::Error;

/// Number of letters in every secret and guess
pub(crate) const WORD_LENGTH: usize = 5;

static ANSWERS: &[u8] = include_bytes!("answers.csv");
static GUESSES: &[u8] = include_bytes!("guesses.csv");

/// A five-letter word, normalized to lowercase ASCII
#[derive(Clone, Copy, Eq, Debug, Hash, Ord, PartialEq, PartialOrd)]
pub(crate) struct Word([u8; WORD_LENGTH]);

impl Word {
    /// Returns the letters of the word in order
    pub(crate) fn letters(&self) -> [char; WORD_LENGTH] {
        self.0.map(char::from)
    }

    pub(crate) fn as_bytes(&self) -> &[u8; WORD_LENGTH] {
        &self.0
    }

    /// Returns true iff the (lowercase) letter `ch` occurs anywhere in the word
    pub(crate) fn contains(&self, ch: char) -> bool {
        self.letters().contains(&ch)
    }

    /// Returns a multiset of the word's letters as counts indexed by
    /// [`letter_index()`]
    pub(crate) fn letter_counts(&self) -> [u8; 26] {
        let mut counts = [0; 26];
        for &b in &self.0 {
            counts[letter_index(b)] += 1;
        }
        counts
    }
}

/// Maps a lowercase ASCII letter to `0..26`
pub(crate) fn letter_index(b: u8) -> usize {
    usize::from(b - b'a')
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ch in self.letters() {
            write!(f, "{ch}")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Word {
    type Err = ParseWordError;

    fn from_str(s: &str) -> Result<Word, ParseWordError> {
        let s = s.trim();
        let length = s.chars().count();
        if length != WORD_LENGTH {
            return Err(ParseWordError::Length(length));
        }
        if let Some(ch) = s.chars().find(|ch| !ch.is_ascii_alphabetic()) {
            return Err(ParseWordError::NotALetter(ch));
        }
        let mut letters = [0; WORD_LENGTH];
        for (slot, b) in letters.iter_mut().zip(s.bytes()) {
            *slot = b.to_ascii_lowercase();
        }
        Ok(Word(letters))
    }
}

#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub(crate) enum ParseWordError {
    #[error("words must be exactly five letters long, got {0}")]
    Length(usize),
    #[error("words may only contain ASCII letters, got {0:?}")]
    NotALetter(char),
}

impl Serialize for Word {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Word {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct WordVisitor;

        impl Visitor<'_> for WordVisitor {
            type Value = Word;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a word of five ASCII letters")
            }

            fn visit_str<E>(self, input: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                input
                    .parse::<Word>()
                    .map_err(|_| E::invalid_value(Unexpected::Str(input), &self))
            }
        }

        deserializer.deserialize_str(WordVisitor)
    }
}

/// Where to read a word list from
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) enum WordList {
    #[default]
    Builtin,
    File(InputArg),
}

impl WordList {
    /// Read the words in the list, falling back to `builtin` for
    /// [`WordList::Builtin`]
    fn load(self, builtin: &'static [u8]) -> anyhow::Result<Vec<Word>> {
        match self {
            WordList::Builtin => {
                read_words(builtin).context("failed to read builtin word list")
            }
            WordList::File(infile) => {
                let reader = infile
                    .open()
                    .with_context(|| format!("failed to open words file {infile}"))?;
                read_words(reader).with_context(|| format!("failed to read words file {infile}"))
            }
        }
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
struct WordRecord {
    word: Word,
}

fn read_words<R: std::io::Read>(reader: R) -> Result<Vec<Word>, csv::Error> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(false)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(reader)
        .into_deserialize::<WordRecord>()
        .map(|r| r.map(|rec| rec.word))
        .collect()
}

/// The words a game may use: the secret-eligible answers, plus the (larger)
/// set of words accepted as guesses.  The accepted set always includes every
/// answer.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct WordPool {
    /// Sorted & deduplicated; never empty
    secrets: Vec<Word>,
    accepted: HashSet<Word>,
}

impl WordPool {
    pub(crate) fn new<I, J>(secrets: I, guesses: J) -> Result<WordPool, WordPoolError>
    where
        I: IntoIterator<Item = Word>,
        J: IntoIterator<Item = Word>,
    {
        let secrets = secrets.into_iter().collect::<BTreeSet<_>>();
        if secrets.is_empty() {
            return Err(WordPoolError::NoSecrets);
        }
        let mut accepted = guesses.into_iter().collect::<HashSet<_>>();
        accepted.extend(secrets.iter().copied());
        Ok(WordPool {
            secrets: secrets.into_iter().collect(),
            accepted,
        })
    }

    /// Build a pool from the given answer and guess lists
    pub(crate) fn load(answers: WordList, guesses: WordList) -> anyhow::Result<WordPool> {
        let secrets = answers.load(ANSWERS)?;
        let guesses = guesses.load(GUESSES)?;
        let pool = WordPool::new(secrets, guesses)?;
        log::debug!(
            "Loaded {} secret words and {} accepted guesses",
            pool.secrets.len(),
            pool.accepted.len()
        );
        Ok(pool)
    }

    /// Restrict the secrets to just `word`, which also becomes an accepted
    /// guess
    pub(crate) fn with_secret(mut self, word: Word) -> WordPool {
        self.secrets = vec![word];
        self.accepted.insert(word);
        self
    }

    pub(crate) fn is_valid_secret(&self, word: &str) -> bool {
        word.parse::<Word>().is_ok_and(|w| self.has_secret(&w))
    }

    pub(crate) fn is_accepted_guess(&self, word: &str) -> bool {
        word.parse::<Word>().is_ok_and(|w| self.accepts(&w))
    }

    pub(crate) fn has_secret(&self, word: &Word) -> bool {
        self.secrets.binary_search(word).is_ok()
    }

    pub(crate) fn accepts(&self, word: &Word) -> bool {
        self.accepted.contains(word)
    }

    /// Select a secret word uniformly at random
    pub(crate) fn pick_secret<R: Rng + ?Sized>(&self, rng: &mut R) -> Word {
        *self
            .secrets
            .choose(rng)
            .expect("word pool should always contain at least one secret")
    }
}

#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub(crate) enum WordPoolError {
    #[error("no secret words were supplied")]
    NoSecrets,
}
