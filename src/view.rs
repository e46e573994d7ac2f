use crate::model::{win_message, Attempt, Rejection, Verdict, MAX_ATTEMPTS};
use crate::session::Key;
use crate::stats::Statistics;
use crate::words::{Word, WORD_LENGTH};
use console::{measure_text_width, truncate_str};
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{read, KeyCode, KeyEvent, KeyModifiers},
    queue,
    style::Print,
    terminal::{
        disable_raw_mode, enable_raw_mode, size, Clear, ClearType, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
    ExecutableCommand,
};
use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Write};
use thiserror::Error;

const RESET: &str = "\x1B[m";

static KEYBOARD: [&str; 3] = ["QWERTYUIOP", "ASDFGHJKL", "ZXCVBNM"];

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Screen<W: Write> {
    inner: W,
    columns: u16,
    rows: u16,
    frame: Frame,
}

impl<W: Write> Screen<W> {
    pub(crate) fn new(mut inner: W, content: Content) -> Result<Screen<W>, ScreenError> {
        let (columns, rows) = size().map_err(ScreenError::Init)?;
        inner
            .execute(EnterAlternateScreen)
            .map_err(ScreenError::Init)?;
        if let Err(e) = enable_raw_mode() {
            let _ = inner.execute(LeaveAlternateScreen);
            return Err(ScreenError::Init(e));
        }
        if let Err(e) = inner.execute(Hide) {
            let _ = disable_raw_mode();
            let _ = inner.execute(LeaveAlternateScreen);
            return Err(ScreenError::Init(e));
        }
        Ok(Screen {
            inner,
            columns,
            rows,
            frame: content.render(),
        })
    }

    /// Wait for the next meaningful key press.  Returns `None` if the user
    /// asked to quit.
    pub(crate) fn read_input(&mut self) -> Result<Option<Input>, ScreenError> {
        let normal_modifiers = KeyModifiers::NONE | KeyModifiers::SHIFT;
        loop {
            let event = read().map_err(ScreenError::Read)?;
            if let Some(KeyEvent {
                code, modifiers, ..
            }) = event.as_key_press_event()
            {
                if code == KeyCode::Esc
                    || (modifiers, code) == (KeyModifiers::CONTROL, KeyCode::Char('c'))
                {
                    return Ok(None);
                }
                if normal_modifiers.contains(modifiers) {
                    match code {
                        KeyCode::Char(ch) if ch.is_ascii_alphabetic() => {
                            return Ok(Some(Input::Key(Key::Letter(ch))))
                        }
                        KeyCode::Enter => return Ok(Some(Input::Key(Key::Enter))),
                        KeyCode::Backspace => return Ok(Some(Input::Key(Key::Backspace))),
                        KeyCode::F(2) => return Ok(Some(Input::ToggleHardMode)),
                        KeyCode::F(3) => return Ok(Some(Input::ToggleTheme)),
                        _ => (),
                    }
                }
                self.beep()?;
            } else if let Some((columns, rows)) = event.as_resize_event() {
                self.columns = columns;
                self.rows = rows;
                self.draw()?;
            }
        }
    }

    pub(crate) fn update(&mut self, content: Content) -> Result<(), ScreenError> {
        self.frame = content.render();
        self.draw()?;
        Ok(())
    }

    pub(crate) fn draw(&mut self) -> Result<(), ScreenError> {
        queue!(self.inner, Clear(ClearType::All)).map_err(ScreenError::Write)?;
        for (y, x, ln) in self.frame.lines_in_area(self.columns, self.rows) {
            queue!(self.inner, MoveTo(x, y), Print(ln)).map_err(ScreenError::Write)?;
        }
        self.inner.flush().map_err(ScreenError::Write)?;
        Ok(())
    }

    pub(crate) fn beep(&mut self) -> Result<(), ScreenError> {
        self.inner
            .execute(Print("\x07"))
            .map_err(ScreenError::Write)?;
        Ok(())
    }
}

impl<W: Write> Drop for Screen<W> {
    fn drop(&mut self) {
        let _ = self.inner.execute(Show);
        let _ = disable_raw_mode();
        let _ = self.inner.execute(LeaveAlternateScreen);
    }
}

#[derive(Debug, Error)]
pub(crate) enum ScreenError {
    #[error("failed to initialize terminal display")]
    Init(#[source] io::Error),
    #[error("failed to read from terminal")]
    Read(#[source] io::Error),
    #[error("failed to write to terminal")]
    Write(#[source] io::Error),
}

/// Input from the player, as read by [`Screen::read_input()`]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Input {
    Key(Key),
    ToggleHardMode,
    ToggleTheme,
}

#[derive(Clone, Debug, Eq, PartialEq)]
struct Frame(Vec<Line>);

impl Frame {
    fn with_capacity(capacity: usize) -> Frame {
        Frame(Vec::with_capacity(capacity))
    }

    fn push(&mut self, line: Line) {
        self.0.push(line);
    }

    fn push_in_width(&mut self, content: String, width: usize) {
        self.push(Line {
            content,
            center_in_width: Some(width),
        });
    }

    fn push_centered(&mut self, content: String) {
        self.push(Line {
            content,
            center_in_width: None,
        });
    }

    fn push_blank(&mut self) {
        self.push_centered(String::new());
    }

    /// Position the frame's lines in a terminal of the given size, yielding
    /// `(row, column, text)` for each.  The frame is centred vertically; if
    /// the terminal is too short, the bottom lines (footer first) are cut.
    fn lines_in_area(
        &self,
        width: u16,
        height: u16,
    ) -> impl Iterator<Item = (u16, u16, String)> + '_ {
        let height = usize::from(height);
        let Ok(top_margin) = u16::try_from(height.saturating_sub(self.0.len()) / 2) else {
            unreachable!("(u16 - int) / 2 should fit in a u16");
        };
        self.0
            .iter()
            .take(height)
            .zip(top_margin..)
            .map(move |(line, y)| {
                let (x, txt) = line.render(width);
                (y, x, txt)
            })
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
struct Line {
    content: String,
    /// If set, the line is left-aligned within a centered block of this width
    center_in_width: Option<usize>,
}

impl Line {
    /// Returns the starting column of the line along with its text, truncated
    /// to `max_width`.  Board rows share one block width so that the tiles of
    /// every row line up even while a guess is only partly typed.
    fn render(&self, max_width: u16) -> (u16, String) {
        let max_width = usize::from(max_width);
        let my_width = self
            .center_in_width
            .unwrap_or_else(|| measure_text_width(&self.content));
        let Ok(left_margin) = u16::try_from(max_width.saturating_sub(my_width) / 2) else {
            unreachable!("(u16 - int) / 2 should fit in a u16");
        };
        (
            left_margin,
            truncate_str(&self.content, max_width, "").into_owned(),
        )
    }
}

/// Color scheme for tiles and keys
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub(crate) enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub(crate) fn new(dark: bool) -> Theme {
        if dark {
            Theme::Dark
        } else {
            Theme::Light
        }
    }

    fn tile_style(self, verdict: Verdict) -> &'static str {
        match (self, verdict) {
            (Theme::Light, Verdict::Exact) => "\x1B[1;97;42m",
            (Theme::Light, Verdict::Present) => "\x1B[1;97;43m",
            (Theme::Light, Verdict::Absent) => "\x1B[1;97;100m",
            (Theme::Dark, Verdict::Exact) => "\x1B[1;30;102m",
            (Theme::Dark, Verdict::Present) => "\x1B[1;30;103m",
            (Theme::Dark, Verdict::Absent) => "\x1B[1;37;40m",
        }
    }

    fn key_style(self, verdict: Verdict) -> &'static str {
        match (self, verdict) {
            (Theme::Light, Verdict::Exact) => "\x1B[1;32m",
            (Theme::Light, Verdict::Present) => "\x1B[1;33m",
            (Theme::Light, Verdict::Absent) => "\x1B[2m",
            (Theme::Dark, Verdict::Exact) => "\x1B[1;92m",
            (Theme::Dark, Verdict::Present) => "\x1B[1;93m",
            (Theme::Dark, Verdict::Absent) => "\x1B[90m",
        }
    }
}

/// One row of the board
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Row {
    Attempt(Attempt),
    /// The guess currently being typed
    Pending(String),
    Empty,
}

impl Row {
    fn render(&self, theme: Theme) -> String {
        let mut tiles = match self {
            Row::Attempt(Attempt { guess, verdicts }) => guess
                .letters()
                .into_iter()
                .zip(verdicts)
                .map(|(ch, &v)| {
                    format!(
                        "{} {} {RESET}",
                        theme.tile_style(v),
                        ch.to_ascii_uppercase()
                    )
                })
                .collect::<Vec<_>>(),
            Row::Pending(typed) => typed
                .chars()
                .map(|ch| format!("[{}]", ch.to_ascii_uppercase()))
                .collect(),
            Row::Empty => Vec::new(),
        };
        tiles.resize(WORD_LENGTH, String::from("[ ]"));
        tiles.join(" ")
    }
}

/// Statistics to show at the end of a game
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct StatsPanel {
    pub(crate) stats: Statistics,
    /// If the game was just won, the number of attempts it took
    pub(crate) highlight: Option<usize>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Content {
    pub(crate) rows: Vec<Row>,
    pub(crate) hints: BTreeMap<char, Verdict>,
    pub(crate) message: Message,
    pub(crate) hard_mode: bool,
    pub(crate) theme: Theme,
    /// Only set once the game is over
    pub(crate) stats: Option<StatsPanel>,
}

impl Content {
    const BOARD_WIDTH: usize = WORD_LENGTH * 4 - 1;
    const HEIGHT: usize = MAX_ATTEMPTS + 19;

    fn render(self) -> Frame {
        let mut frame = Frame::with_capacity(Self::HEIGHT);
        frame.push_centered(String::from(if self.hard_mode {
            "WORDLE (hard mode)"
        } else {
            "WORDLE"
        }));
        frame.push_blank();
        for row in &self.rows {
            frame.push_in_width(row.render(self.theme), Self::BOARD_WIDTH);
        }
        frame.push_blank();
        for keys in KEYBOARD {
            let mut ln = String::new();
            for (i, ch) in keys.chars().enumerate() {
                if i > 0 {
                    ln.push(' ');
                }
                match self.hints.get(&ch.to_ascii_lowercase()) {
                    Some(&v) => {
                        ln.push_str(self.theme.key_style(v));
                        ln.push(ch);
                        ln.push_str(RESET);
                    }
                    None => ln.push(ch),
                }
            }
            frame.push_centered(ln);
        }
        frame.push_blank();
        frame.push_centered(self.message.to_string());
        frame.push_blank();
        let game_over = if let Some(StatsPanel { stats, highlight }) = self.stats {
            let lines = stats_lines(&stats, highlight);
            let width = lines
                .iter()
                .map(|ln| measure_text_width(ln))
                .max()
                .unwrap_or_default();
            for ln in lines {
                frame.push_in_width(ln, width);
            }
            frame.push_blank();
            true
        } else {
            false
        };
        frame.push_centered(String::from(if game_over {
            "Enter: new game   Esc: quit"
        } else {
            "F2: hard mode   F3: theme   Esc: quit"
        }));
        frame
    }
}

/// Render a summary of `stats`, with a histogram of guesses per win.  If
/// `highlight` is set, that row of the histogram is emboldened.
pub(crate) fn stats_lines(stats: &Statistics, highlight: Option<usize>) -> Vec<String> {
    const MAX_BAR: u32 = 10;
    let mut lines = vec![
        format!(
            "Played: {}   Win %: {}",
            stats.games_played(),
            stats.win_percentage()
        ),
        format!(
            "Streak: {}   Max streak: {}",
            stats.current_streak(),
            stats.max_streak()
        ),
        String::new(),
        String::from("Guess distribution"),
    ];
    let histogram = stats.guess_histogram();
    let most = histogram.iter().copied().max().unwrap_or_default();
    for (attempts, &count) in (1..).zip(histogram) {
        let bar_width = if count == 0 {
            0
        } else {
            (count * MAX_BAR / most).max(1)
        };
        let bar = "#".repeat(usize::try_from(bar_width).unwrap_or_default());
        let ln = format!("{attempts} {bar} {count}");
        if highlight == Some(attempts) {
            lines.push(format!("\x1B[1m{ln}{RESET}"));
        } else {
            lines.push(ln);
        }
    }
    lines
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Message {
    Start,
    Resumed,
    Blank,
    Rejected(Rejection),
    Won { attempts: usize },
    Lost { secret: Word },
    HardMode(bool),
    DarkTheme(bool),
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Start => write!(f, "Guess the WORDLE in six tries."),
            Message::Resumed => write!(f, "Welcome back!"),
            Message::Blank => Ok(()),
            Message::Rejected(r) => write!(f, "{r}"),
            Message::Won { attempts } => write!(f, "{}", win_message(*attempts)),
            Message::Lost { secret } => {
                write!(f, "The word was {}", secret.to_string().to_ascii_uppercase())
            }
            Message::HardMode(true) => write!(f, "Hard mode on"),
            Message::HardMode(false) => write!(f, "Hard mode off"),
            Message::DarkTheme(true) => write!(f, "Dark theme"),
            Message::DarkTheme(false) => write!(f, "Light theme"),
        }
    }
}
