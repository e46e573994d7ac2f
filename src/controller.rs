use crate::model::{Game, Status, MAX_ATTEMPTS};
use crate::session::{KeyOutcome, Session};
use crate::view::*;
use rand::Rng;
use std::io;

#[derive(Debug)]
pub(crate) struct Controller<R> {
    session: Session<R>,
}

impl<R: Rng> Controller<R> {
    pub(crate) fn new(session: Session<R>) -> Controller<R> {
        Controller { session }
    }

    pub(crate) fn run(mut self) -> anyhow::Result<()> {
        let message = if self.session.game().attempts().is_empty() {
            Message::Start
        } else {
            outcome_message(self.session.game()).unwrap_or(Message::Resumed)
        };
        let mut screen = Screen::new(io::stdout(), self.content(message))?;
        screen.draw()?;
        while let Some(input) = screen.read_input()? {
            let message = match input {
                Input::Key(key) => match self.session.press(key) {
                    KeyOutcome::Typed | KeyOutcome::Deleted => Message::Blank,
                    KeyOutcome::Ignored => {
                        screen.beep()?;
                        continue;
                    }
                    KeyOutcome::Evaluated(_) => {
                        outcome_message(self.session.game()).unwrap_or(Message::Blank)
                    }
                    KeyOutcome::Rejected(rejection) => {
                        screen.beep()?;
                        Message::Rejected(rejection)
                    }
                    KeyOutcome::NewGame => Message::Start,
                },
                Input::ToggleHardMode => Message::HardMode(self.session.toggle_hard_mode()),
                Input::ToggleTheme => Message::DarkTheme(self.session.toggle_dark_theme()),
            };
            screen.update(self.content(message))?;
        }
        Ok(())
    }

    fn content(&self, message: Message) -> Content {
        let game = self.session.game();
        let settings = self.session.settings();
        let mut rows = game
            .attempts()
            .iter()
            .map(|&attempt| Row::Attempt(attempt))
            .collect::<Vec<_>>();
        if !game.status().is_over() {
            rows.push(Row::Pending(self.session.buffer().to_owned()));
        }
        rows.resize(MAX_ATTEMPTS, Row::Empty);
        let stats = game.status().is_over().then(|| StatsPanel {
            stats: self.session.stats().clone(),
            highlight: (game.status() == Status::Won).then_some(game.attempts().len()),
        });
        Content {
            rows,
            hints: game.letter_hints(),
            message,
            hard_mode: settings.hard_mode,
            theme: Theme::new(settings.dark_theme),
            stats,
        }
    }
}

/// The message announcing the end of `game`, if it is over
fn outcome_message(game: &Game) -> Option<Message> {
    match game.status() {
        Status::InProgress => None,
        Status::Won => Some(Message::Won {
            attempts: game.attempts().len(),
        }),
        Status::Lost => Some(Message::Lost {
            secret: *game.secret(),
        }),
    }
}
