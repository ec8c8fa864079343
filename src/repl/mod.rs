pub mod commands;

pub use commands::{AppCommand, MetaCommand};

use std::{
    error::Error,
    io::{BufRead, Write},
};

use log::debug;

use crate::{
    app::Chat,
    storage::{Database, KeyValueStore, Statement},
};

/// A parsed line of REPL input
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Meta(MetaCommand),
    Statement(Statement),
    App(AppCommand),
}

impl TryFrom<&str> for Command {
    type Error = crate::Error;

    fn try_from(input: &str) -> crate::Result<Self> {
        if input.starts_with('.') {
            return MetaCommand::try_from(input).map(Self::Meta);
        }

        let keyword = input.split_whitespace().next().unwrap_or_default();
        if Statement::KEYWORDS.contains(&keyword) {
            Statement::try_from(input).map(Self::Statement)
        } else {
            AppCommand::try_from(input).map(Self::App)
        }
    }
}

/// What the REPL does after a command
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Print(String),
    Exit,
}

/// A REPL session over an open database
pub struct Repl<S: KeyValueStore> {
    name: String,
    db: Database<S>,
    chat: Option<Chat>,
}

impl<S: KeyValueStore> Repl<S> {
    pub fn new(name: String, db: Database<S>) -> Self {
        Self {
            name,
            db,
            chat: None,
        }
    }

    pub fn database(&self) -> &Database<S> {
        &self.db
    }

    pub fn execute(&mut self, command: &Command) -> Result<Outcome, Box<dyn Error>> {
        debug!("executing {command:?}");

        let output = match command {
            Command::Meta(MetaCommand::Exit) => return Ok(Outcome::Exit),
            Command::Meta(MetaCommand::Tables) => serde_json::to_string_pretty(&self.db.tables()?)?,
            Command::Meta(MetaCommand::Reset) => {
                self.db.reset()?;
                self.chat = None;
                "database reset".to_string()
            }
            Command::Statement(statement) => statement.execute(&mut self.db)?,
            Command::App(command) => command.execute(&mut self.db, &mut self.chat)?,
        };

        Ok(Outcome::Print(output))
    }

    /// Parses and executes one line of input
    pub fn handle(&mut self, input: &str) -> Result<Outcome, Box<dyn Error>> {
        let command = Command::try_from(input)?;
        self.execute(&command)
    }

    /// Reads commands until `.exit` or the end of input
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut out: W) -> std::io::Result<()> {
        let mut lines = input.lines();

        loop {
            write!(out, "{} > ", self.name)?;
            out.flush()?;

            let Some(line) = lines.next() else {
                writeln!(out)?;
                return Ok(());
            };
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match self.handle(line) {
                Ok(Outcome::Exit) => return Ok(()),
                Ok(Outcome::Print(text)) => {
                    if !text.is_empty() {
                        writeln!(out, "{text}")?;
                    }
                }
                Err(e) => writeln!(out, "error: {e}")?,
            }
        }
    }
}

/// Starts a database REPL session on stdin/stdout, optionally opening a
/// conversation first
pub fn start_repl<S: KeyValueStore>(
    name: String,
    db: Database<S>,
    conversation: Option<u64>,
) -> std::io::Result<()> {
    let mut repl = Repl::new(name, db);
    let stdout = std::io::stdout();

    if let Some(id) = conversation {
        let command = Command::App(commands::open_conversation(id));
        match repl.execute(&command) {
            Ok(Outcome::Print(text)) => println!("{text}"),
            Ok(Outcome::Exit) => return Ok(()),
            Err(e) => println!("error: {e}"),
        }
    }

    repl.run(std::io::stdin().lock(), stdout.lock())
}
