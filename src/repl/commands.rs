use crate::{
    app::{
        accounts, ads,
        chat::Chat,
        link::chat_link,
        records::UserKind,
        NewAd,
    },
    storage::{statement::split_word, Database, KeyValueStore},
    Error, Result,
};

/// Commands that are not part of the database DSL.
///
/// These commands mostly control what the REPL session does
#[derive(Debug, Clone, PartialEq)]
pub enum MetaCommand {
    /// Close the current REPL session
    Exit,
    /// Prints out every table
    Tables,
    /// Drops all data and recreates the default tables
    Reset,
}

impl TryFrom<&str> for MetaCommand {
    type Error = Error;

    fn try_from(input: &str) -> Result<Self> {
        match input {
            ".exit" => Ok(Self::Exit),
            ".tables" => Ok(Self::Tables),
            ".reset" => Ok(Self::Reset),
            _ => Err(Error::InvalidCommand(format!("unknown command `{input}`."))),
        }
    }
}

/// Commands of the ads and chat pages
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    Register {
        email: String,
        password: String,
        kind: UserKind,
        name: String,
    },
    Login {
        email: String,
        password: String,
    },
    Logout,
    Whoami,
    /// Shows the conversation list
    Chat,
    Contacts,
    Open(u64),
    /// Opens the conversation with a registered user
    Talk(u64),
    Send(String),
    Back,
    Ads,
    Publish(NewAd),
    /// Prints where an ad's "Conversar" button leads
    Link(u64),
    /// Follows a `chat.html?conversa=<id>` link
    Goto(String),
}

impl TryFrom<&str> for AppCommand {
    type Error = Error;

    fn try_from(input: &str) -> Result<Self> {
        let (keyword, rest) = split_word(input);
        let args: Vec<&str> = rest.split_whitespace().collect();

        let command = match (keyword, args.as_slice()) {
            ("register", [email, password, kind, name @ ..]) => Self::Register {
                email: email.to_string(),
                password: password.to_string(),
                kind: UserKind::try_from(*kind).map_err(Error::InvalidCommand)?,
                name: name.join(" "),
            },
            ("login", [email, password]) => Self::Login {
                email: email.to_string(),
                password: password.to_string(),
            },
            ("logout", []) => Self::Logout,
            ("whoami", []) => Self::Whoami,
            ("chat", []) => Self::Chat,
            ("contacts", []) => Self::Contacts,
            ("open", [id]) => Self::Open(parse_id(id)?),
            ("talk", [id]) => Self::Talk(parse_id(id)?),
            ("send", [_, ..]) => Self::Send(rest.to_string()),
            ("back", []) => Self::Back,
            ("ads", []) => Self::Ads,
            ("publish", [_, ..]) => Self::Publish(serde_json::from_str(rest)?),
            ("link", [id]) => Self::Link(parse_id(id)?),
            ("goto", [link]) => Self::Goto(link.to_string()),
            _ => return Err(Error::InvalidCommand(format!("unknown command `{input}`."))),
        };

        Ok(command)
    }
}

fn parse_id(input: &str) -> Result<u64> {
    input
        .parse()
        .map_err(|_| Error::InvalidCommand(format!("`{input}` is not an id")))
}

impl AppCommand {
    /// Runs the command, returning the text to print
    pub fn execute<S: KeyValueStore>(&self, db: &mut Database<S>, chat: &mut Option<Chat>) -> Result<String> {
        match self {
            Self::Register {
                email,
                password,
                kind,
                name,
            } => {
                let user = accounts::register(db, email, password, *kind, name)?;
                Ok(format!("registered user {}", user.id))
            }
            Self::Login { email, password } => {
                let session = accounts::login(db, email, password)?;
                *chat = None;
                Ok(format!("logged in as {}", session.email))
            }
            Self::Logout => {
                accounts::logout(db)?;
                *chat = None;
                Ok("logged out".to_string())
            }
            Self::Whoami => Ok(match accounts::current_session(db)? {
                Some(session) => format!(
                    "{} ({}, user {})",
                    session.email, session.tipo, session.usuario_id
                ),
                None => "not logged in".to_string(),
            }),
            Self::Ads => Ok(ads::listings(db)?
                .iter()
                .map(|listing| listing.render_card())
                .collect::<Vec<_>>()
                .join("\n")),
            Self::Publish(new_ad) => {
                let listing = ads::publish(db, new_ad.clone())?;
                Ok(listing.render_card())
            }
            Self::Link(id) => ads::listings(db)?
                .into_iter()
                .find(|listing| listing.ad.id == *id)
                .ok_or_else(|| Error::InvalidCommand(format!("ad {id} not found")))?
                .contact_link(),
            Self::Chat
            | Self::Contacts
            | Self::Open(_)
            | Self::Talk(_)
            | Self::Send(_)
            | Self::Back
            | Self::Goto(_) => {
                let current = match chat.take() {
                    Some(current) => current,
                    None => Chat::start(db)?,
                };
                let chat = chat.insert(current);
                self.drive_chat(db, chat)?;
                chat.render(db)
            }
        }
    }

    fn drive_chat<S: KeyValueStore>(&self, db: &mut Database<S>, chat: &mut Chat) -> Result<()> {
        match self {
            Self::Chat | Self::Back => chat.back(),
            Self::Contacts => chat.show_contacts(),
            Self::Open(id) => {
                chat.open(db, *id)?;
            }
            Self::Talk(id) => {
                chat.talk_to(db, *id)?;
            }
            Self::Send(content) => {
                chat.send(db, content)?;
            }
            Self::Goto(link) => {
                chat.open_link(db, link)?;
            }
            _ => {}
        }
        Ok(())
    }
}

/// The command that auto-opens a conversation, as if following its link
pub fn open_conversation(conversation: u64) -> AppCommand {
    AppCommand::Goto(chat_link(conversation))
}
