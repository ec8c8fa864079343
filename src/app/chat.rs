use log::{debug, error};
use serde_json::{json, Value};

use super::{
    accounts::contacts_of,
    clock_time, decode_rows,
    link::conversation_from_link,
    records::{Conversation, Message, User, CONVERSATIONS, MESSAGES, USERS},
    session::Session,
    today,
};
use crate::{
    storage::{
        table::{from_row, to_row},
        Database, Filter, KeyValueStore, Row,
    },
    Error, Result,
};

/// How the logged in user is named on their own side of a conversation
pub const SELF_NAME: &str = "Você";

/// Contacts the demo conversations are seeded with
const DEMO_CONTACTS: [(u64, &str); 3] = [
    (2, "pintor"),
    (3, "empresa de fretado"),
    (4, "faxineiro"),
];

/// What the chat page is currently showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatView {
    Conversations,
    Contacts,
    Conversation(u64),
}

/// A conversation as listed for the viewer
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationSummary {
    pub id: u64,
    pub title: String,
    pub last_message: String,
    pub last_message_date: String,
    pub unread: u64,
}

/// Chat controller of the logged in user
#[derive(Debug, Clone)]
pub struct Chat {
    session: Session,
    view: ChatView,
}

impl Chat {
    /// Opens the chat for the session user, seeding demo conversations into
    /// an empty database
    pub fn start<S: KeyValueStore>(db: &mut Database<S>) -> Result<Self> {
        let Some(session) = Session::load(db.store())? else {
            error!("chat opened without a session");
            return Err(Error::NotLoggedIn);
        };

        let chat = Self {
            session,
            view: ChatView::Conversations,
        };
        chat.seed_demo_conversations(db)?;

        Ok(chat)
    }

    pub fn view(&self) -> ChatView {
        self.view
    }

    fn user(&self) -> u64 {
        self.session.usuario_id
    }

    fn seed_demo_conversations<S: KeyValueStore>(&self, db: &mut Database<S>) -> Result<()> {
        if db.count(CONVERSATIONS, &Filter::new())? > 0 {
            return Ok(());
        }
        debug!("seeding demo conversations for user {}", self.user());

        for (contact, name) in DEMO_CONTACTS {
            let conversation = Conversation {
                id: 0,
                user1: self.user(),
                user2: contact,
                name1: SELF_NAME.to_string(),
                name2: name.to_string(),
                last_message: "Clique para abrir conversa...".to_string(),
                last_message_date: today(),
                unread1: 1,
                unread2: 0,
            };
            let conversation: Conversation = from_row(db.insert(CONVERSATIONS, to_row(&conversation)?)?)?;

            let greetings = [
                (contact, name, "Olá! Posso ajudar?"),
                (self.user(), SELF_NAME, "Sim, obrigado!"),
            ];
            for (sender, sender_name, content) in greetings {
                let message = Message {
                    id: 0,
                    conversation: conversation.id,
                    sender,
                    sender_name: sender_name.to_string(),
                    content: content.to_string(),
                    read: sender == self.user(),
                    date: today(),
                    time: clock_time(),
                };
                db.insert(MESSAGES, to_row(&message)?)?;
            }
        }

        Ok(())
    }

    /// Conversations the user takes part in, in creation order
    pub fn conversations<S: KeyValueStore>(&self, db: &Database<S>) -> Result<Vec<ConversationSummary>> {
        let mut summaries = Vec::new();

        let rows = db.select(CONVERSATIONS, &Filter::new())?;
        for conversation in decode_rows::<Conversation>(CONVERSATIONS, rows) {
            if !conversation.involves(self.user()) {
                continue;
            }

            summaries.push(ConversationSummary {
                id: conversation.id,
                title: conversation.title_for(self.user()).to_string(),
                unread: conversation.unread_for(self.user()),
                last_message: conversation.last_message,
                last_message_date: conversation.last_message_date,
            });
        }

        Ok(summaries)
    }

    pub fn contacts<S: KeyValueStore>(&self, db: &Database<S>) -> Result<Vec<User>> {
        contacts_of(db, self.user())
    }

    fn conversation<S: KeyValueStore>(&self, db: &Database<S>, id: u64) -> Result<Conversation> {
        let row = db.select_one(CONVERSATIONS, &Filter::new().eq("id", id))?;
        match row.map(from_row::<Conversation>).transpose()? {
            Some(conversation) if conversation.involves(self.user()) => Ok(conversation),
            _ => {
                error!("conversation {id} not found for user {}", self.user());
                Err(Error::ConversationNotFound(id))
            }
        }
    }

    /// Messages of a conversation, in the order they were sent
    pub fn messages<S: KeyValueStore>(&self, db: &Database<S>, id: u64) -> Result<Vec<Message>> {
        let rows = db.select(MESSAGES, &Filter::new().eq("conversaId", id))?;
        Ok(decode_rows(MESSAGES, rows))
    }

    /// Shows a conversation and marks it as read for the user
    pub fn open<S: KeyValueStore>(&mut self, db: &mut Database<S>, id: u64) -> Result<Vec<Message>> {
        let conversation = self.conversation(db, id)?;
        self.view = ChatView::Conversation(id);

        self.mark_read(db, &conversation)?;
        self.messages(db, id)
    }

    /// Opens the conversation named by a `?conversa=<id>` link
    pub fn open_link<S: KeyValueStore>(&mut self, db: &mut Database<S>, link: &str) -> Result<Vec<Message>> {
        let id = conversation_from_link(link)
            .ok_or_else(|| Error::InvalidCommand(format!("no conversation in `{link}`")))?;
        self.open(db, id)
    }

    /// Opens the conversation with a contact, creating it the first time
    pub fn talk_to<S: KeyValueStore>(&mut self, db: &mut Database<S>, contact: u64) -> Result<Vec<Message>> {
        let user = self.user();
        let existing = db
            .select_one(
                CONVERSATIONS,
                &Filter::new().eq("usuarioId1", user).eq("usuarioId2", contact),
            )?
            .or(db.select_one(
                CONVERSATIONS,
                &Filter::new().eq("usuarioId1", contact).eq("usuarioId2", user),
            )?);

        let id = match existing {
            Some(row) => from_row::<Conversation>(row)?.id,
            None => {
                let other = find_user(db, contact)?.ok_or(Error::UserNotFound(contact))?;
                let me = find_user(db, user)?;
                let conversation = Conversation {
                    id: 0,
                    user1: user,
                    user2: contact,
                    name1: me.map_or(self.session.email.clone(), |me| me.display_name().to_string()),
                    name2: other.display_name().to_string(),
                    last_message: String::new(),
                    last_message_date: today(),
                    unread1: 0,
                    unread2: 0,
                };
                from_row::<Conversation>(db.insert(CONVERSATIONS, to_row(&conversation)?)?)?.id
            }
        };

        self.open(db, id)
    }

    /// Sends a message on the open conversation. Blank content, or no open
    /// conversation, sends nothing
    pub fn send<S: KeyValueStore>(&mut self, db: &mut Database<S>, content: &str) -> Result<Option<Message>> {
        let content = content.trim();
        let ChatView::Conversation(id) = self.view else {
            return Ok(None);
        };
        if content.is_empty() {
            return Ok(None);
        }
        let conversation = self.conversation(db, id)?;

        let message = Message {
            id: 0,
            conversation: id,
            sender: self.user(),
            sender_name: SELF_NAME.to_string(),
            content: content.to_string(),
            read: false,
            date: today(),
            time: clock_time(),
        };
        let message: Message = from_row(db.insert(MESSAGES, to_row(&message)?)?)?;

        let mut summary = Row::new();
        summary.insert("ultimaMensagem".into(), json!(content));
        summary.insert("dataUltimaMensagem".into(), json!(message.date));
        if let Some((unread_field, unread)) = conversation.recipient_unread(self.user()) {
            summary.insert(unread_field.into(), json!(unread + 1));
        }
        db.update(CONVERSATIONS, &summary, &Filter::new().eq("id", id))?;

        Ok(Some(message))
    }

    fn mark_read<S: KeyValueStore>(&self, db: &mut Database<S>, conversation: &Conversation) -> Result<()> {
        let unread = db.select(
            MESSAGES,
            &Filter::new().eq("conversaId", conversation.id).eq("lida", false),
        )?;

        let mut read = Row::new();
        read.insert("lida".into(), Value::Bool(true));
        for message in decode_rows::<Message>(MESSAGES, unread) {
            if message.sender != self.user() {
                db.update(MESSAGES, &read, &Filter::new().eq("id", message.id))?;
            }
        }

        let mut counter = Row::new();
        counter.insert(conversation.unread_field(self.user()).into(), json!(0));
        db.update(CONVERSATIONS, &counter, &Filter::new().eq("id", conversation.id))?;

        Ok(())
    }

    pub fn show_contacts(&mut self) {
        self.view = ChatView::Contacts;
    }

    /// Leaves the open conversation or the contact list
    pub fn back(&mut self) {
        self.view = ChatView::Conversations;
    }

    pub fn render<S: KeyValueStore>(&self, db: &Database<S>) -> Result<String> {
        match self.view {
            ChatView::Conversations => self.render_conversations(db),
            ChatView::Contacts => self.render_contacts(db),
            ChatView::Conversation(id) => self.render_conversation(db, id),
        }
    }

    fn render_conversations<S: KeyValueStore>(&self, db: &Database<S>) -> Result<String> {
        let mut out = String::from("Conversas");

        for summary in self.conversations(db)? {
            let badge = match summary.unread {
                0 => String::new(),
                n => format!(" ({n})"),
            };
            out.push_str(&format!(
                "\n  [{}] {}{}\n      {}  {}",
                summary.id, summary.title, badge, summary.last_message, summary.last_message_date
            ));
        }

        Ok(out)
    }

    fn render_contacts<S: KeyValueStore>(&self, db: &Database<S>) -> Result<String> {
        let mut out = String::from("Contatos");

        for contact in self.contacts(db)? {
            out.push_str(&format!(
                "\n  [{}] {} ({})",
                contact.id,
                contact.display_name(),
                contact.kind
            ));
        }

        Ok(out)
    }

    fn render_conversation<S: KeyValueStore>(&self, db: &Database<S>, id: u64) -> Result<String> {
        let conversation = self.conversation(db, id)?;
        let mut out = format!("== {} ==", conversation.title_for(self.user()));

        for message in self.messages(db, id)? {
            let indent = if message.sender == self.user() { "        " } else { "" };
            out.push_str(&format!("\n{indent}{} [{}]", message.content, message.time));
        }

        Ok(out)
    }
}

fn find_user<S: KeyValueStore>(db: &Database<S>, id: u64) -> Result<Option<User>> {
    db.select_one(USERS, &Filter::new().eq("id", id))?
        .map(from_row)
        .transpose()
}
