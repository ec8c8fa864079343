//! Typed views of the rows stored in the default tables
//!
//! Field names on disk are kept as the application has always written them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::storage::{FieldDef, FieldType, TableDef};

pub const USERS: &str = "usuarios";
pub const ADS: &str = "anuncios";
pub const CONVERSATIONS: &str = "conversas";
pub const MESSAGES: &str = "mensagens";

/// Tables every database starts with
pub fn catalog() -> Vec<TableDef> {
    vec![
        TableDef::new(
            USERS,
            vec![
                FieldDef::new("id", FieldType::Number).primary(),
                FieldDef::new("email", FieldType::String).unique(),
                FieldDef::new("senha", FieldType::String),
                FieldDef::new("tipo", FieldType::String),
                FieldDef::new("nome", FieldType::String),
                FieldDef::new("dataCadastro", FieldType::String),
            ],
        ),
        TableDef::new(
            ADS,
            vec![
                FieldDef::new("id", FieldType::Number).primary(),
                FieldDef::new("titulo", FieldType::String),
                FieldDef::new("imagem", FieldType::String),
                FieldDef::new("descricao", FieldType::String),
                FieldDef::new("empresa", FieldType::String),
                FieldDef::new("usuarioId", FieldType::Number),
                FieldDef::new("dataCriacao", FieldType::String),
            ],
        ),
        TableDef::new(
            CONVERSATIONS,
            vec![
                FieldDef::new("id", FieldType::Number).primary(),
                FieldDef::new("usuarioId1", FieldType::Number),
                FieldDef::new("usuarioId2", FieldType::Number),
                FieldDef::new("nome1", FieldType::String),
                FieldDef::new("nome2", FieldType::String),
                FieldDef::new("ultimaMensagem", FieldType::String),
                FieldDef::new("dataUltimaMensagem", FieldType::String),
                FieldDef::new("naoLidas1", FieldType::Number),
                FieldDef::new("naoLidas2", FieldType::Number),
            ],
        ),
        TableDef::new(
            MESSAGES,
            vec![
                FieldDef::new("id", FieldType::Number).primary(),
                FieldDef::new("conversaId", FieldType::Number),
                FieldDef::new("remetenteId", FieldType::Number),
                FieldDef::new("remetente", FieldType::String),
                FieldDef::new("conteudo", FieldType::String),
                FieldDef::new("lida", FieldType::Boolean),
                FieldDef::new("dataMensagem", FieldType::String),
                FieldDef::new("horaMensagem", FieldType::String),
            ],
        ),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserKind {
    Empresa,
    Prestador,
}

impl fmt::Display for UserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empresa => write!(f, "empresa"),
            Self::Prestador => write!(f, "prestador"),
        }
    }
}

impl TryFrom<&str> for UserKind {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "empresa" => Ok(Self::Empresa),
            "prestador" => Ok(Self::Prestador),
            _ => Err(format!("unknown user kind `{value}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: u64,
    pub email: String,
    #[serde(rename = "senha")]
    pub password: String,
    #[serde(rename = "tipo")]
    pub kind: UserKind,
    #[serde(rename = "nome", default)]
    pub name: String,
    #[serde(rename = "dataCadastro", default)]
    pub registered_on: String,
}

impl User {
    /// Name shown to other users
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.email
        } else {
            &self.name
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ad {
    #[serde(default)]
    pub id: u64,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "imagem")]
    pub image: String,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "empresa", default)]
    pub company: String,
    #[serde(rename = "usuarioId", default)]
    pub owner: Option<u64>,
    #[serde(rename = "dataCriacao", default)]
    pub created_on: String,
}

/// A chat between two users. Every per-user field comes in a `1`/`2` pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    #[serde(default)]
    pub id: u64,
    #[serde(rename = "usuarioId1")]
    pub user1: u64,
    #[serde(rename = "usuarioId2")]
    pub user2: u64,
    #[serde(rename = "nome1", default)]
    pub name1: String,
    #[serde(rename = "nome2", default)]
    pub name2: String,
    #[serde(rename = "ultimaMensagem", default)]
    pub last_message: String,
    #[serde(rename = "dataUltimaMensagem", default)]
    pub last_message_date: String,
    #[serde(rename = "naoLidas1", default)]
    pub unread1: u64,
    #[serde(rename = "naoLidas2", default)]
    pub unread2: u64,
}

impl Conversation {
    pub fn involves(&self, user: u64) -> bool {
        self.user1 == user || self.user2 == user
    }

    /// Name of the other participant, as seen by `viewer`
    pub fn title_for(&self, viewer: u64) -> &str {
        if self.user1 == viewer {
            &self.name2
        } else {
            &self.name1
        }
    }

    pub fn unread_for(&self, viewer: u64) -> u64 {
        if self.user1 == viewer {
            self.unread1
        } else {
            self.unread2
        }
    }

    /// Stored field holding `viewer`'s unread counter
    pub fn unread_field(&self, viewer: u64) -> &'static str {
        if self.user1 == viewer {
            "naoLidas1"
        } else {
            "naoLidas2"
        }
    }

    /// Counter field and current value of whoever is not `sender`. None when
    /// the sender talks to themselves, as in an ad's own conversation.
    pub fn recipient_unread(&self, sender: u64) -> Option<(&'static str, u64)> {
        if self.user1 == self.user2 {
            None
        } else if self.user1 == sender {
            Some(("naoLidas2", self.unread2))
        } else {
            Some(("naoLidas1", self.unread1))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub id: u64,
    #[serde(rename = "conversaId")]
    pub conversation: u64,
    #[serde(rename = "remetenteId")]
    pub sender: u64,
    #[serde(rename = "remetente")]
    pub sender_name: String,
    #[serde(rename = "conteudo")]
    pub content: String,
    #[serde(rename = "lida")]
    pub read: bool,
    #[serde(rename = "dataMensagem", default)]
    pub date: String,
    #[serde(rename = "horaMensagem", default)]
    pub time: String,
}
