//! The classified-ads and messaging application built on the database

pub mod accounts;
pub mod ads;
pub mod chat;
pub mod link;
pub mod records;
pub mod session;

pub use ads::{Listing, NewAd};
pub use chat::{Chat, ChatView, ConversationSummary};
pub use records::{catalog, Ad, Conversation, Message, User, UserKind};
pub use session::Session;

use chrono::Local;
use log::warn;
use serde::de::DeserializeOwned;

use crate::storage::{table::from_row, Row};

/// Today's date as the application displays it, `dd/mm/YYYY`
pub(crate) fn today() -> String {
    Local::now().format("%d/%m/%Y").to_string()
}

/// Current time of day, `HH:MM`
pub(crate) fn clock_time() -> String {
    Local::now().format("%H:%M").to_string()
}

/// Decodes stored rows, skipping (and logging) the ones that do not fit the
/// record type. Tables do not enforce their schema.
pub(crate) fn decode_rows<T: DeserializeOwned>(table: &str, rows: Vec<Row>) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.get("id").cloned();
            match from_row(row) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("skipping row {id:?} of table `{table}`: {e}");
                    None
                }
            }
        })
        .collect()
}
