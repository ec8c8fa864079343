use serde::{Deserialize, Serialize};

use super::records::UserKind;
use crate::{storage::KeyValueStore, Result};

/// Storage key of the logged in user's record
pub const SESSION_KEY: &str = "session";

/// The currently authenticated user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub usuario_id: u64,
    pub email: String,
    pub tipo: UserKind,
    pub login_time: String,
}

impl Session {
    pub fn load<S: KeyValueStore>(store: &S) -> Result<Option<Self>> {
        match store.get(SESSION_KEY)? {
            Some(content) => Ok(Some(serde_json::from_str(&content)?)),
            None => Ok(None),
        }
    }

    pub fn save<S: KeyValueStore>(&self, store: &mut S) -> Result<()> {
        store.set(SESSION_KEY, serde_json::to_string(self)?)
    }

    pub fn clear<S: KeyValueStore>(store: &mut S) -> Result<()> {
        store.remove(SESSION_KEY)
    }
}
