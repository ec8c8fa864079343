use chrono::Local;
use log::info;

use super::{
    records::{User, UserKind, USERS},
    session::Session,
    today,
};
use crate::{
    storage::{
        table::{from_row, to_row},
        Database, Filter, KeyValueStore,
    },
    Error, Result,
};

/// Creates a user. The email must not be registered yet
pub fn register<S: KeyValueStore>(
    db: &mut Database<S>,
    email: &str,
    password: &str,
    kind: UserKind,
    name: &str,
) -> Result<User> {
    if email.is_empty() {
        return Err(Error::MissingField("email"));
    }
    if password.is_empty() {
        return Err(Error::MissingField("senha"));
    }

    let user = User {
        id: 0,
        email: email.to_string(),
        password: password.to_string(),
        kind,
        name: name.to_string(),
        registered_on: today(),
    };

    from_row(db.insert(USERS, to_row(&user)?)?)
}

/// Checks the credentials and stores the session
pub fn login<S: KeyValueStore>(db: &mut Database<S>, email: &str, password: &str) -> Result<Session> {
    let filter = Filter::new().eq("email", email).eq("senha", password);
    let user: User = match db.select_one(USERS, &filter)? {
        Some(row) => from_row(row)?,
        None => return Err(Error::InvalidCredentials),
    };

    let session = Session {
        usuario_id: user.id,
        email: user.email,
        tipo: user.kind,
        login_time: Local::now().to_rfc3339(),
    };
    session.save(db.store_mut())?;

    info!("user {} logged in", session.usuario_id);
    Ok(session)
}

pub fn logout<S: KeyValueStore>(db: &mut Database<S>) -> Result<()> {
    Session::clear(db.store_mut())
}

pub fn current_session<S: KeyValueStore>(db: &Database<S>) -> Result<Option<Session>> {
    Session::load(db.store())
}

/// Every user except `user`
pub fn contacts_of<S: KeyValueStore>(db: &Database<S>, user: u64) -> Result<Vec<User>> {
    db.select(USERS, &Filter::new())?
        .into_iter()
        .map(from_row::<User>)
        .filter(|contact| !matches!(contact, Ok(contact) if contact.id == user))
        .collect()
}
