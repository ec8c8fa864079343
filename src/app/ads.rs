use log::info;
use serde::Deserialize;

use super::{
    chat::SELF_NAME,
    decode_rows,
    link::chat_link,
    records::{Ad, Conversation, ADS, CONVERSATIONS},
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

/// Form contents of a new ad
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NewAd {
    #[serde(alias = "titulo", default)]
    pub title: String,
    #[serde(alias = "imagem", default)]
    pub image: String,
    #[serde(alias = "descricao", default)]
    pub description: String,
    #[serde(alias = "empresa", default)]
    pub company: String,
}

/// An ad with the conversation its "Conversar" button leads to
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub ad: Ad,
    pub conversation: Option<u64>,
}

impl Listing {
    /// Where the "Conversar" button leads
    pub fn contact_link(&self) -> Result<String> {
        match (self.ad.owner, self.conversation) {
            (Some(_), Some(conversation)) => Ok(chat_link(conversation)),
            _ => Err(Error::NotLoggedIn),
        }
    }

    pub fn render_card(&self) -> String {
        let label = if self.ad.company.is_empty() {
            "anuncio"
        } else {
            self.ad.company.as_str()
        };

        format!(
            "[{}] {}\n  {}\n  {}\n  imagem: {}",
            self.ad.id, label, self.ad.title, self.ad.description, self.ad.image
        )
    }
}

/// Publishes an ad. A logged in publisher also gets a conversation for it
pub fn publish<S: KeyValueStore>(db: &mut Database<S>, new_ad: NewAd) -> Result<Listing> {
    if new_ad.title.trim().is_empty() {
        return Err(Error::MissingField("titulo"));
    }
    if new_ad.image.trim().is_empty() {
        return Err(Error::MissingField("imagem"));
    }
    if new_ad.description.trim().is_empty() {
        return Err(Error::MissingField("descricao"));
    }

    let owner = Session::load(db.store())?.map(|session| session.usuario_id);
    let ad = Ad {
        id: 0,
        title: new_ad.title,
        image: new_ad.image,
        description: new_ad.description,
        company: new_ad.company,
        owner,
        created_on: today(),
    };
    let ad: Ad = from_row(db.insert(ADS, to_row(&ad)?)?)?;
    info!("published ad {}", ad.id);

    let Some(owner) = owner else {
        return Ok(Listing {
            ad,
            conversation: None,
        });
    };

    // The other side is filled in once someone answers the ad
    let conversation = Conversation {
        id: 0,
        user1: owner,
        user2: owner,
        name1: SELF_NAME.to_string(),
        name2: ad.company.clone(),
        last_message: "Anúncio publicado".to_string(),
        last_message_date: today(),
        unread1: 0,
        unread2: 0,
    };
    let conversation: Conversation = from_row(db.insert(CONVERSATIONS, to_row(&conversation)?)?)?;

    Ok(Listing {
        ad,
        conversation: Some(conversation.id),
    })
}

/// Every ad in publication order
pub fn listings<S: KeyValueStore>(db: &Database<S>) -> Result<Vec<Listing>> {
    decode_rows::<Ad>(ADS, db.select(ADS, &Filter::new())?)
        .into_iter()
        .map(|ad| {
            let rows = db.select(
                CONVERSATIONS,
                &Filter::new()
                    .eq("usuarioId1", ad.owner)
                    .eq("nome2", ad.company.as_str()),
            )?;
            let conversation = decode_rows::<Conversation>(CONVERSATIONS, rows)
                .first()
                .map(|conversation| conversation.id);

            Ok(Listing { ad, conversation })
        })
        .collect()
}
