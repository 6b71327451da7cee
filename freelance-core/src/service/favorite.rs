use super::{Actor, Market};
use crate::common::error::{MarketError, Result};
use crate::domain::{Audit, FavoriteOffer, Offer};
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use serde::Serialize;
use tracing::info;

/// A favorite joined with the names shown in the "my favorites" list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteOfferView {
    pub id: Option<i64>,
    pub profile_id: Option<i64>,
    pub offer_id: Option<i64>,
    pub profile_name: String,
    pub offer_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub struct FavoriteService<'a> {
    market: &'a Market,
}

impl<'a> FavoriteService<'a> {
    pub fn new(market: &'a Market) -> Self {
        Self { market }
    }

    /// Adding an offer that is already a favorite returns the stored entry.
    pub async fn add(&self, actor: &Actor, offer_id: i64) -> Result<FavoriteOffer> {
        let profile = self.market.profiles().current(actor).await?;
        if !self.market.db().repo::<Offer>().exists_by_id(offer_id).await? {
            return Err(MarketError::not_found(
                "favoriteOffer",
                "offerNotFound",
                format!("Offer {offer_id} not found"),
            ));
        }
        let profile_id = profile.id.unwrap_or_default();

        if let Some(favorite) = self.find(profile_id, offer_id).await? {
            return Ok(favorite);
        }

        let favorite = FavoriteOffer {
            id: None,
            created_at: Utc::now(),
            profile_id: Some(profile_id),
            offer_id: Some(offer_id),
            audit: Audit::default(),
        };
        match self.market.crud::<FavoriteOffer>().create(actor, favorite).await {
            Ok(saved) => {
                info!(profile_id, offer_id, "offer added to favorites");
                Ok(saved)
            }
            // Lost a race against the same add.
            Err(MarketError::Conflict(detail)) => self
                .find(profile_id, offer_id)
                .await?
                .ok_or(MarketError::Conflict(detail)),
            Err(e) => Err(e),
        }
    }

    async fn find(&self, profile_id: i64, offer_id: i64) -> Result<Option<FavoriteOffer>> {
        let found = self
            .market
            .db()
            .repo::<FavoriteOffer>()
            .find_where(
                "e.profile_id = ? AND e.offer_id = ?",
                vec![Value::Integer(profile_id), Value::Integer(offer_id)],
                None,
            )
            .await?;
        Ok(found.into_iter().next())
    }

    pub async fn mine(&self, actor: &Actor) -> Result<Vec<FavoriteOfferView>> {
        let profile = self.market.profiles().current(actor).await?;
        let favorites = self
            .market
            .db()
            .repo::<FavoriteOffer>()
            .find_where(
                "e.profile_id = ?",
                vec![Value::Integer(profile.id.unwrap_or_default())],
                Some("e.created_at DESC, e.id DESC"),
            )
            .await?;

        let offers = self.market.db().repo::<Offer>();
        let profile_name = format!("{} {}", profile.last_name, profile.first_name);
        let mut views = Vec::with_capacity(favorites.len());
        for favorite in favorites {
            let offer_name = match favorite.offer_id {
                Some(id) => offers.find_by_id(id).await?.map(|o| o.name),
                None => None,
            };
            views.push(FavoriteOfferView {
                id: favorite.id,
                profile_id: favorite.profile_id,
                offer_id: favorite.offer_id,
                profile_name: profile_name.clone(),
                offer_name,
                created_at: favorite.created_at,
            });
        }
        Ok(views)
    }

    pub async fn remove(&self, actor: &Actor, id: i64) -> Result<()> {
        let profile = self.market.profiles().current(actor).await?;
        let favorite = self
            .market
            .db()
            .repo::<FavoriteOffer>()
            .find_by_id(id)
            .await?
            .ok_or_else(|| {
                MarketError::not_found(
                    "favoriteOffer",
                    "favoriteOfferNotFound",
                    format!("Favorite offer {id} not found"),
                )
            })?;
        if favorite.profile_id != profile.id {
            return Err(MarketError::forbidden(
                "favoriteOffer",
                "notFavoriteOwner",
                "Favorite belongs to another profile",
            ));
        }
        self.market.crud::<FavoriteOffer>().delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::{market, profile};
    use crate::service::OfferCreate;

    async fn offer(market: &Market, login: &str, name: &str) -> i64 {
        let request = OfferCreate {
            name: name.into(),
            description: "desc".into(),
            offer_type_id: None,
            tag_ids: vec![],
            visibility: None,
        };
        market.offers().create(&Actor::user(login), request).await.unwrap().id.unwrap()
    }

    #[tokio::test]
    async fn add_is_idempotent_and_listing_joins_names() {
        let market = market();
        profile(&market, "ada", "Ada", "Lovelace").await;
        profile(&market, "bob", "Bob", "Builder").await;
        let offer_id = offer(&market, "ada", "Portrait").await;
        let bob = Actor::user("bob");

        let first = market.favorites().add(&bob, offer_id).await.unwrap();
        let again = market.favorites().add(&bob, offer_id).await.unwrap();
        assert_eq!(first.id, again.id);

        let mine = market.favorites().mine(&bob).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].profile_name, "Builder Bob");
        assert_eq!(mine[0].offer_name.as_deref(), Some("Portrait"));

        let err = market.favorites().add(&bob, 77).await.unwrap_err();
        assert_eq!(err.key(), "offerNotFound");
    }

    #[tokio::test]
    async fn storage_rejects_a_second_row_for_the_same_pair() {
        let market = market();
        profile(&market, "ada", "Ada", "Lovelace").await;
        let bob = profile(&market, "bob", "Bob", "Builder").await;
        let offer_id = offer(&market, "ada", "Portrait").await;
        market.favorites().add(&Actor::user("bob"), offer_id).await.unwrap();

        let duplicate = FavoriteOffer {
            id: None,
            created_at: Utc::now(),
            profile_id: bob.id,
            offer_id: Some(offer_id),
            audit: Audit::default(),
        };
        let err = market
            .crud::<FavoriteOffer>()
            .create(&Actor::user("bob"), duplicate)
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::Conflict(_)));
    }

    #[tokio::test]
    async fn remove_checks_ownership() {
        let market = market();
        profile(&market, "ada", "Ada", "Lovelace").await;
        profile(&market, "bob", "Bob", "Builder").await;
        let offer_id = offer(&market, "ada", "Portrait").await;
        let favorite = market.favorites().add(&Actor::user("bob"), offer_id).await.unwrap();
        let id = favorite.id.unwrap();

        let err = market.favorites().remove(&Actor::user("ada"), id).await.unwrap_err();
        assert!(matches!(err, MarketError::Forbidden { .. }));

        market.favorites().remove(&Actor::user("bob"), id).await.unwrap();
        let err = market.favorites().remove(&Actor::user("bob"), id).await.unwrap_err();
        assert_eq!(err.key(), "favoriteOfferNotFound");
    }
}
