use super::{Actor, Market};
use crate::common::error::{MarketError, Result};
use crate::domain::{Audit, Offer, OfferReview, Profile, ProfileReview};
use rusqlite::types::Value;
use serde::Deserialize;
use tracing::info;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReviewCreate {
    #[serde(default)]
    #[validate(length(max = 500))]
    pub text: Option<String>,
    #[validate(range(min = 1.0, max = 5.0))]
    pub rating: f64,
}

pub struct ReviewService<'a> {
    market: &'a Market,
}

impl<'a> ReviewService<'a> {
    pub fn new(market: &'a Market) -> Self {
        Self { market }
    }

    /// Records the caller's review and refreshes the offer's mean rating.
    pub async fn review_offer(&self, actor: &Actor, offer_id: i64, request: ReviewCreate) -> Result<OfferReview> {
        request.validate()?;
        let reviewer = self.market.profiles().current(actor).await?;
        let offers = self.market.crud::<Offer>();
        let mut offer = offers.find_one(offer_id).await?;
        if offer.owner_id.is_some() && offer.owner_id == reviewer.id {
            return Err(MarketError::bad_request("offerReview", "ownOffer", "Cannot review your own offer"));
        }

        let review = OfferReview {
            id: None,
            text: request.text,
            rating: request.rating,
            offer_id: Some(offer_id),
            reviewer_id: reviewer.id,
            checked: Some(false),
            audit: Audit::default(),
        };
        let saved = self.market.crud::<OfferReview>().create(actor, review).await?;

        let ratings: Vec<f64> = self
            .market
            .db()
            .repo::<OfferReview>()
            .find_where("e.offer_id = ?", vec![Value::Integer(offer_id)], None)
            .await?
            .iter()
            .map(|r| r.rating)
            .collect();
        offer.rating = mean(&ratings);
        offers.update(actor, offer_id, offer).await?;
        info!(offer_id, rating = ?mean(&ratings), "offer reviewed");
        Ok(saved)
    }

    pub async fn review_profile(&self, actor: &Actor, profile_id: i64, request: ReviewCreate) -> Result<ProfileReview> {
        request.validate()?;
        let reviewer = self.market.profiles().current(actor).await?;
        let reviewee = self.market.crud::<Profile>().find_one(profile_id).await?;
        if reviewee.id == reviewer.id {
            return Err(MarketError::bad_request(
                "profileReview",
                "ownProfile",
                "Cannot review your own profile",
            ));
        }

        let review = ProfileReview {
            id: None,
            text: request.text,
            rating: request.rating,
            reviewer_id: reviewer.id,
            reviewee_id: reviewee.id,
            audit: Audit::default(),
        };
        self.market.crud::<ProfileReview>().create(actor, review).await
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::{market, profile};
    use crate::service::OfferCreate;

    fn review(rating: f64) -> ReviewCreate {
        ReviewCreate {
            text: Some("Solid work".into()),
            rating,
        }
    }

    async fn offer_by(market: &Market, login: &str) -> i64 {
        let request = OfferCreate {
            name: "Logo".into(),
            description: "Vector logo".into(),
            offer_type_id: None,
            tag_ids: vec![],
            visibility: None,
        };
        market.offers().create(&Actor::user(login), request).await.unwrap().id.unwrap()
    }

    #[tokio::test]
    async fn offer_rating_is_mean_of_reviews() {
        let market = market();
        profile(&market, "ada", "Ada", "Lovelace").await;
        profile(&market, "bob", "Bob", "Builder").await;
        profile(&market, "cy", "Cy", "Young").await;
        let offer_id = offer_by(&market, "ada").await;

        market.reviews().review_offer(&Actor::user("bob"), offer_id, review(5.0)).await.unwrap();
        market.reviews().review_offer(&Actor::user("cy"), offer_id, review(2.0)).await.unwrap();

        let offer = market.crud::<Offer>().find_one(offer_id).await.unwrap();
        assert_eq!(offer.rating, Some(3.5));
    }

    #[tokio::test]
    async fn self_reviews_are_rejected() {
        let market = market();
        let ada = profile(&market, "ada", "Ada", "Lovelace").await;
        let offer_id = offer_by(&market, "ada").await;

        let err = market
            .reviews()
            .review_offer(&Actor::user("ada"), offer_id, review(5.0))
            .await
            .unwrap_err();
        assert_eq!(err.key(), "ownOffer");

        let err = market
            .reviews()
            .review_profile(&Actor::user("ada"), ada.id.unwrap(), review(5.0))
            .await
            .unwrap_err();
        assert_eq!(err.key(), "ownProfile");
    }

    #[tokio::test]
    async fn rating_out_of_range_fails_validation() {
        let market = market();
        let ada = profile(&market, "ada", "Ada", "Lovelace").await;
        profile(&market, "bob", "Bob", "Builder").await;

        let err = market
            .reviews()
            .review_profile(&Actor::user("bob"), ada.id.unwrap(), review(6.0))
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::Validation(_)));

        let saved = market
            .reviews()
            .review_profile(&Actor::user("bob"), ada.id.unwrap(), review(4.0))
            .await
            .unwrap();
        assert_eq!(saved.reviewee_id, ada.id);
        assert_eq!(saved.audit.created_by.as_deref(), Some("bob"));
    }
}
