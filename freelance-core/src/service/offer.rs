use super::{Actor, Market, Upload};
use crate::common::error::{MarketError, Result};
use crate::criteria::Criteria;
use crate::domain::{Audit, FileObject, MediaKind, Offer, OfferMedia, OfferStatus, OfferType, Profile, Tag};
use crate::storage::{Page, Pageable};
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OfferCreate {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(max = 2048))]
    pub description: String,
    #[serde(default)]
    pub offer_type_id: Option<i64>,
    #[serde(default)]
    pub tag_ids: Vec<i64>,
    #[serde(default)]
    pub visibility: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OfferUpdate {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(max = 2048))]
    pub description: Option<String>,
    pub offer_type_id: Option<i64>,
    pub tag_ids: Option<Vec<i64>>,
}

/// Listing view of an offer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferShort {
    pub id: Option<i64>,
    pub name: String,
    pub rating: Option<f64>,
    pub owner: Option<Profile>,
    pub offer_images: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaLink {
    pub id: Option<i64>,
    pub media_kind: MediaKind,
    pub url: Option<String>,
}

pub struct OfferService<'a> {
    market: &'a Market,
}

impl<'a> OfferService<'a> {
    pub fn new(market: &'a Market) -> Self {
        Self { market }
    }

    pub async fn list_short(&self, criteria: &Criteria, page: &Pageable) -> Result<Page<OfferShort>> {
        let offers = self.market.crud::<Offer>().find_page(criteria, page).await?;
        let profiles = self.market.db().repo::<Profile>();
        let mut content = Vec::with_capacity(offers.content.len());
        for offer in &offers.content {
            let owner = match offer.owner_id {
                Some(owner_id) => profiles.find_by_id(owner_id).await?,
                None => None,
            };
            let images = self.media_of(offer.id.unwrap_or_default()).await?;
            content.push(OfferShort {
                id: offer.id,
                name: offer.name.clone(),
                rating: offer.rating,
                owner,
                offer_images: images
                    .iter()
                    .filter(|m| m.media_kind == MediaKind::Image)
                    .filter_map(|m| m.file_id.map(FileObject::content_url))
                    .collect(),
            });
        }
        Ok(Page {
            content,
            total: offers.total,
            page: offers.page,
            size: offers.size,
        })
    }

    /// New ACTIVE offer owned by the caller's profile.
    pub async fn create(&self, actor: &Actor, request: OfferCreate) -> Result<Offer> {
        request.validate()?;
        let owner = self.market.profiles().current(actor).await?;
        let offer = Offer {
            id: None,
            name: request.name,
            description: request.description,
            rating: None,
            status: OfferStatus::Active,
            visibility: request.visibility.unwrap_or(true),
            owner_id: owner.id,
            offer_type_id: self.checked_offer_type(request.offer_type_id).await?,
            tag_ids: self.market.existing_ids::<Tag>(&request.tag_ids).await?,
            audit: Audit::default(),
        };
        let saved = self.market.crud::<Offer>().create(actor, offer).await?;
        info!(id = ?saved.id, owner = ?owner.id, "offer created");
        Ok(saved)
    }

    pub async fn update(&self, actor: &Actor, id: i64, request: OfferUpdate) -> Result<Offer> {
        request.validate()?;
        let mut offer = self.market.crud::<Offer>().find_one(id).await?;
        self.ensure_owner(actor, &offer).await?;

        if let Some(name) = request.name {
            offer.name = name;
        }
        if let Some(description) = request.description {
            offer.description = description;
        }
        if request.offer_type_id.is_some() {
            offer.offer_type_id = self.checked_offer_type(request.offer_type_id).await?;
        }
        if let Some(tag_ids) = request.tag_ids {
            offer.tag_ids = self.market.existing_ids::<Tag>(&tag_ids).await?;
        }
        self.market.crud::<Offer>().update(actor, id, offer).await
    }

    pub async fn delete(&self, actor: &Actor, id: i64) -> Result<()> {
        let offer = self.market.crud::<Offer>().find_one(id).await?;
        self.ensure_owner(actor, &offer).await?;
        self.market.crud::<Offer>().delete(id).await
    }

    /// Stores each file and attaches it to the offer. Image content types become IMAGE media, anything else VIDEO.
    pub async fn upload_media(&self, actor: &Actor, offer_id: i64, uploads: &[Upload]) -> Result<Vec<OfferMedia>> {
        let offer = self.market.crud::<Offer>().find_one(offer_id).await?;
        self.ensure_owner(actor, &offer).await?;
        if uploads.is_empty() {
            return Err(MarketError::bad_request("offerMedia", "noFiles", "No files were uploaded"));
        }

        let mut saved = Vec::with_capacity(uploads.len());
        for upload in uploads {
            let file = self.market.files().store_upload(actor, "offer-media", upload).await?;
            let is_image = upload
                .content_type
                .as_deref()
                .map(|ct| ct.contains("image"))
                .unwrap_or(false);
            let media = OfferMedia {
                id: None,
                media_kind: if is_image { MediaKind::Image } else { MediaKind::Video },
                is_primary: false,
                caption: None,
                offer_id: Some(offer_id),
                file_id: file.id,
                audit: Audit::default(),
            };
            saved.push(self.market.crud::<OfferMedia>().create(actor, media).await?);
        }
        info!(offer_id, count = saved.len(), "offer media uploaded");
        Ok(saved)
    }

    pub async fn media(&self, offer_id: i64) -> Result<Vec<MediaLink>> {
        let media = self.media_of(offer_id).await?;
        if media.is_empty() {
            return Err(MarketError::not_found(
                "offerMedia",
                "noMediaFoundForOffer",
                format!("No media found for offer {offer_id}"),
            ));
        }
        Ok(media
            .into_iter()
            .map(|m| MediaLink {
                id: m.id,
                media_kind: m.media_kind,
                url: m.file_id.map(FileObject::content_url),
            })
            .collect())
    }

    /// Deletes the listed media of the offer together with their files. Returns how many were removed.
    pub async fn delete_media(&self, actor: &Actor, offer_id: i64, media_ids: &[i64]) -> Result<usize> {
        let offer = self.market.crud::<Offer>().find_one(offer_id).await?;
        self.ensure_owner(actor, &offer).await?;

        let targets: Vec<OfferMedia> = self
            .media_of(offer_id)
            .await?
            .into_iter()
            .filter(|m| m.id.map(|id| media_ids.contains(&id)).unwrap_or(false))
            .collect();
        for media in &targets {
            self.market.crud::<OfferMedia>().delete(media.id.unwrap_or_default()).await?;
            if let Some(file_id) = media.file_id {
                self.market.files().delete_with_content(file_id).await?;
            }
        }
        Ok(targets.len())
    }

    async fn media_of(&self, offer_id: i64) -> Result<Vec<OfferMedia>> {
        self.market
            .db()
            .repo::<OfferMedia>()
            .find_where("e.offer_id = ?", vec![Value::Integer(offer_id)], None)
            .await
    }

    async fn checked_offer_type(&self, offer_type_id: Option<i64>) -> Result<Option<i64>> {
        if let Some(id) = offer_type_id {
            if !self.market.db().repo::<OfferType>().exists_by_id(id).await? {
                return Err(MarketError::bad_request(
                    "offer",
                    "offerTypeNotFound",
                    format!("Offer type {id} not found"),
                ));
            }
        }
        Ok(offer_type_id)
    }

    async fn ensure_owner(&self, actor: &Actor, offer: &Offer) -> Result<()> {
        actor.require_login()?;
        if actor.is_admin() {
            return Ok(());
        }
        let profile = self.market.profiles().current(actor).await?;
        if offer.owner_id.is_some() && offer.owner_id == profile.id {
            Ok(())
        } else {
            Err(MarketError::forbidden(
                "offer",
                "notOfferOwner",
                "Only the owner can modify this offer",
            ))
        }
    }
}
