use super::{MediaKind, OfferStatus, PackageTier};
use crate::storage::schema::{FieldKind, LinkTable};
use chrono::{DateTime, Utc};
use validator::Validate;

pub const OFFER_TAG_LINK: LinkTable = LinkTable {
    table: "rel_offer__tag",
    owner_column: "offer_id",
    target_column: "tag_id",
    filter_field: "tagId",
};

entity! {
    /// A service listed by a freelancer profile.
    pub struct Offer {
        table: "offer",
        entity: "offer",
        resource: "offers",
        fields: {
            #[validate(length(max = 255))]
            name: String => ("name", "name", FieldKind::Text),
            #[validate(length(max = 2048))]
            description: String => ("description", "description", FieldKind::Text),
            #[serde(default)]
            rating: Option<f64> => ("rating", "rating", FieldKind::Double),
            status: OfferStatus => ("status", "status", FieldKind::Enum(OfferStatus::VALUES)),
            visibility: bool => ("visibility", "visibility", FieldKind::Boolean),
            #[serde(default)]
            owner_id: Option<i64> => ("ownerId", "owner_id", FieldKind::Long),
            #[serde(default)]
            offer_type_id: Option<i64> => ("offerTypeId", "offer_type_id", FieldKind::Long),
        },
        links: {
            tag_ids: "tagIds" => OFFER_TAG_LINK,
        },
    }
}

entity! {
    /// A priced tier of an offer.
    pub struct OfferPackage {
        table: "offer_package",
        entity: "offerPackage",
        resource: "offer-packages",
        fields: {
            #[validate(length(max = 50))]
            name: String => ("name", "name", FieldKind::Text),
            #[validate(length(max = 200))]
            description: String => ("description", "description", FieldKind::Text),
            price: f64 => ("price", "price", FieldKind::Double),
            #[validate(length(max = 3))]
            currency: String => ("currency", "currency", FieldKind::Text),
            #[validate(range(min = 1))]
            delivery_days: i32 => ("deliveryDays", "delivery_days", FieldKind::Integer),
            package_tier: PackageTier => ("packageTier", "package_tier", FieldKind::Enum(PackageTier::VALUES)),
            active: bool => ("active", "active", FieldKind::Boolean),
            #[serde(default)]
            offer_id: Option<i64> => ("offerId", "offer_id", FieldKind::Long),
        },
        links: {},
    }
}

entity! {
    pub struct OfferMedia {
        table: "offer_media",
        entity: "offerMedia",
        resource: "offer-medias",
        fields: {
            media_kind: MediaKind => ("mediaKind", "media_kind", FieldKind::Enum(MediaKind::VALUES)),
            is_primary: bool => ("isPrimary", "is_primary", FieldKind::Boolean),
            #[serde(default)]
            #[validate(length(max = 140))]
            caption: Option<String> => ("caption", "caption", FieldKind::Text),
            #[serde(default)]
            offer_id: Option<i64> => ("offerId", "offer_id", FieldKind::Long),
            #[serde(default)]
            file_id: Option<i64> => ("fileId", "file_id", FieldKind::Long),
        },
        links: {},
    }
}

entity! {
    pub struct OfferReview {
        table: "offer_review",
        entity: "offerReview",
        resource: "offer-reviews",
        fields: {
            #[serde(default)]
            #[validate(length(max = 500))]
            text: Option<String> => ("text", "text", FieldKind::Text),
            #[validate(range(min = 1.0, max = 5.0))]
            rating: f64 => ("rating", "rating", FieldKind::Double),
            #[serde(default)]
            offer_id: Option<i64> => ("offerId", "offer_id", FieldKind::Long),
            #[serde(default)]
            reviewer_id: Option<i64> => ("reviewerId", "reviewer_id", FieldKind::Long),
            #[serde(default)]
            checked: Option<bool> => ("checked", "checked", FieldKind::Boolean),
        },
        links: {},
    }
}

entity! {
    pub struct FavoriteOffer {
        table: "favorite_offer",
        entity: "favoriteOffer",
        resource: "favorite-offers",
        fields: {
            #[serde(default = "Utc::now")]
            created_at: DateTime<Utc> => ("createdAt", "created_at", FieldKind::Instant),
            #[serde(default)]
            profile_id: Option<i64> => ("profileId", "profile_id", FieldKind::Long),
            #[serde(default)]
            offer_id: Option<i64> => ("offerId", "offer_id", FieldKind::Long),
        },
        links: {},
    }
}
