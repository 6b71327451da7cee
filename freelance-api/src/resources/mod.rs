//! REST resources under `/api`.

pub mod chat;
pub mod crud;
pub mod favorites;
pub mod files;
pub mod messaging;
pub mod offers;
pub mod orders;
pub mod profiles;
pub mod verification;

use crate::state::AppState;
use axum::Router;
use freelance_core::{
    Category, Country, Delivery, Dispute, OfferMedia, OfferPackage, OfferReview, OfferType, ProfileReview,
    Requirement, Skill, Subcategory, Tag,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(crud::routes::<Category>())
        .merge(crud::routes::<Subcategory>())
        .merge(crud::routes::<Skill>())
        .merge(crud::routes::<Tag>())
        .merge(crud::routes::<OfferType>())
        .merge(crud::routes::<Country>())
        .merge(crud::routes::<OfferPackage>())
        .merge(crud::routes::<OfferMedia>())
        .merge(crud::routes::<OfferReview>())
        .merge(crud::routes::<ProfileReview>())
        .merge(crud::routes::<Requirement>())
        .merge(crud::routes::<Delivery>())
        .merge(crud::routes::<Dispute>())
        .merge(profiles::routes())
        .merge(verification::routes())
        .merge(offers::routes())
        .merge(orders::routes())
        .merge(favorites::routes())
        .merge(files::routes())
        .merge(messaging::routes())
}
