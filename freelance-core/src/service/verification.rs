use super::{Actor, Market, Upload};
use crate::common::error::{MarketError, Result};
use crate::criteria::Criteria;
use crate::domain::{Audit, Profile, VerificationRequest, VerificationRequestStatus};
use crate::storage::{Page, Pageable, SqlRepository};
use chrono::Utc;
use tracing::info;
use validator::Validate;

pub struct VerificationService<'a> {
    market: &'a Market,
}

impl<'a> VerificationService<'a> {
    pub fn new(market: &'a Market) -> Self {
        Self { market }
    }

    /// Opens a PENDING request for the caller with the uploaded photo.
    pub async fn request(&self, actor: &Actor, photo: &Upload) -> Result<VerificationRequest> {
        let profile = self.market.profiles().current(actor).await?;
        if profile.verified {
            return Err(MarketError::bad_request(
                "verificationRequest",
                "userAlreadyVerified",
                "User is already verified",
            ));
        }

        let file = self
            .market
            .files()
            .store_upload(actor, "verification", photo)
            .await?;
        let request = VerificationRequest {
            id: None,
            profile_id: profile.id,
            file_object_id: file.id,
            status: Some(VerificationRequestStatus::Pending),
            message: None,
            audit: Audit::default(),
        };
        let saved = self.market.crud::<VerificationRequest>().create(actor, request).await?;
        info!(profile_id = ?profile.id, id = ?saved.id, "verification requested");
        Ok(saved)
    }

    /// Admin decision on a request. COMPLETED also marks the profile verified;
    /// both rows are written in one transaction.
    pub async fn update_status(
        &self,
        actor: &Actor,
        id: i64,
        status: VerificationRequestStatus,
        message: Option<String>,
    ) -> Result<VerificationRequest> {
        actor.require_admin()?;
        let mut request = self.find(id).await?;
        let now = Utc::now();

        let mut verified_profile = None;
        match status {
            VerificationRequestStatus::Rejected => request.message = message,
            VerificationRequestStatus::Completed => {
                request.message = None;
                if let Some(profile_id) = request.profile_id {
                    let mut profile = self.market.crud::<Profile>().find_one(profile_id).await?;
                    profile.verified = true;
                    profile.audit.touch(actor.audit_name(), now);
                    verified_profile = Some(profile);
                }
            }
            _ => {}
        }
        request.status = Some(status);
        request.audit.touch(actor.audit_name(), now);
        request.validate()?;

        self.market.db().transaction(|tx| {
            if let Some(profile) = &verified_profile {
                SqlRepository::<Profile>::update_in(tx, profile)?;
            }
            SqlRepository::<VerificationRequest>::update_in(tx, &request)
        })?;
        info!(id, %status, "verification request status changed");
        Ok(request)
    }

    /// Cancels one of the caller's own requests.
    pub async fn cancel(&self, actor: &Actor, id: i64) -> Result<VerificationRequest> {
        let profile = self.market.profiles().current(actor).await?;
        let mut request = self
            .market
            .db()
            .repo::<VerificationRequest>()
            .find_by_id(id)
            .await?
            .filter(|r| r.profile_id == profile.id)
            .ok_or_else(|| {
                MarketError::bad_request(
                    "verificationRequest",
                    "requestNotFound",
                    "Request not found for current user",
                )
            })?;
        request.status = Some(VerificationRequestStatus::Canceled);
        self.market.crud::<VerificationRequest>().update(actor, id, request).await
    }

    pub async fn list_all(&self, actor: &Actor, criteria: &Criteria, page: &Pageable) -> Result<Page<VerificationRequest>> {
        actor.require_admin()?;
        self.market.crud::<VerificationRequest>().find_page(criteria, page).await
    }

    pub async fn list_mine(&self, actor: &Actor, criteria: Criteria, page: &Pageable) -> Result<Page<VerificationRequest>> {
        let profile = self.market.profiles().current(actor).await?;
        let criteria = criteria.column_equals("profile_id", profile.id.unwrap_or_default());
        self.market.crud::<VerificationRequest>().find_page(&criteria, page).await
    }

    async fn find(&self, id: i64) -> Result<VerificationRequest> {
        self.market
            .db()
            .repo::<VerificationRequest>()
            .find_by_id(id)
            .await?
            .ok_or_else(|| {
                MarketError::bad_request(
                    "verificationRequest",
                    "verificationRequestNotFound",
                    "Verification request not found",
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::{market, profile, upload};

    fn photo() -> Upload {
        upload("selfie.jpg", "image/jpeg", b"jpeg")
    }

    #[tokio::test]
    async fn request_creates_pending_entry_with_stored_photo() {
        let market = market();
        profile(&market, "ada", "Ada", "Lovelace").await;
        let request = market.verification().request(&Actor::user("ada"), &photo()).await.unwrap();

        assert_eq!(request.status, Some(VerificationRequestStatus::Pending));
        let (file, _) = market.files().content(request.file_object_id.unwrap()).await.unwrap();
        assert!(file.object_key.starts_with("users/ada/verification/"));
    }

    #[tokio::test]
    async fn verified_profiles_cannot_request_again() {
        let market = market();
        let ada = profile(&market, "ada", "Ada", "Lovelace").await;
        market.profiles().verify(&Actor::admin("root"), ada.id.unwrap()).await.unwrap();

        let err = market.verification().request(&Actor::user("ada"), &photo()).await.unwrap_err();
        assert_eq!(err.key(), "userAlreadyVerified");
    }

    #[tokio::test]
    async fn completing_verifies_profile_and_clears_message() {
        let market = market();
        let ada = profile(&market, "ada", "Ada", "Lovelace").await;
        let request = market.verification().request(&Actor::user("ada"), &photo()).await.unwrap();
        let id = request.id.unwrap();
        let admin = Actor::admin("root");

        let rejected = market
            .verification()
            .update_status(&admin, id, VerificationRequestStatus::Rejected, Some("Blurry".into()))
            .await
            .unwrap();
        assert_eq!(rejected.message.as_deref(), Some("Blurry"));

        let completed = market
            .verification()
            .update_status(&admin, id, VerificationRequestStatus::Completed, Some("ignored".into()))
            .await
            .unwrap();
        assert_eq!(completed.message, None);
        assert_eq!(completed.audit.last_modified_by.as_deref(), Some("root"));

        let reloaded = market.crud::<Profile>().find_one(ada.id.unwrap()).await.unwrap();
        assert!(reloaded.verified);
    }

    #[tokio::test]
    async fn status_changes_need_admin_and_existing_request() {
        let market = market();
        let err = market
            .verification()
            .update_status(&Actor::user("ada"), 1, VerificationRequestStatus::Completed, None)
            .await
            .unwrap_err();
        assert_eq!(err.key(), "adminRequired");

        let err = market
            .verification()
            .update_status(&Actor::admin("root"), 1, VerificationRequestStatus::Completed, None)
            .await
            .unwrap_err();
        assert_eq!(err.key(), "verificationRequestNotFound");
    }

    #[tokio::test]
    async fn only_owner_can_cancel() {
        let market = market();
        profile(&market, "ada", "Ada", "Lovelace").await;
        profile(&market, "bob", "Bob", "Builder").await;
        let request = market.verification().request(&Actor::user("ada"), &photo()).await.unwrap();
        let id = request.id.unwrap();

        let err = market.verification().cancel(&Actor::user("bob"), id).await.unwrap_err();
        assert_eq!(err.key(), "requestNotFound");

        let canceled = market.verification().cancel(&Actor::user("ada"), id).await.unwrap();
        assert_eq!(canceled.status, Some(VerificationRequestStatus::Canceled));
    }

    #[tokio::test]
    async fn missing_request_cannot_be_canceled() {
        let market = market();
        profile(&market, "ada", "Ada", "Lovelace").await;
        let err = market.verification().cancel(&Actor::user("ada"), 404).await.unwrap_err();
        assert_eq!(err.key(), "requestNotFound");
    }

    #[tokio::test]
    async fn cancel_surfaces_storage_failures() {
        let market = market();
        profile(&market, "ada", "Ada", "Lovelace").await;
        market
            .db()
            .with_conn(|c| Ok(c.execute_batch("DROP TABLE verification_request")?))
            .unwrap();

        let err = market.verification().cancel(&Actor::user("ada"), 1).await.unwrap_err();
        assert!(matches!(err, MarketError::Database { .. }));
        assert_eq!(err.key(), "internalServerError");
    }

    #[tokio::test]
    async fn rejection_keeps_message_as_given() {
        let market = market();
        profile(&market, "ada", "Ada", "Lovelace").await;
        let request = market.verification().request(&Actor::user("ada"), &photo()).await.unwrap();

        let rejected = market
            .verification()
            .update_status(
                &Actor::admin("root"),
                request.id.unwrap(),
                VerificationRequestStatus::Rejected,
                Some("  ".into()),
            )
            .await
            .unwrap();
        assert_eq!(rejected.message.as_deref(), Some("  "));
    }

    #[tokio::test]
    async fn completion_leaves_profile_untouched_when_request_write_fails() {
        let market = market();
        let ada = profile(&market, "ada", "Ada", "Lovelace").await;
        let request = market.verification().request(&Actor::user("ada"), &photo()).await.unwrap();
        market
            .db()
            .with_conn(|c| {
                Ok(c.execute_batch(
                    "CREATE TRIGGER refuse_completion BEFORE UPDATE ON verification_request \
                     WHEN NEW.status = 'COMPLETED' BEGIN SELECT RAISE(ABORT, 'refused'); END;",
                )?)
            })
            .unwrap();

        let result = market
            .verification()
            .update_status(&Actor::admin("root"), request.id.unwrap(), VerificationRequestStatus::Completed, None)
            .await;
        assert!(result.is_err());

        let reloaded = market.crud::<Profile>().find_one(ada.id.unwrap()).await.unwrap();
        assert!(!reloaded.verified);
    }

    #[tokio::test]
    async fn listings_are_scoped() {
        let market = market();
        profile(&market, "ada", "Ada", "Lovelace").await;
        profile(&market, "bob", "Bob", "Builder").await;
        market.verification().request(&Actor::user("ada"), &photo()).await.unwrap();
        market.verification().request(&Actor::user("bob"), &photo()).await.unwrap();

        let mine = market
            .verification()
            .list_mine(&Actor::user("bob"), Criteria::new(), &Pageable::default())
            .await
            .unwrap();
        assert_eq!(mine.total, 1);

        let all = market
            .verification()
            .list_all(&Actor::admin("root"), &Criteria::new(), &Pageable::default())
            .await
            .unwrap();
        assert_eq!(all.total, 2);
        assert!(market
            .verification()
            .list_all(&Actor::user("ada"), &Criteria::new(), &Pageable::default())
            .await
            .is_err());
    }
}
