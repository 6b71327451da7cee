use super::{Actor, Market, Upload};
use crate::common::error::{MarketError, Result};
use crate::domain::{Audit, Profile, ProfileType, Skill};
use rusqlite::types::Value;
use serde::Deserialize;
use tracing::{info, warn};
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileCreation {
    #[validate(length(min = 1, max = 20))]
    pub first_name: String,
    #[validate(length(min = 1, max = 20))]
    pub last_name: String,
    #[serde(default)]
    #[validate(length(max = 2048))]
    pub description: Option<String>,
    #[serde(default)]
    pub profile_type: Option<ProfileType>,
    #[serde(default)]
    pub skill_ids: Vec<i64>,
}

/// Fields left `None` keep their stored value; `skills` replaces the skill set.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileEdit {
    #[validate(length(min = 1, max = 20))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub last_name: Option<String>,
    #[validate(length(max = 2048))]
    pub description: Option<String>,
    #[serde(alias = "skillIds")]
    pub skills: Option<Vec<i64>>,
}

pub struct ProfileService<'a> {
    market: &'a Market,
}

impl<'a> ProfileService<'a> {
    pub fn new(market: &'a Market) -> Self {
        Self { market }
    }

    pub async fn find_by_login(&self, login: &str) -> Result<Option<Profile>> {
        let found = self
            .market
            .db()
            .repo::<Profile>()
            .find_where("e.user_login = ?", vec![Value::Text(login.to_string())], None)
            .await?;
        Ok(found.into_iter().next())
    }

    /// The caller's own profile.
    pub async fn current(&self, actor: &Actor) -> Result<Profile> {
        let login = actor.require_login()?;
        self.find_by_login(login).await?.ok_or_else(|| {
            MarketError::bad_request("profile", "profileNotFound", "Profile not found for current user")
        })
    }

    pub async fn create(&self, actor: &Actor, request: ProfileCreation) -> Result<Profile> {
        let login = actor.require_login()?;
        request.validate()?;
        if self.find_by_login(login).await?.is_some() {
            return Err(MarketError::bad_request(
                "profile",
                "profileexists",
                "Current user already has a profile",
            ));
        }

        let profile = Profile {
            id: None,
            first_name: request.first_name,
            last_name: request.last_name,
            description: request.description,
            profile_type: request.profile_type,
            user_login: Some(login.to_string()),
            profile_picture_id: None,
            verified: false,
            skill_ids: self.market.existing_ids::<Skill>(&request.skill_ids).await?,
            audit: Audit::default(),
        };
        let saved = self.market.crud::<Profile>().create(actor, profile).await?;
        info!(login, id = ?saved.id, "created profile");
        Ok(saved)
    }

    pub async fn edit(&self, actor: &Actor, id: i64, request: ProfileEdit) -> Result<Profile> {
        request.validate()?;
        let mut profile = self.market.crud::<Profile>().find_one(id).await?;
        ensure_owner(actor, &profile)?;

        if let Some(first_name) = request.first_name {
            profile.first_name = first_name;
        }
        if let Some(last_name) = request.last_name {
            profile.last_name = last_name;
        }
        if let Some(description) = request.description {
            profile.description = Some(description);
        }
        if let Some(skills) = request.skills {
            profile.skill_ids = self.market.existing_ids::<Skill>(&skills).await?;
        }
        self.market.crud::<Profile>().update(actor, id, profile).await
    }

    /// Stores a new picture for the caller's profile and drops the previous one.
    pub async fn upload_picture(&self, actor: &Actor, upload: &Upload) -> Result<Profile> {
        let mut profile = self.current(actor).await?;
        let id = profile.id.unwrap_or_default();
        let file = self
            .market
            .files()
            .store_upload(actor, "profile-pictures", upload)
            .await?;

        let previous = profile.profile_picture_id.replace(file.id.unwrap_or_default());
        let saved = self.market.crud::<Profile>().update(actor, id, profile).await?;

        if let Some(old) = previous {
            if let Err(e) = self.market.files().delete_with_content(old).await {
                warn!(file_id = old, error = %e, "could not remove previous profile picture");
            }
        }
        Ok(saved)
    }

    pub async fn verify(&self, actor: &Actor, id: i64) -> Result<Profile> {
        actor.require_admin()?;
        let mut profile = self.market.crud::<Profile>().find_one(id).await?;
        profile.verified = true;
        info!(id, by = actor.audit_name(), "profile verified");
        self.market.crud::<Profile>().update(actor, id, profile).await
    }
}

fn ensure_owner(actor: &Actor, profile: &Profile) -> Result<()> {
    let login = actor.require_login()?;
    if actor.is_admin() || profile.user_login.as_deref() == Some(login) {
        Ok(())
    } else {
        Err(MarketError::forbidden(
            "profile",
            "notProfileOwner",
            "Only the owner can edit this profile",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::{market, profile, upload};
    use crate::storage::Entity;

    async fn skill(market: &Market, name: &str) -> i64 {
        let skill: Skill = serde_json::from_value(serde_json::json!({ "name": name, "active": true })).unwrap();
        market.crud::<Skill>().create(&Actor::admin("root"), skill).await.unwrap().id().unwrap()
    }

    fn creation(skills: Vec<i64>) -> ProfileCreation {
        ProfileCreation {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            description: Some("Engines".into()),
            profile_type: Some(ProfileType::Freelancer),
            skill_ids: skills,
        }
    }

    #[tokio::test]
    async fn creates_profile_for_caller_with_existing_skills() {
        let market = market();
        let rust = skill(&market, "Rust").await;
        let created = market
            .profiles()
            .create(&Actor::user("ada"), creation(vec![rust, 404]))
            .await
            .unwrap();

        assert_eq!(created.user_login.as_deref(), Some("ada"));
        assert!(!created.verified);
        assert_eq!(created.skill_ids, vec![rust]);

        let again = market.profiles().create(&Actor::user("ada"), creation(vec![])).await;
        assert_eq!(again.unwrap_err().key(), "profileexists");
    }

    #[tokio::test]
    async fn current_requires_login_and_profile() {
        let market = market();
        assert!(matches!(
            market.profiles().current(&Actor::anonymous()).await,
            Err(MarketError::Unauthorized(_))
        ));
        let err = market.profiles().current(&Actor::user("ghost")).await.unwrap_err();
        assert_eq!(err.key(), "profileNotFound");
    }

    #[tokio::test]
    async fn edit_applies_present_fields_for_owner_only() {
        let market = market();
        let go = skill(&market, "Go").await;
        let ada = profile(&market, "ada", "Ada", "Lovelace").await;
        let id = ada.id.unwrap();

        let edited = market
            .profiles()
            .edit(
                &Actor::user("ada"),
                id,
                ProfileEdit {
                    last_name: Some("King".into()),
                    skills: Some(vec![go]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(edited.first_name, "Ada");
        assert_eq!(edited.last_name, "King");
        assert_eq!(edited.skill_ids, vec![go]);

        let err = market
            .profiles()
            .edit(&Actor::user("bob"), id, ProfileEdit::default())
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::Forbidden { .. }));
        market
            .profiles()
            .edit(&Actor::admin("root"), id, ProfileEdit::default())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn picture_upload_replaces_previous_file() {
        let market = market();
        profile(&market, "ada", "Ada", "Lovelace").await;
        let actor = Actor::user("ada");

        let first = market
            .profiles()
            .upload_picture(&actor, &upload("a.png", "image/png", b"one"))
            .await
            .unwrap();
        let first_file = first.profile_picture_id.unwrap();
        let second = market
            .profiles()
            .upload_picture(&actor, &upload("b.png", "image/png", b"two"))
            .await
            .unwrap();

        assert_ne!(second.profile_picture_id, Some(first_file));
        assert!(market.files().content(first_file).await.is_err());
    }

    #[tokio::test]
    async fn only_admins_verify() {
        let market = market();
        let ada = profile(&market, "ada", "Ada", "Lovelace").await;
        let id = ada.id.unwrap();
        let err = market.profiles().verify(&Actor::user("ada"), id).await.unwrap_err();
        assert!(matches!(err, MarketError::Forbidden { .. }));
        assert!(market.profiles().verify(&Actor::admin("root"), id).await.unwrap().verified);
    }
}
