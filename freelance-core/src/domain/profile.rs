use super::{ProfileType, VerificationRequestStatus};
use crate::storage::schema::{FieldKind, LinkTable};
use validator::Validate;

pub const PROFILE_SKILL_LINK: LinkTable = LinkTable {
    table: "rel_profile__skill",
    owner_column: "profile_id",
    target_column: "skill_id",
    filter_field: "skillId",
};

entity! {
    /// A marketplace participant, bound to an upstream user login.
    pub struct Profile {
        table: "profile",
        entity: "profile",
        resource: "profiles",
        fields: {
            #[validate(length(max = 20))]
            first_name: String => ("firstName", "first_name", FieldKind::Text),
            #[validate(length(max = 20))]
            last_name: String => ("lastName", "last_name", FieldKind::Text),
            #[serde(default)]
            #[validate(length(max = 2048))]
            description: Option<String> => ("description", "description", FieldKind::Text),
            #[serde(default)]
            profile_type: Option<ProfileType> => ("profileType", "profile_type", FieldKind::Enum(ProfileType::VALUES)),
            #[serde(default)]
            #[validate(length(max = 50))]
            user_login: Option<String> => ("userLogin", "user_login", FieldKind::Text),
            #[serde(default)]
            profile_picture_id: Option<i64> => ("profilePictureId", "profile_picture_id", FieldKind::Long),
            #[serde(default)]
            verified: bool => ("verified", "verified", FieldKind::Boolean),
        },
        links: {
            skill_ids: "skillIds" => PROFILE_SKILL_LINK,
        },
    }
}

impl Profile {
    /// "First Last", used in conversation listings.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

entity! {
    pub struct ProfileReview {
        table: "profile_review",
        entity: "profileReview",
        resource: "profile-reviews",
        fields: {
            #[serde(default)]
            #[validate(length(max = 500))]
            text: Option<String> => ("text", "text", FieldKind::Text),
            #[validate(range(min = 1.0, max = 5.0))]
            rating: f64 => ("rating", "rating", FieldKind::Double),
            #[serde(default)]
            reviewer_id: Option<i64> => ("reviewerId", "reviewer_id", FieldKind::Long),
            #[serde(default)]
            reviewee_id: Option<i64> => ("revieweeId", "reviewee_id", FieldKind::Long),
        },
        links: {},
    }
}

entity! {
    /// A profile's request to be marked verified, backed by an uploaded photo.
    pub struct VerificationRequest {
        table: "verification_request",
        entity: "verificationRequest",
        resource: "verification-requests",
        fields: {
            #[serde(default)]
            profile_id: Option<i64> => ("profileId", "profile_id", FieldKind::Long),
            #[serde(default)]
            file_object_id: Option<i64> => ("fileObjectId", "file_object_id", FieldKind::Long),
            #[serde(default)]
            status: Option<VerificationRequestStatus> => ("status", "status", FieldKind::Enum(VerificationRequestStatus::VALUES)),
            #[serde(default)]
            #[validate(length(max = 1024))]
            message: Option<String> => ("message", "message", FieldKind::Text),
        },
        links: {},
    }
}
