use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Privilege tier assigned once, when the account is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Deserialize, Serialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    #[sea_orm(string_value = "unverified")]
    Unverified,
    #[sea_orm(string_value = "verified")]
    Verified,
}

impl VerificationStatus {
    /// A new account is verified only when it arrives with both a farm name
    /// and a phone number. Later profile edits never move it.
    pub fn on_signup(farm_name: Option<&str>, phone_number: Option<&str>) -> Self {
        let present = |v: Option<&str>| v.map(|s| !s.trim().is_empty()).unwrap_or(false);
        if present(farm_name) && present(phone_number) {
            VerificationStatus::Verified
        } else {
            VerificationStatus::Unverified
        }
    }

    pub fn group_name(self) -> &'static str {
        match self {
            VerificationStatus::Verified => "Verified Farmer",
            VerificationStatus::Unverified => "Unverified User",
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "farmers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub farm_name: Option<String>,
    pub phone_number: Option<String>,
    pub city_or_region: Option<String>,
    pub profile_photo: Option<String>,
    pub verification_status: VerificationStatus,
    pub is_active: bool,
    pub date_joined: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::field::Entity")]
    Fields,
    #[sea_orm(has_many = "super::activity::Entity")]
    Activities,
    #[sea_orm(has_many = "super::weather_record::Entity")]
    WeatherRecords,
    #[sea_orm(has_many = "super::secure_route::Entity")]
    SecureRoutes,
    #[sea_orm(has_many = "super::review::Entity")]
    Reviews,
    #[sea_orm(has_many = "super::post::Entity")]
    Posts,
    #[sea_orm(has_many = "super::auth_token::Entity")]
    AuthTokens,
}

impl Related<super::field::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Fields.def()
    }
}

impl Related<super::activity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Activities.def()
    }
}

impl Related<super::weather_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WeatherRecords.def()
    }
}

impl Related<super::secure_route::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SecureRoutes.def()
    }
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Posts.def()
    }
}

impl Related<super::auth_token::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AuthTokens.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::VerificationStatus;

    #[test]
    fn verified_when_farm_name_and_phone_present() {
        let status = VerificationStatus::on_signup(Some("Green Acres"), Some("+254700000000"));
        assert_eq!(status, VerificationStatus::Verified);
        assert_eq!(status.group_name(), "Verified Farmer");
    }

    #[test]
    fn unverified_when_either_is_blank() {
        assert_eq!(
            VerificationStatus::on_signup(Some("Green Acres"), Some("  ")),
            VerificationStatus::Unverified
        );
        assert_eq!(
            VerificationStatus::on_signup(None, Some("+254700000000")),
            VerificationStatus::Unverified
        );
        assert_eq!(
            VerificationStatus::Unverified.group_name(),
            "Unverified User"
        );
    }
}
