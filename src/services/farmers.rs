use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, IntoActiveModel,
    ModelTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;

use super::{non_blank, record_event};
use crate::auth::{self, Actor};
use crate::entities::{auth_token, farmer, prelude::VerificationStatus};
use crate::error::{AppError, ValidationErrors, NON_FIELD_ERRORS};
use crate::listing::{search_condition, ListParams};
use crate::scope::{find_owned, Scoped};
use crate::validation;

pub const BAD_CREDENTIALS: &str = "Unable to log in with provided credentials.";

#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationInput {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub farm_name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    pub password: String,
}

/// Profile edits; `None` leaves a column untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub farm_name: Option<String>,
    pub city_or_region: Option<String>,
    pub profile_photo: Option<String>,
}

pub async fn register(
    db: &DatabaseConnection,
    input: RegistrationInput,
) -> Result<farmer::Model, AppError> {
    validation::validate_registration(db, &input).await?;

    let password_hash = auth::hash_password(&input.password)?;
    let verification_status = VerificationStatus::on_signup(
        input.farm_name.as_deref(),
        input.phone_number.as_deref(),
    );

    let now = chrono::Utc::now().naive_utc();
    let new_farmer = farmer::ActiveModel {
        username: Set(input.username.trim().to_string()),
        email: Set(input.email.trim().to_string()),
        password_hash: Set(password_hash),
        first_name: Set(String::new()),
        last_name: Set(String::new()),
        farm_name: Set(non_blank(input.farm_name)),
        phone_number: Set(non_blank(input.phone_number)),
        city_or_region: Set(None),
        profile_photo: Set(None),
        verification_status: Set(verification_status),
        is_active: Set(true),
        date_joined: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let farmer = new_farmer.insert(db).await?;

    record_event("farmers", "register_farmer", farmer.id, "Farmer registered successfully");
    tracing::info!(
        farmer_id = farmer.id,
        group = farmer.verification_status.group_name(),
        "Farmer registered"
    );
    crate::metrics::increment_farmers_registered();
    Ok(farmer)
}

/// Resolves a login by username or email and checks the password.
pub async fn authenticate(
    db: &DatabaseConnection,
    login: &str,
    password: &str,
) -> Result<farmer::Model, AppError> {
    let login = login.trim();
    let rejected = || {
        AppError::Validation(ValidationErrors::single(NON_FIELD_ERRORS, BAD_CREDENTIALS))
    };
    if login.is_empty() || password.is_empty() {
        return Err(rejected());
    }

    let candidate = farmer::Entity::find()
        .filter(
            Condition::any()
                .add(farmer::Column::Username.eq(login))
                .add(farmer::Column::Email.eq(login)),
        )
        .order_by_asc(farmer::Column::Id)
        .one(db)
        .await?;

    match candidate {
        Some(f) if f.is_active && auth::verify_password(password, &f.password_hash) => {
            record_event("farmers", "login_farmer", f.id, "Farmer logged in successfully");
            Ok(f)
        }
        _ => {
            tracing::Span::current()
                .record("table", "farmers")
                .record("action", "login_farmer_failed")
                .record("error", "invalid_credentials");
            Err(rejected())
        }
    }
}

/// Returns the farmer's API key, creating it on first use.
pub async fn issue_token(db: &DatabaseConnection, farmer_id: i32) -> Result<String, AppError> {
    if let Some(existing) = auth_token::Entity::find()
        .filter(auth_token::Column::FarmerId.eq(farmer_id))
        .one(db)
        .await?
    {
        return Ok(existing.key);
    }

    let key = auth::generate_token_key();
    let token = auth_token::ActiveModel {
        key: Set(key.clone()),
        farmer_id: Set(farmer_id),
        created_at: Set(chrono::Utc::now().naive_utc()),
    };
    auth_token::Entity::insert(token)
        .exec_without_returning(db)
        .await?;
    Ok(key)
}

/// The active farmer holding `key`, if any.
pub async fn resolve_token(
    db: &DatabaseConnection,
    key: &str,
) -> Result<Option<farmer::Model>, AppError> {
    let found = auth_token::Entity::find_by_id(key.to_string())
        .find_also_related(farmer::Entity)
        .one(db)
        .await?;
    Ok(found
        .and_then(|(_, farmer)| farmer)
        .filter(|farmer| farmer.is_active))
}

pub async fn find_active(
    db: &DatabaseConnection,
    id: i32,
) -> Result<Option<farmer::Model>, AppError> {
    Ok(farmer::Entity::find_by_id(id)
        .one(db)
        .await?
        .filter(|farmer| farmer.is_active))
}

/// Anonymous callers see nobody; a farmer sees only themself.
pub async fn list(
    db: &DatabaseConnection,
    actor: Option<&Actor>,
    params: &ListParams,
) -> Result<Vec<farmer::Model>, AppError> {
    let Some(actor) = actor else {
        return Ok(Vec::new());
    };
    let mut query = farmer::Entity::owned_by(actor.id);
    if let Some(term) = params.search_term() {
        query = query.filter(search_condition(
            &[
                farmer::Column::Username,
                farmer::Column::FarmName,
                farmer::Column::CityOrRegion,
            ],
            term,
        ));
    }
    Ok(query.all(db).await?)
}

pub async fn get(db: &DatabaseConnection, actor: &Actor, id: i32) -> Result<farmer::Model, AppError> {
    find_owned::<farmer::Entity>(db, actor.id, id).await
}

/// Verification status is deliberately left alone here.
pub async fn update_profile(
    db: &DatabaseConnection,
    actor: &Actor,
    id: i32,
    input: ProfileInput,
) -> Result<farmer::Model, AppError> {
    let existing = get(db, actor, id).await?;
    validation::validate_profile(db, existing.id, &input).await?;

    let mut active = existing.into_active_model();
    if let Some(first_name) = input.first_name {
        active.first_name = Set(first_name.trim().to_string());
    }
    if let Some(last_name) = input.last_name {
        active.last_name = Set(last_name.trim().to_string());
    }
    if let Some(email) = input.email {
        active.email = Set(email.trim().to_string());
    }
    if input.phone_number.is_some() {
        active.phone_number = Set(non_blank(input.phone_number));
    }
    if input.farm_name.is_some() {
        active.farm_name = Set(non_blank(input.farm_name));
    }
    if input.city_or_region.is_some() {
        active.city_or_region = Set(non_blank(input.city_or_region));
    }
    if input.profile_photo.is_some() {
        active.profile_photo = Set(non_blank(input.profile_photo));
    }
    active.updated_at = Set(chrono::Utc::now().naive_utc());
    let farmer = active.update(db).await?;

    record_event("farmers", "update_farmer", actor.id, "Profile updated");
    Ok(farmer)
}

/// Removes the account and everything it owns.
pub async fn delete(db: &DatabaseConnection, actor: &Actor, id: i32) -> Result<(), AppError> {
    let existing = get(db, actor, id).await?;
    existing.delete(db).await?;

    record_event("farmers", "delete_farmer", actor.id, "Farmer deleted");
    crate::metrics::increment_records_deleted("farmers");
    // Fields, crops and the rest cascade with the account.
    crate::metrics::refresh_totals(db).await;
    Ok(())
}
