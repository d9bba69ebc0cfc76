//! Write-time rules.
//!
//! Plain field checks run first and every violation is collected; ownership
//! and consistency checks then walk the referenced rows back to the acting
//! farmer. The whole set is reported at once as [`AppError::Validation`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::entities::{crop, farmer, field, weather_record};
use crate::error::{AppError, ValidationErrors, NON_FIELD_ERRORS};
use crate::services::{
    activities::ActivityInput, crops::CropInput, farmers::ProfileInput,
    farmers::RegistrationInput, fields::FieldInput, posts::PostInput, reviews::ReviewInput,
    secure_routes::RouteInput, weather::WeatherInput,
};

pub const BLANK: &str = "This field may not be blank.";
pub const CROP_FIELD_NOT_OWNED: &str = "You cannot add a crop to a field you do not own.";
pub const ACTIVITY_FIELD_NOT_OWNED: &str = "This field does not belong to you.";
pub const ACTIVITY_CROP_NOT_OWNED: &str = "This crop does not belong to your fields.";
pub const WEATHER_FIELD_NOT_OWNED: &str = "You cannot record weather for a field you do not own.";
pub const WEATHER_NOT_UNIQUE: &str = "The fields field, recorded_at must make a unique set.";
pub const USERNAME_TAKEN: &str = "A user with that username already exists.";
pub const EMAIL_TAKEN: &str = "farmer with this email already exists.";

fn missing_pk(id: i32) -> String {
    format!("Invalid pk \"{}\" - object does not exist.", id)
}

pub fn require_text(errors: &mut ValidationErrors, key: &str, value: &str, max_len: usize) {
    if value.trim().is_empty() {
        errors.add(key, BLANK);
    } else {
        limit_length(errors, key, value, max_len);
    }
}

pub fn limit_length(errors: &mut ValidationErrors, key: &str, value: &str, max_len: usize) {
    if value.chars().count() > max_len {
        errors.add(
            key,
            format!("Ensure this field has no more than {} characters.", max_len),
        );
    }
}

pub fn limit_optional(errors: &mut ValidationErrors, key: &str, value: Option<&str>, max_len: usize) {
    if let Some(value) = value {
        limit_length(errors, key, value, max_len);
    }
}

pub fn require_finite(errors: &mut ValidationErrors, key: &str, value: f64) -> bool {
    if value.is_finite() {
        true
    } else {
        errors.add(key, "A valid number is required.");
        false
    }
}

pub fn greater_than_zero(errors: &mut ValidationErrors, key: &str, value: f64) {
    if require_finite(errors, key, value) && value <= 0.0 {
        errors.add(key, "Ensure this value is greater than 0.");
    }
}

pub fn within(errors: &mut ValidationErrors, key: &str, value: f64, min: f64, max: Option<f64>) {
    if !require_finite(errors, key, value) {
        return;
    }
    if value < min {
        errors.add(
            key,
            format!("Ensure this value is greater than or equal to {}.", min),
        );
    }
    if let Some(max) = max {
        if value > max {
            errors.add(
                key,
                format!("Ensure this value is less than or equal to {}.", max),
            );
        }
    }
}

pub fn not_before(
    errors: &mut ValidationErrors,
    key: &str,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    message: &str,
) {
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            errors.add(key, message);
        }
    }
}

pub fn is_valid_email(value: &str) -> bool {
    let value = value.trim();
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.contains(char::is_whitespace)
        }
        None => false,
    }
}

pub fn is_valid_username(value: &str) -> bool {
    value
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
}

/// Accepts RFC 3339 (`2025-12-29T10:00:00Z`) or a naive UTC timestamp.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc).naive_utc());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
}

pub fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| {
        serde::de::Error::custom(
            "Datetime has wrong format. Use one of these formats instead: YYYY-MM-DDThh:mm[:ss[.uuuuuu]][+HH:MM|-HH:MM|Z].",
        )
    })
}

/// GeoJSON may arrive as an object or as a JSON-encoded string.
pub fn geojson(errors: &mut ValidationErrors, key: &str, value: Value) -> Value {
    let value = match value {
        Value::String(text) => match serde_json::from_str::<Value>(&text) {
            Ok(parsed) => parsed,
            Err(_) => {
                errors.add(key, "Value must be valid JSON.");
                return Value::Null;
            }
        },
        other => other,
    };
    let has_type = value
        .as_object()
        .and_then(|object| object.get("type"))
        .map(Value::is_string)
        .unwrap_or(false);
    if !has_type {
        errors.add(key, "Enter a GeoJSON object with a \"type\" member.");
    }
    value
}

async fn check_field_owner(
    db: &DatabaseConnection,
    actor: i32,
    field_id: i32,
    key: &str,
    message: &str,
    errors: &mut ValidationErrors,
) -> Result<(), DbErr> {
    match field::Entity::find_by_id(field_id).one(db).await? {
        Some(f) if f.farmer_id == actor => {}
        Some(_) => errors.add(key, message),
        None => errors.add(key, missing_pk(field_id)),
    }
    Ok(())
}

fn finish(table: &'static str, errors: ValidationErrors) -> Result<(), AppError> {
    if !errors.is_empty() {
        tracing::info!(table, errors = %errors, "write rejected");
        crate::metrics::increment_validation_rejections(table);
    }
    errors.into_result()
}

pub fn validate_field(input: &FieldInput) -> Result<(), AppError> {
    let mut errors = ValidationErrors::new();
    require_text(&mut errors, "name", &input.name, 100);
    limit_optional(&mut errors, "location", input.location.as_deref(), 255);
    limit_optional(&mut errors, "soil_type", input.soil_type.as_deref(), 50);
    greater_than_zero(&mut errors, "size_in_hectares", input.size_in_hectares);
    finish("fields", errors)
}

pub async fn validate_crop(
    db: &DatabaseConnection,
    actor: i32,
    input: &CropInput,
) -> Result<(), AppError> {
    let mut errors = ValidationErrors::new();
    require_text(&mut errors, "name", &input.name, 200);
    require_text(&mut errors, "category", &input.category, 50);
    not_before(
        &mut errors,
        "expected_harvest",
        input.planted_on,
        input.expected_harvest,
        "Expected harvest cannot be before the planting date.",
    );
    check_field_owner(db, actor, input.field_id, "fields", CROP_FIELD_NOT_OWNED, &mut errors).await?;
    finish("crops", errors)
}

pub async fn validate_activity(
    db: &DatabaseConnection,
    actor: i32,
    input: &ActivityInput,
) -> Result<(), AppError> {
    let mut errors = ValidationErrors::new();
    require_text(&mut errors, "title", &input.title, 200);
    not_before(
        &mut errors,
        "estimated_harvest_date",
        Some(input.scheduled_date),
        input.estimated_harvest_date,
        "Estimated harvest date cannot be before the scheduled date.",
    );

    if let Some(field_id) = input.field_id {
        check_field_owner(db, actor, field_id, "field", ACTIVITY_FIELD_NOT_OWNED, &mut errors)
            .await?;
    }

    // crop -> field -> farmer
    if let Some(crop_id) = input.crop_id {
        match crop::Entity::find_by_id(crop_id)
            .find_also_related(field::Entity)
            .one(db)
            .await?
        {
            Some((_, Some(f))) if f.farmer_id == actor => {}
            Some(_) => errors.add("crop", ACTIVITY_CROP_NOT_OWNED),
            None => errors.add("crop", missing_pk(crop_id)),
        }
    }

    finish("activities", errors)
}

pub async fn validate_weather(
    db: &DatabaseConnection,
    actor: i32,
    input: &WeatherInput,
    existing_id: Option<i32>,
) -> Result<(), AppError> {
    let mut errors = ValidationErrors::new();
    require_text(&mut errors, "location", &input.location, 100);
    require_finite(&mut errors, "temperature", input.temperature);
    within(&mut errors, "humidity", input.humidity, 0.0, Some(100.0));
    within(&mut errors, "rainfall", input.rainfall, 0.0, None);
    if let Some(wind_speed) = input.wind_speed {
        within(&mut errors, "wind_speed", wind_speed, 0.0, None);
    }

    if let Some(field_id) = input.field_id {
        check_field_owner(db, actor, field_id, "field", WEATHER_FIELD_NOT_OWNED, &mut errors)
            .await?;

        let mut duplicate = weather_record::Entity::find()
            .filter(weather_record::Column::FieldId.eq(field_id))
            .filter(weather_record::Column::RecordedAt.eq(input.recorded_at));
        if let Some(id) = existing_id {
            duplicate = duplicate.filter(weather_record::Column::Id.ne(id));
        }
        if duplicate.one(db).await?.is_some() {
            errors.add(NON_FIELD_ERRORS, WEATHER_NOT_UNIQUE);
        }
    }

    finish("weather_records", errors)
}

/// Validates the route and returns the normalized GeoJSON value.
pub fn validate_route(input: &RouteInput) -> Result<Value, AppError> {
    let mut errors = ValidationErrors::new();
    require_text(&mut errors, "route_name", &input.route_name, 100);
    let path = geojson(
        &mut errors,
        "route_path_geojson",
        input.route_path_geojson.clone(),
    );
    finish("secure_routes", errors)?;
    Ok(path)
}

pub fn validate_review(input: &ReviewInput) -> Result<(), AppError> {
    let mut errors = ValidationErrors::new();
    if input.content.trim().is_empty() {
        errors.add("content", BLANK);
    }
    if !(1..=5).contains(&input.rating) {
        errors.add("rating", "Ensure this value is between 1 and 5.");
    }
    finish("reviews", errors)
}

pub fn validate_post(input: &PostInput) -> Result<(), AppError> {
    let mut errors = ValidationErrors::new();
    require_text(&mut errors, "title", &input.title, 200);
    if input.content.trim().is_empty() {
        errors.add("content", BLANK);
    }
    finish("posts", errors)
}

async fn check_email_free(
    db: &DatabaseConnection,
    email: &str,
    except: Option<i32>,
    errors: &mut ValidationErrors,
) -> Result<(), DbErr> {
    let mut query = farmer::Entity::find().filter(farmer::Column::Email.eq(email.trim()));
    if let Some(id) = except {
        query = query.filter(farmer::Column::Id.ne(id));
    }
    if query.one(db).await?.is_some() {
        errors.add("email", EMAIL_TAKEN);
    }
    Ok(())
}

pub async fn validate_registration(
    db: &DatabaseConnection,
    input: &RegistrationInput,
) -> Result<(), AppError> {
    let mut errors = ValidationErrors::new();

    require_text(&mut errors, "username", &input.username, 150);
    if !input.username.trim().is_empty() {
        if !is_valid_username(input.username.trim()) {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        } else if farmer::Entity::find()
            .filter(farmer::Column::Username.eq(input.username.trim()))
            .one(db)
            .await?
            .is_some()
        {
            errors.add("username", USERNAME_TAKEN);
        }
    }

    if input.email.trim().is_empty() {
        errors.add("email", BLANK);
    } else if !is_valid_email(&input.email) {
        errors.add("email", "Enter a valid email address.");
    } else {
        check_email_free(db, &input.email, None, &mut errors).await?;
    }

    limit_optional(&mut errors, "farm_name", input.farm_name.as_deref(), 200);
    limit_optional(&mut errors, "phone_number", input.phone_number.as_deref(), 20);

    if input.password.chars().count() < 8 {
        errors.add(
            "password",
            "This password is too short. It must contain at least 8 characters.",
        );
    } else if input.password.chars().all(|c| c.is_ascii_digit()) {
        errors.add("password", "This password is entirely numeric.");
    }

    finish("farmers", errors)
}

pub async fn validate_profile(
    db: &DatabaseConnection,
    farmer_id: i32,
    input: &ProfileInput,
) -> Result<(), AppError> {
    let mut errors = ValidationErrors::new();
    if let Some(email) = input.email.as_deref() {
        if !is_valid_email(email) {
            errors.add("email", "Enter a valid email address.");
        } else {
            check_email_free(db, email, Some(farmer_id), &mut errors).await?;
        }
    }
    limit_optional(&mut errors, "first_name", input.first_name.as_deref(), 150);
    limit_optional(&mut errors, "last_name", input.last_name.as_deref(), 150);
    limit_optional(&mut errors, "farm_name", input.farm_name.as_deref(), 200);
    limit_optional(&mut errors, "phone_number", input.phone_number.as_deref(), 20);
    limit_optional(&mut errors, "city_or_region", input.city_or_region.as_deref(), 100);
    finish("farmers", errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blank_and_long_text_rejected() {
        let mut errors = ValidationErrors::new();
        require_text(&mut errors, "name", "   ", 10);
        require_text(&mut errors, "title", "a very long title", 5);
        assert_eq!(errors.get("name"), Some(&[BLANK.to_string()][..]));
        assert!(errors.contains("title"));
    }

    #[test]
    fn field_size_must_be_positive() {
        let input = FieldInput {
            name: "Alpha".to_string(),
            location: None,
            size_in_hectares: 0.0,
            soil_type: None,
        };
        let err = validate_field(&input).unwrap_err();
        match err {
            AppError::Validation(errors) => assert!(errors.contains("size_in_hectares")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn humidity_bounds() {
        let mut errors = ValidationErrors::new();
        within(&mut errors, "humidity", 101.0, 0.0, Some(100.0));
        within(&mut errors, "rainfall", -1.0, 0.0, None);
        within(&mut errors, "wind_speed", 3.5, 0.0, None);
        assert!(errors.contains("humidity"));
        assert!(errors.contains("rainfall"));
        assert!(!errors.contains("wind_speed"));
    }

    #[test]
    fn harvest_cannot_precede_planting() {
        let mut errors = ValidationErrors::new();
        let planted = NaiveDate::from_ymd_opt(2025, 3, 1);
        let harvest = NaiveDate::from_ymd_opt(2025, 2, 1);
        not_before(&mut errors, "expected_harvest", planted, harvest, "bad order");
        assert!(errors.contains("expected_harvest"));
    }

    #[test]
    fn timestamps_accept_zulu_and_naive_forms() {
        let expected = NaiveDate::from_ymd_opt(2025, 12, 29)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        assert_eq!(parse_timestamp("2025-12-29T10:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2025-12-29T12:00:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-12-29T10:00"), Some(expected));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn geojson_string_is_decoded() {
        let mut errors = ValidationErrors::new();
        let raw = json!("{\"type\": \"LineString\", \"coordinates\": [[0.0, 0.0], [1.0, 1.0]]}");
        let value = geojson(&mut errors, "route_path_geojson", raw);
        assert!(errors.is_empty());
        assert_eq!(value["type"], "LineString");
    }

    #[test]
    fn geojson_without_type_rejected() {
        let mut errors = ValidationErrors::new();
        geojson(&mut errors, "route_path_geojson", json!({"coordinates": []}));
        geojson(&mut errors, "other", json!("not json"));
        assert!(errors.contains("route_path_geojson"));
        assert!(errors.contains("other"));
    }

    #[test]
    fn email_and_username_shapes() {
        assert!(is_valid_email("a@test.com"));
        assert!(!is_valid_email("a@test"));
        assert!(!is_valid_email("a b@test.com"));
        assert!(is_valid_username("farmer_a"));
        assert!(!is_valid_username("farmer a"));
    }

    #[test]
    fn review_needs_content_and_rating_in_range() {
        let err = validate_review(&ReviewInput {
            content: "  ".to_string(),
            rating: 6,
        })
        .unwrap_err();
        match err {
            AppError::Validation(errors) => {
                assert!(errors.contains("content"));
                assert!(errors.contains("rating"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
