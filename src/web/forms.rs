//! Urlencoded form bodies.
//!
//! Browsers submit every control as text, so each form keeps the raw strings
//! (for re-rendering) and `clean()` converts them into the typed service
//! input, collecting every conversion error at once.

use chrono::NaiveDate;
use sea_orm::{ActiveEnum, Iterable};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::entities::{
    activity, crop, farmer, field,
    prelude::{ActivityStatus, CropStatus, SecurityStatus, WeatherSource},
    secure_route, weather_record,
};
use crate::error::ValidationErrors;
use crate::services::{
    activities::ActivityInput,
    crops::CropInput,
    farmers::{ProfileInput, RegistrationInput},
    fields::FieldInput,
    posts::{CommentInput, PostInput},
    reviews::ReviewInput,
    secure_routes::RouteInput,
    weather::WeatherInput,
};
use crate::validation;

const REQUIRED: &str = "This field is required.";

fn optional(raw: &str) -> Option<String> {
    let raw = raw.trim();
    (!raw.is_empty()).then(|| raw.to_string())
}

fn parse_number(errors: &mut ValidationErrors, key: &str, raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        errors.add(key, REQUIRED);
        return None;
    }
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => {
            errors.add(key, "Enter a number.");
            None
        }
    }
}

fn parse_optional_number(errors: &mut ValidationErrors, key: &str, raw: &str) -> Option<f64> {
    if raw.trim().is_empty() {
        None
    } else {
        parse_number(errors, key, raw)
    }
}

fn parse_date(errors: &mut ValidationErrors, key: &str, raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            errors.add(key, "Enter a valid date.");
            None
        }
    }
}

fn parse_id(errors: &mut ValidationErrors, key: &str, raw: &str) -> Option<i32> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<i32>() {
        Ok(id) => Some(id),
        Err(_) => {
            errors.add(
                key,
                "Select a valid choice. That choice is not one of the available choices.",
            );
            None
        }
    }
}

fn parse_choice<E>(errors: &mut ValidationErrors, key: &str, raw: &str) -> Option<E>
where
    E: ActiveEnum<Value = String>,
{
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match E::try_from_value(&raw.to_string()) {
        Ok(choice) => Some(choice),
        Err(_) => {
            errors.add(
                key,
                format!(
                    "Select a valid choice. {} is not one of the available choices.",
                    raw
                ),
            );
            None
        }
    }
}

fn finish<T>(errors: ValidationErrors, value: Option<T>) -> Result<T, ValidationErrors> {
    match value {
        Some(value) if errors.is_empty() => Ok(value),
        _ => Err(errors),
    }
}

/// `"in_progress"` -> `"In progress"`.
pub fn choice_label(value: &str) -> String {
    let spaced = value.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Options for a `<select>`, marking `selected`.
pub fn choices<E>(selected: &str) -> Vec<Value>
where
    E: ActiveEnum<Value = String> + Iterable,
{
    E::iter()
        .map(|choice| {
            let value = choice.to_value();
            json!({
                "value": value,
                "label": choice_label(&value),
                "selected": value == selected,
            })
        })
        .collect()
}

/// Options built from `(id, label)` pairs.
pub fn id_choices(rows: impl IntoIterator<Item = (i32, String)>, selected: &str) -> Vec<Value> {
    rows.into_iter()
        .map(|(id, label)| {
            let value = id.to_string();
            json!({
                "selected": value == selected.trim(),
                "value": value,
                "label": label,
            })
        })
        .collect()
}

fn date_text(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn id_text(id: Option<i32>) -> String {
    id.map(|id| id.to_string()).unwrap_or_default()
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RegistrationForm {
    pub username: String,
    pub email: String,
    pub farm_name: String,
    pub phone_number: String,
    pub password: String,
    pub password_confirm: String,
}

impl RegistrationForm {
    pub fn clean(&self) -> Result<RegistrationInput, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.password != self.password_confirm {
            errors.add("password_confirm", "The two password fields didn't match.");
        }
        let input = RegistrationInput {
            username: self.username.clone(),
            email: self.email.clone(),
            farm_name: optional(&self.farm_name),
            phone_number: optional(&self.phone_number),
            password: self.password.clone(),
        };
        finish(errors, Some(input))
    }

    /// Passwords are never echoed back into the page.
    pub fn redacted(&self) -> Self {
        Self {
            password: String::new(),
            password_confirm: String::new(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProfileForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub farm_name: String,
    pub city_or_region: String,
}

impl ProfileForm {
    pub fn from_model(model: &farmer::Model) -> Self {
        Self {
            first_name: model.first_name.clone(),
            last_name: model.last_name.clone(),
            email: model.email.clone(),
            phone_number: model.phone_number.clone().unwrap_or_default(),
            farm_name: model.farm_name.clone().unwrap_or_default(),
            city_or_region: model.city_or_region.clone().unwrap_or_default(),
        }
    }

    pub fn clean(&self) -> Result<ProfileInput, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.email.trim().is_empty() {
            errors.add("email", REQUIRED);
        }
        let input = ProfileInput {
            first_name: Some(self.first_name.clone()),
            last_name: Some(self.last_name.clone()),
            email: Some(self.email.clone()),
            phone_number: Some(self.phone_number.clone()),
            farm_name: Some(self.farm_name.clone()),
            city_or_region: Some(self.city_or_region.clone()),
            profile_photo: None,
        };
        finish(errors, Some(input))
    }
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FieldForm {
    pub name: String,
    pub location: String,
    pub size_in_hectares: String,
    pub soil_type: String,
}

impl FieldForm {
    pub fn from_model(model: &field::Model) -> Self {
        Self {
            name: model.name.clone(),
            location: model.location.clone().unwrap_or_default(),
            size_in_hectares: model.size_in_hectares.to_string(),
            soil_type: model.soil_type.clone().unwrap_or_default(),
        }
    }

    pub fn clean(&self) -> Result<FieldInput, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let size = parse_number(&mut errors, "size_in_hectares", &self.size_in_hectares);
        let input = size.map(|size_in_hectares| FieldInput {
            name: self.name.clone(),
            location: optional(&self.location),
            size_in_hectares,
            soil_type: optional(&self.soil_type),
        });
        finish(errors, input)
    }
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CropForm {
    pub name: String,
    pub description: String,
    pub category: String,
    pub fields: String,
    pub planted_on: String,
    pub expected_harvest: String,
    pub status: String,
}

impl CropForm {
    pub fn from_model(model: &crop::Model) -> Self {
        Self {
            name: model.name.clone(),
            description: model.description.clone(),
            category: model.category.clone(),
            fields: model.field_id.to_string(),
            planted_on: date_text(model.planted_on),
            expected_harvest: date_text(model.expected_harvest),
            status: model.status.to_value(),
        }
    }

    pub fn clean(&self) -> Result<CropInput, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let field_id = parse_id(&mut errors, "fields", &self.fields);
        if self.fields.trim().is_empty() {
            errors.add("fields", REQUIRED);
        }
        let planted_on = parse_date(&mut errors, "planted_on", &self.planted_on);
        let expected_harvest = parse_date(&mut errors, "expected_harvest", &self.expected_harvest);
        let status = parse_choice::<CropStatus>(&mut errors, "status", &self.status);
        let input = field_id.map(|field_id| CropInput {
            name: self.name.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
            field_id,
            planted_on,
            expected_harvest,
            status: status.unwrap_or_default(),
        });
        finish(errors, input)
    }
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ActivityForm {
    pub title: String,
    pub field: String,
    pub crop: String,
    pub scheduled_date: String,
    pub estimated_harvest_date: String,
    pub status: String,
    pub description: String,
}

impl ActivityForm {
    pub fn from_model(model: &activity::Model) -> Self {
        Self {
            title: model.title.clone(),
            field: id_text(model.field_id),
            crop: id_text(model.crop_id),
            scheduled_date: date_text(Some(model.scheduled_date)),
            estimated_harvest_date: date_text(model.estimated_harvest_date),
            status: model.status.to_value(),
            description: model.description.clone(),
        }
    }

    pub fn clean(&self) -> Result<ActivityInput, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let field_id = parse_id(&mut errors, "field", &self.field);
        let crop_id = parse_id(&mut errors, "crop", &self.crop);
        let scheduled_date = parse_date(&mut errors, "scheduled_date", &self.scheduled_date);
        if self.scheduled_date.trim().is_empty() {
            errors.add("scheduled_date", REQUIRED);
        }
        let estimated_harvest_date = parse_date(
            &mut errors,
            "estimated_harvest_date",
            &self.estimated_harvest_date,
        );
        let status = parse_choice::<ActivityStatus>(&mut errors, "status", &self.status);
        let input = scheduled_date.map(|scheduled_date| ActivityInput {
            title: self.title.clone(),
            field_id,
            scheduled_date,
            status: status.unwrap_or_default(),
            estimated_harvest_date,
            crop_id,
            description: self.description.clone(),
        });
        finish(errors, input)
    }
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WeatherForm {
    pub recorded_at: String,
    pub field: String,
    pub location: String,
    pub temperature: String,
    pub humidity: String,
    pub rainfall: String,
    pub wind_speed: String,
    pub source: String,
}

impl WeatherForm {
    pub fn from_model(model: &weather_record::Model) -> Self {
        Self {
            recorded_at: model.recorded_at.format("%Y-%m-%dT%H:%M").to_string(),
            field: id_text(model.field_id),
            location: model.location.clone(),
            temperature: model.temperature.to_string(),
            humidity: model.humidity.to_string(),
            rainfall: model.rainfall.to_string(),
            wind_speed: model.wind_speed.map(|w| w.to_string()).unwrap_or_default(),
            source: model.source.to_value(),
        }
    }

    pub fn clean(&self) -> Result<WeatherInput, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let recorded_at = if self.recorded_at.trim().is_empty() {
            errors.add("recorded_at", REQUIRED);
            None
        } else {
            let parsed = validation::parse_timestamp(&self.recorded_at);
            if parsed.is_none() {
                errors.add("recorded_at", "Enter a valid date/time.");
            }
            parsed
        };
        let field_id = parse_id(&mut errors, "field", &self.field);
        let temperature = parse_number(&mut errors, "temperature", &self.temperature);
        let humidity = parse_number(&mut errors, "humidity", &self.humidity);
        let rainfall = parse_optional_number(&mut errors, "rainfall", &self.rainfall);
        let wind_speed = parse_optional_number(&mut errors, "wind_speed", &self.wind_speed);
        let source = parse_choice::<WeatherSource>(&mut errors, "source", &self.source);

        let input = match (recorded_at, temperature, humidity) {
            (Some(recorded_at), Some(temperature), Some(humidity)) => Some(WeatherInput {
                recorded_at,
                field_id,
                location: self.location.clone(),
                temperature,
                humidity,
                rainfall: rainfall.unwrap_or(0.0),
                wind_speed,
                source: source.unwrap_or_default(),
            }),
            _ => None,
        };
        finish(errors, input)
    }
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RouteForm {
    pub route_name: String,
    pub route_path_geojson: String,
    pub security_status: String,
    pub risk_notes: String,
}

impl RouteForm {
    pub fn from_model(model: &secure_route::Model) -> Self {
        Self {
            route_name: model.route_name.clone(),
            route_path_geojson: model.route_path_geojson.to_string(),
            security_status: model.security_status.to_value(),
            risk_notes: model.risk_notes.clone().unwrap_or_default(),
        }
    }

    pub fn clean(&self) -> Result<RouteInput, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.security_status.trim().is_empty() {
            errors.add("security_status", REQUIRED);
        }
        let status =
            parse_choice::<SecurityStatus>(&mut errors, "security_status", &self.security_status);
        let input = status.map(|security_status| RouteInput {
            route_name: self.route_name.clone(),
            route_path_geojson: Value::String(self.route_path_geojson.clone()),
            security_status,
            risk_notes: optional(&self.risk_notes),
        });
        finish(errors, input)
    }
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReviewForm {
    pub content: String,
    pub rating: String,
}

impl ReviewForm {
    pub fn clean(&self) -> Result<ReviewInput, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let rating = match self.rating.trim() {
            "" => {
                errors.add("rating", REQUIRED);
                None
            }
            raw => match raw.parse::<i32>() {
                Ok(rating) => Some(rating),
                Err(_) => {
                    errors.add("rating", "Enter a whole number.");
                    None
                }
            },
        };
        let input = rating.map(|rating| ReviewInput {
            content: self.content.clone(),
            rating,
        });
        finish(errors, input)
    }
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PostForm {
    pub title: String,
    pub content: String,
}

impl PostForm {
    pub fn clean(&self) -> PostInput {
        PostInput {
            title: self.title.clone(),
            content: self.content.clone(),
        }
    }
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CommentForm {
    pub content: String,
    pub parent: String,
}

impl CommentForm {
    pub fn clean(&self) -> Result<CommentInput, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let parent = parse_id(&mut errors, "parent", &self.parent);
        let input = CommentInput {
            content: self.content.clone(),
            parent,
        };
        finish(errors, Some(input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_form_parses_size() {
        let form = FieldForm {
            name: "Alpha".to_string(),
            size_in_hectares: "5.5".to_string(),
            ..Default::default()
        };
        let input = form.clean().unwrap();
        assert_eq!(input.size_in_hectares, 5.5);
        assert_eq!(input.location, None);
    }

    #[test]
    fn field_form_reports_bad_number() {
        let form = FieldForm {
            name: "Alpha".to_string(),
            size_in_hectares: "five".to_string(),
            ..Default::default()
        };
        let errors = form.clean().unwrap_err();
        assert!(errors.contains("size_in_hectares"));
    }

    #[test]
    fn crop_form_rejects_unknown_status() {
        let form = CropForm {
            name: "Maize".to_string(),
            category: "Cereal".to_string(),
            fields: "3".to_string(),
            status: "rotten".to_string(),
            ..Default::default()
        };
        let errors = form.clean().unwrap_err();
        assert!(errors.contains("status"));
    }

    #[test]
    fn crop_form_defaults_status() {
        let form = CropForm {
            name: "Maize".to_string(),
            category: "Cereal".to_string(),
            fields: "3".to_string(),
            planted_on: "2025-03-01".to_string(),
            ..Default::default()
        };
        let input = form.clean().unwrap();
        assert_eq!(input.status, CropStatus::Planted);
        assert_eq!(input.field_id, 3);
        assert_eq!(input.planted_on, NaiveDate::from_ymd_opt(2025, 3, 1));
    }

    #[test]
    fn activity_form_requires_date() {
        let form = ActivityForm {
            title: "Harvesting Task".to_string(),
            ..Default::default()
        };
        let errors = form.clean().unwrap_err();
        assert!(errors.contains("scheduled_date"));
    }

    #[test]
    fn weather_form_accepts_datetime_local_value() {
        let form = WeatherForm {
            recorded_at: "2025-12-29T10:00".to_string(),
            location: "North".to_string(),
            temperature: "21.5".to_string(),
            humidity: "60".to_string(),
            ..Default::default()
        };
        let input = form.clean().unwrap();
        assert_eq!(input.rainfall, 0.0);
        assert_eq!(input.source, WeatherSource::Manual);
    }

    #[test]
    fn registration_passwords_must_match() {
        let form = RegistrationForm {
            username: "farmer_a".to_string(),
            email: "a@test.com".to_string(),
            password: "password123".to_string(),
            password_confirm: "password321".to_string(),
            ..Default::default()
        };
        assert!(form.clean().unwrap_err().contains("password_confirm"));
        assert!(form.redacted().password.is_empty());
    }

    #[test]
    fn choices_mark_selection() {
        let options = choices::<ActivityStatus>("completed");
        assert_eq!(options.len(), 4);
        let selected: Vec<_> = options
            .iter()
            .filter(|o| o["selected"] == true)
            .map(|o| o["value"].clone())
            .collect();
        assert_eq!(selected, vec![json!("completed")]);
        assert_eq!(choice_label("in_progress"), "In progress");
    }
}
