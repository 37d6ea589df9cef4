//! HTML pages and the form payloads that feed them

use askama::Template;
use axum::response::Html;
use serde::Deserialize;

use super::routes::AppError;
use crate::profile::{direct_link, ProfileView};
use crate::store::{StoreError, StoreFields, StoreRecord};
use crate::util::time::format_millis;

/// Render a template into an HTML response
pub fn render<T: Template>(page: &T) -> Result<Html<String>, AppError> {
    page.render()
        .map(Html)
        .map_err(|e| AppError::Internal(format!("template rendering failed: {}", e)))
}

/// Raw store form as posted by the browser. Every field arrives as text.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreForm {
    pub name: String,
    pub logo_url: String,
    pub description: String,
    pub opening_hours: String,
    pub website_url: String,
    pub whatsapp: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub location_url: String,
    pub facebook: String,
    pub instagram: String,
    pub telegram: String,
    pub google_review_url: String,
}

fn optional(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

impl StoreForm {
    /// Only the name is required; every value is otherwise kept verbatim
    pub fn into_fields(self) -> Result<StoreFields, StoreError> {
        if self.name.trim().is_empty() {
            return Err(StoreError::Validation("Name is required".to_string()));
        }
        Ok(StoreFields {
            name: self.name,
            logo_url: optional(self.logo_url),
            description: self.description,
            opening_hours: self.opening_hours,
            website_url: optional(self.website_url),
            whatsapp: optional(self.whatsapp),
            address: self.address,
            phone: optional(self.phone),
            email: optional(self.email),
            location_url: self.location_url,
            facebook: optional(self.facebook),
            instagram: optional(self.instagram),
            telegram: optional(self.telegram),
            google_review_url: optional(self.google_review_url),
        })
    }
}

impl From<&StoreFields> for StoreForm {
    fn from(fields: &StoreFields) -> Self {
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        Self {
            name: fields.name.clone(),
            logo_url: text(&fields.logo_url),
            description: fields.description.clone(),
            opening_hours: fields.opening_hours.clone(),
            website_url: text(&fields.website_url),
            whatsapp: text(&fields.whatsapp),
            address: fields.address.clone(),
            phone: text(&fields.phone),
            email: text(&fields.email),
            location_url: fields.location_url.clone(),
            facebook: text(&fields.facebook),
            instagram: text(&fields.instagram),
            telegram: text(&fields.telegram),
            google_review_url: text(&fields.google_review_url),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    #[serde(default)]
    pub confirm: String,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginPage {
    pub email: String,
    pub error: Option<String>,
}

/// One line of the dashboard's store list
#[derive(Debug, Clone)]
pub struct StoreRow {
    pub id: String,
    pub name: String,
    pub direct_link: String,
    pub updated: String,
}

impl StoreRow {
    pub fn new(record: &StoreRecord, origin: &str) -> Self {
        Self {
            id: record.id.clone(),
            name: record.fields.name.clone(),
            direct_link: direct_link(origin, &record.id),
            updated: format_millis(record.updated_at),
        }
    }
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardPage {
    pub operator: String,
    pub show_add_form: bool,
    pub form: StoreForm,
    pub error: Option<String>,
    pub new_store_link: Option<String>,
    pub stores: Vec<StoreRow>,
}

#[derive(Template)]
#[template(path = "edit.html")]
pub struct EditPage {
    pub id: String,
    pub form: StoreForm,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "confirm_delete.html")]
pub struct ConfirmDeletePage {
    pub id: String,
    pub name: String,
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfilePage {
    pub store: ProfileView,
}

#[derive(Template)]
#[template(path = "not_found.html")]
pub struct NotFoundPage;
