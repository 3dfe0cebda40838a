use sea_orm::{entity::prelude::*, Set, DatabaseConnection};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors;
use crate::validate;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "contact_message")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub subject: String,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    pub handled: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Contact form fields after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

pub fn validate_form(name: &str, email: &str, subject: &str, message: &str) -> Result<ContactForm, errors::ModelError> {
    Ok(ContactForm {
        name: validate::text("name", name, 1, 128)?,
        email: validate::email(email)?,
        subject: validate::text("subject", subject, 1, 200)?,
        message: validate::text("message", message, 1, 5000)?,
    })
}

pub async fn create(db: &DatabaseConnection, form: ContactForm) -> Result<Model, errors::ModelError> {
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(form.name),
        email: Set(form.email),
        subject: Set(form.subject),
        message: Set(form.message),
        handled: Set(false),
        created_at: Set(Utc::now().into()),
    };
    Ok(am.insert(db).await?)
}
