use sea_orm::{entity::prelude::*, Set, DatabaseConnection, QueryFilter};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::{self, ModelError};
use crate::validate;

pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_DELETED: &str = "deleted";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub status: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_deleted(&self) -> bool { self.deleted_at.is_some() }

    pub fn role(&self) -> Role { Role::parse(&self.role).unwrap_or(Role::User) }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ModelError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err(ModelError::validation("role must be 'user' or 'admin'")),
        }
    }
}

pub fn validate_email(email: &str) -> Result<String, ModelError> { validate::email(email) }

pub fn validate_name(name: &str) -> Result<String, ModelError> { validate::text("name", name, 1, 128) }

pub fn validate_password(password: &str) -> Result<(), ModelError> {
    let n = password.chars().count();
    if n < 8 { return Err(ModelError::validation("password too short (>=8)")); }
    if n > 128 { return Err(ModelError::validation("password too long (<=128)")); }
    Ok(())
}

pub async fn create(db: &DatabaseConnection, name: &str, email: &str, role: Role) -> Result<Model, errors::ModelError> {
    let name = validate_name(name)?;
    let email = validate_email(email)?;
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        email: Set(email),
        role: Set(role.as_str().to_string()),
        status: Set(STATUS_ACTIVE.into()),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(None),
    };
    Ok(am.insert(db).await?)
}

/// Lookup by (normalized) email, including soft-deleted rows.
pub async fn find_by_email(db: &DatabaseConnection, email: &str) -> Result<Option<Model>, errors::ModelError> {
    let email = email.trim().to_lowercase();
    Ok(Entity::find().filter(Column::Email.eq(email)).one(db).await?)
}

pub async fn soft_delete(db: &DatabaseConnection, id: Uuid) -> Result<(), errors::ModelError> {
    let mut found: ActiveModel = Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ModelError::validation("user not found"))?
        .into();
    let now = Utc::now().into();
    found.deleted_at = Set(Some(now));
    found.status = Set(STATUS_DELETED.into());
    found.updated_at = Set(now);
    found.update(db).await?;
    Ok(())
}

pub async fn hard_delete(db: &DatabaseConnection, id: Uuid) -> Result<(), errors::ModelError> {
    Entity::delete_by_id(id).exec(db).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_parse_case_insensitively() {
        assert_eq!(Role::parse("Admin").unwrap(), Role::Admin);
        assert_eq!(Role::parse("user").unwrap(), Role::User);
        assert!(Role::parse("root").is_err());
    }

    #[test]
    fn password_bounds() {
        assert!(validate_password("1234567").is_err());
        assert!(validate_password("12345678").is_ok());
        assert!(validate_password(&"x".repeat(129)).is_err());
    }
}
