use uuid::Uuid;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait};
use tracing::{info, instrument};

use common::{pagination::Pagination, types::Page};
use models::user::{self, Role};
use crate::{auth, errors::ServiceError, pagination::fetch_page};

/// Fields a user may change on their own profile.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub password: Option<String>,
}

/// Fields an admin may change on any account.
#[derive(Debug, Clone, Default)]
pub struct AdminUserUpdate {
    pub name: Option<String>,
    pub role: Option<String>,
}

/// Get a user by id, soft-deleted included.
pub async fn get_user(db: &DatabaseConnection, id: Uuid) -> Result<user::Model, ServiceError> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("user"))
}

/// The account behind a token; deleted accounts no longer authenticate.
pub async fn get_active_user(db: &DatabaseConnection, id: Uuid) -> Result<user::Model, ServiceError> {
    let found = get_user(db, id).await?;
    if found.is_deleted() {
        return Err(ServiceError::Unauthorized("account deleted".into()));
    }
    Ok(found)
}

/// Active users, newest first.
pub async fn list_users(db: &DatabaseConnection, opts: Pagination) -> Result<Page<user::Model>, ServiceError> {
    let select = user::Entity::find()
        .filter(user::Column::DeletedAt.is_null())
        .order_by_desc(user::Column::CreatedAt);
    fetch_page(db, select, opts).await
}

/// Both fields are validated before anything is written; the password and
/// name changes commit together or not at all.
#[instrument(skip(db, update), fields(user_id = %id))]
pub async fn update_profile(db: &DatabaseConnection, id: Uuid, update: ProfileUpdate) -> Result<user::Model, ServiceError> {
    let existing = get_active_user(db, id).await?;
    let name = update.name.as_deref().map(user::validate_name).transpose()?;
    let hash = match update.password.as_deref() {
        Some(password) => {
            user::validate_password(password)?;
            Some(auth::hash_password(password).map_err(|e| ServiceError::Db(e.to_string()))?)
        }
        None => None,
    };
    if name.is_none() && hash.is_none() {
        return Ok(existing);
    }

    let txn = db.begin().await?;
    let password_changed = hash.is_some();
    if let Some(hash) = hash {
        models::user_credentials::upsert_password(&txn, id, hash, auth::service::PASSWORD_ALGORITHM).await?;
    }
    let updated = match name {
        Some(name) => {
            let mut am: user::ActiveModel = existing.into();
            am.name = Set(name);
            am.updated_at = Set(Utc::now().into());
            am.update(&txn).await?
        }
        None => existing,
    };
    txn.commit().await?;
    if password_changed {
        info!("password changed");
    }
    Ok(updated)
}

#[instrument(skip(db, update), fields(user_id = %id))]
pub async fn admin_update_user(db: &DatabaseConnection, id: Uuid, update: AdminUserUpdate) -> Result<user::Model, ServiceError> {
    let existing = get_user(db, id).await?;
    let name = update.name.as_deref().map(user::validate_name).transpose()?;
    let role = update.role.as_deref().map(Role::parse).transpose()?;
    let mut am: user::ActiveModel = existing.into();
    if let Some(name) = name { am.name = Set(name); }
    if let Some(role) = role { am.role = Set(role.as_str().to_string()); }
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(db).await?;
    info!(role = %updated.role, "user updated by admin");
    Ok(updated)
}

/// Soft-delete a user (marks deleted_at).
#[instrument(skip(db))]
pub async fn soft_delete_user(db: &DatabaseConnection, id: Uuid) -> Result<(), ServiceError> {
    let existing = get_user(db, id).await?;
    if existing.is_deleted() {
        return Err(ServiceError::not_found("user"));
    }
    user::soft_delete(db, id).await?;
    info!(user_id = %id, "user soft-deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::get_db;

    #[tokio::test]
    async fn user_admin_flow() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };

        let email = format!("svc_{}@example.com", Uuid::new_v4());
        let u = user::create(&db, "Svc User", &email, Role::User).await?;

        let updated = admin_update_user(&db, u.id, AdminUserUpdate { name: Some("New Name".into()), role: Some("admin".into()) }).await?;
        assert_eq!(updated.name, "New Name");
        assert_eq!(updated.role, "admin");

        let bad = admin_update_user(&db, u.id, AdminUserUpdate { role: Some("root".into()), ..Default::default() }).await;
        assert!(matches!(bad, Err(ServiceError::Validation(_))));

        let profile = update_profile(&db, u.id, ProfileUpdate { name: Some("Me".into()), password: Some("longenough".into()) }).await?;
        assert_eq!(profile.name, "Me");
        assert!(models::user_credentials::find_by_user(&db, u.id).await?.is_some());

        soft_delete_user(&db, u.id).await?;
        assert!(matches!(get_active_user(&db, u.id).await, Err(ServiceError::Unauthorized(_))));
        assert!(matches!(soft_delete_user(&db, u.id).await, Err(ServiceError::NotFound(_))));

        let page = list_users(&db, Pagination::new(1, 100)).await?;
        assert!(page.items.iter().all(|x| x.deleted_at.is_none()));

        user::hard_delete(&db, u.id).await?;
        Ok(())
    }

    #[tokio::test]
    async fn rejected_profile_update_keeps_the_old_password() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };

        let email = format!("svc_{}@example.com", Uuid::new_v4());
        let u = user::create(&db, "Keeps Password", &email, Role::User).await?;
        update_profile(&db, u.id, ProfileUpdate { password: Some("original-pass".into()), ..Default::default() }).await?;
        let before = models::user_credentials::find_by_user(&db, u.id).await?.expect("credentials");

        let res = update_profile(&db, u.id, ProfileUpdate { name: Some("   ".into()), password: Some("replacement-pass".into()) }).await;
        assert!(matches!(res, Err(ServiceError::Validation(_))));

        let after = models::user_credentials::find_by_user(&db, u.id).await?.expect("credentials");
        assert_eq!(after.password_hash, before.password_hash);
        assert!(crate::auth::service::verify_password("original-pass", &after.password_hash)?);
        assert_eq!(get_user(&db, u.id).await?.name, "Keeps Password");

        user::hard_delete(&db, u.id).await?;
        Ok(())
    }
}
