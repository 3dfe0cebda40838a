use uuid::Uuid;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};
use tracing::{info, instrument};

use common::{pagination::Pagination, types::Page};
use models::contact_message;
use crate::{errors::ServiceError, pagination::fetch_page};

/// Store a contact form submission. Nothing is mailed out.
#[instrument(skip_all, fields(email = %email))]
pub async fn submit(db: &DatabaseConnection, name: &str, email: &str, subject: &str, message: &str) -> Result<contact_message::Model, ServiceError> {
    let form = contact_message::validate_form(name, email, subject, message)?;
    let created = contact_message::create(db, form).await?;
    info!(id = %created.id, "contact message stored");
    Ok(created)
}

pub async fn list_messages(db: &DatabaseConnection, opts: Pagination) -> Result<Page<contact_message::Model>, ServiceError> {
    let select = contact_message::Entity::find().order_by_desc(contact_message::Column::CreatedAt);
    fetch_page(db, select, opts).await
}

#[instrument(skip(db))]
pub async fn mark_handled(db: &DatabaseConnection, id: Uuid) -> Result<contact_message::Model, ServiceError> {
    let existing = contact_message::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("contact message"))?;
    if existing.handled {
        return Ok(existing);
    }
    let mut am: contact_message::ActiveModel = existing.into();
    am.handled = Set(true);
    Ok(am.update(db).await?)
}

#[instrument(skip(db))]
pub async fn delete_message(db: &DatabaseConnection, id: Uuid) -> Result<(), ServiceError> {
    let res = contact_message::Entity::delete_by_id(id).exec(db).await?;
    if res.rows_affected == 0 {
        return Err(ServiceError::not_found("contact message"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::get_db;

    #[tokio::test]
    async fn submit_handle_delete() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };

        assert!(matches!(submit(&db, "", "a@b.com", "s", "m").await, Err(ServiceError::Validation(_))));
        let m = submit(&db, "Jane", "Jane@Example.com", "Licensing", "Can I use it twice?").await?;
        assert_eq!(m.email, "jane@example.com");
        assert!(mark_handled(&db, m.id).await?.handled);
        assert!(mark_handled(&db, m.id).await?.handled);
        delete_message(&db, m.id).await?;
        assert!(matches!(delete_message(&db, m.id).await, Err(ServiceError::NotFound(_))));
        Ok(())
    }
}
