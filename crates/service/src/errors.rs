use models::errors::ModelError;
use sea_orm::DbErr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("database error: {0}")]
    Db(String),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }

    pub fn validation(msg: impl Into<String>) -> Self { Self::Validation(msg.into()) }
}

impl From<ModelError> for ServiceError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Validation(m) => ServiceError::Validation(m),
            ModelError::Conflict(m) => ServiceError::Conflict(m),
            ModelError::Db(m) => ServiceError::Db(m),
        }
    }
}

impl From<DbErr> for ServiceError {
    fn from(e: DbErr) -> Self { ModelError::from(e).into() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_errors_fold_into_service_variants() {
        assert!(matches!(ServiceError::from(ModelError::validation("bad")), ServiceError::Validation(m) if m == "bad"));
        assert!(matches!(ServiceError::from(ModelError::Conflict("dup".into())), ServiceError::Conflict(_)));
        assert!(matches!(ServiceError::from(ModelError::Db("down".into())), ServiceError::Db(_)));
    }

    #[test]
    fn not_found_message_names_entity() {
        assert_eq!(ServiceError::not_found("post").to_string(), "not found: post not found");
    }
}
