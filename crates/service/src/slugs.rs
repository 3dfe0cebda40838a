use std::future::Future;

use common::slug;
use models::errors::ModelError;

use crate::errors::ServiceError;

/// Attempts before giving up on finding a free suffix.
const MAX_ATTEMPTS: u32 = 100;

/// Slugify `source` and append `-2`, `-3`, ... until `taken` reports the slug free.
pub async fn unique_slug<F, Fut>(source: &str, mut taken: F) -> Result<String, ServiceError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<bool, ModelError>>,
{
    let base = slug::slugify(source);
    if base.is_empty() {
        return Err(ServiceError::validation("slug must contain at least one letter or digit"));
    }
    for attempt in 1..=MAX_ATTEMPTS {
        let candidate = slug::with_suffix(&base, attempt);
        if !taken(candidate.clone()).await? {
            return Ok(candidate);
        }
    }
    Err(ServiceError::Conflict(format!("no free slug for '{base}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_free_suffix_wins() {
        let used = ["hello-world", "hello-world-2"];
        let got = unique_slug("Hello World", |s| async move { Ok(used.contains(&s.as_str())) }).await.unwrap();
        assert_eq!(got, "hello-world-3");
    }

    #[tokio::test]
    async fn unsluggable_input_is_rejected() {
        let err = unique_slug("???", |_| async { Ok(false) }).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }
}
