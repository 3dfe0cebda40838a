use uuid::Uuid;
use chrono::Utc;
use sea_orm::{
    sea_query::{Expr, Func, LikeExpr},
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::{info, instrument};

use common::{pagination::Pagination, types::Page};
use models::{category, post, validate};
use crate::{errors::ServiceError, pagination::fetch_page, slugs::unique_slug};

/// Public listing filters.
#[derive(Debug, Clone, Default)]
pub struct PostQuery {
    /// Category slug.
    pub category: Option<String>,
    /// Case-insensitive title match.
    pub search: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PostInput {
    pub title: String,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub content: String,
    pub cover_image: Option<String>,
    pub category_id: Option<Uuid>,
    pub published: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PostUpdate {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub cover_image: Option<String>,
    /// `Some(None)` detaches the category.
    pub category_id: Option<Option<Uuid>>,
    pub published: Option<bool>,
}

/// Backslash-escape LIKE metacharacters so search terms match literally.
pub(crate) fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

pub(crate) fn title_like(term: &str) -> LikeExpr {
    LikeExpr::new(format!("%{}%", escape_like(&term.trim().to_lowercase()))).escape('\\')
}

/// Published posts, newest first.
pub async fn list_published(db: &DatabaseConnection, query: PostQuery, opts: Pagination) -> Result<Page<post::Model>, ServiceError> {
    let mut select = post::Entity::find().filter(post::Column::Published.eq(true));
    if let Some(slug) = query.category.as_deref().filter(|s| !s.trim().is_empty()) {
        match category::find_by_slug(db, slug.trim()).await? {
            Some(cat) => select = select.filter(post::Column::CategoryId.eq(cat.id)),
            None => {
                let opts = opts.normalized();
                return Ok(Page::new(Vec::new(), opts.page, opts.limit, 0));
            }
        }
    }
    if let Some(term) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
        select = select.filter(
            Expr::expr(Func::lower(Expr::col((post::Entity, post::Column::Title)))).like(title_like(term)),
        );
    }
    let select = select
        .order_by_desc(post::Column::PublishedAt)
        .order_by_desc(post::Column::CreatedAt);
    fetch_page(db, select, opts).await
}

/// Drafts are indistinguishable from missing posts.
pub async fn get_published_by_slug(db: &DatabaseConnection, slug: &str) -> Result<post::Model, ServiceError> {
    match post::find_by_slug(db, slug).await? {
        Some(p) if p.published => Ok(p),
        _ => Err(ServiceError::not_found("post")),
    }
}

pub async fn get_post(db: &DatabaseConnection, id: Uuid) -> Result<post::Model, ServiceError> {
    post::Entity::find_by_id(id).one(db).await?.ok_or_else(|| ServiceError::not_found("post"))
}

async fn ensure_category(db: &DatabaseConnection, id: Option<Uuid>) -> Result<(), ServiceError> {
    if let Some(id) = id {
        if category::Entity::find_by_id(id).one(db).await?.is_none() {
            return Err(ServiceError::validation("category does not exist"));
        }
    }
    Ok(())
}

async fn resolve_slug(db: &DatabaseConnection, explicit: Option<&str>, source: &str, except: Option<Uuid>) -> Result<String, ServiceError> {
    match explicit.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => {
            let s = validate::slug(s)?;
            if post::slug_taken(db, &s, except).await? {
                return Err(ServiceError::Conflict(format!("slug '{s}' already in use")));
            }
            Ok(s)
        }
        None => unique_slug(source, |s| async move { post::slug_taken(db, &s, except).await }).await,
    }
}

#[instrument(skip(db, input), fields(author_id = %author_id))]
pub async fn create_post(db: &DatabaseConnection, author_id: Uuid, input: PostInput) -> Result<post::Model, ServiceError> {
    let title = post::validate_title(&input.title)?;
    ensure_category(db, input.category_id).await?;
    let slug = resolve_slug(db, input.slug.as_deref(), &title, None).await?;
    let created = post::create(
        db,
        post::NewPost {
            title,
            slug,
            excerpt: input.excerpt,
            content: input.content,
            cover_image: input.cover_image,
            category_id: input.category_id,
            author_id,
            published: input.published,
        },
    )
    .await?;
    info!(id = %created.id, slug = %created.slug, published = created.published, "created post");
    Ok(created)
}

#[instrument(skip(db, update))]
pub async fn update_post(db: &DatabaseConnection, id: Uuid, update: PostUpdate) -> Result<post::Model, ServiceError> {
    let existing = get_post(db, id).await?;
    let title = update.title.as_deref().map(post::validate_title).transpose()?;
    let content = update.content.as_deref().map(post::validate_content).transpose()?;
    let excerpt = update.excerpt.as_deref().map(|e| post::validate_excerpt(Some(e))).transpose()?;
    let cover_image = update.cover_image.as_deref().map(|c| post::validate_cover_image(Some(c))).transpose()?;
    ensure_category(db, update.category_id.flatten()).await?;
    let slug = match (update.slug.as_deref(), title.as_deref()) {
        (Some(explicit), _) => Some(resolve_slug(db, Some(explicit), &existing.title, Some(id)).await?),
        (None, Some(t)) if t != existing.title => Some(resolve_slug(db, None, t, Some(id)).await?),
        _ => None,
    };
    let first_publish = update.published == Some(true) && existing.published_at.is_none();

    let now = Utc::now().into();
    let mut am: post::ActiveModel = existing.into();
    if let Some(title) = title { am.title = Set(title); }
    if let Some(slug) = slug { am.slug = Set(slug); }
    if let Some(content) = content { am.content = Set(content); }
    if let Some(excerpt) = excerpt { am.excerpt = Set(excerpt); }
    if let Some(cover_image) = cover_image { am.cover_image = Set(cover_image); }
    if let Some(category_id) = update.category_id { am.category_id = Set(category_id); }
    if let Some(published) = update.published { am.published = Set(published); }
    if first_publish { am.published_at = Set(Some(now)); }
    am.updated_at = Set(now);
    let updated = am.update(db).await?;
    info!(id = %updated.id, published = updated.published, "updated post");
    Ok(updated)
}

#[instrument(skip(db))]
pub async fn delete_post(db: &DatabaseConnection, id: Uuid) -> Result<(), ServiceError> {
    let res = post::Entity::delete_by_id(id).exec(db).await?;
    if res.rows_affected == 0 {
        return Err(ServiceError::not_found("post"));
    }
    info!(%id, "deleted post");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::get_db;
    use models::user;

    fn input(title: &str, published: bool) -> PostInput {
        PostInput {
            title: title.into(),
            slug: None,
            excerpt: None,
            content: "Body text".into(),
            cover_image: None,
            category_id: None,
            published,
        }
    }

    #[test]
    fn search_terms_escape_like_wildcards() {
        assert_eq!(escape_like("rust tips"), "rust tips");
        assert_eq!(escape_like("100%_off"), "100\\%\\_off");
        assert_eq!(escape_like(r"c:\dir"), r"c:\\dir");
    }

    #[tokio::test]
    async fn publish_flow_and_visibility() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };
        let author = user::create(&db, "Author", &format!("{}@example.com", Uuid::new_v4()), user::Role::Admin).await?;

        let marker = Uuid::new_v4().simple().to_string();
        let draft = create_post(&db, author.id, input(&format!("Draft {marker}"), false)).await?;
        assert!(draft.published_at.is_none());
        assert!(matches!(get_published_by_slug(&db, &draft.slug).await, Err(ServiceError::NotFound(_))));

        let listed = list_published(&db, PostQuery { search: Some(marker.to_uppercase()), ..Default::default() }, Pagination::default()).await?;
        assert_eq!(listed.total, 0);

        let live = update_post(&db, draft.id, PostUpdate { published: Some(true), ..Default::default() }).await?;
        let first_published_at = live.published_at;
        assert!(first_published_at.is_some());

        update_post(&db, draft.id, PostUpdate { published: Some(false), ..Default::default() }).await?;
        let again = update_post(&db, draft.id, PostUpdate { published: Some(true), ..Default::default() }).await?;
        assert_eq!(again.published_at, first_published_at);

        let listed = list_published(&db, PostQuery { search: Some(marker.to_uppercase()), ..Default::default() }, Pagination::default()).await?;
        assert_eq!(listed.total, 1);

        let unknown_cat = list_published(&db, PostQuery { category: Some("no-such-category-xyz".into()), ..Default::default() }, Pagination::default()).await?;
        assert!(unknown_cat.items.is_empty());

        let bad_cat = create_post(&db, author.id, PostInput { category_id: Some(Uuid::new_v4()), ..input("Orphan", true) }).await;
        assert!(matches!(bad_cat, Err(ServiceError::Validation(_))));

        delete_post(&db, draft.id).await?;
        user::hard_delete(&db, author.id).await?;
        Ok(())
    }
    #[tokio::test]
    async fn search_treats_percent_as_a_literal() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };
        let author = user::create(&db, "Author", &format!("{}@example.com", Uuid::new_v4()), user::Role::Admin).await?;

        let marker = Uuid::new_v4().simple().to_string();
        let sale = create_post(&db, author.id, input(&format!("{marker} 50% off"), true)).await?;
        let other = create_post(&db, author.id, input(&format!("{marker} 50 ways off"), true)).await?;

        let found = list_published(&db, PostQuery { search: Some(format!("{marker} 50%")), ..Default::default() }, Pagination::default()).await?;
        assert_eq!(found.total, 1);
        assert_eq!(found.items[0].id, sale.id);

        let both = list_published(&db, PostQuery { search: Some(marker), ..Default::default() }, Pagination::default()).await?;
        assert_eq!(both.total, 2);

        delete_post(&db, sale.id).await?;
        delete_post(&db, other.id).await?;
        user::hard_delete(&db, author.id).await?;
        Ok(())
    }

    #[tokio::test]
    async fn category_can_be_detached_on_update() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };
        let author = user::create(&db, "Author", &format!("{}@example.com", Uuid::new_v4()), user::Role::Admin).await?;
        let cat = category::create(&db, "Guides", &format!("guides-{}", Uuid::new_v4().simple()), None).await?;

        let p = create_post(&db, author.id, PostInput { category_id: Some(cat.id), ..input("Filed", true) }).await?;
        assert_eq!(p.category_id, Some(cat.id));

        let untouched = update_post(&db, p.id, PostUpdate { title: Some("Still filed".into()), ..Default::default() }).await?;
        assert_eq!(untouched.category_id, Some(cat.id));

        let detached = update_post(&db, p.id, PostUpdate { category_id: Some(None), ..Default::default() }).await?;
        assert_eq!(detached.category_id, None);

        let missing = update_post(&db, p.id, PostUpdate { category_id: Some(Some(Uuid::new_v4())), ..Default::default() }).await;
        assert!(matches!(missing, Err(ServiceError::Validation(_))));

        delete_post(&db, p.id).await?;
        category::Entity::delete_by_id(cat.id).exec(&db).await?;
        user::hard_delete(&db, author.id).await?;
        Ok(())
    }
}
