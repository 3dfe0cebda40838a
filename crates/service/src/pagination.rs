//! Paged queries on top of sea-orm's `Paginator`.

use common::{pagination::Pagination, types::Page};
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait, Select};

use crate::errors::ServiceError;

/// Run `select` for one page and count the full result set.
pub async fn fetch_page<E>(db: &DatabaseConnection, select: Select<E>, opts: Pagination) -> Result<Page<E::Model>, ServiceError>
where
    E: EntityTrait,
    E::Model: Send + Sync + 'static,
{
    let opts = opts.normalized();
    let paginator = select.paginate(db, opts.limit);
    let total = paginator.num_items().await?;
    let items = paginator.fetch_page(opts.page_index()).await?;
    Ok(Page::new(items, opts.page, opts.limit, total))
}
