//! Create `post` table (blog).
//! Category is optional and cleared when the category goes away; posts die with their author.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Post::Table)
                    .if_not_exists()
                    .col(uuid(Post::Id).primary_key())
                    .col(string_len(Post::Title, 200).not_null())
                    .col(string_len(Post::Slug, 220).unique_key().not_null())
                    .col(string_len_null(Post::Excerpt, 500))
                    .col(text(Post::Content).not_null())
                    .col(string_len_null(Post::CoverImage, 512))
                    .col(uuid_null(Post::CategoryId))
                    .col(uuid(Post::AuthorId).not_null())
                    .col(boolean(Post::Published).not_null())
                    .col(timestamp_with_time_zone_null(Post::PublishedAt))
                    .col(timestamp_with_time_zone(Post::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Post::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_category")
                            .from(Post::Table, Post::CategoryId)
                            .to(Category::Table, Category::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_author")
                            .from(Post::Table, Post::AuthorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Post::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Post {
    Table,
    Id,
    Title,
    Slug,
    Excerpt,
    Content,
    CoverImage,
    CategoryId,
    AuthorId,
    Published,
    PublishedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Category { Table, Id }

#[derive(DeriveIden)]
enum User { Table, Id }
