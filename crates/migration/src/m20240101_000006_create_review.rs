//! Create `review` table; one review per (template, user).
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Review::Table)
                    .if_not_exists()
                    .col(uuid(Review::Id).primary_key())
                    .col(uuid(Review::TemplateId).not_null())
                    .col(uuid(Review::UserId).not_null())
                    .col(integer(Review::Rating).not_null())
                    .col(text_null(Review::Comment))
                    .col(timestamp_with_time_zone(Review::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Review::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_review_template")
                            .from(Review::Table, Review::TemplateId)
                            .to(Template::Table, Template::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_review_user")
                            .from(Review::Table, Review::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uniq_review_template_user")
                    .table(Review::Table)
                    .col(Review::TemplateId)
                    .col(Review::UserId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Review::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Review { Table, Id, TemplateId, UserId, Rating, Comment, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum Template { Table, Id }

#[derive(DeriveIden)]
enum User { Table, Id }
