use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CookieJars::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CookieJars::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CookieJars::SiteId).integer().not_null())
                    .col(
                        ColumnDef::new(CookieJars::SessionId)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CookieJars::OriginHost)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(CookieJars::CookieData).text())
                    .col(
                        ColumnDef::new(CookieJars::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(CookieJars::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cookie_jars_site_id")
                            .from(CookieJars::Table, CookieJars::SiteId)
                            .to(Sites::Table, Sites::Id)
                            .on_update(ForeignKeyAction::Cascade)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // (site_id, session_id, origin_host) 组合查找索引，保证元组唯一
        manager
            .create_index(
                Index::create()
                    .name("idx_cookie_jars_lookup")
                    .table(CookieJars::Table)
                    .col(CookieJars::SiteId)
                    .col(CookieJars::SessionId)
                    .col(CookieJars::OriginHost)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CookieJars::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CookieJars {
    Table,
    Id,
    SiteId,
    SessionId,
    OriginHost,
    CookieData,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Sites {
    Table,
    Id,
}
