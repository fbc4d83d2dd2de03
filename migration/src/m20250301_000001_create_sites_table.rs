use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Sites::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Sites::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Sites::MirrorRoot)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Sites::SourceRoot).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Sites::Enabled)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Sites::ProxySubdomains).boolean())
                    .col(ColumnDef::new(Sites::ProxyExternalDomains).boolean())
                    .col(ColumnDef::new(Sites::RewriteJsRedirects).boolean())
                    .col(ColumnDef::new(Sites::RemoveAds).boolean())
                    .col(ColumnDef::new(Sites::InjectAds).boolean())
                    .col(ColumnDef::new(Sites::RemoveAnalytics).boolean())
                    .col(ColumnDef::new(Sites::MediaPolicy).string_len(32))
                    .col(ColumnDef::new(Sites::SessionMode).string_len(32))
                    .col(ColumnDef::new(Sites::CustomAdHtml).text())
                    .col(ColumnDef::new(Sites::CustomTrackerJs).text())
                    .col(
                        ColumnDef::new(Sites::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Sites::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // 镜像域名查找索引
        manager
            .create_index(
                Index::create()
                    .name("idx_sites_mirror_root")
                    .table(Sites::Table)
                    .col(Sites::MirrorRoot)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_sites_enabled")
                    .table(Sites::Table)
                    .col(Sites::Enabled)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Sites::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Sites {
    Table,
    Id,
    MirrorRoot,
    SourceRoot,
    Enabled,
    ProxySubdomains,
    ProxyExternalDomains,
    RewriteJsRedirects,
    RemoveAds,
    InjectAds,
    RemoveAnalytics,
    MediaPolicy,
    SessionMode,
    CustomAdHtml,
    CustomTrackerJs,
    CreatedAt,
    UpdatedAt,
}
