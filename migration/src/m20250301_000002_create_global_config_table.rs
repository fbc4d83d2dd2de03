use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GlobalConfig::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GlobalConfig::Id)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(GlobalConfig::ProxySubdomains)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(GlobalConfig::ProxyExternalDomains)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(GlobalConfig::RewriteJsRedirects)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(GlobalConfig::RemoveAds)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(GlobalConfig::InjectAds)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(GlobalConfig::RemoveAnalytics)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(GlobalConfig::MediaPolicy)
                            .string_len(32)
                            .not_null()
                            .default("proxy"),
                    )
                    .col(
                        ColumnDef::new(GlobalConfig::SessionMode)
                            .string_len(32)
                            .not_null()
                            .default("stateless"),
                    )
                    .col(ColumnDef::new(GlobalConfig::CustomAdHtml).text())
                    .col(ColumnDef::new(GlobalConfig::CustomTrackerJs).text())
                    .col(
                        ColumnDef::new(GlobalConfig::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GlobalConfig::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum GlobalConfig {
    Table,
    Id,
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
    UpdatedAt,
}
