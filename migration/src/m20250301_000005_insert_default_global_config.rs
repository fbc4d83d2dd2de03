use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 插入全局配置单行（id=1），各列取表定义里的默认值
        manager
            .exec_stmt(
                Query::insert()
                    .into_table(GlobalConfig::Table)
                    .columns([
                        GlobalConfig::Id,
                        GlobalConfig::ProxySubdomains,
                        GlobalConfig::ProxyExternalDomains,
                        GlobalConfig::RewriteJsRedirects,
                        GlobalConfig::RemoveAds,
                        GlobalConfig::InjectAds,
                        GlobalConfig::RemoveAnalytics,
                        GlobalConfig::MediaPolicy,
                        GlobalConfig::SessionMode,
                    ])
                    .values_panic([
                        1.into(),
                        true.into(),
                        true.into(),
                        true.into(),
                        false.into(),
                        false.into(),
                        false.into(),
                        "proxy".into(),
                        "stateless".into(),
                    ])
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .exec_stmt(
                Query::delete()
                    .from_table(GlobalConfig::Table)
                    .cond_where(Expr::col(GlobalConfig::Id).eq(1))
                    .to_owned(),
            )
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
}
