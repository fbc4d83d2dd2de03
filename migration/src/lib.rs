pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_sites_table;
mod m20250301_000002_create_global_config_table;
mod m20250301_000003_create_cookie_jars_table;
mod m20250301_000004_create_admin_users_table;
mod m20250301_000005_insert_default_global_config;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_sites_table::Migration),
            Box::new(m20250301_000002_create_global_config_table::Migration),
            Box::new(m20250301_000003_create_cookie_jars_table::Migration),
            Box::new(m20250301_000004_create_admin_users_table::Migration),
            Box::new(m20250301_000005_insert_default_global_config::Migration),
        ]
    }
}
