pub mod donation;
pub mod star;

use sea_orm_migration::prelude::*;

pub struct Migrator;

impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(star::Migration),
            Box::new(donation::Migration),
            Box::new(donation::BillMigration),
        ]
    }
}
