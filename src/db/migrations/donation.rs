use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "donation_migration"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Donations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Donations::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Donations::Name).string().not_null())
                    .col(ColumnDef::new(Donations::Amount).float().not_null())
                    .col(
                        ColumnDef::new(Donations::TaxDeduction)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Donations::NationalId).string().null())
                    .col(ColumnDef::new(Donations::Fullname).string().null())
                    .col(ColumnDef::new(Donations::Email).string().null())
                    .col(ColumnDef::new(Donations::Bill).string().null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Donations::Table).to_owned()).await
    }
}

/// Databases whose `donations` table predates the `bill` column get it added.
pub struct BillMigration;

impl MigrationName for BillMigration {
    fn name(&self) -> &str {
        "donation_bill_migration"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for BillMigration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        if manager.has_column("donations", "bill").await? {
            return Ok(());
        }

        manager
            .alter_table(
                Table::alter()
                    .table(Donations::Table)
                    .add_column(ColumnDef::new(Donations::Bill).string().null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, _manager: &SchemaManager) -> Result<(), DbErr> {
        Ok(())
    }
}

#[derive(Iden)]
pub enum Donations {
    Table,
    Id,
    Name,
    Amount,
    TaxDeduction,
    NationalId,
    Fullname,
    Email,
    Bill,
}
