use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::DbErr;
use sea_orm::EntityTrait;
use sea_orm::QueryOrder;
use sea_orm::QuerySelect;
use tracing::instrument;

use super::driver::DatabaseDriver;
use super::entity::donation;
use super::entity::star;
use super::entity::Donations;
use super::entity::Stars;
use crate::traits::DonationLedger;
use crate::traits::StorageGateway;
use crate::types::Donation;
use crate::types::Star;

/// [`StorageGateway`] over the `stars` table of a relational database.
#[derive(Debug, Clone)]
pub struct DbGateway {
    driver: Arc<dyn DatabaseDriver>,
}

impl DbGateway {
    pub fn new(driver: Arc<dyn DatabaseDriver>) -> Self {
        Self { driver }
    }

    pub fn driver(&self) -> &Arc<dyn DatabaseDriver> {
        &self.driver
    }

    /// Total number of stored stars.
    pub async fn count(&self) -> Result<u64, DbErr> {
        use sea_orm::PaginatorTrait;
        Stars::find().count(&self.driver.connection()).await
    }

    pub async fn donation_count(&self) -> Result<u64, DbErr> {
        use sea_orm::PaginatorTrait;
        Donations::find().count(&self.driver.connection()).await
    }
}

#[async_trait]
impl StorageGateway for DbGateway {
    type Error = DbErr;

    // RANDOM() is understood by both PostgreSQL and SQLite.
    #[instrument(level = "trace", skip(self))]
    async fn sample_random(&self, n: usize) -> Result<Vec<Star>, Self::Error> {
        Ok(Stars::find()
            .order_by_asc(Expr::cust("RANDOM()"))
            .limit(n as u64)
            .all(&self.driver.connection())
            .await?
            .into_iter()
            .map(Star::from)
            .collect())
    }

    #[instrument(level = "trace", skip(self))]
    async fn insert(&self, star: &Star) -> Result<(), Self::Error> {
        Stars::insert(star::ActiveModel::from(star))
            .exec(&self.driver.connection())
            .await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        self.driver.name()
    }
}

#[async_trait]
impl DonationLedger for DbGateway {
    #[instrument(level = "trace", skip(self))]
    async fn record_donation(&self, donation: &Donation) -> Result<(), DbErr> {
        Donations::insert(donation::ActiveModel::from(donation))
            .exec(&self.driver.connection())
            .await?;
        Ok(())
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;
    use crate::db::driver::sqlite::Sqlite;
    use crate::db::migrations::Migrator;
    use sea_orm_migration::MigratorTrait;

    async fn gateway(dir: &tempfile::TempDir) -> DbGateway {
        let driver = Sqlite::connect(&dir.path().join("stars.db")).await.unwrap();
        driver.configure().await.unwrap();
        Migrator::up(&driver.connection(), None).await.unwrap();
        DbGateway::new(Arc::new(driver))
    }

    #[tokio::test]
    async fn test_insert_then_sample() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = gateway(&dir).await;

        for i in 0..10 {
            gateway.insert(&Star::new(format!("n{i}"), format!("m{i}"))).await.unwrap();
        }
        assert_eq!(gateway.count().await.unwrap(), 10);

        let sample = gateway.sample_random(4).await.unwrap();
        assert_eq!(sample.len(), 4);
        for star in &sample {
            assert_eq!(star.name[1..], star.message[1..]);
        }

        assert_eq!(gateway.sample_random(50).await.unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_sample_of_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = gateway(&dir).await;
        assert!(gateway.sample_random(20).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_record_donation() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = gateway(&dir).await;

        gateway.record_donation(&Donation::new("ann", 12.5)).await.unwrap();
        gateway
            .record_donation(&Donation::new("bo", 1.0).with_tax_deduction("Bo Ng", "bo@example.com", "42"))
            .await
            .unwrap();
        assert_eq!(gateway.donation_count().await.unwrap(), 2);

        let rows = Donations::find().all(&gateway.driver().connection()).await.unwrap();
        let bo = rows.iter().find(|r| r.name == "bo").unwrap();
        assert!(bo.tax_deduction);
        assert_eq!(bo.email.as_deref(), Some("bo@example.com"));
        assert_eq!(bo.bill, None);
        // Donations never show up among the stars.
        assert_eq!(gateway.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_table_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let driver = Sqlite::connect(&dir.path().join("bare.db")).await.unwrap();
        let gateway = DbGateway::new(Arc::new(driver));

        assert!(gateway.sample_random(1).await.is_err());
        assert!(gateway.insert(&Star::new("n", "m")).await.is_err());
        assert!(gateway.record_donation(&Donation::new("n", 1.0)).await.is_err());
    }
}
