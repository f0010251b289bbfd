use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::NotSet;
use sea_orm::ActiveValue::Set;

use crate::types::Donation;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "donations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id:            i32,
    pub name:          String,
    pub amount:        f32,
    pub tax_deduction: bool,
    pub national_id:   Option<String>,
    pub fullname:      Option<String>,
    pub email:         Option<String>,
    pub bill:          Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Donation> for ActiveModel {
    fn from(donation: &Donation) -> Self {
        ActiveModel {
            id:            NotSet,
            name:          Set(donation.name.clone()),
            amount:        Set(donation.amount),
            tax_deduction: Set(donation.tax_deduction),
            national_id:   Set(donation.national_id.clone()),
            fullname:      Set(donation.fullname.clone()),
            email:         Set(donation.email.clone()),
            bill:          Set(donation.bill.clone()),
        }
    }
}
