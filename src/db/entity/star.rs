use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::NotSet;
use sea_orm::ActiveValue::Set;

use crate::types::Star;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "stars")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id:      i32,
    pub name:    String,
    pub message: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Star {
    fn from(model: Model) -> Self {
        Star {
            name:    model.name,
            message: model.message,
        }
    }
}

impl From<&Star> for ActiveModel {
    fn from(star: &Star) -> Self {
        ActiveModel {
            id:      NotSet,
            name:    Set(star.name.clone()),
            message: Set(star.message.clone()),
        }
    }
}
