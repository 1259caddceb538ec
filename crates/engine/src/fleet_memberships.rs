//! Fleet membership table.
//!
//! A fleet is a named collection of groups whose reports aggregate together.
//! Membership is static configuration, never derived from the entry stream.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "fleet_memberships")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub fleet: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub group_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
