use sea_orm::entity::prelude::*;

/// One badge read at an activity station. `badge_code` is a soft reference
/// to `Hacker_Information.badge_code`; no FK constraint is declared.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "Scans")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub badge_code: String,
    pub activity_name: String,
    pub activity_category: String,
    pub scanned_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
