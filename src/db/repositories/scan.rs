use crate::entities::{hackers, prelude::*, scans};
use anyhow::Result;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect, Set, TransactionTrait,
};

/// Repository for scan ingestion and aggregation
pub struct ScanRepository {
    conn: DatabaseConnection,
}

impl ScanRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert a scan for an existing badge and refresh the hacker's
    /// `updated_at` in the same transaction. Returns `None` when no hacker
    /// carries the badge code.
    pub async fn record(
        &self,
        badge_code: &str,
        activity_name: &str,
        activity_category: &str,
    ) -> Result<Option<scans::Model>> {
        let txn = self.conn.begin().await?;

        let Some(hacker) = Hackers::find()
            .filter(hackers::Column::BadgeCode.eq(badge_code))
            .one(&txn)
            .await?
        else {
            return Ok(None);
        };

        let now = Utc::now();
        let res = Scans::insert(scans::ActiveModel {
            badge_code: Set(badge_code.to_string()),
            activity_name: Set(activity_name.to_string()),
            activity_category: Set(activity_category.to_string()),
            scanned_at: Set(now),
            ..Default::default()
        })
        .exec(&txn)
        .await?;

        let row = Scans::find_by_id(res.last_insert_id)
            .one(&txn)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to read back inserted scan"))?;

        Hackers::update_many()
            .col_expr(hackers::Column::UpdatedAt, Expr::value(now))
            .filter(hackers::Column::Id.eq(hacker.id))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        Ok(Some(row))
    }

    /// Count scans per activity category. Duplicate events by the same
    /// person count individually. Absent bounds are unconstrained.
    pub async fn aggregate(
        &self,
        category: Option<&str>,
        min_frequency: Option<i64>,
        max_frequency: Option<i64>,
    ) -> Result<Vec<CategoryFrequency>> {
        let mut query = Scans::find()
            .select_only()
            .column(scans::Column::ActivityCategory)
            .column_as(scans::Column::Id.count(), "frequency")
            .group_by(scans::Column::ActivityCategory);

        if let Some(category) = category {
            query = query.filter(scans::Column::ActivityCategory.eq(category));
        }

        let rows: Vec<(String, i64)> = query.into_tuple().all(&self.conn).await?;

        Ok(rows
            .into_iter()
            .filter(|(_, count)| {
                min_frequency.is_none_or(|min| *count >= min)
                    && max_frequency.is_none_or(|max| *count <= max)
            })
            .map(|(activity_category, frequency)| CategoryFrequency {
                activity_category,
                frequency,
            })
            .collect())
    }
}

#[derive(Debug, Clone)]
pub struct CategoryFrequency {
    pub activity_category: String,
    pub frequency: i64,
}
