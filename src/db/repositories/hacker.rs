use std::collections::HashMap;

use crate::entities::{hackers, prelude::*, scans};
use crate::seed::SeedHacker;
use anyhow::Result;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, Set, TransactionTrait,
};
use tracing::info;

/// Repository for hacker rows and their scan history
pub struct HackerRepository {
    conn: DatabaseConnection,
}

impl HackerRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Wipe both tables and repopulate from the seed fixture as one
    /// transaction, so readers never observe a half-replaced dataset.
    pub async fn replace_all(&self, fixture: &[SeedHacker]) -> Result<()> {
        let txn = self.conn.begin().await?;

        Scans::delete_many().exec(&txn).await?;
        Hackers::delete_many().exec(&txn).await?;

        let now = Utc::now();
        for hacker in fixture {
            // Badge assignment happens at check-in; an empty code in the
            // fixture means "not assigned yet".
            let badge_code = match hacker.badge_code.as_str() {
                "" => None,
                code => Some(code.to_string()),
            };

            Hackers::insert(hackers::ActiveModel {
                name: Set(hacker.name.clone()),
                email: Set(hacker.email.clone()),
                phone: Set(hacker.phone.clone()),
                badge_code: Set(badge_code),
                updated_at: Set(now),
                ..Default::default()
            })
            .exec(&txn)
            .await?;

            if hacker.scans.is_empty() {
                continue;
            }

            // Scan rows copy the fixture's badge code verbatim. Rows seeded
            // under an empty code are unreachable through the /users join
            // but still count toward /scans aggregation.
            let rows: Vec<scans::ActiveModel> = hacker
                .scans
                .iter()
                .map(|scan| scans::ActiveModel {
                    badge_code: Set(hacker.badge_code.clone()),
                    activity_name: Set(scan.activity_name.clone()),
                    activity_category: Set(scan.activity_category.clone()),
                    scanned_at: Set(scan.scanned_at),
                    ..Default::default()
                })
                .collect();

            Scans::insert_many(rows).exec(&txn).await?;
        }

        txn.commit().await?;
        info!("Seeded {} hackers", fixture.len());
        Ok(())
    }

    pub async fn list_with_scans(&self) -> Result<Vec<(hackers::Model, Vec<scans::Model>)>> {
        let hackers = Hackers::find().all(&self.conn).await?;
        let scans = Scans::find().all(&self.conn).await?;

        let mut by_badge: HashMap<String, Vec<scans::Model>> = HashMap::new();
        for scan in scans {
            by_badge
                .entry(scan.badge_code.clone())
                .or_default()
                .push(scan);
        }

        Ok(hackers
            .into_iter()
            .map(|hacker| {
                let scans = hacker
                    .badge_code
                    .as_ref()
                    .and_then(|code| by_badge.remove(code))
                    .unwrap_or_default();
                (hacker, scans)
            })
            .collect())
    }

    pub async fn get_with_scans(
        &self,
        id: i32,
    ) -> Result<Option<(hackers::Model, Vec<scans::Model>)>> {
        let Some(hacker) = Hackers::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let scans = Self::scans_for(&self.conn, &hacker).await?;
        Ok(Some((hacker, scans)))
    }

    /// Apply a partial update. A badge rename re-points every existing scan
    /// row from the old code to the new one inside the same transaction;
    /// leaving the badge untouched leaves the history under the old code.
    pub async fn update(
        &self,
        id: i32,
        patch: HackerPatch,
    ) -> Result<Option<(hackers::Model, Vec<scans::Model>)>> {
        let txn = self.conn.begin().await?;

        let Some(current) = Hackers::find_by_id(id).one(&txn).await? else {
            return Ok(None);
        };
        let old_badge = current.badge_code.clone();

        let mut model = current.into_active_model();
        if let Some(name) = patch.name {
            model.name = Set(name);
        }
        if let Some(email) = patch.email {
            model.email = Set(email);
        }
        if let Some(phone) = patch.phone {
            model.phone = Set(phone);
        }
        // An empty badge code means "no badge", as at seed time. Clearing
        // the badge leaves the scan history under the old code.
        let new_badge = patch
            .badge_code
            .map(|code| if code.is_empty() { None } else { Some(code) });
        if let Some(badge) = new_badge.clone() {
            model.badge_code = Set(badge);
        }
        model.updated_at = Set(Utc::now());

        let updated = model.update(&txn).await?;

        if let (Some(old), Some(Some(new))) = (
            old_badge.as_deref(),
            new_badge.as_ref().map(Option::as_deref),
        ) && old != new
        {
            Scans::update_many()
                .col_expr(scans::Column::BadgeCode, Expr::value(new))
                .filter(scans::Column::BadgeCode.eq(old))
                .exec(&txn)
                .await?;
        }

        let scans = Self::scans_for(&txn, &updated).await?;
        txn.commit().await?;

        Ok(Some((updated, scans)))
    }

    async fn scans_for<C: ConnectionTrait>(
        conn: &C,
        hacker: &hackers::Model,
    ) -> Result<Vec<scans::Model>> {
        match &hacker.badge_code {
            Some(code) => Ok(Scans::find()
                .filter(scans::Column::BadgeCode.eq(code.as_str()))
                .all(conn)
                .await?),
            None => Ok(Vec::new()),
        }
    }
}

/// Partial update for a hacker row. `None` keeps the stored value.
#[derive(Debug, Default, Clone)]
pub struct HackerPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub badge_code: Option<String>,
}
