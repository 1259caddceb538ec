use chrono::Utc;

use sea_orm::{ActiveValue, ConnectionTrait, QueryFilter, TransactionTrait, prelude::*};
use unicode_normalization::UnicodeNormalization;

use crate::{
    EngineError, ResultEngine, fleet_memberships, group_admins, groups, users,
    users::UserRole,
};

use super::{Engine, normalize_optional_text, with_tx};

fn normalize_name(value: &str) -> String {
    value.trim().nfc().collect()
}

impl Engine {
    /// All groups registered in the same fleet(s) as `group_id`, including
    /// itself; just `[group_id]` when the group belongs to no fleet.
    ///
    /// Fleet membership is static configuration, never derived from the
    /// entry stream.
    pub async fn groups_in_fleet(&self, group_id: i64) -> ResultEngine<Vec<i64>> {
        self.groups_in_fleet_on(&self.database, group_id).await
    }

    pub(super) async fn groups_in_fleet_on<C: ConnectionTrait>(
        &self,
        db: &C,
        group_id: i64,
    ) -> ResultEngine<Vec<i64>> {
        let fleets: Vec<String> = fleet_memberships::Entity::find()
            .filter(fleet_memberships::Column::GroupId.eq(group_id))
            .all(db)
            .await?
            .into_iter()
            .map(|m| m.fleet)
            .collect();

        let mut out = vec![group_id];
        if !fleets.is_empty() {
            let rows = fleet_memberships::Entity::find()
                .filter(fleet_memberships::Column::Fleet.is_in(fleets))
                .all(db)
                .await?;
            for row in rows {
                if !out.contains(&row.group_id) {
                    out.push(row.group_id);
                }
            }
        }
        out.sort_unstable();
        Ok(out)
    }

    /// `true` when the user is an admin of that specific group or holds the
    /// global-admin role.
    pub async fn is_admin(&self, user_id: i64, group_id: i64) -> ResultEngine<bool> {
        self.is_admin_on(&self.database, user_id, group_id).await
    }

    pub(super) async fn is_admin_on<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: i64,
        group_id: i64,
    ) -> ResultEngine<bool> {
        if group_admins::Entity::find_by_id((group_id, user_id))
            .one(db)
            .await?
            .is_some()
        {
            return Ok(true);
        }

        let role = users::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .map(|u| UserRole::try_from(u.role.as_str()))
            .transpose()?;
        Ok(role == Some(UserRole::Admin))
    }

    /// Registers or refreshes a user (called on first observed interaction).
    ///
    /// Existing name fields are kept when the caller passes nothing newer;
    /// the role is never touched here.
    pub async fn upsert_user(
        &self,
        user_id: i64,
        username: Option<&str>,
        display_name: Option<&str>,
    ) -> ResultEngine<()> {
        let username = normalize_optional_text(username);
        let display_name = normalize_optional_text(display_name).map(|n| normalize_name(&n));

        with_tx!(self, |db_tx| {
            match users::Entity::find_by_id(user_id).one(&db_tx).await? {
                Some(existing) => {
                    let model = users::ActiveModel {
                        user_id: ActiveValue::Set(user_id),
                        username: ActiveValue::Set(username.or(existing.username)),
                        display_name: ActiveValue::Set(display_name.or(existing.display_name)),
                        ..Default::default()
                    };
                    model.update(&db_tx).await?;
                }
                None => {
                    let model = users::ActiveModel {
                        user_id: ActiveValue::Set(user_id),
                        username: ActiveValue::Set(username),
                        display_name: ActiveValue::Set(display_name),
                        role: ActiveValue::Set(UserRole::Member.as_str().to_string()),
                        created_at: ActiveValue::Set(Utc::now()),
                    };
                    model.insert(&db_tx).await?;
                }
            }
            Ok(())
        })
    }

    /// Registers or renames a group (called on first observed interaction).
    pub async fn upsert_group(&self, group_id: i64, name: &str) -> ResultEngine<()> {
        let name = normalize_name(name);
        if name.is_empty() {
            return Err(EngineError::InvalidAmount(
                "group name must not be empty".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            match groups::Entity::find_by_id(group_id).one(&db_tx).await? {
                Some(_) => {
                    let model = groups::ActiveModel {
                        group_id: ActiveValue::Set(group_id),
                        name: ActiveValue::Set(name),
                        ..Default::default()
                    };
                    model.update(&db_tx).await?;
                }
                None => {
                    let model = groups::ActiveModel {
                        group_id: ActiveValue::Set(group_id),
                        name: ActiveValue::Set(name),
                        created_at: ActiveValue::Set(Utc::now()),
                    };
                    model.insert(&db_tx).await?;
                }
            }
            Ok(())
        })
    }

    /// Adds a registered group to a fleet (idempotent).
    pub async fn add_group_to_fleet(&self, fleet: &str, group_id: i64) -> ResultEngine<()> {
        let fleet = normalize_name(fleet);
        if fleet.is_empty() {
            return Err(EngineError::InvalidAmount(
                "fleet name must not be empty".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            if groups::Entity::find_by_id(group_id)
                .one(&db_tx)
                .await?
                .is_none()
            {
                return Err(EngineError::KeyNotFound("group not exists".to_string()));
            }

            let existing =
                fleet_memberships::Entity::find_by_id((fleet.clone(), group_id))
                    .one(&db_tx)
                    .await?;
            if existing.is_none() {
                let model = fleet_memberships::ActiveModel {
                    fleet: ActiveValue::Set(fleet),
                    group_id: ActiveValue::Set(group_id),
                };
                model.insert(&db_tx).await?;
            }
            Ok(())
        })
    }

    /// Removes a group from a fleet; returns whether a membership existed.
    pub async fn remove_group_from_fleet(
        &self,
        fleet: &str,
        group_id: i64,
    ) -> ResultEngine<bool> {
        let fleet = normalize_name(fleet);

        with_tx!(self, |db_tx| {
            let result = fleet_memberships::Entity::delete_many()
                .filter(fleet_memberships::Column::Fleet.eq(fleet))
                .filter(fleet_memberships::Column::GroupId.eq(group_id))
                .exec(&db_tx)
                .await?;
            Ok(result.rows_affected > 0)
        })
    }

    /// Caches a platform-side group admin (idempotent). Both the group and
    /// the user must be registered.
    pub async fn grant_group_admin(&self, group_id: i64, user_id: i64) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            if groups::Entity::find_by_id(group_id)
                .one(&db_tx)
                .await?
                .is_none()
            {
                return Err(EngineError::KeyNotFound("group not exists".to_string()));
            }
            if users::Entity::find_by_id(user_id)
                .one(&db_tx)
                .await?
                .is_none()
            {
                return Err(EngineError::KeyNotFound("user not exists".to_string()));
            }

            let existing = group_admins::Entity::find_by_id((group_id, user_id))
                .one(&db_tx)
                .await?;
            if existing.is_none() {
                let model = group_admins::ActiveModel {
                    group_id: ActiveValue::Set(group_id),
                    user_id: ActiveValue::Set(user_id),
                };
                model.insert(&db_tx).await?;
            }
            Ok(())
        })
    }

    /// Drops a cached group admin; returns whether a row existed.
    pub async fn revoke_group_admin(&self, group_id: i64, user_id: i64) -> ResultEngine<bool> {
        with_tx!(self, |db_tx| {
            let result = group_admins::Entity::delete_many()
                .filter(group_admins::Column::GroupId.eq(group_id))
                .filter(group_admins::Column::UserId.eq(user_id))
                .exec(&db_tx)
                .await?;
            Ok(result.rows_affected > 0)
        })
    }

    /// Grants or revokes the global-admin role on a registered user.
    pub async fn set_global_admin(&self, user_id: i64, admin: bool) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            if users::Entity::find_by_id(user_id)
                .one(&db_tx)
                .await?
                .is_none()
            {
                return Err(EngineError::KeyNotFound("user not exists".to_string()));
            }

            let role = if admin { UserRole::Admin } else { UserRole::Member };
            let model = users::ActiveModel {
                user_id: ActiveValue::Set(user_id),
                role: ActiveValue::Set(role.as_str().to_string()),
                ..Default::default()
            };
            model.update(&db_tx).await?;
            Ok(())
        })
    }
}
