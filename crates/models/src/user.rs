use sea_orm::{entity::prelude::*, ConnectionTrait, Set, DatabaseConnection, QueryOrder};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::{self, ModelError};

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub role: String,
    pub rw: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub password_changed: bool,
    pub password_changed_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_username(username: &str) -> Result<(), ModelError> {
    errors::require("username", username)?;
    if username.len() > 64 {
        return Err(ModelError::Validation("username too long (<=64)".into()));
    }
    if username.chars().any(char::is_whitespace) {
        return Err(ModelError::Validation("username must not contain spaces".into()));
    }
    Ok(())
}

pub fn validate_display_name(name: &str) -> Result<(), ModelError> {
    errors::require("display_name", name)?;
    if name.len() > 128 {
        return Err(ModelError::Validation("display_name too long (<=128)".into()));
    }
    Ok(())
}

pub async fn create<C: ConnectionTrait>(
    db: &C,
    username: &str,
    display_name: &str,
    rw: Option<&str>,
) -> Result<Model, ModelError> {
    validate_username(username)?;
    validate_display_name(display_name)?;
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(username.to_string()),
        display_name: Set(display_name.to_string()),
        role: Set(ROLE_USER.into()),
        rw: Set(rw.map(str::to_string)),
        created_at: Set(Utc::now().into()),
        password_changed: Set(false),
        password_changed_at: Set(None),
    };
    Ok(am.insert(db).await?)
}

/// All users carrying `username`; the schema does not enforce uniqueness.
pub async fn find_by_username(db: &DatabaseConnection, username: &str) -> Result<Vec<Model>, ModelError> {
    Ok(Entity::find()
        .filter(Column::Username.eq(username.to_string()))
        .order_by_asc(Column::CreatedAt)
        .all(db)
        .await?)
}

pub async fn list_by_rw(db: &DatabaseConnection, rw: &str) -> Result<Vec<Model>, ModelError> {
    Ok(Entity::find()
        .filter(Column::Rw.eq(rw.to_string()))
        .order_by_asc(Column::CreatedAt)
        .all(db)
        .await?)
}

pub async fn mark_password_changed(db: &DatabaseConnection, id: Uuid) -> Result<(), ModelError> {
    let mut found: ActiveModel = Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ModelError::Validation("user not found".into()))?
        .into();
    found.password_changed = Set(true);
    found.password_changed_at = Set(Some(Utc::now().into()));
    found.update(db).await?;
    Ok(())
}
