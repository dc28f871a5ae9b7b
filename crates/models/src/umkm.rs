use sea_orm::{entity::prelude::*, Set, DatabaseConnection, QueryOrder};
use uuid::Uuid;
use serde::{Deserialize, Serialize};

use crate::errors::{self, ModelError};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "umkm")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub owner_name: String,
    pub business_type: String,
    pub status: String,
    pub category: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub product: Option<String>,
    pub monthly_production: Option<i64>,
    pub production_unit: Option<String>,
    pub capital: Option<i64>,
    pub monthly_revenue: Option<i64>,
    pub employee_count: Option<i32>,
    pub registered_at: DateTimeWithTimeZone,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Required profile fields: name, owner name, type, and status.
pub fn validate_required(name: &str, owner_name: &str, business_type: &str, status: &str) -> Result<(), ModelError> {
    errors::require("name", name)?;
    errors::require("owner_name", owner_name)?;
    errors::require("business_type", business_type)?;
    errors::require("status", status)?;
    Ok(())
}

pub fn validate_figures(
    monthly_production: Option<i64>,
    capital: Option<i64>,
    monthly_revenue: Option<i64>,
    employee_count: Option<i32>,
) -> Result<(), ModelError> {
    let negative = [monthly_production, capital, monthly_revenue]
        .into_iter()
        .flatten()
        .any(|v| v < 0)
        || employee_count.is_some_and(|v| v < 0);
    if negative {
        return Err(ModelError::Validation("figures must not be negative".into()));
    }
    Ok(())
}

pub async fn insert(db: &DatabaseConnection, model: Model) -> Result<Model, ModelError> {
    validate_required(&model.name, &model.owner_name, &model.business_type, &model.status)?;
    let am: ActiveModel = model.into();
    Ok(am.insert(db).await?)
}

/// List newest-first, optionally restricted to a set of owners.
pub async fn list(db: &DatabaseConnection, owners: Option<&[Uuid]>) -> Result<Vec<Model>, ModelError> {
    let mut query = Entity::find();
    if let Some(owners) = owners {
        query = query.filter(Column::UserId.is_in(owners.iter().copied()));
    }
    Ok(query.order_by_desc(Column::CreatedAt).all(db).await?)
}

pub async fn find_owned(db: &DatabaseConnection, id: Uuid, user_id: Uuid) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find_by_id(id)
        .filter(Column::UserId.eq(user_id))
        .one(db)
        .await?)
}

/// Delete only when `id` belongs to `user_id`; returns whether a row was removed.
pub async fn delete_owned(db: &DatabaseConnection, id: Uuid, user_id: Uuid) -> Result<bool, ModelError> {
    let res = Entity::delete_many()
        .filter(Column::Id.eq(id))
        .filter(Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    Ok(res.rows_affected > 0)
}

/// Apply `f` to the row owned by `user_id` and persist it with a fresh `updated_at`.
pub async fn update_owned<F>(db: &DatabaseConnection, id: Uuid, user_id: Uuid, f: F) -> Result<Option<Model>, ModelError>
where
    F: FnOnce(&mut ActiveModel),
{
    let Some(found) = find_owned(db, id, user_id).await? else {
        return Ok(None);
    };
    let mut am: ActiveModel = found.into();
    f(&mut am);
    am.updated_at = Set(chrono::Utc::now().into());
    Ok(Some(am.update(db).await?))
}
