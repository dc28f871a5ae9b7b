use chrono::{DateTime, Utc};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use models::umkm;

/// A registered micro/small business.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BusinessProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub owner_name: String,
    pub business_type: String,
    pub status: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub monthly_production: Option<i64>,
    #[serde(default)]
    pub production_unit: Option<String>,
    #[serde(default)]
    pub capital: Option<i64>,
    #[serde(default)]
    pub monthly_revenue: Option<i64>,
    #[serde(default)]
    pub employee_count: Option<i32>,
    pub registered_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<umkm::Model> for BusinessProfile {
    fn from(m: umkm::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            name: m.name,
            owner_name: m.owner_name,
            business_type: m.business_type,
            status: m.status,
            category: m.category,
            address: m.address,
            phone: m.phone,
            product: m.product,
            monthly_production: m.monthly_production,
            production_unit: m.production_unit,
            capital: m.capital,
            monthly_revenue: m.monthly_revenue,
            employee_count: m.employee_count,
            registered_at: m.registered_at.with_timezone(&Utc),
            created_at: m.created_at.with_timezone(&Utc),
            updated_at: m.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<BusinessProfile> for umkm::Model {
    fn from(p: BusinessProfile) -> Self {
        Self {
            id: p.id,
            user_id: p.user_id,
            name: p.name,
            owner_name: p.owner_name,
            business_type: p.business_type,
            status: p.status,
            category: p.category,
            address: p.address,
            phone: p.phone,
            product: p.product,
            monthly_production: p.monthly_production,
            production_unit: p.production_unit,
            capital: p.capital,
            monthly_revenue: p.monthly_revenue,
            employee_count: p.employee_count,
            registered_at: p.registered_at.into(),
            created_at: p.created_at.into(),
            updated_at: p.updated_at.into(),
        }
    }
}

/// Submission payload for a new profile. Ids and timestamps are assigned by the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileInput {
    pub name: String,
    pub owner_name: String,
    pub business_type: String,
    pub status: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub monthly_production: Option<i64>,
    #[serde(default)]
    pub production_unit: Option<String>,
    #[serde(default)]
    pub capital: Option<i64>,
    #[serde(default)]
    pub monthly_revenue: Option<i64>,
    #[serde(default)]
    pub employee_count: Option<i32>,
    /// Defaults to the creation time.
    #[serde(default)]
    pub registered_at: Option<DateTime<Utc>>,
}

impl ProfileInput {
    pub fn validate(&self) -> Result<(), models::errors::ModelError> {
        umkm::validate_required(&self.name, &self.owner_name, &self.business_type, &self.status)?;
        umkm::validate_figures(self.monthly_production, self.capital, self.monthly_revenue, self.employee_count)
    }

    /// Build the stored record for `owner`, stamping id and timestamps.
    pub fn into_profile(self, owner: Uuid) -> BusinessProfile {
        let now = Utc::now();
        BusinessProfile {
            id: Uuid::new_v4(),
            user_id: owner,
            name: self.name.trim().to_string(),
            owner_name: self.owner_name.trim().to_string(),
            business_type: self.business_type.trim().to_string(),
            status: self.status.trim().to_string(),
            category: self.category,
            address: self.address,
            phone: self.phone,
            product: self.product,
            monthly_production: self.monthly_production,
            production_unit: self.production_unit,
            capital: self.capital,
            monthly_revenue: self.monthly_revenue,
            employee_count: self.employee_count,
            registered_at: self.registered_at.unwrap_or(now),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update. Present fields overwrite, absent ones are left alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub owner_name: Option<String>,
    pub business_type: Option<String>,
    pub status: Option<String>,
    pub category: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub product: Option<String>,
    pub monthly_production: Option<i64>,
    pub production_unit: Option<String>,
    pub capital: Option<i64>,
    pub monthly_revenue: Option<i64>,
    pub employee_count: Option<i32>,
    pub registered_at: Option<DateTime<Utc>>,
}

macro_rules! patch_fields {
    ($patch:expr, $target:expr, required: [$($req:ident),*], optional: [$($opt:ident),*]) => {{
        $(if let Some(v) = &$patch.$req { $target.$req = v.trim().to_string(); })*
        $(if let Some(v) = &$patch.$opt { $target.$opt = Some(v.clone()); })*
    }};
}

macro_rules! patch_active {
    ($patch:expr, $am:expr, required: [$($req:ident),*], optional: [$($opt:ident),*]) => {{
        $(if let Some(v) = &$patch.$req { $am.$req = Set(v.trim().to_string()); })*
        $(if let Some(v) = &$patch.$opt { $am.$opt = Set(Some(v.clone())); })*
    }};
}

impl ProfilePatch {
    /// Rejects blanked required fields and negative figures.
    pub fn validate(&self) -> Result<(), models::errors::ModelError> {
        let fields = [
            ("name", &self.name),
            ("owner_name", &self.owner_name),
            ("business_type", &self.business_type),
            ("status", &self.status),
        ];
        for (field, value) in fields {
            if let Some(v) = value {
                models::errors::require(field, v)?;
            }
        }
        umkm::validate_figures(self.monthly_production, self.capital, self.monthly_revenue, self.employee_count)
    }

    /// Copy present fields onto `profile`. Does not touch `updated_at`.
    pub fn apply(&self, profile: &mut BusinessProfile) {
        patch_fields!(self, profile,
            required: [name, owner_name, business_type, status],
            optional: [category, address, phone, product, monthly_production, production_unit, capital, monthly_revenue, employee_count]);
        if let Some(at) = self.registered_at {
            profile.registered_at = at;
        }
    }

    /// Same as [`Self::apply`], on a database row.
    pub fn apply_to_active(&self, am: &mut umkm::ActiveModel) {
        patch_active!(self, am,
            required: [name, owner_name, business_type, status],
            optional: [category, address, phone, product, monthly_production, production_unit, capital, monthly_revenue, employee_count]);
        if let Some(at) = self.registered_at {
            am.registered_at = Set(at.into());
        }
    }
}
