use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(utoipa::ToSchema)]
pub struct RegisterRequest { pub username: String, pub display_name: String, pub password: String, pub rw: Option<String> }

/// `rw` selects the admin account when `username` is `admin`.
#[derive(utoipa::ToSchema)]
pub struct LoginRequest { pub username: String, pub password: String, pub rw: Option<String> }

#[derive(utoipa::ToSchema)]
pub struct ChangePasswordRequest { pub old_password: String, pub new_password: String }

#[derive(utoipa::ToSchema)]
pub struct ProfileInputDoc {
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
    /// RFC 3339; defaults to now.
    pub registered_at: Option<String>,
}

#[derive(utoipa::ToSchema)]
pub struct ProfilePatchDoc {
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
    pub registered_at: Option<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::me,
        crate::routes::auth::change_password,
        crate::routes::umkm::list,
        crate::routes::umkm::create,
        crate::routes::umkm::get,
        crate::routes::umkm::update,
        crate::routes::umkm::delete,
        crate::routes::admin::list_umkm,
        crate::routes::admin::list_users,
    ),
    components(
        schemas(
            HealthResponse,
            RegisterRequest,
            LoginRequest,
            ChangePasswordRequest,
            ProfileInputDoc,
            ProfilePatchDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "umkm"),
        (name = "admin")
    )
)]
pub struct ApiDoc;
