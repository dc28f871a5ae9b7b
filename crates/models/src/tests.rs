use crate::{errors::ModelError, umkm, user};

#[test]
fn umkm_requires_core_fields() {
    assert!(umkm::validate_required("Toko Bunga", "Budi", "Retail", "active").is_ok());
    let err = umkm::validate_required("Toko Bunga", " ", "Retail", "active").unwrap_err();
    assert!(matches!(err, ModelError::Validation(ref m) if m == "owner_name required"));
    assert!(umkm::validate_required("Toko Bunga", "Budi", "Retail", "").is_err());
}

#[test]
fn umkm_rejects_negative_figures() {
    assert!(umkm::validate_figures(Some(10), Some(0), None, Some(3)).is_ok());
    assert!(umkm::validate_figures(None, Some(-1), None, None).is_err());
    assert!(umkm::validate_figures(None, None, None, Some(-2)).is_err());
}

#[test]
fn username_rules() {
    assert!(user::validate_username("budi").is_ok());
    assert!(user::validate_username("").is_err());
    assert!(user::validate_username("budi santoso").is_err());
    assert!(user::validate_username(&"x".repeat(65)).is_err());
}

#[test]
fn display_name_rules() {
    assert!(user::validate_display_name("Budi Santoso").is_ok());
    assert!(user::validate_display_name("   ").is_err());
}
