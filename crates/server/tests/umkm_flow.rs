mod support;

use axum::http::StatusCode;
use serde_json::{json, Value};

use support::{body_json, build_app, login, register, request, send};

fn profile(name: &str) -> Value {
    json!({
        "name": name,
        "owner_name": "Sari",
        "business_type": "Makanan",
        "status": "aktif",
        "capital": 2500000,
        "employee_count": 3
    })
}

#[tokio::test]
async fn test_create_then_list_round_trip() -> anyhow::Result<()> {
    let app = build_app().await?;
    register(&app, "sari", "rahasia", Some("01")).await?;
    let token = login(&app, "sari", "rahasia", None).await?;

    for name in ["Keripik Sari", "Sambal Sari"] {
        let resp = send(&app, request("POST", "/umkm", Some(&token), Some(profile(name)))?).await?;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let resp = send(&app, request("GET", "/umkm", Some(&token), None)?).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let rows = body_json(resp).await?;
    let rows = rows.as_array().cloned().unwrap_or_default();
    assert_eq!(rows.len(), 2);
    // newest first
    assert_eq!(rows[0]["name"], "Sambal Sari");
    assert_eq!(rows[1]["capital"], 2500000);
    Ok(())
}

#[tokio::test]
async fn test_create_validation_error() -> anyhow::Result<()> {
    let app = build_app().await?;
    register(&app, "sari", "rahasia", None).await?;
    let token = login(&app, "sari", "rahasia", None).await?;
    let mut bad = profile("X");
    bad["name"] = json!("   ");
    let resp = send(&app, request("POST", "/umkm", Some(&token), Some(bad))?).await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let v = body_json(resp).await?;
    assert_eq!(v["error"], "Validation Error");
    Ok(())
}

#[tokio::test]
async fn test_other_user_cannot_modify() -> anyhow::Result<()> {
    let app = build_app().await?;
    register(&app, "sari", "rahasia", None).await?;
    register(&app, "budi", "rahasia", None).await?;
    let sari = login(&app, "sari", "rahasia", None).await?;
    let budi = login(&app, "budi", "rahasia", None).await?;

    let resp = send(&app, request("POST", "/umkm", Some(&sari), Some(profile("Warung")))?).await?;
    let id = body_json(resp).await?["id"].as_str().unwrap_or_default().to_string();
    let uri = format!("/umkm/{id}");

    let patch = json!({"status": "tutup"});
    assert_eq!(send(&app, request("PUT", &uri, Some(&budi), Some(patch.clone()))?).await?.status(), StatusCode::NOT_FOUND);
    assert_eq!(send(&app, request("DELETE", &uri, Some(&budi), None)?).await?.status(), StatusCode::NOT_FOUND);
    assert_eq!(send(&app, request("GET", &uri, Some(&budi), None)?).await?.status(), StatusCode::NOT_FOUND);

    let resp = send(&app, request("PUT", &uri, Some(&sari), Some(patch))?).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await?["status"], "tutup");

    assert_eq!(send(&app, request("DELETE", &uri, Some(&sari), None)?).await?.status(), StatusCode::NO_CONTENT);
    assert_eq!(send(&app, request("GET", &uri, Some(&sari), None)?).await?.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_admin_routes_reject_regular_users() -> anyhow::Result<()> {
    let app = build_app().await?;
    register(&app, "sari", "rahasia", Some("01")).await?;
    let token = login(&app, "sari", "rahasia", None).await?;
    for uri in ["/admin/umkm", "/admin/users"] {
        assert_eq!(send(&app, request("GET", uri, Some(&token), None)?).await?.status(), StatusCode::FORBIDDEN);
        assert_eq!(send(&app, request("GET", uri, None, None)?).await?.status(), StatusCode::UNAUTHORIZED);
    }
    Ok(())
}

#[tokio::test]
async fn test_admin_sees_own_jurisdiction_only() -> anyhow::Result<()> {
    let app = build_app().await?;
    register(&app, "sari", "rahasia", Some("01")).await?;
    register(&app, "budi", "rahasia", Some("02")).await?;
    let sari = login(&app, "sari", "rahasia", None).await?;
    let budi = login(&app, "budi", "rahasia", None).await?;
    send(&app, request("POST", "/umkm", Some(&sari), Some(profile("Keripik RW01")))?).await?;
    send(&app, request("POST", "/umkm", Some(&budi), Some(profile("Batik RW02")))?).await?;

    let admin = login(&app, "admin", "admin", Some("01")).await?;
    let rows = body_json(send(&app, request("GET", "/admin/umkm", Some(&admin), None)?).await?).await?;
    let names: Vec<&str> = rows.as_array().map(|a| a.iter().filter_map(|r| r["name"].as_str()).collect()).unwrap_or_default();
    assert_eq!(names, ["Keripik RW01"]);

    let users = body_json(send(&app, request("GET", "/admin/users", Some(&admin), None)?).await?).await?;
    assert_eq!(users.as_array().map(Vec::len), Some(1));
    assert_eq!(users[0]["username"], "sari");
    Ok(())
}
