mod common;

use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::{json, Value};

use common::TestServer;

const ADMIN_EMAIL: &str = "root@example.com";
const ADMIN_PASSWORD: &str = "bootstrap-secret";

#[tokio::test]
async fn binary_serves_the_catalog() -> Result<()> {
    let server = TestServer::spawn(ADMIN_EMAIL, ADMIN_PASSWORD)?;
    server.wait_ready(Duration::from_secs(20)).await?;
    let client = reqwest::Client::new();

    let login: Value = client
        .post(server.url("/api/users/login"))
        .json(&json!({"email": ADMIN_EMAIL, "password": ADMIN_PASSWORD}))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(login["data"]["user"]["role"], "admin");
    let token = login["token"].as_str().context("login returned no token")?;

    let res = client
        .post(server.url("/api/categories"))
        .bearer_auth(token)
        .json(&json!({"name": "Office"}))
        .send()
        .await?;
    assert_eq!(res.status(), reqwest::StatusCode::CREATED);
    let category: Value = res.json().await?;
    let category_id = category["data"]["category"]["_id"]
        .as_str()
        .context("category id")?
        .to_string();

    let res = client
        .post(server.url("/api/products"))
        .bearer_auth(token)
        .json(&json!({
            "name": "Desk",
            "description": "Oak",
            "price": 150,
            "quantity": 3,
            "category": category_id
        }))
        .send()
        .await?;
    assert_eq!(res.status(), reqwest::StatusCode::CREATED);

    let listing: Value = client
        .get(server.url("/api/products?price[lte]=200"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(listing["results"], 1);
    assert_eq!(listing["data"]["products"][0]["category"]["name"], "Office");
    assert_eq!(listing["data"]["products"][0]["isLowStock"], true);

    Ok(())
}
