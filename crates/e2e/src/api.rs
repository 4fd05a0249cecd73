//! OpenProject REST client
//!
//! Thin HAL+JSON client for the handful of admin operations the suite needs:
//! looking a user up by login or email and granting admin rights so the
//! browser flows can reach admin-only pages.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{E2eError, E2eResult};

const USERS_PAGE_SIZE: u32 = 200;

/// A user record as OpenProject's v3 API returns it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiUser {
    pub id: u64,
    pub login: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsersEmbedded {
    elements: Vec<ApiUser>,
}

#[derive(Debug, Deserialize)]
struct UsersCollection {
    #[serde(rename = "_embedded")]
    embedded: UsersEmbedded,
}

/// Authenticated client against the OpenProject v3 API
pub struct OpenProjectApi {
    client: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
}

impl OpenProjectApi {
    pub fn new(base_url: &str, username: &str, password: &str) -> E2eResult<Self> {
        // Cluster-local TLS uses self-signed certificates.
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    /// List all users visible to the authenticated account.
    pub async fn list_users(&self) -> E2eResult<Vec<ApiUser>> {
        let endpoint = format!("/api/v3/users?offset=1&pageSize={USERS_PAGE_SIZE}");
        let body = self.get(&endpoint).await?;
        let collection: UsersCollection = serde_json::from_str(&body)?;
        debug!(
            count = collection.embedded.elements.len(),
            "fetched OpenProject users"
        );
        Ok(collection.embedded.elements)
    }

    /// Find a user by login or email, case-insensitively.
    pub async fn find_user(&self, identifier: &str) -> E2eResult<ApiUser> {
        let users = self.list_users().await?;
        match_user(&users, identifier)
            .cloned()
            .ok_or_else(|| E2eError::UserNotFound(identifier.to_string()))
    }

    /// Make sure a user has admin rights; returns whether a change was made.
    pub async fn ensure_user_is_admin(&self, identifier: &str) -> E2eResult<bool> {
        let user = self.find_user(identifier).await?;
        if user.admin {
            debug!(login = %user.login, "user already has admin rights");
            return Ok(false);
        }
        self.set_user_admin(user.id, true).await?;
        info!(login = %user.login, id = user.id, "granted admin rights");
        Ok(true)
    }

    /// Toggle the admin flag on a user record.
    pub async fn set_user_admin(&self, user_id: u64, admin: bool) -> E2eResult<()> {
        let endpoint = format!("/api/v3/users/{user_id}");
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self
            .client
            .patch(&url)
            .basic_auth(&self.username, Some(&self.password))
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({ "admin": admin }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(E2eError::Api {
                method: "PATCH".to_string(),
                endpoint,
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    async fn get(&self, endpoint: &str) -> E2eResult<String> {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self
            .client
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .header("Accept", "application/hal+json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(E2eError::Api {
                method: "GET".to_string(),
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

fn match_user<'a>(users: &'a [ApiUser], identifier: &str) -> Option<&'a ApiUser> {
    users.iter().find(|u| {
        u.login.eq_ignore_ascii_case(identifier)
            || u.email
                .as_deref()
                .is_some_and(|e| e.eq_ignore_ascii_case(identifier))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_users() -> Vec<ApiUser> {
        serde_json::from_value(serde_json::json!([
            {
                "id": 1,
                "login": "admin",
                "email": "admin@example.com",
                "admin": true,
                "status": "active"
            },
            {
                "id": 7,
                "login": "alice",
                "email": "alice@example.test",
                "admin": false
            }
        ]))
        .unwrap()
    }

    #[test]
    fn hal_collection_decodes() {
        let body = serde_json::json!({
            "_type": "Collection",
            "total": 2,
            "count": 2,
            "_embedded": {
                "elements": [
                    { "id": 1, "login": "admin", "admin": true },
                    { "id": 7, "login": "alice" }
                ]
            },
            "_links": {}
        })
        .to_string();

        let collection: UsersCollection = serde_json::from_str(&body).unwrap();
        assert_eq!(collection.embedded.elements.len(), 2);
        assert_eq!(collection.embedded.elements[1].login, "alice");
        assert!(!collection.embedded.elements[1].admin);
        assert_eq!(collection.embedded.elements[1].email, None);
    }

    #[test]
    fn users_match_by_login_or_email_case_insensitively() {
        let users = sample_users();
        assert_eq!(match_user(&users, "ALICE").unwrap().id, 7);
        assert_eq!(match_user(&users, "Alice@Example.Test").unwrap().id, 7);
        assert_eq!(match_user(&users, "admin@example.com").unwrap().id, 1);
        assert!(match_user(&users, "brian").is_none());
    }
}
