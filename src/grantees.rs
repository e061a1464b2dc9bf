use crate::api::ApiClient;
use crate::error::Result;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessType {
    #[default]
    Modify,
    View,
    Delete,
}

impl AccessType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessType::Modify => "modify",
            AccessType::View => "view",
            AccessType::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Grantee {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
}

#[derive(Serialize)]
struct PermissionChange {
    access_type: AccessType,
    user_id: i64,
}

pub struct GranteesClient {
    api: ApiClient,
    acl_path: String,
}

impl GranteesClient {
    pub fn new(api: ApiClient, acl_path: impl Into<String>) -> Self {
        Self {
            api,
            acl_path: acl_path.into(),
        }
    }

    pub async fn load(&self) -> Result<HashMap<String, Vec<Grantee>>> {
        self.api
            .send_json(self.api.request(Method::GET, &self.acl_path))
            .await
    }

    pub async fn add(&self, user_id: i64, access_type: AccessType) -> Result<()> {
        let change = PermissionChange {
            access_type,
            user_id,
        };
        self.api
            .send_empty(self.api.request(Method::POST, &self.acl_path).json(&change))
            .await
            .map_err(|error| {
                warn!(user_id, %error, "could not grant permission to the user");
                error
            })
    }

    pub async fn remove(&self, user_id: i64, access_type: AccessType) -> Result<()> {
        let change = PermissionChange {
            access_type,
            user_id,
        };
        self.api
            .send_empty(self.api.request(Method::DELETE, &self.acl_path).json(&change))
            .await
            .map_err(|error| {
                warn!(user_id, %error, "could not remove permission from the user");
                error
            })
    }
}
