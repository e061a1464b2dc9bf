use crate::api::ApiClient;
use crate::batcher::EventBatcher;
use crate::error::{Error, Result};
use crate::event::{ObjectId, Properties};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

const APPLICATION: &str = "application";
const DASHBOARD: &str = "dashboard";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon_url: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub is_disabled: bool,
    #[serde(default)]
    pub secret_token: Option<String>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewApplication {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ApplicationUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApplicationDashboard {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Listing {
    Page { results: Vec<Application> },
    Plain(Vec<Application>),
}

impl Listing {
    fn into_vec(self) -> Vec<Application> {
        match self {
            Listing::Page { results } => results,
            Listing::Plain(results) => results,
        }
    }
}

pub struct ApplicationsClient {
    api: ApiClient,
    events: Option<Arc<EventBatcher>>,
}

impl ApplicationsClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api, events: None }
    }

    pub fn with_events(mut self, events: Arc<EventBatcher>) -> Self {
        self.events = Some(events);
        self
    }

    pub async fn query(&self, term: Option<&str>) -> Result<Vec<Application>> {
        let mut builder = self.api.request(Method::GET, "api/applications");
        if let Some(term) = term {
            builder = builder.query(&[("q", term)]);
        }
        let listing: Listing = self.api.send_json(builder).await?;
        self.track("list", "applications", None);
        Ok(listing.into_vec())
    }

    pub async fn get(&self, id: i64) -> Result<Application> {
        let application = self
            .api
            .send_json(self.api.request(Method::GET, &resource(id)))
            .await?;
        self.track("view", id, None);
        Ok(application)
    }

    pub async fn create(&self, new: &NewApplication) -> Result<Application> {
        if new.name.trim().is_empty() {
            return Err(Error::MissingField("name"));
        }

        let application: Application = self
            .api
            .send_json(self.api.request(Method::POST, "api/applications").json(new))
            .await?;
        info!(id = application.id, name = %application.name, "application created");
        self.track("create", application.id, None);
        Ok(application)
    }

    pub async fn save(&self, id: i64, update: &ApplicationUpdate) -> Result<Application> {
        let application = self
            .api
            .send_json(self.api.request(Method::POST, &resource(id)).json(update))
            .await?;
        self.track("edit", id, None);
        Ok(application)
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.api
            .send_empty(self.api.request(Method::DELETE, &resource(id)))
            .await?;
        info!(id, "application deleted");
        self.track("delete", id, None);
        Ok(())
    }

    pub async fn enable(&self, application: &mut Application) -> Result<()> {
        let updated: Application = self
            .api
            .send_json(self.api.request(Method::DELETE, &disable_resource(application.id)))
            .await?;
        application.is_disabled = false;
        application.profile_image_url = updated.profile_image_url;
        info!(id = application.id, name = %application.name, "application enabled");
        self.track("enable", application.id, None);
        Ok(())
    }

    pub async fn disable(&self, application: &mut Application) -> Result<()> {
        let updated: Application = self
            .api
            .send_json(self.api.request(Method::POST, &disable_resource(application.id)))
            .await?;
        application.is_disabled = true;
        application.profile_image_url = updated.profile_image_url;
        info!(id = application.id, name = %application.name, "application disabled");
        self.track("disable", application.id, None);
        Ok(())
    }

    pub async fn regenerate_secret_token(&self, id: i64) -> Result<Option<String>> {
        let application: Application = self
            .api
            .send_json(
                self.api
                    .request(Method::POST, &format!("{}/regenerate_secret_token", resource(id))),
            )
            .await?;
        self.track("regenerate_secret_token", id, None);
        Ok(application.secret_token)
    }

    pub async fn dashboards(&self, id: i64) -> Result<Vec<ApplicationDashboard>> {
        let dashboards = self
            .api
            .send_json(self.api.request(Method::GET, &dashboards_resource(id)))
            .await?;
        self.track("list", "dashboards", None);
        Ok(dashboards)
    }

    pub async fn add_dashboard(&self, id: i64, dashboard_id: i64) -> Result<()> {
        let body = serde_json::json!({ "dashboard_id": dashboard_id });
        self.api
            .send_empty(self.api.request(Method::POST, &dashboards_resource(id)).json(&body))
            .await?;
        self.track("add_dashboard_to_application", id, Some(member(dashboard_id)));
        Ok(())
    }

    pub async fn remove_dashboard(&self, id: i64, dashboard_id: i64) -> Result<()> {
        let path = format!("{}/{}", dashboards_resource(id), dashboard_id);
        self.api
            .send_empty(self.api.request(Method::DELETE, &path))
            .await?;
        self.track("delete_dashboard_from_application", id, Some(member(dashboard_id)));
        Ok(())
    }

    pub async fn dashboard_applications(&self, dashboard_id: i64) -> Result<Vec<Application>> {
        let listing: Listing = self
            .api
            .send_json(
                self.api
                    .request(Method::GET, &dashboard_applications_resource(dashboard_id)),
            )
            .await?;
        self.track_on(DASHBOARD, "list", "applications", None);
        Ok(listing.into_vec())
    }

    pub async fn add_application_to_dashboard(
        &self,
        dashboard_id: i64,
        application_id: i64,
    ) -> Result<()> {
        let body = serde_json::json!({ "application_id": application_id });
        self.api
            .send_empty(
                self.api
                    .request(Method::POST, &dashboard_applications_resource(dashboard_id))
                    .json(&body),
            )
            .await?;
        self.track_on(
            DASHBOARD,
            "add_dashboard_to_application",
            dashboard_id,
            Some(member(application_id)),
        );
        Ok(())
    }

    pub async fn remove_application_from_dashboard(
        &self,
        dashboard_id: i64,
        application_id: i64,
    ) -> Result<()> {
        let path = format!(
            "{}/{}",
            dashboard_applications_resource(dashboard_id),
            application_id
        );
        self.api
            .send_empty(self.api.request(Method::DELETE, &path))
            .await?;
        self.track_on(
            DASHBOARD,
            "delete_dashboard_from_application",
            dashboard_id,
            Some(member(application_id)),
        );
        Ok(())
    }

    fn track(&self, action: &str, object_id: impl Into<ObjectId>, properties: Option<Properties>) {
        self.track_on(APPLICATION, action, object_id, properties);
    }

    fn track_on(
        &self,
        object_type: &str,
        action: &str,
        object_id: impl Into<ObjectId>,
        properties: Option<Properties>,
    ) {
        if let Some(events) = &self.events {
            events.record(action, object_type, object_id, properties);
        }
    }
}

fn resource(id: i64) -> String {
    format!("api/applications/{}", id)
}

fn disable_resource(id: i64) -> String {
    format!("{}/disable", resource(id))
}

fn dashboards_resource(id: i64) -> String {
    format!("{}/dashboards", resource(id))
}

fn dashboard_applications_resource(dashboard_id: i64) -> String {
    format!("api/dashboards/{}/applications", dashboard_id)
}

fn member(id: i64) -> Properties {
    let mut properties = Properties::new();
    properties.insert("member_id".to_string(), Value::from(id));
    properties
}
