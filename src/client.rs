use crate::config::{join_url, EnvironmentConfig, Settings};
use crate::constants::{
    APPLICATION_ZIP, DCR_CALLBACK_URL, DCR_CLIENT_NAME, DCR_GRANT_TYPES, OAUTH_SCOPES,
};
use crate::credentials::{BasicCredentials, StoredCredential};
use crate::model::{
    ApiList, Application, ApplicationKeyList, ApplicationList, ClientRegistration,
    NewApplication, SubscriptionList, TokenResponse,
};
use anyhow::{Context, Result};
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION},
    multipart, Client, Response, StatusCode,
};
use std::time::Duration;

/// Failures reported by the platform for an otherwise completed request
#[derive(Debug, thiserror::Error)]
pub enum ApimError {
    /// The import/export endpoints answer a bad Basic password with a 500
    #[error("Incorrect password")]
    IncorrectPassword,
    #[error("{action}: {status}")]
    Status {
        action: String,
        status: StatusCode,
        body: String,
    },
}

/// How requests of a client authenticate
#[derive(Debug, Clone)]
pub enum Auth {
    None,
    Basic(BasicCredentials),
    Bearer(String),
}

pub struct ApimClient {
    pub env_name: String,
    pub endpoints: EnvironmentConfig,
    pub client: Client,
    basic_auth: bool,
}

impl ApimClient {
    pub fn new(
        env_name: &str,
        env: &EnvironmentConfig,
        settings: &Settings,
        insecure: bool,
        auth: Auth,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let basic_auth = matches!(auth, Auth::Basic(_));
        match &auth {
            Auth::None => {}
            Auth::Basic(creds) => {
                let hv = HeaderValue::from_str(&creds.header_value())?;
                headers.insert(AUTHORIZATION, hv);
            }
            Auth::Bearer(token) => {
                let hv = HeaderValue::from_str(&format!("Bearer {}", token))?;
                headers.insert(AUTHORIZATION, hv);
            }
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(settings.http_request_timeout))
            .danger_accept_invalid_certs(insecure)
            .build()?;
        Ok(ApimClient {
            env_name: env_name.to_string(),
            endpoints: env.clone(),
            client,
            basic_auth,
        })
    }

    /// Build a Bearer-authenticated client via the password grant
    ///
    /// Reuses the OAuth client stored at login when there is one, and
    /// registers a fresh one otherwise. Returns the credential worth storing.
    pub async fn with_password_grant(
        env_name: &str,
        env: &EnvironmentConfig,
        settings: &Settings,
        insecure: bool,
        creds: &BasicCredentials,
        stored: Option<&StoredCredential>,
    ) -> Result<(Self, StoredCredential)> {
        let anonymous = ApimClient::new(env_name, env, settings, insecure, Auth::None)?;
        let registration = match stored.filter(|s| s.has_client()) {
            Some(s) => ClientRegistration {
                client_id: s.client_id.clone(),
                client_secret: s.client_secret.clone(),
            },
            None => anonymous.register_client(creds).await?,
        };
        let token = anonymous.request_token(&registration, creds).await?;
        let client = ApimClient::new(env_name, env, settings, insecure, Auth::Bearer(token))?;
        let credential = StoredCredential::new(
            creds,
            &registration.client_id,
            &registration.client_secret,
        );
        Ok((client, credential))
    }

    /// Map a response onto success or an [`ApimError`]
    async fn check(
        &self,
        resp: Response,
        action: &str,
        ok: fn(StatusCode) -> bool,
    ) -> Result<Response> {
        let status = resp.status();
        tracing::debug!("{} on {}: {}", action, self.env_name, status);
        if ok(status) {
            return Ok(resp);
        }
        if self.basic_auth && status == StatusCode::INTERNAL_SERVER_ERROR {
            return Err(ApimError::IncorrectPassword.into());
        }
        let body = resp.text().await.unwrap_or_default();
        tracing::debug!("error body: {}", body);
        Err(ApimError::Status {
            action: action.to_string(),
            status,
            body,
        }
        .into())
    }

    /// Register an OAuth client for `creds` (dynamic client registration)
    pub async fn register_client(&self, creds: &BasicCredentials) -> Result<ClientRegistration> {
        let url = self.endpoints.registration();
        tracing::debug!("RegisterClient: URL: {}", url);
        let body = serde_json::json!({
            "callbackUrl": DCR_CALLBACK_URL,
            "clientName": DCR_CLIENT_NAME,
            "owner": creds.username,
            "grantType": DCR_GRANT_TYPES,
            "saasApp": true,
        });
        let resp = self
            .client
            .post(&url)
            .header(AUTHORIZATION, creds.header_value())
            .json(&body)
            .send()
            .await
            .with_context(|| format!("cannot reach {}", url))?;
        let resp = self
            .check(resp, "Error registering client", |s| s.is_success())
            .await?;
        Ok(resp.json().await?)
    }

    /// Obtain an access token with the password grant
    pub async fn request_token(
        &self,
        registration: &ClientRegistration,
        creds: &BasicCredentials,
    ) -> Result<String> {
        let url = self.endpoints.token();
        tracing::debug!("RequestToken: URL: {}", url);
        let client_auth = BasicCredentials {
            username: registration.client_id.clone(),
            password: registration.client_secret.clone(),
        };
        let form = [
            ("grant_type", "password"),
            ("username", creds.username.as_str()),
            ("password", creds.password.as_str()),
            ("scope", OAUTH_SCOPES),
        ];
        let resp = self
            .client
            .post(&url)
            .header(AUTHORIZATION, client_auth.header_value())
            .form(&form)
            .send()
            .await
            .with_context(|| format!("cannot reach {}", url))?;
        let resp = self
            .check(resp, "Error getting access token", |s| s.is_success())
            .await?;
        let token: TokenResponse = resp.json().await?;
        Ok(token.access_token)
    }

    /// Download an API as a zip
    pub async fn export_api(
        &self,
        name: &str,
        version: &str,
        provider: Option<&str>,
    ) -> Result<bytes::Bytes> {
        let url = join_url(&self.endpoints.import_export(), "export-api");
        let mut query = vec![("name", name), ("version", version)];
        if let Some(p) = provider.filter(|p| !p.is_empty()) {
            query.push(("provider", p));
        }
        tracing::debug!("ExportAPI: URL: {} {:?}", url, query);
        let resp = self
            .client
            .get(&url)
            .header(ACCEPT, APPLICATION_ZIP)
            .query(&query)
            .send()
            .await
            .with_context(|| format!("Error exporting API: {}", name))?;
        let resp = self
            .check(resp, "Error exporting API", |s| s == StatusCode::OK)
            .await?;
        Ok(resp.bytes().await?)
    }

    /// Upload an API archive; `update` replaces an existing API
    pub async fn import_api(
        &self,
        archive: Vec<u8>,
        file_name: &str,
        preserve_provider: bool,
        update: bool,
    ) -> Result<String> {
        let url = join_url(&self.endpoints.import_export(), "import-api");
        tracing::debug!("ImportAPI: URL: {} update={}", url, update);
        let form = zip_form(archive, file_name)?;
        let req = if update {
            self.client.put(&url)
        } else {
            self.client.post(&url)
        };
        let resp = req
            .query(&[("preserveProvider", preserve_provider.to_string())])
            .multipart(form)
            .send()
            .await
            .with_context(|| format!("Error importing API from {}", file_name))?;
        let resp = self
            .check(resp, "Error importing API", |s| s.is_success())
            .await?;
        Ok(resp.text().await.unwrap_or_default())
    }

    /// Search APIs by name in the publisher
    pub async fn list_apis(&self, name: &str) -> Result<ApiList> {
        let url = join_url(&self.endpoints.publisher(), "apis");
        tracing::debug!("ListAPIs: URL: {} name={}", url, name);
        let resp = self
            .client
            .get(&url)
            .query(&[("query", format!("name:{}", name))])
            .send()
            .await?;
        let resp = self
            .check(resp, "Error getting list of APIs", |s| s.is_success())
            .await?;
        Ok(resp.json().await?)
    }

    /// Download an application as a zip
    pub async fn export_app(
        &self,
        name: &str,
        owner: &str,
        with_keys: bool,
        format: Option<&str>,
    ) -> Result<bytes::Bytes> {
        let url = join_url(&self.endpoints.devportal(), "applications/export");
        let mut query = vec![("appName", name), ("appOwner", owner)];
        if with_keys {
            query.push(("withKeys", "true"));
        }
        if let Some(f) = format.filter(|f| !f.is_empty()) {
            query.push(("format", f));
        }
        tracing::debug!("ExportApp: URL: {} {:?}", url, query);
        let resp = self
            .client
            .get(&url)
            .header(ACCEPT, APPLICATION_ZIP)
            .query(&query)
            .send()
            .await
            .with_context(|| format!("Error exporting Application: {}", name))?;
        let resp = self
            .check(resp, "Error exporting Application", |s| s == StatusCode::OK)
            .await?;
        Ok(resp.bytes().await?)
    }

    /// Upload an application archive
    pub async fn import_app(
        &self,
        archive: Vec<u8>,
        file_name: &str,
        options: &AppImportOptions,
    ) -> Result<String> {
        let url = join_url(&self.endpoints.devportal(), "applications/import");
        let mut query = vec![
            ("preserveOwner", options.preserve_owner.to_string()),
            ("skipSubscriptions", options.skip_subscriptions.to_string()),
            ("skipApplicationKeys", options.skip_keys.to_string()),
            ("update", options.update.to_string()),
        ];
        if let Some(owner) = options.owner.as_deref().filter(|o| !o.is_empty()) {
            query.push(("appOwner", owner.to_string()));
        }
        tracing::debug!("ImportApp: URL: {} {:?}", url, query);
        let resp = self
            .client
            .post(&url)
            .query(&query)
            .multipart(zip_form(archive, file_name)?)
            .send()
            .await
            .with_context(|| format!("Error importing Application from {}", file_name))?;
        let resp = self
            .check(resp, "Error importing Application", |s| s.is_success())
            .await?;
        Ok(resp.text().await.unwrap_or_default())
    }

    /// List applications, keeping only those of `owner` when given
    ///
    /// The devportal `query` parameter searches by name, so the owner is
    /// filtered on the returned list instead.
    pub async fn list_apps(&self, owner: Option<&str>) -> Result<ApplicationList> {
        let url = join_url(&self.endpoints.devportal(), "applications");
        let resp = self
            .client
            .get(&url)
            .query(&[("limit", "1000")])
            .send()
            .await?;
        let resp = self
            .check(resp, "Error listing Applications", |s| s.is_success())
            .await?;
        let mut apps: ApplicationList = resp.json().await?;
        if let Some(owner) = owner.filter(|o| !o.is_empty()) {
            apps.list.retain(|a| a.owner == owner);
            apps.count = apps.list.len() as i64;
        }
        Ok(apps)
    }

    pub async fn get_application(&self, id: &str) -> Result<Application> {
        let url = join_url(&self.endpoints.devportal(), &format!("applications/{id}"));
        let resp = self.client.get(&url).send().await?;
        let resp = self
            .check(resp, "Error getting Application", |s| s.is_success())
            .await?;
        Ok(resp.json().await?)
    }

    /// Find an application by exact name (and owner, when given)
    pub async fn find_application(
        &self,
        name: &str,
        owner: Option<&str>,
    ) -> Result<Option<Application>> {
        let apps = self.list_apps(owner).await?;
        match apps.list.into_iter().find(|a| a.name == name) {
            Some(info) => Ok(Some(self.get_application(&info.application_id).await?)),
            None => Ok(None),
        }
    }

    pub async fn create_application(&self, app: &NewApplication) -> Result<Application> {
        let url = join_url(&self.endpoints.devportal(), "applications");
        let resp = self.client.post(&url).json(app).send().await?;
        let resp = self
            .check(resp, "Error creating Application", |s| s.is_success())
            .await?;
        Ok(resp.json().await?)
    }

    pub async fn delete_application(&self, id: &str) -> Result<()> {
        let url = join_url(&self.endpoints.devportal(), &format!("applications/{id}"));
        let resp = self.client.delete(&url).send().await?;
        self.check(resp, "Error deleting Application", |s| s.is_success())
            .await?;
        Ok(())
    }

    pub async fn list_subscriptions(&self, application_id: &str) -> Result<SubscriptionList> {
        let url = join_url(&self.endpoints.devportal(), "subscriptions");
        let resp = self
            .client
            .get(&url)
            .query(&[("applicationId", application_id), ("limit", "1000")])
            .send()
            .await?;
        let resp = self
            .check(resp, "Error listing subscriptions", |s| s.is_success())
            .await?;
        Ok(resp.json().await?)
    }

    pub async fn list_application_keys(&self, application_id: &str) -> Result<ApplicationKeyList> {
        let url = join_url(
            &self.endpoints.devportal(),
            &format!("applications/{application_id}/keys"),
        );
        let resp = self.client.get(&url).send().await?;
        let resp = self
            .check(resp, "Error getting Application keys", |s| s.is_success())
            .await?;
        Ok(resp.json().await?)
    }
}

/// Query options of an application import
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppImportOptions {
    pub owner: Option<String>,
    pub preserve_owner: bool,
    pub update: bool,
    pub skip_keys: bool,
    pub skip_subscriptions: bool,
}

fn zip_form(archive: Vec<u8>, file_name: &str) -> Result<multipart::Form> {
    let part = multipart::Part::bytes(archive)
        .file_name(file_name.to_string())
        .mime_str(APPLICATION_ZIP)?;
    Ok(multipart::Form::new().part("file", part))
}
