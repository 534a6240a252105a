//! Well-known file names, endpoint paths and header values.

/// Overrides the directory holding `main_config.yaml` and `keys.yaml`
pub const CONFIG_DIR_ENV: &str = "APICTL_CONFIG_DIR";
pub const CONFIG_DIR_NAME: &str = "apictl";
pub const MAIN_CONFIG_FILE: &str = "main_config.yaml";
pub const KEYS_FILE: &str = "keys.yaml";

pub const EXPORTED_DIR_NAME: &str = "exported";
pub const EXPORTED_APIS_DIR_NAME: &str = "apis";
pub const EXPORTED_APPS_DIR_NAME: &str = "apps";

pub const META_FILE_API: &str = "api_meta.yaml";
pub const META_FILE_APPLICATION: &str = "application_meta.yaml";

pub const IMPORT_EXPORT_PATH: &str = "api-import-export";
pub const PUBLISHER_PATH: &str = "api/am/publisher/v1";
pub const DEVPORTAL_PATH: &str = "api/am/store/v1";
pub const TOKEN_PATH: &str = "oauth2/token";
pub const REGISTRATION_PATH: &str = "client-registration/v0.17/register";

pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 10_000;

pub const APPLICATION_ZIP: &str = "application/zip";

pub const DCR_CLIENT_NAME: &str = "apictl_rest_client";
pub const DCR_CALLBACK_URL: &str = "www.google.lk";
pub const DCR_GRANT_TYPES: &str = "client_credentials password refresh_token";

pub const OAUTH_SCOPES: &str = "apim:api_view apim:api_create apim:subscribe \
    apim:app_manage apim:sub_manage apim:app_import_export apim:api_import_export";
