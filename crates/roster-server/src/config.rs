use roster_core::ResizeOptions;
use roster_crypto::KdfParams;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RosterConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub images: ImagesConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

pub const DEFAULT_DB_URL: &str = "sqlite://roster.sqlite";
pub const DEFAULT_DB_POOL_MAX: u32 = 10;
pub const DEFAULT_IMAGE_ROOT: &str = "storage/images";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_url")]
    pub url: String,
    #[serde(default = "default_db_pool_max")]
    pub pool_max: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_db_url(),
            pool_max: default_db_pool_max(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagesConfig {
    #[serde(default = "default_image_root")]
    pub root: String,
    /// Size applied by the admin create/update paths; unset stores uploads as given.
    #[serde(default)]
    pub default_size: Option<ResizeOptions>,
    #[serde(default = "default_profile_size")]
    pub profile_size: ResizeOptions,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            root: default_image_root(),
            default_size: None,
            profile_size: default_profile_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub kdf: KdfParams,
    #[serde(default = "default_kdf_max_concurrency")]
    pub kdf_max_concurrency: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            kdf: KdfParams::default(),
            kdf_max_concurrency: default_kdf_max_concurrency(),
        }
    }
}

fn default_db_url() -> String {
    DEFAULT_DB_URL.to_string()
}

fn default_db_pool_max() -> u32 {
    DEFAULT_DB_POOL_MAX
}

fn default_image_root() -> String {
    DEFAULT_IMAGE_ROOT.to_string()
}

fn default_profile_size() -> ResizeOptions {
    ResizeOptions::PROFILE_THUMBNAIL
}

fn default_kdf_max_concurrency() -> usize {
    4
}
