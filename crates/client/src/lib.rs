//! `bluemine-client` — authenticated HTTP client for the Bluemine API.
//!
//! The core is the request wrapper in [`http`]: credential decoration on the
//! way out, single-flight token refresh on 401, FIFO replay of everything
//! that queued behind the refresh. Resource services under [`resources`] are
//! thin typed wrappers over that core.

pub mod auth_api;
pub mod config;
pub mod error;
pub mod http;
pub mod request;
pub mod resources;

pub use auth_api::{AuthPayload, AvatarUpload, RegisterForm};
pub use config::{ClientConfig, DEFAULT_BASE_URL};
pub use error::{ApiError, extract_error_message};
pub use http::ApiClient;
pub use request::ApiRequest;
