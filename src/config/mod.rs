pub mod schema;

#[allow(unused_imports)]
pub use schema::{
    Config, EndpointsConfig, GatewayConfig, ResourceApi, TogglConfig, DEFAULT_INSIGHTS_URL,
    DEFAULT_REPORTS_V2_URL, DEFAULT_REPORTS_V3_URL, DEFAULT_USER_AGENT, DEFAULT_V8_URL,
    DEFAULT_V9_URL, DEFAULT_WEBHOOKS_URL,
};
