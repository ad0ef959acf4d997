//! HTTP client integration tests against a mock backend

mod dispatch_test;
mod fetch_test;

use socialsync::client::api_client::ApiClient;
use socialsync::client::Config;
use socialsync::shared::config::AppConfig;

pub fn client_for(uri: &str, token: Option<&str>) -> ApiClient {
    let mut config = Config::with_builder(AppConfig::builder().server_url(uri)).unwrap();
    config.set_token(token.map(str::to_string));
    ApiClient::new(config).unwrap()
}
