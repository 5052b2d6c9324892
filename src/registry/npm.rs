use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;

use crate::model::config::RegistryConfig;
use crate::registry::{PluginSummary, Registry, RegistryError};

/// npm caps search pages at 250 results.
const MAX_PAGE_SIZE: usize = 250;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    objects: Vec<SearchObject>,
    #[serde(default)]
    total: usize,
}

#[derive(Debug, Deserialize)]
struct SearchObject {
    package: SearchPackage,
}

#[derive(Debug, Deserialize)]
struct SearchPackage {
    name: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug)]
pub struct NpmRegistry {
    client: Client,
    base_url: String,
    page_size: usize,
}

impl NpmRegistry {
    pub fn new(config: &RegistryConfig) -> Result<Self, RegistryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("hpm/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            page_size: config.page_size.clamp(1, MAX_PAGE_SIZE),
        })
    }
}

impl Registry for NpmRegistry {
    fn query_by_keyword(&self, keyword: &str) -> Result<Vec<PluginSummary>, RegistryError> {
        let url = format!("{}/-/v1/search", self.base_url);
        let text = format!("keywords:{keyword}");
        let mut plugins = Vec::new();

        loop {
            let response = self
                .client
                .get(&url)
                .query(&[
                    ("text", text.clone()),
                    ("size", self.page_size.to_string()),
                    ("from", plugins.len().to_string()),
                ])
                .send()?;

            let status = response.status();
            if !status.is_success() {
                return Err(RegistryError::Status {
                    status: status.as_u16(),
                    url,
                });
            }

            let page: SearchResponse = response.json()?;
            let fetched = page.objects.len();
            plugins.extend(page.objects.into_iter().map(|object| PluginSummary {
                name: object.package.name,
                description: object.package.description.unwrap_or_default(),
            }));

            if fetched == 0 || plugins.len() >= page.total {
                break;
            }
        }

        debug!(keyword, count = plugins.len(), "registry keyword query");
        Ok(plugins)
    }

    fn is_name_taken(&self, name: &str) -> Result<bool, RegistryError> {
        let url = format!("{}/{}", self.base_url, encode_package_name(name));
        let response = self.client.get(&url).send()?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(RegistryError::Status {
                status: status.as_u16(),
                url,
            }),
        }
    }
}

/// Scoped names (`@scope/pkg`) are fetched with the slash escaped.
fn encode_package_name(name: &str) -> String {
    name.replace('/', "%2F")
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;

    use super::*;

    fn registry(url: &str, page_size: usize) -> NpmRegistry {
        NpmRegistry::new(&RegistryConfig {
            url: url.to_string(),
            keyword: "hyperterm".to_string(),
            timeout_secs: 5,
            page_size,
        })
        .unwrap()
    }

    fn page(names: &[(&str, Option<&str>)], total: usize) -> String {
        let objects: Vec<serde_json::Value> = names
            .iter()
            .map(|(name, description)| {
                serde_json::json!({ "package": { "name": name, "description": description } })
            })
            .collect();
        serde_json::json!({ "objects": objects, "total": total }).to_string()
    }

    #[test]
    fn test_query_by_keyword_pages_until_total() {
        let mut server = mockito::Server::new();
        let first = server
            .mock("GET", "/-/v1/search")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("text".into(), "keywords:hyperterm".into()),
                Matcher::UrlEncoded("from".into(), "0".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(page(
                &[("hyperterm-a", Some("first")), ("hyperterm-b", None)],
                3,
            ))
            .create();
        let second = server
            .mock("GET", "/-/v1/search")
            .match_query(Matcher::UrlEncoded("from".into(), "2".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(page(&[("hyperterm-c", Some("third"))], 3))
            .create();

        let plugins = registry(&server.url(), 2)
            .query_by_keyword("hyperterm")
            .unwrap();

        first.assert();
        second.assert();
        assert_eq!(
            plugins,
            vec![
                PluginSummary {
                    name: "hyperterm-a".into(),
                    description: "first".into()
                },
                PluginSummary {
                    name: "hyperterm-b".into(),
                    description: String::new()
                },
                PluginSummary {
                    name: "hyperterm-c".into(),
                    description: "third".into()
                },
            ]
        );
    }

    #[test]
    fn test_query_by_keyword_stops_on_empty_page() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/-/v1/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(page(&[], 10))
            .expect(1)
            .create();

        let plugins = registry(&server.url(), 250)
            .query_by_keyword("hyperterm")
            .unwrap();
        assert!(plugins.is_empty());
        mock.assert();
    }

    #[test]
    fn test_query_by_keyword_server_error() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/-/v1/search")
            .match_query(Matcher::Any)
            .with_status(503)
            .create();

        let err = registry(&server.url(), 250)
            .query_by_keyword("hyperterm")
            .unwrap_err();
        assert!(matches!(err, RegistryError::Status { status: 503, .. }));
    }

    #[test]
    fn test_is_name_taken() {
        let mut server = mockito::Server::new();
        let _taken = server
            .mock("GET", "/hyperterm-a")
            .with_status(200)
            .with_body("{}")
            .create();
        let _free = server.mock("GET", "/hyperterm-free").with_status(404).create();
        let _scoped = server
            .mock("GET", Matcher::Regex("^/@me%2[Ff]hyperterm-x$".into()))
            .with_status(200)
            .with_body("{}")
            .create();
        let _broken = server.mock("GET", "/hyperterm-broken").with_status(500).create();

        let registry = registry(&format!("{}/", server.url()), 250);
        assert!(registry.is_name_taken("hyperterm-a").unwrap());
        assert!(!registry.is_name_taken("hyperterm-free").unwrap());
        assert!(registry.is_name_taken("@me/hyperterm-x").unwrap());
        assert!(registry.is_name_taken("hyperterm-broken").is_err());
    }
}
