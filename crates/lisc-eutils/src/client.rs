//! HTTP client for the `esearch` and `einfo` endpoints.
//!
//! Only the hit count of a search is used: requests ask for `retmax=0` and
//! JSON output, and the count is read from `esearchresult.count`.

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use lisc_counts::lisc_core::DbInfo;
use lisc_counts::{Transport, TransportError};

use crate::config::{EUtilsConfig, EUtilsConfigError};

const ESEARCH: &str = "esearch.fcgi";
const EINFO: &str = "einfo.fcgi";

/// Longest response excerpt kept in error messages.
const ERROR_EXCERPT: usize = 200;

/// Errors creating a client.
#[derive(Debug, thiserror::Error)]
pub enum EUtilsError {
    #[error(transparent)]
    Config(#[from] EUtilsConfigError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    esearchresult: Option<SearchResult>,
    /// Service-level error, e.g. an exceeded rate limit.
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    count: Option<String>,
    #[serde(rename = "ERROR")]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InfoResponse {
    einforesult: InfoResult,
}

#[derive(Debug, Deserialize)]
struct InfoResult {
    dbinfo: DbInfoList,
}

/// `dbinfo` is a list in current responses and a bare object in older ones.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DbInfoList {
    Many(Vec<DbInfo>),
    One(DbInfo),
}

/// E-Utilities search transport.
#[derive(Debug, Clone)]
pub struct EUtils {
    config: EUtilsConfig,
    http: Client,
}

impl EUtils {
    /// Creates a client with the given configuration.
    pub fn new(config: EUtilsConfig) -> Result<Self, EUtilsError> {
        config.validate()?;
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, http })
    }

    /// Creates a client from environment variables.
    pub fn from_env() -> Result<Self, EUtilsError> {
        Self::new(EUtilsConfig::from_env()?)
    }

    pub fn config(&self) -> &EUtilsConfig {
        &self.config
    }

    /// Query parameters for a count-only search.
    pub fn search_params(&self, query: &str) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("db", self.config.db.clone()),
            ("term", query.to_string()),
            ("retmax", "0".to_string()),
            ("retmode", "json".to_string()),
        ];
        if let Some(field) = &self.config.field {
            params.push(("field", field.clone()));
        }
        if let Some(key) = &self.config.api_key {
            params.push(("api_key", key.clone()));
        }
        params
    }

    /// Query parameters for an `einfo` request.
    pub fn info_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("db", self.config.db.clone()), ("retmode", "json".to_string())];
        if let Some(key) = &self.config.api_key {
            params.push(("api_key", key.clone()));
        }
        params
    }

    async fn get(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<String, TransportError> {
        let response = self
            .http
            .get(self.config.endpoint(endpoint))
            .query(params)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        let body = response.text().await.map_err(request_error)?;
        if !status.is_success() {
            warn!("{} answered {}", endpoint, status);
            return Err(TransportError::Status {
                status: status.as_u16(),
                message: excerpt(&body),
            });
        }
        Ok(body)
    }
}

impl Transport for EUtils {
    async fn execute(&self, query: &str) -> Result<u64, TransportError> {
        let body = self.get(ESEARCH, &self.search_params(query)).await?;
        let count = parse_count(&body)?;
        debug!("esearch {} -> {}", query, count);
        Ok(count)
    }

    /// Unthrottled when called directly; sweeps call it through the
    /// requester, which waits on the shared rate limiter first.
    async fn db_info(&self) -> Result<Option<DbInfo>, TransportError> {
        let body = self.get(EINFO, &self.info_params()).await?;
        parse_db_info(&body).map(Some)
    }
}

/// Reads the hit count from an `esearch` JSON response.
pub fn parse_count(body: &str) -> Result<u64, TransportError> {
    let response: SearchResponse =
        serde_json::from_str(body).map_err(|e| TransportError::Parse(e.to_string()))?;

    if let Some(error) = response.error {
        return Err(TransportError::Parse(error));
    }
    let result = response
        .esearchresult
        .ok_or_else(|| TransportError::Parse("missing esearchresult".to_string()))?;
    if let Some(error) = result.error {
        return Err(TransportError::Parse(error));
    }

    let count = result
        .count
        .ok_or_else(|| TransportError::Parse("missing count".to_string()))?;
    count
        .trim()
        .parse()
        .map_err(|_| TransportError::Parse(format!("count {count:?} is not a number")))
}

/// Reads database metadata from an `einfo` JSON response.
pub fn parse_db_info(body: &str) -> Result<DbInfo, TransportError> {
    let response: InfoResponse =
        serde_json::from_str(body).map_err(|e| TransportError::Parse(e.to_string()))?;

    match response.einforesult.dbinfo {
        DbInfoList::One(info) => Ok(info),
        DbInfoList::Many(list) => list
            .into_iter()
            .next()
            .ok_or_else(|| TransportError::Parse("empty dbinfo".to_string())),
    }
}

fn request_error(e: reqwest::Error) -> TransportError {
    TransportError::Request(e.to_string())
}

fn excerpt(body: &str) -> String {
    match body.char_indices().nth(ERROR_EXCERPT) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_count() {
        let body = r#"{
            "header": {"type": "esearch", "version": "0.3"},
            "esearchresult": {"count": "1234", "retmax": "0", "retstart": "0", "idlist": []}
        }"#;
        assert_eq!(parse_count(body).unwrap(), 1234);
    }

    #[test]
    fn zero_count_is_a_value() {
        let body = r#"{"esearchresult": {"count": "0", "idlist": []}}"#;
        assert_eq!(parse_count(body).unwrap(), 0);
    }

    #[test]
    fn search_error_is_parse_error() {
        let body = r#"{"esearchresult": {"ERROR": "Invalid query syntax"}}"#;
        assert_eq!(
            parse_count(body).unwrap_err(),
            TransportError::Parse("Invalid query syntax".to_string())
        );

        let body = r#"{"error": "API rate limit exceeded", "count": "11"}"#;
        assert_eq!(
            parse_count(body).unwrap_err(),
            TransportError::Parse("API rate limit exceeded".to_string())
        );
    }

    #[test]
    fn malformed_bodies_are_rejected() {
        for body in [
            "<html>busy</html>",
            r#"{"header": {}}"#,
            r#"{"esearchresult": {}}"#,
            r#"{"esearchresult": {"count": "many"}}"#,
        ] {
            assert!(
                matches!(parse_count(body), Err(TransportError::Parse(_))),
                "{body}"
            );
        }
    }

    #[test]
    fn parses_db_info_list_and_object() {
        let list = r#"{"einforesult": {"dbinfo": [{
            "dbname": "pubmed", "menuname": "PubMed", "description": "PubMed bibliographic record",
            "dbbuild": "Build-2024.01.01", "count": "36000000", "lastupdate": "2024/01/01 00:00"
        }]}}"#;
        let info = parse_db_info(list).unwrap();
        assert_eq!(info.dbname, "pubmed");
        assert_eq!(info.count, "36000000");

        let object = r#"{"einforesult": {"dbinfo": {"dbname": "pmc"}}}"#;
        let info = parse_db_info(object).unwrap();
        assert_eq!(info.dbname, "pmc");
        assert_eq!(info.description, "");
    }

    #[test]
    fn search_params_include_optional_fields() {
        let client = EUtils::new(EUtilsConfig {
            field: Some("TIAB".to_string()),
            api_key: Some("secret".to_string()),
            ..EUtilsConfig::default()
        })
        .unwrap();

        let params = client.search_params(r#"("brain")"#);
        assert_eq!(
            params,
            vec![
                ("db", "pubmed".to_string()),
                ("term", r#"("brain")"#.to_string()),
                ("retmax", "0".to_string()),
                ("retmode", "json".to_string()),
                ("field", "TIAB".to_string()),
                ("api_key", "secret".to_string()),
            ]
        );
    }

    #[test]
    fn info_params_carry_db_and_key() {
        let client = EUtils::new(EUtilsConfig {
            db: "pmc".to_string(),
            api_key: Some("secret".to_string()),
            ..EUtilsConfig::default()
        })
        .unwrap();

        assert_eq!(
            client.info_params(),
            vec![
                ("db", "pmc".to_string()),
                ("retmode", "json".to_string()),
                ("api_key", "secret".to_string()),
            ]
        );
    }

    #[test]
    fn long_error_bodies_are_cut() {
        let body = "x".repeat(500);
        let cut = excerpt(&body);
        assert_eq!(cut.len(), ERROR_EXCERPT + 3);
        assert_eq!(excerpt("short"), "short");
    }

    #[tokio::test]
    async fn unreachable_server_is_request_error() {
        let client = EUtils::new(EUtilsConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout: std::time::Duration::from_secs(2),
            ..EUtilsConfig::default()
        })
        .unwrap();

        // A configured HTTP proxy may answer instead of refusing
        let err = client.execute(r#"("brain")"#).await.unwrap_err();
        assert!(matches!(
            err,
            TransportError::Request(_) | TransportError::Status { .. }
        ));
    }
}
