//! robota.ua adapter: structured JSON API behind a bearer-token login.
//!
//! Search is count-then-fetch: the first POST reports `total`, the second asks for
//! exactly that many documents.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::config::RobotaConfig;
use crate::models::resume::{normalize_text, ExperienceEntry, ResumeRecord};
use crate::models::SearchQuery;
use crate::ranking::completeness;
use crate::sources::http::ensure_success;
use crate::sources::{ResumeSource, SourceError};
use crate::vocabulary::{FuzzyMatcher, VocabularyIndex};

pub const SOURCE_NAME: &str = "robota.ua";

/// Selecting this bracket also selects every longer bracket the API knows about.
const OPEN_ENDED_EXPERIENCE: &str = "More than 5 years";
const OPEN_ENDED_EXPANSION: [&str; 2] = ["5 to 10 years", "More than 10 years"];

#[derive(Debug, Clone, Default)]
pub struct RobotaVocabularies {
    pub regions: VocabularyIndex,
    pub experience: VocabularyIndex,
}

pub struct RobotaSource {
    client: Client,
    config: RobotaConfig,
    token: String,
    matcher: FuzzyMatcher,
    vocabularies: RobotaVocabularies,
}

#[derive(Debug, Serialize)]
struct SalaryRange {
    from: Option<u32>,
    to: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchPayload<'a> {
    city_id: Option<Value>,
    key_words: &'a str,
    salary: SalaryRange,
    experience_ids: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<u64>,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    total: u64,
    /// Decoded one by one; a malformed document is skipped.
    #[serde(default)]
    documents: Vec<Value>,
}

/// Every field is optional and loosely typed.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RobotaDocument {
    resume_id: Value,
    salary: Value,
    experience: Value,
    filling_percentage: Value,
}

impl RobotaSource {
    /// Logs in and returns a ready adapter.
    ///
    /// A rejected login or an unreadable token is `AuthenticationFailure`; a login
    /// endpoint that cannot be reached is `SourceUnavailable`.
    pub async fn connect(
        config: RobotaConfig,
        client: Client,
        matcher: FuzzyMatcher,
        vocabularies: RobotaVocabularies,
    ) -> Result<Self, SourceError> {
        let token = login(&client, &config).await?;
        info!(
            "Logged in to {} ({} regions, {} experience options)",
            SOURCE_NAME,
            vocabularies.regions.len(),
            vocabularies.experience.len()
        );

        Ok(Self {
            client,
            config,
            token,
            matcher,
            vocabularies,
        })
    }

    fn build_payload<'a>(&self, query: &'a SearchQuery) -> SearchPayload<'a> {
        let city_id = query
            .region()
            .and_then(|region| self.vocabularies.regions.resolve(&self.matcher, region))
            .map(id_value);

        SearchPayload {
            city_id,
            key_words: query.keywords.trim(),
            salary: SalaryRange {
                from: query.salary_from,
                to: query.salary_to,
            },
            experience_ids: self.experience_ids(query),
            count: None,
        }
    }

    fn experience_ids(&self, query: &SearchQuery) -> Vec<Value> {
        let experience = &self.vocabularies.experience;
        let mut ids: Vec<&str> = Vec::new();

        for tag in &query.experience_tags {
            if let Some(id) = experience.lookup(&self.matcher, tag) {
                ids.push(id);
            }
            if tag.trim().eq_ignore_ascii_case(OPEN_ENDED_EXPERIENCE) {
                ids.extend(OPEN_ENDED_EXPANSION.iter().filter_map(|label| experience.get(label)));
            }
        }

        let mut seen = std::collections::HashSet::new();
        ids.retain(|id| seen.insert(*id));
        ids.into_iter().map(id_value).collect()
    }

    async fn post_search(&self, payload: &SearchPayload<'_>) -> Result<SearchResponse, SourceError> {
        let response = self
            .client
            .post(&self.config.resumes_url)
            .bearer_auth(&self.token)
            .json(payload)
            .send()
            .await
            .map_err(|e| SourceError::from_transport(SOURCE_NAME, e))?;
        let response = ensure_success(response, SOURCE_NAME).await?;

        let body = response
            .text()
            .await
            .map_err(|e| SourceError::from_transport(SOURCE_NAME, e))?;
        serde_json::from_str(&body)
            .map_err(|e| SourceError::parse(SOURCE_NAME, format!("invalid search response: {e}")))
    }

    fn to_record(&self, document: Value) -> Option<ResumeRecord> {
        let document: RobotaDocument = match serde_json::from_value(document) {
            Ok(document) => document,
            Err(e) => {
                warn!("Skipping malformed {} document: {e}", SOURCE_NAME);
                return None;
            }
        };
        let Some(resume_id) = scalar_to_string(&document.resume_id) else {
            warn!("Skipping {} document without resumeId", SOURCE_NAME);
            return None;
        };

        let salary = scalar_to_string(&document.salary);
        let experience: Vec<ExperienceEntry> = document
            .experience
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(Value::as_object)
            .map(|exp| ExperienceEntry {
                position: text_field(exp.get("position")),
                duration: text_field(exp.get("datesDiff")),
                details: text_field(exp.get("company")),
            })
            .collect();

        // Non-numeric percentages are treated as missing.
        let filling_percentage = match document.filling_percentage.as_f64() {
            Some(pct) => pct.round() as i64,
            None => i64::from(completeness::score(&document_text(salary.as_deref(), &experience))),
        };

        Some(ResumeRecord::new(
            format!("{}/candidates/{}", self.config.base_url.trim_end_matches('/'), resume_id),
            salary.as_deref().and_then(normalize_text),
            experience,
            filling_percentage,
        ))
    }
}

#[async_trait]
impl ResumeSource for RobotaSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<ResumeRecord>, SourceError> {
        let mut payload = self.build_payload(query);

        let counted = self.post_search(&payload).await?;
        info!("Found {} resumes on {}", counted.total, SOURCE_NAME);
        if counted.total == 0 {
            return Ok(Vec::new());
        }

        payload.count = Some(counted.total);
        let fetched = self.post_search(&payload).await?;

        let resumes: Vec<ResumeRecord> = fetched
            .documents
            .into_iter()
            .filter_map(|document| self.to_record(document))
            .collect();
        info!("Parsed {} resumes from {}", resumes.len(), SOURCE_NAME);

        Ok(resumes)
    }
}

async fn login(client: &Client, config: &RobotaConfig) -> Result<String, SourceError> {
    let response = client
        .post(&config.login_url)
        .json(&LoginRequest {
            username: &config.username,
            password: &config.password,
        })
        .send()
        .await
        .map_err(|e| SourceError::from_transport(SOURCE_NAME, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::authentication(
            SOURCE_NAME,
            format!("login returned {status}"),
        ));
    }

    let body: Value = response
        .json()
        .await
        .map_err(|e| SourceError::authentication(SOURCE_NAME, format!("unreadable token: {e}")))?;

    // The API answers with a bare JSON string; accept `{"token": ..}` as well.
    let token = match &body {
        Value::String(token) => Some(token.clone()),
        Value::Object(map) => map.get("token").and_then(Value::as_str).map(str::to_string),
        _ => None,
    };

    token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| SourceError::authentication(SOURCE_NAME, "login response carried no token"))
}

/// Numeric identifiers go out as JSON numbers, anything else as strings.
fn id_value(id: &str) -> Value {
    id.parse::<i64>()
        .map(Value::from)
        .unwrap_or_else(|_| Value::from(id))
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn text_field(value: Option<&Value>) -> Option<String> {
    value
        .and_then(scalar_to_string)
        .as_deref()
        .and_then(normalize_text)
}

fn document_text(salary: Option<&str>, experience: &[ExperienceEntry]) -> String {
    let mut parts: Vec<&str> = salary.into_iter().collect();
    for entry in experience {
        parts.extend(
            [&entry.position, &entry.duration, &entry.details]
                .into_iter()
                .filter_map(|field| field.as_deref()),
        );
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::http::tests::silent_server;
    use mockito::Matcher;
    use serde_json::json;
    use std::path::PathBuf;

    fn config(server_url: &str) -> RobotaConfig {
        RobotaConfig {
            base_url: "https://robota.ua".to_string(),
            login_url: format!("{server_url}/auth/login"),
            resumes_url: format!("{server_url}/cvdb/resumes"),
            username: "recruiter@example.com".to_string(),
            password: "hunter2".to_string(),
            regions_url: None,
            regions_path: PathBuf::from("unused.json"),
            experience_path: PathBuf::from("unused.json"),
        }
    }

    fn vocabularies() -> RobotaVocabularies {
        RobotaVocabularies {
            regions: [("Kyiv", "1"), ("Lviv", "2")].into_iter().collect(),
            experience: [
                ("Less than 1 year", "1"),
                ("1 to 2 years", "2"),
                ("2 to 5 years", "3"),
                ("5 to 10 years", "4"),
                ("More than 10 years", "5"),
            ]
            .into_iter()
            .collect(),
        }
    }

    async fn connected(server: &mut mockito::Server) -> RobotaSource {
        server
            .mock("POST", "/auth/login")
            .match_body(Matcher::Json(json!({
                "username": "recruiter@example.com",
                "password": "hunter2"
            })))
            .with_status(200)
            .with_body(r#""token-123""#)
            .create_async()
            .await;

        RobotaSource::connect(
            config(&server.url()),
            Client::new(),
            FuzzyMatcher::new(70.0),
            vocabularies(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_search_counts_then_fetches_documents() {
        let mut server = mockito::Server::new_async().await;
        let source = connected(&mut server).await;

        let first = server
            .mock("POST", "/cvdb/resumes")
            .match_header("authorization", "Bearer token-123")
            .match_body(Matcher::Json(json!({
                "cityId": 1,
                "keyWords": "rust",
                "salary": {"from": 20000, "to": null},
                "experienceIds": []
            })))
            .with_status(200)
            .with_body(r#"{"total": 2, "documents": []}"#)
            .create_async()
            .await;
        let second = server
            .mock("POST", "/cvdb/resumes")
            .match_body(Matcher::PartialJson(json!({"count": 2})))
            .with_status(200)
            .with_body(
                json!({
                    "total": 2,
                    "documents": [
                        {
                            "resumeId": 101,
                            "salary": " 30\u{a0}000 грн ",
                            "experience": [
                                {"position": "Backend developer", "datesDiff": "2 years", "company": "Acme"}
                            ],
                            "fillingPercentage": 85
                        },
                        {
                            "resumeId": "102",
                            "salary": "",
                            "experience": null,
                            "fillingPercentage": 130
                        }
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let query = SearchQuery::new("rust")
            .with_region("Kyiv")
            .with_salary_range(Some(20000), None);
        let records = source.search(&query).await.unwrap();

        first.assert_async().await;
        second.assert_async().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].source_url, "https://robota.ua/candidates/101");
        assert_eq!(records[0].salary_expectation.as_deref(), Some("30 000 грн"));
        assert_eq!(
            records[0].experience,
            vec![ExperienceEntry {
                position: Some("Backend developer".to_string()),
                duration: Some("2 years".to_string()),
                details: Some("Acme".to_string()),
            }]
        );
        assert_eq!(records[0].filling_percentage, 85);
        assert_eq!(records[1].source_url, "https://robota.ua/candidates/102");
        assert!(records[1].salary_expectation.is_none());
        assert!(records[1].experience.is_empty());
        assert_eq!(records[1].filling_percentage, 100);
    }

    #[tokio::test]
    async fn test_zero_total_skips_document_request() {
        let mut server = mockito::Server::new_async().await;
        let source = connected(&mut server).await;

        let fetch = server
            .mock("POST", "/cvdb/resumes")
            .match_body(Matcher::PartialJson(json!({"count": 0})))
            .expect(0)
            .create_async()
            .await;
        let _count = server
            .mock("POST", "/cvdb/resumes")
            .with_status(200)
            .with_body(r#"{"total": 0}"#)
            .create_async()
            .await;

        let records = source.search(&SearchQuery::new("cobol")).await.unwrap();
        assert!(records.is_empty());
        fetch.assert_async().await;
    }

    #[tokio::test]
    async fn test_login_rejected_is_authentication_failure() {
        let mut server = mockito::Server::new_async().await;
        let _login = server
            .mock("POST", "/auth/login")
            .with_status(401)
            .with_body(r#"{"message": "bad credentials"}"#)
            .create_async()
            .await;

        let result = RobotaSource::connect(
            config(&server.url()),
            Client::new(),
            FuzzyMatcher::default(),
            vocabularies(),
        )
        .await;
        assert!(matches!(
            result,
            Err(SourceError::AuthenticationFailure { .. })
        ));
    }

    #[tokio::test]
    async fn test_login_without_token_is_authentication_failure() {
        let mut server = mockito::Server::new_async().await;
        let _login = server
            .mock("POST", "/auth/login")
            .with_status(200)
            .with_body("null")
            .create_async()
            .await;

        let result = RobotaSource::connect(
            config(&server.url()),
            Client::new(),
            FuzzyMatcher::default(),
            vocabularies(),
        )
        .await;
        assert!(matches!(
            result,
            Err(SourceError::AuthenticationFailure { .. })
        ));
    }

    #[tokio::test]
    async fn test_server_error_is_source_unavailable() {
        let mut server = mockito::Server::new_async().await;
        let source = connected(&mut server).await;
        let _search = server
            .mock("POST", "/cvdb/resumes")
            .with_status(502)
            .create_async()
            .await;

        let err = source.search(&SearchQuery::new("rust")).await.unwrap_err();
        assert!(matches!(err, SourceError::SourceUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_search_timeout_is_source_unavailable() {
        let mut server = mockito::Server::new_async().await;
        let _login = server
            .mock("POST", "/auth/login")
            .with_status(200)
            .with_body(r#""token-123""#)
            .create_async()
            .await;
        let mut config = config(&server.url());
        config.resumes_url = format!("{}/cvdb/resumes", silent_server().await);
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(100))
            .build()
            .unwrap();
        let source = RobotaSource::connect(config, client, FuzzyMatcher::new(70.0), vocabularies())
            .await
            .unwrap();

        let err = source.search(&SearchQuery::new("rust")).await.unwrap_err();
        assert!(matches!(err, SourceError::SourceUnavailable { .. }));
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let mut server = mockito::Server::new_async().await;
        let source = connected(&mut server).await;
        let _search = server
            .mock("POST", "/cvdb/resumes")
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let err = source.search(&SearchQuery::new("rust")).await.unwrap_err();
        assert!(matches!(err, SourceError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_missing_filling_percentage_is_scored_from_text() {
        let mut server = mockito::Server::new_async().await;
        let source = connected(&mut server).await;

        let _count = server
            .mock("POST", "/cvdb/resumes")
            .match_body(Matcher::Json(json!({
                "cityId": null,
                "keyWords": "engineer",
                "salary": {"from": null, "to": null},
                "experienceIds": []
            })))
            .with_status(200)
            .with_body(r#"{"total": 1}"#)
            .create_async()
            .await;
        let _fetch = server
            .mock("POST", "/cvdb/resumes")
            .match_body(Matcher::PartialJson(json!({"count": 1})))
            .with_status(200)
            .with_body(
                r#"{"total": 1, "documents": [{"resumeId": 7, "experience": [{"position": "Engineer", "company": "the"}]}]}"#,
            )
            .create_async()
            .await;

        let records = source.search(&SearchQuery::new("engineer")).await.unwrap();
        assert_eq!(records.len(), 1);
        // "engineer the" -> one meaningful token of two
        assert_eq!(records[0].filling_percentage, 50);
    }

    #[tokio::test]
    async fn test_mistyped_fields_do_not_drop_other_documents() {
        let mut server = mockito::Server::new_async().await;
        let source = connected(&mut server).await;

        let _count = server
            .mock("POST", "/cvdb/resumes")
            .match_body(Matcher::Json(json!({
                "cityId": null,
                "keyWords": "analyst",
                "salary": {"from": null, "to": null},
                "experienceIds": []
            })))
            .with_status(200)
            .with_body(r#"{"total": 4}"#)
            .create_async()
            .await;
        let _fetch = server
            .mock("POST", "/cvdb/resumes")
            .match_body(Matcher::PartialJson(json!({"count": 4})))
            .with_status(200)
            .with_body(
                json!({
                    "total": 4,
                    "documents": [
                        {"resumeId": 1, "fillingPercentage": 85},
                        {
                            "resumeId": 2,
                            "fillingPercentage": 72.5,
                            "experience": [
                                null,
                                {"position": "Analyst", "company": 42, "datesDiff": ["2 years"]}
                            ]
                        },
                        {"resumeId": 3, "fillingPercentage": "high", "experience": "none"},
                        "not a document"
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let records = source.search(&SearchQuery::new("analyst")).await.unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].filling_percentage, 85);

        assert_eq!(records[1].filling_percentage, 73);
        assert_eq!(
            records[1].experience,
            vec![ExperienceEntry {
                position: Some("Analyst".into()),
                duration: None,
                details: Some("42".into()),
            }]
        );

        assert_eq!(records[2].source_url, "https://robota.ua/candidates/3");
        assert!(records[2].experience.is_empty());
        // no text to score
        assert_eq!(records[2].filling_percentage, 0);
    }

    #[tokio::test]
    async fn test_payload_resolves_filters_and_expands_open_ended_experience() {
        let mut server = mockito::Server::new_async().await;
        let source = connected(&mut server).await;

        let query = SearchQuery::new(" data engineer ")
            .with_region("Lvov")
            .with_experience(["More than 5 years", "2 to 5 years", "unknown bracket xyz"]);
        let payload = serde_json::to_value(source.build_payload(&query)).unwrap();

        assert_eq!(payload["cityId"], json!(2));
        assert_eq!(payload["keyWords"], json!("data engineer"));
        assert_eq!(payload["experienceIds"], json!([3, 5, 4]));
        assert!(payload.get("count").is_none());
    }

    #[tokio::test]
    async fn test_unresolved_region_is_omitted() {
        let mut server = mockito::Server::new_async().await;
        let source = connected(&mut server).await;

        let query = SearchQuery::new("qa").with_region("Zzzzzz");
        let payload = serde_json::to_value(source.build_payload(&query)).unwrap();
        assert_eq!(payload["cityId"], Value::Null);
    }
}
