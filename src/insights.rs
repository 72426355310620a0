use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use reqwest::header::RETRY_AFTER;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, warn};

use crate::error::InsightsError;
use crate::utils::{long_date, month_day};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Facts {
    pub events: Vec<String>,
    pub famous_births: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Numerology {
    pub life_path_number: u32,
    pub lucky_numbers: Vec<i64>,
    pub lucky_colors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    pub personality: String,
    pub prediction: String,
}

/// Everything the remote model says about a birth date. All fields are
/// required; a payload missing any of them fails to parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightsPayload {
    pub facts: Facts,
    pub numerology: Numerology,
    pub insights: Insights,
    pub weather: String,
}

impl InsightsPayload {
    pub fn parse(json_text: &str) -> Result<Self, InsightsError> {
        Ok(serde_json::from_str(json_text.trim())?)
    }
}

#[async_trait]
pub trait InsightsGateway: Send + Sync {
    async fn fetch_insights(&self, date: NaiveDate) -> Result<InsightsPayload, InsightsError>;
}

/// Gateway used when no API key is configured.
pub struct DisabledInsights;

#[async_trait]
impl InsightsGateway for DisabledInsights {
    async fn fetch_insights(&self, _date: NaiveDate) -> Result<InsightsPayload, InsightsError> {
        Err(InsightsError::MissingApiKey)
    }
}

#[derive(Clone)]
pub struct GeminiClient {
    api_key: Arc<String>,
    http: Arc<Client>,
    base_url: Arc<String>,
    model: Arc<String>,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        Self {
            api_key: Arc::new(api_key),
            http: Arc::new(Client::new()),
            base_url: Arc::new(base_url.trim_end_matches('/').to_string()),
            model: Arc::new(model),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    /// Low-level generateContent request with basic retry/backoff.
    async fn generate(&self, body: &Value) -> Result<Value, InsightsError> {
        // Simple retry/backoff policy
        const MAX_RETRIES: usize = 4;
        let mut attempt = 0usize;

        loop {
            attempt += 1;

            let resp = self
                .http
                .post(self.endpoint())
                .query(&[("key", self.api_key.as_str())])
                .header("User-Agent", "nakshatra-path")
                .json(body)
                .send()
                .await?;

            let status = resp.status();
            let headers = resp.headers().clone();

            if status.is_success() {
                return Ok(resp.json().await?);
            }

            // If rate limited, honor Retry-After header when present
            if status.as_u16() == 429 && attempt < MAX_RETRIES {
                let wait_secs = headers
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(2);
                warn!(attempt, wait_secs, "insights service rate limited, retrying");
                sleep(Duration::from_secs(wait_secs)).await;
                continue;
            }

            // Retry on 5xx server errors
            if status.is_server_error() && attempt < MAX_RETRIES {
                let backoff = Duration::from_millis(250u64.saturating_mul(1 << (attempt - 1)));
                warn!(attempt, status = status.as_u16(), "insights service error, backing off");
                sleep(backoff).await;
                continue;
            }

            let body = resp.text().await.unwrap_or_default();
            return Err(InsightsError::Status {
                status: status.as_u16(),
                body,
            });
        }
    }
}

#[async_trait]
impl InsightsGateway for GeminiClient {
    async fn fetch_insights(&self, date: NaiveDate) -> Result<InsightsPayload, InsightsError> {
        debug!(%date, model = %self.model, "requesting birthday insights");

        let result = async {
            let json = self.generate(&request_body(date)).await?;
            let text = extract_text(json)?;
            InsightsPayload::parse(&text)
        }
        .await;

        if let Err(e) = &result {
            error!(%date, "Error fetching insights: {e}");
        }
        result
    }
}

pub fn prompt(date: NaiveDate) -> String {
    let date_string = long_date(date);
    let month_day_string = month_day(date);

    format!(
        r#"
        Analyze the birth date: {date_string}.
        Provide a comprehensive analysis based on the following requirements and structure it as a JSON object matching the provided schema.

        - For historical facts, focus on the month and day ({month_day_string}), not the specific year.
        - For numerology, calculate the Life Path Number from the full birth date ({date_string}).
        - Personality insights should be positive and encouraging.
        - The prediction should be fun and lighthearted.
        - The weather should be a general description for the time of year, not specific historical data.
    "#
    )
}

fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "facts": {
                "type": "OBJECT",
                "properties": {
                    "events": {
                        "type": "ARRAY",
                        "items": { "type": "STRING" },
                        "description": "Three significant historical events that occurred on this date."
                    },
                    "famousBirths": {
                        "type": "ARRAY",
                        "items": { "type": "STRING" },
                        "description": "Three famous people born on this date."
                    }
                },
                "required": ["events", "famousBirths"]
            },
            "numerology": {
                "type": "OBJECT",
                "properties": {
                    "lifePathNumber": {
                        "type": "INTEGER",
                        "description": "The Life Path Number calculated from the birthdate by summing and reducing the digits of the month, day, and year."
                    },
                    "luckyNumbers": {
                        "type": "ARRAY",
                        "items": { "type": "INTEGER" },
                        "description": "Three lucky numbers associated with the birthdate or life path number."
                    },
                    "luckyColors": {
                        "type": "ARRAY",
                        "items": { "type": "STRING" },
                        "description": "Two lucky colors associated with the birthdate."
                    }
                },
                "required": ["lifePathNumber", "luckyNumbers", "luckyColors"]
            },
            "insights": {
                "type": "OBJECT",
                "properties": {
                    "personality": {
                        "type": "STRING",
                        "description": "A brief, positive personality insight based on the birthdate and zodiac sign, about 3-4 sentences long."
                    },
                    "prediction": {
                        "type": "STRING",
                        "description": "A simple, fun, horoscope-style prediction for the week ahead, about 2-3 sentences long."
                    }
                },
                "required": ["personality", "prediction"]
            },
            "weather": {
                "type": "STRING",
                "description": "A brief description of the typical, generalized weather for this date in the Northern Hemisphere."
            }
        },
        "required": ["facts", "numerology", "insights", "weather"]
    })
}

pub fn request_body(date: NaiveDate) -> Value {
    json!({
        "contents": [{ "parts": [{ "text": prompt(date) }] }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": response_schema()
        }
    })
}

/// Pull the generated JSON text out of a generateContent response.
fn extract_text(json: Value) -> Result<String, InsightsError> {
    #[derive(Deserialize)]
    struct GenerateResponse {
        candidates: Option<Vec<Candidate>>,
    }
    #[derive(Deserialize)]
    struct Candidate {
        content: Option<Content>,
    }
    #[derive(Deserialize)]
    struct Content {
        parts: Option<Vec<Part>>,
    }
    #[derive(Deserialize)]
    struct Part {
        text: Option<String>,
    }

    let parsed: GenerateResponse = serde_json::from_value(json)?;

    parsed
        .candidates
        .and_then(|c| c.into_iter().next())
        .and_then(|c| c.content)
        .and_then(|c| c.parts)
        .and_then(|p| p.into_iter().find_map(|part| part.text))
        .ok_or_else(|| InsightsError::InvalidPayload("response carried no candidate text".into()))
}


#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{
        "facts": { "events": ["e1", "e2", "e3"], "famousBirths": ["p1", "p2", "p3"] },
        "numerology": { "lifePathNumber": 7, "luckyNumbers": [1, 2, 3], "luckyColors": ["Red", "Gold"] },
        "insights": { "personality": "Kind.", "prediction": "Sunny days." },
        "weather": "Cold and crisp."
    }"#;

    #[test]
    fn test_parse_valid_payload() {
        let payload = InsightsPayload::parse(VALID).unwrap();
        assert_eq!(payload.facts.famous_births[2], "p3");
        assert_eq!(payload.numerology.life_path_number, 7);
        assert_eq!(payload.numerology.lucky_colors, ["Red", "Gold"]);
        assert_eq!(payload.weather, "Cold and crisp.");
    }

    #[test]
    fn test_missing_section_is_invalid() {
        let mut value: Value = serde_json::from_str(VALID).unwrap();
        value.as_object_mut().unwrap().remove("insights");
        let err = InsightsPayload::parse(&value.to_string()).unwrap_err();
        assert!(matches!(err, InsightsError::InvalidPayload(_)));

        let err = InsightsPayload::parse("not json").unwrap_err();
        assert!(matches!(err, InsightsError::InvalidPayload(_)));
    }

    #[test]
    fn test_extract_text_from_candidates() {
        let response = json!({
            "candidates": [{ "content": { "parts": [{ "text": VALID }] } }]
        });
        let text = extract_text(response).unwrap();
        assert!(InsightsPayload::parse(&text).is_ok());

        let empty = json!({ "candidates": [] });
        assert!(matches!(
            extract_text(empty),
            Err(InsightsError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_prompt_and_body() {
        let date = NaiveDate::from_ymd_opt(1995, 12, 25).unwrap();
        let text = prompt(date);
        assert!(text.contains("Analyze the birth date: December 25, 1995."));
        assert!(text.contains("(December 25)"));

        let body = request_body(date);
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(
            body["generationConfig"]["responseSchema"]["required"],
            json!(["facts", "numerology", "insights", "weather"])
        );
    }

    #[tokio::test]
    async fn test_disabled_gateway_reports_missing_key() {
        let date = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        let err = DisabledInsights.fetch_insights(date).await.unwrap_err();
        assert!(matches!(err, InsightsError::MissingApiKey));
    }
}
