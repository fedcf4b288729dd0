use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One collected weather measurement, as stored by the backend.
///
/// Logs are immutable once created; the client only ever holds the
/// page-sized window returned by the list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherLog {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub city: String,
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub wind_speed: f64,
    pub condition: String,
    /// Raw provider payload, opaque to the client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// AI-generated insight text. The first clause conventionally encodes the
/// subject city in the pattern `"Em <City>, ..."`; the explicit `city` field
/// is optional because older backend rows predate it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherInsight {
    pub id: i64,
    pub generated_at: DateTime<Utc>,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

/// DRF-style pagination envelope shared by logs, insights and the
/// character API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self { count: 0, next: None, previous: None, results: Vec::new() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Response of both `login/` and `register/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub message: String,
    pub user: User,
    pub token: String,
}

/// Credentials for `register/`. The avatar is uploaded as an optional
/// multipart file part.
#[derive(Debug, Clone, Default)]
pub struct RegisterPayload {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password2: String,
    pub avatar: Option<AvatarFile>,
}

/// Already-read avatar image for the register form.
#[derive(Debug, Clone)]
pub struct AvatarFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// A Star Wars character, as served by the public listing API. All fields
/// are free text there, including the numeric-looking ones.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Person {
    pub name: String,
    pub height: String,
    pub mass: String,
    pub gender: String,
    pub birth_year: String,
    pub hair_color: String,
    pub skin_color: String,
    pub eye_color: String,
    pub url: String,
}

/// An exported report blob, ready to be written to disk under the name the
/// backend suggested.
#[derive(Debug, Clone)]
pub struct ExportBlob {
    pub filename: String,
    pub bytes: Vec<u8>,
}
