//! The weather chat assistant.
//!
//! A send moves the assistant from idle to awaiting a reply and back. Only
//! one request can be outstanding; the transcript is persisted after every
//! change.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt::Write as _, sync::Arc};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    clock::unix_to_time,
    gemini::{GenerateContentRequest, GenerateContentResponse},
    model::Forecast,
    storage::{self, CHAT_MESSAGES_KEY, Storage},
    units::kelvin_to_celsius,
};

/// Counted in UTF-16 code units, so a surrogate-pair emoji counts twice.
pub const MAX_INPUT_CHARS: usize = 300;

pub const UNPROCESSABLE_REPLY: &str =
    "Sorry, I couldn't process your question. Could you try asking differently?";
pub const CONNECTION_TROUBLE_REPLY: &str =
    "I'm having trouble connecting to the AI service. Please try again in a moment.";

/// Something that can answer a generate-content request.
#[async_trait]
pub trait ChatBackend: Send + Sync + std::fmt::Debug {
    async fn generate(&self, request: &GenerateContentRequest) -> Result<GenerateContentResponse>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub content: String,
    pub role: Role,
    pub timestamp: DateTime<Utc>,
    /// Set on the canned failure reply so the UI can offer a retry.
    #[serde(default)]
    pub retryable: bool,
}

impl ChatMessage {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            role,
            timestamp: Utc::now(),
            retryable: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SendRejected {
    #[error("message is empty")]
    Empty,
    #[error("message is longer than {MAX_INPUT_CHARS} characters")]
    TooLong,
    #[error("still waiting for the previous reply")]
    InFlight,
}

/// The "Current Weather in ..." block handed to the model.
pub fn weather_context(forecast: Option<&Forecast>) -> String {
    let Some((forecast, name)) = forecast.and_then(|f| f.name.as_deref().map(|n| (f, n))) else {
        return "No weather data available".to_string();
    };

    let celsius = |k: Option<f64>| k.map_or("N/A".to_string(), |k| format!("{}°C", kelvin_to_celsius(k)));
    let or_na = |v: Option<f64>| v.map_or("N/A".to_string(), |v| v.to_string());
    let main = forecast.main.as_ref();

    let mut out = format!("Current Weather in {name}:\n");
    let _ = writeln!(out, "- Temperature: {}", celsius(main.map(|m| m.temp)));
    let _ = writeln!(out, "- Feels like: {}", celsius(main.map(|m| m.feels_like)));
    let _ = writeln!(
        out,
        "- Condition: {}",
        forecast.condition().map_or("N/A", |c| c.description.as_str())
    );
    let _ = writeln!(out, "- Humidity: {}%", or_na(main.map(|m| m.humidity)));
    let _ = writeln!(out, "- Wind: {} m/s", or_na(forecast.wind.as_ref().map(|w| w.speed)));
    let _ = writeln!(out, "- Pressure: {} hPa", or_na(main.map(|m| m.pressure)));

    if let Some(tz) = forecast.timezone {
        if let Some(sys) = &forecast.sys {
            let _ = writeln!(out, "- Sunrise: {}", unix_to_time(sys.sunrise, tz));
            let _ = writeln!(out, "- Sunset: {}", unix_to_time(sys.sunset, tz));
        }
        if let Some(dt) = forecast.dt {
            let _ = writeln!(out, "- Current Time: {}", unix_to_time(dt, tz));
        }
    }

    out
}

pub fn build_prompt(question: &str, forecast: Option<&Forecast>) -> String {
    format!(
        "You are a helpful weather assistant.\n\
         Format responses using markdown syntax:\n\
         - Use **bold** for bold text\n\
         - Use bullet points with •\n\
         - DO NOT use HTML tags\n\
         Current weather data:\n{}\n\nUser question: {question}",
        weather_context(forecast)
    )
}

#[derive(Debug)]
pub struct ChatAssistant {
    backend: Arc<dyn ChatBackend>,
    storage: Arc<dyn Storage>,
    messages: Vec<ChatMessage>,
    input: String,
    pending: bool,
}

impl ChatAssistant {
    /// Restore the persisted transcript. A corrupt one starts empty.
    pub fn load(backend: Arc<dyn ChatBackend>, storage: Arc<dyn Storage>) -> Self {
        let messages = storage::load_json(storage.as_ref(), CHAT_MESSAGES_KEY).unwrap_or_default();
        Self { backend, storage, messages, input: String::new(), pending: false }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn is_loading(&self) -> bool {
        self.pending
    }

    /// Validate the input and record it as a user message. Returns the
    /// request to post; nothing changes when the send is rejected.
    pub fn begin_send(&mut self, forecast: Option<&Forecast>) -> Result<GenerateContentRequest, SendRejected> {
        if self.input.trim().is_empty() {
            return Err(SendRejected::Empty);
        }
        if self.pending {
            return Err(SendRejected::InFlight);
        }
        if self.input.encode_utf16().count() > MAX_INPUT_CHARS {
            return Err(SendRejected::TooLong);
        }

        let question = std::mem::take(&mut self.input);
        let request = GenerateContentRequest::from_text(build_prompt(&question, forecast));

        self.push(ChatMessage::new(Role::User, question.trim()));
        self.pending = true;
        Ok(request)
    }

    /// Record the outcome of the request returned by [`Self::begin_send`].
    pub fn finish_send(&mut self, outcome: Result<GenerateContentResponse>) -> &ChatMessage {
        let reply = match outcome {
            Ok(response) => match response.reply_text() {
                Some(text) => ChatMessage::new(Role::Assistant, text),
                None => {
                    tracing::warn!("chat reply had no text, using fallback");
                    ChatMessage::new(Role::Assistant, UNPROCESSABLE_REPLY)
                }
            },
            Err(e) => {
                tracing::error!("chat request failed: {e:#}");
                ChatMessage { retryable: true, ..ChatMessage::new(Role::Assistant, CONNECTION_TROUBLE_REPLY) }
            }
        };

        self.pending = false;
        self.push(reply)
    }

    /// Send the current input with `forecast` as context and wait for the
    /// reply.
    pub async fn send(&mut self, forecast: Option<&Forecast>) -> Result<&ChatMessage, SendRejected> {
        let request = self.begin_send(forecast)?;
        let outcome = self.backend.generate(&request).await;
        Ok(self.finish_send(outcome))
    }

    /// Put the most recent user message back into the input. Returns whether
    /// there was one.
    pub fn retry(&mut self) -> bool {
        match self.messages.iter().rev().find(|m| m.role == Role::User) {
            Some(last) => {
                self.input = last.content.clone();
                true
            }
            None => false,
        }
    }

    pub fn new_chat(&mut self) -> Result<()> {
        self.messages.clear();
        self.storage.remove(CHAT_MESSAGES_KEY)
    }

    fn push(&mut self, message: ChatMessage) -> &ChatMessage {
        self.messages.push(message);
        if let Err(e) = storage::save_json(self.storage.as_ref(), CHAT_MESSAGES_KEY, &self.messages) {
            tracing::warn!("failed to persist chat transcript: {e:#}");
        }
        &self.messages[self.messages.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        gemini::{Candidate, Content, Part},
        model::{Condition, MainReadings, SunTimes, WindReadings},
        storage::MemoryStorage,
    };
    use anyhow::anyhow;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct ScriptedBackend {
        reply: Option<String>,
        fail: bool,
        requests: Mutex<Vec<GenerateContentRequest>>,
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        async fn generate(&self, request: &GenerateContentRequest) -> Result<GenerateContentResponse> {
            self.requests.lock().unwrap().push(request.clone());
            if self.fail {
                return Err(anyhow!("connection refused"));
            }
            Ok(GenerateContentResponse {
                candidates: vec![Candidate {
                    content: Some(Content {
                        role: Some("model".into()),
                        parts: vec![Part { text: self.reply.clone() }],
                    }),
                }],
            })
        }
    }

    fn assistant(backend: ScriptedBackend) -> (ChatAssistant, Arc<ScriptedBackend>, Arc<dyn Storage>) {
        let backend = Arc::new(backend);
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        (ChatAssistant::load(backend.clone(), storage.clone()), backend, storage)
    }

    fn london() -> Forecast {
        Forecast {
            name: Some("London".into()),
            weather: vec![Condition {
                id: 500,
                main: "Rain".into(),
                description: "light rain".into(),
                icon: "10d".into(),
            }],
            main: Some(MainReadings {
                temp: 288.15,
                feels_like: 287.0,
                temp_min: 286.0,
                temp_max: 290.0,
                pressure: 1009.0,
                humidity: 82.0,
            }),
            wind: Some(WindReadings { speed: 4.1, deg: 230.0, gust: None }),
            sys: Some(SunTimes { country: Some("GB".into()), sunrise: 1_717_300_000, sunset: 1_717_360_000 }),
            dt: Some(1_717_330_000),
            timezone: Some(3_600),
            ..Forecast::default()
        }
    }

    #[test]
    fn context_lists_readings_in_celsius() {
        let context = weather_context(Some(&london()));

        assert!(context.starts_with("Current Weather in London:"));
        assert!(context.contains("- Temperature: 15°C"));
        assert!(context.contains("- Condition: light rain"));
        assert!(context.contains("- Humidity: 82%"));
        assert!(context.contains("- Wind: 4.1 m/s"));
        assert!(context.contains("- Pressure: 1009 hPa"));
        assert!(context.contains("- Sunrise: "));
    }

    #[test]
    fn context_without_forecast() {
        assert_eq!(weather_context(None), "No weather data available");
        assert_eq!(weather_context(Some(&Forecast::default())), "No weather data available");
    }

    #[tokio::test]
    async fn exchange_appends_both_messages() {
        let (mut chat, backend, _) = assistant(ScriptedBackend {
            reply: Some("**Bring an umbrella.**".into()),
            ..ScriptedBackend::default()
        });

        chat.set_input("  Will it rain today?  ");
        let reply = chat.send(Some(&london())).await.unwrap();
        assert_eq!(reply.content, "**Bring an umbrella.**");

        let messages = chat.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "Will it rain today?");
        assert_eq!(messages[1].role, Role::Assistant);
        assert!(!chat.is_loading());
        assert_eq!(chat.input(), "");

        let requests = backend.requests.lock().unwrap();
        let prompt = requests[0].contents[0].parts[0].text.as_deref().unwrap();
        assert!(prompt.contains("Current Weather in London:"));
        assert!(prompt.ends_with("User question:   Will it rain today?  "));
    }

    #[tokio::test]
    async fn missing_text_uses_fallback_reply() {
        let (mut chat, _, _) = assistant(ScriptedBackend::default());

        chat.set_input("Hello?");
        let reply = chat.send(None).await.unwrap();

        assert_eq!(reply.content, UNPROCESSABLE_REPLY);
        assert!(!reply.retryable);
    }

    #[tokio::test]
    async fn failure_appends_retryable_message() {
        let (mut chat, _, _) = assistant(ScriptedBackend { fail: true, ..ScriptedBackend::default() });

        chat.set_input("Is it windy?");
        let reply = chat.send(None).await.unwrap();

        assert_eq!(reply.content, CONNECTION_TROUBLE_REPLY);
        assert!(reply.retryable);
        assert!(!chat.is_loading());
    }

    #[tokio::test]
    async fn rejected_sends_touch_nothing() {
        let (mut chat, backend, _) = assistant(ScriptedBackend::default());

        chat.set_input("   ");
        assert_eq!(chat.send(None).await.unwrap_err(), SendRejected::Empty);

        chat.set_input("x".repeat(MAX_INPUT_CHARS + 1));
        assert_eq!(chat.send(None).await.unwrap_err(), SendRejected::TooLong);

        assert!(chat.messages().is_empty());
        assert!(backend.requests.lock().unwrap().is_empty());
    }

    #[test]
    fn second_send_while_pending_is_rejected() {
        let (mut chat, _, _) = assistant(ScriptedBackend::default());

        chat.set_input("first");
        chat.begin_send(None).unwrap();
        chat.set_input("second");

        assert_eq!(chat.begin_send(None).unwrap_err(), SendRejected::InFlight);
        assert_eq!(chat.messages().len(), 1);
        assert_eq!(chat.input(), "second");
    }

    #[test]
    fn limit_counts_characters_not_bytes() {
        let (mut chat, _, _) = assistant(ScriptedBackend::default());

        chat.set_input("é".repeat(MAX_INPUT_CHARS));
        assert!(chat.begin_send(None).is_ok());
    }

    #[test]
    fn emoji_count_twice_towards_the_limit() {
        let (mut chat, _, _) = assistant(ScriptedBackend::default());

        chat.set_input("🌧".repeat(MAX_INPUT_CHARS / 2 + 1));
        assert_eq!(chat.begin_send(None).unwrap_err(), SendRejected::TooLong);

        chat.set_input("🌧".repeat(MAX_INPUT_CHARS / 2));
        assert!(chat.begin_send(None).is_ok());
    }

    #[tokio::test]
    async fn retry_prefills_last_question() {
        let (mut chat, backend, _) = assistant(ScriptedBackend { fail: true, ..ScriptedBackend::default() });

        chat.set_input("first question");
        chat.send(None).await.unwrap();
        chat.set_input("second question");
        chat.send(None).await.unwrap();

        assert!(chat.retry());
        assert_eq!(chat.input(), "second question");
        assert_eq!(backend.requests.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn transcript_survives_reload_until_new_chat() {
        let (mut chat, backend, storage) = assistant(ScriptedBackend {
            reply: Some("Sunny.".into()),
            ..ScriptedBackend::default()
        });

        chat.set_input("Weather?");
        chat.send(None).await.unwrap();

        let reloaded = ChatAssistant::load(backend.clone(), storage.clone());
        assert_eq!(reloaded.messages(), chat.messages());

        chat.new_chat().unwrap();
        assert!(chat.messages().is_empty());
        assert!(storage.get(CHAT_MESSAGES_KEY).unwrap().is_none());
    }
}
