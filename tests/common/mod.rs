//! Shared fixtures for the HTTP-level tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use melody_maker::audio::write_wav_to_buffer;
use melody_maker::config::MelodyConfig;

pub const JOB_ID: &str = "gen-123";
pub const RESULT_PATH: &str = "/files/instrumental.wav";

pub const LYRICS: &str = "[Verse 1]\nCity lights are glowing\n(repeat)\nRain keeps on falling\n\n[Chorus]\n- spoken\nWe keep on going";

/// Serves responses in order, repeating the last one once exhausted.
pub struct Sequence {
    responses: Vec<ResponseTemplate>,
    calls: AtomicUsize,
}

impl Sequence {
    pub fn new(responses: Vec<ResponseTemplate>) -> Self {
        assert!(!responses.is_empty());
        Self {
            responses,
            calls: AtomicUsize::new(0),
        }
    }
}

impl Respond for Sequence {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses[n.min(self.responses.len() - 1)].clone()
    }
}

/// Mono sine tone as a float WAV.
pub fn sine_wav(seconds: f32, sample_rate: u32, channels: u16) -> Vec<u8> {
    let frames = (seconds * sample_rate as f32) as usize;
    let mut samples = Vec::with_capacity(frames * channels as usize);
    for i in 0..frames {
        let t = i as f32 / sample_rate as f32;
        let value = (t * 440.0 * std::f32::consts::TAU).sin() * 0.3;
        for _ in 0..channels {
            samples.push(value);
        }
    }
    write_wav_to_buffer(&samples, channels, sample_rate).unwrap()
}

/// One second of 24kHz mono, like the speech service returns.
pub fn vocals_wav() -> Vec<u8> {
    sine_wav(1.0, 24000, 1)
}

/// Two seconds of 44.1kHz stereo.
pub fn instrumental_wav() -> Vec<u8> {
    sine_wav(2.0, 44100, 2)
}

/// Config pointed at the mock server with a short real-time poll interval.
pub fn test_config(server: &MockServer, max_attempts: u32) -> MelodyConfig {
    let mut config = MelodyConfig {
        api_key: Some("test-key".to_string()),
        api_base_url: server.uri(),
        request_timeout_sec: 5,
        ..MelodyConfig::default()
    };
    config.instrumental.max_attempts = max_attempts;
    config.instrumental.poll_interval_sec = 0.01;
    config
}

pub fn chat_reply(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "chatcmpl-1",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
    }))
}

pub fn status(value: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"id": JOB_ID, "status": value}))
}

pub fn completed(server: &MockServer) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": JOB_ID,
        "status": "completed",
        "audio_file": {"url": format!("{}{}", server.uri(), RESULT_PATH)}
    }))
}

pub fn failed(error: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": JOB_ID,
        "status": "failed",
        "error": error
    }))
}

pub async fn mount_lyrics(server: &MockServer, response: ResponseTemplate, calls: u64) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("Write song lyrics"))
        .respond_with(response)
        .expect(calls)
        .mount(server)
        .await;
}

pub async fn mount_title(server: &MockServer, response: ResponseTemplate, calls: u64) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("catchy title"))
        .respond_with(response)
        .expect(calls)
        .mount(server)
        .await;
}

pub async fn mount_tts(server: &MockServer, response: ResponseTemplate, calls: u64) {
    Mock::given(method("POST"))
        .and(path("/v1/tts"))
        .respond_with(response)
        .expect(calls)
        .mount(server)
        .await;
}

pub async fn mount_submit(server: &MockServer, response: ResponseTemplate, calls: u64) {
    Mock::given(method("POST"))
        .and(path("/v2/generate/audio"))
        .respond_with(response)
        .expect(calls)
        .mount(server)
        .await;
}

pub fn submitted() -> ResponseTemplate {
    ResponseTemplate::new(201).set_body_json(json!({"id": JOB_ID, "status": "queued"}))
}

pub async fn mount_status(server: &MockServer, responses: Vec<ResponseTemplate>, calls: u64) {
    Mock::given(method("GET"))
        .and(path("/v2/generate/audio"))
        .and(query_param("generation_id", JOB_ID))
        .respond_with(Sequence::new(responses))
        .expect(calls)
        .mount(server)
        .await;
}

pub async fn mount_result(server: &MockServer, bytes: Vec<u8>, calls: u64) {
    Mock::given(method("GET"))
        .and(path(RESULT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(bytes))
        .expect(calls)
        .mount(server)
        .await;
}

/// Requests received on `request_path`.
pub async fn requests_to(server: &MockServer, request_path: &str) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path() == request_path)
        .collect()
}
