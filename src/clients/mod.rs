//! Clients for the three remote services.
//!
//! All three share one HTTP client, base URL and bearer credential.

pub mod http;
pub mod instrumental;
pub mod speech;
pub mod text;

pub use http::{build_http_client, ApiEndpoint};
pub use instrumental::AsyncAudioGenerationClient;
pub use speech::{clean_lyrics, SpeechSynthesisClient};
pub use text::{lyrics_prompt, title_prompt, TextGenerationClient};
