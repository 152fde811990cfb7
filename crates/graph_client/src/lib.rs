pub mod api;
pub mod auth;
pub mod cache;
pub mod client_trait;
pub mod error;
pub mod http;

pub use api::client::GraphClient;
pub use api::models::{map_task, TodoListRecord, TodoTaskRecord};
pub use auth::broker::{LoginPrompt, TokenBroker, SCOPES, TOKEN_CACHE_KEY};
pub use auth::token::TokenSet;
pub use cache::{FileTokenCache, MemoryTokenCache, TokenCache};
pub use client_trait::TodoApi;
pub use error::{GraphError, Result};
