pub mod broker;
pub mod pkce;
pub mod token;
