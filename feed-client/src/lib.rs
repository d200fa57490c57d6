//! Клиентская библиотека для удалённого API ленты постов.
//!
//! Содержит модели (`Post`, `Comment`, `User`), трейт шлюза [`FeedGateway`]
//! и его HTTP-реализацию [`HttpGateway`] поверх `reqwest`.
//!
//! Шлюз работает с четырьмя фиксированными эндпоинтами:
//! - `GET /api/posts`
//! - `GET /api/comments`
//! - `POST /api/posts`
//! - `POST /api/comments`
//!
//! Меняется только базовый URL. Авторизации, пагинации и повторов нет.
#![warn(missing_docs)]

mod error;
mod gateway;
mod http_client;
mod models;

pub use error::{GatewayResult, NetworkError};
pub use gateway::FeedGateway;
pub use http_client::HttpGateway;
pub use models::{Comment, Post, User, now_millis};
