use async_trait::async_trait;

use crate::error::GatewayResult;
use crate::models::{Comment, Post};

/// Шлюз к удалённому API ленты.
///
/// Каждая операция выполняет ровно один HTTP-запрос без повторов.
/// Состояния шлюз не хранит.
#[async_trait]
pub trait FeedGateway: Send + Sync {
    /// Загружает все посты.
    async fn fetch_posts(&self) -> GatewayResult<Vec<Post>>;

    /// Загружает все комментарии.
    async fn fetch_comments(&self) -> GatewayResult<Vec<Comment>>;

    /// Создаёт пост и возвращает присвоенный сервером идентификатор.
    ///
    /// При ошибке нельзя считать, что пост сохранён.
    async fn create_post(&self, post: &Post) -> GatewayResult<String>;

    /// Создаёт комментарий. Сервер идентификатор не возвращает.
    async fn create_comment(&self, comment: &Comment) -> GatewayResult<()>;
}
