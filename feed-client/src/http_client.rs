use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::time::Duration;

use crate::error::{GatewayResult, NetworkError};
use crate::gateway::FeedGateway;
use crate::models::{Comment, Post, WireId};

const POSTS_PATH: &str = "/api/posts";
const COMMENTS_PATH: &str = "/api/comments";

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewPostDto<'a> {
    title: &'a str,
    username: &'a str,
    user_avatar: &'a str,
    content: &'a str,
    created_at: i64,
    images: &'a [String],
}

#[derive(Debug, Default, Deserialize)]
struct PostsResponseDto {
    #[serde(default)]
    posts: Vec<Post>,
}

#[derive(Debug, Default, Deserialize)]
struct CommentsResponseDto {
    #[serde(default)]
    comments: Vec<Comment>,
}

#[derive(Debug, Default, Deserialize)]
struct CreatedResponseDto {
    #[serde(default)]
    id: Option<WireId>,
}

impl<'a> From<&'a Post> for NewPostDto<'a> {
    fn from(post: &'a Post) -> Self {
        Self {
            title: &post.title,
            username: &post.username,
            user_avatar: &post.user_avatar,
            content: &post.content,
            created_at: post.created_at,
            images: &post.images,
        }
    }
}

#[derive(Debug, Clone)]
/// HTTP-реализация [`FeedGateway`] поверх `reqwest`.
pub struct HttpGateway {
    base_url: String,
    client: Client,
}

impl HttpGateway {
    /// Создаёт шлюз с базовым URL API и таймаутами по умолчанию
    /// (5 с на соединение, 15 с на запрос).
    pub fn new(base_url: impl Into<String>) -> GatewayResult<Self> {
        Self::with_timeouts(base_url, DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Создаёт шлюз с заданными таймаутами.
    pub fn with_timeouts(
        base_url: impl Into<String>,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> GatewayResult<Self> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()
            .map_err(NetworkError::from_reqwest)?;

        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    /// Базовый URL API.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn decode_error(response: reqwest::Response) -> NetworkError {
        let status = response.status();
        let message = response.text().await.ok();
        NetworkError::from_http_status(status, message)
    }

    /// Отправляет запрос и возвращает тело успешного ответа как текст.
    async fn send<TReq>(&self, method: Method, path: &str, body: Option<&TReq>) -> GatewayResult<String>
    where
        TReq: Serialize + ?Sized,
    {
        let url = self.endpoint(path);

        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(NetworkError::from_reqwest)?;
        if !response.status().is_success() {
            return Err(Self::decode_error(response).await);
        }

        response.text().await.map_err(NetworkError::from_reqwest)
    }

    async fn get_json<TRes>(&self, path: &str) -> GatewayResult<TRes>
    where
        TRes: DeserializeOwned + Default,
    {
        let body = self.send::<()>(Method::GET, path, None).await?;
        decode_body(&body)
    }
}

/// Пустое тело ответа трактуется как значение по умолчанию.
fn decode_body<T>(body: &str) -> GatewayResult<T>
where
    T: DeserializeOwned + Default,
{
    if body.trim().is_empty() {
        return Ok(T::default());
    }
    serde_json::from_str(body).map_err(|err| NetworkError::Decode(err.to_string()))
}

#[async_trait]
impl FeedGateway for HttpGateway {
    async fn fetch_posts(&self) -> GatewayResult<Vec<Post>> {
        let dto: PostsResponseDto = self.get_json(POSTS_PATH).await?;
        Ok(dto.posts)
    }

    async fn fetch_comments(&self) -> GatewayResult<Vec<Comment>> {
        let dto: CommentsResponseDto = self.get_json(COMMENTS_PATH).await?;
        Ok(dto.comments)
    }

    async fn create_post(&self, post: &Post) -> GatewayResult<String> {
        let payload = NewPostDto::from(post);
        let body = self.send(Method::POST, POSTS_PATH, Some(&payload)).await?;

        let dto: CreatedResponseDto = decode_body(&body)?;
        dto.id
            .map(String::from)
            .ok_or_else(|| NetworkError::Decode("response has no `id` field".to_string()))
    }

    async fn create_comment(&self, comment: &Comment) -> GatewayResult<()> {
        self.send(Method::POST, COMMENTS_PATH, Some(comment)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_post() -> Post {
        Post {
            id: "should-not-be-sent".to_string(),
            title: "t".to_string(),
            username: "u".to_string(),
            user_avatar: String::new(),
            content: "c".to_string(),
            created_at: 7,
            images: vec!["data:image/png;base64,AA==".to_string()],
            comments: vec![Comment::default()],
        }
    }

    #[test]
    fn endpoint_normalizes_slashes() {
        let gateway = HttpGateway::new("http://localhost:8787/").expect("client must build");
        let full = gateway.endpoint("/api/posts");
        assert_eq!(full, "http://localhost:8787/api/posts");
    }

    #[test]
    fn new_post_payload_omits_id_and_comments() {
        let post = sample_post();
        let value = serde_json::to_value(NewPostDto::from(&post)).expect("payload must serialize");

        assert!(value.get("id").is_none());
        assert!(value.get("comments").is_none());
        assert_eq!(value["createdAt"], 7);
        assert_eq!(value["images"][0], "data:image/png;base64,AA==");
    }

    #[test]
    fn blank_body_decodes_to_default() {
        let dto: PostsResponseDto = decode_body("  ").expect("blank body is allowed");
        assert!(dto.posts.is_empty());
    }

    #[test]
    fn missing_field_decodes_to_empty_list() {
        let dto: CommentsResponseDto = decode_body("{}").expect("missing field is allowed");
        assert!(dto.comments.is_empty());
    }

    #[test]
    fn malformed_body_is_decode_error() {
        let err = decode_body::<PostsResponseDto>("{not-json").expect_err("must fail");
        assert!(matches!(err, NetworkError::Decode(_)));
    }

    #[test]
    fn created_id_accepts_string_and_number() {
        let text: CreatedResponseDto = decode_body(r#"{"id":"abc"}"#).expect("string id");
        assert_eq!(text.id.map(String::from).as_deref(), Some("abc"));

        let number: CreatedResponseDto = decode_body(r#"{"id":17}"#).expect("numeric id");
        assert_eq!(number.id.map(String::from).as_deref(), Some("17"));
    }
}
