use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Публичная модель поста.
pub struct Post {
    /// Идентификатор поста. Пустой, пока сервер не присвоил его.
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    /// Заголовок поста.
    pub title: String,
    /// Имя автора.
    pub username: String,
    /// Аватар автора (data-URL) или пустая строка.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub user_avatar: String,
    /// Текст поста.
    pub content: String,
    /// Время создания, миллисекунды от начала эпохи.
    pub created_at: i64,
    /// Прикреплённые изображения (data-URL) в исходном порядке.
    #[serde(default)]
    pub images: Vec<String>,
    /// Комментарии к посту. Заполняются при загрузке ленты, на сервер не отправляются.
    #[serde(default)]
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Публичная модель комментария.
pub struct Comment {
    /// Идентификатор поста, к которому относится комментарий.
    #[serde(deserialize_with = "string_or_number")]
    pub post_id: String,
    /// Имя автора.
    pub username: String,
    /// Аватар автора (data-URL) или пустая строка.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub user_avatar: String,
    /// Текст комментария.
    pub content: String,
    /// Время создания, миллисекунды от начала эпохи.
    pub created_at: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Локальная личность пользователя: отображаемое имя и аватар.
///
/// Это не аутентификация, а выбранное на клиенте имя, которым подписываются
/// посты и комментарии.
pub struct User {
    /// Отображаемое имя.
    pub name: String,
    /// Аватар (data-URL). Пустая строка означает иконку-заглушку.
    pub avatar: String,
}

impl User {
    /// Создаёт пользователя с именем и аватаром.
    pub fn new(name: impl Into<String>, avatar: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            avatar: avatar.into(),
        }
    }

    /// `true`, если аватар задан.
    pub fn has_avatar(&self) -> bool {
        !self.avatar.is_empty()
    }
}

impl Post {
    /// Черновик поста от имени `author` с отметкой текущего времени.
    ///
    /// Идентификатор пустой: его присваивает сервер.
    pub fn draft(
        title: impl Into<String>,
        content: impl Into<String>,
        author: &User,
        images: Vec<String>,
    ) -> Self {
        Self {
            id: String::new(),
            title: title.into(),
            username: author.name.clone(),
            user_avatar: author.avatar.clone(),
            content: content.into(),
            created_at: now_millis(),
            images,
            comments: Vec::new(),
        }
    }
}

impl Comment {
    /// Черновик комментария к посту `post_id` с отметкой текущего времени.
    pub fn draft(post_id: impl Into<String>, content: impl Into<String>, author: &User) -> Self {
        Self {
            post_id: post_id.into(),
            username: author.name.clone(),
            user_avatar: author.avatar.clone(),
            content: content.into(),
            created_at: now_millis(),
        }
    }
}

/// Текущее время в миллисекундах от начала эпохи.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Идентификатор на проводе: сервер может прислать строку или число.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum WireId {
    Text(String),
    Number(i64),
}

impl From<WireId> for String {
    fn from(value: WireId) -> Self {
        match value {
            WireId::Text(id) => id,
            WireId::Number(id) => id.to_string(),
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    WireId::deserialize(deserializer).map(String::from)
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
