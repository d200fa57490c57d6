//! Состояние ленты и чистый редьюсер.

use std::collections::HashMap;

use feed_client::{Comment, NetworkError, Post, User};

/// Состояние ленты: посты с комментариями и текущий пользователь.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedState {
    /// Посты, новые сверху.
    pub posts: Vec<Post>,
    /// Текущая локальная личность.
    pub current_user: User,
}

/// События, которые переводят [`FeedState`] в новое состояние.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    /// Лента и комментарии загружены с сервера.
    PostsLoaded {
        /// Посты в порядке ответа сервера.
        posts: Vec<Post>,
        /// Все комментарии в порядке ответа сервера.
        comments: Vec<Comment>,
    },
    /// Загрузка ленты не удалась.
    PostsLoadFailed(NetworkError),
    /// Пост создан, идентификатор присвоен сервером.
    PostCreated(Post),
    /// Создать пост не удалось.
    PostCreateFailed(NetworkError),
    /// Личность загружена или сохранена.
    IdentityLoaded(User),
    /// Комментарий сохранён на сервере.
    CommentCreated(Comment),
    /// Создать комментарий не удалось.
    CommentCreateFailed(NetworkError),
}

impl FeedEvent {
    /// Короткое имя события для логов.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PostsLoaded { .. } => "posts_loaded",
            Self::PostsLoadFailed(_) => "posts_load_failed",
            Self::PostCreated(_) => "post_created",
            Self::PostCreateFailed(_) => "post_create_failed",
            Self::IdentityLoaded(_) => "identity_loaded",
            Self::CommentCreated(_) => "comment_created",
            Self::CommentCreateFailed(_) => "comment_create_failed",
        }
    }

    /// Ошибка, которую несёт событие неудачи.
    pub fn failure(&self) -> Option<&NetworkError> {
        match self {
            Self::PostsLoadFailed(err)
            | Self::PostCreateFailed(err)
            | Self::CommentCreateFailed(err) => Some(err),
            _ => None,
        }
    }
}

/// Редьюсер: чистая и тотальная функция `(состояние, событие) -> состояние`.
///
/// События неудач состояние не меняют.
pub fn reduce(mut state: FeedState, event: FeedEvent) -> FeedState {
    match event {
        FeedEvent::PostsLoaded { posts, comments } => {
            state.posts = attach_comments(posts, comments);
        }
        FeedEvent::PostCreated(post) => {
            state.posts.insert(0, post);
        }
        FeedEvent::IdentityLoaded(user) => {
            state.current_user = user;
        }
        FeedEvent::CommentCreated(comment) => {
            if let Some(post) = state.posts.iter_mut().find(|post| post.id == comment.post_id) {
                post.comments.insert(0, comment);
            }
        }
        FeedEvent::PostsLoadFailed(_)
        | FeedEvent::PostCreateFailed(_)
        | FeedEvent::CommentCreateFailed(_) => {}
    }
    state
}

/// Сортирует посты и комментарии по убыванию времени (стабильно) и
/// раскладывает комментарии по постам. Комментарии к неизвестным постам
/// отбрасываются.
fn attach_comments(mut posts: Vec<Post>, mut comments: Vec<Comment>) -> Vec<Post> {
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let mut by_post: HashMap<String, Vec<Comment>> = HashMap::new();
    for comment in comments {
        by_post
            .entry(comment.post_id.clone())
            .or_default()
            .push(comment);
    }

    for post in &mut posts {
        post.comments = by_post.get(&post.id).cloned().unwrap_or_default();
    }
    posts
}
