use std::fmt;
use std::mem;
use std::sync::atomic::{AtomicU64, Ordering};

use feed_client::{Comment, FeedGateway, GatewayResult, NetworkError, Post, User};
use tokio::sync::{broadcast, watch};
use tracing::{debug, warn};

use crate::identity::{IdentityResult, IdentityStore};
use crate::state::{FeedEvent, FeedState, reduce};

const FAILURE_CHANNEL_CAPACITY: usize = 64;

/// Эффект, завершившийся сетевой ошибкой.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedOperation {
    /// [`FeedStore::refresh_feed`].
    RefreshFeed,
    /// [`FeedStore::submit_post`].
    SubmitPost,
    /// [`FeedStore::submit_comment`].
    SubmitComment,
}

impl fmt::Display for FeedOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RefreshFeed => "refresh_feed",
            Self::SubmitPost => "submit_post",
            Self::SubmitComment => "submit_comment",
        };
        f.write_str(name)
    }
}

/// Запись в потоке ошибок: какой эффект упал и почему.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedFailure {
    /// Упавший эффект.
    pub operation: FeedOperation,
    /// Ошибка шлюза.
    pub error: NetworkError,
}

/// Контейнер состояния ленты.
///
/// Единственный владелец [`FeedState`]. Состояние меняется только через
/// [`reduce`] внутри [`FeedStore::dispatch`]; читатели получают снимки или
/// подписываются на изменения. Ошибки эффектов состояние не меняют, но
/// публикуются в отдельный поток ([`FeedStore::subscribe_failures`]).
pub struct FeedStore<G: FeedGateway, I: IdentityStore> {
    gateway: G,
    identity: I,
    state: watch::Sender<FeedState>,
    failures: broadcast::Sender<FeedFailure>,
    refresh_issued: AtomicU64,
    refresh_applied: AtomicU64,
}

impl<G: FeedGateway, I: IdentityStore> FeedStore<G, I> {
    /// Создаёт контейнер с пустой лентой и пустым пользователем.
    pub fn new(gateway: G, identity: I) -> Self {
        let (failures, _) = broadcast::channel(FAILURE_CHANNEL_CAPACITY);
        Self {
            gateway,
            identity,
            state: watch::Sender::new(FeedState::default()),
            failures,
            refresh_issued: AtomicU64::new(0),
            refresh_applied: AtomicU64::new(0),
        }
    }

    /// Текущий снимок состояния.
    pub fn snapshot(&self) -> FeedState {
        self.state.borrow().clone()
    }

    /// Текущий пользователь.
    pub fn current_user(&self) -> User {
        self.state.borrow().current_user.clone()
    }

    /// Подписка на изменения состояния.
    pub fn subscribe(&self) -> watch::Receiver<FeedState> {
        self.state.subscribe()
    }

    /// Подписка на ошибки эффектов.
    pub fn subscribe_failures(&self) -> broadcast::Receiver<FeedFailure> {
        self.failures.subscribe()
    }

    /// `true`, если в хранилище личности нет ни одного ключа.
    pub fn is_first_visit(&self) -> bool {
        self.identity.is_empty()
    }

    /// Применяет событие к состоянию через редьюсер.
    ///
    /// Подписчики уведомляются только о событиях, которые могут изменить
    /// состояние.
    pub fn dispatch(&self, event: FeedEvent) {
        debug!(event = event.name(), "dispatch");
        let modifies = event.failure().is_none();
        self.state.send_if_modified(|state| {
            *state = reduce(mem::take(state), event);
            modifies
        });
    }

    /// Читает личность из хранилища и кладёт её в состояние.
    pub fn load_identity(&self) -> User {
        let user = self.identity.load();
        self.dispatch(FeedEvent::IdentityLoaded(user.clone()));
        user
    }

    /// Сохраняет личность и кладёт её в состояние.
    ///
    /// Имя не проверяется. Если запись не удалась, состояние не меняется.
    pub fn persist_identity(&self, user: User) -> IdentityResult<()> {
        self.identity.save(&user)?;
        self.dispatch(FeedEvent::IdentityLoaded(user));
        Ok(())
    }

    /// Загружает посты, затем комментарии, и заменяет ленту целиком.
    ///
    /// Если упал любой из запросов, частично полученные данные отбрасываются.
    /// Ответ, который пришёл позже ответа более нового обновления, тоже
    /// отбрасывается.
    pub async fn refresh_feed(&self) -> GatewayResult<()> {
        let ticket = self.refresh_issued.fetch_add(1, Ordering::SeqCst) + 1;

        let fetched = async {
            let posts = self.gateway.fetch_posts().await?;
            let comments = self.gateway.fetch_comments().await?;
            Ok::<_, NetworkError>((posts, comments))
        }
        .await;

        match fetched {
            Ok((posts, comments)) => {
                debug!(
                    ticket,
                    posts = posts.len(),
                    comments = comments.len(),
                    "feed fetched"
                );
                self.apply_refresh(ticket, posts, comments);
                Ok(())
            }
            Err(err) => {
                self.dispatch(FeedEvent::PostsLoadFailed(err.clone()));
                self.report(FeedOperation::RefreshFeed, &err);
                Err(err)
            }
        }
    }

    /// Создаёт пост. При успехе пост с присвоенным id встаёт первым в ленте
    /// и возвращается вызывающему.
    ///
    /// `created_at` проставляет вызывающая сторона.
    pub async fn submit_post(&self, post: Post) -> GatewayResult<Post> {
        match self.gateway.create_post(&post).await {
            Ok(id) => {
                let created = Post { id, ..post };
                self.dispatch(FeedEvent::PostCreated(created.clone()));
                Ok(created)
            }
            Err(err) => {
                self.dispatch(FeedEvent::PostCreateFailed(err.clone()));
                self.report(FeedOperation::SubmitPost, &err);
                Err(err)
            }
        }
    }

    /// Создаёт комментарий и добавляет его первым к посту в ленте.
    ///
    /// Если поста нет в текущей ленте, комментарий сохранён на сервере, но
    /// в состоянии не появится.
    pub async fn submit_comment(&self, comment: Comment) -> GatewayResult<()> {
        match self.gateway.create_comment(&comment).await {
            Ok(()) => {
                if !self.state.borrow().posts.iter().any(|p| p.id == comment.post_id) {
                    debug!(post_id = %comment.post_id, "comment stored for a post outside the feed");
                }
                self.dispatch(FeedEvent::CommentCreated(comment));
                Ok(())
            }
            Err(err) => {
                self.dispatch(FeedEvent::CommentCreateFailed(err.clone()));
                self.report(FeedOperation::SubmitComment, &err);
                Err(err)
            }
        }
    }

    fn apply_refresh(&self, ticket: u64, posts: Vec<Post>, comments: Vec<Comment>) {
        let applied = &self.refresh_applied;
        let event = FeedEvent::PostsLoaded { posts, comments };
        debug!(event = event.name(), ticket, "dispatch");

        self.state.send_if_modified(|state| {
            if applied.load(Ordering::SeqCst) > ticket {
                debug!(ticket, "stale feed response discarded");
                return false;
            }
            applied.store(ticket, Ordering::SeqCst);
            *state = reduce(mem::take(state), event);
            true
        });
    }

    fn report(&self, operation: FeedOperation, error: &NetworkError) {
        warn!(%operation, %error, "effect failed");
        // Ошибка без подписчиков никому не нужна.
        let _ = self.failures.send(FeedFailure {
            operation,
            error: error.clone(),
        });
    }
}
