use anyhow::{Context, Result, anyhow, bail};
use feed_client::{Comment, FeedGateway, Post, User};
use feed_store::{FeedStore, IdentityStore};
use validator::Validate;

#[derive(Debug, Clone, Validate)]
pub(crate) struct IdentityForm {
    #[validate(length(min = 1, message = "user name is required"))]
    pub(crate) name: String,
    pub(crate) avatar: String,
}

#[derive(Debug, Clone, Validate)]
pub(crate) struct PostForm {
    #[validate(length(min = 1, message = "title is required"))]
    pub(crate) title: String,
    #[validate(length(min = 1, message = "content is required"))]
    pub(crate) content: String,
    pub(crate) images: Vec<String>,
}

#[derive(Debug, Clone, Validate)]
pub(crate) struct CommentForm {
    #[validate(length(min = 1, message = "post id is required"))]
    pub(crate) post_id: String,
    #[validate(length(min = 1, message = "content is required"))]
    pub(crate) content: String,
}

/// Проверяет форму и только после этого сохраняет личность.
pub(crate) fn apply_identity<G, I>(store: &FeedStore<G, I>, form: IdentityForm) -> Result<User>
where
    G: FeedGateway,
    I: IdentityStore,
{
    form.validate()
        .map_err(|err| anyhow!("некорректные данные пользователя: {err}"))?;

    let user = User::new(form.name, form.avatar);
    store
        .persist_identity(user.clone())
        .context("не удалось сохранить пользователя")?;
    Ok(user)
}

/// Личность, от имени которой можно писать. Без имени писать нельзя.
pub(crate) fn require_identity<G, I>(store: &FeedStore<G, I>) -> Result<User>
where
    G: FeedGateway,
    I: IdentityStore,
{
    let user = store.load_identity();
    if user.name.is_empty() {
        bail!("сначала задайте имя: `feed-cli identity --name <NAME>`");
    }
    Ok(user)
}

pub(crate) fn build_post(form: PostForm, author: &User) -> Result<Post> {
    form.validate()
        .map_err(|err| anyhow!("некорректный пост: {err}"))?;
    Ok(Post::draft(form.title, form.content, author, form.images))
}

pub(crate) fn build_comment(form: CommentForm, author: &User) -> Result<Comment> {
    form.validate()
        .map_err(|err| anyhow!("некорректный комментарий: {err}"))?;
    Ok(Comment::draft(form.post_id, form.content, author))
}
