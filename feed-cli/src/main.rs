use std::path::PathBuf;
use std::process;
use std::time::Duration;

use anyhow::{Result, anyhow};
use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use feed_client::{Comment, FeedGateway, HttpGateway, NetworkError, Post, User};
use feed_store::{FeedStore, FileIdentityStore, IdentityStore};
use tracing::{debug, warn};

mod attachment;
mod forms;
mod logging;
mod settings;

use attachment::read_data_url;
use forms::{CommentForm, IdentityForm, PostForm};
use logging::init_logging;
use settings::Settings;

type Store = FeedStore<HttpGateway, FileIdentityStore>;

#[derive(Debug, Parser)]
#[command(name = "feed-cli", version, about = "CLI клиент ленты постов")]
struct Cli {
    /// Адрес API (по умолчанию FEED_API_BASE_URL).
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Показать текущего пользователя.
    Whoami,
    /// Задать имя и аватар.
    ///
    /// Без `--avatar` и `--clear-avatar` текущий аватар сохраняется.
    Identity {
        #[arg(long)]
        name: String,
        #[arg(long, conflicts_with = "clear_avatar")]
        avatar: Option<PathBuf>,
        #[arg(long)]
        clear_avatar: bool,
    },
    /// Загрузить ленту.
    Feed {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Создать пост.
    Post {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        /// Картинка (можно несколько раз), не больше 2 МБ.
        #[arg(long = "image")]
        images: Vec<PathBuf>,
    },
    /// Прокомментировать пост.
    Comment {
        #[arg(long)]
        post_id: String,
        #[arg(long)]
        content: String,
    },
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Ошибка: {err}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let settings = Settings::from_env()?;

    init_logging(&settings.log_level)?;

    let gateway = HttpGateway::with_timeouts(
        resolve_server(cli.server, &settings),
        Duration::from_secs(settings.connect_timeout_secs),
        Duration::from_secs(settings.request_timeout_secs),
    )
    .map_err(map_network_error)?;
    let identity = FileIdentityStore::new(&settings.identity_file);
    debug!(
        base_url = gateway.base_url(),
        identity_file = %identity.path().display(),
        "starting"
    );
    let store = FeedStore::new(gateway, identity);

    match cli.command {
        Command::Whoami => whoami(&store),
        Command::Identity {
            name,
            avatar,
            clear_avatar,
        } => {
            let current = store.load_identity();
            let avatar = match (avatar, clear_avatar) {
                (Some(path), _) => read_data_url(&path)?,
                (None, true) => String::new(),
                (None, false) => current.avatar,
            };
            let form = IdentityForm {
                name: name.trim().to_string(),
                avatar,
            };
            let user = forms::apply_identity(&store, form)?;
            print_user("Пользователь сохранён", &user);
        }
        Command::Feed { limit } => {
            store.load_identity();
            store.refresh_feed().await.map_err(map_network_error)?;
            print_feed(&store.snapshot().posts, limit);
        }
        Command::Post {
            title,
            content,
            images,
        } => {
            let author = forms::require_identity(&store)?;
            let images = images
                .iter()
                .map(|path| read_data_url(path))
                .collect::<Result<Vec<_>>>()?;
            let form = PostForm {
                title: title.trim().to_string(),
                content: content.trim().to_string(),
                images,
            };
            let draft = forms::build_post(form, &author)?;
            let post = store.submit_post(draft).await.map_err(map_network_error)?;
            print_post("Пост создан", &post);
        }
        Command::Comment { post_id, content } => {
            let author = forms::require_identity(&store)?;
            let form = CommentForm {
                post_id: post_id.trim().to_string(),
                content: content.trim().to_string(),
            };
            let draft = forms::build_comment(form, &author)?;
            let post_id = draft.post_id.clone();
            send_comment(&store, draft).await?;
            report_comment(&store, &post_id);
        }
    }

    Ok(())
}

fn whoami(store: &Store) {
    if store.is_first_visit() {
        println!("Похоже, вы здесь впервые.");
        println!("Задайте имя (обязательно) и аватар: feed-cli identity --name <NAME> [--avatar <FILE>]");
        return;
    }
    let user = store.load_identity();
    print_user("Текущий пользователь", &user);
}

/// Обновляет ленту и отправляет комментарий.
///
/// Комментарий попадёт в состояние только если пост уже в ленте, но сбой
/// обновления отправку не отменяет.
async fn send_comment<G, I>(store: &FeedStore<G, I>, draft: Comment) -> Result<()>
where
    G: FeedGateway,
    I: IdentityStore,
{
    if let Err(err) = store.refresh_feed().await {
        warn!(error = %err, "feed refresh before comment failed");
    }
    store
        .submit_comment(draft)
        .await
        .map_err(map_network_error)
}

fn report_comment(store: &Store, post_id: &str) {
    let state = store.snapshot();
    match state.posts.iter().find(|post| post.id == post_id) {
        Some(post) => print_post("Комментарий добавлен", post),
        None => println!("Комментарий сохранён, но пост {post_id} не найден в ленте"),
    }
}

fn resolve_server(server: Option<String>, settings: &Settings) -> String {
    let raw = server.unwrap_or_else(|| settings.api_base_url.clone());
    normalize_server(raw)
}

fn normalize_server(server: String) -> String {
    if server.starts_with("http://") || server.starts_with("https://") {
        return server;
    }

    format!("http://{server}")
}

fn map_network_error(err: NetworkError) -> anyhow::Error {
    let message = match err {
        NetworkError::Transport(message) => format!("сервер недоступен: {message}"),
        NetworkError::Status { status, message } => {
            format!("сервер ответил статусом {status}: {message}")
        }
        NetworkError::Decode(message) => format!("некорректный ответ сервера: {message}"),
    };
    anyhow!(message)
}

fn format_timestamp(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| millis.to_string())
}

fn avatar_label(user: &User) -> String {
    if !user.has_avatar() {
        return "(нет)".to_string();
    }
    let kind = user
        .avatar
        .strip_prefix("data:")
        .and_then(|rest| rest.split(';').next())
        .unwrap_or("url");
    format!("{kind}, {} символов", user.avatar.len())
}

fn print_user(title: &str, user: &User) {
    println!("{title}");
    println!("name: {}", user.name);
    println!("avatar: {}", avatar_label(user));
}

fn print_comment(comment: &Comment) {
    println!(
        "    @{} · {}: {}",
        comment.username,
        format_timestamp(comment.created_at),
        comment.content
    );
}

fn print_post(title: &str, post: &Post) {
    println!("{title}");
    println!("id: {}", post.id);
    println!("title: {}", post.title);
    println!("author: @{} · {}", post.username, format_timestamp(post.created_at));
    println!("content: {}", post.content);
    if !post.images.is_empty() {
        println!("images: {}", post.images.len());
    }
    if !post.comments.is_empty() {
        println!("comments: {}", post.comments.len());
        for comment in &post.comments {
            print_comment(comment);
        }
    }
}

fn print_feed(posts: &[Post], limit: usize) {
    println!("Постов: {} (показано {})", posts.len(), posts.len().min(limit));

    for post in posts.iter().take(limit) {
        println!();
        println!(
            "[{}] {} (@{} · {})",
            post.id,
            post.title,
            post.username,
            format_timestamp(post.created_at)
        );
        println!("{}", post.content);
        if !post.images.is_empty() {
            println!("  images: {}", post.images.len());
        }
        if !post.comments.is_empty() {
            println!("  {} Comments", post.comments.len());
            for comment in &post.comments {
                print_comment(comment);
            }
        }
    }
}
