//! Контейнер состояния ленты и локальное хранилище личности.
//!
//! - [`state`]: [`FeedState`], события [`FeedEvent`] и чистый редьюсер [`reduce`];
//! - [`FeedStore`]: эффекты поверх [`feed_client::FeedGateway`], подписки на
//!   состояние и поток ошибок;
//! - [`identity`]: хранилище имени и аватара под ключами `USER` и `AVATAR`.
#![warn(missing_docs)]

pub mod identity;
pub mod state;
mod store;

pub use identity::{
    FileIdentityStore, IdentityError, IdentityResult, IdentityStore, MemoryIdentityStore,
};
pub use state::{FeedEvent, FeedState, reduce};
pub use store::{FeedFailure, FeedOperation, FeedStore};
