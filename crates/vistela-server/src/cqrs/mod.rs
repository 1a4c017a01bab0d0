//! Mediator wiring for the video commands and queries
//!
//! Handlers are plain async functions taking the store; this registers each
//! one so callers outside HTTP (workers, tests) can dispatch requests by type.
//! Uploads are not registered because they also need object storage.

pub use mediator::DefaultAsyncMediator;

use crate::db::SharedVideoStore;
use crate::features::videos::{commands, queries};

pub mod middleware;

pub type AppMediator = DefaultAsyncMediator;

pub fn build_mediator(store: SharedVideoStore) -> AppMediator {
    DefaultAsyncMediator::builder()
        // Commands
        .add_handler({
            let store = store.clone();
            move |cmd| {
                let store = store.clone();
                async move { commands::create::handle(store, cmd).await }
            }
        })
        .add_handler({
            let store = store.clone();
            move |cmd| {
                let store = store.clone();
                async move { commands::update_status::handle(store, cmd).await }
            }
        })
        // Queries
        .add_handler({
            let store = store.clone();
            move |query| {
                let store = store.clone();
                async move { queries::get::handle(store, query).await }
            }
        })
        .add_handler({
            let store = store.clone();
            move |query| {
                let store = store.clone();
                async move { queries::list::handle(store, query).await }
            }
        })
        .add_handler({
            let store = store.clone();
            move |query| {
                let store = store.clone();
                async move { queries::list_by_user::handle(store, query).await }
            }
        })
        .add_handler({
            let store = store.clone();
            move |query| {
                let store = store.clone();
                async move { queries::list_by_status::handle(store, query).await }
            }
        })
        .add_handler({
            let store = store.clone();
            move |query| {
                let store = store.clone();
                async move { queries::stats::handle(store, query).await }
            }
        })
        .build()
}
