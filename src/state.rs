use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    config::Config,
    services::{AdService, CommentService, FavoriteService, UploadValidator},
    store::Store,
};

#[derive(Clone)]
pub struct AppState {
    pub ads: AdService,
    pub favorites: FavoriteService,
    pub comments: CommentService,
    pub config: Config,
}

impl AppState {
    /// Wires every service to the same store.
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        let uploads = UploadValidator::new(config.max_upload_limit);
        Self {
            ads: AdService::new(store.clone(), uploads),
            favorites: FavoriteService::new(store.clone()),
            comments: CommentService::new(store),
            config,
        }
    }
}

impl FromRef<AppState> for AdService {
    fn from_ref(state: &AppState) -> Self {
        state.ads.clone()
    }
}

impl FromRef<AppState> for FavoriteService {
    fn from_ref(state: &AppState) -> Self {
        state.favorites.clone()
    }
}

impl FromRef<AppState> for CommentService {
    fn from_ref(state: &AppState) -> Self {
        state.comments.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
