use std::sync::Arc;

use crate::application::{posts::PostService, repos::StoreHealth};

#[derive(Clone)]
pub struct HttpState {
    pub posts: Arc<PostService>,
    pub health: Arc<dyn StoreHealth>,
}

impl HttpState {
    pub fn new(posts: Arc<PostService>, health: Arc<dyn StoreHealth>) -> Self {
        Self { posts, health }
    }
}
