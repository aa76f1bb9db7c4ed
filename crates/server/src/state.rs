use std::sync::Arc;

use postgrid_query::PostGrid;

use crate::auth::AccessTokens;

#[derive(Clone)]
pub struct AppState {
    pub grid: Arc<PostGrid>,
    pub tokens: AccessTokens,
}

impl AppState {
    pub fn new(grid: Arc<PostGrid>) -> Self {
        let tokens = AccessTokens::from_config(grid.config());
        Self { grid, tokens }
    }
}
