use std::path::{Path, PathBuf};

use crate::{error::Result, types::Token};

/// Persists the OAuth token between runs as pretty-printed JSON.
#[derive(Debug, Clone)]
pub struct TokenManager {
    path: PathBuf,
}

impl TokenManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TokenManager { path: path.into() }
    }

    pub async fn load(&self) -> Result<Token> {
        let content = async_fs::read_to_string(&self.path).await?;
        let token: Token = serde_json::from_str(&content)?;
        Ok(token)
    }

    pub async fn persist(&self, token: &Token) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            async_fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(token)?;
        async_fs::write(&self.path, json).await?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
