use crate::{
    domain::{Board, BoardId, Category, CategoryBoards, CategoryId, TeamId, UserId},
    error::Result,
    storage::{
        state::{BoardRegistry, CategoryState},
        BoardLister, CategoryBoardStore, CategoryCreator,
    },
};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use tokio::{fs, sync::Mutex};

/// File-based storage implementation.
///
/// Each write loads the document, applies the change and rewrites it while
/// holding `write_lock`, so writers within one process never interleave.
pub struct FileStorage {
    root_path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStorage {
    const DATA_DIR: &'static str = ".categories";
    const CATEGORIES_FILE: &'static str = "categories.json";
    const BOARDS_FILE: &'static str = "boards.json";

    /// Creates a new FileStorage instance for the given project root
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            root_path: project_root.as_ref().join(Self::DATA_DIR),
            write_lock: Mutex::new(()),
        }
    }

    fn categories_file(&self) -> PathBuf {
        self.root_path.join(Self::CATEGORIES_FILE)
    }

    fn boards_file(&self) -> PathBuf {
        self.root_path.join(Self::BOARDS_FILE)
    }

    async fn ensure_directory_exists(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path).await?;
        }
        Ok(())
    }

    /// Creates the data directory and empty documents
    pub async fn initialize(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.ensure_directory_exists(&self.root_path).await?;

        if !self.categories_file().exists() {
            self.write_document(&self.categories_file(), &CategoryState::default())
                .await?;
        }
        if !self.boards_file().exists() {
            self.write_document(&self.boards_file(), &BoardRegistry::default())
                .await?;
        }

        Ok(())
    }

    pub async fn is_initialized(&self) -> bool {
        self.categories_file().exists() && self.boards_file().exists()
    }

    async fn read_document<T: DeserializeOwned + Default>(&self, path: &Path) -> Result<T> {
        if !path.exists() {
            return Ok(T::default());
        }

        let contents = fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&contents)?)
    }

    async fn write_document<T: Serialize>(&self, path: &Path, document: &T) -> Result<()> {
        self.ensure_directory_exists(&self.root_path).await?;

        let json = serde_json::to_string_pretty(document)?;
        // write-then-rename so readers never see a half written document
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, path).await?;
        Ok(())
    }

    async fn update_categories<T>(
        &self,
        apply: impl FnOnce(&mut CategoryState) -> Result<T> + Send,
    ) -> Result<T> {
        let _guard = self.write_lock.lock().await;
        let path = self.categories_file();

        let mut state: CategoryState = self.read_document(&path).await?;
        let out = apply(&mut state)?;
        self.write_document(&path, &state).await?;

        Ok(out)
    }

    /// Registers a board and the users who can see it
    pub async fn add_board(
        &self,
        board: Board,
        members: impl IntoIterator<Item = UserId>,
    ) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let path = self.boards_file();

        let mut registry: BoardRegistry = self.read_document(&path).await?;
        registry.upsert(board, members);
        self.write_document(&path, &registry).await
    }
}

#[async_trait]
impl CategoryBoardStore for FileStorage {
    async fn get_user_category_boards(
        &self,
        user_id: &UserId,
        team_id: &TeamId,
    ) -> Result<Vec<CategoryBoards>> {
        let state: CategoryState = self.read_document(&self.categories_file()).await?;
        Ok(state.user_category_boards(user_id, team_id))
    }

    async fn add_update_category_board(
        &self,
        user_id: &UserId,
        category_id: &CategoryId,
        board_id: &BoardId,
    ) -> Result<()> {
        self.update_categories(|state| {
            state.assign(user_id, category_id, std::slice::from_ref(board_id))
        })
        .await
    }

    async fn add_update_category_boards(
        &self,
        user_id: &UserId,
        category_id: &CategoryId,
        board_ids: &[BoardId],
    ) -> Result<()> {
        self.update_categories(|state| state.assign(user_id, category_id, board_ids))
            .await
    }

    async fn reorder_category_boards(
        &self,
        category_id: &CategoryId,
        new_order: &[BoardId],
    ) -> Result<Vec<BoardId>> {
        self.update_categories(|state| state.reorder(category_id, new_order))
            .await
    }
}

#[async_trait]
impl CategoryCreator for FileStorage {
    async fn create_category(&self, category: Category) -> Result<Category> {
        self.update_categories(|state| state.create_category(category))
            .await
    }
}

#[async_trait]
impl BoardLister for FileStorage {
    async fn get_boards_for_user_and_team(
        &self,
        user_id: &UserId,
        team_id: &TeamId,
        include_archived: bool,
    ) -> Result<Vec<Board>> {
        let registry: BoardRegistry = self.read_document(&self.boards_file()).await?;
        Ok(registry.visible_to(user_id, team_id, include_archived))
    }
}
