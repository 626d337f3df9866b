pub mod files;
pub mod settings;
pub mod storage;

pub use files::{
    atomic_write, ensure_dir, get_data_dir, init_local_data_dir, read_file, report_file,
    FileStore, DATA_DIR_NAME,
};
pub use settings::{Settings, DEFAULT_COFFEE_SHOP_IMAGE};
pub use storage::{
    KeyValueStore, MemoryStore, SharedStorage, StorageError, COFFEE_SHOP_IMAGE_KEY,
    CUSTOM_TIME_KEY, DARK_MODE_KEY, MUSIC_MUTED_KEY, PROJECTS_KEY, SELECTED_SONG_INDEX_KEY,
    TODOS_KEY,
};
