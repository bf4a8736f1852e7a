pub mod file_watcher;

pub use file_watcher::{ensure_supported_platform, ChangeNotifier, FileWatcher};
