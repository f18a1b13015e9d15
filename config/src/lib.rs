pub mod paths;
pub mod settings;

pub use paths::PathManager;
pub use settings::Settings;

/// Load environment variables from .env files.
///
/// Reads ./.env (project directory) first, then ~/.env (home directory).
/// dotenv never overwrites a variable that is already set, so the process
/// environment wins over the project file, which wins over the home file.
/// Call this before parsing CLI args to ensure env vars are available.
pub fn load_env_file() {
    dotenv::dotenv().ok();

    if let Some(dirs) = directories::UserDirs::new() {
        let home_env_path = dirs.home_dir().join(".env");
        dotenv::from_path(home_env_path).ok();
    }
}
