use crate::error::DrivebakError;
use crate::prompt::parse_folder_list;
use crate::Result;
use configparser::ini::Ini;
use std::path::{Path, PathBuf};

const SECTION: &str = "drivebak";
const MAX_BAR_WIDTH: usize = 200;

#[derive(Debug, Clone)]
pub struct Config {
    /// Folder under the home directory searched when a name is missing at the top level.
    /// Empty disables the fallback.
    pub cloud_sync_folder: String,
    pub common_folders: Vec<String>,
    pub preserve_timestamps: bool,
    pub follow_symlinks: bool,
    pub bar_width: usize,
    pub write_report: bool,
    pub report_file_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            cloud_sync_folder: "OneDrive".to_string(),
            common_folders: ["Desktop", "Documents", "Downloads", "Pictures", "Music", "Videos"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            preserve_timestamps: true,
            follow_symlinks: false,
            bar_width: 40,
            write_report: true,
            report_file_name: "installed_programs.txt".to_string(),
        }
    }
}

/// Get default configuration
pub fn default_config() -> Config {
    Config::default()
}

/// Load configuration from `explicit` or the platform config path, falling back to defaults
/// when the platform file does not exist.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let config_path = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(DrivebakError::config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            path.to_path_buf()
        }
        None => get_config_path()?,
    };

    if !config_path.exists() {
        return Ok(default_config());
    }

    load_config_file(&config_path)
}

fn load_config_file(config_path: &Path) -> Result<Config> {
    let mut conf = Ini::new();
    conf.load(config_path)
        .map_err(|e| DrivebakError::config(format!("Failed to parse config file: {e}")))?;

    let mut config = default_config();

    if let Some(value) = conf.get(SECTION, "cloud_sync_folder") {
        config.cloud_sync_folder = value.trim().to_string();
    }
    if let Some(value) = conf.get(SECTION, "common_folders") {
        config.common_folders = parse_folder_list(&value);
    }
    if let Some(value) = conf.get(SECTION, "report_file_name") {
        config.report_file_name = value.trim().to_string();
    }

    if let Some(value) = conf.get(SECTION, "preserve_timestamps") {
        config.preserve_timestamps = parse_bool(&value).unwrap_or(config.preserve_timestamps);
    }
    if let Some(value) = conf.get(SECTION, "follow_symlinks") {
        config.follow_symlinks = parse_bool(&value).unwrap_or(config.follow_symlinks);
    }
    if let Some(value) = conf.get(SECTION, "write_report") {
        config.write_report = parse_bool(&value).unwrap_or(config.write_report);
    }

    if let Some(value) = conf.get(SECTION, "bar_width") {
        config.bar_width = value
            .trim()
            .parse()
            .map_err(|_| DrivebakError::config(format!("Invalid bar_width: {value}")))?;
    }

    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &Config) -> Result<()> {
    if config.bar_width == 0 || config.bar_width > MAX_BAR_WIDTH {
        return Err(DrivebakError::config(format!(
            "bar_width must be between 1 and {MAX_BAR_WIDTH}, got {}",
            config.bar_width
        )));
    }

    let name = &config.report_file_name;
    if name.is_empty() || name.contains('/') || name.contains('\\') {
        return Err(DrivebakError::config(format!(
            "report_file_name must be a plain file name, got '{name}'"
        )));
    }

    Ok(())
}

/// Get the configuration file path for the current platform
pub fn get_config_path() -> Result<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return Ok(PathBuf::from(appdata).join("drivebak").join("config.ini"));
        }
    }

    if let Some(config_dir) = std::env::var_os("XDG_CONFIG_HOME") {
        Ok(PathBuf::from(config_dir)
            .join("drivebak")
            .join("config.ini"))
    } else if let Some(home) = std::env::var_os("HOME") {
        Ok(PathBuf::from(home)
            .join(".config")
            .join("drivebak")
            .join("config.ini"))
    } else {
        Err(DrivebakError::config("Could not determine config directory"))
    }
}

/// Parse a boolean value from INI string
fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Some(true),
        "false" | "no" | "0" | "off" => Some(false),
        _ => None,
    }
}

/// Create a sample configuration file
pub fn create_sample_config() -> String {
    r#"[drivebak]
# Folder under the home directory searched when a requested folder is missing
cloud_sync_folder = OneDrive

# Folders offered by the "common folders" prompt
common_folders = Desktop, Documents, Downloads, Pictures, Music, Videos

# Copy access and modification times onto backed-up files (true/false)
preserve_timestamps = true

# Descend into symlinked directories while scanning
follow_symlinks = false

# Width of the textual progress bar
bar_width = 40

# Write a list of installed programs into the destination
write_report = true
report_file_name = installed_programs.txt
"#
    .to_string()
}

/// Display the current configuration in a user-friendly format
pub fn dump_config(config: &Config, explicit: Option<&Path>) -> Result<()> {
    let config_path = match explicit {
        Some(path) => path.to_path_buf(),
        None => get_config_path()?,
    };

    println!("drivebak Configuration");
    println!("======================");
    println!();

    if config_path.exists() {
        println!("Config file: {} (found)", config_path.display());
    } else {
        println!(
            "Config file: {} (not found, using defaults)",
            config_path.display()
        );
    }
    println!();

    println!("Current Settings:");
    println!("----------------");
    println!("cloud_sync_folder   = {}", config.cloud_sync_folder);
    println!("common_folders      = {}", config.common_folders.join(", "));
    println!("preserve_timestamps = {}", config.preserve_timestamps);
    println!("follow_symlinks     = {}", config.follow_symlinks);
    println!("bar_width           = {}", config.bar_width);
    println!("write_report        = {}", config.write_report);
    println!("report_file_name    = {}", config.report_file_name);
    println!();

    if !config_path.exists() {
        println!("To create a configuration file, save the following as");
        println!("{}:", config_path.display());
        println!();
        print!("{}", create_sample_config());
    }

    Ok(())
}
