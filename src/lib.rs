pub mod backup;
pub mod config;
pub mod error;
pub mod layout;
pub mod progress;
pub mod prompt;
pub mod report;
pub mod resolve;
pub mod scan;
pub mod session;
pub mod signal;
pub mod space;
pub mod utils;

pub use backup::{
    cleanup_backup_staging, cleanup_temp_files, copy_scanned, copy_sources, CopyOptions,
    CopyReport,
};
pub use config::{default_config, dump_config, load_config, Config};
pub use error::DrivebakError;
pub use layout::DestinationLayout;
pub use progress::{
    create_progress_sink, render_status_line, ConsoleProgress, CopyProgress, NoProgress,
    PlainProgress, ProgressConfig, ProgressSink,
};
pub use report::{write_report, CommandInventory, SoftwareInventory};
pub use resolve::{home_dir, PathResolver, Resolution};
pub use scan::{scan_sources, BackupTotals, FileEntry, ScanOptions, ScanResult, SkipStage, SkippedFile};
pub use session::{Session, SessionOutcome};
pub use signal::CancelToken;
pub use space::{audit_space, HostVolumes, SpaceReport, Verdict, VolumeProbe, VolumeUsage};

/// Main library result type
pub type Result<T> = std::result::Result<T, DrivebakError>;
