pub mod dev;
pub mod init;
pub mod migrate_progress;
pub mod stats;
pub mod sync;
pub mod validate;
