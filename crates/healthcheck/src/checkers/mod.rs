//! Concrete checker implementations.

pub mod disk_space;

pub use disk_space::{DiskSpace, DiskSpaceError, FilesystemStats, FsUsage, Statvfs};
