use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use crate::core::error::{Error, ErrorKind, Result};

/// Single writer guarantee for one data file.
///
/// Advisory `flock` on a sidecar `<data file>.lock`, released on drop.
#[derive(Debug)]
pub struct FileLock {
    pub file: File,
    pub path: PathBuf,
}

impl FileLock {
    pub fn acquire(lock_path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(lock_path)?;

        // Platform-specific locking
        #[cfg(unix)]
        {
            use std::os::unix::io::AsRawFd;
            use libc::{flock, LOCK_EX, LOCK_NB};

            let fd = file.as_raw_fd();
            unsafe {
                if flock(fd, LOCK_EX | LOCK_NB) != 0 {
                    return Err(Error::new(
                        ErrorKind::Locked,
                        format!(
                            "Database file is locked by another process ({})",
                            lock_path.display()
                        ),
                    ));
                }
            }
        }

        Ok(FileLock {
            file,
            path: lock_path.to_path_buf(),
        })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        #[cfg(unix)]
        {
            use std::os::unix::io::AsRawFd;
            use libc::{flock, LOCK_UN};

            let fd = self.file.as_raw_fd();
            unsafe {
                flock(fd, LOCK_UN);
            }
        }
    }
}
