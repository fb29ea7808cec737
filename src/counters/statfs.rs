// Filesystem block/inode counts via statvfs(3).

use std::ffi::CString;

use super::error::CollectError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FsStats {
    /// Fragment size; block counts are in units of this.
    pub frsize: u64,
    pub bsize: u64,
    pub blocks: u64,
    pub bfree: u64,
    pub files: u64,
    pub ffree: u64,
}

pub(super) fn statvfs(mount_point: &str) -> Result<FsStats, CollectError> {
    let c_path = CString::new(mount_point).map_err(|e| CollectError::Statvfs {
        mount_point: mount_point.to_string(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, e),
    })?;

    // SAFETY: `stat` is plain-old-data and fully written by a successful call;
    // `c_path` is a valid NUL-terminated string for the duration of the call.
    let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
    let ret = unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) };
    if ret != 0 {
        return Err(CollectError::Statvfs {
            mount_point: mount_point.to_string(),
            source: std::io::Error::last_os_error(),
        });
    }

    Ok(FsStats {
        frsize: stat.f_frsize as u64,
        bsize: stat.f_bsize as u64,
        blocks: stat.f_blocks as u64,
        bfree: stat.f_bfree as u64,
        files: stat.f_files as u64,
        ffree: stat.f_ffree as u64,
    })
}
