//! Resident memory sampling for the current process.

/// Resident set size of this process in bytes, `None` where unsupported.
///
/// Reads the same `/proc/self/stat` field and page size as the prometheus
/// process collector, so the value lines up with
/// `process_resident_memory_bytes`.
#[cfg(target_os = "linux")]
pub fn resident_memory_bytes() -> Option<u64> {
    let stat = procfs::process::Process::myself().ok()?.stat().ok()?;
    let pages = u64::try_from(stat.rss).ok()?;
    let page_size = u64::try_from(procfs::page_size()).ok()?;
    pages.checked_mul(page_size)
}

#[cfg(not(target_os = "linux"))]
pub fn resident_memory_bytes() -> Option<u64> {
    None
}
