use procfs::process::Process;

pub fn log_mem(phase: &str) {
    match Process::myself().and_then(|p| p.statm()) {
        Ok(mem) => log::debug!(
            "MEM after {}: total virt = {} pages, resident (non-swapped) = {} pages",
            phase,
            mem.size,
            mem.resident
        ),
        Err(e) => log::debug!("MEM: unavailable ({})", e),
    }
}
