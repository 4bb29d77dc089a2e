//! Shared filesystem and scheduling helpers for latex-review crates.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use rayon::iter::{IntoParallelIterator, ParallelIterator};
use rayon::{ThreadPoolBuildError, ThreadPoolBuilder};
use tempfile::Builder;
use walkdir::WalkDir;

/// Map `func` over `items` on a dedicated pool of at most `workers` threads.
///
/// Output order matches input order.
pub fn bounded_parallel_map<T, R, F>(
    items: Vec<T>,
    workers: usize,
    func: F,
) -> Result<Vec<R>, ThreadPoolBuildError>
where
    T: Send,
    R: Send,
    F: Fn(T) -> R + Send + Sync,
{
    let pool = ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .thread_name(|idx| format!("latex-review-{idx}"))
        .build()?;
    Ok(pool.install(|| items.into_par_iter().map(func).collect()))
}

/// Read every regular file below `root` into memory, keyed by its path
/// relative to `root`. Files for which `keep` returns false are skipped.
pub fn read_directory<F>(root: &Path, keep: F) -> io::Result<BTreeMap<PathBuf, Vec<u8>>>
where
    F: Fn(&Path) -> bool,
{
    let mut files = BTreeMap::new();
    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        if !keep(relative) {
            continue;
        }
        files.insert(relative.to_path_buf(), fs::read(entry.path())?);
    }
    Ok(files)
}

/// Write each file under `root`, creating parent directories as needed.
pub fn write_directory(files: &BTreeMap<PathBuf, Vec<u8>>, root: &Path) -> io::Result<()> {
    for (relative, contents) in files {
        if relative.is_absolute() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("refusing to write absolute path {}", relative.display()),
            ));
        }
        let target = root.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, contents)?;
    }
    Ok(())
}

/// Atomically write the provided string to `path`, ensuring readers never observe
/// partial content. The write is performed via a temporary file in the same
/// directory followed by an atomic rename.
pub fn atomic_write(path: &Path, contents: &str) -> io::Result<()> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| Path::new(".").to_path_buf());
    fs::create_dir_all(&parent)?;

    let mut tmp = Builder::new()
        .prefix(".latex-review")
        .tempfile_in(&parent)?;

    tmp.as_file_mut().write_all(contents.as_bytes())?;
    tmp.as_file_mut().sync_all()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(metadata) = fs::metadata(path) {
            let perm = metadata.permissions().mode();
            let _ = fs::set_permissions(tmp.path(), fs::Permissions::from_mode(perm));
        }
    }

    tmp.persist(path).map(|_| ()).map_err(|err| err.error)
}
