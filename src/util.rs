use std::{fs, io, path::Path};

/// Whether `directory` directly contains at least one regular file.
/// Subdirectories are not searched.
pub fn has_files(directory: &Path) -> io::Result<bool> {
    for entry in fs::read_dir(directory)? {
        if entry?.path().is_file() {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Regular files directly inside `directory`, sorted by path.
pub fn files_in(directory: &Path) -> io::Result<Vec<std::path::PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(directory)? {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
