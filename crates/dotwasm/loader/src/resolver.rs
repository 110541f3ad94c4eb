// Dotlanth
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Module file resolution against the registered search paths

use crate::{LoaderError, LoaderResult};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A module file located and read into memory
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFile {
    /// Path the file was opened from
    pub path: PathBuf,
    /// Full file contents
    pub bytes: Vec<u8>,
}

/// Resolves module names to file contents
#[derive(Debug, Clone, Copy)]
pub struct FileResolver<'a> {
    search_paths: &'a [PathBuf],
    max_module_size: u64,
}

impl<'a> FileResolver<'a> {
    pub fn new(search_paths: &'a [PathBuf], max_module_size: u64) -> Self {
        Self { search_paths, max_module_size }
    }

    /// Locate `name` and read it fully.
    ///
    /// Absolute names are opened as-is. Relative names are tried against each
    /// search path in registration order and the first file that opens wins;
    /// a path that fails to open for any reason is skipped.
    pub fn resolve(&self, name: impl AsRef<Path>) -> LoaderResult<ResolvedFile> {
        let name = name.as_ref();
        let (path, file, size) = self.open(name)?;
        let bytes = self.read(&path, file, size)?;

        Ok(ResolvedFile { path, bytes })
    }

    fn open(&self, name: &Path) -> LoaderResult<(PathBuf, File, u64)> {
        let not_found = || LoaderError::NotFound { name: name.display().to_string() };

        if name.is_absolute() {
            return match open_file(name) {
                Ok((file, size)) => Ok((name.to_path_buf(), file, size)),
                Err(e) => {
                    debug!("Could not open file {}: {}", name.display(), e);
                    Err(not_found())
                }
            };
        }

        for dir in self.search_paths {
            let candidate = dir.join(name);
            match open_file(&candidate) {
                Ok((file, size)) => {
                    debug!("Opened file {}", candidate.display());
                    return Ok((candidate, file, size));
                }
                Err(e) => debug!("Could not open file {}: {}", candidate.display(), e),
            }
        }

        Err(not_found())
    }

    fn read(&self, path: &Path, file: File, size: u64) -> LoaderResult<Vec<u8>> {
        if size > self.max_module_size {
            return Err(LoaderError::ModuleTooLarge { size, limit: self.max_module_size });
        }

        let capacity = usize::try_from(size).map_err(|_| LoaderError::alloc(format!("file buffer of {size} bytes")))?;
        let mut bytes = Vec::new();
        bytes.try_reserve_exact(capacity).map_err(|e| LoaderError::alloc(format!("file buffer of {size} bytes: {e}")))?;

        // One byte past the expected size is enough to notice a file that grew
        file.take(size + 1).read_to_end(&mut bytes).map_err(|e| LoaderError::read(path, e.to_string()))?;

        if bytes.len() as u64 != size {
            return Err(LoaderError::read(path, format!("read {} of {} bytes", bytes.len(), size)));
        }

        Ok(bytes)
    }
}

fn open_file(path: &Path) -> io::Result<(File, u64)> {
    let file = File::open(path)?;
    let metadata = file.metadata()?;
    if !metadata.is_file() {
        return Err(io::Error::other("not a regular file"));
    }
    Ok((file, metadata.len()))
}
