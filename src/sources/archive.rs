//! Release archives: download, verification and extraction.

use std::fs::{self, File};
use std::io::{self, BufReader, IsTerminal, Read, Write};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use indicatif::{ProgressBar, ProgressStyle};
use tar::{Archive, EntryType};

use crate::core::PrereqError;
use crate::util::fs::{ensure_dir, remove_file_if_exists};
use crate::util::hash::{digest_file, Checksum, HashAlgorithm};

/// Download `url` to `dest` unless a verified copy is already there.
///
/// The body is streamed into a temporary file next to `dest` and only moved
/// into place once its checksum matches, so an interrupted or corrupt
/// download never looks like a cached archive.
pub fn download(
    url: &str,
    dest: &Path,
    checksum: Option<&Checksum>,
    timeout: Duration,
    progress: bool,
) -> Result<()> {
    if dest.is_file() {
        match checksum {
            None => {
                tracing::info!("Using existing {}", dest.display());
                return Ok(());
            }
            Some(checksum) => {
                if verify(dest, checksum).is_ok() {
                    tracing::info!("Using cached {}", dest.display());
                    return Ok(());
                }
                tracing::warn!(
                    "{} does not match its {} checksum, downloading again",
                    dest.display(),
                    checksum.algorithm
                );
            }
        }
    }

    let parent = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    ensure_dir(&parent)?;

    tracing::info!("Downloading {}", url);

    let network = |message: String| PrereqError::Network {
        url: url.to_string(),
        message,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| network(e.to_string()))?;

    let response = client
        .get(url)
        .send()
        .map_err(|e| network(e.to_string()))?;

    if !response.status().is_success() {
        return Err(network(format!("HTTP {}", response.status())).into());
    }

    let bar = progress_bar(response.content_length(), progress);
    let mut tmp = tempfile::NamedTempFile::new_in(&parent)
        .with_context(|| format!("failed to create temporary file in {}", parent.display()))?;

    let mut body: Box<dyn Read> = match &bar {
        Some(bar) => Box::new(bar.wrap_read(response)),
        None => Box::new(response),
    };
    let copied = copy_body(body.as_mut(), tmp.as_file_mut(), url);
    if let Some(bar) = &bar {
        bar.finish_and_clear();
    }
    let bytes = copied?;
    tracing::debug!("Downloaded {} bytes from {}", bytes, url);

    if tracing::enabled!(tracing::Level::DEBUG) {
        let sha256 = digest_file(HashAlgorithm::Sha256, tmp.path())?;
        tracing::debug!("{} sha256 {}", url, sha256);
    }

    if let Some(checksum) = checksum {
        let actual = digest_file(checksum.algorithm, tmp.path())?;
        if !checksum.matches(&actual) {
            return Err(PrereqError::Integrity {
                file: dest.to_path_buf(),
                algorithm: checksum.algorithm,
                expected: checksum.digest.to_string(),
                actual,
            }
            .into());
        }
        tracing::debug!("{} checksum verified", checksum.algorithm);
    }

    tmp.persist(dest)
        .with_context(|| format!("failed to write {}", dest.display()))?;

    Ok(())
}

/// Stream a response body into `out`.
///
/// Only failures reading the body are network errors; a failed write is a
/// local I/O problem and is reported as such.
fn copy_body(body: &mut dyn Read, out: &mut dyn Write, url: &str) -> Result<u64> {
    let mut buffer = [0u8; 64 * 1024];
    let mut total = 0u64;

    loop {
        let n = match body.read(&mut buffer) {
            Ok(0) => return Ok(total),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(PrereqError::Network {
                    url: url.to_string(),
                    message: e.to_string(),
                }
                .into())
            }
        };

        out.write_all(&buffer[..n])
            .context("failed to write downloaded data")?;
        total += n as u64;
    }
}

/// Check a file against a checksum.
pub fn verify(path: &Path, checksum: &Checksum) -> Result<()> {
    let actual = digest_file(checksum.algorithm, path)?;
    if checksum.matches(&actual) {
        Ok(())
    } else {
        Err(PrereqError::Integrity {
            file: path.to_path_buf(),
            algorithm: checksum.algorithm,
            expected: checksum.digest.to_string(),
            actual,
        }
        .into())
    }
}

fn progress_bar(total: Option<u64>, enabled: bool) -> Option<ProgressBar> {
    if !enabled || !io::stderr().is_terminal() {
        return None;
    }

    let total = total?;
    let bar = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
        .map(|style| style.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    Some(bar)
}

/// Unpack a `.tar.bz2` or `.tar.gz` archive into `dest`.
///
/// When the archive wraps its contents in one top-level directory, that
/// directory is dropped so `dest` holds the project root directly.
pub fn extract(archive: &Path, dest: &Path) -> Result<()> {
    let name = archive
        .file_name()
        .map(|n| n.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    let file = File::open(archive)
        .with_context(|| format!("failed to open {}", archive.display()))?;
    let reader = BufReader::new(file);

    let decoder: Box<dyn Read> = if name.ends_with(".tar.bz2") || name.ends_with(".tbz2") {
        Box::new(BzDecoder::new(reader))
    } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        Box::new(GzDecoder::new(reader))
    } else {
        bail!("unsupported archive format: {}", archive.display());
    };

    tracing::info!("Extracting {} to {}", archive.display(), dest.display());
    ensure_dir(dest)?;
    unpack_stripped(Archive::new(decoder), dest)
        .with_context(|| format!("failed to extract {}", archive.display()))
}

fn unpack_stripped<R: Read>(mut archive: Archive<R>, dest: &Path) -> Result<()> {
    let root = dest
        .canonicalize()
        .with_context(|| format!("failed to resolve {}", dest.display()))?;
    let mut top: Option<PathBuf> = None;

    for entry in archive.entries().context("failed to read archive entries")? {
        let mut entry = entry.context("failed to read archive entry")?;
        let entry_type = entry.header().entry_type();
        if matches!(entry_type, EntryType::XGlobalHeader | EntryType::XHeader) {
            continue;
        }

        let path = entry.path().context("invalid entry path")?.into_owned();
        check_relative(&path)?;

        let first = match path.components().next() {
            Some(Component::Normal(first)) => PathBuf::from(first),
            _ => continue,
        };
        let nested = entry_type == EntryType::Directory || path.components().count() > 1;
        if top.is_none() && nested {
            top = Some(first);
        }

        let relative = strip_top(&path, top.as_deref());
        if relative.as_os_str().is_empty() {
            continue;
        }

        let output = dest.join(&relative);
        if let Some(parent) = output.parent() {
            ensure_dir(parent)?;
            // A symlink unpacked earlier must not redirect later entries.
            let parent = parent
                .canonicalize()
                .with_context(|| format!("failed to resolve {}", parent.display()))?;
            if !parent.starts_with(&root) {
                bail!("archive entry escapes destination: {}", path.display());
            }
        }

        match entry_type {
            EntryType::Directory => ensure_dir(&output)?,
            EntryType::Link => {
                let target = link_target(&entry, &path)?;
                check_relative(&target)?;
                let source = dest.join(strip_top(&target, top.as_deref()));

                remove_file_if_exists(&output)?;
                fs::hard_link(&source, &output).with_context(|| {
                    format!("failed to link {} to {}", output.display(), source.display())
                })?;
            }
            EntryType::Symlink => {
                let target = link_target(&entry, &path)?;
                if link_escapes(&relative, &target) {
                    bail!(
                        "symlink {} points outside the destination: {}",
                        path.display(),
                        target.display()
                    );
                }
                entry
                    .unpack(&output)
                    .with_context(|| format!("failed to extract {}", output.display()))?;
            }
            _ => {
                entry
                    .unpack(&output)
                    .with_context(|| format!("failed to extract {}", output.display()))?;
            }
        }
    }

    Ok(())
}

fn check_relative(path: &Path) -> Result<()> {
    if path
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)))
    {
        bail!("archive entry escapes destination: {}", path.display());
    }
    Ok(())
}

fn strip_top(path: &Path, top: Option<&Path>) -> PathBuf {
    match top.and_then(|top| path.strip_prefix(top).ok()) {
        Some(rest) => rest.to_path_buf(),
        None => path.to_path_buf(),
    }
}

fn link_target<R: Read>(entry: &tar::Entry<'_, R>, path: &Path) -> Result<PathBuf> {
    entry
        .link_name()
        .context("invalid link target")?
        .map(|target| target.into_owned())
        .ok_or_else(|| anyhow!("link {} has no target", path.display()))
}

/// Whether a symlink at `entry` (relative to the destination) pointing at
/// `target` resolves outside the destination.
fn link_escapes(entry: &Path, target: &Path) -> bool {
    let mut depth = entry.components().count().saturating_sub(1);

    for component in target.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return true;
                }
                depth -= 1;
            }
            Component::RootDir | Component::Prefix(_) => return true,
        }
    }

    false
}
