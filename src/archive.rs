//! Export archives and their embedded meta file.
//!
//! The platform returns a zip whose entries share one root directory, e.g.
//! `admin-App1/Application.yaml`. Before the archive is saved the meta file
//! (`application_meta.yaml` or `api_meta.yaml`) is written into that root
//! directory so a later import can pick its defaults up from the archive.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::constants::{EXPORTED_APIS_DIR_NAME, EXPORTED_APPS_DIR_NAME};

/// Contents of `application_meta.yaml` / `api_meta.yaml`
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct MetaData {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default)]
    pub deploy: DeployConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct DeployConfig {
    #[serde(default)]
    pub import: ImportConfig,
}

/// Import options recorded at export time
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImportConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preserve_owner: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preserve_provider: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_subscriptions: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_keys: Option<bool>,
}

impl MetaData {
    /// Meta written next to an exported application
    pub fn for_application(name: &str, owner: &str) -> Self {
        MetaData {
            name: name.to_string(),
            version: None,
            owner: Some(owner.to_string()),
            deploy: DeployConfig {
                import: ImportConfig {
                    update: Some(true),
                    preserve_owner: Some(true),
                    skip_subscriptions: Some(false),
                    skip_keys: Some(true),
                    ..Default::default()
                },
            },
        }
    }

    /// Meta written next to an exported API
    pub fn for_api(name: &str, version: &str) -> Self {
        MetaData {
            name: name.to_string(),
            version: Some(version.to_string()),
            owner: None,
            deploy: DeployConfig {
                import: ImportConfig {
                    update: Some(true),
                    preserve_provider: Some(true),
                    ..Default::default()
                },
            },
        }
    }
}

/// `owner_name.zip`, with a user-store domain separator in the owner made file-safe
pub fn application_archive_name(name: &str, owner: &str) -> String {
    format!("{}_{}.zip", owner.replace('/', "#"), name)
}

pub fn api_archive_name(name: &str, version: &str) -> String {
    format!("{name}_{version}.zip")
}

pub fn exported_apps_dir(export_root: &Path, env: &str) -> PathBuf {
    export_root.join(EXPORTED_APPS_DIR_NAME).join(env)
}

pub fn exported_apis_dir(export_root: &Path, env: &str) -> PathBuf {
    export_root.join(EXPORTED_APIS_DIR_NAME).join(env)
}

fn file_options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

/// The directory every entry of the archive lives under, if there is one
fn common_root(names: &[String]) -> Option<String> {
    let first = names.first()?;
    let (root, _) = first.split_once('/')?;
    if root.is_empty() {
        return None;
    }
    let prefix = format!("{root}/");
    names
        .iter()
        .all(|n| n.starts_with(&prefix) || n == root)
        .then(|| root.to_string())
}

fn is_meta_entry(name: &str, meta_file_name: &str) -> bool {
    let trimmed = name.trim_end_matches('/');
    let parts: Vec<&str> = trimmed.split('/').collect();
    parts.len() <= 2 && parts.last() == Some(&meta_file_name)
}

/// Rewrite `archive` with `meta` serialized as `meta_file_name` in its root directory
///
/// Any meta file already present at the top of the archive is dropped.
pub fn include_meta_file(archive: &[u8], meta_file_name: &str, meta: &MetaData) -> Result<Vec<u8>> {
    let mut source = ZipArchive::new(Cursor::new(archive)).context("reading exported archive")?;
    let names: Vec<String> = source.file_names().map(str::to_string).collect();
    let root = common_root(&names);

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for i in 0..source.len() {
        let entry = source.by_index(i)?;
        if is_meta_entry(entry.name(), meta_file_name) {
            tracing::debug!("replacing existing {} in archive", entry.name());
            continue;
        }
        writer.raw_copy_file(entry)?;
    }

    let meta_path = match &root {
        Some(root) => format!("{root}/{meta_file_name}"),
        None => meta_file_name.to_string(),
    };
    let yaml = serde_yaml::to_string(meta)?;
    writer.start_file(meta_path.as_str(), file_options())?;
    writer.write_all(yaml.as_bytes())?;

    Ok(writer.finish()?.into_inner())
}

/// Read the meta file out of an archive, if it carries one
pub fn read_meta_file(archive: &[u8], meta_file_name: &str) -> Result<Option<MetaData>> {
    let mut source = ZipArchive::new(Cursor::new(archive)).context("reading archive")?;
    let found = source
        .file_names()
        .find(|n| is_meta_entry(n, meta_file_name))
        .map(str::to_string);
    let Some(name) = found else {
        return Ok(None);
    };
    let mut contents = String::new();
    source.by_name(&name)?.read_to_string(&mut contents)?;
    let meta: MetaData =
        serde_yaml::from_str(&contents).with_context(|| format!("parsing {name}"))?;
    Ok(Some(meta))
}

/// Zip a directory in memory, using the directory's own name as the archive root
pub fn zip_directory(dir: &Path) -> Result<Vec<u8>> {
    let root = dir
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or("archive")
        .to_string();

    let mut files = Vec::new();
    collect_files(dir, &root, &mut files)?;
    files.sort();

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer.add_directory(format!("{root}/"), file_options())?;
    for (entry_name, path) in files {
        if path.is_dir() {
            writer.add_directory(format!("{entry_name}/"), file_options())?;
        } else {
            let data = fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
            writer.start_file(entry_name.as_str(), file_options())?;
            writer.write_all(&data)?;
        }
    }
    Ok(writer.finish()?.into_inner())
}

fn collect_files(dir: &Path, prefix: &str, out: &mut Vec<(String, PathBuf)>) -> Result<()> {
    for entry in fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))? {
        let entry = entry?;
        let path = entry.path();
        let name = format!("{}/{}", prefix, entry.file_name().to_string_lossy());
        if path.is_dir() {
            collect_files(&path, &name, out)?;
        }
        out.push((name, path));
    }
    Ok(())
}

/// Bytes and upload file name for an import source (zip file or directory)
pub fn load_import_source(path: &Path) -> Result<(Vec<u8>, String)> {
    if path.is_dir() {
        let data = zip_directory(path)?;
        let name = path
            .file_name()
            .map(|n| format!("{}.zip", n.to_string_lossy()))
            .unwrap_or_else(|| "archive.zip".to_string());
        return Ok((data, name));
    }
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "archive.zip".to_string());
    Ok((data, name))
}

/// Save an archive under `dir`, creating the directory when needed
pub fn write_archive(dir: &Path, file_name: &str, data: &[u8]) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Error creating dir to store zip archive: {}", dir.display()))?;
    let path = dir.join(file_name);
    fs::write(&path, data)
        .with_context(|| format!("Error creating zip archive: {}", path.display()))?;
    Ok(path)
}

/// Unpack an archive into `dest`
pub fn extract_archive(archive: &[u8], dest: &Path) -> Result<()> {
    let mut source = ZipArchive::new(Cursor::new(archive)).context("reading archive")?;
    fs::create_dir_all(dest)?;
    source
        .extract(dest)
        .with_context(|| format!("extracting archive into {}", dest.display()))?;
    Ok(())
}
