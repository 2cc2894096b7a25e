//! Dataset sources: catalog lookup, local vs remote detection, fetching and decompression.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use crate::config::DataConfig;
use crate::CompressionFormat;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum InputSource {
    Local(PathBuf),
    Http(String),
}

impl InputSource {
    /// Classifies `location` as a local path or an http(s) URL using string parsing only.
    pub fn detect(location: &str) -> Self {
        if let Some(after_scheme) = location.find("://") {
            let prefix = location[..after_scheme].to_lowercase();
            if prefix == "http" || prefix == "https" {
                return InputSource::Http(location.to_string());
            }
        }
        InputSource::Local(PathBuf::from(location))
    }

    /// Compression implied by the file extension of the path or URL.
    pub fn compression(&self) -> Option<CompressionFormat> {
        match self {
            InputSource::Local(path) => CompressionFormat::from_extension(path),
            InputSource::Http(url) => url_path_extension(url)
                .1
                .and_then(|ext| CompressionFormat::from_extension(Path::new(&format!("x.{ext}")))),
        }
    }

    pub fn display(&self) -> String {
        match self {
            InputSource::Local(path) => path.display().to_string(),
            InputSource::Http(url) => url.clone(),
        }
    }
}

/// Returns the URL path (host stripped, query dropped) and its file extension.
pub fn url_path_extension(url: &str) -> (String, Option<String>) {
    let path_part = match url.find("://") {
        Some(i) => {
            let after = &url[i + 3..];
            after
                .find('/')
                .map(|j| after[j + 1..].to_string())
                .unwrap_or_default()
        }
        None => String::new(),
    };
    let path_part = path_part
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .to_string();
    let last_segment = path_part.rsplit('/').next().unwrap_or(&path_part);
    let ext = Path::new(last_segment)
        .extension()
        .and_then(|e| e.to_str())
        .map(String::from);
    (path_part, ext)
}

/// A dataset the session can load.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DatasetSource {
    /// Catalog id, `None` for ad-hoc paths and URLs
    pub id: Option<String>,
    pub label: String,
    pub location: InputSource,
    /// The catalog's all-fields dataset, which changes the empty-result message
    pub is_all_fields: bool,
}

impl DatasetSource {
    /// Resolve a catalog id, or else treat `input` as a path or URL.
    pub fn resolve(input: &str, data: &DataConfig) -> Self {
        if let Some(entry) = data.source(input) {
            return Self {
                id: Some(entry.id.clone()),
                label: entry.label.clone(),
                location: InputSource::detect(&join_base(&data.base, &entry.file)),
                is_all_fields: entry.id == data.all_fields_source,
            };
        }

        let location = InputSource::detect(input);
        let label = match &location {
            InputSource::Local(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| input.to_string()),
            InputSource::Http(url) => {
                let (path, _) = url_path_extension(url);
                path.rsplit('/')
                    .find(|s| !s.is_empty())
                    .map(String::from)
                    .unwrap_or_else(|| url.clone())
            }
        };
        Self {
            id: None,
            label,
            location,
            is_all_fields: false,
        }
    }

    /// Message shown in place of the table when no row passes the filters.
    pub fn zero_records_message(&self) -> String {
        if self.is_all_fields {
            "No matching journals found. This database includes only biology and filtered out predatory journals. If you think a journal is missing, please contribute to the database.".to_string()
        } else {
            format!(
                "No matching journals. You currently have the \"{}\" dataset loaded.",
                self.label
            )
        }
    }

    /// Fetch the raw CSV text. `compression` overrides detection from the extension.
    pub fn read(&self, compression: Option<CompressionFormat>) -> Result<String> {
        let compression = compression.or_else(|| self.location.compression());
        match &self.location {
            InputSource::Local(path) => {
                let file = File::open(path)
                    .map_err(|e| eyre!("Could not open {}: {}", path.display(), e))?;
                decompress_to_string(BufReader::new(file), compression)
            }
            InputSource::Http(url) => read_http(url, compression),
        }
    }
}

fn join_base(base: &str, file: &str) -> String {
    if base.is_empty() {
        return file.to_string();
    }
    match InputSource::detect(base) {
        InputSource::Http(_) => format!("{}/{}", base.trim_end_matches('/'), file),
        InputSource::Local(dir) => dir.join(file).to_string_lossy().into_owned(),
    }
}

/// Read everything from `reader`, decoding it first when `compression` is set.
pub fn decompress_to_string<R: Read + 'static>(
    reader: R,
    compression: Option<CompressionFormat>,
) -> Result<String> {
    let mut reader: Box<dyn Read> = match compression {
        Some(CompressionFormat::Gzip) => Box::new(flate2::read::GzDecoder::new(reader)),
        Some(CompressionFormat::Zstd) => Box::new(zstd::Decoder::new(reader)?),
        Some(CompressionFormat::Bzip2) => Box::new(bzip2::read::BzDecoder::new(reader)),
        Some(CompressionFormat::Xz) => Box::new(xz2::read::XzDecoder::new(reader)),
        None => Box::new(reader),
    };
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| eyre!("Could not read data: {}", e))?;
    // Spreadsheet exports sometimes carry stray Latin-1 bytes; keep the rest of the file.
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(feature = "http")]
fn read_http(url: &str, compression: Option<CompressionFormat>) -> Result<String> {
    let response = ureq::get(url)
        .timeout(std::time::Duration::from_secs(60))
        .call()
        .map_err(|e| eyre!("Download failed. Check the URL and your connection: {}", e))?;
    let status = response.status();
    if status >= 400 {
        return Err(eyre!(
            "Server returned {} {}. Check the URL.",
            status,
            response.status_text()
        ));
    }
    decompress_to_string(response.into_reader(), compression)
}

#[cfg(not(feature = "http"))]
fn read_http(url: &str, _compression: Option<CompressionFormat>) -> Result<String> {
    Err(eyre!(
        "Cannot fetch {}: this build has no http support (enable the \"http\" feature)",
        url
    ))
}
