// src/exec/files.rs

//! File payloads written by stages.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use flate2::read::GzDecoder;
use tracing::{debug, info};

use crate::config::FileConfig;
use crate::types::FileEncoding;

/// Decode `content` into the bytes to write.
pub fn decode(content: &str, encoding: FileEncoding) -> Result<Vec<u8>> {
    match encoding {
        FileEncoding::Plain => Ok(content.as_bytes().to_vec()),
        FileEncoding::Base64 => decode_base64(content),
        FileEncoding::GzipBase64 => {
            let compressed = decode_base64(content)?;
            let mut out = Vec::new();
            GzDecoder::new(compressed.as_slice())
                .read_to_end(&mut out)
                .context("unable to gunzip payload")?;
            Ok(out)
        }
    }
}

fn decode_base64(content: &str) -> Result<Vec<u8>> {
    // Multi-line TOML strings usually carry wrapped base64.
    let compact: String = content.split_whitespace().collect();
    STANDARD
        .decode(compact.as_bytes())
        .context("unable to decode base64 payload")
}

/// Decode and write every file of `stage`, in declaration order.
pub async fn write_files(stage: &str, files: &[FileConfig]) -> Result<()> {
    for file in files {
        write_file(stage, file).await?;
    }
    Ok(())
}

async fn write_file(stage: &str, file: &FileConfig) -> Result<()> {
    let path = &file.path;
    let bytes = decode(&file.content, file.encoding)
        .with_context(|| format!("decoding content of {}", path.display()))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    tokio::fs::write(path, &bytes)
        .await
        .with_context(|| format!("writing {}", path.display()))?;

    if let Some(mode) = file.permissions {
        set_mode(path, mode).await?;
    }

    info!(stage = %stage, path = %path.display(), bytes = bytes.len(), "wrote stage file");
    debug!(stage = %stage, encoding = ?file.encoding, "file payload decoded");
    Ok(())
}

#[cfg(unix)]
async fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
        .await
        .with_context(|| format!("setting mode {mode:o} on {}", path.display()))
}

#[cfg(not(unix))]
async fn set_mode(path: &Path, _mode: u32) -> Result<()> {
    debug!(path = %path.display(), "file permissions are ignored on this platform");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::Compression;
    use flate2::write::GzEncoder;

    use super::*;

    #[test]
    fn plain_content_is_written_verbatim() {
        assert_eq!(decode("hi\n", FileEncoding::Plain).unwrap(), b"hi\n");
    }

    #[test]
    fn wrapped_base64_is_accepted() {
        let out = decode("aGVsbG8g\n  d29ybGQ=\n", FileEncoding::Base64).unwrap();
        assert_eq!(out, b"hello world");
    }

    #[test]
    fn gzipped_base64_is_inflated() {
        let mut gz = GzEncoder::new(Vec::new(), Compression::default());
        gz.write_all(b"compressed payload").unwrap();
        let encoded = STANDARD.encode(gz.finish().unwrap());

        let out = decode(&encoded, FileEncoding::GzipBase64).unwrap();
        assert_eq!(out, b"compressed payload");
    }

    #[test]
    fn bad_payloads_are_errors() {
        let err = decode("not base64!", FileEncoding::Base64).unwrap_err();
        assert!(format!("{err:#}").contains("base64"));

        let not_gzip = STANDARD.encode(b"plain bytes");
        let err = decode(&not_gzip, FileEncoding::GzipBase64).unwrap_err();
        assert!(format!("{err:#}").contains("gunzip"));
    }
}
