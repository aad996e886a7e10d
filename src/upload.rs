//! Publishing the final CSV to S3.
//!
//! The local file is only ever read, so an upload failure cannot disturb the
//! artifact already on disk.

use anyhow::{Context, Result};
use aws_sdk_s3::primitives::ByteStream;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Object key for `local_path` under an optional prefix, with `.gz` added
/// when compressing.
pub fn object_key(prefix: Option<&str>, local_path: &Path, gzip: bool) -> String {
    let file_name = local_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("output.csv");

    let mut key = match prefix.map(|p| p.trim_matches('/')).filter(|p| !p.is_empty()) {
        Some(prefix) => format!("{prefix}/{file_name}"),
        None => file_name.to_string(),
    };
    if gzip {
        key.push_str(".gz");
    }
    key
}

/// Gzip-compresses a byte buffer.
pub fn gzip_bytes(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Uploads `local_path` to `bucket` at `key`, optionally gzip-compressed.
#[tracing::instrument(skip(client, local_path), fields(path = %local_path.display()))]
pub async fn upload_file(
    client: &aws_sdk_s3::Client,
    local_path: &Path,
    bucket: &str,
    key: &str,
    gzip: bool,
) -> Result<()> {
    let contents = std::fs::read(local_path)
        .with_context(|| format!("reading {} for upload", local_path.display()))?;

    let (body, content_type) = if gzip {
        (gzip_bytes(&contents)?, "application/gzip")
    } else {
        (contents, "text/csv")
    };
    let size = body.len();

    client
        .put_object()
        .bucket(bucket)
        .key(key)
        .body(ByteStream::from(body))
        .content_type(content_type)
        .send()
        .await
        .with_context(|| format!("S3 PutObject failed for s3://{bucket}/{key}"))?;

    info!(bucket, key, bytes = size, "S3 upload complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;

    #[test]
    fn test_object_key_with_prefix() {
        let path = Path::new("/data/final/yelp_ihop_reviews.csv");
        assert_eq!(
            object_key(Some("reviews/"), path, false),
            "reviews/yelp_ihop_reviews.csv"
        );
        assert_eq!(object_key(None, path, true), "yelp_ihop_reviews.csv.gz");
        assert_eq!(object_key(Some(""), path, false), "yelp_ihop_reviews.csv");
    }

    #[test]
    fn test_gzip_bytes_round_trip() {
        let compressed = gzip_bytes(b"review_id,text\nr1,hi\n").unwrap();
        let mut out = String::new();
        GzDecoder::new(&compressed[..]).read_to_string(&mut out).unwrap();
        assert_eq!(out, "review_id,text\nr1,hi\n");
    }
}
