use bytes::Bytes;
use serde::Serialize;
use time::OffsetDateTime;

/// An image picked by the user for analysis. Lives only in memory.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub content: Bytes,
    pub mime_type: String,
    pub file_name: String,
    pub size: u64,
    pub selected_at: OffsetDateTime,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ImageError {
    #[error("only image files can be uploaded (got {0})")]
    NotAnImage(String),
    #[error("image file is empty")]
    Empty,
}

impl UploadedImage {
    /// Builds an image from an uploaded part. A missing file name falls back
    /// to `upload.<ext>`.
    pub fn new(
        content: Bytes,
        mime_type: &str,
        file_name: Option<&str>,
    ) -> Result<Self, ImageError> {
        if !is_image_mime(mime_type) {
            return Err(ImageError::NotAnImage(mime_type.to_string()));
        }
        if content.is_empty() {
            return Err(ImageError::Empty);
        }

        let file_name = match file_name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(n) => n.to_string(),
            None => format!("upload.{}", ext_from_mime(mime_type).unwrap_or("bin")),
        };

        Ok(Self {
            size: content.len() as u64,
            content,
            mime_type: mime_type.to_string(),
            file_name,
            selected_at: OffsetDateTime::now_utc(),
        })
    }

    pub fn summary(&self) -> ImageSummary {
        ImageSummary {
            file_name: self.file_name.clone(),
            mime_type: self.mime_type.clone(),
            size: self.size,
            size_label: format_file_size(self.size),
            selected_at: self.selected_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ImageSummary {
    pub file_name: String,
    pub mime_type: String,
    pub size: u64,
    pub size_label: String,
    #[serde(with = "time::serde::rfc3339")]
    pub selected_at: OffsetDateTime,
}

pub fn is_image_mime(ct: &str) -> bool {
    ct.trim().to_ascii_lowercase().starts_with("image/")
}

pub fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

/// Human readable size: base 1024, at most two decimals.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut idx = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && idx < UNITS.len() - 1 {
        value /= 1024.0;
        idx += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[idx])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ext_from_mime() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/jpg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/png"), Some("png"));
        assert_eq!(ext_from_mime("image/webp"), Some("webp"));
        assert_eq!(ext_from_mime("image/heic"), Some("heic"));
        assert_eq!(ext_from_mime("application/octet-stream"), None);
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(2 * 1024 * 1024), "2 MB");
        assert_eq!(format_file_size(1288490189), "1.2 GB");
    }

    #[test]
    fn rejects_non_image_mime() {
        let err = UploadedImage::new(Bytes::from_static(b"%PDF"), "application/pdf", Some("a.pdf"))
            .unwrap_err();
        assert_eq!(err, ImageError::NotAnImage("application/pdf".into()));
    }

    #[test]
    fn rejects_empty_content() {
        let err = UploadedImage::new(Bytes::new(), "image/png", Some("a.png")).unwrap_err();
        assert_eq!(err, ImageError::Empty);
    }

    #[test]
    fn fills_missing_file_name_from_mime() {
        let img = UploadedImage::new(Bytes::from_static(b"\xff\xd8"), "image/jpeg", None).unwrap();
        assert_eq!(img.file_name, "upload.jpg");
        assert_eq!(img.size, 2);
        assert_eq!(img.summary().size_label, "2 Bytes");
    }
}
