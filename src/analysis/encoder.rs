use std::{fmt, str::FromStr};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::{macros::format_description, OffsetDateTime, UtcOffset};
use uuid::Uuid;

use super::error::AnalysisError;
use crate::images::upload::UploadedImage;

/// Wire encoding used for one analysis request; picked by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisEncoding {
    #[default]
    #[serde(alias = "formdata")]
    Multipart,
    #[serde(alias = "base64")]
    Json,
}

impl FromStr for AnalysisEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "multipart" | "formdata" | "form" => Ok(Self::Multipart),
            "json" | "base64" => Ok(Self::Json),
            other => Err(format!("unknown encoding '{}'", other)),
        }
    }
}

impl fmt::Display for AnalysisEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisEncoding::Multipart => f.write_str("multipart"),
            AnalysisEncoding::Json => f.write_str("json"),
        }
    }
}

/// Scalar metadata sent next to the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisFields {
    pub file_name: String,
    pub mime_type: String,
    pub file_size: u64,
    pub timestamp: String,
    pub user_id: Option<Uuid>,
}

impl AnalysisFields {
    pub fn for_image(image: &UploadedImage, user_id: Option<Uuid>, at: OffsetDateTime) -> Self {
        Self {
            file_name: image.file_name.clone(),
            mime_type: image.mime_type.clone(),
            file_size: image.size,
            timestamp: iso_timestamp(at),
            user_id,
        }
    }
}

/// `2024-05-01T12:30:00.123Z`
pub fn iso_timestamp(at: OffsetDateTime) -> String {
    let fmt = format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
    );
    at.to_offset(UtcOffset::UTC).format(&fmt).unwrap_or_default()
}

pub enum EncodedBody {
    Multipart(Form),
    Json(Vec<u8>),
}

impl EncodedBody {
    pub fn encoding(&self) -> AnalysisEncoding {
        match self {
            EncodedBody::Multipart(_) => AnalysisEncoding::Multipart,
            EncodedBody::Json(_) => AnalysisEncoding::Json,
        }
    }

    /// Content type the body is sent with. For multipart the boundary is
    /// appended by the transport.
    pub fn content_type_hint(&self) -> &'static str {
        match self {
            EncodedBody::Multipart(_) => "multipart/form-data",
            EncodedBody::Json(_) => "application/json",
        }
    }
}

impl fmt::Debug for EncodedBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodedBody::Multipart(form) => f
                .debug_struct("Multipart")
                .field("boundary", &form.boundary())
                .finish(),
            EncodedBody::Json(body) => f.debug_struct("Json").field("len", &body.len()).finish(),
        }
    }
}

pub fn encode(
    encoding: AnalysisEncoding,
    image: &UploadedImage,
    fields: &AnalysisFields,
) -> Result<EncodedBody, AnalysisError> {
    match encoding {
        AnalysisEncoding::Multipart => Ok(encode_multipart(image, fields)),
        AnalysisEncoding::Json => encode_json(image, fields),
    }
}

/// Image part plus scalar text fields. Never fails; no size limit here.
pub fn encode_multipart(image: &UploadedImage, fields: &AnalysisFields) -> EncodedBody {
    let image_part = || {
        Part::stream_with_length(image.content.clone(), image.content.len() as u64)
            .file_name(fields.file_name.clone())
    };
    let part = image_part()
        .mime_str(&fields.mime_type)
        .unwrap_or_else(|_| image_part());

    let mut form = Form::new()
        .part("image", part)
        .text("fileName", fields.file_name.clone())
        .text("mimeType", fields.mime_type.clone())
        .text("fileSize", fields.file_size.to_string())
        .text("timestamp", fields.timestamp.clone());
    if let Some(user_id) = fields.user_id {
        form = form.text("user_id", user_id.to_string());
    }
    EncodedBody::Multipart(form)
}

/// Single JSON object with the image embedded as a base64 data URI.
pub fn encode_json(image: &UploadedImage, fields: &AnalysisFields) -> Result<EncodedBody, AnalysisError> {
    let mut body = json!({
        "image": data_uri(&fields.mime_type, &image.content),
        "fileName": fields.file_name,
        "mimeType": fields.mime_type,
        "fileSize": fields.file_size,
        "timestamp": fields.timestamp,
    });
    if let Some(user_id) = fields.user_id {
        body["user_id"] = json!(user_id);
    }

    serde_json::to_vec(&body)
        .map(EncodedBody::Json)
        .map_err(|e| AnalysisError::Encoding(e.to_string()))
}

pub fn data_uri(mime_type: &str, content: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(content))
}
