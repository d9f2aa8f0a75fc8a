//! Request bodies: JSON, url-encoded forms and multipart uploads.

use std::sync::Arc;

use futures_util::stream;
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde_json::{Map, Value};

use super::error::HttpError;

/// Chunk size used when streaming an upload with progress reporting.
pub const UPLOAD_CHUNK_BYTES: usize = 64 * 1024;

/// Bytes sent so far out of the total body length.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    pub sent: u64,
    pub total: u64,
}

impl Progress {
    /// Completion as a whole percentage; an empty body counts as done.
    #[must_use]
    pub fn percent(self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        let pct = self.sent.min(self.total) * 100 / self.total;
        u8::try_from(pct).unwrap_or(100)
    }
}

pub type ProgressFn = Arc<dyn Fn(Progress) + Send + Sync>;

/// A file attached to a multipart body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadFile {
    pub field: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    #[must_use]
    pub fn new(field: &str, file_name: &str, bytes: Vec<u8>) -> Self {
        Self {
            field: field.to_owned(),
            file_name: file_name.to_owned(),
            content_type: None,
            bytes,
        }
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.to_owned());
        self
    }

    #[must_use]
    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Form(Vec<(String, String)>),
    Multipart {
        fields: Vec<(String, String)>,
        files: Vec<UploadFile>,
    },
}

impl RequestBody {
    /// Serialize any value as a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Decode`] if the value cannot be represented as JSON.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, HttpError> {
        serde_json::to_value(value)
            .map(Self::Json)
            .map_err(|e| HttpError::Decode(e.to_string()))
    }

    /// Pick the body shape from the input: any attached file forces
    /// multipart form data, otherwise the fields are sent as JSON.
    #[must_use]
    pub fn from_parts(fields: Map<String, Value>, files: Vec<UploadFile>) -> Self {
        if files.is_empty() {
            return Self::Json(Value::Object(fields));
        }
        Self::Multipart { fields: form_fields(&fields), files }
    }

    /// Attach this body to a request builder.
    ///
    /// With `progress` set, multipart files are streamed in
    /// [`UPLOAD_CHUNK_BYTES`] chunks and the callback fires as each chunk is
    /// handed to the transport.
    pub(crate) fn apply(&self, req: reqwest::RequestBuilder, progress: Option<&ProgressFn>) -> reqwest::RequestBuilder {
        match self {
            Self::Empty => req,
            Self::Json(value) => req.json(value),
            Self::Form(pairs) => req.form(pairs),
            Self::Multipart { fields, files } => req.multipart(multipart_form(fields, files, progress)),
        }
    }

    /// Byte length of the file parts, used for progress totals.
    #[must_use]
    pub fn upload_len(&self) -> u64 {
        match self {
            Self::Multipart { files, .. } => files.iter().map(UploadFile::len).sum(),
            _ => 0,
        }
    }
}

fn form_fields(fields: &Map<String, Value>) -> Vec<(String, String)> {
    fields
        .iter()
        .filter_map(|(k, v)| match v {
            Value::Null => None,
            Value::String(s) => Some((k.clone(), s.clone())),
            other => Some((k.clone(), other.to_string())),
        })
        .collect()
}

fn multipart_form(fields: &[(String, String)], files: &[UploadFile], progress: Option<&ProgressFn>) -> Form {
    let total: u64 = files.iter().map(UploadFile::len).sum();
    let mut sent_before = 0u64;

    let mut form = Form::new();
    for (k, v) in fields {
        form = form.text(k.clone(), v.clone());
    }
    for file in files {
        let build = || {
            let part = match progress {
                Some(cb) => streamed_part(file, Arc::clone(cb), sent_before, total),
                None => Part::bytes(file.bytes.clone()),
            };
            part.file_name(file.file_name.clone())
        };
        // An invalid MIME string leaves the part untyped rather than failing the upload.
        let part = match &file.content_type {
            Some(ct) => build().mime_str(ct).unwrap_or_else(|_| build()),
            None => build(),
        };
        form = form.part(file.field.clone(), part);
        sent_before += file.len();
    }
    form
}

fn streamed_part(file: &UploadFile, cb: ProgressFn, offset: u64, total: u64) -> Part {
    let chunks: Vec<Vec<u8>> = file.bytes.chunks(UPLOAD_CHUNK_BYTES).map(<[u8]>::to_vec).collect();
    let mut sent = offset;
    let body = stream::iter(chunks.into_iter().map(move |chunk| {
        sent += chunk.len() as u64;
        cb(Progress { sent, total });
        Ok::<_, std::io::Error>(chunk)
    }));
    Part::stream_with_length(reqwest::Body::wrap_stream(body), file.len())
}

#[cfg(test)]
#[path = "body_test.rs"]
mod tests;
