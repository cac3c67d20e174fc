//! Upload validation.
//!
//! Every upload passes through [`UploadValidator::validate`] before anything
//! else touches it. The size limit is checked first so an oversize file is
//! rejected the same way whatever it contains; the type is then resolved from
//! the file name (falling back to the declared MIME type) and cross-checked
//! against the magic bytes.

use crate::error::ValidationError;

/// The document kinds OCR.Space accepts through this tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Png,
    Jpeg,
    Pdf,
    Docx,
    Doc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Image,
    Pdf,
    Word,
}

impl FileKind {
    pub const ALLOWED_EXTENSIONS: &'static [&'static str] =
        &["png", "jpg", "jpeg", "pdf", "docx", "doc"];

    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_lowercase();
        match essence.as_str() {
            "image/png" => Some(FileKind::Png),
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(FileKind::Jpeg),
            "application/pdf" => Some(FileKind::Pdf),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Some(FileKind::Docx)
            }
            "application/msword" => Some(FileKind::Doc),
            _ => None,
        }
    }

    fn from_file_name(name: &str) -> Option<Self> {
        let ext = name.rsplit_once('.')?.1.to_lowercase();
        if !Self::ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
            return None;
        }
        mime_guess::from_ext(&ext)
            .iter()
            .find_map(|mime| Self::from_mime(mime.essence_str()))
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            FileKind::Png => "image/png",
            FileKind::Jpeg => "image/jpeg",
            FileKind::Pdf => "application/pdf",
            FileKind::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            FileKind::Doc => "application/msword",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            FileKind::Png => "png",
            FileKind::Jpeg => "jpg",
            FileKind::Pdf => "pdf",
            FileKind::Docx => "docx",
            FileKind::Doc => "doc",
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, FileKind::Png | FileKind::Jpeg)
    }

    fn family(&self) -> Family {
        match self {
            FileKind::Png | FileKind::Jpeg => Family::Image,
            FileKind::Pdf => Family::Pdf,
            FileKind::Docx | FileKind::Doc => Family::Word,
        }
    }
}

/// A file that has passed validation. Lives for one request only.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub kind: FileKind,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn mime_type(&self) -> &'static str {
        self.kind.mime_type()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct UploadValidator {
    max_bytes: usize,
}

impl UploadValidator {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub fn validate(
        &self,
        file_name: &str,
        declared_mime: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<UploadedFile, ValidationError> {
        if bytes.len() > self.max_bytes {
            return Err(ValidationError::Oversize {
                size: bytes.len(),
                max: self.max_bytes,
            });
        }
        if bytes.is_empty() {
            return Err(ValidationError::Empty);
        }

        let declared = FileKind::from_file_name(file_name)
            .or_else(|| declared_mime.and_then(FileKind::from_mime))
            .ok_or_else(|| {
                ValidationError::UnsupportedType(format!(
                    "'{file_name}' (allowed: {})",
                    FileKind::ALLOWED_EXTENSIONS.join(", ")
                ))
            })?;

        let kind = reconcile_with_content(declared, &bytes)?;

        tracing::debug!(
            file = file_name,
            size = bytes.len(),
            kind = ?kind,
            "Upload accepted"
        );

        Ok(UploadedFile {
            name: file_name.to_string(),
            kind,
            bytes,
        })
    }
}

/// Cross-check the declared kind against what the magic bytes say.
///
/// A sniffed kind from the same family wins (a PNG saved as `.jpg` is still
/// accepted, as a PNG). A sniffed kind from another family is a mismatch.
/// Undetectable content keeps the declared kind; images that do not decode
/// are caught later by the preprocessor.
fn reconcile_with_content(
    declared: FileKind,
    bytes: &[u8],
) -> Result<FileKind, ValidationError> {
    let Some(sniffed) = infer::get(bytes) else {
        return Ok(declared);
    };

    match FileKind::from_mime(sniffed.mime_type()) {
        Some(actual) if actual.family() == declared.family() => Ok(actual),
        Some(actual) => Err(ValidationError::UnsupportedType(format!(
            "content is {} but the file was declared as {}",
            actual.extension(),
            declared.extension()
        ))),
        None if declared.is_image() => Err(ValidationError::UnsupportedType(format!(
            "content is {} but the file was declared as {}",
            sniffed.mime_type(),
            declared.extension()
        ))),
        None => Ok(declared),
    }
}
