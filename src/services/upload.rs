// src/services/upload.rs

use crate::{
    config::DEFAULT_MAX_UPLOAD_LIMIT,
    error::AppError,
    models::ad::{AdFormScaffold, Asset},
    utils::humanize::natural_size,
};

/// Form field the picture is submitted under.
pub const PICTURE_FIELD: &str = "picture";

/// A file part as received from the client, fully buffered.
#[derive(Debug, Clone, Default)]
pub struct Upload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Checks inbound pictures against the configured size cap.
///
/// Pure: nothing is persisted here, the accepted `Asset` is handed back to
/// the caller.
#[derive(Debug, Clone, Copy)]
pub struct UploadValidator {
    max_upload_limit: usize,
}

impl Default for UploadValidator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UPLOAD_LIMIT)
    }
}

impl UploadValidator {
    pub fn new(max_upload_limit: usize) -> Self {
        Self { max_upload_limit }
    }

    pub fn max_upload_limit(&self) -> usize {
        self.max_upload_limit
    }

    /// The cap rendered for people, e.g. "2.0MB".
    pub fn limit_text(&self) -> String {
        natural_size(self.max_upload_limit as u64)
    }

    pub fn scaffold(&self) -> AdFormScaffold {
        AdFormScaffold {
            max_upload_limit: self.max_upload_limit,
            max_upload_limit_text: self.limit_text(),
            picture_label: format!("File to Upload <= {}", self.limit_text()),
        }
    }

    /// `Ok(None)` means the ad's picture is left as it is.
    pub fn validate(&self, upload: Option<Upload>) -> Result<Option<Asset>, AppError> {
        let Some(upload) = upload else {
            return Ok(None);
        };

        if upload.bytes.is_empty() {
            // Browsers send an empty, unnamed part when no file was chosen.
            return match upload.file_name.as_deref() {
                None | Some("") => Ok(None),
                Some(_) => Err(AppError::validation(
                    PICTURE_FIELD,
                    "The submitted file is empty.",
                )),
            };
        }

        if upload.bytes.len() > self.max_upload_limit {
            return Err(AppError::validation(
                PICTURE_FIELD,
                format!("File must be < {} bytes", self.limit_text()),
            ));
        }

        let content_type = upload
            .content_type
            .as_deref()
            .and_then(|raw| raw.parse::<mime::Mime>().ok())
            .unwrap_or(mime::APPLICATION_OCTET_STREAM)
            .to_string();

        Ok(Some(Asset {
            bytes: upload.bytes,
            content_type,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(len: usize, content_type: &str) -> Upload {
        Upload {
            file_name: Some("photo.png".to_string()),
            content_type: Some(content_type.to_string()),
            bytes: vec![7; len],
        }
    }

    #[test]
    fn missing_upload_is_accepted_without_change() {
        let validator = UploadValidator::new(10);
        assert!(validator.validate(None).unwrap().is_none());
    }

    #[test]
    fn accepts_up_to_and_including_the_limit() {
        let validator = UploadValidator::new(1024);
        for len in [1, 512, 1023, 1024] {
            let asset = validator.validate(Some(upload(len, "image/png"))).unwrap().unwrap();
            assert_eq!(asset.bytes.len(), len);
            assert_eq!(asset.content_type, "image/png");
        }
    }

    #[test]
    fn rejects_one_byte_over_the_limit() {
        let validator = UploadValidator::new(1024);
        match validator.validate(Some(upload(1025, "image/png"))) {
            Err(AppError::Validation { field, message }) => {
                assert_eq!(field, "picture");
                assert_eq!(message, "File must be < 1.0KB bytes");
            }
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn default_limit_message_mentions_two_megabytes() {
        let validator = UploadValidator::default();
        let err = validator
            .validate(Some(upload(DEFAULT_MAX_UPLOAD_LIMIT + 1, "image/jpeg")))
            .unwrap_err();
        assert!(err.to_string().contains("2.0MB"));
        assert!(validator
            .validate(Some(upload(DEFAULT_MAX_UPLOAD_LIMIT, "image/jpeg")))
            .is_ok());
    }

    #[test]
    fn empty_named_file_is_rejected_but_empty_part_is_ignored() {
        let validator = UploadValidator::new(10);
        assert!(validator.validate(Some(upload(0, "image/png"))).is_err());
        assert!(validator
            .validate(Some(Upload::default()))
            .unwrap()
            .is_none());
    }

    #[test]
    fn unknown_content_type_falls_back_to_octet_stream() {
        let validator = UploadValidator::new(10);
        let mut raw = upload(3, "not a mime");
        let asset = validator.validate(Some(raw.clone())).unwrap().unwrap();
        assert_eq!(asset.content_type, "application/octet-stream");

        raw.content_type = None;
        let asset = validator.validate(Some(raw)).unwrap().unwrap();
        assert_eq!(asset.content_type, "application/octet-stream");
    }

    #[test]
    fn scaffold_label_uses_human_size() {
        let scaffold = UploadValidator::default().scaffold();
        assert_eq!(scaffold.max_upload_limit, 2_097_152);
        assert_eq!(scaffold.picture_label, "File to Upload <= 2.0MB");
    }
}
