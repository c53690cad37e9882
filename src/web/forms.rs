//! Request bodies shared by several handlers.

use crate::{errors::Result, storage::Upload};
use axum::extract::Multipart;
use std::collections::HashMap;

/// A multipart body split into text fields and file parts.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: HashMap<String, Upload>,
}

impl MultipartForm {
    /// Reads the whole body. Parts with a filename are treated as files.
    pub async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            if let Some(filename) = field.file_name().map(str::to_string) {
                let bytes = field.bytes().await?.to_vec();
                form.files.insert(name, Upload { filename, bytes });
            } else {
                form.fields.insert(name, field.text().await?);
            }
        }
        Ok(form)
    }

    /// Text value of `name`, if present.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Removes and returns the file part `name`. Empty parts count as absent.
    pub fn take_file(&mut self, name: &str) -> Option<Upload> {
        self.files.remove(name).filter(|upload| !upload.is_empty())
    }
}
