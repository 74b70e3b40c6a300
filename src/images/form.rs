use std::collections::HashMap;

use axum::extract::Multipart;

use super::services::UploadItem;
use crate::error::{AppError, AppResult};

/// Multipart body split into text fields (repeatable) and file fields.
#[derive(Debug, Default)]
pub struct FormData {
    texts: HashMap<String, Vec<String>>,
    files: HashMap<String, UploadItem>,
}

impl FormData {
    pub async fn from_multipart(mut mp: Multipart) -> AppResult<Self> {
        let mut form = FormData::default();
        while let Some(field) = mp
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("malformed multipart body: {}", e)))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            let is_file = field.file_name().is_some();
            let content_type = field
                .content_type()
                .map(str::to_string)
                .unwrap_or_else(|| "application/octet-stream".into());
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("unreadable field {}: {}", name, e)))?;

            if is_file {
                // browsers send an empty part for an untouched file input
                if !data.is_empty() {
                    form.files.insert(
                        name,
                        UploadItem {
                            body: data,
                            content_type,
                        },
                    );
                }
            } else {
                let value = String::from_utf8(data.to_vec())
                    .map_err(|_| AppError::Validation(format!("field {} is not UTF-8", name)))?;
                form.texts.entry(name).or_default().push(value);
            }
        }
        Ok(form)
    }

    /// Last value sent for `name`.
    pub fn text(&self, name: &str) -> Option<String> {
        self.texts.get(name).and_then(|v| v.last().cloned())
    }

    /// Every value sent for `name`, blanks dropped; `None` if the key never appeared.
    pub fn list(&self, name: &str) -> Option<Vec<String>> {
        self.texts.get(name).map(|values| {
            values
                .iter()
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect()
        })
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadItem> {
        self.files.remove(name)
    }

    /// Like `text` but a missing or blank value is a validation error.
    pub fn required(&self, name: &str) -> AppResult<String> {
        match self.text(name) {
            Some(v) if !v.trim().is_empty() => Ok(v),
            _ => Err(AppError::Validation(format!("field {} is required", name))),
        }
    }

    #[cfg(test)]
    pub fn push_text(&mut self, name: &str, value: &str) {
        self.texts
            .entry(name.to_string())
            .or_default()
            .push(value.to_string());
    }

    #[cfg(test)]
    pub fn put_file(&mut self, name: &str, item: UploadItem) {
        self.files.insert(name.to_string(), item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_keeps_order_and_drops_blanks() {
        let mut form = FormData::default();
        form.push_text("tags", "rust");
        form.push_text("tags", " ");
        form.push_text("tags", "web");
        assert_eq!(form.list("tags"), Some(vec!["rust".into(), "web".into()]));
        assert_eq!(form.list("missing"), None);
    }

    #[test]
    fn required_rejects_blank() {
        let mut form = FormData::default();
        form.push_text("title", "   ");
        assert!(matches!(form.required("title"), Err(AppError::Validation(_))));
        assert!(matches!(form.required("content"), Err(AppError::Validation(_))));
    }
}
