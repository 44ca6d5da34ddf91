//! Multipart photo uploads shared by submission and resolution endpoints.

use axum::extract::Multipart;
use std::collections::HashMap;
use tracing::debug;

use crate::core::error::AppError;
use crate::shared::constants::{ALLOWED_PHOTO_MIME_TYPES, MAX_PHOTO_SIZE};
use crate::shared::validation::{is_allowed_photo_type, photo_extension};

/// A photo that passed size and type checks
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub data: Vec<u8>,
    pub content_type: String,
}

impl PhotoUpload {
    pub fn new(data: Vec<u8>, content_type: &str) -> Result<Self, AppError> {
        let content_type = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase();

        if data.is_empty() {
            return Err(AppError::BadRequest("Photo is empty".to_string()));
        }

        if data.len() > MAX_PHOTO_SIZE {
            return Err(AppError::BadRequest(format!(
                "Photo too large. Maximum size is {} MB",
                MAX_PHOTO_SIZE / 1024 / 1024
            )));
        }

        if !is_allowed_photo_type(&content_type) {
            return Err(AppError::BadRequest(format!(
                "Photo type '{}' is not allowed. Allowed types: {}",
                content_type,
                ALLOWED_PHOTO_MIME_TYPES.join(", ")
            )));
        }

        Ok(Self { data, content_type })
    }

    pub fn extension(&self) -> &'static str {
        photo_extension(&self.content_type)
    }
}

/// Fields of a multipart form carrying one `photo` part
#[derive(Debug, Default)]
pub struct PhotoForm {
    photo: Option<(Vec<u8>, String)>,
    fields: HashMap<String, String>,
}

impl PhotoForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = PhotoForm::default();

        while let Some(field) = multipart.next_field().await.map_err(|e| {
            debug!("Failed to read multipart field: {}", e);
            AppError::BadRequest(format!("Failed to read multipart data: {}", e))
        })? {
            let name = field.name().unwrap_or_default().to_string();

            if name == "photo" {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read photo data: {}", e))
                })?;
                form.photo = Some((data.to_vec(), content_type));
            } else if !name.is_empty() {
                let text = field.text().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read field '{}': {}", name, e))
                })?;
                form.fields.insert(name, text);
            }
        }

        Ok(form)
    }

    /// The uploaded photo, validated
    pub fn take_photo(&mut self) -> Result<PhotoUpload, AppError> {
        let (data, content_type) = self
            .photo
            .take()
            .ok_or_else(|| AppError::BadRequest("Photo is required".to_string()))?;
        PhotoUpload::new(data, &content_type)
    }

    /// A required numeric text field
    pub fn number(&self, name: &str) -> Result<f64, AppError> {
        let raw = self
            .fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::BadRequest(format!("{} is required", name)))?;

        raw.parse::<f64>()
            .map_err(|_| AppError::BadRequest(format!("{} must be a number", name)))
    }
}
