//! Pulls employee fields and the optional profile picture out of a multipart body.

use crate::domain::employee::{Address, EmployeeForm};
use crate::infrastructure::uploads::{MAX_IMAGE_BYTES, PROFILE_PICTURE_FIELD, UploadedImage};
use crate::presentation::handlers::ApiError;
use actix_multipart::{Field, Multipart, MultipartError};
use futures_util::TryStreamExt;
use tracing::{debug, trace};

const MAX_TEXT_FIELD_BYTES: usize = 64 * 1024;

pub struct EmployeeSubmission {
    pub form: EmployeeForm,
    pub image: Option<UploadedImage>,
}

fn bad_multipart(err: MultipartError) -> ApiError {
    ApiError::Validation(format!("Invalid multipart request: {}", err))
}

pub async fn read_employee_form(mut payload: Multipart) -> Result<EmployeeSubmission, ApiError> {
    let mut form = EmployeeForm::default();
    let mut image: Option<UploadedImage> = None;

    while let Some(mut field) = payload.try_next().await.map_err(bad_multipart)? {
        let name = field.name().unwrap_or_default().to_string();
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);

        match filename {
            // an untouched file input still submits a part, with no filename and no content
            Some(original_name) if original_name.is_empty() => {
                drain(&mut field).await?;
                debug!(field = %name, "Skipping file part without a filename");
            }
            Some(original_name) => {
                if name != PROFILE_PICTURE_FIELD || image.is_some() {
                    return Err(ApiError::Validation(format!("Unexpected field: {}", name)));
                }
                let content_type = field
                    .content_type()
                    .map(|mime| mime.essence_str().to_string())
                    .unwrap_or_default();
                let data = read_limited(&mut field, MAX_IMAGE_BYTES, "File too large").await?;
                trace!(original_name = %original_name, size = data.len(), "Read file part");
                image = Some(UploadedImage {
                    field_name: name,
                    original_name,
                    content_type,
                    data,
                });
            }
            None => {
                let raw =
                    read_limited(&mut field, MAX_TEXT_FIELD_BYTES, "Field value too large").await?;
                let value = String::from_utf8(raw)
                    .map_err(|_| ApiError::Validation(format!("{} must be valid UTF-8", name)))?;
                apply_text_field(&mut form, &name, value.trim().to_string())?;
            }
        }
    }

    Ok(EmployeeSubmission { form, image })
}

async fn read_limited(
    field: &mut Field,
    limit: usize,
    too_large: &str,
) -> Result<Vec<u8>, ApiError> {
    let mut data = Vec::new();
    while let Some(chunk) = field.try_next().await.map_err(bad_multipart)? {
        if data.len() + chunk.len() > limit {
            return Err(ApiError::Validation(too_large.to_string()));
        }
        data.extend_from_slice(&chunk);
    }
    Ok(data)
}

async fn drain(field: &mut Field) -> Result<(), ApiError> {
    while field.try_next().await.map_err(bad_multipart)?.is_some() {}
    Ok(())
}

/// Accepts `address` as a JSON object, or one component at a time as
/// `address[postalCode]` / `address.postalCode`.
fn apply_text_field(form: &mut EmployeeForm, name: &str, value: String) -> Result<(), ApiError> {
    match name {
        "firstName" => form.first_name = Some(value),
        "lastName" => form.last_name = Some(value),
        "email" => form.email = Some(value),
        "phoneNumber" => form.phone_number = Some(value),
        "jobTitle" => form.job_title = Some(value),
        "department" => form.department = Some(value),
        "address" => {
            if !value.is_empty() {
                form.address = serde_json::from_str::<Address>(&value).map_err(|_| {
                    ApiError::Validation("address must be a JSON object".to_string())
                })?;
            }
        }
        _ => match address_component(name) {
            Some(key) if !value.is_empty() => {
                if !form.address.set_component(key, value) {
                    debug!(field = name, "Ignoring unknown address component");
                }
            }
            Some(_) => {}
            None => debug!(field = name, "Ignoring unknown form field"),
        },
    }
    Ok(())
}

fn address_component(name: &str) -> Option<&str> {
    name.strip_prefix("address[")
        .and_then(|rest| rest.strip_suffix(']'))
        .or_else(|| name.strip_prefix("address."))
}
