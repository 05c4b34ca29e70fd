use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::ApiError;

/// Encodes `buffer` as a `data:<mime>;base64,<payload>` URI.
pub fn encode(buffer: &[u8], mime_type: &str) -> Result<String, ApiError> {
    let mime_type = mime_type.trim();
    if mime_type.is_empty() {
        return Err(ApiError::InvalidInput("File MIME type is not provided".to_string()));
    }
    if buffer.is_empty() {
        return Err(ApiError::InvalidInput("File buffer is empty".to_string()));
    }

    Ok(format!("data:{};base64,{}", mime_type, STANDARD.encode(buffer)))
}
