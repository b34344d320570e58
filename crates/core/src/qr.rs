//! Deep-link construction and QR code rendering for spot signs.

use std::io::Cursor;

use image::{ImageFormat, Luma};
use qrcode::{EcLevel, QrCode};

use crate::error::CoreError;
use crate::types::SpotNumber;

/// Pixel size of one QR module in the rendered PNG.
pub const MODULE_PIXELS: u32 = 20;

/// Build the front-end deep-link that opens the check-in flow for a spot.
///
/// A trailing slash on `base_url` is ignored.
///
/// ```
/// use parking_core::qr::checkin_link;
///
/// assert_eq!(
///     checkin_link("https://park.example.com/", 7),
///     "https://park.example.com/vaga/7?action=checkin"
/// );
/// ```
pub fn checkin_link(base_url: &str, number: SpotNumber) -> String {
    format!("{}/vaga/{number}?action=checkin", base_url.trim_end_matches('/'))
}

/// Encode `data` as a QR code (error correction level Q) and return PNG bytes.
pub fn render_png(data: &str) -> Result<Vec<u8>, CoreError> {
    let code = QrCode::with_error_correction_level(data.as_bytes(), EcLevel::Q)
        .map_err(|e| CoreError::Internal(format!("QR encoding failed: {e}")))?;

    let image = code
        .render::<Luma<u8>>()
        .module_dimensions(MODULE_PIXELS, MODULE_PIXELS)
        .build();

    let mut buf = Cursor::new(Vec::new());
    image
        .write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| CoreError::Internal(format!("PNG encoding failed: {e}")))?;

    Ok(buf.into_inner())
}
