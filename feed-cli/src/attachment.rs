use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use mime_guess::mime;

/// Предельный размер вложения до кодирования.
pub(crate) const MAX_ATTACHMENT_BYTES: u64 = 2_000_000;

/// Читает картинку и возвращает её как data-URL.
///
/// Тип определяется по расширению; всё, что не `image/*`, отклоняется.
pub(crate) fn read_data_url(path: &Path) -> Result<String> {
    let Some(media_type) = mime_guess::from_path(path)
        .first()
        .filter(|guess| guess.type_() == mime::IMAGE)
    else {
        bail!("Only images are allowed: {}", path.display());
    };

    let size = fs::metadata(path)
        .with_context(|| format!("не удалось прочитать {}", path.display()))?
        .len();
    if size > MAX_ATTACHMENT_BYTES {
        bail!("File exceeds 2MB: {}", path.display());
    }

    let bytes = fs::read(path).with_context(|| format!("не удалось прочитать {}", path.display()))?;
    Ok(encode_data_url(&bytes, media_type.essence_str()))
}

pub(crate) fn encode_data_url(bytes: &[u8], mime: &str) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}
