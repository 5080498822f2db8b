//! Reading and writing permission export files.
//!
//! Exports arrive as UTF-16 (either byte order, with BOM) or UTF-8. Output is
//! always UTF-16LE with a BOM so the restore side reads it unchanged.

use crate::config::LineEnding;
use migrate_core::error::AppError;
use std::path::Path;

const UTF16_LE_BOM: [u8; 2] = [0xFF, 0xFE];
const UTF16_BE_BOM: [u8; 2] = [0xFE, 0xFF];
const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

pub fn decode_export(bytes: &[u8]) -> Result<String, AppError> {
    if let Some(body) = bytes.strip_prefix(&UTF16_LE_BOM) {
        decode_utf16(body, u16::from_le_bytes)
    } else if let Some(body) = bytes.strip_prefix(&UTF16_BE_BOM) {
        decode_utf16(body, u16::from_be_bytes)
    } else {
        let body = bytes.strip_prefix(&UTF8_BOM).unwrap_or(bytes);
        String::from_utf8(body.to_vec())
            .map_err(|e| AppError::input_format(format!("Export is not valid UTF-8: {}", e)))
    }
}

fn decode_utf16(body: &[u8], unit: fn([u8; 2]) -> u16) -> Result<String, AppError> {
    if body.len() % 2 != 0 {
        return Err(AppError::input_format(
            "UTF-16 export has an odd number of bytes",
        ));
    }
    let units: Vec<u16> = body
        .chunks_exact(2)
        .map(|pair| unit([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units)
        .map_err(|e| AppError::input_format(format!("Export is not valid UTF-16: {}", e)))
}

/// Split decoded text into trimmed lines, dropping trailing blank lines.
pub fn split_lines(text: &str) -> Vec<String> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines: Vec<String> = text.lines().map(|l| l.trim().to_string()).collect();
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines
}

/// UTF-16LE with BOM, `\n` replaced by `line_ending`.
pub fn encode_export(text: &str, line_ending: LineEnding) -> Vec<u8> {
    let text = text.replace('\n', line_ending.as_str());
    let mut bytes = Vec::with_capacity(2 + text.len() * 2);
    bytes.extend_from_slice(&UTF16_LE_BOM);
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    bytes
}

pub async fn load_export(path: &Path) -> Result<Vec<String>, AppError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        AppError::input_format(format!("Failed to read {}: {}", path.display(), e))
    })?;

    let lines = split_lines(&decode_export(&bytes)?);
    if lines.is_empty() {
        return Err(AppError::input_format(format!(
            "{} contains no permission records",
            path.display()
        )));
    }

    tracing::info!(path = %path.display(), lines = lines.len(), "Loaded permission export");
    Ok(lines)
}

pub async fn write_export(path: &Path, text: &str, line_ending: LineEnding) -> Result<(), AppError> {
    let bytes = encode_export(text, line_ending);
    tokio::fs::write(path, &bytes).await?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "Wrote permission export");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16le(text: &str) -> Vec<u8> {
        encode_export(text, LineEnding::Lf)
    }

    #[test]
    fn test_decode_utf16_le_and_be() {
        assert_eq!(decode_export(&utf16le("C:\\A\n")).unwrap(), "C:\\A\n");

        let mut be = UTF16_BE_BOM.to_vec();
        for unit in "D:(A;;FA;;;SY)".encode_utf16() {
            be.extend_from_slice(&unit.to_be_bytes());
        }
        assert_eq!(decode_export(&be).unwrap(), "D:(A;;FA;;;SY)");
    }

    #[test]
    fn test_decode_utf8_with_and_without_bom() {
        assert_eq!(decode_export(b"\xEF\xBB\xBFC:\\A").unwrap(), "C:\\A");
        assert_eq!(decode_export(b"C:\\A").unwrap(), "C:\\A");
    }

    #[test]
    fn test_odd_utf16_length_is_rejected() {
        let err = decode_export(&[0xFF, 0xFE, 0x41]).unwrap_err();
        assert!(matches!(err, AppError::InputFormat(_)));
    }

    #[test]
    fn test_split_lines_trims_and_drops_trailing_blanks() {
        let lines = split_lines("\u{feff}C:\\A  \r\nD:(A;;FA;;;SY)\r\n\r\n\r\n");
        assert_eq!(lines, vec!["C:\\A", "D:(A;;FA;;;SY)"]);
    }

    #[test]
    fn test_encode_uses_crlf_and_bom() {
        let bytes = encode_export("A\n", LineEnding::CrLf);
        assert_eq!(bytes, vec![0xFF, 0xFE, b'A', 0, b'\r', 0, b'\n', 0]);
    }

    #[tokio::test]
    async fn test_load_rejects_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        tokio::fs::write(&path, utf16le("\n\n")).await.unwrap();

        let err = load_export(&path).await.unwrap_err();
        assert!(matches!(err, AppError::InputFormat(_)));
    }

    #[tokio::test]
    async fn test_written_export_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        write_export(&path, "C:\\A\nD:(A;;FA;;;SY)\n", LineEnding::CrLf)
            .await
            .unwrap();

        let lines = load_export(&path).await.unwrap();
        assert_eq!(lines, vec!["C:\\A", "D:(A;;FA;;;SY)"]);
    }
}
