//! 上传文件处理 - 业务能力层
//!
//! 校验扩展名，展开 ZIP，扫描输入目录。

use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{debug, info};

use crate::error::IntakeError;

/// 可直接 OCR 的扩展名
pub const VALID_EXTENSIONS: [&str; 4] = ["pdf", "png", "jpg", "jpeg"];

/// 小写扩展名（不含点），没有扩展名时返回空串
pub fn extension_of(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default()
}

/// 扩展名是否在白名单内（不区分大小写）
pub fn validate_file_type(file_name: &str) -> bool {
    VALID_EXTENSIONS.contains(&extension_of(file_name).as_str())
}

/// 展开 ZIP，只保留白名单内的文件
///
/// 只要出现目录条目就整体报错，不返回任何部分结果。
pub fn extract_zip(file_name: &str, zip_bytes: &[u8]) -> Result<Vec<(String, Vec<u8>)>, IntakeError> {
    let unreadable = |source: zip::result::ZipError| IntakeError::ZipUnreadable {
        file_name: file_name.to_string(),
        source,
    };

    let mut archive = zip::ZipArchive::new(Cursor::new(zip_bytes)).map_err(unreadable)?;
    let mut files = Vec::new();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(unreadable)?;
        let entry_name = entry.name().to_string();

        if entry.is_dir() || entry_name.contains('/') {
            return Err(IntakeError::ZipContainsDirectory {
                file_name: file_name.to_string(),
                entry: entry_name,
            });
        }

        if !validate_file_type(&entry_name) {
            debug!("跳过 ZIP 内不支持的文件: {}", entry_name);
            continue;
        }

        // 条目头声明的大小不可信，不据此预分配
        let mut bytes = Vec::new();
        entry
            .read_to_end(&mut bytes)
            .map_err(|e| unreadable(zip::result::ZipError::Io(e)))?;
        files.push((entry_name, bytes));
    }

    Ok(files)
}

/// 处理一个上传文件
///
/// - ZIP：展开
/// - pdf/png/jpg/jpeg：原样返回
/// - 其他：`UnsupportedFormat`
pub fn process_uploaded_file(
    file_name: &str,
    file_bytes: Vec<u8>,
) -> Result<Vec<(String, Vec<u8>)>, IntakeError> {
    let extension = extension_of(file_name);

    if extension == "zip" {
        return extract_zip(file_name, &file_bytes);
    }

    if validate_file_type(file_name) {
        return Ok(vec![(file_name.to_string(), file_bytes)]);
    }

    Err(IntakeError::UnsupportedFormat {
        file_name: file_name.to_string(),
        extension,
    })
}

/// 读取输入目录下的所有文件（不递归），按文件名排序
pub async fn scan_input_folder(folder_path: &str) -> Result<Vec<(String, Vec<u8>)>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        anyhow::bail!("文件夹不存在: {}", folder_path);
    }

    let mut paths = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path))?;

    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            paths.push(entry.path());
        }
    }
    paths.sort();

    let mut uploads = Vec::with_capacity(paths.len());
    for path in paths {
        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let bytes = fs::read(&path)
            .await
            .map_err(|source| IntakeError::ReadFailed {
                path: path.display().to_string(),
                source,
            })?;
        uploads.push((name, bytes));
    }

    info!("✓ 在 {} 中找到 {} 个文件", folder_path, uploads.len());
    Ok(uploads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn build_zip(entries: &[(&str, &[u8])], dirs: &[&str]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        for dir in dirs {
            writer.add_directory(*dir, options).unwrap();
        }
        for (name, bytes) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(bytes).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_validate_file_type_is_case_insensitive() {
        assert!(validate_file_type("scan.PDF"));
        assert!(validate_file_type("photo.JpEg"));
        assert!(!validate_file_type("notes.txt"));
        assert!(!validate_file_type("no_extension"));
        assert!(!validate_file_type("archive.zip"));
    }

    #[test]
    fn test_extract_zip_keeps_valid_entries_in_order() {
        let bytes = build_zip(
            &[("b.png", &b"png"[..]), ("readme.txt", &b"skip"[..]), ("a.pdf", &b"pdf"[..])],
            &[],
        );
        let files = extract_zip("batch.zip", &bytes).unwrap();

        let names: Vec<&str> = files.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["b.png", "a.pdf"]);
        assert_eq!(files[1].1, b"pdf".to_vec());
    }

    #[test]
    fn test_extract_zip_rejects_directories() {
        let bytes = build_zip(&[("a.pdf", &b"pdf"[..])], &["scans/"]);
        let err = extract_zip("batch.zip", &bytes).unwrap_err();
        assert!(matches!(err, IntakeError::ZipContainsDirectory { .. }));

        let nested = build_zip(&[("a.pdf", &b"pdf"[..]), ("inner/b.pdf", &b"pdf"[..])], &[]);
        assert!(matches!(
            extract_zip("nested.zip", &nested),
            Err(IntakeError::ZipContainsDirectory { .. })
        ));
    }

    #[test]
    fn test_extract_zip_rejects_garbage() {
        assert!(matches!(
            extract_zip("broken.zip", &b"not a zip"[..]),
            Err(IntakeError::ZipUnreadable { .. })
        ));
    }

    /// 把中央目录里第一个条目声明的解压大小改成 `size`
    fn forge_declared_size(mut zip_bytes: Vec<u8>, size: u32) -> Vec<u8> {
        let header = zip_bytes
            .windows(4)
            .position(|w| w == b"PK\x01\x02")
            .unwrap();
        zip_bytes[header + 24..header + 28].copy_from_slice(&size.to_le_bytes());
        zip_bytes
    }

    #[test]
    fn test_extract_zip_ignores_declared_entry_size() {
        let bytes = forge_declared_size(build_zip(&[("a.png", &b"png"[..])], &[]), 0x7FFF_FFFF);

        match extract_zip("forged.zip", &bytes) {
            Ok(files) => assert_eq!(files, vec![("a.png".to_string(), b"png".to_vec())]),
            Err(IntakeError::ZipUnreadable { .. }) => {}
            Err(other) => panic!("意外的错误: {other}"),
        }
    }

    #[test]
    fn test_process_uploaded_file_dispatch() {
        let passthrough = process_uploaded_file("a.jpg", b"img".to_vec()).unwrap();
        assert_eq!(passthrough, vec![("a.jpg".to_string(), b"img".to_vec())]);

        let zipped = build_zip(&[("x.png", &b"x"[..])], &[]);
        let exploded = process_uploaded_file("batch.ZIP", zipped).unwrap();
        assert_eq!(exploded.len(), 1);

        let err = process_uploaded_file("essay.docx", Vec::new()).unwrap_err();
        match err {
            IntakeError::UnsupportedFormat { extension, .. } => assert_eq!(extension, "docx"),
            other => panic!("意外的错误: {other}"),
        }
    }

    #[tokio::test]
    async fn test_scan_input_folder_sorted_by_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.png"), b"b").unwrap();
        std::fs::write(dir.path().join("a.pdf"), b"a").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let uploads = scan_input_folder(dir.path().to_str().unwrap()).await.unwrap();
        let names: Vec<&str> = uploads.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["a.pdf", "b.png"]);
    }

    #[tokio::test]
    async fn test_scan_missing_folder_fails() {
        assert!(scan_input_folder("/definitely/not/here").await.is_err());
    }
}
