//! PDF 渲染 - 业务能力层
//!
//! 用 pdfium 把 PDF 逐页渲染为 PNG，供视觉模型 OCR。
//! pdfium 的句柄不能跨线程，整个渲染放在 `spawn_blocking` 里完成。

use std::io::Cursor;

use anyhow::{Context, Result};
use image::{ImageFormat, RgbaImage};
use pdfium_render::prelude::*;
use tracing::debug;

/// 渲染分辨率
pub const RENDER_DPI: f32 = 200.0;

fn bind_pdfium() -> Result<Pdfium> {
    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .context("无法加载 pdfium 动态库")?;
    Ok(Pdfium::new(bindings))
}

fn render_page_to_png(page: &PdfPage) -> Result<Vec<u8>> {
    let scale = RENDER_DPI / 72.0;
    let pixel_width = (page.width().value * scale) as i32;
    let pixel_height = (page.height().value * scale) as i32;

    let bitmap = page
        .render_with_config(
            &PdfRenderConfig::new()
                .set_target_width(pixel_width)
                .set_target_height(pixel_height)
                .render_form_data(true)
                .render_annotations(true),
        )
        .context("PDF 页面渲染失败")?;

    let width = bitmap.width() as u32;
    let height = bitmap.height() as u32;
    let rgba = RgbaImage::from_raw(width, height, bitmap.as_rgba_bytes())
        .context("位图尺寸与像素数据不一致")?;

    let mut png = Vec::new();
    rgba.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .context("PNG 编码失败")?;
    Ok(png)
}

fn render_blocking(pdf_bytes: &[u8]) -> Result<Vec<Vec<u8>>> {
    let pdfium = bind_pdfium()?;
    let document = pdfium
        .load_pdf_from_byte_slice(pdf_bytes, None)
        .context("无法打开 PDF")?;

    let page_count = document.pages().len();
    debug!("PDF 共 {} 页，开始渲染", page_count);

    document
        .pages()
        .iter()
        .map(|page| render_page_to_png(&page))
        .collect()
}

/// 把 PDF 每一页渲染为 PNG 字节，顺序与页序一致
pub async fn render_pdf_pages(pdf_bytes: Vec<u8>) -> Result<Vec<Vec<u8>>> {
    tokio::task::spawn_blocking(move || render_blocking(&pdf_bytes))
        .await
        .context("PDF 渲染任务异常退出")?
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 需要本机安装 pdfium 动态库
    ///
    /// 运行方式：
    /// ```bash
    /// cargo test test_render_rejects_garbage -- --ignored
    /// ```
    #[tokio::test]
    #[ignore]
    async fn test_render_rejects_garbage() {
        assert!(render_pdf_pages(b"%PDF-garbage".to_vec()).await.is_err());
    }
}
