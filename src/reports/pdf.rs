use std::sync::Arc;

/// Renders plain lines of text into a PDF document.
pub trait PdfRenderer: Send + Sync {
    fn render_lines(&self, title: &str, lines: &[String]) -> anyhow::Result<Vec<u8>>;
}

/// The renderer compiled into this build, if any.
pub fn default_renderer() -> Option<Arc<dyn PdfRenderer>> {
    #[cfg(feature = "pdf")]
    {
        Some(Arc::new(TextPdf) as Arc<dyn PdfRenderer>)
    }
    #[cfg(not(feature = "pdf"))]
    {
        None
    }
}

#[cfg(feature = "pdf")]
pub use text::TextPdf;

#[cfg(feature = "pdf")]
mod text {
    use printpdf::{BuiltinFont, Mm, PdfDocument};

    use super::PdfRenderer;

    // US Letter, 12pt Helvetica, first baseline 40pt in and 42pt down.
    const PAGE_WIDTH: Mm = Mm(215.9);
    const PAGE_HEIGHT: Mm = Mm(279.4);
    const LEFT: Mm = Mm(14.1);
    const TOP: Mm = Mm(264.6);
    const FONT_SIZE: f32 = 12.0;
    const LINE_HEIGHT: f32 = 14.0;

    /// Single-page text document built with `printpdf`.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct TextPdf;

    impl PdfRenderer for TextPdf {
        fn render_lines(&self, title: &str, lines: &[String]) -> anyhow::Result<Vec<u8>> {
            let (doc, page, layer) = PdfDocument::new(title, PAGE_WIDTH, PAGE_HEIGHT, "text");
            let font = doc
                .add_builtin_font(BuiltinFont::Helvetica)
                .map_err(|e| anyhow::anyhow!("load pdf font: {e:?}"))?;
            let layer = doc.get_page(page).get_layer(layer);

            layer.begin_text_section();
            layer.set_font(&font, FONT_SIZE);
            layer.set_text_cursor(LEFT, TOP);
            layer.set_line_height(LINE_HEIGHT);
            for line in lines {
                layer.write_text(line.clone(), &font);
                layer.add_line_break();
            }
            layer.end_text_section();

            doc.save_to_bytes()
                .map_err(|e| anyhow::anyhow!("write pdf: {e:?}"))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn produces_a_pdf_document() {
            let bytes = TextPdf
                .render_lines("summary", &["first".into(), String::new(), "third".into()])
                .unwrap();
            assert!(bytes.starts_with(b"%PDF"));
        }
    }
}
