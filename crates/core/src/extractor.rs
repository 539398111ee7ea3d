use crate::error::IngestError;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub number: u32,
    pub text: String,
}

/// Backend that turns a PDF file into per-page text.
pub trait PdfExtractor {
    fn extract_pages(&self, path: &Path) -> Result<Vec<PageText>, IngestError>;
}

#[cfg(feature = "pdf")]
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfExtractor;

#[cfg(feature = "pdf")]
impl PdfExtractor for LopdfExtractor {
    /// Pages come back in page order, blank pages included.
    fn extract_pages(&self, path: &Path) -> Result<Vec<PageText>, IngestError> {
        let document = lopdf::Document::load(path)
            .map_err(|error| IngestError::Parse(format!("{}: {error}", path.display())))?;

        let mut pages = Vec::new();
        for page_no in document.get_pages().into_keys() {
            let text = document.extract_text(&[page_no]).map_err(|error| {
                IngestError::Parse(format!("{} page {page_no}: {error}", path.display()))
            })?;

            pages.push(PageText {
                number: page_no,
                text,
            });
        }

        if pages.is_empty() {
            return Err(IngestError::Parse(format!(
                "pdf has no pages: {}",
                path.display()
            )));
        }

        Ok(pages)
    }
}

/// The extractor compiled into this build, if any.
pub fn default_pdf_extractor() -> Option<Box<dyn PdfExtractor>> {
    #[cfg(feature = "pdf")]
    {
        Some(Box::new(LopdfExtractor))
    }

    #[cfg(not(feature = "pdf"))]
    {
        None
    }
}

#[cfg(all(test, feature = "pdf"))]
pub(crate) mod test_support {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};
    use std::path::Path;

    /// Writes a minimal PDF with one Courier text line per page.
    pub fn write_pdf(path: &Path, pages: &[&str]) -> Result<(), Box<dyn std::error::Error>> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });

        let mut kids = Vec::new();
        for text in pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![100.into(), 600.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(Object::from(page_id));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path)?;
        Ok(())
    }
}
