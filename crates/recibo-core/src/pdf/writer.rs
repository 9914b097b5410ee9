//! Writing split and merged PDFs.

use std::collections::BTreeMap;
use std::path::Path;

use lopdf::{Document, Object, ObjectId};
use tracing::debug;

use super::Result;
use crate::error::PdfError;

/// Copies an inclusive page range of `source` into a new single document.
///
/// The source is cloned and every page outside the range is deleted; the
/// object table is pruned and renumbered so the output carries no dead
/// weight from the other pages.
pub fn extract_pages(source: &Document, start: usize, end: usize) -> Result<Document> {
    let total = source.get_pages().len();
    if start > end || end >= total {
        return Err(PdfError::InvalidPage(end));
    }

    let mut document = source.clone();
    let delete: Vec<u32> = (0..total)
        .filter(|index| *index < start || *index > end)
        .map(|index| index as u32 + 1)
        .collect();

    if !delete.is_empty() {
        document.delete_pages(&delete);
    }
    document.prune_objects();
    document.renumber_objects();
    document.compress();

    debug!(
        "extracted pages {}..={} of {total} into a {} page document",
        start + 1,
        end + 1,
        document.get_pages().len()
    );
    Ok(document)
}

/// Writes an inclusive page range of `source` to `path`.
pub fn save_pages(source: &Document, start: usize, end: usize, path: &Path) -> Result<()> {
    let mut document = extract_pages(source, start, end)?;
    document
        .save(path)
        .map_err(|e| PdfError::Write(e.to_string()))?;
    Ok(())
}

/// Concatenates whole documents, in order, into one output file.
pub fn merge_documents(inputs: &[Document], output: &Path) -> Result<()> {
    if inputs.is_empty() {
        return Err(PdfError::NoPages);
    }

    let mut max_id = 1;
    let mut pages: BTreeMap<ObjectId, Object> = BTreeMap::new();
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for input in inputs {
        let mut document = input.clone();
        document.renumber_objects_with(max_id);
        max_id = document.max_id + 1;

        for (_, object_id) in document.get_pages() {
            if let Ok(object) = document.get_object(object_id) {
                pages.insert(object_id, object.clone());
            }
        }
        objects.extend(document.objects);
    }

    // Rebuild a single Catalog and Pages tree; everything else is carried
    // over as-is.
    let mut merged = Document::with_version("1.5");
    let mut catalog: Option<(ObjectId, lopdf::Dictionary)> = None;
    let mut pages_root: Option<(ObjectId, lopdf::Dictionary)> = None;

    for (object_id, object) in objects.iter() {
        match object_type(object) {
            b"Catalog" => {
                if catalog.is_none() {
                    if let Ok(dict) = object.as_dict() {
                        catalog = Some((*object_id, dict.clone()));
                    }
                }
            }
            b"Pages" => {
                if let Ok(dict) = object.as_dict() {
                    match pages_root.as_mut() {
                        Some((_, merged_dict)) => merged_dict.extend(dict),
                        None => pages_root = Some((*object_id, dict.clone())),
                    }
                }
            }
            b"Page" => {} // reparented below
            b"Outlines" | b"Outline" => {}
            _ => {
                merged.objects.insert(*object_id, object.clone());
            }
        }
    }

    let (catalog_id, mut catalog_dict) =
        catalog.ok_or_else(|| PdfError::Parse("no catalog found".to_string()))?;
    let (pages_root_id, mut pages_dict) =
        pages_root.ok_or_else(|| PdfError::Parse("no pages root found".to_string()))?;

    for (object_id, object) in &pages {
        if let Ok(dict) = object.as_dict() {
            let mut dict = dict.clone();
            dict.set("Parent", pages_root_id);
            merged.objects.insert(*object_id, Object::Dictionary(dict));
        }
    }

    pages_dict.set("Count", pages.len() as u32);
    pages_dict.set(
        "Kids",
        pages
            .keys()
            .map(|id| Object::Reference(*id))
            .collect::<Vec<_>>(),
    );
    merged
        .objects
        .insert(pages_root_id, Object::Dictionary(pages_dict));

    catalog_dict.set("Pages", pages_root_id);
    catalog_dict.remove(b"Outlines");
    merged
        .objects
        .insert(catalog_id, Object::Dictionary(catalog_dict));

    merged.trailer.set("Root", catalog_id);
    merged.max_id = merged.objects.len() as u32;
    merged.renumber_objects();
    merged.compress();

    debug!(
        "merged {} documents into {} pages",
        inputs.len(),
        merged.get_pages().len()
    );
    merged
        .save(output)
        .map_err(|e| PdfError::Write(e.to_string()))?;
    Ok(())
}

fn object_type(object: &Object) -> &[u8] {
    object
        .as_dict()
        .ok()
        .and_then(|dict| dict.get(b"Type").ok())
        .and_then(|name| name.as_name().ok())
        .unwrap_or(b"")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{Stream, dictionary};

    /// Minimal valid document with one page per text string.
    pub(crate) fn sample_document(page_texts: &[&str]) -> Document {
        let mut document = Document::with_version("1.5");
        let pages_id = document.new_object_id();
        let font_id = document.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = document.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids = Vec::new();
        for text in page_texts {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![50.into(), 700.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = document.add_object(Stream::new(
                dictionary! {},
                content.encode().unwrap(),
            ));
            let page_id = document.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            });
            kids.push(page_id.into());
        }

        let count = page_texts.len() as u32;
        document.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        document.trailer.set("Root", catalog_id);
        document
    }

    #[test]
    fn test_extract_single_page() {
        let source = sample_document(&["UM", "DOIS", "TRES"]);
        let extracted = extract_pages(&source, 1, 1).unwrap();
        assert_eq!(extracted.get_pages().len(), 1);

        let number = *extracted.get_pages().keys().next().unwrap();
        let text = extracted.extract_text(&[number]).unwrap();
        assert!(text.contains("DOIS"));
    }

    #[test]
    fn test_extract_range() {
        let source = sample_document(&["UM", "DOIS", "TRES", "QUATRO"]);
        let extracted = extract_pages(&source, 1, 3).unwrap();
        assert_eq!(extracted.get_pages().len(), 3);
    }

    #[test]
    fn test_extract_rejects_bad_range() {
        let source = sample_document(&["UM"]);
        assert!(extract_pages(&source, 0, 1).is_err());
        assert!(extract_pages(&source, 1, 0).is_err());
    }

    #[test]
    fn test_merge_concatenates_pages() {
        let first = sample_document(&["UM", "DOIS"]);
        let second = sample_document(&["TRES"]);

        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("merged.pdf");
        merge_documents(&[first, second], &output).unwrap();

        let merged = Document::load(&output).unwrap();
        assert_eq!(merged.get_pages().len(), 3);
    }

    #[test]
    fn test_merge_requires_input() {
        let dir = tempfile::tempdir().unwrap();
        assert!(merge_documents(&[], &dir.path().join("out.pdf")).is_err());
    }
}
