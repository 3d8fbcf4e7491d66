//! Page tree access: inherited attributes, resources, content streams and
//! annotations.

use crate::error::{ExportError, ExportResult};
use kurbo::{Affine, Rect, Size};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

/// Page tree nodes deeper than this are treated as a cycle.
const MAX_TREE_DEPTH: usize = 64;

/// US Letter, used when a page carries no MediaBox at all.
const FALLBACK_MEDIA_BOX: Rect = Rect::new(0.0, 0.0, 612.0, 792.0);

/// Follow a single indirect reference.
pub(crate) fn resolve<'a>(doc: &'a Document, object: &'a Object) -> ExportResult<&'a Object> {
    match object {
        Object::Reference(id) => Ok(doc.get_object(*id)?),
        other => Ok(other),
    }
}

pub(crate) fn number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(v) => Some(*v as f64),
        Object::Real(v) => Some(*v as f64),
        _ => None,
    }
}

/// Look `key` up on the page, then on each ancestor in the page tree.
fn inherited<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> ExportResult<Option<&'a Object>> {
    let mut node = doc.get_dictionary(page_id)?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = node.get(key) {
            return Ok(Some(value));
        }
        match node.get(b"Parent").and_then(Object::as_reference) {
            Ok(parent) => node = doc.get_dictionary(parent)?,
            Err(_) => return Ok(None),
        }
    }
    Err(ExportError::PageStructure(format!(
        "page tree above {:?} is deeper than {}",
        page_id, MAX_TREE_DEPTH
    )))
}

/// The visible area of a page and the mapping from page space onto it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageFrame {
    pub media_box: Rect,
}

impl PageFrame {
    pub(crate) fn load(doc: &Document, page_id: ObjectId) -> ExportResult<Self> {
        let Some(raw) = inherited(doc, page_id, b"MediaBox")? else {
            log::warn!("Page {:?} has no MediaBox; assuming US Letter", page_id);
            return Ok(Self {
                media_box: FALLBACK_MEDIA_BOX,
            });
        };
        let values: Vec<f64> = resolve(doc, raw)?
            .as_array()?
            .iter()
            .filter_map(|item| resolve(doc, item).ok().and_then(number))
            .collect();
        let [x0, y0, x1, y1] = values[..] else {
            return Err(ExportError::PageStructure(format!(
                "MediaBox of {:?} has {} numbers",
                page_id,
                values.len()
            )));
        };
        Ok(Self {
            media_box: Rect::new(x0, y0, x1, y1).abs(),
        })
    }

    pub fn size(&self) -> Size {
        self.media_box.size()
    }

    /// Page space has its origin at the top-left corner with y growing down;
    /// PDF user space starts bottom-left with y growing up.
    pub fn to_pdf(&self) -> Affine {
        Affine::new([1.0, 0.0, 0.0, -1.0, self.media_box.x0, self.media_box.y1])
    }
}

/// An owned copy of the page's effective resource dictionary.
pub(crate) fn resources(doc: &Document, page_id: ObjectId) -> ExportResult<Dictionary> {
    match inherited(doc, page_id, b"Resources")? {
        Some(raw) => Ok(resolve(doc, raw)?.as_dict()?.clone()),
        None => Ok(Dictionary::new()),
    }
}

/// First `{prefix}{n}` not yet used in the `category` sub-dictionary.
pub(crate) fn unused_name(
    doc: &Document,
    resources: &Dictionary,
    category: &str,
    prefix: &str,
) -> ExportResult<String> {
    let taken = match resources.get(category.as_bytes()) {
        Ok(raw) => resolve(doc, raw)?.as_dict()?.clone(),
        Err(_) => Dictionary::new(),
    };
    let mut index = 0usize;
    loop {
        let name = format!("{}{}", prefix, index);
        if !taken.has(name.as_bytes()) {
            return Ok(name);
        }
        index += 1;
    }
}

/// Register `value` under `name` in the `category` sub-dictionary.
pub(crate) fn insert_resource(
    doc: &Document,
    resources: &mut Dictionary,
    category: &str,
    name: &str,
    value: Object,
) -> ExportResult<()> {
    let mut entries = match resources.get(category.as_bytes()) {
        Ok(raw) => resolve(doc, raw)?.as_dict()?.clone(),
        Err(_) => Dictionary::new(),
    };
    entries.set(name, value);
    resources.set(category, Object::Dictionary(entries));
    Ok(())
}

/// Append drawing operations after the page's existing content.
///
/// The existing streams are bracketed in `q`/`Q` so whatever graphics state
/// they leave behind cannot leak into the overlay.
pub(crate) fn append_overlay(
    doc: &mut Document,
    page_id: ObjectId,
    operations: Vec<Operation>,
) -> ExportResult<()> {
    let existing = match doc.get_dictionary(page_id)?.get(b"Contents") {
        Ok(Object::Array(items)) => items.clone(),
        Ok(Object::Reference(id)) => match doc.get_object(*id)? {
            Object::Array(items) => items.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Ok(_) | Err(_) => Vec::new(),
    };

    let mut overlay = Vec::with_capacity(operations.len() + 3);
    if !existing.is_empty() {
        overlay.push(Operation::new("Q", vec![]));
    }
    overlay.push(Operation::new("q", vec![]));
    overlay.extend(operations);
    overlay.push(Operation::new("Q", vec![]));
    let encoded = Content {
        operations: overlay,
    }
    .encode()
    .map_err(|e| ExportError::Write(e.to_string()))?;
    let overlay_id = doc.add_object(Stream::new(Dictionary::new(), encoded));

    let mut contents = Vec::with_capacity(existing.len() + 2);
    if !existing.is_empty() {
        let save_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        contents.push(Object::Reference(save_id));
        contents.extend(existing);
    }
    contents.push(Object::Reference(overlay_id));

    doc.get_dictionary_mut(page_id)?
        .set("Contents", Object::Array(contents));
    Ok(())
}

/// Add an annotation reference to the page's `Annots` array.
pub(crate) fn add_annotation(
    doc: &mut Document,
    page_id: ObjectId,
    annot_id: ObjectId,
) -> ExportResult<()> {
    let shared = doc
        .get_dictionary(page_id)?
        .get(b"Annots")
        .and_then(Object::as_reference)
        .ok();
    if let Some(array_id) = shared {
        if let Object::Array(items) = doc.get_object_mut(array_id)? {
            items.push(Object::Reference(annot_id));
            return Ok(());
        }
    }

    let page = doc.get_dictionary_mut(page_id)?;
    if let Ok(Object::Array(items)) = page.get_mut(b"Annots") {
        items.push(Object::Reference(annot_id));
    } else {
        page.set("Annots", Object::Array(vec![Object::Reference(annot_id)]));
    }
    Ok(())
}

/// MediaBox size of every page, in document order.
///
/// Hosts use this to seed native page sizes before any page is rasterized.
pub fn page_sizes(bytes: &[u8]) -> ExportResult<Vec<Size>> {
    let doc = Document::load_mem(bytes).map_err(|e| ExportError::Parse(e.to_string()))?;
    doc.get_pages()
        .values()
        .map(|&page_id| PageFrame::load(&doc, page_id).map(|frame| frame.size()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;
    use lopdf::dictionary;

    /// Two pages whose MediaBox lives on the Pages node.
    fn inherited_box_pdf() -> Vec<u8> {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let mut kids = Vec::new();
        for _ in 0..2 {
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => Object::Reference(pages_id),
            });
            kids.push(Object::Reference(page_id));
        }
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => 2,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        });
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut output = Vec::new();
        doc.save_to(&mut output).unwrap();
        output
    }

    #[test]
    fn test_page_sizes_follow_inheritance() {
        let sizes = page_sizes(&inherited_box_pdf()).unwrap();
        assert_eq!(sizes, vec![Size::new(595.0, 842.0); 2]);
    }

    #[test]
    fn test_page_sizes_rejects_garbage() {
        assert!(matches!(
            page_sizes(b"not a pdf"),
            Err(ExportError::Parse(_))
        ));
    }

    #[test]
    fn test_frame_flips_y_axis() {
        let frame = PageFrame {
            media_box: Rect::new(0.0, 0.0, 612.0, 792.0),
        };
        let to_pdf = frame.to_pdf();
        assert_eq!(to_pdf * Point::new(0.0, 0.0), Point::new(0.0, 792.0));
        assert_eq!(to_pdf * Point::new(100.0, 92.0), Point::new(100.0, 700.0));
    }

    #[test]
    fn test_frame_respects_offset_media_box() {
        let frame = PageFrame {
            media_box: Rect::new(10.0, 20.0, 110.0, 220.0),
        };
        assert_eq!(frame.size(), Size::new(100.0, 200.0));
        assert_eq!(frame.to_pdf() * Point::new(0.0, 0.0), Point::new(10.0, 220.0));
    }

    #[test]
    fn test_unused_name_skips_existing_entries() {
        let doc = Document::with_version("1.7");
        let mut resources = Dictionary::new();
        resources.set(
            "XObject",
            Object::Dictionary(dictionary! { "PmIm0" => Object::Null }),
        );
        let name = unused_name(&doc, &resources, "XObject", "PmIm").unwrap();
        assert_eq!(name, "PmIm1");
        let font = unused_name(&doc, &resources, "Font", "PmF").unwrap();
        assert_eq!(font, "PmF0");
    }
}
