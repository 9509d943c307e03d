//! Pascal VOC XML bounding-box reader.
//!
//! One XML file per image. Only the box geometry is read:
//!
//! ```xml
//! <annotation>
//!   <filename>image1.jpg</filename>
//!   <object>
//!     <name>item</name>
//!     <bndbox>
//!       <xmin>100</xmin>
//!       <ymin>100</ymin>
//!       <xmax>200</xmax>
//!       <ymax>200</ymax>
//!     </bndbox>
//!   </object>
//! </annotation>
//! ```
//!
//! `<object>` must be a direct child of the root, `<bndbox>` a direct child
//! of `<object>`, and the four coordinate leaves direct children of
//! `<bndbox>`. Everything else is ignored.
//!
//! Files are read as bytes and decoded with the encoding named in the XML
//! declaration (or byte order mark), UTF-8 when there is none.

use std::io::BufRead;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::annotation::BoundingBox;
use crate::error::DatasetError;
use crate::format::error::VocError;

const OBJECT: &str = "object";
const BNDBOX: &str = "bndbox";

/// Coordinate leaves of `<bndbox>`, in `[xmin, ymin, xmax, ymax]` order.
const LEAVES: [&str; 4] = ["xmin", "ymin", "xmax", "ymax"];

/// Partially read `<object>`.
#[derive(Default)]
struct ObjectState {
    bndbox: Option<BoundingBox>,
}

/// Partially read `<bndbox>`.
#[derive(Default)]
struct BndboxState {
    coords: [Option<f32>; 4],
}

/// Leaf currently being read: which coordinate and its accumulated text.
struct LeafState {
    slot: usize,
    text: String,
}

/// Parse every `<object>/<bndbox>` of a Pascal VOC document, in document order.
///
/// A document without objects yields an empty list.
pub fn parse_boxes(xml: &str) -> Result<Vec<BoundingBox>, VocError> {
    parse_events(Reader::from_str(xml))
}

/// Parse a raw annotation document, honoring its declared encoding.
///
/// Bytes that cannot be decoded in that encoding are a [`VocError::Xml`].
pub fn parse_boxes_from_bytes(bytes: &[u8]) -> Result<Vec<BoundingBox>, VocError> {
    parse_events(Reader::from_reader(bytes))
}

fn parse_events<R: BufRead>(mut reader: Reader<R>) -> Result<Vec<BoundingBox>, VocError> {
    reader.trim_text(true);
    reader.expand_empty_elements(true);
    reader.check_end_names(true);

    let mut boxes = Vec::new();
    let mut stack: Vec<String> = Vec::new();
    let mut root_seen = false;

    let mut object: Option<ObjectState> = None;
    let mut bndbox: Option<BndboxState> = None;
    let mut leaf: Option<LeafState> = None;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| VocError::xml(reader.buffer_position(), e))?;

        match event {
            Event::Start(ref e) => {
                let name = reader
                    .decoder()
                    .decode(e.name().as_ref())
                    .map_err(|err| VocError::xml(reader.buffer_position(), err))?
                    .into_owned();

                if stack.is_empty() {
                    if root_seen {
                        return Err(VocError::MultipleRoots { name });
                    }
                    root_seen = true;
                }

                let index = boxes.len();
                match (stack.len(), name.as_str()) {
                    (1, OBJECT) => object = Some(ObjectState::default()),
                    (2, BNDBOX) if stack[1] == OBJECT => {
                        if object.as_ref().is_some_and(|o| o.bndbox.is_some()) {
                            return Err(VocError::DuplicateElement {
                                element: BNDBOX,
                                parent: OBJECT,
                                index,
                            });
                        }
                        bndbox = Some(BndboxState::default());
                    }
                    (3, leaf_name) if bndbox.is_some() && stack[2] == BNDBOX => {
                        if let Some(slot) = LEAVES.iter().position(|l| *l == leaf_name) {
                            leaf = Some(LeafState {
                                slot,
                                text: String::new(),
                            });
                        }
                    }
                    _ => {}
                }

                stack.push(name);
            }
            // Text outside the coordinate leaves is only checked to decode.
            Event::Text(ref e) => match leaf.as_mut() {
                Some(current) if stack.len() == 4 => {
                    let text = e
                        .unescape()
                        .map_err(|err| VocError::xml(reader.buffer_position(), err))?;
                    current.text.push_str(&text);
                }
                _ => {
                    reader
                        .decoder()
                        .decode(e)
                        .map_err(|err| VocError::xml(reader.buffer_position(), err))?;
                }
            },
            Event::CData(ref e) => {
                let text = reader
                    .decoder()
                    .decode(e)
                    .map_err(|err| VocError::xml(reader.buffer_position(), err))?;
                if let Some(current) = leaf.as_mut() {
                    if stack.len() == 4 {
                        current.text.push_str(&text);
                    }
                }
            }
            Event::End(_) => {
                let depth = stack.len();
                stack.pop();
                let index = boxes.len();

                match depth {
                    4 => {
                        if let (Some(done), Some(state)) = (leaf.take(), bndbox.as_mut()) {
                            let element = LEAVES[done.slot];
                            if state.coords[done.slot].is_some() {
                                return Err(VocError::DuplicateElement {
                                    element,
                                    parent: BNDBOX,
                                    index,
                                });
                            }
                            let value = done.text.trim().parse::<f32>().map_err(|_| {
                                VocError::InvalidNumber {
                                    element,
                                    value: done.text.clone(),
                                    index,
                                }
                            })?;
                            state.coords[done.slot] = Some(value);
                        }
                    }
                    3 => {
                        if let Some(state) = bndbox.take() {
                            let bbox = finish_bndbox(&state, index)?;
                            if let Some(obj) = object.as_mut() {
                                obj.bndbox = Some(bbox);
                            }
                        }
                    }
                    2 => {
                        if let Some(obj) = object.take() {
                            let bbox = obj.bndbox.ok_or(VocError::MissingElement {
                                element: BNDBOX,
                                parent: OBJECT,
                                index,
                            })?;
                            log::trace!("object #{}: {:?}", index, bbox);
                            boxes.push(bbox);
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => {
                if let Some(open) = stack.pop() {
                    return Err(VocError::UnexpectedEof { open });
                }
                if !root_seen {
                    return Err(VocError::NoRoot);
                }
                break;
            }
            _ => {}
        }
    }

    Ok(boxes)
}

fn finish_bndbox(state: &BndboxState, index: usize) -> Result<BoundingBox, VocError> {
    let mut coords = [0.0f32; 4];
    for (slot, value) in state.coords.iter().enumerate() {
        coords[slot] = value.ok_or(VocError::MissingElement {
            element: LEAVES[slot],
            parent: BNDBOX,
            index,
        })?;
    }
    let [xmin, ymin, xmax, ymax] = coords;
    Ok(BoundingBox::new(xmin, ymin, xmax, ymax))
}

/// Read and parse an annotation file.
///
/// A missing file is reported as [`DatasetError::NotFound`]; anything wrong
/// with its content as [`DatasetError::Parse`].
pub fn read_boxes(path: &Path) -> Result<Vec<BoundingBox>, DatasetError> {
    let bytes = std::fs::read(path).map_err(|e| DatasetError::io(path, e))?;
    parse_boxes_from_bytes(&bytes).map_err(|e| DatasetError::parse(path, e.to_string()))
}
