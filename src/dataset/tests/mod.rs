//! Scenario tests for the dataset over real directory trees.
//!
//! Fixtures are written into a temporary directory: images are stored as PNG
//! bytes under `.jpg` names, since decoding detects the format from content.

mod dataset_tests;

use std::path::Path;

use image::{ImageFormat, Rgb, RgbImage};

/// XML for an annotation with one `<object>` per box.
pub(super) fn voc_xml(boxes: &[[f32; 4]]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\"?>\n<annotation>\n  <folder>JPEGImages</folder>\n");
    for [xmin, ymin, xmax, ymax] in boxes {
        xml.push_str(&format!(
            "  <object>\n    <name>item</name>\n    <bndbox>\n      <xmin>{}</xmin>\n      <ymin>{}</ymin>\n      <xmax>{}</xmax>\n      <ymax>{}</ymax>\n    </bndbox>\n  </object>\n",
            xmin, ymin, xmax, ymax
        ));
    }
    xml.push_str("</annotation>\n");
    xml
}

/// Write a solid-color image into `<root>/JPEGImages/<name>`.
pub(super) fn write_image(root: &Path, name: &str, width: u32, height: u32, color: [u8; 3]) {
    let dir = root.join("JPEGImages");
    std::fs::create_dir_all(&dir).unwrap();
    let img = RgbImage::from_pixel(width, height, Rgb(color));
    img.save_with_format(dir.join(name), ImageFormat::Png).unwrap();
}

/// Write `<root>/Annotations/<name>` with the given boxes.
pub(super) fn write_annotation(root: &Path, name: &str, boxes: &[[f32; 4]]) {
    write_annotation_text(root, name, &voc_xml(boxes));
}

/// Write raw text into `<root>/Annotations/<name>`.
pub(super) fn write_annotation_text(root: &Path, name: &str, text: &str) {
    let dir = root.join("Annotations");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(name), text).unwrap();
}

/// The two-image dataset: `a` with one box, `b` with none.
pub(super) fn two_image_fixture() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_image(dir.path(), "a.jpg", 120, 240, [200, 10, 10]);
    write_image(dir.path(), "b.jpg", 64, 48, [10, 200, 10]);
    write_annotation(dir.path(), "a.xml", &[[10.0, 20.0, 110.0, 220.0]]);
    write_annotation(dir.path(), "b.xml", &[]);
    dir
}
