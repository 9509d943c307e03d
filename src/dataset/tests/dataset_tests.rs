//! Tests for `XmlDataset` construction and fetching.

use std::sync::Arc;

use super::{two_image_fixture, write_annotation, write_annotation_text, write_image};
use crate::annotation::{BoundingBox, Example, ImageData};
use crate::config::{DatasetConfig, DatasetLayout};
use crate::dataset::{Dataset, XmlDataset};
use crate::error::DatasetError;
use crate::transforms::{RandomHorizontalFlip, ToTensor};

#[test]
fn test_two_image_scenario() {
    let dir = two_image_fixture();
    let dataset = XmlDataset::open(dir.path()).unwrap();

    assert_eq!(dataset.len(), 2);

    let first = dataset.get(0).unwrap();
    let ann = &first.annotation;
    assert_eq!(ann.boxes, vec![BoundingBox::new(10.0, 20.0, 110.0, 220.0)]);
    assert_eq!(ann.labels, vec![1]);
    assert_eq!(ann.areas, vec![20000.0]);
    assert_eq!(ann.iscrowd, vec![0]);
    assert_eq!(ann.image_id, 0);
    assert_eq!(first.image.dimensions(), (120, 240));

    let second = dataset.get(1).unwrap();
    let ann = &second.annotation;
    assert!(ann.boxes.is_empty());
    assert!(ann.labels.is_empty());
    assert!(ann.areas.is_empty());
    assert!(ann.iscrowd.is_empty());
    assert_eq!(ann.image_id, 1);
}

#[test]
fn test_image_is_decoded_as_rgb() {
    let dir = two_image_fixture();
    let dataset = XmlDataset::open(dir.path()).unwrap();

    let example = dataset.get(1).unwrap();
    let rgb = example.image.as_rgb().expect("raw fetch yields RGB");
    assert_eq!(rgb.get_pixel(5, 5).0, [10, 200, 10]);
}

#[test]
fn test_grayscale_image_converted_to_rgb() {
    let dir = tempfile::tempdir().unwrap();
    let images = dir.path().join("JPEGImages");
    std::fs::create_dir_all(&images).unwrap();
    image::GrayImage::from_pixel(3, 2, image::Luma([77]))
        .save_with_format(images.join("g.jpg"), image::ImageFormat::Png)
        .unwrap();
    write_annotation(dir.path(), "g.xml", &[]);

    let example = XmlDataset::open(dir.path()).unwrap().get(0).unwrap();
    let rgb = example.image.as_rgb().unwrap();
    assert_eq!(rgb.get_pixel(2, 1).0, [77, 77, 77]);
}

#[test]
fn test_count_matches_image_folder() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..7 {
        write_image(dir.path(), &format!("img_{:03}.jpg", i), 4, 4, [0, 0, 0]);
    }

    // No annotation folder at all: construction still succeeds.
    let dataset = XmlDataset::open(dir.path()).unwrap();
    assert_eq!(dataset.len(), 7);
    assert!(!dataset.is_empty());
}

#[test]
#[cfg(unix)]
fn test_symlinked_directory_is_not_counted() {
    let dir = tempfile::tempdir().unwrap();
    write_image(dir.path(), "a.jpg", 4, 4, [0, 0, 0]);
    write_annotation(dir.path(), "a.xml", &[[0.0, 0.0, 1.0, 1.0]]);
    std::fs::create_dir(dir.path().join("more")).unwrap();
    std::os::unix::fs::symlink(
        dir.path().join("more"),
        dir.path().join("JPEGImages").join("more.jpg"),
    )
    .unwrap();

    let dataset = XmlDataset::open(dir.path()).unwrap();
    assert_eq!(dataset.len(), 1);
    assert!(dataset.iter().all(|r| r.is_ok()));
}

#[test]
fn test_latin1_annotation_is_loaded() {
    let dir = tempfile::tempdir().unwrap();
    write_image(dir.path(), "cafe.jpg", 8, 8, [0, 0, 0]);
    let annotations = dir.path().join("Annotations");
    std::fs::create_dir_all(&annotations).unwrap();
    std::fs::write(
        annotations.join("cafe.xml"),
        b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\
          <annotation><filename>caf\xE9.jpg</filename><object><name>caf\xE9</name>\
          <bndbox><xmin>1</xmin><ymin>2</ymin><xmax>3</xmax><ymax>4</ymax></bndbox>\
          </object></annotation>",
    )
    .unwrap();

    let dataset = XmlDataset::open(dir.path()).unwrap();
    let example = dataset.get(0).unwrap();
    assert_eq!(
        example.annotation.boxes,
        vec![BoundingBox::new(1.0, 2.0, 3.0, 4.0)]
    );
}

#[test]
fn test_empty_image_folder() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("JPEGImages")).unwrap();

    let dataset = XmlDataset::open(dir.path()).unwrap();
    assert!(dataset.is_empty());
    assert!(matches!(
        dataset.get(0).unwrap_err(),
        DatasetError::IndexOutOfRange { index: 0, len: 0 }
    ));
}

#[test]
fn test_missing_root() {
    let dir = tempfile::tempdir().unwrap();
    let err = XmlDataset::open(dir.path().join("nowhere")).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_image_id_equals_index() {
    let dir = tempfile::tempdir().unwrap();
    for (i, name) in ["z", "m", "a", "q"].iter().enumerate() {
        write_image(dir.path(), &format!("{}.jpg", name), 8, 8, [i as u8, 0, 0]);
        write_annotation(
            dir.path(),
            &format!("{}.xml", name),
            &[[0.0, 0.0, (i + 1) as f32, 1.0]],
        );
    }

    let dataset = XmlDataset::open(dir.path()).unwrap();
    for i in 0..dataset.len() {
        let example = dataset.get(i).unwrap();
        assert_eq!(example.annotation.image_id, i);
    }

    // Sorted order is a, m, q, z.
    let names: Vec<_> = dataset
        .manifest()
        .iter()
        .map(|e| e.file_name.as_str())
        .collect();
    assert_eq!(names, vec!["a.jpg", "m.jpg", "q.jpg", "z.jpg"]);
    assert_eq!(dataset.get(0).unwrap().annotation.boxes[0].xmax, 3.0);
}

#[test]
fn test_area_and_lengths_hold_for_every_box() {
    let dir = tempfile::tempdir().unwrap();
    write_image(dir.path(), "multi.jpg", 50, 50, [1, 2, 3]);
    write_annotation(
        dir.path(),
        "multi.xml",
        &[
            [0.5, 1.5, 10.25, 20.0],
            [3.0, 4.0, 5.0, 6.0],
            [12.0, 0.0, 48.5, 33.3],
        ],
    );

    let example = XmlDataset::open(dir.path()).unwrap().get(0).unwrap();
    let ann = &example.annotation;
    assert_eq!(ann.boxes.len(), 3);
    assert_eq!(ann.labels.len(), 3);
    assert_eq!(ann.areas.len(), 3);
    assert_eq!(ann.iscrowd.len(), 3);
    for (bbox, area) in ann.boxes.iter().zip(&ann.areas) {
        assert_eq!(*area, (bbox.xmax - bbox.xmin) * (bbox.ymax - bbox.ymin));
    }
}

#[test]
fn test_repeated_fetch_is_identical() {
    let dir = two_image_fixture();
    let dataset = XmlDataset::open(dir.path()).unwrap();

    let first = dataset.get(0).unwrap();
    let again = dataset.get(0).unwrap();
    assert_eq!(first, again);
}

#[test]
fn test_fetch_sees_annotation_edits() {
    let dir = two_image_fixture();
    let dataset = XmlDataset::open(dir.path()).unwrap();
    assert!(dataset.get(1).unwrap().annotation.is_empty());

    write_annotation(dir.path(), "b.xml", &[[1.0, 2.0, 3.0, 4.0]]);
    assert_eq!(dataset.get(1).unwrap().annotation.len(), 1);
}

#[test]
fn test_index_out_of_range() {
    let dir = two_image_fixture();
    let dataset = XmlDataset::open(dir.path()).unwrap();

    match dataset.get(2).unwrap_err() {
        DatasetError::IndexOutOfRange { index, len } => {
            assert_eq!(index, 2);
            assert_eq!(len, 2);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(dataset.entry(usize::MAX).is_err());
}

#[test]
fn test_missing_annotation_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    write_image(dir.path(), "a.jpg", 4, 4, [0, 0, 0]);
    write_image(dir.path(), "b.jpg", 4, 4, [0, 0, 0]);
    write_annotation(dir.path(), "b.xml", &[]);

    let dataset = XmlDataset::open(dir.path()).unwrap();
    match dataset.get(0).unwrap_err() {
        DatasetError::NotFound { path } => {
            assert_eq!(path, dir.path().join("Annotations").join("a.xml"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(dataset.get(1).is_ok());
}

#[test]
fn test_image_removed_after_open_is_not_found() {
    let dir = two_image_fixture();
    let dataset = XmlDataset::open(dir.path()).unwrap();
    std::fs::remove_file(dir.path().join("JPEGImages").join("a.jpg")).unwrap();

    assert!(dataset.get(0).unwrap_err().is_not_found());
}

#[test]
fn test_malformed_annotation_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    write_image(dir.path(), "a.jpg", 4, 4, [0, 0, 0]);
    write_annotation_text(
        dir.path(),
        "a.xml",
        "<annotation><object><bndbox><xmin>1</xmin></bndbox></object></annotation>",
    );

    let err = XmlDataset::open(dir.path()).unwrap().get(0).unwrap_err();
    assert!(matches!(err, DatasetError::Parse { .. }), "{:?}", err);
}

#[test]
fn test_undecodable_image() {
    let dir = tempfile::tempdir().unwrap();
    let images = dir.path().join("JPEGImages");
    std::fs::create_dir_all(&images).unwrap();
    std::fs::write(images.join("junk.jpg"), b"definitely not an image").unwrap();
    write_annotation(dir.path(), "junk.xml", &[]);

    let err = XmlDataset::open(dir.path()).unwrap().get(0).unwrap_err();
    assert!(matches!(err, DatasetError::Image { .. }), "{:?}", err);
}

#[test]
fn test_inner_jpg_substring_pairing() {
    let dir = tempfile::tempdir().unwrap();
    write_image(dir.path(), "shop.jpg.jpg", 4, 4, [0, 0, 0]);
    write_annotation(dir.path(), "shop.jpg.xml", &[[0.0, 0.0, 1.0, 1.0]]);

    let dataset = XmlDataset::open(dir.path()).unwrap();
    let entry = dataset.entry(0).unwrap();
    assert_eq!(
        entry.annotation_path,
        dir.path().join("Annotations").join("shop.xml")
    );

    // The stem-preserving name is never consulted.
    assert!(dataset.get(0).unwrap_err().is_not_found());

    write_annotation(dir.path(), "shop.xml", &[]);
    assert!(dataset.get(0).unwrap().annotation.is_empty());
}

#[test]
fn test_custom_layout() {
    let dir = tempfile::tempdir().unwrap();
    let layout = DatasetLayout::new(dir.path())
        .with_image_dir("images")
        .with_annotation_dir("labels");
    std::fs::create_dir_all(layout.image_path()).unwrap();
    std::fs::create_dir_all(layout.annotation_path()).unwrap();
    image::RgbImage::new(2, 2)
        .save_with_format(layout.image_path().join("x.jpg"), image::ImageFormat::Png)
        .unwrap();
    std::fs::write(
        layout.annotation_path().join("x.xml"),
        super::voc_xml(&[[0.0, 0.0, 2.0, 2.0]]),
    )
    .unwrap();

    let dataset = XmlDataset::from_layout(layout).unwrap();
    assert_eq!(dataset.get(0).unwrap().annotation.areas, vec![4.0]);
}

#[test]
fn test_transform_output_is_returned() {
    let dir = two_image_fixture();
    let dataset = XmlDataset::open(dir.path())
        .unwrap()
        .with_transform(ToTensor);
    assert!(dataset.has_transform());

    let example = dataset.get(0).unwrap();
    let tensor = example.image.as_tensor().expect("transform converts to tensor");
    assert_eq!(tensor.shape(), &[3, 240, 120]);
    assert_eq!(example.annotation.image_id, 0);

    let raw = dataset.get_raw(0).unwrap();
    assert!(raw.image.as_rgb().is_some());
}

#[test]
fn test_transform_sees_full_pair() {
    let dir = two_image_fixture();
    let dataset = XmlDataset::open(dir.path())
        .unwrap()
        .with_transform(RandomHorizontalFlip::new(1.0));

    let example = dataset.get(0).unwrap();
    assert_eq!(
        example.annotation.boxes,
        vec![BoundingBox::new(10.0, 20.0, 110.0, 220.0)]
    );
    assert_eq!(example.annotation.areas, vec![20000.0]);
}

#[test]
fn test_transform_error_propagates() {
    let dir = two_image_fixture();
    let dataset = XmlDataset::open(dir.path())
        .unwrap()
        .with_transform(|example: Example| -> Result<Example, DatasetError> {
            if example.annotation.is_empty() {
                Err(DatasetError::transform("no objects"))
            } else {
                Ok(example)
            }
        });

    assert!(dataset.get(0).is_ok());
    assert!(matches!(
        dataset.get(1).unwrap_err(),
        DatasetError::Transform { .. }
    ));
}

#[test]
fn test_from_config_training_pipeline() {
    let dir = two_image_fixture();
    let mut config = DatasetConfig::new(dir.path());
    config.transform.train = true;
    config.transform.flip_probability = 1.0;

    let dataset = XmlDataset::from_config(&config).unwrap();
    let example = dataset.get(0).unwrap();

    assert!(matches!(example.image, ImageData::Tensor(_)));
    // 120 px wide: (10, 110) mirrors to (10, 110).
    assert_eq!(
        example.annotation.boxes,
        vec![BoundingBox::new(10.0, 20.0, 110.0, 220.0)]
    );
}

#[test]
fn test_seeded_training_flips_vary_across_epochs() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..8 {
        write_image(dir.path(), &format!("{}.jpg", i), 10, 4, [0, 0, 0]);
        write_annotation(dir.path(), &format!("{}.xml", i), &[[0.0, 0.0, 2.0, 2.0]]);
    }
    let mut config = DatasetConfig::new(dir.path());
    config.transform.train = true;
    config.transform.seed = Some(7);

    let epochs = |dataset: &XmlDataset| -> Vec<Vec<bool>> {
        (0..5)
            .map(|_| {
                dataset
                    .iter()
                    .map(|r| r.unwrap().annotation.boxes[0].xmin == 8.0)
                    .collect()
            })
            .collect()
    };
    let first_run = epochs(&XmlDataset::from_config(&config).unwrap());
    let second_run = epochs(&XmlDataset::from_config(&config).unwrap());

    assert_eq!(first_run, second_run);
    assert!(first_run.iter().any(|epoch| epoch != &first_run[0]));
}

#[test]
fn test_iter_yields_every_example_in_order() {
    let dir = two_image_fixture();
    let dataset = XmlDataset::open(dir.path()).unwrap();

    let iter = dataset.iter();
    assert_eq!(iter.len(), 2);
    let ids: Vec<_> = iter.map(|r| r.unwrap().annotation.image_id).collect();
    assert_eq!(ids, vec![0, 1]);
}

#[test]
fn test_concurrent_fetches() {
    let dir = two_image_fixture();
    let dataset = Arc::new(XmlDataset::open(dir.path()).unwrap());
    let expected = dataset.get(0).unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let dataset = Arc::clone(&dataset);
                scope.spawn(move || dataset.get(t % 2).unwrap())
            })
            .collect();
        for (t, handle) in handles.into_iter().enumerate() {
            let example = handle.join().unwrap();
            assert_eq!(example.annotation.image_id, t % 2);
            if t % 2 == 0 {
                assert_eq!(example, expected);
            }
        }
    });
}
