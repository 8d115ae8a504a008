use roi::{
    build_label_map, extract_roi_thumbnail, html_thumbnail, label_histogram, polygon_to_mask,
    register_shape, ImageShape, ImageTensorCoord, PixelSource, PixelsInfo, PlaneStack, Polygon,
    RoiHandle, RoiSource, RoiStore, StackPosition, ThumbnailRequest,
};

const IMAGE: u64 = 1;

fn create_test_stack() -> PlaneStack {
    let info = PixelsInfo { size_x: 32, size_y: 24, size_z: 3, size_c: 2, size_t: 1 };
    let mut stack = PlaneStack::new(info, 4095.0);
    for z in 0..3 {
        for c in 0..2 {
            let plane = (0..32 * 24).map(|i| f64::from(i % 32 + z * 100 + c * 1000)).collect();
            stack.set_plane(z, c, 0, plane).expect("Should set plane");
        }
    }
    stack
}

#[test]
fn test_register_then_label() {
    let mut store = RoiStore::new();
    let first = Polygon::from(vec![[2.0, 2.0], [2.0, 10.0], [10.0, 10.0], [10.0, 2.0]]);
    let second = Polygon::from(vec![[6.0, 6.0], [6.0, 14.0], [14.0, 14.0], [14.0, 6.0]]);
    register_shape(&mut store, IMAGE, None, &first, StackPosition::default()).expect("Should register");
    register_shape(&mut store, IMAGE, None, &second, StackPosition::default()).expect("Should register");

    let shape = ImageShape::new(32, 24);
    let labels = build_label_map(IMAGE, shape, &store).expect("Should build");
    assert_eq!(labels.dimensions(), (32, 24));

    let histogram = label_histogram(&labels);
    assert_eq!(histogram.get(&1), Some(&(64 - 16)));
    assert_eq!(histogram.get(&2), Some(&(64 - 16)));
    assert_eq!(histogram.get(&3), Some(&16));

    // Decoded stored shapes rasterize like the integer polygon they came from
    let rois = store.find_rois(IMAGE).expect("Should query");
    let decoded = roi::decode(rois[0].shape(0).expect("Should have a shape")).expect("Should decode");
    assert_eq!(polygon_to_mask(&decoded, shape), polygon_to_mask(&first.truncated(), shape));
}

#[test]
fn test_roi_thumbnail_from_store() {
    let stack = create_test_stack();
    let mut store = RoiStore::new();
    let polygon = Polygon::from(vec![[4.0, 4.0], [4.0, 12.0], [20.0, 12.0], [20.0, 4.0]]);
    let roi = register_shape(&mut store, IMAGE, None, &polygon, StackPosition::default())
        .expect("Should register");

    let request = ThumbnailRequest { draw_overlay: false, ..Default::default() };
    let thumb = extract_roi_thumbnail(&roi, &stack, &request).expect("Should extract");

    // Origin (3, 3), extent 15 x 7, middle plane z = 1, both channels
    assert_eq!((thumb.height(), thumb.width(), thumb.channels()), (7, 15, 2));
    let at = ImageTensorCoord { row: 2, col: 5 };
    assert_eq!(thumb.get(at, 0), Some(f64::from(3 + 5 + 100)));
    assert_eq!(thumb.get(at, 1), Some(f64::from(3 + 5 + 100 + 1000)));

    let overlaid = extract_roi_thumbnail(&roi, &stack, &ThumbnailRequest::default()).expect("Should extract");
    assert_eq!(overlaid.get(ImageTensorCoord::default(), 0), Some(stack.max_intensity()));

    let html = html_thumbnail(&overlaid, stack.max_intensity()).expect("Should render");
    assert!(html.contains("data:image/png;base64,"));
}

#[test]
fn test_thumbnail_outside_the_image_fails() {
    let stack = create_test_stack();
    let mut store = RoiStore::new();
    let polygon = Polygon::from(vec![[20.0, 20.0], [20.0, 60.0], [60.0, 60.0]]);
    let roi = register_shape(&mut store, IMAGE, None, &polygon, StackPosition::default())
        .expect("Should register");

    let err = extract_roi_thumbnail(&roi, &stack, &ThumbnailRequest::default()).unwrap_err();
    assert!(matches!(err, roi::RoiError::TileFetch { .. }));
}
