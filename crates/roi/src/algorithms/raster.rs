use std::collections::HashSet;

use image::Luma;
use imageproc::drawing::BresenhamLineIter;

use crate::types::{ImageShape, ImageTensorCoord, Mask, Polygon, Thumbnail};

/// Rasterize a polygon into a binary mask of `shape`.
///
/// Pixel `(x, y)` is sampled at its integer coordinate and set to 1 when that
/// point lies inside the polygon under the even-odd rule. Crossings are
/// half-open, so the right and bottom edges of an axis-aligned box are
/// outside. Self-intersecting outlines are filled by parity, so both lobes of
/// a bow-tie are set even though its net area is zero. Polygons with fewer
/// than three vertices, or whose vertices are collinear, produce an all-zero
/// mask.
pub fn polygon_to_mask(polygon: &Polygon, shape: ImageShape) -> Mask {
    let mut mask = Mask::new(shape.width, shape.height);
    if polygon.len() < 3 || shape.width == 0 || shape.height == 0 {
        return mask;
    }

    let points = polygon.points();
    let (min_y, max_y) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p.y), hi.max(p.y)));

    let first_row = min_y.ceil().max(0.0);
    let last_row = max_y.floor().min(f64::from(shape.height - 1));
    if first_row > last_row {
        return mask;
    }

    let mut crossings = Vec::with_capacity(points.len());
    for row in first_row as u32..=last_row as u32 {
        let y = f64::from(row);

        crossings.clear();
        for (i, a) in points.iter().enumerate() {
            let b = &points[(i + 1) % points.len()];
            if (a.y > y) != (b.y > y) {
                crossings.push(a.x + (y - a.y) * (b.x - a.x) / (b.y - a.y));
            }
        }
        crossings.sort_by(f64::total_cmp);

        // A sample at x is inside when an odd number of crossings lie strictly
        // to its right, i.e. x in [c0, c1), [c2, c3), ...
        for span in crossings.chunks_exact(2) {
            let start = span[0].ceil().max(0.0);
            let end = (span[1].ceil() - 1.0).min(f64::from(shape.width - 1));
            if start > end {
                continue;
            }
            for col in start as u32..=end as u32 {
                mask.put_pixel(col, row, Luma([1u8]));
            }
        }
    }

    mask
}

/// Outline pixels of each edge in turn, closing edge included. Pixels shared
/// by adjacent edges are yielded more than once.
fn outline(polygon: &Polygon) -> impl Iterator<Item = (i32, i32)> + '_ {
    let points = polygon.points();
    points.iter().enumerate().flat_map(move |(i, a)| {
        let b = &points[(i + 1) % points.len()];
        BresenhamLineIter::new((a.x as f32, a.y as f32), (b.x as f32, b.y as f32))
    })
}

/// Ordered, de-duplicated `(x, y)` pixels along the closed polygon outline.
///
/// Each edge, including the closing one, is traced with Bresenham's line
/// algorithm, so these pixels need not coincide with the edge of the
/// corresponding fill mask.
pub fn perimeter_pixels(polygon: &Polygon) -> Vec<(i32, i32)> {
    let mut seen = HashSet::new();
    outline(polygon).filter(|pixel| seen.insert(*pixel)).collect()
}

/// Write `intensity` into every channel of each outline pixel that falls
/// inside `thumbnail`.
pub fn draw_perimeter(thumbnail: &mut Thumbnail, polygon: &Polygon, intensity: f64) {
    for (x, y) in outline(polygon) {
        if x < 0 || y < 0 {
            continue;
        }
        let at = ImageTensorCoord {
            row: y as usize,
            col: x as usize,
        };
        thumbnail.fill_pixel(at, intensity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ones(mask: &Mask) -> usize {
        mask.pixels().filter(|p| p[0] == 1).count()
    }

    fn square(size: f64) -> Polygon {
        Polygon::from(vec![[0.0, 0.0], [0.0, size], [size, size], [size, 0.0]])
    }

    #[test]
    fn test_square_mask() {
        let mask = polygon_to_mask(&square(4.0), ImageShape::new(5, 5));
        assert_eq!(mask.dimensions(), (5, 5));
        for y in 0..5 {
            for x in 0..5 {
                let expected = u8::from(x < 4 && y < 4);
                assert_eq!(mask.get_pixel(x, y)[0], expected, "pixel ({x}, {y})");
            }
        }
        assert_eq!(ones(&mask), 16);
    }

    #[test]
    fn test_mask_is_not_transposed() {
        // Tall thin box: x in [0, 2), y in [0, 6)
        let polygon = Polygon::from(vec![[0.0, 0.0], [2.0, 0.0], [2.0, 6.0], [0.0, 6.0]]);
        let mask = polygon_to_mask(&polygon, ImageShape::new(3, 8));
        assert_eq!(mask.width(), 3);
        assert_eq!(mask.height(), 8);
        assert_eq!(mask.get_pixel(1, 5)[0], 1);
        assert_eq!(mask.get_pixel(2, 1)[0], 0);
        assert_eq!(ones(&mask), 12);
    }

    #[test]
    fn test_shape_is_kept_for_polygons_outside_the_image() {
        let polygon = Polygon::from(vec![[-10.0, -10.0], [30.0, -10.0], [30.0, 30.0], [-10.0, 30.0]]);
        let mask = polygon_to_mask(&polygon, ImageShape::new(7, 4));
        assert_eq!(mask.dimensions(), (7, 4));
        assert_eq!(ones(&mask), 28);

        let far = Polygon::from(vec![[100.0, 100.0], [110.0, 100.0], [110.0, 110.0]]);
        let mask = polygon_to_mask(&far, ImageShape::new(7, 4));
        assert_eq!(mask.dimensions(), (7, 4));
        assert_eq!(ones(&mask), 0);
    }

    #[test]
    fn test_degenerate_polygons_yield_empty_masks() {
        let shape = ImageShape::new(6, 6);
        assert_eq!(ones(&polygon_to_mask(&Polygon::default(), shape)), 0);
        assert_eq!(ones(&polygon_to_mask(&Polygon::from(vec![[2.0, 2.0]]), shape)), 0);
        let line = Polygon::from(vec![[0.0, 0.0], [2.0, 2.0], [4.0, 4.0]]);
        assert_eq!(ones(&polygon_to_mask(&line, shape)), 0);
    }

    fn rows(mask: &Mask) -> Vec<Vec<u32>> {
        (0..mask.height())
            .map(|y| (0..mask.width()).filter(|&x| mask.get_pixel(x, y)[0] == 1).collect())
            .collect()
    }

    #[test]
    fn test_triangle_mask() {
        let polygon = Polygon::from(vec![[1.0, 1.0], [2.0, 7.0], [8.0, 4.0]]);
        let mask = polygon_to_mask(&polygon, ImageShape::new(10, 10));
        let expected: Vec<Vec<u32>> = vec![
            vec![],
            vec![],
            vec![2, 3],
            vec![2, 3, 4, 5],
            vec![2, 3, 4, 5, 6, 7],
            vec![2, 3, 4, 5],
            vec![2, 3],
            vec![],
            vec![],
            vec![],
        ];
        assert_eq!(rows(&mask), expected);
        assert_eq!(ones(&mask), 18);
    }

    #[test]
    fn test_fractional_vertices() {
        // Samples strictly inside [0.5, 3.5) x [0.5, 2.5)
        let polygon = Polygon::from(vec![[0.5, 0.5], [3.5, 0.5], [3.5, 2.5], [0.5, 2.5]]);
        let mask = polygon_to_mask(&polygon, ImageShape::new(5, 5));
        assert_eq!(rows(&mask), vec![vec![], vec![1, 2, 3], vec![1, 2, 3], vec![], vec![]]);
    }

    #[test]
    fn test_bow_tie_fills_both_lobes() {
        let polygon = Polygon::from(vec![[0.0, 0.0], [4.0, 4.0], [4.0, 0.0], [0.0, 4.0]]);
        assert_eq!(polygon.area(), 0.0);
        let mask = polygon_to_mask(&polygon, ImageShape::new(6, 6));
        assert_eq!(
            rows(&mask),
            vec![vec![], vec![0, 3], vec![0, 1, 2, 3], vec![0, 3], vec![], vec![]]
        );
    }

    #[test]
    fn test_concave_polygon() {
        // U shape opening upwards; the notch x in [2, 4), y in [0, 4) is empty
        let polygon = Polygon::from(vec![
            [0.0, 0.0],
            [2.0, 0.0],
            [2.0, 4.0],
            [4.0, 4.0],
            [4.0, 0.0],
            [6.0, 0.0],
            [6.0, 6.0],
            [0.0, 6.0],
        ]);
        let mask = polygon_to_mask(&polygon, ImageShape::new(8, 8));
        assert_eq!(mask.get_pixel(1, 1)[0], 1);
        assert_eq!(mask.get_pixel(3, 1)[0], 0);
        assert_eq!(mask.get_pixel(3, 5)[0], 1);
        assert_eq!(mask.get_pixel(5, 2)[0], 1);
        assert_eq!(ones(&mask), 36 - 8);
    }

    #[test]
    fn test_perimeter_of_square() {
        let pixels = perimeter_pixels(&square(3.0));
        assert_eq!(pixels.len(), 12);
        assert!(pixels.contains(&(0, 0)));
        assert!(pixels.contains(&(3, 3)));
        assert!(!pixels.contains(&(1, 1)));
    }

    #[test]
    fn test_perimeter_of_single_point() {
        assert_eq!(perimeter_pixels(&Polygon::from(vec![[2.0, 5.0]])), vec![(2, 5)]);
        assert!(perimeter_pixels(&Polygon::default()).is_empty());
    }

    #[test]
    fn test_draw_perimeter_sets_all_channels() {
        let mut thumb = Thumbnail::zeros(5, 5, 2);
        draw_perimeter(&mut thumb, &square(3.0), 255.0);
        assert_eq!(thumb.get(ImageTensorCoord { row: 3, col: 0 }, 0), Some(255.0));
        assert_eq!(thumb.get(ImageTensorCoord { row: 3, col: 0 }, 1), Some(255.0));
        assert_eq!(thumb.get(ImageTensorCoord { row: 1, col: 1 }, 0), Some(0.0));
        assert_eq!(thumb.as_array().sum(), 255.0 * 12.0 * 2.0);
    }

    #[test]
    fn test_draw_perimeter_clips_to_buffer() {
        let mut thumb = Thumbnail::zeros(2, 2, 1);
        draw_perimeter(&mut thumb, &square(3.0), 1.0);
        // Only (0,0), (0,1), (1,0) of the outline fall inside a 2x2 buffer
        assert_eq!(thumb.as_array().sum(), 3.0);
    }

    #[test]
    fn test_draw_long_outline_into_small_buffer() {
        let mut thumb = Thumbnail::zeros(2, 2, 1);
        let sliver = Polygon::from(vec![[0.0, 0.0], [50000.0, 0.0], [50000.0, 1.0]]);
        draw_perimeter(&mut thumb, &sliver, 1.0);
        assert_eq!(thumb.get(ImageTensorCoord { row: 0, col: 0 }, 0), Some(1.0));
        assert_eq!(thumb.get(ImageTensorCoord { row: 0, col: 1 }, 0), Some(1.0));
        assert_eq!(thumb.as_array().sum(), 2.0);
    }
}
