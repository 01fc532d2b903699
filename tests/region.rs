//! RegionOfInterest construction, parsing and cropping tests.

use activity_meter::{ActivityError, RegionOfInterest};
use image::{DynamicImage, GenericImageView, Rgb, RgbImage};

fn gradient_frame(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([x as u8, y as u8, 0])
    }))
}

#[test]
fn new_accepts_ordered_bounds() {
    let region = RegionOfInterest::new(200, 500, 100, 300).expect("valid region");
    assert_eq!(region.top(), 200);
    assert_eq!(region.bottom(), 500);
    assert_eq!(region.left(), 100);
    assert_eq!(region.right(), 300);
    assert_eq!(region.width(), 200);
    assert_eq!(region.height(), 300);
    assert_eq!(region.area(), 60_000);
}

#[test]
fn new_rejects_empty_or_inverted_bounds() {
    for (top, bottom, left, right) in [(10, 10, 0, 5), (20, 10, 0, 5), (0, 5, 7, 7), (0, 5, 9, 3)] {
        let result = RegionOfInterest::new(top, bottom, left, right);
        assert!(
            matches!(result, Err(ActivityError::InvalidRegion { .. })),
            "expected InvalidRegion for {top},{bottom},{left},{right}"
        );
    }
}

#[test]
fn parse_and_display_agree() {
    let region: RegionOfInterest = " 200, 500 ,100,300".parse().expect("parse");
    assert_eq!(region, RegionOfInterest::new(200, 500, 100, 300).unwrap());
    assert_eq!(region.to_string(), "200,500,100,300");
}

#[test]
fn parse_rejects_malformed_input() {
    for input in ["", "1,2,3", "1,2,3,4,5", "a,b,c,d", "-1,2,3,4"] {
        let result = input.parse::<RegionOfInterest>();
        assert!(
            matches!(result, Err(ActivityError::InvalidRegionSpec(_))),
            "expected InvalidRegionSpec for {input:?}, got {result:?}"
        );
    }
}

#[test]
fn crop_selects_rows_top_to_bottom_and_columns_left_to_right() {
    let frame = gradient_frame(8, 6);
    let region = RegionOfInterest::new(1, 4, 2, 5).unwrap();

    let cropped = region.crop(&frame).expect("crop");
    assert_eq!(cropped.dimensions(), (3, 3));

    let rgb = cropped.to_rgb8();
    assert_eq!(rgb.get_pixel(0, 0), &Rgb([2, 1, 0]));
    assert_eq!(rgb.get_pixel(2, 2), &Rgb([4, 3, 0]));
}

#[test]
fn crop_allows_region_touching_frame_edge() {
    let frame = gradient_frame(8, 6);
    let region = RegionOfInterest::new(0, 6, 0, 8).unwrap();
    let cropped = region.crop(&frame).expect("full-frame crop");
    assert_eq!(cropped.dimensions(), (8, 6));
}

#[test]
fn crop_rejects_region_outside_frame() {
    let frame = gradient_frame(8, 6);

    let too_tall = RegionOfInterest::new(0, 7, 0, 8).unwrap();
    let error = too_tall.crop(&frame).unwrap_err();
    assert!(matches!(error, ActivityError::InvalidRegion { bottom: 7, .. }));
    assert!(error.to_string().contains("8x6"));

    let too_wide = RegionOfInterest::new(0, 6, 0, 9).unwrap();
    assert!(too_wide.check_within(8, 6).is_err());
    assert!(too_wide.check_within(9, 6).is_ok());
}
