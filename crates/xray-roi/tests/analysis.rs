//! ROI analysis through the public API.

use approx::assert_relative_eq;
use xray_core::{Channel, PixelBuffer};
use xray_roi::metrics::{quality_index, snr, Grade};
use xray_roi::{
    analyze_roi, compare_rois, extract, roi_mask, AnalysisOptions, Region, RoiError,
};

fn phantom() -> PixelBuffer {
    // 64x64 background of 200 with a 40-level disc at (32, 32) radius 10
    PixelBuffer::from_fn(64, 64, |x, y| {
        let (dx, dy) = (x as f64 - 32.0, y as f64 - 32.0);
        let v = if (dx * dx + dy * dy).sqrt() <= 10.0 { 40 } else { 200 };
        [v, v, v, 255]
    })
}

#[test]
fn uniform_rectangle_has_infinite_snr() {
    let img = PixelBuffer::filled(10, 10, [128, 128, 128, 255]);
    let a = analyze_roi(&img, &Region::rectangle(0, 0, 10, 10), &AnalysisOptions::default()).unwrap();
    assert_eq!(a.pixel_count, 100);
    assert_eq!(a.area, 100.0);
    assert_eq!(a.statistics.mean, 128.0);
    assert_eq!(a.statistics.std_dev, 0.0);
    assert_eq!(a.metrics.unwrap().snr, f64::INFINITY);
}

#[test]
fn empty_samples_never_fail() {
    let empty: [u8; 0] = [];
    assert_eq!(snr(&empty), 0.0);
    assert_eq!(xray_math::stats::mean(&empty), 0.0);
    assert_eq!(quality_index(&empty).grade, Grade::NotAvailable);
}

#[test]
fn clipped_region_keeps_geometric_area() {
    let img = phantom();
    let a = analyze_roi(&img, &Region::rectangle(60, 60, 10, 10), &AnalysisOptions::default()).unwrap();
    assert_eq!(a.area, 100.0);
    assert_eq!(a.pixel_count, 16);

    let far = analyze_roi(&img, &Region::rectangle(100, 100, 4, 4), &AnalysisOptions::default()).unwrap();
    assert_eq!(far.pixel_count, 0);
    assert_eq!(far.statistics.mean, 0.0);
    assert_eq!(far.metrics.unwrap().snr, 0.0);
}

#[test]
fn circle_samples_match_mask() {
    let img = phantom();
    let disc = Region::circle(32.0, 32.0, 10.0);
    let samples = extract(&img, &disc, Channel::Gray).unwrap();
    let mask = roi_mask(64, 64, &disc);
    assert_eq!(samples.len(), mask.iter().filter(|&&m| m == 1).count());
    assert!(samples.iter().all(|&v| v == 40));

    let a = analyze_roi(&img, &disc, &AnalysisOptions::default()).unwrap();
    assert_relative_eq!(a.area, std::f64::consts::PI * 100.0);
    assert_eq!(a.pixel_count, samples.len());
}

#[test]
fn disc_against_background() {
    let img = phantom();
    let opts = AnalysisOptions {
        channel: Channel::Red,
        background: Some(Region::rectangle(0, 0, 8, 8)),
        reference_intensity: Some(200.0),
        thickness: 2.0,
        ..Default::default()
    };
    let a = analyze_roi(&img, &Region::circle(32.0, 32.0, 6.0), &opts).unwrap();
    let m = a.metrics.unwrap();
    // flat background: zero noise
    assert_eq!(m.cnr, Some(f64::INFINITY));
    assert_relative_eq!(m.transmission.unwrap(), 20.0);
    assert_relative_eq!(m.min_transmission.unwrap(), 20.0);
    assert_relative_eq!(m.attenuation.unwrap(), 5f64.ln() / 2.0);
}

#[test]
fn comparing_disc_and_background() {
    let img = phantom();
    let opts = AnalysisOptions::default();
    let disc = analyze_roi(&img, &Region::rectangle(30, 30, 4, 4), &opts).unwrap();
    let bg = analyze_roi(&img, &Region::rectangle(0, 0, 4, 4), &opts).unwrap();
    let c = compare_rois(&bg, &disc).unwrap();
    assert_relative_eq!(c.mean_difference, 160.0);
    assert_relative_eq!(c.mean_ratio, 5.0);
    assert_relative_eq!(c.area_ratio, 1.0);

    let other = analyze_roi(&PixelBuffer::new(8, 8), &Region::rectangle(0, 0, 4, 4), &opts).unwrap();
    assert!(matches!(compare_rois(&disc, &other), Err(RoiError::DimensionMismatch { .. })));
}

#[test]
fn analysis_serializes() {
    let img = phantom();
    let a = analyze_roi(&img, &Region::rectangle(0, 0, 4, 4), &AnalysisOptions::default()).unwrap();
    let yaml = serde_yaml::to_string(&a).unwrap();
    assert!(yaml.contains("shape: rectangle"), "{yaml}");
    assert!(yaml.contains("pixel_count: 16"), "{yaml}");
    let back: xray_roi::RoiAnalysis = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(back.pixel_count, 16);
}

#[test]
fn every_shape_measures_the_disc_interior() {
    let img = phantom();
    let shapes = [
        Region::circle(32.0, 32.0, 6.0),
        Region::ellipse(32.0, 32.0, 7.0, 4.0),
        Region::polygon(vec![
            xray_roi::Point::new(27.0, 27.0),
            xray_roi::Point::new(37.0, 28.0),
            xray_roi::Point::new(32.0, 38.0),
        ]),
    ];
    for region in &shapes {
        let a = analyze_roi(&img, region, &AnalysisOptions::default()).unwrap();
        assert_eq!(a.statistics.mean, 40.0, "{}", region.shape());
        assert_eq!(a.pixel_count, roi_mask(64, 64, region).iter().filter(|&&m| m == 1).count());
    }
}
