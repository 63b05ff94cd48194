//! YAML recipes and cancellation through the public API.

use xray_core::PixelBuffer;
use xray_ops::{CancelToken, Operation, OpsError, Pipeline};

const RECIPE: &str = r#"
steps:
  - op: median
    kernel_size: 3
  - op: gamma
    gamma: 0.5
  - op: normalize
  - op: mirror
    axis: vertical
  - op: bin
    size: 2
"#;

fn gradient(w: u32, h: u32) -> PixelBuffer {
    PixelBuffer::from_fn(w, h, |x, y| {
        let v = ((x * 255) / w.max(1)) as u8;
        [v, (y * 10) as u8, 128, 255]
    })
}

#[test]
fn recipe_matches_manual_calls() {
    use xray_ops::{filter, tone, transform};

    let src = gradient(20, 10);
    let piped = Pipeline::from_yaml(RECIPE).unwrap().run(&src).unwrap();

    let manual = filter::median(&src, 3).unwrap();
    let manual = tone::gamma(&manual, 0.5, 1.0).unwrap();
    let manual = tone::normalize(&manual, 0.0, 255.0).unwrap();
    let manual = transform::mirror(&manual, transform::Mirror::Vertical).unwrap();
    let manual = transform::bin(&manual, 2).unwrap();

    assert_eq!(piped, manual);
    assert_eq!(piped.dimensions(), (10, 5));
}

#[test]
fn every_step_is_listed_by_name() {
    let p = Pipeline::from_yaml(RECIPE).unwrap();
    let names: Vec<&str> = p.steps.iter().map(Operation::name).collect();
    assert_eq!(names, ["median", "gamma", "normalize", "mirror", "bin"]);
}

#[test]
fn invalid_rotation_is_rejected_at_parse() {
    let err = Pipeline::from_yaml("steps:\n  - op: rotate\n    angle: 45\n").unwrap_err();
    assert!(matches!(err, OpsError::Yaml(_)));
    assert!(err.to_string().contains("90, 180 or 270"), "{err}");
}

#[test]
fn cancelled_token_stops_slow_filters() {
    let token = CancelToken::new();
    token.cancel();
    let src = gradient(64, 64);
    for yaml in ["op: median", "op: gaussian", "op: variance", "op: sobel"] {
        let op: Operation = serde_yaml::from_str(yaml).unwrap();
        assert!(
            matches!(op.apply_cancellable(&src, &token), Err(OpsError::Cancelled)),
            "{yaml}"
        );
    }
}

#[cfg(feature = "fft")]
#[test]
fn frequency_filter_step() {
    let recipe = "steps:\n  - op: frequency_filter\n    filter:\n      kind: high_pass\n      cutoff: 0\n";
    let src = PixelBuffer::filled(8, 8, [60, 90, 120, 200]);
    let out = Pipeline::from_yaml(recipe).unwrap().run(&src).unwrap();
    // all-pass mask: gray mean survives, alpha is copied
    assert!(out.pixels().all(|p| p == [90, 90, 90, 200]));
}

#[cfg(feature = "parallel")]
#[test]
fn executor_runs_recipe() {
    let exec = xray_ops::Executor::new(2).unwrap();
    let src = gradient(32, 16);
    let p = Pipeline::from_yaml(RECIPE).unwrap();
    let expected = p.run(&src).unwrap();
    assert_eq!(exec.submit(src, p).wait().unwrap(), expected);
}
