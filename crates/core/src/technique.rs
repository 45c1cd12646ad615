use serde::{Deserialize, Serialize};

/// Upper bound on either side of an image produced by an upscale step.
pub const MAX_DIMENSION: u32 = 16_384;

/// One image transformation. The imaging itself lives in `imgtext-ocr`;
/// this is the configurable description of it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TransformStep {
    Grayscale,
    /// Percentage change in contrast; positive increases it.
    Contrast { percent: f32 },
    /// Rotation about the centre by an arbitrary angle, clockwise, in degrees.
    Rotate { degrees: f32 },
    Rotate90,
    Rotate180,
    Rotate270,
    /// Translate the image contents; uncovered pixels become white.
    Shift { dx: i32, dy: i32 },
    Upscale { factor: u32 },
    Brighten { amount: i32 },
    Sharpen { sigma: f32, threshold: i32 },
    /// Downscale very large images, convert to grayscale and stretch contrast
    /// to the full 0–255 range.
    Normalize,
}

impl std::fmt::Display for TransformStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransformStep::Grayscale => write!(f, "grayscale"),
            TransformStep::Contrast { percent } => write!(f, "contrast({percent:+}%)"),
            TransformStep::Rotate { degrees } => write!(f, "rotate({degrees}°)"),
            TransformStep::Rotate90 => write!(f, "rotate90"),
            TransformStep::Rotate180 => write!(f, "rotate180"),
            TransformStep::Rotate270 => write!(f, "rotate270"),
            TransformStep::Shift { dx, dy } => write!(f, "shift({dx}, {dy})"),
            TransformStep::Upscale { factor } => write!(f, "upscale(x{factor})"),
            TransformStep::Brighten { amount } => write!(f, "brighten({amount:+})"),
            TransformStep::Sharpen { sigma, threshold } => {
                write!(f, "sharpen(sigma={sigma}, threshold={threshold})")
            }
            TransformStep::Normalize => write!(f, "normalize"),
        }
    }
}

/// A named sequence of steps. Each technique produces one side output
/// named `<stem>_<name>.<ext>`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Technique {
    pub name: String,
    pub steps: Vec<TransformStep>,
}

impl Technique {
    pub fn new(name: impl Into<String>, steps: Vec<TransformStep>) -> Self {
        Self { name: name.into(), steps }
    }
}

/// Name reserved for the canonical copy of the chosen side output.
pub const BEST_NAME: &str = "best";

/// Technique names become file-name suffixes: they must be non-empty,
/// unique, free of path separators and distinct from [`BEST_NAME`].
pub fn check_technique_names(techniques: &[Technique]) -> Result<(), String> {
    let mut seen = std::collections::HashSet::new();
    for technique in techniques {
        let name = technique.name.as_str();
        if name.trim().is_empty() {
            return Err("technique name must not be empty".to_string());
        }
        if name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(format!("technique name '{name}' must not contain path separators"));
        }
        if name.eq_ignore_ascii_case(BEST_NAME) {
            return Err(format!("technique name '{name}' is reserved"));
        }
        if !seen.insert(name) {
            return Err(format!("duplicate technique name '{name}'"));
        }
    }
    Ok(())
}

/// The five-way sweep: grayscale alone, then grayscale combined with
/// contrast, quarter turns and a 2x upscale.
pub fn experimental_techniques() -> Vec<Technique> {
    use TransformStep::*;
    vec![
        Technique::new("grayscale", vec![Grayscale]),
        Technique::new("contrast", vec![Grayscale, Contrast { percent: 30.0 }]),
        Technique::new("rotate90", vec![Grayscale, Rotate90]),
        Technique::new("rotate270", vec![Grayscale, Rotate270]),
        Technique::new("resize", vec![Grayscale, Upscale { factor: 2 }]),
    ]
}

/// Orientation sweep: untouched copy, grayscale, and two rotations.
pub fn orientation_techniques() -> Vec<Technique> {
    use TransformStep::*;
    vec![
        Technique::new("original", vec![]),
        Technique::new("grayscale", vec![Grayscale]),
        Technique::new("rotated_90", vec![Rotate90]),
        Technique::new("rotated_180", vec![Rotate180]),
    ]
}

/// Single-output enhancement chain applied before OCR.
pub fn enhancement_steps() -> Vec<TransformStep> {
    use TransformStep::*;
    vec![
        Grayscale,
        Contrast { percent: 30.0 },
        Rotate { degrees: 0.5 },
        Shift { dx: -5, dy: -5 },
        Upscale { factor: 2 },
        Brighten { amount: 20 },
        Contrast { percent: -20.0 },
        Sharpen { sigma: 3.0, threshold: 1 },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_deserialize_from_tagged_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            techniques: Vec<Technique>,
        }

        let src = r#"
            [[techniques]]
            name = "sharp"
            steps = [{ op = "grayscale" }, { op = "sharpen", sigma = 1.5, threshold = 4 }]

            [[techniques]]
            name = "tilt"
            steps = [{ op = "rotate", degrees = -2.0 }, { op = "rotate90" }]
        "#;
        let parsed: Wrapper = toml::from_str(src).unwrap();
        assert_eq!(parsed.techniques.len(), 2);
        assert_eq!(
            parsed.techniques[0].steps,
            vec![
                TransformStep::Grayscale,
                TransformStep::Sharpen { sigma: 1.5, threshold: 4 }
            ]
        );
        assert_eq!(
            parsed.techniques[1].steps,
            vec![TransformStep::Rotate { degrees: -2.0 }, TransformStep::Rotate90]
        );
    }

    #[test]
    fn unknown_op_is_rejected() {
        let err = toml::from_str::<Technique>(r#"name = "x"
steps = [{ op = "sepia" }]"#);
        assert!(err.is_err());
    }

    #[test]
    fn builtin_sets_have_unique_names() {
        for set in [experimental_techniques(), orientation_techniques()] {
            let mut names: Vec<&str> = set.iter().map(|t| t.name.as_str()).collect();
            names.sort();
            names.dedup();
            assert_eq!(names.len(), set.len());
        }
    }

    #[test]
    fn technique_names_are_checked() {
        let named = |names: &[&str]| -> Vec<Technique> {
            names.iter().map(|n| Technique::new(*n, vec![TransformStep::Grayscale])).collect()
        };
        assert!(check_technique_names(&named(&["gray", "tilt"])).is_ok());
        assert!(check_technique_names(&named(&["best"])).is_err());
        assert!(check_technique_names(&named(&["Best"])).is_err());
        assert!(check_technique_names(&named(&["gray", "gray"])).is_err());
        assert!(check_technique_names(&named(&[" "])).is_err());
        assert!(check_technique_names(&named(&["../escape"])).is_err());
        assert!(check_technique_names(&named(&["a\\b"])).is_err());
        assert!(check_technique_names(&experimental_techniques()).is_ok());
        assert!(check_technique_names(&orientation_techniques()).is_ok());
    }

    #[test]
    fn step_display() {
        assert_eq!(TransformStep::Contrast { percent: 30.0 }.to_string(), "contrast(+30%)");
        assert_eq!(TransformStep::Shift { dx: -5, dy: 2 }.to_string(), "shift(-5, 2)");
    }
}
