use sortpuz_data::{NamedColor, Palette, ParseConfig, Tolerance};
use sortpuz_state::{ClassifiedColor, Rgb};
use tracing::trace;

/// True when every channel of `sample` is within `tolerance` of `reference`
pub fn within_tolerance(sample: Rgb, reference: Rgb, tolerance: Tolerance) -> bool {
    sample
        .channels()
        .iter()
        .zip(reference.channels())
        .all(|(s, r)| s.abs_diff(r) <= tolerance)
}

/// Label a sampled color with the first palette entry whose per-channel
/// window contains it.
///
/// Palette order decides between overlapping windows. A sample outside every
/// window comes back with an empty label.
pub fn classify(sample: Rgb, palette: &Palette, tolerance: Tolerance) -> ClassifiedColor {
    match first_match(sample, palette, tolerance) {
        Some(color) => ClassifiedColor::new(color.name.as_str(), sample),
        None => {
            trace!("No palette match for {}", sample);
            ClassifiedColor::unclassified(sample)
        }
    }
}

fn first_match(sample: Rgb, palette: &Palette, tolerance: Tolerance) -> Option<&NamedColor> {
    palette
        .iter()
        .find(|color| within_tolerance(sample, color.rgb, tolerance))
}

/// A palette and tolerance bundled for repeated classification
#[derive(Debug, Clone)]
pub struct ColorClassifier {
    palette: Palette,
    tolerance: Tolerance,
}

impl ColorClassifier {
    pub fn new(palette: Palette, tolerance: Tolerance) -> Self {
        Self { palette, tolerance }
    }

    pub fn from_config(config: &ParseConfig) -> Self {
        Self::new(config.palette.clone(), config.tolerance)
    }

    pub fn classify(&self, sample: Rgb) -> ClassifiedColor {
        classify(sample, &self.palette, self.tolerance)
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn tolerance(&self) -> Tolerance {
        self.tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sortpuz_data::defaults;

    fn palette(entries: &[(&str, [u8; 3])]) -> Palette {
        Palette::new(
            entries
                .iter()
                .map(|&(name, rgb)| NamedColor::new(name, Rgb::from(rgb)))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_exact_reference_matches_itself() {
        let palette = defaults::palette();
        for color in &palette {
            for tolerance in [0, 5, defaults::TOLERANCE] {
                let result = classify(color.rgb, &palette, tolerance);
                assert_eq!(result.label(), color.name, "tolerance {}", tolerance);
                assert_eq!(result.rgb(), color.rgb);
            }
        }
    }

    #[test]
    fn test_tolerance_boundary_is_inclusive() {
        let palette = palette(&[("Gray", [100, 100, 100])]);
        let tolerance = 7;

        for sample in [[107, 107, 107], [93, 93, 93], [107, 93, 100]] {
            let result = classify(Rgb::from(sample), &palette, tolerance);
            assert_eq!(result.label(), "Gray", "sample {:?}", sample);
        }
        for sample in [[108, 100, 100], [100, 92, 100], [100, 100, 108]] {
            let result = classify(Rgb::from(sample), &palette, tolerance);
            assert!(!result.is_classified(), "sample {:?}", sample);
        }
    }

    #[test]
    fn test_boundary_at_channel_limits() {
        let palette = palette(&[("White", [255, 255, 255]), ("Black", [0, 0, 0])]);
        assert_eq!(classify(Rgb::new(250, 255, 251), &palette, 5).label(), "White");
        assert_eq!(classify(Rgb::new(0, 5, 3), &palette, 5).label(), "Black");
        assert_eq!(classify(Rgb::new(0, 6, 3), &palette, 5).label(), "");
    }

    #[test]
    fn test_first_match_wins_on_overlap() {
        let sample = Rgb::new(110, 110, 110);
        let forward = palette(&[("A", [100, 100, 100]), ("B", [118, 118, 118])]);
        let reverse = palette(&[("B", [118, 118, 118]), ("A", [100, 100, 100])]);

        // Closer to B, but A comes first
        assert_eq!(classify(sample, &forward, 10).label(), "A");
        assert_eq!(classify(sample, &reverse, 10).label(), "B");
    }

    #[test]
    fn test_no_match_is_empty_label() {
        let palette = defaults::palette();
        let result = classify(Rgb::new(10, 10, 10), &palette, defaults::TOLERANCE);
        assert_eq!(result.label(), "");
        assert!(!result.is_classified());
        assert_eq!(result.rgb(), Rgb::new(10, 10, 10));
    }

    #[test]
    fn test_classifier_matches_free_function() {
        let config = ParseConfig::default();
        let classifier = ColorClassifier::from_config(&config);
        let sample = Rgb::new(220, 80, 85);
        assert_eq!(
            classifier.classify(sample),
            classify(sample, &config.palette, config.tolerance)
        );
        assert_eq!(classifier.classify(sample).label(), "Red");
        assert_eq!(classifier.palette(), &config.palette);
        assert_eq!(classifier.tolerance(), config.tolerance);
    }
}
