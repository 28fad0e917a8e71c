use crate::pipeline::resolve_config;
use anyhow::Result;
use clap::Args;
use sortpuz_state::Rgb;
use sortpuz_vision::ColorClassifier;
use std::path::Path;

#[derive(Debug, Clone, Args)]
pub struct PaletteArgs {}

impl PaletteArgs {
    pub fn execute(&self, config: Option<&Path>) -> Result<()> {
        let classifier = ColorClassifier::from_config(&resolve_config(config)?);
        let t = classifier.tolerance();
        println!("Tolerance: +/-{} per channel", t);
        for (i, color) in classifier.palette().iter().enumerate() {
            let [r, g, b] = color.rgb.channels();
            println!(
                "{:>2}. {:<12} {:<16} R {}-{}  G {}-{}  B {}-{}",
                i + 1,
                color.name,
                color.rgb.to_string(),
                r.saturating_sub(t),
                r.saturating_add(t),
                g.saturating_sub(t),
                g.saturating_add(t),
                b.saturating_sub(t),
                b.saturating_add(t),
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Args)]
pub struct ClassifyArgs {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
}

impl ClassifyArgs {
    pub fn execute(&self, config: Option<&Path>) -> Result<()> {
        let classifier = ColorClassifier::from_config(&resolve_config(config)?);
        let color = classifier.classify(Rgb::new(self.r, self.g, self.b));
        if color.is_classified() {
            println!("{} -> {}", color.rgb(), color.label());
        } else {
            println!(
                "{} -> no palette color within +/-{}",
                color.rgb(),
                classifier.tolerance()
            );
        }
        Ok(())
    }
}
