use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Entity colours: one per wiki, shared by every panel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct EntityColors {
    colors: Vec<Color32>,
    default_color: Color32,
}

impl EntityColors {
    pub fn new(n_entities: usize) -> Self {
        EntityColors {
            colors: generate_palette(n_entities),
            default_color: Color32::GRAY,
        }
    }

    pub fn color_for(&self, entity: usize) -> Color32 {
        self.colors
            .get(entity)
            .copied()
            .unwrap_or(self.default_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_distinct() {
        let palette = generate_palette(4);
        assert_eq!(palette.len(), 4);
        for (i, a) in palette.iter().enumerate() {
            for b in &palette[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn test_unknown_entity_is_gray() {
        let colors = EntityColors::new(2);
        assert_ne!(colors.color_for(1), Color32::GRAY);
        assert_eq!(colors.color_for(5), Color32::GRAY);
    }
}
