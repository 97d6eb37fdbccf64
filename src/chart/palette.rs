use super::Color;
use rand::Rng;

impl Color {
    /// Converts hue, saturation and brightness (each `0.0..=1.0`) to RGB.
    ///
    /// Only the fractional part of `hue` is used.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_hsb(hue: f64, saturation: f64, brightness: f64) -> Self {
        let channel = |x: f64| (x.clamp(0.0, 1.0) * 255.0 + 0.5) as u8;

        let saturation = saturation.clamp(0.0, 1.0);
        let brightness = brightness.clamp(0.0, 1.0);

        if saturation == 0.0 {
            let v = channel(brightness);
            return Self::rgb(v, v, v);
        }

        let h = (hue - hue.floor()) * 6.0;
        let f = h - h.floor();
        let p = brightness * (1.0 - saturation);
        let q = brightness * (1.0 - saturation * f);
        let t = brightness * (1.0 - saturation * (1.0 - f));

        let (r, g, b) = match h as u8 {
            0 => (brightness, t, p),
            1 => (q, brightness, p),
            2 => (p, brightness, t),
            3 => (p, q, brightness),
            4 => (t, p, brightness),
            _ => (brightness, p, q),
        };

        Self::rgb(channel(r), channel(g), channel(b))
    }
}

/// Creates `count` bright line colors with random hue.
///
/// Saturation stays in `0.6..0.8`, so lines remain readable on a white background.
pub fn random_colors<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<Color> {
    (0..count)
        .map(|_| {
            let hue: f64 = rng.gen();
            let saturation = f64::from(rng.gen_range(6_000..8_000_u32)) / 10_000.0;
            Color::from_hsb(hue, saturation, 1.0)
        })
        .collect()
}
