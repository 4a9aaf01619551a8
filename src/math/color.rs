/// A RGBA `Color`. Each color component is a floating point value
/// with a range from 0 to 1.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl From<Color> for [u8; 4] {
    fn from(color: Color) -> Self {
        let v = color.clip();
        [
            (v.r * 255.0).round() as u8,
            (v.g * 255.0).round() as u8,
            (v.b * 255.0).round() as u8,
            (v.a * 255.0).round() as u8,
        ]
    }
}

impl From<[u8; 4]> for Color {
    fn from(v: [u8; 4]) -> Self {
        Color::new(
            f32::from(v[0]) / 255.0,
            f32::from(v[1]) / 255.0,
            f32::from(v[2]) / 255.0,
            f32::from(v[3]) / 255.0,
        )
    }
}

impl From<[f32; 4]> for Color {
    fn from(v: [f32; 4]) -> Self {
        Color::new(v[0], v[1], v[2], v[3])
    }
}

impl Color {
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Color { r, g, b, a }
    }

    /// Clamps every component into [0, 1].
    pub fn clip(&self) -> Self {
        let f = |v: f32| v.max(0.0).min(1.0);
        Color::new(f(self.r), f(self.g), f(self.b), f(self.a))
    }

    #[inline]
    pub fn rgba(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    #[inline]
    pub fn white() -> Self {
        Color::new(1.0, 1.0, 1.0, 1.0)
    }

    #[inline]
    pub fn black() -> Self {
        Color::new(0.0, 0.0, 0.0, 1.0)
    }

    #[inline]
    pub fn transparent() -> Self {
        Color::new(0.0, 0.0, 0.0, 0.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn convert() {
        let bytes: [u8; 4] = Color::new(1.0, 0.5, 0.0, 2.0).into();
        assert_eq!(bytes, [255, 128, 0, 255]);
        assert_eq!(Color::from([255, 255, 255, 255]), Color::white());
    }
}
