//! Prominent color extraction from thumbnail images
//!
//! The image is downscaled, quantized to 5 bits per channel and reduced with a
//! median cut into at most [`MAX_COLORS`] swatches. Each [`SwatchKind`] then
//! picks the best-scoring swatch inside its saturation/lightness window.

use crate::color::Rgb;
use image::DynamicImage;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use tracing::{debug, warn};

/// Upper bound on the number of swatches produced by the median cut
pub const MAX_COLORS: usize = 64;

/// Images larger than this many pixels are downscaled before quantizing
const RESIZE_AREA: u32 = 112 * 112;

/// Pixels with lower alpha do not contribute to the palette
const MIN_ALPHA: u8 = 125;

const QUANTIZE_BITS: u8 = 5;
const HISTOGRAM_SIZE: usize = 1 << (QUANTIZE_BITS * 3);

const WEIGHT_SATURATION: f64 = 0.24;
const WEIGHT_LIGHTNESS: f64 = 0.52;
const WEIGHT_POPULATION: f64 = 0.24;

#[derive(Debug)]
pub enum PaletteError {
    Decode(image::ImageError),
    /// The image has no pixels at all
    Empty,
}

impl fmt::Display for PaletteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(e) => write!(f, "Image decode error: {}", e),
            Self::Empty => write!(f, "Image has no pixels"),
        }
    }
}

impl std::error::Error for PaletteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Decode(e) => Some(e),
            Self::Empty => None,
        }
    }
}

impl From<image::ImageError> for PaletteError {
    fn from(e: image::ImageError) -> Self {
        Self::Decode(e)
    }
}

/// Named swatch targets, in selection order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwatchKind {
    Vibrant,
    LightVibrant,
    DarkVibrant,
    Muted,
    LightMuted,
    DarkMuted,
}

impl SwatchKind {
    pub const ALL: [SwatchKind; 6] = [
        SwatchKind::Vibrant,
        SwatchKind::LightVibrant,
        SwatchKind::DarkVibrant,
        SwatchKind::Muted,
        SwatchKind::LightMuted,
        SwatchKind::DarkMuted,
    ];

    fn target(self) -> Target {
        const LIGHT: (f64, f64, f64) = (0.55, 0.74, 1.0);
        const NORMAL: (f64, f64, f64) = (0.3, 0.5, 0.7);
        const DARK: (f64, f64, f64) = (0.0, 0.26, 0.45);
        const VIBRANT: (f64, f64, f64) = (0.35, 1.0, 1.0);
        const MUTED: (f64, f64, f64) = (0.0, 0.3, 0.4);

        let (saturation, lightness) = match self {
            Self::Vibrant => (VIBRANT, NORMAL),
            Self::LightVibrant => (VIBRANT, LIGHT),
            Self::DarkVibrant => (VIBRANT, DARK),
            Self::Muted => (MUTED, NORMAL),
            Self::LightMuted => (MUTED, LIGHT),
            Self::DarkMuted => (MUTED, DARK),
        };
        Target {
            saturation,
            lightness,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vibrant => "Vibrant",
            Self::LightVibrant => "LightVibrant",
            Self::DarkVibrant => "DarkVibrant",
            Self::Muted => "Muted",
            Self::LightMuted => "LightMuted",
            Self::DarkMuted => "DarkMuted",
        }
    }
}

/// (min, target, max) windows
struct Target {
    saturation: (f64, f64, f64),
    lightness: (f64, f64, f64),
}

impl Target {
    fn accepts(&self, hsl: Hsl) -> bool {
        let (s_min, _, s_max) = self.saturation;
        let (l_min, _, l_max) = self.lightness;
        (s_min..=s_max).contains(&hsl.s) && (l_min..=l_max).contains(&hsl.l)
    }

    fn score(&self, hsl: Hsl, population: u32, max_population: u32) -> f64 {
        let saturation = WEIGHT_SATURATION * (1.0 - (hsl.s - self.saturation.1).abs());
        let lightness = WEIGHT_LIGHTNESS * (1.0 - (hsl.l - self.lightness.1).abs());
        let population =
            WEIGHT_POPULATION * (f64::from(population) / f64::from(max_population.max(1)));
        saturation + lightness + population
    }
}

/// A representative color and the number of pixels it stands for
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Swatch {
    pub rgb: Rgb,
    pub population: u32,
}

impl Swatch {
    fn hsl(&self) -> Hsl {
        Hsl::from(self.rgb)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Hsl {
    /// Degrees, 0..360
    h: f64,
    s: f64,
    l: f64,
}

impl From<Rgb> for Hsl {
    fn from(rgb: Rgb) -> Self {
        let r = f64::from(rgb.r) / 255.0;
        let g = f64::from(rgb.g) / 255.0;
        let b = f64::from(rgb.b) / 255.0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;
        let delta = max - min;

        if delta == 0.0 {
            return Self { h: 0.0, s: 0.0, l };
        }

        let s = delta / (1.0 - (2.0 * l - 1.0).abs());
        let h = 60.0
            * if max == r {
                ((g - b) / delta).rem_euclid(6.0)
            } else if max == g {
                (b - r) / delta + 2.0
            } else {
                (r - g) / delta + 4.0
            };

        Self { h, s, l }
    }
}

/// Colors that would dominate every palette without being useful as accents
fn is_ignored(rgb: Rgb) -> bool {
    let hsl = Hsl::from(rgb);
    let near_black = hsl.l <= 0.05;
    let near_white = hsl.l >= 0.95;
    // Skin tones and similar desaturated oranges
    let red_i_line = (10.0..=37.0).contains(&hsl.h) && hsl.s <= 0.82;
    near_black || near_white || red_i_line
}

#[derive(Debug)]
pub struct Palette {
    swatches: Vec<Swatch>,
    selected: Vec<(SwatchKind, Swatch)>,
}

impl Palette {
    pub fn from_image_bytes(bytes: &[u8]) -> Result<Self, PaletteError> {
        let image = image::load_from_memory(bytes)?;
        Self::from_image(&image)
    }

    pub fn from_image(image: &DynamicImage) -> Result<Self, PaletteError> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(PaletteError::Empty);
        }

        let area = width.saturating_mul(height);
        let rgba = if area > RESIZE_AREA {
            let scale = (f64::from(RESIZE_AREA) / f64::from(area)).sqrt();
            let w = ((f64::from(width) * scale).ceil() as u32).max(1);
            let h = ((f64::from(height) * scale).ceil() as u32).max(1);
            image.thumbnail(w, h).to_rgba8()
        } else {
            image.to_rgba8()
        };

        let mut histogram = vec![0u32; HISTOGRAM_SIZE];
        for pixel in rgba.pixels() {
            let [r, g, b, a] = pixel.0;
            if a < MIN_ALPHA {
                continue;
            }
            histogram[QuantizedColor::pack(r, g, b)] += 1;
        }

        let colors: Vec<QuantizedColor> = histogram
            .iter()
            .enumerate()
            .filter(|(_, count)| **count > 0)
            .map(|(packed, count)| QuantizedColor::unpack(packed, *count))
            .filter(|c| !is_ignored(c.to_rgb()))
            .collect();

        let swatches = quantize(colors, MAX_COLORS);
        debug!(swatches = swatches.len(), width, height, "Built palette");
        Ok(Self::with_swatches(swatches))
    }

    fn with_swatches(swatches: Vec<Swatch>) -> Self {
        let max_population = swatches.iter().map(|s| s.population).max().unwrap_or(0);
        let mut selected: Vec<(SwatchKind, Swatch)> = Vec::new();

        for kind in SwatchKind::ALL {
            let target = kind.target();
            let best = swatches
                .iter()
                .filter(|s| !selected.iter().any(|(_, used)| used == *s))
                .filter(|s| target.accepts(s.hsl()))
                .map(|s| (target.score(s.hsl(), s.population, max_population), s))
                .max_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
            if let Some((_, swatch)) = best {
                debug!(kind = kind.as_str(), color = %swatch.rgb, "Selected swatch");
                selected.push((kind, *swatch));
            }
        }

        Self { swatches, selected }
    }

    /// All swatches produced by quantization, unordered
    pub fn swatches(&self) -> &[Swatch] {
        &self.swatches
    }

    pub fn swatch(&self, kind: SwatchKind) -> Option<&Swatch> {
        self.selected
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, swatch)| swatch)
    }

    pub fn vibrant(&self) -> Option<Rgb> {
        self.swatch(SwatchKind::Vibrant).map(|s| s.rgb)
    }
}

/// Vibrant color of an encoded image, or `None` when it cannot be decoded or
/// has no vibrant swatch
pub fn extract_accent(bytes: &[u8]) -> Option<Rgb> {
    match Palette::from_image_bytes(bytes) {
        Ok(palette) => palette.vibrant(),
        Err(e) => {
            warn!(error = %e, size = bytes.len(), "Failed to extract accent color");
            None
        }
    }
}

/// A color reduced to 5 bits per channel
#[derive(Debug, Clone, Copy)]
struct QuantizedColor {
    channels: [u8; 3],
    count: u32,
}

impl QuantizedColor {
    const SHIFT: u8 = 8 - QUANTIZE_BITS;
    const MASK: usize = (1 << QUANTIZE_BITS) - 1;

    fn pack(r: u8, g: u8, b: u8) -> usize {
        let q = |c: u8| usize::from(c >> Self::SHIFT);
        (q(r) << (QUANTIZE_BITS * 2)) | (q(g) << QUANTIZE_BITS) | q(b)
    }

    fn unpack(packed: usize, count: u32) -> Self {
        let c = |shift: u8| ((packed >> shift) & Self::MASK) as u8;
        Self {
            channels: [c(QUANTIZE_BITS * 2), c(QUANTIZE_BITS), c(0)],
            count,
        }
    }

    fn upscale(c: u8) -> u8 {
        (c << Self::SHIFT) | (c >> (QUANTIZE_BITS - Self::SHIFT))
    }

    fn to_rgb(self) -> Rgb {
        let [r, g, b] = self.channels;
        Rgb::new(Self::upscale(r), Self::upscale(g), Self::upscale(b))
    }
}

/// Median cut over a contiguous range of `colors`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColorBox {
    lower: usize,
    upper: usize,
    min: [u8; 3],
    max: [u8; 3],
    population: u64,
}

impl ColorBox {
    fn fit(colors: &[QuantizedColor], lower: usize, upper: usize) -> Self {
        let mut min = [u8::MAX; 3];
        let mut max = [0u8; 3];
        let mut population = 0u64;
        for color in &colors[lower..=upper] {
            for i in 0..3 {
                min[i] = min[i].min(color.channels[i]);
                max[i] = max[i].max(color.channels[i]);
            }
            population += u64::from(color.count);
        }
        Self {
            lower,
            upper,
            min,
            max,
            population,
        }
    }

    fn volume(&self) -> u32 {
        (0..3)
            .map(|i| u32::from(self.max[i] - self.min[i]) + 1)
            .product()
    }

    fn can_split(&self) -> bool {
        self.upper > self.lower
    }

    fn longest_dimension(&self) -> usize {
        (0..3)
            .max_by_key(|&i| (self.max[i] - self.min[i], std::cmp::Reverse(i)))
            .unwrap_or(0)
    }

    /// Sort the box's colors along its longest side and split at the median
    /// pixel. Returns the upper half; `self` keeps the lower half.
    fn split(&mut self, colors: &mut [QuantizedColor]) -> Self {
        let dim = self.longest_dimension();
        colors[self.lower..=self.upper].sort_by_key(|c| {
            let ch = c.channels;
            (ch[dim], ch[(dim + 1) % 3], ch[(dim + 2) % 3])
        });

        let midpoint = self.population / 2;
        let mut running = 0u64;
        let mut split_at = self.upper - 1;
        for i in self.lower..self.upper {
            running += u64::from(colors[i].count);
            if running >= midpoint {
                split_at = i;
                break;
            }
        }

        let upper_half = Self::fit(colors, split_at + 1, self.upper);
        *self = Self::fit(colors, self.lower, split_at);
        upper_half
    }

    fn average(&self, colors: &[QuantizedColor]) -> Swatch {
        let mut sums = [0u64; 3];
        for color in &colors[self.lower..=self.upper] {
            let rgb = color.to_rgb();
            let weight = u64::from(color.count);
            sums[0] += u64::from(rgb.r) * weight;
            sums[1] += u64::from(rgb.g) * weight;
            sums[2] += u64::from(rgb.b) * weight;
        }
        let population = self.population.max(1);
        let avg = |sum: u64| ((sum + population / 2) / population) as u8;
        Swatch {
            rgb: Rgb::new(avg(sums[0]), avg(sums[1]), avg(sums[2])),
            population: self.population.min(u64::from(u32::MAX)) as u32,
        }
    }
}

impl Ord for ColorBox {
    fn cmp(&self, other: &Self) -> Ordering {
        self.volume()
            .cmp(&other.volume())
            .then_with(|| other.lower.cmp(&self.lower))
    }
}

impl PartialOrd for ColorBox {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn quantize(mut colors: Vec<QuantizedColor>, max_colors: usize) -> Vec<Swatch> {
    if colors.is_empty() {
        return Vec::new();
    }

    if colors.len() <= max_colors {
        return colors
            .iter()
            .map(|c| Swatch {
                rgb: c.to_rgb(),
                population: c.count,
            })
            .collect();
    }

    let mut queue = BinaryHeap::with_capacity(max_colors);
    queue.push(ColorBox::fit(&colors, 0, colors.len() - 1));

    while queue.len() < max_colors {
        let Some(mut largest) = queue.pop() else {
            break;
        };
        if !largest.can_split() {
            queue.push(largest);
            break;
        }
        let upper = largest.split(&mut colors);
        queue.push(largest);
        queue.push(upper);
    }

    queue
        .iter()
        .map(|b| b.average(&colors))
        .filter(|s| !is_ignored(s.rgb))
        .collect()
}
