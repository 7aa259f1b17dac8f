use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, ImageBuffer, Luma, RgbImage};

use crate::config::PreprocessConfig;

/// One binarized bitmap per extraction strategy.
///
/// Announcement screenshots mix three text regimes: orange/red highlighted
/// headers, glowing high-luminance callouts, and plain dark body text.
/// Each regime gets its own strategy tuned for Tesseract (dark text on
/// light background).
pub struct PreprocessedSet {
    pub standard: GrayImage,
    pub highlighted: GrayImage,
    pub bright: GrayImage,
}

/// Produces all three strategy bitmaps from one source image.
pub fn preprocess(img: &DynamicImage, config: &PreprocessConfig) -> PreprocessedSet {
    let rgb = img.to_rgb8();
    PreprocessedSet {
        standard: preprocess_standard(img, config),
        highlighted: preprocess_highlighted(&rgb, config),
        bright: preprocess_bright(img, config),
    }
}

/// Grayscale conversion, optional 2x upscale, Otsu binarization.
/// Optimized for dense body text.
fn preprocess_standard(img: &DynamicImage, config: &PreprocessConfig) -> GrayImage {
    let mut gray = img.to_luma8();
    if config.standard_upscale {
        let (w, h) = gray.dimensions();
        gray = imageops::resize(&gray, w * 2, h * 2, FilterType::CatmullRom);
    }
    let level = otsu_level(&gray);
    binarize(&gray, level)
}

/// Hue-band mask for orange/red highlighted header text.
///
/// Red wraps across 0 degrees, so the mask needs two hue bands. The mask
/// is cleaned with a morphological close-then-open pass (removes speckle
/// without breaking strokes), inverted for Tesseract, upscaled with cubic
/// interpolation, and sharpened.
fn preprocess_highlighted(rgb: &RgbImage, config: &PreprocessConfig) -> GrayImage {
    let (width, height) = rgb.dimensions();
    let mut mask: GrayImage = ImageBuffer::new(width, height);

    for (x, y, pixel) in rgb.enumerate_pixels() {
        let (h, s, v) = rgb_to_hsv(pixel[0], pixel[1], pixel[2]);
        let in_orange = h >= config.orange_hue_min && h <= config.orange_hue_max;
        let in_red = h >= config.red_hue_min || h <= config.red_hue_max;
        let value = if (in_orange || in_red)
            && s >= config.min_saturation
            && v >= config.min_value
        {
            255u8 // highlight text
        } else {
            0u8
        };
        mask.put_pixel(x, y, Luma([value]));
    }

    let cleaned = open3x3(&close3x3(&mask));
    let inverted = invert(&cleaned);
    let scale = config.highlighted_scale.max(1);
    let upscaled = imageops::resize(
        &inverted,
        width * scale,
        height * scale,
        FilterType::CatmullRom,
    );
    imageops::unsharpen(&upscaled, 1.5, 4)
}

/// Percentile threshold on the luminance channel for glow/highlight text.
fn preprocess_bright(img: &DynamicImage, config: &PreprocessConfig) -> GrayImage {
    let gray = img.to_luma8();
    let (width, height) = gray.dimensions();
    let level = percentile_level(&gray, config.bright_percentile);

    let mut mask: GrayImage = ImageBuffer::new(width, height);
    for (x, y, pixel) in gray.enumerate_pixels() {
        let value = if pixel[0] >= level { 255u8 } else { 0u8 };
        mask.put_pixel(x, y, Luma([value]));
    }

    let cleaned = open3x3(&mask);
    let inverted = invert(&cleaned);
    let scale = config.bright_scale.max(1);
    imageops::resize(
        &inverted,
        width * scale,
        height * scale,
        FilterType::CatmullRom,
    )
}

/// Converts an RGB pixel to (hue degrees 0-360, saturation 0-1, value 0-1).
fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let r = r as f32 / 255.0;
    let g = g as f32 / 255.0;
    let b = b as f32 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (((g - b) / delta).rem_euclid(6.0))
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };

    let s = if max == 0.0 { 0.0 } else { delta / max };

    (h, s, max)
}

/// Selects the global threshold maximizing between-class variance
/// (Otsu's method).
fn otsu_level(img: &GrayImage) -> u8 {
    let mut histogram = [0u32; 256];
    for pixel in img.pixels() {
        histogram[pixel[0] as usize] += 1;
    }

    let total = img.width() as u64 * img.height() as u64;
    if total == 0 {
        return 128;
    }

    let sum_all: u64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &c)| i as u64 * c as u64)
        .sum();

    let mut best_level = 128u8;
    let mut best_variance = 0.0f64;
    let mut weight_bg = 0u64;
    let mut sum_bg = 0u64;

    for level in 0..256usize {
        weight_bg += histogram[level] as u64;
        if weight_bg == 0 {
            continue;
        }
        let weight_fg = total - weight_bg;
        if weight_fg == 0 {
            break;
        }
        sum_bg += level as u64 * histogram[level] as u64;

        let mean_bg = sum_bg as f64 / weight_bg as f64;
        let mean_fg = (sum_all - sum_bg) as f64 / weight_fg as f64;
        let variance =
            weight_bg as f64 * weight_fg as f64 * (mean_bg - mean_fg) * (mean_bg - mean_fg);

        if variance > best_variance {
            best_variance = variance;
            best_level = level as u8;
        }
    }

    best_level
}

/// Returns the lowest gray level at or above the given fraction of the
/// cumulative histogram.
fn percentile_level(img: &GrayImage, percentile: f32) -> u8 {
    let mut histogram = [0u64; 256];
    for pixel in img.pixels() {
        histogram[pixel[0] as usize] += 1;
    }

    let total = img.width() as u64 * img.height() as u64;
    if total == 0 {
        return 255;
    }

    let target = (total as f64 * percentile.clamp(0.0, 1.0) as f64) as u64;
    let mut cumulative = 0u64;
    for (level, &count) in histogram.iter().enumerate() {
        cumulative += count;
        if cumulative >= target {
            return level as u8;
        }
    }
    255
}

/// Pixels at or below the level become black (text), the rest white.
/// Otsu reports the last background level, so the dark class is inclusive.
fn binarize(img: &GrayImage, level: u8) -> GrayImage {
    let mut output = ImageBuffer::new(img.width(), img.height());
    for (x, y, pixel) in img.enumerate_pixels() {
        let value = if pixel[0] <= level { 0u8 } else { 255u8 };
        output.put_pixel(x, y, Luma([value]));
    }
    output
}

fn invert(img: &GrayImage) -> GrayImage {
    let mut output = ImageBuffer::new(img.width(), img.height());
    for (x, y, pixel) in img.enumerate_pixels() {
        output.put_pixel(x, y, Luma([255 - pixel[0]]));
    }
    output
}

/// 3x3 dilation on a binary image (max of neighborhood).
fn dilate3x3(img: &GrayImage) -> GrayImage {
    neighborhood_pass(img, 0, |acc, v| acc.max(v))
}

/// 3x3 erosion on a binary image (min of neighborhood).
fn erode3x3(img: &GrayImage) -> GrayImage {
    neighborhood_pass(img, 255, |acc, v| acc.min(v))
}

/// Closing: dilate then erode. Fills small gaps inside strokes.
fn close3x3(img: &GrayImage) -> GrayImage {
    erode3x3(&dilate3x3(img))
}

/// Opening: erode then dilate. Removes isolated speckle.
fn open3x3(img: &GrayImage) -> GrayImage {
    dilate3x3(&erode3x3(img))
}

/// Folds each pixel's in-bounds 3x3 neighborhood, starting from `init`.
/// Out-of-bounds neighbors are ignored (border behaves as replicate).
fn neighborhood_pass(
    img: &GrayImage,
    init: u8,
    fold: impl Fn(u8, u8) -> u8,
) -> GrayImage {
    let (width, height) = img.dimensions();
    let mut output = ImageBuffer::new(width, height);

    for y in 0..height {
        for x in 0..width {
            let mut acc = init;
            for dy in -1i32..=1 {
                for dx in -1i32..=1 {
                    let nx = x as i32 + dx;
                    let ny = y as i32 + dy;
                    if nx >= 0 && ny >= 0 && (nx as u32) < width && (ny as u32) < height {
                        acc = fold(acc, img.get_pixel(nx as u32, ny as u32)[0]);
                    }
                }
            }
            output.put_pixel(x, y, Luma([acc]));
        }
    }

    output
}
