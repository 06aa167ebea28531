//! Pixel sampling: pick a sampling size under the pixel budget, rasterize
//! the source at that size, and turn every opaque pixel into a LAB vector.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use image::{DynamicImage, GenericImageView, RgbaImage, imageops, imageops::FilterType};
use palette::Lab;
use tracing::debug;

use crate::conversion::{rgb_from_u8, rgb_to_lab};
use crate::error::{Error, Result};

/// Something that can be drawn into an 8-bit RGBA buffer at any size.
pub trait RasterSource {
    fn dimensions(&self) -> (u32, u32);

    /// Produce a row-major RGBA8 buffer of exactly `width × height`.
    fn rasterize(&self, width: u32, height: u32) -> Result<RgbaImage>;
}

impl RasterSource for DynamicImage {
    fn dimensions(&self) -> (u32, u32) {
        GenericImageView::dimensions(self)
    }

    fn rasterize(&self, width: u32, height: u32) -> Result<RgbaImage> {
        if GenericImageView::dimensions(self) == (width, height) {
            return Ok(self.to_rgba8());
        }
        Ok(self
            .resize_exact(width, height, FilterType::Triangle)
            .to_rgba8())
    }
}

impl RasterSource for RgbaImage {
    fn dimensions(&self) -> (u32, u32) {
        RgbaImage::dimensions(self)
    }

    fn rasterize(&self, width: u32, height: u32) -> Result<RgbaImage> {
        if RgbaImage::dimensions(self) == (width, height) {
            return Ok(self.clone());
        }
        Ok(imageops::resize(self, width, height, FilterType::Triangle))
    }
}

/// Proportionally scaled dimensions whose product does not exceed
/// `max_pixels`. Images already within budget are left alone; otherwise
/// both sides are truncated, so an extreme aspect ratio can yield zero.
pub fn scaled_dimensions(width: u32, height: u32, max_pixels: usize) -> (u32, u32) {
    if (width as u64) * (height as u64) <= max_pixels as u64 {
        return (width, height);
    }
    let ratio = width as f64 / height as f64;
    let max_width = (ratio * max_pixels as f64).sqrt();
    (max_width as u32, (max_pixels as f64 / max_width) as u32)
}

// ------------------------------------------------------------
// Memoized conversion
// ------------------------------------------------------------

/// Per-call RGB → LAB cache keyed by the exact 8-bit triple.
///
/// Never shared between pipeline runs. Worth it only for images dominated
/// by a few flat colors; on varied content filling the map costs more than
/// the conversions it saves.
#[derive(Debug, Default)]
pub struct ConversionCache {
    entries: HashMap<[u8; 3], Lab>,
    hits: usize,
}

impl ConversionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn convert(&mut self, r: u8, g: u8, b: u8) -> Lab {
        match self.entries.entry([r, g, b]) {
            Entry::Occupied(entry) => {
                self.hits += 1;
                *entry.get()
            }
            Entry::Vacant(entry) => *entry.insert(rgb_to_lab(rgb_from_u8(r, g, b))),
        }
    }

    /// Number of distinct colors converted so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }
}

// ------------------------------------------------------------
// Sampling
// ------------------------------------------------------------

/// Convert every fully opaque pixel of `pixels` to LAB, in memory order.
/// Pixels with any transparency are skipped, not blended.
pub fn collect_lab_samples(pixels: &RgbaImage, memoize: bool) -> Vec<Lab> {
    let raw = pixels.as_raw();
    let mut samples = Vec::with_capacity(raw.len() / 4);
    let mut cache = memoize.then(ConversionCache::new);

    for px in raw.chunks_exact(4) {
        if px[3] != u8::MAX {
            continue;
        }
        let lab = match cache.as_mut() {
            Some(cache) => cache.convert(px[0], px[1], px[2]),
            None => rgb_to_lab(rgb_from_u8(px[0], px[1], px[2])),
        };
        samples.push(lab);
    }

    if let Some(cache) = &cache {
        debug!(
            distinct = cache.len(),
            hits = cache.hits(),
            "RGB to LAB cache"
        );
    }
    samples
}

/// Downscale `source` to fit `max_pixels` and collect its opaque LAB samples.
pub fn sample_image<S>(source: &S, max_pixels: usize, memoize: bool) -> Result<Vec<Lab>>
where
    S: RasterSource + ?Sized,
{
    let (width, height) = source.dimensions();
    if width == 0 || height == 0 {
        return Err(Error::EmptyImage { width, height });
    }

    let (scaled_w, scaled_h) = scaled_dimensions(width, height, max_pixels);
    if scaled_w == 0 || scaled_h == 0 {
        return Err(Error::DegenerateSampling {
            width,
            height,
            max_sampled_pixels: max_pixels,
        });
    }

    let pixels = source.rasterize(scaled_w, scaled_h)?;
    if pixels.dimensions() != (scaled_w, scaled_h) {
        let (w, h) = pixels.dimensions();
        return Err(Error::invalid("raster_dimensions", format!("{w}x{h}")));
    }

    let samples = collect_lab_samples(&pixels, memoize);
    debug!(
        width,
        height,
        scaled_w,
        scaled_h,
        opaque = samples.len(),
        "sampled image"
    );
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use pretty_assertions::assert_eq;

    #[test]
    fn small_images_keep_their_size() {
        assert_eq!(scaled_dimensions(10, 10, 1000), (10, 10));
        assert_eq!(scaled_dimensions(4, 4, 16), (4, 4));
    }

    #[test]
    fn large_images_shrink_to_budget_keeping_aspect() {
        assert_eq!(scaled_dimensions(100, 100, 2500), (50, 50));
        let (w, h) = scaled_dimensions(1920, 1080, 1000);
        assert!(w as usize * h as usize <= 1000);
        assert_eq!((w, h), (42, 23));
    }

    #[test]
    fn extreme_aspect_ratio_can_collapse() {
        assert_eq!(scaled_dimensions(100_000, 1, 1000).1, 0);
    }

    #[test]
    fn only_fully_opaque_pixels_are_sampled() {
        let mut img = RgbaImage::new(2, 2);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img.put_pixel(1, 0, Rgba([0, 255, 0, 254]));
        img.put_pixel(0, 1, Rgba([0, 0, 255, 0]));
        img.put_pixel(1, 1, Rgba([255, 255, 255, 255]));

        let samples = collect_lab_samples(&img, false);
        assert_eq!(samples.len(), 2);
        assert!((samples[0].l - 53.23).abs() < 0.05);
        assert!((samples[1].l - 100.0).abs() < 1e-3);
    }

    #[test]
    fn memoized_samples_match_direct_conversion() {
        let img = RgbaImage::from_fn(8, 8, |x, y| {
            if (x + y) % 3 == 0 {
                Rgba([12, 200, 99, 255])
            } else {
                Rgba([240, 17, 3, 255])
            }
        });
        assert_eq!(collect_lab_samples(&img, true), collect_lab_samples(&img, false));
    }

    #[test]
    fn cache_counts_hits_per_distinct_triple() {
        let mut cache = ConversionCache::new();
        assert!(cache.is_empty());
        let first = cache.convert(10, 20, 30);
        let again = cache.convert(10, 20, 30);
        cache.convert(30, 20, 10);
        assert_eq!(first, again);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.hits(), 1);
    }

    #[test]
    fn empty_source_is_rejected() {
        let img = RgbaImage::new(0, 5);
        assert!(matches!(
            sample_image(&img, 1000, false),
            Err(Error::EmptyImage { width: 0, height: 5 })
        ));
    }

    #[test]
    fn oversized_source_is_downsampled() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(64, 32, Rgba([9, 9, 9, 255])));
        let samples = sample_image(&img, 200, false).unwrap();
        let (w, h) = scaled_dimensions(64, 32, 200);
        assert_eq!(samples.len(), (w * h) as usize);
        assert!(samples.len() <= 200);
    }

    struct Misbehaving;

    impl RasterSource for Misbehaving {
        fn dimensions(&self) -> (u32, u32) {
            (4, 4)
        }

        fn rasterize(&self, _width: u32, _height: u32) -> Result<RgbaImage> {
            Ok(RgbaImage::new(1, 1))
        }
    }

    #[test]
    fn rasterizer_must_honor_requested_size() {
        assert!(matches!(
            sample_image(&Misbehaving, 1000, false),
            Err(Error::InvalidParameter { parameter: "raster_dimensions", .. })
        ));
    }
}
