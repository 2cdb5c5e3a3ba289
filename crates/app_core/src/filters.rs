//! Image filter pipeline
//!
//! Every filter is a pure function from one in-memory image to a new image.
//! 8-bit layouts (L, LA, RGB, RGBA) are preserved; wider layouts are
//! converted to RGB(A) first. Alpha is never modified by colour filters.

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use rayon::prelude::*;

/// Valid super-resolution scale factors
pub const SUPER_RESOLUTION_FACTORS: std::ops::RangeInclusive<u32> = 2..=4;

/// Convolution kernel with PIL-style scale and offset:
/// `out = sum(weight * sample) / scale + offset`
#[derive(Debug, Clone, Copy)]
pub struct Kernel {
    pub size: usize,
    pub weights: &'static [f32],
    pub scale: f32,
    pub offset: f32,
}

pub const BLUR: Kernel = Kernel {
    size: 5,
    weights: &[
        1.0, 1.0, 1.0, 1.0, 1.0,
        1.0, 0.0, 0.0, 0.0, 1.0,
        1.0, 0.0, 0.0, 0.0, 1.0,
        1.0, 0.0, 0.0, 0.0, 1.0,
        1.0, 1.0, 1.0, 1.0, 1.0,
    ],
    scale: 16.0,
    offset: 0.0,
};

pub const CONTOUR: Kernel = Kernel {
    size: 3,
    weights: &[-1.0, -1.0, -1.0, -1.0, 8.0, -1.0, -1.0, -1.0, -1.0],
    scale: 1.0,
    offset: 255.0,
};

pub const DETAIL: Kernel = Kernel {
    size: 3,
    weights: &[0.0, -1.0, 0.0, -1.0, 10.0, -1.0, 0.0, -1.0, 0.0],
    scale: 6.0,
    offset: 0.0,
};

pub const EDGE_ENHANCE: Kernel = Kernel {
    size: 3,
    weights: &[-1.0, -1.0, -1.0, -1.0, 10.0, -1.0, -1.0, -1.0, -1.0],
    scale: 2.0,
    offset: 0.0,
};

pub const EMBOSS: Kernel = Kernel {
    size: 3,
    weights: &[-1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0],
    scale: 1.0,
    offset: 128.0,
};

pub const FIND_EDGES: Kernel = Kernel {
    size: 3,
    weights: &[-1.0, -1.0, -1.0, -1.0, 8.0, -1.0, -1.0, -1.0, -1.0],
    scale: 1.0,
    offset: 0.0,
};

pub const SHARPEN: Kernel = Kernel {
    size: 3,
    weights: &[-2.0, -2.0, -2.0, -2.0, 32.0, -2.0, -2.0, -2.0, -2.0],
    scale: 16.0,
    offset: 0.0,
};

pub const SMOOTH: Kernel = Kernel {
    size: 3,
    weights: &[1.0, 1.0, 1.0, 1.0, 5.0, 1.0, 1.0, 1.0, 1.0],
    scale: 13.0,
    offset: 0.0,
};

/// A named transform with its parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Filter {
    Sharpen,
    Blur,
    Contour,
    Detail,
    EdgeEnhance,
    Emboss,
    FindEdges,
    Smooth,
    UnsharpMask,
    AutoContrast,
    Colour(f32),
    Contrast(f32),
    Brightness(f32),
    BlackAndWhite,
    Denoise,
    SuperResolution(u32),
}

impl Filter {
    pub fn apply(self, img: &DynamicImage) -> DynamicImage {
        match self {
            Filter::Sharpen => sharpen(img),
            Filter::Blur => blur(img),
            Filter::Contour => contour(img),
            Filter::Detail => detail(img),
            Filter::EdgeEnhance => edge_enhance(img),
            Filter::Emboss => emboss(img),
            Filter::FindEdges => find_edges(img),
            Filter::Smooth => smooth(img),
            Filter::UnsharpMask => unsharp_mask(img),
            Filter::AutoContrast => auto_contrast(img),
            Filter::Colour(f) => colour(img, f),
            Filter::Contrast(f) => contrast(img, f),
            Filter::Brightness(f) => brightness(img, f),
            Filter::BlackAndWhite => black_and_white(img),
            Filter::Denoise => denoise(img),
            Filter::SuperResolution(factor) => super_resolution(img, factor),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Filter::Sharpen => "Sharpen",
            Filter::Blur => "Blur",
            Filter::Contour => "Contour",
            Filter::Detail => "Detail",
            Filter::EdgeEnhance => "Edge Enhance",
            Filter::Emboss => "Emboss",
            Filter::FindEdges => "Find Edges",
            Filter::Smooth => "Smooth",
            Filter::UnsharpMask => "Unsharp Mask",
            Filter::AutoContrast => "Auto Contrast",
            Filter::Colour(_) => "Colour",
            Filter::Contrast(_) => "Contrast",
            Filter::Brightness(_) => "Brightness",
            Filter::BlackAndWhite => "Black & White",
            Filter::Denoise => "Denoise",
            Filter::SuperResolution(_) => "Super Resolution",
        }
    }
}

pub fn sharpen(img: &DynamicImage) -> DynamicImage {
    convolve(img, &SHARPEN)
}

pub fn blur(img: &DynamicImage) -> DynamicImage {
    convolve(img, &BLUR)
}

pub fn contour(img: &DynamicImage) -> DynamicImage {
    convolve(img, &CONTOUR)
}

pub fn detail(img: &DynamicImage) -> DynamicImage {
    convolve(img, &DETAIL)
}

pub fn edge_enhance(img: &DynamicImage) -> DynamicImage {
    convolve(img, &EDGE_ENHANCE)
}

pub fn emboss(img: &DynamicImage) -> DynamicImage {
    convolve(img, &EMBOSS)
}

pub fn find_edges(img: &DynamicImage) -> DynamicImage {
    convolve(img, &FIND_EDGES)
}

pub fn smooth(img: &DynamicImage) -> DynamicImage {
    convolve(img, &SMOOTH)
}

/// Unsharp mask with radius 2, threshold 3
pub fn unsharp_mask(img: &DynamicImage) -> DynamicImage {
    eight_bit(img).unsharpen(2.0, 3)
}

/// Stretch each colour channel so its darkest value maps to 0 and its
/// brightest to 255. Flat channels are left unchanged.
pub fn auto_contrast(img: &DynamicImage) -> DynamicImage {
    let src = eight_bit(img);
    let layout = Layout::of(&src);
    let bytes = src.as_bytes();

    let mut lo = [u8::MAX; 3];
    let mut hi = [u8::MIN; 3];
    for px in bytes.chunks_exact(layout.channels) {
        for c in 0..layout.colour_channels {
            lo[c] = lo[c].min(px[c]);
            hi[c] = hi[c].max(px[c]);
        }
    }

    map_rows(&src, |_, _, row| {
        for px in row.chunks_exact_mut(layout.channels) {
            for c in 0..layout.colour_channels {
                if hi[c] > lo[c] {
                    let span = (hi[c] - lo[c]) as f32;
                    px[c] = to_u8((px[c] - lo[c]) as f32 * 255.0 / span);
                }
            }
        }
    })
}

/// Colour saturation. 0.0 gives a greyscale image, 1.0 the original.
pub fn colour(img: &DynamicImage, factor: f32) -> DynamicImage {
    let src = eight_bit(img);
    let layout = Layout::of(&src);
    if layout.colour_channels < 3 {
        return src;
    }

    map_rows(&src, |_, _, row| {
        for px in row.chunks_exact_mut(layout.channels) {
            let grey = luma(px[0], px[1], px[2]);
            for v in px.iter_mut().take(3) {
                *v = blend(grey, *v, factor);
            }
        }
    })
}

/// Contrast against the mean grey level. 0.0 gives a solid grey image.
pub fn contrast(img: &DynamicImage, factor: f32) -> DynamicImage {
    let src = eight_bit(img);
    let layout = Layout::of(&src);
    let bytes = src.as_bytes();

    let pixel_count = (layout.width * layout.height).max(1) as f64;
    let total: f64 = bytes
        .par_chunks_exact(layout.channels.max(1))
        .map(|px| {
            if layout.colour_channels >= 3 {
                luma(px[0], px[1], px[2]) as f64
            } else {
                px[0] as f64
            }
        })
        .sum();
    let mean = (total / pixel_count + 0.5).floor() as f32;

    map_rows(&src, |_, _, row| {
        for px in row.chunks_exact_mut(layout.channels) {
            for v in px.iter_mut().take(layout.colour_channels) {
                *v = blend(mean, *v, factor);
            }
        }
    })
}

/// Brightness. 0.0 gives a black image.
pub fn brightness(img: &DynamicImage, factor: f32) -> DynamicImage {
    let src = eight_bit(img);
    let layout = Layout::of(&src);

    map_rows(&src, |_, _, row| {
        for px in row.chunks_exact_mut(layout.channels) {
            for v in px.iter_mut().take(layout.colour_channels) {
                *v = blend(0.0, *v, factor);
            }
        }
    })
}

pub fn black_and_white(img: &DynamicImage) -> DynamicImage {
    colour(img, 0.0)
}

/// Crop to the given pixel rectangle, clipped to the image bounds
pub fn crop(img: &DynamicImage, x: u32, y: u32, width: u32, height: u32) -> DynamicImage {
    let (w, h) = img.dimensions();
    let x = x.min(w);
    let y = y.min(h);
    let width = width.min(w - x);
    let height = height.min(h - y);
    img.crop_imm(x, y, width, height)
}

/// Remove speckle noise with a 3×3 median filter
pub fn denoise(img: &DynamicImage) -> DynamicImage {
    use imageproc::filter::median_filter;

    match eight_bit(img) {
        DynamicImage::ImageLuma8(buf) => DynamicImage::ImageLuma8(median_filter(&buf, 1, 1)),
        DynamicImage::ImageLumaA8(buf) => DynamicImage::ImageLumaA8(median_filter(&buf, 1, 1)),
        DynamicImage::ImageRgba8(buf) => DynamicImage::ImageRgba8(median_filter(&buf, 1, 1)),
        other => DynamicImage::ImageRgb8(median_filter(&other.to_rgb8(), 1, 1)),
    }
}

/// Upscale by an integer factor with Lanczos3 resampling.
///
/// Factors outside 2..=4 are rejected: an error is logged and the input is
/// returned unchanged.
pub fn super_resolution(img: &DynamicImage, factor: u32) -> DynamicImage {
    if !SUPER_RESOLUTION_FACTORS.contains(&factor) {
        tracing::error!(
            "Invalid super resolution factor {} (expected {}..={})",
            factor,
            SUPER_RESOLUTION_FACTORS.start(),
            SUPER_RESOLUTION_FACTORS.end()
        );
        return img.clone();
    }

    let (w, h) = img.dimensions();
    img.resize_exact(w * factor, h * factor, FilterType::Lanczos3)
}

/// Key/value rows describing an image for the info dialog
pub fn image_info(img: &DynamicImage, format: Option<ImageFormat>) -> Vec<(String, String)> {
    let (format_name, description) = match format {
        Some(f) => (format_name(f), format_description(f).to_string()),
        None => ("None".to_string(), "None".to_string()),
    };

    vec![
        ("Format".to_string(), format_name),
        ("Format Description".to_string(), description),
        ("Width".to_string(), img.width().to_string()),
        ("Height".to_string(), img.height().to_string()),
        ("Mode".to_string(), mode_name(img).to_string()),
    ]
}

fn format_name(format: ImageFormat) -> String {
    match format {
        ImageFormat::Jpeg => "JPEG".to_string(),
        other => format!("{:?}", other).to_uppercase(),
    }
}

fn format_description(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "Portable network graphics",
        ImageFormat::Jpeg => "JPEG (ISO 10918)",
        ImageFormat::Gif => "Compuserve GIF",
        ImageFormat::WebP => "WebP image",
        ImageFormat::Bmp => "Windows Bitmap",
        _ => "Unknown",
    }
}

fn mode_name(img: &DynamicImage) -> &'static str {
    match img {
        DynamicImage::ImageLuma8(_) => "L",
        DynamicImage::ImageLumaA8(_) => "LA",
        DynamicImage::ImageRgb8(_) => "RGB",
        DynamicImage::ImageRgba8(_) => "RGBA",
        DynamicImage::ImageLuma16(_) => "I;16",
        DynamicImage::ImageLumaA16(_) => "LA;16",
        DynamicImage::ImageRgb16(_) => "RGB;16",
        DynamicImage::ImageRgba16(_) => "RGBA;16",
        DynamicImage::ImageRgb32F(_) => "RGB;F",
        DynamicImage::ImageRgba32F(_) => "RGBA;F",
        _ => "Unknown",
    }
}

/// Apply a convolution kernel. Rows are processed in parallel; samples
/// outside the image are clamped to the nearest edge pixel.
pub fn convolve(img: &DynamicImage, kernel: &Kernel) -> DynamicImage {
    let src = eight_bit(img);
    let layout = Layout::of(&src);
    let input = src.as_bytes();
    let radius = (kernel.size / 2) as isize;
    let max_x = layout.width as isize - 1;
    let max_y = layout.height as isize - 1;

    map_rows(&src, |_, y, row| {
        for x in 0..layout.width {
            for c in 0..layout.colour_channels {
                let mut acc = 0.0f32;
                for ky in 0..kernel.size {
                    let sy = (y as isize + ky as isize - radius).clamp(0, max_y) as usize;
                    for kx in 0..kernel.size {
                        let sx = (x as isize + kx as isize - radius).clamp(0, max_x) as usize;
                        let sample = input[(sy * layout.width + sx) * layout.channels + c];
                        acc += kernel.weights[ky * kernel.size + kx] * sample as f32;
                    }
                }
                row[x * layout.channels + c] = to_u8(acc / kernel.scale + kernel.offset);
            }
        }
    })
}

#[derive(Debug, Clone, Copy)]
struct Layout {
    width: usize,
    height: usize,
    channels: usize,
    colour_channels: usize,
}

impl Layout {
    fn of(img: &DynamicImage) -> Self {
        let color = img.color();
        let channels = color.channel_count() as usize;
        Self {
            width: img.width() as usize,
            height: img.height() as usize,
            channels,
            colour_channels: if color.has_alpha() { channels - 1 } else { channels },
        }
    }
}

/// Convert to an 8-bit layout, keeping the alpha channel if present
fn eight_bit(img: &DynamicImage) -> DynamicImage {
    match img {
        DynamicImage::ImageLuma8(_)
        | DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageRgb8(_)
        | DynamicImage::ImageRgba8(_) => img.clone(),
        other if other.color().has_alpha() => DynamicImage::ImageRgba8(other.to_rgba8()),
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    }
}

fn bytes_mut(img: &mut DynamicImage) -> Option<&mut [u8]> {
    match img {
        DynamicImage::ImageLuma8(buf) => Some(&mut **buf),
        DynamicImage::ImageLumaA8(buf) => Some(&mut **buf),
        DynamicImage::ImageRgb8(buf) => Some(&mut **buf),
        DynamicImage::ImageRgba8(buf) => Some(&mut **buf),
        _ => None,
    }
}

/// Copy an 8-bit image and rewrite each row in parallel.
/// The closure receives the source bytes, the row index and the output row,
/// which starts as a copy of the source row.
fn map_rows<F>(src: &DynamicImage, f: F) -> DynamicImage
where
    F: Fn(&[u8], usize, &mut [u8]) + Sync,
{
    let layout = Layout::of(src);
    let stride = layout.width * layout.channels;
    let input = src.as_bytes();
    let mut out = src.clone();

    if stride == 0 {
        return out;
    }

    if let Some(dst) = bytes_mut(&mut out) {
        dst.par_chunks_mut(stride)
            .enumerate()
            .for_each(|(y, row)| f(input, y, row));
    }
    out
}

fn luma(r: u8, g: u8, b: u8) -> f32 {
    (r as f32 * 299.0 + g as f32 * 587.0 + b as f32 * 114.0) / 1000.0
}

fn blend(degenerate: f32, value: u8, factor: f32) -> u8 {
    to_u8(degenerate + factor * (value as f32 - degenerate))
}

fn to_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}
