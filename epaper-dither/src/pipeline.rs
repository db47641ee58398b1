use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::imageops::FilterType;
use image::{DynamicImage, ImageBuffer, RgbImage};

use crate::config::{Config, Display};
use crate::dither::{PixelBuffer, dither};
use crate::pack::{pack, to_c_array};
use crate::palette::{EPAPER_7_COLOR, Palette, Rgb};

const WHITE: Rgb = EPAPER_7_COLOR[1];

/// Everything one conversion run needs.
#[derive(Debug, Clone)]
pub struct Settings {
    pub input: PathBuf,
    pub display: Display,
    pub pad_to_display: bool,
    pub margin_color: Rgb,
    pub line_width: Option<usize>,
    pub preview: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

impl Settings {
    pub fn from_config(input: PathBuf, cfg: &Config) -> Self {
        Self {
            input,
            display: cfg.display,
            pad_to_display: cfg.output.pad_to_display,
            margin_color: cfg.output.margin_color.unwrap_or(WHITE),
            line_width: cfg.output.line_width,
            preview: cfg.output.preview.clone(),
            output: cfg.output.path.clone(),
        }
    }
}

/// Result of a run: the image that was packed and its packed bytes.
pub struct Converted {
    pub image: RgbImage,
    pub packed: Vec<u8>,
}

impl Converted {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Decode an image file and normalize it to RGB8.
pub fn load_rgb(path: &Path) -> Result<RgbImage> {
    let img = image::open(path).with_context(|| format!("opening image {}", path.display()))?;
    Ok(img.to_rgb8())
}

/// Shrink `img` to fit inside `width x height`, keeping aspect ratio. Never enlarges.
pub fn fit_to_display(img: RgbImage, width: u32, height: u32) -> RgbImage {
    let (w, h) = img.dimensions();
    if w <= width && h <= height {
        return img;
    }
    // DynamicImage::resize preserves aspect ratio and fits inside the box.
    DynamicImage::ImageRgb8(img)
        .resize(width, height, FilterType::CatmullRom)
        .to_rgb8()
}

/// Center `img` on a `width x height` canvas filled with `color`.
pub fn add_margin(img: &RgbImage, width: u32, height: u32, color: Rgb) -> RgbImage {
    let mut canvas: RgbImage = ImageBuffer::from_pixel(width, height, image::Rgb(color));
    let off_x = ((width as i64 - img.width() as i64) / 2).max(0);
    let off_y = ((height as i64 - img.height() as i64) / 2).max(0);
    image::imageops::overlay(&mut canvas, img, off_x, off_y);
    canvas
}

pub fn to_pixel_buffer(img: &RgbImage) -> Result<PixelBuffer> {
    let (w, h) = img.dimensions();
    let pixels = img.pixels().map(|p| p.0).collect();
    Ok(PixelBuffer::new(w as usize, h as usize, pixels)?)
}

pub fn to_rgb_image(buf: &PixelBuffer) -> Result<RgbImage> {
    let raw: Vec<u8> = buf.pixels().iter().flatten().copied().collect();
    RgbImage::from_raw(buf.width() as u32, buf.height() as u32, raw)
        .ok_or_else(|| anyhow::anyhow!("invalid pixel buffer size"))
}

/// Dither and pack an already decoded image.
pub fn convert(img: RgbImage, settings: &Settings) -> Result<Converted> {
    let palette = Palette::epaper();
    let Display { width, height } = settings.display;

    let fitted = fit_to_display(img, width, height);
    tracing::debug!(width = fitted.width(), height = fitted.height(), "fitted to display");

    let mut buf = to_pixel_buffer(&fitted)?;
    dither(&mut buf, &palette);
    let mut image = to_rgb_image(&buf)?;

    if settings.pad_to_display {
        image = add_margin(&image, width, height, settings.margin_color);
        buf = to_pixel_buffer(&image)?;
        tracing::debug!(width, height, color = ?settings.margin_color, "added margin");
    }

    let packed = pack(&buf, &palette)?;
    Ok(Converted { image, packed })
}

/// Full run: load, convert, then write preview and array text.
pub fn run(settings: &Settings) -> Result<Converted> {
    let img = load_rgb(&settings.input)?;
    tracing::debug!(
        path = %settings.input.display(),
        width = img.width(),
        height = img.height(),
        "loaded image"
    );
    let converted = convert(img, settings)?;

    if let Some(path) = &settings.preview {
        converted
            .image
            .save(path)
            .with_context(|| format!("saving preview {}", path.display()))?;
        tracing::debug!(path = %path.display(), "wrote preview png");
    }

    let text = to_c_array(&converted.packed, settings.line_width);
    match &settings.output {
        Some(path) => std::fs::write(path, text + "\n")
            .with_context(|| format!("writing {}", path.display()))?,
        None => println!("{text}"),
    }
    tracing::info!(
        bytes = converted.packed.len(),
        width = converted.width(),
        height = converted.height(),
        "packed image"
    );
    Ok(converted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn settings(display: Display) -> Settings {
        Settings {
            input: PathBuf::new(),
            display,
            pad_to_display: false,
            margin_color: WHITE,
            line_width: None,
            preview: None,
            output: None,
        }
    }

    #[test]
    fn small_images_are_not_enlarged() {
        let img = RgbImage::new(10, 6);
        let out = fit_to_display(img, 230, 230);
        assert_eq!(out.dimensions(), (10, 6));
    }

    #[test]
    fn large_images_fit_inside_display() {
        let img = RgbImage::new(460, 230);
        let out = fit_to_display(img, 230, 230);
        assert_eq!(out.dimensions(), (230, 115));
    }

    #[test]
    fn margin_centers_image() {
        let img = ImageBuffer::from_pixel(2, 1, image::Rgb([0, 0, 0]));
        let out = add_margin(&img, 5, 4, WHITE);
        assert_eq!(out.dimensions(), (5, 4));
        // offsets floor((5-2)/2)=1, floor((4-1)/2)=1
        assert_eq!(out.get_pixel(1, 1).0, [0, 0, 0]);
        assert_eq!(out.get_pixel(2, 1).0, [0, 0, 0]);
        assert_eq!(out.get_pixel(0, 1).0, WHITE);
        assert_eq!(out.get_pixel(3, 1).0, WHITE);
        assert_eq!(out.get_pixel(1, 0).0, WHITE);
        assert_eq!(out.get_pixel(1, 2).0, WHITE);
    }

    #[test]
    fn buffer_image_conversion_keeps_pixels() {
        let mut img = RgbImage::new(3, 2);
        img.put_pixel(2, 1, image::Rgb([1, 2, 3]));
        let buf = to_pixel_buffer(&img).unwrap();
        assert_eq!(buf.get(2, 1), [1, 2, 3]);
        assert_eq!(to_rgb_image(&buf).unwrap(), img);
    }

    #[test]
    fn convert_packs_unpadded_image_by_default() {
        let img = ImageBuffer::from_pixel(4, 2, image::Rgb([0, 250, 0]));
        let out = convert(img, &settings(Display::default())).unwrap();
        assert_eq!((out.width(), out.height()), (4, 2));
        assert_eq!(out.packed, vec![0x22; 4]);
    }

    #[test]
    fn convert_with_padding_packs_full_display() {
        let img = ImageBuffer::from_pixel(2, 2, image::Rgb([255, 0, 0]));
        let mut s = settings(Display {
            width: 4,
            height: 2,
        });
        s.pad_to_display = true;
        let out = convert(img, &s).unwrap();
        assert_eq!((out.width(), out.height()), (4, 2));
        // white | red red | white on both rows
        assert_eq!(out.packed, vec![0x14, 0x41, 0x14, 0x41]);
    }

    #[test]
    fn run_reads_png_and_writes_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.png");
        let preview = dir.path().join("preview.png");
        let output = dir.path().join("image.h");
        ImageBuffer::from_pixel(3, 2, image::Rgb([255u8, 255, 0]))
            .save(&input)
            .unwrap();

        let mut s = settings(Display::default());
        s.input = input;
        s.preview = Some(preview.clone());
        s.output = Some(output.clone());
        let out = run(&s).unwrap();

        assert_eq!(out.packed, vec![0x55, 0x55]);
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "[0x55,0x55]\n");
        assert_eq!(image::open(&preview).unwrap().to_rgb8(), out.image);
    }

    #[test]
    fn missing_input_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = settings(Display::default());
        s.input = dir.path().join("missing.png");
        let err = run(&s).err().unwrap();
        assert!(format!("{err:#}").contains("missing.png"));
    }
}
