use image::{DynamicImage, ImageEncoder};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};
use super::error::{EditorError, EditorResult};

pub const DEFAULT_JPEG_QUALITY: u8 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Bmp,
}

impl ImageFormat {
    pub fn as_str(&self) -> &str {
        match self {
            ImageFormat::Jpeg => "JPEG",
            ImageFormat::Png => "PNG",
            ImageFormat::Bmp => "BMP",
        }
    }

    pub fn extension(&self) -> &str {
        match self {
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Png => "png",
            ImageFormat::Bmp => "bmp",
        }
    }

    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            ImageFormat::Jpeg => &["jpg", "jpeg"],
            ImageFormat::Png => &["png"],
            ImageFormat::Bmp => &["bmp"],
        }
    }

    pub fn all() -> Vec<ImageFormat> {
        vec![ImageFormat::Png, ImageFormat::Jpeg, ImageFormat::Bmp]
    }

    /// Every extension the editor can open or save, for file dialog filters.
    pub fn all_extensions() -> Vec<&'static str> {
        Self::all().iter().flat_map(|f| f.extensions().iter().copied()).collect()
    }

    pub fn from_path(path: &Path) -> EditorResult<Self> {
        let ext: String = path.extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "jpg" | "jpeg" => Ok(ImageFormat::Jpeg),
            "png" => Ok(ImageFormat::Png),
            "bmp" => Ok(ImageFormat::Bmp),
            "" => Err(EditorError::unsupported(format!("{} has no file extension; use JPG, PNG or BMP", path.display()))),
            other => Err(EditorError::unsupported(format!(".{other} files are not supported; use JPG, PNG or BMP"))),
        }
    }

    fn codec(&self) -> image::ImageFormat {
        match self {
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Bmp => image::ImageFormat::Bmp,
        }
    }
}

/// Reads an image and normalizes it to 8-bit RGB.
pub fn load_image(path: &Path) -> EditorResult<DynamicImage> {
    let format: ImageFormat = ImageFormat::from_path(path)?;
    let file: File = File::open(path)?;
    let reader = image::ImageReader::with_format(BufReader::new(file), format.codec());
    let decoded: DynamicImage = reader.decode()?;
    debug!(path = %path.display(), color = ?decoded.color(), "decoded image");
    let img: DynamicImage = match decoded {
        DynamicImage::ImageRgb8(_) => decoded,
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    };
    info!(path = %path.display(), width = img.width(), height = img.height(), "opened image");
    Ok(img)
}

/// Writes `img` in the format named by the extension of `path`.
///
/// The data goes to a temporary file next to `path` first, which is renamed
/// over the target only once encoding succeeded.
pub fn save_image(img: &DynamicImage, path: &Path, jpeg_quality: u8) -> EditorResult<ImageFormat> {
    let format: ImageFormat = ImageFormat::from_path(path)?;
    let dir: &Path = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp: NamedTempFile = tempfile::Builder::new().prefix(".slate-").suffix(".part").tempfile_in(dir)?;
    {
        let mut writer: BufWriter<&mut File> = BufWriter::new(tmp.as_file_mut());
        encode(img, format, jpeg_quality, &mut writer)?;
        writer.flush()?;
    }
    tmp.persist(path).map_err(|e| e.error)?;

    info!(path = %path.display(), format = format.as_str(), "saved image");
    Ok(format)
}

fn encode(img: &DynamicImage, format: ImageFormat, jpeg_quality: u8, writer: &mut BufWriter<&mut File>) -> EditorResult<()> {
    match format {
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = img.to_rgb8();
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(writer, jpeg_quality.clamp(1, 100));
            encoder.write_image(rgb.as_raw(), rgb.width(), rgb.height(), image::ExtendedColorType::Rgb8)?;
        }
        ImageFormat::Png => {
            let encoder = image::codecs::png::PngEncoder::new_with_quality(
                writer,
                image::codecs::png::CompressionType::Default,
                image::codecs::png::FilterType::Adaptive,
            );
            encoder.write_image(img.as_bytes(), img.width(), img.height(), img.color().into())?;
        }
        ImageFormat::Bmp => {
            img.write_to(writer, image::ImageFormat::Bmp)?;
        }
    }
    Ok(())
}
