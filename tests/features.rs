use anyhow::Result;
use approx::assert_abs_diff_eq;
use cbir::features::{
    CenterPatch, ChromaHistogram, ColorTexture, GrassExtractor, MultiRegionHistogram,
};
use cbir::{FeatureError, FeatureExtractor};
use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};

/// A handful of deterministic test images of varied size and content.
fn samples() -> Vec<DynamicImage> {
    let gradient = RgbImage::from_fn(31, 17, |x, y| Rgb([(x * 8) as u8, (y * 15) as u8, 77]));
    let checker = RgbImage::from_fn(20, 20, |x, y| {
        if (x / 4 + y / 4) % 2 == 0 {
            Rgb([250, 10, 10])
        } else {
            Rgb([10, 10, 250])
        }
    });
    let noise = RgbImage::from_fn(64, 48, |x, y| {
        let v = x.wrapping_mul(2654435761).wrapping_add(y.wrapping_mul(40503));
        Rgb([(v >> 3) as u8, (v >> 11) as u8, (v >> 19) as u8])
    });
    let gray = GrayImage::from_fn(9, 40, |x, y| Luma([(x * y) as u8]));
    vec![
        DynamicImage::ImageRgb8(gradient),
        DynamicImage::ImageRgb8(checker),
        DynamicImage::ImageRgb8(noise),
        DynamicImage::ImageLuma8(gray),
        DynamicImage::ImageRgb8(RgbImage::new(7, 7)),
    ]
}

#[test]
fn center_patch_length_and_range() -> Result<()> {
    for image in samples() {
        let feat = CenterPatch.extract(&image)?;
        assert_eq!(feat.len(), 147);
        assert!(feat.iter().all(|v| (0.0..=255.0).contains(v)));
    }
    Ok(())
}

#[test]
fn chroma_histogram_sums_to_one() -> Result<()> {
    let extractor = ChromaHistogram::default();
    for image in samples() {
        let feat = extractor.extract(&image)?;
        assert_eq!(feat.len(), 256);
        assert_abs_diff_eq!(feat.iter().sum::<f32>(), 1.0, epsilon = 1e-5);
    }
    Ok(())
}

#[test]
fn multi_region_length_and_mass() -> Result<()> {
    let extractor = MultiRegionHistogram::default();
    for image in samples() {
        let feat = extractor.extract(&image)?;
        assert_eq!(feat.len(), 512);
        assert_abs_diff_eq!(feat[..256].iter().sum::<f32>(), 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(feat[256..].iter().sum::<f32>(), 1.0, epsilon = 1e-5);
    }
    Ok(())
}

#[test]
fn color_texture_length_and_mass() -> Result<()> {
    let extractor = ColorTexture::default();
    for image in samples() {
        let feat = extractor.extract(&image)?;
        assert_eq!(feat.len(), 290);
        assert_eq!(feat.len(), extractor.dim());
        for segment in [&feat[..256], &feat[256..272], &feat[272..]] {
            assert_abs_diff_eq!(segment.iter().sum::<f32>(), 1.0, epsilon = 1e-5);
        }
    }
    Ok(())
}

#[test]
fn grass_on_black_image() -> Result<()> {
    let image = DynamicImage::ImageRgb8(RgbImage::new(32, 24));
    let feat = GrassExtractor::default().extract(&image)?;
    assert_eq!(feat, vec![0.0; 5]);
    Ok(())
}

#[test]
fn grass_on_lawn() -> Result<()> {
    // upper half lawn, lower half sky
    let image = RgbImage::from_fn(40, 40, |_, y| {
        if y < 20 {
            Rgb([40, 160, 50])
        } else {
            Rgb([120, 170, 240])
        }
    });
    let feat = GrassExtractor::default().extract(&DynamicImage::ImageRgb8(image))?;
    assert_abs_diff_eq!(feat[0], 0.5, epsilon = 1e-6);
    assert!(feat[1] > 70.0 / 360.0 && feat[1] < 170.0 / 360.0);
    assert_eq!(feat[4], 1.0);
    Ok(())
}

#[test]
fn extraction_is_deterministic() -> Result<()> {
    let extractor = ColorTexture::default();
    for image in samples() {
        assert_eq!(extractor.extract(&image)?, extractor.extract(&image)?);
    }
    Ok(())
}

#[test]
fn refusals() {
    let tiny = DynamicImage::ImageRgb8(RgbImage::new(6, 6));
    assert!(matches!(
        CenterPatch.extract(&tiny),
        Err(FeatureError::TooSmall { .. })
    ));

    let rgba = DynamicImage::ImageRgba8(image::RgbaImage::new(10, 10));
    for result in [
        CenterPatch.extract(&rgba),
        ChromaHistogram::default().extract(&rgba),
        MultiRegionHistogram::default().extract(&rgba),
        ColorTexture::default().extract(&rgba),
    ] {
        assert_eq!(result, Err(FeatureError::UnsupportedChannels(4)));
    }
}

#[test]
fn grass_ignores_alpha() -> Result<()> {
    let lawn = image::RgbaImage::from_pixel(16, 16, image::Rgba([40, 160, 50, 255]));
    let with_alpha = GrassExtractor::default().extract(&DynamicImage::ImageRgba8(lawn))?;
    let opaque = RgbImage::from_pixel(16, 16, Rgb([40, 160, 50]));
    let without = GrassExtractor::default().extract(&DynamicImage::ImageRgb8(opaque))?;
    assert_eq!(with_alpha, without);
    assert_eq!(with_alpha[0], 1.0);
    Ok(())
}
