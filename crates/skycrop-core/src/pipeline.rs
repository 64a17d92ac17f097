//! Per-image crop-and-upscale around a plant.
//!
//! [`GeoCropper::process`] runs the full chain for one file:
//!
//! 1. Resolve the plant in the reference table (before touching the image,
//!    so an unknown plant never produces output)
//! 2. Decode the image
//! 3. Project the plant's region of interest and plan a square crop
//! 4. Crop (or keep the whole image if the square does not fit) and upscale
//! 5. Write to `<output_root>/<PLANT_NAME>/<date>/<time>/<file name>`

use std::fs;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use log::{debug, info, warn};

use crate::config::GeoCropConfig;
use crate::decode::load_image;
use crate::encode::save_image;
use crate::error::{GeoCropError, Result};
use crate::geocode::{PlantRecord, PlantTable};
use crate::projection::{PixelBounds, Projection};
use crate::transform::{apply_crop, plan_square_crop, upscale, CropPlan};

/// Directory name for a plant: uppercased, spaces replaced by underscores.
pub fn normalize_plant_name(name: &str) -> String {
    name.to_uppercase().replace(' ', "_")
}

/// Crops and upscales images around a plant using a fixed configuration.
#[derive(Debug, Clone)]
pub struct GeoCropper {
    config: GeoCropConfig,
}

impl GeoCropper {
    pub fn new(config: GeoCropConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &GeoCropConfig {
        &self.config
    }

    /// Crop plan for `plant` on a `width` x `height` image.
    pub fn plan(&self, plant: &PlantRecord, width: u32, height: u32) -> CropPlan {
        let projection = Projection::new(self.config.bounds, width, height);
        let bounds = PixelBounds::around(&projection, plant, &self.config);
        debug!(
            "'{}' at ({}, {}) -> bbox x[{:.2}, {:.2}] y[{:.2}, {:.2}] on {}x{}",
            plant.name,
            plant.latitude,
            plant.longitude,
            bounds.x_min,
            bounds.x_max,
            bounds.y_min,
            bounds.y_max,
            width,
            height
        );

        plan_square_crop(&bounds, width, height)
    }

    /// Crop `image` around `plant` and upscale the result.
    ///
    /// When the square does not fit, the whole image is upscaled instead.
    /// Returns the new image and the plan that produced it.
    pub fn crop_around(
        &self,
        image: &DynamicImage,
        plant: &PlantRecord,
    ) -> Result<(DynamicImage, CropPlan)> {
        let plan = self.plan(plant, image.width(), image.height());

        let upscaled = match plan {
            CropPlan::Square(region) => {
                let cropped = apply_crop(image, region);
                upscale(&cropped, self.config.scale_factor, self.config.filter)?
            }
            CropPlan::Oversized { side } => {
                warn!(
                    "Crop side {} exceeds {}x{} image, keeping the whole frame",
                    side,
                    image.width(),
                    image.height()
                );
                upscale(image, self.config.scale_factor, self.config.filter)?
            }
        };

        Ok((upscaled, plan))
    }

    /// Output location for `image_path`, mirroring its place under `input_root`.
    pub fn output_path(
        image_path: &Path,
        input_root: &Path,
        output_root: &Path,
        plant_name: &str,
    ) -> Result<PathBuf> {
        let outside = || GeoCropError::OutsideInputRoot {
            path: image_path.to_path_buf(),
        };

        let relative = image_path.strip_prefix(input_root).map_err(|_| outside())?;
        let file_name = relative.file_name().ok_or_else(outside)?;

        let mut out = output_root.join(normalize_plant_name(plant_name));
        if let Some(parent) = relative.parent() {
            out.push(parent);
        }
        out.push(file_name);

        Ok(out)
    }

    /// Process one image file end to end and return where it was written.
    pub fn process(
        &self,
        image_path: &Path,
        plant_name: &str,
        table: &PlantTable,
        input_root: &Path,
        output_root: &Path,
    ) -> Result<PathBuf> {
        let plant = table.locate(plant_name, self.config.match_policy)?;
        let output = Self::output_path(image_path, input_root, output_root, plant_name)?;

        let image = load_image(image_path)?;
        let (result, plan) = self.crop_around(&image, plant)?;

        if let Some(dir) = output.parent() {
            fs::create_dir_all(dir).map_err(|e| GeoCropError::io(dir, e))?;
        }
        save_image(&result, &output)?;

        match plan {
            CropPlan::Square(region) => info!(
                "Saved {} ({}px square at {},{} -> {}x{})",
                output.display(),
                region.side,
                region.x,
                region.y,
                result.width(),
                result.height()
            ),
            CropPlan::Oversized { .. } => info!(
                "Saved {} (full frame -> {}x{})",
                output.display(),
                result.width(),
                result.height()
            ),
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MatchPolicy, TableColumns};
    use crate::transform::CropRegion;
    use image::{GenericImageView, Rgb, RgbImage};
    use tempfile::tempdir;

    const TABLE: &str = "\
TEN_NM,VIDO,KINHDO
Golden Plant,10.0,100.0
Edge Plant,29.9,80.1
Twin,10.0,100.0
Twin,20.0,90.0
";

    fn table() -> PlantTable {
        PlantTable::from_reader(TABLE.as_bytes(), &TableColumns::default(), Path::new("t.csv"))
            .unwrap()
    }

    fn sky(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        }))
    }

    fn write_sky(path: &Path, width: u32, height: u32) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        sky(width, height).save(path).unwrap();
    }

    fn cropper_with_scale(scale_factor: u32) -> GeoCropper {
        let mut config = GeoCropConfig::default();
        config.scale_factor = scale_factor;
        GeoCropper::new(config).unwrap()
    }

    #[test]
    fn test_normalize_plant_name() {
        assert_eq!(normalize_plant_name("MT Solarpark 1"), "MT_SOLARPARK_1");
        assert_eq!(normalize_plant_name("trung nam"), "TRUNG_NAM");
        assert_eq!(normalize_plant_name("Already_Upper"), "ALREADY_UPPER");
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = GeoCropConfig::default();
        config.scale_factor = 0;
        assert!(GeoCropper::new(config).is_err());
    }

    #[test]
    fn test_golden_scenario() {
        let cropper = cropper_with_scale(25);
        let plant = PlantRecord::new("Golden Plant", 10.0, 100.0);

        let plan = cropper.plan(&plant, 1000, 1000);
        assert_eq!(plan, CropPlan::Square(CropRegion::new(555, 651, 31)));

        let (result, _) = cropper.crop_around(&sky(1000, 1000), &plant).unwrap();
        assert_eq!(result.dimensions(), (31 * 25, 31 * 25));
    }

    #[test]
    fn test_crop_content_matches_source() {
        let cropper = cropper_with_scale(1);
        let plant = PlantRecord::new("Golden Plant", 10.0, 100.0);
        let source = sky(1000, 1000);

        let (result, plan) = cropper.crop_around(&source, &plant).unwrap();
        let CropPlan::Square(region) = plan else {
            panic!("expected a square crop");
        };

        assert_eq!(result.dimensions(), (region.side, region.side));
        assert_eq!(result.get_pixel(0, 0), source.get_pixel(region.x, region.y));
        assert_eq!(
            result.get_pixel(region.side - 1, region.side - 1),
            source.get_pixel(region.x_max() - 1, region.y_max() - 1)
        );
    }

    #[test]
    fn test_edge_plant_stays_inside_image() {
        let cropper = cropper_with_scale(2);
        let plant = PlantRecord::new("Edge Plant", 29.9, 80.1);

        match cropper.plan(&plant, 1000, 1000) {
            CropPlan::Square(region) => {
                assert_eq!(region.x, 0);
                assert_eq!(region.y, 0);
                assert!(region.fits(1000, 1000));
            }
            other => panic!("unexpected plan: {other:?}"),
        }
    }

    fn wide_region_cropper(scale_factor: u32) -> GeoCropper {
        // 4000 km square: 36 degrees of latitude, more than the 30 degree extent
        let mut config = GeoCropConfig::default();
        config.scale_factor = scale_factor;
        config.half_side_km = 2000.0;
        GeoCropper::new(config).unwrap()
    }

    #[test]
    fn test_oversized_keeps_original_content() {
        let cropper = wide_region_cropper(1);
        let plant = PlantRecord::new("Golden Plant", 10.0, 100.0);
        let source = sky(20, 20);

        let (result, plan) = cropper.crop_around(&source, &plant).unwrap();

        assert!(matches!(plan, CropPlan::Oversized { .. }));
        assert_eq!(result.as_bytes(), source.as_bytes());
    }

    #[test]
    fn test_oversized_still_upscaled() {
        let cropper = wide_region_cropper(25);
        let plant = PlantRecord::new("Golden Plant", 10.0, 100.0);

        let (result, plan) = cropper.crop_around(&sky(8, 6), &plant).unwrap();

        assert!(matches!(plan, CropPlan::Oversized { .. }));
        assert_eq!(result.dimensions(), (200, 150));
    }

    #[test]
    fn test_output_path_mirrors_layout() {
        let out = GeoCropper::output_path(
            Path::new("/data/in/20250101/0010/img_01.jpg"),
            Path::new("/data/in"),
            Path::new("/data/out"),
            "MT Solarpark 1",
        )
        .unwrap();

        assert_eq!(
            out,
            PathBuf::from("/data/out/MT_SOLARPARK_1/20250101/0010/img_01.jpg")
        );
    }

    #[test]
    fn test_output_path_outside_root() {
        let err = GeoCropper::output_path(
            Path::new("/elsewhere/img.png"),
            Path::new("/data/in"),
            Path::new("/data/out"),
            "P",
        )
        .unwrap_err();

        assert!(matches!(err, GeoCropError::OutsideInputRoot { .. }));
    }

    #[test]
    fn test_process_writes_mirrored_file() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        let image_path = input.path().join("20250101").join("0000").join("sky.png");
        write_sky(&image_path, 1000, 1000);

        let cropper = cropper_with_scale(2);
        let written = cropper
            .process(
                &image_path,
                "Golden Plant",
                &table(),
                input.path(),
                output.path(),
            )
            .unwrap();

        assert_eq!(
            written,
            output
                .path()
                .join("GOLDEN_PLANT")
                .join("20250101")
                .join("0000")
                .join("sky.png")
        );
        assert_eq!(load_image(&written).unwrap().dimensions(), (62, 62));
    }

    #[test]
    fn test_process_is_idempotent() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        let image_path = input.path().join("20250101").join("0000").join("sky.png");
        write_sky(&image_path, 500, 500);

        let cropper = cropper_with_scale(3);
        let table = table();

        let first = cropper
            .process(&image_path, "Golden Plant", &table, input.path(), output.path())
            .unwrap();
        let first_bytes = fs::read(&first).unwrap();

        let second = cropper
            .process(&image_path, "Golden Plant", &table, input.path(), output.path())
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(first_bytes, fs::read(&second).unwrap());
    }

    #[test]
    fn test_process_unknown_plant_writes_nothing() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        let image_path = input.path().join("20250101").join("0000").join("sky.png");
        write_sky(&image_path, 100, 100);

        let err = cropper_with_scale(2)
            .process(&image_path, "Nowhere", &table(), input.path(), output.path())
            .unwrap_err();

        assert!(matches!(err, GeoCropError::PlantNotFound { .. }));
        assert_eq!(fs::read_dir(output.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_process_ambiguous_plant() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        let image_path = input.path().join("20250101").join("0000").join("sky.png");
        write_sky(&image_path, 1000, 1000);

        let err = cropper_with_scale(1)
            .process(&image_path, "Twin", &table(), input.path(), output.path())
            .unwrap_err();
        assert!(matches!(err, GeoCropError::AmbiguousPlant { count: 2, .. }));

        let mut config = GeoCropConfig::default();
        config.scale_factor = 1;
        config.match_policy = MatchPolicy::Last;
        let written = GeoCropper::new(config)
            .unwrap()
            .process(&image_path, "Twin", &table(), input.path(), output.path())
            .unwrap();
        assert!(written.exists());
    }

    #[test]
    fn test_process_corrupt_image() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        let image_path = input.path().join("20250101").join("0000").join("bad.jpg");
        fs::create_dir_all(image_path.parent().unwrap()).unwrap();
        fs::write(&image_path, b"\xFF\xD8 truncated").unwrap();

        let err = cropper_with_scale(2)
            .process(&image_path, "Golden Plant", &table(), input.path(), output.path())
            .unwrap_err();

        assert!(matches!(err, GeoCropError::ImageDecode { .. }));
    }
}
