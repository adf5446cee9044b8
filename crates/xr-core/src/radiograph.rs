use crate::error::{Error, Result};
use crate::image::{Image, ensure_dims};

/// A detector frame as handed over by an instrument reader.
///
/// `pixel_pitch` is the physical size of one pixel (e.g. µm per pixel).
/// `calibration_offset`, when present, is a per-pixel additive offset that
/// [`Radiograph::calibrated`] removes. Stages never mutate a radiograph; they
/// build a new one with [`Radiograph::with_image`].
#[derive(Debug, Clone, PartialEq)]
pub struct Radiograph {
    image: Image<f32>,
    pixel_pitch: Option<f32>,
    calibration_offset: Option<Image<f32>>,
}

impl Radiograph {
    pub fn new(image: Image<f32>) -> Self {
        Self {
            image,
            pixel_pitch: None,
            calibration_offset: None,
        }
    }

    pub fn with_pixel_pitch(mut self, pitch: f32) -> Result<Self> {
        if !pitch.is_finite() || pitch <= 0.0 {
            return Err(Error::invalid(
                "pixel_pitch",
                format!("must be finite and > 0, got {pitch}"),
            ));
        }
        self.pixel_pitch = Some(pitch);
        Ok(self)
    }

    pub fn with_calibration_offset(mut self, offset: Image<f32>) -> Result<Self> {
        ensure_dims(self.image.dims(), offset.dims())?;
        self.calibration_offset = Some(offset);
        Ok(self)
    }

    /// Same metadata, new pixels. The offset is dropped: it applies to raw
    /// counts only.
    pub fn with_image(&self, image: Image<f32>) -> Result<Self> {
        ensure_dims(self.image.dims(), image.dims())?;
        Ok(Self {
            image,
            pixel_pitch: self.pixel_pitch,
            calibration_offset: None,
        })
    }

    pub fn image(&self) -> &Image<f32> {
        &self.image
    }

    pub fn into_image(self) -> Image<f32> {
        self.image
    }

    pub fn width(&self) -> usize {
        self.image.width()
    }

    pub fn height(&self) -> usize {
        self.image.height()
    }

    pub fn dims(&self) -> (usize, usize) {
        self.image.dims()
    }

    pub fn pixel_pitch(&self) -> Option<f32> {
        self.pixel_pitch
    }

    pub fn calibration_offset(&self) -> Option<&Image<f32>> {
        self.calibration_offset.as_ref()
    }

    /// Raw intensities with the calibration offset subtracted.
    pub fn calibrated(&self) -> Image<f32> {
        match &self.calibration_offset {
            None => self.image.clone(),
            Some(offset) => {
                let data = self
                    .image
                    .data()
                    .iter()
                    .zip(offset.data())
                    .map(|(&v, &o)| v - o)
                    .collect();
                Image::from_vec(self.width(), self.height(), data)
                    .expect("offset dimensions are checked on construction")
            }
        }
    }

    /// Region of interest `[x, x + width) x [y, y + height)`, offset included.
    ///
    /// Fails with [`Error::OutOfBounds`] when the rectangle leaves the frame.
    pub fn crop(&self, x: usize, y: usize, width: usize, height: usize) -> Result<Self> {
        let image = self.image.as_view().subview(x, y, width, height)?.to_image();
        let calibration_offset = match &self.calibration_offset {
            Some(offset) => Some(offset.as_view().subview(x, y, width, height)?.to_image()),
            None => None,
        };
        Ok(Self {
            image,
            pixel_pitch: self.pixel_pitch,
            calibration_offset,
        })
    }

    /// Intensities divided by the frame maximum.
    pub fn normalized_to_max(&self) -> Result<Image<f32>> {
        let (_, max) = self
            .image
            .min_max()
            .ok_or_else(|| Error::invalid("image", "empty radiograph"))?;
        if !max.is_finite() || max <= 0.0 {
            return Err(Error::invalid(
                "image",
                format!("maximum intensity must be finite and > 0, got {max}"),
            ));
        }
        Ok(self.image.map(|&v| v / max))
    }
}

#[cfg(test)]
mod tests {
    use super::Radiograph;
    use crate::{Error, Image};

    #[test]
    fn offset_is_subtracted_and_checked() {
        let img = Image::from_vec(2, 2, vec![10.0f32, 20.0, 30.0, 40.0]).expect("valid image");
        let offset = Image::new_fill(2, 2, 5.0f32);
        let r = Radiograph::new(img)
            .with_calibration_offset(offset)
            .expect("same dims");
        assert_eq!(r.calibrated().data(), &[5.0, 15.0, 25.0, 35.0]);

        let bad = Image::new_fill(3, 2, 0.0f32);
        assert!(matches!(
            Radiograph::new(Image::new_fill(2, 2, 0.0)).with_calibration_offset(bad),
            Err(Error::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn pitch_must_be_positive() {
        let r = Radiograph::new(Image::new_fill(2, 2, 1.0));
        assert!(r.clone().with_pixel_pitch(0.0).is_err());
        assert!(r.clone().with_pixel_pitch(f32::NAN).is_err());
        let r = r.with_pixel_pitch(2.5).expect("valid pitch");
        assert_eq!(r.pixel_pitch(), Some(2.5));

        let next = r.with_image(Image::new_fill(2, 2, 3.0)).expect("same dims");
        assert_eq!(next.pixel_pitch(), Some(2.5));
    }

    #[test]
    fn crop_keeps_metadata_aligned() {
        let img = Image::from_fn(4, 3, |x, y| (x + 10 * y) as f32);
        let offset = Image::from_fn(4, 3, |x, _| x as f32);
        let r = Radiograph::new(img)
            .with_calibration_offset(offset)
            .and_then(|r| r.with_pixel_pitch(0.5))
            .expect("valid radiograph");

        let roi = r.crop(1, 1, 2, 2).expect("inside the frame");
        assert_eq!(roi.dims(), (2, 2));
        assert_eq!(roi.image().data(), &[11.0, 12.0, 21.0, 22.0]);
        assert_eq!(roi.calibrated().data(), &[10.0, 10.0, 20.0, 20.0]);
        assert_eq!(roi.pixel_pitch(), Some(0.5));

        assert_eq!(r.crop(3, 0, 2, 1), Err(Error::OutOfBounds));
    }

    #[test]
    fn normalization_divides_by_max() {
        let img = Image::from_vec(2, 1, vec![2.0f32, 8.0]).expect("valid image");
        let n = Radiograph::new(img).normalized_to_max().expect("positive max");
        assert_eq!(n.data(), &[0.25, 1.0]);

        let zero = Radiograph::new(Image::new_fill(2, 2, 0.0));
        assert!(zero.normalized_to_max().is_err());
    }
}
