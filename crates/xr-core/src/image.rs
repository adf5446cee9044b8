use crate::error::{Error, Result};

/// Owned row-major grid. Index `(x, y)` lives at `y * width + x`.
#[derive(Debug, Clone, PartialEq)]
pub struct Image<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T> Image<T> {
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Result<Self> {
        let expected = width.checked_mul(height).ok_or(Error::SizeMismatch {
            expected: usize::MAX,
            actual: data.len(),
        })?;

        if data.len() != expected {
            return Err(Error::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Builds an image by evaluating `f(x, y)` in row-major order.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(width.saturating_mul(height));
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x)
    }

    pub fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get_mut(y * self.width + x)
    }

    pub fn row(&self, y: usize) -> &[T] {
        assert!(y < self.height, "row index out of bounds");
        let start = y * self.width;
        &self.data[start..start + self.width]
    }

    pub fn as_view(&self) -> ImageView<'_, T> {
        ImageView {
            width: self.width,
            height: self.height,
            stride: self.width,
            data: &self.data,
        }
    }

    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Image<U> {
        Image {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(f).collect(),
        }
    }

    /// Fails with [`Error::DimensionMismatch`] unless `other` has the same size.
    pub fn ensure_same_dims<U>(&self, other: &Image<U>) -> Result<()> {
        ensure_dims(self.dims(), other.dims())
    }
}

impl<T: Clone> Image<T> {
    pub fn new_fill(width: usize, height: usize, value: T) -> Self {
        let len = width.checked_mul(height).expect("image size overflow");
        Self {
            width,
            height,
            data: vec![value; len],
        }
    }
}

impl Image<f32> {
    /// `(min, max)` over all pixels, `None` for empty images.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        let mut it = self.data.iter().copied();
        let first = it.next()?;
        Some(it.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }
}

pub fn ensure_dims(expected: (usize, usize), actual: (usize, usize)) -> Result<()> {
    if expected != actual {
        return Err(Error::DimensionMismatch { expected, actual });
    }
    Ok(())
}

/// Borrowed strided view, typically over a reader's padded buffer.
///
/// `stride` is measured in elements and may exceed `width`.
#[derive(Debug, Clone, Copy)]
pub struct ImageView<'a, T> {
    width: usize,
    height: usize,
    stride: usize,
    data: &'a [T],
}

impl<'a, T> ImageView<'a, T> {
    pub fn from_slice(width: usize, height: usize, stride: usize, data: &'a [T]) -> Result<Self> {
        if stride < width {
            return Err(Error::InvalidStride);
        }

        let min_len = min_required_len(width, height, stride).ok_or(Error::SizeMismatch {
            expected: usize::MAX,
            actual: data.len(),
        })?;

        if data.len() < min_len {
            return Err(Error::SizeMismatch {
                expected: min_len,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            stride,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn row(&self, y: usize) -> &'a [T] {
        assert!(y < self.height, "row index out of bounds");
        let start = y * self.stride;
        &self.data[start..start + self.width]
    }

    pub fn get(&self, x: usize, y: usize) -> Option<&'a T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.stride + x)
    }

    pub fn is_contiguous(&self) -> bool {
        self.stride == self.width
    }

    /// Rectangle `[x, x + width) x [y, y + height)` of this view, same stride.
    pub fn subview(&self, x: usize, y: usize, width: usize, height: usize) -> Result<Self> {
        if x > self.width
            || y > self.height
            || width > self.width - x
            || height > self.height - y
        {
            return Err(Error::OutOfBounds);
        }
        if width == 0 || height == 0 {
            return Ok(Self {
                width,
                height,
                stride: self.stride,
                data: &[],
            });
        }

        let start = y * self.stride + x;
        let tail = self.data.get(start..).ok_or(Error::OutOfBounds)?;
        Self::from_slice(width, height, self.stride, tail)
    }
}

impl<T: Copy> ImageView<'_, T> {
    /// Packs the view into an owned, contiguous image.
    pub fn to_image(&self) -> Image<T> {
        let mut data = Vec::with_capacity(self.width * self.height);
        for y in 0..self.height {
            data.extend_from_slice(self.row(y));
        }
        Image {
            width: self.width,
            height: self.height,
            data,
        }
    }
}

fn min_required_len(width: usize, height: usize, stride: usize) -> Option<usize> {
    if width == 0 || height == 0 {
        return Some(0);
    }

    let rows_before_last = height.checked_sub(1)?;
    let base = rows_before_last.checked_mul(stride)?;
    base.checked_add(width)
}

/// Converts detector counts (`u8`, `u16`, ...) into an `f32` image.
pub fn to_f32<T: Copy + Into<f32>>(img: &ImageView<'_, T>) -> Image<f32> {
    let mut out = Vec::with_capacity(img.width() * img.height());
    for y in 0..img.height() {
        out.extend(img.row(y).iter().map(|&px| px.into()));
    }

    Image {
        width: img.width(),
        height: img.height(),
        data: out,
    }
}

#[cfg(test)]
mod tests {
    use super::{Image, ImageView, to_f32};
    use crate::Error;

    #[test]
    fn view_indexing_with_stride() {
        let data = vec![1u16, 2, 3, 99, 4, 5, 6, 88];
        let view = ImageView::from_slice(3, 2, 4, &data).expect("valid view");

        assert_eq!(view.row(1), &[4, 5, 6]);
        assert_eq!(view.get(2, 1), Some(&6));
        assert_eq!(view.get(3, 1), None);
        assert!(!view.is_contiguous());

        let packed = view.to_image();
        assert_eq!(packed.data(), &[1, 2, 3, 4, 5, 6]);

        let sub = view.subview(1, 1, 2, 1).expect("inside");
        assert_eq!(sub.row(0), &[5, 6]);
        assert_eq!(view.subview(2, 0, 2, 1).err(), Some(Error::OutOfBounds));
        assert_eq!(view.subview(0, 3, 0, 0).err(), Some(Error::OutOfBounds));
    }

    #[test]
    fn construction_checks_sizes() {
        assert_eq!(
            Image::from_vec(3, 2, vec![0u8; 5]),
            Err(Error::SizeMismatch {
                expected: 6,
                actual: 5
            })
        );
        let data = [0u8; 4];
        assert!(matches!(
            ImageView::from_slice(3, 2, 2, &data),
            Err(Error::InvalidStride)
        ));

        let a = Image::new_fill(4, 3, 0.0f32);
        let b = Image::new_fill(3, 4, 0u32);
        assert_eq!(
            a.ensure_same_dims(&b),
            Err(Error::DimensionMismatch {
                expected: (4, 3),
                actual: (3, 4)
            })
        );
    }

    #[test]
    fn from_fn_is_row_major_and_min_max() {
        let img = Image::from_fn(3, 2, |x, y| (x + 10 * y) as f32);
        assert_eq!(img.data(), &[0.0, 1.0, 2.0, 10.0, 11.0, 12.0]);
        assert_eq!(img.min_max(), Some((0.0, 12.0)));
        assert_eq!(Image::<f32>::new_fill(0, 0, 0.0).min_max(), None);
    }

    #[test]
    fn convert_counts_to_f32() {
        let img16 = Image::from_vec(2, 2, vec![100u16, 200, 300, 400]).expect("valid image");
        let out = to_f32(&img16.as_view());
        assert_eq!(out.data(), &[100.0, 200.0, 300.0, 400.0]);
    }
}
