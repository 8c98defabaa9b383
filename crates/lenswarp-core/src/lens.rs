//! Lens projection models.
//!
//! A [`LensModel`] maps between 2D image coordinates and 3D viewing
//! directions ([`Ray`]). Reprojection chains two of them:
//!
//! ```text
//! output pixel --unproject(output lens)--> Ray --project(input lens)--> input pixel
//! ```
//!
//! # Coordinate conventions
//!
//! - **Image coordinates**: continuous, pixel `i` covers `[i, i + 1)`, origin at
//!   the top-left corner, +X right, +Y down. The optical axis pierces the image
//!   at `(width / 2, height / 2)`.
//! - **Sensor coordinates**: millimetres relative to the optical axis,
//!   `x_mm = (px - width / 2) * sensor_width / width` (same for Y with
//!   `sensor_height / height`).
//! - **Rays**: unit vectors, +Z forward along the optical axis, +X right, +Y down.
//!
//! # Models
//!
//! | Model | Radial mapping | Valid region |
//! |-------|----------------|--------------|
//! | Rectilinear | `r = f * tan(θ)` | in front of the camera, on the sensor |
//! | Fisheye equisolid | `r = 2f * sin(θ/2)` | `θ <= fov / 2` |
//! | Fisheye equidistant | `r = f * θ`, `f = (sensor_width / 2) / (fov / 2)` | `θ <= fov / 2` |
//!
//! # Example
//!
//! ```rust
//! use lenswarp_core::LensModel;
//!
//! let lens = LensModel::rectilinear(35.0, 36.0, 24.0).unwrap();
//! let ray = lens.unproject(960.0, 540.0, 1920, 1080).unwrap();
//! assert!((ray.direction().z - 1.0).abs() < 1e-12);
//!
//! let (px, py) = lens.project(ray, 1920, 1080).unwrap();
//! assert!((px - 960.0).abs() < 1e-9 && (py - 540.0).abs() < 1e-9);
//! ```

use crate::{Error, Result};
use glam::DVec3;
use std::f64::consts::TAU;

/// Normalized 3D viewing direction.
///
/// Constructed only through [`Ray::new`] or [`Ray::from_polar`], so the
/// direction is always unit length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray(DVec3);

impl Ray {
    /// Normalizes `direction`; returns `None` for zero or non-finite vectors.
    #[inline]
    pub fn new(direction: DVec3) -> Option<Self> {
        direction.try_normalize().map(Ray)
    }

    /// Builds a ray from its angle to the optical axis `theta` and its
    /// azimuth `phi` around it (both radians).
    #[inline]
    pub fn from_polar(theta: f64, phi: f64) -> Self {
        let (sin_t, cos_t) = theta.sin_cos();
        let (sin_p, cos_p) = phi.sin_cos();
        Ray(DVec3::new(sin_t * cos_p, sin_t * sin_p, cos_t))
    }

    /// Unit direction vector.
    #[inline]
    pub fn direction(&self) -> DVec3 {
        self.0
    }

    /// Angle between the ray and the optical axis, in `[0, π]`.
    #[inline]
    pub fn angle_from_axis(&self) -> f64 {
        // atan2 stays accurate near the axis where acos(z) does not
        self.0.x.hypot(self.0.y).atan2(self.0.z)
    }
}

/// Camera lens projection model.
///
/// Lengths are in millimetres, angles in radians. Values are immutable and
/// cheap to copy; use [`validate`](Self::validate) (or the checked
/// constructors) before handing user-supplied parameters to the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum LensModel {
    /// Pinhole (perspective) projection.
    Rectilinear {
        /// Focal length (mm)
        focal_length: f64,
        /// Sensor width (mm)
        sensor_width: f64,
        /// Sensor height (mm)
        sensor_height: f64,
    },
    /// Equisolid-angle fisheye, `r = 2f * sin(θ/2)`.
    FisheyeEquisolid {
        /// Focal length (mm)
        focal_length: f64,
        /// Sensor width (mm)
        sensor_width: f64,
        /// Sensor height (mm)
        sensor_height: f64,
        /// Full field of view (radians)
        fov: f64,
    },
    /// Equidistant fisheye, `r = f * θ`. The focal length is implied by the
    /// sensor width and field of view.
    FisheyeEquidistant {
        /// Sensor width (mm)
        sensor_width: f64,
        /// Sensor height (mm)
        sensor_height: f64,
        /// Full field of view (radians)
        fov: f64,
    },
}

impl LensModel {
    /// Creates a validated rectilinear lens.
    pub fn rectilinear(focal_length: f64, sensor_width: f64, sensor_height: f64) -> Result<Self> {
        let lens = Self::Rectilinear {
            focal_length,
            sensor_width,
            sensor_height,
        };
        lens.validate()?;
        Ok(lens)
    }

    /// Creates a validated equisolid fisheye lens.
    pub fn fisheye_equisolid(
        focal_length: f64,
        sensor_width: f64,
        sensor_height: f64,
        fov: f64,
    ) -> Result<Self> {
        let lens = Self::FisheyeEquisolid {
            focal_length,
            sensor_width,
            sensor_height,
            fov,
        };
        lens.validate()?;
        Ok(lens)
    }

    /// Creates a validated equidistant fisheye lens.
    pub fn fisheye_equidistant(sensor_width: f64, sensor_height: f64, fov: f64) -> Result<Self> {
        let lens = Self::FisheyeEquidistant {
            sensor_width,
            sensor_height,
            fov,
        };
        lens.validate()?;
        Ok(lens)
    }

    /// Short model name, as used in the scene config.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Rectilinear { .. } => "rectilinear",
            Self::FisheyeEquisolid { .. } => "fisheye_equisolid",
            Self::FisheyeEquidistant { .. } => "fisheye_equidistant",
        }
    }

    /// Sensor size `(width, height)` in millimetres.
    #[inline]
    pub fn sensor_size(&self) -> (f64, f64) {
        match *self {
            Self::Rectilinear {
                sensor_width,
                sensor_height,
                ..
            }
            | Self::FisheyeEquisolid {
                sensor_width,
                sensor_height,
                ..
            }
            | Self::FisheyeEquidistant {
                sensor_width,
                sensor_height,
                ..
            } => (sensor_width, sensor_height),
        }
    }

    /// Returns the same lens with `sensor_height` derived from the pixel
    /// aspect of a `width x height` image (square pixels).
    pub fn with_sensor_aspect(self, width: u32, height: u32) -> Self {
        let (sensor_width, _) = self.sensor_size();
        let sensor_height = sensor_width * height as f64 / width as f64;
        match self {
            Self::Rectilinear { focal_length, .. } => Self::Rectilinear {
                focal_length,
                sensor_width,
                sensor_height,
            },
            Self::FisheyeEquisolid {
                focal_length, fov, ..
            } => Self::FisheyeEquisolid {
                focal_length,
                sensor_width,
                sensor_height,
                fov,
            },
            Self::FisheyeEquidistant { fov, .. } => Self::FisheyeEquidistant {
                sensor_width,
                sensor_height,
                fov,
            },
        }
    }

    /// Horizontal field of view covered by the sensor width, in radians.
    pub fn fov_horizontal(&self) -> f64 {
        let half_width = self.sensor_size().0 * 0.5;
        match *self {
            Self::Rectilinear { focal_length, .. } => 2.0 * (half_width / focal_length).atan(),
            Self::FisheyeEquisolid {
                focal_length, fov, ..
            } => {
                let s = (half_width / (2.0 * focal_length)).min(1.0);
                (4.0 * s.asin()).min(fov)
            }
            Self::FisheyeEquidistant { fov, .. } => fov,
        }
    }

    /// Checks the model's invariants.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLens`] when a sensor dimension or focal length
    /// is not a positive finite number, or a fisheye `fov` is outside `(0, 2π)`.
    pub fn validate(&self) -> Result<()> {
        let name = self.name();
        let (sensor_width, sensor_height) = self.sensor_size();
        positive(name, "sensor_width", sensor_width)?;
        positive(name, "sensor_height", sensor_height)?;
        match *self {
            Self::Rectilinear { focal_length, .. } => positive(name, "focal_length", focal_length),
            Self::FisheyeEquisolid {
                focal_length, fov, ..
            } => {
                positive(name, "focal_length", focal_length)?;
                fov_in_range(name, fov)
            }
            Self::FisheyeEquidistant { fov, .. } => fov_in_range(name, fov),
        }
    }

    /// Maps an image position to a viewing ray.
    ///
    /// `(px, py)` are continuous image coordinates of a `width x height`
    /// image. Returns `None` when the position lies outside the lens' image
    /// circle (fisheye models beyond `fov / 2`).
    pub fn unproject(&self, px: f64, py: f64, width: u32, height: u32) -> Option<Ray> {
        let (x, y) = self.image_to_sensor(px, py, width, height);
        match *self {
            Self::Rectilinear { focal_length, .. } => Ray::new(DVec3::new(x, y, focal_length)),
            Self::FisheyeEquisolid {
                focal_length, fov, ..
            } => {
                let s = x.hypot(y) / (2.0 * focal_length);
                if s > 1.0 {
                    return None;
                }
                let theta = 2.0 * s.asin();
                (theta <= fov * 0.5).then(|| Ray::from_polar(theta, y.atan2(x)))
            }
            Self::FisheyeEquidistant { fov, .. } => {
                let theta = x.hypot(y) / self.equidistant_focal_length();
                (theta <= fov * 0.5).then(|| Ray::from_polar(theta, y.atan2(x)))
            }
        }
    }

    /// Maps a viewing ray to continuous image coordinates.
    ///
    /// Returns `None` when the ray is not imaged by this lens: behind the
    /// camera or off the sensor for rectilinear, beyond `fov / 2` for fisheye.
    pub fn project(&self, ray: Ray, width: u32, height: u32) -> Option<(f64, f64)> {
        let d = ray.direction();
        let (x, y) = match *self {
            Self::Rectilinear { focal_length, .. } => {
                if d.z <= 0.0 {
                    return None;
                }
                (focal_length * d.x / d.z, focal_length * d.y / d.z)
            }
            Self::FisheyeEquisolid {
                focal_length, fov, ..
            } => {
                let theta = ray.angle_from_axis();
                if theta > fov * 0.5 {
                    return None;
                }
                radial_offset(d, 2.0 * focal_length * (theta * 0.5).sin())
            }
            Self::FisheyeEquidistant { fov, .. } => {
                let theta = ray.angle_from_axis();
                if theta > fov * 0.5 {
                    return None;
                }
                radial_offset(d, self.equidistant_focal_length() * theta)
            }
        };

        let (px, py) = self.sensor_to_image(x, y, width, height);
        if let Self::Rectilinear { .. } = self {
            let on_sensor = (0.0..=width as f64).contains(&px) && (0.0..=height as f64).contains(&py);
            if !on_sensor {
                return None;
            }
        }
        Some((px, py))
    }

    /// Focal length implied by an equidistant lens: the sensor half-width is
    /// reached at `θ = fov / 2`.
    #[inline]
    fn equidistant_focal_length(&self) -> f64 {
        match *self {
            Self::FisheyeEquidistant {
                sensor_width, fov, ..
            } => (sensor_width * 0.5) / (fov * 0.5),
            _ => unreachable!("equidistant focal length requested for {}", self.name()),
        }
    }

    #[inline]
    fn image_to_sensor(&self, px: f64, py: f64, width: u32, height: u32) -> (f64, f64) {
        let (sensor_width, sensor_height) = self.sensor_size();
        let (w, h) = (width as f64, height as f64);
        ((px - w * 0.5) * sensor_width / w, (py - h * 0.5) * sensor_height / h)
    }

    #[inline]
    fn sensor_to_image(&self, x: f64, y: f64, width: u32, height: u32) -> (f64, f64) {
        let (sensor_width, sensor_height) = self.sensor_size();
        let (w, h) = (width as f64, height as f64);
        (x * w / sensor_width + w * 0.5, y * h / sensor_height + h * 0.5)
    }
}

/// Sensor offset at radius `r` in the azimuth of `d`.
#[inline]
fn radial_offset(d: DVec3, r: f64) -> (f64, f64) {
    let rho = d.x.hypot(d.y);
    if rho < 1e-15 {
        (0.0, 0.0)
    } else {
        (r * d.x / rho, r * d.y / rho)
    }
}

fn positive(lens: &'static str, field: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::invalid_lens(lens, format!("{field} must be > 0, got {value}")))
    }
}

fn fov_in_range(lens: &'static str, fov: f64) -> Result<()> {
    if fov.is_finite() && fov > 0.0 && fov < TAU {
        Ok(())
    } else {
        Err(Error::invalid_lens(lens, format!("fov must be in (0, 2π) radians, got {fov}")))
    }
}
