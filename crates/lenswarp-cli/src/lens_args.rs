//! Typed parsers for the compound output-lens arguments.
//!
//! `--rectilinear 12,36`, `--equisolid 8,36,3.14159` and `--equidistant 3.14159`
//! are split on commas and parsed into small structs; the sensor height is
//! filled in later from the output resolution.

use anyhow::{Result, bail};
use lenswarp_core::LensModel;

/// `--rectilinear focal_length,sensor_width`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectilinearArg {
    pub focal_length: f64,
    pub sensor_width: f64,
}

/// `--equisolid focal_length,sensor_width,fov`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquisolidArg {
    pub focal_length: f64,
    pub sensor_width: f64,
    pub fov: f64,
}

/// Sensor size assumed for `--equidistant`, which only takes a field of view.
pub const EQUIDISTANT_SENSOR: f64 = 36.0;

fn parse_fields<const N: usize>(s: &str, usage: &str) -> Result<[f64; N], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != N {
        return Err(format!("expected {usage}, got '{s}'"));
    }
    let mut out = [0.0; N];
    for (slot, part) in out.iter_mut().zip(&parts) {
        *slot = part
            .parse::<f64>()
            .map_err(|e| format!("'{part}' in '{s}': {e}"))?;
        if !slot.is_finite() {
            return Err(format!("'{part}' in '{s}' is not finite"));
        }
    }
    Ok(out)
}

/// Clap value parser for `--rectilinear`.
pub fn parse_rectilinear(s: &str) -> Result<RectilinearArg, String> {
    let [focal_length, sensor_width] = parse_fields(s, "focal_length,sensor_width")?;
    Ok(RectilinearArg {
        focal_length,
        sensor_width,
    })
}

/// Clap value parser for `--equisolid`.
pub fn parse_equisolid(s: &str) -> Result<EquisolidArg, String> {
    let [focal_length, sensor_width, fov] = parse_fields(s, "focal_length,sensor_width,fov")?;
    Ok(EquisolidArg {
        focal_length,
        sensor_width,
        fov,
    })
}

/// Clap value parser for `--equidistant`.
pub fn parse_fov(s: &str) -> Result<f64, String> {
    let [fov] = parse_fields(s, "fov")?;
    Ok(fov)
}

/// Output lens selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputLens {
    Rectilinear(RectilinearArg),
    Equisolid(EquisolidArg),
    Equidistant { fov: f64 },
    /// Keep the input lens (`--no-reproject`).
    Keep,
}

impl OutputLens {
    /// Builds the concrete output lens for an output image of
    /// `width` x `height` pixels.
    ///
    /// Rectilinear and equisolid lenses get a sensor height matching the
    /// image aspect; equidistant output always uses a 36 mm square sensor.
    pub fn resolve(self, input: LensModel, width: u32, height: u32) -> Result<LensModel> {
        if width == 0 || height == 0 {
            bail!("output resolution {width}x{height} is empty");
        }
        let aspect = height as f64 / width as f64;
        let lens = match self {
            Self::Rectilinear(a) => {
                LensModel::rectilinear(a.focal_length, a.sensor_width, a.sensor_width * aspect)?
            }
            Self::Equisolid(a) => LensModel::fisheye_equisolid(
                a.focal_length,
                a.sensor_width,
                a.sensor_width * aspect,
                a.fov,
            )?,
            Self::Equidistant { fov } => {
                LensModel::fisheye_equidistant(EQUIDISTANT_SENSOR, EQUIDISTANT_SENSOR, fov)?
            }
            Self::Keep => input,
        };
        Ok(lens)
    }

    /// Returns `true` for `--no-reproject`.
    #[inline]
    pub fn is_keep(&self) -> bool {
        matches!(self, Self::Keep)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_parse_rectilinear() {
        let a = parse_rectilinear("12,36").unwrap();
        assert_eq!(a.focal_length, 12.0);
        assert_eq!(a.sensor_width, 36.0);
        assert_eq!(parse_rectilinear(" 24.5 , 35 ").unwrap().focal_length, 24.5);
    }

    #[test]
    fn test_parse_equisolid() {
        let a = parse_equisolid("8,36,3.14").unwrap();
        assert_eq!((a.focal_length, a.sensor_width, a.fov), (8.0, 36.0, 3.14));
    }

    #[test]
    fn test_wrong_arity() {
        assert!(parse_rectilinear("12").is_err());
        assert!(parse_rectilinear("12,36,1").is_err());
        assert!(parse_equisolid("8,36").is_err());
        assert!(parse_fov("1,2").is_err());
    }

    #[test]
    fn test_not_a_number() {
        let err = parse_rectilinear("twelve,36").unwrap_err();
        assert!(err.contains("twelve"));
        assert!(parse_fov("").is_err());
        assert!(parse_fov("inf").is_err());
    }

    #[test]
    fn test_resolve_sets_sensor_aspect() {
        let input = LensModel::fisheye_equidistant(36.0, 36.0, PI).unwrap();
        let lens = OutputLens::Rectilinear(RectilinearArg {
            focal_length: 12.0,
            sensor_width: 36.0,
        })
        .resolve(input, 1920, 1080)
        .unwrap();
        let (w, h) = lens.sensor_size();
        assert_eq!(w, 36.0);
        assert_relative_eq!(h, 20.25);
    }

    #[test]
    fn test_resolve_equidistant_square_sensor() {
        let input = LensModel::rectilinear(12.0, 36.0, 24.0).unwrap();
        let lens = OutputLens::Equidistant { fov: PI }.resolve(input, 640, 480).unwrap();
        assert_eq!(lens.sensor_size(), (36.0, 36.0));
    }

    #[test]
    fn test_resolve_keep_and_invalid() {
        let input = LensModel::rectilinear(12.0, 36.0, 24.0).unwrap();
        assert_eq!(OutputLens::Keep.resolve(input, 10, 10).unwrap(), input);
        assert!(OutputLens::Equidistant { fov: 0.0 }.resolve(input, 10, 10).is_err());
        assert!(OutputLens::Keep.resolve(input, 0, 10).is_err());
    }
}
