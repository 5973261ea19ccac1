// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! HEALPix resolution helpers, RING/NESTED reordering and map resampling.
//!
//! Only the bookkeeping needed to move maps between resolutions and orderings
//! lives here; pixel positions on the sky are left to whichever library
//! produced the maps.

use ndarray::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The largest nside HEALPix supports with 64-bit pixel indices.
pub const MAX_NSIDE: u32 = 1 << 29;

#[derive(Error, Debug)]
pub enum HealpixError {
    #[error("nside {0} is not a power of two between 1 and 2^29")]
    InvalidNside(u32),

    #[error("A map with {0} pixels doesn't correspond to any HEALPix resolution")]
    InvalidPixelCount(usize),
}

/// The number of pixels in a map of the given resolution.
pub fn nside2npix(nside: u32) -> usize {
    12 * (nside as usize) * (nside as usize)
}

/// Is `nside` a valid HEALPix resolution parameter?
pub fn is_valid_nside(nside: u32) -> bool {
    nside > 0 && nside <= MAX_NSIDE && nside.is_power_of_two()
}

/// Get the resolution parameter from a pixel count.
pub fn npix2nside(npix: usize) -> Result<u32, HealpixError> {
    if npix == 0 || npix % 12 != 0 {
        return Err(HealpixError::InvalidPixelCount(npix));
    }
    let nside_sq = npix / 12;
    let nside = (nside_sq as f64).sqrt().round() as usize;
    if nside * nside != nside_sq || nside > MAX_NSIDE as usize || !is_valid_nside(nside as u32) {
        return Err(HealpixError::InvalidPixelCount(npix));
    }
    Ok(nside as u32)
}

// Ring and phi offsets of the twelve base pixels, in units of nside.
const JRLL: [i64; 12] = [2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4];
const JPLL: [i64; 12] = [1, 3, 5, 7, 0, 2, 4, 6, 1, 3, 5, 7];

fn isqrt(v: i64) -> i64 {
    let mut r = (v as f64).sqrt() as i64;
    while r * r > v {
        r -= 1;
    }
    while (r + 1) * (r + 1) <= v {
        r += 1;
    }
    r
}

/// Move the bits of `v` to the even bit positions.
fn spread_bits(mut v: i64) -> i64 {
    let mut out = 0;
    let mut bit = 0;
    while v != 0 {
        out |= (v & 1) << (2 * bit);
        v >>= 1;
        bit += 1;
    }
    out
}

/// The inverse of [`spread_bits`]; odd bits are ignored.
fn compress_bits(mut v: i64) -> i64 {
    let mut out = 0;
    let mut bit = 0;
    while v != 0 {
        out |= (v & 1) << bit;
        v >>= 2;
        bit += 1;
    }
    out
}

/// (x, y, base pixel) of a RING pixel.
fn ring2xyf(nside: i64, pix: i64) -> (i64, i64, usize) {
    let ncap = 2 * nside * (nside - 1);
    let npix = 12 * nside * nside;
    let nl2 = 2 * nside;

    let (iring, iphi, kshift, nr, face) = if pix < ncap {
        // North polar cap.
        let iring = (1 + isqrt(1 + 2 * pix)) >> 1;
        let iphi = (pix + 1) - 2 * iring * (iring - 1);
        (iring, iphi, 0, iring, (iphi - 1) / iring)
    } else if pix < npix - ncap {
        // Equatorial belt.
        let ip = pix - ncap;
        let tmp = ip / (4 * nside);
        let iring = tmp + nside;
        let iphi = ip - tmp * 4 * nside + 1;
        let kshift = (iring + nside) & 1;
        let ire = tmp + 1;
        let irm = nl2 + 1 - tmp;
        let ifm = (iphi - ire / 2 + nside - 1) / nside;
        let ifp = (iphi - irm / 2 + nside - 1) / nside;
        let face = match ifp.cmp(&ifm) {
            std::cmp::Ordering::Equal => ifp | 4,
            std::cmp::Ordering::Less => ifp,
            std::cmp::Ordering::Greater => ifm + 8,
        };
        (iring, iphi, kshift, nside, face)
    } else {
        // South polar cap.
        let ip = npix - pix;
        let iring = (1 + isqrt(2 * ip - 1)) >> 1;
        let iphi = 4 * iring + 1 - (ip - 2 * iring * (iring - 1));
        (2 * nl2 - iring, iphi, 0, iring, (iphi - 1) / iring + 8)
    };

    let face = face as usize;
    let irt = iring - JRLL[face] * nside + 1;
    let mut ipt = 2 * iphi - JPLL[face] * nr - kshift - 1;
    if ipt >= nl2 {
        ipt -= 8 * nside;
    }
    ((ipt - irt) >> 1, (-ipt - irt) >> 1, face)
}

/// The RING pixel at (x, y) of a base pixel.
fn xyf2ring(nside: i64, ix: i64, iy: i64, face: usize) -> i64 {
    let nl4 = 4 * nside;
    let ncap = 2 * nside * (nside - 1);
    let npix = 12 * nside * nside;

    let jr = JRLL[face] * nside - ix - iy - 1;
    let (nr, n_before, kshift) = if jr < nside {
        (jr, 2 * jr * (jr - 1), 0)
    } else if jr > 3 * nside {
        let nr = nl4 - jr;
        (nr, npix - 2 * (nr + 1) * nr, 0)
    } else {
        (nside, ncap + (jr - nside) * nl4, (jr - nside) & 1)
    };

    let mut jp = (JPLL[face] * nr + ix - iy + 1 + kshift) / 2;
    if jp > nl4 {
        jp -= nl4;
    } else if jp < 1 {
        jp += nl4;
    }
    n_before + jp - 1
}

/// Convert a RING pixel index to NESTED. `pix` must be less than
/// `nside2npix(nside)`.
pub fn ring2nest(nside: u32, pix: usize) -> usize {
    let nside = i64::from(nside);
    let (ix, iy, face) = ring2xyf(nside, pix as i64);
    (face as i64 * nside * nside + spread_bits(ix) + (spread_bits(iy) << 1)) as usize
}

/// Convert a NESTED pixel index to RING. `pix` must be less than
/// `nside2npix(nside)`.
pub fn nest2ring(nside: u32, pix: usize) -> usize {
    let nside = i64::from(nside);
    let npface = nside * nside;
    let pix = pix as i64;
    let face = (pix / npface) as usize;
    let local = pix % npface;
    xyf2ring(nside, compress_bits(local), compress_bits(local >> 1), face) as usize
}

/// Reorder a full-sphere map from RING to NESTED.
pub fn ring_to_nested(map: ArrayView1<f64>) -> Result<Array1<f64>, HealpixError> {
    let nside = npix2nside(map.len())?;
    let mut out = Array1::zeros(map.len());
    for (pix, &v) in map.iter().enumerate() {
        out[ring2nest(nside, pix)] = v;
    }
    Ok(out)
}

/// Reorder a full-sphere map from NESTED to RING.
pub fn nested_to_ring(map: ArrayView1<f64>) -> Result<Array1<f64>, HealpixError> {
    let nside = npix2nside(map.len())?;
    let mut out = Array1::zeros(map.len());
    for (pix, &v) in map.iter().enumerate() {
        out[nest2ring(nside, pix)] = v;
    }
    Ok(out)
}

/// The pixel ordering of a HEALPix map.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelOrdering {
    /// healpy's default.
    #[default]
    Ring,

    Nested,
}

/// Something that can change the resolution of a full-sphere map.
pub trait MapResampler {
    /// Resample `map` to `nside_out`. The input resolution is inferred from the
    /// map's length.
    fn resample(&self, map: ArrayView1<f64>, nside_out: u32) -> Result<Array1<f64>, HealpixError>;
}

/// Resamples maps in the NESTED pixel ordering. Going up in resolution copies
/// each parent value into its children; going down averages the children.
#[derive(Debug, Default, Clone, Copy)]
pub struct NestedResampler;

impl MapResampler for NestedResampler {
    fn resample(&self, map: ArrayView1<f64>, nside_out: u32) -> Result<Array1<f64>, HealpixError> {
        if !is_valid_nside(nside_out) {
            return Err(HealpixError::InvalidNside(nside_out));
        }
        let nside_in = npix2nside(map.len())?;
        let npix_out = nside2npix(nside_out);

        let out = match nside_out.cmp(&nside_in) {
            std::cmp::Ordering::Equal => map.to_owned(),

            std::cmp::Ordering::Greater => {
                let ratio = (nside_out / nside_in) as usize;
                let children = ratio * ratio;
                Array1::from_shape_fn(npix_out, |p| map[p / children])
            }

            std::cmp::Ordering::Less => {
                let ratio = (nside_in / nside_out) as usize;
                let children = ratio * ratio;
                Array1::from_shape_fn(npix_out, |p| {
                    map.slice(s![p * children..(p + 1) * children]).sum() / children as f64
                })
            }
        };
        Ok(out)
    }
}

/// Resamples maps in the RING pixel ordering by way of NESTED.
#[derive(Debug, Default, Clone, Copy)]
pub struct RingResampler;

impl MapResampler for RingResampler {
    fn resample(&self, map: ArrayView1<f64>, nside_out: u32) -> Result<Array1<f64>, HealpixError> {
        if !is_valid_nside(nside_out) {
            return Err(HealpixError::InvalidNside(nside_out));
        }
        if npix2nside(map.len())? == nside_out {
            return Ok(map.to_owned());
        }
        let nested = ring_to_nested(map)?;
        let resampled = NestedResampler.resample(nested.view(), nside_out)?;
        nested_to_ring(resampled.view())
    }
}

impl MapResampler for PixelOrdering {
    fn resample(&self, map: ArrayView1<f64>, nside_out: u32) -> Result<Array1<f64>, HealpixError> {
        match self {
            PixelOrdering::Ring => RingResampler.resample(map, nside_out),
            PixelOrdering::Nested => NestedResampler.resample(map, nside_out),
        }
    }
}
