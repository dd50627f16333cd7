//! Scalar multiplication on NIST P-256, the single curve this transport
//! speaks. Points travel in SEC1 uncompressed form (`04 || X || Y`, 65
//! bytes); scalars are 32 big-endian bytes.

use elliptic_curve::group::Group;
use elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use elliptic_curve::{Field, PrimeField};
use p256::{AffinePoint, EncodedPoint, ProjectivePoint, Scalar, SecretKey};
use rand::rngs::OsRng;

use crate::error::CryptoError;

pub const SCALAR_LEN: usize = 32;
pub const POINT_LEN: usize = 65;

/// A fresh ephemeral private scalar, 32 big-endian bytes, guaranteed to be
/// a valid non-zero curve scalar.
pub fn generate_scalar() -> [u8; SCALAR_LEN] {
    SecretKey::random(&mut OsRng).to_bytes().into()
}

/// Multiply the SEC1-encoded `point` by `scalar`; the result is returned
/// uncompressed. Malformed scalars and points fail, as does a
/// multiplication that lands on the point at infinity.
pub fn scalar_mult(scalar: &[u8], point: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let scalar = parse_scalar(scalar)?;
    let point = parse_point(point)?;
    encode(point * scalar)
}

/// Multiply the curve generator by `scalar` (public key derivation).
pub fn base_mult(scalar: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let scalar = parse_scalar(scalar)?;
    encode(ProjectivePoint::GENERATOR * scalar)
}

fn parse_scalar(scalar: &[u8]) -> Result<Scalar, CryptoError> {
    let bytes: [u8; SCALAR_LEN] = scalar.try_into().map_err(|_| CryptoError::InvalidScalar)?;
    let scalar = Option::<Scalar>::from(Scalar::from_repr(bytes.into()))
        .ok_or(CryptoError::InvalidScalar)?;
    if bool::from(scalar.is_zero()) {
        return Err(CryptoError::InvalidScalar);
    }
    Ok(scalar)
}

fn parse_point(point: &[u8]) -> Result<ProjectivePoint, CryptoError> {
    let encoded = EncodedPoint::from_bytes(point).map_err(|_| CryptoError::InvalidPoint)?;
    let affine = Option::<AffinePoint>::from(AffinePoint::from_encoded_point(&encoded))
        .ok_or(CryptoError::InvalidPoint)?;
    Ok(ProjectivePoint::from(affine))
}

fn encode(point: ProjectivePoint) -> Result<Vec<u8>, CryptoError> {
    if bool::from(point.is_identity()) {
        return Err(CryptoError::DegeneratePoint);
    }
    Ok(point.to_affine().to_encoded_point(false).as_bytes().to_vec())
}
