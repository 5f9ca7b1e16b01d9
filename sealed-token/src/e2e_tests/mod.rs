//! End-to-end tests over the public issue/validate surface.
//!
//! Each test file covers one property, using fixed timestamps so every
//! boundary is exact.

#![cfg(test)]

mod helpers;

mod test_audience_issuer;
mod test_clock_skew;
mod test_concurrent_issuance;
mod test_expiry_boundary;
mod test_key_length;
mod test_not_before_boundary;
mod test_round_trip;
mod test_tamper;
