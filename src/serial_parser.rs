// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! SOA serial recovery
//!
//! Zone files written by this crate carry the serial right after the opening
//! parenthesis of the SOA record:
//!
//! ```text
//! @ IN SOA ns.vm. email.vm. (42 3600 3600 1209600 3600)
//! ```
//!
//! Anything that does not look like that yields `None` rather than an error,
//! and the caller keeps its current serial.
//!
//! ```rust
//! use vmzone::serial_parser::parse_soa_serial;
//!
//! let content = "$ORIGIN vm. \n$TTL 3600 \n@ IN SOA ns.vm. email.vm. (42 3600 3600 1209600 3600)\n";
//! assert_eq!(parse_soa_serial(content), Some(42));
//! ```

use nom::{
    bytes::complete::{tag, take_until},
    character::complete::char,
    combinator::map_res,
    sequence::{preceded, terminated},
    IResult,
};

/// Text between the first `(` and the following space
fn serial_field(input: &str) -> IResult<&str, &str> {
    preceded(
        terminated(take_until("("), char('(')),
        terminated(take_until(" "), tag(" ")),
    )(input)
}

/// Serial field as a number
fn soa_serial(input: &str) -> IResult<&str, u64> {
    map_res(serial_field, |field: &str| field.trim().parse::<u64>())(input)
}

/// Extract the SOA serial from zone file content
///
/// Returns `None` when there is no `(`, no space after it, or the text in
/// between is not a decimal `u64`.
pub fn parse_soa_serial(content: &str) -> Option<u64> {
    soa_serial(content).ok().map(|(_, serial)| serial)
}
