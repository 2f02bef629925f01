//! # ember-abi
//!
//! Contract ABI handling for the Ember Ethereum SDK.
//!
//! This crate covers the full path from a contract description to bytes
//! on the wire and back:
//!
//! - [`ParamType`]: the canonical type grammar used for selector and
//!   topic hashing
//! - [`Token`]: the typed value model, with a loose coercion boundary
//!   for human-typed integers
//! - [`encode`]/[`decode`]: the head/tail tuple codec
//! - [`Fragment`]/[`Interface`]: contract descriptions parsed from the
//!   terse human-readable form or the JSON ABI form, with per-fragment
//!   selectors, topics, and call/result/event/error codecs
//!
//! ```rust
//! use ember_abi::{Interface, Token};
//!
//! let iface = Interface::from_human_readable([
//!     "function transfer(address to, uint256 amount) returns (bool)",
//! ]).unwrap();
//!
//! let data = iface.encode_function_data("transfer", &[
//!     Token::address("0x1234567890123456789012345678901234567890").unwrap(),
//!     Token::uint(1_000u64),
//! ]).unwrap();
//! assert_eq!(&data[..4], &[0xa9, 0x05, 0x9c, 0xbb]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod decode;
mod encode;
mod error;
mod fragment;
mod interface;
mod param;
mod token;

pub use decode::decode;
pub use encode::{encode, encode_function_call};
pub use error::AbiError;
pub use fragment::{
    ConstructorFragment, ErrorFragment, EventFragment, FormatStyle, Fragment, FunctionFragment,
    Param, StateMutability,
};
pub use interface::{
    event_topic, id, DecodedError, DecodedLog, DecodedParams, Interface, ERROR_STRING_SELECTOR,
};
pub use param::ParamType;
pub use token::{I256, Token};
