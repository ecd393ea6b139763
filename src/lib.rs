//! A resolution and introspection engine for the strings lightning users paste into an
//! explorer's search box: node public keys, channel ids in either of their two textual
//! conventions, BOLT 11 invoices, BOLT 12 offers and invoices, LNURLs, and human-readable
//! payment addresses like `user@domain`.
//!
//! Three entry points cover the interesting operations:
//!  * [`classify`] inspects a raw string and reports which [`InputKind`] it is, letting
//!    callers route it to a node lookup, a channel lookup, payment-address resolution, or a
//!    plain text search.
//!  * [`invoice::decode`] decodes the three lightning payment-request encodings down to the
//!    node public keys they involve (the payee or signing key plus every routing-hint and
//!    blinded-path entry node) and the requested amount, which is what it takes to link a
//!    pasted payment request back to nodes in the channel graph.
//!  * `resolver::PaymentResolver` (with the `std` feature) resolves payment addresses into
//!    concrete payment metadata, probing LNURL-pay and BIP 353 concurrently for addresses
//!    which could be served by either, and fetches concrete invoices once a user has picked
//!    an amount.
//!
//! Channel ids additionally get [`scid::convert_channel_id`] to map between their packed
//! 64-bit and `block x tx_index x vout` renderings.
//!
//! All network access happens through the collaborator traits in the `resolution` module,
//! keeping the engine runtime-agnostic and testable. With the `http` feature,
//! `http_fetcher::HTTPFetcher` implements both collaborators using `reqwest`, validating
//! BIP 353 DNSSEC proofs locally via `dnssec-prover`.

#![deny(missing_docs)]
#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;
extern crate core;

pub mod amount;
pub mod invoice;
pub mod scid;

#[cfg(feature = "std")]
pub mod resolution;
#[cfg(feature = "std")]
pub mod resolver;

#[cfg(feature = "http")]
pub mod http_fetcher;

use lightning::offers::parse::Bolt12ParseError;

use lightning_invoice::ParseOrSemanticError;

use core::fmt;

use alloc::string::String;

/// An error when classifying, decoding, or resolving a payment-related input string.
#[derive(Debug)]
#[cfg_attr(test, derive(PartialEq))]
pub enum ResolveError {
	/// The input didn't match the textual form its operation requires.
	///
	/// An error string containing English language details on why the input was rejected is
	/// provided.
	InvalidFormat(&'static str),
	/// An invalid lightning BOLT 11 invoice was encountered.
	InvalidBolt11(ParseOrSemanticError),
	/// An invalid lightning BOLT 12 offer or invoice was encountered.
	InvalidBolt12(Bolt12ParseError),
	/// A payment request parsed but named no node public keys at all, leaving nothing to
	/// look up.
	NoKeys,
	/// The DNSSEC proof for a payment address only becomes valid in the future.
	ProofNotYetValid,
	/// The DNSSEC proof for a payment address has expired.
	ProofExpired,
	/// DNS resolution for a payment address completed without any verified record.
	NoRecord,
	/// DNS resolution for a payment address returned a verified record of an unexpected
	/// type.
	InvalidRecord,
	/// The TXT record for a payment address carried no BOLT 12 offer.
	MissingOffer,
	/// An LNURL-pay endpoint reported an error.
	///
	/// The message is the remote document's own error text and is suitable for showing to
	/// users.
	Lnurl(String),
	/// A network request to one of the resolution collaborators failed.
	///
	/// Where the remote side supplied an error message it is carried here, otherwise a
	/// description of the transport failure.
	Network(String),
}

impl fmt::Display for ResolveError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			ResolveError::InvalidFormat(e) => write!(f, "{}", e),
			ResolveError::InvalidBolt11(e) => write!(f, "Invalid BOLT 11 invoice: {}", e),
			ResolveError::InvalidBolt12(e) => {
				write!(f, "Invalid BOLT 12 payment request: {:?}", e)
			},
			ResolveError::NoKeys => write!(f, "Payment request named no node public keys"),
			ResolveError::ProofNotYetValid => write!(f, "DNSSEC proof is not yet valid"),
			ResolveError::ProofExpired => write!(f, "DNSSEC proof has expired"),
			ResolveError::NoRecord => {
				write!(f, "No verified TXT record found for the payment address")
			},
			ResolveError::InvalidRecord => {
				write!(f, "DNS resolution returned a record of an unexpected type")
			},
			ResolveError::MissingOffer => {
				write!(f, "The payment address TXT record carried no offer")
			},
			ResolveError::Lnurl(reason) => write!(f, "{}", reason),
			ResolveError::Network(e) => write!(f, "{}", e),
		}
	}
}

#[cfg(feature = "std")]
impl std::error::Error for ResolveError {}

/// The kind of payment-related input a raw user-provided string represents.
///
/// Returned by [`classify`]. Each kind routes to a different operation: node and channel
/// lookups for the first two, `resolver::PaymentResolver::resolve` for [`Self::Resolvable`],
/// and a plain text search for the rest.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputKind {
	/// A hex-encoded 33-byte node public key.
	NodePubkey,
	/// A channel id, in either its packed 64-bit or `block x tx_index x vout` rendering.
	///
	/// See [`scid::convert_channel_id`] for mapping between the two.
	ChannelId,
	/// A payment address (`user@domain`) or an LNURL, resolvable over the network.
	Resolvable,
	/// Anything else, best handled as a free-text search.
	FreeText,
}

/// Classifies a raw user-provided string by the kind of payment input it represents.
///
/// The checks run in precedence order so that a string is never attributed to a later kind
/// when an earlier one also matches: node public key first, then channel id, then resolvable
/// payment address or LNURL, and finally free text. Surrounding whitespace is ignored.
pub fn classify(input: &str) -> InputKind {
	let input = input.trim();
	if is_pubkey(input) {
		InputKind::NodePubkey
	} else if is_channel_id(input) {
		InputKind::ChannelId
	} else if input.contains('@') || is_lnurl_string(input) {
		InputKind::Resolvable
	} else {
		InputKind::FreeText
	}
}

fn is_pubkey(input: &str) -> bool {
	input.len() == 66 && input.bytes().all(|b| b.is_ascii_hexdigit())
}

fn is_channel_id(input: &str) -> bool {
	// Either rendering counts. The packed form must parse entirely; the component form just
	// has to look plausible (three short numeric components), leaving exact validation to
	// the conversion itself.
	if input.parse::<u64>().is_ok() {
		return true;
	}
	let mut components = 0;
	for component in input.split('x') {
		let component = component.trim();
		if component.is_empty() || !component.bytes().all(|b| b.is_ascii_digit()) {
			return false;
		}
		components += 1;
	}
	components == 3 && input.len() < 15
}

pub(crate) fn is_lnurl_string(input: &str) -> bool {
	input.is_char_boundary(5) && input[..5].eq_ignore_ascii_case("lnurl")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_classify_pubkeys() {
		let kind = classify("03864ef025fde8fb587d989186ce6a4a186895ee44a926bfc370e2c366597a3f8f");
		assert_eq!(kind, InputKind::NodePubkey);
		let kind = classify("03864EF025FDE8FB587D989186CE6A4A186895EE44A926BFC370E2C366597A3F8F");
		assert_eq!(kind, InputKind::NodePubkey);

		// 65 hex characters is not a pubkey.
		let kind = classify("3864ef025fde8fb587d989186ce6a4a186895ee44a926bfc370e2c366597a3f8f");
		assert_ne!(kind, InputKind::NodePubkey);
		// Right length, not hex.
		let kind = classify("z3864ef025fde8fb587d989186ce6a4a186895ee44a926bfc370e2c366597a3f8");
		assert_ne!(kind, InputKind::NodePubkey);
	}

	#[test]
	fn test_classify_channel_ids() {
		assert_eq!(classify("734521x234x1"), InputKind::ChannelId);
		assert_eq!(classify("900530809614761984"), InputKind::ChannelId);
		assert_eq!(classify("  819028x2146x0  "), InputKind::ChannelId);
		assert_eq!(classify("0"), InputKind::ChannelId);

		// Too long for the component form even though it has three components.
		assert_eq!(classify("16777215x16777215x65535"), InputKind::FreeText);
		// Wrong component count.
		assert_eq!(classify("734521x234"), InputKind::FreeText);
		assert_eq!(classify("734521x234x1x2"), InputKind::FreeText);
		// Non-numeric components.
		assert_eq!(classify("blockxtxxout"), InputKind::FreeText);
	}

	#[test]
	fn test_classify_resolvable() {
		assert_eq!(classify("user@example.com"), InputKind::Resolvable);
		assert_eq!(classify("₿user@example.com"), InputKind::Resolvable);
		assert_eq!(
			classify("lnurl1dp68gurn8ghj7cnfw33k76tw9ehxjmn2vyhjuam9d3kz66mwdamkutmvde6hymrs9akxuatjd36x2um5ahcq39"),
			InputKind::Resolvable
		);
		assert_eq!(classify("LNURL1DP68GURN8GHJ7"), InputKind::Resolvable);

		// An `@` anywhere wins over free text, matching how aggressively wallets treat
		// pasted strings as payment addresses.
		assert_eq!(classify("hello @ world"), InputKind::Resolvable);
		assert_eq!(classify("lnur"), InputKind::FreeText);
	}

	#[test]
	fn test_classify_free_text() {
		assert_eq!(classify(""), InputKind::FreeText);
		assert_eq!(classify("   "), InputKind::FreeText);
		assert_eq!(classify("hello world"), InputKind::FreeText);
		assert_eq!(classify("ACINQ"), InputKind::FreeText);
		assert_eq!(classify("₿"), InputKind::FreeText);
		// Payment requests are not classified; they go straight to the invoice decoder.
		assert_eq!(classify("lnbc20m1pvjluez"), InputKind::FreeText);
	}

	#[test]
	fn test_classify_precedence() {
		// All-digit strings read as a pubkey at 66 characters and as a packed channel id at
		// shorter lengths; the pubkey check has to run first.
		let digits = "111111111111111111111111111111111111111111111111111111111111111111";
		assert_eq!(classify(digits), InputKind::NodePubkey);
		assert_eq!(classify(&digits[..18]), InputKind::ChannelId);
		// The channel-id check runs before the address check, but only fully numeric
		// components count as a channel id.
		assert_eq!(classify("12x34x5@host"), InputKind::Resolvable);
	}
}
