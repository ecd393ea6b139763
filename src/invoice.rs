//! Decoding of lightning payment requests down to the node public keys they involve.
//!
//! Explorers care about a payment request mostly as a set of pointers into the channel graph:
//! the payee (or offer signing key) plus the entry point of every routing hint or blinded
//! path is a node that can be looked up and displayed. [`decode`] extracts exactly that, along
//! with the requested amount when the encoding carries a concrete one.
//!
//! Three encodings are understood, distinguished by their case-insensitive human readable
//! prefix: BOLT 11 invoices (`lnbc`), BOLT 12 offers (`lno`), and BOLT 12 invoices (`lni`).

use bitcoin::bech32::primitives::decode::CheckedHrpstring;
use bitcoin::bech32::NoChecksum;
use bitcoin::secp256k1::PublicKey;

use lightning::blinded_path::IntroductionNode;
use lightning::offers::invoice::Bolt12Invoice;
use lightning::offers::offer::Offer;
use lightning::offers::parse::Bolt12ParseError;

use lightning_invoice::Bolt11Invoice;

use crate::ResolveError;

use alloc::str::FromStr;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

/// The three lightning payment-request encodings [`decode`] understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvoiceKind {
	/// A BOLT 11 invoice (`lnbc...`).
	Bolt11,
	/// A BOLT 12 offer (`lno...`).
	Bolt12Offer,
	/// A BOLT 12 invoice (`lni...`).
	Bolt12Invoice,
}

impl InvoiceKind {
	/// Determines the payment-request encoding of `input` by its case-insensitive prefix,
	/// returning `None` for strings which are not lightning payment requests.
	pub fn from_prefix(input: &str) -> Option<InvoiceKind> {
		let prefix_is = |prefix: &str| {
			input.is_char_boundary(prefix.len())
				&& input[..prefix.len()].eq_ignore_ascii_case(prefix)
		};
		if prefix_is("lnbc") {
			Some(InvoiceKind::Bolt11)
		} else if prefix_is("lno") {
			Some(InvoiceKind::Bolt12Offer)
		} else if prefix_is("lni") {
			Some(InvoiceKind::Bolt12Invoice)
		} else {
			None
		}
	}
}

/// The graph-relevant contents of a decoded payment request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedInvoice {
	/// The encoding the request was in.
	pub kind: InvoiceKind,
	/// The hex-encoded node public keys appearing in the request, deduplicated, in order of
	/// first appearance: the payee or signing key first, followed by the entry node of each
	/// routing hint or blinded path.
	///
	/// Compact blinded paths name their entry by channel rather than by key and contribute
	/// nothing here. Guaranteed non-empty.
	pub pubkeys: Vec<String>,
	/// The requested amount in whole satoshis, if the request encodes a concrete one.
	/// Sub-satoshi precision is truncated away.
	///
	/// Offers never carry one here: an offer's amount only becomes concrete in the invoice
	/// fetched for it.
	pub amount_sat: Option<u64>,
}

/// Decodes the given payment request, returning the node public keys it involves and the
/// requested amount when the encoding carries one.
///
/// `kind` is normally determined via [`InvoiceKind::from_prefix`]; decoding fails if `text` is
/// not a valid instance of that encoding.
pub fn decode(kind: InvoiceKind, text: &str) -> Result<DecodedInvoice, ResolveError> {
	match kind {
		InvoiceKind::Bolt11 => decode_bolt11(text),
		InvoiceKind::Bolt12Offer => decode_offer(text),
		InvoiceKind::Bolt12Invoice => decode_bolt12_invoice(text),
	}
}

fn push_unique(pubkeys: &mut Vec<String>, key: &PublicKey) {
	let hex = key.to_string();
	if !pubkeys.contains(&hex) {
		pubkeys.push(hex);
	}
}

fn push_introduction_node(pubkeys: &mut Vec<String>, introduction: &IntroductionNode) {
	match introduction {
		IntroductionNode::NodeId(node_id) => push_unique(pubkeys, node_id),
		// Compact paths identify their introduction point by channel, leaving no key to
		// surface.
		IntroductionNode::DirectedShortChannelId(..) => {},
	}
}

fn decode_bolt11(text: &str) -> Result<DecodedInvoice, ResolveError> {
	let invoice = Bolt11Invoice::from_str(text).map_err(ResolveError::InvalidBolt11)?;

	let mut pubkeys = Vec::new();
	let payee = match invoice.payee_pub_key() {
		Some(payee) => *payee,
		None => invoice.recover_payee_pub_key(),
	};
	push_unique(&mut pubkeys, &payee);
	for hint in invoice.route_hints() {
		for hop in hint.0.iter() {
			push_unique(&mut pubkeys, &hop.src_node_id);
		}
	}

	let amount_sat = invoice.amount_milli_satoshis().map(|msats| msats / 1000);
	Ok(DecodedInvoice { kind: InvoiceKind::Bolt11, pubkeys, amount_sat })
}

fn decode_offer(text: &str) -> Result<DecodedInvoice, ResolveError> {
	let offer = Offer::from_str(text).map_err(ResolveError::InvalidBolt12)?;

	let mut pubkeys = Vec::new();
	if let Some(signing_pubkey) = offer.issuer_signing_pubkey() {
		push_unique(&mut pubkeys, &signing_pubkey);
	}
	for path in offer.paths() {
		push_introduction_node(&mut pubkeys, path.introduction_node());
	}
	if pubkeys.is_empty() {
		return Err(ResolveError::NoKeys);
	}

	Ok(DecodedInvoice { kind: InvoiceKind::Bolt12Offer, pubkeys, amount_sat: None })
}

fn decode_bolt12_invoice(text: &str) -> Result<DecodedInvoice, ResolveError> {
	// `Bolt12Invoice` deliberately has no `FromStr` upstream as invoices normally arrive in
	// onion payloads, but explorers get handed them as bech32 strings.
	let parsed = CheckedHrpstring::new::<NoChecksum>(text)
		.map_err(|e| ResolveError::InvalidBolt12(Bolt12ParseError::Bech32(e)))?;
	if !parsed.hrp().as_str().eq_ignore_ascii_case("lni") {
		return Err(ResolveError::InvalidBolt12(Bolt12ParseError::InvalidBech32Hrp));
	}
	let data = parsed.byte_iter().collect::<Vec<u8>>();
	let invoice = Bolt12Invoice::try_from(data).map_err(ResolveError::InvalidBolt12)?;

	let mut pubkeys = Vec::new();
	push_unique(&mut pubkeys, &invoice.signing_pubkey());
	for path in invoice.payment_paths() {
		push_introduction_node(&mut pubkeys, path.introduction_node());
	}
	for path in invoice.message_paths() {
		push_introduction_node(&mut pubkeys, path.introduction_node());
	}

	let amount_sat = Some(invoice.amount_msats() / 1000);
	Ok(DecodedInvoice { kind: InvoiceKind::Bolt12Invoice, pubkeys, amount_sat })
}
