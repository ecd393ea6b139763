//! Traits describing the network collaborators payment-address resolution is built on, and
//! the data model resolution produces.
//!
//! The [`resolver`] engine needs two kinds of network access: plain HTTPS fetches returning
//! JSON (LNURL-pay documents and invoice fetches) and DNSSEC-validated TXT lookups over
//! DNS-over-HTTPS (BIP 353). Both sit behind traits so the engine can be driven by the
//! reqwest-backed production clients (the `http_fetcher` module, behind the `http` feature)
//! or by test doubles, and so callers with unusual transport requirements (Tor, proxies) can
//! bring their own.
//!
//! [`resolver`]: crate::resolver

use crate::ResolveError;

use core::future::Future;
use core::pin::Pin;

use serde::Deserialize;

pub use lightning::onion_message::dns_resolution::HumanReadableName;

/// A future which resolves to a parsed JSON document.
pub type JsonFuture<'a> =
	Pin<Box<dyn Future<Output = Result<serde_json::Value, ResolveError>> + Send + 'a>>;

/// A future which resolves to the outcome of a DNSSEC-validated TXT lookup.
pub type DohFuture<'a> =
	Pin<Box<dyn Future<Output = Result<DohResponse, ResolveError>> + Send + 'a>>;

/// An HTTP client able to fetch JSON documents.
///
/// Failures should be mapped to [`ResolveError::Network`], carrying the remote error body's
/// message when one is available, as these messages end up shown to users for explicit
/// actions like invoice fetches.
pub trait HttpFetch {
	/// Fetches `url`, following redirects, and parses the response body as JSON.
	fn get_json<'a>(&'a self, url: &'a str) -> JsonFuture<'a>;

	/// POSTs `body` as JSON to `url` and parses the response body as JSON.
	fn post_json<'a>(&'a self, url: &'a str, body: serde_json::Value) -> JsonFuture<'a>;
}

/// A DNSSEC-validating DNS-over-HTTPS client.
pub trait DohLookup {
	/// Looks up TXT records for the fully-qualified `name` via the DNS-over-HTTPS endpoint
	/// at `doh_endpoint`, returning only records whose DNSSEC chain of trust verified, along
	/// with the proof's validity window.
	fn lookup_txt<'a>(&'a self, name: &'a str, doh_endpoint: &'a str) -> DohFuture<'a>;
}

/// The outcome of a DNSSEC-validated TXT lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DohResponse {
	/// The earliest UNIX timestamp at which the proof is valid.
	pub valid_from: u64,
	/// The UNIX timestamp at which the proof expires.
	pub expires: u64,
	/// The DNSSEC-verified records for the queried name.
	pub verified_rrs: Vec<DohRecord>,
}

/// A single DNSSEC-verified resource record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DohRecord {
	/// The record's type, lowercase (`txt` for TXT records).
	pub rr_type: String,
	/// The record's data, rendered as text.
	pub contents: String,
}

/// The payment metadata an LNURL-pay endpoint returned for an address or LNURL.
///
/// Everything the endpoint supplied beyond the universally-present fields is preserved
/// verbatim in [`Self::extra`].
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct LnurlInfo {
	/// The URL the metadata document was fetched from.
	#[serde(skip)]
	pub url: String,
	/// The endpoint to fetch a concrete invoice from once an amount is known.
	///
	/// See [`PaymentResolver::fetch_lnurl_invoice`].
	///
	/// [`PaymentResolver::fetch_lnurl_invoice`]: crate::resolver::PaymentResolver::fetch_lnurl_invoice
	pub callback: String,
	/// The minimum amount the recipient accepts, in milli-satoshis.
	#[serde(rename = "minSendable")]
	pub min_sendable: u64,
	/// The maximum amount the recipient accepts, in milli-satoshis.
	#[serde(rename = "maxSendable")]
	pub max_sendable: u64,
	/// The opaque metadata string the recipient commits to in the final invoice.
	pub metadata: String,
	/// Any further fields of the remote document, unmodified.
	#[serde(flatten)]
	pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The payment instructions a BIP 353 DNS TXT record published for an address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bip353Info {
	/// The BOLT 12 offer carried in the record's `lno` parameter.
	///
	/// Passed as-is to [`PaymentResolver::fetch_offer_invoice`] (or [`invoice::decode`] for
	/// display); resolution itself does not parse it.
	///
	/// [`PaymentResolver::fetch_offer_invoice`]: crate::resolver::PaymentResolver::fetch_offer_invoice
	/// [`invoice::decode`]: crate::invoice::decode
	pub offer: String,
	/// The Ark address carried in the record's `ark` parameter, if any.
	pub ark_address: Option<String>,
}

/// One successful resolution of a payment address.
///
/// A payment address is probed over both LNURL-pay and BIP 353 at once, so a single
/// [`PaymentResolver::resolve`] call can produce either or both variants; the two protocols'
/// results are never merged.
///
/// [`PaymentResolver::resolve`]: crate::resolver::PaymentResolver::resolve
#[derive(Clone, Debug, PartialEq)]
pub enum ResolvedPaymentInfo {
	/// The address resolved via LNURL-pay.
	Lnurl(LnurlInfo),
	/// The address resolved via a BIP 353 DNS record.
	Bip353(Bip353Info),
}

/// An implementation of the resolution collaborators which can never succeed.
///
/// Useful when only the network-free operations of the crate are in use.
#[derive(Clone, Copy)]
pub struct DummyCollaborator;

impl HttpFetch for DummyCollaborator {
	fn get_json<'a>(&'a self, _url: &'a str) -> JsonFuture<'a> {
		let err = "HTTP fetching is not supported";
		Box::pin(async move { Err(ResolveError::Network(err.to_string())) })
	}

	fn post_json<'a>(&'a self, _url: &'a str, _body: serde_json::Value) -> JsonFuture<'a> {
		let err = "HTTP fetching is not supported";
		Box::pin(async move { Err(ResolveError::Network(err.to_string())) })
	}
}

impl DohLookup for DummyCollaborator {
	fn lookup_txt<'a>(&'a self, _name: &'a str, _doh_endpoint: &'a str) -> DohFuture<'a> {
		let err = "DNS resolution is not supported";
		Box::pin(async move { Err(ResolveError::Network(err.to_string())) })
	}
}
