//! The engine which turns user-entered payment addresses into concrete payment information.
//!
//! Two independent protocols answer the question "how do I pay `user@domain`?": LNURL-pay
//! fetches a metadata document from a well-known HTTPS URL derived from the address, and
//! BIP 353 reads a DNSSEC-proven TXT record carrying a BOLT 12 offer. An address may be
//! served by either or both, so [`PaymentResolver::resolve`] probes both at once and reports
//! every protocol which answered. Raw LNURLs take the LNURL-pay path alone, with the target
//! URL decoded out of the bech32 rather than derived.
//!
//! Resolution stops at payment *metadata*: both protocols hand back something that still has
//! to be exchanged for a concrete invoice once an amount is known, which is what
//! [`PaymentResolver::fetch_lnurl_invoice`] and [`PaymentResolver::fetch_offer_invoice`] do.

use crate::amount::Amount;
use crate::resolution::{
	Bip353Info, DohLookup, DohResponse, HttpFetch, HumanReadableName, LnurlInfo,
	ResolvedPaymentInfo,
};
use crate::ResolveError;

use std::fmt::Write;
use std::time::SystemTime;

/// Deployment configuration for a [`PaymentResolver`].
///
/// These are deployment choices rather than per-call parameters: which DNS-over-HTTPS
/// endpoint to trust, which API hosts the BOLT 12 invoice-fetch proxy, and which
/// asset/network path segment that proxy is mounted under. Everything is passed explicitly;
/// nothing is read from the process environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolverConfig {
	/// The DNS-over-HTTPS endpoint used for BIP 353 lookups.
	pub doh_endpoint: String,
	/// The base URL of the API exposing the BOLT 12 invoice-fetch proxy.
	pub api_base: String,
	/// The asset/network path segment the invoice-fetch proxy is mounted under.
	pub currency: String,
}

impl Default for ResolverConfig {
	fn default() -> Self {
		ResolverConfig {
			doh_endpoint: "https://1.1.1.1/dns-query".to_string(),
			api_base: "https://api.boltz.exchange".to_string(),
			currency: "BTC".to_string(),
		}
	}
}

/// The payment-address resolution engine.
///
/// Holds only its two network collaborators and a [`ResolverConfig`], making construction
/// cheap and drops side-effect free; an in-flight [`Self::resolve`] future that is dropped
/// simply stops issuing requests.
pub struct PaymentResolver<F: HttpFetch, D: DohLookup> {
	http: F,
	doh: D,
	config: ResolverConfig,
}

impl<F: HttpFetch, D: DohLookup> PaymentResolver<F, D> {
	/// Constructs a resolver driving the given collaborators.
	pub fn new(http: F, doh: D, config: ResolverConfig) -> Self {
		PaymentResolver { http, doh, config }
	}

	/// Resolves payment information for a user-entered string.
	///
	/// Payment addresses (anything containing `@`, with an optional `₿` prefix) are probed
	/// over LNURL-pay and BIP 353 concurrently; `lnurl...` strings over LNURL-pay alone.
	/// Any other input (including blank strings) resolves to an empty list without touching
	/// the network.
	///
	/// Per-protocol failures are deliberately swallowed rather than propagated: an address
	/// served by only one protocol still resolves, and one served by neither simply yields
	/// an empty list. Results are ordered LNURL-pay first, then BIP 353.
	pub async fn resolve(&self, input: &str) -> Vec<ResolvedPaymentInfo> {
		let input = input.trim();
		let mut resolved = Vec::new();
		if input.is_empty() {
			return resolved;
		}
		if input.contains('@') {
			let (lnurl_res, bip353_res) =
				tokio::join!(self.resolve_lnurl_address(input), self.resolve_bip353(input));
			if let Ok(info) = lnurl_res {
				resolved.push(ResolvedPaymentInfo::Lnurl(info));
			}
			if let Ok(info) = bip353_res {
				resolved.push(ResolvedPaymentInfo::Bip353(info));
			}
		} else if crate::is_lnurl_string(input) {
			if let Ok(info) = self.resolve_lnurl_string(input).await {
				resolved.push(ResolvedPaymentInfo::Lnurl(info));
			}
		}
		resolved
	}

	/// Fetches a concrete BOLT 11 invoice for `amount_sat` satoshis from a resolved
	/// LNURL-pay endpoint.
	///
	/// This is the explicit second step of LNURL-pay, run once the user has picked an
	/// amount. Unlike [`Self::resolve`] its failures are reported, and a remote
	/// `status: ERROR` document's `reason` comes back verbatim as [`ResolveError::Lnurl`]
	/// for display.
	pub async fn fetch_lnurl_invoice(
		&self, info: &LnurlInfo, amount_sat: u64,
	) -> Result<String, ResolveError> {
		let err = "Amounts above 21 million Bitcoin are not payable";
		let amount =
			Amount::from_sats(amount_sat).map_err(|()| ResolveError::InvalidFormat(err))?;
		let mut callback = info.callback.clone();
		if callback.contains('?') {
			write!(&mut callback, "&amount={}", amount.milli_sats()).expect("Write to String");
		} else {
			write!(&mut callback, "?amount={}", amount.milli_sats()).expect("Write to String");
		}

		let response = self.http.get_json(&callback).await?;
		check_lnurl_status(&response)?;
		match response.get("pr").and_then(|pr| pr.as_str()) {
			Some(pr) => Ok(pr.to_string()),
			None => {
				let err = "LNURL callback returned no payment request";
				Err(ResolveError::Lnurl(err.to_string()))
			},
		}
	}

	/// Requests a concrete BOLT 12 invoice for `amount_sat` satoshis against a resolved
	/// offer, via the configured invoice-fetch proxy.
	///
	/// Like [`Self::fetch_lnurl_invoice`] this runs on explicit user action and its
	/// failures are reported, carrying the proxy's error message where it supplied one.
	pub async fn fetch_offer_invoice(
		&self, info: &Bip353Info, amount_sat: u64,
	) -> Result<String, ResolveError> {
		let url = format!(
			"{}/v2/lightning/{}/bolt12/fetch",
			self.config.api_base, self.config.currency
		);
		let body = serde_json::json!({ "offer": info.offer, "amount": amount_sat });
		let response = self.http.post_json(&url, body).await?;
		match response.get("invoice").and_then(|invoice| invoice.as_str()) {
			Some(invoice) => Ok(invoice.to_string()),
			None => {
				let message = match response.get("error").and_then(|error| error.as_str()) {
					Some(error) => error.to_string(),
					None => "Invoice fetching failed".to_string(),
				};
				Err(ResolveError::Network(message))
			},
		}
	}

	async fn resolve_lnurl_address(&self, address: &str) -> Result<LnurlInfo, ResolveError> {
		let hrn = parse_address(address)?;
		let url = format!("https://{}/.well-known/lnurlp/{}", hrn.domain(), hrn.user());
		self.fetch_lnurl_info(url).await
	}

	async fn resolve_lnurl_string(&self, lnurl: &str) -> Result<LnurlInfo, ResolveError> {
		let err = "LNURLs must be bech32";
		let (_hrp, data) =
			bitcoin::bech32::decode(lnurl).map_err(|_| ResolveError::InvalidFormat(err))?;
		let err = "LNURLs must encode a UTF-8 URL";
		let url = String::from_utf8(data).map_err(|_| ResolveError::InvalidFormat(err))?;
		self.fetch_lnurl_info(url).await
	}

	async fn fetch_lnurl_info(&self, url: String) -> Result<LnurlInfo, ResolveError> {
		let document = self.http.get_json(&url).await?;
		check_lnurl_status(&document)?;
		let err = "LNURL-pay endpoint returned an unexpected document";
		let mut info: LnurlInfo = serde_json::from_value(document)
			.map_err(|_| ResolveError::Lnurl(err.to_string()))?;
		info.url = url;
		Ok(info)
	}

	async fn resolve_bip353(&self, address: &str) -> Result<Bip353Info, ResolveError> {
		let hrn = parse_address(address)?;
		let name = format!("{}.user._bitcoin-payment.{}.", hrn.user(), hrn.domain());
		let response = self.doh.lookup_txt(&name, &self.config.doh_endpoint).await?;
		// The validity window applies to the proof as a whole and is checked before any
		// record is looked at.
		check_proof_window(&response, unix_now())?;

		let record = match response.verified_rrs.first() {
			Some(record) => record,
			None => return Err(ResolveError::NoRecord),
		};
		if record.rr_type != "txt" {
			return Err(ResolveError::InvalidRecord);
		}
		parse_payment_params(&record.contents)
	}
}

fn parse_address(address: &str) -> Result<HumanReadableName, ResolveError> {
	let err = "Payment addresses must have the form user@domain";
	HumanReadableName::from_encoded(address).map_err(|()| ResolveError::InvalidFormat(err))
}

fn unix_now() -> u64 {
	SystemTime::now()
		.duration_since(SystemTime::UNIX_EPOCH)
		.map(|elapsed| elapsed.as_secs())
		.unwrap_or(0)
}

fn check_proof_window(response: &DohResponse, now: u64) -> Result<(), ResolveError> {
	if now < response.valid_from {
		return Err(ResolveError::ProofNotYetValid);
	}
	if now >= response.expires {
		return Err(ResolveError::ProofExpired);
	}
	Ok(())
}

fn check_lnurl_status(document: &serde_json::Value) -> Result<(), ResolveError> {
	if document.get("status").and_then(|status| status.as_str()) == Some("ERROR") {
		let reason = match document.get("reason").and_then(|reason| reason.as_str()) {
			Some(reason) => reason.to_string(),
			None => "LNURL endpoint reported an error".to_string(),
		};
		return Err(ResolveError::Lnurl(reason));
	}
	Ok(())
}

/// Parses the query parameters of a BIP 353 `bitcoin:` URI out of a TXT record's contents.
fn parse_payment_params(contents: &str) -> Result<Bip353Info, ResolveError> {
	let params = match contents.split_once('?') {
		Some((_, params)) => params,
		None => return Err(ResolveError::MissingOffer),
	};
	let mut offer = None;
	let mut ark_address = None;
	for param in params.split('&') {
		let (key, value) = match param.split_once('=') {
			Some((key, value)) => (key, value),
			None => continue,
		};
		// Resolvers in the wild differ on whether the URI values are quoted; strip any
		// quoting rather than letting it leak into the offer.
		if key == "lno" {
			offer = Some(value.replace('"', ""));
		} else if key == "ark" {
			ark_address = Some(value.replace('"', "").trim().to_string());
		}
	}
	match offer {
		Some(offer) if !offer.is_empty() => Ok(Bip353Info { offer, ark_address }),
		_ => Err(ResolveError::MissingOffer),
	}
}
