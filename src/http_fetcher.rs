//! Production [`HttpFetch`] and [`DohLookup`] implementations backed by `reqwest`.
//!
//! DNS-over-HTTPS lookups build a full DNSSEC proof by iteratively querying the configured
//! endpoint and verify it locally via `dnssec-prover`; only records whose chain of trust
//! verifies are handed to the resolution engine, along with the proof's validity window.
//!
//! Note that resolution necessarily reveals the addresses being looked up to the configured
//! DNS-over-HTTPS operator and to the LNURL servers involved.

use std::boxed::Box;

use dnssec_prover::query::{ProofBuilder, QueryBuf};
use dnssec_prover::rr::{Name, RR, TXT_TYPE};
use dnssec_prover::ser::parse_rr_stream;
use dnssec_prover::validation::verify_rr_stream;

use crate::resolution::{DohFuture, DohLookup, DohRecord, DohResponse, HttpFetch, JsonFuture};
use crate::ResolveError;

/// An [`HttpFetch`] and [`DohLookup`] implementation using `reqwest`.
///
/// Redirects are followed per `reqwest`'s default policy. Callers needing timeouts, proxies,
/// or custom TLS configuration can supply their own client via [`Self::with_client`].
#[derive(Debug, Clone)]
pub struct HTTPFetcher {
	client: reqwest::Client,
}

impl HTTPFetcher {
	/// Create a new `HTTPFetcher` with a default `reqwest::Client`.
	pub fn new() -> Self {
		HTTPFetcher::default()
	}

	/// Create a new `HTTPFetcher` with a custom `reqwest::Client`.
	pub fn with_client(client: reqwest::Client) -> Self {
		HTTPFetcher { client }
	}
}

impl Default for HTTPFetcher {
	fn default() -> Self {
		HTTPFetcher { client: reqwest::Client::new() }
	}
}

/// The "URL and Filename safe" Base64 Alphabet from RFC 4648
const B64_CHAR: [u8; 64] = [
	b'A', b'B', b'C', b'D', b'E', b'F', b'G', b'H', b'I', b'J', b'K', b'L', b'M', b'N', b'O', b'P',
	b'Q', b'R', b'S', b'T', b'U', b'V', b'W', b'X', b'Y', b'Z', b'a', b'b', b'c', b'd', b'e', b'f',
	b'g', b'h', b'i', b'j', b'k', b'l', b'm', b'n', b'o', b'p', b'q', b'r', b's', b't', b'u', b'v',
	b'w', b'x', b'y', b'z', b'0', b'1', b'2', b'3', b'4', b'5', b'6', b'7', b'8', b'9', b'-', b'_',
];

#[rustfmt::skip]
fn write_base64(mut bytes: &[u8], out: &mut String) {
	while bytes.len() >= 3 {
		let (byte_a, byte_b, byte_c) = (bytes[0] as usize, bytes[1] as usize, bytes[2] as usize);
		out.push(B64_CHAR[ (byte_a & 0b1111_1100) >> 2] as char);
		out.push(B64_CHAR[((byte_a & 0b0000_0011) << 4) | ((byte_b & 0b1111_0000) >> 4)] as char);
		out.push(B64_CHAR[((byte_b & 0b0000_1111) << 2) | ((byte_c & 0b1100_0000) >> 6)] as char);
		out.push(B64_CHAR[  byte_c & 0b0011_1111] as char);
		bytes = &bytes[3..];
	}
	match bytes.len() {
		2 => {
			let (byte_a, byte_b, byte_c) = (bytes[0] as usize, bytes[1] as usize, 0usize);
			out.push(B64_CHAR[ (byte_a & 0b1111_1100) >> 2] as char);
			out.push(B64_CHAR[((byte_a & 0b0000_0011) << 4) | ((byte_b & 0b1111_0000) >> 4)] as char);
			out.push(B64_CHAR[((byte_b & 0b0000_1111) << 2) | ((byte_c & 0b1100_0000) >> 6)] as char);
		},
		1 => {
			let (byte_a, byte_b) = (bytes[0] as usize, 0usize);
			out.push(B64_CHAR[ (byte_a & 0b1111_1100) >> 2] as char);
			out.push(B64_CHAR[((byte_a & 0b0000_0011) << 4) | ((byte_b & 0b1111_0000) >> 4)] as char);
		},
		_ => debug_assert_eq!(bytes.len(), 0),
	}
}

fn query_to_url(doh_endpoint: &str, query: QueryBuf) -> String {
	let base64_len = (query.len() * 8 + 5) / 6;
	let mut query_string = String::with_capacity(base64_len + doh_endpoint.len() + 5);

	query_string += doh_endpoint;
	// RFC 8484 GET form; endpoints which already carry a query string get the `dns`
	// parameter appended instead.
	if doh_endpoint.contains('?') {
		query_string += "&dns=";
	} else {
		query_string += "?dns=";
	}
	write_base64(&query[..], &mut query_string);

	debug_assert_eq!(query_string.len(), base64_len + doh_endpoint.len() + 5);

	query_string
}

/// Interprets an HTTP response body as JSON.
///
/// LNURL-pay endpoints and the invoice-fetch proxy signal failures inside the response
/// document (`status`/`reason`, `error`) under varying HTTP statuses. A body which parses as
/// JSON is always handed to the caller; the HTTP status is only reported when there is no
/// document to read.
fn decode_json_body(
	status: reqwest::StatusCode, body: &[u8],
) -> Result<serde_json::Value, ResolveError> {
	match serde_json::from_slice(body) {
		Ok(document) => Ok(document),
		Err(_) if status.is_success() => {
			let err = "HTTP response was not JSON";
			Err(ResolveError::Network(err.to_string()))
		},
		Err(_) => {
			Err(ResolveError::Network(format!("HTTP request failed with status {}", status)))
		},
	}
}

const DNS_ERR: &'static str = "DNS-over-HTTPS request failed";

impl HTTPFetcher {
	async fn request_json(
		&self, req: reqwest::RequestBuilder,
	) -> Result<serde_json::Value, ResolveError> {
		let err = "HTTP request failed";
		let resp = req.send().await.map_err(|_| ResolveError::Network(err.to_string()))?;
		let status = resp.status();
		let err = "HTTP response could not be read";
		let body = resp.bytes().await.map_err(|_| ResolveError::Network(err.to_string()))?;
		decode_json_body(status, &body)
	}

	async fn lookup_txt_impl(
		&self, name: &str, doh_endpoint: &str,
	) -> Result<DohResponse, ResolveError> {
		let err = "Name was not a valid fully-qualified DNS name";
		let dns_name = Name::try_from(name.to_string())
			.map_err(|_| ResolveError::Network(err.to_string()))?;
		let (mut proof_builder, initial_query) = ProofBuilder::new(&dns_name, TXT_TYPE);
		let mut pending_queries = vec![initial_query];

		while let Some(query) = pending_queries.pop() {
			let request_url = query_to_url(doh_endpoint, query);
			let resp = self
				.client
				.get(request_url)
				.header("accept", "application/dns-message")
				.send()
				.await
				.map_err(|_| ResolveError::Network(DNS_ERR.to_string()))?;
			let body =
				resp.bytes().await.map_err(|_| ResolveError::Network(DNS_ERR.to_string()))?;

			let mut answer = QueryBuf::new_zeroed(0);
			answer.extend_from_slice(&body[..]);
			match proof_builder.process_response(&answer) {
				Ok(queries) => {
					for query in queries {
						pending_queries.push(query);
					}
				},
				Err(_) => {
					return Err(ResolveError::Network(DNS_ERR.to_string()));
				},
			}
		}

		let err = "Too many queries required to build proof";
		let proof = match proof_builder.finish_proof() {
			Ok((proof, _ttl)) => proof,
			Err(()) => return Err(ResolveError::Network(err.to_string())),
		};

		verify_txt_proof(&dns_name, &proof)
	}
}

/// Verifies a built DNSSEC proof and extracts the records proven for `name`, following any
/// CNAME/DNAME indirection, together with the proof's validity window.
fn verify_txt_proof(name: &Name, proof: &[u8]) -> Result<DohResponse, ResolveError> {
	let err = "DNSSEC proof did not parse";
	let rrs = parse_rr_stream(proof).map_err(|()| ResolveError::Network(err.to_string()))?;
	let err = "DNSSEC proof did not verify";
	let verified = verify_rr_stream(&rrs).map_err(|_| ResolveError::Network(err.to_string()))?;

	let verified_rrs = verified
		.resolve_name(name)
		.iter()
		.map(|rr| match rr {
			RR::Txt(txt) => DohRecord {
				rr_type: "txt".to_string(),
				contents: String::from_utf8_lossy(&txt.data.as_vec()).into_owned(),
			},
			_ => DohRecord { rr_type: "other".to_string(), contents: String::new() },
		})
		.collect();

	Ok(DohResponse { valid_from: verified.valid_from, expires: verified.expires, verified_rrs })
}

impl HttpFetch for HTTPFetcher {
	fn get_json<'a>(&'a self, url: &'a str) -> JsonFuture<'a> {
		Box::pin(async move { self.request_json(self.client.get(url)).await })
	}

	fn post_json<'a>(&'a self, url: &'a str, body: serde_json::Value) -> JsonFuture<'a> {
		Box::pin(async move { self.request_json(self.client.post(url).json(&body)).await })
	}
}

impl DohLookup for HTTPFetcher {
	fn lookup_txt<'a>(&'a self, name: &'a str, doh_endpoint: &'a str) -> DohFuture<'a> {
		Box::pin(async move { self.lookup_txt_impl(name, doh_endpoint).await })
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn to_base64(bytes: &[u8]) -> String {
		let expected_len = (bytes.len() * 8 + 5) / 6;
		let mut res = String::with_capacity(expected_len);
		write_base64(bytes, &mut res);
		assert_eq!(res.len(), expected_len);
		res
	}

	#[test]
	fn test_base64() {
		// RFC 4648
		assert_eq!(&to_base64(b"f"), "Zg");
		assert_eq!(&to_base64(b"fo"), "Zm8");
		assert_eq!(&to_base64(b"foo"), "Zm9v");
		assert_eq!(&to_base64(b"foob"), "Zm9vYg");
		assert_eq!(&to_base64(b"fooba"), "Zm9vYmE");
		assert_eq!(&to_base64(b"foobar"), "Zm9vYmFy");
		// Wikipedia
		assert_eq!(
			&to_base64(b"Many hands make light work."),
			"TWFueSBoYW5kcyBtYWtlIGxpZ2h0IHdvcmsu"
		);
		assert_eq!(&to_base64(b"Man"), "TWFu");
	}

	#[test]
	fn test_query_to_url() {
		let mut query = QueryBuf::new_zeroed(0);
		query.extend_from_slice(b"foobar");
		let url = query_to_url("https://1.1.1.1/dns-query", query);
		assert_eq!(url, "https://1.1.1.1/dns-query?dns=Zm9vYmFy");

		let mut query = QueryBuf::new_zeroed(0);
		query.extend_from_slice(b"foobar");
		let url = query_to_url("https://dns.example.com/resolve?ct", query);
		assert_eq!(url, "https://dns.example.com/resolve?ct&dns=Zm9vYmFy");
	}

	#[test]
	fn test_decode_json_body() {
		use reqwest::StatusCode;

		// Error documents arrive paired with non-2xx statuses in the wild; the document,
		// not the bare status, carries the message worth surfacing.
		let body = br#"{"status":"ERROR","reason":"No route"}"#;
		let doc = decode_json_body(StatusCode::PAYMENT_REQUIRED, body).unwrap();
		assert_eq!(doc.get("reason").and_then(|reason| reason.as_str()), Some("No route"));

		let doc = decode_json_body(StatusCode::OK, br#"{"pr":"lnbc1fake"}"#).unwrap();
		assert_eq!(doc.get("pr").and_then(|pr| pr.as_str()), Some("lnbc1fake"));

		// Without a document the status is all there is to report.
		let err = decode_json_body(StatusCode::BAD_GATEWAY, b"<html>oops</html>").unwrap_err();
		assert_eq!(
			err,
			ResolveError::Network("HTTP request failed with status 502 Bad Gateway".to_string())
		);

		let err = decode_json_body(StatusCode::OK, b"not json").unwrap_err();
		assert_eq!(err, ResolveError::Network("HTTP response was not JSON".to_string()));
	}
}
