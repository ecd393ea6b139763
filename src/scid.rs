//! Conversion between the two textual conventions for short channel ids.
//!
//! A lightning channel is identified by its funding output: a block height, the index of the
//! funding transaction within that block, and the index of the funding output within that
//! transaction. Some node implementations render the three components bit-packed into a single
//! 64-bit decimal integer (block in the top 24 bits, transaction index in the next 24, output
//! index in the bottom 16), others render them `x`-separated as `block x tx_index x vout`.
//! Channel lookups have to accept either and speak to nodes which use the other, so
//! [`convert_channel_id`] maps each form to its counterpart.

use crate::ResolveError;

use alloc::format;
use alloc::string::{String, ToString};

/// Maximum block height representable in a packed short channel id, based on the 3 bytes
/// available for the block height.
pub const MAX_SCID_BLOCK: u64 = 0x00ffffff;

/// Maximum transaction index representable in a packed short channel id, based on the 3 bytes
/// available for the tx index.
pub const MAX_SCID_TX_INDEX: u64 = 0x00ffffff;

/// Maximum output index representable in a packed short channel id, based on the 2 bytes
/// available for the vout.
pub const MAX_SCID_VOUT_INDEX: u64 = 0xffff;

/// Extracts the block height (most significant 3 bytes) from a packed short channel id.
pub const fn block_from_scid(short_channel_id: u64) -> u32 {
	(short_channel_id >> 40) as u32
}

/// Extracts the tx index (bytes [2..4]) from a packed short channel id.
pub const fn tx_index_from_scid(short_channel_id: u64) -> u32 {
	((short_channel_id >> 16) & MAX_SCID_TX_INDEX) as u32
}

/// Extracts the vout (bytes [0..2]) from a packed short channel id.
pub const fn vout_from_scid(short_channel_id: u64) -> u16 {
	(short_channel_id & MAX_SCID_VOUT_INDEX) as u16
}

fn parse_component(component: Option<&str>) -> Result<u64, ResolveError> {
	let err = "Channel ids must be three x-separated decimal components";
	let component = match component {
		Some(component) => component,
		None => return Err(ResolveError::InvalidFormat(err)),
	};
	component.trim().parse().map_err(|_| ResolveError::InvalidFormat(err))
}

/// Packs an `x`-separated `block x tx_index x vout` channel id into its 64-bit integer form.
///
/// Exactly three decimal components are required (surrounding whitespace is ignored).
/// Components are not range-checked: bits beyond each component's 24/24/16-bit field are
/// silently discarded in the packing, matching what nodes which emit such ids do themselves.
pub fn scid_from_components(id: &str) -> Result<u64, ResolveError> {
	let mut components = id.split('x');
	let block = parse_component(components.next())?;
	let tx_index = parse_component(components.next())?;
	let vout = parse_component(components.next())?;
	if components.next().is_some() {
		let err = "Channel ids must be three x-separated decimal components";
		return Err(ResolveError::InvalidFormat(err));
	}
	Ok((block << 40) | (tx_index << 16) | vout)
}

/// Renders a packed short channel id in its `x`-separated `block x tx_index x vout` form.
pub fn scid_to_components(short_channel_id: u64) -> String {
	format!(
		"{}x{}x{}",
		block_from_scid(short_channel_id),
		tx_index_from_scid(short_channel_id),
		vout_from_scid(short_channel_id),
	)
}

/// Converts a channel id from whichever textual convention it is in to the other.
///
/// Ids containing an `x` are treated as `block x tx_index x vout` and packed, anything else
/// must be a packed decimal integer and is expanded. Fails if the id fits neither form.
pub fn convert_channel_id(id: &str) -> Result<String, ResolveError> {
	if id.contains('x') {
		Ok(scid_from_components(id)?.to_string())
	} else {
		let err = "Packed channel ids must be decimal integers";
		let scid = id.trim().parse::<u64>().map_err(|_| ResolveError::InvalidFormat(err))?;
		Ok(scid_to_components(scid))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_component_extraction() {
		assert_eq!(block_from_scid(0x000001_000000_0000), 1);
		assert_eq!(block_from_scid(0xffffff_ffffff_ffff), 0xffffff);
		assert_eq!(tx_index_from_scid(0xffffff_000001_ffff), 1);
		assert_eq!(vout_from_scid(0x000001_000001_0001), 1);
		assert_eq!(vout_from_scid(0xffffff_ffffff_ffff), 0xffff);
	}

	#[test]
	fn test_pack_and_expand() {
		assert_eq!(scid_from_components("819028x2146x0").unwrap(), 900530809614761984);
		assert_eq!(scid_to_components(900530809614761984), "819028x2146x0");

		assert_eq!(scid_from_components("0x0x0").unwrap(), 0);
		assert_eq!(scid_to_components(0), "0x0x0");

		assert_eq!(
			scid_from_components("16777215x16777215x65535").unwrap(),
			0xffffff_ffffff_ffff
		);
		assert_eq!(scid_to_components(0xffffff_ffffff_ffff), "16777215x16777215x65535");

		// Whitespace around components is tolerated on input.
		assert_eq!(scid_from_components(" 819028 x 2146 x 0 ").unwrap(), 900530809614761984);
	}

	#[test]
	fn test_overflowing_components_wrap() {
		// 16777216 overflows the 24-bit block field by exactly one bit, leaving a zero block.
		assert_eq!(scid_from_components("16777216x0x0").unwrap(), 0);
		// A vout beyond 16 bits bleeds into the tx index bits rather than failing.
		assert_eq!(scid_from_components("0x0x65536").unwrap(), 0x000000_000001_0000);
	}

	#[test]
	fn test_malformed_components() {
		assert!(scid_from_components("819028x2146").is_err());
		assert!(scid_from_components("819028x2146x0x1").is_err());
		assert!(scid_from_components("819028x21a46x0").is_err());
		assert!(scid_from_components("").is_err());
		assert!(scid_from_components("xx").is_err());
	}

	#[test]
	fn test_convert_round_trips() {
		assert_eq!(convert_channel_id("819028x2146x0").unwrap(), "900530809614761984");
		assert_eq!(convert_channel_id("900530809614761984").unwrap(), "819028x2146x0");

		let packed = convert_channel_id("123x456x7").unwrap();
		assert_eq!(convert_channel_id(&packed).unwrap(), "123x456x7");

		assert!(convert_channel_id("lnbc1").is_err());
		assert!(convert_channel_id("one x two x three").is_err());
	}
}
