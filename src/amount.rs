//! A simple [`Amount`] type for lightning amounts, which are denominated in milli-satoshis.

use core::fmt;
use core::fmt::Display;

const MAX_MSATS: u64 = 21_000_000_0000_0000_000;

/// An amount of lightning funds, internally denominated in milli-satoshis.
///
/// Amounts are guaranteed to never exceed 21 million Bitcoin.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Amount(u64);

impl fmt::Debug for Amount {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{} milli-satoshis", self.0)
	}
}

impl Amount {
	/// The amount in milli-satoshis.
	pub const fn milli_sats(&self) -> u64 {
		self.0
	}

	/// The amount in whole satoshis, with any sub-satoshi precision truncated away.
	pub const fn sats_floor(&self) -> u64 {
		self.0 / 1000
	}

	/// Constructs a new [`Amount`] for the given number of milli-satoshis.
	///
	/// Fails if the amount exceeds 21 million Bitcoin.
	pub const fn from_milli_sats(msats: u64) -> Result<Amount, ()> {
		if msats > MAX_MSATS {
			Err(())
		} else {
			Ok(Amount(msats))
		}
	}

	/// Constructs a new [`Amount`] for the given number of satoshis.
	///
	/// Fails if the amount exceeds 21 million Bitcoin.
	pub const fn from_sats(sats: u64) -> Result<Amount, ()> {
		if sats > MAX_MSATS / 1000 {
			Err(())
		} else {
			Ok(Amount(sats * 1000))
		}
	}

	/// Formats the amount as a decimal number of Bitcoin with the eight satoshi digits in
	/// space-separated groups, the way block explorers render channel capacities.
	///
	/// Sub-satoshi precision is truncated away.
	pub const fn satcomma(&self) -> FormattedAmount {
		FormattedAmount(self.0 / 1000)
	}
}

/// A [`Display`] implementation which writes a satoshi amount as `b.cc ddd eee` where `b` is
/// the number of whole Bitcoin and the eight following digits are the satoshis, grouped two,
/// three, and three.
pub struct FormattedAmount(u64);

impl Display for FormattedAmount {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		let btc = self.0 / 100_000_000;
		let sats = self.0 % 100_000_000;
		write!(
			f,
			"{}.{:02} {:03} {:03}",
			btc,
			sats / 1_000_000,
			(sats / 1_000) % 1_000,
			sats % 1_000
		)
	}
}

#[cfg(test)]
mod tests {
	use alloc::format;

	use super::*;

	#[test]
	fn test_conversions() {
		assert_eq!(Amount::from_sats(150).unwrap().milli_sats(), 150_000);
		assert_eq!(Amount::from_milli_sats(150_000).unwrap().sats_floor(), 150);
		assert_eq!(Amount::from_milli_sats(150_999).unwrap().sats_floor(), 150);
		assert_eq!(Amount::from_milli_sats(999).unwrap().sats_floor(), 0);

		assert_eq!(Amount::from_milli_sats(MAX_MSATS).unwrap().milli_sats(), MAX_MSATS);
		assert!(Amount::from_milli_sats(MAX_MSATS + 1).is_err());
		assert_eq!(Amount::from_sats(MAX_MSATS / 1000).unwrap().milli_sats(), MAX_MSATS);
		assert!(Amount::from_sats(MAX_MSATS / 1000 + 1).is_err());
	}

	#[test]
	#[rustfmt::skip]
	fn test_satcomma_display() {
		let from_sats = |sats: u64| Amount::from_sats(sats).unwrap();
		assert_eq!(&format!("{}", from_sats(0).satcomma()),                         "0.00 000 000");
		assert_eq!(&format!("{}", from_sats(1).satcomma()),                         "0.00 000 001");
		assert_eq!(&format!("{}", from_sats(150_000).satcomma()),                   "0.00 150 000");
		assert_eq!(&format!("{}", from_sats(123_456_789).satcomma()),               "1.23 456 789");
		assert_eq!(&format!("{}", from_sats(100_000_000).satcomma()),               "1.00 000 000");
		assert_eq!(&format!("{}", from_sats(2_100_000_000_000_000).satcomma()),     "21000000.00 000 000");
		// Sub-satoshi parts disappear from the rendering.
		assert_eq!(
			&format!("{}", Amount::from_milli_sats(1_999).unwrap().satcomma()),
			"0.00 000 001"
		);
	}
}
