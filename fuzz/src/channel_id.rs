// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! The input classifier and the channel id converter are the first things raw user-pasted text
//! hits, with no checksum or network round-trip in front of them. Here we feed them arbitrary
//! bytes directly, checking that classification never panics, that anything classified as a
//! channel id actually converts, and that conversion stabilizes after one round trip.

use lightning_payment_resolver::invoice::InvoiceKind;
use lightning_payment_resolver::scid::convert_channel_id;
use lightning_payment_resolver::{classify, InputKind};

#[inline]
pub fn do_test(data: &[u8]) {
	let input = match std::str::from_utf8(data) {
		Ok(input) => input,
		Err(_) => return,
	};
	let kind = classify(input);
	let _ = InvoiceKind::from_prefix(input.trim());
	match convert_channel_id(input.trim()) {
		Ok(converted) => {
			// Converting the converted form must land in the other rendering, and a second
			// full cycle must reproduce it exactly.
			let back = convert_channel_id(&converted).unwrap();
			let again = convert_channel_id(&back).unwrap();
			assert_eq!(converted, again);
		},
		Err(_) => assert_ne!(kind, InputKind::ChannelId),
	}
}

pub fn channel_id_test(data: &[u8]) {
	do_test(data);
}

#[no_mangle]
pub extern "C" fn channel_id_run(data: *const u8, datalen: usize) {
	do_test(unsafe { std::slice::from_raw_parts(data, datalen) });
}
