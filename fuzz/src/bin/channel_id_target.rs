#![cfg_attr(feature = "libfuzzer_fuzz", no_main)]

#[cfg(feature = "afl")]
#[macro_use]
extern crate afl;
#[cfg(feature = "afl")]
fn main() {
	fuzz!(|data| {
		lightning_payment_resolver_fuzz::channel_id::channel_id_test(data);
	});
}

#[cfg(feature = "honggfuzz")]
#[macro_use]
extern crate honggfuzz;
#[cfg(feature = "honggfuzz")]
fn main() {
	loop {
		fuzz!(|data| {
			lightning_payment_resolver_fuzz::channel_id::channel_id_test(data);
		});
	}
}

#[cfg(feature = "libfuzzer_fuzz")]
#[macro_use]
extern crate libfuzzer_sys;
#[cfg(feature = "libfuzzer_fuzz")]
fuzz_target!(|data: &[u8]| {
	lightning_payment_resolver_fuzz::channel_id::channel_id_test(data);
});

#[cfg(feature = "stdin_fuzz")]
fn main() {
	use std::io::Read;

	let mut data = Vec::with_capacity(8192);
	std::io::stdin().read_to_end(&mut data).unwrap();
	lightning_payment_resolver_fuzz::channel_id::channel_id_test(&data);
}

#[cfg(not(any(
	feature = "afl",
	feature = "honggfuzz",
	feature = "libfuzzer_fuzz",
	feature = "stdin_fuzz"
)))]
fn main() {}
