//! Literal token helpers.

use proc_macro2::{Literal, TokenStream};
use quote::quote;

use crate::value::PrimaryKey;

pub(super) fn integer(value: i64) -> TokenStream {
	if value == i64::MIN {
		quote!(i64::MIN)
	} else if value < 0 {
		let lit = Literal::i64_unsuffixed(-value);
		quote!(-#lit)
	} else {
		let lit = Literal::i64_unsuffixed(value);
		quote!(#lit)
	}
}

/// Caller guarantees `value` is finite.
pub(super) fn float(value: f64) -> TokenStream {
	let lit = Literal::f64_unsuffixed(value.abs());
	if value.is_sign_negative() && value != 0.0 {
		quote!(-#lit)
	} else {
		quote!(#lit)
	}
}

pub(super) fn primary_key(pk: &PrimaryKey) -> TokenStream {
	match pk {
		PrimaryKey::Integer(n) => {
			let lit = integer(*n);
			quote!(PrimaryKey::Integer(#lit))
		}
		PrimaryKey::Text(s) => quote!(PrimaryKey::from(#s)),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(42, "42")]
	#[case(-7, "- 7")]
	#[case(i64::MIN, "i64 :: MIN")]
	fn test_integer(#[case] value: i64, #[case] expected: &str) {
		assert_eq!(integer(value).to_string(), expected);
	}

	#[rstest]
	#[case(1.0, "1.0")]
	#[case(-2.5, "- 2.5")]
	#[case(0.125, "0.125")]
	fn test_float(#[case] value: f64, #[case] expected: &str) {
		assert_eq!(float(value).to_string(), expected);
	}

	#[rstest]
	fn test_primary_key_text_is_escaped() {
		let rendered = primary_key(&PrimaryKey::Text("a\"b".to_string())).to_string();

		assert!(rendered.starts_with("PrimaryKey"));
		assert!(rendered.contains(r#""a\"b""#));
	}
}
