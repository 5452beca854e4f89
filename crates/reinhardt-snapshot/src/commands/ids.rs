//! Identifier list parsing for single-model exports.

use indexmap::IndexSet;

use crate::value::PrimaryKey;

/// Largest range a single token may expand to.
const MAX_RANGE_LEN: u64 = 100_000;

/// Parses a whitespace separated list of identifiers and ranges.
///
/// `"12 15-17"` yields `12, 15, 16, 17`. Ranges are inclusive and may run
/// downwards. Only positive identifiers are kept; tokens that do not start
/// with a number are ignored and duplicates keep their first position.
///
/// # Examples
///
/// ```
/// use reinhardt_snapshot::commands::parse_ids;
/// use reinhardt_snapshot::PrimaryKey;
///
/// let ids = parse_ids("3 1-2 3");
/// assert_eq!(ids, vec![PrimaryKey::Integer(3), PrimaryKey::Integer(1), PrimaryKey::Integer(2)]);
/// ```
pub fn parse_ids(input: &str) -> Vec<PrimaryKey> {
	let mut ids: IndexSet<i64> = IndexSet::new();
	for token in input.split_whitespace() {
		if token.contains('-') {
			ids.extend(expand_range(token));
		} else if let Some(id) = leading_integer(token).filter(|id| *id > 0) {
			ids.insert(id);
		}
	}
	ids.into_iter().map(PrimaryKey::Integer).collect()
}

fn expand_range(token: &str) -> Vec<i64> {
	let bounds: Vec<&str> = token.split('-').collect();
	let [begin, end] = bounds.as_slice() else {
		return Vec::new();
	};
	let (Some(begin), Some(end)) = (leading_integer(begin), leading_integer(end)) else {
		return Vec::new();
	};
	if begin <= 0 || end <= 0 {
		return Vec::new();
	}
	if begin.abs_diff(end) >= MAX_RANGE_LEN {
		tracing::warn!(range = token, "identifier range too large, ignored");
		return Vec::new();
	}
	if begin <= end {
		(begin..=end).collect()
	} else {
		(end..=begin).rev().collect()
	}
}

/// Integer formed by the leading digits of `token`.
fn leading_integer(token: &str) -> Option<i64> {
	let digits: String = token.chars().take_while(char::is_ascii_digit).collect();
	digits.parse().ok()
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn ints(ids: Vec<PrimaryKey>) -> Vec<i64> {
		ids.into_iter()
			.map(|id| match id {
				PrimaryKey::Integer(n) => n,
				PrimaryKey::Text(text) => panic!("unexpected text id {}", text),
			})
			.collect()
	}

	#[rstest]
	#[case("12", vec![12])]
	#[case("12 15-17", vec![12, 15, 16, 17])]
	#[case("  4   2  ", vec![4, 2])]
	#[case("5-3", vec![5, 4, 3])]
	#[case("3 1-4 3", vec![3, 1, 2, 4])]
	#[case("0 -2 7", vec![7])]
	#[case("1-2-3 abc 8x", vec![8])]
	#[case("0-4 2-0", vec![])]
	#[case("", vec![])]
	fn test_parse_ids(#[case] input: &str, #[case] expected: Vec<i64>) {
		assert_eq!(ints(parse_ids(input)), expected);
	}

	#[rstest]
	fn test_huge_range_ignored() {
		assert!(parse_ids("1-1000000").is_empty());
	}
}
