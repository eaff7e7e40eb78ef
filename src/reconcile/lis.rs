/// Positions (into `seq`) of one longest strictly increasing subsequence.
///
/// Patience sorting with predecessor links, O(n log n).
pub(crate) fn longest_increasing_subsequence(seq: &[usize]) -> Vec<usize> {
    // tails[k]: position of the smallest tail of an increasing run of length k + 1
    let mut tails: Vec<usize> = Vec::new();
    let mut predecessor: Vec<Option<usize>> = vec![None; seq.len()];

    for (position, &value) in seq.iter().enumerate() {
        let length = tails.partition_point(|&tail| seq[tail] < value);
        if length > 0 {
            predecessor[position] = Some(tails[length - 1]);
        }
        if length == tails.len() {
            tails.push(position);
        } else {
            tails[length] = position;
        }
    }

    let mut result = Vec::with_capacity(tails.len());
    let mut cursor = tails.last().copied();
    while let Some(position) = cursor {
        result.push(position);
        cursor = predecessor[position];
    }
    result.reverse();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    #[test_case(&[], &[] ; "empty")]
    #[test_case(&[0, 1, 2], &[0, 1, 2] ; "sorted")]
    #[test_case(&[2, 1, 0], &[2] ; "reversed")]
    #[test_case(&[3, 0, 1, 4, 2], &[1, 2, 4] ; "mixed")]
    fn test_known_sequences(seq: &[usize], expected: &[usize]) {
        assert_eq!(longest_increasing_subsequence(seq), expected);
    }

    fn naive_length(seq: &[usize]) -> usize {
        let mut best = vec![1; seq.len()];
        for i in 0..seq.len() {
            for j in 0..i {
                if seq[j] < seq[i] {
                    best[i] = best[i].max(best[j] + 1);
                }
            }
        }
        best.into_iter().max().unwrap_or(0)
    }

    proptest! {
        #[test]
        fn test_result_is_a_longest_increasing_run(seq in prop::collection::vec(0usize..40, 0..30)) {
            let positions = longest_increasing_subsequence(&seq);
            prop_assert_eq!(positions.len(), naive_length(&seq));
            for pair in positions.windows(2) {
                prop_assert!(pair[0] < pair[1]);
                prop_assert!(seq[pair[0]] < seq[pair[1]]);
            }
        }
    }
}
