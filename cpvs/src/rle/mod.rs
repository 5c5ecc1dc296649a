//! Run-Length Encoding
//!
//! Two commands: a repeat of one byte, and a copy of literal bytes. The bit layout of the command byte is a
//! `RleLayout` type parameter.

use crate::error::RleError;

mod layout;

// Re-export
pub use layout::*;

/// Minimum run of identical bytes worth a repeat command. A repeat of two costs as much as copying the two bytes
/// and may split a longer copy run.
const MIN_REPEAT_RUN: usize = 3;

/// Decode RLE data into a fixed size buffer.
///
/// Stops when the output is full or the input is exhausted; truncated input is not an error. Returns the number
/// of bytes written.
///
/// * `input`  - Encoded bytes.
/// * `output` - Destination buffer; its length bounds the output.
/// * `strict` - Reject zero-length commands instead of skipping them.
pub fn decode_into<L: RleLayout>(input: &[u8], output: &mut [u8], strict: bool) -> Result<usize, RleError> {
    let (mut i, mut o) = (0, 0);

    while i < input.len() && o < output.len() {
        let command = L::read_code(input[i]);
        if strict && command.is_empty() {
            return Err(RleError::ZeroLengthCommand { offset: i });
        }
        i += 1;

        match command {
            RleCommand::Repeat(n) => {
                let Some(&value) = input.get(i) else {
                    break;
                };
                i += 1;
                let end = output.len().min(o + n);
                output[o..end].fill(value);
                o = end;
            }
            RleCommand::Copy(n) => {
                let available = n.min(input.len() - i).min(output.len() - o);
                output[o..o + available].copy_from_slice(&input[i..i + available]);
                i += available;
                o += available;
                if available < n && o < output.len() {
                    // Input ran out mid-command.
                    break;
                }
            }
        }
    }

    Ok(o)
}

/// Decode RLE data into a new buffer of at most `size` bytes. The buffer is truncated to the bytes produced.
///
/// * `input`  - Encoded bytes.
/// * `size`   - Maximum decoded size.
/// * `strict` - Reject zero-length commands instead of skipping them.
pub fn decode<L: RleLayout>(input: &[u8], size: usize, strict: bool) -> Result<Vec<u8>, RleError> {
    let mut output = vec![0_u8; size];
    let n = decode_into::<L>(input, &mut output, strict)?;
    output.truncate(n);
    Ok(output)
}

/// Returns the number of bytes equal to `input[pos]` starting at `pos`, up to `cap`.
///
/// * `input` - The data.
/// * `pos`   - Start position; must be in bounds.
/// * `cap`   - Maximum run to report.
fn run_length(input: &[u8], pos: usize, cap: usize) -> usize {
    let value = input[pos];
    input[pos..]
        .iter()
        .take(cap)
        .take_while(|&&b| b == value)
        .count()
}

/// Encode data greedily into a caller provided buffer.
///
/// Runs of three or more identical bytes become repeat commands of at most `L::MAX_REPEAT` bytes; anything else
/// is gathered into copy commands of at most `L::MAX_COPY` bytes that end where such a run starts. Encoding stops
/// before any command that does not fit entirely in `output`. Returns the number of bytes written.
///
/// * `input`  - Data to encode.
/// * `output` - Destination buffer.
pub fn encode_into<L: RleLayout>(input: &[u8], output: &mut [u8]) -> usize {
    let (mut i, mut o) = (0, 0);

    while i < input.len() {
        let run = run_length(input, i, L::MAX_REPEAT);
        if run >= MIN_REPEAT_RUN {
            if o + 2 > output.len() {
                break;
            }
            output[o] = L::write_code(RleCommand::Repeat(run));
            output[o + 1] = input[i];
            o += 2;
            i += run;
        } else {
            let start = i;
            let mut end = i + 1;
            while end < input.len()
                && end - start < L::MAX_COPY
                && run_length(input, end, MIN_REPEAT_RUN) < MIN_REPEAT_RUN
            {
                end += 1;
            }

            let n = end - start;
            if o + 1 + n > output.len() {
                break;
            }
            output[o] = L::write_code(RleCommand::Copy(n));
            output[o + 1..o + 1 + n].copy_from_slice(&input[start..end]);
            o += 1 + n;
            i = end;
        }
    }

    o
}

/// Returns an upper bound on the encoded size of `len` bytes: one command byte per full copy run plus one.
///
/// * `len` - Input length.
pub fn max_encoded_len<L: RleLayout>(len: usize) -> usize {
    len + len / L::MAX_COPY + 1
}

/// Encode data into a new buffer.
///
/// * `input` - Data to encode.
pub fn encode<L: RleLayout>(input: &[u8]) -> Vec<u8> {
    let mut output = vec![0_u8; max_encoded_len::<L>(input.len())];
    let n = encode_into::<L>(input, &mut output);
    output.truncate(n);
    output
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Decode a whole stream produced by `encode`.
    fn decode_all<L: RleLayout>(encoded: &[u8], len: usize) -> Vec<u8> {
        decode::<L>(encoded, len, true).unwrap()
    }

    #[test]
    fn encodes_repeat_then_copy() {
        let input = [0x05, 0x05, 0x05, 0x05, 0x01, 0x02];
        let encoded = encode::<CpvsLayout>(&input);
        assert_eq!(encoded, vec![0x03, 0x05, 0x82, 0x01, 0x02]);
        assert_eq!(decode_all::<CpvsLayout>(&encoded, input.len()), input);
    }

    #[test]
    fn decodes_cpvs_repeat_then_copy() {
        let decoded = decode::<CpvsLayout>(&[0x03, 0x05, 0x82, 0x01, 0x02], 6, false).unwrap();
        assert_eq!(decoded, vec![5, 5, 5, 5, 1, 2]);

        // Repeat code 0 writes its value once.
        assert_eq!(decode::<CpvsLayout>(&[0x00, 0xAA], 4, true).unwrap(), vec![0xAA]);
    }

    #[test]
    fn empty_input_encodes_to_nothing() {
        assert!(encode::<CpvsLayout>(&[]).is_empty());
        assert!(decode::<CpvsLayout>(&[], 8, true).unwrap().is_empty());
    }

    #[test]
    fn run_of_two_is_copied() {
        let encoded = encode::<HighBitRepeat>(&[7, 7, 1]);
        assert_eq!(encoded, vec![0x03, 7, 7, 1]);

        let encoded = encode::<HighBitRepeat>(&[7, 7]);
        assert_eq!(encoded, vec![0x02, 7, 7]);
    }

    #[test]
    fn run_of_three_is_repeated() {
        let encoded = encode::<HighBitRepeat>(&[1, 7, 7, 7]);
        assert_eq!(encoded, vec![0x01, 1, 0x83, 7]);
    }

    #[test]
    fn long_runs_split_at_127() {
        let input = vec![9_u8; 300];
        let encoded = encode::<CpvsLayout>(&input);
        // 127 + 127 + 46
        assert_eq!(encoded, vec![0x7E, 9, 0x7E, 9, 45, 9]);
        assert_eq!(decode_all::<CpvsLayout>(&encoded, 300), input);
    }

    #[test]
    fn leftover_after_split_is_copied() {
        let input = vec![9_u8; 129];
        let encoded = encode::<HighBitRepeat>(&input);
        assert_eq!(encoded, vec![0xFF, 9, 0x02, 9, 9]);
    }

    #[test]
    fn long_literal_runs_split_at_127() {
        let input: Vec<u8> = (0..200).map(|i| (i % 251) as u8).collect();
        let encoded = encode::<HighBitCopy>(&input);
        assert_eq!(encoded[0], 0x80 | 127);
        assert_eq!(encoded[128], 0x80 | 73);
        assert_eq!(encoded.len(), 202);
        assert_eq!(decode_all::<HighBitCopy>(&encoded, 200), input);
    }

    #[test]
    fn sparse_bitset_compresses() {
        let mut input = vec![0_u8; 64];
        input[10] = 0x0C;
        let encoded = encode::<CpvsLayout>(&input);
        assert_eq!(encoded, vec![9, 0, 0x81, 0x0C, 52, 0]);
    }

    #[test]
    fn decode_stops_when_output_is_full() {
        let mut output = [0_u8; 3];
        let n = decode_into::<CpvsLayout>(&[0x7F, 1, 0x7F, 2], &mut output, true).unwrap();
        assert_eq!(n, 3);
        assert_eq!(output, [1, 1, 1]);
    }

    #[test]
    fn decode_tolerates_truncated_input() {
        // Copy of four bytes with only two present, then a repeat missing its value.
        assert_eq!(decode::<CpvsLayout>(&[0x84, 1, 2], 8, true).unwrap(), vec![1, 2]);
        assert_eq!(decode::<CpvsLayout>(&[0x01, 6, 0x05], 8, true).unwrap(), vec![6, 6]);
    }

    #[test]
    fn zero_length_commands() {
        let input = [0x80, 0x02, 0x05];
        assert_eq!(
            decode::<CpvsLayout>(&input, 8, true),
            Err(RleError::ZeroLengthCommand { offset: 0 })
        );
        assert_eq!(decode::<CpvsLayout>(&input, 8, false).unwrap(), vec![5, 5, 5]);

        assert_eq!(
            decode::<HighBitCopy>(&input, 8, true),
            Err(RleError::ZeroLengthCommand { offset: 0 })
        );
        assert_eq!(decode::<HighBitCopy>(&input, 8, false).unwrap(), vec![5, 5]);
    }

    #[test]
    fn encode_stops_before_partial_command() {
        let input = [1, 2, 3, 3, 3, 3];
        let mut output = [0_u8; 4];
        let n = encode_into::<CpvsLayout>(&input, &mut output);
        assert_eq!(n, 3);
        assert_eq!(&output[..n], &[0x82, 1, 2]);

        let mut output = [0_u8; 1];
        assert_eq!(encode_into::<CpvsLayout>(&input, &mut output), 0);
    }

    proptest! {
        #[test]
        fn round_trip_random(input in prop::collection::vec(any::<u8>(), 0..1024)) {
            let encoded = encode::<CpvsLayout>(&input);
            prop_assert!(encoded.len() <= max_encoded_len::<CpvsLayout>(input.len()));
            prop_assert_eq!(decode_all::<CpvsLayout>(&encoded, input.len()), input.clone());
            let encoded = encode::<HighBitRepeat>(&input);
            prop_assert_eq!(decode_all::<HighBitRepeat>(&encoded, input.len()), input.clone());
            let encoded = encode::<HighBitCopy>(&input);
            prop_assert_eq!(decode_all::<HighBitCopy>(&encoded, input.len()), input);
        }

        #[test]
        fn round_trip_runs(
            runs in prop::collection::vec((0u8..4, 1usize..300), 0..16)
        ) {
            let input: Vec<u8> = runs.iter().flat_map(|&(v, n)| std::iter::repeat(v).take(n)).collect();
            let encoded = encode::<CpvsLayout>(&input);
            prop_assert_eq!(decode_all::<CpvsLayout>(&encoded, input.len()), input);
        }

        #[test]
        fn no_repeat_command_covers_two_bytes(input in prop::collection::vec(0u8..3, 0..512)) {
            let encoded = encode::<HighBitRepeat>(&input);
            let mut i = 0;
            while i < encoded.len() {
                match HighBitRepeat::read_code(encoded[i]) {
                    RleCommand::Repeat(n) => {
                        prop_assert!(n >= 3 && n <= 127);
                        i += 2;
                    }
                    RleCommand::Copy(n) => {
                        prop_assert!(n >= 1 && n <= 127);
                        i += 1 + n;
                    }
                }
            }
        }
    }
}
