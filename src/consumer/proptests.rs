//! Property-based tests for reply stream decoding
//!
//! Whatever way the encoded stream is cut into reads, the decoded fragments
//! must concatenate to the original reply.

use super::*;
use crate::protocol::{StreamEvent, DEFAULT_MAX_FRAME_BYTES, DONE_DATA, DONE_EVENT, ERROR_EVENT};
use futures::stream;
use futures::StreamExt;
use proptest::prelude::*;

/// Encode the way the producer's SSE layer does: one `data:` line per
/// line of text, a blank line after each frame.
fn encode(event: &StreamEvent) -> String {
    match event {
        StreamEvent::Fragment { text } => {
            let mut frame = String::new();
            for line in text.split('\n') {
                frame.push_str("data: ");
                frame.push_str(line);
                frame.push('\n');
            }
            frame.push('\n');
            frame
        }
        StreamEvent::Done => format!("event: {DONE_EVENT}\ndata: {DONE_DATA}\n\n"),
        StreamEvent::Failed { reason } => format!("event: {ERROR_EVENT}\ndata: {reason}\n\n"),
    }
}

fn split_at_points(bytes: &[u8], points: &[prop::sample::Index]) -> Vec<Vec<u8>> {
    let mut cuts: Vec<usize> = points.iter().map(|p| p.index(bytes.len() + 1)).collect();
    cuts.sort_unstable();
    cuts.dedup();

    let mut chunks = Vec::new();
    let mut start = 0;
    for cut in cuts {
        chunks.push(bytes[start..cut].to_vec());
        start = cut;
    }
    chunks.push(bytes[start..].to_vec());
    chunks
}

fn decode_chunks(chunks: Vec<Vec<u8>>) -> Vec<StreamEvent> {
    let reads: Vec<Result<Vec<u8>, TransportError>> = chunks.into_iter().map(Ok).collect();
    let events = decode_events(stream::iter(reads).boxed(), DEFAULT_MAX_FRAME_BYTES);
    futures::executor::block_on(events.collect())
}

fn arb_fragment() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ,.!?:é漢🙂\n]{0,16}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn prop_fragments_survive_any_split(
        fragments in proptest::collection::vec(arb_fragment(), 0..12),
        points in proptest::collection::vec(any::<prop::sample::Index>(), 0..24),
    ) {
        let mut wire = String::new();
        for fragment in &fragments {
            wire.push_str(&encode(&StreamEvent::fragment(fragment.clone())));
        }
        wire.push_str(&encode(&StreamEvent::Done));

        let events = decode_chunks(split_at_points(wire.as_bytes(), &points));

        prop_assert_eq!(events.last(), Some(&StreamEvent::Done));
        let decoded: Vec<String> = events
            .iter()
            .filter_map(|event| match event {
                StreamEvent::Fragment { text } => Some(text.clone()),
                _ => None,
            })
            .collect();
        prop_assert_eq!(decoded.concat(), fragments.concat());
        prop_assert_eq!(decoded.len(), fragments.len());
    }

    #[test]
    fn prop_split_matches_single_read(
        fragments in proptest::collection::vec(arb_fragment(), 1..8),
        reason in "[a-z ]{1,20}",
        points in proptest::collection::vec(any::<prop::sample::Index>(), 1..16),
    ) {
        let mut wire = String::new();
        for fragment in &fragments {
            wire.push_str(&encode(&StreamEvent::fragment(fragment.clone())));
        }
        wire.push_str(":ping\n\n");
        wire.push_str(&encode(&StreamEvent::failed(reason.clone())));

        let whole = decode_chunks(vec![wire.as_bytes().to_vec()]);
        let split = decode_chunks(split_at_points(wire.as_bytes(), &points));

        prop_assert_eq!(&whole, &split);
        prop_assert_eq!(whole.last(), Some(&StreamEvent::failed(reason)));
    }

    #[test]
    fn prop_crlf_streams_decode_like_lf(
        fragments in proptest::collection::vec("[a-zA-Z0-9 ]{0,12}", 0..8),
        points in proptest::collection::vec(any::<prop::sample::Index>(), 0..16),
    ) {
        let mut lf = String::new();
        for fragment in &fragments {
            lf.push_str(&encode(&StreamEvent::fragment(fragment.clone())));
        }
        lf.push_str(&encode(&StreamEvent::Done));
        let crlf = lf.replace('\n', "\r\n");

        let expected = decode_chunks(vec![lf.into_bytes()]);
        let actual = decode_chunks(split_at_points(crlf.as_bytes(), &points));
        prop_assert_eq!(expected, actual);
    }
}
