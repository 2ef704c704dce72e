//! Interaction extraction from raw message and reaction tables.
//!
//! Three kinds of candidate pairs are derived for a single thread:
//! - **Response**: a comment and the next N later messages by other authors
//! - **Quotation**: a message whose `quote_ref` equals another message's `sent_at`
//! - **Emoji**: a comment and each reaction attached to it
//!
//! Pairs are then weighted per category batch with a fitted `DecayModel`.

use std::collections::{BTreeSet, HashMap};
use tracing::debug;

use crate::decay::{check_time_diff, time_diff_secs, DecayModel};
use crate::error::{AnalysisError, MetricOutcome, Result};
use crate::records::{InteractionCategory, RawMessage, RawReaction};

// =============================================================================
// Pair types
// =============================================================================

/// Common view over the typed pairs: who reacted to whom, and when.
pub trait InteractionPair {
    const CATEGORY: InteractionCategory;

    /// The earlier, reacted-to side: (participant, epoch ms).
    fn target(&self) -> (&str, i64);

    /// The later, reacting side: (participant, epoch ms).
    fn source(&self) -> (&str, i64);

    fn time_diff_secs(&self) -> f64 {
        time_diff_secs(self.source().1, self.target().1)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResponsePair {
    pub comment_id: String,
    pub comment_author: String,
    pub comment_time: i64,
    pub response_id: String,
    pub response_author: String,
    pub response_time: i64,
}

impl InteractionPair for ResponsePair {
    const CATEGORY: InteractionCategory = InteractionCategory::Response;

    fn target(&self) -> (&str, i64) {
        (self.comment_author.as_str(), self.comment_time)
    }

    fn source(&self) -> (&str, i64) {
        (self.response_author.as_str(), self.response_time)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuotationPair {
    pub quotation_id: String,
    pub quotation_author: String,
    pub quotation_time: i64,
    pub response_id: String,
    pub response_author: String,
    pub response_time: i64,
}

impl InteractionPair for QuotationPair {
    const CATEGORY: InteractionCategory = InteractionCategory::Quotation;

    fn target(&self) -> (&str, i64) {
        (self.quotation_author.as_str(), self.quotation_time)
    }

    fn source(&self) -> (&str, i64) {
        (self.response_author.as_str(), self.response_time)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmojiPair {
    pub comment_id: String,
    pub comment_author: String,
    pub comment_time: i64,
    pub reaction_id: String,
    pub reaction_author: String,
    pub reaction_time: i64,
    pub emoji: String,
}

impl InteractionPair for EmojiPair {
    const CATEGORY: InteractionCategory = InteractionCategory::Emoji;

    fn target(&self) -> (&str, i64) {
        (self.comment_author.as_str(), self.comment_time)
    }

    fn source(&self) -> (&str, i64) {
        (self.reaction_author.as_str(), self.reaction_time)
    }
}

/// A pair with its latency and decayed weight attached.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedPair<P> {
    pub pair: P,
    pub time_diff_secs: f64,
    pub weight: f64,
}

// =============================================================================
// Thread selection
// =============================================================================

/// Messages of one thread, ascending by `sent_at` (ties by message id).
pub fn thread_messages<'a>(messages: &'a [RawMessage], thread_id: &str) -> Result<Vec<&'a RawMessage>> {
    let mut thread: Vec<&RawMessage> = messages
        .iter()
        .filter(|m| m.thread_id == thread_id)
        .collect();

    if thread.is_empty() {
        return Err(AnalysisError::ThreadNotFound(thread_id.to_string()));
    }

    thread.sort_by(|a, b| a.sent_at.cmp(&b.sent_at).then_with(|| a.id.cmp(&b.id)));
    Ok(thread)
}

pub fn distinct_authors(thread: &[&RawMessage]) -> usize {
    thread
        .iter()
        .map(|m| m.author_id.as_str())
        .collect::<BTreeSet<_>>()
        .len()
}

/// For each position, the first later position whose author differs from the
/// author at that position. Lets the response scan jump over whole runs of one
/// author's consecutive messages.
fn run_skip_index(thread: &[&RawMessage]) -> Vec<usize> {
    let len = thread.len();
    let mut next_run = vec![len; len];
    for i in (0..len.saturating_sub(1)).rev() {
        next_run[i] = if thread[i + 1].author_id != thread[i].author_id {
            i + 1
        } else {
            next_run[i + 1]
        };
    }
    next_run
}

// =============================================================================
// Pairing
// =============================================================================

/// Pair every comment with up to `fanout` later messages by other authors.
///
/// `fanout` defaults to the number of distinct authors in the thread. Comments
/// near the end of the thread simply yield fewer pairs.
pub fn extract_responses(
    messages: &[RawMessage],
    thread_id: &str,
    fanout: Option<usize>,
) -> Result<Vec<ResponsePair>> {
    let thread = thread_messages(messages, thread_id)?;
    let n = fanout.unwrap_or_else(|| distinct_authors(&thread));
    let next_run = run_skip_index(&thread);

    let mut pairs = Vec::new();
    for (i, comment) in thread.iter().enumerate() {
        let mut taken = 0;
        let mut j = next_run[i];
        while j < thread.len() && taken < n {
            let candidate = thread[j];
            if candidate.author_id != comment.author_id {
                pairs.push(ResponsePair {
                    comment_id: comment.id.clone(),
                    comment_author: comment.author_id.clone(),
                    comment_time: comment.sent_at,
                    response_id: candidate.id.clone(),
                    response_author: candidate.author_id.clone(),
                    response_time: candidate.sent_at,
                });
                taken += 1;
                j += 1;
            } else {
                // candidate starts a run by the comment's own author: skip it whole
                j = next_run[j];
            }
        }
    }

    debug!("[Extract] thread {}: {} response pairs (fanout {})", thread_id, pairs.len(), n);
    Ok(pairs)
}

/// Join messages to the messages they quote on exact timestamp equality.
pub fn extract_quotations(messages: &[RawMessage], thread_id: &str) -> Result<Vec<QuotationPair>> {
    let thread = thread_messages(messages, thread_id)?;

    let mut by_sent_at: HashMap<i64, Vec<&RawMessage>> = HashMap::new();
    for msg in &thread {
        by_sent_at.entry(msg.sent_at).or_default().push(msg);
    }

    let mut pairs = Vec::new();
    for response in &thread {
        let Some(quote_ref) = response.quote_ref else {
            continue;
        };
        for quotation in by_sent_at.get(&quote_ref).into_iter().flatten() {
            if quotation.id == response.id || quotation.author_id == response.author_id {
                continue;
            }
            pairs.push(QuotationPair {
                quotation_id: quotation.id.clone(),
                quotation_author: quotation.author_id.clone(),
                quotation_time: quotation.sent_at,
                response_id: response.id.clone(),
                response_author: response.author_id.clone(),
                response_time: response.sent_at,
            });
        }
    }

    debug!("[Extract] thread {}: {} quotation pairs", thread_id, pairs.len());
    Ok(pairs)
}

/// Pair each comment of the thread with every reaction attached to it.
pub fn extract_emoji(
    messages: &[RawMessage],
    reactions: &[RawReaction],
    thread_id: &str,
) -> Result<Vec<EmojiPair>> {
    let thread = thread_messages(messages, thread_id)?;

    let mut by_message: HashMap<&str, Vec<&RawReaction>> = HashMap::new();
    for reaction in reactions {
        by_message.entry(reaction.message_id.as_str()).or_default().push(reaction);
    }

    let mut pairs = Vec::new();
    for comment in &thread {
        let Some(attached) = by_message.get_mut(comment.id.as_str()) else {
            continue;
        };
        attached.sort_by(|a, b| a.sent_at.cmp(&b.sent_at).then_with(|| a.id.cmp(&b.id)));
        for reaction in attached.iter() {
            pairs.push(EmojiPair {
                comment_id: comment.id.clone(),
                comment_author: comment.author_id.clone(),
                comment_time: comment.sent_at,
                reaction_id: reaction.id.clone(),
                reaction_author: reaction.author_id.clone(),
                reaction_time: reaction.sent_at,
                emoji: reaction.emoji.clone(),
            });
        }
    }

    debug!("[Extract] thread {}: {} emoji pairs", thread_id, pairs.len());
    Ok(pairs)
}

// =============================================================================
// Weighting
// =============================================================================

/// Fit a decay model to the batch and weight every pair with it.
pub fn weigh_pairs<P: InteractionPair>(
    pairs: Vec<P>,
    base_value: f64,
    half_life_percentile: f64,
) -> MetricOutcome<Vec<WeightedPair<P>>> {
    let time_diffs: Vec<f64> = pairs.iter().map(|p| p.time_diff_secs()).collect();
    let fitted = DecayModel::fit(P::CATEGORY, base_value, &time_diffs, half_life_percentile);
    let model = fitted.value;
    let mut warnings = fitted.warnings;

    let weighted = pairs
        .into_iter()
        .zip(time_diffs)
        .map(|(pair, dt)| {
            check_time_diff(P::CATEGORY, pair.source().0, pair.target().0, dt, &mut warnings);
            WeightedPair {
                weight: model.weight(dt),
                time_diff_secs: dt,
                pair,
            }
        })
        .collect();

    MetricOutcome {
        value: weighted,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ComputationWarning;

    fn msg(id: &str, author: &str, sent_at_secs: i64) -> RawMessage {
        RawMessage {
            id: id.to_string(),
            thread_id: "t1".to_string(),
            author_id: author.to_string(),
            sent_at: sent_at_secs * 1000,
            body: format!("message {}", id),
            quote_ref: None,
            quote_author: None,
            quote_body: None,
        }
    }

    fn quoting(id: &str, author: &str, sent_at_secs: i64, quoted: &RawMessage) -> RawMessage {
        RawMessage {
            quote_ref: Some(quoted.sent_at),
            quote_author: Some(quoted.author_id.clone()),
            quote_body: Some(quoted.body.clone()),
            ..msg(id, author, sent_at_secs)
        }
    }

    fn reaction(id: &str, message_id: &str, author: &str, sent_at_secs: i64) -> RawReaction {
        RawReaction {
            id: id.to_string(),
            message_id: message_id.to_string(),
            author_id: author.to_string(),
            sent_at: sent_at_secs * 1000,
            emoji: "❤️".to_string(),
        }
    }

    #[test]
    fn test_unknown_thread_is_not_found() {
        let messages = vec![msg("m1", "A", 0)];
        let err = extract_responses(&messages, "t9", None).unwrap_err();
        assert!(matches!(err, AnalysisError::ThreadNotFound(ref t) if t == "t9"));
        assert!(extract_quotations(&messages, "t9").unwrap_err().is_not_found());
        assert!(extract_emoji(&messages, &[], "t9").unwrap_err().is_not_found());
    }

    #[test]
    fn test_thread_messages_sorted_by_time() {
        let messages = vec![msg("m3", "C", 130), msg("m1", "A", 0), msg("m2", "B", 60)];
        let thread = thread_messages(&messages, "t1").unwrap();
        let ids: Vec<&str> = thread.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2", "m3"]);
    }

    #[test]
    fn test_responses_scenario() {
        let messages = vec![msg("m1", "A", 0), msg("m2", "B", 60), msg("m3", "C", 130)];
        let pairs = extract_responses(&messages, "t1", Some(2)).unwrap();
        let described: Vec<(&str, &str)> = pairs
            .iter()
            .map(|p| (p.comment_id.as_str(), p.response_id.as_str()))
            .collect();
        assert_eq!(described, vec![("m1", "m2"), ("m1", "m3"), ("m2", "m3")]);
    }

    #[test]
    fn test_responses_exactly_n_of_k_eligible() {
        // A's comment has 4 eligible followers (B, C, B, D) and one of its own
        let messages = vec![
            msg("m1", "A", 0),
            msg("m2", "A", 5),
            msg("m3", "B", 10),
            msg("m4", "C", 20),
            msg("m5", "A", 25),
            msg("m6", "B", 30),
            msg("m7", "D", 40),
        ];
        for n in 1..=4 {
            let pairs = extract_responses(&messages, "t1", Some(n)).unwrap();
            let from_m1: Vec<&ResponsePair> = pairs.iter().filter(|p| p.comment_id == "m1").collect();
            assert_eq!(from_m1.len(), n);
            assert!(from_m1.iter().all(|p| p.response_author != "A"));
        }
        let pairs = extract_responses(&messages, "t1", Some(2)).unwrap();
        let from_m1: Vec<&str> = pairs
            .iter()
            .filter(|p| p.comment_id == "m1")
            .map(|p| p.response_id.as_str())
            .collect();
        assert_eq!(from_m1, vec!["m3", "m4"]);
    }

    #[test]
    fn test_responses_skip_own_runs() {
        let messages = vec![
            msg("m1", "A", 0),
            msg("m2", "B", 1),
            msg("m3", "A", 2),
            msg("m4", "A", 3),
            msg("m5", "C", 4),
        ];
        let pairs = extract_responses(&messages, "t1", Some(2)).unwrap();
        let from_m1: Vec<&str> = pairs
            .iter()
            .filter(|p| p.comment_id == "m1")
            .map(|p| p.response_id.as_str())
            .collect();
        assert_eq!(from_m1, vec!["m2", "m5"]);
        // B's comment may pair with A's later messages
        let from_m2: Vec<&str> = pairs
            .iter()
            .filter(|p| p.comment_id == "m2")
            .map(|p| p.response_id.as_str())
            .collect();
        assert_eq!(from_m2, vec!["m3", "m4"]);
    }

    #[test]
    fn test_responses_without_eligible_followers() {
        let messages = vec![msg("m1", "A", 0), msg("m2", "A", 10), msg("m3", "A", 20)];
        let pairs = extract_responses(&messages, "t1", None).unwrap();
        assert!(pairs.is_empty());
    }

    #[test]
    fn test_responses_default_fanout_is_distinct_authors() {
        let messages = vec![
            msg("m1", "A", 0),
            msg("m2", "B", 1),
            msg("m3", "C", 2),
            msg("m4", "B", 3),
            msg("m5", "C", 4),
        ];
        // three authors -> up to three followers each
        let pairs = extract_responses(&messages, "t1", None).unwrap();
        assert_eq!(pairs.iter().filter(|p| p.comment_id == "m1").count(), 3);
        assert!(pairs.iter().all(|p| p.comment_author != p.response_author));
    }

    #[test]
    fn test_responses_match_naive_scan() {
        let authors = ["A", "B", "A", "A", "C", "B", "B", "D", "A", "C", "C", "C", "B"];
        let messages: Vec<RawMessage> = authors
            .iter()
            .enumerate()
            .map(|(i, a)| msg(&format!("m{:02}", i), a, i as i64 * 7))
            .collect();
        let pairs = extract_responses(&messages, "t1", Some(3)).unwrap();

        let mut naive = Vec::new();
        for (i, c) in messages.iter().enumerate() {
            let later = messages[i + 1..]
                .iter()
                .filter(|r| r.author_id != c.author_id)
                .take(3);
            for r in later {
                naive.push((c.id.clone(), r.id.clone()));
            }
        }
        let fast: Vec<(String, String)> = pairs
            .into_iter()
            .map(|p| (p.comment_id, p.response_id))
            .collect();
        assert_eq!(fast, naive);
    }

    #[test]
    fn test_quotation_exact_join() {
        let m1 = msg("m1", "A", 0);
        let m2 = msg("m2", "B", 60);
        let m3 = quoting("m3", "C", 90, &m1);
        let m4 = quoting("m4", "B", 100, &m1);
        let mut m5 = msg("m5", "C", 110);
        m5.quote_ref = Some(59_999); // near miss
        let messages = vec![m1, m2, m3, m4, m5];

        let pairs = extract_quotations(&messages, "t1").unwrap();
        assert_eq!(pairs.len(), 2);
        assert!(pairs.iter().all(|p| p.quotation_id == "m1"));
        let responders: Vec<&str> = pairs.iter().map(|p| p.response_author.as_str()).collect();
        assert_eq!(responders, vec!["C", "B"]);
    }

    #[test]
    fn test_quotation_excludes_self_quotes() {
        let m1 = msg("m1", "A", 0);
        let m2 = quoting("m2", "A", 30, &m1);
        let pairs = extract_quotations(&[m1, m2], "t1").unwrap();
        assert!(pairs.is_empty());
    }

    #[test]
    fn test_emoji_pairs() {
        let messages = vec![msg("m1", "A", 0), msg("m2", "B", 60)];
        let reactions = vec![
            reaction("r2", "m1", "C", 40),
            reaction("r1", "m1", "B", 20),
            reaction("r3", "m2", "A", 65),
            reaction("r4", "other", "A", 70),
        ];
        let pairs = extract_emoji(&messages, &reactions, "t1").unwrap();
        let ids: Vec<(&str, &str)> = pairs
            .iter()
            .map(|p| (p.comment_id.as_str(), p.reaction_id.as_str()))
            .collect();
        assert_eq!(ids, vec![("m1", "r1"), ("m1", "r2"), ("m2", "r3")]);
    }

    #[test]
    fn test_emoji_ignores_reactions_on_other_threads() {
        let mut elsewhere = msg("m9", "D", 5);
        elsewhere.thread_id = "t2".to_string();
        let messages = vec![msg("m1", "A", 0), elsewhere];
        let reactions = vec![reaction("r1", "m9", "B", 10), reaction("r2", "m1", "B", 12)];

        let pairs = extract_emoji(&messages, &reactions, "t1").unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].reaction_id, "r2");

        let other = extract_emoji(&messages, &reactions, "t2").unwrap();
        assert_eq!(other.len(), 1);
        assert_eq!((other[0].comment_id.as_str(), other[0].reaction_id.as_str()), ("m9", "r1"));
    }

    #[test]
    fn test_quotation_matches_every_message_at_timestamp() {
        // two messages share the quoted timestamp: both pair with the quote
        let m1 = msg("m1", "A", 10);
        let m2 = msg("m2", "B", 10);
        let m3 = quoting("m3", "C", 40, &m1);
        let pairs = extract_quotations(&[m1, m2, m3], "t1").unwrap();
        let quoted: Vec<(&str, &str)> = pairs
            .iter()
            .map(|p| (p.quotation_id.as_str(), p.response_id.as_str()))
            .collect();
        assert_eq!(quoted, vec![("m1", "m3"), ("m2", "m3")]);

        // a quoting author never pairs with their own message at that timestamp
        let m1 = msg("m1", "A", 10);
        let m2 = msg("m2", "B", 10);
        let m4 = quoting("m4", "B", 50, &m1);
        let pairs = extract_quotations(&[m1, m2, m4], "t1").unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].quotation_author, "A");
    }

    #[test]
    fn test_emoji_with_no_reactions() {
        let messages = vec![msg("m1", "A", 0)];
        assert!(extract_emoji(&messages, &[], "t1").unwrap().is_empty());
    }

    #[test]
    fn test_weigh_scenario() {
        let messages = vec![msg("m1", "A", 0), msg("m2", "B", 60), msg("m3", "C", 130)];
        let pairs: Vec<ResponsePair> = extract_responses(&messages, "t1", Some(2))
            .unwrap()
            .into_iter()
            .filter(|p| p.comment_id == "m1")
            .collect();
        let weighted = weigh_pairs(pairs, 1.0, 0.75);
        assert!(weighted.warnings.is_empty());
        let w = &weighted.value;
        assert_eq!(w[0].time_diff_secs, 60.0);
        assert_eq!(w[1].time_diff_secs, 130.0);
        assert!(w[0].weight > w[1].weight);

        let k = std::f64::consts::LN_2 / 112.5;
        assert!((w[0].weight - (-k * 60.0).exp()).abs() < 1e-12);
        assert!((w[1].weight - (-k * 130.0).exp()).abs() < 1e-12);
    }

    #[test]
    fn test_weigh_flags_negative_latency() {
        let messages = vec![msg("m1", "A", 100)];
        let reactions = vec![reaction("r1", "m1", "B", 40), reaction("r2", "m1", "C", 160)];
        let pairs = extract_emoji(&messages, &reactions, "t1").unwrap();
        let weighted = weigh_pairs(pairs, 1.5, 0.75);
        assert_eq!(weighted.value.len(), 2);
        assert!(weighted.value.iter().all(|w| w.weight.is_finite() && w.weight >= 0.0));
        // half-life 30s: a reaction 60s early weighs four times the base
        assert_eq!(weighted.value[0].time_diff_secs, -60.0);
        assert!((weighted.value[0].weight - 6.0).abs() < 1e-9);
        assert!(weighted.warnings.iter().any(|w| matches!(
            w,
            ComputationWarning::NegativeTimeDiff { source_participant, .. } if source_participant == "B"
        )));
    }
}
